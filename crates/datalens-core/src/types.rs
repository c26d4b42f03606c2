// SPDX-FileCopyrightText: 2026 DataLens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Auth and job types shared across the DataLens crates.

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize, Serializer};
use serde_json::{Map, Value};
use strum::{Display, EnumString};

/// Bearer credential pair issued by `POST /users/token` and `POST /users/token/refresh`.
///
/// Debug output omits both token strings.
#[derive(Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthTokens {
    pub access_token: String,
    pub refresh_token: String,
    #[serde(default = "default_token_type")]
    pub token_type: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub expires_in: Option<u64>,
}

fn default_token_type() -> String {
    "bearer".to_string()
}

impl AuthTokens {
    pub fn new(access_token: impl Into<String>, refresh_token: impl Into<String>) -> Self {
        Self {
            access_token: access_token.into(),
            refresh_token: refresh_token.into(),
            token_type: default_token_type(),
            expires_in: None,
        }
    }
}

impl std::fmt::Debug for AuthTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthTokens")
            .field("access_token", &"[REDACTED]")
            .field("refresh_token", &"[REDACTED]")
            .field("token_type", &self.token_type)
            .field("expires_in", &self.expires_in)
            .finish()
    }
}

/// Claims decoded from an access token.
///
/// Never persisted: recomputed from the current access token whenever needed,
/// so a changed token can never leave a stale `User` behind.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct User {
    /// Subject (the username).
    pub sub: String,
    /// Numeric role identifier.
    #[serde(default)]
    pub role_id: i64,
    /// Expiry in epoch seconds.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub exp: Option<i64>,
    /// Any further claims the backend includes.
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// The user record returned by `GET /users/me`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CurrentUser {
    pub id: i64,
    pub username: String,
    #[serde(default)]
    pub email: Option<String>,
    #[serde(default)]
    pub role_id: i64,
    #[serde(default)]
    pub is_active: Option<bool>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Username/password pair for the password grant.
#[derive(Debug, Clone)]
pub struct LoginCredentials {
    pub username: String,
    pub password: SecretString,
}

impl LoginCredentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
        }
    }
}

/// Body for `POST /users/register`.
#[derive(Debug, Clone, Serialize)]
pub struct Registration {
    pub username: String,
    #[serde(serialize_with = "expose_password")]
    pub password: SecretString,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub email: Option<String>,
}

impl Registration {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: SecretString::from(password.into()),
            email: None,
        }
    }

    pub fn with_email(mut self, email: impl Into<String>) -> Self {
        self.email = Some(email.into());
        self
    }
}

fn expose_password<S: Serializer>(password: &SecretString, serializer: S) -> Result<S::Ok, S::Error> {
    serializer.serialize_str(password.expose_secret())
}

/// Lifecycle of a server-side multi-round sampling job.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, Display, EnumString, Serialize, Deserialize,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum JobStatus {
    Pending,
    Running,
    Completed,
    Failed,
}

impl JobStatus {
    /// `completed` and `failed` end polling.
    pub fn is_terminal(self) -> bool {
        matches!(self, JobStatus::Completed | JobStatus::Failed)
    }
}

/// Outcome of one sampling round within a job.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RoundResult {
    pub round_number: u32,
    pub sample_size: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub residual_size: Option<u64>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// Polled status snapshot of a multi-round sampling job.
///
/// The client never edits a snapshot; each poll replaces it wholesale.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SamplingJob {
    #[serde(alias = "run_id", alias = "job_id")]
    pub id: String,
    pub status: JobStatus,
    #[serde(default)]
    pub round_results: Vec<RoundResult>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error_message: Option<String>,
    #[serde(default)]
    pub completed_rounds: u32,
    #[serde(default)]
    pub total_rounds: u32,
}

impl SamplingJob {
    /// Fraction of rounds completed, in `0.0..=1.0`.
    pub fn progress(&self) -> f64 {
        if self.total_rounds == 0 {
            return if self.status == JobStatus::Completed { 1.0 } else { 0.0 };
        }
        (f64::from(self.completed_rounds) / f64::from(self.total_rounds)).min(1.0)
    }

    /// Total rows sampled across all finished rounds.
    pub fn total_sampled(&self) -> u64 {
        self.round_results.iter().map(|r| r.sample_size).sum()
    }
}

/// Response of the async multi-round submission endpoint.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JobSubmission {
    #[serde(alias = "run_id", alias = "id")]
    pub job_id: String,
    #[serde(default)]
    pub status: Option<JobStatus>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    #[test]
    fn tokens_debug_redacts() {
        let tokens = AuthTokens::new("secret-access", "secret-refresh");
        let debug = format!("{tokens:?}");
        assert!(!debug.contains("secret-access"));
        assert!(!debug.contains("secret-refresh"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn registration_debug_redacts_password() {
        let registration = Registration::new("carol", "hunter2").with_email("carol@example.com");
        let debug = format!("{registration:?}");
        assert!(!debug.contains("hunter2"));
        assert!(debug.contains("carol"));

        let body = serde_json::to_value(&registration).unwrap();
        assert_eq!(body["password"], "hunter2");
        assert_eq!(body["email"], "carol@example.com");
    }

    #[test]
    fn tokens_default_token_type() {
        let tokens: AuthTokens =
            serde_json::from_str(r#"{"access_token":"a","refresh_token":"r"}"#).unwrap();
        assert_eq!(tokens.token_type, "bearer");
        assert!(tokens.expires_in.is_none());
    }

    #[test]
    fn user_keeps_extra_claims() {
        let user: User = serde_json::from_str(
            r#"{"sub":"alice","role_id":2,"exp":1700000000,"type":"access"}"#,
        )
        .unwrap();
        assert_eq!(user.sub, "alice");
        assert_eq!(user.role_id, 2);
        assert_eq!(user.exp, Some(1_700_000_000));
        assert_eq!(user.extra.get("type"), Some(&Value::from("access")));
    }

    #[test]
    fn job_status_parsing() {
        assert_eq!(JobStatus::from_str("running").unwrap(), JobStatus::Running);
        assert_eq!(JobStatus::Completed.to_string(), "completed");
        assert!(JobStatus::Failed.is_terminal());
        assert!(!JobStatus::Pending.is_terminal());
    }

    #[test]
    fn sampling_job_accepts_run_id_alias() {
        let job: SamplingJob = serde_json::from_str(
            r#"{
                "run_id": "job-7",
                "status": "running",
                "round_results": [{"round_number": 1, "sample_size": 50}],
                "completed_rounds": 1,
                "total_rounds": 4
            }"#,
        )
        .unwrap();
        assert_eq!(job.id, "job-7");
        assert_eq!(job.progress(), 0.25);
        assert_eq!(job.total_sampled(), 50);
        assert!(job.error_message.is_none());
    }

    #[test]
    fn completed_job_without_rounds_reports_full_progress() {
        let job = SamplingJob {
            id: "j".into(),
            status: JobStatus::Completed,
            round_results: vec![],
            error_message: None,
            completed_rounds: 0,
            total_rounds: 0,
        };
        assert_eq!(job.progress(), 1.0);
    }
}
