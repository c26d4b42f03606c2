// SPDX-FileCopyrightText: 2026 DataLens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! `datalens login`, `logout`, and `whoami`.

use std::io::{BufRead, IsTerminal, Write};

use chrono::{DateTime, Utc};
use datalens_client::ApiClient;
use datalens_core::{DatalensError, LoginCredentials, SessionExpiryHandler, User};
use secrecy::{ExposeSecret, SecretString};
use tracing::info;

use crate::notify::Notice;

/// Read by `login` before prompting, for scripted use.
pub const PASSWORD_ENV_VAR: &str = "DATALENS_PASSWORD";

/// Stands in for the dashboard's redirect to `/login`.
#[derive(Debug, Default)]
pub struct LoginRedirect;

impl SessionExpiryHandler for LoginRedirect {
    fn session_expired(&self) {
        info!("session rejected by the server, login required");
    }
}

pub async fn login(client: &ApiClient, username: Option<String>) -> Result<(), DatalensError> {
    let username = match username {
        Some(name) => name,
        None => prompt_username()?,
    };
    let password = read_password()?;
    let credentials = LoginCredentials::new(username, password.expose_secret());

    let snapshot = client.auth().login(&credentials).await?;
    let who = snapshot
        .context
        .user
        .as_ref()
        .map(|u| u.sub.clone())
        .unwrap_or(credentials.username);
    Notice::success(format!("Logged in as {who}")).print();
    Ok(())
}

pub async fn logout(client: &ApiClient) -> Result<(), DatalensError> {
    let was_signed_in = client.auth_service().is_authenticated();
    client.auth().logout().await;
    if was_signed_in {
        Notice::success("Logged out").print();
    } else {
        Notice::success("Not logged in").print();
    }
    Ok(())
}

pub async fn whoami(client: &ApiClient, offline: bool, json: bool) -> Result<(), DatalensError> {
    let Some(user) = client.auth_service().current_user() else {
        return Err(DatalensError::unauthenticated("not logged in"));
    };

    if offline {
        if json {
            println!("{}", to_pretty(&user)?);
        } else {
            print_claims(&user);
        }
        return Ok(());
    }

    let me = client.auth().me().await?;
    if json {
        println!("{}", to_pretty(&me)?);
        return Ok(());
    }
    print_claims(&user);
    println!("  id:       {}", me.id);
    if let Some(email) = &me.email {
        println!("  email:    {email}");
    }
    Ok(())
}

fn print_claims(user: &User) {
    println!("  user:     {}", user.sub);
    println!("  role:     {}", user.role_id);
    if let Some(expires) = user.exp.map(format_expiry) {
        println!("  expires:  {expires}");
    }
}

/// Expiry as an RFC 3339 timestamp, or the raw value when out of range.
pub fn format_expiry(exp: i64) -> String {
    DateTime::<Utc>::from_timestamp(exp, 0)
        .map(|t| t.to_rfc3339())
        .unwrap_or_else(|| exp.to_string())
}

pub fn to_pretty<T: serde::Serialize>(value: &T) -> Result<String, DatalensError> {
    serde_json::to_string_pretty(value)
        .map_err(|e| DatalensError::Internal(format!("failed to render JSON: {e}")))
}

fn prompt_username() -> Result<String, DatalensError> {
    if !std::io::stdin().is_terminal() {
        return Err(DatalensError::invalid("pass --username when not running interactively"));
    }
    eprint!("Username: ");
    std::io::stderr().flush().ok();
    let mut line = String::new();
    std::io::stdin()
        .lock()
        .read_line(&mut line)
        .map_err(|e| DatalensError::Internal(format!("failed to read username: {e}")))?;
    let name = line.trim().to_string();
    if name.is_empty() {
        return Err(DatalensError::invalid("username must not be empty"));
    }
    Ok(name)
}

fn read_password() -> Result<SecretString, DatalensError> {
    if let Ok(password) = std::env::var(PASSWORD_ENV_VAR)
        && !password.is_empty()
    {
        return Ok(SecretString::from(password));
    }

    if std::io::stdin().is_terminal() {
        eprint!("Password: ");
        let password = rpassword::read_password()
            .map_err(|e| DatalensError::Internal(format!("failed to read password: {e}")))?;
        if password.is_empty() {
            return Err(DatalensError::invalid("password must not be empty"));
        }
        return Ok(SecretString::from(password));
    }

    Err(DatalensError::invalid(format!(
        "no password provided. Set {PASSWORD_ENV_VAR} or run interactively."
    )))
}
