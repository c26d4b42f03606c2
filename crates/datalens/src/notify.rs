// SPDX-FileCopyrightText: 2026 DataLens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Central error handler: turns errors into user-facing notices.

use std::io::IsTerminal;

use datalens_core::DatalensError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeLevel {
    Success,
    Warning,
    Error,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub level: NoticeLevel,
    pub message: String,
}

impl Notice {
    pub fn success(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Success,
            message: message.into(),
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Error,
            message: message.into(),
        }
    }

    fn warning(message: impl Into<String>) -> Self {
        Self {
            level: NoticeLevel::Warning,
            message: message.into(),
        }
    }

    pub fn render(&self, use_color: bool) -> String {
        if use_color {
            use colored::Colorize;
            match self.level {
                NoticeLevel::Success => format!("{} {}", "✓".green(), self.message),
                NoticeLevel::Warning => format!("{} {}", "!".yellow(), self.message.yellow()),
                NoticeLevel::Error => format!("{} {}", "✗".red(), self.message.red()),
            }
        } else {
            let tag = match self.level {
                NoticeLevel::Success => "[OK]",
                NoticeLevel::Warning => "[WARN]",
                NoticeLevel::Error => "[ERROR]",
            };
            format!("{tag} {}", self.message)
        }
    }

    pub fn print(&self) {
        let use_color = std::io::stderr().is_terminal();
        eprintln!("{}", self.render(use_color));
    }
}

pub const SESSION_EXPIRED_NOTICE: &str = "Session expired. Run `datalens login` to sign in again.";
pub const CONNECTIVITY_NOTICE: &str =
    "Unable to reach the DataLens server. Check your connection and the configured api.base_url.";

/// Map an error to the notice shown for it.
///
/// A rejected session has already been torn down by the request pipeline,
/// so it only gets a pointer to `datalens login`.
pub fn notice_for(error: &DatalensError) -> Notice {
    match error {
        DatalensError::Authentication {
            status: Some(403), ..
        } => Notice::error(format!("Permission denied: {}", error.user_message())),
        DatalensError::Authentication { .. } => Notice::warning(SESSION_EXPIRED_NOTICE),
        DatalensError::Network { .. } => Notice::error(CONNECTIVITY_NOTICE),
        DatalensError::Timeout { duration } => Notice::error(format!(
            "The server did not respond within {}s. Try again later.",
            duration.as_secs()
        )),
        DatalensError::Validation { .. } => Notice::error(error.user_message()),
        DatalensError::Api { status, .. } => {
            Notice::error(format!("{} (HTTP {status})", error.user_message()))
        }
        other => Notice::error(other.to_string()),
    }
}

/// Notice for a failed `datalens login`.
///
/// Credentials are rejected by the token endpoint with a 401 that carries
/// the server's reason, so show that reason instead of the expiry hint.
pub fn login_notice(error: &DatalensError) -> Notice {
    match error {
        DatalensError::Authentication { .. } => {
            Notice::error(format!("Login failed: {}", error.user_message()))
        }
        other => notice_for(other),
    }
}

/// Print the notice for `error` and return the process exit code.
pub fn report(error: &DatalensError) -> i32 {
    emit(error, notice_for(error))
}

/// Like [`report`], for errors raised by `datalens login`.
pub fn report_login(error: &DatalensError) -> i32 {
    emit(error, login_notice(error))
}

fn emit(error: &DatalensError, notice: Notice) -> i32 {
    tracing::debug!(error = ?error, "command failed");
    notice.print();
    match error {
        DatalensError::Authentication { .. } => 2,
        DatalensError::Config(_) => 78,
        _ => 1,
    }
}
