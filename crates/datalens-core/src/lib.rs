// SPDX-FileCopyrightText: 2026 DataLens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! Core library for the DataLens client.
//!
//! This crate provides the error taxonomy, the data model shared with the
//! backend, and the traits at the seams between the auth, client, and
//! sampling crates.

pub mod dataset;
pub mod error;
pub mod explore;
pub mod sampling;
pub mod traits;
pub mod types;

// Re-export key items at crate root for ergonomic imports.
pub use error::{DatalensError, ErrorPayload};
pub use types::{
    AuthTokens, CurrentUser, JobStatus, JobSubmission, LoginCredentials, Registration,
    RoundResult, SamplingJob, User,
};

pub use traits::{AuthBackend, JobStatusSource, KeyValueStorage, SessionExpiryHandler};

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn datalens_error_has_all_variants() {
        let _config = DatalensError::Config("test".into());
        let _storage = DatalensError::Storage {
            source: Box::new(std::io::Error::other("test")),
        };
        let _api = DatalensError::Api {
            status: 404,
            code: None,
            message: "test".into(),
            details: None,
        };
        let _auth = DatalensError::unauthenticated("test");
        let _validation = DatalensError::invalid("test");
        let _network = DatalensError::Network {
            message: "test".into(),
            source: None,
        };
        let _timeout = DatalensError::Timeout {
            duration: std::time::Duration::from_secs(30),
        };
        let _decode = DatalensError::TokenDecode("test".into());
        let _internal = DatalensError::Internal("test".into());
    }

    #[test]
    fn all_traits_are_exported() {
        fn _assert_storage<T: KeyValueStorage>() {}
        fn _assert_backend<T: AuthBackend>() {}
        fn _assert_jobs<T: JobStatusSource>() {}
        fn _assert_expiry<T: SessionExpiryHandler>() {}
    }

    #[test]
    fn trait_objects_are_usable() {
        struct Noop;
        impl SessionExpiryHandler for Noop {
            fn session_expired(&self) {}
        }
        let handler: Box<dyn SessionExpiryHandler> = Box::new(Noop);
        handler.session_expired();
    }
}
