// SPDX-FileCopyrightText: 2026 DataLens Contributors
// SPDX-License-Identifier: MIT OR Apache-2.0

//! wiremock helpers for backend-shaped responses.

use std::sync::atomic::{AtomicUsize, Ordering};

use datalens_core::AuthTokens;
use serde_json::json;
use wiremock::{Request, Respond, ResponseTemplate};

/// `200 OK` carrying `tokens` in the shape of the token endpoints.
pub fn token_response(tokens: &AuthTokens) -> ResponseTemplate {
    ResponseTemplate::new(200).set_body_json(json!({
        "access_token": tokens.access_token,
        "refresh_token": tokens.refresh_token,
        "token_type": tokens.token_type,
    }))
}

/// Responds with each template in turn, then repeats the last one.
pub struct SequenceResponder {
    responses: Vec<ResponseTemplate>,
    next: AtomicUsize,
}

impl SequenceResponder {
    pub fn new(responses: Vec<ResponseTemplate>) -> Self {
        Self {
            responses,
            next: AtomicUsize::new(0),
        }
    }
}

impl Respond for SequenceResponder {
    fn respond(&self, _request: &Request) -> ResponseTemplate {
        let index = self.next.fetch_add(1, Ordering::SeqCst);
        self.responses
            .get(index)
            .or_else(|| self.responses.last())
            .cloned()
            .unwrap_or_else(|| ResponseTemplate::new(500))
    }
}
