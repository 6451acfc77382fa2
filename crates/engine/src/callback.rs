// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Callback Client (§4.4): delivers a job's outcome to the optional
//! external server and interprets its retention directive.

use std::path::Path;

use serde::Serialize;
use tagq_core::JobId;

use crate::error::EngineError;

/// What to do with the local output file after a successful callback.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Retention {
    Keep,
    Delete,
}

pub struct CallbackClient {
    http: reqwest::Client,
    base_url: String,
}

#[derive(Serialize)]
struct ErrorPayload<'a> {
    file_id: &'a str,
    message: &'a str,
}

impl CallbackClient {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self { http: reqwest::Client::new(), base_url: base_url.into() }
    }

    /// POST the finished output artifact; the reply decides retention.
    pub async fn send_result(&self, id: &JobId, output_path: &Path) -> Result<Retention, EngineError> {
        let bytes = tokio::fs::read(output_path).await.map_err(|e| EngineError::io(output_path, e))?;
        let file_name = output_path.file_name().map(|n| n.to_string_lossy().into_owned()).unwrap_or_default();
        let part = reqwest::multipart::Part::bytes(bytes).file_name(file_name);
        let form = reqwest::multipart::Form::new().text("file_id", id.to_string()).part("file", part);

        let response = self.http.post(format!("{}/result", self.base_url)).multipart(form).send().await?;
        let body = response.text().await.unwrap_or_default();
        Ok(parse_retention(&body))
    }

    /// POST a failure report. Per §7, network/parse failures here are
    /// logged only and never revert the job's ERROR status.
    pub async fn send_error(&self, id: &JobId, message: &str) {
        let payload = ErrorPayload { file_id: id.as_str(), message };
        let url = format!("{}/error?file_id={}", self.base_url, id);
        if let Err(e) = self.http.post(url).json(&payload).send().await {
            tracing::warn!(id = %id, error = %e, "error callback delivery failed");
        }
    }
}

/// Any reply other than the literal string `KEEP` is treated as `DELETE`
/// (§4.4: "on DELETE, and on any unrecognized reply").
fn parse_retention(body: &str) -> Retention {
    if body.trim() == "KEEP" {
        Retention::Keep
    } else {
        Retention::Delete
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn keep_requires_the_exact_literal() {
        assert_eq!(parse_retention("KEEP"), Retention::Keep);
        assert_eq!(parse_retention("KEEP\n"), Retention::Keep);
    }

    #[test]
    fn anything_else_is_delete() {
        assert_eq!(parse_retention("DELETE"), Retention::Delete);
        assert_eq!(parse_retention(""), Retention::Delete);
        assert_eq!(parse_retention("keep"), Retention::Delete);
        assert_eq!(parse_retention("<html>not expected</html>"), Retention::Delete);
    }
}
