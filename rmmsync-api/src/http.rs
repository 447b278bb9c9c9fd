//! Blocking HTTP implementation of [`RemoteApi`].
//!
//! Timeouts are asymmetric on purpose: reads and the health probe fail fast,
//! while writeback PUTs get a generous window because script bodies can be
//! large. Rate-limit responses (429) are retried a bounded number of times
//! with a fixed sleep.

use std::thread;
use std::time::Duration;

use serde_json::{Map, Value};

use rmmsync_core::{RecordKind, ScriptId, ScriptRecord};

use crate::error::ApiError;
use crate::RemoteApi;

const HEALTH_TIMEOUT: Duration = Duration::from_secs(5);
const READ_TIMEOUT: Duration = Duration::from_secs(30);
const WRITE_TIMEOUT: Duration = Duration::from_secs(120);

const RATE_LIMIT_ATTEMPTS: u32 = 5;
const RATE_LIMIT_SLEEP: Duration = Duration::from_secs(5);

/// Authenticated client for one API instance.
pub struct HttpApi {
    base: String,
    token: String,
    agent: ureq::Agent,
}

impl HttpApi {
    /// `base` must carry a scheme and no trailing slash
    /// (see `Config::api_base`).
    pub fn new(base: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            base: base.into(),
            token: token.into(),
            agent: ureq::AgentBuilder::new().build(),
        }
    }

    fn url(&self, path: &str) -> String {
        format!("{}{path}", self.base)
    }

    /// GET with auth header, 429 retry and JSON decode.
    fn get_json(&self, url: &str, timeout: Duration) -> Result<Value, ApiError> {
        let response = self.with_rate_limit_retry(url, || {
            self.agent
                .get(url)
                .set("X-API-KEY", &self.token)
                .timeout(timeout)
                .call()
        })?;
        response.into_json::<Value>().map_err(|e| ApiError::BadResponse {
            url: url.to_string(),
            reason: e.to_string(),
        })
    }

    /// PUT with auth header and 429 retry; body logged on non-200.
    fn put_json(&self, url: &str, payload: &Value) -> Result<(), ApiError> {
        let result = self.with_rate_limit_retry(url, || {
            self.agent
                .put(url)
                .set("X-API-KEY", &self.token)
                .timeout(WRITE_TIMEOUT)
                .send_json(payload.clone())
        });
        match result {
            Ok(_) => Ok(()),
            Err(err) => {
                if let ApiError::Status { status, body, .. } = &err {
                    log::error!("{url} update failed: {status} {body}");
                }
                Err(err)
            }
        }
    }

    fn with_rate_limit_retry(
        &self,
        url: &str,
        mut call: impl FnMut() -> Result<ureq::Response, ureq::Error>,
    ) -> Result<ureq::Response, ApiError> {
        let mut attempt = 0;
        loop {
            attempt += 1;
            match call() {
                Ok(response) => return Ok(response),
                Err(ureq::Error::Status(429, _)) if attempt < RATE_LIMIT_ATTEMPTS => {
                    log::warn!(
                        "HTTP 429 from {url}; retrying in {}s (attempt {attempt}/{RATE_LIMIT_ATTEMPTS})",
                        RATE_LIMIT_SLEEP.as_secs()
                    );
                    thread::sleep(RATE_LIMIT_SLEEP);
                }
                Err(err) => return Err(ApiError::from_ureq(url, err)),
            }
        }
    }

    fn list(&self, path: &str, kind: RecordKind) -> Result<Vec<ScriptRecord>, ApiError> {
        let url = self.url(path);
        log::info!("Fetching: {url}");
        let value = self.get_json(&url, READ_TIMEOUT)?;
        let Value::Array(entries) = value else {
            return Err(ApiError::BadResponse {
                url,
                reason: "listing is not a JSON array".to_string(),
            });
        };

        let mut records = Vec::with_capacity(entries.len());
        for entry in entries {
            match ScriptRecord::from_listing(entry, kind) {
                Ok(record) => records.push(record),
                Err(err) => log::warn!("skipping undecodable {} entry: {err}", kind.label()),
            }
        }
        Ok(records)
    }
}

impl RemoteApi for HttpApi {
    fn check_read_access(&self) -> Result<(), ApiError> {
        let url = self.url("/scripts/");
        self.with_rate_limit_retry(&url, || {
            self.agent
                .get(&url)
                .set("X-API-KEY", &self.token)
                .timeout(HEALTH_TIMEOUT)
                .call()
        })
        .map(|_| ())
    }

    fn list_scripts(&self) -> Result<Vec<ScriptRecord>, ApiError> {
        self.list("/scripts/?showHiddenScripts=true", RecordKind::Script)
    }

    fn list_snippets(&self) -> Result<Vec<ScriptRecord>, ApiError> {
        self.list("/scripts/snippets/", RecordKind::Snippet)
    }

    fn fetch_script_body(&self, id: ScriptId) -> Result<Value, ApiError> {
        let url = self.url(&format!("/scripts/{id}/download/?with_snippets=false"));
        log::info!("Fetching: {url}");
        self.get_json(&url, READ_TIMEOUT)
    }

    fn update_script(&self, id: ScriptId, payload: Map<String, Value>) -> Result<(), ApiError> {
        let url = self.url(&format!("/scripts/{id}/"));
        let payload = rename_body_field(payload, "script_body");
        log_update("script", id, &payload, "script_body");
        self.put_json(&url, &Value::Object(payload))
    }

    fn update_snippet(&self, id: ScriptId, payload: Map<String, Value>) -> Result<(), ApiError> {
        let url = self.url(&format!("/scripts/snippets/{id}/"));
        log_update("snippet", id, &payload, "code");
        self.put_json(&url, &Value::Object(payload))
    }
}

/// Move the body from `code` to the field name a given endpoint expects.
pub fn rename_body_field(
    mut payload: Map<String, Value>,
    target: &str,
) -> Map<String, Value> {
    if target != "code" {
        let body = payload.remove("code").unwrap_or(Value::String(String::new()));
        payload.insert(target.to_string(), body);
    }
    payload
}

fn log_update(kind: &str, id: ScriptId, payload: &Map<String, Value>, body_field: &str) {
    let body = payload
        .get(body_field)
        .and_then(Value::as_str)
        .unwrap_or_default();
    let preview: String = body.chars().take(200).collect();
    log::info!(
        "Updating {kind} {id}, length: {}, preview: {preview}{}",
        body.len(),
        if body.len() > 200 { "…" } else { "" }
    );
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn script_payload_moves_code_to_script_body() {
        let payload = json!({ "id": 7, "code": "Write-Host 1" });
        let Value::Object(payload) = payload else { unreachable!() };
        let renamed = rename_body_field(payload, "script_body");
        assert_eq!(renamed.get("script_body"), Some(&json!("Write-Host 1")));
        assert!(renamed.get("code").is_none());
    }

    #[test]
    fn snippet_payload_keeps_code_field() {
        let payload = json!({ "id": 3, "code": "pass" });
        let Value::Object(payload) = payload else { unreachable!() };
        let renamed = rename_body_field(payload, "code");
        assert_eq!(renamed.get("code"), Some(&json!("pass")));
    }

    #[test]
    fn missing_code_becomes_empty_body() {
        let payload = json!({ "id": 7 });
        let Value::Object(payload) = payload else { unreachable!() };
        let renamed = rename_body_field(payload, "script_body");
        assert_eq!(renamed.get("script_body"), Some(&json!("")));
    }
}
