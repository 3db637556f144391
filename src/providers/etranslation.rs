/*!
 * HTTP client for the eTranslation document endpoint.
 *
 * Documents are posted as a multipart upload (`file` part plus `source` and
 * `target` form fields) to `translate/document`; the response body is the
 * job identifier. `translate/document/{id}` answers 200 with the translated
 * file once it is ready and a higher status while it is still running.
 * Every request carries HTTP basic authentication.
 */

use async_trait::async_trait;
use bytes::Bytes;
use log::{debug, error};
use reqwest::{Client, StatusCode, multipart};
use std::time::Duration;
use url::Url;

use crate::errors::{ProviderError, SubmissionError};

use super::{MachineTranslator, PollResult};

const PAYLOAD_FILENAME: &str = "sentences.txt";

/// eTranslation client
#[derive(Debug, Clone)]
pub struct ETranslation {
    /// HTTP client for API requests
    client: Client,
    /// Base URL, always ending in a slash
    base_url: Url,
    username: String,
    password: String,
}

impl ETranslation {
    /// Create a client for the service rooted at `endpoint`
    pub fn new(
        endpoint: &str,
        username: impl Into<String>,
        password: impl Into<String>,
        timeout_secs: u64,
    ) -> Result<Self, ProviderError> {
        let base_url = parse_base_url(endpoint)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ProviderError::ConnectionError(e.to_string()))?;

        Ok(Self {
            client,
            base_url,
            username: username.into(),
            password: password.into(),
        })
    }

    fn document_url(&self) -> Result<Url, ProviderError> {
        self.base_url
            .join("translate/document")
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))
    }

    fn job_url(&self, job_id: &str) -> Result<Url, ProviderError> {
        self.base_url
            .join(&format!("translate/document/{}", job_id))
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))
    }
}

/// Parse an endpoint so relative joins append to its path
pub(crate) fn parse_base_url(endpoint: &str) -> Result<Url, ProviderError> {
    let with_slash = if endpoint.ends_with('/') {
        endpoint.to_string()
    } else {
        format!("{}/", endpoint)
    };

    Url::parse(&with_slash).map_err(|e| ProviderError::ConnectionError(format!("Invalid endpoint {}: {}", endpoint, e)))
}

/// Read the job identifier from a submit response body.
///
/// The service answers with a JSON scalar (number or string); a negative
/// number is its way of refusing the job.
fn parse_job_id(body: &str) -> Result<String, SubmissionError> {
    let value: serde_json::Value = serde_json::from_str(body.trim())
        .map_err(|e| ProviderError::ParseError(format!("Unexpected job id response {:?}: {}", body, e)))?;

    match value {
        serde_json::Value::Number(n) if n.as_i64().is_some_and(|id| id < 0) => {
            Err(SubmissionError::Rejected(format!("backend returned error code {}", n)))
        }
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::String(s) if !s.trim().is_empty() => Ok(s.trim().to_string()),
        other => Err(ProviderError::ParseError(format!("Unexpected job id response: {}", other)).into()),
    }
}

#[async_trait]
impl MachineTranslator for ETranslation {
    async fn submit(&self, source: &str, target: &str, payload: Bytes) -> Result<String, SubmissionError> {
        let file = multipart::Part::bytes(payload.to_vec())
            .file_name(PAYLOAD_FILENAME)
            .mime_str("text/plain")
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;

        let form = multipart::Form::new()
            .text("source", source.to_string())
            .text("target", target.to_string())
            .part("file", file);

        let response = self
            .client
            .post(self.document_url()?)
            .basic_auth(&self.username, Some(&self.password))
            .multipart(form)
            .send()
            .await
            .map_err(|e| ProviderError::ConnectionError(format!("Failed to send document to eTranslation: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ProviderError::RequestFailed(format!("Failed to read eTranslation response: {}", e)))?;

        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ProviderError::AuthenticationError(format!("eTranslation refused credentials ({})", status)).into());
        }
        if status.is_client_error() {
            error!("eTranslation rejected document ({}): {}", status, body);
            return Err(SubmissionError::Rejected(format!("{}: {}", status, body)));
        }
        if !status.is_success() {
            error!("eTranslation API error ({}): {}", status, body);
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message: body,
            }
            .into());
        }

        let job_id = parse_job_id(&body)?;
        debug!("eTranslation accepted document as job {}", job_id);
        Ok(job_id)
    }

    async fn poll(&self, job_id: &str) -> Result<PollResult, ProviderError> {
        let response = self
            .client
            .get(self.job_url(job_id)?)
            .basic_auth(&self.username, Some(&self.password))
            .send()
            .await
            .map_err(|e| ProviderError::ConnectionError(format!("Failed to poll eTranslation job {}: {}", job_id, e)))?;

        let status = response.status();
        if status == StatusCode::UNAUTHORIZED || status == StatusCode::FORBIDDEN {
            return Err(ProviderError::AuthenticationError(format!("eTranslation refused credentials ({})", status)));
        }
        if status != StatusCode::OK {
            debug!("eTranslation job {} not finished (status {})", job_id, status);
            return Ok(PollResult::Pending);
        }

        let content = response
            .bytes()
            .await
            .map_err(|e| ProviderError::RequestFailed(format!("Failed to download translation of job {}: {}", job_id, e)))?;

        Ok(PollResult::Ready(content))
    }
}
