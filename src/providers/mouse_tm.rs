/*!
 * HTTP client for the MOUSE translation memory.
 *
 * Endpoints, relative to the configured base URL:
 * - `GET get` lookup, `POST set` / `POST delete` (form) unit maintenance
 * - `POST tmx/import` multipart TMX upload
 * - `GET tu/amount` unit count as a plain-text integer
 * - `GET admin/tminfo` health and, with a key, the available language pairs
 */

use async_trait::async_trait;
use bytes::Bytes;
use log::{debug, error};
use reqwest::{Client, RequestBuilder, Response, multipart};
use serde::Deserialize;
use std::time::Duration;
use url::Url;

use crate::errors::ProviderError;

use super::etranslation::parse_base_url;
use super::{TmMatch, TranslationMemory};

/// Body of a `/get` response
#[derive(Debug, Deserialize)]
struct LookupResponse {
    #[serde(default)]
    matches: Vec<TmMatch>,
}

/// Body of an `admin/tminfo` response
#[derive(Debug, Deserialize)]
struct InfoResponse {
    #[serde(default, rename = "langPairs")]
    lang_pairs: Vec<serde_json::Value>,
}

/// MOUSE translation-memory client
#[derive(Debug, Clone)]
pub struct MouseTm {
    client: Client,
    base_url: Url,
}

impl MouseTm {
    /// Create a client for the memory rooted at `endpoint`
    pub fn new(endpoint: &str, timeout_secs: u64) -> Result<Self, ProviderError> {
        let base_url = parse_base_url(endpoint)?;
        let client = Client::builder()
            .timeout(Duration::from_secs(timeout_secs))
            .build()
            .map_err(|e| ProviderError::ConnectionError(e.to_string()))?;

        Ok(Self { client, base_url })
    }

    fn url(&self, path: &str) -> Result<Url, ProviderError> {
        self.base_url
            .join(path)
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))
    }

    /// Send a request and turn any non-success status into `ApiError`
    async fn send(&self, request: RequestBuilder) -> Result<Response, ProviderError> {
        let response = request
            .send()
            .await
            .map_err(|e| ProviderError::ConnectionError(format!("Failed to reach translation memory: {}", e)))?;

        let status = response.status();
        if !status.is_success() {
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Failed to get error response text".to_string());
            error!("Translation memory error ({}): {}", status, error_text);
            return Err(ProviderError::ApiError {
                status_code: status.as_u16(),
                message: error_text,
            });
        }

        Ok(response)
    }

    async fn send_text(&self, request: RequestBuilder) -> Result<String, ProviderError> {
        self.send(request)
            .await?
            .text()
            .await
            .map_err(|e| ProviderError::RequestFailed(format!("Failed to read translation memory response: {}", e)))
    }

    fn unit_form<'a>(key: &'a str, langpair: &'a str, segment: &'a str, translation: &'a str) -> [(&'static str, &'a str); 4] {
        [("key", key), ("langpair", langpair), ("seg", segment), ("tra", translation)]
    }
}

#[async_trait]
impl TranslationMemory for MouseTm {
    async fn lookup(&self, key: &str, langpair: &str, query: &str) -> Result<Vec<TmMatch>, ProviderError> {
        // Exact lookups only; concordance search would add partial hits
        let request = self
            .client
            .get(self.url("get")?)
            .query(&[("conc", "false"), ("key", key), ("langpair", langpair), ("q", query)]);

        parse_lookup_response(&self.send_text(request).await?)
    }

    async fn health(&self) -> Result<(), ProviderError> {
        self.send(self.client.get(self.url("admin/tminfo")?)).await?;
        Ok(())
    }

    async fn add_unit(&self, key: &str, langpair: &str, segment: &str, translation: &str) -> Result<(), ProviderError> {
        let request = self
            .client
            .post(self.url("set")?)
            .form(&Self::unit_form(key, langpair, segment, translation));

        self.send(request).await?;
        debug!("Stored translation unit for {:?} ({})", segment, langpair);
        Ok(())
    }

    async fn delete_unit(
        &self,
        key: &str,
        langpair: &str,
        segment: &str,
        translation: &str,
    ) -> Result<(), ProviderError> {
        let request = self
            .client
            .post(self.url("delete")?)
            .form(&Self::unit_form(key, langpair, segment, translation));

        self.send(request).await?;
        debug!("Deleted translation unit for {:?} ({})", segment, langpair);
        Ok(())
    }

    async fn import_tmx(&self, key: &str, name: &str, tmx: Bytes) -> Result<(), ProviderError> {
        let file = multipart::Part::bytes(tmx.to_vec())
            .file_name(format!("{}.tmx", name))
            .mime_str("application/xml")
            .map_err(|e| ProviderError::RequestFailed(e.to_string()))?;
        let form = multipart::Form::new()
            .text("key", key.to_string())
            .text("name", name.to_string())
            .part("tmx", file);

        self.send(self.client.post(self.url("tmx/import")?).multipart(form))
            .await?;
        Ok(())
    }

    async fn unit_count(&self, key: &str, langpair: &str) -> Result<u64, ProviderError> {
        let request = self
            .client
            .get(self.url("tu/amount")?)
            .query(&[("key", key), ("langpair", langpair)]);

        let body = self.send_text(request).await?;
        body.trim()
            .parse()
            .map_err(|e| ProviderError::ParseError(format!("Invalid unit count {:?}: {}", body, e)))
    }

    async fn language_pairs(&self, key: &str) -> Result<Vec<String>, ProviderError> {
        let request = self.client.get(self.url("admin/tminfo")?).query(&[("key", key)]);

        Ok(parse_language_pairs(&self.send_text(request).await?))
    }
}

fn parse_lookup_response(body: &str) -> Result<Vec<TmMatch>, ProviderError> {
    serde_json::from_str::<LookupResponse>(body)
        .map(|r| r.matches)
        .map_err(|e| ProviderError::ParseError(format!("Invalid translation memory response: {}", e)))
}

/// Language pairs from an info body; a body that is not JSON lists none
fn parse_language_pairs(body: &str) -> Vec<String> {
    match serde_json::from_str::<InfoResponse>(body) {
        Ok(info) => info
            .lang_pairs
            .into_iter()
            .map(|pair| match pair {
                serde_json::Value::String(s) => s,
                other => other.to_string(),
            })
            .collect(),
        Err(e) => {
            debug!("Translation memory info is not JSON: {}", e);
            Vec::new()
        }
    }
}
