//! Translation backend capability.
//!
//! Every external translation service is expressed as one variant of
//! [`Backend`] exposing the same `translate(text, source, target)`
//! operation, so the orchestrator can compose them into an ordered
//! fallback list without caring about transport details.

use reqwest::Client;
use serde_json::json;
use thiserror::Error;

/// Errors from a single backend call.
///
/// All of these are caught per slot by the orchestrator, logged, and the
/// slot left empty; they never propagate to a request.
#[derive(Debug, Error)]
pub enum BackendError {
    #[error("request failed: {0}")]
    Http(#[from] reqwest::Error),

    #[error("backend returned status {0}")]
    Status(reqwest::StatusCode),

    #[error("backend API error: {0}")]
    Api(String),

    /// The per-backend lane shut down before the call completed.
    #[error("translation lane closed")]
    LaneClosed,

    #[error("no machine translation backend configured")]
    NoBackend,
}

/// One external translation service.
#[derive(Debug)]
pub enum Backend {
    /// Machine translation over a DeepLX/EasyNMT-style JSON endpoint:
    /// request `{"text","source_lang","target_lang"}`, response carrying
    /// the translated string under `data`, `text` or `result`.
    Machine {
        name: String,
        endpoint: String,
        client: Client,
    },

    /// Script-conversion service (zhconvert-style): converts between
    /// writing scripts of the same language, e.g. Simplified to
    /// Traditional Chinese. Request `{"text","converter"}`, response
    /// `{"code":0,"data":{"text":...}}`.
    ScriptConverter {
        name: String,
        endpoint: String,
        converter: String,
        client: Client,
    },

    #[cfg(test)]
    Mock(std::sync::Arc<mock::MockBackend>),
}

impl Backend {
    pub fn machine(name: impl Into<String>, endpoint: impl Into<String>, client: Client) -> Self {
        Self::Machine {
            name: name.into(),
            endpoint: endpoint.into(),
            client,
        }
    }

    pub fn script_converter(
        name: impl Into<String>,
        endpoint: impl Into<String>,
        converter: impl Into<String>,
        client: Client,
    ) -> Self {
        Self::ScriptConverter {
            name: name.into(),
            endpoint: endpoint.into(),
            converter: converter.into(),
            client,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            Self::Machine { name, .. } | Self::ScriptConverter { name, .. } => name,
            #[cfg(test)]
            Self::Mock(mock) => &mock.name,
        }
    }

    /// Translate `text` from `source` to `target`.
    ///
    /// A script converter ignores the language pair; it always applies its
    /// configured conversion.
    pub async fn translate(
        &self,
        text: &str,
        source: &str,
        target: &str,
    ) -> Result<String, BackendError> {
        match self {
            Self::Machine {
                endpoint, client, ..
            } => machine_translate(client, endpoint, text, source, target).await,
            Self::ScriptConverter {
                endpoint,
                converter,
                client,
                ..
            } => convert_script(client, endpoint, converter, text).await,
            #[cfg(test)]
            Self::Mock(mock) => mock.translate(text, target).await,
        }
    }
}

async fn machine_translate(
    client: &Client,
    endpoint: &str,
    text: &str,
    source: &str,
    target: &str,
) -> Result<String, BackendError> {
    let response = client
        .post(endpoint)
        .json(&json!({
            "text": text,
            "source_lang": source,
            "target_lang": target,
        }))
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(BackendError::Status(status));
    }

    let body: serde_json::Value = response.json().await?;
    body.get("data")
        .or_else(|| body.get("text"))
        .or_else(|| body.get("result"))
        .and_then(|v| v.as_str())
        .map(str::to_owned)
        .ok_or_else(|| BackendError::Api("unrecognized response shape".into()))
}

async fn convert_script(
    client: &Client,
    endpoint: &str,
    converter: &str,
    text: &str,
) -> Result<String, BackendError> {
    let response = client
        .post(endpoint)
        .json(&json!({
            "text": text,
            "converter": converter,
        }))
        .send()
        .await?;

    let status = response.status();
    if !status.is_success() {
        return Err(BackendError::Status(status));
    }

    let body: serde_json::Value = response.json().await?;
    let code = body.get("code").and_then(serde_json::Value::as_i64);
    if code != Some(0) {
        return Err(BackendError::Api(format!(
            "converter returned code {code:?}"
        )));
    }

    body.pointer("/data/text")
        .and_then(|v| v.as_str())
        .map(str::to_owned)
        .ok_or_else(|| BackendError::Api("converter response missing data.text".into()))
}
