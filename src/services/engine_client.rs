use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tracing::info;

use crate::errors::{InsightError, InsightResult};

/// One artifact row from the engine response. `filter_number` is present on
/// 3-element rows only.
#[derive(Debug, Clone, PartialEq)]
pub struct EngineArtifact {
    pub payload: String,
    pub tag: String,
    pub filter_number: Option<i64>,
}

/// Parsed engine response.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EngineResponse {
    pub images: Vec<EngineArtifact>,
    pub cleaned_csv: Option<String>,
}

/// Seam for the external analysis engine. One blocking round trip per
/// orchestration; exceeding the deadline is a terminal failure, not a
/// retryable timeout.
#[async_trait]
pub trait AnalysisEngine: Send + Sync {
    /// `POST {engine}/analyze-data`: full cleaning plus chart generation.
    async fn analyze(
        &self,
        source_url: &str,
        domain_type: Option<&str>,
    ) -> InsightResult<EngineResponse>;

    /// `POST {engine}/clean-data`: cleaning only.
    async fn clean(&self, source_url: &str) -> InsightResult<EngineResponse>;
}

/// HTTP client for the engine with a hard request deadline.
pub struct HttpAnalysisEngine {
    client: reqwest::Client,
    base_url: String,
}

impl HttpAnalysisEngine {
    pub fn new(base_url: String, timeout: Duration) -> anyhow::Result<Self> {
        let client = reqwest::Client::builder().timeout(timeout).build()?;
        Ok(Self {
            client,
            base_url: base_url.trim_end_matches('/').to_string(),
        })
    }

    async fn post(&self, path: &str, body: Value) -> InsightResult<Value> {
        let url = format!("{}{}", self.base_url, path);
        info!(url = %url, "calling analysis engine");

        let response = self
            .client
            .post(&url)
            .json(&body)
            .send()
            .await
            .map_err(|e| {
                if e.is_timeout() {
                    InsightError::EngineTimeout
                } else {
                    InsightError::EngineUnreachable(e.to_string())
                }
            })?;

        let status = response.status();
        if !status.is_success() {
            return Err(InsightError::EngineStatus(status.as_u16()));
        }

        response
            .json::<Value>()
            .await
            .map_err(|e| InsightError::MalformedResponse(e.to_string()))
    }
}

#[async_trait]
impl AnalysisEngine for HttpAnalysisEngine {
    async fn analyze(
        &self,
        source_url: &str,
        domain_type: Option<&str>,
    ) -> InsightResult<EngineResponse> {
        let body = json!({
            "cloudinary_url": source_url,
            "domainType": domain_type,
        });
        let value = self.post("/analyze-data", body).await?;
        parse_analyze_response(&value)
    }

    async fn clean(&self, source_url: &str) -> InsightResult<EngineResponse> {
        let body = json!({ "cloudinary_url": source_url });
        let value = self.post("/clean-data", body).await?;
        parse_clean_response(&value)
    }
}

/// Parse an analyze-data response body. The `images` sequence is mandatory;
/// each entry is a `[payload, category]` or `[payload, category, filter]`
/// array. Anything else is a contract violation.
pub fn parse_analyze_response(value: &Value) -> InsightResult<EngineResponse> {
    let images = value
        .get("images")
        .ok_or_else(|| InsightError::MalformedResponse("missing 'images' field".to_string()))?
        .as_array()
        .ok_or_else(|| InsightError::MalformedResponse("'images' is not an array".to_string()))?;

    let mut parsed = Vec::with_capacity(images.len());
    for (index, entry) in images.iter().enumerate() {
        parsed.push(parse_image_entry(index, entry)?);
    }

    Ok(EngineResponse {
        images: parsed,
        cleaned_csv: cleaned_csv_of(value),
    })
}

/// Parse a clean-data response body. `cleaned_csv` is mandatory here.
pub fn parse_clean_response(value: &Value) -> InsightResult<EngineResponse> {
    let cleaned_csv = cleaned_csv_of(value).ok_or_else(|| {
        InsightError::MalformedResponse("missing 'cleaned_csv' field".to_string())
    })?;

    Ok(EngineResponse {
        images: Vec::new(),
        cleaned_csv: Some(cleaned_csv),
    })
}

fn cleaned_csv_of(value: &Value) -> Option<String> {
    value
        .get("cleaned_csv")
        .and_then(Value::as_str)
        .map(str::to_string)
}

fn parse_image_entry(index: usize, entry: &Value) -> InsightResult<EngineArtifact> {
    let row = entry.as_array().ok_or_else(|| {
        InsightError::MalformedResponse(format!("image entry {} is not an array", index))
    })?;
    if row.len() < 2 || row.len() > 3 {
        return Err(InsightError::MalformedResponse(format!(
            "image entry {} has {} elements",
            index,
            row.len()
        )));
    }

    let payload = row[0].as_str().ok_or_else(|| {
        InsightError::MalformedResponse(format!("image entry {} payload is not a string", index))
    })?;
    let tag = row[1].as_str().ok_or_else(|| {
        InsightError::MalformedResponse(format!("image entry {} category is not a string", index))
    })?;
    let filter_number = match row.get(2) {
        Some(value) => Some(value.as_i64().ok_or_else(|| {
            InsightError::MalformedResponse(format!(
                "image entry {} filter number is not an integer",
                index
            ))
        })?),
        None => None,
    };

    Ok(EngineArtifact {
        payload: payload.to_string(),
        tag: tag.to_string(),
        filter_number,
    })
}
