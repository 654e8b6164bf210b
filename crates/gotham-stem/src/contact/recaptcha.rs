use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::RecaptchaConfig;

pub const CONTACT_ACTION: &str = "contact-us";
pub const DEFAULT_BASE_URL: &str = "https://recaptchaenterprise.googleapis.com";

/// Outcome of a bot-likelihood check.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Assessment {
    pub valid: bool,
    pub score: f32,
}

impl Assessment {
    pub fn passes(&self, threshold: f32) -> bool {
        self.valid && self.score >= threshold
    }
}

#[derive(Debug, thiserror::Error)]
pub enum ScoreError {
    #[error("scoring request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("scoring API answered with status {status}: {body}")]
    Status { status: u16, body: String },
}

/// Scores a client token for a named action.
#[async_trait]
pub trait BotScorer: Send + Sync {
    async fn assess(&self, token: &str, action: &str) -> Result<Assessment, ScoreError>;
}

#[derive(Debug, Serialize)]
struct AssessmentRequest<'a> {
    event: AssessmentEvent<'a>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AssessmentEvent<'a> {
    token: &'a str,
    expected_action: &'a str,
    site_key: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct AssessmentResponse {
    #[serde(default)]
    token_properties: TokenProperties,
    #[serde(default)]
    risk_analysis: RiskAnalysis,
}

#[derive(Debug, Default, Deserialize)]
struct TokenProperties {
    #[serde(default)]
    valid: bool,
}

#[derive(Debug, Default, Deserialize)]
struct RiskAnalysis {
    #[serde(default)]
    score: f32,
}

/// reCAPTCHA Enterprise assessments client.
pub struct RecaptchaClient {
    client: reqwest::Client,
    base_url: String,
    project_id: String,
    api_key: String,
    site_key: String,
}

impl RecaptchaClient {
    pub fn new(config: &RecaptchaConfig) -> Result<Self, ScoreError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(10))
            .build()?;
        Ok(Self {
            client,
            base_url: DEFAULT_BASE_URL.to_string(),
            project_id: config.project_id.clone(),
            api_key: config.api_key.clone(),
            site_key: config.site_key.clone(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1/projects/{}/assessments",
            self.base_url, self.project_id
        )
    }
}

#[async_trait]
impl BotScorer for RecaptchaClient {
    async fn assess(&self, token: &str, action: &str) -> Result<Assessment, ScoreError> {
        let request = AssessmentRequest {
            event: AssessmentEvent {
                token,
                expected_action: action,
                site_key: &self.site_key,
            },
        };

        let response = self
            .client
            .post(self.endpoint())
            .query(&[("key", self.api_key.as_str())])
            .json(&request)
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(ScoreError::Status { status, body });
        }

        let parsed: AssessmentResponse = response.json().await?;
        Ok(Assessment {
            valid: parsed.token_properties.valid,
            score: parsed.risk_analysis.score,
        })
    }
}
