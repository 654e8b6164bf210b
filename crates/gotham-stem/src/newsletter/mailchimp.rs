use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::config::MailchimpConfig;

/// Member statuses understood by the mailing list.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MemberStatus {
    Subscribed,
    Unsubscribed,
    Cleaned,
    Pending,
    Transactional,
}

impl MemberStatus {
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Subscribed => "subscribed",
            Self::Unsubscribed => "unsubscribed",
            Self::Cleaned => "cleaned",
            Self::Pending => "pending",
            Self::Transactional => "transactional",
        }
    }
}

/// One page of list members.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct MemberPage {
    pub emails: Vec<String>,
    pub total_items: usize,
}

#[derive(Debug, thiserror::Error)]
pub enum MailingListError {
    #[error("mailing list request failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("mailing list answered with status {status}: {detail}")]
    Api { status: u16, detail: String },
}

/// Remote audience that double opt-in signups are pushed to.
#[async_trait]
pub trait MailingList: Send + Sync {
    async fn add_member(&self, email: &str, status: MemberStatus) -> Result<(), MailingListError>;

    async fn members(
        &self,
        status: MemberStatus,
        offset: usize,
        count: usize,
    ) -> Result<MemberPage, MailingListError>;
}

#[derive(Debug, Serialize)]
struct NewMember<'a> {
    email_address: &'a str,
    status: MemberStatus,
}

#[derive(Debug, Deserialize)]
struct MembersResponse {
    #[serde(default)]
    members: Vec<MemberEntry>,
    #[serde(default)]
    total_items: usize,
}

#[derive(Debug, Deserialize)]
struct MemberEntry {
    email_address: String,
}

#[derive(Debug, Default, Deserialize)]
struct ApiProblem {
    #[serde(default)]
    title: String,
    #[serde(default)]
    detail: String,
}

/// Marketing API v3 client for a single audience.
pub struct MailchimpClient {
    client: reqwest::Client,
    base_url: String,
    api_key: String,
    audience_id: String,
}

impl MailchimpClient {
    pub fn new(config: &MailchimpConfig) -> Result<Self, MailingListError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(15))
            .build()?;
        Ok(Self {
            client,
            base_url: format!("https://{}.api.mailchimp.com/3.0", config.server),
            api_key: config.api_key.clone(),
            audience_id: config.audience_id.clone(),
        })
    }

    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    fn members_url(&self) -> String {
        format!("{}/lists/{}/members", self.base_url, self.audience_id)
    }

    async fn check(response: reqwest::Response) -> Result<reqwest::Response, MailingListError> {
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }
        let text = response.text().await.unwrap_or_default();
        let problem: ApiProblem = serde_json::from_str(&text).unwrap_or_default();
        let detail = match (problem.title.is_empty(), problem.detail.is_empty()) {
            (false, false) => format!("{}: {}", problem.title, problem.detail),
            (false, true) => problem.title,
            (true, false) => problem.detail,
            (true, true) => text,
        };
        Err(MailingListError::Api {
            status: status.as_u16(),
            detail,
        })
    }
}

#[async_trait]
impl MailingList for MailchimpClient {
    async fn add_member(&self, email: &str, status: MemberStatus) -> Result<(), MailingListError> {
        let response = self
            .client
            .post(self.members_url())
            .basic_auth("gotham-stem", Some(&self.api_key))
            .json(&NewMember {
                email_address: email,
                status,
            })
            .send()
            .await?;
        Self::check(response).await?;
        Ok(())
    }

    async fn members(
        &self,
        status: MemberStatus,
        offset: usize,
        count: usize,
    ) -> Result<MemberPage, MailingListError> {
        let response = self
            .client
            .get(self.members_url())
            .basic_auth("gotham-stem", Some(&self.api_key))
            .query(&[
                ("status", status.as_str().to_string()),
                ("offset", offset.to_string()),
                ("count", count.to_string()),
                ("fields", "members.email_address,total_items".to_string()),
            ])
            .send()
            .await?;
        let parsed: MembersResponse = Self::check(response).await?.json().await?;
        Ok(MemberPage {
            emails: parsed
                .members
                .into_iter()
                .map(|member| member.email_address)
                .collect(),
            total_items: parsed.total_items,
        })
    }
}
