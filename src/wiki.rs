//! A client for the MediaWiki action API `usercontribs` query.

use crate::config::ApiConfig;
use crate::core::{ContributionSource, PollError, PollTarget};
use anyhow::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::{header::USER_AGENT, StatusCode};
use serde::Deserialize;
use std::time::Duration;
use tracing::{debug, instrument};

#[derive(Debug, Default, Deserialize)]
struct UserContribsResponse {
    #[serde(default)]
    query: UserContribsQuery,
}

#[derive(Debug, Default, Deserialize)]
struct UserContribsQuery {
    #[serde(default)]
    usercontribs: Vec<UserContrib>,
}

#[derive(Debug, Deserialize)]
struct UserContrib {
    timestamp: String,
}

/// Parses a MediaWiki ISO-8601 timestamp into UTC.
pub fn parse_timestamp(value: &str) -> Result<DateTime<Utc>, PollError> {
    DateTime::parse_from_rfc3339(value)
        .map(|ts| ts.with_timezone(&Utc))
        .map_err(|source| PollError::Timestamp {
            value: value.to_string(),
            source,
        })
}

/// Queries `https://{domain}/w/api.php` for the newest contribution of a user.
pub struct WikiApiClient {
    client: reqwest::Client,
    scheme: String,
    base_url: Option<String>,
    user_agent: String,
}

impl WikiApiClient {
    /// Creates a new `WikiApiClient` from the API configuration.
    pub fn new(config: &ApiConfig) -> Result<Self> {
        let mut builder = reqwest::Client::builder();
        if let Some(secs) = config.timeout_seconds {
            builder = builder.timeout(Duration::from_secs(secs));
        }

        Ok(Self {
            client: builder.build()?,
            scheme: config.scheme.clone(),
            base_url: config.base_url.clone(),
            user_agent: config.user_agent.clone(),
        })
    }

    /// Returns the action API endpoint used for `domain`.
    pub fn api_url(&self, domain: &str) -> String {
        match &self.base_url {
            Some(base) => format!("{}/w/api.php", base.trim_end_matches('/')),
            None => format!("{}://{}/w/api.php", self.scheme, domain),
        }
    }
}

#[async_trait]
impl ContributionSource for WikiApiClient {
    #[instrument(skip(self, target), fields(username = %target.username, domain = %target.domain))]
    async fn latest_contribution(
        &self,
        target: &PollTarget,
    ) -> Result<Option<DateTime<Utc>>, PollError> {
        let response = self
            .client
            .get(self.api_url(&target.domain))
            .query(&[
                ("action", "query"),
                ("list", "usercontribs"),
                ("ucuser", target.username.as_str()),
                ("uclimit", "1"),
                ("format", "json"),
            ])
            .header(USER_AGENT, &self.user_agent)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            let body = response.text().await.unwrap_or_default();
            return Err(PollError::UnexpectedStatus { status, body });
        }

        let body = response.bytes().await?;
        let parsed: UserContribsResponse = serde_json::from_slice(&body)?;
        debug!(count = parsed.query.usercontribs.len(), "Received usercontribs");

        match parsed.query.usercontribs.first() {
            Some(contrib) => parse_timestamp(&contrib.timestamp).map(Some),
            None => Ok(None),
        }
    }
}
