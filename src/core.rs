//! Core domain types and service traits for the contribution exporter
//!
//! This module defines the poll targets, the error type for a single poll,
//! and the trait contract between the exporter and the wiki API client.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// The wiki host queried when a target does not name one.
pub const DEFAULT_DOMAIN: &str = "en.wikipedia.org";

/// Accounts whose freshness is exported out of the box.
pub const DEFAULT_USERNAMES: [&str; 3] = [
    "ClueBot III",
    "ClueBot NG",
    "ClueBot NG Review Interface",
];

fn default_domain() -> String {
    DEFAULT_DOMAIN.to_string()
}

/// A single (username, domain) pair polled on every scrape.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct PollTarget {
    /// The account whose latest contribution is looked up.
    pub username: String,
    /// Wiki host serving the action API, e.g. `en.wikipedia.org`.
    #[serde(default = "default_domain")]
    pub domain: String,
}

impl PollTarget {
    /// Creates a target on an explicit domain.
    pub fn new(username: impl Into<String>, domain: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            domain: domain.into(),
        }
    }

    /// Creates a target on [`DEFAULT_DOMAIN`].
    pub fn on_default_domain(username: impl Into<String>) -> Self {
        Self::new(username, DEFAULT_DOMAIN)
    }

    /// The fixed target list used when nothing else is configured.
    pub fn defaults() -> Vec<Self> {
        DEFAULT_USERNAMES
            .iter()
            .map(|username| Self::on_default_domain(*username))
            .collect()
    }
}

impl std::fmt::Display for PollTarget {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}@{}", self.username, self.domain)
    }
}

/// Everything that can go wrong while polling one target.
///
/// An empty contribution list is not an error; sources report it as `Ok(None)`.
#[derive(Error, Debug)]
pub enum PollError {
    #[error("request to wiki API failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("wiki API returned non 200 for usercontribs query: {status}: {body}")]
    UnexpectedStatus {
        status: reqwest::StatusCode,
        body: String,
    },

    #[error("could not decode usercontribs response: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("invalid contribution timestamp '{value}': {source}")]
    Timestamp {
        value: String,
        #[source]
        source: chrono::ParseError,
    },
}

// =============================================================================
// Service Traits
// =============================================================================

/// Looks up the most recent contribution of an account.
#[async_trait]
pub trait ContributionSource: Send + Sync {
    /// Returns the timestamp of the newest contribution for `target`.
    ///
    /// # Returns
    /// * `Ok(Some(ts))` when at least one contribution exists
    /// * `Ok(None)` when the account has no contributions
    /// * `Err` for transport failures, non-200 responses and malformed bodies
    async fn latest_contribution(
        &self,
        target: &PollTarget,
    ) -> Result<Option<DateTime<Utc>>, PollError>;
}
