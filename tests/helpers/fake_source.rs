#![allow(dead_code)]
//! A scripted contribution source for driving the exporter without network.

use async_trait::async_trait;
use cbng_monitoring::core::{ContributionSource, PollError, PollTarget};
use chrono::{DateTime, TimeZone, Utc};
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// What the fake answers for one username.
#[derive(Debug, Clone)]
pub enum Reply {
    Contribution(i64),
    NoContributions,
    Unavailable,
    BadTimestamp,
}

#[derive(Debug, Default)]
pub struct FakeSource {
    replies: Mutex<HashMap<String, Reply>>,
    delay: Mutex<Option<Duration>>,
    calls: AtomicUsize,
}

impl FakeSource {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn reply(&self, username: &str, reply: Reply) {
        self.replies
            .lock()
            .unwrap()
            .insert(username.to_string(), reply);
    }

    pub fn with_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = Some(delay);
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

#[async_trait]
impl ContributionSource for FakeSource {
    async fn latest_contribution(
        &self,
        target: &PollTarget,
    ) -> Result<Option<DateTime<Utc>>, PollError> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock().unwrap();
        if let Some(delay) = delay {
            tokio::time::sleep(delay).await;
        }

        let reply = self
            .replies
            .lock()
            .unwrap()
            .get(&target.username)
            .cloned()
            .unwrap_or(Reply::Unavailable);

        match reply {
            Reply::Contribution(secs) => Ok(Some(Utc.timestamp_opt(secs, 0).unwrap())),
            Reply::NoContributions => Ok(None),
            Reply::Unavailable => Err(PollError::UnexpectedStatus {
                status: reqwest::StatusCode::SERVICE_UNAVAILABLE,
                body: "unavailable".to_string(),
            }),
            Reply::BadTimestamp => cbng_monitoring::wiki::parse_timestamp("garbage").map(Some),
        }
    }
}
