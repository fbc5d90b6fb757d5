//! Capability seams for the dashboard's non-news data.
//!
//! Each capability has an oracle-backed or static implementation (the
//! "simulated" mode) and, where it makes sense, one reading a remote JSON
//! endpoint. Which one is used is a configuration decision.

mod remote;
mod simulated;

pub use remote::RemoteJsonSource;
pub use simulated::{
    OracleChannelFeed, OracleTranscription, StaticMetrics, GEOPOLITICAL_SAMPLES,
};

use crate::config::DEFAULT_CHANNELS;
use crate::error::BuildError;
use crate::prompt::IntentKind;
use crate::query::QueryResult;
use crate::types::{Asset, ChannelMessage, Metric};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// A non-empty, de-duplicated list of channel handles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct ChannelList(Vec<String>);

impl ChannelList {
    /// Parse a comma-separated list as typed in the monitor's input box.
    pub fn parse(raw: &str) -> Result<Self, BuildError> {
        Self::new(raw.split(','))
    }

    pub fn new<I, S>(channels: I) -> Result<Self, BuildError>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut list: Vec<String> = Vec::new();
        for channel in channels {
            let channel = channel.as_ref().trim();
            if !channel.is_empty() && !list.iter().any(|c| c == channel) {
                list.push(channel.to_string());
            }
        }

        if list.is_empty() {
            return Err(BuildError::BlankParam {
                intent: IntentKind::SimulateChannelFeed,
                param: "channels".into(),
            });
        }
        Ok(Self(list))
    }

    pub fn channels(&self) -> &[String] {
        &self.0
    }

    /// The form substituted into the channel-feed prompt.
    pub fn as_prompt_param(&self) -> String {
        self.0.join(", ")
    }
}

/// The monitor's stock channels.
impl Default for ChannelList {
    fn default() -> Self {
        Self(DEFAULT_CHANNELS.iter().map(|c| c.to_string()).collect())
    }
}

impl TryFrom<Vec<String>> for ChannelList {
    type Error = BuildError;

    fn try_from(value: Vec<String>) -> Result<Self, Self::Error> {
        Self::new(value)
    }
}

impl From<ChannelList> for Vec<String> {
    fn from(list: ChannelList) -> Self {
        list.0
    }
}

#[async_trait]
pub trait ChannelFeedSource: Send + Sync {
    async fn feed(&self, channels: &ChannelList) -> QueryResult<Vec<ChannelMessage>>;
}

#[async_trait]
pub trait TranscriptionSource: Send + Sync {
    async fn transcribe(&self) -> QueryResult<String>;
}

#[async_trait]
pub trait MetricsSource: Send + Sync {
    async fn metrics(&self) -> QueryResult<Vec<Metric>>;

    async fn assets(&self) -> QueryResult<Vec<Asset>>;
}
