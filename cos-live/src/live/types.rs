//! Live Channel Data Structures

use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Utc};
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};

use super::consts::{
    DEFAULT_FRAG_COUNT, DEFAULT_FRAG_DURATION, DEFAULT_MAX_KEYS, DEFAULT_PLAYLIST_NAME,
    DEFAULT_TARGET_TYPE,
};
use crate::error::LiveChannelError;
use crate::transport::ResponseHeaders;

/// Successful call: the parsed value plus response metadata
#[derive(Debug, Clone)]
pub struct ApiResponse<T> {
    pub status: StatusCode,
    pub request_id: Option<String>,
    pub headers: ResponseHeaders,
    pub data: T,
}

impl<T> ApiResponse<T> {
    pub fn map<U>(self, f: impl FnOnce(T) -> U) -> ApiResponse<U> {
        ApiResponse {
            status: self.status,
            request_id: self.request_id,
            headers: self.headers,
            data: f(self.data),
        }
    }
}

/// Channel enabled/disabled switch
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChannelSwitch {
    #[default]
    Enabled,
    Disabled,
}

impl ChannelSwitch {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Enabled => "enabled",
            Self::Disabled => "disabled",
        }
    }
}

impl fmt::Display for ChannelSwitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for ChannelSwitch {
    type Err = LiveChannelError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "enabled" => Ok(Self::Enabled),
            "disabled" => Ok(Self::Disabled),
            other => Err(LiveChannelError::InvalidInput(format!(
                "invalid channel switch '{other}', expected enabled or disabled"
            ))),
        }
    }
}

/// Playback target of a channel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelTarget {
    /// Target type, `HLS`
    #[serde(rename = "type")]
    pub kind: String,
    pub playlist_name: String,
    /// Fragment duration in seconds
    pub frag_duration: u32,
    /// Number of fragments kept in the playlist
    pub frag_count: u32,
}

impl Default for ChannelTarget {
    fn default() -> Self {
        Self {
            kind: DEFAULT_TARGET_TYPE.to_string(),
            playlist_name: DEFAULT_PLAYLIST_NAME.to_string(),
            frag_duration: DEFAULT_FRAG_DURATION,
            frag_count: DEFAULT_FRAG_COUNT,
        }
    }
}

/// Live channel configuration
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ChannelConfiguration {
    pub name: String,
    pub description: String,
    pub switch: ChannelSwitch,
    pub target: ChannelTarget,
}

impl ChannelConfiguration {
    /// Configuration with the service defaults (enabled, HLS, `playlist.m3u8`, 5s x 3)
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    #[must_use]
    pub fn with_switch(mut self, switch: ChannelSwitch) -> Self {
        self.switch = switch;
        self
    }

    #[must_use]
    pub fn with_target(mut self, target: ChannelTarget) -> Self {
        self.target = target;
        self
    }
}

/// Publish and play URLs returned when a channel is created
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChannelUrls {
    pub publish_urls: Vec<String>,
    pub play_urls: Vec<String>,
}

/// Runtime status of a channel
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChannelStat {
    /// `Idle` or `Live`
    pub pushflow_status: String,
    pub connected_time: String,
    pub remote_addr: String,
}

impl ChannelStat {
    #[must_use]
    pub fn is_live(&self) -> bool {
        self.pushflow_status.eq_ignore_ascii_case("live")
    }

    #[must_use]
    pub fn connected_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.connected_time)
    }
}

/// One entry of a channel listing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ChannelListing {
    pub name: String,
    pub description: String,
    pub status: String,
    pub last_modified: String,
    pub publish_urls: Vec<String>,
    pub play_urls: Vec<String>,
}

impl ChannelListing {
    #[must_use]
    pub fn last_modified_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.last_modified)
    }
}

/// Filter and cursor for one page of a channel listing
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ListChannelsParams {
    pub prefix: String,
    pub marker: String,
    pub max_keys: u32,
}

impl Default for ListChannelsParams {
    fn default() -> Self {
        Self {
            prefix: String::new(),
            marker: String::new(),
            max_keys: DEFAULT_MAX_KEYS,
        }
    }
}

impl ListChannelsParams {
    #[must_use]
    pub fn with_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.prefix = prefix.into();
        self
    }

    #[must_use]
    pub fn with_marker(mut self, marker: impl Into<String>) -> Self {
        self.marker = marker.into();
        self
    }

    #[must_use]
    pub fn with_max_keys(mut self, max_keys: u32) -> Self {
        self.max_keys = max_keys;
        self
    }

    /// Params for the page after `result`, or `None` when `result` was the last page
    #[must_use]
    pub fn next_page(&self, result: &ListChannelsResult) -> Option<Self> {
        if !result.truncated || result.next_marker.is_empty() {
            return None;
        }
        Some(Self {
            marker: result.next_marker.clone(),
            ..self.clone()
        })
    }
}

/// One page of a channel listing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ListChannelsResult {
    pub channels: Vec<ChannelListing>,
    /// Marker for the next page; empty unless `truncated`
    pub next_marker: String,
    pub truncated: bool,
}

/// One historical publish session
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct HistoryRecord {
    pub start_time: String,
    pub end_time: String,
    pub remote_addr: String,
    pub request_id: String,
}

impl HistoryRecord {
    #[must_use]
    pub fn started_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.start_time)
    }

    #[must_use]
    pub fn ended_at(&self) -> Option<DateTime<Utc>> {
        parse_timestamp(&self.end_time)
    }
}

fn parse_timestamp(value: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(value.trim())
        .ok()
        .map(|dt| dt.with_timezone(&Utc))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_configuration_defaults() {
        let config = ChannelConfiguration::new("ch1").with_description("test live channel");
        assert_eq!(config.name, "ch1");
        assert_eq!(config.description, "test live channel");
        assert_eq!(config.switch, ChannelSwitch::Enabled);
        assert_eq!(config.target.kind, "HLS");
        assert_eq!(config.target.playlist_name, "playlist.m3u8");
        assert_eq!(config.target.frag_duration, 5);
        assert_eq!(config.target.frag_count, 3);
    }

    #[test]
    fn test_switch_parse() {
        assert_eq!("Enabled".parse::<ChannelSwitch>().unwrap(), ChannelSwitch::Enabled);
        assert_eq!("disabled".parse::<ChannelSwitch>().unwrap(), ChannelSwitch::Disabled);
        assert!("on".parse::<ChannelSwitch>().is_err());
        assert_eq!(ChannelSwitch::Disabled.to_string(), "disabled");
    }

    #[test]
    fn test_next_page() {
        let params = ListChannelsParams::default().with_prefix("ch").with_max_keys(1);

        let truncated = ListChannelsResult {
            channels: vec![ChannelListing::default()],
            next_marker: "ch2".to_string(),
            truncated: true,
        };
        let next = params.next_page(&truncated).unwrap();
        assert_eq!(next.marker, "ch2");
        assert_eq!(next.prefix, "ch");
        assert_eq!(next.max_keys, 1);

        let last = ListChannelsResult::default();
        assert!(params.next_page(&last).is_none());
    }

    #[test]
    fn test_timestamps() {
        let record = HistoryRecord {
            start_time: "2016-07-30T01:53:21.000Z".to_string(),
            end_time: "garbage".to_string(),
            ..HistoryRecord::default()
        };
        assert_eq!(
            record.started_at().map(|t| t.timestamp()),
            Some(1_469_843_601)
        );
        assert!(record.ended_at().is_none());
    }

    #[test]
    fn test_api_response_map() {
        let resp = ApiResponse {
            status: StatusCode::OK,
            request_id: Some("id".to_string()),
            headers: ResponseHeaders::new(),
            data: 2,
        };
        let mapped = resp.map(|n| n * 2);
        assert_eq!(mapped.data, 4);
        assert_eq!(mapped.request_id.as_deref(), Some("id"));
    }
}
