//! Live channel wire constants
//!
//! Query keys and values below are fixed by the service API.

/// Selects the live channel sub-resource (`?live`)
pub const LIVE: &str = "live";
/// Channel switch value (`?live&switch=enabled`)
pub const SWITCH: &str = "switch";
/// Operation variant selector (`?live&comp=stat`)
pub const COMP: &str = "comp";
/// Selects VOD playlist generation (`?vod`)
pub const VOD: &str = "vod";
pub const START_TIME: &str = "starttime";
pub const END_TIME: &str = "endtime";

pub const PREFIX: &str = "prefix";
pub const MARKER: &str = "marker";
pub const MAX_KEYS: &str = "max-keys";

pub const MULTIPART_CONTENT_TYPE: &str = "multipart/form-data";
pub const XML_CONTENT_TYPE: &str = "application/xml";

/// RTMP application name in ingest URLs
pub const RTMP_APP: &str = "live";

pub const DEFAULT_TARGET_TYPE: &str = "HLS";
pub const DEFAULT_PLAYLIST_NAME: &str = "playlist.m3u8";
pub const DEFAULT_FRAG_DURATION: u32 = 5;
pub const DEFAULT_FRAG_COUNT: u32 = 3;
pub const DEFAULT_MAX_KEYS: u32 = 100;

/// Values of the `comp` selector
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Comp {
    Stat,
    History,
}

impl Comp {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Stat => "stat",
            Self::History => "history",
        }
    }
}
