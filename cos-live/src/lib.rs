// COS Live Channel Client
//
// Client SDK for the COS live channel API (RTMP ingest, HLS playback).
// Each operation builds one request, hands it to a `RequestExecutor` for
// signing and transport, and parses the XML response into a typed value.
//
// Architecture:
// - live: channel operations (request builders, XML codec, client)
// - transport: request model, executor trait, reqwest-based executor
// - auth: COS request and RTMP URL signing

pub mod auth;
pub mod config;
pub mod error;
pub mod live;
pub mod logging;
pub mod transport;

#[cfg(test)]
pub(crate) mod test_helpers;

pub use auth::CosSigner;
pub use config::{CosConfig, LoggingConfig};
pub use error::LiveChannelError;
pub use live::{
    ApiResponse, ChannelConfiguration, ChannelListing, ChannelStat, ChannelSwitch, ChannelTarget,
    ChannelUrls, HistoryRecord, ListChannelsParams, ListChannelsResult, LiveChannelClient,
};
pub use transport::{CosRequest, HttpExecutor, RawResponse, RequestExecutor, ResponseHeaders};
