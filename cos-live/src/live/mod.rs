//! Live channel operations
//!
//! ```text
//! LiveChannelClient ──> request (build CosRequest) ──> RequestExecutor
//!        ^                                                  │
//!        └──────────── xml (parse body) <── RawResponse <───┘
//! ```

mod client;
pub mod consts;
pub mod request;
pub mod types;
pub mod xml;

pub use client::LiveChannelClient;
pub use types::{
    ApiResponse, ChannelConfiguration, ChannelListing, ChannelStat, ChannelSwitch, ChannelTarget,
    ChannelUrls, HistoryRecord, ListChannelsParams, ListChannelsResult,
};
