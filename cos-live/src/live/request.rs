//! Request builders for live channel operations
//!
//! Each builder turns operation arguments into a [`CosRequest`] without any
//! I/O. Inputs are checked here so a bad call never reaches the network.

use reqwest::header::{HeaderValue, CONTENT_TYPE, EXPECT, TRANSFER_ENCODING};
use reqwest::Method;

use super::consts::{
    Comp, COMP, END_TIME, LIVE, MARKER, MAX_KEYS, MULTIPART_CONTENT_TYPE, PREFIX, START_TIME,
    SWITCH, VOD, XML_CONTENT_TYPE,
};
use super::types::{ChannelConfiguration, ChannelSwitch, ListChannelsParams};
use super::xml;
use crate::error::LiveChannelError;
use crate::transport::CosRequest;

fn require(field: &str, value: &str) -> Result<(), LiveChannelError> {
    if value.trim().is_empty() {
        return Err(LiveChannelError::InvalidInput(format!(
            "{field} must not be empty"
        )));
    }
    Ok(())
}

/// `{method} /{channel}?live`
fn channel_request(
    operation: &'static str,
    method: Method,
    bucket: &str,
    channel: &str,
) -> Result<CosRequest, LiveChannelError> {
    require("bucket", bucket)?;
    require("channel name", channel)?;
    Ok(CosRequest::new(operation, method, bucket)
        .with_resource(channel)
        .with_query(LIVE, ""))
}

pub fn create_channel(
    bucket: &str,
    config: &ChannelConfiguration,
) -> Result<CosRequest, LiveChannelError> {
    let body = xml::build_create_channel_body(config);
    Ok(
        channel_request("create_channel", Method::PUT, bucket, &config.name)?
            .with_header(CONTENT_TYPE, HeaderValue::from_static(XML_CONTENT_TYPE))
            .with_body(body),
    )
}

/// The switch request carries no body and must go out with
/// `Content-Length: 0`, never `Expect` or chunked encoding.
pub fn switch_channel(
    bucket: &str,
    channel: &str,
    switch: ChannelSwitch,
) -> Result<CosRequest, LiveChannelError> {
    Ok(channel_request("switch_channel", Method::PUT, bucket, channel)?
        .with_query(SWITCH, switch.as_str())
        .forbid_header(EXPECT)
        .forbid_header(TRANSFER_ENCODING))
}

pub fn get_channel_info(bucket: &str, channel: &str) -> Result<CosRequest, LiveChannelError> {
    channel_request("get_channel_info", Method::GET, bucket, channel)
}

pub fn get_channel_stat(bucket: &str, channel: &str) -> Result<CosRequest, LiveChannelError> {
    Ok(channel_request("get_channel_stat", Method::GET, bucket, channel)?
        .with_query(COMP, Comp::Stat.as_str()))
}

pub fn delete_channel(bucket: &str, channel: &str) -> Result<CosRequest, LiveChannelError> {
    channel_request("delete_channel", Method::DELETE, bucket, channel)
}

/// `GET /?live` on the bucket; empty `prefix`/`marker` are left out
pub fn list_channels(
    bucket: &str,
    params: &ListChannelsParams,
) -> Result<CosRequest, LiveChannelError> {
    require("bucket", bucket)?;
    if params.max_keys == 0 {
        return Err(LiveChannelError::InvalidInput(
            "max_keys must be greater than 0".to_string(),
        ));
    }

    let mut request = CosRequest::new("list_channels", Method::GET, bucket).with_query(LIVE, "");
    if !params.prefix.is_empty() {
        request = request.with_query(PREFIX, params.prefix.as_str());
    }
    if !params.marker.is_empty() {
        request = request.with_query(MARKER, params.marker.as_str());
    }
    Ok(request.with_query(MAX_KEYS, params.max_keys.to_string()))
}

pub fn get_channel_history(bucket: &str, channel: &str) -> Result<CosRequest, LiveChannelError> {
    Ok(
        channel_request("get_channel_history", Method::GET, bucket, channel)?
            .with_query(COMP, Comp::History.as_str()),
    )
}

/// `POST /{channel}/{playlist}?vod&starttime=..&endtime=..`
///
/// The time range goes out as given; the service decides what it covers.
pub fn generate_vod_playlist(
    bucket: &str,
    channel: &str,
    playlist: &str,
    start_time: i64,
    end_time: i64,
) -> Result<CosRequest, LiveChannelError> {
    require("bucket", bucket)?;
    require("channel name", channel)?;
    require("playlist name", playlist)?;

    Ok(
        CosRequest::new("generate_vod_playlist", Method::POST, bucket)
            .with_resource(format!("{channel}/{playlist}"))
            .with_query(VOD, "")
            .with_query(START_TIME, start_time.to_string())
            .with_query(END_TIME, end_time.to_string())
            .with_header(CONTENT_TYPE, HeaderValue::from_static(MULTIPART_CONTENT_TYPE)),
    )
}
