//! Live channel XML codec
//!
//! Request bodies are written directly; response documents are read through
//! private wire structs and converted into the public types.

use std::fmt::Write;

use quick_xml::DeError;
use serde::de::{DeserializeOwned, Error as _};
use serde::Deserialize;

use super::types::{
    ChannelConfiguration, ChannelListing, ChannelStat, ChannelSwitch, ChannelTarget, ChannelUrls,
    HistoryRecord, ListChannelsResult,
};

/// `<LiveChannelConfiguration>` body for channel creation
#[must_use]
pub fn build_create_channel_body(config: &ChannelConfiguration) -> String {
    let mut xml = String::with_capacity(512);

    xml.push_str("<?xml version=\"1.0\" encoding=\"UTF-8\"?>\n");
    xml.push_str("<LiveChannelConfiguration>\n");
    let _ = writeln!(xml, "  <Name>{}</Name>", xml_escape(&config.name));
    let _ = writeln!(
        xml,
        "  <Description>{}</Description>",
        xml_escape(&config.description)
    );
    let _ = writeln!(xml, "  <Switch>{}</Switch>", config.switch);
    xml.push_str("  <Target>\n");
    let _ = writeln!(xml, "    <Type>{}</Type>", xml_escape(&config.target.kind));
    let _ = writeln!(
        xml,
        "    <FragDuration>{}</FragDuration>",
        config.target.frag_duration
    );
    let _ = writeln!(xml, "    <FragCount>{}</FragCount>", config.target.frag_count);
    let _ = writeln!(
        xml,
        "    <PlaylistName>{}</PlaylistName>",
        xml_escape(&config.target.playlist_name)
    );
    xml.push_str("  </Target>\n");
    xml.push_str("</LiveChannelConfiguration>\n");

    xml
}

fn xml_escape(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
        .replace('\'', "&apos;")
}

// ---------------------------------------------------------------------------
// Wire documents
// ---------------------------------------------------------------------------

#[derive(Debug, Default, Deserialize)]
struct UrlListXml {
    #[serde(rename = "Url", default)]
    urls: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct CreateResultXml {
    #[serde(rename = "PublishUrls", default)]
    publish_urls: UrlListXml,
    #[serde(rename = "PlayUrls", default)]
    play_urls: UrlListXml,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct TargetXml {
    #[serde(rename = "Type")]
    kind: String,
    #[serde(rename = "FragDuration")]
    frag_duration: u32,
    #[serde(rename = "FragCount")]
    frag_count: u32,
    #[serde(rename = "PlaylistName")]
    playlist_name: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ConfigurationXml {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Description")]
    description: String,
    #[serde(rename = "Switch")]
    switch: String,
    #[serde(rename = "Target")]
    target: TargetXml,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct StatXml {
    #[serde(rename = "PushflowStatus")]
    pushflow_status: String,
    #[serde(rename = "ConnectedTime")]
    connected_time: String,
    #[serde(rename = "RemoteAddr")]
    remote_addr: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ListingXml {
    #[serde(rename = "Name")]
    name: String,
    #[serde(rename = "Description")]
    description: String,
    #[serde(rename = "Status")]
    status: String,
    #[serde(rename = "LastModified")]
    last_modified: String,
    #[serde(rename = "PublishUrls")]
    publish_urls: UrlListXml,
    #[serde(rename = "PlayUrls")]
    play_urls: UrlListXml,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ListResultXml {
    #[serde(rename = "IsTruncated")]
    is_truncated: bool,
    #[serde(rename = "NextMarker")]
    next_marker: String,
    #[serde(rename = "LiveChannel")]
    channels: Vec<ListingXml>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct RecordXml {
    #[serde(rename = "StartTime")]
    start_time: String,
    #[serde(rename = "EndTime")]
    end_time: String,
    #[serde(rename = "RemoteAddr")]
    remote_addr: String,
    #[serde(rename = "RequestId")]
    request_id: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct HistoryXml {
    #[serde(rename = "LiveRecord")]
    records: Vec<RecordXml>,
}

/// Vendor `<Error>` document
#[derive(Debug, Default, Deserialize)]
#[serde(default)]
pub struct ErrorXml {
    #[serde(rename = "Code")]
    pub code: String,
    #[serde(rename = "Message")]
    pub message: String,
    #[serde(rename = "RequestId")]
    pub request_id: String,
}

fn from_body<T: DeserializeOwned>(body: &[u8]) -> Result<T, DeError> {
    let text = std::str::from_utf8(body).map_err(DeError::custom)?;
    if text.trim().is_empty() {
        return Err(DeError::custom("empty response body"));
    }
    quick_xml::de::from_str(text)
}

// ---------------------------------------------------------------------------
// Parsers
// ---------------------------------------------------------------------------

pub fn parse_create_channel(body: &[u8]) -> Result<ChannelUrls, DeError> {
    let doc: CreateResultXml = from_body(body)?;
    Ok(ChannelUrls {
        publish_urls: doc.publish_urls.urls,
        play_urls: doc.play_urls.urls,
    })
}

/// Parse `<LiveChannelConfiguration>`; a missing `Switch` reads as enabled
pub fn parse_channel_info(body: &[u8]) -> Result<ChannelConfiguration, DeError> {
    let doc: ConfigurationXml = from_body(body)?;
    let switch = if doc.switch.trim().is_empty() {
        ChannelSwitch::default()
    } else {
        doc.switch.parse::<ChannelSwitch>().map_err(DeError::custom)?
    };

    Ok(ChannelConfiguration {
        name: doc.name,
        description: doc.description,
        switch,
        target: ChannelTarget {
            kind: doc.target.kind,
            playlist_name: doc.target.playlist_name,
            frag_duration: doc.target.frag_duration,
            frag_count: doc.target.frag_count,
        },
    })
}

pub fn parse_channel_stat(body: &[u8]) -> Result<ChannelStat, DeError> {
    let doc: StatXml = from_body(body)?;
    Ok(ChannelStat {
        pushflow_status: doc.pushflow_status,
        connected_time: doc.connected_time,
        remote_addr: doc.remote_addr,
    })
}

/// Parse `<ListLiveChannelResult>`; `next_marker` is cleared unless truncated
pub fn parse_channel_list(body: &[u8]) -> Result<ListChannelsResult, DeError> {
    let doc: ListResultXml = from_body(body)?;
    let next_marker = if doc.is_truncated {
        doc.next_marker
    } else {
        String::new()
    };

    Ok(ListChannelsResult {
        channels: doc
            .channels
            .into_iter()
            .map(|c| ChannelListing {
                name: c.name,
                description: c.description,
                status: c.status,
                last_modified: c.last_modified,
                publish_urls: c.publish_urls.urls,
                play_urls: c.play_urls.urls,
            })
            .collect(),
        next_marker,
        truncated: doc.is_truncated,
    })
}

pub fn parse_channel_history(body: &[u8]) -> Result<Vec<HistoryRecord>, DeError> {
    let doc: HistoryXml = from_body(body)?;
    Ok(doc
        .records
        .into_iter()
        .map(|r| HistoryRecord {
            start_time: r.start_time,
            end_time: r.end_time,
            remote_addr: r.remote_addr,
            request_id: r.request_id,
        })
        .collect())
}

pub fn parse_error_body(body: &[u8]) -> Result<ErrorXml, DeError> {
    from_body(body)
}
