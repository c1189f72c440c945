//! Live Channel Client

use std::sync::Arc;

use tracing::{debug, warn};

use super::request;
use super::types::{
    ApiResponse, ChannelConfiguration, ChannelStat, ChannelSwitch, ChannelUrls, HistoryRecord,
    ListChannelsParams, ListChannelsResult,
};
use super::xml;
use crate::auth::CosSigner;
use crate::config::CosConfig;
use crate::error::LiveChannelError;
use crate::transport::{CosRequest, HttpExecutor, RequestExecutor};

/// Client for the live channel API
///
/// Stateless between calls: every operation builds one request, awaits one
/// response and returns. Safe to share across tasks.
pub struct LiveChannelClient<E = HttpExecutor> {
    config: Arc<CosConfig>,
    signer: CosSigner,
    executor: E,
}

impl LiveChannelClient<HttpExecutor> {
    /// Create a client backed by the reqwest transport
    pub fn new(config: CosConfig) -> Result<Self, LiveChannelError> {
        let config = Arc::new(config);
        let executor = HttpExecutor::new(Arc::clone(&config))?;
        Ok(Self::with_executor(config, executor))
    }
}

impl<E: RequestExecutor> LiveChannelClient<E> {
    /// Create a client over a custom executor
    pub fn with_executor(config: impl Into<Arc<CosConfig>>, executor: E) -> Self {
        let config = config.into();
        Self {
            signer: CosSigner::from_config(&config),
            config,
            executor,
        }
    }

    #[must_use]
    pub fn config(&self) -> &CosConfig {
        &self.config
    }

    /// Create a channel; returns its publish and play URLs
    pub async fn create_channel(
        &self,
        bucket: &str,
        config: &ChannelConfiguration,
    ) -> Result<ApiResponse<ChannelUrls>, LiveChannelError> {
        let request = request::create_channel(bucket, config)?;
        self.send(request, xml::parse_create_channel).await
    }

    /// Enable or disable a channel
    pub async fn switch_channel(
        &self,
        bucket: &str,
        channel: &str,
        switch: ChannelSwitch,
    ) -> Result<ApiResponse<()>, LiveChannelError> {
        let request = request::switch_channel(bucket, channel, switch)?;
        self.send_empty(request).await
    }

    /// Fetch a channel's configuration
    ///
    /// The service omits the name from this document; the returned
    /// configuration always carries `channel` as its name.
    pub async fn get_channel_info(
        &self,
        bucket: &str,
        channel: &str,
    ) -> Result<ApiResponse<ChannelConfiguration>, LiveChannelError> {
        let request = request::get_channel_info(bucket, channel)?;
        let resp = self.send(request, xml::parse_channel_info).await?;
        Ok(resp.map(|mut info| {
            info.name = channel.to_string();
            info
        }))
    }

    pub async fn get_channel_stat(
        &self,
        bucket: &str,
        channel: &str,
    ) -> Result<ApiResponse<ChannelStat>, LiveChannelError> {
        let request = request::get_channel_stat(bucket, channel)?;
        self.send(request, xml::parse_channel_stat).await
    }

    pub async fn delete_channel(
        &self,
        bucket: &str,
        channel: &str,
    ) -> Result<ApiResponse<()>, LiveChannelError> {
        let request = request::delete_channel(bucket, channel)?;
        self.send_empty(request).await
    }

    /// Fetch one page of channels
    ///
    /// Use [`ListChannelsParams::next_page`] on the result to request the
    /// following page.
    pub async fn list_channels(
        &self,
        bucket: &str,
        params: &ListChannelsParams,
    ) -> Result<ApiResponse<ListChannelsResult>, LiveChannelError> {
        let request = request::list_channels(bucket, params)?;
        self.send(request, xml::parse_channel_list).await
    }

    /// Publish sessions of a channel, in server order
    pub async fn get_channel_history(
        &self,
        bucket: &str,
        channel: &str,
    ) -> Result<ApiResponse<Vec<HistoryRecord>>, LiveChannelError> {
        let request = request::get_channel_history(bucket, channel)?;
        self.send(request, xml::parse_channel_history).await
    }

    /// Generate a VOD playlist from the recorded fragments between the two
    /// Unix timestamps
    pub async fn generate_vod_playlist(
        &self,
        bucket: &str,
        channel: &str,
        playlist: &str,
        start_time: i64,
        end_time: i64,
    ) -> Result<ApiResponse<()>, LiveChannelError> {
        let request =
            request::generate_vod_playlist(bucket, channel, playlist, start_time, end_time)?;
        self.send_empty(request).await
    }

    /// Signed RTMP URL for a channel, valid for `expire_secs` from now
    ///
    /// Computed locally. Fails with [`LiveChannelError::Sign`] when no URL
    /// can be produced; never returns an empty string.
    pub fn signed_play_url(
        &self,
        bucket: &str,
        channel: &str,
        expire_secs: u64,
        extra_params: &[(String, String)],
    ) -> Result<String, LiveChannelError> {
        self.signed_play_url_at(
            bucket,
            channel,
            expire_secs,
            extra_params,
            chrono::Utc::now().timestamp(),
        )
    }

    /// [`Self::signed_play_url`] with an explicit start time
    pub fn signed_play_url_at(
        &self,
        bucket: &str,
        channel: &str,
        expire_secs: u64,
        extra_params: &[(String, String)],
        now: i64,
    ) -> Result<String, LiveChannelError> {
        if channel.trim().is_empty() {
            return Err(LiveChannelError::InvalidInput(
                "channel name must not be empty".to_string(),
            ));
        }
        let rtmp_uri = self.config.rtmp_uri(bucket, channel);
        self.signer
            .sign_rtmp_url(&rtmp_uri, channel, extra_params, now, expire_secs)
    }

    async fn send_empty(&self, request: CosRequest) -> Result<ApiResponse<()>, LiveChannelError> {
        self.send(request, |_| Ok::<(), std::convert::Infallible>(()))
            .await
    }

    /// Execute `request`; non-2xx becomes [`LiveChannelError::Http`], a body
    /// `parse` rejects becomes [`LiveChannelError::Parse`]
    async fn send<T, P, PE>(
        &self,
        request: CosRequest,
        parse: P,
    ) -> Result<ApiResponse<T>, LiveChannelError>
    where
        P: FnOnce(&[u8]) -> Result<T, PE>,
        PE: std::fmt::Display,
    {
        let operation = request.operation;
        debug!(
            operation,
            bucket = %request.bucket,
            resource = request.resource.as_deref().unwrap_or("/"),
            "Live channel request"
        );

        let raw = self.executor.execute(request).await?;

        if !raw.status.is_success() {
            let err = LiveChannelError::from_error_response(raw);
            warn!(
                operation,
                status = err.status().map_or(0, |s| s.as_u16()),
                code = err.code().unwrap_or(""),
                request_id = err.request_id().unwrap_or(""),
                "Live channel request failed"
            );
            return Err(err);
        }

        match parse(&raw.body) {
            Ok(data) => Ok(ApiResponse {
                status: raw.status,
                request_id: raw.request_id().map(str::to_string),
                headers: raw.headers,
                data,
            }),
            Err(e) => {
                warn!(
                    operation,
                    status = raw.status.as_u16(),
                    error = %e,
                    "Failed to parse live channel response"
                );
                Err(LiveChannelError::parse(raw, e))
            }
        }
    }
}
