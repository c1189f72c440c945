//! COS live channel command line tool
//!
//! Thin front end over `LiveChannelClient`. Configuration comes from an
//! optional config file and `COS_LIVE_*` environment variables.

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use serde::Serialize;
use tracing::{debug, info};

use cos_live::logging::init_logging;
use cos_live::{
    ApiResponse, ChannelConfiguration, ChannelSwitch, ChannelTarget, CosConfig,
    ListChannelsParams, LiveChannelClient,
};

#[derive(Parser, Debug)]
#[command(name = "cos-live")]
#[command(about = "Manage COS live channels", long_about = None)]
struct Args {
    /// Config file (TOML, YAML or JSON)
    #[arg(long, short, env = "COS_LIVE_CONFIG", default_value = "cos-live.toml")]
    config: String,

    /// Bucket holding the channels (`name-appid`, or `name` with `app_id` configured)
    #[arg(long, short, env = "COS_LIVE_BUCKET")]
    bucket: String,

    /// Print response request id and headers to stderr
    #[arg(long, short)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Create a channel
    Create {
        channel: String,
        #[arg(long, default_value = "")]
        description: String,
        /// Create the channel disabled
        #[arg(long)]
        disabled: bool,
        #[arg(long, default_value = "playlist.m3u8")]
        playlist_name: String,
        #[arg(long, default_value_t = 5)]
        frag_duration: u32,
        #[arg(long, default_value_t = 3)]
        frag_count: u32,
    },
    /// Enable or disable a channel
    Switch {
        channel: String,
        /// `enabled` or `disabled`
        state: ChannelSwitch,
    },
    /// Show channel configuration
    Info { channel: String },
    /// Show push status
    Stat { channel: String },
    /// Delete a channel
    Delete { channel: String },
    /// List channels
    List {
        #[arg(long, default_value = "")]
        prefix: String,
        #[arg(long, default_value = "")]
        marker: String,
        #[arg(long, default_value_t = 100)]
        max_keys: u32,
        /// Follow the cursor through every page
        #[arg(long)]
        all: bool,
    },
    /// Show publish history
    History { channel: String },
    /// Generate a VOD playlist for a time range
    Vod {
        channel: String,
        playlist: String,
        /// Unix seconds; defaults to one hour before `end`
        #[arg(long)]
        start: Option<i64>,
        /// Unix seconds; defaults to now
        #[arg(long)]
        end: Option<i64>,
    },
    /// Print a signed RTMP URL
    SignUrl {
        channel: String,
        #[arg(long, default_value_t = 3600)]
        expire: u64,
        /// Extra query parameter, `key=value`; repeatable
        #[arg(long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,
    },
}

fn parse_param(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got '{s}'"))
}

fn print_json<T: Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn report<T>(resp: &ApiResponse<T>, verbose: bool) {
    if verbose {
        eprintln!(
            "status: {}, request id: {}",
            resp.status,
            resp.request_id.as_deref().unwrap_or("-")
        );
        let mut headers: Vec<_> = resp.headers.iter().collect();
        headers.sort();
        for (name, value) in headers {
            eprintln!("  {name}: {value}");
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let config = CosConfig::load(Some(&args.config)).context("failed to load configuration")?;
    init_logging(&config.logging)?;

    if let Err(errors) = config.validate() {
        bail!("invalid configuration:\n  {}", errors.join("\n  "));
    }
    debug!(endpoint = %config.endpoint_host(), bucket = %args.bucket, "Configuration loaded");

    let client = LiveChannelClient::new(config)?;
    let bucket = args.bucket.as_str();
    let verbose = args.verbose;

    match args.command {
        Command::Create {
            channel,
            description,
            disabled,
            playlist_name,
            frag_duration,
            frag_count,
        } => {
            let switch = if disabled {
                ChannelSwitch::Disabled
            } else {
                ChannelSwitch::Enabled
            };
            let target = ChannelTarget {
                playlist_name,
                frag_duration,
                frag_count,
                ..ChannelTarget::default()
            };
            let config = ChannelConfiguration::new(channel)
                .with_description(description)
                .with_switch(switch)
                .with_target(target);
            let resp = client.create_channel(bucket, &config).await?;
            report(&resp, verbose);
            print_json(&resp.data)?;
        }
        Command::Switch { channel, state } => {
            let resp = client.switch_channel(bucket, &channel, state).await?;
            report(&resp, verbose);
            info!(channel = %channel, state = %state, "Channel switched");
        }
        Command::Info { channel } => {
            let resp = client.get_channel_info(bucket, &channel).await?;
            report(&resp, verbose);
            print_json(&resp.data)?;
        }
        Command::Stat { channel } => {
            let resp = client.get_channel_stat(bucket, &channel).await?;
            report(&resp, verbose);
            print_json(&resp.data)?;
        }
        Command::Delete { channel } => {
            let resp = client.delete_channel(bucket, &channel).await?;
            report(&resp, verbose);
            info!(channel = %channel, "Channel deleted");
        }
        Command::List {
            prefix,
            marker,
            max_keys,
            all,
        } => {
            let mut params = ListChannelsParams::default()
                .with_prefix(prefix)
                .with_marker(marker)
                .with_max_keys(max_keys);
            loop {
                let resp = client.list_channels(bucket, &params).await?;
                report(&resp, verbose);
                for channel in &resp.data.channels {
                    println!(
                        "{}\t{}\t{}",
                        channel.name, channel.status, channel.last_modified
                    );
                }
                match params.next_page(&resp.data) {
                    Some(next) if all => params = next,
                    Some(next) => {
                        eprintln!("more channels after marker '{}'", next.marker);
                        break;
                    }
                    None => break,
                }
            }
        }
        Command::History { channel } => {
            let resp = client.get_channel_history(bucket, &channel).await?;
            report(&resp, verbose);
            print_json(&resp.data)?;
        }
        Command::Vod {
            channel,
            playlist,
            start,
            end,
        } => {
            let end = end.unwrap_or_else(|| chrono::Utc::now().timestamp());
            let start = start.unwrap_or(end - 3600);
            let resp = client
                .generate_vod_playlist(bucket, &channel, &playlist, start, end)
                .await?;
            report(&resp, verbose);
            info!(channel = %channel, playlist = %playlist, start, end, "VOD playlist generated");
        }
        Command::SignUrl {
            channel,
            expire,
            params,
        } => {
            let url = client.signed_play_url(bucket, &channel, expire, &params)?;
            println!("{url}");
        }
    }

    Ok(())
}
