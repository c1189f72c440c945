use config::{Config as ConfigBuilder, ConfigError, Environment, File};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::Path;

/// Client configuration
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CosConfig {
    /// Service endpoint, e.g. `cos.ap-guangzhou.myqcloud.com`
    pub endpoint: String,
    pub secret_id: String,
    pub secret_key: String,
    /// Appended to short bucket names (`examplebucket` -> `examplebucket-1250000000`)
    pub app_id: String,
    /// Treat `endpoint` as a custom domain bound to a single bucket
    pub is_cname: bool,
    /// `https` or `http`
    pub scheme: String,
    /// Connect to this IP instead of resolving the bucket host
    pub host_ip: Option<String>,
    pub host_port: Option<u16>,
    pub connect_timeout_secs: u64,
    pub request_timeout_secs: u64,
    /// Lifetime of the `Authorization` signature on each request
    pub sign_expire_secs: u64,
    pub logging: LoggingConfig,
}

impl Default for CosConfig {
    fn default() -> Self {
        Self {
            endpoint: "cos.ap-guangzhou.myqcloud.com".to_string(),
            secret_id: String::new(),
            secret_key: String::new(),
            app_id: String::new(),
            is_cname: false,
            scheme: "https".to_string(),
            host_ip: None,
            host_port: None,
            connect_timeout_secs: 10,
            request_timeout_secs: 30,
            sign_expire_secs: 3600,
            logging: LoggingConfig::default(),
        }
    }
}

impl fmt::Debug for CosConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("CosConfig")
            .field("endpoint", &self.endpoint)
            .field("secret_id", &self.secret_id)
            .field("secret_key", &"***")
            .field("app_id", &self.app_id)
            .field("is_cname", &self.is_cname)
            .field("scheme", &self.scheme)
            .field("host_ip", &self.host_ip)
            .field("host_port", &self.host_port)
            .field("connect_timeout_secs", &self.connect_timeout_secs)
            .field("request_timeout_secs", &self.request_timeout_secs)
            .field("sign_expire_secs", &self.sign_expire_secs)
            .field("logging", &self.logging)
            .finish()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub format: String, // "json" or "pretty"
    pub file_path: Option<String>,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: "pretty".to_string(),
            file_path: None,
        }
    }
}

impl CosConfig {
    /// Load configuration from multiple sources with priority:
    /// 1. Environment variables (highest priority)
    /// 2. Config file (if provided)
    /// 3. Defaults (lowest priority)
    pub fn load(config_file: Option<&str>) -> Result<Self, ConfigError> {
        let mut builder = ConfigBuilder::builder();

        if let Some(path) = config_file {
            if Path::new(path).exists() {
                builder = builder.add_source(File::with_name(path));
            }
        }

        // COS_LIVE_SECRET_ID, COS_LIVE_LOGGING__LEVEL, ...
        builder = builder.add_source(
            Environment::with_prefix("COS_LIVE")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build()?;
        config.try_deserialize()
    }

    /// Load from environment variables only
    pub fn from_env() -> Result<Self, ConfigError> {
        Self::load(None)
    }

    /// Load from file path
    pub fn from_file(path: &str) -> Result<Self, ConfigError> {
        Self::load(Some(path))
    }

    /// Check the configuration, returning every problem found
    pub fn validate(&self) -> Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.endpoint_host().is_empty() {
            errors.push("endpoint must not be empty".to_string());
        }
        if self.secret_id.is_empty() {
            errors.push("secret_id must not be empty".to_string());
        }
        if self.secret_key.is_empty() {
            errors.push("secret_key must not be empty".to_string());
        }
        if self.scheme != "http" && self.scheme != "https" {
            errors.push(format!("scheme must be http or https, got '{}'", self.scheme));
        }
        if self.sign_expire_secs == 0 {
            errors.push("sign_expire_secs must be greater than 0".to_string());
        }
        if self.host_port.is_some() && self.host_ip.is_none() {
            errors.push("host_port requires host_ip".to_string());
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }

    /// Endpoint without scheme or trailing slash
    #[must_use]
    pub fn endpoint_host(&self) -> &str {
        let endpoint = self.endpoint.trim();
        let endpoint = endpoint
            .strip_prefix("https://")
            .or_else(|| endpoint.strip_prefix("http://"))
            .unwrap_or(endpoint);
        endpoint.trim_end_matches('/')
    }

    /// Full bucket name; `app_id` is appended unless `bucket` already ends with it
    #[must_use]
    pub fn bucket_name(&self, bucket: &str) -> String {
        let app_id = self.app_id.trim();
        if app_id.is_empty() || bucket.ends_with(&format!("-{app_id}")) {
            bucket.to_string()
        } else {
            format!("{bucket}-{app_id}")
        }
    }

    /// Virtual host of a bucket (`{bucket}.{endpoint}`), or the endpoint itself for a CNAME
    #[must_use]
    pub fn bucket_host(&self, bucket: &str) -> String {
        if self.is_cname {
            self.endpoint_host().to_string()
        } else {
            format!("{}.{}", self.bucket_name(bucket), self.endpoint_host())
        }
    }

    /// Base URL requests are sent to; honors the `host_ip` override
    #[must_use]
    pub fn base_url(&self, bucket: &str) -> String {
        match (&self.host_ip, self.host_port) {
            (Some(ip), Some(port)) => format!("{}://{}:{}", self.scheme, ip, port),
            (Some(ip), None) => format!("{}://{}", self.scheme, ip),
            _ => format!("{}://{}", self.scheme, self.bucket_host(bucket)),
        }
    }

    /// RTMP ingest URI of a channel
    #[must_use]
    pub fn rtmp_uri(&self, bucket: &str, channel: &str) -> String {
        format!(
            "rtmp://{}/{}/{}",
            self.bucket_host(bucket),
            crate::live::consts::RTMP_APP,
            channel
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> CosConfig {
        CosConfig {
            secret_id: "AKIDexample".to_string(),
            secret_key: "secret".to_string(),
            ..CosConfig::default()
        }
    }

    #[test]
    fn test_default_config() {
        let config = CosConfig::default();
        assert_eq!(config.scheme, "https");
        assert_eq!(config.sign_expire_secs, 3600);
        assert_eq!(config.logging.level, "info");
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_validate() {
        assert!(test_config().validate().is_ok());

        let config = CosConfig {
            endpoint: "https://".to_string(),
            scheme: "ftp".to_string(),
            sign_expire_secs: 0,
            host_port: Some(8080),
            ..CosConfig::default()
        };
        let errors = config.validate().unwrap_err();
        assert_eq!(errors.len(), 6);
    }

    #[test]
    fn test_bucket_host() {
        let config = test_config();
        assert_eq!(
            config.bucket_host("examplebucket-1250000000"),
            "examplebucket-1250000000.cos.ap-guangzhou.myqcloud.com"
        );

        let cname = CosConfig {
            endpoint: "https://live.example.com/".to_string(),
            is_cname: true,
            ..test_config()
        };
        assert_eq!(cname.bucket_host("examplebucket-1250000000"), "live.example.com");
    }

    #[test]
    fn test_bucket_name_appends_app_id() {
        let config = CosConfig {
            app_id: "1250000000".to_string(),
            ..test_config()
        };
        assert_eq!(config.bucket_name("examplebucket"), "examplebucket-1250000000");
        assert_eq!(
            config.bucket_name("examplebucket-1250000000"),
            "examplebucket-1250000000"
        );
        assert_eq!(
            config.bucket_host("examplebucket"),
            "examplebucket-1250000000.cos.ap-guangzhou.myqcloud.com"
        );
        assert_eq!(
            config.rtmp_uri("examplebucket", "ch1"),
            "rtmp://examplebucket-1250000000.cos.ap-guangzhou.myqcloud.com/live/ch1"
        );

        assert_eq!(test_config().bucket_name("examplebucket"), "examplebucket");
    }

    #[test]
    fn test_base_url() {
        let mut config = test_config();
        assert_eq!(
            config.base_url("b-1"),
            "https://b-1.cos.ap-guangzhou.myqcloud.com"
        );

        config.scheme = "http".to_string();
        config.host_ip = Some("10.0.0.1".to_string());
        assert_eq!(config.base_url("b-1"), "http://10.0.0.1");

        config.host_port = Some(80);
        assert_eq!(config.base_url("b-1"), "http://10.0.0.1:80");
    }

    #[test]
    fn test_rtmp_uri() {
        let config = test_config();
        assert_eq!(
            config.rtmp_uri("b-1", "ch1"),
            "rtmp://b-1.cos.ap-guangzhou.myqcloud.com/live/ch1"
        );
    }

    #[test]
    fn test_debug_redacts_secret() {
        let rendered = format!("{:?}", test_config());
        assert!(rendered.contains("AKIDexample"));
        assert!(!rendered.contains("\"secret\""));
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("cos-live-test-{}.toml", std::process::id()));
        std::fs::write(
            &path,
            "endpoint = \"cos.ap-beijing.myqcloud.com\"\n\
             secret_id = \"file-id\"\n\
             is_cname = true\n\
             [logging]\n\
             format = \"json\"\n",
        )
        .unwrap();

        let config = CosConfig::from_file(path.to_str().unwrap()).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.endpoint, "cos.ap-beijing.myqcloud.com");
        assert_eq!(config.secret_id, "file-id");
        assert!(config.is_cname);
        assert_eq!(config.logging.format, "json");
        assert_eq!(config.logging.level, "info");
        assert_eq!(config.request_timeout_secs, 30);
    }
}
