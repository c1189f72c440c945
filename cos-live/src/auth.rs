//! COS request signing
//!
//! Implements the `q-sign-algorithm=sha1` signature used both for the
//! `Authorization` header of API requests and for signed RTMP URLs.
//!
//! - `SignKey = hex(HMAC-SHA1(secret_key, KeyTime))`
//! - `StringToSign = "sha1\n{KeyTime}\n{hex(SHA1(HttpString))}\n"`
//! - `Signature = hex(HMAC-SHA1(SignKey, StringToSign))`

use hmac::{Hmac, Mac};
use reqwest::header::{HeaderMap, CONTENT_TYPE, HOST};
use sha1::{Digest, Sha1};

use crate::config::CosConfig;
use crate::error::LiveChannelError;
use crate::transport::{encode, CosRequest};

type HmacSha1 = Hmac<Sha1>;

/// A computed signature and the lists it covers
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Signature {
    pub secret_id: String,
    /// `{start};{end}` in Unix seconds
    pub key_time: String,
    pub header_list: String,
    pub url_param_list: String,
    pub signature: String,
}

impl Signature {
    /// Signature parameters in wire order
    #[must_use]
    pub fn params(&self) -> [(&'static str, &str); 7] {
        [
            ("q-sign-algorithm", "sha1"),
            ("q-ak", &self.secret_id),
            ("q-sign-time", &self.key_time),
            ("q-key-time", &self.key_time),
            ("q-header-list", &self.header_list),
            ("q-url-param-list", &self.url_param_list),
            ("q-signature", &self.signature),
        ]
    }

    /// Value of the `Authorization` header
    #[must_use]
    pub fn authorization(&self) -> String {
        self.params()
            .iter()
            .map(|(k, v)| format!("{k}={v}"))
            .collect::<Vec<_>>()
            .join("&")
    }
}

/// Stateless signer holding the credentials
#[derive(Clone)]
pub struct CosSigner {
    secret_id: String,
    secret_key: String,
}

impl CosSigner {
    pub fn new(secret_id: impl Into<String>, secret_key: impl Into<String>) -> Self {
        Self {
            secret_id: secret_id.into(),
            secret_key: secret_key.into(),
        }
    }

    #[must_use]
    pub fn from_config(config: &CosConfig) -> Self {
        Self::new(config.secret_id.clone(), config.secret_key.clone())
    }

    /// Sign `method path` with the given params and headers, valid from `start` for `expire_secs`
    pub fn sign(
        &self,
        method: &str,
        path: &str,
        params: &[(String, String)],
        headers: &[(String, String)],
        start: i64,
        expire_secs: u64,
    ) -> Result<Signature, LiveChannelError> {
        if self.secret_id.is_empty() || self.secret_key.is_empty() {
            return Err(LiveChannelError::Sign("missing secret_id or secret_key".to_string()));
        }
        if expire_secs == 0 {
            return Err(LiveChannelError::Sign("expiration must be greater than 0".to_string()));
        }
        let end = i64::try_from(expire_secs)
            .ok()
            .and_then(|secs| start.checked_add(secs))
            .ok_or_else(|| LiveChannelError::Sign(format!("expiration out of range: {expire_secs}")))?;

        let key_time = format!("{start};{end}");
        let sign_key = hmac_sha1_hex(self.secret_key.as_bytes(), key_time.as_bytes())?;

        let (url_param_list, http_parameters) = canonicalize(params);
        let (header_list, http_headers) = canonicalize(headers);

        let http_string = format!(
            "{}\n{}\n{}\n{}\n",
            method.to_lowercase(),
            path,
            http_parameters,
            http_headers
        );
        let string_to_sign = format!(
            "sha1\n{}\n{}\n",
            key_time,
            hex::encode(Sha1::digest(http_string.as_bytes()))
        );
        let signature = hmac_sha1_hex(sign_key.as_bytes(), string_to_sign.as_bytes())?;

        Ok(Signature {
            secret_id: self.secret_id.clone(),
            key_time,
            header_list,
            url_param_list,
            signature,
        })
    }

    /// Sign an API request; covers its query and the `host`/`content-type` headers
    pub fn sign_request(
        &self,
        request: &CosRequest,
        headers: &HeaderMap,
        start: i64,
        expire_secs: u64,
    ) -> Result<Signature, LiveChannelError> {
        let signed_headers: Vec<(String, String)> = [HOST, CONTENT_TYPE]
            .iter()
            .filter_map(|name| {
                headers
                    .get(name)
                    .and_then(|v| v.to_str().ok())
                    .map(|v| (name.as_str().to_string(), v.to_string()))
            })
            .collect();

        self.sign(
            request.method.as_str(),
            &request.resource_path(),
            &request.query,
            &signed_headers,
            start,
            expire_secs,
        )
    }

    /// Append `params` and a signature for `/{channel}` to an RTMP URI
    pub fn sign_rtmp_url(
        &self,
        rtmp_uri: &str,
        channel: &str,
        params: &[(String, String)],
        start: i64,
        expire_secs: u64,
    ) -> Result<String, LiveChannelError> {
        let signature = self.sign("get", &format!("/{channel}"), params, &[], start, expire_secs)?;

        let query = params
            .iter()
            .map(|(k, v)| (k.as_str(), v.as_str()))
            .chain(signature.params())
            .map(|(k, v)| format!("{}={}", encode(k), encode(v)))
            .collect::<Vec<_>>()
            .join("&");

        Ok(format!("{rtmp_uri}?{query}"))
    }
}

fn hmac_sha1_hex(key: &[u8], data: &[u8]) -> Result<String, LiveChannelError> {
    let mut mac = HmacSha1::new_from_slice(key)
        .map_err(|e| LiveChannelError::Sign(format!("failed to create HMAC: {e}")))?;
    mac.update(data);
    Ok(hex::encode(mac.finalize().into_bytes()))
}

/// Lower-case and encode keys, encode values, sort by key.
/// Returns (`key;key`, `key=value&key=value`).
fn canonicalize(pairs: &[(String, String)]) -> (String, String) {
    let mut encoded: Vec<(String, String)> = pairs
        .iter()
        .map(|(k, v)| (encode(&k.to_lowercase()), encode(v)))
        .collect();
    encoded.sort();

    let list = encoded
        .iter()
        .map(|(k, _)| k.as_str())
        .collect::<Vec<_>>()
        .join(";");
    let joined = encoded
        .iter()
        .map(|(k, v)| format!("{k}={v}"))
        .collect::<Vec<_>>()
        .join("&");
    (list, joined)
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::header::HeaderValue;
    use reqwest::Method;

    fn signer() -> CosSigner {
        CosSigner::new("AKIDexample", "secretkey")
    }

    fn pairs(items: &[(&str, &str)]) -> Vec<(String, String)> {
        items
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect()
    }

    #[test]
    fn test_sign_known_vector() {
        let sig = signer()
            .sign(
                "GET",
                "/ch1",
                &pairs(&[("live", "")]),
                &pairs(&[("host", "b-1.cos.ap-guangzhou.myqcloud.com")]),
                1_700_000_000,
                3600,
            )
            .unwrap();

        assert_eq!(sig.key_time, "1700000000;1700003600");
        assert_eq!(sig.header_list, "host");
        assert_eq!(sig.url_param_list, "live");
        assert_eq!(sig.signature, "3eab430ee76091e013254088d3467927ac4a2645");
        assert_eq!(
            sig.authorization(),
            "q-sign-algorithm=sha1&q-ak=AKIDexample&q-sign-time=1700000000;1700003600\
             &q-key-time=1700000000;1700003600&q-header-list=host&q-url-param-list=live\
             &q-signature=3eab430ee76091e013254088d3467927ac4a2645"
        );
    }

    #[test]
    fn test_sign_request_matches_manual_sign() {
        let request = CosRequest::new("get_channel_info", Method::GET, "b-1")
            .with_resource("ch1")
            .with_query("live", "");
        let mut headers = HeaderMap::new();
        headers.insert(HOST, HeaderValue::from_static("b-1.cos.ap-guangzhou.myqcloud.com"));

        let sig = signer()
            .sign_request(&request, &headers, 1_700_000_000, 3600)
            .unwrap();
        assert_eq!(sig.signature, "3eab430ee76091e013254088d3467927ac4a2645");
    }

    #[test]
    fn test_canonicalize_sorts_and_encodes() {
        let (list, joined) = canonicalize(&pairs(&[("Max-Keys", "10"), ("live", ""), ("prefix", "a b")]));
        assert_eq!(list, "live;max-keys;prefix");
        assert_eq!(joined, "live=&max-keys=10&prefix=a%20b");
    }

    #[test]
    fn test_sign_rtmp_url() {
        let url = signer()
            .sign_rtmp_url(
                "rtmp://b-1.cos.ap-guangzhou.myqcloud.com/live/ch1",
                "ch1",
                &pairs(&[("token", "a b")]),
                1_700_000_000,
                100,
            )
            .unwrap();

        assert_eq!(
            url,
            "rtmp://b-1.cos.ap-guangzhou.myqcloud.com/live/ch1?token=a%20b\
             &q-sign-algorithm=sha1&q-ak=AKIDexample\
             &q-sign-time=1700000000%3B1700000100&q-key-time=1700000000%3B1700000100\
             &q-header-list=&q-url-param-list=token\
             &q-signature=ad9ab63951aa4a5bf6cf2682618fce869e87c59c"
        );
    }

    #[test]
    fn test_sign_rtmp_url_without_params() {
        let url = signer()
            .sign_rtmp_url("rtmp://host/live/ch1", "ch1", &[], 1_700_000_000, 100)
            .unwrap();
        assert!(url.starts_with("rtmp://host/live/ch1?q-sign-algorithm=sha1&"));
        assert!(url.ends_with("q-signature=f52203b700e9f26de1c88377abf363767b8d7c2b"));
    }

    #[test]
    fn test_sign_fails_without_credentials() {
        let err = CosSigner::new("", "")
            .sign("get", "/ch1", &[], &[], 1_700_000_000, 100)
            .unwrap_err();
        assert!(matches!(err, LiveChannelError::Sign(_)));
    }

    #[test]
    fn test_sign_fails_on_bad_expiration() {
        assert!(signer().sign("get", "/", &[], &[], 0, 0).is_err());
        assert!(signer().sign("get", "/", &[], &[], i64::MAX, 10).is_err());
        assert!(signer().sign("get", "/", &[], &[], 0, u64::MAX).is_err());
    }
}
