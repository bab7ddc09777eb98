//! HTTP uplink (spec §4.8): configurable method/URL/headers,
//! `Content-Type: application/json`, 5-second total timeout, 2xx success.
//!
//! Grounded on `original_source/uplink/http_uplink.go`'s `HttpUplink`,
//! rebuilt on `reqwest` (already the teacher's HTTP client of choice, see
//! `services/comsrv` dependency on `reqwest`).

use async_trait::async_trait;
use gw_errors::{GatewayError, Result};
use reqwest::Client;

use crate::channel::UplinkChannel;
use crate::config::HttpConfig;

pub struct HttpUplink {
    config: HttpConfig,
    client: Client,
}

impl HttpUplink {
    pub fn new(config: HttpConfig) -> Self {
        let client = Client::builder()
            .timeout(config.timeout())
            .build()
            .unwrap_or_else(|_| Client::new());
        Self { config, client }
    }
}

#[async_trait]
impl UplinkChannel for HttpUplink {
    async fn send(&self, payload: &[u8]) -> Result<()> {
        let method = self
            .config
            .method
            .parse::<reqwest::Method>()
            .unwrap_or(reqwest::Method::POST);

        let mut request = self
            .client
            .request(method, &self.config.url)
            .header("Content-Type", "application/json")
            .body(payload.to_vec());

        for (k, v) in &self.config.headers {
            request = request.header(k, v);
        }

        let response = request.send().await.map_err(|e| GatewayError::Send {
            channel: self.config.name.clone(),
            reason: e.to_string(),
        })?;

        let status = response.status();
        if is_success_status(status.as_u16()) {
            Ok(())
        } else {
            Err(GatewayError::Send {
                channel: self.config.name.clone(),
                reason: format!("unexpected status {status}"),
            })
        }
    }

    fn name(&self) -> &str {
        &self.config.name
    }

    fn kind(&self) -> &str {
        "http"
    }
}

/// spec §8 boundary behavior: 200 and 299 are success, 199 and 300 are
/// failure.
fn is_success_status(code: u16) -> bool {
    (200..300).contains(&code)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn cfg(url: &str) -> HttpConfig {
        HttpConfig {
            name: "rest".into(),
            enable: true,
            url: url.to_string(),
            method: "POST".into(),
            headers: Default::default(),
        }
    }

    #[test]
    fn timeout_is_five_seconds() {
        assert_eq!(cfg("http://x").timeout().as_secs(), 5);
    }

    #[test]
    fn success_status_boundary() {
        assert!(is_success_status(200));
        assert!(is_success_status(299));
        assert!(!is_success_status(199));
        assert!(!is_success_status(300));
    }

    #[test]
    fn channel_identity() {
        let uplink = HttpUplink::new(cfg("http://x"));
        assert_eq!(uplink.name(), "rest");
        assert_eq!(uplink.kind(), "http");
    }
}
