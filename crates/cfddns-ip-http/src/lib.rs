// # HTTP IP Source
//
// This crate provides the address-echo implementation of `cfddns_core::IpSource`.
//
// ## Architecture
//
// Each family has its own single-stack echo endpoint (by default
// `https://v4.ident.me` and `https://v6.ident.me`) that answers with the
// caller's public address as a plain-text body. One `current()` call is one
// unauthenticated GET; there is no caching, polling or retry.

use cfddns_core::config::IpSourceConfig;
use cfddns_core::traits::{IpFamily, IpSource};
use cfddns_core::{Error, Result};

use std::net::IpAddr;
use std::time::Duration;

/// HTTP-based public address source
#[derive(Debug)]
pub struct HttpIpSource {
    /// IPv4-only echo endpoint
    ipv4_url: String,

    /// IPv6-only echo endpoint
    ipv6_url: String,

    /// HTTP client
    client: reqwest::Client,
}

impl HttpIpSource {
    /// Create a new HTTP IP source
    ///
    /// # Parameters
    ///
    /// - `config`: echo endpoint per family
    /// - `timeout`: per-request HTTP timeout
    pub fn new(config: &IpSourceConfig, timeout: Duration) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("cfddns/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            ipv4_url: config.ipv4_url.clone(),
            ipv6_url: config.ipv6_url.clone(),
            client,
        })
    }

    fn url(&self, family: IpFamily) -> &str {
        match family {
            IpFamily::V4 => &self.ipv4_url,
            IpFamily::V6 => &self.ipv6_url,
        }
    }

    /// Fetch the current address from the echo service for `family`
    async fn fetch_ip(&self, family: IpFamily) -> Result<IpAddr> {
        let url = self.url(family);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(|e| Error::discovery(family, format!("Request to {} failed: {}", url, e)))?;

        if !response.status().is_success() {
            return Err(Error::discovery(
                family,
                format!("{} answered HTTP {}", url, response.status()),
            ));
        }

        let ip_text = response
            .text()
            .await
            .map_err(|e| Error::discovery(family, format!("Failed to read response: {}", e)))?;

        parse_address(family, &ip_text)
    }
}

/// Parse an echo body as an address of `family`
///
/// Surrounding whitespace (a trailing newline is common) is ignored.
pub fn parse_address(family: IpFamily, body: &str) -> Result<IpAddr> {
    let ip_text = body.trim();

    let ip: IpAddr = ip_text
        .parse()
        .map_err(|_| Error::discovery(family, format!("Invalid IP address: {:?}", ip_text)))?;

    if IpFamily::of(&ip) != family {
        return Err(Error::discovery(
            family,
            format!("Expected {}, got: {}", family, ip),
        ));
    }

    Ok(ip)
}

#[async_trait::async_trait]
impl IpSource for HttpIpSource {
    async fn current(&self, family: IpFamily) -> Result<IpAddr> {
        let ip = self.fetch_ip(family).await?;
        tracing::debug!("{} echo service reported {}", family, ip);
        Ok(ip)
    }

    fn source_name(&self) -> &'static str {
        "http"
    }
}


#[cfg(test)]
mod integration_tests {
    use super::*;
    use wiremock::matchers::{method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn create_source(mock_server: &MockServer) -> HttpIpSource {
        let config = IpSourceConfig {
            ipv4_url: format!("{}/v4", mock_server.uri()),
            ipv6_url: format!("{}/v6", mock_server.uri()),
        };
        HttpIpSource::new(&config, Duration::from_secs(5)).unwrap()
    }

    #[tokio::test]
    async fn test_fetches_each_family_from_its_own_endpoint() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v4"))
            .respond_with(ResponseTemplate::new(200).set_body_string("2.2.2.2"))
            .expect(1)
            .mount(&mock_server)
            .await;
        Mock::given(method("GET"))
            .and(path("/v6"))
            .respond_with(ResponseTemplate::new(200).set_body_string("2001:db8::2\n"))
            .expect(1)
            .mount(&mock_server)
            .await;

        let source = create_source(&mock_server);

        assert_eq!(
            source.current(IpFamily::V4).await.unwrap(),
            "2.2.2.2".parse::<IpAddr>().unwrap()
        );
        assert_eq!(
            source.current(IpFamily::V6).await.unwrap(),
            "2001:db8::2".parse::<IpAddr>().unwrap()
        );
    }

    #[tokio::test]
    async fn test_http_error_status_is_discovery_error() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v6"))
            .respond_with(ResponseTemplate::new(503))
            .mount(&mock_server)
            .await;

        let source = create_source(&mock_server);
        let err = source.current(IpFamily::V6).await.unwrap_err();

        assert!(matches!(err, Error::AddressDiscovery { family: IpFamily::V6, .. }));
    }

    #[tokio::test]
    async fn test_v4_answer_on_v6_endpoint_rejected() {
        let mock_server = MockServer::start().await;

        Mock::given(method("GET"))
            .and(path("/v6"))
            .respond_with(ResponseTemplate::new(200).set_body_string("2.2.2.2"))
            .mount(&mock_server)
            .await;

        let source = create_source(&mock_server);
        assert!(source.current(IpFamily::V6).await.is_err());
    }
}
