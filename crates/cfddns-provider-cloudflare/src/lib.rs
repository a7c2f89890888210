// # Cloudflare DNS Provider
//
// This crate provides the Cloudflare implementation of `cfddns_core::DnsProvider`.
//
// ## What it does
//
// - ✅ One HTTP request per trait call
// - ✅ Every failure returned as a typed `cfddns_core::Error`
// - ✅ HTTP timeout configured (from `SyncConfig::http_timeout_secs`)
// - ✅ Dry-run mode: reads go out, the update payload is only logged
// - ❌ NO retry or backoff (a failed pass is retried by re-running it)
// - ❌ NO record creation or deletion
//
// ## Security Requirements
//
// - API token NEVER appears in logs or `Debug` output
// - Construction fails fast if the token is empty
//
// ## API Reference
//
// - Cloudflare API v4: https://developers.cloudflare.com/api/
// - Verify Token: GET `/user/tokens/verify`
// - List Zones: GET `/zones?name=...`
// - List DNS Records: GET `/zones/:zone_id/dns_records?name=...`
// - Update DNS Record: PUT `/zones/:zone_id/dns_records/:record_id`

use async_trait::async_trait;
use cfddns_core::config::ProviderConfig;
use cfddns_core::traits::{DnsProvider, DnsRecord, RecordUpdate, Zone};
use cfddns_core::{Error, Result};
use reqwest::header::CONTENT_TYPE;
use reqwest::{Method, StatusCode};
use serde::Deserialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

const PROVIDER: &str = "cloudflare";

/// Standard Cloudflare v4 response envelope
#[derive(Debug, Deserialize)]
struct Envelope<T> {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    errors: Vec<ApiMessage>,
    result: Option<T>,
}

impl<T> Envelope<T> {
    fn first_error(&self) -> Option<&str> {
        self.errors.first().map(|e| e.message.as_str())
    }
}

#[derive(Debug, Deserialize)]
struct ApiMessage {
    #[serde(default)]
    code: i64,
    message: String,
}

/// `result` of `/user/tokens/verify`
#[derive(Debug, Deserialize)]
struct TokenStatus {
    #[serde(default)]
    status: Option<String>,
}

/// Cloudflare DNS provider
///
/// # Dry-Run Mode
///
/// When `dry_run` is true, the provider will:
/// - Perform all GET requests (token, zone, record lookup)
/// - Log the intended PUT payload
/// - **NOT** actually modify DNS records
pub struct CloudflareProvider {
    /// Cloudflare API token
    /// ⚠️ NEVER log this value
    api_token: String,

    /// API base URL, without trailing slash
    api_base: String,

    /// HTTP client for API requests
    client: reqwest::Client,

    /// Dry-run mode: if true, perform GET requests but skip PUT updates
    dry_run: bool,
}

// Custom Debug implementation that hides the API token
impl std::fmt::Debug for CloudflareProvider {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CloudflareProvider")
            .field("api_token", &"<REDACTED>")
            .field("api_base", &self.api_base)
            .field("dry_run", &self.dry_run)
            .finish()
    }
}

impl CloudflareProvider {
    /// Create a new Cloudflare provider
    ///
    /// # Parameters
    ///
    /// - `config`: token, API base URL and dry-run flag
    /// - `timeout`: per-request HTTP timeout
    ///
    /// # Errors
    ///
    /// - `Error::Config` if the token is empty
    /// - `Error::Http` if the HTTP client cannot be built
    pub fn new(config: &ProviderConfig, timeout: Duration) -> Result<Self> {
        if config.api_token.trim().is_empty() {
            return Err(Error::config("Cloudflare API token cannot be empty"));
        }

        let client = reqwest::Client::builder()
            .timeout(timeout)
            .user_agent(concat!("cfddns/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| Error::http(format!("Failed to build HTTP client: {}", e)))?;

        if config.dry_run {
            tracing::warn!("Cloudflare provider running in DRY-RUN mode - no changes will be made");
        }

        Ok(Self {
            api_token: config.api_token.clone(),
            api_base: config.api_base.trim_end_matches('/').to_string(),
            client,
            dry_run: config.dry_run,
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.api_base, path)
    }

    /// Authenticated request builder
    ///
    /// Headers go on before any body: `RequestBuilder::header` appends, and
    /// `.json()` only sets `Content-Type` when it is still missing.
    fn request(&self, method: Method, path: &str) -> reqwest::RequestBuilder {
        self.client
            .request(method, self.url(path))
            .bearer_auth(&self.api_token)
            .header(CONTENT_TYPE, "application/json")
    }

    /// Send a request and decode the response envelope
    ///
    /// Cloudflare answers errors (401, 403, 429, ...) with the same envelope,
    /// so a non-2xx status is only an error here if the body is not an
    /// envelope.
    async fn send<T: DeserializeOwned>(
        &self,
        request: reqwest::RequestBuilder,
    ) -> Result<Envelope<T>> {
        let response = request
            .send()
            .await
            .map_err(|e| Error::http(format!("Request to Cloudflare failed: {}", e)))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| Error::http(format!("Failed to read Cloudflare response: {}", e)))?;

        match serde_json::from_str::<Envelope<T>>(&body) {
            Ok(envelope) => {
                if let Some(err) = envelope.errors.first() {
                    tracing::debug!("Cloudflare error {} (HTTP {}): {}", err.code, status, err.message);
                }
                Ok(envelope)
            }
            Err(e) if status.is_success() => Err(Error::invalid_response(format!(
                "Failed to parse Cloudflare response: {}",
                e
            ))),
            Err(_) => Err(status_error(status, &body)),
        }
    }
}

/// Map a non-envelope error response to an error
fn status_error(status: StatusCode, body: &str) -> Error {
    match status.as_u16() {
        401 | 403 => Error::auth(format!(
            "Invalid API token or insufficient permissions. Status: {}",
            status
        )),
        429 => Error::provider(
            PROVIDER,
            format!("Rate limit exceeded. Status: {}", status),
        ),
        500..=599 => Error::provider(
            PROVIDER,
            format!("Cloudflare server error: {} - {}", status, body),
        ),
        _ => Error::provider(PROVIDER, format!("Unexpected response: {} - {}", status, body)),
    }
}

#[async_trait]
impl DnsProvider for CloudflareProvider {
    async fn verify_token(&self) -> Result<bool> {
        let envelope: Envelope<TokenStatus> = self
            .send(self.request(Method::GET, "/user/tokens/verify"))
            .await?;

        if !envelope.success {
            if let Some(message) = envelope.first_error() {
                tracing::debug!("Token verification rejected: {}", message);
            }
            return Ok(false);
        }

        // An inactive (disabled / expired) token still verifies with success=true
        let active = envelope
            .result
            .and_then(|r| r.status)
            .is_none_or(|s| s.eq_ignore_ascii_case("active"));
        Ok(active)
    }

    async fn list_zones(&self, domain: &str) -> Result<Vec<Zone>> {
        tracing::debug!("Looking up zone ID for domain: {}", domain);

        let envelope: Envelope<Vec<Zone>> = self
            .send(self.request(Method::GET, "/zones").query(&[("name", domain)]))
            .await?;

        if !envelope.success {
            return Err(Error::provider(
                PROVIDER,
                format!(
                    "Zone lookup failed: {}",
                    envelope.first_error().unwrap_or("no error message")
                ),
            ));
        }

        Ok(envelope.result.unwrap_or_default())
    }

    async fn list_records(&self, zone_id: &str, record_name: &str) -> Result<Vec<DnsRecord>> {
        tracing::debug!("Looking up records: {} (zone: {})", record_name, zone_id);

        let path = format!("/zones/{}/dns_records", zone_id);
        let envelope: Envelope<Vec<DnsRecord>> = self
            .send(self.request(Method::GET, &path).query(&[("name", record_name)]))
            .await?;

        if !envelope.success {
            return Err(Error::provider(
                PROVIDER,
                format!(
                    "Record lookup failed: {}",
                    envelope.first_error().unwrap_or("no error message")
                ),
            ));
        }

        Ok(envelope.result.unwrap_or_default())
    }

    async fn update_record(
        &self,
        zone_id: &str,
        record_id: &str,
        update: &RecordUpdate,
    ) -> Result<DnsRecord> {
        let path = format!("/zones/{}/dns_records/{}", zone_id, record_id);

        if self.dry_run {
            tracing::info!(
                "[DRY-RUN] Would send PUT request to {} with payload: {}",
                self.url(&path),
                serde_json::to_string(update)?
            );
            return Ok(DnsRecord {
                id: record_id.to_string(),
                record_type: update.record_type.clone(),
                name: update.name.clone(),
                content: update.content.clone(),
                ttl: update.ttl,
                proxied: update.proxied,
            });
        }

        tracing::debug!("Updating record {} -> {}", record_id, update.content);

        let envelope: Envelope<DnsRecord> = self
            .send(self.request(Method::PUT, &path).json(update))
            .await?;

        if let Some(message) = envelope.first_error() {
            return Err(Error::update_failed(record_id, message));
        }
        if !envelope.success {
            return Err(Error::update_failed(
                record_id,
                "Cloudflare reported failure without an error message",
            ));
        }

        envelope
            .result
            .ok_or_else(|| Error::invalid_response("No result in Cloudflare update response"))
    }

    fn provider_name(&self) -> &'static str {
        PROVIDER
    }
}
