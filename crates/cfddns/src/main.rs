// # cfddns - Cloudflare dynamic DNS synchronizer
//
// Thin integration layer: reads the environment, sets up logging and the
// runtime, runs one `SyncEngine` pass, and turns the outcome into an exit
// code. All reconciliation logic lives in cfddns-core.
//
// ## Configuration
//
// ### Required
// - `CLOUDFLARE_TOKEN`: API token (Zone:Read, DNS:Edit)
// - `CLOUDFLARE_DOMAIN`: Zone name, e.g. `example.com`
// - `CLOUDFLARE_RECORD`: Record label, e.g. `home` (`@` or blank for the apex)
//
// ### Optional
// - `CLOUDFLARE_API_BASE`: API base URL
// - `DDNS_IPV4_URL` / `DDNS_IPV6_URL`: address-echo services
// - `DDNS_FAMILIES`: `v4`, `v6` or `v4,v6` (default)
// - `DDNS_MODE`: `live` (default) or `dry-run`
// - `DDNS_HTTP_TIMEOUT_SECS`: per-request timeout (default 30)
// - `DDNS_LOG_LEVEL`: trace, debug, info (default), warn, error
//
// The closing `Finished at <time>` line goes straight to stdout, whatever the
// log level.
//
// ## Example
//
// ```bash
// export CLOUDFLARE_TOKEN=your_token
// export CLOUDFLARE_DOMAIN=example.com
// export CLOUDFLARE_RECORD=home
//
// # every 5 minutes from cron
// */5 * * * * cfddns
// ```

use anyhow::{Context, Result};
use cfddns_core::{IpFamily, SyncConfig, SyncEngine, SyncFailure, SyncReport};
use cfddns_ip_http::HttpIpSource;
use cfddns_provider_cloudflare::CloudflareProvider;
use chrono::NaiveDateTime;
use std::env;
use std::process::ExitCode;
use std::time::Duration;
use tracing::{Level, error, info};
use tracing_subscriber::FmtSubscriber;

/// Exit codes for scripting
///
/// An aborted pass exits with `cfddns_core::Error::exit_code` of its error
/// (3..=6 for the lookup steps); these cover the rest.
#[derive(Debug, Clone, Copy)]
enum CfddnsExitCode {
    /// Every family unchanged or updated
    Success = 0,
    /// Configuration error or startup failure
    ConfigError = 1,
    /// Runtime error (unexpected failure)
    RuntimeError = 2,
    /// At least one family could not be reconciled
    FamilyFailed = 7,
}

impl From<CfddnsExitCode> for ExitCode {
    fn from(code: CfddnsExitCode) -> Self {
        ExitCode::from(code as u8)
    }
}

/// Environment configuration
struct EnvConfig {
    api_token: String,
    domain: String,
    record_label: String,
    api_base: Option<String>,
    ipv4_url: Option<String>,
    ipv6_url: Option<String>,
    families: Vec<IpFamily>,
    dry_run: bool,
    http_timeout_secs: Option<u64>,
    log_level: Level,
}

impl EnvConfig {
    /// Load configuration from environment variables
    fn from_env() -> Result<Self> {
        Self::from_lookup(|name| env::var(name).ok())
    }

    /// Load configuration from any variable lookup
    ///
    /// Unset and blank values are treated the same, except for
    /// `CLOUDFLARE_RECORD` where blank is the apex.
    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Result<Self> {
        let optional = |name: &str| {
            lookup(name)
                .map(|v| v.trim().to_string())
                .filter(|v| !v.is_empty())
        };
        let required = |name: &str| {
            optional(name)
                .with_context(|| format!("{} is required. Set it via: export {}=...", name, name))
        };

        Ok(Self {
            api_token: required("CLOUDFLARE_TOKEN")?,
            domain: required("CLOUDFLARE_DOMAIN")?,
            record_label: lookup("CLOUDFLARE_RECORD")
                .map(|v| v.trim().to_string())
                .context(
                    "CLOUDFLARE_RECORD is required (use @ for the apex). \
                    Set it via: export CLOUDFLARE_RECORD=...",
                )?,
            api_base: optional("CLOUDFLARE_API_BASE"),
            ipv4_url: optional("DDNS_IPV4_URL"),
            ipv6_url: optional("DDNS_IPV6_URL"),
            families: match optional("DDNS_FAMILIES") {
                Some(value) => parse_families(&value)?,
                None => IpFamily::ALL.to_vec(),
            },
            dry_run: match optional("DDNS_MODE") {
                Some(mode) => parse_mode(&mode)?,
                None => false,
            },
            http_timeout_secs: optional("DDNS_HTTP_TIMEOUT_SECS")
                .map(|s| {
                    s.parse()
                        .with_context(|| format!("DDNS_HTTP_TIMEOUT_SECS is not a number: {}", s))
                })
                .transpose()?,
            log_level: parse_log_level(
                &optional("DDNS_LOG_LEVEL").unwrap_or_else(|| "info".to_string()),
            )?,
        })
    }

    /// Build the validated core configuration
    fn into_sync_config(self) -> Result<SyncConfig> {
        let mut config = SyncConfig::new(self.api_token, self.domain, self.record_label)
            .with_families(self.families);

        if let Some(api_base) = self.api_base {
            config.provider.api_base = api_base;
        }
        config.provider.dry_run = self.dry_run;
        if let Some(url) = self.ipv4_url {
            config.ip_source.ipv4_url = url;
        }
        if let Some(url) = self.ipv6_url {
            config.ip_source.ipv6_url = url;
        }
        if let Some(secs) = self.http_timeout_secs {
            config.http_timeout_secs = secs;
        }

        config.validate()?;
        Ok(config)
    }
}

fn parse_families(value: &str) -> Result<Vec<IpFamily>> {
    let mut families = Vec::new();
    for part in value.split(',').map(str::trim).filter(|p| !p.is_empty()) {
        let family = IpFamily::parse(part).with_context(|| {
            format!("DDNS_FAMILIES entry '{}' is not valid. Valid: v4, v6", part)
        })?;
        if !families.contains(&family) {
            families.push(family);
        }
    }
    if families.is_empty() {
        anyhow::bail!("DDNS_FAMILIES must name at least one of: v4, v6");
    }
    Ok(families)
}

fn parse_mode(mode: &str) -> Result<bool> {
    match mode.to_lowercase().as_str() {
        "live" => Ok(false),
        "dry-run" | "dry_run" | "dryrun" => Ok(true),
        _ => anyhow::bail!("DDNS_MODE '{}' is not valid. Valid modes: live, dry-run", mode),
    }
}

fn parse_log_level(level: &str) -> Result<Level> {
    match level.to_lowercase().as_str() {
        "trace" => Ok(Level::TRACE),
        "debug" => Ok(Level::DEBUG),
        "info" => Ok(Level::INFO),
        "warn" => Ok(Level::WARN),
        "error" => Ok(Level::ERROR),
        _ => anyhow::bail!(
            "DDNS_LOG_LEVEL '{}' is not valid. \
            Valid levels: trace, debug, info, warn, error",
            level
        ),
    }
}

fn main() -> ExitCode {
    let env_config = match EnvConfig::from_env() {
        Ok(cfg) => cfg,
        Err(e) => {
            eprintln!("Configuration error: {:#}", e);
            return CfddnsExitCode::ConfigError.into();
        }
    };

    let subscriber = FmtSubscriber::builder()
        .with_max_level(env_config.log_level)
        .finish();

    if let Err(e) = tracing::subscriber::set_global_default(subscriber) {
        eprintln!("Failed to set tracing subscriber: {}", e);
        return CfddnsExitCode::ConfigError.into();
    }

    let config = match env_config.into_sync_config() {
        Ok(cfg) => cfg,
        Err(e) => {
            error!("Configuration validation error: {:#}", e);
            return CfddnsExitCode::ConfigError.into();
        }
    };

    info!("Synchronizing {}", config.record_name());

    // Single pass, strictly sequential: a current-thread runtime is enough
    let rt = match tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
    {
        Ok(runtime) => runtime,
        Err(e) => {
            error!("Failed to create tokio runtime: {}", e);
            return CfddnsExitCode::RuntimeError.into();
        }
    };

    let code = rt.block_on(run(config));

    println!("{}", finished_line(chrono::Local::now().naive_local()));
    code
}

fn finished_line(at: NaiveDateTime) -> String {
    format!("Finished at {}", at.format("%Y-%m-%d %H:%M"))
}

/// Build the components and run one pass
async fn run(config: SyncConfig) -> ExitCode {
    let timeout = Duration::from_secs(config.http_timeout_secs);

    let engine = match build_engine(config, timeout) {
        Ok(engine) => engine,
        Err(e) => {
            error!("Startup error: {}", e);
            return ExitCode::from(e.exit_code());
        }
    };

    ExitCode::from(exit_code(&engine.run().await))
}

fn build_engine(config: SyncConfig, timeout: Duration) -> cfddns_core::Result<SyncEngine> {
    let provider = CloudflareProvider::new(&config.provider, timeout)?;
    let ip_source = HttpIpSource::new(&config.ip_source, timeout)?;
    SyncEngine::new(Box::new(provider), Box::new(ip_source), config)
}

/// Log the outcome of a pass and pick the process exit code
///
/// An aborted pass exits with the code of its error kind. Any family that
/// failed during reconciliation exits 7, whatever the underlying error.
fn exit_code(outcome: &std::result::Result<SyncReport, SyncFailure>) -> u8 {
    match outcome {
        Ok(report) if report.is_success() => {
            info!(
                "{}: {} record(s) updated, {} checked",
                report.record_name,
                report.updated_count(),
                report.families.len()
            );
            CfddnsExitCode::Success as u8
        }
        Ok(report) => {
            for (family, e) in report.failures() {
                error!("{} reconciliation failed: {}", family, e);
            }
            CfddnsExitCode::FamilyFailed as u8
        }
        Err(failure) => {
            error!("{}. Terminating.", failure);
            failure.error.exit_code()
        }
    }
}
