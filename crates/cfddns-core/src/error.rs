//! Error types for the cfddns synchronizer
//!
//! Every step of a sync run returns one of these. The variants map onto the
//! process exit codes exposed by the `cfddns` binary (see [`Error::exit_code`]).

use crate::traits::IpFamily;
use thiserror::Error;

/// Result type alias for cfddns operations
pub type Result<T> = std::result::Result<T, Error>;

/// Core error type for the cfddns synchronizer
#[derive(Error, Debug)]
pub enum Error {
    /// Token introspection reported the credential as unusable
    #[error("API token validation failed: {0}")]
    AuthFailure(String),

    /// No zone matched the configured domain
    #[error("No zone found for domain {0}")]
    ZoneNotFound(String),

    /// No record of the required type exists for the hostname
    #[error("DNS record not found: {name} (type: {record_type})")]
    RecordNotFound {
        /// Fully-qualified record name
        name: String,
        /// Record type that was looked up, or "any"
        record_type: String,
    },

    /// The public address for a family could not be determined
    #[error("Address discovery failed for {family}: {message}")]
    AddressDiscovery {
        family: IpFamily,
        message: String,
    },

    /// The provider rejected a record update
    #[error("Update of record {record} failed: {message}")]
    UpdateFailed {
        /// Provider record identifier
        record: String,
        /// First error message reported by the provider
        message: String,
    },

    /// Transport-level HTTP failure
    #[error("HTTP error: {0}")]
    Http(String),

    /// A response body did not have the expected shape
    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    /// JSON serialization/deserialization errors
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Provider-reported error outside of record updates
    #[error("Provider error ({provider}): {message}")]
    Provider {
        /// Provider name
        provider: String,
        /// Error message
        message: String,
    },

    /// Configuration errors
    #[error("Configuration error: {0}")]
    Config(String),

    /// Invalid input
    #[error("Invalid input: {0}")]
    InvalidInput(String),
}

impl Error {
    /// Create an authentication error
    pub fn auth(msg: impl Into<String>) -> Self {
        Self::AuthFailure(msg.into())
    }

    /// Create a "zone not found" error
    pub fn zone_not_found(domain: impl Into<String>) -> Self {
        Self::ZoneNotFound(domain.into())
    }

    /// Create a "record not found" error
    pub fn record_not_found(name: impl Into<String>, record_type: impl Into<String>) -> Self {
        Self::RecordNotFound {
            name: name.into(),
            record_type: record_type.into(),
        }
    }

    /// Create an address discovery error
    pub fn discovery(family: IpFamily, message: impl Into<String>) -> Self {
        Self::AddressDiscovery {
            family,
            message: message.into(),
        }
    }

    /// Create an update failure
    pub fn update_failed(record: impl Into<String>, message: impl Into<String>) -> Self {
        Self::UpdateFailed {
            record: record.into(),
            message: message.into(),
        }
    }

    /// Create an HTTP error
    pub fn http(msg: impl Into<String>) -> Self {
        Self::Http(msg.into())
    }

    /// Create an invalid response error
    pub fn invalid_response(msg: impl Into<String>) -> Self {
        Self::InvalidResponse(msg.into())
    }

    /// Create a provider-specific error
    pub fn provider(provider: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Provider {
            provider: provider.into(),
            message: message.into(),
        }
    }

    /// Create a configuration error
    pub fn config(msg: impl Into<String>) -> Self {
        Self::Config(msg.into())
    }

    /// Create an invalid input error
    pub fn invalid_input(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Process exit code for this error kind
    ///
    /// | Code | Kind |
    /// |------|------|
    /// | 1 | configuration / invalid input |
    /// | 2 | transport, malformed response, provider-reported error |
    /// | 3 | authentication |
    /// | 4 | zone not found |
    /// | 5 | record not found |
    /// | 6 | address discovery |
    /// | 7 | record update rejected |
    pub fn exit_code(&self) -> u8 {
        match self {
            Error::Config(_) | Error::InvalidInput(_) => 1,
            Error::Http(_)
            | Error::InvalidResponse(_)
            | Error::Json(_)
            | Error::Provider { .. } => 2,
            Error::AuthFailure(_) => 3,
            Error::ZoneNotFound(_) => 4,
            Error::RecordNotFound { .. } => 5,
            Error::AddressDiscovery { .. } => 6,
            Error::UpdateFailed { .. } => 7,
        }
    }
}
