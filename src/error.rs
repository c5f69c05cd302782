//! Error types for wallet-guard.

/// Top-level error type for the crate.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Identity error: {0}")]
    Identity(#[from] IdentityError),

    #[error("Provider error: {0}")]
    Provider(#[from] ProviderError),
}

/// Configuration-related errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("Invalid configuration value for {key}: {message}")]
    InvalidValue { key: String, message: String },

    #[error("Failed to parse configuration: {0}")]
    ParseError(String),
}

/// Identity token errors.
///
/// Every decoding failure collapses into `MalformedToken`; callers treat the
/// session as absent. The reason is kept for logs only.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum IdentityError {
    #[error("Malformed identity token: {reason}")]
    MalformedToken { reason: String },
}

impl IdentityError {
    pub(crate) fn malformed(reason: impl Into<String>) -> Self {
        Self::MalformedToken {
            reason: reason.into(),
        }
    }
}

/// Wallet provider failures, translated from raw EIP-1193 codes once at the
/// adapter boundary.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ProviderError {
    /// The wallet does not know the requested chain (code 4902).
    #[error("Unrecognized chain")]
    UnrecognizedChain,

    /// The user dismissed the wallet prompt (code 4001).
    #[error("User rejected the request")]
    UserRejected,

    #[error("Provider call timed out after {0}ms")]
    Timeout(u64),

    #[error("Provider returned error {code}: {message}")]
    Rpc { code: i64, message: String },

    #[error("Provider transport failed: {0}")]
    Transport(String),

    #[error("Provider returned an unexpected response: {0}")]
    InvalidResponse(String),
}

/// EIP-1193 user rejection.
pub const USER_REJECTED_CODE: i64 = 4001;
/// EIP-3326 unrecognized chain.
pub const UNRECOGNIZED_CHAIN_CODE: i64 = 4902;
/// JSON-RPC internal error. Some mobile wallets wrap 4902 inside it.
pub const INTERNAL_ERROR_CODE: i64 = -32603;

impl ProviderError {
    /// Translate a raw provider error code (and optional `data` payload) into
    /// the closed taxonomy.
    pub fn from_code(
        code: i64,
        message: impl Into<String>,
        data: Option<&serde_json::Value>,
    ) -> Self {
        match code {
            USER_REJECTED_CODE => Self::UserRejected,
            UNRECOGNIZED_CHAIN_CODE => Self::UnrecognizedChain,
            INTERNAL_ERROR_CODE if wrapped_code(data) == Some(UNRECOGNIZED_CHAIN_CODE) => {
                Self::UnrecognizedChain
            }
            _ => Self::Rpc {
                code,
                message: message.into(),
            },
        }
    }

    /// Stable label for structured logs.
    pub fn code_label(&self) -> &'static str {
        match self {
            Self::UnrecognizedChain => "unrecognized_chain",
            Self::UserRejected => "user_rejected",
            Self::Timeout(_) => "timeout",
            Self::Rpc { .. } => "rpc_error",
            Self::Transport(_) => "transport_error",
            Self::InvalidResponse(_) => "invalid_response",
        }
    }
}

fn wrapped_code(data: Option<&serde_json::Value>) -> Option<i64> {
    data?.get("originalError")?.get("code")?.as_i64()
}

pub type Result<T> = std::result::Result<T, Error>;
