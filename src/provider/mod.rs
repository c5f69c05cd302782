//! Wallet provider seam.
//!
//! The wallet is not owned by this crate. Callers hand the assurance state
//! machine whatever provider is currently injected (if any), fetched fresh
//! from a [`ProviderSource`] at the start of each attempt.

pub mod rpc;

use std::sync::Arc;

use async_trait::async_trait;

use crate::error::ProviderError;
use crate::network::{AddChainParameters, ChainId};

pub use self::rpc::{BridgeProviderSource, JsonRpcWalletProvider};

/// EIP-1193 network-management surface of an injected wallet.
#[async_trait]
pub trait WalletProvider: Send + Sync {
    /// `eth_chainId`.
    async fn active_chain(&self) -> Result<ChainId, ProviderError>;

    /// `wallet_switchEthereumChain`.
    async fn switch_chain(&self, chain_id: ChainId) -> Result<(), ProviderError>;

    /// `wallet_addEthereumChain`. Wallets switch to the network once it is
    /// registered.
    async fn add_chain(&self, params: &AddChainParameters) -> Result<(), ProviderError>;
}

/// Handle to the currently injected wallet, if there is one.
pub type ProviderHandle = Arc<dyn WalletProvider>;

/// Host lookup for the injected wallet.
///
/// Absence is a normal condition (no wallet installed), not an error.
pub trait ProviderSource: Send + Sync {
    fn current(&self) -> Option<ProviderHandle>;
}

/// Source that always yields the same handle. Used when the host hands over a
/// provider once at startup.
#[derive(Clone, Default)]
pub struct FixedProviderSource {
    provider: Option<ProviderHandle>,
}

impl FixedProviderSource {
    pub fn new(provider: Option<ProviderHandle>) -> Self {
        Self { provider }
    }

    pub fn absent() -> Self {
        Self::default()
    }
}

impl ProviderSource for FixedProviderSource {
    fn current(&self) -> Option<ProviderHandle> {
        self.provider.clone()
    }
}

impl<F> ProviderSource for F
where
    F: Fn() -> Option<ProviderHandle> + Send + Sync,
{
    fn current(&self) -> Option<ProviderHandle> {
        self()
    }
}
