//! Network assurance state machine.
//!
//! One attempt walks Start -> CheckChain -> RequestSwitch -> RequestAdd and
//! stops at the first terminal outcome. Attempts never retry on their own;
//! the next external trigger starts over from Start.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use serde::Serialize;
use tracing::Instrument;
use uuid::Uuid;

use crate::error::ProviderError;
use crate::network::NetworkRequirement;
use crate::notify::{Notice, NoticeSink};
use crate::provider::{ProviderSource, WalletProvider};

pub const DEFAULT_CALL_TIMEOUT: Duration = Duration::from_secs(30);

const MSG_PROVIDER_ABSENT: &str = "Please install a wallet extension.";
const MSG_SWITCHED: &str = "Switched to required network.";
const MSG_ADDED: &str = "Required network added and switched.";
const MSG_ADD_FAILED: &str = "Failed to add required network.";
const MSG_USER_REJECTED: &str = "User declined network switch.";

/// Terminal result of one assurance attempt.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "outcome", content = "detail", rename_all = "snake_case")]
pub enum AssuranceOutcome {
    AlreadyCorrect,
    SwitchedSuccessfully,
    AddedAndSwitched,
    ProviderAbsent,
    UserRejected,
    AddFailed,
    UnknownFailure(String),
}

impl AssuranceOutcome {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::AlreadyCorrect => "already_correct",
            Self::SwitchedSuccessfully => "switched_successfully",
            Self::AddedAndSwitched => "added_and_switched",
            Self::ProviderAbsent => "provider_absent",
            Self::UserRejected => "user_rejected",
            Self::AddFailed => "add_failed",
            Self::UnknownFailure(_) => "unknown_failure",
        }
    }

    /// Whether the wallet ended up on the required network, i.e. chain-bound
    /// actions may proceed.
    pub fn permits_chain_actions(&self) -> bool {
        matches!(
            self,
            Self::AlreadyCorrect | Self::SwitchedSuccessfully | Self::AddedAndSwitched
        )
    }

    /// The user-facing notice for this outcome, if it has one.
    pub fn notice(&self) -> Option<Notice> {
        match self {
            Self::ProviderAbsent => Some(Notice::error(MSG_PROVIDER_ABSENT)),
            Self::AddedAndSwitched => Some(Notice::info(MSG_ADDED)),
            Self::AddFailed => Some(Notice::error(MSG_ADD_FAILED)),
            Self::AlreadyCorrect
            | Self::SwitchedSuccessfully
            | Self::UserRejected
            | Self::UnknownFailure(_) => None,
        }
    }
}

/// Result of asking for an attempt.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Trigger {
    Completed(AssuranceOutcome),
    /// Another attempt was already in flight; this trigger issued no
    /// provider calls.
    Coalesced,
}

/// Single-slot in-flight latch.
#[derive(Debug, Clone, Default)]
pub struct AssuranceLatch {
    busy: Arc<AtomicBool>,
}

impl AssuranceLatch {
    pub fn try_acquire(&self) -> Option<LatchGuard> {
        self.busy
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .ok()
            .map(|_| LatchGuard {
                busy: Arc::clone(&self.busy),
            })
    }

    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }
}

/// Releases the latch on drop, on every exit path.
#[derive(Debug)]
pub struct LatchGuard {
    busy: Arc<AtomicBool>,
}

impl Drop for LatchGuard {
    fn drop(&mut self) {
        self.busy.store(false, Ordering::Release);
    }
}

/// Drives a wallet toward one required network.
#[derive(Clone)]
pub struct NetworkAssurance {
    requirement: Arc<NetworkRequirement>,
    sink: Arc<dyn NoticeSink>,
    call_timeout: Duration,
    latch: AssuranceLatch,
}

impl NetworkAssurance {
    pub fn new(requirement: NetworkRequirement, sink: Arc<dyn NoticeSink>) -> Self {
        Self {
            requirement: Arc::new(requirement),
            sink,
            call_timeout: DEFAULT_CALL_TIMEOUT,
            latch: AssuranceLatch::default(),
        }
    }

    pub fn with_call_timeout(mut self, timeout: Duration) -> Self {
        self.call_timeout = timeout;
        self
    }

    pub fn requirement(&self) -> &NetworkRequirement {
        &self.requirement
    }

    pub fn is_in_flight(&self) -> bool {
        self.latch.is_busy()
    }

    /// Fetch the current provider from `source` and run one attempt, unless
    /// an attempt is already in flight.
    pub async fn trigger(&self, source: &dyn ProviderSource) -> Trigger {
        let Some(_guard) = self.latch.try_acquire() else {
            tracing::debug!(
                chain_id = %self.requirement.chain_id,
                "Assurance attempt already in flight, coalescing trigger"
            );
            return Trigger::Coalesced;
        };
        let provider = source.current();
        Trigger::Completed(self.ensure_network(provider.as_deref()).await)
    }

    /// Run one full attempt against `provider` and report the outcome.
    ///
    /// Never fails: every provider error ends in an outcome.
    pub async fn ensure_network(
        &self,
        provider: Option<&dyn WalletProvider>,
    ) -> AssuranceOutcome {
        let span = tracing::info_span!(
            "network_assurance",
            attempt_id = %Uuid::new_v4(),
            chain_id = %self.requirement.chain_id,
        );
        async {
            let outcome = self.run(provider).await;
            self.report(&outcome);
            outcome
        }
        .instrument(span)
        .await
    }

    async fn run(&self, provider: Option<&dyn WalletProvider>) -> AssuranceOutcome {
        let Some(provider) = provider else {
            return AssuranceOutcome::ProviderAbsent;
        };
        let required = self.requirement.chain_id;

        let active = match self.bounded(provider.active_chain()).await {
            Ok(active) => active,
            Err(e) => {
                return AssuranceOutcome::UnknownFailure(format!("chain query failed: {e}"));
            }
        };
        if self.requirement.matches(active) {
            return AssuranceOutcome::AlreadyCorrect;
        }
        tracing::debug!(active = %active, "Wallet is on a different network, requesting switch");

        match self.bounded(provider.switch_chain(required)).await {
            Ok(()) => AssuranceOutcome::SwitchedSuccessfully,
            Err(ProviderError::UnrecognizedChain) => self.add_chain(provider).await,
            Err(ProviderError::UserRejected) => AssuranceOutcome::UserRejected,
            Err(e) => AssuranceOutcome::UnknownFailure(format!("switch failed: {e}")),
        }
    }

    async fn add_chain(&self, provider: &dyn WalletProvider) -> AssuranceOutcome {
        tracing::debug!("Wallet does not know the required network, requesting add");
        let params = self.requirement.add_chain_parameters();
        match self.bounded(provider.add_chain(&params)).await {
            Ok(()) => AssuranceOutcome::AddedAndSwitched,
            Err(e) => {
                tracing::error!(code = e.code_label(), "Failed to add required network: {}", e);
                AssuranceOutcome::AddFailed
            }
        }
    }

    async fn bounded<T>(
        &self,
        call: impl std::future::Future<Output = Result<T, ProviderError>>,
    ) -> Result<T, ProviderError> {
        match tokio::time::timeout(self.call_timeout, call).await {
            Ok(result) => result,
            Err(_) => Err(ProviderError::Timeout(timeout_millis(self.call_timeout))),
        }
    }

    fn report(&self, outcome: &AssuranceOutcome) {
        let label = outcome.as_str();
        match outcome {
            AssuranceOutcome::AlreadyCorrect => {
                tracing::debug!(outcome = label, "Already on required network");
            }
            AssuranceOutcome::SwitchedSuccessfully => {
                tracing::info!(outcome = label, "{}", MSG_SWITCHED);
            }
            AssuranceOutcome::AddedAndSwitched => {
                tracing::info!(outcome = label, "{}", MSG_ADDED);
            }
            AssuranceOutcome::ProviderAbsent => {
                tracing::warn!(outcome = label, "No wallet provider detected");
            }
            AssuranceOutcome::UserRejected => {
                tracing::info!(outcome = label, "{}", MSG_USER_REJECTED);
            }
            AssuranceOutcome::AddFailed => {
                tracing::warn!(outcome = label, "{}", MSG_ADD_FAILED);
            }
            AssuranceOutcome::UnknownFailure(detail) => {
                tracing::error!(outcome = label, "Network assurance failed: {}", detail);
            }
        }
        if let Some(notice) = outcome.notice() {
            self.sink.notify(notice);
        }
    }
}

fn timeout_millis(timeout: Duration) -> u64 {
    u64::try_from(timeout.as_millis()).unwrap_or(u64::MAX)
}
