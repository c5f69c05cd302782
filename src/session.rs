//! Session reconciliation.
//!
//! Subscribes to auth-state changes and re-runs network assurance on every
//! token transition, including sign-out: a disconnected wallet can still be
//! sitting on the wrong network. The latest identity and outcome are
//! published on a watch channel for the UI.

use std::sync::Arc;

use secrecy::{ExposeSecret, SecretString};
use serde::Serialize;
use tokio::sync::watch;
use tokio::task::JoinHandle;

use crate::assurance::{AssuranceOutcome, NetworkAssurance, Trigger};
use crate::identity::{IdentityRecord, resolve_identity_or_absent};
use crate::provider::ProviderSource;

/// Auth state as seen by this crate. Only the token is read.
#[derive(Debug, Clone, Default)]
pub struct AuthState {
    pub id_token: Option<SecretString>,
}

impl AuthState {
    pub fn signed_in(token: impl Into<String>) -> Self {
        Self {
            id_token: Some(SecretString::from(token.into())),
        }
    }

    pub fn signed_out() -> Self {
        Self::default()
    }

    pub fn token(&self) -> Option<&str> {
        self.id_token.as_ref().map(|t| t.expose_secret())
    }

    fn same_token(&self, other: &Self) -> bool {
        self.token() == other.token()
    }
}

/// What the UI renders: who is signed in, and where the wallet ended up.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct SessionSnapshot {
    pub identity: Option<IdentityRecord>,
    pub outcome: Option<AssuranceOutcome>,
}

impl SessionSnapshot {
    pub fn chain_actions_allowed(&self) -> bool {
        self.identity.is_some()
            && self
                .outcome
                .as_ref()
                .is_some_and(AssuranceOutcome::permits_chain_actions)
    }
}

pub struct SessionReconciler {
    assurance: NetworkAssurance,
    source: Arc<dyn ProviderSource>,
    snapshot_tx: watch::Sender<SessionSnapshot>,
}

impl SessionReconciler {
    pub fn new(
        assurance: NetworkAssurance,
        source: Arc<dyn ProviderSource>,
    ) -> (Self, watch::Receiver<SessionSnapshot>) {
        let (snapshot_tx, snapshot_rx) = watch::channel(SessionSnapshot::default());
        (
            Self {
                assurance,
                source,
                snapshot_tx,
            },
            snapshot_rx,
        )
    }

    /// Handle one auth-state transition.
    pub async fn on_auth_change(&self, state: &AuthState) -> Trigger {
        let identity = resolve_identity_or_absent(state.token());
        match &identity {
            Some(identity) => tracing::info!(
                address = %identity.short_address(),
                username = %identity.username,
                "Session identity resolved"
            ),
            None => tracing::info!("No verified session"),
        }
        // The previous outcome belongs to the previous session.
        self.snapshot_tx.send_modify(|snapshot| {
            snapshot.identity = identity;
            snapshot.outcome = None;
        });

        let trigger = self.assurance.trigger(self.source.as_ref()).await;
        if let Trigger::Completed(outcome) = &trigger {
            let outcome = outcome.clone();
            self.snapshot_tx.send_modify(|snapshot| {
                snapshot.outcome = Some(outcome);
            });
        }
        trigger
    }

    /// Run until the auth-state sender is dropped.
    ///
    /// The current state is handled immediately. Changes that arrive while an
    /// attempt is running collapse into the latest value, so attempts never
    /// overlap and the final state is always reconciled.
    pub async fn run(self, mut auth_rx: watch::Receiver<AuthState>) {
        let mut last: Option<AuthState> = None;
        loop {
            let state = auth_rx.borrow_and_update().clone();
            let transitioned = last.as_ref().is_none_or(|prev| !prev.same_token(&state));
            if transitioned {
                self.on_auth_change(&state).await;
                last = Some(state);
            }
            if auth_rx.changed().await.is_err() {
                tracing::debug!("Auth state source closed, stopping session reconciler");
                break;
            }
        }
    }

    pub fn spawn(self, auth_rx: watch::Receiver<AuthState>) -> JoinHandle<()> {
        tokio::spawn(self.run(auth_rx))
    }
}
