//! wallet-guard: keeps a connected wallet on the one network the application
//! requires, and reconciles it with the identity asserted by the session token.
//!
//! - [`identity`] decodes session tokens into an [`identity::IdentityRecord`].
//! - [`assurance`] runs the check / switch / add state machine against a
//!   [`provider::WalletProvider`].
//! - [`session`] re-runs assurance on every auth-state transition.

pub mod assurance;
pub mod cli;
pub mod config;
pub mod error;
pub mod identity;
pub mod logging;
pub mod network;
pub mod notify;
pub mod provider;
pub mod session;
pub mod settings;

pub use assurance::{AssuranceOutcome, NetworkAssurance, Trigger};
pub use error::{Error, Result};
pub use identity::{IdentityRecord, resolve_identity};
pub use network::{ChainId, NetworkRequirement};
