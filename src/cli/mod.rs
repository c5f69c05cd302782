//! Command-line surface.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;

use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::{mpsc, watch};

use crate::assurance::{NetworkAssurance, Trigger};
use crate::config::Config;
use crate::identity::resolve_identity;
use crate::notify::{ChannelNoticeSink, Notice, NoticeSink, TracingNoticeSink};
use crate::provider::BridgeProviderSource;
use crate::session::{AuthState, SessionReconciler, SessionSnapshot};

#[derive(Parser, Debug)]
#[command(
    name = "wallet-guard",
    version,
    about = "Keep a wallet on the required network and reconcile it with the signed-in identity"
)]
pub struct Cli {
    /// TOML config file (default: ~/.wallet-guard/config.toml).
    #[arg(long, global = true, env = "WALLET_GUARD_CONFIG")]
    pub config: Option<PathBuf>,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Decode an identity token and print the identity it asserts.
    Identity {
        #[arg(long, env = "WALLET_GUARD_ID_TOKEN", hide_env_values = true)]
        token: Option<String>,
    },
    /// Run one network assurance attempt against the configured wallet bridge.
    Ensure,
    /// Read identity tokens from stdin (one per line, blank line = signed out)
    /// and reconcile the wallet on every change.
    Watch,
    /// Print the required network in `wallet_addEthereumChain` form.
    Network,
}

/// Run a subcommand. Returns whether it succeeded, for the exit code.
pub async fn run_command(command: Command, config: Config) -> anyhow::Result<bool> {
    match command {
        Command::Identity { token } => run_identity(token.as_deref()).map(|_| true),
        Command::Ensure => run_ensure(config).await,
        Command::Watch => run_watch(config).await.map(|_| true),
        Command::Network => {
            let params = config.network.add_chain_parameters();
            println!("{}", serde_json::to_string_pretty(&params)?);
            Ok(true)
        }
    }
}

fn run_identity(token: Option<&str>) -> anyhow::Result<()> {
    match resolve_identity(token)? {
        Some(identity) => println!("{}", serde_json::to_string_pretty(&identity)?),
        None => println!("no verified session"),
    }
    Ok(())
}

/// Wire the configured bridge and network into an assurance runner.
fn bridge_assurance(
    config: Config,
    sink: Arc<dyn NoticeSink>,
) -> crate::Result<(BridgeProviderSource, NetworkAssurance)> {
    let timeout = config.provider.timeout();
    let source = BridgeProviderSource::new(config.provider.bridge_url, timeout)?;
    let assurance = NetworkAssurance::new(config.network, sink).with_call_timeout(timeout);
    Ok((source, assurance))
}

async fn run_ensure(config: Config) -> anyhow::Result<bool> {
    let (source, assurance) = bridge_assurance(config, Arc::new(TracingNoticeSink))?;

    let outcome = match assurance.trigger(&source).await {
        Trigger::Completed(outcome) => outcome,
        Trigger::Coalesced => anyhow::bail!("assurance attempt already running"),
    };
    println!("{}", serde_json::to_string_pretty(&outcome)?);
    Ok(outcome.permits_chain_actions())
}

async fn run_watch(config: Config) -> anyhow::Result<()> {
    let (sink, notices) = ChannelNoticeSink::channel(32);
    let (source, assurance) = bridge_assurance(config, Arc::new(sink))?;
    let (reconciler, snapshots) = SessionReconciler::new(assurance, Arc::new(source));

    let (auth_tx, auth_rx) = watch::channel(AuthState::signed_out());
    let reconciler = reconciler.spawn(auth_rx);

    let printer = tokio::spawn(async move {
        let mut out = std::io::stdout();
        print_updates(notices, snapshots, &mut out).await
    });

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    while let Some(line) = lines.next_line().await? {
        let state = match line.trim() {
            "" => AuthState::signed_out(),
            token => AuthState::signed_in(token),
        };
        if auth_tx.send(state).is_err() {
            break;
        }
    }

    drop(auth_tx);
    reconciler.await?;
    printer.await??;
    Ok(())
}

/// Print notices and session snapshots as they arrive. Notices still queued
/// when the session ends are flushed before returning.
async fn print_updates<W: Write>(
    mut notices: mpsc::Receiver<Notice>,
    mut snapshots: watch::Receiver<SessionSnapshot>,
    out: &mut W,
) -> std::io::Result<()> {
    loop {
        tokio::select! {
            biased;
            Some(notice) = notices.recv() => write_notice(out, &notice)?,
            changed = snapshots.changed() => {
                if changed.is_err() {
                    break;
                }
                let snapshot = snapshots.borrow_and_update().clone();
                writeln!(out, "{}", serde_json::to_string(&snapshot)?)?;
            }
        }
    }
    while let Some(notice) = notices.recv().await {
        write_notice(out, &notice)?;
    }
    out.flush()
}

fn write_notice<W: Write>(out: &mut W, notice: &Notice) -> std::io::Result<()> {
    writeln!(
        out,
        "[{}] {}: {}",
        notice.severity.as_str(),
        notice.title,
        notice.description
    )
}
