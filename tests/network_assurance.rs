//! End-to-end coverage of the network assurance state machine against a
//! scripted wallet provider.

use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use pretty_assertions::assert_eq;

use wallet_guard::error::ProviderError;
use wallet_guard::network::{AddChainParameters, ChainId, NetworkRequirement};
use wallet_guard::notify::{Notice, NoticeSink, Severity};
use wallet_guard::provider::{FixedProviderSource, ProviderHandle, WalletProvider};
use wallet_guard::{AssuranceOutcome, NetworkAssurance, Trigger};

#[derive(Debug, Clone, PartialEq)]
enum Call {
    ActiveChain,
    Switch(String),
    Add(AddChainParameters),
}

/// Wallet whose answers are fixed up front and which records every request.
struct ScriptedWallet {
    active: Result<ChainId, ProviderError>,
    switch: Result<(), ProviderError>,
    add: Result<(), ProviderError>,
    calls: Mutex<Vec<Call>>,
}

impl ScriptedWallet {
    fn on_chain(raw: &str) -> Self {
        Self {
            active: Ok(raw.parse().unwrap()),
            switch: Ok(()),
            add: Ok(()),
            calls: Mutex::new(Vec::new()),
        }
    }

    fn switch_fails(mut self, error: ProviderError) -> Self {
        self.switch = Err(error);
        self
    }

    fn add_fails(mut self, error: ProviderError) -> Self {
        self.add = Err(error);
        self
    }

    fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    fn add_calls(&self) -> usize {
        self.calls()
            .iter()
            .filter(|c| matches!(c, Call::Add(_)))
            .count()
    }
}

#[async_trait]
impl WalletProvider for ScriptedWallet {
    async fn active_chain(&self) -> Result<ChainId, ProviderError> {
        self.calls.lock().unwrap().push(Call::ActiveChain);
        self.active.clone()
    }

    async fn switch_chain(&self, chain_id: ChainId) -> Result<(), ProviderError> {
        self.calls
            .lock()
            .unwrap()
            .push(Call::Switch(chain_id.to_hex()));
        self.switch.clone()
    }

    async fn add_chain(&self, params: &AddChainParameters) -> Result<(), ProviderError> {
        self.calls.lock().unwrap().push(Call::Add(params.clone()));
        self.add.clone()
    }
}

#[derive(Default)]
struct RecordingSink {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingSink {
    fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }
}

impl NoticeSink for RecordingSink {
    fn notify(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }
}

fn assurance() -> (NetworkAssurance, Arc<RecordingSink>) {
    let sink = Arc::new(RecordingSink::default());
    (
        NetworkAssurance::new(NetworkRequirement::edu_testnet(), sink.clone()),
        sink,
    )
}

#[tokio::test]
async fn already_on_required_chain_issues_no_switch_or_add() {
    let (assurance, sink) = assurance();
    let wallet = ScriptedWallet::on_chain("0xa045c");

    let outcome = assurance.ensure_network(Some(&wallet)).await;

    assert_eq!(outcome, AssuranceOutcome::AlreadyCorrect);
    assert_eq!(wallet.calls(), vec![Call::ActiveChain]);
    assert!(sink.notices().is_empty());
}

#[tokio::test]
async fn switch_success_is_log_only() {
    let (assurance, sink) = assurance();
    let wallet = ScriptedWallet::on_chain("0x1");

    let outcome = assurance.ensure_network(Some(&wallet)).await;

    assert_eq!(outcome, AssuranceOutcome::SwitchedSuccessfully);
    assert_eq!(
        wallet.calls(),
        vec![Call::ActiveChain, Call::Switch("0xa045c".to_string())]
    );
    assert!(sink.notices().is_empty());
}

#[tokio::test]
async fn unrecognized_chain_adds_full_descriptor_once() {
    let (assurance, sink) = assurance();
    let wallet = ScriptedWallet::on_chain("0x1").switch_fails(ProviderError::UnrecognizedChain);

    let outcome = assurance.ensure_network(Some(&wallet)).await;

    assert_eq!(outcome, AssuranceOutcome::AddedAndSwitched);
    assert!(outcome.permits_chain_actions());

    let requirement = NetworkRequirement::edu_testnet();
    assert_eq!(
        wallet.calls(),
        vec![
            Call::ActiveChain,
            Call::Switch("0xa045c".to_string()),
            Call::Add(AddChainParameters {
                chain_id: requirement.chain_id,
                chain_name: "EDU Chain Testnet".to_string(),
                rpc_urls: vec!["https://rpc.open-campus-codex.gelato.digital".to_string()],
                native_currency: requirement.native_currency.clone(),
                block_explorer_urls: vec!["https://edu-chain-testnet.blockscout.com".to_string()],
            }),
        ]
    );

    let notices = sink.notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].severity, Severity::Info);
    assert_eq!(notices[0].description, "Required network added and switched.");
}

#[tokio::test]
async fn failed_add_reports_error_notice() {
    let (assurance, sink) = assurance();
    let wallet = ScriptedWallet::on_chain("0x1")
        .switch_fails(ProviderError::UnrecognizedChain)
        .add_fails(ProviderError::UserRejected);

    let outcome = assurance.ensure_network(Some(&wallet)).await;

    assert_eq!(outcome, AssuranceOutcome::AddFailed);
    assert_eq!(wallet.add_calls(), 1);
    let notices = sink.notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].severity, Severity::Error);
    assert_eq!(notices[0].description, "Failed to add required network.");
}

#[tokio::test]
async fn user_rejection_never_adds() {
    let (assurance, sink) = assurance();
    let wallet = ScriptedWallet::on_chain("0x89").switch_fails(ProviderError::UserRejected);

    let outcome = assurance.ensure_network(Some(&wallet)).await;

    assert_eq!(outcome, AssuranceOutcome::UserRejected);
    assert_eq!(wallet.add_calls(), 0);
    assert!(sink.notices().is_empty());
}

#[tokio::test]
async fn unknown_switch_failure_never_adds() {
    let (assurance, sink) = assurance();
    let wallet = ScriptedWallet::on_chain("0x89").switch_fails(ProviderError::Rpc {
        code: -32002,
        message: "Request already pending".to_string(),
    });

    let outcome = assurance.ensure_network(Some(&wallet)).await;

    match &outcome {
        AssuranceOutcome::UnknownFailure(detail) => {
            assert!(detail.contains("Request already pending"))
        }
        other => panic!("unexpected outcome: {other:?}"),
    }
    assert!(!outcome.permits_chain_actions());
    assert_eq!(wallet.add_calls(), 0);
    assert!(sink.notices().is_empty());
}

#[tokio::test]
async fn failing_chain_query_is_unknown_failure() {
    let (assurance, _sink) = assurance();
    let mut wallet = ScriptedWallet::on_chain("0x1");
    wallet.active = Err(ProviderError::Transport("connection refused".to_string()));

    let outcome = assurance.ensure_network(Some(&wallet)).await;

    assert!(matches!(outcome, AssuranceOutcome::UnknownFailure(_)));
    assert_eq!(wallet.calls(), vec![Call::ActiveChain]);
}

#[tokio::test]
async fn absent_provider_makes_no_calls() {
    let (assurance, sink) = assurance();

    let trigger = assurance.trigger(&FixedProviderSource::absent()).await;

    assert_eq!(trigger, Trigger::Completed(AssuranceOutcome::ProviderAbsent));
    let notices = sink.notices();
    assert_eq!(notices.len(), 1);
    assert_eq!(notices[0].severity, Severity::Error);
    assert_eq!(notices[0].description, "Please install a wallet extension.");
}

#[tokio::test]
async fn provider_is_refetched_for_every_attempt() {
    let (assurance, _sink) = assurance();
    let first = Arc::new(ScriptedWallet::on_chain("0x1"));
    let second = Arc::new(ScriptedWallet::on_chain("0xa045c"));
    let handles: Mutex<Vec<ProviderHandle>> =
        Mutex::new(vec![second.clone() as ProviderHandle, first.clone() as ProviderHandle]);
    let source = move || handles.lock().unwrap().pop();

    assert_eq!(
        assurance.trigger(&source).await,
        Trigger::Completed(AssuranceOutcome::SwitchedSuccessfully)
    );
    assert_eq!(
        assurance.trigger(&source).await,
        Trigger::Completed(AssuranceOutcome::AlreadyCorrect)
    );
    assert_eq!(
        assurance.trigger(&source).await,
        Trigger::Completed(AssuranceOutcome::ProviderAbsent)
    );
    assert_eq!(first.calls().len(), 2);
    assert_eq!(second.calls().len(), 1);
}
