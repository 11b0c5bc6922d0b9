//! Wallet session handling.
//!
//! A [`WalletProvider`] is whatever holds the user's accounts and asks for
//! consent (EIP-1193 semantics). [`WalletConnector`] drives the connection
//! lifecycle on top of it and turns provider notifications into
//! [`Reaction`]s the caller acts on.

use std::sync::Arc;
use std::time::Duration;

use serde_json::{Value, json};
use thiserror::Error;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;

use crate::{
    conf::Settings,
    pkg::internal::contract::rpc::LedgerRpc,
    prelude::{RelayError, Result},
};

pub const INSTALL_URL: &str = "https://metamask.io/download/";

/// EIP-1193 "user rejected the request".
pub const USER_REJECTED: i64 = 4001;

const METHOD_NOT_FOUND: i64 = -32601;
const INTERNAL_FAULT: i64 = -32603;

#[derive(Debug, Clone, Error, PartialEq, Eq)]
#[error("{message}")]
pub struct ProviderError {
    pub code: i64,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WalletEvent {
    AccountsChanged(Vec<String>),
    ChainChanged(String),
}

#[async_trait::async_trait]
pub trait WalletProvider: Send + Sync {
    fn is_installed(&self) -> bool;

    /// Ask the user to share accounts. The first one becomes active.
    async fn request_accounts(&self) -> core::result::Result<Vec<String>, ProviderError>;

    fn subscribe(&self) -> broadcast::Receiver<WalletEvent>;
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionState {
    Disconnected,
    Connecting,
    Connected { address: String },
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Reaction {
    AccountSwitched(String),
    Disconnected,
    /// The network changed; anything bound to the previous chain is stale.
    Reload(String),
    Ignored,
}

pub struct WalletConnector<P> {
    provider: P,
    state: ConnectionState,
    events: Option<broadcast::Receiver<WalletEvent>>,
}

impl<P: WalletProvider> WalletConnector<P> {
    pub fn new(provider: P) -> Self {
        Self {
            provider,
            state: ConnectionState::Disconnected,
            events: None,
        }
    }

    pub fn provider(&self) -> &P {
        &self.provider
    }

    pub fn state(&self) -> &ConnectionState {
        &self.state
    }

    pub fn address(&self) -> Option<&str> {
        match &self.state {
            ConnectionState::Connected { address } => Some(address),
            _ => None,
        }
    }

    pub fn is_connected(&self) -> bool {
        matches!(self.state, ConnectionState::Connected { .. })
    }

    pub async fn connect(&mut self) -> Result<String> {
        if !self.provider.is_installed() {
            self.state = ConnectionState::Disconnected;
            return Err(RelayError::ExtensionAbsent(format!(
                "MetaMask is not installed. Please install MetaMask to continue. Download: {}",
                INSTALL_URL
            )));
        }

        self.state = ConnectionState::Connecting;
        let accounts = match self.provider.request_accounts().await {
            Ok(accounts) => accounts,
            Err(e) => {
                self.state = ConnectionState::Disconnected;
                return Err(if e.code == USER_REJECTED {
                    RelayError::ConsentDeclined("Connection rejected by user".into())
                } else {
                    RelayError::Connectivity(format!("Failed to connect wallet: {}", e.message))
                });
            }
        };

        let Some(address) = accounts.into_iter().next() else {
            self.state = ConnectionState::Disconnected;
            return Err(RelayError::ConsentDeclined("Connection rejected by user".into()));
        };

        tracing::info!("wallet connected as {}", address);
        self.events = Some(self.provider.subscribe());
        self.state = ConnectionState::Connected {
            address: address.clone(),
        };
        Ok(address)
    }

    pub fn disconnect(&mut self) {
        if self.is_connected() {
            tracing::info!("wallet disconnected");
        }
        self.events = None;
        self.state = ConnectionState::Disconnected;
    }

    pub fn handle(&mut self, event: WalletEvent) -> Reaction {
        if !self.is_connected() {
            return Reaction::Ignored;
        }
        match event {
            WalletEvent::AccountsChanged(accounts) => match accounts.into_iter().next() {
                Some(address) if self.address() == Some(address.as_str()) => Reaction::Ignored,
                Some(address) => {
                    tracing::info!("active account switched to {}", address);
                    self.state = ConnectionState::Connected {
                        address: address.clone(),
                    };
                    Reaction::AccountSwitched(address)
                }
                None => {
                    self.disconnect();
                    Reaction::Disconnected
                }
            },
            WalletEvent::ChainChanged(chain_id) => {
                tracing::warn!("network changed to {}, contract bindings must be rebuilt", chain_id);
                Reaction::Reload(chain_id)
            }
        }
    }

    /// Wait for the next provider notification and apply it. `None` once
    /// disconnected or when the provider stops emitting.
    pub async fn next_reaction(&mut self) -> Option<Reaction> {
        loop {
            let received = match self.events.as_mut() {
                Some(rx) => rx.recv().await,
                None => return None,
            };
            let event = match received {
                Ok(event) => event,
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    tracing::warn!("missed {} wallet notifications", n);
                    continue;
                }
                Err(broadcast::error::RecvError::Closed) => {
                    self.events = None;
                    return None;
                }
            };
            return Some(self.handle(event));
        }
    }
}

/// Wallet backed by the accounts a ledger node manages itself.
pub struct RpcWallet {
    rpc: Arc<LedgerRpc>,
    installed: bool,
    poll: Duration,
    events: broadcast::Sender<WalletEvent>,
}

impl RpcWallet {
    /// Probe the node; an unreachable node counts as no provider at all.
    pub async fn detect(settings: &Settings) -> Result<Self> {
        let rpc = Arc::new(LedgerRpc::new(settings)?);
        let installed = match rpc.request::<String>("eth_chainId", json!([])).await {
            Ok(chain_id) => {
                tracing::debug!("wallet provider at {} on chain {}", rpc.endpoint(), chain_id);
                true
            }
            Err(e) => {
                tracing::warn!("no wallet provider at {}: {}", rpc.endpoint(), e);
                false
            }
        };
        let (events, _) = broadcast::channel(16);
        Ok(Self {
            rpc,
            installed,
            poll: settings.receipt_poll(),
            events,
        })
    }

    /// Poll the node for account and chain changes until the handle is
    /// aborted.
    pub fn watch(&self) -> JoinHandle<()> {
        let rpc = self.rpc.clone();
        let events = self.events.clone();
        let poll = self.poll;
        tokio::spawn(async move {
            let mut accounts = rpc.request::<Vec<String>>("eth_accounts", json!([])).await.ok();
            let mut chain = rpc.request::<String>("eth_chainId", json!([])).await.ok();
            loop {
                tokio::time::sleep(poll).await;
                if let Ok(now) = rpc.request::<Vec<String>>("eth_accounts", json!([])).await {
                    if accounts.as_ref() != Some(&now) {
                        accounts = Some(now.clone());
                        let _ = events.send(WalletEvent::AccountsChanged(now));
                    }
                }
                if let Ok(now) = rpc.request::<String>("eth_chainId", json!([])).await {
                    if chain.as_ref() != Some(&now) {
                        chain = Some(now.clone());
                        let _ = events.send(WalletEvent::ChainChanged(now));
                    }
                }
            }
        })
    }

    async fn accounts_via(&self, method: &str) -> core::result::Result<Value, ProviderError> {
        match self.rpc.call_raw(method, json!([])).await {
            Ok(Ok(value)) => Ok(value),
            Ok(Err(fault)) => Err(ProviderError {
                code: fault.code,
                message: fault.message,
            }),
            Err(e) => Err(ProviderError {
                code: INTERNAL_FAULT,
                message: e.to_string(),
            }),
        }
    }
}

#[async_trait::async_trait]
impl WalletProvider for RpcWallet {
    fn is_installed(&self) -> bool {
        self.installed
    }

    async fn request_accounts(&self) -> core::result::Result<Vec<String>, ProviderError> {
        let value = match self.accounts_via("eth_requestAccounts").await {
            Err(e) if e.code == METHOD_NOT_FOUND => self.accounts_via("eth_accounts").await?,
            other => other?,
        };
        serde_json::from_value(value).map_err(|e| ProviderError {
            code: INTERNAL_FAULT,
            message: format!("unexpected accounts payload: {}", e),
        })
    }

    fn subscribe(&self) -> broadcast::Receiver<WalletEvent> {
        self.events.subscribe()
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use tracing_test::traced_test;

    use super::*;
    use crate::pkg::internal::contract::rpc::tests::{FakeNode, NODE_ACCOUNT, settings_for, spawn_node};

    struct MockProvider {
        installed: bool,
        outcome: core::result::Result<Vec<String>, ProviderError>,
        events: broadcast::Sender<WalletEvent>,
    }

    impl MockProvider {
        fn answering(outcome: core::result::Result<Vec<String>, ProviderError>) -> Self {
            Self {
                installed: true,
                outcome,
                events: broadcast::channel(8).0,
            }
        }
    }

    #[async_trait::async_trait]
    impl WalletProvider for MockProvider {
        fn is_installed(&self) -> bool {
            self.installed
        }

        async fn request_accounts(&self) -> core::result::Result<Vec<String>, ProviderError> {
            self.outcome.clone()
        }

        fn subscribe(&self) -> broadcast::Receiver<WalletEvent> {
            self.events.subscribe()
        }
    }

    fn connected(address: &str) -> (WalletConnector<MockProvider>, broadcast::Sender<WalletEvent>) {
        let provider = MockProvider::answering(Ok(vec![address.to_string()]));
        let events = provider.events.clone();
        (WalletConnector::new(provider), events)
    }

    #[tokio::test]
    #[traced_test]
    async fn absent_provider_points_to_install_link() {
        let mut provider = MockProvider::answering(Ok(vec!["0xabc".into()]));
        provider.installed = false;
        let mut wallet = WalletConnector::new(provider);
        let err = wallet.connect().await.unwrap_err();
        assert!(matches!(&err, RelayError::ExtensionAbsent(m) if m.contains(INSTALL_URL)));
        assert_eq!(wallet.state(), &ConnectionState::Disconnected);
    }

    #[tokio::test]
    #[traced_test]
    async fn rejected_consent_is_distinct() {
        let mut wallet = WalletConnector::new(MockProvider::answering(Err(ProviderError {
            code: USER_REJECTED,
            message: "User rejected the request.".into(),
        })));
        let err = wallet.connect().await.unwrap_err();
        assert_eq!(err, RelayError::ConsentDeclined("Connection rejected by user".into()));
        assert!(!wallet.is_connected());
    }

    #[tokio::test]
    #[traced_test]
    async fn other_faults_carry_their_cause() {
        let mut wallet = WalletConnector::new(MockProvider::answering(Err(ProviderError {
            code: -32002,
            message: "request already pending".into(),
        })));
        let err = wallet.connect().await.unwrap_err();
        assert_eq!(
            err,
            RelayError::Connectivity("Failed to connect wallet: request already pending".into())
        );
    }

    #[tokio::test]
    #[traced_test]
    async fn no_shared_account_counts_as_rejection() {
        let mut wallet = WalletConnector::new(MockProvider::answering(Ok(vec![])));
        assert!(matches!(wallet.connect().await, Err(RelayError::ConsentDeclined(_))));
    }

    #[tokio::test]
    #[traced_test]
    async fn connect_populates_address() -> Result<()> {
        let (mut wallet, _events) = connected("0xabc");
        assert_eq!(wallet.connect().await?, "0xabc");
        assert!(wallet.is_connected());
        assert_eq!(wallet.address(), Some("0xabc"));
        Ok(())
    }

    #[tokio::test]
    #[traced_test]
    async fn reacts_to_provider_notifications() -> Result<()> {
        let (mut wallet, events) = connected("0xabc");
        wallet.connect().await?;

        events.send(WalletEvent::AccountsChanged(vec!["0xdef".into()])).unwrap();
        assert_eq!(wallet.next_reaction().await, Some(Reaction::AccountSwitched("0xdef".into())));
        assert_eq!(wallet.address(), Some("0xdef"));

        events.send(WalletEvent::ChainChanged("0x1".into())).unwrap();
        assert_eq!(wallet.next_reaction().await, Some(Reaction::Reload("0x1".into())));

        events.send(WalletEvent::AccountsChanged(vec![])).unwrap();
        assert_eq!(wallet.next_reaction().await, Some(Reaction::Disconnected));
        assert!(!wallet.is_connected());
        assert_eq!(wallet.next_reaction().await, None);
        Ok(())
    }

    #[tokio::test]
    #[traced_test]
    async fn disconnect_drops_subscription() -> Result<()> {
        let (mut wallet, events) = connected("0xabc");
        wallet.connect().await?;
        assert_eq!(events.receiver_count(), 1);
        wallet.disconnect();
        assert_eq!(events.receiver_count(), 0);
        assert_eq!(wallet.handle(WalletEvent::ChainChanged("0x1".into())), Reaction::Ignored);
        Ok(())
    }

    #[tokio::test]
    #[traced_test]
    async fn rpc_wallet_connects_through_node() -> Result<()> {
        let url = spawn_node(FakeNode::default()).await;
        let mut wallet = WalletConnector::new(RpcWallet::detect(&settings_for(&url)).await?);
        assert_eq!(wallet.connect().await?, NODE_ACCOUNT);
        Ok(())
    }

    #[tokio::test]
    #[traced_test]
    async fn rpc_wallet_falls_back_to_managed_accounts() -> Result<()> {
        let node = FakeNode {
            legacy_accounts: true,
            ..Default::default()
        };
        let url = spawn_node(node.clone()).await;
        let wallet = RpcWallet::detect(&settings_for(&url)).await?;
        assert_eq!(wallet.request_accounts().await.unwrap(), vec![NODE_ACCOUNT.to_string()]);
        let methods = node.methods.lock().unwrap().clone();
        assert!(methods.ends_with(&["eth_requestAccounts".to_string(), "eth_accounts".to_string()]));
        Ok(())
    }

    #[tokio::test]
    #[traced_test]
    async fn unreachable_node_is_absent_provider() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let mut wallet = WalletConnector::new(RpcWallet::detect(&settings_for(&format!("http://{}", addr))).await.unwrap());
        assert!(matches!(wallet.connect().await, Err(RelayError::ExtensionAbsent(_))));
    }

    #[tokio::test]
    #[traced_test]
    async fn watcher_reports_chain_switch() -> Result<()> {
        let node = FakeNode::default();
        let url = spawn_node(node.clone()).await;
        let mut wallet = WalletConnector::new(RpcWallet::detect(&settings_for(&url)).await?);
        wallet.connect().await?;
        let watcher = wallet.provider.watch();

        tokio::time::sleep(Duration::from_millis(50)).await;
        *node.chain.lock().unwrap() = Some("0x1".into());
        let reaction = tokio::time::timeout(Duration::from_secs(2), wallet.next_reaction()).await;
        watcher.abort();
        assert_eq!(reaction.ok().flatten(), Some(Reaction::Reload("0x1".into())));
        Ok(())
    }
}
