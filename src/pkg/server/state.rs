use std::sync::Arc;

use tokio::sync::watch;

use crate::{
    conf::{ContractBackend, Settings},
    pkg::internal::contract::{ContractClient, memory::MemoryContract, rpc::RpcContractClient},
    prelude::{RelayError, Result},
};

/// Contract client lifecycle: account resolution happens after the listener
/// is up, so relay routes are gated on `Ready`.
#[derive(Clone)]
pub enum Readiness {
    Uninitialized,
    Ready(Arc<dyn ContractClient>),
    Failed(String),
}

#[derive(Clone)]
pub struct AppState {
    pub settings: Arc<Settings>,
    readiness: watch::Receiver<Readiness>,
}

impl AppState {
    /// Start initializing the contract client in the background.
    pub fn new(settings: Arc<Settings>) -> AppState {
        let (state, tx) = AppState::pending(settings);
        tokio::spawn(initialize(state.settings.clone(), tx));
        state
    }

    /// Uninitialized state plus the only handle allowed to advance it.
    pub fn pending(settings: Arc<Settings>) -> (AppState, watch::Sender<Readiness>) {
        let (tx, rx) = watch::channel(Readiness::Uninitialized);
        let state = AppState {
            settings,
            readiness: rx,
        };
        (state, tx)
    }

    /// State whose contract client is already available.
    pub fn ready(settings: Arc<Settings>, contract: Arc<dyn ContractClient>) -> AppState {
        let (_tx, rx) = watch::channel(Readiness::Ready(contract));
        AppState {
            settings,
            readiness: rx,
        }
    }

    pub fn readiness(&self) -> Readiness {
        self.readiness.borrow().clone()
    }

    pub fn contract(&self) -> Result<Arc<dyn ContractClient>> {
        match self.readiness() {
            Readiness::Ready(contract) => Ok(contract),
            Readiness::Uninitialized => Err(RelayError::Unready(
                "relay is not ready: contract client is still initializing".into(),
            )),
            Readiness::Failed(reason) => Err(RelayError::Unready(format!(
                "relay is not ready: contract client failed to initialize: {}",
                reason
            ))),
        }
    }

    /// Wait until initialization settles either way.
    pub async fn settled(&self) -> Readiness {
        let mut rx = self.readiness.clone();
        match rx
            .wait_for(|r| !matches!(r, Readiness::Uninitialized))
            .await
        {
            Ok(r) => r.clone(),
            Err(_) => self.readiness(),
        }
    }
}

async fn initialize(settings: Arc<Settings>, tx: watch::Sender<Readiness>) {
    let outcome = match settings.contract_backend {
        ContractBackend::Memory => {
            tracing::warn!("using in-memory contract, nothing is sent to a ledger");
            Ok(Arc::new(MemoryContract::default()) as Arc<dyn ContractClient>)
        }
        ContractBackend::Rpc => connect_with_retry(&settings).await,
    };
    let state = match outcome {
        Ok(contract) => {
            tracing::info!("contract client ready, sending as {}", contract.sender());
            Readiness::Ready(contract)
        }
        Err(e) => {
            tracing::error!("contract client failed to initialize: {}", e);
            Readiness::Failed(e.to_string())
        }
    };
    let _ = tx.send(state);
}

async fn connect_with_retry(settings: &Settings) -> Result<Arc<dyn ContractClient>> {
    let attempts = settings.init_attempts.max(1);
    let mut attempt = 0;
    loop {
        attempt += 1;
        match RpcContractClient::connect(settings).await {
            Ok(client) => return Ok(Arc::new(client)),
            Err(e) if e.is_retryable() && attempt < attempts => {
                tracing::warn!(
                    "ledger node not reachable (attempt {}/{}): {}",
                    attempt,
                    attempts,
                    e
                );
                tokio::time::sleep(settings.receipt_poll()).await;
            }
            Err(e) => return Err(e),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use tracing_test::traced_test;

    use super::{AppState, Readiness};
    use crate::{
        conf::{ContractBackend, Settings},
        pkg::internal::contract::rpc::tests::{FakeNode, settings_for, spawn_node},
        prelude::RelayError,
    };

    #[tokio::test]
    #[traced_test]
    async fn memory_backend_becomes_ready() {
        let mut settings = Settings::defaults().unwrap();
        settings.contract_backend = ContractBackend::Memory;
        let state = AppState::new(Arc::new(settings));
        assert!(matches!(state.settled().await, Readiness::Ready(_)));
        assert!(state.contract().is_ok());
    }

    #[tokio::test]
    #[traced_test]
    async fn rpc_backend_resolves_account_then_ready() {
        let url = spawn_node(FakeNode { receipt_status: "0x1", ..Default::default() }).await;
        let state = AppState::new(Arc::new(settings_for(&url)));
        assert!(matches!(state.settled().await, Readiness::Ready(_)));
    }

    #[tokio::test]
    #[traced_test]
    async fn unresolvable_account_fails_and_stays_unready() {
        let url = spawn_node(FakeNode { no_accounts: true, ..Default::default() }).await;
        let state = AppState::new(Arc::new(settings_for(&url)));
        assert!(matches!(state.settled().await, Readiness::Failed(_)));
        assert!(matches!(state.contract(), Err(RelayError::Unready(m)) if m.contains("exposes no accounts")));
    }

    #[tokio::test]
    #[traced_test]
    async fn bad_contract_address_fails() {
        let mut settings = Settings::defaults().unwrap();
        settings.contract_address = "not-an-address".into();
        let state = AppState::new(Arc::new(settings));
        assert!(matches!(state.settled().await, Readiness::Failed(_)));
    }
}
