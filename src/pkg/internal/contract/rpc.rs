//! JSON-RPC client for the ledger node.
//!
//! Methods used:
//! - eth_accounts / eth_requestAccounts / eth_chainId
//! - eth_sendTransaction + eth_getTransactionReceipt
//! - eth_call

use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Duration;

use alloy_primitives::{Address, B256, Bytes, hex};
use alloy_sol_types::{Revert, SolError};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Value, json};

use super::{ContractClient, Query, QueryOutput, Receipt, Transaction, abi};
use crate::conf::Settings;
use crate::prelude::{RelayError, Result};

/// Error object of a JSON-RPC response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RpcFault {
    pub code: i64,
    pub message: String,
    #[serde(default)]
    pub data: Option<Value>,
}

impl RpcFault {
    /// Decoded `Error(string)` payload, if the node attached revert data.
    pub fn revert_reason(&self) -> Option<String> {
        let data = self.data.as_ref()?;
        let raw = data
            .as_str()
            .or_else(|| data.get("data").and_then(Value::as_str))?;
        let bytes = hex::decode(raw).ok()?;
        Revert::abi_decode(&bytes).ok().map(|revert| revert.reason)
    }
}

impl From<RpcFault> for RelayError {
    fn from(fault: RpcFault) -> Self {
        match fault.code {
            -32600 | -32602 => RelayError::InvalidInput(fault.message),
            _ => match fault.revert_reason() {
                Some(reason) if !fault.message.contains(&reason) => {
                    RelayError::ContractRejected(format!("{}: {}", fault.message, reason))
                }
                _ => RelayError::ContractRejected(fault.message),
            },
        }
    }
}

#[derive(Deserialize)]
struct RpcResponse {
    #[serde(default)]
    result: Option<Value>,
    #[serde(default)]
    error: Option<RpcFault>,
}

/// Low-level JSON-RPC transport shared by the contract client, the deploy
/// command and the wallet provider.
pub struct LedgerRpc {
    endpoint: String,
    client: reqwest::Client,
    timeout: Duration,
    retries: u32,
    poll_interval: Duration,
    receipt_timeout: Duration,
    ids: AtomicU64,
}

impl LedgerRpc {
    pub fn new(settings: &Settings) -> Result<Self> {
        Ok(Self {
            endpoint: settings.provider_url.clone(),
            client: reqwest::Client::builder()
                .timeout(settings.rpc_timeout())
                .build()?,
            timeout: settings.rpc_timeout(),
            retries: settings.rpc_retries,
            poll_interval: settings.receipt_poll(),
            receipt_timeout: settings.receipt_timeout(),
            ids: AtomicU64::new(1),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    /// One JSON-RPC round trip. The outer error is a transport failure, the
    /// inner one a fault reported by the node.
    ///
    /// Only connect failures are retried: the request never left this process.
    pub async fn call_raw(
        &self,
        method: &str,
        params: Value,
    ) -> Result<core::result::Result<Value, RpcFault>> {
        let body = json!({
            "jsonrpc": "2.0",
            "id": self.ids.fetch_add(1, Ordering::Relaxed),
            "method": method,
            "params": params,
        });

        let mut attempt = 0;
        let resp = loop {
            match self
                .client
                .post(&self.endpoint)
                .json(&body)
                .timeout(self.timeout)
                .send()
                .await
            {
                Ok(resp) => break resp,
                Err(e) if e.is_connect() && attempt < self.retries => {
                    attempt += 1;
                    tracing::warn!("{} failed to connect (attempt {}): {}", method, attempt, e);
                    tokio::time::sleep(self.poll_interval).await;
                }
                Err(e) => return Err(e.into()),
            }
        };

        if !resp.status().is_success() {
            let status = resp.status();
            let text = resp.text().await.unwrap_or_default();
            return Err(RelayError::Connectivity(format!(
                "ledger node returned status {}: {}",
                status, text
            )));
        }

        let body: RpcResponse = resp.json().await?;
        match body.error {
            Some(fault) => Ok(Err(fault)),
            None => Ok(Ok(body.result.unwrap_or(Value::Null))),
        }
    }

    pub async fn request<T: DeserializeOwned>(&self, method: &str, params: Value) -> Result<T> {
        let value = self.call_raw(method, params).await??;
        Ok(serde_json::from_value(value)?)
    }

    pub async fn accounts(&self) -> Result<Vec<Address>> {
        self.request("eth_accounts", json!([])).await
    }

    pub async fn send_transaction(&self, from: Address, to: Option<Address>, data: Bytes) -> Result<B256> {
        let mut tx = json!({ "from": from, "data": data });
        if let Some(to) = to {
            tx["to"] = json!(to);
        }
        self.request("eth_sendTransaction", json!([tx])).await
    }

    /// The configured account, or else the first one the node manages.
    pub async fn default_account(&self, settings: &Settings) -> Result<Address> {
        match &settings.default_account {
            Some(account) => parse_address("default_account", account),
            None => self.accounts().await?.into_iter().next().ok_or_else(|| {
                RelayError::Unready(format!("ledger node at {} exposes no accounts", self.endpoint))
            }),
        }
    }

    /// Poll for the receipt until it appears or the receipt timeout elapses.
    ///
    /// The transaction is already broadcast, so every failure here is a
    /// `Timeout`: its outcome is unknown and it must not be resubmitted.
    pub async fn wait_for_receipt(&self, tx_hash: B256) -> Result<Receipt> {
        let poll = async {
            loop {
                let receipt: Option<Receipt> = self
                    .request("eth_getTransactionReceipt", json!([tx_hash]))
                    .await?;
                if let Some(receipt) = receipt {
                    return Ok::<Receipt, RelayError>(receipt);
                }
                tokio::time::sleep(self.poll_interval).await;
            }
        };
        match tokio::time::timeout(self.receipt_timeout, poll).await {
            Ok(Ok(receipt)) => Ok(receipt),
            Ok(Err(e)) => Err(RelayError::Timeout(format!(
                "transaction {} was sent but its receipt could not be fetched ({}); it may still be included",
                tx_hash, e
            ))),
            Err(_) => Err(RelayError::Timeout(format!(
                "transaction {} not confirmed within {}s; it may still be included",
                tx_hash,
                self.receipt_timeout.as_secs()
            ))),
        }
    }
}

pub struct RpcContractClient {
    rpc: LedgerRpc,
    contract: Address,
    sender: Address,
}

impl RpcContractClient {
    /// Resolve the sending account and bind the contract address.
    pub async fn connect(settings: &Settings) -> Result<Self> {
        let contract = parse_address("contract_address", &settings.contract_address)?;
        let rpc = LedgerRpc::new(settings)?;
        let sender = rpc.default_account(settings).await?;
        tracing::info!("Default account: {}", sender);
        Ok(Self {
            rpc,
            contract,
            sender,
        })
    }
}

pub fn parse_address(field: &str, raw: &str) -> Result<Address> {
    raw.trim()
        .parse::<Address>()
        .map_err(|e| RelayError::Internal(format!("{} {:?} is not an address: {}", field, raw, e)))
}

#[async_trait::async_trait]
impl ContractClient for RpcContractClient {
    fn sender(&self) -> Address {
        self.sender
    }

    async fn transact(&self, tx: Transaction) -> Result<Receipt> {
        let data = abi::encode_transaction(&tx);
        let tx_hash = self
            .rpc
            .send_transaction(self.sender, Some(self.contract), data)
            .await?;
        tracing::info!("{} submitted as {}", tx.method(), tx_hash);
        let receipt = self.rpc.wait_for_receipt(tx_hash).await?;
        if !receipt.succeeded() {
            return Err(RelayError::ContractRejected(format!(
                "transaction {} reverted",
                tx_hash
            )));
        }
        tracing::debug!("{} included in block {:?}", tx_hash, receipt.block_number);
        Ok(receipt)
    }

    async fn query(&self, query: Query) -> Result<QueryOutput> {
        let call = json!({
            "from": self.sender,
            "to": self.contract,
            "data": abi::encode_query(&query),
        });
        let out: Bytes = self.rpc.request("eth_call", json!([call, "latest"])).await?;
        tracing::debug!("{} returned {} bytes", query.method(), out.len());
        abi::decode_query(&query, &out)
    }
}
