use std::path::Path;

use alloy_primitives::{Bytes, hex};
use serde_json::Value;

use crate::{
    conf::Settings,
    pkg::internal::contract::{Receipt, rpc::LedgerRpc},
    prelude::{RelayError, Result},
};

/// Contract creation code from a compiled artifact (`{"bytecode": "0x.."}`)
/// or a plain hex file.
pub fn read_bytecode(text: &str) -> Result<Bytes> {
    let raw = match serde_json::from_str::<Value>(text) {
        Ok(Value::Object(artifact)) => match artifact.get("bytecode") {
            Some(Value::String(code)) => code.clone(),
            Some(Value::Object(nested)) => nested
                .get("object")
                .and_then(Value::as_str)
                .unwrap_or_default()
                .to_string(),
            _ => {
                return Err(RelayError::InvalidInput(
                    "artifact has no bytecode field".into(),
                ));
            }
        },
        _ => text.trim().to_string(),
    };
    let code = hex::decode(raw.trim())
        .map_err(|e| RelayError::InvalidInput(format!("bytecode is not hex: {}", e)))?;
    if code.is_empty() {
        return Err(RelayError::InvalidInput(
            "bytecode is empty, was the contract compiled?".into(),
        ));
    }
    Ok(code.into())
}

pub async fn apply(settings: &Settings, artifact: &Path) -> Result<Receipt> {
    let code = read_bytecode(&std::fs::read_to_string(artifact)?)?;
    let rpc = LedgerRpc::new(settings)?;
    let deployer = rpc.default_account(settings).await?;
    tracing::info!("Deploying contracts with the account: {}", deployer);

    let tx_hash = rpc.send_transaction(deployer, None, code).await?;
    let receipt = rpc.wait_for_receipt(tx_hash).await?;
    if !receipt.succeeded() {
        return Err(RelayError::ContractRejected(format!(
            "deployment {} reverted",
            tx_hash
        )));
    }
    match receipt.contract_address {
        Some(address) => {
            tracing::info!("JobMarketplace deployed to: {}", address);
            println!("{}", address);
        }
        None => tracing::warn!("receipt for {} carries no contract address", tx_hash),
    }
    Ok(receipt)
}
