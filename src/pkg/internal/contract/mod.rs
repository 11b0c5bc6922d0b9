//! Binding between marketplace operations and the on-chain contract.
//!
//! - `transact` submits a state-changing call and waits for its receipt
//! - `query` evaluates a read-only call against current state

use alloy_primitives::{Address, B256, U64, U256};
use serde::{Deserialize, Serialize};

use crate::pkg::internal::adaptors::marketplace::spec::{
    ApplicationRecord, EmployerProfile, JobApplication, JobPosting, JobSeekerProfile,
};
use crate::prelude::Result;

pub mod abi;
pub mod memory;
pub mod rpc;

/// State-changing contract calls, one per marketplace operation.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Transaction {
    RegisterEmployer(EmployerProfile),
    RegisterJobSeeker(JobSeekerProfile),
    PostJob(JobPosting),
    ApplyForJob(JobApplication),
    UpdateJobSeekerProfile(JobSeekerProfile),
    UpdateEmployerProfile(EmployerProfile),
}

impl Transaction {
    pub fn method(&self) -> &'static str {
        match self {
            Transaction::RegisterEmployer(_) => "registerEmployer",
            Transaction::RegisterJobSeeker(_) => "registerJobSeeker",
            Transaction::PostJob(_) => "postJob",
            Transaction::ApplyForJob(_) => "applyForJob",
            Transaction::UpdateJobSeekerProfile(_) => "updateJobSeekerProfile",
            Transaction::UpdateEmployerProfile(_) => "updateEmployerProfile",
        }
    }
}

/// Read-only contract calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Query {
    JobApplications { job_id: u64 },
    MyApplications,
}

impl Query {
    pub fn method(&self) -> &'static str {
        match self {
            Query::JobApplications { .. } => "getJobApplications",
            Query::MyApplications => "getMyApplications",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QueryOutput {
    Applications(Vec<ApplicationRecord>),
    JobIds(Vec<u64>),
}

/// Transaction receipt as reported by `eth_getTransactionReceipt`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Receipt {
    pub transaction_hash: B256,
    #[serde(default)]
    pub block_hash: Option<B256>,
    #[serde(default)]
    pub block_number: Option<U64>,
    #[serde(default)]
    pub from: Option<Address>,
    #[serde(default)]
    pub to: Option<Address>,
    #[serde(default)]
    pub contract_address: Option<Address>,
    #[serde(default)]
    pub gas_used: Option<U256>,
    #[serde(default)]
    pub status: Option<U64>,
    #[serde(default)]
    pub logs: Vec<serde_json::Value>,
}

impl Receipt {
    /// Pre-byzantium receipts carry no status; treat them as successful.
    pub fn succeeded(&self) -> bool {
        self.status.is_none_or(|s| s == U64::from(1))
    }
}

#[async_trait::async_trait]
pub trait ContractClient: Send + Sync {
    /// The account every transaction is sent from.
    fn sender(&self) -> Address;

    async fn transact(&self, tx: Transaction) -> Result<Receipt>;

    async fn query(&self, query: Query) -> Result<QueryOutput>;
}

#[cfg(test)]
mod tests {
    use alloy_primitives::U64;
    use serde_json::json;

    use super::Receipt;

    #[test]
    fn receipt_parses_node_quantities() {
        let r: Receipt = serde_json::from_value(json!({
            "transactionHash": "0x88df016429689c079f3b2f6ad39fa052532c56795b733da78a91ebe6a713944b",
            "blockNumber": "0x1b4",
            "status": "0x1",
            "logs": [],
            "unknownField": true
        }))
        .unwrap();
        assert_eq!(r.block_number, Some(U64::from(436)));
        assert!(r.succeeded());

        let failed = Receipt { status: Some(U64::ZERO), ..r };
        assert!(!failed.succeeded());
    }
}
