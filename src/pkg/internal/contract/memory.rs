use std::collections::{BTreeMap, HashMap};
use std::time::{SystemTime, UNIX_EPOCH};

use alloy_primitives::{Address, B256, U64, U256, keccak256};
use tokio::sync::RwLock;

use super::{ContractClient, Query, QueryOutput, Receipt, Transaction};
use crate::pkg::internal::adaptors::marketplace::spec::{
    ApplicationRecord, ApplicationStatus, EmployerProfile, JobPosting, JobSeekerProfile,
};
use crate::prelude::{RelayError, Result};

#[derive(Default)]
struct Ledger {
    employers: HashMap<Address, EmployerProfile>,
    seekers: HashMap<Address, JobSeekerProfile>,
    jobs: BTreeMap<u64, (Address, JobPosting)>,
    applications: BTreeMap<u64, Vec<ApplicationRecord>>,
    transactions: Vec<Transaction>,
    queries: Vec<Query>,
}

/// In-memory stand-in for the deployed contract. Applies the marketplace
/// rules on a single sender and records everything it is asked to do.
pub struct MemoryContract {
    sender: Address,
    ledger: RwLock<Ledger>,
}

impl Default for MemoryContract {
    fn default() -> Self {
        Self::new(Address::repeat_byte(0x42))
    }
}

impl MemoryContract {
    pub fn new(sender: Address) -> Self {
        Self {
            sender,
            ledger: RwLock::new(Ledger::default()),
        }
    }

    pub async fn transactions(&self) -> Vec<Transaction> {
        self.ledger.read().await.transactions.clone()
    }

    pub async fn queries(&self) -> Vec<Query> {
        self.ledger.read().await.queries.clone()
    }

    fn apply(&self, ledger: &mut Ledger, tx: &Transaction) -> Result<()> {
        let me = self.sender;
        match tx {
            Transaction::RegisterEmployer(profile) => {
                if ledger.employers.contains_key(&me) {
                    return Err(reject("Employer already registered"));
                }
                ledger.employers.insert(me, profile.clone());
            }
            Transaction::RegisterJobSeeker(profile) => {
                if ledger.seekers.contains_key(&me) {
                    return Err(reject("Job seeker already registered"));
                }
                ledger.seekers.insert(me, profile.clone());
            }
            Transaction::PostJob(job) => {
                if !ledger.employers.contains_key(&me) {
                    return Err(reject("Only registered employers can post jobs"));
                }
                let id = ledger.jobs.len() as u64 + 1;
                ledger.jobs.insert(id, (me, job.clone()));
            }
            Transaction::ApplyForJob(application) => {
                if !ledger.seekers.contains_key(&me) {
                    return Err(reject("Only registered job seekers can apply"));
                }
                if !ledger.jobs.contains_key(&application.job_id) {
                    return Err(reject("Job does not exist"));
                }
                let entries = ledger.applications.entry(application.job_id).or_default();
                if entries.iter().any(|a| a.job_seeker == me) {
                    return Err(reject("Already applied for this job"));
                }
                entries.push(ApplicationRecord {
                    job_seeker: me,
                    status: ApplicationStatus::Pending,
                    application_time: now(),
                });
            }
            Transaction::UpdateJobSeekerProfile(profile) => match ledger.seekers.get_mut(&me) {
                Some(existing) => *existing = profile.clone(),
                None => return Err(reject("Job seeker not registered")),
            },
            Transaction::UpdateEmployerProfile(profile) => match ledger.employers.get_mut(&me) {
                Some(existing) => *existing = profile.clone(),
                None => return Err(reject("Employer not registered")),
            },
        }
        Ok(())
    }
}

fn reject(reason: &str) -> RelayError {
    RelayError::ContractRejected(format!("execution reverted: {}", reason))
}

fn now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or_default()
}

#[async_trait::async_trait]
impl ContractClient for MemoryContract {
    fn sender(&self) -> Address {
        self.sender
    }

    async fn transact(&self, tx: Transaction) -> Result<Receipt> {
        let mut ledger = self.ledger.write().await;
        self.apply(&mut ledger, &tx)?;
        ledger.transactions.push(tx);
        let block = ledger.transactions.len() as u64;
        let tx_hash: B256 = keccak256(block.to_be_bytes());
        tracing::debug!("memory contract mined {} in block {}", tx_hash, block);
        Ok(Receipt {
            transaction_hash: tx_hash,
            block_hash: Some(keccak256(tx_hash)),
            block_number: Some(U64::from(block)),
            from: Some(self.sender),
            to: None,
            contract_address: None,
            gas_used: Some(U256::from(21_000)),
            status: Some(U64::from(1)),
            logs: vec![],
        })
    }

    async fn query(&self, query: Query) -> Result<QueryOutput> {
        let mut ledger = self.ledger.write().await;
        ledger.queries.push(query);
        match query {
            Query::JobApplications { job_id } => {
                if !ledger.jobs.contains_key(&job_id) {
                    return Err(reject("Job does not exist"));
                }
                let records = ledger.applications.get(&job_id).cloned().unwrap_or_default();
                Ok(QueryOutput::Applications(records))
            }
            Query::MyApplications => {
                let me = self.sender;
                let ids = ledger
                    .applications
                    .iter()
                    .filter(|(_, entries)| entries.iter().any(|a| a.job_seeker == me))
                    .map(|(id, _)| *id)
                    .collect();
                Ok(QueryOutput::JobIds(ids))
            }
        }
    }
}
