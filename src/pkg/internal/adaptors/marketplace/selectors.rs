use crate::pkg::internal::adaptors::marketplace::spec::ApplicationRecord;
use crate::pkg::internal::contract::{ContractClient, Query, QueryOutput};
use crate::prelude::{RelayError, Result};

/// Read-only marketplace lookups. These never submit a transaction.
pub struct MarketplaceSelector<'a> {
    contract: &'a dyn ContractClient,
}

impl<'a> MarketplaceSelector<'a> {
    pub fn new(contract: &'a dyn ContractClient) -> Self {
        MarketplaceSelector { contract }
    }

    pub async fn job_applications(&self, job_id: u64) -> Result<Vec<ApplicationRecord>> {
        match self.contract.query(Query::JobApplications { job_id }).await? {
            QueryOutput::Applications(records) => Ok(records),
            other => Err(unexpected("getJobApplications", &other)),
        }
    }

    pub async fn my_applications(&self) -> Result<Vec<u64>> {
        match self.contract.query(Query::MyApplications).await? {
            QueryOutput::JobIds(ids) => Ok(ids),
            other => Err(unexpected("getMyApplications", &other)),
        }
    }
}

fn unexpected(method: &str, output: &QueryOutput) -> RelayError {
    RelayError::Internal(format!("{} returned unexpected output {:?}", method, output))
}
