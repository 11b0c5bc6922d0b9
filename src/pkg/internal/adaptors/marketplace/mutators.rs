use crate::pkg::internal::adaptors::marketplace::spec::{
    EmployerProfile, JobApplication, JobPosting, JobSeekerProfile, OperationReceipt,
};
use crate::pkg::internal::contract::{ContractClient, Transaction};
use crate::prelude::Result;

/// State-changing marketplace operations. Each one is exactly one
/// transaction; nothing is retried once submitted.
pub struct MarketplaceMutator<'a> {
    contract: &'a dyn ContractClient,
}

impl<'a> MarketplaceMutator<'a> {
    pub fn new(contract: &'a dyn ContractClient) -> Self {
        MarketplaceMutator { contract }
    }

    async fn submit(&self, tx: Transaction, message: &str) -> Result<OperationReceipt> {
        let method = tx.method();
        tracing::info!("relaying {} from {}", method, self.contract.sender());
        let receipt = self.contract.transact(tx).await?;
        tracing::info!("{} confirmed in {}", method, receipt.transaction_hash);
        Ok(OperationReceipt {
            message: message.to_string(),
            receipt,
        })
    }

    pub async fn register_employer(&self, profile: EmployerProfile) -> Result<OperationReceipt> {
        self.submit(Transaction::RegisterEmployer(profile), "Employer registered")
            .await
    }

    pub async fn register_job_seeker(&self, profile: JobSeekerProfile) -> Result<OperationReceipt> {
        self.submit(Transaction::RegisterJobSeeker(profile), "Job seeker registered")
            .await
    }

    pub async fn post_job(&self, job: JobPosting) -> Result<OperationReceipt> {
        self.submit(Transaction::PostJob(job), "Job posted!").await
    }

    pub async fn apply(&self, application: JobApplication) -> Result<OperationReceipt> {
        self.submit(Transaction::ApplyForJob(application), "Applied successfully")
            .await
    }

    pub async fn update_job_seeker(&self, profile: JobSeekerProfile) -> Result<OperationReceipt> {
        self.submit(
            Transaction::UpdateJobSeekerProfile(profile),
            "Job seeker profile updated",
        )
        .await
    }

    pub async fn update_employer(&self, profile: EmployerProfile) -> Result<OperationReceipt> {
        self.submit(
            Transaction::UpdateEmployerProfile(profile),
            "Employer profile updated",
        )
        .await
    }
}
