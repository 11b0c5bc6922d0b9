//! Client side of the relay: the forms a user fills in, the wallet session
//! they connect first, and the backend their submissions go through.

use std::sync::Arc;
use std::time::Duration;

use reqwest::Method;
use serde::{Deserialize, de::DeserializeOwned};
use serde_json::Value;

use crate::{
    conf::{ClientBackend, Settings},
    pkg::internal::{
        adaptors::marketplace::{
            mutators::MarketplaceMutator,
            selectors::MarketplaceSelector,
            shaping::{ApplyJobInput, EmployerInput, JobSeekerInput, PostJobInput, parse_integer},
            spec::{ApplicationRecord, OperationReceipt},
        },
        contract::{ContractClient, memory::MemoryContract},
    },
    prelude::{RelayError, Result},
};

pub mod forms;
pub mod wallet;

/// One marketplace action as submitted by a form.
#[derive(Debug, Clone)]
pub enum Operation {
    RegisterEmployer(EmployerInput),
    RegisterJobSeeker(JobSeekerInput),
    PostJob(PostJobInput),
    ApplyJob(ApplyJobInput),
    JobApplications { job_id: String },
    MyApplications,
    UpdateJobSeeker(JobSeekerInput),
    UpdateEmployer(EmployerInput),
}

#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    Receipt(OperationReceipt),
    Applications(Vec<ApplicationRecord>),
    JobIds(Vec<u64>),
}

#[async_trait::async_trait]
pub trait MarketplaceBackend: Send + Sync {
    async fn execute(&self, op: Operation) -> Result<Outcome>;
}

pub fn backend_from(settings: &Settings) -> Result<Arc<dyn MarketplaceBackend>> {
    Ok(match settings.client_backend {
        ClientBackend::Relay => Arc::new(RelayBackend::new(&settings.relay_url, settings.relay_timeout())?),
        ClientBackend::Local => {
            tracing::warn!("submissions stay in this process, nothing reaches a ledger");
            Arc::new(LocalBackend::new(Arc::new(MemoryContract::default())))
        }
    })
}

/// Sends operations to a running relay over HTTP.
pub struct RelayBackend {
    base_url: String,
    client: reqwest::Client,
}

#[derive(Deserialize)]
struct ErrorBody {
    error: String,
}

#[derive(Deserialize)]
struct ApplicationsBody {
    applications: Vec<ApplicationRecord>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct JobIdsBody {
    job_ids: Vec<u64>,
}

impl RelayBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self> {
        Ok(Self {
            base_url: base_url.trim_end_matches('/').to_string(),
            client: reqwest::Client::builder().timeout(timeout).build()?,
        })
    }

    async fn send<T: DeserializeOwned>(&self, method: Method, path: &str, body: Option<Value>) -> Result<T> {
        let url = format!("{}{}", self.base_url, path);
        let mut req = self.client.request(method, &url);
        if let Some(body) = body {
            req = req.json(&body);
        }
        let resp = req.send().await.map_err(|e| {
            if e.is_connect() {
                RelayError::Connectivity(format!("relay unreachable at {}: {}", self.base_url, e))
            } else if e.is_timeout() {
                RelayError::Timeout(format!("relay did not answer in time, the request may still complete: {}", e))
            } else {
                RelayError::from(e)
            }
        })?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            let message = serde_json::from_str::<ErrorBody>(&text)
                .map(|b| b.error)
                .unwrap_or_else(|_| format!("relay returned status {}: {}", status, text));
            return Err(RelayError::from_status(status, message));
        }
        Ok(resp.json().await?)
    }
}

#[async_trait::async_trait]
impl MarketplaceBackend for RelayBackend {
    async fn execute(&self, op: Operation) -> Result<Outcome> {
        let receipt = match op {
            Operation::RegisterEmployer(input) => {
                self.send(Method::POST, "/register-employer", Some(serde_json::to_value(input)?))
                    .await?
            }
            Operation::RegisterJobSeeker(input) => {
                self.send(Method::POST, "/register-job-seeker", Some(serde_json::to_value(input)?))
                    .await?
            }
            Operation::PostJob(input) => {
                self.send(Method::POST, "/post-job", Some(serde_json::to_value(input)?))
                    .await?
            }
            Operation::ApplyJob(input) => {
                self.send(Method::POST, "/apply-job", Some(serde_json::to_value(input)?))
                    .await?
            }
            Operation::UpdateJobSeeker(input) => {
                self.send(Method::PUT, "/update-job-seeker", Some(serde_json::to_value(input)?))
                    .await?
            }
            Operation::UpdateEmployer(input) => {
                self.send(Method::PUT, "/update-employer", Some(serde_json::to_value(input)?))
                    .await?
            }
            Operation::JobApplications { job_id } => {
                let job_id = parse_integer("jobId", &job_id)?;
                let body: ApplicationsBody = self
                    .send(Method::GET, &format!("/job-applications/{}", job_id), None)
                    .await?;
                return Ok(Outcome::Applications(body.applications));
            }
            Operation::MyApplications => {
                let body: JobIdsBody = self.send(Method::GET, "/my-applications", None).await?;
                return Ok(Outcome::JobIds(body.job_ids));
            }
        };
        Ok(Outcome::Receipt(receipt))
    }
}

/// Runs operations in-process against a contract client, with the same
/// shaping the relay applies.
pub struct LocalBackend {
    contract: Arc<dyn ContractClient>,
}

impl LocalBackend {
    pub fn new(contract: Arc<dyn ContractClient>) -> Self {
        Self { contract }
    }
}

#[async_trait::async_trait]
impl MarketplaceBackend for LocalBackend {
    async fn execute(&self, op: Operation) -> Result<Outcome> {
        let mutator = MarketplaceMutator::new(&*self.contract);
        let selector = MarketplaceSelector::new(&*self.contract);
        let receipt = match op {
            Operation::RegisterEmployer(input) => mutator.register_employer(input.shape()?).await?,
            Operation::RegisterJobSeeker(input) => mutator.register_job_seeker(input.shape()?).await?,
            Operation::PostJob(input) => mutator.post_job(input.shape()?).await?,
            Operation::ApplyJob(input) => mutator.apply(input.shape()?).await?,
            Operation::UpdateJobSeeker(input) => mutator.update_job_seeker(input.shape()?).await?,
            Operation::UpdateEmployer(input) => mutator.update_employer(input.shape()?).await?,
            Operation::JobApplications { job_id } => {
                let job_id = parse_integer("jobId", &job_id)?;
                return Ok(Outcome::Applications(selector.job_applications(job_id).await?));
            }
            Operation::MyApplications => {
                return Ok(Outcome::JobIds(selector.my_applications().await?));
            }
        };
        Ok(Outcome::Receipt(receipt))
    }
}

#[cfg(test)]
mod tests {
    use std::sync::Arc;
    use std::time::Duration;

    use tracing_test::traced_test;

    use super::*;
    use crate::pkg::internal::adaptors::marketplace::shaping::ListField;
    use crate::pkg::server::{router::build_routes, state::AppState};

    async fn spawn_relay(contract: Arc<MemoryContract>) -> String {
        let settings = Arc::new(Settings::defaults().unwrap());
        let app = build_routes(AppState::ready(settings, contract));
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        tokio::spawn(async move {
            let _ = axum::serve(listener, app).await;
        });
        format!("http://{}", addr)
    }

    fn seeker() -> JobSeekerInput {
        JobSeekerInput {
            name: "Ada".into(),
            contact_info: "ada@example.com".into(),
            resume_hash: "QmResume".into(),
            skills: ListField::from("rust, go"),
        }
    }

    #[tokio::test]
    #[traced_test]
    async fn relay_backend_round_trips_through_http() -> Result<()> {
        let contract = Arc::new(MemoryContract::default());
        let url = spawn_relay(contract.clone()).await;
        let backend = RelayBackend::new(&url, Duration::from_secs(5)).unwrap();

        let out = backend.execute(Operation::RegisterJobSeeker(seeker())).await?;
        let Outcome::Receipt(receipt) = out else {
            panic!("expected a receipt");
        };
        assert_eq!(receipt.message, "Job seeker registered");
        assert_eq!(contract.transactions().await.len(), 1);

        let out = backend.execute(Operation::MyApplications).await?;
        assert_eq!(out, Outcome::JobIds(vec![]));
        Ok(())
    }

    #[tokio::test]
    #[traced_test]
    async fn relay_backend_restores_error_kind() {
        let url = spawn_relay(Arc::new(MemoryContract::default())).await;
        let backend = RelayBackend::new(&url, Duration::from_secs(5)).unwrap();

        let mut input = seeker();
        input.name = String::new();
        let err = backend.execute(Operation::RegisterJobSeeker(input)).await.unwrap_err();
        assert!(matches!(err, RelayError::InvalidInput(_)));

        let err = backend
            .execute(Operation::JobApplications { job_id: "8".into() })
            .await
            .unwrap_err();
        assert_eq!(err, RelayError::ContractRejected("execution reverted: Job does not exist".into()));
    }

    #[tokio::test]
    #[traced_test]
    async fn relay_backend_unreachable_is_connectivity() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        drop(listener);
        let backend = RelayBackend::new(&format!("http://{}", addr), Duration::from_secs(5)).unwrap();
        let err = backend.execute(Operation::MyApplications).await.unwrap_err();
        assert!(err.is_retryable());
    }

    #[tokio::test]
    #[traced_test]
    async fn relay_backend_from_settings_builds() {
        let settings = Settings::defaults().unwrap();
        let backend = backend_from(&settings).unwrap();
        let err = backend
            .execute(Operation::JobApplications { job_id: "x".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::InvalidInput(_)));
    }

    #[tokio::test]
    #[traced_test]
    async fn relay_backend_timeout_after_send_is_not_retryable() {
        let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let silent = axum::Router::new().route(
            "/my-applications",
            axum::routing::get(|| async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                "late"
            }),
        );
        tokio::spawn(async move {
            let _ = axum::serve(listener, silent).await;
        });
        let backend = RelayBackend::new(&format!("http://{}", addr), Duration::from_millis(200)).unwrap();
        let err = backend.execute(Operation::MyApplications).await.unwrap_err();
        assert!(matches!(err, RelayError::Timeout(_)));
        assert!(!err.is_retryable());
    }

    #[tokio::test]
    #[traced_test]
    async fn local_backend_shapes_like_the_relay() -> Result<()> {
        let contract = Arc::new(MemoryContract::default());
        let backend = LocalBackend::new(contract.clone());
        backend.execute(Operation::RegisterJobSeeker(seeker())).await?;
        let err = backend
            .execute(Operation::JobApplications { job_id: "x".into() })
            .await
            .unwrap_err();
        assert!(matches!(err, RelayError::InvalidInput(_)));
        assert!(contract.queries().await.is_empty());
        Ok(())
    }
}
