use std::sync::Arc;

use axum::{
    Extension, Json,
    extract::{Path, rejection::JsonRejection},
};
use serde_json::{Value, json};

use crate::{
    pkg::internal::{
        adaptors::marketplace::{
            mutators::MarketplaceMutator,
            selectors::MarketplaceSelector,
            shaping::{ApplyJobInput, PostJobInput, parse_integer},
            spec::OperationReceipt,
        },
        contract::ContractClient,
    },
    prelude::Result,
};

pub async fn post(
    Extension(contract): Extension<Arc<dyn ContractClient>>,
    payload: core::result::Result<Json<PostJobInput>, JsonRejection>,
) -> Result<Json<OperationReceipt>> {
    let Json(input) = payload?;
    let job = input.shape()?;
    let receipt = MarketplaceMutator::new(&*contract).post_job(job).await?;
    Ok(Json(receipt))
}

pub async fn apply(
    Extension(contract): Extension<Arc<dyn ContractClient>>,
    payload: core::result::Result<Json<ApplyJobInput>, JsonRejection>,
) -> Result<Json<OperationReceipt>> {
    let Json(input) = payload?;
    let application = input.shape()?;
    let receipt = MarketplaceMutator::new(&*contract)
        .apply(application)
        .await?;
    Ok(Json(receipt))
}

pub async fn applications(
    Extension(contract): Extension<Arc<dyn ContractClient>>,
    Path(job_id): Path<String>,
) -> Result<Json<Value>> {
    let job_id = parse_integer("jobId", &job_id)?;
    let applications = MarketplaceSelector::new(&*contract)
        .job_applications(job_id)
        .await?;
    tracing::debug!("job {} has {} applications", job_id, applications.len());
    Ok(Json(json!({ "applications": applications })))
}

pub async fn mine(Extension(contract): Extension<Arc<dyn ContractClient>>) -> Result<Json<Value>> {
    let job_ids = MarketplaceSelector::new(&*contract).my_applications().await?;
    Ok(Json(json!({ "jobIds": job_ids })))
}
