use std::sync::Arc;

use axum::{Extension, Json, extract::rejection::JsonRejection};

use crate::{
    pkg::internal::{
        adaptors::marketplace::{
            mutators::MarketplaceMutator, shaping::JobSeekerInput, spec::OperationReceipt,
        },
        contract::ContractClient,
    },
    prelude::Result,
};

pub async fn register(
    Extension(contract): Extension<Arc<dyn ContractClient>>,
    payload: core::result::Result<Json<JobSeekerInput>, JsonRejection>,
) -> Result<Json<OperationReceipt>> {
    let Json(input) = payload?;
    let profile = input.shape()?;
    tracing::debug!("registering job seeker with {} skills", profile.skills.len());
    let receipt = MarketplaceMutator::new(&*contract)
        .register_job_seeker(profile)
        .await?;
    Ok(Json(receipt))
}

pub async fn update(
    Extension(contract): Extension<Arc<dyn ContractClient>>,
    payload: core::result::Result<Json<JobSeekerInput>, JsonRejection>,
) -> Result<Json<OperationReceipt>> {
    let Json(input) = payload?;
    let profile = input.shape()?;
    let receipt = MarketplaceMutator::new(&*contract)
        .update_job_seeker(profile)
        .await?;
    Ok(Json(receipt))
}
