use std::sync::Arc;

use axum::{Extension, Json, extract::rejection::JsonRejection};

use crate::{
    pkg::internal::{
        adaptors::marketplace::{
            mutators::MarketplaceMutator, shaping::EmployerInput, spec::OperationReceipt,
        },
        contract::ContractClient,
    },
    prelude::Result,
};

pub async fn register(
    Extension(contract): Extension<Arc<dyn ContractClient>>,
    payload: core::result::Result<Json<EmployerInput>, JsonRejection>,
) -> Result<Json<OperationReceipt>> {
    let Json(input) = payload?;
    let profile = input.shape()?;
    let receipt = MarketplaceMutator::new(&*contract)
        .register_employer(profile)
        .await?;
    Ok(Json(receipt))
}

pub async fn update(
    Extension(contract): Extension<Arc<dyn ContractClient>>,
    payload: core::result::Result<Json<EmployerInput>, JsonRejection>,
) -> Result<Json<OperationReceipt>> {
    let Json(input) = payload?;
    let profile = input.shape()?;
    let receipt = MarketplaceMutator::new(&*contract)
        .update_employer(profile)
        .await?;
    Ok(Json(receipt))
}
