use axum::{
    extract::{Path, State},
    http::StatusCode,
};
use serde::Deserialize;
use soudan_domain::TransferId;
use soudan_infra::SoudanContext;
use tracing::info;

use crate::{
    error::ApiError,
    shared::usecase::{execute, UseCase},
};

#[derive(Debug, Deserialize)]
pub struct PathParams {
    pub transfer_id: TransferId,
}

pub async fn approve_transfer_controller(
    State(ctx): State<SoudanContext>,
    Path(params): Path<PathParams>,
) -> Result<StatusCode, ApiError> {
    let usecase = ApproveTransferUseCase {
        transfer_id: params.transfer_id,
    };

    execute(usecase, &ctx)
        .await
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(ApiError::from)
}

/// Manual approval: waives the aging floor for one transfer. The scheduled
/// disbursement instant still applies.
#[derive(Debug)]
pub(crate) struct ApproveTransferUseCase {
    pub transfer_id: TransferId,
}

#[derive(Debug)]
pub(crate) enum UseCaseError {
    NotFound,
    NotPending,
    InternalError,
}

impl From<UseCaseError> for ApiError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::NotFound => Self::NotFound("Transfer was not found".into()),
            UseCaseError::NotPending => {
                Self::Conflict("Only pending transfers can be approved".into())
            }
            UseCaseError::InternalError => Self::InternalError,
        }
    }
}

#[async_trait::async_trait]
impl UseCase for ApproveTransferUseCase {
    type Response = ();

    type Error = UseCaseError;

    const NAME: &'static str = "ApproveTransfer";

    async fn execute(&mut self, ctx: &SoudanContext) -> Result<Self::Response, Self::Error> {
        let approved = ctx
            .repos
            .transfers
            .approve(&self.transfer_id)
            .await
            .map_err(|_| UseCaseError::InternalError)?;

        if approved {
            info!(transfer_id = %self.transfer_id, "Transfer approved");
            return Ok(());
        }

        match ctx
            .repos
            .transfers
            .find(&self.transfer_id)
            .await
            .map_err(|_| UseCaseError::InternalError)?
        {
            Some(_) => Err(UseCaseError::NotPending),
            None => Err(UseCaseError::NotFound),
        }
    }
}
