use axum::{
    extract::{Path, State},
    http::StatusCode,
    Json,
};
use soudan_api_structs::{oauth_integration, remove_integration};
use soudan_domain::ExpertId;
use soudan_infra::{
    google_calendar::auth_provider::{exchange_code_token, CodeTokenRequest},
    ExpertIntegration,
    IntegrationProvider,
    SoudanContext,
};
use tracing::info;
use validator::Validate;

use crate::{
    error::ApiError,
    shared::usecase::{execute, UseCase},
};

pub async fn oauth_integration_controller(
    State(ctx): State<SoudanContext>,
    Path(params): Path<oauth_integration::PathParams>,
    Json(body): Json<oauth_integration::RequestBody>,
) -> Result<StatusCode, ApiError> {
    body.validate()
        .map_err(|e| ApiError::BadClientData(e.to_string()))?;

    let usecase = OAuthIntegrationUseCase {
        expert_id: params.expert_id,
        code: body.code,
    };

    execute(usecase, &ctx)
        .await
        .map(|_| StatusCode::NO_CONTENT)
        .map_err(ApiError::from)
}

pub async fn remove_integration_controller(
    State(ctx): State<SoudanContext>,
    Path(params): Path<remove_integration::PathParams>,
) -> Result<StatusCode, ApiError> {
    ctx.repos
        .experts
        .find(&params.expert_id)
        .await
        .map_err(|_| ApiError::InternalError)?
        .ok_or_else(|| ApiError::NotFound("Expert was not found".into()))?;

    ctx.repos
        .expert_integrations
        .delete(&params.expert_id, IntegrationProvider::Google)
        .await
        .map_err(|_| ApiError::InternalError)?;

    info!(expert_id = %params.expert_id, "Calendar integration removed");
    Ok(StatusCode::NO_CONTENT)
}

/// Finish the OAuth authorization-code flow for the expert's calendar:
/// exchange the consent code for tokens and store the refresh token.
#[derive(Debug)]
pub(crate) struct OAuthIntegrationUseCase {
    pub expert_id: ExpertId,
    pub code: String,
}

#[derive(Debug)]
pub(crate) enum UseCaseError {
    ExpertNotFound,
    CodeRejected,
    InternalError,
}

impl From<UseCaseError> for ApiError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::ExpertNotFound => Self::NotFound("Expert was not found".into()),
            UseCaseError::CodeRejected => {
                Self::BadClientData("The authorization code was rejected".into())
            }
            UseCaseError::InternalError => Self::InternalError,
        }
    }
}

#[async_trait::async_trait]
impl UseCase for OAuthIntegrationUseCase {
    type Response = ();

    type Error = UseCaseError;

    const NAME: &'static str = "OAuthIntegration";

    async fn execute(&mut self, ctx: &SoudanContext) -> Result<Self::Response, Self::Error> {
        let expert = ctx
            .repos
            .experts
            .find(&self.expert_id)
            .await
            .map_err(|_| UseCaseError::InternalError)?
            .ok_or(UseCaseError::ExpertNotFound)?;

        let google = soudan_utils::config::APP_CONFIG
            .google
            .as_ref()
            .ok_or(UseCaseError::InternalError)?;

        let tokens = exchange_code_token(CodeTokenRequest {
            client_id: google.client_id.clone(),
            client_secret: google.client_secret.clone(),
            redirect_uri: google.redirect_uri.clone(),
            code: std::mem::take(&mut self.code),
        })
        .await
        .map_err(|_| UseCaseError::CodeRejected)?;

        let now = ctx.sys.get_timestamp().timestamp_millis();
        let integration = ExpertIntegration {
            expert_id: expert.id.clone(),
            provider: IntegrationProvider::Google,
            access_token: tokens.access_token,
            refresh_token: tokens.refresh_token,
            access_token_expires_ts: now + tokens.expires_in * 1000,
        };

        let existing = ctx
            .repos
            .expert_integrations
            .find(&expert.id, IntegrationProvider::Google)
            .await
            .map_err(|_| UseCaseError::InternalError)?;

        let result = if existing.is_some() {
            ctx.repos.expert_integrations.save(&integration).await
        } else {
            ctx.repos.expert_integrations.insert(&integration).await
        };
        result.map_err(|_| UseCaseError::InternalError)?;

        info!(expert_id = %expert.id, "Calendar integration connected");
        Ok(())
    }
}
