use chrono::Utc;
use serde::Deserialize;
use soudan_domain::Expert;
use tracing::error;

use crate::{repos::IntegrationProvider, SoudanContext};

// https://developers.google.com/identity/protocols/oauth2/web-server#httprest_3

const TOKEN_REFETCH_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
const CODE_TOKEN_EXCHANGE_ENDPOINT: &str = "https://oauth2.googleapis.com/token";
const REQUIRED_OAUTH_SCOPE: &str = "https://www.googleapis.com/auth/calendar";

struct RefreshTokenRequest {
    client_id: String,
    client_secret: String,
    refresh_token: String,
}

#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct RefreshTokenResponse {
    access_token: String,
    scope: String,
    token_type: String,
    // Access token expiry specified in seconds
    expires_in: i64,
}

/// Response of the authorization-code exchange when an expert first
/// connects their calendar
#[derive(Debug, Deserialize)]
#[allow(dead_code)]
pub struct CodeTokenResponse {
    pub access_token: String,
    pub refresh_token: String,
    pub scope: String,
    pub token_type: String,
    pub expires_in: i64,
}

pub struct CodeTokenRequest {
    pub client_id: String,
    pub client_secret: String,
    pub redirect_uri: String,
    pub code: String,
}

async fn refresh_access_token(req: RefreshTokenRequest) -> anyhow::Result<RefreshTokenResponse> {
    let params = [
        ("client_id", req.client_id.as_str()),
        ("client_secret", req.client_secret.as_str()),
        ("refresh_token", req.refresh_token.as_str()),
        ("grant_type", "refresh_token"),
    ];
    let client = reqwest::Client::new();
    let res = client
        .post(TOKEN_REFETCH_ENDPOINT)
        .form(&params)
        .send()
        .await
        .map_err(|e| {
            error!(
                "[Network Error] Google OAuth refresh token failed with error: {:?}",
                e
            );

            e
        })?;

    res.json::<RefreshTokenResponse>().await.map_err(|e| {
        error!(
            "[Unexpected Response] Google OAuth refresh token failed with error: {:?}",
            e
        );

        anyhow::Error::new(e)
    })
}

pub async fn exchange_code_token(req: CodeTokenRequest) -> anyhow::Result<CodeTokenResponse> {
    let params = [
        ("client_id", req.client_id.as_str()),
        ("client_secret", req.client_secret.as_str()),
        ("redirect_uri", req.redirect_uri.as_str()),
        ("code", req.code.as_str()),
        ("grant_type", "authorization_code"),
    ];

    let client = reqwest::Client::new();

    let res = client
        .post(CODE_TOKEN_EXCHANGE_ENDPOINT)
        .form(&params)
        .send()
        .await
        .map_err(|e| {
            error!(
                "[Network Error] Google OAuth code token exchange failed with error: {:?}",
                e
            );
            anyhow::Error::new(e)
        })?;

    let res = res.json::<CodeTokenResponse>().await.map_err(|e| {
        error!(
            "[Unexpected Response] Google OAuth code token exchange failed with error: {:?}",
            e
        );
        anyhow::Error::new(e)
    })?;

    let scopes = res
        .scope
        .split(' ')
        .map(|scope| scope.to_lowercase())
        .collect::<Vec<_>>();
    if !scopes.contains(&REQUIRED_OAUTH_SCOPE.to_string()) {
        error!(
            "[Missing scopes] Google OAuth code token exchange failed. Missing scope: {:?}, got: {:?}",
            REQUIRED_OAUTH_SCOPE, scopes
        );
        anyhow::bail!("Calendar scope was not granted");
    }

    Ok(res)
}

/// A valid access token for the expert's calendar connection, refreshing it
/// through the stored refresh token when needed. None when the expert never
/// connected a calendar or the refresh was rejected.
pub async fn get_access_token(expert: &Expert, ctx: &SoudanContext) -> Option<String> {
    let mut integration = ctx
        .repos
        .expert_integrations
        .find(&expert.id, IntegrationProvider::Google)
        .await
        .ok()??;

    let now = Utc::now().timestamp_millis();
    let one_minute_in_millis = 1000 * 60;
    if now + one_minute_in_millis <= integration.access_token_expires_ts {
        // Current access token is still valid for at least one minute
        return Some(integration.access_token);
    }
    // Access token has expired or will expire soon, renew it

    let google_config = soudan_utils::config::APP_CONFIG.google.as_ref()?;

    let refresh_token_req = RefreshTokenRequest {
        client_id: google_config.client_id.clone(),
        client_secret: google_config.client_secret.clone(),
        refresh_token: integration.refresh_token.clone(),
    };
    let data = refresh_access_token(refresh_token_req).await;
    match data {
        Ok(tokens) => {
            integration.access_token = tokens.access_token;
            let now = Utc::now().timestamp_millis();
            let expires_in_millis = tokens.expires_in * 1000;
            integration.access_token_expires_ts = now + expires_in_millis;
            let access_token = integration.access_token.clone();

            if let Err(e) = ctx.repos.expert_integrations.save(&integration).await {
                error!(
                    "Unable to save updated google credentials for expert: {}. Error: {:?}",
                    expert.id, e
                );
            }

            Some(access_token)
        }
        Err(e) => {
            error!(
                "Unable to refresh google oauth access token for expert: {}. Error: {:?}",
                expert.id, e
            );
            None
        }
    }
}
