use std::collections::HashMap;

use chrono::{DateTime, Utc};
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use soudan_domain::{
    ExpertId,
    MeetingId,
    PaymentId,
    PaymentSessionId,
    PayoutAccountId,
    ProviderTransferId,
    ReservationId,
    TransferId,
};
use thiserror::Error;
use tracing::{error, info};

const API_BASE_URL: &str = "https://api.stripe.com/v1";

#[derive(Error, Debug)]
pub enum PaymentProviderError {
    #[error("Payment provider is not configured")]
    NotConfigured,
    #[error("Payment provider rate limited the request")]
    RateLimited,
    #[error("Payment provider API error ({status_code}): {message}")]
    Api { status_code: u16, message: String },
    #[error("Payment provider unreachable: {0}")]
    Network(#[from] reqwest::Error),
}

/// Which payment flows a checkout session offers the guest.
/// Voucher-style methods settle asynchronously, days later.
#[derive(Debug, Clone, Copy)]
pub struct PaymentMethods {
    pub card: bool,
    pub bank_debit: bool,
    pub voucher: bool,
}

impl PaymentMethods {
    fn method_types(&self) -> Vec<&'static str> {
        let mut types = Vec::new();
        if self.card {
            types.push("card");
        }
        if self.bank_debit {
            types.push("sepa_debit");
        }
        if self.voucher {
            types.push("multibanco");
        }
        types
    }
}

#[derive(Debug)]
pub struct CreateSessionRequest {
    pub reservation_id: ReservationId,
    pub amount_minor: i64,
    pub currency: String,
    pub product_name: String,
    pub methods: PaymentMethods,
}

#[derive(Debug)]
pub struct CheckoutSession {
    pub session_id: PaymentSessionId,
    pub redirect_url: String,
}

#[derive(Debug)]
pub struct CreateTransferRequest {
    pub transfer_id: TransferId,
    pub meeting_id: MeetingId,
    pub expert_id: ExpertId,
    pub destination: PayoutAccountId,
    pub amount_minor: i64,
    pub currency: String,
    pub source_transaction: PaymentId,
    pub session_start: DateTime<Utc>,
}

// --- Webhook wire format ---

/// The `data` field within a provider event. The embedded object's shape
/// varies by event type.
#[derive(Debug, Clone, Deserialize)]
pub struct StripeEventData {
    pub object: serde_json::Value,
}

/// Outer envelope of a provider webhook event
#[derive(Debug, Clone, Deserialize)]
pub struct StripeEvent {
    pub id: String,
    pub created: i64,
    #[serde(rename = "type")]
    pub event_type: String,
    pub data: StripeEventData,
}

/// `data.object` for `checkout.session.*` events
#[derive(Debug, Clone, Deserialize)]
pub struct StripeCheckoutSessionObject {
    pub id: String,
    pub amount_total: Option<i64>,
    pub currency: Option<String>,
    pub payment_intent: Option<String>,
    pub payment_status: Option<String>,
    pub client_reference_id: Option<String>,
    pub metadata: Option<HashMap<String, String>>,
}

#[derive(Debug, Deserialize)]
struct CheckoutSessionApiResponse {
    id: String,
    url: Option<String>,
}

#[derive(Debug, Deserialize)]
struct TransferApiResponse {
    id: String,
}

pub struct StripePaymentProvider {
    client: Client,
    secret_key: String,
    success_url: String,
    cancel_url: String,
}

impl StripePaymentProvider {
    pub fn from_config() -> Result<Self, PaymentProviderError> {
        let stripe = soudan_utils::config::APP_CONFIG
            .stripe
            .as_ref()
            .ok_or(PaymentProviderError::NotConfigured)?;
        Ok(Self {
            client: Client::new(),
            secret_key: stripe.secret_key.clone(),
            success_url: stripe.success_url.clone(),
            cancel_url: stripe.cancel_url.clone(),
        })
    }

    async fn post_form<T: for<'de> Deserialize<'de>>(
        &self,
        path: &str,
        form: &[(String, String)],
        idempotency_key: &str,
    ) -> Result<T, PaymentProviderError> {
        let res = self
            .client
            .post(format!("{API_BASE_URL}{path}"))
            .basic_auth(&self.secret_key, None::<&str>)
            .header("Idempotency-Key", idempotency_key)
            .form(form)
            .send()
            .await
            .inspect_err(|e| {
                error!(path, error = ?e, "[Network Error] Stripe API POST failed");
            })?;

        let status = res.status();
        let body = res.text().await?;

        if status.is_success() {
            return serde_json::from_str::<T>(&body).map_err(|e| {
                error!(path, error = ?e, "[Unexpected Response] Stripe API body did not parse");
                PaymentProviderError::Api {
                    status_code: status.as_u16(),
                    message: "Malformed provider response".into(),
                }
            });
        }

        if status == StatusCode::TOO_MANY_REQUESTS {
            return Err(PaymentProviderError::RateLimited);
        }

        let message = serde_json::from_str::<serde_json::Value>(&body)
            .ok()
            .and_then(|v| {
                v.get("error")
                    .and_then(|e| e.get("message"))
                    .and_then(|m| m.as_str())
                    .map(String::from)
            })
            .unwrap_or(body);
        error!(path, %status, message, "Stripe API request failed");
        Err(PaymentProviderError::Api {
            status_code: status.as_u16(),
            message,
        })
    }

    /// Create the checkout session a held reservation redirects the guest
    /// to. The idempotency key is derived from the reservation, so a
    /// retried hold never mints a second session.
    pub async fn create_checkout_session(
        &self,
        request: CreateSessionRequest,
    ) -> Result<CheckoutSession, PaymentProviderError> {
        let method_types = request.methods.method_types();
        let mut form: Vec<(String, String)> = vec![
            ("mode".to_string(), "payment".to_string()),
            ("success_url".to_string(), self.success_url.clone()),
            ("cancel_url".to_string(), self.cancel_url.clone()),
            (
                "line_items[0][price_data][currency]".to_string(),
                request.currency.to_lowercase(),
            ),
            (
                "line_items[0][price_data][product_data][name]".to_string(),
                request.product_name.clone(),
            ),
            (
                "line_items[0][price_data][unit_amount]".to_string(),
                request.amount_minor.to_string(),
            ),
            ("line_items[0][quantity]".to_string(), "1".to_string()),
            (
                "client_reference_id".to_string(),
                request.reservation_id.to_string(),
            ),
            (
                "metadata[reservation_id]".to_string(),
                request.reservation_id.to_string(),
            ),
        ];
        for (i, method) in method_types.iter().enumerate() {
            form.push((format!("payment_method_types[{i}]"), (*method).to_string()));
        }

        let idempotency_key = format!("reservation:{}:session", request.reservation_id);
        let response: CheckoutSessionApiResponse = self
            .post_form("/checkout/sessions", &form, &idempotency_key)
            .await?;

        let Some(url) = response.url else {
            error!(session_id = %response.id, "Stripe checkout session came back without a URL");
            return Err(PaymentProviderError::Api {
                status_code: 200,
                message: "Checkout session missing redirect URL".into(),
            });
        };

        info!(session_id = %response.id, "Created checkout session");
        Ok(CheckoutSession {
            session_id: PaymentSessionId::new(response.id),
            redirect_url: url,
        })
    }

    /// Expire an abandoned checkout session so the guest cannot pay for a
    /// hold that no longer exists.
    pub async fn expire_session(
        &self,
        session_id: &PaymentSessionId,
    ) -> Result<(), PaymentProviderError> {
        let idempotency_key = format!("session:{session_id}:expire");
        let _: serde_json::Value = self
            .post_form(
                &format!("/checkout/sessions/{session_id}/expire"),
                &[],
                &idempotency_key,
            )
            .await?;
        Ok(())
    }

    /// Refund a captured payment (expired hold paid too late, or a
    /// cancelled meeting).
    pub async fn refund_payment(
        &self,
        payment_id: &PaymentId,
        reason_tag: &str,
    ) -> Result<(), PaymentProviderError> {
        let form = vec![("payment_intent".to_string(), payment_id.to_string())];
        let idempotency_key = format!("payment:{payment_id}:refund:{reason_tag}");
        let _: serde_json::Value = self.post_form("/refunds", &form, &idempotency_key).await?;
        info!(payment_id = %payment_id, "Issued refund");
        Ok(())
    }

    /// Disburse an expert transfer. Metadata links the provider-side
    /// transfer back to the meeting for reconciliation.
    pub async fn create_transfer(
        &self,
        request: CreateTransferRequest,
    ) -> Result<ProviderTransferId, PaymentProviderError> {
        let form = vec![
            ("amount".to_string(), request.amount_minor.to_string()),
            ("currency".to_string(), request.currency.to_lowercase()),
            ("destination".to_string(), request.destination.to_string()),
            (
                "source_transaction".to_string(),
                request.source_transaction.to_string(),
            ),
            (
                "metadata[meeting_id]".to_string(),
                request.meeting_id.to_string(),
            ),
            (
                "metadata[expert_id]".to_string(),
                request.expert_id.to_string(),
            ),
            (
                "metadata[session_start_instant]".to_string(),
                request.session_start.to_rfc3339(),
            ),
        ];
        let idempotency_key = format!("transfer:{}:disburse", request.transfer_id);
        let response: TransferApiResponse =
            self.post_form("/transfers", &form, &idempotency_key).await?;
        info!(
            transfer_id = %request.transfer_id,
            provider_transfer_id = %response.id,
            "Created provider transfer"
        );
        Ok(ProviderTransferId::new(response.id))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn method_types_map_to_provider_names() {
        let all = PaymentMethods {
            card: true,
            bank_debit: true,
            voucher: true,
        };
        assert_eq!(all.method_types(), vec!["card", "sepa_debit", "multibanco"]);

        let card_only = PaymentMethods {
            card: true,
            bank_debit: false,
            voucher: false,
        };
        assert_eq!(card_only.method_types(), vec!["card"]);
    }

    #[test]
    fn checkout_session_event_parses() {
        let payload = serde_json::json!({
            "id": "evt_123",
            "created": 1741000000,
            "type": "checkout.session.completed",
            "data": {
                "object": {
                    "id": "cs_test_1",
                    "amount_total": 10000,
                    "currency": "eur",
                    "payment_intent": "pi_123",
                    "payment_status": "paid",
                    "client_reference_id": "7f8de936-3a43-44b6-bd25-93a0a950bc12",
                    "metadata": { "reservation_id": "7f8de936-3a43-44b6-bd25-93a0a950bc12" }
                }
            }
        });

        let event: StripeEvent = serde_json::from_value(payload).unwrap();
        assert_eq!(event.event_type, "checkout.session.completed");
        let session: StripeCheckoutSessionObject =
            serde_json::from_value(event.data.object).unwrap();
        assert_eq!(session.payment_status.as_deref(), Some("paid"));
        assert_eq!(session.amount_total, Some(10000));
    }
}
