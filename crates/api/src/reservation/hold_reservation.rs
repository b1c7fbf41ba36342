use axum::{extract::State, Json};
use chrono::{DateTime, Duration, Utc};
use chrono_tz::Tz;
use soudan_api_structs::hold_reservation::{APIResponse, RequestBody};
use soudan_domain::{
    booking_slots::{bookable_starts, AvailabilityInputs},
    EventId,
    GuestIdentifier,
    Reservation,
    ReservationId,
    ReservationStatus,
};
use soudan_infra::{
    stripe::{CreateSessionRequest, PaymentMethods, StripePaymentProvider},
    HoldOutcome,
    SoudanContext,
};
use tracing::{error, warn};
use validator::Validate;

use crate::{
    availability::inputs::{load_booking_inputs, BookingInputsError},
    error::ApiError,
    shared::usecase::{execute, UseCase},
};

pub async fn hold_reservation_controller(
    State(ctx): State<SoudanContext>,
    Json(body): Json<RequestBody>,
) -> Result<Json<APIResponse>, ApiError> {
    body.validate()
        .map_err(|e| ApiError::BadClientData(e.to_string()))?;

    let guest_timezone: Tz = match &body.guest_timezone {
        Some(tz) => tz
            .parse()
            .map_err(|_| ApiError::BadClientData(format!("Unknown timezone: {tz}")))?,
        None => chrono_tz::UTC,
    };

    let usecase = HoldReservationUseCase {
        event_id: body.event_id,
        start_time: body.start_instant,
        guest: GuestIdentifier::new(body.guest_identifier),
        guest_timezone,
        guest_notes: body.guest_notes,
        now: ctx.sys.get_timestamp(),
    };

    execute(usecase, &ctx)
        .await
        .map(|res| {
            Json(APIResponse {
                reservation_id: res.reservation_id,
                payment_redirect_url: res.payment_redirect_url,
                expires_at: res.expires_at,
            })
        })
        .map_err(ApiError::from)
}

#[derive(Debug)]
pub(crate) struct HoldReservationUseCase {
    pub event_id: EventId,
    pub start_time: DateTime<Utc>,
    pub guest: GuestIdentifier,
    pub guest_timezone: Tz,
    pub guest_notes: Option<String>,
    pub now: DateTime<Utc>,
}

#[derive(Debug)]
pub(crate) struct UseCaseRes {
    pub reservation_id: ReservationId,
    pub payment_redirect_url: String,
    pub expires_at: DateTime<Utc>,
}

#[derive(Debug)]
pub(crate) enum UseCaseError {
    EventNotFound,
    CalendarNotConnected,
    AvailabilityUnknown,
    /// The requested instant is no longer a valid candidate
    StaleAvailability,
    /// Another hold or meeting overlaps the requested span
    Overlap,
    PaymentUnavailable,
    InternalError,
}

impl From<BookingInputsError> for UseCaseError {
    fn from(e: BookingInputsError) -> Self {
        match e {
            // The event id is the caller's handle; a missing or unbookable
            // expert reads the same from the outside
            BookingInputsError::ExpertNotFound | BookingInputsError::EventNotFound => {
                Self::EventNotFound
            }
            BookingInputsError::CalendarNotConnected => Self::CalendarNotConnected,
            BookingInputsError::AvailabilityUnknown => Self::AvailabilityUnknown,
            BookingInputsError::InternalError => Self::InternalError,
        }
    }
}

impl From<UseCaseError> for ApiError {
    fn from(e: UseCaseError) -> Self {
        match e {
            UseCaseError::EventNotFound => Self::NotFound("Event was not found".into()),
            UseCaseError::CalendarNotConnected => Self::CalendarNotConnected,
            UseCaseError::AvailabilityUnknown => Self::AvailabilityUnknown,
            UseCaseError::StaleAvailability => {
                Self::Gone("The requested start instant is no longer available".into())
            }
            UseCaseError::Overlap => {
                Self::Conflict("Another booking already holds this slot".into())
            }
            UseCaseError::PaymentUnavailable => {
                Self::UpstreamUnavailable("Payment provider unavailable".into())
            }
            UseCaseError::InternalError => Self::InternalError,
        }
    }
}

#[async_trait::async_trait]
impl UseCase for HoldReservationUseCase {
    type Response = UseCaseRes;

    type Error = UseCaseError;

    const NAME: &'static str = "HoldReservation";

    async fn execute(&mut self, ctx: &SoudanContext) -> Result<Self::Response, Self::Error> {
        // The event owner is not known yet; resolve it through the event
        let event = ctx
            .repos
            .events
            .find(&self.event_id)
            .await
            .map_err(|_| UseCaseError::InternalError)?
            .filter(|e| e.active)
            .ok_or(UseCaseError::EventNotFound)?;

        let inputs =
            load_booking_inputs(&event.expert_id, &self.event_id, self.now, ctx).await?;

        // Re-validate the requested instant against the availability engine
        let candidates = bookable_starts(&AvailabilityInputs {
            schedule: &inputs.schedule,
            policy: inputs.policy,
            duration_minutes: inputs.event.duration_minutes,
            blocked_dates: &inputs.blocked_dates,
            busy: &inputs.busy,
            now: self.now,
        });
        if !candidates.contains(&self.start_time) {
            return Err(UseCaseError::StaleAvailability);
        }

        let reservation = Reservation {
            id: ReservationId::new_v4(),
            event_id: inputs.event.id.clone(),
            expert_id: inputs.expert.id.clone(),
            guest: self.guest.clone(),
            guest_timezone: self.guest_timezone,
            guest_notes: self.guest_notes.take(),
            start_time: self.start_time,
            end_time: self.start_time + Duration::minutes(inputs.event.duration_minutes),
            payment_session_id: None,
            pending_voucher: false,
            created_at: self.now,
            expires_at: self.now
                + Duration::minutes(ctx.config.default_reservation_ttl_minutes),
            status: ReservationStatus::Held,
        };

        // Resolve the provider before taking the hold; a misconfigured
        // provider must not leave a zombie hold behind
        let provider = StripePaymentProvider::from_config().map_err(|e| {
            error!(error = ?e, "Payment provider not configured");
            UseCaseError::PaymentUnavailable
        })?;

        // The insert re-checks overlaps under the expert's advisory lock,
        // so of two concurrent holds for the same span exactly one lands
        match ctx
            .repos
            .reservations
            .insert_hold(&reservation, self.now)
            .await
            .map_err(|_| UseCaseError::InternalError)?
        {
            HoldOutcome::Inserted => {}
            HoldOutcome::Conflict => return Err(UseCaseError::Overlap),
        }
        let session = match provider
            .create_checkout_session(CreateSessionRequest {
                reservation_id: reservation.id.clone(),
                amount_minor: inputs.event.price_minor,
                currency: inputs.event.currency.clone(),
                product_name: inputs.event.title.clone(),
                methods: PaymentMethods {
                    card: true,
                    bank_debit: true,
                    voucher: true,
                },
            })
            .await
        {
            Ok(session) => session,
            Err(e) => {
                // Without a payment session the hold is useless: release it
                warn!(
                    reservation_id = %reservation.id,
                    error = ?e,
                    "Releasing hold, checkout session could not be created"
                );
                let _ = ctx.repos.reservations.abort(&reservation.id).await;
                return Err(UseCaseError::PaymentUnavailable);
            }
        };

        ctx.repos
            .reservations
            .attach_payment_session(&reservation.id, &session.session_id)
            .await
            .map_err(|_| UseCaseError::InternalError)?;

        Ok(UseCaseRes {
            reservation_id: reservation.id,
            payment_redirect_url: session.redirect_url,
            expires_at: reservation.expires_at,
        })
    }
}
