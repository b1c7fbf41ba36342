mod handle_payment_event;

pub(crate) use handle_payment_event::HandlePaymentEventUseCase;
