mod payment_api;

pub use payment_api::{
    CheckoutSession,
    CreateSessionRequest,
    CreateTransferRequest,
    PaymentMethods,
    PaymentProviderError,
    StripeCheckoutSessionObject,
    StripeEvent,
    StripeEventData,
    StripePaymentProvider,
};
