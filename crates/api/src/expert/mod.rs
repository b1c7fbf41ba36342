mod oauth_integration;

pub use oauth_integration::{oauth_integration_controller, remove_integration_controller};
