mod abort_reservation;
mod confirm_reservation;
mod get_reservation;
mod hold_reservation;
mod sweep_reservations;

pub use abort_reservation::abort_reservation_controller;
pub(crate) use confirm_reservation::{ConfirmEffect, ConfirmReservationUseCase};
pub use get_reservation::get_reservation_controller;
pub use hold_reservation::hold_reservation_controller;
pub(crate) use sweep_reservations::SweepReservationsUseCase;
