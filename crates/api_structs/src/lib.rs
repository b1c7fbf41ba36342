mod availability;
mod event;
mod expert;
mod meeting;
mod reservation;
mod schedule;
mod status;

pub mod dtos {
    pub use crate::{
        event::dtos::*,
        meeting::dtos::*,
        reservation::dtos::*,
        schedule::dtos::*,
    };
}
pub use crate::{
    availability::api::*,
    event::api::*,
    expert::api::*,
    meeting::api::*,
    reservation::api::*,
    schedule::api::*,
    status::api::*,
};
