mod blocked_dates;
mod get_schedule;
mod save_schedule;

pub use blocked_dates::{
    add_blocked_date_controller,
    list_blocked_dates_controller,
    remove_blocked_date_controller,
};
pub use get_schedule::get_schedule_controller;
pub use save_schedule::save_schedule_controller;
