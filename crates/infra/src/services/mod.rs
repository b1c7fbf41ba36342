pub mod google_calendar;
pub mod stripe;
