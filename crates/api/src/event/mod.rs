mod get_events;

pub use get_events::get_events_controller;
