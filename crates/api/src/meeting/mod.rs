mod cancel_meeting;
mod get_meetings;

pub use cancel_meeting::cancel_meeting_controller;
pub use get_meetings::get_meetings_controller;
