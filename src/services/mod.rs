pub mod booking;
pub mod fare;
