pub mod booking;
pub mod taxi;
pub mod tour;
pub mod user;

pub use booking::{Booking, BookingStatus, CreatedBy, ServiceDetails, ServiceType};
pub use taxi::Taxi;
pub use tour::Tour;
pub use user::{Role, User};
