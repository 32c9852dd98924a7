pub mod appointment;
pub mod doctor;
pub mod enums;
pub mod filters;

pub use appointment::{Appointment, AppointmentDraft, AppointmentStats};
pub use doctor::AuthorizedDoctor;
pub use enums::AppointmentStatus;
pub use filters::AppointmentFilter;
