pub mod handlers;
pub mod models;
pub mod router;
pub mod services;

pub use models::{
    Appointment, AppointmentBatch, AppointmentOrigin, AppointmentStatus, AppointmentUpdate,
    CreateAppointmentRequest,
};
pub use router::appointment_routes;
