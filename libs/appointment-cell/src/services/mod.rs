pub mod appointment;
pub mod board;
pub mod bucketing;
pub mod calendar;
pub mod date;
pub mod filtering;
pub mod lifecycle;

pub use appointment::AppointmentService;
pub use board::AppointmentBoard;
pub use lifecycle::AppointmentLifecycleService;
