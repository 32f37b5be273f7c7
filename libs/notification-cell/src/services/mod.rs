pub mod inbox;
pub mod notification;

pub use inbox::NotificationInbox;
pub use notification::NotificationService;
