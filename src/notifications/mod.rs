mod dispatcher;
pub mod models;

pub use dispatcher::{NotificationDispatcher, NotificationSink};
pub use models::{Notification, NotificationKind};
