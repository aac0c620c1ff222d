//! Progress notifications.
//!
//! Workers and the dispatcher push messages onto one channel; a single
//! [`NotificationPump`] drains it, delivers to each request's
//! [`NotificationTarget`] and recycles finished records.

mod pump;
mod target;
mod types;

pub use pump::NotificationPump;
pub use target::{FnTarget, NotificationTarget};
pub use types::Notification;
pub(crate) use types::Message;
