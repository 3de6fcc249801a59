mod notification;

pub use notification::{
    is_mounted, push_notification, Notification, NotificationManager, NotificationStyle,
};
