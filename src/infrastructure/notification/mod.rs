//! Notification infrastructure module
//!
//! Provides cross-platform notification support using notify-rust,
//! with a no-op fallback when notifications are disabled.

mod notify_rust;
mod null;

pub use notify_rust::NotifyRustNotifier;
pub use null::NullNotifier;

use crate::application::ports::Notifier;

/// Create a notifier based on whether notifications are enabled
pub fn create_notifier(enabled: bool) -> Box<dyn Notifier> {
    if enabled {
        Box::new(NotifyRustNotifier::new())
    } else {
        Box::new(NullNotifier::new())
    }
}
