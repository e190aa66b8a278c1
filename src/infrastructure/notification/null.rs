//! No-op notifier adapter
//!
//! Used when desktop notifications are disabled.

use async_trait::async_trait;

use crate::application::ports::{NotificationError, NotificationIcon, Notifier};

/// Notifier that silently drops everything
pub struct NullNotifier;

impl NullNotifier {
    pub fn new() -> Self {
        Self
    }
}

impl Default for NullNotifier {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl Notifier for NullNotifier {
    async fn notify(
        &self,
        _title: &str,
        _message: &str,
        _icon: NotificationIcon,
    ) -> Result<(), NotificationError> {
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn null_notifier_returns_ok() {
        let notifier = NullNotifier::new();
        let result = notifier
            .notify("Title", "Message", NotificationIcon::Info)
            .await;
        assert!(result.is_ok());
    }
}
