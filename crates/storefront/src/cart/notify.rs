//! User-visible error signalling.
//!
//! The cart reports each failed operation exactly once, as a short message
//! meant for a toast. Delivery is fire-and-forget.

use std::sync::{Arc, Mutex, PoisonError};

/// Receives user-facing failure messages.
pub trait Notifier: Send + Sync {
    /// Show `message` to the shopper.
    fn error(&self, message: &str);
}

/// Emits messages as `info` events for whoever is collecting logs.
///
/// Must stay below `warn`, which the Sentry layer turns into events.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingNotifier;

impl Notifier for TracingNotifier {
    fn error(&self, message: &str) {
        tracing::info!(toast = message, "Cart error shown to user");
    }
}

/// Collects messages in memory until they are drained.
///
/// Clones share the same buffer.
#[derive(Debug, Clone, Default)]
pub struct MessageLog {
    messages: Arc<Mutex<Vec<String>>>,
}

impl MessageLog {
    /// Create an empty log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Copy of every message not yet drained.
    #[must_use]
    pub fn messages(&self) -> Vec<String> {
        self.lock().clone()
    }

    /// Remove and return every pending message.
    pub fn drain(&self) -> Vec<String> {
        std::mem::take(&mut *self.lock())
    }

    fn lock(&self) -> std::sync::MutexGuard<'_, Vec<String>> {
        self.messages.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

impl Notifier for MessageLog {
    fn error(&self, message: &str) {
        self.lock().push(message.to_string());
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use tracing::{Event, Level, Subscriber};
    use tracing_subscriber::layer::{Context, Layer, SubscriberExt};

    use super::*;

    /// Records the level of every event.
    #[derive(Clone, Default)]
    struct Levels(Arc<Mutex<Vec<Level>>>);

    impl<S: Subscriber> Layer<S> for Levels {
        fn on_event(&self, event: &Event<'_>, _ctx: Context<'_, S>) {
            self.0.lock().unwrap().push(*event.metadata().level());
        }
    }

    #[test]
    fn test_tracing_notifier_logs_below_warn() {
        let levels = Levels::default();
        let subscriber = tracing_subscriber::registry().with(levels.clone());

        tracing::subscriber::with_default(subscriber, || {
            TracingNotifier.error("Quantidade solicitada fora de estoque");
        });

        assert_eq!(*levels.0.lock().unwrap(), vec![Level::INFO]);
    }

    #[test]
    fn test_message_log_shared_between_clones() {
        let log = MessageLog::new();
        let handle = log.clone();

        handle.error("Erro na adição do produto");

        assert_eq!(log.messages(), vec!["Erro na adição do produto".to_string()]);
        assert_eq!(log.drain().len(), 1);
        assert!(handle.messages().is_empty());
    }
}
