mod subscription;
mod subscriptions;

pub use subscription::{Handler, Subscription};
pub use subscriptions::Subscriptions;

use std::sync::Arc;
use subscriptions::Registry;
use tokio_util::sync::CancellationToken;

/// Blocking multicast owned by a single producer.
///
/// Keep the `Event` private and hand out [`Event::subscriptions`] instead:
/// only the owner can call [`Event::trigger`].
pub struct Event<T, E = anyhow::Error> {
    registry: Arc<Registry<T, E>>,
}

impl<T, E> Event<T, E>
where
    T: Send + Sync + 'static,
    E: Send + 'static,
{
    pub fn new() -> Self {
        Self {
            registry: Registry::new(),
        }
    }

    pub fn subscriptions(&self) -> Subscriptions<T, E> {
        Subscriptions::new(Arc::clone(&self.registry))
    }

    /// Runs every current subscription with `value`, sequentially and in no
    /// particular order, and returns the first error any of them reports.
    /// Subscriptions not yet reached when an error comes back are skipped.
    ///
    /// `cx` is passed to each handler; honoring it is up to the handler.
    pub async fn trigger(&self, cx: &CancellationToken, value: T) -> Result<(), E> {
        self.registry.fire(cx, &value).await
    }

    pub fn subscriber_count(&self) -> usize {
        self.registry.len()
    }
}

impl<T, E> Default for Event<T, E>
where
    T: Send + Sync + 'static,
    E: Send + 'static,
{
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use parking_lot::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};

    struct Recorder {
        seen: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl Handler<String, anyhow::Error> for Recorder {
        async fn handle(&self, _cx: CancellationToken, value: &String) -> anyhow::Result<()> {
            self.seen.lock().push(value.clone());
            Ok(())
        }
    }

    #[tokio::test]
    async fn test_trigger_without_subscribers() {
        let event: Event<u32> = Event::new();
        assert!(event.trigger(&CancellationToken::new(), 1).await.is_ok());
        assert_eq!(event.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_subscribe_handler() {
        let event: Event<String> = Event::new();
        let recorder = Arc::new(Recorder {
            seen: Mutex::new(Vec::new()),
        });
        let _sub = event.subscriptions().subscribe_handler(recorder.clone());

        event
            .trigger(&CancellationToken::new(), "hello".to_string())
            .await
            .unwrap();
        assert_eq!(*recorder.seen.lock(), vec!["hello".to_string()]);
    }

    #[tokio::test]
    async fn test_close_from_inside_handler() {
        let event: Event<u32> = Event::new();
        let calls = Arc::new(AtomicUsize::new(0));
        let slot: Arc<Mutex<Option<Subscription>>> = Arc::new(Mutex::new(None));

        let calls_clone = Arc::clone(&calls);
        let slot_clone = Arc::clone(&slot);
        let sub = event.subscriptions().subscribe(move |_, _| {
            calls_clone.fetch_add(1, Ordering::SeqCst);
            if let Some(sub) = slot_clone.lock().as_ref() {
                sub.close();
            }
            async { Ok(()) }
        });
        *slot.lock() = Some(sub);

        let cx = CancellationToken::new();
        event.trigger(&cx, 1).await.unwrap();
        event.trigger(&cx, 2).await.unwrap();

        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(event.subscriber_count(), 0);
    }

    #[tokio::test]
    async fn test_subscribe_during_trigger_does_not_deadlock() {
        let event: Event<u32> = Event::new();
        let subs = event.subscriptions();
        let added = Arc::new(Mutex::new(Vec::new()));

        let added_clone = Arc::clone(&added);
        let _sub = event.subscriptions().subscribe(move |_, _| {
            let late = subs.subscribe(|_, _| async { Ok(()) });
            added_clone.lock().push(late);
            async { Ok(()) }
        });

        event.trigger(&CancellationToken::new(), 1).await.unwrap();
        assert_eq!(added.lock().len(), 1);
        assert_eq!(event.subscriber_count(), 2);
    }

    #[tokio::test]
    async fn test_handler_sees_cancellation() {
        let event: Event<u32> = Event::new();
        let _sub = event.subscriptions().subscribe(|cx: CancellationToken, _| async move {
            if cx.is_cancelled() {
                anyhow::bail!("cancelled");
            }
            Ok(())
        });

        let cx = CancellationToken::new();
        assert!(event.trigger(&cx, 1).await.is_ok());

        cx.cancel();
        let err = event.trigger(&cx, 2).await.unwrap_err();
        assert_eq!(err.to_string(), "cancelled");
    }
}
