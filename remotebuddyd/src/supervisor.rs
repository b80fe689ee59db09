use remotebuddy_common::tracing;
use std::fmt::Debug;
use std::future::Future;
use std::time::Duration;
use tokio::sync::mpsc;
use tracing::{debug, info};

/// Run `pass` once, then once more for every notification received on
/// `notifications`.
///
/// With a non-zero `coalesce` window, the loop waits that long after a
/// notification and folds everything queued meanwhile into the same pass.
/// Returns when every sender is gone.
pub async fn supervise<T, F, Fut>(
    name: &str,
    mut notifications: mpsc::UnboundedReceiver<T>,
    coalesce: Duration,
    mut pass: F,
) where
    T: Debug,
    F: FnMut() -> Fut,
    Fut: Future<Output = ()>,
{
    info!("{}: initial pass", name);
    pass().await;

    while let Some(notification) = notifications.recv().await {
        debug!("{}: notified by {:?}", name, notification);

        if !coalesce.is_zero() {
            tokio::time::sleep(coalesce).await;
            let mut absorbed = 0;
            while notifications.try_recv().is_ok() {
                absorbed += 1;
            }
            if absorbed > 0 {
                debug!("{}: folded {} more notifications into this pass", name, absorbed);
            }
        }

        pass().await;
    }

    info!("{}: notification source closed", name);
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    async fn count_passes(queued: usize, coalesce: Duration) -> usize {
        let (tx, rx) = mpsc::unbounded_channel();
        for i in 0..queued {
            tx.send(i).unwrap();
        }
        drop(tx);

        let passes = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&passes);
        supervise("test", rx, coalesce, || {
            let counter = Arc::clone(&counter);
            async move {
                counter.fetch_add(1, Ordering::SeqCst);
            }
        })
        .await;

        passes.load(Ordering::SeqCst)
    }

    #[tokio::test]
    async fn test_initial_pass_without_notifications() {
        assert_eq!(count_passes(0, Duration::ZERO).await, 1);
    }

    #[tokio::test]
    async fn test_every_notification_gets_a_pass() {
        assert_eq!(count_passes(3, Duration::ZERO).await, 4);
    }

    #[tokio::test]
    async fn test_burst_coalesced_into_one_pass() {
        assert_eq!(count_passes(5, Duration::from_millis(20)).await, 2);
    }

    #[tokio::test]
    async fn test_notification_during_pass_triggers_another() {
        let (tx, rx) = mpsc::unbounded_channel::<&'static str>();
        let passes = Arc::new(AtomicUsize::new(0));
        let counter = Arc::clone(&passes);
        let sender = std::sync::Mutex::new(Some(tx));

        supervise("test", rx, Duration::ZERO, || {
            let pass = counter.fetch_add(1, Ordering::SeqCst);
            let mut sender = sender.lock().unwrap();
            // first pass queues a change, second pass closes the source
            if pass == 0 {
                sender.as_ref().unwrap().send("changed").unwrap();
            } else {
                sender.take();
            }
            async {}
        })
        .await;

        assert_eq!(passes.load(Ordering::SeqCst), 2);
    }
}
