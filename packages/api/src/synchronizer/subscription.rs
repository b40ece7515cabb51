use std::future::Future;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// Handle to a running listener task.
///
/// Dropping this handle cancels the listener.
#[derive(Debug)]
pub struct SubscriptionHandle {
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl SubscriptionHandle {
    /// Spawn `listener`, stopping it when `cancel` fires.
    pub(crate) fn spawn<F>(name: &'static str, cancel: CancellationToken, listener: F) -> Self
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let token = cancel.clone();
        let task = tokio::spawn(async move {
            tokio::select! {
                biased;

                () = token.cancelled() => {
                    tracing::debug!(listener = name, "listener cancelled");
                }
                () = listener => {
                    tracing::debug!(listener = name, "listener stream ended");
                }
            }
        });
        Self {
            cancel,
            task: Some(task),
        }
    }

    pub fn is_finished(&self) -> bool {
        self.task.as_ref().map_or(true, JoinHandle::is_finished)
    }

    /// Cancel the listener and wait for it to finish.
    pub async fn cancel(mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            let _ = task.await;
        }
    }
}

impl Drop for SubscriptionHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn test_cancel_stops_a_pending_listener() {
        let handle = SubscriptionHandle::spawn(
            "pending",
            CancellationToken::new(),
            futures::future::pending(),
        );
        assert!(!handle.is_finished());

        tokio::time::timeout(Duration::from_secs(1), handle.cancel())
            .await
            .unwrap();
    }

    #[tokio::test]
    async fn test_parent_token_cancels_children() {
        let root = CancellationToken::new();
        let handle = SubscriptionHandle::spawn("child", root.child_token(), futures::future::pending());

        root.cancel();
        tokio::time::timeout(Duration::from_secs(1), async {
            while !handle.is_finished() {
                tokio::task::yield_now().await;
            }
        })
        .await
        .unwrap();
    }
}
