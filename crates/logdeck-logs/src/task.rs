use std::future::Future;
use std::time::Duration;

use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

/// A background task owned by a single component
///
/// Cancelled when [`OwnedTask::cancel`] is called or the handle is dropped,
/// so timers never outlive the component that scheduled them.
#[derive(Debug)]
pub struct OwnedTask {
    cancel: CancellationToken,
    handle: JoinHandle<()>,
}

impl OwnedTask {
    /// Spawn `f` with a token that fires on cancellation
    pub fn spawn<F, Fut>(f: F) -> Self
    where
        F: FnOnce(CancellationToken) -> Fut,
        Fut: Future<Output = ()> + Send + 'static,
    {
        let cancel = CancellationToken::new();
        let handle = tokio::spawn(f(cancel.clone()));
        Self { cancel, handle }
    }

    /// Call `on_tick` every `period`, first after one full period.
    /// Stops when cancelled or when `on_tick` returns false.
    pub fn interval<F>(period: Duration, mut on_tick: F) -> Self
    where
        F: FnMut() -> bool + Send + 'static,
    {
        Self::spawn(move |cancel| async move {
            let start = tokio::time::Instant::now() + period;
            let mut ticker = tokio::time::interval_at(start, period);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => break,
                    _ = ticker.tick() => {
                        if !on_tick() {
                            break;
                        }
                    }
                }
            }
        })
    }

    pub fn cancel(&self) {
        self.cancel.cancel();
        self.handle.abort();
    }

    pub fn is_finished(&self) -> bool {
        self.handle.is_finished()
    }
}

impl Drop for OwnedTask {
    fn drop(&mut self) {
        self.cancel();
    }
}
