// Single-flight coordination for token refresh.
//
// Any number of requests can observe a 401 in the same window; only the
// first may talk to the refresh endpoint. Later callers park on a FIFO
// queue and receive whatever outcome the in-flight refresh settles with.

use std::collections::VecDeque;
use std::future::Future;
use std::sync::Mutex;

use tokio::sync::oneshot;

use crate::error::GatewayError;

type Outcome = Result<String, GatewayError>;

#[derive(Default)]
struct State {
    /// True while a refresh call is in flight. Always consistent with
    /// `waiters`: the queue is only appended to while this is set, and is
    /// drained exactly when it is cleared.
    refreshing: bool,
    waiters: VecDeque<oneshot::Sender<Outcome>>,
}

/// Ensures at most one token refresh is in flight per process.
///
/// Owned by the gateway and constructed once; there is no module-level
/// singleton. The internal lock is only held for queue bookkeeping, never
/// across an await.
#[derive(Default)]
pub struct TokenRefreshCoordinator {
    state: Mutex<State>,
}

impl TokenRefreshCoordinator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Run `refresh` exclusively.
    ///
    /// The first caller in an idle window becomes the leader and executes
    /// the future; concurrent callers enqueue and are woken, in FIFO
    /// order, with a clone of the leader's outcome. The leader clears the
    /// in-flight flag and drains the queue before returning, whether the
    /// refresh succeeded or failed; if its future is dropped mid-refresh,
    /// a drop guard does the same, failing the waiters instead.
    pub async fn run_exclusive<F, Fut>(&self, refresh: F) -> Outcome
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Outcome>,
    {
        let waiter = {
            let mut state = self.state.lock().expect("coordinator lock poisoned");
            if state.refreshing {
                let (tx, rx) = oneshot::channel();
                state.waiters.push_back(tx);
                Some(rx)
            } else {
                state.refreshing = true;
                None
            }
        };

        if let Some(rx) = waiter {
            tracing::debug!("refresh already in flight, waiting for its outcome");
            return match rx.await {
                Ok(outcome) => outcome,
                // The sender vanished without a send; treat it the same as
                // an abandoned refresh.
                Err(_) => Err(GatewayError::Network(
                    "token refresh was abandoned".to_string(),
                )),
            };
        }

        // If this future is dropped mid-refresh the guard clears the flag
        // and fails the queued waiters, so no later caller parks forever.
        let mut guard = AbandonGuard {
            coordinator: self,
            disarmed: false,
        };
        let outcome = refresh().await;
        guard.disarmed = true;

        let drained = {
            let mut state = self.state.lock().expect("coordinator lock poisoned");
            state.refreshing = false;
            std::mem::take(&mut state.waiters)
        };

        if !drained.is_empty() {
            tracing::debug!(waiters = drained.len(), "draining refresh waiters");
        }
        for tx in drained {
            // A waiter that gave up waiting is fine to skip.
            let _ = tx.send(outcome.clone());
        }

        outcome
    }
}

/// Cleans up after a leader whose future never came back from the refresh:
/// clears the in-flight flag and fails every queued waiter.
struct AbandonGuard<'a> {
    coordinator: &'a TokenRefreshCoordinator,
    disarmed: bool,
}

impl Drop for AbandonGuard<'_> {
    fn drop(&mut self) {
        if self.disarmed {
            return;
        }
        let drained = match self.coordinator.state.lock() {
            Ok(mut state) => {
                state.refreshing = false;
                std::mem::take(&mut state.waiters)
            }
            Err(_) => return,
        };
        tracing::warn!(waiters = drained.len(), "refresh abandoned mid-flight");
        for tx in drained {
            let _ = tx.send(Err(GatewayError::Network(
                "token refresh was abandoned".to_string(),
            )));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;

    #[tokio::test]
    async fn test_idle_caller_runs_refresh() {
        let coordinator = TokenRefreshCoordinator::new();
        let outcome = coordinator
            .run_exclusive(|| async { Ok("T2".to_string()) })
            .await;
        assert_eq!(outcome, Ok("T2".to_string()));

        // The flag is cleared; a later window runs its own refresh.
        let outcome = coordinator
            .run_exclusive(|| async { Ok("T3".to_string()) })
            .await;
        assert_eq!(outcome, Ok("T3".to_string()));
    }

    #[tokio::test]
    async fn test_concurrent_callers_share_one_refresh() {
        let coordinator = Arc::new(TokenRefreshCoordinator::new());
        let calls = Arc::new(AtomicUsize::new(0));
        let (gate_tx, gate_rx) = oneshot::channel::<()>();

        let leader = {
            let coordinator = coordinator.clone();
            let calls = calls.clone();
            tokio::spawn(async move {
                coordinator
                    .run_exclusive(|| async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        gate_rx.await.ok();
                        Ok("T2".to_string())
                    })
                    .await
            })
        };

        // Let the leader take the flag before followers arrive.
        tokio::task::yield_now().await;

        let mut followers = Vec::new();
        for _ in 0..3 {
            let coordinator = coordinator.clone();
            let calls = calls.clone();
            followers.push(tokio::spawn(async move {
                coordinator
                    .run_exclusive(|| async move {
                        calls.fetch_add(1, Ordering::SeqCst);
                        Ok("WRONG".to_string())
                    })
                    .await
            }));
        }

        for _ in 0..8 {
            tokio::task::yield_now().await;
        }
        gate_tx.send(()).unwrap();

        assert_eq!(leader.await.unwrap(), Ok("T2".to_string()));
        for follower in followers {
            assert_eq!(follower.await.unwrap(), Ok("T2".to_string()));
        }
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[tokio::test]
    async fn test_waiters_drained_in_fifo_order() {
        let coordinator = Arc::new(TokenRefreshCoordinator::new());
        let order = Arc::new(Mutex::new(Vec::new()));
        let (gate_tx, gate_rx) = oneshot::channel::<()>();

        let leader = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move {
                coordinator
                    .run_exclusive(|| async move {
                        gate_rx.await.ok();
                        Ok("T2".to_string())
                    })
                    .await
            })
        };
        tokio::task::yield_now().await;

        let mut followers = Vec::new();
        for i in 0..3usize {
            let coordinator = coordinator.clone();
            let order = order.clone();
            followers.push(tokio::spawn(async move {
                let outcome = coordinator
                    .run_exclusive(|| async { Ok("WRONG".to_string()) })
                    .await;
                order.lock().unwrap().push(i);
                outcome
            }));
            // Force enqueue order to match spawn order.
            tokio::task::yield_now().await;
        }

        gate_tx.send(()).unwrap();
        leader.await.unwrap().unwrap();
        for follower in followers {
            follower.await.unwrap().unwrap();
        }

        assert_eq!(*order.lock().unwrap(), vec![0, 1, 2]);
    }

    #[tokio::test]
    async fn test_abandoned_leader_unparks_waiters() {
        let coordinator = Arc::new(TokenRefreshCoordinator::new());
        // Never fired: the leader stays parked until it is aborted.
        let (_gate_tx, gate_rx) = oneshot::channel::<()>();

        let leader = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move {
                coordinator
                    .run_exclusive(|| async move {
                        gate_rx.await.ok();
                        Ok("NEVER".to_string())
                    })
                    .await
            })
        };
        tokio::task::yield_now().await;

        let follower = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move {
                coordinator
                    .run_exclusive(|| async { Ok("WRONG".to_string()) })
                    .await
            })
        };
        for _ in 0..4 {
            tokio::task::yield_now().await;
        }

        leader.abort();
        assert!(leader.await.unwrap_err().is_cancelled());

        // The guard fails the parked waiter rather than leaving it forever.
        assert_eq!(
            follower.await.unwrap(),
            Err(GatewayError::Network(
                "token refresh was abandoned".to_string()
            ))
        );

        // The window is clear again; the next caller leads its own refresh.
        let outcome = coordinator
            .run_exclusive(|| async { Ok("T2".to_string()) })
            .await;
        assert_eq!(outcome, Ok("T2".to_string()));
    }

    #[tokio::test]
    async fn test_failure_fans_out_to_all_waiters() {
        let coordinator = Arc::new(TokenRefreshCoordinator::new());
        let (gate_tx, gate_rx) = oneshot::channel::<()>();

        let leader = {
            let coordinator = coordinator.clone();
            tokio::spawn(async move {
                coordinator
                    .run_exclusive(|| async move {
                        gate_rx.await.ok();
                        Err(GatewayError::RefreshRejected { status: 400 })
                    })
                    .await
            })
        };
        tokio::task::yield_now().await;

        let mut followers = Vec::new();
        for _ in 0..2 {
            let coordinator = coordinator.clone();
            followers.push(tokio::spawn(async move {
                coordinator
                    .run_exclusive(|| async { Ok("WRONG".to_string()) })
                    .await
            }));
        }
        for _ in 0..6 {
            tokio::task::yield_now().await;
        }
        gate_tx.send(()).unwrap();

        let expected = Err(GatewayError::RefreshRejected { status: 400 });
        assert_eq!(leader.await.unwrap(), expected);
        for follower in followers {
            assert_eq!(follower.await.unwrap(), expected);
        }
    }
}
