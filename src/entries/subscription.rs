use tokio::sync::{mpsc, watch};
use tokio::task::JoinHandle;

use super::state::DisplayState;

/// Foreground-scoped forwarding of model states into the UI event channel.
///
/// [`resume`](Self::resume) spawns a forwarder that first delivers the
/// latest state, then every later one, in order. [`pause`](Self::pause)
/// aborts it. Each resume bumps the generation so the receiver can drop
/// events a previous forwarder left in the channel.
#[derive(Debug, Default)]
pub struct StateSubscription {
    generation: u64,
    handle: Option<JoinHandle<()>>,
}

impl StateSubscription {
    pub fn generation(&self) -> u64 {
        self.generation
    }

    pub fn is_active(&self) -> bool {
        self.handle.as_ref().is_some_and(|h| !h.is_finished())
    }

    /// Whether an event tagged with `generation` is from the live forwarder.
    pub fn is_current(&self, generation: u64) -> bool {
        self.handle.is_some() && generation == self.generation
    }

    /// Start forwarding. Any previous forwarder is aborted first.
    pub fn resume<E, F>(
        &mut self,
        mut states: watch::Receiver<DisplayState>,
        events: mpsc::UnboundedSender<E>,
        wrap: F,
    ) where
        E: Send + 'static,
        F: Fn(u64, DisplayState) -> E + Send + 'static,
    {
        self.pause();
        self.generation += 1;
        let generation = self.generation;

        self.handle = Some(tokio::spawn(async move {
            let latest = states.borrow_and_update().clone();
            if events.send(wrap(generation, latest)).is_err() {
                return;
            }
            while states.changed().await.is_ok() {
                let state = states.borrow_and_update().clone();
                if events.send(wrap(generation, state)).is_err() {
                    return;
                }
            }
            tracing::debug!(generation, "Entry model closed its state stream");
        }));
        tracing::trace!(generation, "State subscription resumed");
    }

    /// Stop forwarding. States published meanwhile are not buffered; the
    /// next resume starts from the latest one.
    pub fn pause(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.abort();
            tracing::trace!(generation = self.generation, "State subscription paused");
        }
    }
}

impl Drop for StateSubscription {
    fn drop(&mut self) {
        self.pause();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entries::testing::{entry, showing};
    use pretty_assertions::assert_eq;

    fn loading() -> DisplayState {
        DisplayState::LoadingCachedEntries
    }

    #[tokio::test]
    async fn test_resume_delivers_latest_first() {
        let (state_tx, state_rx) = watch::channel(loading());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut sub = StateSubscription::default();

        sub.resume(state_rx, tx, |g, s| (g, s));
        assert_eq!(rx.recv().await.unwrap(), (1, loading()));

        let next = DisplayState::ShowingCachedEntries(showing(vec![entry(1)]));
        state_tx.send(next.clone()).unwrap();
        assert_eq!(rx.recv().await.unwrap(), (1, next));
        assert!(sub.is_current(1));
    }

    #[tokio::test]
    async fn test_pause_skips_intermediate_states() {
        let (state_tx, state_rx) = watch::channel(loading());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut sub = StateSubscription::default();

        sub.resume(state_rx.clone(), tx.clone(), |g, s| (g, s));
        rx.recv().await.unwrap();
        sub.pause();
        assert!(!sub.is_active());
        assert!(!sub.is_current(1));

        state_tx
            .send(DisplayState::InitialSync {
                message: "a".to_string(),
            })
            .unwrap();
        let last = DisplayState::ShowingCachedEntries(showing(vec![]));
        state_tx.send(last.clone()).unwrap();

        sub.resume(state_rx, tx, |g, s| (g, s));
        assert_eq!(rx.recv().await.unwrap(), (2, last));
        assert!(rx.try_recv().is_err());
    }

    #[tokio::test]
    async fn test_forwarder_ends_with_model() {
        let (state_tx, state_rx) = watch::channel(loading());
        let (tx, mut rx) = mpsc::unbounded_channel();
        let mut sub = StateSubscription::default();

        sub.resume(state_rx, tx, |g, s| (g, s));
        rx.recv().await.unwrap();
        drop(state_tx);

        // Channel closes once the forwarder returns
        assert!(rx.recv().await.is_none());
    }
}
