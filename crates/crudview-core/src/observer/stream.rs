// ── Reactive state subscription ──

use std::pin::Pin;
use std::task::{Context, Poll};

use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use super::ObserverState;
use crate::content::Entity;

/// A subscription to an observer's state snapshots.
///
/// Holds the snapshot taken at subscription time and a receiver for
/// every later change.
pub struct StateStream<T: Entity> {
    current: ObserverState<T>,
    receiver: watch::Receiver<ObserverState<T>>,
}

impl<T: Entity> StateStream<T> {
    pub(crate) fn new(receiver: watch::Receiver<ObserverState<T>>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// Snapshot captured at creation (or at the last `changed()`).
    pub fn current(&self) -> &ObserverState<T> {
        &self.current
    }

    pub fn latest(&self) -> ObserverState<T> {
        self.receiver.borrow().clone()
    }

    /// Wait for the next change. `None` once the observer is dropped.
    pub async fn changed(&mut self) -> Option<ObserverState<T>> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = snap.clone();
        Some(snap)
    }

    pub fn into_stream(self) -> StateWatchStream<T> {
        StateWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter yielding a snapshot per state change.
pub struct StateWatchStream<T: Entity> {
    inner: WatchStream<ObserverState<T>>,
}

impl<T: Entity> Stream for StateWatchStream<T> {
    type Item = ObserverState<T>;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
