// ── Subscription streams ──
//
// Consumer-side handles for cache changes and session state.

use std::pin::Pin;
use std::task::{Context, Poll, ready};

use futures_core::Stream;
use tokio::sync::{broadcast, watch};
use tokio_stream::StreamExt;
use tokio_stream::wrappers::errors::BroadcastStreamRecvError;
use tokio_stream::wrappers::{BroadcastStream, WatchStream};
use tracing::warn;

use agrisage_api::SessionState;

use crate::cache::CacheEvent;

/// Cache change notifications.
///
/// A subscriber that falls behind skips the events it missed; views
/// should re-read the keys they show when that happens.
pub struct CacheEvents {
    inner: BroadcastStream<CacheEvent>,
}

impl CacheEvents {
    pub(crate) fn new(receiver: broadcast::Receiver<CacheEvent>) -> Self {
        Self {
            inner: BroadcastStream::new(receiver),
        }
    }

    /// Wait for the next event. Returns `None` once the cache is dropped.
    pub async fn recv(&mut self) -> Option<CacheEvent> {
        self.next().await
    }
}

impl Stream for CacheEvents {
    type Item = CacheEvent;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        loop {
            match ready!(Pin::new(&mut self.inner).poll_next(cx)) {
                Some(Ok(event)) => return Poll::Ready(Some(event)),
                Some(Err(BroadcastStreamRecvError::Lagged(missed))) => {
                    warn!(missed, "cache event subscriber lagged");
                }
                None => return Poll::Ready(None),
            }
        }
    }
}

/// A subscription to the session's authentication state.
pub struct SessionStream {
    current: SessionState,
    receiver: watch::Receiver<SessionState>,
}

impl SessionStream {
    pub(crate) fn new(receiver: watch::Receiver<SessionState>) -> Self {
        let current = *receiver.borrow();
        Self { current, receiver }
    }

    /// State captured at creation or at the last `changed()`.
    pub fn current(&self) -> SessionState {
        self.current
    }

    /// Wait for the next change. Returns `None` if the session is dropped.
    pub async fn changed(&mut self) -> Option<SessionState> {
        self.receiver.changed().await.ok()?;
        self.current = *self.receiver.borrow_and_update();
        Some(self.current)
    }

    /// Convert into a `Stream` yielding the current state, then each change.
    pub fn into_stream(self) -> WatchStream<SessionState> {
        WatchStream::new(self.receiver)
    }
}
