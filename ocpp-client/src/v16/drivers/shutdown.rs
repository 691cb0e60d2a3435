#[cfg(feature = "async")]
use core::{future::Future, pin::Pin, task::{Context, Poll}};

#[cfg(feature = "tokio_shutdown")]
use {futures::FutureExt, tokio_util::sync::{CancellationToken, WaitForCancellationFutureOwned}};

/// Asks the simulator to leave the air: the core stops its session, closes
/// the link and the run loop returns.
#[cfg(feature = "async")]
pub trait ShutdownSignal: Send + Unpin + 'static {
    fn poll_shutdown(&mut self, cx: &mut Context<'_>) -> Poll<()>;
}

/// Latches the signal so the run loop sees it exactly once.
#[cfg(feature = "async")]
pub(crate) struct ShutdownDriver<T: ShutdownSignal> {
    signal: T,
    fired: bool,
}

#[cfg(feature = "async")]
impl<T: ShutdownSignal> ShutdownDriver<T> {
    pub fn new(signal: T) -> Self {
        Self {
            signal,
            fired: false,
        }
    }
}

#[cfg(feature = "async")]
impl<T: ShutdownSignal> Future for ShutdownDriver<T> {
    type Output = ();

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        if self.fired {
            return Poll::Pending;
        }
        let ready = self.signal.poll_shutdown(cx);
        if ready.is_ready() {
            self.fired = true;
        }
        ready
    }
}

/// Shutdown driven by a [`CancellationToken`]. Cancel any clone of
/// [`TokioShutdown::get_token`] to stop the simulator.
#[cfg(feature = "tokio_shutdown")]
pub struct TokioShutdown {
    token: CancellationToken,
    cancelled: Pin<Box<WaitForCancellationFutureOwned>>,
}

#[cfg(feature = "tokio_shutdown")]
impl TokioShutdown {
    pub fn new() -> Self {
        Self::from_token(CancellationToken::new())
    }

    /// Ties the simulator to an existing token, e.g. a child of the host
    /// application's own shutdown token.
    pub fn from_token(token: CancellationToken) -> Self {
        Self {
            cancelled: Box::pin(token.clone().cancelled_owned()),
            token,
        }
    }

    pub fn get_token(&self) -> CancellationToken {
        self.token.clone()
    }
}

#[cfg(feature = "tokio_shutdown")]
impl Default for TokioShutdown {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "tokio_shutdown")]
impl ShutdownSignal for TokioShutdown {
    fn poll_shutdown(&mut self, cx: &mut Context<'_>) -> Poll<()> {
        self.cancelled.poll_unpin(cx)
    }
}
