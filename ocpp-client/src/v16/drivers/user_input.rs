#[cfg(feature = "async")]
use core::{future::Future, pin::Pin, task::{Context, Poll}};

use cpsim_core::v16::types::ChargePointErrorCode;

#[cfg(feature = "flume_channels")]
use {flume::{unbounded, Receiver, Sender}, futures::FutureExt};

#[derive(Debug, Clone, PartialEq)]
pub enum UserIntent {
    PlugIn {
        connector_id: usize,
        id_tag: String,
    },
    /// Present a tag again on a connector that is already plugged in.
    StartCharge {
        connector_id: usize,
        id_tag: String,
    },
    Unplug {
        connector_id: usize,
    },
    SimulateFault {
        connector_id: usize,
        error_code: Option<ChargePointErrorCode>,
    },
    ResetFault {
        connector_id: usize,
    },
}

#[cfg(feature = "async")]
pub trait UserInput: Send + Unpin + 'static {
    fn poll_next_input(&mut self, cx: &mut Context<'_>) -> Poll<UserIntent>;
}

#[cfg(feature = "async")]
pub(crate) struct UserInputDriver<T: UserInput> {
    input: T,
}

#[cfg(feature = "async")]
impl<T: UserInput> UserInputDriver<T> {
    pub fn new(input: T) -> Self {
        Self { input }
    }
}

#[cfg(feature = "async")]
impl<T: UserInput> Future for UserInputDriver<T> {
    type Output = UserIntent;

    fn poll(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        self.input.poll_next_input(cx)
    }
}

#[cfg(feature = "flume_channels")]
type RecvFuture = Pin<Box<dyn Future<Output = (Option<UserIntent>, Receiver<UserIntent>)> + Send>>;

#[cfg(feature = "flume_channels")]
fn recv_next(rx: Receiver<UserIntent>) -> RecvFuture {
    Box::pin(async move {
        let res = rx.recv_async().await.ok();
        (res, rx)
    })
}

#[cfg(feature = "flume_channels")]
pub struct FlumeUserInput {
    tx: Sender<UserIntent>,
    fut: Option<RecvFuture>,
}

#[cfg(feature = "flume_channels")]
impl FlumeUserInput {
    pub fn new() -> Self {
        let (tx, rx) = unbounded();
        Self::from_channel(tx, rx)
    }

    pub fn from_channel(tx: Sender<UserIntent>, rx: Receiver<UserIntent>) -> Self {
        Self {
            tx,
            fut: Some(recv_next(rx)),
        }
    }

    pub fn get_sender(&self) -> Sender<UserIntent> {
        self.tx.clone()
    }
}

#[cfg(feature = "flume_channels")]
impl Default for FlumeUserInput {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "flume_channels")]
impl UserInput for FlumeUserInput {
    fn poll_next_input(&mut self, cx: &mut Context<'_>) -> Poll<UserIntent> {
        let fut = match self.fut.as_mut() {
            Some(fut) => fut,
            None => return Poll::Pending,
        };
        match fut.poll_unpin(cx) {
            Poll::Ready((Some(intent), rx)) => {
                self.fut = Some(recv_next(rx));
                Poll::Ready(intent)
            }
            Poll::Ready((None, _)) => {
                // every sender is gone, nothing more will arrive
                self.fut = None;
                Poll::Pending
            }
            Poll::Pending => Poll::Pending,
        }
    }
}
