use std::{
    pin::Pin,
    task::{Context, Poll},
};

use cpsim_client::v16::{TransportError, WebsocketTransport};
use cpsim_core::{
    format::{
        frame::{Call, CallResult, Frame},
        message::EncodeDecode,
    },
    v16::protocol_error::ProtocolError,
};
use flume::{r#async::RecvFut, unbounded, Receiver, Sender};
use futures::FutureExt;
use serde::{de::DeserializeOwned, Serialize};

#[derive(Debug)]
pub enum ServerEvent {
    Connected(String),
    Frame(String),
    Closed,
}

/// Transport whose other end is a [`MockServer`].
pub struct MockWs {
    events: Sender<ServerEvent>,
    inbox: Receiver<Option<String>>,
    recv: Option<Pin<Box<RecvFut<'static, Option<String>>>>>,
    connected: bool,
}

pub struct MockServer {
    events: Receiver<ServerEvent>,
    outbox: Sender<Option<String>>,
    next_uid: u64,
}

pub fn mock_ws() -> (MockWs, MockServer) {
    let (events_tx, events_rx) = unbounded();
    let (outbox_tx, outbox_rx) = unbounded();
    (
        MockWs {
            events: events_tx,
            inbox: outbox_rx,
            recv: None,
            connected: false,
        },
        MockServer {
            events: events_rx,
            outbox: outbox_tx,
            next_uid: 0,
        },
    )
}

#[async_trait::async_trait]
impl WebsocketTransport for MockWs {
    async fn connect(&mut self, url: String) -> Result<(), TransportError> {
        // frames left over from a previous connection are gone with it
        while self.inbox.try_recv().is_ok() {}
        self.recv = None;
        self.connected = true;
        let _ = self.events.send(ServerEvent::Connected(url));
        Ok(())
    }

    fn poll_recv(&mut self, cx: &mut Context<'_>) -> Poll<Option<String>> {
        if !self.connected {
            return Poll::Ready(None);
        }
        let inbox = self.inbox.clone();
        let fut = self
            .recv
            .get_or_insert_with(|| Box::pin(inbox.into_recv_async()));
        match fut.poll_unpin(cx) {
            Poll::Ready(res) => {
                self.recv = None;
                match res {
                    Ok(Some(msg)) => Poll::Ready(Some(msg)),
                    Ok(None) | Err(_) => {
                        self.connected = false;
                        Poll::Ready(None)
                    }
                }
            }
            Poll::Pending => Poll::Pending,
        }
    }

    async fn send(&mut self, msg: String) -> Result<(), TransportError> {
        if !self.connected {
            return Err(TransportError::NotConnected);
        }
        self.events
            .send(ServerEvent::Frame(msg))
            .map_err(|e| TransportError::Send(e.to_string()))
    }

    async fn close(&mut self) {
        self.connected = false;
        self.recv = None;
        let _ = self.events.send(ServerEvent::Closed);
    }
}

impl MockServer {
    pub async fn next_event(&mut self) -> ServerEvent {
        self.events.recv_async().await.unwrap()
    }

    pub async fn expect_connect(&mut self) -> String {
        match self.next_event().await {
            ServerEvent::Connected(url) => url,
            other => panic!("expected connect, got {:?}", other),
        }
    }

    pub async fn expect_closed(&mut self) {
        match self.next_event().await {
            ServerEvent::Closed => {}
            other => panic!("expected close, got {:?}", other),
        }
    }

    pub async fn next_frame(&mut self) -> Frame<ProtocolError> {
        match self.next_event().await {
            ServerEvent::Frame(msg) => Frame::decode(&msg).unwrap(),
            other => panic!("expected a frame, got {:?}", other),
        }
    }

    pub async fn expect_call<T: DeserializeOwned>(&mut self, action: &str) -> (String, T) {
        match self.next_frame().await {
            Frame::Call(call) => {
                assert_eq!(call.action, action, "unexpected call {:?}", call);
                (call.unique_id, serde_json::from_value(call.payload).unwrap())
            }
            other => panic!("expected {} call, got {:?}", action, other),
        }
    }

    pub async fn expect_result<T: DeserializeOwned>(&mut self, unique_id: &str) -> T {
        match self.next_frame().await {
            Frame::CallResult(res) => {
                assert_eq!(res.unique_id, unique_id);
                serde_json::from_value(res.payload).unwrap()
            }
            other => panic!("expected result for {}, got {:?}", unique_id, other),
        }
    }

    pub fn respond<T: Serialize>(&self, unique_id: &str, payload: T) {
        let msg = CallResult::new(unique_id.to_string(), payload).encode();
        self.outbox.send(Some(msg)).unwrap();
    }

    pub fn send_call<T: Serialize>(&mut self, action: &str, payload: T) -> String {
        self.next_uid += 1;
        let unique_id = format!("srv-{}", self.next_uid);
        let msg = Call::new(unique_id.clone(), action, payload).encode();
        self.outbox.send(Some(msg)).unwrap();
        unique_id
    }

    /// Drops the connection from the server side.
    pub fn drop_connection(&self) {
        self.outbox.send(None).unwrap();
    }
}
