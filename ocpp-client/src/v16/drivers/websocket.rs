#[cfg(feature = "async")]
use core::{future::Future, mem, pin::Pin, task::{Context, Poll}};

#[cfg(feature = "tokio_ws")]
use {tokio_tungstenite::{connect_async, WebSocketStream, MaybeTlsStream, tungstenite::{client::IntoClientRequest, http::{header::SEC_WEBSOCKET_PROTOCOL, HeaderValue}, Message}}, tokio::net::TcpStream, futures_util::{stream::StreamExt, Sink, SinkExt}};

#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum TransportError {
    #[error("connect failed: {0}")]
    Connect(String),
    #[error("send failed: {0}")]
    Send(String),
    #[error("transport is not connected")]
    NotConnected,
}

/// Text-frame transport toward the central system.
///
/// `poll_recv` yields `None` once the connection is gone.
#[cfg(feature = "async")]
#[async_trait::async_trait]
pub trait WebsocketTransport: Send + Unpin + 'static {
    async fn connect(&mut self, url: String) -> Result<(), TransportError>;
    fn poll_recv(&mut self, cx: &mut Context<'_>) -> Poll<Option<String>>;
    async fn send(&mut self, msg: String) -> Result<(), TransportError>;
    async fn close(&mut self);
}

#[cfg(feature = "async")]
type ConnectFuture<W> = Pin<Box<dyn Future<Output = (W, Result<(), TransportError>)> + Send>>;

#[cfg(feature = "async")]
enum WebsocketStage<W: WebsocketTransport> {
    Idle(W),
    Connecting(ConnectFuture<W>),
    Connected(W),
    Empty,
}

#[cfg(feature = "async")]
#[derive(Debug)]
pub enum WebsocketResponse {
    Connected,
    ConnectFailed(TransportError),
    Disconnected,
    WsMsg(String),
}

#[cfg(feature = "async")]
pub(crate) struct WebsocketClient<W: WebsocketTransport> {
    state: WebsocketStage<W>,
}

#[cfg(feature = "async")]
impl<W: WebsocketTransport> WebsocketClient<W> {
    pub fn new(ws: W) -> Self {
        Self {
            state: WebsocketStage::Idle(ws),
        }
    }

    pub fn connect(&mut self, url: String) {
        let ws = match mem::replace(&mut self.state, WebsocketStage::Empty) {
            WebsocketStage::Idle(ws) | WebsocketStage::Connected(ws) => ws,
            other => {
                log::warn!("connect requested while a connection attempt is running");
                self.state = other;
                return;
            }
        };
        let future = async move {
            let mut ws = ws;
            let res = ws.connect(url).await;
            (ws, res)
        };
        self.state = WebsocketStage::Connecting(Box::pin(future));
    }

    pub async fn close_connection(&mut self) {
        match mem::replace(&mut self.state, WebsocketStage::Empty) {
            WebsocketStage::Idle(ws) => {
                self.state = WebsocketStage::Idle(ws);
            }
            WebsocketStage::Connecting(fut) => {
                let (mut ws, res) = fut.await;
                if res.is_ok() {
                    ws.close().await;
                }
                self.state = WebsocketStage::Idle(ws);
            }
            WebsocketStage::Connected(mut ws) => {
                ws.close().await;
                self.state = WebsocketStage::Idle(ws);
            }
            WebsocketStage::Empty => {}
        }
    }

    pub async fn send_msg(&mut self, msg: String) -> Result<(), TransportError> {
        match &mut self.state {
            WebsocketStage::Connected(ws) => ws.send(msg).await,
            _ => Err(TransportError::NotConnected),
        }
    }
}

#[cfg(feature = "async")]
impl<W: WebsocketTransport> Future for WebsocketClient<W> {
    type Output = WebsocketResponse;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        match &mut this.state {
            WebsocketStage::Idle(_) | WebsocketStage::Empty => Poll::Pending,
            WebsocketStage::Connecting(fut) => match fut.as_mut().poll(cx) {
                Poll::Ready((ws, Ok(()))) => {
                    this.state = WebsocketStage::Connected(ws);
                    Poll::Ready(WebsocketResponse::Connected)
                }
                Poll::Ready((ws, Err(e))) => {
                    this.state = WebsocketStage::Idle(ws);
                    Poll::Ready(WebsocketResponse::ConnectFailed(e))
                }
                Poll::Pending => Poll::Pending,
            },
            WebsocketStage::Connected(ws) => match ws.poll_recv(cx) {
                Poll::Pending => Poll::Pending,
                Poll::Ready(Some(msg)) => Poll::Ready(WebsocketResponse::WsMsg(msg)),
                Poll::Ready(None) => {
                    if let WebsocketStage::Connected(ws) = mem::replace(&mut this.state, WebsocketStage::Empty) {
                        this.state = WebsocketStage::Idle(ws);
                    }
                    Poll::Ready(WebsocketResponse::Disconnected)
                }
            },
        }
    }
}

#[cfg(feature = "tokio_ws")]
pub struct TokioWsClient {
    socket: Option<WebSocketStream<MaybeTlsStream<TcpStream>>>,
}

#[cfg(feature = "tokio_ws")]
impl TokioWsClient {
    pub fn new() -> Self {
        Self { socket: None }
    }
}

#[cfg(feature = "tokio_ws")]
impl Default for TokioWsClient {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(feature = "tokio_ws")]
#[async_trait::async_trait]
impl WebsocketTransport for TokioWsClient {
    async fn connect(&mut self, url: String) -> Result<(), TransportError> {
        log::debug!("connecting to url: {}", url);
        let mut req = url
            .into_client_request()
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        req.headers_mut()
            .insert(SEC_WEBSOCKET_PROTOCOL, HeaderValue::from_static("ocpp1.6"));
        let (socket, _) = connect_async(req)
            .await
            .map_err(|e| TransportError::Connect(e.to_string()))?;
        self.socket = Some(socket);
        Ok(())
    }

    fn poll_recv(&mut self, cx: &mut Context<'_>) -> Poll<Option<String>> {
        let socket = match self.socket.as_mut() {
            Some(sock) => sock,
            None => return Poll::Ready(None),
        };
        loop {
            match socket.poll_next_unpin(cx) {
                Poll::Ready(Some(Ok(Message::Ping(payload)))) => {
                    let mut sink = Pin::new(&mut *socket);
                    if let Poll::Ready(Ok(())) = sink.as_mut().poll_ready(cx) {
                        if let Err(e) = sink.as_mut().start_send(Message::Pong(payload)) {
                            log::trace!("pong not sent: {}", e);
                        } else if let Poll::Ready(Err(e)) = sink.as_mut().poll_flush(cx) {
                            log::trace!("pong not flushed: {}", e);
                        }
                    }
                    continue;
                }
                Poll::Ready(Some(Ok(Message::Pong(_)))) => continue,
                Poll::Ready(Some(Ok(Message::Text(s)))) => return Poll::Ready(Some(s.to_string())),
                Poll::Ready(Some(Ok(_))) | Poll::Ready(Some(Err(_))) | Poll::Ready(None) => {
                    self.socket = None;
                    return Poll::Ready(None);
                }
                Poll::Pending => return Poll::Pending,
            }
        }
    }

    async fn send(&mut self, msg: String) -> Result<(), TransportError> {
        match &mut self.socket {
            Some(socket) => socket
                .send(Message::Text(msg.into()))
                .await
                .map_err(|e| TransportError::Send(e.to_string())),
            None => Err(TransportError::NotConnected),
        }
    }

    async fn close(&mut self) {
        if let Some(mut socket) = self.socket.take() {
            let _ = socket.close(None).await;
        }
    }
}

#[cfg(all(test, feature = "tokio_ws"))]
mod tests {
    use futures::future::poll_fn;
    use tokio::net::TcpListener;
    use tokio_tungstenite::{
        accept_hdr_async,
        tungstenite::handshake::server::{ErrorResponse, Request, Response},
    };

    use super::*;

    fn select_ocpp(_req: &Request, mut res: Response) -> Result<Response, ErrorResponse> {
        res.headers_mut()
            .insert(SEC_WEBSOCKET_PROTOCOL, HeaderValue::from_static("ocpp1.6"));
        Ok(res)
    }

    #[tokio::test]
    async fn answers_pings_and_keeps_reading() {
        let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
        let addr = listener.local_addr().unwrap();
        let server = tokio::spawn(async move {
            let (stream, _) = listener.accept().await.unwrap();
            let mut ws = accept_hdr_async(stream, select_ocpp).await.unwrap();
            ws.send(Message::Ping(b"hb".to_vec().into())).await.unwrap();
            ws.send(Message::Text("[2,\"1\",\"Heartbeat\",{}]".into()))
                .await
                .unwrap();
            loop {
                match ws.next().await {
                    Some(Ok(Message::Pong(payload))) => return payload,
                    Some(Ok(_)) => continue,
                    other => panic!("expected a pong, got {:?}", other),
                }
            }
        });

        let mut client = TokioWsClient::new();
        client.connect(format!("ws://{}", addr)).await.unwrap();
        let text = poll_fn(|cx| client.poll_recv(cx)).await;
        assert_eq!(text.as_deref(), Some("[2,\"1\",\"Heartbeat\",{}]"));

        let pong = server.await.unwrap();
        assert_eq!(&pong[..], b"hb");
        client.close().await;
    }
}
