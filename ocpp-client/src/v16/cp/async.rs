use std::collections::VecDeque;

use core::task::Poll;

use futures::FutureExt;

use crate::v16::{
    drivers::{
        shutdown::{ShutdownDriver, ShutdownSignal},
        timers::{TimerDriver, TimerManager},
        ui::UiAdapter,
        user_input::{UserInput, UserInputDriver},
        websocket::{WebsocketClient, WebsocketResponse, WebsocketTransport},
    },
    state_machine::actions::CoreActions,
};

use super::{
    config::{ChargePointConfig, ConfigError},
    core::ChargePointCore,
};

/// Drives a [`ChargePointCore`] from a websocket transport, a timer
/// manager, user input and a shutdown signal.
pub struct ChargePointAsync<
    WS: WebsocketTransport,
    TI: TimerManager,
    UI: UiAdapter,
    IN: UserInput,
    ST: ShutdownSignal,
> {
    core: ChargePointCore<UI>,
    ws: WebsocketClient<WS>,
    timer: TimerDriver<TI>,
    input: UserInputDriver<IN>,
    shutdown: ShutdownDriver<ST>,
}

impl<WS: WebsocketTransport, TI: TimerManager, UI: UiAdapter, IN: UserInput, ST: ShutdownSignal>
    ChargePointAsync<WS, TI, UI, IN, ST>
{
    pub fn new(
        ws: WS,
        timer: TI,
        ui: UI,
        input: IN,
        shutdown: ST,
        config: ChargePointConfig,
    ) -> Result<Self, ConfigError> {
        Ok(Self {
            core: ChargePointCore::new(ui, config)?,
            ws: WebsocketClient::new(ws),
            timer: TimerDriver::new(timer),
            input: UserInputDriver::new(input),
            shutdown: ShutdownDriver::new(shutdown),
        })
    }

    /// Runs until the shutdown signal fires, then hands the core back.
    pub async fn run(mut self) -> ChargePointCore<UI> {
        let mut pending: VecDeque<CoreActions> = self.core.start().into();
        loop {
            self.execute_all(&mut pending).await;
            let (actions, shutdown) = {
                let Self {
                    core,
                    ws,
                    timer,
                    input,
                    shutdown,
                } = &mut self;
                futures::future::poll_fn(|cx| {
                    if let Poll::Ready(()) = shutdown.poll_unpin(cx) {
                        return Poll::Ready((Vec::new(), true));
                    }
                    if let Poll::Ready(intent) = input.poll_unpin(cx) {
                        log::info!("user intent {:?}", intent);
                        return Poll::Ready((core.user_intent(intent), false));
                    }
                    if let Poll::Ready(msg) = ws.poll_unpin(cx) {
                        let actions = match msg {
                            WebsocketResponse::Connected => {
                                log::info!("ws connected");
                                core.ws_connected()
                            }
                            WebsocketResponse::ConnectFailed(e) => {
                                log::info!("ws connect failed: {}", e);
                                core.ws_connect_failed(e)
                            }
                            WebsocketResponse::Disconnected => {
                                log::info!("ws disconnected");
                                core.ws_disconnected()
                            }
                            WebsocketResponse::WsMsg(msg) => {
                                log::info!("[MSG_IN] {}", msg);
                                core.got_ws_msg(msg)
                            }
                        };
                        return Poll::Ready((actions, false));
                    }
                    if let Poll::Ready(id) = timer.poll_unpin(cx) {
                        log::trace!("id timedout: {:?}", id);
                        return Poll::Ready((core.handle_timeout(id), false));
                    }
                    Poll::Pending
                })
                .await
            };
            if shutdown {
                log::info!("shutting down");
                pending.extend(self.core.stop());
                self.execute_all(&mut pending).await;
                break;
            }
            pending.extend(actions);
        }
        self.core
    }

    /// Executes actions in order. Follow-ups from a failed send run before
    /// the rest of the batch.
    async fn execute_all(&mut self, pending: &mut VecDeque<CoreActions>) {
        while let Some(action) = pending.pop_front() {
            let follow_up = self.execute(action).await;
            for action in follow_up.into_iter().rev() {
                pending.push_front(action);
            }
        }
    }

    async fn execute(&mut self, action: CoreActions) -> Vec<CoreActions> {
        match action {
            CoreActions::Connect(url) => {
                log::debug!("connect, url: {}", url);
                self.ws.connect(url);
            }
            CoreActions::SendWsMsg(msg) => {
                log::info!("[MSG_OUT] {}", msg);
                if let Err(e) = self.ws.send_msg(msg).await {
                    return self.core.ws_send_failed(e);
                }
            }
            CoreActions::CloseConnection => {
                log::debug!("close connection");
                self.ws.close_connection().await;
            }
            CoreActions::AddTimeout(id, secs) => {
                log::trace!("add timeout, id: {:?}, secs: {}", id, secs);
                self.timer.add_or_update(id, secs);
            }
            CoreActions::RemoveTimeout(id) => {
                log::trace!("remove timeout, id: {:?}", id);
                self.timer.remove_timeout(id);
            }
            CoreActions::RemoveAllTimeouts => {
                log::trace!("remove all timeouts");
                self.timer.remove_all_timeouts();
            }
        }
        Vec::new()
    }
}
