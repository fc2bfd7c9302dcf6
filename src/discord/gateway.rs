//! GatewayActor - Keeps one Discord gateway session alive for presence updates
//!
//! The bot only needs the gateway to show a status line, so the session is minimal:
//! Hello, Identify, heartbeats, and presence updates. Anything that ends the session
//! (reconnect request, invalid session, close frame, missed heartbeat ack) leads to a
//! fresh Identify after a short pause. The last requested presence is remembered and
//! sent again once the new session is READY.
//!
//! Close codes that no new session can fix (bad token, bad intents) stop the actor
//! instead; presence updates fail from then on.

use std::time::Duration;

use anyhow::{Context, Result, bail};
use futures::{Sink, SinkExt, Stream, StreamExt};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{Instant, MissedTickBehavior, interval_at, sleep, timeout};
use tokio_tungstenite::{
    connect_async,
    tungstenite::{Error as WsError, Message},
};
use tracing::{debug, error, info, instrument, trace, warn};

use crate::{
    actors::messages::GatewayCommand,
    error::{ChatError, ChatResult},
};

use super::types::{self, GatewayPayload, Hello, Presence, opcode};

/// Pause before opening a new session
pub const RECONNECT_DELAY: Duration = Duration::from_secs(5);

/// Authentication failed, invalid shard, sharding required, invalid API version,
/// invalid intents, disallowed intents
pub const FATAL_CLOSE_CODES: [u16; 6] = [4004, 4010, 4011, 4012, 4013, 4014];

enum SessionEnd {
    Reconnect(&'static str),
    Fatal(u16),
    Shutdown,
}

enum Frame {
    Payload(GatewayPayload),
    Closed(Option<u16>),
}

fn closed(code: Option<u16>) -> SessionEnd {
    match code {
        Some(code) if FATAL_CLOSE_CODES.contains(&code) => SessionEnd::Fatal(code),
        _ => SessionEnd::Reconnect("connection closed"),
    }
}

pub struct GatewayActor {
    token: String,
    url: String,
    command_rx: mpsc::Receiver<GatewayCommand>,

    /// Bound for connecting and for waiting on Hello
    timeout: Duration,

    /// Last presence asked for, replayed on every new session
    presence: Option<Presence>,
}

impl GatewayActor {
    pub fn new(
        token: String,
        url: String,
        timeout: Duration,
        command_rx: mpsc::Receiver<GatewayCommand>,
    ) -> Self {
        Self {
            token,
            url,
            command_rx,
            timeout,
            presence: None,
        }
    }

    #[instrument(skip(self), fields(url = %self.url))]
    pub async fn run(mut self) {
        loop {
            match self.session().await {
                Ok(SessionEnd::Shutdown) => break,
                Ok(SessionEnd::Fatal(code)) => {
                    error!("gateway closed the session with code {code}, not reconnecting");
                    break;
                }
                Ok(SessionEnd::Reconnect(reason)) => {
                    info!("gateway session ended ({reason}), reconnecting in {}s", RECONNECT_DELAY.as_secs());
                }
                Err(e) => {
                    warn!("gateway error: {e:#}, reconnecting in {}s", RECONNECT_DELAY.as_secs());
                }
            }

            if !self.wait_for_reconnect().await {
                break;
            }
        }

        debug!("gateway stopped");
    }

    async fn session(&mut self) -> Result<SessionEnd> {
        let (stream, _) = timeout(self.timeout, connect_async(self.url.as_str()))
            .await
            .context("timed out connecting to gateway")?
            .context("failed to connect to gateway")?;
        let (mut write, mut read) = stream.split();

        let hello = match timeout(self.timeout, next_frame(&mut read))
            .await
            .context("no Hello from gateway")??
        {
            Frame::Payload(payload) if payload.op == opcode::HELLO => payload,
            Frame::Payload(payload) => bail!("expected Hello, got op {}", payload.op),
            Frame::Closed(code) => return Ok(closed(code)),
        };
        let hello: Hello = serde_json::from_value(hello.d).context("invalid Hello payload")?;
        let period = Duration::from_millis(hello.heartbeat_interval.max(1));

        send(&mut write, types::identify(&self.token, self.presence.as_ref())).await?;
        debug!("identified, heartbeat every {}ms", period.as_millis());

        let mut heartbeat = interval_at(Instant::now() + period, period);
        heartbeat.set_missed_tick_behavior(MissedTickBehavior::Delay);
        let mut sequence: Option<u64> = None;
        let mut awaiting_ack = false;

        loop {
            tokio::select! {
                _ = heartbeat.tick() => {
                    if awaiting_ack {
                        return Ok(SessionEnd::Reconnect("heartbeat not acknowledged"));
                    }
                    send(&mut write, types::heartbeat(sequence)).await?;
                    awaiting_ack = true;
                }

                frame = next_frame(&mut read) => {
                    let payload = match frame? {
                        Frame::Payload(payload) => payload,
                        Frame::Closed(code) => return Ok(closed(code)),
                    };
                    if payload.s.is_some() {
                        sequence = payload.s;
                    }

                    match payload.op {
                        opcode::DISPATCH if payload.t.as_deref() == Some("READY") => {
                            info!("gateway session ready");
                            if let Some(presence) = &self.presence {
                                send(&mut write, types::presence_update(presence)).await?;
                            }
                        }
                        opcode::HEARTBEAT => {
                            send(&mut write, types::heartbeat(sequence)).await?;
                        }
                        opcode::HEARTBEAT_ACK => awaiting_ack = false,
                        opcode::RECONNECT => return Ok(SessionEnd::Reconnect("reconnect requested")),
                        opcode::INVALID_SESSION => return Ok(SessionEnd::Reconnect("invalid session")),
                        op => trace!("ignoring op {op} {:?}", payload.t),
                    }
                }

                cmd = self.command_rx.recv() => match cmd {
                    Some(GatewayCommand::UpdatePresence { presence, respond_to }) => {
                        let sent = send(&mut write, types::presence_update(&presence)).await;
                        self.presence = Some(presence);

                        let lost = sent.is_err();
                        let _ = respond_to.send(sent.map_err(|e| ChatError::Transport(e.to_string())));
                        if lost {
                            return Ok(SessionEnd::Reconnect("presence update failed"));
                        }
                    }

                    Some(GatewayCommand::Shutdown) | None => {
                        let _ = write.send(Message::Close(None)).await;
                        return Ok(SessionEnd::Shutdown);
                    }
                }
            }
        }
    }

    /// Sit out the reconnect delay while still answering commands
    ///
    /// Returns false when the actor should stop instead of reconnecting.
    async fn wait_for_reconnect(&mut self) -> bool {
        let delay = sleep(RECONNECT_DELAY);
        tokio::pin!(delay);

        loop {
            tokio::select! {
                _ = &mut delay => return true,

                cmd = self.command_rx.recv() => match cmd {
                    Some(GatewayCommand::UpdatePresence { presence, respond_to }) => {
                        self.presence = Some(presence);
                        let _ = respond_to.send(Err(ChatError::Transport(
                            "gateway disconnected".to_string(),
                        )));
                    }
                    Some(GatewayCommand::Shutdown) | None => return false,
                }
            }
        }
    }
}

async fn next_frame<S>(read: &mut S) -> Result<Frame>
where
    S: Stream<Item = Result<Message, WsError>> + Unpin,
{
    while let Some(message) = read.next().await {
        match message.context("gateway read failed")? {
            Message::Text(text) => match serde_json::from_str(&text) {
                Ok(payload) => return Ok(Frame::Payload(payload)),
                Err(e) => warn!("unparseable gateway frame: {e}"),
            },
            Message::Close(frame) => {
                debug!("gateway closed: {frame:?}");
                return Ok(Frame::Closed(frame.map(|frame| u16::from(frame.code))));
            }
            _ => {}
        }
    }

    Ok(Frame::Closed(None))
}

async fn send<S>(write: &mut S, payload: Value) -> Result<()>
where
    S: Sink<Message, Error = WsError> + Unpin,
{
    write
        .send(Message::Text(payload.to_string()))
        .await
        .context("gateway write failed")
}

/// Handle for controlling a GatewayActor
#[derive(Clone)]
pub struct GatewayHandle {
    sender: mpsc::Sender<GatewayCommand>,
}

impl GatewayHandle {
    /// Spawn the actor; `timeout` bounds connecting and the wait for Hello
    pub fn spawn(token: impl Into<String>, url: impl Into<String>, timeout: Duration) -> Self {
        let (cmd_tx, cmd_rx) = mpsc::channel(16);
        let actor = GatewayActor::new(token.into(), url.into(), timeout, cmd_rx);

        tokio::spawn(actor.run());

        Self { sender: cmd_tx }
    }

    pub async fn update_presence(&self, presence: Presence) -> ChatResult<()> {
        let (tx, rx) = oneshot::channel();
        self.sender
            .send(GatewayCommand::UpdatePresence {
                presence,
                respond_to: tx,
            })
            .await
            .map_err(|_| ChatError::Transport("gateway stopped".to_string()))?;

        rx.await
            .map_err(|_| ChatError::Transport("gateway stopped".to_string()))?
    }

    pub async fn shutdown(&self) {
        let _ = self.sender.send(GatewayCommand::Shutdown).await;
    }
}
