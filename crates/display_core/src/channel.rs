//! Websocket channel from the arena server to the audience display.

use std::sync::Arc;

use anyhow::{anyhow, bail, Context, Result};
use futures::StreamExt;
use shared::{domain::Screen, protocol::ServerMessage};
use tokio::task::JoinHandle;
use tokio_tungstenite::{connect_async, tungstenite::Message};
use tracing::{debug, info, warn};
use url::Url;

use crate::Orchestrator;

pub const AUDIENCE_DISPLAY_PATH: &str = "/displays/audience/websocket";

/// What a single server message resulted in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dispatch {
    ScreenRequested(Screen),
    Rejected(String),
    Reload,
    ServerError(String),
    Ignored,
}

/// How the channel's reader task ended.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChannelExit {
    Closed,
    ReloadRequested,
    Failed(String),
}

pub fn websocket_url(server_url: &str, display_id: Option<&str>) -> Result<Url> {
    let mut url =
        Url::parse(server_url).with_context(|| format!("invalid server url: {server_url}"))?;
    let scheme = match url.scheme() {
        "http" | "ws" => "ws",
        "https" | "wss" => "wss",
        other => bail!("server_url must be http(s) or ws(s), got '{other}'"),
    };
    url.set_scheme(scheme)
        .map_err(|()| anyhow!("cannot use scheme {scheme} for {server_url}"))?;
    url.set_path(AUDIENCE_DISPLAY_PATH);
    url.set_query(None);
    if let Some(display_id) = display_id {
        url.query_pairs_mut().append_pair("displayId", display_id);
    }
    Ok(url)
}

/// Applies one server message to the orchestrator.
pub fn dispatch_message(orchestrator: &Arc<Orchestrator>, message: ServerMessage) -> Dispatch {
    match message {
        ServerMessage::AudienceDisplayMode(name) => match orchestrator.request_screen_named(&name) {
            Ok(screen) => Dispatch::ScreenRequested(screen),
            Err(_) => Dispatch::Rejected(name),
        },
        ServerMessage::Reload => {
            info!("server requested a display reload");
            Dispatch::Reload
        }
        ServerMessage::ServerError(message) => {
            warn!(%message, "server reported an error");
            Dispatch::ServerError(message)
        }
        ServerMessage::Other { message_type, .. } => {
            debug!(%message_type, "ignoring message not handled by the display core");
            Dispatch::Ignored
        }
    }
}

pub struct CommandChannel {
    reader: JoinHandle<ChannelExit>,
}

impl CommandChannel {
    pub async fn connect(url: &Url, orchestrator: Arc<Orchestrator>) -> Result<Self> {
        let (ws_stream, _) = connect_async(url.as_str())
            .await
            .with_context(|| format!("failed to connect websocket: {url}"))?;
        info!(%url, "connected to display websocket");
        let (_, mut ws_reader) = ws_stream.split();

        let reader = tokio::spawn(async move {
            while let Some(msg) = ws_reader.next().await {
                match msg {
                    Ok(Message::Text(text)) => match ServerMessage::parse(&text) {
                        Ok(message) => {
                            if dispatch_message(&orchestrator, message) == Dispatch::Reload {
                                return ChannelExit::ReloadRequested;
                            }
                        }
                        Err(err) => warn!(%err, "invalid server message"),
                    },
                    Ok(Message::Close(_)) => break,
                    Ok(_) => {}
                    Err(err) => {
                        warn!(%err, "websocket receive failed");
                        return ChannelExit::Failed(err.to_string());
                    }
                }
            }
            ChannelExit::Closed
        });

        Ok(Self { reader })
    }

    /// Waits for the reader task to finish.
    pub async fn run(self) -> Result<ChannelExit> {
        self.reader.await.context("display websocket reader panicked")
    }

    pub fn abort(&self) {
        self.reader.abort();
    }
}

#[cfg(test)]
#[path = "tests/channel_tests.rs"]
mod tests;
