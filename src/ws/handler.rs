//! WebSocket upgrade handler

use axum::{
    extract::{
        ws::{Message, WebSocket, WebSocketUpgrade},
        Query, State,
    },
    response::Response,
};
use futures::{SinkExt, Stream, StreamExt};
use serde::Deserialize;
use tracing::{debug, error, info, warn};

use crate::app::AppState;
use crate::game::{EngineEvent, EngineHandle};
use crate::ws::protocol::{ClientMsg, ServerMsg};
use crate::ws::transport::{ConnectionId, Outbox, OutboxReceiver};

/// Query parameters for WebSocket connection
#[derive(Debug, Deserialize)]
pub struct WsQuery {
    /// Join immediately under this name instead of waiting for `join`
    pub username: Option<String>,
}

/// WebSocket upgrade handler
pub async fn ws_handler(
    ws: WebSocketUpgrade,
    Query(query): Query<WsQuery>,
    State(state): State<AppState>,
) -> Response {
    ws.on_upgrade(move |socket| handle_socket(socket, query.username, state.engine))
}

/// Handle the upgraded WebSocket connection
async fn handle_socket(socket: WebSocket, username: Option<String>, engine: EngineHandle) {
    let connection_id = ConnectionId::new();
    info!(connection_id = %connection_id, "New WebSocket connection");

    let (outbox, outbox_rx) = Outbox::channel(connection_id);
    engine.send(EngineEvent::Connected { outbox });

    if let Some(join) = auto_join(connection_id, username) {
        engine.send(join);
    }

    run_session(connection_id, socket, &engine, outbox_rx).await;

    // Cleanup on disconnect
    engine.send(EngineEvent::Disconnected { connection_id });

    info!(connection_id = %connection_id, "WebSocket connection closed");
}

/// Join on behalf of a client that named itself in the upgrade URL
fn auto_join(connection_id: ConnectionId, username: Option<String>) -> Option<EngineEvent> {
    username.map(|username| EngineEvent::Client {
        connection_id,
        msg: ClientMsg::Join {
            username: Some(username),
        },
    })
}

/// Run the WebSocket session with read/write split
async fn run_session(
    connection_id: ConnectionId,
    socket: WebSocket,
    engine: &EngineHandle,
    mut outbox_rx: OutboxReceiver,
) {
    let (mut ws_sink, ws_stream) = socket.split();

    // Spawn writer task: engine events -> WebSocket
    let writer_handle = tokio::spawn(async move {
        while let Some(msg) = outbox_rx.recv().await {
            if let Err(e) = send_msg(&mut ws_sink, &msg).await {
                debug!(connection_id = %connection_id, error = %e, "WebSocket send failed");
                break;
            }
        }
    });

    read_frames(connection_id, ws_stream, engine).await;

    // Abort writer task
    writer_handle.abort();
}

/// What the reader loop does with one inbound frame
#[derive(Debug)]
enum Inbound {
    Forward(EngineEvent),
    Ignore,
    Close,
}

/// Reader loop: WebSocket -> engine, until close or a transport error
async fn read_frames<S>(connection_id: ConnectionId, mut frames: S, engine: &EngineHandle)
where
    S: Stream<Item = Result<Message, axum::Error>> + Unpin,
{
    while let Some(result) = frames.next().await {
        let frame = match result {
            Ok(frame) => frame,
            Err(e) => {
                error!(connection_id = %connection_id, error = %e, "WebSocket error");
                break;
            }
        };

        match classify_frame(connection_id, frame) {
            Inbound::Forward(event) => engine.send(event),
            Inbound::Ignore => {}
            Inbound::Close => break,
        }
    }
}

fn classify_frame(connection_id: ConnectionId, frame: Message) -> Inbound {
    match frame {
        Message::Text(text) => match serde_json::from_str::<ClientMsg>(&text) {
            Ok(msg) => Inbound::Forward(EngineEvent::Client { connection_id, msg }),
            Err(e) => {
                warn!(
                    connection_id = %connection_id,
                    error = %e,
                    "Failed to parse client message"
                );
                Inbound::Ignore
            }
        },
        Message::Binary(_) => {
            warn!(connection_id = %connection_id, "Received binary message, ignoring");
            Inbound::Ignore
        }
        Message::Ping(_) => {
            debug!(connection_id = %connection_id, "Received ping");
            Inbound::Ignore
        }
        Message::Pong(_) => {
            debug!(connection_id = %connection_id, "Received pong");
            Inbound::Ignore
        }
        Message::Close(_) => {
            info!(connection_id = %connection_id, "Client initiated close");
            Inbound::Close
        }
    }
}

/// Send a message over WebSocket
async fn send_msg(
    sink: &mut futures::stream::SplitSink<WebSocket, Message>,
    msg: &ServerMsg,
) -> Result<(), String> {
    let json = serde_json::to_string(msg).map_err(|e| e.to_string())?;
    sink.send(Message::Text(json))
        .await
        .map_err(|e| e.to_string())
}
