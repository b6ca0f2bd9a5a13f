//! WebSocket connection handlers.
//!
//! One socket maps to one `RelaySession`:
//!
//! 1. Handshake: the credential comes from `?token=`, an `Authorization: Bearer`
//!    header, or an `authenticate` first frame within the handshake timeout.
//!    The whole handshake, identity verification included, must finish within
//!    that timeout. A failed handshake closes the socket with code 4401 before
//!    any event is processed.
//! 2. A writer task drains the connection's outbound queue into the socket.
//! 3. The reader loop decodes frames into session events until the client
//!    leaves, the writer fails, or the relay kicks a stuck connection.
//! 4. `RelaySession::close` runs the teardown exactly once.

use std::{sync::Arc, time::Duration};

use axum::{
    extract::{
        Query, State,
        ws::{CloseFrame, Message, Utf8Bytes, WebSocket, WebSocketUpgrade},
    },
    http::HeaderMap,
    response::IntoResponse,
};
use futures_util::{
    sink::SinkExt,
    stream::{SplitSink, StreamExt},
};
use serde::Deserialize;
use tokio::{sync::mpsc, task::JoinHandle, time::Instant};

use crate::{
    domain::{Credential, SessionEvent},
    infrastructure::dto::{conversion::ClientFrame, websocket::ClientEvent},
    ui::state::AppState,
    usecase::{RelayError, RelaySession},
};

use super::bearer_credential;

/// Application close code for a rejected handshake
const UNAUTHORIZED_CLOSE_CODE: u16 = 4401;

/// Query parameters for WebSocket connection
#[derive(Debug, Default, Deserialize)]
pub struct ConnectQuery {
    pub token: Option<String>,
}

pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    State(state): State<Arc<AppState>>,
    Query(query): Query<ConnectQuery>,
    headers: HeaderMap,
) -> impl IntoResponse {
    let credential = query
        .token
        .and_then(|token| Credential::new(token).ok())
        .or_else(|| bearer_credential(&headers));

    ws.on_upgrade(move |socket| handle_socket(socket, state, credential))
}

async fn handle_socket(mut socket: WebSocket, state: Arc<AppState>, credential: Option<Credential>) {
    let (tx, rx) = mpsc::channel(state.config.outbound_queue_capacity);
    let mut session = RelaySession::open(Arc::clone(&state.services), tx).await;
    let connection_id = session.connection().id();

    // 1. Handshake
    let pending = match handshake(&mut socket, &mut session, credential, &state).await {
        Ok(pending) => pending,
        Err(e) => {
            session.close().await;
            if matches!(e, RelayError::AuthenticationFailure(_)) {
                close_unauthorized(socket).await;
            }
            return;
        }
    };

    // 2. Writer
    let (sender, mut receiver) = socket.split();
    let mut send_task = pusher_loop(rx, sender, state.config.write_timeout);

    if let Some(event) = pending {
        session.handle(event).await;
    }

    // 3. Reader
    let connection = Arc::clone(session.connection());
    loop {
        tokio::select! {
            frame = receiver.next() => match frame {
                Some(Ok(Message::Text(text))) => handle_text(&mut session, text.as_str()).await,
                Some(Ok(Message::Close(_))) | None => {
                    tracing::info!(connection_id = %connection_id, "Client closed connection");
                    break;
                }
                Some(Ok(_)) => {}
                Some(Err(e)) => {
                    tracing::warn!(connection_id = %connection_id, error = %e, "WebSocket error");
                    break;
                }
            },
            _ = &mut send_task => {
                tracing::debug!(connection_id = %connection_id, "Writer task finished");
                break;
            }
            () = connection.kicked() => {
                tracing::warn!(connection_id = %connection_id, "Dropping connection that fell behind");
                break;
            }
        }
    }

    // 4. Teardown
    session.close().await;
    send_task.abort();
}

/// Establish the session identity.
///
/// Returns an event that arrived as the first frame of an anonymous session,
/// which the caller must still process.
async fn handshake(
    socket: &mut WebSocket,
    session: &mut RelaySession,
    credential: Option<Credential>,
    state: &AppState,
) -> Result<Option<SessionEvent>, RelayError> {
    let deadline = Instant::now() + state.config.handshake_timeout;

    if let Some(credential) = credential {
        verify_before(session, credential, deadline).await?;
        return Ok(None);
    }

    let first = tokio::time::timeout_at(deadline, next_text(socket)).await;
    let text = match first {
        Ok(Some(text)) => text,
        Ok(None) => return Err(RelayError::SessionClosed),
        Err(_) => {
            tracing::debug!(
                connection_id = %session.connection().id(),
                "No credential within handshake timeout"
            );
            session.authenticate(None).await?;
            return Ok(None);
        }
    };

    match decode_frame(&text) {
        Ok(ClientFrame::Authenticate(credential)) => {
            verify_before(session, credential, deadline).await?;
            Ok(None)
        }
        Ok(ClientFrame::Event(event)) => {
            session.authenticate(None).await?;
            Ok(Some(event))
        }
        Err(reason) => {
            session.authenticate(None).await?;
            session.reject(&RelayError::InvalidPayload(reason));
            Ok(None)
        }
    }
}

/// Verify `credential`, failing the handshake once `deadline` passes
async fn verify_before(
    session: &mut RelaySession,
    credential: Credential,
    deadline: Instant,
) -> Result<(), RelayError> {
    match tokio::time::timeout_at(deadline, session.authenticate(Some(credential))).await {
        Ok(result) => result,
        Err(_) => {
            tracing::warn!(
                connection_id = %session.connection().id(),
                "Identity verification did not finish within handshake timeout"
            );
            Err(RelayError::AuthenticationFailure(
                "handshake timed out".to_string(),
            ))
        }
    }
}

/// Next text frame, or `None` once the client is gone
async fn next_text(socket: &mut WebSocket) -> Option<String> {
    while let Some(frame) = socket.recv().await {
        match frame {
            Ok(Message::Text(text)) => return Some(text.as_str().to_string()),
            Ok(Message::Close(_)) | Err(_) => return None,
            Ok(_) => {}
        }
    }
    None
}

async fn close_unauthorized(mut socket: WebSocket) {
    let frame = CloseFrame {
        code: UNAUTHORIZED_CLOSE_CODE,
        reason: Utf8Bytes::from_static("unauthorized"),
    };
    if let Err(e) = socket.send(Message::Close(Some(frame))).await {
        tracing::debug!(error = %e, "Failed to send unauthorized close frame");
    }
}

fn decode_frame(text: &str) -> Result<ClientFrame, String> {
    let event = serde_json::from_str::<ClientEvent>(text).map_err(|e| e.to_string())?;
    ClientFrame::try_from(event).map_err(|e| e.to_string())
}

async fn handle_text(session: &mut RelaySession, text: &str) {
    match decode_frame(text) {
        Ok(ClientFrame::Event(event)) => session.handle(event).await,
        Ok(ClientFrame::Authenticate(_)) => session.reject(&RelayError::InvalidPayload(
            "session is already authenticated".to_string(),
        )),
        Err(reason) => {
            tracing::warn!(
                connection_id = %session.connection().id(),
                reason = %reason,
                "Failed to decode client frame"
            );
            session.reject(&RelayError::InvalidPayload(reason));
        }
    }
}

/// Spawns a task that drains the outbound queue into the WebSocket sink.
///
/// A write that does not complete within `write_timeout` ends the task, which
/// in turn tears the connection down.
fn pusher_loop(
    mut rx: mpsc::Receiver<String>,
    mut sender: SplitSink<WebSocket, Message>,
    write_timeout: Duration,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        while let Some(payload) = rx.recv().await {
            match tokio::time::timeout(write_timeout, sender.send(Message::Text(payload.into())))
                .await
            {
                Ok(Ok(())) => {}
                Ok(Err(e)) => {
                    tracing::debug!(error = %e, "Socket write failed");
                    break;
                }
                Err(_) => {
                    tracing::warn!("Socket write timed out");
                    break;
                }
            }
        }
    })
}
