//! WebSocket connection bridging.
//!
//! Runs the read/write loop for a single connection: inbound frames go
//! to the room's sync engine, engine fan-out frames go back to the
//! socket. The session is attached before the loop and detached exactly
//! once after it, whether the loop ended with a clean close or a
//! transport error.

use std::sync::Arc;

use axum::extract::ws::{CloseFrame, Message, WebSocket};
use futures_util::{SinkExt, StreamExt};
use tokio::sync::mpsc;

use crate::domain::BoardId;
use crate::engine::Frame;
use crate::persistence::PersistenceGateway;
use crate::service::RoomService;

/// WebSocket close code 1008: policy violation.
const POLICY_VIOLATION: u16 = 1008;

/// Runs the bridging loop for one WebSocket connection.
///
/// A missing or invalid `boardId` closes the socket with code 1008
/// (policy violation) before any room is touched.
pub async fn run_connection<P: PersistenceGateway>(
    socket: WebSocket,
    rooms: Arc<RoomService<P>>,
    board_id: Option<String>,
) {
    let (mut ws_tx, mut ws_rx) = socket.split();

    let board_id = match board_id.as_deref().map(BoardId::parse) {
        Some(Ok(id)) => id,
        Some(Err(err)) => {
            tracing::debug!(error = %err, "rejecting connection: invalid board id");
            let _ = ws_tx
                .send(Message::Close(Some(CloseFrame {
                    code: POLICY_VIOLATION,
                    reason: "invalid board id".into(),
                })))
                .await;
            return;
        }
        None => {
            let _ = ws_tx
                .send(Message::Close(Some(CloseFrame {
                    code: POLICY_VIOLATION,
                    reason: "board id required".into(),
                })))
                .await;
            return;
        }
    };

    let (room, session_id) = rooms.connect(&board_id).await;
    let (out_tx, mut out_rx) = mpsc::unbounded_channel();
    room.engine().connect(session_id, out_tx);
    tracing::debug!(%board_id, %session_id, "ws connection established");

    loop {
        tokio::select! {
            msg = ws_rx.next() => {
                match msg {
                    Some(Ok(Message::Text(text))) => {
                        room.engine()
                            .handle_message(session_id, Frame::Text(text.to_string()));
                        room.mark_dirty().await;
                    }
                    Some(Ok(Message::Binary(bytes))) => {
                        room.engine()
                            .handle_message(session_id, Frame::Binary(bytes.to_vec()));
                        room.mark_dirty().await;
                    }
                    // Ping/pong are answered by axum itself.
                    Some(Ok(Message::Ping(_) | Message::Pong(_))) => {}
                    Some(Ok(Message::Close(_))) | None => break,
                    Some(Err(err)) => {
                        // Transport errors count as a close for bookkeeping.
                        tracing::debug!(%board_id, %session_id, error = %err, "ws transport error");
                        break;
                    }
                }
            }
            frame = out_rx.recv() => {
                match frame {
                    Some(Frame::Text(text)) => {
                        if ws_tx.send(Message::text(text)).await.is_err() {
                            break;
                        }
                    }
                    Some(Frame::Binary(bytes)) => {
                        if ws_tx.send(Message::binary(bytes)).await.is_err() {
                            break;
                        }
                    }
                    None => break,
                }
            }
        }
    }

    // Single exit path: exactly one disconnect and one detach per session.
    room.engine().disconnect(session_id);
    rooms.detach(&room, session_id).await;
    tracing::debug!(%board_id, %session_id, "ws connection closed");
}
