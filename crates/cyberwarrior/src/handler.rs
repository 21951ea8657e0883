//! Per-connection handler: sign-in, then event routing.
//!
//! Each accepted connection gets its own Tokio task running this handler.
//! The flow is:
//!   1. Spawn a writer task that drains the connection's outbound queue
//!   2. Ignore everything until a `signin` with a `playerName` arrives
//!   3. Create the session; answer `signin{result:true}`
//!   4. Loop: decode client events → hand them to the `ActionRouter`
//!   5. On close, the session guard turns the drop into a synthetic leave

use std::sync::Arc;

use cyberwarrior_protocol::{ClientEvent, Codec, ServerEvent};
use cyberwarrior_session::{EventSender, SessionRef};
use cyberwarrior_transport::{Connection, WebSocketConnection};
use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use crate::CyberwarriorError;
use crate::server::ServerState;

/// Drop guard that tears a session down when the handler exits.
///
/// This ensures cleanup happens even if the handler panics. Since `Drop`
/// is synchronous, we spawn a fire-and-forget task for the async work.
struct SessionGuard<C: Codec> {
    session: SessionRef,
    state: Arc<ServerState<C>>,
}

impl<C: Codec> Drop for SessionGuard<C> {
    fn drop(&mut self) {
        let session = Arc::clone(&self.session);
        let state = Arc::clone(&self.state);
        tokio::spawn(async move {
            let removed = state.sessions.lock().await.disconnect(session.id());
            // Only the first disconnect of a session produces a leave.
            if removed.is_ok() {
                state.router.disconnect(&session).await;
            }
        });
    }
}

/// Handles a single connection from accept to close.
pub(crate) async fn handle_connection<C: Codec>(
    conn: WebSocketConnection,
    state: Arc<ServerState<C>>,
) -> Result<(), CyberwarriorError> {
    let conn = Arc::new(conn);
    let conn_id = conn.id();
    tracing::debug!(%conn_id, "handling new connection");

    let (outbound, inbound) = mpsc::channel(state.outbound_capacity);
    let writer = spawn_writer(Arc::clone(&conn), Arc::clone(&state), inbound);

    let result = read_loop(&conn, &state, outbound).await;

    // The guard (if any) has dropped by now and the disconnect is queued.
    writer.abort();
    result
}

async fn read_loop<C: Codec>(
    conn: &WebSocketConnection,
    state: &Arc<ServerState<C>>,
    outbound: EventSender,
) -> Result<(), CyberwarriorError> {
    let conn_id = conn.id();
    let mut guard: Option<SessionGuard<C>> = None;

    loop {
        let Some(data) = conn.recv().await? else {
            tracing::info!(%conn_id, "connection closed cleanly");
            break;
        };

        let event: ClientEvent = match state.codec.decode(&data) {
            Ok(event) => event,
            Err(e) => {
                tracing::debug!(%conn_id, error = %e, "failed to decode event");
                continue;
            }
        };

        if let Some(active) = &guard {
            match event {
                ClientEvent::Signin { .. } => {
                    tracing::debug!(session_id = %active.session.id(), "repeated signin");
                    active.session.send(ServerEvent::Signin { result: false });
                }
                event => state.router.dispatch(&active.session, event).await,
            }
            continue;
        }

        let kind = event.kind();
        let ClientEvent::Signin { player_name } = event else {
            tracing::debug!(%conn_id, kind, "event before signin, ignoring");
            continue;
        };
        let Some(name) = player_name else {
            tracing::debug!(%conn_id, "signin without playerName, dropping");
            continue;
        };

        let session = state.sessions.lock().await.create(name, outbound.clone());
        tracing::debug!(%conn_id, session_id = %session.id(), "player signed in");
        session.send(ServerEvent::Signin { result: true });
        guard = Some(SessionGuard {
            session,
            state: Arc::clone(state),
        });
    }

    Ok(())
}

/// Spawns the task that serializes queued events onto the connection.
///
/// Rooms only push into the bounded queue with `try_send`; all network
/// writes for the connection happen here.
fn spawn_writer<C: Codec>(
    conn: Arc<WebSocketConnection>,
    state: Arc<ServerState<C>>,
    mut inbound: mpsc::Receiver<ServerEvent>,
) -> JoinHandle<()> {
    tokio::spawn(async move {
        let conn_id = conn.id();
        while let Some(event) = inbound.recv().await {
            let text = match state.codec.encode(&event) {
                Ok(text) => text,
                Err(e) => {
                    tracing::warn!(%conn_id, error = %e, "failed to encode event");
                    continue;
                }
            };
            if let Err(e) = conn.send(&text).await {
                tracing::debug!(%conn_id, error = %e, "send failed, stopping writer");
                break;
            }
        }
    })
}
