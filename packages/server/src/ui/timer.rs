//! Per-session clock.
//!
//! One task per session ticks every second, broadcasts `timer-update` and
//! ends limited-time sessions that ran out of time.

use std::{sync::Arc, time::Duration};

use crate::{
    domain::{SessionId, SharedSession},
    infrastructure::dto::websocket::ServerEvent,
    ui::state::AppState,
};

/// Spawn the clock of `session` and hand its abort handle to the registry.
pub async fn start_session_timer(state: Arc<AppState>, session_id: SessionId, session: SharedSession) {
    let task = tokio::spawn(run_timer(state.clone(), session_id, session));
    state
        .sessions
        .attach_timer(session_id, task.abort_handle())
        .await;
}

async fn run_timer(state: Arc<AppState>, session_id: SessionId, session: SharedSession) {
    let mut interval = tokio::time::interval(Duration::from_secs(1));
    // the first tick completes immediately
    interval.tick().await;

    loop {
        interval.tick().await;
        let (tick, players) = {
            let mut session = session.lock().await;
            (session.tick(), session.state().client_ids())
        };
        tracing::debug!("Session {} clock {}", session_id, tick.clock);

        let expired = tick.expired;
        state
            .broadcast(&players, &ServerEvent::TimerUpdate { clock: tick.clock })
            .await;

        if expired {
            tracing::info!("Session {} ran out of time", session_id);
            state.broadcast(&players, &ServerEvent::TimeExpired).await;
            // closing aborts this task, so it is the last step
            if let Err(e) = state.sessions.close(session_id).await {
                tracing::warn!("Failed to close expired session: {}", e);
            }
            break;
        }
    }
}
