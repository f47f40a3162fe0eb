//! Routing of inbound game events to the usecases.
//!
//! Usecase errors never close the socket: they are logged with the client id
//! and answered with an `error` event. Late or duplicate lifecycle events are
//! logged and dropped.

use std::sync::Arc;

use sabun_shared::time::get_jst_timestamp;

use crate::{
    domain::{
        ClientId, GameId, GuessCoordinate, LeaveOutcome, Occupant, PlayerName, SessionId,
        Timestamp,
    },
    infrastructure::dto::websocket::{ClientEvent, ServerEvent, SystemMessageCode},
    ui::{state::AppState, timer::start_session_timer},
    usecase::{
        LeaveSessionUseCase, MatchmakingUseCase, RequestClueUseCase, StartSessionError,
        StartSessionUseCase, StartedSession, SubmitGuessUseCase,
    },
};

pub async fn dispatch(state: &Arc<AppState>, client_id: &ClientId, event: ClientEvent) {
    match event {
        ClientEvent::StartClassicSession { game_id, is_solo } => {
            start_classic_session(state, client_id, game_id, is_solo).await
        }
        ClientEvent::StartLimitedTimeSession { is_solo } => {
            start_limited_time_session(state, client_id, is_solo).await
        }
        ClientEvent::SubmitGuess {
            session_id,
            coordinate,
        } => submit_guess(state, client_id, SessionId::new(session_id), coordinate).await,
        ClientEvent::RequestClue => request_clue(state, client_id).await,
        ClientEvent::PlayerLeft { session_id } => {
            player_left(state, client_id, SessionId::new(session_id)).await
        }
        ClientEvent::GetClientId => {
            let event = ServerEvent::ClientId {
                client_id: client_id.to_string(),
            };
            state.send_to(client_id, &event).await
        }
        ClientEvent::ProvideName { name } => provide_name(state, client_id, name).await,
        ClientEvent::StartMatchmaking { game_id } => {
            start_matchmaking(state, client_id, game_id).await
        }
        ClientEvent::JoinRoom { game_id, name } => {
            join_room(state, client_id, game_id, name).await
        }
        ClientEvent::AcceptOpponent { name } => accept_opponent(state, client_id, name).await,
        ClientEvent::RejectOpponent { game_id, name } => {
            reject_opponent(state, client_id, game_id, name).await
        }
        ClientEvent::LeaveWaitingRoom { game_id } => {
            leave_waiting_room(state, client_id, game_id).await
        }
        ClientEvent::LeaveRoom => leave_room(state, client_id).await,
    }
}

/// Leave the session and every room of a disconnected client.
pub async fn handle_disconnect(state: &Arc<AppState>, client_id: &ClientId) {
    let leave = LeaveSessionUseCase::new(state.sessions.clone());
    if let Some((session_id, targets)) = leave.disconnect(client_id).await {
        tracing::info!("Client '{}' dropped out of session {}", client_id, session_id);
        notify_left(state, client_id, &targets).await;
    }

    let matchmaking = MatchmakingUseCase::new(state.matchmaking.clone());
    let abandoned: Vec<ClientId> = matchmaking
        .disconnect(client_id)
        .await
        .into_iter()
        .map(|occupant| occupant.client_id)
        .collect();
    state.broadcast(&abandoned, &ServerEvent::OpponentLeft).await;
}

fn display_name(name: Option<&PlayerName>, client_id: &ClientId) -> String {
    name.map(ToString::to_string)
        .unwrap_or_else(|| client_id.to_string())
}

async fn occupant(state: &AppState, client_id: &ClientId) -> Occupant {
    Occupant::new(client_id.clone(), state.name_of(client_id).await)
}

async fn reply_error(state: &AppState, client_id: &ClientId, message: impl Into<String>) {
    state.send_to(client_id, &ServerEvent::error(message)).await;
}

fn start_session_usecase(state: &AppState) -> StartSessionUseCase {
    StartSessionUseCase::new(
        state.sessions.clone(),
        state.differences.clone(),
        state.matchmaking.clone(),
        state.constants,
    )
}

async fn start_classic_session(
    state: &Arc<AppState>,
    client_id: &ClientId,
    game_id: String,
    is_solo: bool,
) {
    let game_id = match GameId::new(game_id) {
        Ok(game_id) => game_id,
        Err(e) => {
            tracing::warn!("Client '{}' sent an invalid game id: {}", client_id, e);
            return reply_error(state, client_id, e.to_string()).await;
        }
    };
    let result = start_session_usecase(state)
        .start_classic(occupant(state, client_id).await, game_id, is_solo)
        .await;
    on_session_started(state, client_id, result).await;
}

async fn start_limited_time_session(state: &Arc<AppState>, client_id: &ClientId, is_solo: bool) {
    let result = start_session_usecase(state)
        .start_limited_time(occupant(state, client_id).await, is_solo)
        .await;
    on_session_started(state, client_id, result).await;
}

async fn on_session_started(
    state: &Arc<AppState>,
    client_id: &ClientId,
    result: Result<StartedSession, StartSessionError>,
) {
    match result {
        Ok(started) => {
            let event = ServerEvent::SessionId {
                session_id: started.session_id.value(),
            };
            state.broadcast(&started.players, &event).await;
            start_session_timer(state.clone(), started.session_id, started.session).await;
        }
        Err(StartSessionError::AlreadyInSession(session_id)) => {
            // the partner started it first
            let event = ServerEvent::SessionId {
                session_id: session_id.value(),
            };
            state.send_to(client_id, &event).await;
        }
        Err(e) => {
            tracing::warn!("Client '{}' could not start a session: {}", client_id, e);
            reply_error(state, client_id, e.to_string()).await;
        }
    }
}

async fn submit_guess(
    state: &Arc<AppState>,
    client_id: &ClientId,
    session_id: SessionId,
    coordinate: GuessCoordinate,
) {
    let usecase = SubmitGuessUseCase::new(state.sessions.clone(), state.differences.clone());
    let outcome = match usecase.execute(session_id, client_id, coordinate).await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::warn!(
                "Guess of '{}' in session {} rejected: {}",
                client_id,
                session_id,
                e
            );
            return reply_error(state, client_id, e.to_string()).await;
        }
    };

    let code = if outcome.result.correct {
        SystemMessageCode::DifferenceFound
    } else {
        SystemMessageCode::GuessError
    };
    let player_name = display_name(outcome.guesser_name.as_ref(), client_id);
    let winner = outcome.result.winner.clone();

    state
        .broadcast(&outcome.players, &ServerEvent::from(outcome.result))
        .await;
    state
        .broadcast(
            &outcome.players,
            &ServerEvent::SystemMessage { code, player_name },
        )
        .await;

    if let Some(winner) = winner {
        let event = ServerEvent::PlayerWon {
            winner: winner.to_string(),
            name: outcome.winner_name.map(|name| name.to_string()),
        };
        state.broadcast(&outcome.players, &event).await;
    }
}

async fn request_clue(state: &Arc<AppState>, client_id: &ClientId) {
    let usecase = RequestClueUseCase::new(state.sessions.clone());
    let outcome = match usecase.execute(client_id).await {
        Ok(outcome) => outcome,
        Err(e) => {
            tracing::warn!("Clue refused for '{}': {}", client_id, e);
            return reply_error(state, client_id, e.to_string()).await;
        }
    };

    let player_name = display_name(outcome.requester_name.as_ref(), client_id);
    state
        .send_to(client_id, &ServerEvent::from(outcome.clue))
        .await;
    let event = ServerEvent::SystemMessage {
        code: SystemMessageCode::ClueUsed,
        player_name,
    };
    state.broadcast(&outcome.players, &event).await;
}

async fn player_left(state: &Arc<AppState>, client_id: &ClientId, session_id: SessionId) {
    let usecase = LeaveSessionUseCase::new(state.sessions.clone());
    match usecase.execute(session_id, client_id).await {
        Ok(targets) => {
            tracing::info!("Client '{}' left session {}", client_id, session_id);
            notify_left(state, client_id, &targets).await;
        }
        // late or duplicate leave
        Err(e) => tracing::warn!("Client '{}' cannot leave: {}", client_id, e),
    }
}

async fn notify_left(state: &AppState, client_id: &ClientId, targets: &[ClientId]) {
    if targets.is_empty() {
        return;
    }
    let player_name = display_name(state.name_of(client_id).await.as_ref(), client_id);
    state.broadcast(targets, &ServerEvent::OpponentLeft).await;
    let event = ServerEvent::SystemMessage {
        code: SystemMessageCode::PlayerLeft,
        player_name,
    };
    state.broadcast(targets, &event).await;
}

async fn provide_name(state: &Arc<AppState>, client_id: &ClientId, name: String) {
    match PlayerName::new(name) {
        Ok(name) => {
            state.set_name(client_id, name.clone()).await;
            state.sessions.set_player_name(client_id, name).await;
        }
        Err(e) => {
            tracing::warn!("Client '{}' sent an invalid name: {}", client_id, e);
            reply_error(state, client_id, e.to_string()).await;
        }
    }
}

async fn start_matchmaking(state: &Arc<AppState>, client_id: &ClientId, game_id: String) {
    let usecase = MatchmakingUseCase::new(state.matchmaking.clone());
    let created_at = Timestamp::new(get_jst_timestamp());
    let host = occupant(state, client_id).await;
    match usecase.start(game_id, host, created_at).await {
        Ok(started) => {
            if let Some(room) = started.merged
                && let Some(guest) = room.guest
            {
                let event = ServerEvent::OpponentJoined {
                    name: display_name(guest.name.as_ref(), &guest.client_id),
                };
                state.send_to(&room.host.client_id, &event).await;
            }
        }
        Err(e) => {
            tracing::warn!("Client '{}' cannot start matchmaking: {}", client_id, e);
            reply_error(state, client_id, e.to_string()).await;
        }
    }
}

async fn join_room(state: &Arc<AppState>, client_id: &ClientId, game_id: String, name: String) {
    if let Ok(name) = PlayerName::new(name) {
        state.set_name(client_id, name).await;
    }
    let usecase = MatchmakingUseCase::new(state.matchmaking.clone());
    let guest = occupant(state, client_id).await;
    match usecase.join(game_id, guest).await {
        Ok(Some(room)) => {
            let event = ServerEvent::OpponentJoined {
                name: display_name(state.name_of(client_id).await.as_ref(), client_id),
            };
            state.send_to(&room.host.client_id, &event).await;
        }
        Ok(None) => {}
        Err(e) => {
            tracing::warn!("Client '{}' cannot join a room: {}", client_id, e);
            reply_error(state, client_id, e.to_string()).await;
        }
    }
}

async fn accept_opponent(state: &Arc<AppState>, client_id: &ClientId, name: String) {
    let usecase = MatchmakingUseCase::new(state.matchmaking.clone());
    match usecase.accept(client_id).await {
        Ok(room) => {
            tracing::info!("Host '{}' accepted '{}' in room '{}'", client_id, name, room.id);
            if let Some(guest) = room.guest {
                state
                    .send_to(&guest.client_id, &ServerEvent::RoomReachable)
                    .await;
            }
        }
        Err(e) => {
            tracing::warn!("Host '{}' cannot accept: {}", client_id, e);
            reply_error(state, client_id, e.to_string()).await;
        }
    }
}

async fn reject_opponent(state: &Arc<AppState>, client_id: &ClientId, game_id: String, name: String) {
    let usecase = MatchmakingUseCase::new(state.matchmaking.clone());
    match usecase.reject(game_id, client_id).await {
        Ok(guest) => {
            tracing::info!("Host '{}' rejected '{}'", client_id, name);
            let event = ServerEvent::SystemMessage {
                code: SystemMessageCode::OpponentRejected,
                player_name: display_name(state.name_of(client_id).await.as_ref(), client_id),
            };
            state.send_to(&guest.client_id, &event).await;
        }
        Err(e) => {
            tracing::warn!("Host '{}' cannot reject: {}", client_id, e);
            reply_error(state, client_id, e.to_string()).await;
        }
    }
}

async fn leave_waiting_room(state: &Arc<AppState>, client_id: &ClientId, game_id: String) {
    let usecase = MatchmakingUseCase::new(state.matchmaking.clone());
    match usecase.leave_waiting_room(game_id, client_id).await {
        Ok(LeaveOutcome::Requeued { remaining }) => {
            state
                .send_to(&remaining.client_id, &ServerEvent::OpponentLeft)
                .await;
        }
        Ok(LeaveOutcome::Discarded) => {}
        Ok(LeaveOutcome::NotFound) => {
            tracing::debug!("Client '{}' was not waiting in that room", client_id);
        }
        Err(e) => reply_error(state, client_id, e.to_string()).await,
    }
}

async fn leave_room(state: &Arc<AppState>, client_id: &ClientId) {
    let usecase = MatchmakingUseCase::new(state.matchmaking.clone());
    if let Some(other) = usecase.leave_room(client_id).await {
        state
            .send_to(&other.client_id, &ServerEvent::OpponentLeft)
            .await;
    }
}
