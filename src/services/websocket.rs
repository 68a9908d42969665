use axum::{
    extract::{Extension, Path, ws::{WebSocket, WebSocketUpgrade, Message}},
    response::IntoResponse,
};
use serde::Serialize;
use sqlx::SqlitePool;
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::{info, error, warn};
use futures_util::{StreamExt, SinkExt};

use crate::dto::chat_dto::{ChatMessage, ChatUpdate};
use crate::dto::draft_dto::{DraftState, UpdateDraft};
use crate::dto::fixture_dto::FixturesUpdate;
use crate::dto::league_dto::League;
use crate::dto::team_dto::TeamsUpdate;
use crate::dto::trade_dto::{Trade, TradeUpdate};
use crate::dto::waiver_dto::WaiverUpdate;
use crate::services::league_store;

/// A serialized update addressed to one league's subscribers.
#[derive(Debug, Clone)]
pub struct LeagueEvent {
    pub league_id: i64,
    pub json: String,
}

fn broadcast<T: Serialize>(tx: &broadcast::Sender<LeagueEvent>, league_id: i64, update: &T) {
    match serde_json::to_string(update) {
        Ok(json) => {
            // No subscribers is fine.
            let _ = tx.send(LeagueEvent { league_id, json });
        }
        Err(e) => {
            error!("Failed to serialize update: {}", e);
        }
    }
}

pub fn send_waiver_update(
    tx: &broadcast::Sender<LeagueEvent>,
    league_id: i64,
    update_type: &str,
    data: serde_json::Value,
) {
    broadcast(tx, league_id, &WaiverUpdate {
        r#type: update_type.to_string(),
        league_id,
        data,
    });
}

pub async fn send_team_update(pool: &SqlitePool, tx: &broadcast::Sender<LeagueEvent>, league: &League) {
    let teams = match league_store::load_teams(pool, league).await {
        Ok(teams) => teams,
        Err(e) => {
            error!("Failed to load teams for update: {}", e);
            return;
        }
    };

    let mut teams: Vec<_> = teams.into_values().collect();
    teams.sort_by_key(|t| t.id);

    broadcast(tx, league.id, &TeamsUpdate {
        r#type: "teams_update".to_string(),
        league_id: league.id,
        teams,
    });
}

pub async fn send_fixture_update(pool: &SqlitePool, tx: &broadcast::Sender<LeagueEvent>, league_id: i64) {
    let fixtures = match league_store::fetch_fixtures(pool, league_id).await {
        Ok(fixtures) => fixtures,
        Err(e) => {
            error!("Failed to load fixtures for update: {}", e);
            return;
        }
    };

    broadcast(tx, league_id, &FixturesUpdate {
        r#type: "fixtures_update".to_string(),
        league_id,
        fixtures,
    });
}

pub fn send_draft_update(tx: &broadcast::Sender<LeagueEvent>, draft_state: &DraftState) {
    broadcast(tx, draft_state.league_id, &UpdateDraft {
        r#type: "draft_update".to_string(),
        draft_state: draft_state.clone(),
    });
}

pub fn send_trade_update(tx: &broadcast::Sender<LeagueEvent>, update_type: &str, trade: &Trade) {
    broadcast(tx, trade.league_id, &TradeUpdate {
        r#type: update_type.to_string(),
        trade: trade.clone(),
    });
}

pub fn send_chat_message(tx: &broadcast::Sender<LeagueEvent>, message: &ChatMessage) {
    broadcast(tx, message.league_id, &ChatUpdate {
        r#type: "chat_message".to_string(),
        message: message.clone(),
    });
}

/// Waits for the next update addressed to `league_id`, skipping other
/// leagues. `None` once the channel is closed.
pub async fn next_for_league(
    rx: &mut broadcast::Receiver<LeagueEvent>,
    league_id: i64,
) -> Option<String> {
    loop {
        match rx.recv().await {
            Ok(event) if event.league_id == league_id => return Some(event.json),
            Ok(_) => continue,
            Err(RecvError::Lagged(skipped)) => {
                warn!("WebSocket subscriber for league {} skipped {} updates.", league_id, skipped);
            }
            Err(RecvError::Closed) => return None,
        }
    }
}

/* Web Socket stuff */
pub async fn websocket_handler(
    ws: WebSocketUpgrade,
    Extension(tx): Extension<broadcast::Sender<LeagueEvent>>,
    Path(league_id): Path<i64>,
) -> impl IntoResponse {
    ws.on_upgrade(move |socket| handle_socket(socket, tx, league_id))
}

async fn handle_socket(socket: WebSocket, tx: broadcast::Sender<LeagueEvent>, league_id: i64) {
    let (mut sender, mut receiver) = socket.split();
    let mut rx = tx.subscribe();
    info!("WebSocket client connected to league {}.", league_id);

    // Task to send messages to this client
    let send_task = tokio::spawn(async move {
        while let Some(msg) = next_for_league(&mut rx, league_id).await {
            if sender.send(Message::Text(msg.into())).await.is_err() {
                break;
            }
        }
    });

    /* The socket is read-only; chat goes through the authenticated POST route */
    while let Some(Ok(msg)) = receiver.next().await {
        if let Message::Close(_) = msg {
            break;
        }
    }

    // Clean up
    send_task.abort();
    info!("WebSocket client disconnected from league {}.", league_id);
}
