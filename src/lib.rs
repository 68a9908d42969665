pub mod config;
pub mod dto;
pub mod error;
pub mod routes;
pub mod services;

use std::collections::HashMap;
use std::sync::Arc;

use axum::{
    extract::Extension,
    routing::{delete, get, post, put},
    Router,
};
use sqlx::{sqlite::SqlitePoolOptions, SqlitePool};
use tokio::sync::{broadcast, RwLock};
use tower_http::cors::CorsLayer;

use crate::config::Config;
use crate::dto::draft_dto::SharedDrafts;
use crate::routes::{chat, draft, fixtures, leagues, players, teams, trades, users, waivers};
use crate::services::cache::TtlCache;
use crate::services::league_lock::LeagueLocks;
use crate::services::websocket::{LeagueEvent, websocket_handler};

pub async fn connect(config: &Config) -> Result<SqlitePool, error::ApiError> {
    let pool = SqlitePoolOptions::new()
        .max_connections(5)
        .connect(&config.database_url)
        .await?;
    migrate(&pool).await?;
    Ok(pool)
}

pub async fn migrate(pool: &SqlitePool) -> Result<(), sqlx::migrate::MigrateError> {
    sqlx::migrate!("./migrations").run(pool).await
}

pub fn build_router(pool: SqlitePool, config: Arc<Config>) -> Router {
    let (tx, _rx) = broadcast::channel::<LeagueEvent>(100);
    let cache = TtlCache::new(config.cache_ttl);
    let locks = LeagueLocks::new();
    let drafts: SharedDrafts = Arc::new(RwLock::new(HashMap::new()));

    Router::new()
        .route("/users", post(users::create_user).delete(users::remove_user))
        .route("/login", post(users::login_user))
        .route("/players", get(players::get_players).post(players::upsert_players))
        .route("/leagues", get(leagues::get_leagues).post(leagues::create_league))
        .route("/leagues/{league_id}", get(leagues::get_league))
        .route("/leagues/{league_id}/join", post(leagues::join_league))
        .route("/leagues/{league_id}/teams", get(teams::get_teams))
        .route("/leagues/{league_id}/teams/{team_id}", delete(leagues::remove_team))
        .route(
            "/leagues/{league_id}/teams/{team_id}/players/{player_id}",
            put(teams::move_player),
        )
        .route(
            "/leagues/{league_id}/waiver-claims",
            get(waivers::get_claims).post(waivers::submit_claim),
        )
        .route(
            "/leagues/{league_id}/waiver-claims/{claim_id}",
            delete(waivers::delete_claim),
        )
        .route(
            "/leagues/{league_id}/waiver-claims/{claim_id}/priority",
            put(waivers::update_claim_priority),
        )
        .route("/leagues/{league_id}/process-waivers", post(waivers::process_waivers))
        .route("/leagues/{league_id}/waiver-order", get(waivers::get_waiver_order))
        .route("/leagues/{league_id}/fixtures", get(fixtures::get_fixtures))
        .route(
            "/leagues/{league_id}/fixtures/regenerate",
            post(fixtures::regenerate_fixtures),
        )
        .route(
            "/leagues/{league_id}/fixtures/{fixture_id}/score",
            put(fixtures::record_score),
        )
        .route("/leagues/{league_id}/next-matchup", get(fixtures::next_matchup))
        .route("/leagues/{league_id}/draft", get(draft::get_draft))
        .route("/leagues/{league_id}/draft/start", post(draft::start_draft))
        .route("/leagues/{league_id}/draft/pick", post(draft::draft_pick))
        .route("/leagues/{league_id}/draft/complete", post(draft::complete_draft))
        .route(
            "/leagues/{league_id}/trades",
            get(trades::get_trades).post(trades::propose_trade),
        )
        .route(
            "/leagues/{league_id}/trades/{trade_id}/respond",
            post(trades::respond_to_trade),
        )
        .route(
            "/leagues/{league_id}/chat",
            get(chat::get_messages).post(chat::post_message),
        )
        .route(
            "/leagues/{league_id}/chat/participants",
            get(chat::get_participants).post(chat::join_chat),
        )
        .route("/leagues/{league_id}/chat/read", put(chat::mark_read))
        .route("/leagues/{league_id}/ws", get(websocket_handler))
        .layer(Extension(pool))
        .layer(Extension(config))
        .layer(Extension(tx))
        .layer(Extension(cache))
        .layer(Extension(locks))
        .layer(Extension(drafts))
        .layer(CorsLayer::permissive())
}
