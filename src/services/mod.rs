pub mod auth_user;
pub mod cache;
pub mod claim_validator;
pub mod draft;
pub mod fixture_scheduler;
pub mod league_lock;
pub mod league_store;
pub mod password;
pub mod trade_engine;
pub mod waiver_engine;
pub mod websocket;
