pub mod chat_dto;
pub mod claims_dto;
pub mod draft_dto;
pub mod fixture_dto;
pub mod league_dto;
pub mod player_dto;
pub mod team_dto;
pub mod trade_dto;
pub mod user_dto;
pub mod waiver_dto;
