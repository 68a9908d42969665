use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;

pub const DEFAULT_PAGE_SIZE: i64 = 50;
pub const MAX_PAGE_SIZE: i64 = 200;
pub const MAX_MESSAGE_LEN: usize = 1000;

#[derive(Debug, Serialize, Deserialize, FromRow, Clone)]
pub struct ChatMessage {
    pub id: i64,
    pub league_id: i64,
    pub username: String,
    /// The sender's team in this league, if they own one.
    pub team_name: Option<String>,
    pub message: String,
    pub message_type: String,
    pub reply_to_id: Option<i64>,
    pub created_at: DateTime<Utc>,
}

fn default_message_type() -> String {
    "text".to_string()
}

#[derive(Debug, Deserialize)]
pub struct NewChatMessage {
    pub message: String,
    #[serde(default = "default_message_type")]
    pub message_type: String,
    #[serde(default)]
    pub reply_to_id: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct ChatPage {
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

impl ChatPage {
    pub fn limit(&self) -> i64 {
        self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE)
    }

    pub fn offset(&self) -> i64 {
        self.offset.unwrap_or(0).max(0)
    }
}

#[derive(Debug, Serialize, FromRow, Clone)]
pub struct ChatParticipant {
    pub username: String,
    pub team_name: Option<String>,
    pub joined_at: DateTime<Utc>,
    pub last_read_at: Option<DateTime<Utc>>,
}

#[derive(Serialize)]
pub struct ChatUpdate {
    pub r#type: String,
    pub message: ChatMessage,
}
