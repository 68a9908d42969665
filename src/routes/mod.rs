pub mod chat;
pub mod draft;
pub mod fixtures;
pub mod leagues;
pub mod players;
pub mod teams;
pub mod trades;
pub mod users;
pub mod waivers;
