use serde::{Deserialize, Serialize};

/// JWT body; `sub` is the username.
#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Claims {
    pub sub: String,
    pub exp: usize,
}
