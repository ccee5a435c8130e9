use rand::{rng, Rng};
use rand_distr::Alphanumeric;
use serde::{Deserialize, Serialize};

pub const AUTH_TOKEN_LENGTH: usize = 64;

/// Opaque session token value, minted by cli-admin and presented by clients
/// via cookie or Authorization header. The authentication provider that hands
/// these to end users is outside this codebase.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct AuthTokenValue(pub String);

impl AuthTokenValue {
    pub fn generate() -> Self {
        let value: String = rng()
            .sample_iter(&Alphanumeric)
            .take(AUTH_TOKEN_LENGTH)
            .map(char::from)
            .collect();
        AuthTokenValue(value)
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct AuthToken {
    pub user_id: usize,
    pub value: AuthTokenValue,
    /// Unix timestamp of creation.
    pub created: i64,
    /// Unix timestamp of last use, None if never presented.
    pub last_used: Option<i64>,
}
