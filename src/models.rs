use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Primary key of the source `users` table, kept as-is through the export
pub type UserId = u64;

/// All accounts keyed by their source id
pub type Registry = BTreeMap<UserId, UserRecord>;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserRecord {
    pub username: String,
    #[serde(rename = "password")]
    pub password_hash: String,
    pub last_ip: String,
    /// Raw token, quotes included if the dump quoted it
    pub ingame_time: String,
    #[serde(rename = "access")]
    pub access_level: String,
    pub email: String,
    /// Raw token, never coerced to a boolean
    #[serde(rename = "bot")]
    pub bot_flag: String,
    pub friends: Vec<UserId>,
    pub ignores: Vec<UserId>,
    /// Senders of pending requests addressed to this user
    pub requests: Vec<UserId>,
    pub verification_code: Option<String>,
}

/// The document handed to the Teiserver importer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputDocument {
    pub users: Registry,
    pub duplicated_emails: Vec<String>,
}
