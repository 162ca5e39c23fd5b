/// Table holding one row per account
pub const USERS_TABLE: &str = "users";

/// Table holding one directional row per friendship
pub const FRIENDS_TABLE: &str = "friends";

pub const IGNORES_TABLE: &str = "ignores";

pub const FRIEND_REQUESTS_TABLE: &str = "friendRequests";

pub const VERIFICATIONS_TABLE: &str = "verifications";

/// Every table the export reads; a dump missing any of them is rejected
pub const REQUIRED_TABLES: [&str; 5] = [
    FRIEND_REQUESTS_TABLE,
    FRIENDS_TABLE,
    IGNORES_TABLE,
    USERS_TABLE,
    VERIFICATIONS_TABLE,
];

/// File name the Teiserver importer expects
pub const DEFAULT_OUTPUT_FILE: &str = "uberserver_export.json";

/// (id, username, password, salt, register_date, last_login, last_ip, last_id,
/// ingame_time, access, email, bot)
pub const USERS_ARITY: usize = 12;

/// (id, first_user, second_user, time)
pub const FRIENDS_ARITY: usize = 4;

/// (id, user, ignored, reason, time)
pub const IGNORES_ARITY: usize = 5;

/// (id, requester, requested, message, time)
pub const FRIEND_REQUESTS_ARITY: usize = 5;

/// (id, user, email, code, expiry, attempts, resends, use_delay, reason)
pub const VERIFICATIONS_ARITY: usize = 9;
