use crate::models::OutputDocument;

/// Row and record counts collected over one run
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct MigrationStats {
    pub insert_tables: usize,
    pub users: usize,
    pub duplicated_emails: usize,
    pub friend_rows: usize,
    pub ignore_rows: usize,
    pub request_rows: usize,
    pub verification_rows: usize,
    /// Users left holding a verification code
    pub pending_verifications: usize,
}

impl MigrationStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Fills the counts that can be read back off the finished document.
    pub fn record_document(&mut self, document: &OutputDocument) {
        self.users = document.users.len();
        self.duplicated_emails = document.duplicated_emails.len();
        self.pending_verifications = document
            .users
            .values()
            .filter(|u| u.verification_code.is_some())
            .count();
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Registry, UserRecord};

    fn user(code: Option<&str>) -> UserRecord {
        UserRecord {
            username: "u".to_string(),
            password_hash: "h".to_string(),
            last_ip: "ip".to_string(),
            ingame_time: "0".to_string(),
            access_level: "user".to_string(),
            email: "u@x.com".to_string(),
            bot_flag: "0".to_string(),
            friends: vec![],
            ignores: vec![],
            requests: vec![],
            verification_code: code.map(str::to_string),
        }
    }

    #[test]
    fn default_values_are_zero() {
        assert_eq!(
            MigrationStats::new(),
            MigrationStats {
                insert_tables: 0,
                users: 0,
                duplicated_emails: 0,
                friend_rows: 0,
                ignore_rows: 0,
                request_rows: 0,
                verification_rows: 0,
                pending_verifications: 0,
            }
        );
    }

    #[test]
    fn record_document_counts_users_and_dupes() {
        let mut users = Registry::new();
        users.insert(1, user(Some("c")));
        users.insert(2, user(None));
        let document = OutputDocument {
            users,
            duplicated_emails: vec!["u@x.com".to_string()],
        };

        let mut stats = MigrationStats::new();
        stats.record_document(&document);
        assert_eq!(stats.users, 2);
        assert_eq!(stats.duplicated_emails, 1);
        assert_eq!(stats.pending_verifications, 1);
    }
}
