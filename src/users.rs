use crate::config::{USERS_ARITY, USERS_TABLE};
use crate::error::{MigrationError, Result};
use crate::models::{Registry, UserId, UserRecord};
use crate::tuples::{self, RawTuple};
use rustc_hash::{FxHashMap, FxHashSet};
use std::collections::btree_map::Entry;
use tracing::{debug, info, warn};

/// Column positions in a `users` row
const ID: usize = 0;
const USERNAME: usize = 1;
const EMAIL: usize = 10;

/// Builds the registry from the `users` rows and makes every email unique.
///
/// Uberserver never enforced unique emails but Teiserver does. Every account
/// whose email appears more than once gets the email `{username}_{email}`;
/// the shared addresses are returned, in first-repeat order, so operators can
/// follow up with the affected users after the import.
pub fn build_users(rows: &[RawTuple<'_>]) -> Result<(Registry, Vec<String>)> {
    check_usernames_unique(rows)?;
    let duplicated_emails = find_duplicated_emails(rows)?;
    let duplicated: FxHashSet<&str> = duplicated_emails.iter().map(String::as_str).collect();

    let mut registry = Registry::new();
    let mut renamed = 0usize;

    for tuple in rows {
        let (id, mut user) = decode_user(tuple)?;

        if duplicated.contains(user.email.as_str()) {
            let email = format!("{}_{}", user.username, user.email);
            debug!(id, from = %user.email, to = %email, "Renaming duplicated email");
            user.email = email;
            renamed += 1;
        }

        match registry.entry(id) {
            Entry::Vacant(slot) => {
                slot.insert(user);
            }
            Entry::Occupied(_) => {
                return Err(MigrationError::DuplicateKey {
                    table: USERS_TABLE.to_string(),
                    id,
                });
            }
        }
    }

    check_emails_unique(&registry)?;

    if !duplicated_emails.is_empty() {
        warn!(
            duplicated = duplicated_emails.len(),
            renamed, "Renamed accounts sharing an email"
        );
    }
    info!(users = registry.len(), "Users built");

    Ok((registry, duplicated_emails))
}

/// Emails seen on more than one row, each listed once, in the order their
/// first repeat was encountered.
pub fn find_duplicated_emails(rows: &[RawTuple<'_>]) -> Result<Vec<String>> {
    let mut seen = FxHashSet::default();
    let mut reported = FxHashSet::default();
    let mut duplicated = Vec::new();

    for tuple in rows {
        let email = tuples::unquote(tuple.fields::<USERS_ARITY>(USERS_TABLE)?[EMAIL]);
        if !seen.insert(email.clone()) && reported.insert(email.clone()) {
            duplicated.push(email);
        }
    }

    Ok(duplicated)
}

fn decode_user(tuple: &RawTuple<'_>) -> Result<(UserId, UserRecord)> {
    let [id, username, password, _salt, _register_date, _last_login, last_ip, _last_id, ingame_time, access, email, bot] =
        tuple.fields::<USERS_ARITY>(USERS_TABLE)?;
    let id = tuples::parse_id(id, USERS_TABLE, tuple.row)?;

    let user = UserRecord {
        username: tuples::unquote(username),
        password_hash: tuples::unquote(password),
        last_ip: tuples::unquote(last_ip),
        ingame_time: ingame_time.to_string(),
        access_level: tuples::unquote(access),
        email: tuples::unquote(email),
        bot_flag: bot.to_string(),
        friends: Vec::new(),
        ignores: Vec::new(),
        requests: Vec::new(),
        verification_code: None,
    };

    Ok((id, user))
}

/// The email rename folds in the username, which is only collision free if
/// usernames are unique.
fn check_usernames_unique(rows: &[RawTuple<'_>]) -> Result<()> {
    let mut owners: FxHashMap<String, UserId> = FxHashMap::default();

    for tuple in rows {
        let fields = tuple.fields::<USERS_ARITY>(USERS_TABLE)?;
        let id = tuples::parse_id(fields[ID], USERS_TABLE, tuple.row)?;
        let username = tuples::unquote(fields[USERNAME]);

        if let Some(&first) = owners.get(&username) {
            if first != id {
                return Err(MigrationError::DuplicateUsername {
                    username,
                    first,
                    second: id,
                });
            }
        } else {
            owners.insert(username, id);
        }
    }

    Ok(())
}

fn check_emails_unique(registry: &Registry) -> Result<()> {
    let mut seen = FxHashSet::default();
    for (&id, user) in registry {
        if !seen.insert(user.email.as_str()) {
            return Err(MigrationError::EmailCollision {
                email: user.email.clone(),
                id,
            });
        }
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::tuples::decode_tuples;

    fn rows(statement: &str) -> Vec<RawTuple<'_>> {
        decode_tuples(USERS_TABLE, statement, 0).unwrap()
    }

    const ALICE: &str = "(1,'alice','hash1','salt','d1','d2','ip1',0,'100','2','a@x.com','0')";
    const BOB: &str = "(2,'bob','hash2','salt','d1','d2','ip2',0,'50','2','a@x.com','0')";
    const CAROL: &str = "(3,'carol','hash3','salt','d1','d2','ip3',0,'7','1','c@x.com',1)";

    fn insert(values: &[&str]) -> String {
        format!("INSERT INTO `users` VALUES {}", values.join(","))
    }

    #[test]
    fn builds_records_from_rows() {
        let statement = insert(&[CAROL]);
        let (registry, dupes) = build_users(&rows(&statement)).unwrap();

        assert!(dupes.is_empty());
        let carol = &registry[&3];
        assert_eq!(carol.username, "carol");
        assert_eq!(carol.password_hash, "hash3");
        assert_eq!(carol.last_ip, "ip3");
        assert_eq!(carol.ingame_time, "'7'");
        assert_eq!(carol.access_level, "1");
        assert_eq!(carol.email, "c@x.com");
        assert_eq!(carol.bot_flag, "1");
        assert!(carol.friends.is_empty());
        assert!(carol.ignores.is_empty());
        assert!(carol.requests.is_empty());
        assert_eq!(carol.verification_code, None);
    }

    #[test]
    fn duplicated_emails_are_renamed_with_username() {
        let statement = insert(&[ALICE, BOB, CAROL]);
        let (registry, dupes) = build_users(&rows(&statement)).unwrap();

        assert_eq!(dupes, vec!["a@x.com"]);
        assert_eq!(registry.len(), 3);
        assert_eq!(registry[&1].email, "alice_a@x.com");
        assert_eq!(registry[&2].email, "bob_a@x.com");
        assert_eq!(registry[&3].email, "c@x.com");
    }

    #[test]
    fn each_duplicated_email_reported_once() {
        let dave = "(4,'dave','h','s','d1','d2','ip',0,'1','1','a@x.com','0')";
        let erin = "(5,'erin','h','s','d1','d2','ip',0,'1','1','c@x.com','0')";
        let statement = insert(&[ALICE, CAROL, BOB, erin, dave]);
        let found = find_duplicated_emails(&rows(&statement)).unwrap();
        assert_eq!(found, vec!["a@x.com", "c@x.com"]);
    }

    #[test]
    fn duplicate_id_is_rejected() {
        let again = "(1,'alice2','h','s','d1','d2','ip',0,'1','1','z@x.com','0')";
        let statement = insert(&[ALICE, again]);
        let err = build_users(&rows(&statement)).unwrap_err();
        assert_eq!(
            err,
            MigrationError::DuplicateKey {
                table: "users".to_string(),
                id: 1
            }
        );
    }

    #[test]
    fn duplicate_username_is_rejected() {
        let impostor = "(9,'alice','h','s','d1','d2','ip',0,'1','1','z@x.com','0')";
        let statement = insert(&[ALICE, impostor]);
        let err = build_users(&rows(&statement)).unwrap_err();
        assert_eq!(
            err,
            MigrationError::DuplicateUsername {
                username: "alice".to_string(),
                first: 1,
                second: 9
            }
        );
    }

    #[test]
    fn rename_colliding_with_existing_email_is_rejected() {
        let squatter = "(7,'zed','h','s','d1','d2','ip',0,'1','1','bob_a@x.com','0')";
        let statement = insert(&[ALICE, BOB, squatter]);
        let err = build_users(&rows(&statement)).unwrap_err();
        assert!(matches!(err, MigrationError::EmailCollision { .. }));
    }

    #[test]
    fn short_row_is_a_decode_error() {
        let statement = "INSERT INTO `users` VALUES (1,'alice','hash1')";
        let err = build_users(&rows(statement)).unwrap_err();
        assert_eq!(
            err,
            MigrationError::tuple_decode("users", 0, "expected 12 fields, found 3")
        );
    }

    #[test]
    fn email_with_comma_is_kept_whole() {
        let odd = "(8,'odd','h','s','d1','d2','ip',0,'1','1','we,ird (x)@x.com','0')";
        let statement = insert(&[odd]);
        let (registry, _) = build_users(&rows(&statement)).unwrap();
        assert_eq!(registry[&8].email, "we,ird (x)@x.com");
    }
}
