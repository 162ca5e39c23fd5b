//! Relationship passes that enrich an already-built registry.
//!
//! Each pass takes the registry by value and hands it back, so the pipeline
//! threads it explicitly from stage to stage. A row pointing at an id missing
//! from the registry aborts the run.

use crate::config::{
    FRIENDS_ARITY, FRIENDS_TABLE, FRIEND_REQUESTS_ARITY, FRIEND_REQUESTS_TABLE, IGNORES_ARITY,
    IGNORES_TABLE, VERIFICATIONS_ARITY, VERIFICATIONS_TABLE,
};
use crate::error::{MigrationError, Result};
use crate::models::{Registry, UserId, UserRecord};
use crate::tuples::{self, RawTuple};
use tracing::info;

fn user_mut<'r>(
    registry: &'r mut Registry,
    id: UserId,
    table: &str,
    row: usize,
) -> Result<&'r mut UserRecord> {
    registry
        .get_mut(&id)
        .ok_or_else(|| MigrationError::unknown_user(table, row, id))
}

fn require_user(registry: &Registry, id: UserId, table: &str, row: usize) -> Result<()> {
    if registry.contains_key(&id) {
        Ok(())
    } else {
        Err(MigrationError::unknown_user(table, row, id))
    }
}

/// Friendship is mutual: one `(first, second)` row links both users.
/// Repeated pairs are kept as repeated entries.
pub fn link_friends(mut registry: Registry, rows: &[RawTuple<'_>]) -> Result<Registry> {
    for tuple in rows {
        let [_id, first, second, _time] = tuple.fields::<FRIENDS_ARITY>(FRIENDS_TABLE)?;
        let first = tuples::parse_id(first, FRIENDS_TABLE, tuple.row)?;
        let second = tuples::parse_id(second, FRIENDS_TABLE, tuple.row)?;

        // Both ends must exist before either side is touched
        require_user(&registry, first, FRIENDS_TABLE, tuple.row)?;
        require_user(&registry, second, FRIENDS_TABLE, tuple.row)?;

        user_mut(&mut registry, first, FRIENDS_TABLE, tuple.row)?
            .friends
            .push(second);
        user_mut(&mut registry, second, FRIENDS_TABLE, tuple.row)?
            .friends
            .push(first);
    }

    info!(rows = rows.len(), "Friends linked");
    Ok(registry)
}

pub fn link_ignores(mut registry: Registry, rows: &[RawTuple<'_>]) -> Result<Registry> {
    for tuple in rows {
        let [_id, user, ignored, _reason, _time] = tuple.fields::<IGNORES_ARITY>(IGNORES_TABLE)?;
        let user = tuples::parse_id(user, IGNORES_TABLE, tuple.row)?;
        let ignored = tuples::parse_id(ignored, IGNORES_TABLE, tuple.row)?;

        require_user(&registry, ignored, IGNORES_TABLE, tuple.row)?;
        user_mut(&mut registry, user, IGNORES_TABLE, tuple.row)?
            .ignores
            .push(ignored);
    }

    info!(rows = rows.len(), "Ignores linked");
    Ok(registry)
}

/// Requests are recorded on the recipient, listing who is waiting for approval.
pub fn link_friend_requests(mut registry: Registry, rows: &[RawTuple<'_>]) -> Result<Registry> {
    for tuple in rows {
        let [_id, requester, requested, _message, _time] =
            tuple.fields::<FRIEND_REQUESTS_ARITY>(FRIEND_REQUESTS_TABLE)?;
        let requester = tuples::parse_id(requester, FRIEND_REQUESTS_TABLE, tuple.row)?;
        let requested = tuples::parse_id(requested, FRIEND_REQUESTS_TABLE, tuple.row)?;

        require_user(&registry, requester, FRIEND_REQUESTS_TABLE, tuple.row)?;
        user_mut(&mut registry, requested, FRIEND_REQUESTS_TABLE, tuple.row)?
            .requests
            .push(requester);
    }

    info!(rows = rows.len(), "Friend requests linked");
    Ok(registry)
}

/// Last row for a user wins, in source order.
///
/// The code is stored un-quoted, with `NULL` mapped to `None`. The old Python
/// converter emitted the raw SQL token instead (`"'abc'"`, or `"NULL"`), so
/// importers written against its output must not strip quotes again.
pub fn link_verifications(mut registry: Registry, rows: &[RawTuple<'_>]) -> Result<Registry> {
    for tuple in rows {
        let [_id, user, _email, code, _expiry, _attempts, _resends, _use_delay, _reason] =
            tuple.fields::<VERIFICATIONS_ARITY>(VERIFICATIONS_TABLE)?;
        let user = tuples::parse_id(user, VERIFICATIONS_TABLE, tuple.row)?;

        user_mut(&mut registry, user, VERIFICATIONS_TABLE, tuple.row)?.verification_code =
            tuples::optional_string(code);
    }

    info!(rows = rows.len(), "Verifications linked");
    Ok(registry)
}
