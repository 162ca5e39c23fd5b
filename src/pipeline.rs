use crate::config::{
    FRIENDS_TABLE, FRIEND_REQUESTS_TABLE, IGNORES_TABLE, REQUIRED_TABLES, USERS_TABLE,
    VERIFICATIONS_TABLE,
};
use crate::error::Result;
use crate::export;
use crate::links;
use crate::models::OutputDocument;
use crate::statements::TableInserts;
use crate::stats::MigrationStats;
use crate::tuples::{self, RawTuple};
use crate::users;
use std::fmt;
use tracing::info;

/// Completed pipeline stages, reported in this order
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Stage {
    Queries,
    Users,
    Friends,
    Ignores,
    Requests,
    Verifications,
}

impl Stage {
    pub fn marker(self) -> &'static str {
        match self {
            Stage::Queries => "Got queries",
            Stage::Users => "Built users",
            Stage::Friends => "Built friends",
            Stage::Ignores => "Built ignores",
            Stage::Requests => "Built requests",
            Stage::Verifications => "Built verifications",
        }
    }
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.marker())
    }
}

#[derive(Debug)]
pub struct Migration {
    pub document: OutputDocument,
    pub stats: MigrationStats,
}

pub fn run(dump: &str) -> Result<Migration> {
    run_with_progress(dump, |_| {})
}

/// Runs every stage in order, calling `on_stage` after each one completes.
/// The first failing stage aborts the run.
pub fn run_with_progress(dump: &str, mut on_stage: impl FnMut(Stage)) -> Result<Migration> {
    let mut stats = MigrationStats::new();

    let inserts = TableInserts::extract(dump)?;
    inserts.require_all(&REQUIRED_TABLES)?;
    stats.insert_tables = inserts.table_count();
    on_stage(Stage::Queries);

    let rows = table_rows(&inserts, USERS_TABLE)?;
    let (registry, duplicated_emails) = users::build_users(&rows)?;
    on_stage(Stage::Users);

    let rows = table_rows(&inserts, FRIENDS_TABLE)?;
    let registry = links::link_friends(registry, &rows)?;
    stats.friend_rows = rows.len();
    on_stage(Stage::Friends);

    let rows = table_rows(&inserts, IGNORES_TABLE)?;
    let registry = links::link_ignores(registry, &rows)?;
    stats.ignore_rows = rows.len();
    on_stage(Stage::Ignores);

    let rows = table_rows(&inserts, FRIEND_REQUESTS_TABLE)?;
    let registry = links::link_friend_requests(registry, &rows)?;
    stats.request_rows = rows.len();
    on_stage(Stage::Requests);

    let rows = table_rows(&inserts, VERIFICATIONS_TABLE)?;
    let registry = links::link_verifications(registry, &rows)?;
    stats.verification_rows = rows.len();
    on_stage(Stage::Verifications);

    let document = export::build_document(registry, duplicated_emails);
    stats.record_document(&document);

    info!(
        users = stats.users,
        duplicated_emails = stats.duplicated_emails,
        "Pipeline complete"
    );

    Ok(Migration { document, stats })
}

fn table_rows<'a>(inserts: &TableInserts<'a>, table: &str) -> Result<Vec<RawTuple<'a>>> {
    let rows = tuples::decode_table(table, inserts.statements(table)?)?;
    info!(table, rows = rows.len(), "Decoded rows");
    Ok(rows)
}
