use crate::models::{OutputDocument, Registry};
use anyhow::{Context, Result};
use std::ffi::OsString;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};
use tracing::{info, warn};

pub fn build_document(users: Registry, duplicated_emails: Vec<String>) -> OutputDocument {
    OutputDocument {
        users,
        duplicated_emails,
    }
}

/// Serializes the document to JSON and writes it atomically via rename, so a
/// failed run never leaves a partial export behind.
pub fn write_document(document: &OutputDocument, path: &Path, pretty: bool) -> Result<()> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {:?}", parent))?;
    }

    let tmp_path = temp_path(path);
    if let Err(e) = write_then_rename(document, &tmp_path, path, pretty) {
        if tmp_path.exists() {
            if let Err(remove_err) = fs::remove_file(&tmp_path) {
                warn!(error = %remove_err, path = ?tmp_path, "Failed to remove temp export file");
            }
        }
        return Err(e);
    }

    info!(
        users = document.users.len(),
        duplicated_emails = document.duplicated_emails.len(),
        path = ?path,
        "Export written"
    );

    Ok(())
}

/// `<file name>.tmp` next to the target, whatever the target's extension.
fn temp_path(path: &Path) -> PathBuf {
    let mut name = path.file_name().map(OsString::from).unwrap_or_default();
    name.push(".tmp");
    path.with_file_name(name)
}

fn write_then_rename(
    document: &OutputDocument,
    tmp_path: &Path,
    path: &Path,
    pretty: bool,
) -> Result<()> {
    let file = File::create(tmp_path)
        .with_context(|| format!("Failed to create temp export file: {:?}", tmp_path))?;
    let mut writer = BufWriter::new(file);

    let serialized = if pretty {
        serde_json::to_writer_pretty(&mut writer, document)
    } else {
        serde_json::to_writer(&mut writer, document)
    };
    serialized.context("Failed to serialize export document")?;
    writer
        .flush()
        .with_context(|| format!("Failed to flush export file: {:?}", tmp_path))?;
    drop(writer);

    fs::rename(tmp_path, path)
        .with_context(|| format!("Failed to rename temp export file to: {:?}", path))
}
