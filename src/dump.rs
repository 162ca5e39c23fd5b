use anyhow::{Context, Result};
use bzip2::read::BzDecoder;
use std::fs::{self, File};
use std::io::{BufReader, Read};
use std::path::Path;
use tracing::info;

/// Reads the whole dump into memory, decompressing `.bz2` inputs on the fly.
pub fn read_dump(path: &Path) -> Result<String> {
    let is_bz2 = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("bz2"));

    let text = if is_bz2 {
        let file = File::open(path)
            .with_context(|| format!("Failed to open dump: {}", path.display()))?;
        let mut decoder = BzDecoder::new(BufReader::new(file));
        let mut text = String::new();
        decoder
            .read_to_string(&mut text)
            .with_context(|| format!("Failed to decompress dump: {}", path.display()))?;
        text
    } else {
        fs::read_to_string(path)
            .with_context(|| format!("Failed to read dump: {}", path.display()))?
    };

    info!(
        path = %path.display(),
        compressed = is_bz2,
        bytes = text.len(),
        "Dump loaded"
    );

    Ok(text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use bzip2::write::BzEncoder;
    use bzip2::Compression;
    use std::io::Write;
    use tempfile::TempDir;

    #[test]
    fn reads_plain_dump() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("backup.sql");
        fs::write(&path, "INSERT INTO `users` VALUES (1);").unwrap();

        assert_eq!(read_dump(&path).unwrap(), "INSERT INTO `users` VALUES (1);");
    }

    #[test]
    fn reads_bz2_dump() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("backup.sql.bz2");

        let mut encoder = BzEncoder::new(Vec::new(), Compression::fast());
        encoder.write_all(b"INSERT INTO `friends` VALUES (1,1,2,'d');").unwrap();
        fs::write(&path, encoder.finish().unwrap()).unwrap();

        assert_eq!(
            read_dump(&path).unwrap(),
            "INSERT INTO `friends` VALUES (1,1,2,'d');"
        );
    }

    #[test]
    fn missing_file_reports_path() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nope.sql");
        let err = read_dump(&path).unwrap_err();
        assert!(format!("{:#}", err).contains("nope.sql"));
    }
}
