use std::fs;

use tracing::{debug, info};

use crate::error::Result;

/// Whether a source names a remote file rather than a local path.
pub fn is_remote(source: &str) -> bool {
    source.starts_with("http://") || source.starts_with("https://")
}

/// Retrieves the raw bytes of a source, once.
///
/// Remote sources are fetched with a blocking HTTP GET; there is no caching
/// and no retry. Anything else is read from the local filesystem.
pub fn read_source(source: &str) -> Result<Vec<u8>> {
    let bytes = if is_remote(source) {
        info!(url = source, "fetching remote file");
        let response = reqwest::blocking::get(source)?.error_for_status()?;
        response.bytes()?.to_vec()
    } else {
        info!(path = source, "reading local file");
        fs::read(source)?
    };

    debug!(bytes = bytes.len(), "source retrieved");
    Ok(bytes)
}

#[cfg(test)]
mod tests {
    use crate::error::Error;

    use super::{is_remote, read_source};

    #[test]
    fn test_is_remote() {
        assert!(is_remote("https://example.org/transit_cost.csv"));
        assert!(is_remote("http://example.org/transit_cost.csv"));
        assert!(!is_remote("testdata/csv/transit_cost.csv"));
    }

    #[test]
    fn test_read_source_local() {
        let bytes = read_source("testdata/csv/transit_cost.csv").unwrap();
        assert!(bytes.starts_with(b"e,country,city"));
    }

    #[test]
    fn test_read_source_missing_file() {
        let result = read_source("testdata/csv/does_not_exist.csv");
        assert!(matches!(result, Err(Error::Io { .. })));
    }
}
