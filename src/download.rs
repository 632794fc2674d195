//! Fetching a generated client from a running server.
//!
//! A server publishing its client serves the module at the discovery path;
//! this module downloads it and stores it locally.

use crate::output::write_to_file;
use log::{debug, info};
use std::path::Path;
use std::time::Duration;

/// Path under which a server publishes its generated client
pub const DISCOVERY_PATH: &str = "/fastroutes";

const TIMEOUT: Duration = Duration::from_secs(30);

/// Download failures
#[derive(Debug)]
pub enum DownloadError {
    /// The request could not be sent or the body could not be read
    Transport(reqwest::Error),
    /// The server answered with a non-success status
    Status(u16),
    /// The downloaded module could not be stored
    Write(anyhow::Error),
}

impl std::fmt::Display for DownloadError {
    fn fmt(&self, f: &mut std::fmt::Formatter) -> std::fmt::Result {
        match self {
            DownloadError::Transport(e) => write!(f, "Failed to fetch client code: {}", e),
            DownloadError::Status(status) => {
                write!(f, "Failed to fetch client code: server returned status {}", status)
            }
            DownloadError::Write(e) => write!(f, "Failed to save client code: {:#}", e),
        }
    }
}

impl std::error::Error for DownloadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            DownloadError::Transport(e) => Some(e),
            DownloadError::Write(e) => Some(&**e),
            DownloadError::Status(_) => None,
        }
    }
}

impl From<reqwest::Error> for DownloadError {
    fn from(err: reqwest::Error) -> Self {
        DownloadError::Transport(err)
    }
}

/// Appends the discovery path unless the URL already ends with it
pub fn discovery_url(url: &str) -> String {
    if url.ends_with(DISCOVERY_PATH) {
        url.to_string()
    } else {
        format!("{}{}", url.trim_end_matches('/'), DISCOVERY_PATH)
    }
}

/// Downloads the client module published at `url` and writes it to `output`.
///
/// Returns the number of bytes written.
pub fn download(url: &str, output: &Path) -> Result<usize, DownloadError> {
    let url = discovery_url(url);
    info!("Fetching client code from {}", url);

    let client = reqwest::blocking::Client::builder().timeout(TIMEOUT).build()?;
    let response = client.get(&url).send()?;

    if !response.status().is_success() {
        return Err(DownloadError::Status(response.status().as_u16()));
    }

    let body = response.bytes()?;
    debug!("Received {} bytes", body.len());

    write_to_file(&body, output).map_err(DownloadError::Write)?;
    Ok(body.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_discovery_url() {
        assert_eq!(discovery_url("http://localhost:8000"), "http://localhost:8000/fastroutes");
        assert_eq!(discovery_url("http://localhost:8000/"), "http://localhost:8000/fastroutes");
        assert_eq!(discovery_url("http://localhost:8000/api//"), "http://localhost:8000/api/fastroutes");
        assert_eq!(
            discovery_url("http://localhost:8000/fastroutes"),
            "http://localhost:8000/fastroutes"
        );
    }

    #[test]
    fn test_unreachable_server_is_a_transport_error() {
        let temp_dir = TempDir::new().unwrap();
        let output = temp_dir.path().join("client.py");

        // Nothing listens on the discard port
        let err = download("http://127.0.0.1:9", &output).unwrap_err();

        assert!(matches!(err, DownloadError::Transport(_)));
        assert!(err.to_string().starts_with("Failed to fetch client code"));
        assert!(!output.exists());
    }

    #[test]
    fn test_write_error_display() {
        let err = DownloadError::Write(anyhow::anyhow!("disk full"));
        assert_eq!(err.to_string(), "Failed to save client code: disk full");
        assert!(std::error::Error::source(&err).is_some());

        assert_eq!(
            DownloadError::Status(404).to_string(),
            "Failed to fetch client code: server returned status 404"
        );
    }
}
