//! Document loading from files and HTTP URLs.

use std::path::Path;

use tracing::debug;

use crate::error::ReadError;
use crate::model::OpenApi;
use crate::reader::read;

#[cfg(feature = "remote")]
use std::time::Duration;

/// Default timeout for HTTP requests (10 seconds).
#[cfg(feature = "remote")]
const HTTP_TIMEOUT: Duration = Duration::from_secs(10);

/// Load and read a document from a file path.
///
/// # Errors
///
/// Returns `ReadError::FileNotFound` if the file doesn't exist,
/// `ReadError::Io` if it can't be read, or any error of [`read`].
pub fn load_document(path: &Path) -> Result<OpenApi, ReadError> {
    if !path.exists() {
        return Err(ReadError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let content = std::fs::read_to_string(path).map_err(|source| ReadError::Io {
        path: path.to_path_buf(),
        source,
    })?;

    debug!(path = %path.display(), bytes = content.len(), "loaded document");
    read(&content)
}

/// Read a document from YAML text.
///
/// # Errors
///
/// Returns any error of [`read`].
pub fn load_document_str(content: &str) -> Result<OpenApi, ReadError> {
    read(content)
}

/// Load and read a document from an HTTP/HTTPS URL.
///
/// Requires the `remote` feature (enabled by default).
///
/// # Errors
///
/// Returns `ReadError::NetworkError` if the request fails or the server
/// answers with an error status, or any error of [`read`].
#[cfg(feature = "remote")]
pub fn load_document_url(url: &str) -> Result<OpenApi, ReadError> {
    let network_error = |source| ReadError::NetworkError {
        url: url.to_string(),
        source,
    };

    let client = reqwest::blocking::Client::builder()
        .timeout(HTTP_TIMEOUT)
        .build()
        .map_err(network_error)?;

    let response = client
        .get(url)
        .send()
        .and_then(|response| response.error_for_status())
        .map_err(network_error)?;

    let content = response.text().map_err(network_error)?;

    debug!(url, bytes = content.len(), "fetched document");
    read(&content)
}

/// Check if a string looks like a URL (starts with http:// or https://).
pub fn is_url(s: &str) -> bool {
    s.starts_with("http://") || s.starts_with("https://")
}

/// Load a document from a file path or URL.
///
/// URL loading requires the `remote` feature; without it a URL is looked up
/// as a file and reported as not found.
///
/// # Errors
///
/// Returns appropriate errors based on the source type.
pub fn load_document_auto(source: &str) -> Result<OpenApi, ReadError> {
    if is_url(source) {
        #[cfg(feature = "remote")]
        {
            load_document_url(source)
        }
        #[cfg(not(feature = "remote"))]
        {
            Err(ReadError::FileNotFound {
                path: std::path::PathBuf::from(source),
            })
        }
    } else {
        load_document(Path::new(source))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::NamedTempFile;

    const MINIMAL: &str = "openapi: 3.0.2\npaths:\n  /ping:\n    get:\n      responses:\n        '204':\n          description: pong\n";

    #[test]
    fn load_document_valid_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", MINIMAL).unwrap();

        let doc = load_document(file.path()).unwrap();
        assert_eq!(doc.version, "3.0.2");
        assert!(doc.path("/ping").is_some());
    }

    #[test]
    fn load_document_file_not_found() {
        let result = load_document(Path::new("/nonexistent/openapi.yaml"));
        assert!(matches!(result, Err(ReadError::FileNotFound { .. })));
    }

    #[test]
    fn load_document_invalid_yaml() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "paths: [unclosed").unwrap();

        let result = load_document(file.path());
        assert!(matches!(result, Err(ReadError::InvalidYaml { .. })));
    }

    #[test]
    fn load_document_reports_malformed_structure() {
        let mut file = NamedTempFile::new().unwrap();
        writeln!(file, "openapi: 3.0.2").unwrap();

        let result = load_document(file.path());
        assert!(matches!(result, Err(ReadError::MissingField { field: "paths", .. })));
    }

    #[test]
    fn load_document_str_valid() {
        let doc = load_document_str(MINIMAL).unwrap();
        assert_eq!(doc.paths[0].path, "/ping");
    }

    #[test]
    fn load_document_str_invalid() {
        let result = load_document_str("openapi: [");
        assert!(matches!(result, Err(ReadError::InvalidYaml { .. })));
    }

    #[test]
    fn is_url_https() {
        assert!(is_url("https://example.com/openapi.yaml"));
    }

    #[test]
    fn is_url_http() {
        assert!(is_url("http://example.com/openapi.yaml"));
    }

    #[test]
    fn is_url_file_path() {
        assert!(!is_url("/path/to/openapi.yaml"));
        assert!(!is_url("./openapi.yaml"));
        assert!(!is_url("openapi.yaml"));
    }

    #[test]
    fn load_document_auto_file() {
        let mut file = NamedTempFile::new().unwrap();
        write!(file, "{}", MINIMAL).unwrap();

        let doc = load_document_auto(file.path().to_str().unwrap()).unwrap();
        assert_eq!(doc.paths.len(), 1);
    }

    // Served by a local mock server, no network needed.
    #[cfg(feature = "remote")]
    mod remote {
        use super::*;

        #[test]
        fn load_document_url_valid() {
            let mut server = mockito::Server::new();
            let mock = server
                .mock("GET", "/openapi.yaml")
                .with_status(200)
                .with_header("content-type", "application/yaml")
                .with_body(MINIMAL)
                .create();

            let doc = load_document_url(&format!("{}/openapi.yaml", server.url())).unwrap();
            assert!(doc.path("/ping").is_some());
            mock.assert();
        }

        #[test]
        fn load_document_url_404() {
            let mut server = mockito::Server::new();
            server.mock("GET", "/missing.yaml").with_status(404).create();

            let result = load_document_url(&format!("{}/missing.yaml", server.url()));
            assert!(matches!(result, Err(ReadError::NetworkError { .. })));
        }

        #[test]
        fn load_document_url_invalid_body() {
            let mut server = mockito::Server::new();
            server
                .mock("GET", "/broken.yaml")
                .with_status(200)
                .with_body("openapi: [")
                .create();

            let result = load_document_url(&format!("{}/broken.yaml", server.url()));
            assert!(matches!(result, Err(ReadError::InvalidYaml { .. })));
        }

        #[test]
        fn load_document_auto_url() {
            let mut server = mockito::Server::new();
            server
                .mock("GET", "/openapi.yaml")
                .with_status(200)
                .with_body(MINIMAL)
                .create();

            let result = load_document_auto(&format!("{}/openapi.yaml", server.url()));
            assert!(result.is_ok());
        }
    }
}
