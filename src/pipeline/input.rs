//! Input resolution: turn the configured path or URL into a local PDF file.
//!
//! pdfium opens files by path, so URL inputs are downloaded into a
//! [`TempDir`] owned by the returned [`ResolvedInput`]; the directory is
//! removed when the value is dropped. Local inputs are checked for existence,
//! read permission and the `%PDF` magic bytes before any rendering starts.

use crate::error::ExtractError;
use std::io::Read;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::TempDir;
use tracing::{debug, info};

const PDF_MAGIC: &[u8; 4] = b"%PDF";

/// A PDF ready for rendering.
#[derive(Debug)]
pub enum ResolvedInput {
    /// Input was already a local file.
    Local(PathBuf),
    /// Input was a URL. `_temp_dir` keeps the download alive.
    Downloaded { path: PathBuf, _temp_dir: TempDir },
}

impl ResolvedInput {
    /// Path to the PDF file regardless of how it was resolved.
    pub fn path(&self) -> &Path {
        match self {
            ResolvedInput::Local(p) => p,
            ResolvedInput::Downloaded { path, .. } => path,
        }
    }
}

/// Check if the input string looks like an HTTP(S) URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Resolve `input` to a local PDF path, downloading URLs first.
pub async fn resolve_input(input: &str, timeout_secs: u64) -> Result<ResolvedInput, ExtractError> {
    if is_url(input) {
        download(input, timeout_secs).await
    } else {
        resolve_local(Path::new(input))
    }
}

/// Validate a local PDF path.
pub fn resolve_local(path: &Path) -> Result<ResolvedInput, ExtractError> {
    if !path.is_file() {
        return Err(ExtractError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    let mut file = std::fs::File::open(path).map_err(|e| match e.kind() {
        std::io::ErrorKind::PermissionDenied => ExtractError::PermissionDenied {
            path: path.to_path_buf(),
        },
        _ => ExtractError::FileNotFound {
            path: path.to_path_buf(),
        },
    })?;

    // Files shorter than four bytes are left for pdfium to reject as corrupt.
    let mut magic = [0u8; 4];
    if file.read_exact(&mut magic).is_ok() && &magic != PDF_MAGIC {
        return Err(ExtractError::NotAPdf {
            path: path.to_path_buf(),
            magic,
        });
    }

    debug!("Resolved local PDF: {}", path.display());
    Ok(ResolvedInput::Local(path.to_path_buf()))
}

async fn download(url: &str, timeout_secs: u64) -> Result<ResolvedInput, ExtractError> {
    info!("Downloading PDF from: {}", url);
    let failed = |reason: String| ExtractError::DownloadFailed {
        url: url.to_string(),
        reason,
    };

    let client = reqwest::Client::builder()
        .timeout(Duration::from_secs(timeout_secs))
        .build()
        .map_err(|e| failed(e.to_string()))?;

    let response = client.get(url).send().await.map_err(|e| {
        if e.is_timeout() {
            failed(format!("timed out after {timeout_secs}s"))
        } else {
            failed(e.to_string())
        }
    })?;

    if !response.status().is_success() {
        return Err(failed(format!("HTTP {}", response.status())));
    }

    let bytes = response.bytes().await.map_err(|e| failed(e.to_string()))?;

    let temp_dir = TempDir::new().map_err(|e| ExtractError::Internal(e.to_string()))?;
    let path = temp_dir.path().join(filename_from_url(url));

    if bytes.len() >= 4 && &bytes[..4] != PDF_MAGIC {
        let mut magic = [0u8; 4];
        magic.copy_from_slice(&bytes[..4]);
        return Err(ExtractError::NotAPdf { path, magic });
    }

    tokio::fs::write(&path, &bytes)
        .await
        .map_err(|e| ExtractError::Internal(format!("Failed to write temp file: {e}")))?;

    info!("Downloaded {} bytes to {}", bytes.len(), path.display());
    Ok(ResolvedInput::Downloaded {
        path,
        _temp_dir: temp_dir,
    })
}

/// Last path segment of the URL when it looks like a file name.
fn filename_from_url(url: &str) -> String {
    reqwest::Url::parse(url)
        .ok()
        .and_then(|parsed| {
            parsed
                .path_segments()
                .and_then(|mut segments| segments.next_back().map(str::to_string))
        })
        .filter(|last| !last.is_empty() && last.contains('.'))
        .unwrap_or_else(|| "offer.pdf".to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_is_url() {
        assert!(is_url("https://example.com/offer.pdf"));
        assert!(is_url("http://example.com/offer.pdf"));
        assert!(!is_url("uploads/offer1.pdf"));
        assert!(!is_url(""));
    }

    #[test]
    fn filename_taken_from_url_path() {
        assert_eq!(
            filename_from_url("https://example.com/files/quote-118.pdf"),
            "quote-118.pdf"
        );
        assert_eq!(filename_from_url("https://example.com/download"), "offer.pdf");
        assert_eq!(filename_from_url("not a url"), "offer.pdf");
    }

    #[test]
    fn missing_file_is_not_found() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("uploads/offer1.pdf");
        assert!(matches!(
            resolve_local(&path),
            Err(ExtractError::FileNotFound { .. })
        ));
    }

    #[test]
    fn directory_is_not_a_file() {
        let dir = tempfile::tempdir().unwrap();
        assert!(matches!(
            resolve_local(dir.path()),
            Err(ExtractError::FileNotFound { .. })
        ));
    }

    #[test]
    fn wrong_magic_is_rejected() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"PK\x03\x04 not a pdf").unwrap();
        match resolve_local(f.path()) {
            Err(ExtractError::NotAPdf { magic, .. }) => assert_eq!(&magic, b"PK\x03\x04"),
            other => panic!("expected NotAPdf, got {other:?}"),
        }
    }

    #[test]
    fn pdf_magic_is_accepted() {
        let mut f = tempfile::NamedTempFile::new().unwrap();
        f.write_all(b"%PDF-1.7\n").unwrap();
        let resolved = resolve_local(f.path()).unwrap();
        assert_eq!(resolved.path(), f.path());
    }

    #[tokio::test]
    async fn resolve_input_routes_paths_locally() {
        let result = resolve_input("/definitely/not/here/offer1.pdf", 5).await;
        assert!(matches!(result, Err(ExtractError::FileNotFound { .. })));
    }
}
