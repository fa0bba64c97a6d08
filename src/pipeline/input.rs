//! Input checks: make sure the deck is a readable PDF before binding PDFium.
//!
//! Checking the `%PDF` magic bytes up front turns "PDFium failed to load"
//! into an error that names the actual problem.

use crate::error::RenderError;
use std::io::Read;
use std::path::Path;
use tracing::debug;

/// Check if the input string looks like a remote URL.
pub fn is_url(input: &str) -> bool {
    input.starts_with("http://") || input.starts_with("https://")
}

/// Validate that `path` exists, is readable and starts with `%PDF`.
pub fn validate_pdf(path: &Path) -> Result<(), RenderError> {
    if !path.exists() {
        return Err(RenderError::FileNotFound {
            path: path.to_path_buf(),
        });
    }

    match std::fs::File::open(path) {
        Ok(mut f) => {
            let mut magic = [0u8; 4];
            if f.read_exact(&mut magic).is_ok() && &magic != b"%PDF" {
                return Err(RenderError::NotAPdf {
                    path: path.to_path_buf(),
                    magic,
                });
            }
        }
        Err(e) if e.kind() == std::io::ErrorKind::PermissionDenied => {
            return Err(RenderError::PermissionDenied {
                path: path.to_path_buf(),
            });
        }
        Err(_) => {
            return Err(RenderError::FileNotFound {
                path: path.to_path_buf(),
            });
        }
    }

    debug!("Validated PDF input: {}", path.display());
    Ok(())
}

/// Base name of the deck without extension, used to name output files.
///
/// Falls back to `"deck"` for paths without a usable stem.
pub fn deck_stem(path: &Path) -> String {
    path.file_stem()
        .map(|s| s.to_string_lossy().into_owned())
        .filter(|s| !s.is_empty())
        .unwrap_or_else(|| "deck".to_string())
}
