//! # pdfium-locate
//!
//! Find and bind a [PDFium](https://pdfium.googlesource.com/pdfium/) shared
//! library for `pdfium-render`, without hidden platform checks inside the
//! rendering code.
//!
//! Discovery is split from binding:
//!
//! 1. [`discover_pdfium_library`] runs once at the process boundary. It takes
//!    an explicit location (CLI flag or `PDFIUM_LIB_PATH`, read by the caller)
//!    and, failing that, asks Homebrew on macOS. Every failure is soft and
//!    yields `None`.
//! 2. [`bind_pdfium`] takes that `Option<&Path>` and binds to it, or to the
//!    system library when `None`.
//!
//! ```rust,no_run
//! use pdfium_locate::{bind_pdfium, discover_pdfium_library};
//!
//! let lib = discover_pdfium_library(None);
//! let pdfium = bind_pdfium(lib.as_deref()).expect("PDFium unavailable");
//! ```

use std::path::{Path, PathBuf};
use std::process::Command;

use pdfium_render::prelude::Pdfium;
use thiserror::Error;
use tracing::{debug, warn};

/// Environment variable conventionally used to point at an existing library.
///
/// This crate never reads it; binaries pass its value to
/// [`discover_pdfium_library`].
pub const PDFIUM_LIB_ENV: &str = "PDFIUM_LIB_PATH";

/// Homebrew formula queried on macOS.
const BREW_FORMULA: &str = "pdfium";

// ── Error type ───────────────────────────────────────────────────────────────

/// Errors returned when binding to PDFium.
#[derive(Error, Debug)]
pub enum PdfiumLocateError {
    /// `pdfium-render` could not load the library at an explicit path.
    #[error("Failed to bind PDFium from '{path}': {reason}")]
    Bind { path: PathBuf, reason: String },

    /// No explicit path was given and the system library could not be loaded.
    #[error(
        "Failed to bind the system PDFium library ({name}): {reason}\n\
         Install pdfium or pass its location with --pdfium-lib / {env}.",
        name = platform_library_name(),
        env = PDFIUM_LIB_ENV
    )]
    BindSystem { reason: String },
}

// ── Platform naming ──────────────────────────────────────────────────────────

/// File name of the PDFium shared library on the current platform.
pub fn platform_library_name() -> &'static str {
    match std::env::consts::OS {
        "macos" | "ios" => "libpdfium.dylib",
        "windows" => "pdfium.dll",
        _ => "libpdfium.so",
    }
}

/// Turn a user-supplied location into a library file path.
///
/// A directory is completed with [`platform_library_name`]; anything else is
/// returned unchanged.
pub fn resolve_library_path(location: &Path) -> PathBuf {
    if location.is_dir() {
        location.join(platform_library_name())
    } else {
        location.to_path_buf()
    }
}

// ── Discovery ────────────────────────────────────────────────────────────────

/// Best-effort lookup of a PDFium library.
///
/// Order:
/// 1. `explicit`, resolved with [`resolve_library_path`], when it exists.
/// 2. On macOS, `$(brew --prefix pdfium)/lib/libpdfium.dylib`.
///
/// Returns `None` when nothing is found, which callers treat as "use the
/// system library".
pub fn discover_pdfium_library(explicit: Option<&Path>) -> Option<PathBuf> {
    if let Some(location) = explicit {
        let path = resolve_library_path(location);
        if path.exists() {
            debug!("Using explicit PDFium library: {}", path.display());
            return Some(path);
        }
        warn!(
            "PDFium library '{}' not found; falling back to discovery",
            path.display()
        );
    }

    if cfg!(target_os = "macos") {
        if let Some(prefix) = brew_prefix(BREW_FORMULA) {
            let path = prefix.join("lib").join(platform_library_name());
            if path.exists() {
                debug!("Found PDFium via Homebrew: {}", path.display());
                return Some(path);
            }
        }
    }

    None
}

/// Ask Homebrew for the install prefix of `formula`.
///
/// Any failure (brew missing, formula not installed, non-UTF-8 output) is
/// reported as `None`.
pub fn brew_prefix(formula: &str) -> Option<PathBuf> {
    let output = Command::new("brew")
        .args(["--prefix", formula])
        .output()
        .ok()?;
    if !output.status.success() {
        debug!("brew --prefix {formula} exited with {}", output.status);
        return None;
    }
    parse_prefix_output(&output.stdout)
}

fn parse_prefix_output(stdout: &[u8]) -> Option<PathBuf> {
    let text = std::str::from_utf8(stdout).ok()?.trim();
    if text.is_empty() {
        None
    } else {
        Some(PathBuf::from(text))
    }
}

// ── Binding ──────────────────────────────────────────────────────────────────

/// Bind to PDFium at `library`, or to the system library when `None`.
pub fn bind_pdfium(library: Option<&Path>) -> Result<Pdfium, PdfiumLocateError> {
    match library {
        Some(location) => bind_pdfium_from_path(&resolve_library_path(location)),
        None => Pdfium::bind_to_system_library()
            .map(Pdfium::new)
            .map_err(|e| PdfiumLocateError::BindSystem {
                reason: format!("{e:?}"),
            }),
    }
}

/// Bind to a PDFium library at an explicit file `path`.
pub fn bind_pdfium_from_path(path: &Path) -> Result<Pdfium, PdfiumLocateError> {
    Pdfium::bind_to_library(path)
        .map(Pdfium::new)
        .map_err(|e| PdfiumLocateError::Bind {
            path: path.to_path_buf(),
            reason: format!("{e:?}"),
        })
}

// ── Tests ─────────────────────────────────────────────────────────────────────
