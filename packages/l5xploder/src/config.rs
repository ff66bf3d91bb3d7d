//! Configuration constants and validation functions for the exploder.

use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;

use crate::error::{PloderError, Result};

/// Fixed subdirectory under the caller's destination that holds the exploded tree.
///
/// The whole subdirectory is replaced on every explode, so unrelated files
/// next to it are left alone.
pub const EXPLODED_SUBDIR_NAME: &str = "RSLogix5000Content";

/// Expected root element of an L5X document.
pub const ROOT_ELEMENT_NAME: &str = "RSLogix5000Content";

/// Base file name of the root shell document.
pub const ROOT_DOCUMENT_BASE_NAME: &str = "RSLogix5000Content";

/// File name of the persisted options record.
pub const OPTIONS_FILE_NAME: &str = "export-options.yaml";

/// Extension of markup element files.
pub const XML_FILE_EXTENSION: &str = ".xml";

/// Extension of JSON element files.
pub const JSON_FILE_EXTENSION: &str = ".json";

/// Extension of structured text files.
pub const STRUCTURED_TEXT_FILE_EXTENSION: &str = ".st";

/// Base name used when a node has no usable name.
pub const UNNAMED_ELEMENT: &str = "unnamed_element";

/// Lower bound of the I/O worker pool.
pub const MIN_WORKERS: usize = 4;

/// Upper bound of the I/O worker pool.
pub const MAX_WORKERS: usize = 96;

/// Attempts made when removing a previous exploded tree.
pub const CLEANUP_MAX_ATTEMPTS: u32 = 10;

/// Base delay between removal attempts; attempt `n` waits `n` times this.
pub const CLEANUP_RETRY_DELAY_MS: u64 = 250;

/// Characters that are not allowed in file names on common filesystems.
#[allow(clippy::expect_used)] // Static regex that is guaranteed to be valid
static INVALID_FILE_NAME_CHARS: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r#"[<>:"/\\|?*\x00-\x1F]"#).expect("valid regex"));

/// Number of workers used for parallel reads and writes.
///
/// At least [`MIN_WORKERS`], at most the lesser of the CPU count and [`MAX_WORKERS`].
pub fn worker_count() -> usize {
    let cpus = std::thread::available_parallelism()
        .map(|n| n.get())
        .unwrap_or(1);
    cpus.min(MAX_WORKERS).max(MIN_WORKERS)
}

/// Make a node-derived name safe to use as a file or folder name.
///
/// Surrounding whitespace is trimmed. Names rebuilt from a file stem, such
/// as structured text routine names, come back in this sanitized form.
///
/// # Examples
/// ```
/// use l5xploder::config::sanitize_file_name;
///
/// assert_eq!(sanitize_file_name("Motor_01"), "Motor_01");
/// assert_eq!(sanitize_file_name("a/b:c"), "a_b_c");
/// assert_eq!(sanitize_file_name(" Calc "), "Calc");
/// assert_eq!(sanitize_file_name("   "), "unnamed_element");
/// ```
pub fn sanitize_file_name(name: &str) -> String {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return UNNAMED_ELEMENT.to_string();
    }
    INVALID_FILE_NAME_CHARS.replace_all(trimmed, "_").into_owned()
}

/// Validate that a path names an L5X file.
///
/// # Examples
/// ```
/// use l5xploder::config::validate_l5x_path;
///
/// assert!(validate_l5x_path("project.L5X").is_ok());
/// assert!(validate_l5x_path("project.l5x").is_ok());
/// assert!(validate_l5x_path("project.xml").is_err());
/// ```
pub fn validate_l5x_path(path: impl AsRef<Path>) -> Result<()> {
    let path = path.as_ref();
    let is_l5x = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("l5x"));
    if is_l5x {
        Ok(())
    } else {
        Err(PloderError::InvalidL5xPath(path.display().to_string()))
    }
}

/// Join two `/`-separated relative paths, skipping empty parts.
pub fn join_rel(base: &str, name: &str) -> String {
    match (base.is_empty(), name.is_empty()) {
        (true, _) => name.to_string(),
        (_, true) => base.to_string(),
        _ => format!("{base}/{name}"),
    }
}

/// Ordinal, case-insensitive ordering of names.
///
/// Names are compared upper-cased first, then exactly, so the result is
/// total and independent of filesystem enumeration order.
pub fn cmp_ignore_case(a: &str, b: &str) -> std::cmp::Ordering {
    a.to_uppercase()
        .cmp(&b.to_uppercase())
        .then_with(|| a.cmp(b))
}
