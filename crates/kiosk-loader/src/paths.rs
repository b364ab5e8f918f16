//! Object path classification.
//!
//! This module is the single source of truth for mapping storage object
//! paths to record families. Families are tried in fixed priority order
//! (archive before most-popular); a path matching neither prefix is an
//! explicit no-op, not an error.

use chrono::NaiveDate;

use crate::error::{LoadError, Result};
use crate::family::{Family, PathMeta};

/// A file matched to a family, carrying any path-derived metadata.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedFile {
    /// The family this file belongs to.
    pub family: Family,
    /// Full object path (including the root prefix), as stored in the
    /// manifest.
    pub path: String,
    /// Metadata extracted from the path.
    pub meta: PathMeta,
}

/// Outcome of classifying an object path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Classification {
    /// The path belongs to a known family.
    File(ClassifiedFile),
    /// The path matches no known family prefix; the event is a no-op.
    Ignored,
}

/// Classifies an object path against the known family prefixes.
///
/// The root prefix is stripped first (both `prefix/` and bare `prefix`
/// forms are handled). For most-popular paths the embedded `YYYY-MM-DD`
/// segment is extracted.
///
/// # Errors
///
/// Returns [`LoadError::MalformedPath`] if a path matches the most-popular
/// prefix but no snapshot date can be extracted: such a file cannot be
/// loaded without its partition key, so it must not be silently skipped.
pub fn classify(root_prefix: &str, object_name: &str) -> Result<Classification> {
    let relative = strip_root(root_prefix, object_name);

    if relative.starts_with(Family::Archive.path_prefix()) {
        return Ok(Classification::File(ClassifiedFile {
            family: Family::Archive,
            path: object_name.to_string(),
            meta: PathMeta::default(),
        }));
    }

    if let Some(rest) = relative.strip_prefix(Family::MostPopular.path_prefix()) {
        let snapshot_date = extract_snapshot_date(rest)
            .ok_or_else(|| LoadError::MalformedPath(object_name.to_string()))?;
        return Ok(Classification::File(ClassifiedFile {
            family: Family::MostPopular,
            path: object_name.to_string(),
            meta: PathMeta {
                snapshot_date: Some(snapshot_date),
            },
        }));
    }

    Ok(Classification::Ignored)
}

fn strip_root<'a>(root_prefix: &str, name: &'a str) -> &'a str {
    if root_prefix.is_empty() {
        return name;
    }
    if let Some(rest) = name.strip_prefix(root_prefix) {
        return rest.strip_prefix('/').unwrap_or(rest);
    }
    name
}

/// Extracts the `YYYY-MM-DD` directory segment from the remainder of a
/// most-popular path (e.g. `2026-02-19/viewed_30.ndjson`).
fn extract_snapshot_date(rest: &str) -> Option<NaiveDate> {
    let (segment, _) = rest.split_once('/')?;
    if segment.len() != 10 {
        return None;
    }
    NaiveDate::parse_from_str(segment, "%Y-%m-%d").ok()
}
