//! Path classification: corpus layout `root/username/folder/.../message`.

use std::path::{Component, Path};

use crate::config::LayoutConfig;

/// Expected shape of message paths below the corpus root.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PathLayout {
    /// Minimum directory segments below the root (user + folder levels).
    pub min_depth: usize,
    /// Trailing directory segments left out of the folder name.
    pub trailing_segments: usize,
}

impl Default for PathLayout {
    fn default() -> Self {
        Self {
            min_depth: 2,
            trailing_segments: 0,
        }
    }
}

impl From<&LayoutConfig> for PathLayout {
    fn from(cfg: &LayoutConfig) -> Self {
        Self {
            min_depth: cfg.min_depth,
            trailing_segments: cfg.trailing_segments,
        }
    }
}

/// Metadata derived from a message path.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClassifiedPath {
    pub id: String,
    pub username: String,
    pub folder: String,
}

/// Why a path was not turned into a document.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum SkipReason {
    #[error("path is not below the corpus root")]
    OutsideRoot,
    #[error("path has {depth} directory level(s) below the root, need {required}")]
    TooShallow { depth: usize, required: usize },
    #[error("no folder segment left after trimming")]
    EmptyFolder,
}

/// Classify a message file found under `root`.
pub fn classify(root: &Path, path: &Path, layout: &PathLayout) -> Result<ClassifiedPath, SkipReason> {
    let relative = path.strip_prefix(root).map_err(|_| SkipReason::OutsideRoot)?;

    let segments: Vec<String> = relative
        .components()
        .filter_map(|c| match c {
            Component::Normal(s) => Some(s.to_string_lossy().into_owned()),
            _ => None,
        })
        .collect();

    // Last segment is the message file itself
    let dirs = match segments.split_last() {
        Some((_, dirs)) => dirs,
        None => &[][..],
    };

    if dirs.len() < layout.min_depth {
        return Err(SkipReason::TooShallow {
            depth: dirs.len(),
            required: layout.min_depth,
        });
    }

    let folder_end = dirs.len().saturating_sub(layout.trailing_segments);
    let folder_segments = dirs.get(1..folder_end).unwrap_or_default();
    if folder_segments.is_empty() {
        return Err(SkipReason::EmptyFolder);
    }

    Ok(ClassifiedPath {
        id: document_id(path),
        username: dirs[0].clone(),
        folder: folder_segments.join("/"),
    })
}

/// Flatten a path into a document identifier.
///
/// Every path separator and `.` becomes `_`, so `maildir/allen-p/inbox/1.`
/// maps to `maildir_allen-p_inbox_1_`.
///
/// The mapping is not injective: paths that differ only in `/`, `\`, `.`
/// or `_` at the same position (`a.b` and `a_b`) share an id, and the
/// second one is then treated as already indexed.
pub fn document_id(path: &Path) -> String {
    path.to_string_lossy()
        .chars()
        .map(|c| match c {
            '/' | '\\' | '.' => '_',
            c => c,
        })
        .collect()
}
