use std::fs;
use std::path::{Path, PathBuf};
use std::time::SystemTime;

use super::structures::DosDateTime;

/// What a source path turned out to be when classified.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    File,
    Directory,
    Symlink,
}

/// A caller-supplied entry: a source path plus optional overrides for the
/// in-archive name and timestamp.
#[derive(Debug, Clone)]
pub struct Entry {
    pub path: PathBuf,
    /// In-archive name; defaults to the path's final component.
    pub name: Option<String>,
    /// Timestamp; defaults to the source's mtime.
    pub time: Option<SystemTime>,
}

impl Entry {
    pub fn from_path(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            name: None,
            time: None,
        }
    }

    pub fn named(path: impl Into<PathBuf>, name: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            name: Some(name.into()),
            time: None,
        }
    }
}

/// Hook for re-encoding entry names before they hit the archive.
///
/// Receives the UTF-8 archive path (with the trailing `/` for
/// directories); `None` means the name could not be represented and the
/// raw UTF-8 bytes are used instead. Encoding trouble never fails a build.
pub type NameEncoder = Box<dyn Fn(&str) -> Option<Vec<u8>>>;

/// An entry fixed for writing: classification done, archive path and
/// name bytes computed once, timestamp packed. Nothing downstream ever
/// recomputes these.
#[derive(Debug, Clone)]
pub struct FixedEntry {
    pub path: PathBuf,
    /// Forward-slash path inside the archive, no trailing slash.
    pub archive_path: String,
    /// Exact bytes written as the name in both the local header and the
    /// central directory; directories carry a trailing `/` here.
    pub name_bytes: Vec<u8>,
    pub timestamp: DosDateTime,
    pub kind: EntryKind,
}

/// Plans entries: classifies the source, fixes the archive path and name
/// encoding, resolves the timestamp.
pub struct EntryPlanner {
    encoder: Option<NameEncoder>,
}

impl EntryPlanner {
    pub fn new(encoder: Option<NameEncoder>) -> Self {
        Self { encoder }
    }

    /// Plan one entry under `parent` (a directory's archive path, or
    /// `None` at the archive root).
    ///
    /// Returns `None` when the entry cannot be archived: the source is
    /// gone or unreadable, is neither file/directory/symlink, or has no
    /// usable final path component. Skipping instead of failing is
    /// deliberate; a tree being archived may be changing underneath us.
    pub fn plan(&self, entry: &Entry, parent: Option<&str>) -> Option<FixedEntry> {
        let meta = fs::symlink_metadata(&entry.path).ok()?;
        let kind = if meta.file_type().is_symlink() {
            EntryKind::Symlink
        } else if meta.is_dir() {
            EntryKind::Directory
        } else if meta.is_file() {
            EntryKind::File
        } else {
            return None;
        };

        let name = match &entry.name {
            Some(name) => name.clone(),
            None => entry.path.file_name()?.to_string_lossy().into_owned(),
        };
        let archive_path = match parent {
            Some(dir) => format!("{dir}/{name}"),
            None => name,
        };

        let timestamp = entry
            .time
            .or_else(|| meta.modified().ok())
            .map(DosDateTime::from_system_time)
            .unwrap_or_else(DosDateTime::now);

        let display = match kind {
            EntryKind::Directory => format!("{archive_path}/"),
            _ => archive_path.clone(),
        };
        let name_bytes = self.encode_name(&display);

        Some(FixedEntry {
            path: entry.path.clone(),
            archive_path,
            name_bytes,
            timestamp,
            kind,
        })
    }

    fn encode_name(&self, name: &str) -> Vec<u8> {
        match &self.encoder {
            Some(encode) => encode(name).unwrap_or_else(|| name.as_bytes().to_vec()),
            None => name.as_bytes().to_vec(),
        }
    }
}

/// Resolve a symlink's target to the archive path it would point at.
///
/// The target is interpreted relative to the link's parent directory in
/// archive space (or from the root when the target is absolute), with
/// `.` and `..` folded away and `..` clamped at the root.
pub fn resolve_link_target(link_archive_path: &str, target: &Path) -> String {
    let mut parts: Vec<&str> = Vec::new();
    let target = target.to_string_lossy();
    if !target.starts_with('/') {
        parts = link_archive_path.split('/').collect();
        parts.pop(); // the link itself
    }
    for piece in target.split('/') {
        match piece {
            "" | "." => {}
            ".." => {
                parts.pop();
            }
            other => parts.push(other),
        }
    }
    parts.join("/")
}
