use std::collections::VecDeque;
use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use anyhow::Result;

use super::planner::{Entry, EntryKind, EntryPlanner, FixedEntry, NameEncoder, resolve_link_target};
use super::writer::ZipWriter;

/// Default division size for streaming file payloads: 1 MiB.
pub const DEFAULT_CHUNK_SIZE: usize = 1_048_576;

/// Knobs for an archive build.
pub struct BuildOptions {
    /// Division size for streaming file payloads through the compressor.
    /// Affects memory use only, never the produced bytes.
    pub chunk_size: usize,
    /// Optional re-encoding hook for entry names; see [`NameEncoder`].
    pub name_encoder: Option<NameEncoder>,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            chunk_size: DEFAULT_CHUNK_SIZE,
            name_encoder: None,
        }
    }
}

/// Builds a ZIP archive from filesystem entries, forward-only.
///
/// Traversal order: files at one level are written eagerly, directories
/// are queued and drained breadth-first (each directory writes its own
/// entry, then its children are classified the same way, so deeper
/// levels cascade into the same queues). Symlinks are held back until
/// [`finish`](ZipBuilder::finish), once the full set of archived paths
/// is known: a link is written only if its target resolves to a path
/// already in the archive, so extraction never produces a dangling link.
pub struct ZipBuilder<W: Write> {
    writer: ZipWriter<W>,
    planner: EntryPlanner,
    pending_dirs: VecDeque<FixedEntry>,
    pending_links: Vec<FixedEntry>,
}

impl<W: Write> ZipBuilder<W> {
    pub fn new(out: W) -> Result<Self> {
        Self::with_options(out, BuildOptions::default())
    }

    pub fn with_options(out: W, options: BuildOptions) -> Result<Self> {
        Ok(Self {
            writer: ZipWriter::new(out, options.chunk_size)?,
            planner: EntryPlanner::new(options.name_encoder),
            pending_dirs: VecDeque::new(),
            pending_links: Vec::new(),
        })
    }

    /// Archive a set of entries. May be called more than once; every call
    /// fully drains the directory queue before returning.
    pub fn pack(&mut self, entries: &[Entry]) -> Result<()> {
        self.pack_level(entries, None)?;
        while let Some(dir) = self.pending_dirs.pop_front() {
            self.pack_directory(&dir)?;
        }
        Ok(())
    }

    /// Write the queued symlinks, the central directory, and the end
    /// record; hand the sink back. An archive that never saw an entry
    /// writes nothing at all.
    pub fn finish(mut self) -> Result<W> {
        self.write_pending_links()?;
        self.writer.close()
    }

    /// Classify one level of entries: files written now, directories and
    /// symlinks queued. Entries that vanished, are unreadable, or are
    /// none of file/directory/symlink are skipped.
    fn pack_level(&mut self, entries: &[Entry], parent: Option<&str>) -> Result<()> {
        for entry in entries {
            let Some(fixed) = self.planner.plan(entry, parent) else {
                continue;
            };
            match fixed.kind {
                EntryKind::File => {
                    // The source can disappear between classification and
                    // here; nothing has been written for it yet, so skip.
                    let Ok(source) = File::open(&fixed.path) else {
                        continue;
                    };
                    self.writer.write_file_entry(&fixed, source)?;
                }
                EntryKind::Directory => self.pending_dirs.push_back(fixed),
                EntryKind::Symlink => self.pending_links.push(fixed),
            }
        }
        Ok(())
    }

    fn pack_directory(&mut self, dir: &FixedEntry) -> Result<()> {
        self.writer.write_directory_entry(dir)?;
        let children = list_children(&dir.path);
        self.pack_level(&children, Some(&dir.archive_path))
    }

    fn write_pending_links(&mut self) -> Result<()> {
        let links = std::mem::take(&mut self.pending_links);
        for link in links {
            let Ok(target) = fs::read_link(&link.path) else {
                continue;
            };
            let resolved = resolve_link_target(&link.archive_path, &target);
            if self.writer.contains_path(&resolved) {
                self.writer
                    .write_symlink_entry(&link, target.to_string_lossy().as_bytes())?;
            }
        }
        Ok(())
    }
}

/// List a directory's immediate children as plannable entries, sorted by
/// name so the archive layout does not depend on filesystem enumeration
/// order. An unreadable directory simply contributes no children.
fn list_children(dir: &Path) -> Vec<Entry> {
    let Ok(read) = fs::read_dir(dir) else {
        return Vec::new();
    };
    let mut children: Vec<Entry> = read
        .filter_map(|child| child.ok())
        .map(|child| Entry::from_path(child.path()))
        .collect();
    children.sort_by(|a, b| a.path.cmp(&b.path));
    children
}

/// Archive `entries` into any forward-writable sink and hand it back.
pub fn zip_to_writer<W: Write>(out: W, entries: &[Entry]) -> Result<W> {
    let mut builder = ZipBuilder::new(out)?;
    builder.pack(entries)?;
    builder.finish()
}

/// Archive `entries` into a freshly created file.
pub fn zip_to_file(path: impl AsRef<Path>, entries: &[Entry]) -> Result<()> {
    let file = File::create(path)?;
    let mut out = zip_to_writer(BufWriter::new(file), entries)?;
    out.flush()?;
    Ok(())
}

/// Archive `entries` into an in-memory buffer.
pub fn zip_to_vec(entries: &[Entry]) -> Result<Vec<u8>> {
    zip_to_writer(Vec::new(), entries)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn write_file(path: &Path, data: &[u8]) {
        File::create(path).unwrap().write_all(data).unwrap();
    }

    // Pulls entry names back out of the local headers, in write order.
    fn local_header_names(buf: &[u8]) -> Vec<String> {
        let mut names = Vec::new();
        let mut at = 0usize;
        while at + 4 <= buf.len() && &buf[at..at + 4] == b"PK\x03\x04" {
            let name_len =
                u16::from_le_bytes(buf[at + 26..at + 28].try_into().unwrap()) as usize;
            names.push(String::from_utf8(buf[at + 30..at + 30 + name_len].to_vec()).unwrap());
            at += 30 + name_len;
            let rel = buf
                .windows(4)
                .skip(at)
                .position(|w| w == b"PK\x07\x08")
                .unwrap();
            at += rel + 16;
        }
        names
    }

    #[test]
    fn empty_input_writes_no_bytes() {
        let out = zip_to_vec(&[]).unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn all_entries_vanished_writes_no_bytes() {
        let out = zip_to_vec(&[Entry::from_path("/no/such/a"), Entry::from_path("/no/such/b")])
            .unwrap();
        assert!(out.is_empty());
    }

    #[test]
    fn files_first_then_directories_breadth_first() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        write_file(&root.join("top"), b"t");
        fs::create_dir(root.join("a")).unwrap();
        fs::create_dir(root.join("b")).unwrap();
        write_file(&root.join("a/inner"), b"i");
        fs::create_dir(root.join("a/deep")).unwrap();
        write_file(&root.join("a/deep/leaf"), b"l");

        let entries = [
            Entry::from_path(root.join("top")),
            Entry::from_path(root.join("a")),
            Entry::from_path(root.join("b")),
        ];
        let buf = zip_to_vec(&entries).unwrap();

        // top written eagerly; a and b drained in queue order; a's own
        // children only after both first-level directories were queued,
        // with a/deep deferred behind b.
        assert_eq!(
            local_header_names(&buf),
            vec!["top", "a/", "a/inner", "b/", "a/deep/", "a/deep/leaf"]
        );
    }

    #[cfg(unix)]
    #[test]
    fn symlinks_come_last_and_dangling_ones_are_dropped() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        fs::create_dir(root.join("d")).unwrap();
        write_file(&root.join("d/file"), b"data");
        std::os::unix::fs::symlink("file", root.join("d/good")).unwrap();
        std::os::unix::fs::symlink("../outside", root.join("d/bad")).unwrap();

        let buf = zip_to_vec(&[Entry::from_path(root.join("d"))]).unwrap();
        assert_eq!(
            local_header_names(&buf),
            vec!["d/", "d/file", "d/good"] // d/bad never written
        );
    }

    #[cfg(unix)]
    #[test]
    fn symlink_to_directory_is_kept() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        fs::create_dir_all(root.join("top/sub")).unwrap();
        std::os::unix::fs::symlink("sub", root.join("top/alias")).unwrap();

        let buf = zip_to_vec(&[Entry::from_path(root.join("top"))]).unwrap();
        assert_eq!(
            local_header_names(&buf),
            vec!["top/", "top/sub/", "top/alias"]
        );
    }

    #[test]
    fn name_encoder_applies_to_every_record() {
        let tmp = tempfile::tempdir().unwrap();
        let root = tmp.path();
        write_file(&root.join("file"), b"x");

        let options = BuildOptions {
            name_encoder: Some(Box::new(|s| Some(s.to_uppercase().into_bytes()))),
            ..Default::default()
        };
        let mut builder = ZipBuilder::with_options(Vec::new(), options).unwrap();
        builder
            .pack(&[Entry::from_path(root.join("file"))])
            .unwrap();
        let buf = builder.finish().unwrap();
        assert_eq!(local_header_names(&buf), vec!["FILE"]);
        // central directory repeats the same bytes
        let cd = buf.windows(4).position(|w| w == b"PK\x01\x02").unwrap();
        assert_eq!(&buf[cd + 46..cd + 50], b"FILE");
    }
}
