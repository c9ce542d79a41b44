//! File-Tree Builder
//!
//! Lists a project directory as nested `TreeEntry` values. Directories are
//! always included; files only when their extension is accepted. The walk
//! uses an explicit work list, bounded by depth and total entry count.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::config::TreeConfig;
use crate::domain::tree::TreeEntry;
use crate::error::{CodegraphError, Result};

pub struct FileTreeBuilder {
    extensions: Vec<String>,
    max_depth: usize,
    max_entries: usize,
}

/// A directory whose listing is pending or done.
struct Pending {
    path: PathBuf,
    depth: usize,
    /// (parent slot, index in the parent's entries)
    parent: Option<(usize, usize)>,
    entries: Option<Vec<TreeEntry>>,
}

impl FileTreeBuilder {
    pub fn new<S: AsRef<str>>(extensions: &[S]) -> Self {
        let defaults = TreeConfig::default();
        Self {
            extensions: extensions
                .iter()
                .map(|e| e.as_ref().trim_start_matches('.').to_string())
                .collect(),
            max_depth: defaults.max_depth,
            max_entries: defaults.max_entries,
        }
    }

    pub fn with_limits(mut self, config: &TreeConfig) -> Self {
        self.max_depth = config.max_depth;
        self.max_entries = config.max_entries;
        self
    }

    pub fn accepts(&self, path: &Path) -> bool {
        path.extension()
            .and_then(|e| e.to_str())
            .map(|ext| self.extensions.iter().any(|e| e == ext))
            .unwrap_or(false)
    }

    pub fn list(&self, root: &Path) -> Result<Vec<TreeEntry>> {
        if !root.is_dir() {
            return Err(CodegraphError::not_found(root));
        }
        self.list_with(root, |dir| self.read_level(dir))
    }

    /// Walk driver. `read_level` lists one directory, already sorted.
    fn list_with<F>(&self, root: &Path, mut read_level: F) -> Result<Vec<TreeEntry>>
    where
        F: FnMut(&Path) -> io::Result<Vec<TreeEntry>>,
    {
        let mut slots = vec![Pending {
            path: root.to_path_buf(),
            depth: 0,
            parent: None,
            entries: None,
        }];
        let mut total = 0usize;
        let mut next = 0usize;

        while next < slots.len() {
            let slot = next;
            next += 1;

            let entries = match read_level(&slots[slot].path) {
                Ok(entries) => self.cap(&slots[slot].path, entries, &mut total),
                Err(e) if slot == 0 => {
                    debug!(path = %root.display(), error = %e, "cannot read tree root");
                    return Err(CodegraphError::not_found(root));
                }
                Err(e) => {
                    warn!(path = %slots[slot].path.display(), error = %e, "skipping unreadable directory");
                    continue;
                }
            };

            let depth = slots[slot].depth;
            for (index, entry) in entries.iter().enumerate() {
                if !entry.is_dir() || is_symlink(&entry.path) {
                    continue;
                }
                if depth + 1 > self.max_depth {
                    warn!(path = %entry.path.display(), max_depth = self.max_depth, "tree depth limit reached");
                    continue;
                }
                slots.push(Pending {
                    path: entry.path.clone(),
                    depth: depth + 1,
                    parent: Some((slot, index)),
                    entries: None,
                });
            }
            slots[slot].entries = Some(entries);
        }

        // Every child slot sits after its parent, so walking backwards
        // finishes a directory before it is moved into its parent. Siblings
        // are visited from the last index down, keeping removals valid.
        for slot in (1..slots.len()).rev() {
            let Some((parent, index)) = slots[slot].parent else {
                continue;
            };
            let children = slots[slot].entries.take();
            let Some(entries) = slots[parent].entries.as_mut() else {
                continue;
            };
            match children {
                Some(children) => {
                    if let Some(entry) = entries.get_mut(index) {
                        entry.children = Some(children);
                    }
                }
                None => {
                    entries.remove(index);
                }
            }
        }

        Ok(slots.swap_remove(0).entries.unwrap_or_default())
    }

    /// One directory level: subdirectories first, then accepted files, each sorted by name.
    fn read_level(&self, dir: &Path) -> io::Result<Vec<TreeEntry>> {
        let mut dirs = Vec::new();
        let mut files = Vec::new();

        for entry in fs::read_dir(dir)? {
            let entry = entry?;
            let path = entry.path();
            let name = entry.file_name().to_string_lossy().into_owned();
            if path.is_dir() {
                dirs.push(TreeEntry::directory(name, path));
            } else if self.accepts(&path) {
                files.push(TreeEntry::file(name, path));
            }
        }

        dirs.sort_by(|a, b| a.name.cmp(&b.name));
        files.sort_by(|a, b| a.name.cmp(&b.name));
        dirs.append(&mut files);
        Ok(dirs)
    }

    fn cap(&self, dir: &Path, mut entries: Vec<TreeEntry>, total: &mut usize) -> Vec<TreeEntry> {
        let room = self.max_entries.saturating_sub(*total);
        if entries.len() > room {
            warn!(path = %dir.display(), max_entries = self.max_entries, "tree entry limit reached");
            entries.truncate(room);
        }
        *total += entries.len();
        entries
    }
}

fn is_symlink(path: &Path) -> bool {
    fs::symlink_metadata(path)
        .map(|m| m.file_type().is_symlink())
        .unwrap_or(false)
}
