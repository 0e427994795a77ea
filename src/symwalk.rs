//! Symlink-following directory walker
//!
//! Like a plain recursive walk, but descends into symlinks that point at
//! directories. Loops are broken by remembering the canonical path of every
//! symlink target entered; reported paths keep the symlink-based prefix, so
//! a file reached via `link/sub/data.txt` is reported under that name and
//! not its canonical one. Entries are visited in name order.

use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

/// Flow control returned by the visit callback.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WalkControl {
    Continue,
    /// For a directory: do not descend into it. For a file: skip the rest of
    /// its directory.
    SkipDir,
    /// Abort the entire walk.
    SkipAll,
}

/// A visited filesystem entry. `path` is the display path (symlink prefix
/// preserved); `metadata` follows symlinks.
pub struct WalkEntry<'a> {
    pub path: &'a Path,
    pub is_dir: bool,
    pub is_symlink: bool,
    pub metadata: fs::Metadata,
}

/// Walk `root` depth-first, following symlinked directories. Unreadable
/// entries are skipped silently.
pub fn walk_dir<F>(root: &Path, mut visit: F)
where
    F: FnMut(&WalkEntry) -> WalkControl,
{
    let mut visited = HashSet::new();
    walk_inner(root, true, false, &mut visited, &mut visit);
}

enum Flow {
    Continue,
    Stop,
}

fn walk_inner<F>(
    dir: &Path,
    check_visited: bool,
    via_symlink: bool,
    visited: &mut HashSet<PathBuf>,
    visit: &mut F,
) -> Flow
where
    F: FnMut(&WalkEntry) -> WalkControl,
{
    // Only symlink targets (and the root) are tracked: plain subdirectories
    // cannot form a loop on their own.
    if check_visited {
        let real = match fs::canonicalize(dir) {
            Ok(p) => p,
            Err(_) => return Flow::Continue,
        };
        if !visited.insert(real) {
            return Flow::Continue;
        }
    }

    let metadata = match fs::metadata(dir) {
        Ok(m) => m,
        Err(_) => return Flow::Continue,
    };
    match visit(&WalkEntry {
        path: dir,
        is_dir: true,
        is_symlink: via_symlink,
        metadata,
    }) {
        WalkControl::Continue => {}
        WalkControl::SkipDir => return Flow::Continue,
        WalkControl::SkipAll => return Flow::Stop,
    }

    let entries = match fs::read_dir(dir) {
        Ok(rd) => rd,
        Err(_) => return Flow::Continue,
    };
    let mut entries: Vec<_> = entries.filter_map(|e| e.ok()).collect();
    entries.sort_by_key(|e| e.file_name());

    for entry in entries {
        let child = dir.join(entry.file_name());
        let file_type = match entry.file_type() {
            Ok(t) => t,
            Err(_) => continue,
        };

        if file_type.is_symlink() {
            let target = match fs::metadata(&child) {
                Ok(m) => m,
                Err(_) => continue,
            };
            if target.is_dir() {
                if let Flow::Stop = walk_inner(&child, true, true, visited, visit) {
                    return Flow::Stop;
                }
            } else {
                match visit(&WalkEntry {
                    path: &child,
                    is_dir: false,
                    is_symlink: true,
                    metadata: target,
                }) {
                    WalkControl::Continue => {}
                    WalkControl::SkipDir => break,
                    WalkControl::SkipAll => return Flow::Stop,
                }
            }
        } else if file_type.is_dir() {
            if let Flow::Stop = walk_inner(&child, false, false, visited, visit) {
                return Flow::Stop;
            }
        } else {
            let metadata = match entry.metadata() {
                Ok(m) => m,
                Err(_) => continue,
            };
            match visit(&WalkEntry {
                path: &child,
                is_dir: false,
                is_symlink: false,
                metadata,
            }) {
                WalkControl::Continue => {}
                WalkControl::SkipDir => break,
                WalkControl::SkipAll => return Flow::Stop,
            }
        }
    }

    Flow::Continue
}
