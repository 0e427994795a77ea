//! Background basename index for the working tree
//!
//! Maps file basenames to the absolute paths carrying them so that bare
//! references like `main.go` in command output can be resolved to a real
//! file. The initial scan walks the tree (following symlinks, skipping
//! excluded and git-ignored directories); afterwards a filesystem watcher
//! keeps the map current. `resolve` is synchronous and cheap so it can sit
//! on the output rewriting hot path.

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::{Arc, RwLock};
use std::time::{SystemTime, UNIX_EPOCH};

use anyhow::{anyhow, Result};
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::{mpsc, watch};
use tokio_util::sync::CancellationToken;

use crate::symwalk::{self, WalkControl};

#[derive(Clone, Debug)]
struct FileEntry {
    path: String,
    mtime: SystemTime,
}

/// Shared, watcher-backed basename index.
///
/// `resolve` returns nothing until the initial scan completes; degradations
/// (no git, no watcher, unreadable entries) shrink coverage but never fail.
pub struct FileIndex {
    files: RwLock<HashMap<String, Vec<FileEntry>>>,
    ready: watch::Sender<bool>,
    cwd: PathBuf,
    exclude_set: HashSet<String>,
    ignored_dirs: RwLock<HashSet<PathBuf>>,
}

impl FileIndex {
    pub fn new(cwd: PathBuf, exclude_dirs: &[String]) -> Self {
        let (ready, _) = watch::channel(false);
        Self {
            files: RwLock::new(HashMap::new()),
            ready,
            cwd,
            exclude_set: exclude_dirs.iter().cloned().collect(),
            ignored_dirs: RwLock::new(HashSet::new()),
        }
    }

    /// Perform the initial scan, signal readiness, then run the filesystem
    /// watcher until `cancel` fires. Runs to completion; callers spawn it.
    pub async fn start(self: Arc<Self>, cancel: CancellationToken) {
        let ignored = load_git_ignored_dirs(&self.cwd).await;
        *self.ignored_dirs.write().unwrap() = ignored;

        let this = Arc::clone(&self);
        let scan_cancel = cancel.clone();
        let dirs = tokio::task::spawn_blocking(move || this.scan(&scan_cancel))
            .await
            .unwrap_or_default();

        self.ready.send_replace(true);

        if cancel.is_cancelled() {
            return;
        }
        self.watch_loop(dirs, cancel).await;
    }

    /// Block until the initial scan has completed or `cancel` fires.
    pub async fn wait(&self, cancel: &CancellationToken) -> Result<()> {
        let mut rx = self.ready.subscribe();
        loop {
            if *rx.borrow() {
                return Ok(());
            }
            tokio::select! {
                _ = cancel.cancelled() => return Err(anyhow!("cancelled while waiting for file index")),
                changed = rx.changed() => {
                    changed.map_err(|_| anyhow!("file index dropped"))?;
                }
            }
        }
    }

    /// Resolve a bare or partially-qualified reference to an absolute path.
    ///
    /// Looks up the basename; when the query contains `/`, candidates whose
    /// path ends with `"/" + query` are preferred. Among several candidates
    /// the newest mtime wins, ties broken by lexicographic path order.
    pub fn resolve(&self, path: &str) -> Option<String> {
        if !*self.ready.borrow() {
            return None;
        }

        let basename = Path::new(path).file_name()?.to_string_lossy().into_owned();
        let files = self.files.read().unwrap();
        let candidates = files.get(&basename)?;
        if candidates.is_empty() {
            return None;
        }

        let filtered: Vec<&FileEntry> = if path.contains('/') {
            let suffix = format!("/{path}");
            let matching: Vec<&FileEntry> = candidates
                .iter()
                .filter(|c| c.path.ends_with(&suffix))
                .collect();
            if matching.is_empty() {
                candidates.iter().collect()
            } else {
                matching
            }
        } else {
            candidates.iter().collect()
        };

        let mut best = filtered[0];
        for c in &filtered[1..] {
            if c.mtime > best.mtime || (c.mtime == best.mtime && c.path < best.path) {
                best = c;
            }
        }
        Some(best.path.clone())
    }

    /// Walk the working tree, filling the map. Returns the directories that
    /// were entered so the watcher can subscribe to them.
    fn scan(&self, cancel: &CancellationToken) -> Vec<PathBuf> {
        let mut dirs = Vec::new();
        symwalk::walk_dir(&self.cwd, |entry| {
            if cancel.is_cancelled() {
                return WalkControl::SkipAll;
            }
            if entry.is_dir {
                if entry.path != self.cwd && self.is_ignored_dir(entry.path) {
                    return WalkControl::SkipDir;
                }
                dirs.push(entry.path.to_path_buf());
            } else {
                self.add_file(entry.path, entry.metadata.modified().ok());
            }
            WalkControl::Continue
        });
        dirs
    }

    fn is_ignored_dir(&self, path: &Path) -> bool {
        if let Some(name) = path.file_name() {
            if self.exclude_set.contains(&*name.to_string_lossy()) {
                return true;
            }
        }
        self.ignored_dirs.read().unwrap().contains(path)
    }

    fn add_file(&self, path: &Path, mtime: Option<SystemTime>) {
        let Some(basename) = path.file_name() else {
            return;
        };
        let entry = FileEntry {
            path: path.to_string_lossy().into_owned(),
            mtime: mtime.unwrap_or(UNIX_EPOCH),
        };
        let mut files = self.files.write().unwrap();
        files
            .entry(basename.to_string_lossy().into_owned())
            .or_default()
            .push(entry);
    }

    fn remove_path(&self, path: &Path) {
        let Some(basename) = path.file_name() else {
            return;
        };
        let removed = path.to_string_lossy();
        let mut files = self.files.write().unwrap();
        if let Some(entries) = files.get_mut(&*basename.to_string_lossy()) {
            entries.retain(|e| e.path != removed);
        }
    }

    /// Subscribe to the indexed directories and apply create/remove/rename
    /// events until cancelled. Watcher-creation failure leaves a static index.
    async fn watch_loop(&self, dirs: Vec<PathBuf>, cancel: CancellationToken) {
        let (tx, mut rx) = mpsc::unbounded_channel::<Event>();
        let mut watcher = match RecommendedWatcher::new(
            move |res: std::result::Result<Event, notify::Error>| {
                if let Ok(event) = res {
                    let _ = tx.send(event);
                }
            },
            notify::Config::default(),
        ) {
            Ok(w) => w,
            Err(_) => {
                cancel.cancelled().await;
                return;
            }
        };

        for dir in &dirs {
            let _ = watcher.watch(dir, RecursiveMode::NonRecursive);
        }

        loop {
            tokio::select! {
                _ = cancel.cancelled() => return,
                event = rx.recv() => {
                    let Some(event) = event else { return };
                    self.handle_event(&mut watcher, &event);
                }
            }
        }
    }

    fn handle_event(&self, watcher: &mut RecommendedWatcher, event: &Event) {
        for path in &event.paths {
            if let Some(name) = path.file_name() {
                if self.exclude_set.contains(&*name.to_string_lossy()) {
                    continue;
                }
            }

            match event.kind {
                EventKind::Create(_) => self.handle_create(watcher, path),
                EventKind::Remove(_) => self.remove_path(path),
                EventKind::Modify(notify::event::ModifyKind::Name(_)) => {
                    // Renames surface as one event per side; the side that
                    // still exists is an add, the other a removal.
                    if path.exists() {
                        self.handle_create(watcher, path);
                    } else {
                        self.remove_path(path);
                    }
                }
                _ => {}
            }
        }
    }

    fn handle_create(&self, watcher: &mut RecommendedWatcher, path: &Path) {
        let Ok(metadata) = std::fs::metadata(path) else {
            return;
        };

        if metadata.is_dir() {
            // A whole directory appeared: watch and index its subtree.
            symwalk::walk_dir(path, |entry| {
                if entry.is_dir {
                    if self.is_ignored_dir(entry.path) {
                        return WalkControl::SkipDir;
                    }
                    let _ = watcher.watch(entry.path, RecursiveMode::NonRecursive);
                } else {
                    self.add_file(entry.path, entry.metadata.modified().ok());
                }
                WalkControl::Continue
            });
            return;
        }

        // Duplicate create events would double-count an existing entry.
        self.remove_path(path);
        self.add_file(path, metadata.modified().ok());
    }
}

/// Ask git for the ignored directories under `cwd`. Each output line is
/// joined to `cwd`; a missing or failing git yields an empty set.
async fn load_git_ignored_dirs(cwd: &Path) -> HashSet<PathBuf> {
    let output = match tokio::process::Command::new("git")
        .args(["ls-files", "-oi", "--exclude-standard", "--directory"])
        .current_dir(cwd)
        .output()
        .await
    {
        Ok(output) if output.status.success() => output,
        _ => return HashSet::new(),
    };

    let mut dirs = HashSet::new();
    for line in String::from_utf8_lossy(&output.stdout).lines() {
        let line = line.trim().trim_end_matches('/');
        if line.is_empty() {
            continue;
        }
        dirs.insert(cwd.join(line));
    }
    dirs
}
