use std::path::PathBuf;

use notify::{RecommendedWatcher, RecursiveMode, Watcher};
use rustc_hash::FxHashSet;

use tplcache::debug;

/// Directories the watcher should be attached to.
///
/// Glob roots may not exist yet, or may be deleted and recreated while
/// watching; [`WatchRoots::maintain`] attaches them once they appear.
pub(super) struct WatchRoots {
    desired: Vec<(PathBuf, RecursiveMode)>,
    attached: FxHashSet<PathBuf>,
}

impl WatchRoots {
    pub(super) fn new(targets: Vec<(PathBuf, RecursiveMode)>) -> Self {
        Self {
            desired: targets,
            attached: FxHashSet::default(),
        }
    }

    pub(super) fn len(&self) -> usize {
        self.desired.len()
    }

    pub(super) fn attach_existing(&mut self, watcher: &mut RecommendedWatcher) -> notify::Result<()> {
        for (path, mode) in &self.desired {
            if !path.exists() || self.attached.contains(path) {
                continue;
            }
            watcher.watch(path, *mode)?;
            self.attached.insert(path.clone());
        }
        Ok(())
    }

    pub(super) fn maintain(&mut self, watcher: &mut RecommendedWatcher) {
        self.attached.retain(|path| path.exists());

        for (path, mode) in &self.desired {
            if self.attached.contains(path) || !path.exists() {
                continue;
            }
            if watcher.watch(path, *mode).is_ok() {
                self.attached.insert(path.clone());
                debug!("watch"; "attached {}", path.display());
            }
        }
    }

    /// Swap in a new target list after a config reload.
    pub(super) fn replace(
        &mut self,
        targets: Vec<(PathBuf, RecursiveMode)>,
        watcher: &mut RecommendedWatcher,
    ) {
        let stale: Vec<PathBuf> = self
            .attached
            .iter()
            .filter(|path| !targets.iter().any(|(p, _)| p == *path))
            .cloned()
            .collect();
        for path in stale {
            let _ = watcher.unwatch(&path);
            self.attached.remove(&path);
        }

        self.desired = targets;
        self.maintain(watcher);
    }
}
