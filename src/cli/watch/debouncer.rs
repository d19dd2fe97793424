//! Event coalescing for watch mode.

use std::path::{Path, PathBuf};
use std::time::{Duration, Instant};

use notify::EventKind;
use notify::event::ModifyKind;
use rustc_hash::FxHashMap;

use tplcache::debug;
use tplcache::utils::path::normalize_path;

pub(super) const DEBOUNCE_MS: u64 = 300;
pub(super) const REBUILD_COOLDOWN_MS: u64 = 800;

/// Idle wait when nothing is pending.
const IDLE: Duration = Duration::from_secs(3600);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(super) enum ChangeKind {
    Created,
    Modified,
    Removed,
}

impl ChangeKind {
    fn from_event(kind: &EventKind) -> Option<Self> {
        match kind {
            EventKind::Create(_) => Some(Self::Created),
            EventKind::Remove(_) => Some(Self::Removed),
            // mtime/chmod noise
            EventKind::Modify(ModifyKind::Metadata(_)) => None,
            EventKind::Modify(_) => Some(Self::Modified),
            _ => None,
        }
    }
}

/// Collects changes until the tree has been quiet for [`DEBOUNCE_MS`]
/// and the last rebuild is at least [`REBUILD_COOLDOWN_MS`] old.
pub(super) struct Debouncer {
    changes: FxHashMap<PathBuf, ChangeKind>,
    last_event: Option<Instant>,
    last_rebuild: Option<Instant>,
}

impl Debouncer {
    pub(super) fn new() -> Self {
        Self {
            changes: FxHashMap::default(),
            last_event: None,
            last_rebuild: None,
        }
    }

    /// Record a notify event.
    ///
    /// Per path: a removal followed by a create or modify counts as the
    /// later event, a create followed by a removal cancels out, and
    /// otherwise the first event wins.
    pub(super) fn add_event(&mut self, event: &notify::Event) {
        let Some(kind) = ChangeKind::from_event(&event.kind) else {
            return;
        };

        for path in event.paths.iter().filter(|p| !is_temp_file(p)) {
            let path = normalize_path(path);
            match (self.changes.get(&path).copied(), kind) {
                (None, _)
                | (Some(ChangeKind::Removed), ChangeKind::Created | ChangeKind::Modified)
                | (Some(ChangeKind::Modified), ChangeKind::Removed) => {
                    debug!("watch"; "{:?}: {}", kind, path.display());
                    self.changes.insert(path, kind);
                }
                (Some(ChangeKind::Created), ChangeKind::Removed) => {
                    self.changes.remove(&path);
                }
                _ => continue,
            }
            self.last_event = Some(Instant::now());
        }
    }

    /// Drain pending changes once debounce and cooldown have elapsed.
    pub(super) fn take_if_ready(&mut self) -> Option<FxHashMap<PathBuf, ChangeKind>> {
        if !self.is_ready() {
            return None;
        }
        self.last_event = None;
        self.last_rebuild = Some(Instant::now());
        Some(std::mem::take(&mut self.changes))
    }

    fn is_ready(&self) -> bool {
        let Some(last_event) = self.last_event else {
            return false;
        };
        if last_event.elapsed() < Duration::from_millis(DEBOUNCE_MS) {
            return false;
        }
        if let Some(last_rebuild) = self.last_rebuild
            && last_rebuild.elapsed() < Duration::from_millis(REBUILD_COOLDOWN_MS)
        {
            return false;
        }
        !self.changes.is_empty()
    }

    /// How long the event loop may block before checking again.
    pub(super) fn sleep_duration(&self) -> Duration {
        let Some(last_event) = self.last_event else {
            return IDLE;
        };

        let debounce = Duration::from_millis(DEBOUNCE_MS).saturating_sub(last_event.elapsed());
        let cooldown = self
            .last_rebuild
            .map(|t| Duration::from_millis(REBUILD_COOLDOWN_MS).saturating_sub(t.elapsed()))
            .unwrap_or(Duration::ZERO);

        debounce.max(cooldown).max(Duration::from_millis(1))
    }
}

/// Editor swap and backup files.
fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with(".#")
        || (name.starts_with('.') && ext.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, DataChange, MetadataKind, RemoveKind};

    fn event(kind: EventKind, path: &str) -> notify::Event {
        notify::Event::new(kind).add_path(PathBuf::from(path))
    }

    fn created(path: &str) -> notify::Event {
        event(EventKind::Create(CreateKind::File), path)
    }

    fn modified(path: &str) -> notify::Event {
        event(EventKind::Modify(ModifyKind::Data(DataChange::Content)), path)
    }

    fn removed(path: &str) -> notify::Event {
        event(EventKind::Remove(RemoveKind::File), path)
    }

    fn kind_of(debouncer: &Debouncer, path: &str) -> Option<ChangeKind> {
        debouncer.changes.get(Path::new(path)).copied()
    }

    #[test]
    fn test_metadata_changes_ignored() {
        let mut d = Debouncer::new();
        d.add_event(&event(
            EventKind::Modify(ModifyKind::Metadata(MetadataKind::WriteTime)),
            "/site/a.html",
        ));
        assert!(d.changes.is_empty());
        assert!(d.last_event.is_none());
    }

    #[test]
    fn test_temp_files_ignored() {
        let mut d = Debouncer::new();
        d.add_event(&modified("/site/a.html.swp"));
        d.add_event(&modified("/site/a.html~"));
        d.add_event(&modified("/site/.#a.html"));
        assert!(d.changes.is_empty());
    }

    #[test]
    fn test_remove_then_create_is_restore() {
        let mut d = Debouncer::new();
        d.add_event(&removed("/site/a.html"));
        d.add_event(&created("/site/a.html"));
        assert_eq!(kind_of(&d, "/site/a.html"), Some(ChangeKind::Created));
    }

    #[test]
    fn test_modify_then_remove_is_remove() {
        let mut d = Debouncer::new();
        d.add_event(&modified("/site/a.html"));
        d.add_event(&removed("/site/a.html"));
        assert_eq!(kind_of(&d, "/site/a.html"), Some(ChangeKind::Removed));
    }

    #[test]
    fn test_create_then_remove_cancels() {
        let mut d = Debouncer::new();
        d.add_event(&created("/site/new.html"));
        d.add_event(&removed("/site/new.html"));
        assert!(kind_of(&d, "/site/new.html").is_none());
    }

    #[test]
    fn test_first_event_wins() {
        let mut d = Debouncer::new();
        d.add_event(&created("/site/a.html"));
        d.add_event(&modified("/site/a.html"));
        assert_eq!(kind_of(&d, "/site/a.html"), Some(ChangeKind::Created));
    }

    #[test]
    fn test_not_ready_within_debounce() {
        let mut d = Debouncer::new();
        d.add_event(&modified("/site/a.html"));
        assert!(d.take_if_ready().is_none());
        assert!(d.sleep_duration() <= Duration::from_millis(DEBOUNCE_MS));
    }

    #[test]
    fn test_ready_after_debounce() {
        let mut d = Debouncer::new();
        d.add_event(&modified("/site/a.html"));
        d.last_event = Some(Instant::now() - Duration::from_millis(DEBOUNCE_MS + 10));

        let changes = d.take_if_ready().unwrap();
        assert_eq!(changes.len(), 1);
        assert!(d.changes.is_empty());
        assert_eq!(d.sleep_duration(), IDLE);
    }

    #[test]
    fn test_cooldown_blocks_rapid_rebuilds() {
        let mut d = Debouncer::new();
        d.last_rebuild = Some(Instant::now());
        d.add_event(&modified("/site/a.html"));
        d.last_event = Some(Instant::now() - Duration::from_millis(DEBOUNCE_MS + 10));
        assert!(d.take_if_ready().is_none());
    }
}
