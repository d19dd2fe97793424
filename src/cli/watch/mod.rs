//! `tplcache watch`: rebuild on template and config changes.
//!
//! ```text
//! notify ─► Debouncer (timing, dedup) ─► classify ─► reload | refresh | rebuild
//! Ctrl+C ─────────────────────────────────────────► stop
//! ```
//!
//! The output directory is ignored so written scripts never trigger a
//! rebuild of their own.

mod debouncer;
mod watch_roots;

use anyhow::{Context, Result};
use notify::RecursiveMode;
use rustc_hash::FxHashMap;
use std::path::PathBuf;
use std::sync::mpsc;

use tplcache::config::{CacheConfig, Overrides};
use tplcache::logger::{Rebuild, report_rebuild};
use tplcache::utils::path::normalize_path;
use tplcache::utils::plural_count;
use tplcache::{TemplateCache, debug, log};

use debouncer::{ChangeKind, Debouncer};
use watch_roots::WatchRoots;

enum WatchMsg {
    Fs(notify::Result<notify::Event>),
    Shutdown,
}

/// What a batch of debounced changes calls for.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Action {
    /// Config file changed: reload everything.
    Reload,
    /// Files appeared or vanished: re-expand globs, then rebuild.
    Refresh,
    /// Known templates changed.
    Rebuild,
    Ignore,
}

/// State of a running watch session.
struct Session {
    config_path: PathBuf,
    overrides: Overrides,
    output_dir: PathBuf,
    cache: TemplateCache,
}

impl Session {
    fn start(config: CacheConfig, overrides: Overrides) -> Result<Self> {
        let config_path = config.config_path.clone();
        let output_dir = normalize_path(&config.output_dir());
        let cache = TemplateCache::new(config)?;
        Ok(Self {
            config_path,
            overrides,
            output_dir,
            cache,
        })
    }

    fn watch_targets(&self) -> Vec<(PathBuf, RecursiveMode)> {
        let mut targets: Vec<_> = self
            .cache
            .watch_roots()
            .into_iter()
            .map(|root| (root, RecursiveMode::Recursive))
            .collect();
        // Editors replace files on save, so the directory is watched.
        if let Some(dir) = self.config_path.parent() {
            targets.push((dir.to_path_buf(), RecursiveMode::NonRecursive));
        }
        targets
    }

    fn classify(&self, changes: &FxHashMap<PathBuf, ChangeKind>) -> Action {
        let dependencies = self.cache.dependencies();
        let mut action = Action::Ignore;

        for (path, kind) in changes {
            if *path == self.config_path {
                return Action::Reload;
            }
            if path.starts_with(&self.output_dir) {
                continue;
            }
            match kind {
                ChangeKind::Created | ChangeKind::Removed => action = Action::Refresh,
                ChangeKind::Modified if dependencies.contains(path) => {
                    if action == Action::Ignore {
                        action = Action::Rebuild;
                    }
                }
                ChangeKind::Modified => {}
            }
        }
        action
    }

    fn reload(&mut self) -> Result<()> {
        let mut config = CacheConfig::from_path(&self.config_path)?;
        config.apply_overrides(&self.overrides);
        *self = Self::start(config, self.overrides.clone())?;
        Ok(())
    }

    fn rebuild(&self) -> Result<Rebuild> {
        let compilation = self.cache.compile(&self.output_dir)?;
        compilation.write_all()?;
        Ok(Rebuild::Wrote {
            scripts: compilation.assets.len(),
            templates: compilation.dependencies.len(),
            bytes: compilation.total_size(),
        })
    }
}

/// Build once, then rebuild until Ctrl+C.
pub fn watch(config: CacheConfig, overrides: Overrides) -> Result<()> {
    let (tx, rx) = mpsc::channel();

    let shutdown_tx = tx.clone();
    ctrlc::set_handler(move || {
        let _ = shutdown_tx.send(WatchMsg::Shutdown);
    })
    .context("failed to set Ctrl+C handler")?;

    // Watcher first: events during the initial build are buffered.
    let mut watcher = notify::recommended_watcher(move |res| {
        let _ = tx.send(WatchMsg::Fs(res));
    })?;

    let mut session = Session::start(config, overrides)?;
    let mut roots = WatchRoots::new(session.watch_targets());
    roots.attach_existing(&mut watcher)?;

    report(session.rebuild());
    log!("watch"; "watching {}", plural_count(roots.len(), "root"));

    let mut debouncer = Debouncer::new();
    loop {
        match rx.recv_timeout(debouncer.sleep_duration()) {
            Ok(WatchMsg::Fs(Ok(event))) => debouncer.add_event(&event),
            Ok(WatchMsg::Fs(Err(e))) => log!("watch"; "notify error: {}", e),
            Ok(WatchMsg::Shutdown) | Err(mpsc::RecvTimeoutError::Disconnected) => break,
            Err(mpsc::RecvTimeoutError::Timeout) => {
                roots.maintain(&mut watcher);
                let Some(changes) = debouncer.take_if_ready() else {
                    continue;
                };
                handle_changes(&mut session, &changes, &mut roots, &mut watcher);
            }
        }
    }

    log!("watch"; "stopped");
    Ok(())
}

fn handle_changes(
    session: &mut Session,
    changes: &FxHashMap<PathBuf, ChangeKind>,
    roots: &mut WatchRoots,
    watcher: &mut notify::RecommendedWatcher,
) {
    let action = session.classify(changes);
    debug!("watch"; "{} change(s): {:?}", changes.len(), action);

    match action {
        Action::Ignore => {}
        Action::Reload => match session.reload() {
            Ok(()) => {
                roots.replace(session.watch_targets(), watcher);
                report(session.rebuild());
            }
            Err(e) => report_rebuild(&Rebuild::failed("config reload", format!("{:#}", e))),
        },
        Action::Refresh => {
            let before = session.cache.dependencies();
            if let Err(e) = session.cache.refresh() {
                report_rebuild(&Rebuild::failed("source resolution", format!("{:#}", e)));
                return;
            }
            let modified = changes
                .iter()
                .any(|(path, kind)| *kind == ChangeKind::Modified && before.contains(path));
            if before == session.cache.dependencies() && !modified {
                report_rebuild(&Rebuild::Unchanged);
                return;
            }
            report(session.rebuild());
        }
        Action::Rebuild => report(session.rebuild()),
    }
}

fn report(result: Result<Rebuild>) {
    match result {
        Ok(outcome) => report_rebuild(&outcome),
        Err(e) => report_rebuild(&Rebuild::failed("build", format!("{:#}", e))),
    }
}
