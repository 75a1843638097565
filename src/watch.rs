//! File system watcher for live reload.
//!
//! Monitors the data directory, README, template directory and config file.
//! Any change rebuilds the whole [`SiteContext`] and swaps it in; a failed
//! rebuild is logged and the previous context keeps serving. When a reload
//! changes the configured inputs, the watcher follows them.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────┐    ┌──────────┐    ┌──────────────────┐    ┌─────────────────┐
//! │ notify   │───▶│ Debouncer│───▶│ SiteContext::load│───▶│ ArcSwap::store  │
//! │ events   │    │ (300ms)  │    │ (config + data)  │    │ (on success)    │
//! └──────────┘    └──────────┘    └──────────────────┘    └─────────────────┘
//! ```

use crate::{config::SiteConfig, context::SiteContext, log};
use anyhow::{Context, Result};
use arc_swap::ArcSwap;
use notify::{Event, EventKind, RecursiveMode, Watcher};
use rustc_hash::FxHashSet;
use std::{
    path::{Path, PathBuf},
    sync::mpsc::{RecvTimeoutError, channel},
    time::{Duration, Instant},
};

const DEBOUNCE_MS: u64 = 300;
const RELOAD_COOLDOWN_MS: u64 = 800;

/// Check if path is a temp/backup file (editor artifacts).
fn is_temp_file(path: &Path) -> bool {
    let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
    let ext = path.extension().and_then(|e| e.to_str()).unwrap_or("");

    matches!(ext, "bck" | "bak" | "backup" | "swp" | "swo" | "tmp")
        || name.ends_with('~')
        || name.starts_with('.')
}

fn rel_path(path: &Path, root: &Path) -> String {
    path.strip_prefix(root).unwrap_or(path).display().to_string()
}

// =============================================================================
// Debounce State
// =============================================================================

/// Batches rapid file events with debouncing and reload cooldown.
struct Debouncer {
    pending: FxHashSet<PathBuf>,
    last_event: Option<Instant>,
    last_reload: Option<Instant>,
}

impl Debouncer {
    fn new() -> Self {
        Self {
            pending: FxHashSet::default(),
            last_event: None,
            last_reload: None,
        }
    }

    fn in_cooldown(&self) -> bool {
        self.last_reload
            .is_some_and(|t| t.elapsed() < Duration::from_millis(RELOAD_COOLDOWN_MS))
    }

    fn add(&mut self, event: Event) {
        let before = self.pending.len();
        self.pending
            .extend(event.paths.into_iter().filter(|p| !is_temp_file(p)));
        if self.pending.len() > before {
            self.last_event = Some(Instant::now());
        }
    }

    fn ready(&self) -> bool {
        !self.pending.is_empty()
            && self
                .last_event
                .is_some_and(|t| t.elapsed() >= Duration::from_millis(DEBOUNCE_MS))
    }

    fn take(&mut self) -> Vec<PathBuf> {
        self.last_event = None;
        self.pending.drain().collect()
    }

    fn mark_reload(&mut self) {
        self.last_reload = Some(Instant::now());
    }

    fn timeout(&self) -> Duration {
        if self.pending.is_empty() {
            Duration::from_secs(60)
        } else {
            Duration::from_millis(DEBOUNCE_MS)
        }
    }
}

// =============================================================================
// Reload
// =============================================================================

/// Build a fresh context for the same config file.
///
/// A changed `conf.toml` is re-read; the CLI overrides and resolved paths of
/// the running server are kept for everything else.
fn reload(current: &SiteContext, changed: &[PathBuf]) -> Result<SiteContext> {
    let old = current.config();
    let config = if changed.iter().any(|p| p == &old.config_path) {
        let mut config = SiteConfig::from_path(&old.config_path)?;
        config.resolve_paths(&old.root, &old.config_path);
        config.site.build = false;
        config.serve = old.serve.clone();
        config.validate()?;
        config
    } else {
        old.clone()
    };

    SiteContext::load(config)
}

/// Swap in a rebuilt context. Returns true on success (for cooldown tracking).
fn handle_changes(paths: &[PathBuf], current: &ArcSwap<SiteContext>) -> bool {
    if paths.is_empty() {
        return false;
    }

    let site = current.load();
    let root = &site.config().root;
    let names: Vec<_> = paths.iter().map(|p| rel_path(p, root)).collect();
    log!("watch"; "{} changed, reloading...", names.join(", "));

    match reload(&site, paths) {
        Ok(next) => {
            current.store(next.into());
            log!("watch"; "reloaded");
            true
        }
        Err(err) => {
            log!("watch"; "reload failed, keeping previous data");
            log!("error"; "{err:#}");
            false
        }
    }
}

// =============================================================================
// Watcher Setup
// =============================================================================

/// Watch each of `paths`, directories recursively.
fn watch_all(watcher: &mut impl Watcher, paths: &[PathBuf], root: &Path) -> Result<()> {
    let mut watched = Vec::new();

    for path in paths {
        let mode = if path.is_dir() {
            RecursiveMode::Recursive
        } else {
            RecursiveMode::NonRecursive
        };
        watcher
            .watch(path, mode)
            .with_context(|| format!("Failed to watch {}", path.display()))?;

        let suffix = if path.is_dir() { "/" } else { "" };
        watched.push(format!("{}{suffix}", rel_path(path, root)));
    }

    log!("watch"; "{}", watched.join(", "));
    Ok(())
}

/// Start watching the inputs of `site`. Returns what is now watched.
fn setup_watchers(watcher: &mut impl Watcher, site: &SiteContext) -> Result<Vec<PathBuf>> {
    let paths = site.watch_paths();
    watch_all(watcher, &paths, &site.config().root)?;
    Ok(paths)
}

/// Split a change of watched inputs into paths to drop and paths to add.
fn watch_diff(old: &[PathBuf], new: &[PathBuf]) -> (Vec<PathBuf>, Vec<PathBuf>) {
    let removed = old.iter().filter(|p| !new.contains(p)).cloned().collect();
    let added = new.iter().filter(|p| !old.contains(p)).cloned().collect();
    (removed, added)
}

/// Bring the watcher in line with a reloaded `site`, whose config may
/// point at other inputs than before.
///
/// Failures are logged; the server keeps running on whatever is watched.
fn rewatch(watcher: &mut impl Watcher, watched: &mut Vec<PathBuf>, site: &SiteContext) {
    let paths = site.watch_paths();
    let (removed, added) = watch_diff(watched, &paths);

    for path in &removed {
        if let Err(e) = watcher.unwatch(path) {
            log!("watch"; "failed to unwatch {}: {e}", path.display());
        }
    }
    if !added.is_empty() {
        if let Err(e) = watch_all(watcher, &added, &site.config().root) {
            log!("watch"; "{e:#}");
        }
    }

    *watched = paths;
}

const fn is_relevant(event: &Event) -> bool {
    matches!(
        event.kind,
        EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
    )
}

// =============================================================================
// Public API
// =============================================================================

/// Watch the current context's inputs and reload it on change.
///
/// Blocks until the event channel closes.
pub fn watch_for_changes_blocking(current: &ArcSwap<SiteContext>) -> Result<()> {
    let (tx, rx) = channel();
    let mut watcher = notify::recommended_watcher(tx).context("Failed to create file watcher")?;
    let mut watched = setup_watchers(&mut watcher, &current.load())?;

    let mut debouncer = Debouncer::new();

    loop {
        match rx.recv_timeout(debouncer.timeout()) {
            Ok(Ok(event)) if is_relevant(&event) && !debouncer.in_cooldown() => {
                debouncer.add(event);
            }
            Ok(Err(e)) => log!("watch"; "error: {e}"),
            Err(RecvTimeoutError::Timeout) if debouncer.ready() => {
                if handle_changes(&debouncer.take(), current) {
                    rewatch(&mut watcher, &mut watched, &current.load());
                    debouncer.mark_reload();
                }
            }
            Err(RecvTimeoutError::Disconnected) => break,
            _ => {}
        }
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{context::fixture::fixture_context, data::fixture};
    use notify::event::{CreateKind, ModifyKind};
    use std::fs;

    fn event(kind: EventKind, paths: &[&str]) -> Event {
        let mut event = Event::new(kind);
        for path in paths {
            event = event.add_path(PathBuf::from(path));
        }
        event
    }

    #[test]
    fn test_is_temp_file() {
        assert!(is_temp_file(Path::new("papers.json.swp")));
        assert!(is_temp_file(Path::new("papers.json~")));
        assert!(is_temp_file(Path::new(".#papers.json")));
        assert!(!is_temp_file(Path::new("papers.json")));
    }

    #[test]
    fn test_debouncer_ignores_temp_files() {
        let mut debouncer = Debouncer::new();
        debouncer.add(event(EventKind::Create(CreateKind::File), &["/d/.papers.json.swp"]));
        assert!(debouncer.take().is_empty());

        debouncer.add(event(
            EventKind::Modify(ModifyKind::Any),
            &["/d/papers.json", "/d/papers.json", "/d/speakers.yml"],
        ));
        let mut taken = debouncer.take();
        taken.sort();
        assert_eq!(taken, [PathBuf::from("/d/papers.json"), PathBuf::from("/d/speakers.yml")]);
    }

    #[test]
    fn test_debouncer_waits() {
        let mut debouncer = Debouncer::new();
        assert!(!debouncer.ready());
        assert_eq!(debouncer.timeout(), Duration::from_secs(60));

        debouncer.add(event(EventKind::Modify(ModifyKind::Any), &["/d/papers.json"]));
        assert!(!debouncer.ready());
        assert_eq!(debouncer.timeout(), Duration::from_millis(DEBOUNCE_MS));

        debouncer.mark_reload();
        assert!(debouncer.in_cooldown());
    }

    #[test]
    fn test_reload_swaps_new_data() {
        let dir = fixture::site_dir();
        let current = ArcSwap::from_pointee(fixture_context(dir.path()));

        let papers = dir.path().join("sitedata/papers.json");
        fs::write(&papers, r#"[{"UID": "p9", "title": "New", "abstract": "x"}]"#).unwrap();
        fs::write(dir.path().join("sitedata/highlighted.csv"), "UID\np9\n").unwrap();

        assert!(handle_changes(&[papers], &current));
        let site = current.load();
        assert_eq!(site.data().papers().len(), 1);
        assert!(site.data().papers().get("p9").is_some());
    }

    #[test]
    fn test_watch_diff() {
        let paths = |raw: &[&str]| raw.iter().map(PathBuf::from).collect::<Vec<_>>();
        let old = paths(&["/p/sitedata", "/p/conf.toml"]);

        let (removed, added) = watch_diff(&old, &paths(&["/p/data2", "/p/conf.toml", "/p/README.md"]));
        assert_eq!(removed, paths(&["/p/sitedata"]));
        assert_eq!(added, paths(&["/p/data2", "/p/README.md"]));

        let (removed, added) = watch_diff(&old, &old);
        assert!(removed.is_empty() && added.is_empty());
    }

    #[test]
    fn test_config_reload_moves_watched_inputs() {
        let dir = fixture::site_dir();
        let conf = dir.path().join("conf.toml");
        fs::write(&conf, "").unwrap();
        let current = ArcSwap::from_pointee(fixture_context(dir.path()));

        let mut watcher = notify::recommended_watcher(|_: notify::Result<Event>| {}).unwrap();
        let mut watched = setup_watchers(&mut watcher, &current.load()).unwrap();
        assert!(watched.iter().any(|p| p.ends_with("sitedata")));

        let moved = dir.path().join("data2");
        fs::create_dir(&moved).unwrap();
        for entry in fs::read_dir(dir.path().join("sitedata")).unwrap() {
            let path = entry.unwrap().path();
            fs::copy(&path, moved.join(path.file_name().unwrap())).unwrap();
        }
        fs::write(&conf, "[site]\ndata_path = \"data2\"\n").unwrap();

        let conf = current.load().config().config_path.clone();
        assert!(handle_changes(&[conf], &current));
        rewatch(&mut watcher, &mut watched, &current.load());

        assert!(watched.iter().any(|p| p.ends_with("data2")));
        assert!(!watched.iter().any(|p| p.ends_with("sitedata")));
        assert_eq!(watched, current.load().watch_paths());
    }

    #[test]
    fn test_failed_reload_keeps_previous_context() {
        let dir = fixture::site_dir();
        let current = ArcSwap::from_pointee(fixture_context(dir.path()));

        let papers = dir.path().join("sitedata/papers.json");
        fs::write(&papers, "[{").unwrap();

        assert!(!handle_changes(&[papers], &current));
        assert_eq!(current.load().data().papers().len(), 2);
    }
}
