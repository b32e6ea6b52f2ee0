// SPDX-License-Identifier: MIT OR Apache-2.0
// Copyright (c) 2025 pipewatch contributors

//! Watch loop
//!
//! Registers every non-ignored directory under the root with the OS watch
//! facility, keeps that set current as directories come and go, and folds
//! bursts of filesystem events into a single debounced pipeline trigger
//! carrying the last change's path and kind.
//!
//! One task owns all state: notify delivers events from its own thread
//! through a channel, and a single `select!` loop multiplexes those events
//! against the debounce deadline. The watch set and the pending change are
//! never touched from anywhere else.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::time::Duration;

use colored::Colorize;
use notify::event::ModifyKind;
use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;
use tokio::time::{sleep_until, Instant};

use crate::errors::PipewatchResult;
use crate::pipeline::{PipelineConfig, PipelineEngine};

/// Watch `root` and rerun the pipeline on changes.
///
/// Blocks until the event source closes or a pipeline run fails; the failure
/// propagates to the caller, which decides whether to exit the process.
pub async fn start_watching(
    root: PathBuf,
    config: PipelineConfig,
    build_file: String,
    debounce: Duration,
) -> PipewatchResult<()> {
    let (mut watch_loop, rx) = WatchLoop::new(root, config, build_file, debounce)?;
    watch_loop.register_tree(watch_loop.root.clone());

    println!(
        "Watching {} (debounce: {}ms). Press {} to exit.",
        watch_loop.root.display(),
        debounce.as_millis(),
        "Ctrl+C".cyan()
    );

    watch_loop.run(rx).await
}

/// The change waiting for the debounce window to elapse
#[derive(Debug, Clone, PartialEq, Eq)]
struct PendingChange {
    path: String,
    kind: &'static str,
}

struct WatchLoop {
    root: PathBuf,
    config: PipelineConfig,
    build_file: String,
    debounce: Duration,
    watcher: RecommendedWatcher,
    /// Directories currently registered with the OS watcher
    watched: HashSet<PathBuf>,
    /// Last change observed inside the current debounce window
    pending: Option<PendingChange>,
    /// When the current window elapses; None while idle
    deadline: Option<Instant>,
}

impl WatchLoop {
    fn new(
        root: PathBuf,
        config: PipelineConfig,
        build_file: String,
        debounce: Duration,
    ) -> PipewatchResult<(Self, mpsc::UnboundedReceiver<notify::Result<Event>>)> {
        let (tx, rx) = mpsc::unbounded_channel();

        // notify runs its own thread; events cross into the loop's task
        // through the channel so all state stays single-owner.
        let watcher = notify::recommended_watcher(move |res: notify::Result<Event>| {
            let _ = tx.send(res);
        })?;

        Ok((
            Self {
                root,
                config,
                build_file,
                debounce,
                watcher,
                watched: HashSet::new(),
                pending: None,
                deadline: None,
            },
            rx,
        ))
    }

    async fn run(
        &mut self,
        mut rx: mpsc::UnboundedReceiver<notify::Result<Event>>,
    ) -> PipewatchResult<()> {
        loop {
            // The sleep is only polled when a deadline is armed; the
            // fallback instant is never awaited.
            let deadline = self.deadline.unwrap_or_else(Instant::now);

            tokio::select! {
                received = rx.recv() => {
                    match received {
                        Some(Ok(event)) => self.handle_event(&event),
                        Some(Err(e)) => tracing::warn!("Watcher error: {e}"),
                        // Event source closed; nothing left to watch.
                        None => return Ok(()),
                    }
                }
                _ = sleep_until(deadline), if self.deadline.is_some() => {
                    self.fire().await?;
                }
            }
        }
    }

    /// Process one filesystem event on the loop's own task.
    fn handle_event(&mut self, event: &Event) {
        let Some(kind) = event_label(&event.kind) else {
            return; // access/metadata noise
        };

        for path in &event.paths {
            if self.config.should_ignore(self.relative(path)) {
                continue;
            }

            // Directories moved into the tree arrive as rename events on
            // inotify, not creates, so both kinds register the subtree. A
            // rename whose path is gone is a move out and falls through to
            // deregistration instead.
            match event.kind {
                EventKind::Create(_) | EventKind::Modify(ModifyKind::Name(_))
                    if path.is_dir() =>
                {
                    self.register_tree(path.clone());
                }
                EventKind::Remove(_) | EventKind::Modify(ModifyKind::Name(_)) => {
                    if self.watched.remove(path) {
                        if let Err(e) = self.watcher.unwatch(path) {
                            tracing::warn!("Failed to unwatch {}: {e}", path.display());
                        }
                        tracing::debug!("Unwatched {}", path.display());
                    }
                }
                _ => {}
            }

            // Last write wins: the newest change overwrites the pending one
            // and the window restarts from now.
            self.pending = Some(PendingChange {
                path: path.display().to_string(),
                kind,
            });
            self.deadline = Some(Instant::now() + self.debounce);
        }
    }

    /// Recursively register `dir` and its non-ignored subdirectories.
    ///
    /// A directory that cannot be watched (permissions, deleted underneath
    /// us) is logged and skipped; the rest of the tree is still registered.
    fn register_tree(&mut self, dir: PathBuf) {
        if self.watched.contains(&dir) || self.config.should_ignore(self.relative(&dir)) {
            return;
        }

        if let Err(e) = self.watcher.watch(&dir, RecursiveMode::NonRecursive) {
            tracing::warn!("Failed to watch {}: {e}", dir.display());
            return;
        }
        self.watched.insert(dir.clone());
        tracing::debug!("Watching {}", dir.display());

        // Snapshot entries before recursing so we never iterate a directory
        // while the watch set is changing under it.
        let entries: Vec<PathBuf> = match std::fs::read_dir(&dir) {
            Ok(rd) => rd
                .filter_map(|entry| entry.ok())
                .filter(|entry| entry.file_type().map(|t| t.is_dir()).unwrap_or(false))
                .map(|entry| entry.path())
                .collect(),
            Err(e) => {
                tracing::warn!("Failed to read {}: {e}", dir.display());
                return;
            }
        };

        for sub in entries {
            self.register_tree(sub);
        }
    }

    /// Debounce window elapsed: trigger the pipeline if a change is pending.
    async fn fire(&mut self) -> PipewatchResult<()> {
        self.deadline = None;

        // A fire without a pending change is spurious; ignore it.
        let Some(change) = self.pending.take() else {
            return Ok(());
        };

        println!();
        println!(
            "{} {} ({})",
            "Change detected:".yellow(),
            change.path,
            change.kind
        );

        PipelineEngine::new()
            .run(&self.config, &self.build_file, &change.path, change.kind)
            .await?;

        Ok(())
    }

    /// Path relative to the watch root, for the ignore predicate.
    fn relative<'a>(&self, path: &'a Path) -> &'a Path {
        path.strip_prefix(&self.root).unwrap_or(path)
    }
}

/// Map a notify event kind onto the vocabulary exposed as $EVENT_TYPE.
fn event_label(kind: &EventKind) -> Option<&'static str> {
    match kind {
        EventKind::Create(_) => Some("CREATE"),
        EventKind::Modify(ModifyKind::Name(_)) => Some("RENAME"),
        EventKind::Modify(ModifyKind::Metadata(_)) => None, // chmod etc.
        EventKind::Modify(_) => Some("WRITE"),
        EventKind::Remove(_) => Some("REMOVE"),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{CreateKind, RemoveKind};

    fn watch_loop(root: &Path, ignore: Vec<String>) -> WatchLoop {
        let config = PipelineConfig {
            ignore,
            ..Default::default()
        };
        let (wl, _rx) = WatchLoop::new(
            root.to_path_buf(),
            config,
            "build.yaml".into(),
            Duration::from_secs(1),
        )
        .unwrap();
        wl
    }

    fn write_event(path: &Path) -> Event {
        Event::new(EventKind::Modify(ModifyKind::Data(
            notify::event::DataChange::Content,
        )))
        .add_path(path.to_path_buf())
    }

    #[test]
    fn test_register_tree_recurses_and_skips_ignored() {
        let dir = tempfile::tempdir().unwrap();
        std::fs::create_dir_all(dir.path().join("src/nested")).unwrap();
        std::fs::create_dir_all(dir.path().join("target/debug")).unwrap();

        let mut wl = watch_loop(dir.path(), vec!["target/".into()]);
        wl.register_tree(dir.path().to_path_buf());

        assert!(wl.watched.contains(dir.path()));
        assert!(wl.watched.contains(&dir.path().join("src")));
        assert!(wl.watched.contains(&dir.path().join("src/nested")));
        assert!(!wl.watched.contains(&dir.path().join("target")));
        assert!(!wl.watched.contains(&dir.path().join("target/debug")));
    }

    #[test]
    fn test_create_event_registers_new_subtree() {
        let dir = tempfile::tempdir().unwrap();
        let mut wl = watch_loop(dir.path(), vec![]);
        wl.register_tree(dir.path().to_path_buf());

        let new_dir = dir.path().join("brand-new");
        std::fs::create_dir_all(new_dir.join("inner")).unwrap();

        let event = Event::new(EventKind::Create(CreateKind::Folder))
            .add_path(new_dir.clone());
        wl.handle_event(&event);

        assert!(wl.watched.contains(&new_dir));
        assert!(wl.watched.contains(&new_dir.join("inner")));
    }

    #[test]
    fn test_rename_into_tree_registers_directory() {
        // inotify reports a directory moved into the tree as a rename, not
        // a create; it must still join the watch set.
        let dir = tempfile::tempdir().unwrap();
        let mut wl = watch_loop(dir.path(), vec![]);
        wl.register_tree(dir.path().to_path_buf());

        let moved_in = dir.path().join("moved-in");
        std::fs::create_dir_all(moved_in.join("inner")).unwrap();

        let event = Event::new(EventKind::Modify(ModifyKind::Name(
            notify::event::RenameMode::To,
        )))
        .add_path(moved_in.clone());
        wl.handle_event(&event);

        assert!(wl.watched.contains(&moved_in));
        assert!(wl.watched.contains(&moved_in.join("inner")));
    }

    #[test]
    fn test_rename_out_of_tree_drops_directory() {
        let dir = tempfile::tempdir().unwrap();
        let moved_out = dir.path().join("moved-out");
        std::fs::create_dir(&moved_out).unwrap();

        let mut wl = watch_loop(dir.path(), vec![]);
        wl.register_tree(dir.path().to_path_buf());
        assert!(wl.watched.contains(&moved_out));

        std::fs::remove_dir(&moved_out).unwrap();
        let event = Event::new(EventKind::Modify(ModifyKind::Name(
            notify::event::RenameMode::From,
        )))
        .add_path(moved_out.clone());
        wl.handle_event(&event);

        assert!(!wl.watched.contains(&moved_out));
    }

    #[test]
    fn test_ignored_directory_never_joins_watch_set() {
        let dir = tempfile::tempdir().unwrap();
        let mut wl = watch_loop(dir.path(), vec!["node_modules/".into()]);
        wl.register_tree(dir.path().to_path_buf());

        let ignored = dir.path().join("node_modules");
        std::fs::create_dir(&ignored).unwrap();

        let event = Event::new(EventKind::Create(CreateKind::Folder)).add_path(ignored.clone());
        wl.handle_event(&event);

        assert!(!wl.watched.contains(&ignored));
        // And the create event did not arm the debounce either.
        assert!(wl.pending.is_none());
    }

    #[test]
    fn test_remove_event_drops_directory_from_watch_set() {
        let dir = tempfile::tempdir().unwrap();
        let gone = dir.path().join("gone");
        std::fs::create_dir(&gone).unwrap();

        let mut wl = watch_loop(dir.path(), vec![]);
        wl.register_tree(dir.path().to_path_buf());
        assert!(wl.watched.contains(&gone));

        std::fs::remove_dir(&gone).unwrap();
        let event = Event::new(EventKind::Remove(RemoveKind::Folder)).add_path(gone.clone());
        wl.handle_event(&event);

        assert!(!wl.watched.contains(&gone));
    }

    #[test]
    fn test_debounce_keeps_only_last_change() {
        let dir = tempfile::tempdir().unwrap();
        let mut wl = watch_loop(dir.path(), vec![]);
        wl.register_tree(dir.path().to_path_buf());

        wl.handle_event(&write_event(&dir.path().join("a.rs")));
        wl.handle_event(&write_event(&dir.path().join("b.rs")));
        let last = dir.path().join("c.rs");
        wl.handle_event(&write_event(&last));

        let pending = wl.pending.as_ref().unwrap();
        assert_eq!(pending.path, last.display().to_string());
        assert_eq!(pending.kind, "WRITE");
        assert!(wl.deadline.is_some());
    }

    #[test]
    fn test_ignored_file_event_does_not_arm_debounce() {
        let dir = tempfile::tempdir().unwrap();
        let mut wl = watch_loop(dir.path(), vec!["*.log".into()]);
        wl.register_tree(dir.path().to_path_buf());

        wl.handle_event(&write_event(&dir.path().join("noise.log")));

        assert!(wl.pending.is_none());
        assert!(wl.deadline.is_none());
    }

    #[tokio::test]
    async fn test_spurious_fire_is_a_noop() {
        let dir = tempfile::tempdir().unwrap();
        let mut wl = watch_loop(dir.path(), vec![]);
        wl.deadline = Some(Instant::now());

        assert!(wl.fire().await.is_ok());
        assert!(wl.deadline.is_none());
    }

    #[test]
    fn test_event_labels() {
        assert_eq!(
            event_label(&EventKind::Create(CreateKind::File)),
            Some("CREATE")
        );
        assert_eq!(
            event_label(&EventKind::Remove(RemoveKind::File)),
            Some("REMOVE")
        );
        assert_eq!(
            event_label(&EventKind::Modify(ModifyKind::Name(
                notify::event::RenameMode::Any
            ))),
            Some("RENAME")
        );
        assert_eq!(event_label(&EventKind::Access(notify::event::AccessKind::Any)), None);
    }
}
