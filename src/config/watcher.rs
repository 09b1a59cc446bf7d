use anyhow::Result;
use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use std::ffi::OsString;
use std::path::Path;
use std::sync::mpsc::channel;
use std::time::Duration;
use tracing::{error, info, warn};

/// Calls `on_change` whenever the watched schema file is modified.
///
/// The containing directory is watched rather than the file, so saves that
/// replace the file through a rename keep being seen.
pub struct SchemaWatcher {
    _watcher: RecommendedWatcher,
}

impl SchemaWatcher {
    pub fn new<F>(path: &Path, on_change: F) -> Result<Self>
    where
        F: Fn() + Send + Sync + 'static,
    {
        let (tx, rx) = channel::<notify::Result<Event>>();

        let mut watcher = RecommendedWatcher::new(tx, Config::default())?;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent,
            _ => Path::new("."),
        };
        let file_name = path.file_name().map(OsString::from);

        match &file_name {
            Some(_) if dir.is_dir() => {
                watcher.watch(dir, RecursiveMode::NonRecursive)?;
                info!("Watching field schema: {}", path.display());
            }
            _ => warn!("Field schema directory does not exist, not watching: {}", path.display()),
        }

        std::thread::spawn(move || loop {
            match rx.recv() {
                Ok(Ok(event)) => {
                    if event.kind.is_access() || !touches(&event, file_name.as_deref()) {
                        continue;
                    }
                    // editors often write in several steps
                    std::thread::sleep(Duration::from_millis(100));
                    while rx.try_recv().is_ok() {}
                    info!("Field schema change detected, reloading...");
                    on_change();
                }
                Ok(Err(e)) => error!("Watch error: {:?}", e),
                Err(e) => {
                    error!("Watch channel error: {:?}", e);
                    break;
                }
            }
        });

        Ok(Self { _watcher: watcher })
    }
}

fn touches(event: &Event, file_name: Option<&std::ffi::OsStr>) -> bool {
    file_name.is_some_and(|name| event.paths.iter().any(|p| p.file_name() == Some(name)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use notify::event::{AccessKind, CreateKind, EventKind};
    use std::fs;
    use std::path::PathBuf;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::sync::Arc;
    use std::time::Instant;
    use tempfile::TempDir;

    fn wait_past(counter: &AtomicUsize, previous: usize) -> usize {
        let deadline = Instant::now() + Duration::from_secs(5);
        while Instant::now() < deadline {
            let now = counter.load(Ordering::SeqCst);
            if now > previous {
                // let trailing events from the same save settle
                std::thread::sleep(Duration::from_millis(300));
                return counter.load(Ordering::SeqCst);
            }
            std::thread::sleep(Duration::from_millis(20));
        }
        panic!("no reload after {} previous reloads", previous);
    }

    fn atomic_save(dir: &Path, target: &Path, content: &str) {
        let tmp = dir.join(".fields.yaml.swp");
        fs::write(&tmp, content).unwrap();
        fs::rename(&tmp, target).unwrap();
    }

    #[test]
    fn test_touches_matches_file_name_only() {
        let event = Event::new(EventKind::Create(CreateKind::File))
            .add_path(PathBuf::from("/tmp/schemas/fields.yaml"));
        assert!(touches(&event, Some("fields.yaml".as_ref())));
        assert!(!touches(&event, Some("other.yaml".as_ref())));
        assert!(!touches(&event, None));

        let access = Event::new(EventKind::Access(AccessKind::Any));
        assert!(!touches(&access, Some("fields.yaml".as_ref())));
    }

    #[test]
    fn test_reloads_after_repeated_rename_saves() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fields.yaml");
        fs::write(&path, "fields: []\n").unwrap();

        let reloads = Arc::new(AtomicUsize::new(0));
        let counter = reloads.clone();
        let _watcher = SchemaWatcher::new(&path, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
        std::thread::sleep(Duration::from_millis(200));

        fs::write(&path, "fields:\n  - name: a\n").unwrap();
        let seen = wait_past(&reloads, 0);

        atomic_save(dir.path(), &path, "fields:\n  - name: b\n");
        let seen = wait_past(&reloads, seen);

        atomic_save(dir.path(), &path, "fields:\n  - name: c\n");
        let seen = wait_past(&reloads, seen);

        fs::write(&path, "fields:\n  - name: d\n").unwrap();
        wait_past(&reloads, seen);
    }

    #[test]
    fn test_ignores_sibling_files() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("fields.yaml");
        fs::write(&path, "fields: []\n").unwrap();

        let reloads = Arc::new(AtomicUsize::new(0));
        let counter = reloads.clone();
        let _watcher = SchemaWatcher::new(&path, move || {
            counter.fetch_add(1, Ordering::SeqCst);
        })
        .unwrap();
        std::thread::sleep(Duration::from_millis(200));

        fs::write(dir.path().join("notes.txt"), "unrelated").unwrap();
        std::thread::sleep(Duration::from_millis(500));
        assert_eq!(reloads.load(Ordering::SeqCst), 0);
    }
}
