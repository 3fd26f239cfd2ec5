//! "Config changed" plumbing between the owners of document copies.
//!
//! Two paths lead to a reload: the editor fires its [`ChangeNotifier`] after
//! a successful save, and a [`ConfigWatcher`] reports edits made to the file
//! by anything else. Receivers always reload wholesale.

use std::ffi::{OsStr, OsString};
use std::fmt;
use std::path::{Path, PathBuf};
use std::sync::mpsc::{channel, Receiver};

use notify::{Event, EventKind, RecommendedWatcher, RecursiveMode, Watcher};
use tracing::{debug, warn};

/// Single callback slot fired after the editor has saved.
#[derive(Default)]
pub struct ChangeNotifier {
    hook: Option<Box<dyn FnMut()>>,
}

impl fmt::Debug for ChangeNotifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChangeNotifier")
            .field("attached", &self.hook.is_some())
            .finish()
    }
}

impl ChangeNotifier {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register the hook, replacing any previous one.
    pub fn attach(&mut self, hook: impl FnMut() + 'static) {
        self.hook = Some(Box::new(hook));
    }

    pub fn detach(&mut self) {
        self.hook = None;
    }

    pub fn is_attached(&self) -> bool {
        self.hook.is_some()
    }

    /// Run the hook if one is attached. Returns whether it ran.
    pub fn notify(&mut self) -> bool {
        match self.hook.as_mut() {
            Some(hook) => {
                hook();
                true
            }
            None => false,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigEvent {
    ChangedOnDisk,
}

/// Watches the directory holding the config file and reports changes to
/// that file through a channel polled by the event loop.
///
/// The directory is watched rather than the file so that editors which
/// replace the file on save keep being noticed.
pub struct ConfigWatcher {
    // Dropping the watcher stops delivery.
    _watcher: RecommendedWatcher,
    events: Receiver<ConfigEvent>,
    path: PathBuf,
}

impl ConfigWatcher {
    pub fn new(path: &Path) -> notify::Result<Self> {
        let (tx, rx) = channel();
        let file_name: Option<OsString> = path.file_name().map(OsString::from);

        let mut watcher =
            notify::recommended_watcher(move |res: notify::Result<Event>| match res {
                Ok(event) => {
                    if is_config_change(&event, file_name.as_deref()) {
                        debug!(kind = ?event.kind, "config file changed on disk");
                        let _ = tx.send(ConfigEvent::ChangedOnDisk);
                    }
                }
                Err(e) => warn!("config watch error: {:?}", e),
            })?;

        let dir = watch_dir(path);
        std::fs::create_dir_all(&dir).map_err(notify::Error::io)?;
        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        Ok(Self {
            _watcher: watcher,
            events: rx,
            path: path.to_path_buf(),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Drain all pending events. Returns true if the file changed at least
    /// once since the last poll; bursts collapse into one reload.
    pub fn poll(&self) -> bool {
        let mut changed = false;
        while let Ok(ConfigEvent::ChangedOnDisk) = self.events.try_recv() {
            changed = true;
        }
        changed
    }
}

fn watch_dir(path: &Path) -> PathBuf {
    path.parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from("."))
}

fn is_config_change(event: &Event, file_name: Option<&OsStr>) -> bool {
    let relevant_kind = matches!(
        event.kind,
        EventKind::Modify(_) | EventKind::Create(_) | EventKind::Remove(_)
    );
    relevant_kind && event.paths.iter().any(|p| p.file_name() == file_name)
}
