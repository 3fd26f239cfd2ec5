pub mod document;
pub mod editor;
pub mod entry;
pub mod launch;
pub mod launcher;
pub mod store;
pub mod tree;
pub mod watch;

pub use document::{AppRecord, ConfigDocument, EntryRecord, FolderRecord};
pub use editor::{Editor, EditorAction, EntryForm};
pub use entry::{Entry, EntryId, EntryKind, EntryUpdate, NewApp, NewFolder};
pub use launch::{LaunchError, ProcessSpawner, Spawn};
pub use launcher::{HotkeyEvent, LauncherAction, LauncherView};
pub use store::{ConfigStore, StoreError};
pub use tree::{ConfigTree, TreeError};
pub use watch::{ChangeNotifier, ConfigEvent, ConfigWatcher};
