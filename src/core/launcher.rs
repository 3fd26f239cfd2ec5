use std::collections::HashSet;

use tracing::{info, warn};

use super::launch::Spawn;
use super::store::ConfigStore;
use super::tree::ConfigTree;
use super::EntryId;
use crate::render::{build_rows, document_to_display, DisplayNode, DisplayRow};

/// Global shortcuts delivered by the hotkey collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HotkeyEvent {
    ToggleVisibility,
    OpenEditor,
}

/// What the UI layer should do after the launcher handled an input.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LauncherAction {
    None,
    OpenEditor,
}

/// The launcher popup: a read-mostly copy of the document that is only
/// ever replaced by a full reload.
pub struct LauncherView {
    store: ConfigStore,
    tree: ConfigTree,
    display: DisplayNode,
    query: String,
    matches: Option<HashSet<EntryId>>,
    collapsed: HashSet<EntryId>,
    rows: Vec<DisplayRow>,
    selected: usize,
    visible: bool,
    status: Option<String>,
}

impl LauncherView {
    /// Load the document from `store`. The popup starts visible.
    pub fn new(store: ConfigStore) -> Self {
        let tree = ConfigTree::from_document(&store.load());
        let mut view = Self {
            store,
            display: document_to_display(&tree),
            tree,
            query: String::new(),
            matches: None,
            collapsed: HashSet::new(),
            rows: Vec::new(),
            selected: 0,
            visible: true,
            status: None,
        };
        view.refresh_rows();
        view
    }

    pub fn tree(&self) -> &ConfigTree {
        &self.tree
    }

    pub fn display(&self) -> &DisplayNode {
        &self.display
    }

    pub fn rows(&self) -> &[DisplayRow] {
        &self.rows
    }

    pub fn selected(&self) -> usize {
        self.selected
    }

    pub fn selected_row(&self) -> Option<&DisplayRow> {
        self.rows.get(self.selected)
    }

    pub fn is_visible(&self) -> bool {
        self.visible
    }

    pub fn query(&self) -> &str {
        &self.query
    }

    pub fn status(&self) -> Option<&str> {
        self.status.as_deref()
    }

    pub fn clear_status(&mut self) {
        self.status = None;
    }

    // =======================================================================
    // Inputs
    // =======================================================================

    pub fn handle_hotkey(&mut self, event: HotkeyEvent) -> LauncherAction {
        match event {
            HotkeyEvent::ToggleVisibility => {
                self.visible = !self.visible;
                LauncherAction::None
            }
            HotkeyEvent::OpenEditor => LauncherAction::OpenEditor,
        }
    }

    /// Replace the search text and re-filter the rows.
    pub fn set_query(&mut self, query: &str) {
        self.query = query.to_string();
        self.matches = if self.query.trim().is_empty() {
            None
        } else {
            Some(self.tree.filter(&self.query))
        };
        self.selected = 0;
        self.refresh_rows();
    }

    /// Move the selection by `delta` rows, clamped to the list.
    pub fn move_selection(&mut self, delta: isize) {
        if self.rows.is_empty() {
            self.selected = 0;
            return;
        }
        let last = self.rows.len() - 1;
        self.selected = self.selected.saturating_add_signed(delta).min(last);
    }

    pub fn select(&mut self, index: usize) {
        self.selected = index.min(self.rows.len().saturating_sub(1));
    }

    /// Expand or collapse a folder.
    pub fn toggle_folder(&mut self, id: EntryId) {
        if !self.tree.get(id).is_some_and(|e| e.is_folder()) {
            return;
        }
        if !self.collapsed.remove(&id) {
            self.collapsed.insert(id);
        }
        self.refresh_rows();
    }

    /// Launch the selected app, or expand/collapse the selected folder.
    /// A failed launch only sets the status message.
    pub fn activate_selected(&mut self, spawner: &dyn Spawn) {
        let Some(id) = self.selected_row().and_then(|row| row.entry) else {
            return;
        };
        let Some(entry) = self.tree.get(id) else {
            return;
        };
        let Some(command) = entry.command() else {
            self.toggle_folder(id);
            return;
        };
        let name = entry.name.clone();
        match spawner.spawn(command) {
            Ok(()) => {
                info!(name = %name, "launched entry");
                self.status = Some(format!("Launched: {name}"));
            }
            Err(e) => {
                warn!("{}", e);
                self.status = Some(e.to_string());
            }
        }
    }

    /// Replace the in-memory copy with whatever is on disk now.
    pub fn on_config_changed(&mut self) {
        self.tree = ConfigTree::from_document(&self.store.load());
        self.display = document_to_display(&self.tree);
        // Ids do not survive a reload.
        self.collapsed.clear();
        let query = std::mem::take(&mut self.query);
        self.set_query(&query);
        info!(entries = self.tree.len(), "launcher reloaded config");
        self.status = Some("Config reloaded".to_string());
    }

    fn refresh_rows(&mut self) {
        self.rows = build_rows(
            &self.display,
            &self.tree,
            &self.collapsed,
            self.matches.as_ref(),
        );
        self.select(self.selected);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::document::{ConfigDocument, EntryRecord};
    use crate::core::launch::LaunchError;
    use std::cell::RefCell;
    use tempfile::tempdir;

    #[derive(Default)]
    struct RecordingSpawner {
        launched: RefCell<Vec<String>>,
        fail: bool,
    }

    impl Spawn for RecordingSpawner {
        fn spawn(&self, command: &str) -> Result<(), LaunchError> {
            if self.fail {
                return Err(LaunchError::NotFound(command.to_string()));
            }
            self.launched.borrow_mut().push(command.to_string());
            Ok(())
        }
    }

    fn labels(view: &LauncherView) -> Vec<&str> {
        view.rows().iter().map(|r| r.label.as_str()).collect()
    }

    fn row_index(view: &LauncherView, label: &str) -> usize {
        view.rows().iter().position(|r| r.label == label).unwrap()
    }

    fn default_view() -> (tempfile::TempDir, LauncherView) {
        let dir = tempdir().unwrap();
        let view = LauncherView::new(ConfigStore::new(dir.path().join("config.json")));
        (dir, view)
    }

    #[test]
    fn test_new_shows_default_expanded() {
        let (_dir, view) = default_view();
        assert!(view.is_visible());
        assert_eq!(
            labels(&view),
            vec!["Notepad", "Calculator", "Utilities", "Command Prompt"]
        );
        assert_eq!(view.selected(), 0);
    }

    #[test]
    fn test_hotkeys() {
        let (_dir, mut view) = default_view();
        assert_eq!(
            view.handle_hotkey(HotkeyEvent::ToggleVisibility),
            LauncherAction::None
        );
        assert!(!view.is_visible());
        view.handle_hotkey(HotkeyEvent::ToggleVisibility);
        assert!(view.is_visible());
        assert_eq!(
            view.handle_hotkey(HotkeyEvent::OpenEditor),
            LauncherAction::OpenEditor
        );
        assert!(view.is_visible());
    }

    #[test]
    fn test_activate_app_launches_command() {
        let (_dir, mut view) = default_view();
        let spawner = RecordingSpawner::default();
        view.select(row_index(&view, "Calculator"));
        view.activate_selected(&spawner);
        assert_eq!(*spawner.launched.borrow(), vec!["calc.exe"]);
        assert_eq!(view.status(), Some("Launched: Calculator"));
    }

    #[test]
    fn test_launch_failure_becomes_status() {
        let (_dir, mut view) = default_view();
        let spawner = RecordingSpawner {
            fail: true,
            ..Default::default()
        };
        view.activate_selected(&spawner);
        assert_eq!(
            view.status(),
            Some("Failed to launch notepad.exe: command not found")
        );
        // The view stays usable.
        assert!(view.is_visible());
        assert_eq!(view.rows().len(), 4);
    }

    #[test]
    fn test_activate_folder_toggles_it() {
        let (_dir, mut view) = default_view();
        let spawner = RecordingSpawner::default();
        view.select(row_index(&view, "Utilities"));
        view.activate_selected(&spawner);
        assert_eq!(labels(&view), vec!["Notepad", "Calculator", "Utilities"]);
        assert!(!view.rows()[2].is_expanded);
        view.activate_selected(&spawner);
        assert_eq!(view.rows().len(), 4);
        assert!(spawner.launched.borrow().is_empty());
    }

    #[test]
    fn test_query_filters_rows() {
        let (_dir, mut view) = default_view();
        view.move_selection(2);
        view.set_query("prompt");
        assert_eq!(labels(&view), vec!["Utilities", "Command Prompt"]);
        assert_eq!(view.selected(), 0);

        view.set_query("xyz");
        assert!(view.rows().is_empty());
        assert!(view.selected_row().is_none());

        view.set_query("");
        assert_eq!(view.rows().len(), 4);
    }

    #[test]
    fn test_move_selection_is_clamped() {
        let (_dir, mut view) = default_view();
        view.move_selection(-3);
        assert_eq!(view.selected(), 0);
        view.move_selection(10);
        assert_eq!(view.selected(), 3);
        view.move_selection(-1);
        assert_eq!(view.selected(), 2);
    }

    #[test]
    fn test_on_config_changed_replaces_copy() {
        let (dir, mut view) = default_view();
        let store = ConfigStore::new(dir.path().join("config.json"));
        store
            .save(&ConfigDocument {
                apps: vec![EntryRecord::folder(
                    "Dev",
                    vec![EntryRecord::app("VSCode", "code.exe")],
                )],
            })
            .unwrap();

        view.on_config_changed();
        assert_eq!(labels(&view), vec!["Dev", "VSCode"]);
        assert_eq!(view.status(), Some("Config reloaded"));
        view.clear_status();
        assert_eq!(view.status(), None);
    }

    #[test]
    fn test_reload_keeps_query() {
        let (_dir, mut view) = default_view();
        view.set_query("calc");
        view.on_config_changed();
        assert_eq!(view.query(), "calc");
        assert_eq!(labels(&view), vec!["Calculator"]);
    }
}
