use std::collections::HashSet;

use tracing::{info, warn};

use super::document::ConfigDocument;
use super::entry::{EntryUpdate, NewApp, NewFolder};
use super::store::ConfigStore;
use super::tree::{ConfigTree, TreeError};
use super::watch::ChangeNotifier;
use super::EntryId;
use crate::render::{
    build_rows, display_to_document, document_to_display, DisplayNode, DisplayRow,
};

/// Outcome of an editor command, so the UI layer decides how to present it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditorAction {
    None,
    /// The document was written and the notifier fired.
    Saved,
    /// The command was refused; `Editor::message` says why.
    Error,
}

/// The name / command / icon inputs of the editor.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryForm {
    pub name: String,
    pub command: String,
    pub icon: String,
}

impl EntryForm {
    fn new_app(&self) -> NewApp {
        NewApp {
            name: self.name.clone(),
            command: self.command.clone(),
            icon: Some(self.icon.clone()),
        }
    }

    fn new_folder(&self) -> NewFolder {
        NewFolder {
            name: self.name.clone(),
            icon: Some(self.icon.clone()),
        }
    }

    fn update(&self) -> EntryUpdate {
        EntryUpdate {
            name: self.name.clone(),
            command: self.command.clone(),
            icon: self.icon.clone(),
        }
    }
}

/// The config editor: owner of the mutable document copy.
pub struct Editor {
    store: ConfigStore,
    tree: ConfigTree,
    display: DisplayNode,
    rows: Vec<DisplayRow>,
    selected: Option<EntryId>,
    pub form: EntryForm,
    editing: Option<EntryId>,
    dirty: bool,
    message: Option<String>,
    notifier: ChangeNotifier,
}

impl Editor {
    pub fn new(store: ConfigStore) -> Self {
        let doc = store.load();
        let mut editor = Self {
            store,
            tree: ConfigTree::new(),
            display: DisplayNode::default(),
            rows: Vec::new(),
            selected: None,
            form: EntryForm::default(),
            editing: None,
            dirty: false,
            message: None,
            notifier: ChangeNotifier::new(),
        };
        editor.replace(&doc);
        editor
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

    pub fn store(&self) -> &ConfigStore {
        &self.store
    }

    /// Hook slot fired after every successful save.
    pub fn notifier_mut(&mut self) -> &mut ChangeNotifier {
        &mut self.notifier
    }

    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    pub fn message(&self) -> Option<&str> {
        self.message.as_deref()
    }

    pub fn clear_message(&mut self) {
        self.message = None;
    }

    /// The entry whose fields are loaded into the form, if any.
    pub fn editing(&self) -> Option<EntryId> {
        self.editing
    }

    // =======================================================================
    // Selection
    // =======================================================================

    pub fn selected(&self) -> Option<EntryId> {
        self.selected
    }

    /// Row index of the selection.
    pub fn selected_index(&self) -> Option<usize> {
        let id = self.selected?;
        self.rows.iter().position(|row| row.entry == Some(id))
    }

    pub fn select(&mut self, id: Option<EntryId>) {
        self.selected = id.filter(|id| self.tree.contains(*id));
    }

    pub fn select_row(&mut self, index: usize) {
        self.selected = self.rows.get(index).and_then(|row| row.entry);
    }

    pub fn move_selection(&mut self, delta: isize) {
        if self.rows.is_empty() {
            self.selected = None;
            return;
        }
        let index = match self.selected_index() {
            Some(i) => i.saturating_add_signed(delta).min(self.rows.len() - 1),
            None => 0,
        };
        self.select_row(index);
    }

    // =======================================================================
    // Commands
    // =======================================================================

    /// Add an app from the form. It goes into the selected folder, into the
    /// folder holding the selected app, or at the top level.
    pub fn add_app(&mut self) -> EditorAction {
        let parent = self.selected.and_then(|id| match self.tree.get(id) {
            Some(entry) if entry.is_folder() => Some(id),
            Some(entry) => entry.parent,
            None => None,
        });
        match self.tree.add_app(parent, self.form.new_app()) {
            Ok(id) => {
                let name = self.entry_name(id);
                self.after_mutation(format!("Added app: {name}"));
                EditorAction::None
            }
            Err(e) => self.refuse(e),
        }
    }

    /// Add a folder from the form under the selected folder or at the top
    /// level, then select it.
    pub fn add_folder(&mut self) -> EditorAction {
        let parent = self
            .selected
            .filter(|id| self.tree.get(*id).is_some_and(|e| e.is_folder()));
        match self.tree.add_folder(parent, self.form.new_folder()) {
            Ok(id) => {
                let name = self.entry_name(id);
                self.selected = Some(id);
                self.after_mutation(format!("Added folder: {name}"));
                EditorAction::None
            }
            Err(e) => self.refuse(e),
        }
    }

    /// Remove the selected entry and everything inside it.
    pub fn remove_selected(&mut self) -> EditorAction {
        let Some(id) = self.selected else {
            return self.refuse_with("Select an entry to remove.");
        };
        let index = self.selected_index().unwrap_or(0);
        match self.tree.remove(id) {
            Ok(entry) => {
                self.after_mutation(format!("Removed: {}", entry.name));
                let last = self.rows.len().saturating_sub(1);
                self.select_row(index.min(last));
                EditorAction::None
            }
            Err(e) => self.refuse(e),
        }
    }

    /// Load the selected entry into the form for editing.
    pub fn edit_selected(&mut self) -> EditorAction {
        let Some(entry) = self.selected.and_then(|id| self.tree.get(id)) else {
            return self.refuse_with("Select an entry to edit.");
        };
        self.form = EntryForm {
            name: entry.name.clone(),
            command: entry.command().unwrap_or_default().to_string(),
            icon: entry.icon.clone().unwrap_or_default(),
        };
        self.editing = Some(entry.id);
        EditorAction::None
    }

    /// Write the form back into the entry being edited, then save.
    pub fn apply_edit(&mut self) -> EditorAction {
        let Some(id) = self.editing else {
            return self.refuse_with("Nothing is being edited.");
        };
        if let Err(e) = self.tree.update(id, self.form.update()) {
            return self.refuse(e);
        }
        let name = self.entry_name(id);
        self.after_mutation(format!("Updated: {name}"));
        self.save()
    }

    /// Drop the form contents and the edit target.
    pub fn cancel_edit(&mut self) {
        self.form = EntryForm::default();
        self.editing = None;
    }

    /// Move the selected entry into `target` (a folder, or the top level)
    /// at `index`, counted after the entry has left its old place.
    pub fn move_selected(&mut self, target: Option<EntryId>, index: Option<usize>) -> EditorAction {
        let Some(id) = self.selected else {
            return self.refuse_with("Select an entry to move.");
        };
        match self.tree.relocate(id, target, index) {
            Ok(()) => {
                let name = self.entry_name(id);
                self.after_mutation(format!("Moved: {name}"));
                EditorAction::None
            }
            Err(e) => self.refuse(e),
        }
    }

    /// Persist the displayed tree and tell the other views to reload.
    pub fn save(&mut self) -> EditorAction {
        let doc = display_to_document(&self.display, &self.tree);
        match self.store.save(&doc) {
            Ok(()) => {
                self.dirty = false;
                self.message = Some("Config saved.".to_string());
                self.notifier.notify();
                EditorAction::Saved
            }
            Err(e) => {
                warn!("{}", e);
                self.message = Some(e.to_string());
                EditorAction::Error
            }
        }
    }

    /// Discard in-memory edits and load the file again.
    pub fn reload_from_disk(&mut self) -> EditorAction {
        let doc = if self.store.path().exists() {
            match self.store.load_with_validation() {
                Ok(doc) => doc,
                Err(e) => {
                    warn!("{}", e);
                    self.message = Some(e.to_string());
                    return EditorAction::Error;
                }
            }
        } else {
            self.store.load()
        };
        self.replace(&doc);
        self.message = Some("Reloaded from disk.".to_string());
        EditorAction::None
    }

    /// React to the watcher reporting that the file changed.
    ///
    /// Ignored when the file already matches this copy (our own save) or
    /// cannot be parsed yet. Unsaved edits are kept and win on next save.
    pub fn on_external_change(&mut self) -> EditorAction {
        let doc = match self.store.load_with_validation() {
            Ok(doc) => doc,
            Err(e) => {
                warn!("ignoring config change: {}", e);
                return EditorAction::None;
            }
        };
        if doc == self.current_document() {
            return EditorAction::None;
        }
        if self.dirty {
            self.message = Some("Config changed on disk; unsaved edits kept.".to_string());
            return EditorAction::None;
        }
        self.replace(&doc);
        info!("editor reloaded config after external change");
        self.message = Some("Reloaded from disk.".to_string());
        EditorAction::None
    }

    /// The document this editor would save right now.
    pub fn current_document(&self) -> ConfigDocument {
        display_to_document(&self.display, &self.tree)
    }

    // =======================================================================
    // Internals
    // =======================================================================

    fn replace(&mut self, doc: &ConfigDocument) {
        self.tree = ConfigTree::from_document(doc);
        self.selected = None;
        self.editing = None;
        self.form = EntryForm::default();
        self.dirty = false;
        self.refresh();
    }

    fn refresh(&mut self) {
        self.display = document_to_display(&self.tree);
        self.rows = build_rows(&self.display, &self.tree, &HashSet::new(), None);
        if self.selected.is_some_and(|id| !self.tree.contains(id)) {
            self.selected = None;
        }
    }

    fn after_mutation(&mut self, message: String) {
        self.dirty = true;
        self.form = EntryForm::default();
        self.editing = None;
        self.message = Some(message);
        self.refresh();
    }

    fn entry_name(&self, id: EntryId) -> String {
        self.tree
            .get(id)
            .map(|e| e.name.clone())
            .unwrap_or_default()
    }

    fn refuse(&mut self, err: TreeError) -> EditorAction {
        self.refuse_with(&err.to_string())
    }

    fn refuse_with(&mut self, message: &str) -> EditorAction {
        self.message = Some(message.to_string());
        EditorAction::Error
    }
}
