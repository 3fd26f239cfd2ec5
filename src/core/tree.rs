use std::collections::{HashMap, HashSet};

use thiserror::Error;
use tracing::{debug, warn};

use super::document::{AppRecord, ConfigDocument, EntryRecord, FolderRecord};
use super::entry::{normalize_icon, Entry, EntryId, EntryKind, EntryUpdate, NewApp, NewFolder};

/// Why a tree operation was refused. A refused operation never mutates the
/// tree.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TreeError {
    #[error("App name and command required.")]
    MissingAppFields,
    #[error("Folder name required.")]
    MissingFolderName,
    #[error("Folder \"{0}\" already exists.")]
    DuplicateFolder(String),
    #[error("Folder \"{0}\" not found.")]
    FolderNotFound(String),
    #[error("No entry with id {0:?}.")]
    UnknownEntry(EntryId),
    #[error("Entries can only be placed inside a folder.")]
    NotAFolder,
    #[error("A folder cannot be moved into itself.")]
    CyclicMove,
}

/// The in-memory configuration tree.
///
/// Entries live in a flat table keyed by `EntryId`; folders hold ordered
/// lists of child ids and the top level is an ordered list of root ids.
/// Folder names are unique across the whole tree.
#[derive(Debug, Clone)]
pub struct ConfigTree {
    entries: HashMap<EntryId, Entry>,
    roots: Vec<EntryId>,
    next_id: usize,
}

impl ConfigTree {
    pub fn new() -> Self {
        Self {
            entries: HashMap::new(),
            roots: Vec::new(),
            next_id: 1,
        }
    }

    /// Build a tree from a persisted document, assigning fresh ids in
    /// pre-order.
    pub fn from_document(doc: &ConfigDocument) -> Self {
        let mut tree = Self::new();
        for record in &doc.apps {
            tree.load_record(None, record);
        }
        tree
    }

    /// Rebuild the persisted form, preserving order, nesting and icons.
    pub fn to_document(&self) -> ConfigDocument {
        ConfigDocument {
            apps: self
                .roots
                .iter()
                .filter_map(|id| self.record_for(*id))
                .collect(),
        }
    }

    // =======================================================================
    // Accessors
    // =======================================================================

    pub fn get(&self, id: EntryId) -> Option<&Entry> {
        self.entries.get(&id)
    }

    pub fn contains(&self, id: EntryId) -> bool {
        self.entries.contains_key(&id)
    }

    /// Top-level entries in display order.
    pub fn roots(&self) -> &[EntryId] {
        &self.roots
    }

    /// Children of a folder, or the top level for `None`. Apps and unknown
    /// ids have no children.
    pub fn children(&self, parent: Option<EntryId>) -> &[EntryId] {
        match parent {
            Some(id) => self.entries.get(&id).map(|e| e.children()).unwrap_or(&[]),
            None => &self.roots,
        }
    }

    pub fn parent(&self, id: EntryId) -> Option<EntryId> {
        self.entries.get(&id).and_then(|e| e.parent)
    }

    /// Number of entries at every depth.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Every entry in pre-order, paired with its depth (0 for top level).
    pub fn walk(&self) -> Vec<(EntryId, usize)> {
        let mut out = Vec::with_capacity(self.entries.len());
        self.walk_into(&self.roots, 0, &mut out);
        out
    }

    fn walk_into(&self, ids: &[EntryId], depth: usize, out: &mut Vec<(EntryId, usize)>) {
        for id in ids {
            out.push((*id, depth));
            self.walk_into(self.children(Some(*id)), depth + 1, out);
        }
    }

    // =======================================================================
    // Lookup
    // =======================================================================

    /// First folder named `name` in pre-order: each entry is tested before
    /// its children, and a folder's subtree is searched before its later
    /// siblings.
    pub fn find_folder(&self, name: &str) -> Option<EntryId> {
        self.find_folder_in(None, name)
    }

    /// Like [`Self::find_folder`] but limited to the descendants of `scope`.
    pub fn find_folder_in(&self, scope: Option<EntryId>, name: &str) -> Option<EntryId> {
        self.search_folder(self.children(scope), name)
    }

    fn search_folder(&self, ids: &[EntryId], name: &str) -> Option<EntryId> {
        for id in ids {
            let Some(entry) = self.entries.get(id) else {
                continue;
            };
            if entry.is_folder() && entry.name == name {
                return Some(*id);
            }
            if let Some(found) = self.search_folder(entry.children(), name) {
                return Some(found);
            }
        }
        None
    }

    /// True if any folder other than `except` is called `name`.
    pub fn folder_name_taken(&self, name: &str, except: Option<EntryId>) -> bool {
        self.entries
            .values()
            .any(|e| e.is_folder() && e.name == name && Some(e.id) != except)
    }

    /// Ids of entries that stay visible for a launcher search.
    ///
    /// Matching is a case-insensitive substring test on names. Ancestors of
    /// a match stay visible so the match can be reached, and everything
    /// inside a matching folder stays visible. An empty query keeps all.
    pub fn filter(&self, query: &str) -> HashSet<EntryId> {
        let needle = query.trim().to_lowercase();
        let mut visible = HashSet::new();
        for id in &self.roots {
            self.mark_visible(*id, &needle, false, &mut visible);
        }
        visible
    }

    fn mark_visible(
        &self,
        id: EntryId,
        needle: &str,
        inside_match: bool,
        out: &mut HashSet<EntryId>,
    ) -> bool {
        let Some(entry) = self.entries.get(&id) else {
            return false;
        };
        let matched =
            inside_match || needle.is_empty() || entry.name.to_lowercase().contains(needle);
        let mut child_visible = false;
        for child in entry.children() {
            child_visible |= self.mark_visible(*child, needle, matched, out);
        }
        let visible = matched || child_visible;
        if visible {
            out.insert(id);
        }
        visible
    }

    // =======================================================================
    // Mutation
    // =======================================================================

    /// Append an app to the folder named `target_folder`, or to the top
    /// level when no name is given.
    pub fn insert_app(
        &mut self,
        target_folder: Option<&str>,
        app: NewApp,
    ) -> Result<EntryId, TreeError> {
        check_app(&app.name, &app.command)?;
        let parent = match target_folder {
            Some(name) => Some(
                self.find_folder(name)
                    .ok_or_else(|| TreeError::FolderNotFound(name.to_string()))?,
            ),
            None => None,
        };
        self.add_app(parent, app)
    }

    /// Append an app under `parent` (a folder id) or at the top level.
    pub fn add_app(&mut self, parent: Option<EntryId>, app: NewApp) -> Result<EntryId, TreeError> {
        let (name, command) = check_app(&app.name, &app.command)?;
        self.require_folder(parent)?;

        let id = self.alloc_id();
        self.entries.insert(
            id,
            Entry {
                id,
                name: name.to_string(),
                icon: normalize_icon(app.icon.as_deref()),
                parent,
                kind: EntryKind::App {
                    command: command.to_string(),
                },
            },
        );
        self.attach(id, parent, None);
        debug!(id = id.0, name = %name, "added app");
        Ok(id)
    }

    /// Append a folder under the folder named `parent_folder`, or at the top
    /// level. Fails if a folder with the same name exists anywhere.
    pub fn insert_folder(
        &mut self,
        parent_folder: Option<&str>,
        folder: NewFolder,
    ) -> Result<EntryId, TreeError> {
        self.check_folder_name(&folder.name, None)?;
        let parent = match parent_folder {
            Some(name) => Some(
                self.find_folder(name)
                    .ok_or_else(|| TreeError::FolderNotFound(name.to_string()))?,
            ),
            None => None,
        };
        self.add_folder(parent, folder)
    }

    /// Append a folder under `parent` (a folder id) or at the top level.
    pub fn add_folder(
        &mut self,
        parent: Option<EntryId>,
        folder: NewFolder,
    ) -> Result<EntryId, TreeError> {
        let name = self.check_folder_name(&folder.name, None)?.to_string();
        self.require_folder(parent)?;

        let id = self.alloc_id();
        self.entries.insert(
            id,
            Entry {
                id,
                name: name.clone(),
                icon: normalize_icon(folder.icon.as_deref()),
                parent,
                kind: EntryKind::Folder {
                    children: Vec::new(),
                },
            },
        );
        self.attach(id, parent, None);
        debug!(id = id.0, name = %name, "added folder");
        Ok(id)
    }

    /// Remove an entry together with everything below it. The containing
    /// folder stays, even when it ends up empty.
    pub fn remove(&mut self, id: EntryId) -> Result<Entry, TreeError> {
        if !self.entries.contains_key(&id) {
            return Err(TreeError::UnknownEntry(id));
        }
        self.detach(id);

        let mut removed = None;
        let mut stack = vec![id];
        while let Some(current) = stack.pop() {
            if let Some(entry) = self.entries.remove(&current) {
                stack.extend_from_slice(entry.children());
                if current == id {
                    removed = Some(entry);
                }
            }
        }
        debug!(id = id.0, "removed entry");
        removed.ok_or(TreeError::UnknownEntry(id))
    }

    /// Overwrite name, command (apps only) and icon of an entry.
    pub fn update(&mut self, id: EntryId, update: EntryUpdate) -> Result<(), TreeError> {
        let entry = self.entries.get(&id).ok_or(TreeError::UnknownEntry(id))?;
        let name = if entry.is_folder() {
            // Keeping the current name never clashes, even with a duplicate
            // loaded from disk.
            let kept = update.name.trim();
            if !kept.is_empty() && kept == entry.name {
                kept
            } else {
                self.check_folder_name(&update.name, Some(id))?
            }
        } else {
            check_app(&update.name, &update.command)?.0
        };
        let name = name.to_string();
        let command = update.command.trim().to_string();
        let icon = normalize_icon(Some(&update.icon));

        let entry = self
            .entries
            .get_mut(&id)
            .ok_or(TreeError::UnknownEntry(id))?;
        entry.name = name;
        entry.icon = icon;
        if let EntryKind::App { command: current } = &mut entry.kind {
            *current = command;
        }
        debug!(id = id.0, "updated entry");
        Ok(())
    }

    /// Move an entry under `new_parent` (or to the top level).
    ///
    /// `index` is the position among the destination's children once the
    /// entry has been taken out of its old place; `None` or an index past
    /// the end appends.
    pub fn relocate(
        &mut self,
        id: EntryId,
        new_parent: Option<EntryId>,
        index: Option<usize>,
    ) -> Result<(), TreeError> {
        if !self.entries.contains_key(&id) {
            return Err(TreeError::UnknownEntry(id));
        }
        self.require_folder(new_parent)?;
        if let Some(target) = new_parent {
            if self.is_within(target, id) {
                return Err(TreeError::CyclicMove);
            }
        }
        self.detach(id);
        self.attach(id, new_parent, index);
        debug!(id = id.0, parent = ?new_parent.map(|p| p.0), "relocated entry");
        Ok(())
    }

    // =======================================================================
    // Internals
    // =======================================================================

    fn alloc_id(&mut self) -> EntryId {
        let id = EntryId(self.next_id);
        self.next_id += 1;
        id
    }

    /// Records that would break the naming rules are skipped with a
    /// warning, folders together with their contents.
    fn load_record(&mut self, parent: Option<EntryId>, record: &EntryRecord) {
        let (name, icon, kind) = match record {
            EntryRecord::Folder(f) => {
                let name = f.folder.trim();
                if name.is_empty() {
                    warn!(entries = f.apps.len(), "skipping folder without a name");
                    return;
                }
                (
                    name.to_string(),
                    normalize_icon(f.icon.as_deref()),
                    EntryKind::Folder {
                        children: Vec::new(),
                    },
                )
            }
            EntryRecord::App(a) => {
                let Ok((name, command)) = check_app(&a.name, &a.command) else {
                    warn!(name = %a.name, "skipping app without name or command");
                    return;
                };
                (
                    name.to_string(),
                    normalize_icon(a.icon.as_deref()),
                    EntryKind::App {
                        command: command.to_string(),
                    },
                )
            }
            EntryRecord::Bare(s) => {
                let s = s.trim();
                if s.is_empty() {
                    warn!("skipping empty app entry");
                    return;
                }
                (s.to_string(), None, EntryKind::App { command: s.to_string() })
            }
        };
        let id = self.alloc_id();
        self.entries.insert(
            id,
            Entry {
                id,
                name,
                icon,
                parent,
                kind,
            },
        );
        self.attach(id, parent, None);
        if let EntryRecord::Folder(f) = record {
            for child in &f.apps {
                self.load_record(Some(id), child);
            }
        }
    }

    fn record_for(&self, id: EntryId) -> Option<EntryRecord> {
        let entry = self.entries.get(&id)?;
        Some(match &entry.kind {
            EntryKind::App { command } => EntryRecord::App(AppRecord {
                name: entry.name.clone(),
                command: command.clone(),
                icon: entry.icon.clone(),
            }),
            EntryKind::Folder { children } => EntryRecord::Folder(FolderRecord {
                folder: entry.name.clone(),
                icon: entry.icon.clone(),
                apps: children
                    .iter()
                    .filter_map(|child| self.record_for(*child))
                    .collect(),
            }),
        })
    }

    fn require_folder(&self, parent: Option<EntryId>) -> Result<(), TreeError> {
        match parent {
            None => Ok(()),
            Some(id) => match self.entries.get(&id) {
                None => Err(TreeError::UnknownEntry(id)),
                Some(entry) if entry.is_folder() => Ok(()),
                Some(_) => Err(TreeError::NotAFolder),
            },
        }
    }

    fn check_folder_name<'a>(
        &self,
        name: &'a str,
        except: Option<EntryId>,
    ) -> Result<&'a str, TreeError> {
        let name = name.trim();
        if name.is_empty() {
            return Err(TreeError::MissingFolderName);
        }
        if self.folder_name_taken(name, except) {
            return Err(TreeError::DuplicateFolder(name.to_string()));
        }
        Ok(name)
    }

    /// True when `node` is `ancestor` or lies somewhere below it.
    fn is_within(&self, node: EntryId, ancestor: EntryId) -> bool {
        let mut current = Some(node);
        while let Some(id) = current {
            if id == ancestor {
                return true;
            }
            current = self.parent(id);
        }
        false
    }

    fn siblings_mut(&mut self, parent: Option<EntryId>) -> Option<&mut Vec<EntryId>> {
        match parent {
            Some(id) => match self.entries.get_mut(&id) {
                Some(Entry {
                    kind: EntryKind::Folder { children },
                    ..
                }) => Some(children),
                _ => None,
            },
            None => Some(&mut self.roots),
        }
    }

    fn attach(&mut self, id: EntryId, parent: Option<EntryId>, index: Option<usize>) {
        if let Some(entry) = self.entries.get_mut(&id) {
            entry.parent = parent;
        }
        if let Some(siblings) = self.siblings_mut(parent) {
            let at = index.map_or(siblings.len(), |i| i.min(siblings.len()));
            siblings.insert(at, id);
        }
    }

    fn detach(&mut self, id: EntryId) -> Option<usize> {
        let parent = self.entries.get(&id)?.parent;
        let siblings = self.siblings_mut(parent)?;
        let pos = siblings.iter().position(|child| *child == id)?;
        siblings.remove(pos);
        Some(pos)
    }
}

impl Default for ConfigTree {
    fn default() -> Self {
        Self::new()
    }
}

fn check_app<'a>(name: &'a str, command: &'a str) -> Result<(&'a str, &'a str), TreeError> {
    let (name, command) = (name.trim(), command.trim());
    if name.is_empty() || command.is_empty() {
        return Err(TreeError::MissingAppFields);
    }
    Ok((name, command))
}
