/// Unique identifier for an entry within one `ConfigTree`.
///
/// Ids are handed out in creation order and never reused by the tree that
/// issued them. They do not survive a reload: rebuilding a tree from a
/// document assigns fresh ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(pub usize);

/// What an entry is, plus the data only that variant carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum EntryKind {
    App {
        command: String,
    },
    /// Child ids in display order.
    Folder {
        children: Vec<EntryId>,
    },
}

/// A node of the configuration tree (an app or a folder).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub id: EntryId,
    pub name: String,
    /// Opaque icon path supplied by the icon picker.
    pub icon: Option<String>,
    /// Containing folder, `None` for top-level entries.
    pub parent: Option<EntryId>,
    pub kind: EntryKind,
}

impl Entry {
    pub fn is_folder(&self) -> bool {
        matches!(self.kind, EntryKind::Folder { .. })
    }

    /// The launch command, or `None` for folders.
    pub fn command(&self) -> Option<&str> {
        match &self.kind {
            EntryKind::App { command } => Some(command),
            EntryKind::Folder { .. } => None,
        }
    }

    /// Child ids; empty for apps.
    pub fn children(&self) -> &[EntryId] {
        match &self.kind {
            EntryKind::Folder { children } => children,
            EntryKind::App { .. } => &[],
        }
    }
}

/// Fields for a new app, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewApp {
    pub name: String,
    pub command: String,
    pub icon: Option<String>,
}

impl NewApp {
    pub fn new(name: impl Into<String>, command: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            command: command.into(),
            icon: None,
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }
}

/// Fields for a new folder, before validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct NewFolder {
    pub name: String,
    pub icon: Option<String>,
}

impl NewFolder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            icon: None,
        }
    }

    pub fn with_icon(mut self, icon: impl Into<String>) -> Self {
        self.icon = Some(icon.into());
        self
    }
}

/// In-place edit of an existing entry. `command` is ignored for folders.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct EntryUpdate {
    pub name: String,
    pub command: String,
    /// Blank clears the icon.
    pub icon: String,
}

/// Trim an optional icon path; blank becomes `None`.
pub(crate) fn normalize_icon(icon: Option<&str>) -> Option<String> {
    icon.map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_entry_accessors() {
        let app = Entry {
            id: EntryId(1),
            name: "Calc".to_string(),
            icon: None,
            parent: None,
            kind: EntryKind::App {
                command: "calc.exe".to_string(),
            },
        };
        assert!(!app.is_folder());
        assert_eq!(app.command(), Some("calc.exe"));
        assert!(app.children().is_empty());

        let folder = Entry {
            id: EntryId(2),
            name: "Dev".to_string(),
            icon: None,
            parent: None,
            kind: EntryKind::Folder {
                children: vec![EntryId(1)],
            },
        };
        assert!(folder.is_folder());
        assert_eq!(folder.command(), None);
        assert_eq!(folder.children(), &[EntryId(1)]);
    }

    #[test]
    fn test_normalize_icon() {
        assert_eq!(normalize_icon(None), None);
        assert_eq!(normalize_icon(Some("   ")), None);
        assert_eq!(
            normalize_icon(Some(" /icons/a.png ")),
            Some("/icons/a.png".to_string())
        );
    }
}
