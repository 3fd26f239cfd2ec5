use serde::{Deserialize, Serialize};

/// The persisted configuration, as read from and written to `config.json`.
///
/// The top-level field is called `apps` for historical reasons; it holds the
/// mixed sequence of apps and folders shown at the root of the launcher.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConfigDocument {
    #[serde(default)]
    pub apps: Vec<EntryRecord>,
}

/// One serialized entry.
///
/// Variant order matters for the untagged representation: an object with a
/// `folder` key is a folder, an object with `name` + `command` is an app, and
/// a bare string is accepted as an app whose name doubles as its command.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EntryRecord {
    Folder(FolderRecord),
    App(AppRecord),
    Bare(String),
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FolderRecord {
    pub folder: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default)]
    pub apps: Vec<EntryRecord>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AppRecord {
    pub name: String,
    pub command: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
}

impl EntryRecord {
    pub fn app(name: impl Into<String>, command: impl Into<String>) -> Self {
        EntryRecord::App(AppRecord {
            name: name.into(),
            command: command.into(),
            icon: None,
        })
    }

    pub fn folder(name: impl Into<String>, apps: Vec<EntryRecord>) -> Self {
        EntryRecord::Folder(FolderRecord {
            folder: name.into(),
            icon: None,
            apps,
        })
    }

    /// Display name: app name, folder name, or the bare string.
    pub fn name(&self) -> &str {
        match self {
            EntryRecord::Folder(f) => &f.folder,
            EntryRecord::App(a) => &a.name,
            EntryRecord::Bare(s) => s,
        }
    }
}

impl ConfigDocument {
    /// Built-in document used when no usable config file exists.
    pub fn builtin_default() -> Self {
        Self {
            apps: vec![
                EntryRecord::app("Notepad", "notepad.exe"),
                EntryRecord::app("Calculator", "calc.exe"),
                EntryRecord::folder(
                    "Utilities",
                    vec![EntryRecord::app("Command Prompt", "cmd.exe")],
                ),
            ],
        }
    }
}
