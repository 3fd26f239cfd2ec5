//! Platform-agnostic projection of the config tree.
//!
//! This module converts a `ConfigTree` into a `DisplayNode` tree (the shape
//! a tree widget wants), converts such a display tree back into a
//! `ConfigDocument`, and flattens it into `DisplayRow`s for list-based
//! backends such as the TUI.
//!
//! **No terminal or toolkit dependencies are allowed here.** All types are
//! plain Rust structs.

use std::collections::HashSet;
use std::path::Path;

use crate::core::document::{AppRecord, ConfigDocument, EntryRecord, FolderRecord};
use crate::core::{ConfigTree, EntryId};

// ─── Display tree ─────────────────────────────────────────────────────────────

/// One node of the display tree.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct DisplayNode {
    /// Entry name.
    pub label: String,
    /// App command; empty for folders and the root.
    pub subtitle: String,
    pub icon: Option<String>,
    pub children: Vec<DisplayNode>,
    /// Lookup-only back-reference into the tree that produced this node.
    /// `None` for the root and for nodes created outside the model.
    pub entry: Option<EntryId>,
}

/// Build the display tree for `tree`. The returned root has an empty label
/// and holds the top-level entries in order.
pub fn document_to_display(tree: &ConfigTree) -> DisplayNode {
    DisplayNode {
        children: build_nodes(tree, tree.roots()),
        ..DisplayNode::default()
    }
}

fn build_nodes(tree: &ConfigTree, ids: &[EntryId]) -> Vec<DisplayNode> {
    ids.iter()
        .filter_map(|id| {
            let entry = tree.get(*id)?;
            Some(DisplayNode {
                label: entry.name.clone(),
                subtitle: entry.command().unwrap_or_default().to_string(),
                icon: entry.icon.clone(),
                children: build_nodes(tree, entry.children()),
                entry: Some(*id),
            })
        })
        .collect()
}

/// Rebuild a document from a display tree.
///
/// A node becomes a folder when its back-reference resolves to a folder in
/// `tree` or when it has children; otherwise it becomes an app with the
/// label as name and the subtitle as command. Icons come from the node and
/// fall back to the referenced entry.
pub fn display_to_document(root: &DisplayNode, tree: &ConfigTree) -> ConfigDocument {
    ConfigDocument {
        apps: root
            .children
            .iter()
            .map(|node| node_to_record(node, tree))
            .collect(),
    }
}

fn node_to_record(node: &DisplayNode, tree: &ConfigTree) -> EntryRecord {
    let source = node.entry.and_then(|id| tree.get(id));
    let icon = node
        .icon
        .clone()
        .or_else(|| source.and_then(|e| e.icon.clone()));

    if is_folder_node(node, tree) {
        EntryRecord::Folder(FolderRecord {
            folder: node.label.clone(),
            icon,
            apps: node
                .children
                .iter()
                .map(|child| node_to_record(child, tree))
                .collect(),
        })
    } else {
        EntryRecord::App(AppRecord {
            name: node.label.clone(),
            command: node.subtitle.clone(),
            icon,
        })
    }
}

fn is_folder_node(node: &DisplayNode, tree: &ConfigTree) -> bool {
    let referenced = node.entry.and_then(|id| tree.get(id));
    referenced.is_some_and(|e| e.is_folder()) || !node.children.is_empty()
}

// ─── Flattened rows ───────────────────────────────────────────────────────────

/// A single visible row of the launcher or editor list.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DisplayRow {
    pub depth: usize,
    pub label: String,
    pub subtitle: String,
    pub entry: Option<EntryId>,
    pub is_folder: bool,
    pub is_expanded: bool,
    /// True only when the icon path exists on disk.
    pub has_icon: bool,
}

/// Flatten `root` into rows in pre-order.
///
/// Folders in `collapsed` hide their children. When `visible` is given
/// (an active search), only those entries are emitted and every folder is
/// shown expanded so matches are never hidden.
pub fn build_rows(
    root: &DisplayNode,
    tree: &ConfigTree,
    collapsed: &HashSet<EntryId>,
    visible: Option<&HashSet<EntryId>>,
) -> Vec<DisplayRow> {
    let mut rows = Vec::new();
    collect_rows(&root.children, 0, tree, collapsed, visible, &mut rows);
    rows
}

fn collect_rows(
    nodes: &[DisplayNode],
    depth: usize,
    tree: &ConfigTree,
    collapsed: &HashSet<EntryId>,
    visible: Option<&HashSet<EntryId>>,
    out: &mut Vec<DisplayRow>,
) {
    for node in nodes {
        if let (Some(filter), Some(id)) = (visible, node.entry) {
            if !filter.contains(&id) {
                continue;
            }
        }
        let is_folder = is_folder_node(node, tree);
        let is_expanded = is_folder
            && (visible.is_some() || node.entry.map_or(true, |id| !collapsed.contains(&id)));
        out.push(DisplayRow {
            depth,
            label: node.label.clone(),
            subtitle: node.subtitle.clone(),
            entry: node.entry,
            is_folder,
            is_expanded,
            has_icon: node.icon.as_deref().is_some_and(|p| Path::new(p).exists()),
        });
        if is_expanded {
            collect_rows(&node.children, depth + 1, tree, collapsed, visible, out);
        }
    }
}

// ─── Color ───────────────────────────────────────────────────────────────────

/// A 24-bit RGB color.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Color {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Color {
    pub const fn from_rgb(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// Parse a `#rrggbb` hex string. Panics on invalid input (all callers use
    /// compile-time constants so this is acceptable).
    pub fn from_hex(s: &str) -> Self {
        let s = s.trim_start_matches('#');
        assert!(s.len() == 6, "Color::from_hex expects #rrggbb");
        let r = u8::from_str_radix(&s[0..2], 16).expect("invalid hex");
        let g = u8::from_str_radix(&s[2..4], 16).expect("invalid hex");
        let b = u8::from_str_radix(&s[4..6], 16).expect("invalid hex");
        Self { r, g, b }
    }
}

// ─── Theme ────────────────────────────────────────────────────────────────────

/// All colours used by the launcher and editor panes.
pub struct Theme {
    pub background: Color,
    pub foreground: Color,
    pub border: Color,

    // Entry rows
    pub folder_fg: Color,
    pub app_fg: Color,
    pub subtitle_fg: Color,
    pub selection_bg: Color,
    pub selection_fg: Color,
    /// Row marked for a move in the editor.
    pub marked_fg: Color,

    // Search / prompt line
    pub prompt_fg: Color,

    // Status line
    pub status_bg: Color,
    pub status_fg: Color,
    pub error_fg: Color,
}

impl Theme {
    /// Dark scheme close to the original popup's translucent grey.
    pub fn onedark() -> Self {
        Self {
            background: Color::from_hex("#1e1e1e"),
            foreground: Color::from_hex("#e5e5e5"),
            border: Color::from_hex("#4b4b4b"),
            folder_fg: Color::from_hex("#e5c07b"),
            app_fg: Color::from_hex("#e5e5e5"),
            subtitle_fg: Color::from_hex("#7f848e"),
            selection_bg: Color::from_hex("#3256a8"),
            selection_fg: Color::from_hex("#ffffff"),
            marked_fg: Color::from_hex("#c678dd"),
            prompt_fg: Color::from_hex("#61afef"),
            status_bg: Color::from_hex("#2a2a2a"),
            status_fg: Color::from_hex("#aaaaaa"),
            error_fg: Color::from_hex("#e06c75"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::{NewApp, NewFolder};
    use proptest::prelude::*;

    fn default_tree() -> ConfigTree {
        ConfigTree::from_document(&ConfigDocument::builtin_default())
    }

    fn outline(rows: &[DisplayRow]) -> String {
        rows.iter()
            .map(|row| {
                let marker = match (row.is_folder, row.is_expanded) {
                    (true, true) => "v",
                    (true, false) => ">",
                    (false, _) => "-",
                };
                let indent = "  ".repeat(row.depth);
                if row.subtitle.is_empty() {
                    format!("{indent}{marker} {}", row.label)
                } else {
                    format!("{indent}{marker} {} ({})", row.label, row.subtitle)
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }

    #[test]
    fn test_document_to_display_shape() {
        let tree = default_tree();
        let root = document_to_display(&tree);
        assert_eq!(root.label, "");
        assert_eq!(root.entry, None);
        assert_eq!(root.children.len(), 3);

        let notepad = &root.children[0];
        assert_eq!(notepad.label, "Notepad");
        assert_eq!(notepad.subtitle, "notepad.exe");
        assert_eq!(notepad.entry, Some(tree.roots()[0]));

        let utilities = &root.children[2];
        assert_eq!(utilities.subtitle, "");
        assert_eq!(utilities.children.len(), 1);
        assert_eq!(utilities.children[0].label, "Command Prompt");
    }

    #[test]
    fn test_display_round_trip_default() {
        let tree = default_tree();
        let root = document_to_display(&tree);
        assert_eq!(
            display_to_document(&root, &tree),
            ConfigDocument::builtin_default()
        );
    }

    #[test]
    fn test_empty_folder_stays_folder() {
        let mut tree = ConfigTree::new();
        tree.add_folder(None, NewFolder::new("Empty")).unwrap();
        let root = document_to_display(&tree);
        assert_eq!(
            display_to_document(&root, &tree).apps,
            vec![EntryRecord::folder("Empty", vec![])]
        );
    }

    #[test]
    fn test_unreferenced_nodes_use_children_to_decide() {
        let tree = ConfigTree::new();
        let root = DisplayNode {
            children: vec![
                DisplayNode {
                    label: "Group".to_string(),
                    children: vec![DisplayNode {
                        label: "Calc".to_string(),
                        subtitle: "calc.exe".to_string(),
                        ..DisplayNode::default()
                    }],
                    ..DisplayNode::default()
                },
                DisplayNode {
                    label: "Shell".to_string(),
                    subtitle: "sh".to_string(),
                    ..DisplayNode::default()
                },
            ],
            ..DisplayNode::default()
        };
        assert_eq!(
            display_to_document(&root, &tree).apps,
            vec![
                EntryRecord::folder("Group", vec![EntryRecord::app("Calc", "calc.exe")]),
                EntryRecord::app("Shell", "sh"),
            ]
        );
    }

    #[test]
    fn test_icon_falls_back_to_back_reference() {
        let mut tree = ConfigTree::new();
        let id = tree
            .add_app(None, NewApp::new("Calc", "calc.exe").with_icon("calc.png"))
            .unwrap();
        let mut root = document_to_display(&tree);
        root.children[0].icon = None;
        match &display_to_document(&root, &tree).apps[0] {
            EntryRecord::App(app) => assert_eq!(app.icon.as_deref(), Some("calc.png")),
            other => panic!("expected app, got {:?}", other),
        }
        assert_eq!(root.children[0].entry, Some(id));
    }

    #[test]
    fn test_rows_outline_snapshot() {
        let mut tree = default_tree();
        tree.insert_folder(Some("Utilities"), NewFolder::new("Disk"))
            .unwrap();
        tree.insert_app(Some("Disk"), NewApp::new("Defrag", "dfrgui.exe"))
            .unwrap();
        let root = document_to_display(&tree);
        let rows = build_rows(&root, &tree, &HashSet::new(), None);
        insta::assert_snapshot!(outline(&rows), @r"
        - Notepad (notepad.exe)
        - Calculator (calc.exe)
        v Utilities
          - Command Prompt (cmd.exe)
          v Disk
            - Defrag (dfrgui.exe)
        ");
    }

    #[test]
    fn test_rows_respect_collapsed() {
        let tree = default_tree();
        let root = document_to_display(&tree);
        let utilities = tree.find_folder("Utilities").unwrap();
        let collapsed: HashSet<EntryId> = [utilities].into_iter().collect();
        let rows = build_rows(&root, &tree, &collapsed, None);
        assert_eq!(rows.len(), 3);
        assert!(rows[2].is_folder);
        assert!(!rows[2].is_expanded);
    }

    #[test]
    fn test_rows_with_filter_expand_matches() {
        let tree = default_tree();
        let root = document_to_display(&tree);
        let utilities = tree.find_folder("Utilities").unwrap();
        let collapsed: HashSet<EntryId> = [utilities].into_iter().collect();
        let visible = tree.filter("cmd");
        // "cmd" matches no name; the command line is not searched.
        assert!(build_rows(&root, &tree, &collapsed, Some(&visible)).is_empty());

        let visible = tree.filter("command");
        let rows = build_rows(&root, &tree, &collapsed, Some(&visible));
        assert_eq!(outline(&rows), "v Utilities\n  - Command Prompt (cmd.exe)");
    }

    #[test]
    fn test_has_icon_requires_existing_file() {
        let dir = tempfile::tempdir().unwrap();
        let icon = dir.path().join("icon.png");
        std::fs::write(&icon, b"png").unwrap();

        let mut tree = ConfigTree::new();
        tree.add_app(
            None,
            NewApp::new("Real", "a").with_icon(icon.display().to_string()),
        )
        .unwrap();
        tree.add_app(None, NewApp::new("Ghost", "b").with_icon("/no/such/icon.png"))
            .unwrap();
        let root = document_to_display(&tree);
        let rows = build_rows(&root, &tree, &HashSet::new(), None);
        assert!(rows[0].has_icon);
        assert!(!rows[1].has_icon);
    }

    #[test]
    fn test_color_from_hex() {
        assert_eq!(Color::from_hex("#3256a8"), Color::from_rgb(0x32, 0x56, 0xa8));
    }

    fn arb_entry() -> impl Strategy<Value = EntryRecord> {
        let app = (
            "[A-Za-z]([A-Za-z0-9 ]{0,7}[A-Za-z0-9])?",
            "[a-z]{1,8}(\\.exe)?",
            proptest::option::of("[a-z]{1,6}\\.png"),
        )
            .prop_map(|(name, command, icon)| EntryRecord::App(AppRecord { name, command, icon }));
        app.prop_recursive(3, 24, 4, |inner| {
            (
                "[A-Za-z]{1,8}",
                proptest::option::of("[a-z]{1,6}\\.ico"),
                proptest::collection::vec(inner, 0..4),
            )
                .prop_map(|(folder, icon, apps)| {
                    EntryRecord::Folder(FolderRecord { folder, icon, apps })
                })
        })
    }

    fn arb_document() -> impl Strategy<Value = ConfigDocument> {
        proptest::collection::vec(arb_entry(), 0..6).prop_map(|apps| ConfigDocument { apps })
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(128))]

        #[test]
        fn prop_tree_preserves_document(doc in arb_document()) {
            let tree = ConfigTree::from_document(&doc);
            prop_assert_eq!(tree.to_document(), doc);
        }

        #[test]
        fn prop_display_round_trip(doc in arb_document()) {
            let tree = ConfigTree::from_document(&doc);
            let root = document_to_display(&tree);
            prop_assert_eq!(display_to_document(&root, &tree), doc);
        }

        #[test]
        fn prop_expanded_rows_cover_every_entry(doc in arb_document()) {
            let tree = ConfigTree::from_document(&doc);
            let root = document_to_display(&tree);
            let rows = build_rows(&root, &tree, &HashSet::new(), None);
            let walked: Vec<Option<EntryId>> =
                tree.walk().into_iter().map(|(id, _)| Some(id)).collect();
            let listed: Vec<Option<EntryId>> = rows.iter().map(|r| r.entry).collect();
            prop_assert_eq!(listed, walked);
        }
    }
}
