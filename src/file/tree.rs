//! Tree view reconstruction from flat file records.
//!
//! Every file's virtual path (its `original_name`) is split into segments and
//! merged into one rooted tree. Intermediate directories exist only in the
//! view; they need not correspond to folder rows.

use std::cmp::Ordering;
use std::collections::HashMap;

use serde::Serialize;
use tracing::warn;

use super::metadata::FileRecord;
use super::path;

/// Name of the synthetic root node.
pub const ROOT_LABEL: &str = "root";

/// File details carried by a leaf node.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileData {
    /// File ID.
    pub id: i64,
    /// Size in bytes.
    pub size: i64,
    /// Media type.
    pub mime_type: String,
    /// Upload timestamp.
    pub uploaded_at: String,
}

impl From<&FileRecord> for FileData {
    fn from(file: &FileRecord) -> Self {
        Self {
            id: file.id,
            size: file.size,
            mime_type: file.mime_type.clone(),
            uploaded_at: file.uploaded_at.clone(),
        }
    }
}

/// A node of the tree view.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct TreeNode {
    /// Segment name (or [`ROOT_LABEL`] for the root).
    pub name: String,
    /// Whether a file ends at this node.
    pub is_file: bool,
    /// Children, directories first then by name.
    pub children: Vec<TreeNode>,
    /// File details when `is_file` is set.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file_data: Option<FileData>,
}

impl TreeNode {
    /// Find a direct child by name.
    pub fn child(&self, name: &str) -> Option<&TreeNode> {
        self.children.iter().find(|c| c.name == name)
    }

    /// Follow a virtual path down from this node.
    pub fn descend(&self, virtual_path: &str) -> Option<&TreeNode> {
        path::split(virtual_path)
            .into_iter()
            .try_fold(self, |node, segment| node.child(segment))
    }

    /// Number of file nodes in this subtree.
    pub fn file_count(&self) -> usize {
        usize::from(self.is_file) + self.children.iter().map(TreeNode::file_count).sum::<usize>()
    }
}

/// Arena slot used while the tree is assembled.
struct Slot {
    name: String,
    file_data: Option<FileData>,
    children: Vec<usize>,
}

/// Build the tree view for a set of file records.
///
/// Records are merged in ascending ID order, so the result does not depend on
/// the input order. When two records share a full path, the later ID's data
/// wins. Records whose path has no segments are skipped.
pub fn build_tree(files: &[FileRecord]) -> TreeNode {
    let mut ordered: Vec<&FileRecord> = files.iter().collect();
    ordered.sort_by_key(|f| f.id);

    let mut slots = vec![Slot {
        name: ROOT_LABEL.to_string(),
        file_data: None,
        children: Vec::new(),
    }];
    let mut by_prefix: HashMap<String, usize> = HashMap::new();
    by_prefix.insert(String::new(), 0);

    for file in ordered {
        let segments = path::split(&file.original_name);
        if segments.is_empty() {
            warn!(file_id = file.id, "Skipping file with an empty virtual path");
            continue;
        }

        let mut prefix = String::new();
        let mut parent = 0;
        for (i, segment) in segments.iter().enumerate() {
            if !prefix.is_empty() {
                prefix.push(path::SEPARATOR);
            }
            prefix.push_str(segment);
            let is_last = i + 1 == segments.len();

            let slot = match by_prefix.get(&prefix) {
                Some(&existing) => existing,
                None => {
                    let index = slots.len();
                    slots.push(Slot {
                        name: (*segment).to_string(),
                        file_data: None,
                        children: Vec::new(),
                    });
                    slots[parent].children.push(index);
                    by_prefix.insert(prefix.clone(), index);
                    index
                }
            };

            if is_last {
                slots[slot].file_data = Some(FileData::from(file));
            }
            parent = slot;
        }
    }

    freeze(&mut slots, 0)
}

/// Turn the arena into owned nodes, sorting every level.
fn freeze(slots: &mut [Slot], index: usize) -> TreeNode {
    let child_indices = std::mem::take(&mut slots[index].children);
    let mut children: Vec<TreeNode> = child_indices
        .into_iter()
        .map(|child| freeze(slots, child))
        .collect();
    children.sort_by(compare_nodes);

    let slot = &mut slots[index];
    let file_data = slot.file_data.take();
    TreeNode {
        name: std::mem::take(&mut slot.name),
        is_file: file_data.is_some(),
        children,
        file_data,
    }
}

/// Directories before files, then by name.
fn compare_nodes(a: &TreeNode, b: &TreeNode) -> Ordering {
    a.is_file
        .cmp(&b.is_file)
        .then_with(|| compare_names(&a.name, &b.name))
}

/// Locale-style name order: case-insensitive first, exact text as tiebreak.
pub fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| a.cmp(b))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn record(id: i64, name: &str) -> FileRecord {
        FileRecord {
            id,
            folder_id: None,
            original_name: name.to_string(),
            stored_name: format!("blob-{id}"),
            size: id * 10,
            mime_type: "text/plain".to_string(),
            owner_id: None,
            uploaded_at: "2024-05-01 12:00:00".to_string(),
        }
    }

    fn names(node: &TreeNode) -> Vec<&str> {
        node.children.iter().map(|c| c.name.as_str()).collect()
    }

    #[test]
    fn test_empty_input() {
        let tree = build_tree(&[]);
        assert_eq!(tree.name, ROOT_LABEL);
        assert!(!tree.is_file);
        assert!(tree.children.is_empty());
    }

    #[test]
    fn test_nested_paths_share_directories() {
        let tree = build_tree(&[record(1, "a/b/c.txt"), record(2, "a/d.txt")]);

        assert_eq!(names(&tree), vec!["a"]);
        let a = tree.child("a").unwrap();
        assert!(!a.is_file);
        assert_eq!(names(a), vec!["b", "d.txt"]);

        let b = a.child("b").unwrap();
        assert!(!b.is_file);
        assert_eq!(names(b), vec!["c.txt"]);

        let c = b.child("c.txt").unwrap();
        assert!(c.is_file);
        assert_eq!(c.file_data.as_ref().unwrap().id, 1);

        let d = a.child("d.txt").unwrap();
        assert!(d.is_file);
        assert_eq!(d.file_data.as_ref().unwrap().size, 20);
    }

    #[test]
    fn test_file_without_separator_is_root_child() {
        let tree = build_tree(&[record(1, "readme.md")]);
        assert_eq!(names(&tree), vec!["readme.md"]);
        assert!(tree.children[0].is_file);
    }

    #[test]
    fn test_directories_sort_before_files() {
        let tree = build_tree(&[
            record(1, "zeta.txt"),
            record(2, "alpha.txt"),
            record(3, "zz/inner.txt"),
            record(4, "Beta.txt"),
            record(5, "mm/inner.txt"),
        ]);

        assert_eq!(names(&tree), vec!["mm", "zz", "alpha.txt", "Beta.txt", "zeta.txt"]);
    }

    #[test]
    fn test_input_order_does_not_matter() {
        let files = vec![
            record(1, "a/b/c.txt"),
            record(2, "a/d.txt"),
            record(3, "x.bin"),
            record(4, "a/b/e.txt"),
        ];
        let mut reversed = files.clone();
        reversed.reverse();

        assert_eq!(build_tree(&files), build_tree(&reversed));
        assert_eq!(build_tree(&files), build_tree(&files));
    }

    #[test]
    fn test_duplicate_path_highest_id_wins() {
        let tree = build_tree(&[record(7, "dup.txt"), record(3, "dup.txt")]);

        assert_eq!(tree.children.len(), 1);
        assert_eq!(tree.children[0].file_data.as_ref().unwrap().id, 7);
    }

    #[test]
    fn test_file_and_directory_at_same_path() {
        let forward = build_tree(&[record(1, "a"), record(2, "a/b.txt")]);
        let backward = build_tree(&[record(2, "a/b.txt"), record(1, "a")]);
        assert_eq!(forward, backward);

        let a = forward.child("a").unwrap();
        assert!(a.is_file);
        assert_eq!(names(a), vec!["b.txt"]);
    }

    #[test]
    fn test_empty_paths_are_skipped() {
        let tree = build_tree(&[record(1, "///"), record(2, "ok.txt")]);
        assert_eq!(names(&tree), vec!["ok.txt"]);
    }

    #[test]
    fn test_descend_and_file_count() {
        let tree = build_tree(&[record(1, "a/b/c.txt"), record(2, "a/d.txt")]);

        assert_eq!(tree.descend("a/b/c.txt").unwrap().name, "c.txt");
        assert!(tree.descend("a/missing").is_none());
        assert_eq!(tree.file_count(), 2);
    }

    #[test]
    fn test_json_shape() {
        let tree = build_tree(&[record(1, "a/c.txt")]);
        let json = serde_json::to_value(&tree).unwrap();

        assert_eq!(json["name"], "root");
        assert_eq!(json["isFile"], false);
        assert!(json.get("fileData").is_none());

        let dir = &json["children"][0];
        assert_eq!(dir["name"], "a");
        assert!(dir.get("fileData").is_none());

        let file = &dir["children"][0];
        assert_eq!(file["isFile"], true);
        assert_eq!(file["fileData"]["id"], 1);
        assert_eq!(file["fileData"]["mimeType"], "text/plain");
        assert_eq!(file["fileData"]["uploadedAt"], "2024-05-01 12:00:00");
        assert_eq!(file["children"].as_array().unwrap().len(), 0);
    }

    #[test]
    fn test_compare_names() {
        assert_eq!(compare_names("apple", "Banana"), Ordering::Less);
        assert_eq!(compare_names("B", "b"), Ordering::Less);
        assert_eq!(compare_names("same", "same"), Ordering::Equal);
    }
}
