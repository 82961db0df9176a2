//! Folder hierarchy and file records.
//!
//! - Folders form a forest with sibling-unique names
//! - Files carry a slash-delimited virtual path used for the tree view
//! - Blob contents live in a sharded directory store

mod cascade;
mod folder;
pub mod guard;
mod metadata;
pub mod naming;
pub mod path;
mod service;
mod storage;
mod tree;

pub use cascade::{cascade_delete, subtree_ids, DeleteSummary};
pub use folder::{Folder, FolderKey, FolderRepository, FolderScope, FolderUpdate, NewFolder};
pub use guard::{ensure_acyclic, CIRCULAR_REFERENCE};
pub use metadata::{FileFilter, FileKey, FileRecord, FileRepository, FolderFilter, NewFile};
pub use service::{HierarchyService, DEFAULT_MIME_TYPE};
pub use storage::FileStorage;
pub use tree::{build_tree, FileData, TreeNode, ROOT_LABEL};
