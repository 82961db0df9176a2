//! Request DTOs for the HTTP layer.

use serde::{Deserialize, Deserializer};

/// Query for `GET /folders`.
#[derive(Debug, Default, Deserialize)]
pub struct FolderQuery {
    pub id: Option<i64>,
    pub name: Option<String>,
    /// A folder ID, or `root` for top-level folders.
    pub parent_id: Option<String>,
}

/// Body of `POST /folders`.
#[derive(Debug, Deserialize)]
pub struct CreateFolderRequest {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub parent_id: Option<i64>,
}

/// Body of `PUT /folders`.
#[derive(Debug, Deserialize)]
pub struct UpdateFolderRequest {
    pub id: i64,
    #[serde(default)]
    pub name: Option<String>,
    /// Absent keeps the parent; `null` moves the folder to the root.
    #[serde(default, deserialize_with = "double_option")]
    pub parent_id: Option<Option<i64>>,
}

/// Query for `DELETE /folders`.
#[derive(Debug, Default, Deserialize)]
pub struct DeleteFolderQuery {
    pub id: Option<i64>,
    pub name: Option<String>,
    #[serde(default)]
    pub force: bool,
}

/// Query for `GET /files` and `GET /files/tree`.
#[derive(Debug, Default, Deserialize)]
pub struct FileQuery {
    /// A folder ID, or `root` for root-level files.
    pub folder_id: Option<String>,
    pub owner_id: Option<i64>,
    pub prefix: Option<String>,
}

/// Query for `DELETE /files`.
#[derive(Debug, Default, Deserialize)]
pub struct DeleteFileQuery {
    pub name: Option<String>,
}

/// Distinguish a missing field from an explicit `null`.
fn double_option<'de, D, T>(deserializer: D) -> Result<Option<Option<T>>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<T>::deserialize(deserializer).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_update_parent_absent_null_and_set() {
        let absent: UpdateFolderRequest = serde_json::from_value(json!({"id": 1})).unwrap();
        assert_eq!(absent.parent_id, None);

        let null: UpdateFolderRequest =
            serde_json::from_value(json!({"id": 1, "parent_id": null})).unwrap();
        assert_eq!(null.parent_id, Some(None));

        let set: UpdateFolderRequest =
            serde_json::from_value(json!({"id": 1, "name": "x", "parent_id": 4})).unwrap();
        assert_eq!(set.parent_id, Some(Some(4)));
        assert_eq!(set.name.as_deref(), Some("x"));
    }

    #[test]
    fn test_create_without_name_defaults_empty() {
        let req: CreateFolderRequest = serde_json::from_value(json!({})).unwrap();
        assert!(req.name.is_empty());
        assert!(req.parent_id.is_none());
    }
}
