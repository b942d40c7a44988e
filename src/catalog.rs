//! Catalog of subscribable report-access groups.

use crate::error::{Result, SubscriptionError};
use crate::types::Group;
use parking_lot::RwLock;
use std::fs::File;
use std::io::BufReader;
use std::path::Path;

/// Ordered, administered list of groups a subscriber can request.
///
/// Group creation and removal happen out of band; within the core the
/// catalog is read-only apart from wholesale replacement by the admin path.
/// Order is preserved and drives the dashboard projection order.
pub struct GroupCatalog {
    groups: RwLock<Vec<Group>>,
}

impl GroupCatalog {
    /// Build a catalog from an in-memory group list.
    ///
    /// Later duplicates of a group name are dropped; first occurrence wins.
    pub fn new(groups: Vec<Group>) -> Self {
        let mut seen = std::collections::HashSet::new();
        let groups = groups
            .into_iter()
            .filter(|g| seen.insert(g.name.clone()))
            .collect();
        Self {
            groups: RwLock::new(groups),
        }
    }

    /// Load a catalog from a JSON array of groups.
    pub fn from_json_file(path: impl AsRef<Path>) -> Result<Self> {
        let file = File::open(path.as_ref())?;
        let groups: Vec<Group> = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| SubscriptionError::Deserialization(e.to_string()))?;
        Ok(Self::new(groups))
    }

    /// All groups in catalog order.
    pub fn list(&self) -> Vec<Group> {
        self.groups.read().clone()
    }

    /// Look up a group by name.
    pub fn get(&self, name: &str) -> Option<Group> {
        self.groups.read().iter().find(|g| g.name == name).cloned()
    }

    /// Whether a group exists.
    pub fn contains(&self, name: &str) -> bool {
        self.groups.read().iter().any(|g| g.name == name)
    }

    /// Replace the whole catalog (admin path).
    pub fn replace(&self, groups: Vec<Group>) {
        *self.groups.write() = Self::new(groups).groups.into_inner();
    }

    pub fn len(&self) -> usize {
        self.groups.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.groups.read().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn sample() -> GroupCatalog {
        GroupCatalog::new(vec![
            Group::new("Finance_Reports", "Monthly finance reports"),
            Group::new("Ops_Reports", "Operational reports"),
        ])
    }

    #[test]
    fn test_list_preserves_order() {
        let catalog = sample();
        let names: Vec<_> = catalog.list().into_iter().map(|g| g.name).collect();
        assert_eq!(names, vec!["Finance_Reports", "Ops_Reports"]);
    }

    #[test]
    fn test_get_and_contains() {
        let catalog = sample();
        assert!(catalog.contains("Ops_Reports"));
        assert!(!catalog.contains("Compliance_Data"));
        let group = catalog.get("Finance_Reports").unwrap();
        assert_eq!(group.description, "Monthly finance reports");
    }

    #[test]
    fn test_duplicate_names_first_wins() {
        let catalog = GroupCatalog::new(vec![
            Group::new("Finance_Reports", "first"),
            Group::new("Finance_Reports", "second"),
        ]);
        assert_eq!(catalog.len(), 1);
        assert_eq!(catalog.get("Finance_Reports").unwrap().description, "first");
    }

    #[test]
    fn test_replace() {
        let catalog = sample();
        catalog.replace(vec![Group::new("Compliance_Data", "Audit data")]);
        assert_eq!(catalog.len(), 1);
        assert!(catalog.contains("Compliance_Data"));
        assert!(!catalog.contains("Finance_Reports"));
    }

    #[test]
    fn test_from_json_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(
            file,
            r#"[{{"name":"Finance_Reports","description":"Monthly finance reports"}}]"#
        )
        .unwrap();

        let catalog = GroupCatalog::from_json_file(file.path()).unwrap();
        assert_eq!(catalog.len(), 1);
        assert!(catalog.contains("Finance_Reports"));
    }

    #[test]
    fn test_from_json_file_bad_content() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        write!(file, "not json").unwrap();

        let result = GroupCatalog::from_json_file(file.path());
        assert!(matches!(
            result,
            Err(crate::error::SubscriptionError::Deserialization(_))
        ));
    }
}
