//! Read-only domain model of the objects the recommender manages
//!
//! These types describe already-computed recommendations; nothing in this
//! crate derives them.

use crate::quantity::Quantity;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

/// How a managed object's recommendation is applied to its pods.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum UpdateMode {
    /// Recommendations are computed but never applied
    Off,
    /// Applied only when pods are created
    Initial,
    /// Applied by evicting and recreating pods
    Recreate,
    /// Applied using the best available mechanism
    Auto,
    /// A mode string this build does not recognise
    Other(String),
}

impl UpdateMode {
    /// Modes that always get a bucket in the object census.
    pub const KNOWN: [UpdateMode; 4] = [
        UpdateMode::Off,
        UpdateMode::Initial,
        UpdateMode::Recreate,
        UpdateMode::Auto,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            UpdateMode::Off => "Off",
            UpdateMode::Initial => "Initial",
            UpdateMode::Recreate => "Recreate",
            UpdateMode::Auto => "Auto",
            UpdateMode::Other(mode) => mode,
        }
    }
}

impl From<String> for UpdateMode {
    fn from(mode: String) -> Self {
        match mode.as_str() {
            "Off" => UpdateMode::Off,
            "Initial" => UpdateMode::Initial,
            "Recreate" => UpdateMode::Recreate,
            "Auto" => UpdateMode::Auto,
            _ => UpdateMode::Other(mode),
        }
    }
}

impl From<UpdateMode> for String {
    fn from(mode: UpdateMode) -> Self {
        match mode {
            UpdateMode::Other(mode) => mode,
            known => known.as_str().to_string(),
        }
    }
}

impl fmt::Display for UpdateMode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Identity of a managed object
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ObjectId {
    pub namespace: String,
    pub name: String,
}

impl ObjectId {
    pub fn new(namespace: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            namespace: namespace.into(),
            name: name.into(),
        }
    }
}

/// Equality-based pod selector.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LabelSelector {
    #[serde(default)]
    pub match_labels: BTreeMap<String, String>,
}

impl LabelSelector {
    pub fn from_labels<K, V>(labels: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        Self {
            match_labels: labels
                .into_iter()
                .map(|(k, v)| (k.into(), v.into()))
                .collect(),
        }
    }
}

/// Renders as `key=value` pairs sorted by key and joined by commas.
impl fmt::Display for LabelSelector {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        for (i, (key, value)) in self.match_labels.iter().enumerate() {
            if i > 0 {
                f.write_str(",")?;
            }
            write!(f, "{}={}", key, value)?;
        }
        Ok(())
    }
}

/// Per-resource amounts of one recommendation band
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResourceList {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cpu: Option<Quantity>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub memory: Option<Quantity>,
}

impl ResourceList {
    pub fn new(cpu: Quantity, memory: Quantity) -> Self {
        Self {
            cpu: Some(cpu),
            memory: Some(memory),
        }
    }

    /// CPU amount in cores, zero when absent
    pub fn cpu(&self) -> Quantity {
        self.cpu.unwrap_or_default()
    }

    /// Memory amount in bytes, zero when absent
    pub fn memory(&self) -> Quantity {
        self.memory.unwrap_or_default()
    }
}

/// Recommended resources for a single container
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerRecommendation {
    pub container_name: String,
    #[serde(default)]
    pub lower_bound: ResourceList,
    #[serde(default)]
    pub target: ResourceList,
    #[serde(default)]
    pub upper_bound: ResourceList,
}

/// An object whose pods receive resource recommendations
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ManagedObject {
    pub id: ObjectId,
    #[serde(default)]
    pub update_mode: Option<UpdateMode>,
    #[serde(default)]
    pub pod_selector: LabelSelector,
    /// `None` until the recommender has produced anything for the object.
    #[serde(default)]
    pub recommendation: Option<Vec<ContainerRecommendation>>,
    pub created: DateTime<Utc>,
}

impl ManagedObject {
    pub fn new(id: ObjectId, created: DateTime<Utc>) -> Self {
        Self {
            id,
            update_mode: None,
            pod_selector: LabelSelector::default(),
            recommendation: None,
            created,
        }
    }

    pub fn has_recommendation(&self) -> bool {
        self.recommendation
            .as_ref()
            .map(|recs| !recs.is_empty())
            .unwrap_or(false)
    }

    pub fn pod_selector_string(&self) -> String {
        self.pod_selector.to_string()
    }

    /// Mode label value; the empty string stands for "no mode set".
    pub fn mode_label(&self) -> &str {
        self.update_mode.as_ref().map(UpdateMode::as_str).unwrap_or("")
    }

    pub fn container_recommendations(&self) -> &[ContainerRecommendation] {
        self.recommendation.as_deref().unwrap_or(&[])
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn object() -> ManagedObject {
        ManagedObject::new(ObjectId::new("default", "web"), Utc::now())
    }

    #[test]
    fn test_update_mode_string_mapping() {
        assert_eq!(UpdateMode::from("Auto".to_string()), UpdateMode::Auto);
        assert_eq!(
            UpdateMode::from("InPlace".to_string()),
            UpdateMode::Other("InPlace".to_string())
        );
        assert_eq!(String::from(UpdateMode::Recreate), "Recreate");
        assert_eq!(UpdateMode::Other("InPlace".into()).as_str(), "InPlace");
    }

    #[test]
    fn test_selector_renders_sorted_pairs() {
        let selector = LabelSelector::from_labels([("tier", "frontend"), ("app", "web")]);
        assert_eq!(selector.to_string(), "app=web,tier=frontend");
        assert_eq!(LabelSelector::default().to_string(), "");
    }

    #[test]
    fn test_has_recommendation_requires_entries() {
        let mut obj = object();
        assert!(!obj.has_recommendation());

        obj.recommendation = Some(vec![]);
        assert!(!obj.has_recommendation());

        obj.recommendation = Some(vec![ContainerRecommendation {
            container_name: "app".into(),
            lower_bound: ResourceList::default(),
            target: ResourceList::default(),
            upper_bound: ResourceList::default(),
        }]);
        assert!(obj.has_recommendation());
    }

    #[test]
    fn test_mode_label_defaults_to_empty() {
        let mut obj = object();
        assert_eq!(obj.mode_label(), "");
        obj.update_mode = Some(UpdateMode::Initial);
        assert_eq!(obj.mode_label(), "Initial");
    }

    #[test]
    fn test_missing_resources_read_as_zero() {
        let list = ResourceList::default();
        assert!(list.cpu().is_zero());
        assert!(list.memory().is_zero());
    }

    #[test]
    fn test_deserialize_snapshot_entry() {
        let json = r#"{
            "id": {"namespace": "prod", "name": "api"},
            "updateMode": "Auto",
            "podSelector": {"matchLabels": {"app": "api"}},
            "recommendation": [{
                "containerName": "server",
                "lowerBound": {"cpu": "100m", "memory": "256Mi"},
                "target": {"cpu": "200m", "memory": "512Mi"},
                "upperBound": {"cpu": "400m", "memory": "1Gi"}
            }],
            "created": "2024-01-01T00:00:00Z"
        }"#;
        let obj: ManagedObject = serde_json::from_str(json).unwrap();
        assert_eq!(obj.update_mode, Some(UpdateMode::Auto));
        assert_eq!(obj.pod_selector_string(), "app=api");
        assert!(obj.has_recommendation());
        let rec = &obj.container_recommendations()[0];
        assert_eq!(rec.target.cpu().milli_value(), 200);
        assert_eq!(rec.upper_bound.memory().value(), 1_073_741_824);
    }

    #[test]
    fn test_deserialize_without_mode_or_recommendation() {
        let json = r#"{
            "id": {"namespace": "prod", "name": "batch"},
            "created": "2024-01-01T00:00:00Z"
        }"#;
        let obj: ManagedObject = serde_json::from_str(json).unwrap();
        assert_eq!(obj.update_mode, None);
        assert_eq!(obj.mode_label(), "");
        assert!(!obj.has_recommendation());
        assert!(obj.container_recommendations().is_empty());
    }
}
