//! Dataset upload state.
//!
//! One upload job carries one or more datasets. Each dataset goes through
//! analysis, then the user fills in its publishing settings, then it is
//! imported and published.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Analysis progress of an uploaded dataset.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AnalysisStatus {
    /// Waiting for analysis.
    #[default]
    Pending,
    /// Analysis running.
    Analyzing,
    /// Analysis completed.
    Done,
    /// Analysis failed.
    Error,
}

impl AnalysisStatus {
    /// Returns whether the dataset can move on to publication.
    #[must_use]
    pub const fn is_done(self) -> bool {
        matches!(self, Self::Done)
    }
}

/// User-provided publishing settings and their publication outcome.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct PublishSettings {
    /// Whether the user asked for this dataset to be published.
    pub publish: bool,

    /// Layer title.
    pub title: Option<String>,

    /// Layer abstract.
    #[serde(rename = "abstract")]
    pub abstract_text: Option<String>,

    /// Keywords.
    pub keywords: Vec<String>,

    /// Declared coordinate reference system, e.g. `EPSG:4326`.
    pub srs: Option<String>,

    /// Character encoding of the source.
    pub encoding: Option<String>,

    // === Publication outcome ===
    /// Name of the imported table or feature type.
    pub imported_name: Option<String>,

    /// Workspace the layer was published to.
    pub published_workspace: Option<String>,

    /// Data store the layer reads from.
    pub published_datastore: Option<String>,

    /// Published layer name, unique within its workspace.
    pub published_name: Option<String>,

    /// Identifier of the metadata record describing the layer.
    pub metadata_record_id: Option<String>,
}

/// State of one dataset within an upload job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DatasetUploadState {
    /// Dataset identifier.
    pub id: Uuid,

    /// Upload job this dataset belongs to.
    pub job_id: Uuid,

    /// Dataset name as uploaded (file or layer name).
    pub name: String,

    /// Name in the source format, when it differs from `name`.
    pub native_name: Option<String>,

    /// Analysis progress.
    pub status: AnalysisStatus,

    /// Analysis error message.
    pub error: Option<String>,

    /// Number of features found by analysis.
    pub feature_count: Option<u64>,

    /// Publishing settings.
    pub publishing: PublishSettings,

    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
}

impl DatasetUploadState {
    /// Creates a pending dataset.
    #[must_use]
    pub fn new(job_id: Uuid, name: impl Into<String>) -> Self {
        Self {
            id: Uuid::now_v7(),
            job_id,
            name: name.into(),
            native_name: None,
            status: AnalysisStatus::Pending,
            error: None,
            feature_count: None,
            publishing: PublishSettings::default(),
            created_at: Utc::now(),
        }
    }

    /// Returns the name the data is known by in its source.
    #[must_use]
    pub fn source_name(&self) -> &str {
        self.native_name.as_deref().unwrap_or(&self.name)
    }

    /// Returns the title to publish with, defaulting to the dataset name.
    #[must_use]
    pub fn title(&self) -> &str {
        self.publishing.title.as_deref().unwrap_or(&self.name)
    }

    /// Returns whether a layer has been published for this dataset.
    #[must_use]
    pub fn is_published(&self) -> bool {
        self.publishing.published_name.is_some()
    }

    /// Returns `workspace:layer` once published.
    #[must_use]
    pub fn qualified_layer_name(&self) -> Option<String> {
        let name = self.publishing.published_name.as_deref()?;
        Some(match self.publishing.published_workspace.as_deref() {
            Some(ws) => format!("{ws}:{name}"),
            None => name.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn new_dataset_is_pending_and_unpublished() {
        let ds = DatasetUploadState::new(Uuid::new_v4(), "roads.shp");
        assert_eq!(ds.status, AnalysisStatus::Pending);
        assert!(!ds.is_published());
        assert_eq!(ds.title(), "roads.shp");
        assert_eq!(ds.qualified_layer_name(), None);
    }

    #[test]
    fn qualified_name_includes_workspace() {
        let mut ds = DatasetUploadState::new(Uuid::new_v4(), "roads");
        ds.publishing.published_name = Some("roads".into());
        assert_eq!(ds.qualified_layer_name().as_deref(), Some("roads"));

        ds.publishing.published_workspace = Some("psc".into());
        assert_eq!(ds.qualified_layer_name().as_deref(), Some("psc:roads"));
    }

    #[test]
    fn abstract_uses_its_wire_name() {
        let mut settings = PublishSettings::default();
        settings.abstract_text = Some("Road network".into());
        let json = serde_json::to_value(&settings).unwrap();
        assert_eq!(json["abstract"], "Road network");
    }
}
