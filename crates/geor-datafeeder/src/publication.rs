//! OWS publication service.
//!
//! The OWS server and the metadata catalog are external collaborators; this
//! module defines the contract the datafeeder needs from them and a
//! process-local implementation of it.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::{DateTime, Utc};
use parking_lot::RwLock;
use serde::{Deserialize, Serialize};

use crate::error::{PublicationError, PublicationResult};
use crate::model::DatasetUploadState;

// ============================================================================
// OWS Publication Service
// ============================================================================

/// Publishes uploaded datasets as OWS layers.
#[allow(async_fn_in_trait)]
pub trait OwsPublicationService: Send + Sync {
    /// Publishes a dataset.
    ///
    /// On success the dataset's publishing settings record the workspace,
    /// data store and layer name it was published under.
    ///
    /// ## Errors
    ///
    /// Returns `PublicationError::Conflict` if the dataset is already
    /// published and `PublicationError::InvalidDataset` if it is not analyzed
    /// or the user did not select it for publication.
    async fn publish(&self, dataset: &mut DatasetUploadState) -> PublicationResult<()>;

    /// Links the published layer of a dataset to its metadata record.
    ///
    /// ## Errors
    ///
    /// Returns `PublicationError::NotPublished` or
    /// `PublicationError::MissingMetadata` when the dataset lacks the
    /// corresponding step.
    async fn add_metadata_link(&self, dataset: &DatasetUploadState) -> PublicationResult<()>;
}

/// A layer published by the in-memory service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PublishedLayer {
    /// Workspace.
    pub workspace: String,
    /// Data store.
    pub datastore: String,
    /// Layer name.
    pub name: String,
    /// Name of the source feature type.
    pub native_name: String,
    /// Layer title.
    pub title: String,
    /// Declared SRS.
    pub srs: Option<String>,
    /// Publication timestamp.
    pub published_at: DateTime<Utc>,
}

/// A metadata link attached to a layer.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MetadataLink {
    /// Metadata record identifier.
    pub record_id: String,
    /// Link target.
    pub url: String,
    /// MIME type of the target.
    pub content_type: String,
}

// ============================================================================
// In-Memory Publication Service
// ============================================================================

/// Publication service keeping layers in memory.
///
/// Useful for tests and local runs without an OWS server.
#[derive(Debug)]
pub struct InMemoryPublicationService {
    default_workspace: String,
    default_datastore: String,
    catalog_url: String,
    layers: RwLock<HashMap<(String, String), (PublishedLayer, Vec<MetadataLink>)>>,
    available: AtomicBool,
}

impl InMemoryPublicationService {
    /// Creates a service publishing to the given workspace and data store.
    ///
    /// Metadata links point to `<catalog_url>/<record id>`.
    #[must_use]
    pub fn new(
        workspace: impl Into<String>,
        datastore: impl Into<String>,
        catalog_url: impl Into<String>,
    ) -> Self {
        Self {
            default_workspace: workspace.into(),
            default_datastore: datastore.into(),
            catalog_url: catalog_url.into().trim_end_matches('/').to_string(),
            layers: RwLock::new(HashMap::new()),
            available: AtomicBool::new(true),
        }
    }

    /// Switches the service on or off.
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Returns a published layer.
    #[must_use]
    pub fn layer(&self, workspace: &str, name: &str) -> Option<PublishedLayer> {
        self.layers
            .read()
            .get(&(workspace.to_string(), name.to_string()))
            .map(|(layer, _)| layer.clone())
    }

    /// Returns the metadata links of a layer.
    #[must_use]
    pub fn metadata_links(&self, workspace: &str, name: &str) -> Vec<MetadataLink> {
        self.layers
            .read()
            .get(&(workspace.to_string(), name.to_string()))
            .map(|(_, links)| links.clone())
            .unwrap_or_default()
    }

    /// Returns the number of published layers.
    #[must_use]
    pub fn layer_count(&self) -> usize {
        self.layers.read().len()
    }

    fn check_available(&self) -> PublicationResult<()> {
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(PublicationError::unavailable("in-memory publication service is offline"))
        }
    }
}

impl Default for InMemoryPublicationService {
    fn default() -> Self {
        Self::new("geor", "datafeeder", "/geonetwork/srv/api/records")
    }
}

/// Turns a dataset name into a layer name: lower case ASCII letters, digits
/// and underscores, not starting with a digit.
#[must_use]
pub fn layer_name(name: &str) -> String {
    let stem = name.rsplit_once('.').map_or(name, |(stem, _)| stem);
    let mut out: String = stem
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() { c.to_ascii_lowercase() } else { '_' })
        .collect();
    if out.is_empty() || out.starts_with(|c: char| c.is_ascii_digit()) {
        out.insert(0, '_');
    }
    out
}

fn unique_name(
    taken: &HashMap<(String, String), (PublishedLayer, Vec<MetadataLink>)>,
    workspace: &str,
    base: &str,
) -> String {
    let is_free = |name: &str| !taken.contains_key(&(workspace.to_string(), name.to_string()));
    if is_free(base) {
        return base.to_string();
    }
    (1..)
        .map(|i| format!("{base}_{i}"))
        .find(|candidate| is_free(candidate))
        .unwrap_or_else(|| base.to_string())
}

impl OwsPublicationService for InMemoryPublicationService {
    async fn publish(&self, dataset: &mut DatasetUploadState) -> PublicationResult<()> {
        self.check_available()?;

        if dataset.is_published() {
            return Err(PublicationError::conflict(format!(
                "dataset {} already published as {}",
                dataset.id,
                dataset.qualified_layer_name().unwrap_or_default()
            )));
        }
        if !dataset.status.is_done() {
            return Err(PublicationError::invalid(format!(
                "dataset {} has not been analyzed",
                dataset.id
            )));
        }
        if !dataset.publishing.publish {
            return Err(PublicationError::invalid(format!(
                "dataset {} is not selected for publication",
                dataset.id
            )));
        }

        let native_name = dataset
            .publishing
            .imported_name
            .clone()
            .unwrap_or_else(|| dataset.source_name().to_string());
        let workspace = dataset
            .publishing
            .published_workspace
            .clone()
            .unwrap_or_else(|| self.default_workspace.clone());
        let datastore = dataset
            .publishing
            .published_datastore
            .clone()
            .unwrap_or_else(|| self.default_datastore.clone());

        let mut layers = self.layers.write();
        let name = unique_name(&layers, &workspace, &layer_name(&native_name));
        let layer = PublishedLayer {
            workspace: workspace.clone(),
            datastore: datastore.clone(),
            name: name.clone(),
            native_name,
            title: dataset.title().to_string(),
            srs: dataset.publishing.srs.clone(),
            published_at: Utc::now(),
        };
        layers.insert((workspace.clone(), name.clone()), (layer, Vec::new()));
        drop(layers);

        tracing::info!(dataset = %dataset.id, workspace = %workspace, layer = %name, "dataset published");
        dataset.publishing.published_workspace = Some(workspace);
        dataset.publishing.published_datastore = Some(datastore);
        dataset.publishing.published_name = Some(name);
        Ok(())
    }

    async fn add_metadata_link(&self, dataset: &DatasetUploadState) -> PublicationResult<()> {
        self.check_available()?;

        let name = dataset
            .publishing
            .published_name
            .clone()
            .ok_or_else(|| PublicationError::not_published(dataset.id.to_string()))?;
        let workspace = dataset
            .publishing
            .published_workspace
            .clone()
            .unwrap_or_else(|| self.default_workspace.clone());
        let record_id = dataset
            .publishing
            .metadata_record_id
            .as_deref()
            .ok_or_else(|| PublicationError::missing_metadata(dataset.id.to_string()))?;

        let mut layers = self.layers.write();
        let (_, links) = layers
            .get_mut(&(workspace.clone(), name.clone()))
            .ok_or_else(|| PublicationError::not_published(format!("{workspace}:{name}")))?;

        if links.iter().any(|l| l.record_id == record_id) {
            return Err(PublicationError::conflict(format!(
                "{workspace}:{name} already links to record {record_id}"
            )));
        }
        links.push(MetadataLink {
            record_id: record_id.to_string(),
            url: format!("{}/{record_id}", self.catalog_url),
            content_type: "text/xml".to_string(),
        });

        tracing::info!(dataset = %dataset.id, layer = %name, record = %record_id, "metadata link added");
        Ok(())
    }
}
