//! # geor-datafeeder
//!
//! Publication side of the geOrchestra datafeeder.
//!
//! Uploaded datasets are tracked as [`DatasetUploadState`] values. Once a
//! dataset has been analyzed and imported, an [`OwsPublicationService`]
//! exposes it as an OWS layer and links it to its metadata record.

#![forbid(unsafe_code)]
#![deny(missing_docs)]

pub mod error;
pub mod model;
pub mod publication;

pub use error::{PublicationError, PublicationResult};
pub use model::{AnalysisStatus, DatasetUploadState, PublishSettings};
pub use publication::{InMemoryPublicationService, MetadataLink, OwsPublicationService, PublishedLayer};
