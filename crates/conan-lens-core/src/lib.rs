//! Grouping, filtering and pagination over the flat reference listings of a
//! Conan remote.
//!
//! The crate owns no I/O. A [`PackageRegistry`] supplies references and
//! binary configurations; [`Catalog`] turns them into package, version,
//! binary and filter-option views.

pub mod assemble;
pub mod error;
pub mod filter;
pub mod grouping;
pub mod join;
pub mod memory;
pub mod model;
pub mod paginate;
pub mod pattern;
pub mod reference;
pub mod registry;
pub mod revision;
pub mod service;

pub use assemble::{
    AppliedFilters, FilterDimensions, PackageBinariesResponse, PackageDetail,
    PackageFilterOptionsResponse, PackageVersionsResponse, PackagesListResponse,
};
pub use error::CatalogError;
pub use filter::{BinaryFilter, FilterOptions, ReferenceFilter};
pub use memory::MemoryRegistry;
pub use model::{
    BinaryConfiguration, BinaryRecord, ConfigurationMap, PackageRef, PackageSummary, RecipeEntry,
    Settings, Variant, VersionGroup,
};
pub use paginate::{Page, Pagination};
pub use pattern::{InvalidPattern, ListPattern, RevisionSelector};
pub use reference::{InvalidReference, ReferenceRecord};
pub use registry::{BoxError, PackageRegistry, RegistryError, Remote};
pub use revision::{ResolvedRevisions, RevisionInfo};
pub use service::{
    BinaryConfigurationRequest, Catalog, ListBinariesRequest, ListPackagesRequest, RemoteStatus,
};
