//! Query parameters of the `/packages` routes.

use conan_lens_core::{
    BinaryConfigurationRequest, BinaryFilter, CatalogError, ListBinariesRequest,
    ListPackagesRequest, Pagination, ReferenceFilter,
};
use serde::Deserialize;
use utoipa::{IntoParams, ToSchema};
use validator::Validate;

fn default_page() -> usize {
    1
}

fn default_per_page() -> usize {
    conan_lens_core::paginate::DEFAULT_PER_PAGE
}

/// Query parameters for `GET /packages`.
#[derive(Debug, Deserialize, IntoParams, ToSchema, Validate)]
#[into_params(parameter_in = Query)]
pub struct ListPackagesQuery {
    /// Remote to browse, e.g. `"conancenter"`.
    #[serde(default)]
    pub remote_name: String,
    /// Case-insensitive substring of the package name.
    #[serde(default)]
    pub q: Option<String>,
    /// 1-based page number.
    #[serde(default = "default_page")]
    #[validate(range(min = 1, message = "page must be at least 1"))]
    pub page: usize,
    #[serde(default = "default_per_page")]
    #[validate(range(min = 1, max = 100, message = "per_page must be between 1 and 100"))]
    pub per_page: usize,
}

impl ListPackagesQuery {
    pub fn into_request(self) -> Result<ListPackagesRequest, CatalogError> {
        Ok(ListPackagesRequest {
            remote: self.remote_name,
            query: self.q.unwrap_or_default(),
            pagination: Pagination::new(self.page, self.per_page)?,
        })
    }
}

/// Query parameters for routes that only need the remote.
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct RemoteQuery {
    #[serde(default)]
    pub remote_name: String,
}

/// Query parameters for `GET /packages/{name}/{version}/configuration`.
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct ConfigurationQuery {
    #[serde(default)]
    pub remote_name: String,
    pub user: Option<String>,
    pub channel: Option<String>,
    /// Binary to describe (required).
    pub package_id: Option<String>,
    /// Recipe revision; the latest one when omitted.
    pub recipe_revision: Option<String>,
}

impl ConfigurationQuery {
    pub fn into_request(self, name: String, version: String) -> BinaryConfigurationRequest {
        BinaryConfigurationRequest {
            remote: self.remote_name,
            name,
            version,
            user: self.user,
            channel: self.channel,
            package_id: self.package_id,
            recipe_revision: self.recipe_revision,
        }
    }
}

/// Query parameters for `GET /packages/{name}/{version}/binaries`.
///
/// `user` and `channel` given as an empty string select references without
/// one. Every other empty value counts as unset.
#[derive(Debug, Deserialize, IntoParams, ToSchema)]
#[into_params(parameter_in = Query)]
pub struct BinariesQuery {
    #[serde(default)]
    pub remote_name: String,
    pub recipe_revision: Option<String>,
    pub user: Option<String>,
    pub channel: Option<String>,
    pub os: Option<String>,
    pub arch: Option<String>,
    pub compiler: Option<String>,
    pub compiler_version: Option<String>,
    pub build_type: Option<String>,
}

impl BinariesQuery {
    pub fn into_request(self, name: String, version: String) -> ListBinariesRequest {
        ListBinariesRequest {
            remote: self.remote_name,
            name,
            version,
            references: ReferenceFilter {
                revision: self.recipe_revision.filter(|r| !r.is_empty()),
                user: self.user,
                channel: self.channel,
            },
            binaries: BinaryFilter {
                os: self.os,
                arch: self.arch,
                compiler: self.compiler,
                compiler_version: self.compiler_version,
                build_type: self.build_type,
            },
        }
    }
}

#[cfg(test)]
mod test {
    use super::*;

    fn query(page: usize, per_page: usize) -> ListPackagesQuery {
        ListPackagesQuery {
            remote_name: "conancenter".into(),
            q: None,
            page,
            per_page,
        }
    }

    #[test]
    fn page_bounds_are_validated() {
        assert!(query(1, 20).validate().is_ok());
        assert!(query(0, 20).validate().is_err());
        assert!(query(1, 0).validate().is_err());
        assert!(query(1, 101).validate().is_err());
    }

    #[test]
    fn empty_revision_means_latest() {
        let binaries = BinariesQuery {
            remote_name: "conancenter".into(),
            recipe_revision: Some(String::new()),
            user: Some(String::new()),
            channel: None,
            os: Some("Linux".into()),
            arch: None,
            compiler: None,
            compiler_version: None,
            build_type: None,
        };
        let request = binaries.into_request("zlib".into(), "1.3".into());
        assert_eq!(request.references.revision, None);
        assert_eq!(request.references.user.as_deref(), Some(""));
        assert_eq!(request.binaries.os.as_deref(), Some("Linux"));
    }
}
