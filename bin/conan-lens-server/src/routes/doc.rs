use utoipa::OpenApi;

use crate::routes::{admin, health, packages, repositories};

#[derive(OpenApi)]
#[openapi(info(
    title = "conan-lens",
    description = "Browse, group and filter the packages of a Conan remote",
    contact(name = "conan-lens", url = "https://github.com/conan-lens/conan-lens")
))]
pub struct ApiDoc;

pub fn get_docs() -> utoipa::openapi::OpenApi {
    let mut root = ApiDoc::openapi();
    root.merge(health::HealthApi::openapi());
    root.merge(repositories::RepositoriesApi::openapi());
    root.merge(packages::PackagesApi::openapi());
    root.merge(admin::AdminApi::openapi());
    root
}

#[cfg(test)]
mod test {
    use super::*;

    #[test]
    fn every_route_is_documented() {
        let docs = get_docs();
        for path in [
            "/",
            "/health",
            "/repositories",
            "/packages",
            "/packages/{name}",
            "/packages/{name}/{version}/configuration",
            "/packages/{name}/{version}/filter-options",
            "/packages/{name}/{version}/binaries",
            "/admin/registry/reload",
        ] {
            assert!(docs.paths.paths.contains_key(path), "{path} is missing");
        }
    }
}
