//! The client against a local stand-in for a Conan v2 remote.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;

use axum::extract::{Path, State};
use axum::http::{HeaderMap, StatusCode, header};
use axum::response::{IntoResponse, Response};
use axum::routing::get;
use axum::{Json, Router};
use conan_lens_core::{
    BinaryFilter, Catalog, ListBinariesRequest, ListPattern, PackageRegistry, ReferenceRecord,
    RegistryError, Remote,
};
use conan_lens_remote::ConanRemoteClient;
use serde_json::{Value, json};
use tracing_test::traced_test;

const REMOTE: &str = "conancenter";
const TOKEN: &str = "tok-123";
// base64("alice:secret")
const BASIC: &str = "Basic YWxpY2U6c2VjcmV0";

type Recipe = Path<(String, String, String, String)>;

fn authorized(headers: &HeaderMap) -> bool {
    headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .is_some_and(|v| v == format!("Bearer {TOKEN}"))
}

async fn authenticate(headers: HeaderMap) -> Response {
    match headers.get(header::AUTHORIZATION).and_then(|v| v.to_str().ok()) {
        Some(BASIC) => TOKEN.into_response(),
        _ => StatusCode::UNAUTHORIZED.into_response(),
    }
}

async fn search(headers: HeaderMap) -> Response {
    if !authorized(&headers) {
        return StatusCode::UNAUTHORIZED.into_response();
    }
    Json(json!({"results": ["zlib/1.3@_/_", "zlib/1.2.13", "zlibng/2.0"]})).into_response()
}

fn revisions_of(name: &str, version: &str) -> Option<Value> {
    match (name, version) {
        ("zlib", "1.3") => Some(json!([
            {"revision": "bbb", "time": "2024-01-02T00:00:00.000+0000"},
            {"revision": "aaa", "time": "2023-07-20T10:20:30.123+0000"},
        ])),
        ("zlib", "1.2.13") => Some(json!([{"revision": "ccc"}])),
        ("zlibng", "2.0") => Some(json!([{"revision": "ddd"}])),
        _ => None,
    }
}

async fn revisions(Path((name, version, _, _)): Recipe) -> Response {
    match revisions_of(&name, &version) {
        Some(list) => Json(json!({"reference": format!("{name}/{version}"), "revisions": list}))
            .into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn latest(Path((name, version, _, _)): Recipe) -> Response {
    match revisions_of(&name, &version) {
        Some(list) => Json(list[0].clone()).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}

async fn package_search(
    Path((name, version, _, _, revision)): Path<(String, String, String, String, String)>,
) -> Json<Value> {
    let linux = json!({
        "settings": {
            "os": "Linux", "arch": "x86_64", "compiler": "gcc",
            "compiler.version": "13", "build_type": "Release"
        },
        "options": {"shared": "False"},
        "requires": []
    });
    let windows = json!({
        "settings": {"os": "Windows", "arch": "x86_64", "compiler": "msvc", "build_type": "Release"},
        "options": {"shared": "True"}
    });
    Json(match (name.as_str(), version.as_str(), revision.as_str()) {
        ("zlib", "1.3", "bbb") => json!({"p2": windows, "p1": linux}),
        ("zlib", "1.3", "aaa") => json!({"p1": linux}),
        _ => json!({}),
    })
}

async fn package_latest(
    Path((_, _, _, _, _, package_id)): Path<(String, String, String, String, String, String)>,
) -> Json<Value> {
    Json(json!({"revision": format!("prev-{package_id}"), "time": "2024-01-02T00:00:00Z"}))
}

fn conan_remote() -> Router {
    const RECIPE: &str = "/v2/conans/{name}/{version}/{user}/{channel}";
    Router::new()
        .route("/v2/users/authenticate", get(authenticate))
        .route("/v2/conans/search", get(search))
        .route(&format!("{RECIPE}/revisions"), get(revisions))
        .route(&format!("{RECIPE}/latest"), get(latest))
        .route(&format!("{RECIPE}/revisions/{{rrev}}/search"), get(package_search))
        .route(
            &format!("{RECIPE}/revisions/{{rrev}}/packages/{{package_id}}/latest"),
            get(package_latest),
        )
}

async fn serve(app: Router) -> String {
    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, app).await.unwrap();
    });
    format!("http://{addr}")
}

async fn connect(url: &str) -> ConanRemoteClient {
    ConanRemoteClient::builder(Remote::new(REMOTE, url))
        .without_proxy()
        .set_credentials("alice", "secret")
        .connect()
        .await
        .unwrap()
}

fn remote(url: &str) -> Remote {
    Remote::new(REMOTE, url)
}

fn paths(entries: &[conan_lens_core::RecipeEntry]) -> Vec<String> {
    entries.iter().map(|e| e.reference.full_path()).collect()
}

#[tokio::test]
async fn unpinned_search_lists_each_recipe_once() {
    let url = serve(conan_remote()).await;
    let client = connect(&url).await;

    let pattern: ListPattern = "zlib/*".parse().unwrap();
    let entries = client.enumerate_references(&pattern, &remote(&url)).await.unwrap();

    assert_eq!(paths(&entries), ["zlib/1.3", "zlib/1.2.13"]);
    assert!(entries.iter().all(|e| e.packages.is_empty()));
}

#[tokio::test]
async fn revision_glob_lists_every_revision() {
    let url = serve(conan_remote()).await;
    let client = connect(&url).await;

    let pattern: ListPattern = "zlib/*#*".parse().unwrap();
    let entries = client.enumerate_references(&pattern, &remote(&url)).await.unwrap();

    assert_eq!(paths(&entries), ["zlib/1.3#bbb", "zlib/1.3#aaa", "zlib/1.2.13#ccc"]);
    assert_eq!(entries[1].reference.created_at, Some(1_689_848_430.123));
    assert_eq!(entries[2].reference.created_at, None);
}

#[tokio::test]
async fn unpinned_package_search_uses_the_latest_revision() {
    let url = serve(conan_remote()).await;
    let client = connect(&url).await;

    let entries = client
        .enumerate_references(&ListPattern::versions_of("zlib"), &remote(&url))
        .await
        .unwrap();
    assert_eq!(paths(&entries), ["zlib/1.3#bbb", "zlib/1.2.13#ccc"]);
    assert_eq!(entries[0].packages.len(), 2);
    assert!(entries[1].packages.is_empty());
}

#[tokio::test]
async fn latest_selector_asks_for_one_revision() {
    let url = serve(conan_remote()).await;
    let client = connect(&url).await;

    let pattern: ListPattern = "zlib/1.3#latest".parse().unwrap();
    let entries = client.enumerate_references(&pattern, &remote(&url)).await.unwrap();
    assert_eq!(paths(&entries), ["zlib/1.3#bbb"]);
}

#[tokio::test]
async fn package_section_lists_sorted_binaries() {
    let url = serve(conan_remote()).await;
    let client = connect(&url).await;

    let pattern: ListPattern = "zlib/1.3#latest:*#*".parse().unwrap();
    let entries = client.enumerate_references(&pattern, &remote(&url)).await.unwrap();
    let packages = &entries[0].packages;
    assert_eq!(packages.len(), 2);
    assert_eq!(packages[0].package_id, "p1");
    assert_eq!(packages[0].revision.as_deref(), Some("prev-p1"));
    assert_eq!(packages[1].package_id, "p2");

    let only_p2: ListPattern = "zlib/1.3#latest:p2".parse().unwrap();
    let entries = client.enumerate_references(&only_p2, &remote(&url)).await.unwrap();
    assert_eq!(entries[0].packages.len(), 1);
    assert_eq!(entries[0].packages[0].revision, None);
}

#[tokio::test]
async fn configurations_resolve_the_latest_revision_when_unpinned() {
    let url = serve(conan_remote()).await;
    let client = connect(&url).await;
    let remote = remote(&url);

    let unpinned = ReferenceRecord::new("zlib", "1.3");
    let configurations = client.fetch_binary_configurations(&unpinned, &remote).await.unwrap();
    assert_eq!(configurations.len(), 2);
    assert_eq!(configurations["p1"].settings["compiler.version"], "13");
    assert!(configurations["p1"].requires.is_empty());

    let pinned = unpinned.with_revision("aaa");
    let configurations = client.fetch_binary_configurations(&pinned, &remote).await.unwrap();
    assert_eq!(configurations.keys().collect::<Vec<_>>(), ["p1"]);
}

#[tokio::test]
async fn unknown_recipes_are_absent_not_errors() {
    let url = serve(conan_remote()).await;
    let client = connect(&url).await;
    let remote = remote(&url);

    let missing = ReferenceRecord::new("nope", "1.0");
    assert_eq!(client.resolve_latest_recipe_revision(&missing, &remote).await.unwrap(), None);
    assert!(client.fetch_binary_configurations(&missing, &remote).await.unwrap().is_empty());
}

#[tokio::test]
async fn rejected_login_is_an_authentication_error() {
    let url = serve(conan_remote()).await;
    let err = ConanRemoteClient::builder(remote(&url))
        .without_proxy()
        .set_credentials("alice", "wrong")
        .connect()
        .await
        .unwrap_err();
    assert!(matches!(err, RegistryError::Authentication(name) if name == REMOTE));
}

#[tokio::test]
async fn anonymous_access_to_a_private_remote_fails() {
    let url = serve(conan_remote()).await;
    let client = ConanRemoteClient::builder(remote(&url))
        .without_proxy()
        .connect()
        .await
        .unwrap();
    let pattern: ListPattern = "zlib/*".parse().unwrap();
    let err = client.enumerate_references(&pattern, &remote(&url)).await.unwrap_err();
    assert!(matches!(err, RegistryError::Authentication(_)));
}

#[tokio::test]
#[traced_test]
async fn server_errors_are_retried_then_reported() {
    let hits = Arc::new(AtomicUsize::new(0));
    let app = Router::new()
        .route(
            "/v2/conans/search",
            get(|State(hits): State<Arc<AtomicUsize>>| async move {
                hits.fetch_add(1, Ordering::SeqCst);
                StatusCode::SERVICE_UNAVAILABLE
            }),
        )
        .with_state(Arc::clone(&hits));
    let url = serve(app).await;

    let client = ConanRemoteClient::builder(remote(&url))
        .without_proxy()
        .set_retry_count(2)
        .set_retry_delay(Duration::ZERO)
        .connect()
        .await
        .unwrap();
    let pattern: ListPattern = "zlib/*".parse().unwrap();
    let err = client.enumerate_references(&pattern, &remote(&url)).await.unwrap_err();

    assert!(matches!(err, RegistryError::Status { status: 503, .. }));
    assert_eq!(hits.load(Ordering::SeqCst), 2);
    assert!(logs_contain("request failed, retrying"));
}

#[tokio::test]
async fn catalog_over_the_remote_filters_binaries_of_the_latest_revision() {
    let url = serve(conan_remote()).await;
    let catalog = Catalog::new(Arc::new(connect(&url).await), vec![REMOTE.to_owned()]);

    let request = ListBinariesRequest {
        remote: REMOTE.into(),
        name: "zlib".into(),
        version: "1.3".into(),
        ..Default::default()
    };
    let all = catalog.list_binaries(request.clone()).await.unwrap();
    assert_eq!(all.total_binaries, 2);
    assert_eq!(all.revision_info.latest_revision.as_deref(), Some("bbb"));
    assert_eq!(all.filtered_by.recipe_revision.as_deref(), Some("bbb"));

    let linux = catalog
        .list_binaries(ListBinariesRequest {
            binaries: BinaryFilter {
                os: Some("Linux".into()),
                ..Default::default()
            },
            ..request
        })
        .await
        .unwrap();
    assert_eq!(linux.total_binaries, 1);
    assert_eq!(linux.binaries[0].package_id, "p1");

    let options = catalog.filter_options(REMOTE, "zlib", "1.3").await.unwrap();
    assert_eq!(options.filter_options.os, ["Linux", "Windows"]);
    assert_eq!(options.compiler_versions["gcc"], ["13"]);
}
