//! [`PackageRegistry`] over the Conan v2 REST API of a single remote.

use std::env;
use std::time::Duration;

use async_trait::async_trait;
use conan_lens_core::{
    ConfigurationMap, ListPattern, PackageRef, PackageRegistry, RecipeEntry, ReferenceRecord,
    RegistryError, Remote, RevisionSelector,
};
use futures::{StreamExt, TryStreamExt, stream};
use reqwest::{Client, StatusCode, Url};
use serde::de::DeserializeOwned;
use tracing::{debug, info, warn};

use crate::api::{
    PackageSearch, RevisionEntry, RevisionList, SearchResponse, into_configurations,
    recipe_segments,
};

/// Requests kept in flight while expanding a search.
const MAX_IN_FLIGHT: usize = 8;

/// Builder for [`ConanRemoteClient`].
pub struct ClientBuilder {
    remote: Remote,
    credentials: Option<(String, String)>,
    timeout: Duration,
    retry_count: usize,
    retry_delay: Duration,
    proxy: Option<String>,
}

impl ClientBuilder {
    /// Log in with these credentials before the first request.
    pub fn set_credentials(mut self, user: impl Into<String>, password: impl Into<String>) -> Self {
        self.credentials = Some((user.into(), password.into()));
        self
    }

    /// Per-request timeout (default: 30 s).
    pub fn set_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    /// Attempts per request on transport errors and 5xx answers (default: `3`).
    pub fn set_retry_count(mut self, count: usize) -> Self {
        self.retry_count = count.max(1);
        self
    }

    pub fn set_retry_delay(mut self, delay: Duration) -> Self {
        self.retry_delay = delay;
        self
    }

    /// Override the HTTP/HTTPS proxy URL.
    pub fn set_proxy(mut self, proxy: impl Into<String>) -> Self {
        self.proxy = Some(proxy.into());
        self
    }

    /// Connect directly, ignoring any proxy from the environment.
    pub fn without_proxy(mut self) -> Self {
        self.proxy = None;
        self
    }

    /// Build the HTTP client and authenticate when credentials were given.
    pub async fn connect(self) -> Result<ConanRemoteClient, RegistryError> {
        let base = Url::parse(&self.remote.url).map_err(|e| RegistryError::Transport(Box::new(e)))?;

        let mut builder = Client::builder()
            .user_agent(concat!("conan-lens/", env!("CARGO_PKG_VERSION")))
            .timeout(self.timeout);
        builder = match &self.proxy {
            Some(proxy_url) => match reqwest::Proxy::all(proxy_url) {
                Ok(proxy) => builder.proxy(proxy.no_proxy(reqwest::NoProxy::from_env())),
                Err(e) => {
                    warn!(proxy = %proxy_url, error = %e, "ignoring invalid proxy URL");
                    builder.no_proxy()
                }
            },
            None => builder.no_proxy(),
        };
        let http = builder
            .build()
            .map_err(|e| RegistryError::Transport(Box::new(e)))?;

        let mut client = ConanRemoteClient {
            remote: self.remote,
            base,
            http,
            token: None,
            retry_count: self.retry_count,
            retry_delay: self.retry_delay,
        };
        if let Some((user, password)) = self.credentials {
            client.token = Some(client.authenticate(&user, &password).await?);
            info!(remote = %client.remote.name, %user, "authenticated with remote");
        }
        Ok(client)
    }
}

/// A Conan v2 remote.
pub struct ConanRemoteClient {
    remote: Remote,
    base: Url,
    http: Client,
    token: Option<String>,
    retry_count: usize,
    retry_delay: Duration,
}

impl std::fmt::Debug for ConanRemoteClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ConanRemoteClient")
            .field("remote", &self.remote)
            .field("authenticated", &self.token.is_some())
            .finish_non_exhaustive()
    }
}

impl ConanRemoteClient {
    /// Proxy is read from `HTTP_PROXY` / `HTTPS_PROXY` (honouring `NO_PROXY`)
    /// unless overridden.
    pub fn builder(remote: Remote) -> ClientBuilder {
        let proxy = env::var("HTTP_PROXY")
            .ok()
            .or_else(|| env::var("HTTPS_PROXY").ok());
        ClientBuilder {
            remote,
            credentials: None,
            timeout: Duration::from_secs(30),
            retry_count: 3,
            retry_delay: Duration::from_secs(1),
            proxy,
        }
    }

    pub fn remote_info(&self) -> &Remote {
        &self.remote
    }

    fn check_remote(&self, remote: &Remote) -> Result<(), RegistryError> {
        if remote.name == self.remote.name {
            Ok(())
        } else {
            Err(RegistryError::UnknownRemote(remote.name.clone()))
        }
    }

    fn endpoint(&self, segments: &[&str]) -> Result<Url, RegistryError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|()| {
                RegistryError::MalformedIndex(format!("remote URL '{}' cannot carry a path", self.base))
            })?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    fn recipe_endpoint(
        &self,
        reference: &ReferenceRecord,
        tail: &[&str],
    ) -> Result<Url, RegistryError> {
        let mut segments = vec!["v2", "conans"];
        segments.extend(recipe_segments(reference));
        segments.extend_from_slice(tail);
        self.endpoint(&segments)
    }

    /// `GET /v2/users/authenticate` with basic credentials; answers a bearer token.
    async fn authenticate(&self, user: &str, password: &str) -> Result<String, RegistryError> {
        let url = self.endpoint(&["v2", "users", "authenticate"])?;
        let response = self
            .http
            .get(url.clone())
            .basic_auth(user, Some(password))
            .send()
            .await
            .map_err(|e| RegistryError::Transport(Box::new(e)))?;
        match response.status() {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                Err(RegistryError::Authentication(self.remote.name.clone()))
            }
            status if !status.is_success() => Err(RegistryError::Status {
                status: status.as_u16(),
                url: url.to_string(),
            }),
            _ => {
                let token = response
                    .text()
                    .await
                    .map_err(|e| RegistryError::Transport(Box::new(e)))?;
                Ok(token.trim().to_owned())
            }
        }
    }

    /// GET and decode `url`; `None` on 404. Transport errors and 5xx answers
    /// are retried.
    async fn get_json<T: DeserializeOwned>(&self, url: Url) -> Result<Option<T>, RegistryError> {
        let mut attempt = 1;
        loop {
            match self.get_json_once(&url).await {
                Err(e) if attempt < self.retry_count && retryable(&e) => {
                    warn!(%url, attempt, error = %e, "request failed, retrying");
                    attempt += 1;
                    tokio::time::sleep(self.retry_delay).await;
                }
                result => return result,
            }
        }
    }

    async fn get_json_once<T: DeserializeOwned>(&self, url: &Url) -> Result<Option<T>, RegistryError> {
        debug!(%url, "GET");
        let mut request = self.http.get(url.clone());
        if let Some(token) = &self.token {
            request = request.bearer_auth(token);
        }
        let response = request
            .send()
            .await
            .map_err(|e| RegistryError::Transport(Box::new(e)))?;

        match response.status() {
            StatusCode::NOT_FOUND => return Ok(None),
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                return Err(RegistryError::Authentication(self.remote.name.clone()));
            }
            status if !status.is_success() => {
                return Err(RegistryError::Status {
                    status: status.as_u16(),
                    url: url.to_string(),
                });
            }
            _ => {}
        }
        let body = response
            .bytes()
            .await
            .map_err(|e| RegistryError::Transport(Box::new(e)))?;
        Ok(Some(serde_json::from_slice(&body)?))
    }

    async fn search(&self, pattern: &ListPattern) -> Result<Vec<ReferenceRecord>, RegistryError> {
        let mut url = self.endpoint(&["v2", "conans", "search"])?;
        url.query_pairs_mut()
            .append_pair("q", &pattern.search_expression());
        let response: SearchResponse = self.get_json(url).await?.unwrap_or_default();

        let mut references = Vec::with_capacity(response.results.len());
        for result in response.results {
            match result.parse::<ReferenceRecord>() {
                Ok(reference) if pattern.matches_recipe(&reference) => references.push(reference),
                Ok(_) => {}
                Err(e) => warn!(remote = %self.remote.name, error = %e, "skipping search result"),
            }
        }
        Ok(references)
    }

    async fn latest_revision(
        &self,
        reference: &ReferenceRecord,
    ) -> Result<Option<ReferenceRecord>, RegistryError> {
        let url = self.recipe_endpoint(reference, &["latest"])?;
        let latest: Option<RevisionEntry> = self.get_json(url).await?;
        Ok(latest.map(|entry| pinned(reference, &entry)))
    }

    /// The revisions of one search hit that `pattern` selects. An unpinned
    /// recipe-only pattern costs no request; an unpinned one with a package
    /// section lists the latest revision.
    async fn revisions(
        &self,
        reference: ReferenceRecord,
        pattern: &ListPattern,
    ) -> Result<Vec<ReferenceRecord>, RegistryError> {
        let selector = pattern.revision();
        match selector {
            RevisionSelector::Unpinned if !pattern.includes_packages() => {
                return Ok(vec![reference]);
            }
            RevisionSelector::Unpinned | RevisionSelector::Latest => {
                return Ok(self.latest_revision(&reference).await?.into_iter().collect());
            }
            RevisionSelector::Matching(_) => {}
        }
        let url = self.recipe_endpoint(&reference, &["revisions"])?;
        let list: RevisionList = self.get_json(url).await?.unwrap_or_default();
        Ok(list
            .revisions
            .iter()
            .filter(|entry| selector.matches(Some(&entry.revision)))
            .map(|entry| pinned(&reference, entry))
            .collect())
    }

    async fn package_search(&self, reference: &ReferenceRecord) -> Result<PackageSearch, RegistryError> {
        let Some(revision) = reference.revision.as_deref() else {
            return Ok(PackageSearch::new());
        };
        let url = self.recipe_endpoint(reference, &["revisions", revision, "search"])?;
        Ok(self.get_json(url).await?.unwrap_or_default())
    }

    async fn package_ref(
        &self,
        reference: &ReferenceRecord,
        package_id: String,
        with_revision: bool,
    ) -> Result<PackageRef, RegistryError> {
        let mut package = PackageRef::new(package_id);
        let Some(recipe_revision) = reference.revision.as_deref().filter(|_| with_revision) else {
            return Ok(package);
        };
        let url = self.recipe_endpoint(
            reference,
            &["revisions", recipe_revision, "packages", &package.package_id, "latest"],
        )?;
        if let Some(latest) = self.get_json::<RevisionEntry>(url).await? {
            package.created_at = latest.created_at();
            package.revision = Some(latest.revision);
        }
        Ok(package)
    }

    async fn with_packages(
        &self,
        reference: ReferenceRecord,
        pattern: &ListPattern,
    ) -> Result<RecipeEntry, RegistryError> {
        let mut package_ids: Vec<String> = self
            .package_search(&reference)
            .await?
            .into_keys()
            .filter(|id| pattern.matches_package(id))
            .collect();
        package_ids.sort();

        let with_revision = pattern.includes_package_revisions();
        let packages = stream::iter(package_ids)
            .map(|id| self.package_ref(&reference, id, with_revision))
            .buffered(MAX_IN_FLIGHT)
            .try_collect()
            .await?;
        Ok(RecipeEntry {
            reference,
            packages,
        })
    }
}

fn pinned(reference: &ReferenceRecord, entry: &RevisionEntry) -> ReferenceRecord {
    let mut pinned = reference.clone().with_revision(entry.revision.clone());
    pinned.created_at = entry.created_at();
    pinned
}

fn retryable(error: &RegistryError) -> bool {
    match error {
        RegistryError::Transport(_) => true,
        RegistryError::Status { status, .. } => *status >= 500,
        _ => false,
    }
}

#[async_trait]
impl PackageRegistry for ConanRemoteClient {
    fn remotes(&self) -> Vec<Remote> {
        vec![self.remote.clone()]
    }

    async fn enumerate_references(
        &self,
        pattern: &ListPattern,
        remote: &Remote,
    ) -> Result<Vec<RecipeEntry>, RegistryError> {
        self.check_remote(remote)?;
        let recipes = self.search(pattern).await?;

        let revisions: Vec<Vec<ReferenceRecord>> = stream::iter(recipes)
            .map(|reference| self.revisions(reference, pattern))
            .buffered(MAX_IN_FLIGHT)
            .try_collect()
            .await?;
        let references = revisions.into_iter().flatten();

        if !pattern.includes_packages() {
            return Ok(references.map(RecipeEntry::new).collect());
        }
        stream::iter(references)
            .map(|reference| self.with_packages(reference, pattern))
            .buffered(MAX_IN_FLIGHT)
            .try_collect()
            .await
    }

    async fn fetch_binary_configurations(
        &self,
        reference: &ReferenceRecord,
        remote: &Remote,
    ) -> Result<ConfigurationMap, RegistryError> {
        self.check_remote(remote)?;
        let pinned = match reference.revision {
            Some(_) => Some(reference.clone()),
            None => self.latest_revision(reference).await?,
        };
        match pinned {
            Some(pinned) => Ok(into_configurations(self.package_search(&pinned).await?)),
            None => Ok(ConfigurationMap::new()),
        }
    }

    async fn resolve_latest_recipe_revision(
        &self,
        reference: &ReferenceRecord,
        remote: &Remote,
    ) -> Result<Option<ReferenceRecord>, RegistryError> {
        self.check_remote(remote)?;
        self.latest_revision(reference).await
    }
}
