//! Server configuration, loaded from environment variables at startup.

/// Runtime configuration for conan-lens-server.
///
/// Every field has a default so the server browses ConanCenter without any
/// environment variables set.
#[derive(Debug, Clone)]
pub struct Config {
    /// TCP address to bind (default: `"0.0.0.0:8000"`).
    pub bind_address: String,

    /// `tracing` filter string, e.g. `"info"` or `"debug,tower_http=warn"`.
    pub log_level: String,

    /// When `true`, emit log records as newline-delimited JSON.
    pub log_json: bool,

    /// Comma-separated list of allowed CORS origins.
    pub cors_allowed_origins: Option<String>,

    /// Serve `/swagger-ui` and `/api-docs/openapi.json`.
    pub enable_swagger: bool,

    /// Bearer token required on `/admin` routes. Unset leaves them open.
    pub admin_token: Option<String>,

    /// Name of the one remote clients may browse.
    pub remote_name: String,

    pub remote_url: String,
    pub remote_user: Option<String>,
    pub remote_password: Option<String>,

    /// Serve a JSON snapshot instead of talking to the remote.
    pub index_file: Option<String>,

    /// Timeout of every upstream request, in seconds.
    pub http_timeout_secs: u64,
}

impl Config {
    /// Build [`Config`] from environment variables, falling back to defaults.
    pub fn from_env() -> Self {
        Self {
            bind_address: env_or("CONAN_LENS_BIND", "0.0.0.0:8000"),
            log_level: env_or("CONAN_LENS_LOG", "info"),
            log_json: env_flag("CONAN_LENS_LOG_JSON", false),
            cors_allowed_origins: Some(env_or("CONAN_LENS_CORS_ORIGINS", "http://localhost:3000")),
            enable_swagger: env_flag("CONAN_LENS_ENABLE_SWAGGER", true),
            admin_token: env_opt("CONAN_LENS_ADMIN_TOKEN"),
            remote_name: env_or("CONAN_REMOTE_NAME", "conancenter"),
            remote_url: env_or("CONAN_REMOTE_URL", "https://center2.conan.io"),
            remote_user: env_opt("CONAN_REMOTE_USER"),
            remote_password: env_opt("CONAN_REMOTE_PASSWORD"),
            index_file: env_opt("CONAN_LENS_INDEX_FILE"),
            http_timeout_secs: parse_env("CONAN_LENS_HTTP_TIMEOUT_SECS", 30),
        }
    }

    /// Both halves of the remote login, when configured.
    pub fn remote_credentials(&self) -> Option<(&str, &str)> {
        self.remote_user
            .as_deref()
            .zip(self.remote_password.as_deref())
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            bind_address: "0.0.0.0:8000".to_owned(),
            log_level: "info".to_owned(),
            log_json: false,
            cors_allowed_origins: Some("http://localhost:3000".to_owned()),
            enable_swagger: true,
            admin_token: None,
            remote_name: "conancenter".to_owned(),
            remote_url: "https://center2.conan.io".to_owned(),
            remote_user: None,
            remote_password: None,
            index_file: None,
            http_timeout_secs: 30,
        }
    }
}

// ── private helpers ──────────────────────────────────────────────────────────

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_owned())
}

/// Unset and empty both read as `None`.
fn env_opt(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

fn env_flag(key: &str, default: bool) -> bool {
    std::env::var(key)
        .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
        .unwrap_or(default)
}

fn parse_env<T: std::str::FromStr>(key: &str, default: T) -> T {
    std::env::var(key)
        .ok()
        .and_then(|v| v.parse().ok())
        .unwrap_or(default)
}
