/// Server configuration loaded from environment variables.
///
/// All fields have sensible defaults suitable for local development.
/// In production, override via environment variables.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `5000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    /// Number of worker tasks, i.e. the bound on concurrently RUNNING jobs.
    pub worker_count: usize,
    /// Per-job execution deadline in seconds.
    pub execution_timeout_secs: u64,
    /// Upsert key column for merge-mode jobs.
    pub merge_key: String,
    /// Root directory for path-based job sources.
    pub data_root: String,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                  | Default                 |
    /// |--------------------------|-------------------------|
    /// | `HOST`                   | `0.0.0.0`               |
    /// | `PORT`                   | `5000`                  |
    /// | `CORS_ORIGINS`           | `http://localhost:5173` |
    /// | `REQUEST_TIMEOUT_SECS`   | `30`                    |
    /// | `WORKER_COUNT`           | `4`                     |
    /// | `EXECUTION_TIMEOUT_SECS` | `600`                   |
    /// | `MERGE_KEY`              | `id`                    |
    /// | `DATA_ROOT`              | `./data`                |
    pub fn from_env() -> Self {
        let host = std::env::var("HOST").unwrap_or_else(|_| "0.0.0.0".into());

        let port: u16 = std::env::var("PORT")
            .unwrap_or_else(|_| "5000".into())
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = std::env::var("CORS_ORIGINS")
            .unwrap_or_else(|_| "http://localhost:5173".into())
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = std::env::var("REQUEST_TIMEOUT_SECS")
            .unwrap_or_else(|_| "30".into())
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        let worker_count: usize = std::env::var("WORKER_COUNT")
            .unwrap_or_else(|_| "4".into())
            .parse()
            .expect("WORKER_COUNT must be a valid usize");

        let execution_timeout_secs: u64 = std::env::var("EXECUTION_TIMEOUT_SECS")
            .unwrap_or_else(|_| "600".into())
            .parse()
            .expect("EXECUTION_TIMEOUT_SECS must be a valid u64");

        let merge_key = std::env::var("MERGE_KEY").unwrap_or_else(|_| "id".into());

        let data_root = std::env::var("DATA_ROOT").unwrap_or_else(|_| "./data".into());

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            worker_count,
            execution_timeout_secs,
            merge_key,
            data_root,
        }
    }
}
