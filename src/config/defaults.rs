//! Default values for configuration

/// Default API base URL for local development
pub fn default_api_url() -> String {
    std::env::var("LECTERN_API_URL").unwrap_or_else(|_| "http://localhost:3001/api".to_string())
}

/// Default environment variable holding a bearer token override
pub fn default_token_env() -> String {
    "LECTERN_TOKEN".to_string()
}

/// Default request timeout in seconds
pub fn default_timeout_secs() -> u64 {
    30
}

/// Delay before the single re-fetch that follows a mutation (milliseconds)
pub fn default_refresh_delay_ms() -> u64 {
    1000
}

/// Interval between re-fetches while watching a document (milliseconds)
pub fn default_watch_interval_ms() -> u64 {
    2000
}

/// Default maximum number of documents per workspace
pub fn default_document_limit() -> u64 {
    1000
}

/// Usage percentage at which a limit is reported as "near"
pub fn default_near_limit_percent() -> f64 {
    80.0
}

/// Default storage bucket recorded on uploaded documents
pub fn default_upload_bucket() -> String {
    std::env::var("LECTERN_S3_BUCKET").unwrap_or_else(|_| "default-bucket".to_string())
}

/// Default storage region recorded on uploaded documents
pub fn default_upload_region() -> String {
    std::env::var("LECTERN_S3_REGION").unwrap_or_else(|_| "us-east-1".to_string())
}

/// Default time allowed for a single storage upload in seconds
pub fn default_upload_timeout_secs() -> u64 {
    1800
}

/// Default page size for list requests
pub fn default_page_size() -> u32 {
    100
}

/// Default result count for search requests
pub fn default_search_limit() -> u32 {
    20
}

/// Default number of recent queries shown on the dashboard
pub fn default_recent_queries() -> u32 {
    5
}
