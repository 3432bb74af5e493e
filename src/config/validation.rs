//! Configuration validation logic

/// Validate that the configured validation service URL is an http(s) URL.
pub fn validate_base_url(url: &str) -> Result<(), Box<dyn std::error::Error>> {
    if url.starts_with("http://") || url.starts_with("https://") {
        Ok(())
    } else {
        Err(format!(
            "VALIDATION_BASE_URL must start with http:// or https:// (got '{url}')"
        )
        .into())
    }
}
