use thiserror::Error;
use url::Url;

/// Why a link cannot be handed to a browser.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum UrlValidationError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),

    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),

    #[error("URL has no host")]
    MissingHost,
}

/// Validate a link before opening it outside the app.
///
/// Only `http` and `https` URLs with a host pass. Entry links come from
/// the synced store, so `file:`, `javascript:` and custom schemes are
/// refused rather than handed to the desktop opener. Private addresses
/// are allowed: self-hosted news servers often live on the LAN.
pub fn validate_url_for_open(url_str: &str) -> Result<Url, UrlValidationError> {
    let url = Url::parse(url_str.trim())?;

    match url.scheme() {
        "http" | "https" => {}
        scheme => return Err(UrlValidationError::UnsupportedScheme(scheme.to_owned())),
    }
    if url.host_str().map_or(true, str::is_empty) {
        return Err(UrlValidationError::MissingHost);
    }

    Ok(url)
}
