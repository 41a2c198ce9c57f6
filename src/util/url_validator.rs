use thiserror::Error;
use url::Url;

#[derive(Error, Debug)]
pub enum UrlValidationError {
    #[error("Invalid URL: {0}")]
    InvalidUrl(#[from] url::ParseError),
    #[error("Unsupported scheme: {0} (only http/https allowed)")]
    UnsupportedScheme(String),
    #[error("URL has no host")]
    MissingHost,
}

/// Validate an item link before handing it to the system opener.
///
/// Links come from third-party feeds, so anything that is not plain http(s)
/// (`file://`, `javascript:`, custom handlers) is refused.
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

/// Validate the server address. Local addresses are expected here.
pub fn validate_server_url(url_str: &str) -> Result<Url, UrlValidationError> {
    validate_url_for_open(url_str)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_accepts_http_and_https() {
        assert!(validate_url_for_open("https://example.com/post/1").is_ok());
        assert!(validate_url_for_open(" http://example.com ").is_ok());
    }

    #[test]
    fn test_rejects_other_schemes() {
        assert!(matches!(
            validate_url_for_open("file:///etc/passwd"),
            Err(UrlValidationError::UnsupportedScheme(s)) if s == "file"
        ));
        assert!(validate_url_for_open("javascript:alert(1)").is_err());
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(matches!(
            validate_url_for_open("not a url"),
            Err(UrlValidationError::InvalidUrl(_))
        ));
    }

    #[test]
    fn test_server_url_may_be_local() {
        assert!(validate_server_url("http://127.0.0.1:7070/").is_ok());
        assert!(validate_server_url("http://localhost:7070").is_ok());
    }
}
