//! Client-side checks run before a write reaches the network.

use fuzzwatch_core::ClientError;
use once_cell::sync::Lazy;
use regex::Regex;

static SCHEME_PREFIX: Lazy<Result<Regex, regex::Error>> =
    Lazy::new(|| Regex::new(r"(?i)^(https?://)?(www\.)?"));

/// Labels of 1 to 63 alphanumerics or inner hyphens, at least one dot.
static DOMAIN: Lazy<Result<Regex, regex::Error>> = Lazy::new(|| {
    Regex::new(
        r"^[a-zA-Z0-9]([a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?(\.[a-zA-Z0-9]([a-zA-Z0-9-]{0,61}[a-zA-Z0-9])?)+$",
    )
});

fn pattern(
    regex: &'static Lazy<Result<Regex, regex::Error>>,
) -> Result<&'static Regex, ClientError> {
    Lazy::force(regex)
        .as_ref()
        .map_err(|e| ClientError::validation("domain_name", e.to_string()))
}

/// Strip scheme, `www.` and anything after the host.
pub fn normalize_domain(input: &str) -> Result<String, ClientError> {
    let stripped = pattern(&SCHEME_PREFIX)?.replace(input.trim(), "");
    Ok(stripped.split('/').next().unwrap_or_default().to_string())
}

pub fn is_valid_domain(input: &str) -> bool {
    match (normalize_domain(input), pattern(&DOMAIN)) {
        (Ok(host), Ok(domain)) => domain.is_match(&host),
        _ => false,
    }
}

/// Normalized host of `input`, rejected when blank, malformed or already in
/// `known_roots`.
pub fn validate_new_domain(input: &str, known_roots: &[String]) -> Result<String, ClientError> {
    if input.trim().is_empty() {
        return Err(ClientError::validation(
            "domain_name",
            "Please enter a domain root",
        ));
    }
    let host = normalize_domain(input)?;
    if !pattern(&DOMAIN)?.is_match(&host) {
        return Err(ClientError::validation(
            "domain_name",
            "Please enter a valid domain (e.g., example.com)",
        ));
    }
    if known_roots.iter().any(|root| root == &host) {
        return Err(ClientError::validation(
            "domain_name",
            "This domain root already exists",
        ));
    }
    Ok(host)
}
