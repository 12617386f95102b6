use thiserror::Error;
use url::Url;

/// Canonical DOI resolver host. Subdomains (e.g. `dx.doi.org`) also resolve.
pub const RESOLVER_DOMAIN: &str = "doi.org";

/// A normalized DOI: non-empty, no leading slash, never a scheme or host.
///
/// Values are only produced by [`normalize`], which either passes a bare
/// identifier through or extracts the path of a doi.org link.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct Doi(String);

impl Doi {
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// The canonical resolver link for this identifier.
    pub fn resolver_url(&self) -> String {
        format!("https://{RESOLVER_DOMAIN}/{}", self.0)
    }
}

impl std::fmt::Display for Doi {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Clone, Debug, Error, PartialEq, Eq)]
pub enum NormalizeError {
    #[error("`{input}` is not a {RESOLVER_DOMAIN} link")]
    NotAResolverLink { input: String },
    #[error("identifier is empty")]
    Empty,
}

/// Turn raw user input into a [`Doi`].
///
/// Non-URL input is taken verbatim (trimmed). URL input must point at the
/// resolver domain or a subdomain of it; the identifier is the URL path with
/// leading slashes stripped. No DOI syntax validation beyond non-emptiness.
pub fn normalize(input: &str) -> Result<Doi, NormalizeError> {
    let trimmed = input.trim();

    if !trimmed.starts_with("http://") && !trimmed.starts_with("https://") {
        if trimmed.is_empty() {
            return Err(NormalizeError::Empty);
        }
        return Ok(Doi(trimmed.to_owned()));
    }

    let Ok(parsed) = Url::parse(trimmed) else {
        return Err(NormalizeError::NotAResolverLink { input: input.to_owned() });
    };

    let resolver_host = parsed.host_str().is_some_and(|host| {
        host == RESOLVER_DOMAIN || host.ends_with(&format!(".{RESOLVER_DOMAIN}"))
    });
    if !resolver_host {
        return Err(NormalizeError::NotAResolverLink { input: input.to_owned() });
    }

    let identifier = parsed.path().trim_start_matches('/');
    if identifier.is_empty() {
        return Err(NormalizeError::Empty);
    }

    Ok(Doi(identifier.to_owned()))
}
