use url::Url;

use crate::ast::LinkAttrs;
use crate::error::HrefError;
use crate::options::RenderOptions;

pub const TARGET_BLANK: &str = "_blank";
pub const REL_UNTRUSTED: &str = "nofollow noopener noreferrer";

/// Parses an href into an absolute http(s) URL with a host.
pub fn parse_destination(href: &str) -> Result<Url, HrefError> {
    if href.starts_with('/') || href.starts_with('#') {
        return Err(HrefError::Relative);
    }
    let url = Url::parse(href).map_err(|source| HrefError::Unparseable {
        href: href.to_string(),
        source,
    })?;
    if !matches!(url.scheme(), "http" | "https") {
        return Err(HrefError::UnsupportedScheme(url.scheme().to_string()));
    }
    if url.host_str().is_none_or(str::is_empty) {
        return Err(HrefError::MissingHost);
    }
    Ok(url)
}

/// Picks `target`/`rel` for a link from its destination.
///
/// Site-relative and fragment links get nothing, `https` links to the trusted
/// host only open in a new tab, and everything else (including hrefs that do
/// not parse) gets the full untrusted set.
pub fn decorate(href: &str, options: &RenderOptions) -> LinkAttrs {
    match parse_destination(href) {
        Err(HrefError::Relative) => LinkAttrs::none(),
        Ok(url) if url.scheme() == "https" && is_trusted_host(&url, options) => LinkAttrs {
            target: Some(TARGET_BLANK),
            rel: None,
        },
        Ok(_) => untrusted(),
        Err(err) => {
            tracing::trace!(href, error = %err, "no usable host, applying strict link attributes");
            untrusted()
        }
    }
}

fn is_trusted_host(url: &Url, options: &RenderOptions) -> bool {
    url.port().is_none() && url.host_str() == Some(options.trusted_host.as_str())
}

fn untrusted() -> LinkAttrs {
    LinkAttrs {
        target: Some(TARGET_BLANK),
        rel: Some(REL_UNTRUSTED),
    }
}
