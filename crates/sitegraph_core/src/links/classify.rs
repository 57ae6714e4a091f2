//! Internal/external link classification against a project domain.

use once_cell::sync::Lazy;
use regex::Regex;
use url::Url;

static SCHEME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.\-]*://").expect("valid scheme regex"));
static URI_SCHEME_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[a-zA-Z][a-zA-Z0-9+.\-]*:").expect("valid uri scheme regex"));
static HOST_LIKE_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^(?:[a-zA-Z0-9](?:[a-zA-Z0-9\-]*[a-zA-Z0-9])?\.)+([a-zA-Z]{2,24})(?::[0-9]{1,5})?$")
        .expect("valid host regex")
});

/// File extensions that make `name.ext` a relative document path rather
/// than a bare host name.
const DOCUMENT_EXTENSIONS: &[&str] = &[
    "htm", "html", "xhtml", "php", "asp", "aspx", "jsp", "cgi", "md", "txt", "pdf", "xml",
    "json", "csv", "png", "jpg", "jpeg", "gif", "svg", "webp",
];

/// Classification result for one `href`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LinkTarget {
    /// Resolves to a page of the project; `slug` has no edge slashes and no
    /// query or fragment. The site root is the empty slug.
    Internal { slug: String },
    /// Off-site link; `href` is the trimmed literal value.
    External { href: String },
}

impl LinkTarget {
    pub fn internal_slug(&self) -> Option<&str> {
        match self {
            Self::Internal { slug } => Some(slug.as_str()),
            Self::External { .. } => None,
        }
    }

    /// Normalized identity key of an external link.
    pub fn external_key(&self) -> Option<String> {
        match self {
            Self::Internal { .. } => None,
            Self::External { href } => Some(normalize_external_url(href)),
        }
    }
}

/// Normalizes a project domain: scheme, leading `www.` and trailing
/// slashes stripped, lower-cased.
pub fn normalize_domain(domain: &str) -> String {
    strip_identity_noise(domain)
}

/// Normalizes an external URL into its identity key.
///
/// `https://example.com/page`, `http://www.example.com/page/`,
/// `//example.com/page` and `example.com/page` share the key
/// `example.com/page`.
pub fn normalize_external_url(href: &str) -> String {
    strip_identity_noise(href)
}

fn strip_identity_noise(value: &str) -> String {
    let lowered = value.trim().to_lowercase();
    let without_scheme = SCHEME_RE.replace(&lowered, "");
    let host_and_path = without_scheme
        .strip_prefix("//")
        .unwrap_or(&*without_scheme);
    let without_www = host_and_path
        .strip_prefix("www.")
        .unwrap_or(host_and_path);
    without_www.trim_end_matches('/').to_string()
}

/// Classifies `href` relative to the project `domain`.
///
/// Decision order:
/// 1. root-relative path (`/guide`) is internal;
/// 2. absolute URL on the project host is internal (slug = path);
/// 3. scheme-less `domain/path` is internal;
/// 4. any other relative path is internal, except fragments, URI schemes
///    (`mailto:`, `tel:`, ...) and bare host names such as `example.com/x`;
/// 5. everything else is external.
pub fn classify_link(href: &str, domain: &str) -> LinkTarget {
    let href = href.trim();
    let domain = normalize_domain(domain);

    if let Some(rest) = href.strip_prefix("//") {
        return classify_absolute(&format!("https://{rest}"), href, &domain);
    }

    if href.starts_with('/') {
        return LinkTarget::Internal {
            slug: slug_from_path(href),
        };
    }

    if href.contains("://") {
        return classify_absolute(href, href, &domain);
    }

    if !domain.is_empty() {
        let lowered = href.to_ascii_lowercase();
        let www_len = if lowered.starts_with("www.") { 4 } else { 0 };
        let bare = &lowered[www_len..];
        let host_end = bare.find(['/', '?', '#']).unwrap_or(bare.len());
        if &bare[..host_end] == domain.as_str() {
            let remainder = &href[www_len + host_end..];
            return LinkTarget::Internal {
                slug: slug_from_path(remainder),
            };
        }
    }

    if is_relative_path(href) {
        return LinkTarget::Internal {
            slug: slug_from_path(href),
        };
    }

    LinkTarget::External {
        href: href.to_string(),
    }
}

fn classify_absolute(parse_input: &str, literal: &str, domain: &str) -> LinkTarget {
    if let Ok(parsed) = Url::parse(parse_input) {
        if let Some(host) = parsed.host_str() {
            let host = host.to_ascii_lowercase();
            let host = host.strip_prefix("www.").unwrap_or(host.as_str());
            if !domain.is_empty() && host == domain {
                return LinkTarget::Internal {
                    slug: parsed.path().trim_matches('/').to_string(),
                };
            }
        }
    }
    LinkTarget::External {
        href: literal.to_string(),
    }
}

fn is_relative_path(href: &str) -> bool {
    if href.starts_with('#') {
        return false;
    }
    let first_segment = href.split(['/', '?', '#']).next().unwrap_or("");
    if looks_like_host(first_segment) {
        return false;
    }
    !URI_SCHEME_RE.is_match(href)
}

fn looks_like_host(segment: &str) -> bool {
    let Some(caps) = HOST_LIKE_RE.captures(segment) else {
        return false;
    };
    let tld = caps.get(1).map_or("", |m| m.as_str()).to_ascii_lowercase();
    !DOCUMENT_EXTENSIONS.contains(&tld.as_str())
}

fn slug_from_path(path: &str) -> String {
    let end = path.find(['?', '#']).unwrap_or(path.len());
    path[..end].trim_matches('/').to_string()
}
