//! Regex-based anchor extraction.
//!
//! Anchors are matched non-greedily across newlines, so an unclosed `<a>`
//! simply yields no link while later well-formed anchors still match.

use once_cell::sync::Lazy;
use regex::{Captures, Regex};
use std::ops::Range;

static ANCHOR_RE: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?is)<a\b([^>]*)>(.*?)</a\s*>").expect("valid anchor regex"));
static HREF_ATTR_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r#"(?is)(?:^|\s)href\s*=\s*(?:"([^"]*)"|'([^']*)'|([^\s"'>]+))"#)
        .expect("valid href regex")
});
static TAG_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"(?s)<[^>]*>").expect("valid tag regex"));
static WHITESPACE_RE: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").expect("valid ws regex"));
static ENTITY_RE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"&(#[0-9]{1,7}|#[xX][0-9a-fA-F]{1,6}|[a-zA-Z]+);").expect("valid entity regex")
});

/// One hyperlink found in article content.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ExtractedLink {
    /// Decoded, trimmed `href` attribute value. Never empty.
    pub href: String,
    /// Visible text of the anchor with nested markup removed and whitespace
    /// collapsed. Never empty.
    pub anchor_text: String,
    /// Byte range of the whole `<a ...>...</a>` element in the source.
    pub span: Range<usize>,
}

/// Extracts hyperlinks in document order.
///
/// Anchors without an `href`, with an empty `href`, or whose visible text is
/// empty after trimming are skipped.
pub fn extract_links(html: &str) -> Vec<ExtractedLink> {
    ANCHOR_RE
        .captures_iter(html)
        .filter_map(|caps| link_from_captures(&caps))
        .collect()
}

fn link_from_captures(caps: &Captures<'_>) -> Option<ExtractedLink> {
    let whole = caps.get(0)?;
    let attrs = caps.get(1).map_or("", |m| m.as_str());
    let inner = caps.get(2).map_or("", |m| m.as_str());

    let href = decode_entities(href_attribute(attrs)?.trim());
    let href = href.trim();
    if href.is_empty() {
        return None;
    }

    let anchor_text = visible_text(inner);
    if anchor_text.is_empty() {
        return None;
    }

    Some(ExtractedLink {
        href: href.to_string(),
        anchor_text,
        span: whole.range(),
    })
}

fn href_attribute(attrs: &str) -> Option<&str> {
    let caps = HREF_ATTR_RE.captures(attrs)?;
    caps.get(1)
        .or_else(|| caps.get(2))
        .or_else(|| caps.get(3))
        .map(|m| m.as_str())
}

/// Replaces every anchor for which `should_unwrap(href)` holds with its
/// inner text, leaving all other markup untouched.
///
/// Inner markup is dropped but entities are kept encoded so the result is
/// still valid HTML. Returns `None` when no anchor matched.
pub fn unwrap_anchors<F>(html: &str, mut should_unwrap: F) -> Option<String>
where
    F: FnMut(&str) -> bool,
{
    let mut output = String::with_capacity(html.len());
    let mut cursor = 0;
    let mut unwrapped = 0usize;

    for caps in ANCHOR_RE.captures_iter(html) {
        let Some(whole) = caps.get(0) else {
            continue;
        };
        let attrs = caps.get(1).map_or("", |m| m.as_str());
        let Some(raw_href) = href_attribute(attrs) else {
            continue;
        };
        let href = decode_entities(raw_href.trim());
        if href.trim().is_empty() || !should_unwrap(href.trim()) {
            continue;
        }

        let inner = caps.get(2).map_or("", |m| m.as_str());
        output.push_str(&html[cursor..whole.start()]);
        output.push_str(&TAG_RE.replace_all(inner, ""));
        cursor = whole.end();
        unwrapped += 1;
    }

    if unwrapped == 0 {
        return None;
    }
    output.push_str(&html[cursor..]);
    Some(output)
}

/// Counts whitespace-separated words in the visible text of an HTML fragment.
pub fn html_word_count(html: &str) -> u32 {
    let text = TAG_RE.replace_all(html, " ");
    let decoded = decode_entities(&text);
    let count = decoded.split_whitespace().count();
    u32::try_from(count).unwrap_or(u32::MAX)
}

fn visible_text(fragment: &str) -> String {
    let without_tags = TAG_RE.replace_all(fragment, "");
    let decoded = decode_entities(&without_tags);
    WHITESPACE_RE
        .replace_all(decoded.as_str(), " ")
        .trim()
        .to_string()
}

fn decode_entities(value: &str) -> String {
    if !value.contains('&') {
        return value.to_string();
    }
    ENTITY_RE
        .replace_all(value, |caps: &Captures<'_>| {
            let entity = &caps[1];
            decode_entity(entity).unwrap_or_else(|| caps[0].to_string())
        })
        .into_owned()
}

fn decode_entity(entity: &str) -> Option<String> {
    if let Some(numeric) = entity.strip_prefix('#') {
        let hex = numeric
            .strip_prefix('x')
            .or_else(|| numeric.strip_prefix('X'));
        let code = match hex {
            Some(hex) => u32::from_str_radix(hex, 16).ok()?,
            None => numeric.parse::<u32>().ok()?,
        };
        return char::from_u32(code).map(String::from);
    }
    let decoded = match entity {
        "amp" => "&",
        "lt" => "<",
        "gt" => ">",
        "quot" => "\"",
        "apos" => "'",
        "nbsp" => " ",
        _ => return None,
    };
    Some(decoded.to_string())
}

#[cfg(test)]
mod tests {
    use super::{extract_links, html_word_count, unwrap_anchors};

    #[test]
    fn extracts_links_in_document_order() {
        let html = r#"<p>See <a href="/guide">our guide</a> and <a href="https://external.com/x">this</a>.</p>"#;
        let links = extract_links(html);
        assert_eq!(links.len(), 2);
        assert_eq!(links[0].href, "/guide");
        assert_eq!(links[0].anchor_text, "our guide");
        assert_eq!(links[1].href, "https://external.com/x");
        assert_eq!(links[1].anchor_text, "this");
        assert_eq!(&html[links[0].span.clone()], r#"<a href="/guide">our guide</a>"#);
    }

    #[test]
    fn anchor_text_strips_nested_markup_and_collapses_whitespace() {
        let html = "<a class=\"x\" href='/a'>\n  <strong>Bold</strong>\n <em>words</em> &amp; more</a>";
        let links = extract_links(html);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].href, "/a");
        assert_eq!(links[0].anchor_text, "Bold words & more");
    }

    #[test]
    fn drops_empty_href_and_empty_text() {
        let html = r#"<a href="">empty</a><a href="/x">   </a><a name="top">no href</a><a href="/ok"><img src="i.png"> ok</a>"#;
        let links = extract_links(html);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].href, "/ok");
        assert_eq!(links[0].anchor_text, "ok");
    }

    #[test]
    fn tolerates_unbalanced_markup() {
        let html = r#"<p><a href=/first>first</a></div><a href="/broken">never closed</p>"#;
        let links = extract_links(html);
        assert_eq!(links.len(), 1);
        assert_eq!(links[0].href, "/first");
        assert!(extract_links("<a href=\"/x\"").is_empty());
        assert!(extract_links("").is_empty());
    }

    #[test]
    fn does_not_match_data_href_attributes() {
        let html = r#"<a data-href="/wrong" href="/right">t</a>"#;
        let links = extract_links(html);
        assert_eq!(links[0].href, "/right");
    }

    #[test]
    fn decodes_entities_in_href() {
        let links = extract_links(r#"<a href="/search?a=1&amp;b=2">q</a>"#);
        assert_eq!(links[0].href, "/search?a=1&b=2");
    }

    #[test]
    fn unwrap_replaces_only_matching_anchors_with_inner_text() {
        let html = r#"<p>See <a href="/guide">our <b>guide</b></a> and <a href="https://external.com/x">this</a>.</p>"#;
        let rewritten = unwrap_anchors(html, |href| href == "/guide").unwrap();
        assert_eq!(
            rewritten,
            r#"<p>See our guide and <a href="https://external.com/x">this</a>.</p>"#
        );
    }

    #[test]
    fn unwrap_returns_none_without_matches() {
        assert!(unwrap_anchors("<p>plain</p>", |_| true).is_none());
        assert!(unwrap_anchors(r#"<a href="/a">a</a>"#, |_| false).is_none());
    }

    #[test]
    fn unwrap_keeps_entities_encoded() {
        let rewritten = unwrap_anchors(r#"<a href="/a">Tom &amp; Jerry</a>"#, |_| true).unwrap();
        assert_eq!(rewritten, "Tom &amp; Jerry");
    }

    #[test]
    fn word_count_ignores_markup() {
        assert_eq!(html_word_count("<p>One <b>two</b></p><p>three&nbsp;four</p>"), 4);
        assert_eq!(html_word_count(""), 0);
    }
}
