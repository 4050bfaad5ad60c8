//! Cross-reference resolution: mapping link destinations to URLs.

use percent_encoding::{AsciiSet, NON_ALPHANUMERIC, utf8_percent_encode};

use crate::util::slugify;

use super::aggregate::SiteIndex;

/// Everything but unreserved characters and `/` gets percent-encoded.
const PATH_SET: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'_')
    .remove(b'.')
    .remove(b'-')
    .remove(b'~')
    .remove(b'/');

const ENWIKI_URL: &str = "https://en.wikipedia.org/wiki/";
const JAWIKI_URL: &str = "https://ja.wikipedia.org/wiki/";

/// How a resolved link is classified in the output.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkClass {
    Internal,
    External,
    Dead,
}

impl LinkClass {
    pub fn as_str(self) -> &'static str {
        match self {
            LinkClass::Internal => "internal",
            LinkClass::External => "external",
            LinkClass::Dead => "dead",
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct ResolvedLink {
    pub url: String,
    pub class: LinkClass,
}

/// Percent-encode a URL path component.
pub fn quote(text: &str) -> String {
    utf8_percent_encode(text, PATH_SET).to_string()
}

/// Resolve a `(face, destination)` pair against the site index.
///
/// Priority: absolute http(s) URLs, encyclopedia shorthand prefixes, then
/// index lookup of the title part with an optional `#fragment`. A fragment
/// with an empty title is an in-page anchor. Anything unresolved is a dead
/// link with an empty URL; the caller logs and keeps rendering.
pub fn resolve(face: &str, dest: &str, index: &SiteIndex) -> ResolvedLink {
    if dest.starts_with("http://") || dest.starts_with("https://") {
        return ResolvedLink {
            url: dest.to_string(),
            class: LinkClass::External,
        };
    }
    if let Some(rest) = dest.strip_prefix("enwiki:") {
        return wiki_link(ENWIKI_URL, rest, face);
    }
    if let Some(rest) = dest.strip_prefix("jawiki:") {
        return wiki_link(JAWIKI_URL, rest, face);
    }
    let (title, fragment) = match dest.split_once('#') {
        Some((title, fragment)) if !fragment.is_empty() => (title, fragment),
        _ => (dest, ""),
    };
    let mut url = String::new();
    if !title.is_empty() {
        if let Some(article) = index.get(&title.to_lowercase()) {
            url = format!("./{}", quote(&article.output_name()));
            if !fragment.is_empty() {
                url.push('#');
                url.push_str(&slugify(fragment));
            }
        }
    } else if !fragment.is_empty() {
        url = format!("#{}", slugify(fragment));
    }
    if url.is_empty() {
        return ResolvedLink {
            url,
            class: LinkClass::Dead,
        };
    }
    ResolvedLink {
        url,
        class: LinkClass::Internal,
    }
}

/// Encyclopedia shorthand: the remainder after the prefix names the page;
/// when empty, the face text does.
fn wiki_link(base: &str, rest: &str, face: &str) -> ResolvedLink {
    let mut page = rest.trim();
    if page.is_empty() {
        page = face;
    }
    ResolvedLink {
        url: format!("{}{}", base, quote(page)),
        class: LinkClass::External,
    }
}
