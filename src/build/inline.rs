//! Recursive inline markup rendering.
//!
//! A left-to-right scan over one logical line: text before the next `[` is
//! emitted escaped, then the bracket patterns are tried in a fixed order.
//! When nothing matches, a single literal `[` is emitted and the scan
//! advances one character, so malformed input degrades to passthrough
//! instead of failing.

use std::sync::LazyLock;

use regex::Regex;

use super::aggregate::SiteIndex;
use super::escape::esc;
use super::links::{self, LinkClass};

/// Maximum inline recursion depth. Past this the remaining text is emitted
/// verbatim, which bounds the scan on pathological bracket nesting.
pub const MAX_DEPTH: usize = 10;

/// Sigil pairs and the elements they wrap, tried in order.
const SPANS: &[(&str, &str, &str)] = &[
    ("[*", "*]", "b"),
    ("[/", "/]", "i"),
    ("[_", "_]", "u"),
    ("[-", "-]", "s"),
    ("[#", "#]", "kbd"),
    ("[^", "^]", "sup"),
    ("[,", ",]", "sub"),
    ("[:", ":]", "big"),
    ("[.", ".]", "small"),
];

static COLOR_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[\{(#?[A-Za-z0-9]+):(.*?)\}\]").unwrap());
static RUBY_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\[\(([^:]+):(.*?)\)\]").unwrap());

/// Render one line of text to HTML, expanding inline markup.
pub fn render_text(index: &SiteIndex, text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    render_inline(&mut out, index, text, 1);
    out
}

/// Recursive renderer; `depth` counts nested expansion levels.
pub fn render_inline(out: &mut String, index: &SiteIndex, text: &str, depth: usize) {
    if depth > MAX_DEPTH {
        out.push_str(&esc(text));
        return;
    }
    let mut text = text;
    loop {
        match text.find('[') {
            None => {
                out.push_str(&esc(text));
                return;
            }
            Some(idx) => {
                out.push_str(&esc(&text[..idx]));
                text = &text[idx..];
            }
        }
        if let Some((inner, rest)) = span_inner(text, "[||", "||]") {
            out.push_str(&esc(inner));
            text = rest;
            continue;
        }
        let mut matched = false;
        for (open, close, elem) in SPANS {
            if let Some((inner, rest)) = span_inner(text, open, close) {
                out.push_str(&format!("<{}>", elem));
                render_inline(out, index, inner, depth + 1);
                out.push_str(&format!("</{}>", elem));
                text = rest;
                matched = true;
                break;
            }
        }
        if matched {
            continue;
        }
        if let Some(caps) = COLOR_RE.captures(text) {
            out.push_str(&format!(
                "<span style=\"color:{};\" class=\"colored\">",
                esc(&caps[1])
            ));
            render_inline(out, index, &caps[2], depth + 1);
            out.push_str("</span>");
            text = &text[caps[0].len()..];
            continue;
        }
        if let Some(caps) = RUBY_RE.captures(text) {
            out.push_str("<ruby><rb>");
            render_inline(out, index, &caps[1], depth + 1);
            out.push_str(&format!("</rb><rt>{}</rt></ruby>", esc(&caps[2])));
            text = &text[caps[0].len()..];
            continue;
        }
        if let Some(rest) = text.strip_prefix("[\\n]") {
            out.push_str("<br/>");
            text = rest;
            continue;
        }
        if let Some(rest) = text.strip_prefix("[\\t]") {
            out.push_str("<span class=\"wide_space\">&#x3000;</span>");
            text = rest;
            continue;
        }
        if let Some((content, rest)) = span_inner(text, "[[", "]]") {
            let (face, dest) = split_face_dest(content);
            let link = links::resolve(face, dest, index);
            if link.class == LinkClass::Dead {
                eprintln!("Warning: invalid hyperlink: {}: {}", face, dest);
            }
            out.push_str(&format!(
                "<a href=\"{}\" class=\"{}\">",
                esc(&link.url),
                link.class.as_str()
            ));
            render_inline(out, index, face, depth + 1);
            out.push_str("</a>");
            text = rest;
            continue;
        }
        out.push('[');
        text = &text[1..];
    }
}

/// Plain-text twin of the renderer: identical bracket matching, but all
/// markup is discarded. Links reduce to their face text, ruby to its base,
/// hard breaks and wide spaces to nothing. Used for auto-descriptions.
pub fn plain_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    plain_inner(&mut out, text, 1);
    out
}

fn plain_inner(out: &mut String, text: &str, depth: usize) {
    if depth > MAX_DEPTH {
        out.push_str(text);
        return;
    }
    let mut text = text;
    loop {
        match text.find('[') {
            None => {
                out.push_str(text);
                return;
            }
            Some(idx) => {
                out.push_str(&text[..idx]);
                text = &text[idx..];
            }
        }
        if let Some((inner, rest)) = span_inner(text, "[||", "||]") {
            out.push_str(inner);
            text = rest;
            continue;
        }
        let mut matched = false;
        for (open, close, _) in SPANS {
            if let Some((inner, rest)) = span_inner(text, open, close) {
                plain_inner(out, inner, depth + 1);
                text = rest;
                matched = true;
                break;
            }
        }
        if matched {
            continue;
        }
        if let Some(caps) = COLOR_RE.captures(text) {
            plain_inner(out, &caps[2], depth + 1);
            text = &text[caps[0].len()..];
            continue;
        }
        if let Some(caps) = RUBY_RE.captures(text) {
            plain_inner(out, &caps[1], depth + 1);
            text = &text[caps[0].len()..];
            continue;
        }
        if let Some(rest) = text.strip_prefix("[\\n]") {
            text = rest;
            continue;
        }
        if let Some(rest) = text.strip_prefix("[\\t]") {
            text = rest;
            continue;
        }
        if let Some((content, rest)) = span_inner(text, "[[", "]]") {
            let (face, _) = split_face_dest(content);
            plain_inner(out, face, depth + 1);
            text = rest;
            continue;
        }
        out.push('[');
        text = &text[1..];
    }
}

/// `[open ... close]` with the shortest possible interior.
fn span_inner<'a>(text: &'a str, open: &str, close: &str) -> Option<(&'a str, &'a str)> {
    let rest = text.strip_prefix(open)?;
    let end = rest.find(close)?;
    Some((&rest[..end], &rest[end + close.len()..]))
}

/// Split `face|dest` at the first pipe; without one, both are the whole text.
fn split_face_dest(content: &str) -> (&str, &str) {
    match content.split_once('|') {
        Some((face, dest)) => (face.trim(), dest.trim()),
        None => (content.trim(), content.trim()),
    }
}
