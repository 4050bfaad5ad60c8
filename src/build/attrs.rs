//! Bracketed parameter parsing for directive blocks.
//!
//! Directive parameters mix a positional value with `[key=value]` and
//! `[flag]` groups, e.g. `photo.jpg [caption=At the lake] [width=50] [frill]`.

use std::collections::HashMap;
use std::sync::LazyLock;

use regex::Regex;

static PARAM_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(.*)\[([a-z]+?)(?:=(.*?))?\](.*)$").unwrap());

/// Parsed directive parameters: named attributes plus the positional residue.
#[derive(Debug, Default, Clone)]
pub struct Params {
    /// Whatever is left after all bracket groups are extracted.
    pub value: String,
    attrs: HashMap<String, String>,
}

impl Params {
    /// Extract all `[key=value]` / `[flag]` groups from a parameter string.
    /// Flags are stored with an empty value.
    pub fn parse(params: &str) -> Self {
        let mut attrs = HashMap::new();
        let mut rest = params.to_string();
        while let Some(caps) = PARAM_RE.captures(&rest) {
            let name = caps[2].trim().to_string();
            let value = caps.get(3).map(|m| m.as_str().trim()).unwrap_or("");
            if !name.is_empty() {
                attrs.insert(name, value.to_string());
            }
            rest = format!("{} {}", &caps[1], &caps[4]).trim().to_string();
        }
        Params {
            value: rest.trim().to_string(),
            attrs,
        }
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.attrs.get(name).map(String::as_str)
    }

    /// True if the attribute is present at all, bare flag or not.
    pub fn flag(&self, name: &str) -> bool {
        self.attrs.contains_key(name)
    }
}

/// Interpret a string attribute as a boolean.
pub fn to_bool(expr: Option<&str>) -> bool {
    match expr {
        Some(s) => matches!(s.to_lowercase().as_str(), "true" | "yes" | "1"),
        None => false,
    }
}

/// Split a comma-separated tag string, collapsing whitespace and dropping
/// empties and duplicates.
pub fn parse_tags(raw: &str) -> Vec<String> {
    let mut tags: Vec<String> = Vec::new();
    for tag in raw.split(',') {
        let tag = crate::util::normalize_meta_text(tag);
        if tag.is_empty() || tags.contains(&tag) {
            continue;
        }
        tags.push(tag);
    }
    tags
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_positional_only() {
        let params = Params::parse("http://example.com/a.jpg");
        assert_eq!(params.value, "http://example.com/a.jpg");
        assert_eq!(params.get("caption"), None);
    }

    #[test]
    fn test_parse_key_values() {
        let params = Params::parse("a.jpg [caption=At the lake] [width=50]");
        assert_eq!(params.value, "a.jpg");
        assert_eq!(params.get("caption"), Some("At the lake"));
        assert_eq!(params.get("width"), Some("50"));
    }

    #[test]
    fn test_parse_bare_flag() {
        let params = Params::parse("a.jpg [frill] [float=left]");
        assert_eq!(params.value, "a.jpg");
        assert!(params.flag("frill"));
        assert_eq!(params.get("float"), Some("left"));
    }

    #[test]
    fn test_parse_value_between_groups() {
        let params = Params::parse("[order=date] something [max=5]");
        assert_eq!(params.value, "something");
        assert_eq!(params.get("order"), Some("date"));
        assert_eq!(params.get("max"), Some("5"));
    }

    #[test]
    fn test_to_bool() {
        assert!(to_bool(Some("true")));
        assert!(to_bool(Some("YES")));
        assert!(to_bool(Some("1")));
        assert!(!to_bool(Some("no")));
        assert!(!to_bool(Some("")));
        assert!(!to_bool(None));
    }

    #[test]
    fn test_parse_tags() {
        assert_eq!(
            parse_tags("travel, food ,  travel, , misc  notes"),
            vec!["travel", "food", "misc notes"]
        );
        assert!(parse_tags("").is_empty());
    }
}
