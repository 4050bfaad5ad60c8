//! Shared utility functions.

/// Convert heading or fragment text to an anchor slug.
///
/// Lowercases, collapses whitespace runs to a single underscore, and caps
/// the result at 64 characters.
/// "Getting Started" -> "getting_started"
pub fn slugify(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_run = false;
    for c in text.to_lowercase().chars() {
        if c.is_whitespace() {
            if !in_run {
                out.push('_');
                in_run = true;
            }
        } else {
            out.push(c);
            in_run = false;
        }
    }
    out.chars().take(64).collect()
}

/// Truncate text by accumulated display width, appending an ellipsis when
/// anything was cut off.
///
/// Code points below 0x200 score 1.0, below 0x3000 score 1.5, and everything
/// else 2.0, approximating narrow vs. wide glyphs.
pub fn cut_text_by_width(text: &str, width: f64) -> String {
    let mut out = String::new();
    let mut score = 0.0;
    for c in text.chars() {
        let cp = c as u32;
        score += if cp < 0x0200 {
            1.0
        } else if cp < 0x3000 {
            1.5
        } else {
            2.0
        };
        if score > width {
            out.push('…');
            break;
        }
        out.push(c);
    }
    out
}

/// Collapse whitespace runs to single spaces and trim the ends.
pub fn normalize_meta_text(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut in_run = false;
    for c in text.chars() {
        if c.is_whitespace() {
            if !in_run {
                out.push(' ');
                in_run = true;
            }
        } else {
            out.push(c);
            in_run = false;
        }
    }
    out.trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_slugify() {
        assert_eq!(slugify("Getting Started"), "getting_started");
        assert_eq!(slugify("One  Two\tThree"), "one_two_three");
        assert_eq!(slugify("MIXED Case"), "mixed_case");
    }

    #[test]
    fn test_slugify_caps_at_64_chars() {
        let long = "x".repeat(100);
        assert_eq!(slugify(&long).chars().count(), 64);
    }

    #[test]
    fn test_cut_text_by_width_ascii() {
        // 200 ASCII chars at width 160: exactly 160 kept plus the ellipsis
        let text = "a".repeat(200);
        let cut = cut_text_by_width(&text, 160.0);
        assert_eq!(cut.chars().count(), 161);
        assert!(cut.ends_with('…'));
    }

    #[test]
    fn test_cut_text_by_width_exact_fit() {
        let text = "a".repeat(160);
        let cut = cut_text_by_width(&text, 160.0);
        assert_eq!(cut, text);
        assert!(!cut.ends_with('…'));
    }

    #[test]
    fn test_cut_text_by_width_wide_chars() {
        // Ideographic chars score 2.0 each, so only two fit in width 4
        let cut = cut_text_by_width("日本語文", 4.0);
        assert_eq!(cut, "日本…");
    }

    #[test]
    fn test_normalize_meta_text() {
        assert_eq!(normalize_meta_text("  a   b\t c "), "a b c");
        assert_eq!(normalize_meta_text(""), "");
    }
}
