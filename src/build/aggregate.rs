//! Site-wide aggregation: the link index, tag index, step-link ordering,
//! auto-generated descriptions, and the table-of-contents record list.

use std::collections::HashMap;

use crate::util::{cut_text_by_width, normalize_meta_text};

use super::article::Article;
use super::attrs::parse_tags;
use super::inline::plain_text;
use super::section::Block;

/// Site-wide index from normalized keys to articles.
///
/// Two key families coexist: `"filename:" + stem` (always present, unique)
/// and the lowercased declared title. When several articles share a
/// lowercased title, the first keeps the bare key and later ones get an
/// ` (N)` suffix, in input-scan order.
#[derive(Debug, Default)]
pub struct SiteIndex {
    map: HashMap<String, Article>,
}

impl SiteIndex {
    pub fn build(articles: &[Article]) -> Self {
        let mut map: HashMap<String, Article> = HashMap::new();
        let mut title_counts: HashMap<String, usize> = HashMap::new();
        for article in articles {
            map.insert(format!("filename:{}", article.stem), article.clone());
            let Some(title) = article.title.as_deref() else {
                continue;
            };
            if title.is_empty() {
                continue;
            }
            let base = title.to_lowercase();
            let count = title_counts.entry(base.clone()).or_insert(0);
            *count += 1;
            let key = if *count > 1 {
                format!("{} ({})", base, count)
            } else {
                base
            };
            map.entry(key).or_insert_with(|| article.clone());
        }
        SiteIndex { map }
    }

    pub fn get(&self, key: &str) -> Option<&Article> {
        self.map.get(key)
    }
}

/// Tag index: tag string to the articles declaring it, in scan order.
#[derive(Debug, Default)]
pub struct TagIndex {
    entries: Vec<(String, Vec<usize>)>,
}

impl TagIndex {
    pub fn build(articles: &[Article]) -> Self {
        let mut entries: Vec<(String, Vec<usize>)> = Vec::new();
        let mut positions: HashMap<String, usize> = HashMap::new();
        for (i, article) in articles.iter().enumerate() {
            for tag in parse_tags(article.tags.as_deref().unwrap_or("")) {
                match positions.get(&tag) {
                    Some(&pos) => entries[pos].1.push(i),
                    None => {
                        positions.insert(tag.clone(), entries.len());
                        entries.push((tag, vec![i]));
                    }
                }
            }
        }
        TagIndex { entries }
    }

    /// Entries ordered by descending article count, then ascending tag name.
    pub fn sorted(&self) -> Vec<(&str, &[usize])> {
        let mut out: Vec<(&str, &[usize])> = self
            .entries
            .iter()
            .map(|(tag, indices)| (tag.as_str(), indices.as_slice()))
            .collect();
        out.sort_by(|a, b| b.1.len().cmp(&a.1.len()).then_with(|| a.0.cmp(b.0)));
        out
    }
}

/// Primary field for step-link and site-TOC ordering.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepOrder {
    Filename,
    Date,
    Title,
}

impl StepOrder {
    pub fn parse(expr: &str) -> Option<Self> {
        match expr {
            "filename" => Some(StepOrder::Filename),
            "date" => Some(StepOrder::Date),
            "title" => Some(StepOrder::Title),
            _ => None,
        }
    }
}

/// Total-order key for an article under the given ordering, or None when the
/// article is not eligible (missing the primary field or flagged notoc).
fn step_key(article: &Article, order: StepOrder) -> Option<String> {
    if article.is_notoc() {
        return None;
    }
    match order {
        StepOrder::Filename => Some(article.name.clone()),
        StepOrder::Date => {
            let date = article.date.as_deref().filter(|d| !d.is_empty())?;
            Some(format!("{}\0{}", date, article.name))
        }
        StepOrder::Title => {
            let title = article.title.as_deref().filter(|t| !t.is_empty())?;
            Some(format!("{}\0{}", title, article.name))
        }
    }
}

/// Previous/next articles in the total order over eligible articles.
///
/// The predecessor is the article with the greatest key strictly less than
/// the current key; the successor the least key strictly greater. Ineligible
/// articles neither appear nor interrupt the chain.
pub fn step_links<'a>(
    articles: &'a [Article],
    current: &Article,
    order: StepOrder,
) -> (Option<&'a Article>, Option<&'a Article>) {
    let Some(self_key) = step_key(current, order) else {
        return (None, None);
    };
    let mut prev: Option<(&Article, String)> = None;
    let mut next: Option<(&Article, String)> = None;
    for sibling in articles {
        if sibling.stem == current.stem {
            continue;
        }
        let Some(key) = step_key(sibling, order) else {
            continue;
        };
        if key < self_key && prev.as_ref().is_none_or(|(_, k)| key > *k) {
            prev = Some((sibling, key));
        } else if key > self_key && next.as_ref().is_none_or(|(_, k)| key < *k) {
            next = Some((sibling, key));
        }
    }
    (prev.map(|(a, _)| a), next.map(|(a, _)| a))
}

/// Synthesize a description from the page content when none is declared.
///
/// Concatenates the plain text of headings, paragraphs (column paragraphs
/// included), and preformatted blocks in document order, collapses
/// whitespace, and truncates by display width.
pub fn auto_description(blocks: &[Block], width: f64) -> String {
    let mut parts: Vec<String> = Vec::new();
    for block in blocks {
        match block {
            Block::Heading { text, .. } => parts.push(plain_text(text)),
            Block::Paragraph { lines, .. } => {
                for (i, line) in lines.iter().enumerate() {
                    // column paragraphs contribute their caption and body
                    if i == 0
                        && let Some((_, caption, rest)) = super::section::split_column_marker(line)
                    {
                        parts.push(plain_text(&caption));
                        parts.push(plain_text(&rest));
                        continue;
                    }
                    parts.push(plain_text(line));
                }
            }
            Block::Preformatted { lines, .. } => {
                for line in lines {
                    parts.push(line.clone());
                }
            }
            _ => {}
        }
    }
    let joined = normalize_meta_text(&parts.join(" "));
    cut_text_by_width(&joined, width)
}

/// The site-wide table-of-contents record list: one tab-separated line per
/// article in scan order, `stem, truncated title, date, comma-joined tags`.
pub fn toc_records(articles: &[Article]) -> String {
    let mut out = String::new();
    for article in articles {
        let title = article.title.as_deref().unwrap_or("");
        let short_title: String = if title.chars().count() > 64 {
            let mut t: String = title.chars().take(64).collect();
            t.push('…');
            t
        } else {
            title.to_string()
        };
        let date: String = article
            .date
            .as_deref()
            .unwrap_or("")
            .chars()
            .take(32)
            .collect();
        let tags = parse_tags(article.tags.as_deref().unwrap_or(""));
        out.push_str(&format!(
            "{}\t{}\t{}\t{}\n",
            article.stem,
            short_title,
            date,
            tags.join(",")
        ));
    }
    out
}
