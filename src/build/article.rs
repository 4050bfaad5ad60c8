//! Article metadata records and input-directory scanning.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use super::attrs::Params;

/// Input file extension for articles.
pub const ARTICLE_EXT: &str = ".art";
/// Output file extension for generated pages.
pub const OUTPUT_EXT: &str = ".xhtml";

static FENCE_OPEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(>+)\|([a-z]*)\|$").unwrap());
static DATE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^\d{4}/\d{2}/\d{2}( \d{2}:\d{2}:\d{2})?$").unwrap());

/// Metadata for one source article. Created by the input scan, read-only for
/// the rest of the run.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Article {
    /// File stem, e.g. "intro" for "intro.art"
    pub stem: String,
    /// Source file name, e.g. "intro.art"
    pub name: String,
    /// Full source path
    pub path: PathBuf,
    /// Declared `@title`, if any
    pub title: Option<String>,
    /// Declared `@date`, if any
    pub date: Option<String>,
    /// Raw `@tags` string (comma-separated)
    pub tags: Option<String>,
    /// Raw `@misc` string (comma-separated flags like notoc, noshare)
    pub misc: Option<String>,
    /// Declared `@desc`, if any; otherwise a description is auto-generated
    pub description: Option<String>,
    /// URL of the first `@image` directive, used for preview metadata
    pub top_image_url: Option<String>,
}

impl Article {
    /// Output file name, e.g. "intro.xhtml".
    pub fn output_name(&self) -> String {
        format!("{}{}", self.stem, OUTPUT_EXT)
    }

    /// Title for display, falling back to the file stem.
    pub fn title_or_stem(&self) -> &str {
        match self.title.as_deref() {
            Some(t) if !t.is_empty() => t,
            _ => &self.stem,
        }
    }

    /// Parsed `@misc` flags.
    pub fn misc_flags(&self) -> Vec<String> {
        super::attrs::parse_tags(self.misc.as_deref().unwrap_or(""))
    }

    /// True if the article opts out of tables of contents and step links.
    pub fn is_notoc(&self) -> bool {
        self.misc_flags().iter().any(|f| f == "notoc")
    }
}

/// Scan one article file for its metadata directives.
///
/// The first occurrence of each directive wins, and preformatted fences are
/// skipped so fenced sample text cannot declare metadata.
pub fn read_article_metadata(path: &Path) -> Result<Article, std::io::Error> {
    let content = std::fs::read_to_string(path)?;
    let mut article = Article {
        path: path.to_path_buf(),
        ..Article::default()
    };
    let mut end_pre_line: Option<String> = None;
    for line in content.lines() {
        let line = line.trim_end();
        if let Some(close) = &end_pre_line {
            if line == close {
                end_pre_line = None;
            }
            continue;
        }
        if let Some(caps) = FENCE_OPEN_RE.captures(line) {
            end_pre_line = Some(format!("||{}", "<".repeat(caps[1].len())));
            continue;
        }
        if let Some(rest) = directive_value(line, "title") {
            article.title.get_or_insert_with(|| rest.to_string());
        } else if let Some(rest) = directive_value(line, "date") {
            article.date.get_or_insert_with(|| rest.to_string());
        } else if let Some(rest) = directive_value(line, "tags") {
            article.tags.get_or_insert_with(|| rest.to_string());
        } else if let Some(rest) = directive_value(line, "misc") {
            article.misc.get_or_insert_with(|| rest.to_string());
        } else if let Some(rest) = directive_value(line, "desc") {
            article.description.get_or_insert_with(|| rest.to_string());
        } else if let Some(rest) = directive_value(line, "image") {
            if article.top_image_url.is_none() {
                let first = rest.split('|').next().unwrap_or("");
                let url = Params::parse(first).value;
                if !url.is_empty() {
                    article.top_image_url = Some(url);
                }
            }
        }
    }
    if let Some(date) = &article.date
        && !DATE_RE.is_match(date)
    {
        eprintln!("Warning: invalid date format: {}: {}", path.display(), date);
    }
    Ok(article)
}

/// Extract the value of a `@name value` directive line.
fn directive_value<'a>(line: &'a str, name: &str) -> Option<&'a str> {
    let rest = line.strip_prefix('@')?.strip_prefix(name)?;
    let rest = rest.strip_prefix(' ')?;
    let rest = rest.trim();
    if rest.is_empty() { None } else { Some(rest) }
}

/// Scan the input directory for article files.
///
/// Hidden files and non-`.art` files are skipped; a non-empty focus set
/// restricts the scan to those stems. Results are sorted by source path.
pub fn scan_input_dir(
    input_dir: &Path,
    focus_stems: &HashSet<String>,
) -> Result<Vec<Article>, std::io::Error> {
    let mut articles = Vec::new();
    for entry in std::fs::read_dir(input_dir)? {
        let entry = entry?;
        let name = entry.file_name().to_string_lossy().to_string();
        if name.starts_with('.') {
            continue;
        }
        let Some(stem) = name.strip_suffix(ARTICLE_EXT) else {
            continue;
        };
        if !focus_stems.is_empty() && !focus_stems.contains(stem) {
            continue;
        }
        let mut article = read_article_metadata(&entry.path())?;
        article.stem = stem.to_string();
        article.name = name;
        articles.push(article);
    }
    articles.sort_by(|a, b| a.path.cmp(&b.path));
    Ok(articles)
}

/// Load an article's lines for rendering, replacing every whitespace
/// character with a plain space and stripping trailing whitespace.
pub fn load_article_lines(path: &Path) -> Result<Vec<String>, std::io::Error> {
    let content = std::fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(|line| {
            line.trim_end()
                .chars()
                .map(|c| if c.is_whitespace() { ' ' } else { c })
                .collect()
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_article(dir: &Path, name: &str, content: &str) -> PathBuf {
        let path = dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        path
    }

    #[test]
    fn test_read_article_metadata_first_wins() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_article(
            dir.path(),
            "a.art",
            "@title First\n@date 2024/01/02\n@title Second\n@tags x, y\n@misc notoc\n",
        );
        let article = read_article_metadata(&path).unwrap();
        assert_eq!(article.title.as_deref(), Some("First"));
        assert_eq!(article.date.as_deref(), Some("2024/01/02"));
        assert_eq!(article.tags.as_deref(), Some("x, y"));
        assert!(article.is_notoc());
    }

    #[test]
    fn test_read_article_metadata_skips_fences() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_article(
            dir.path(),
            "a.art",
            ">|txt|\n@title Fenced\n||<\n@title Real\n",
        );
        let article = read_article_metadata(&path).unwrap();
        assert_eq!(article.title.as_deref(), Some("Real"));
    }

    #[test]
    fn test_read_article_metadata_top_image() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_article(
            dir.path(),
            "a.art",
            "@image pic.jpg [caption=hello]|other.jpg\n@image second.jpg\n",
        );
        let article = read_article_metadata(&path).unwrap();
        assert_eq!(article.top_image_url.as_deref(), Some("pic.jpg"));
    }

    #[test]
    fn test_scan_input_dir_sorted_and_filtered() {
        let dir = tempfile::tempdir().unwrap();
        write_article(dir.path(), "b.art", "@title B\n");
        write_article(dir.path(), "a.art", "@title A\n");
        write_article(dir.path(), ".hidden.art", "@title H\n");
        write_article(dir.path(), "notes.txt", "not an article\n");

        let all = scan_input_dir(dir.path(), &HashSet::new()).unwrap();
        let stems: Vec<&str> = all.iter().map(|a| a.stem.as_str()).collect();
        assert_eq!(stems, vec!["a", "b"]);

        let focus: HashSet<String> = ["b".to_string()].into();
        let some = scan_input_dir(dir.path(), &focus).unwrap();
        assert_eq!(some.len(), 1);
        assert_eq!(some[0].stem, "b");
    }

    #[test]
    fn test_load_article_lines_normalizes_whitespace() {
        let dir = tempfile::tempdir().unwrap();
        let path = write_article(dir.path(), "a.art", "a\tb  \nplain\n");
        let lines = load_article_lines(&path).unwrap();
        assert_eq!(lines, vec!["a b", "plain"]);
    }

    #[test]
    fn test_output_name() {
        let article = Article {
            stem: "intro".into(),
            name: "intro.art".into(),
            ..Article::default()
        };
        assert_eq!(article.output_name(), "intro.xhtml");
    }
}
