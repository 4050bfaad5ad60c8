//! Site configuration: a flat `key: value` file next to the content.

use std::path::{Path, PathBuf};
use std::sync::LazyLock;

use regex::Regex;

use crate::build::aggregate::StepOrder;

static CONFIG_LINE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^([-_a-zA-Z0-9]+) *: *([^ ].*)$").unwrap());

const DEFAULT_DESCRIPTION_WIDTH: f64 = 160.0;

#[derive(thiserror::Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file {0}: {1}")]
    Read(PathBuf, std::io::Error),

    #[error("missing required config field: {0}")]
    MissingField(&'static str),
}

/// Parsed site configuration. Paths are resolved relative to the directory
/// containing the config file.
#[derive(Debug, Clone)]
pub struct Config {
    /// Site title, shown in the page chrome and as the untitled-page fallback.
    pub title: String,
    /// Optional subtitle shown beside the site title.
    pub subtitle: Option<String>,
    /// Absolute URL of the published site, used for share links.
    pub site_url: String,
    /// BCP 47 language tag for the generated pages.
    pub language: String,
    /// Directory scanned for article files.
    pub input_dir: PathBuf,
    /// Directory the generated pages are written to.
    pub output_dir: PathBuf,
    /// Stylesheet copied into the output directory and linked from each page.
    pub style_file: Option<PathBuf>,
    /// Script copied into the output directory and loaded by each page.
    pub script_file: Option<PathBuf>,
    /// Extra `name|content` meta pairs emitted into each page head.
    pub extra_meta: Vec<String>,
    /// Share button identifiers, e.g. `twitter`, `line`.
    pub share_buttons: Vec<String>,
    /// Endpoint of the external comment service, if any.
    pub comment_url: Option<String>,
    /// Endpoint of the external search service, if any.
    pub search_url: Option<String>,
    /// Ordering for prev/next step links; unset disables the step link area.
    pub step_order: Option<StepOrder>,
    /// Display-width cap for auto-generated descriptions.
    pub description_width: f64,
}

impl Config {
    /// Load and validate a config file.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content =
            std::fs::read_to_string(path).map_err(|e| ConfigError::Read(path.to_path_buf(), e))?;
        let base_dir = path.parent().unwrap_or(Path::new(".")).to_path_buf();

        let mut title = None;
        let mut subtitle = None;
        let mut site_url = None;
        let mut language = None;
        let mut input_dir = None;
        let mut output_dir = None;
        let mut style_file = None;
        let mut script_file = None;
        let mut extra_meta = Vec::new();
        let mut share_buttons = Vec::new();
        let mut comment_url = None;
        let mut search_url = None;
        let mut step_order = None;
        let mut description_width = DEFAULT_DESCRIPTION_WIDTH;

        for line in content.lines() {
            let line = line.trim_end();
            if line.is_empty() || line.starts_with('#') {
                continue;
            }
            let Some(caps) = CONFIG_LINE_RE.captures(line) else {
                eprintln!("Warning: invalid config line: {}", line);
                continue;
            };
            let value = caps[2].trim().to_string();
            match &caps[1] {
                "title" => title = Some(value),
                "subtitle" => subtitle = Some(value),
                "site-url" => site_url = Some(value),
                "language" => language = Some(value),
                "input-dir" => input_dir = Some(base_dir.join(value)),
                "output-dir" => output_dir = Some(base_dir.join(value)),
                "style-file" => style_file = Some(base_dir.join(value)),
                "script-file" => script_file = Some(base_dir.join(value)),
                "extra-meta" => extra_meta.push(value),
                "share-button" => share_buttons.push(value),
                "comment-url" => comment_url = Some(value),
                "search-url" => search_url = Some(value),
                "step-order" => match StepOrder::parse(&value) {
                    Some(order) => step_order = Some(order),
                    None => eprintln!("Warning: invalid step-order: {}", value),
                },
                "description-width" => match value.parse::<f64>() {
                    Ok(w) if w > 0.0 => description_width = w,
                    _ => eprintln!("Warning: invalid description-width: {}", value),
                },
                name => eprintln!("Warning: unknown config field: {}", name),
            }
        }

        Ok(Config {
            title: title.ok_or(ConfigError::MissingField("title"))?,
            subtitle,
            site_url: site_url.ok_or(ConfigError::MissingField("site-url"))?,
            language: language.ok_or(ConfigError::MissingField("language"))?,
            input_dir: input_dir.ok_or(ConfigError::MissingField("input-dir"))?,
            output_dir: output_dir.ok_or(ConfigError::MissingField("output-dir"))?,
            style_file,
            script_file,
            extra_meta,
            share_buttons,
            comment_url,
            search_url,
            step_order,
            description_width,
        })
    }

    #[cfg(test)]
    pub fn for_tests() -> Self {
        Config {
            title: "Test Site".to_string(),
            subtitle: None,
            site_url: "https://example.com/".to_string(),
            language: "en".to_string(),
            input_dir: PathBuf::from("input"),
            output_dir: PathBuf::from("output"),
            style_file: None,
            script_file: None,
            extra_meta: Vec::new(),
            share_buttons: Vec::new(),
            comment_url: None,
            search_url: None,
            step_order: None,
            description_width: DEFAULT_DESCRIPTION_WIDTH,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn write_config(content: &str) -> (tempfile::TempDir, PathBuf) {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("arto.conf");
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        (dir, path)
    }

    const MINIMAL: &str = "title: My Site\n\
                           site-url: https://example.com/\n\
                           language: en\n\
                           input-dir: input\n\
                           output-dir: output\n";

    #[test]
    fn test_minimal_config() {
        let (dir, path) = write_config(MINIMAL);
        let config = Config::load(&path).unwrap();
        assert_eq!(config.title, "My Site");
        assert_eq!(config.language, "en");
        assert_eq!(config.input_dir, dir.path().join("input"));
        assert_eq!(config.output_dir, dir.path().join("output"));
        assert!(config.subtitle.is_none());
        assert!(config.step_order.is_none());
        assert_eq!(config.description_width, DEFAULT_DESCRIPTION_WIDTH);
    }

    #[test]
    fn test_missing_required_field() {
        let (_dir, path) = write_config("title: Only a Title\n");
        let err = Config::load(&path).unwrap_err();
        assert!(matches!(err, ConfigError::MissingField("site-url")));
    }

    #[test]
    fn test_accumulating_fields() {
        let content = format!(
            "{}extra-meta: author|me\nextra-meta: robots|noindex\n\
             share-button: twitter\nshare-button: line\n",
            MINIMAL
        );
        let (_dir, path) = write_config(&content);
        let config = Config::load(&path).unwrap();
        assert_eq!(config.extra_meta, vec!["author|me", "robots|noindex"]);
        assert_eq!(config.share_buttons, vec!["twitter", "line"]);
    }

    #[test]
    fn test_step_order_and_width() {
        let content = format!("{}step-order: date\ndescription-width: 200\n", MINIMAL);
        let (_dir, path) = write_config(&content);
        let config = Config::load(&path).unwrap();
        assert_eq!(config.step_order, Some(StepOrder::Date));
        assert_eq!(config.description_width, 200.0);
    }

    #[test]
    fn test_invalid_values_fall_back() {
        let content = format!(
            "{}step-order: sideways\ndescription-width: minus\n# comment\nnot a line\n",
            MINIMAL
        );
        let (_dir, path) = write_config(&content);
        let config = Config::load(&path).unwrap();
        assert!(config.step_order.is_none());
        assert_eq!(config.description_width, DEFAULT_DESCRIPTION_WIDTH);
    }

    #[test]
    fn test_comment_and_search_urls() {
        let content = format!(
            "{}comment-url: https://c.example.com/\nsearch-url: https://s.example.com/\n",
            MINIMAL
        );
        let (_dir, path) = write_config(&content);
        let config = Config::load(&path).unwrap();
        assert_eq!(config.comment_url.as_deref(), Some("https://c.example.com/"));
        assert_eq!(config.search_url.as_deref(), Some("https://s.example.com/"));
    }
}
