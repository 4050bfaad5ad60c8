//! The site builder: orchestrates the scan, render, and write passes.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use crate::config::Config;

use super::aggregate::{self, SiteIndex, step_links};
use super::article::{self, Article, OUTPUT_EXT};
use super::render::{self, GENERATOR_NAME, RenderError, Renderer};
use super::section::organize_sections;

/// File name of the site-wide table-of-contents record list.
pub const TOC_FILE_NAME: &str = "__toc__.tsv";

#[derive(thiserror::Error, Debug)]
pub enum BuildError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),

    #[error("render error: {0}")]
    Render(#[from] RenderError),

    #[error("no articles found in {0}")]
    NoInput(PathBuf),

    #[error("refusing to overwrite {0}: not generated by this tool")]
    Overwrite(PathBuf),
}

#[derive(Debug)]
pub struct BuildResult {
    pub output_dir: PathBuf,
    pub articles: usize,
}

pub struct Builder {
    config: Config,
}

impl Builder {
    pub fn new(config: Config) -> Self {
        Self { config }
    }

    /// Build the site. A non-empty focus set restricts rendering to those
    /// stems; the metadata scan always covers the whole input directory so
    /// links, step chains, and the TOC stay complete.
    pub fn build(&self, focus: &HashSet<String>) -> Result<BuildResult, BuildError> {
        let config = &self.config;
        let articles = article::scan_input_dir(&config.input_dir, &HashSet::new())?;
        if articles.is_empty() {
            return Err(BuildError::NoInput(config.input_dir.clone()));
        }
        for stem in focus {
            if !articles.iter().any(|a| a.stem == *stem) {
                eprintln!("Warning: no such article: {}", stem);
            }
        }
        let index = SiteIndex::build(&articles);
        let renderer = Renderer::new()?;

        std::fs::create_dir_all(&config.output_dir)?;
        self.copy_assets()?;
        if focus.is_empty() {
            self.clean_stale_outputs(&articles)?;
        }

        let mut generated = 0;
        for current in &articles {
            if !focus.is_empty() && !focus.contains(&current.stem) {
                continue;
            }
            let output_path = config.output_dir.join(current.output_name());
            if output_path.exists() && !is_generated_file(&output_path) {
                return Err(BuildError::Overwrite(output_path));
            }
            println!("Generating {}", output_path.display());
            let html = self.render_article(&renderer, &articles, &index, current)?;
            std::fs::write(&output_path, html)?;
            generated += 1;
        }

        if focus.is_empty() {
            let toc_path = config.output_dir.join(TOC_FILE_NAME);
            std::fs::write(&toc_path, aggregate::toc_records(&articles))?;
        }

        Ok(BuildResult {
            output_dir: config.output_dir.clone(),
            articles: generated,
        })
    }

    fn render_article(
        &self,
        renderer: &Renderer,
        articles: &[Article],
        index: &SiteIndex,
        current: &Article,
    ) -> Result<String, BuildError> {
        let config = &self.config;
        let lines = article::load_article_lines(&current.path)?;
        let blocks = organize_sections(&lines);
        let content = render::render_body(config, articles, index, current, &blocks);
        let description = match current.description.as_deref() {
            Some(desc) if !desc.is_empty() => desc.to_string(),
            _ => aggregate::auto_description(&blocks, config.description_width),
        };
        let (prev, next) = match config.step_order {
            Some(order) => step_links(articles, current, order),
            None => (None, None),
        };
        let context = render::page_context(config, current, &description, prev, next, content);
        Ok(renderer.render_page(&context)?)
    }

    /// Copy the configured stylesheet and script next to the pages.
    fn copy_assets(&self) -> Result<(), BuildError> {
        let config = &self.config;
        for asset in [&config.style_file, &config.script_file].into_iter().flatten() {
            if let Some(name) = asset.file_name() {
                std::fs::copy(asset, config.output_dir.join(name))?;
            }
        }
        Ok(())
    }

    /// Delete previously generated pages whose source article is gone.
    /// Only files carrying the generator marker (or empty ones) qualify.
    fn clean_stale_outputs(&self, articles: &[Article]) -> Result<(), BuildError> {
        let stems: HashSet<&str> = articles.iter().map(|a| a.stem.as_str()).collect();
        for entry in std::fs::read_dir(&self.config.output_dir)? {
            let entry = entry?;
            let name = entry.file_name().to_string_lossy().to_string();
            let Some(stem) = name.strip_suffix(OUTPUT_EXT) else {
                continue;
            };
            if stems.contains(stem) {
                continue;
            }
            let path = entry.path();
            if is_generated_file(&path) {
                println!("Deleting stale {}", path.display());
                std::fs::remove_file(&path)?;
            }
        }
        Ok(())
    }
}

/// True when the file was generated by this tool (or is empty).
pub fn is_generated_file(path: &Path) -> bool {
    match std::fs::read_to_string(path) {
        Ok(content) => {
            content.is_empty()
                || content.contains(&format!(
                    "name=\"generator\" content=\"{}\"",
                    GENERATOR_NAME
                ))
        }
        Err(_) => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    fn site() -> (tempfile::TempDir, Config) {
        let dir = tempfile::tempdir().unwrap();
        let mut config = Config::for_tests();
        config.input_dir = dir.path().join("input");
        config.output_dir = dir.path().join("output");
        std::fs::create_dir_all(&config.input_dir).unwrap();
        (dir, config)
    }

    fn write_article(config: &Config, name: &str, content: &str) {
        let path = config.input_dir.join(name);
        let mut file = std::fs::File::create(&path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
    }

    #[test]
    fn test_build_generates_pages_and_toc() {
        let (_dir, config) = site();
        write_article(&config, "alpha.art", "@title Alpha\n@date 2024/01/02\n\nhello\n");
        write_article(&config, "beta.art", "@title Beta\n\nworld\n");
        let result = Builder::new(config.clone()).build(&HashSet::new()).unwrap();
        assert_eq!(result.articles, 2);

        let alpha = std::fs::read_to_string(config.output_dir.join("alpha.xhtml")).unwrap();
        assert!(alpha.contains("<title>Alpha</title>"));
        assert!(alpha.contains("name=\"generator\" content=\"arto\""));
        assert!(alpha.contains("hello"));

        let toc = std::fs::read_to_string(config.output_dir.join(TOC_FILE_NAME)).unwrap();
        assert_eq!(toc, "alpha\tAlpha\t2024/01/02\t\nbeta\tBeta\t\t\n");
    }

    #[test]
    fn test_build_empty_input_fails() {
        let (_dir, config) = site();
        let err = Builder::new(config).build(&HashSet::new()).unwrap_err();
        assert!(matches!(err, BuildError::NoInput(_)));
    }

    #[test]
    fn test_focus_restricts_rendering() {
        let (_dir, config) = site();
        write_article(&config, "alpha.art", "@title Alpha\n");
        write_article(&config, "beta.art", "@title Beta\n");
        let focus: HashSet<String> = ["beta".to_string()].into();
        let result = Builder::new(config.clone()).build(&focus).unwrap();
        assert_eq!(result.articles, 1);
        assert!(!config.output_dir.join("alpha.xhtml").exists());
        assert!(config.output_dir.join("beta.xhtml").exists());
        // a focused build leaves the TOC alone
        assert!(!config.output_dir.join(TOC_FILE_NAME).exists());
    }

    #[test]
    fn test_refuses_to_overwrite_foreign_file() {
        let (_dir, config) = site();
        write_article(&config, "alpha.art", "@title Alpha\n");
        std::fs::create_dir_all(&config.output_dir).unwrap();
        std::fs::write(config.output_dir.join("alpha.xhtml"), "hand-written page").unwrap();
        let err = Builder::new(config).build(&HashSet::new()).unwrap_err();
        assert!(matches!(err, BuildError::Overwrite(_)));
    }

    #[test]
    fn test_overwrites_own_output() {
        let (_dir, config) = site();
        write_article(&config, "alpha.art", "@title Alpha\n\nfirst\n");
        Builder::new(config.clone()).build(&HashSet::new()).unwrap();
        write_article(&config, "alpha.art", "@title Alpha\n\nsecond\n");
        Builder::new(config.clone()).build(&HashSet::new()).unwrap();
        let html = std::fs::read_to_string(config.output_dir.join("alpha.xhtml")).unwrap();
        assert!(html.contains("second"));
    }

    #[test]
    fn test_stale_generated_output_removed() {
        let (_dir, config) = site();
        write_article(&config, "alpha.art", "@title Alpha\n");
        std::fs::create_dir_all(&config.output_dir).unwrap();
        let stale = config.output_dir.join("gone.xhtml");
        std::fs::write(&stale, "<meta name=\"generator\" content=\"arto\"/>").unwrap();
        let foreign = config.output_dir.join("keep.xhtml");
        std::fs::write(&foreign, "hand-written page").unwrap();
        Builder::new(config).build(&HashSet::new()).unwrap();
        assert!(!stale.exists());
        assert!(foreign.exists());
    }

    #[test]
    fn test_assets_copied() {
        let (dir, mut config) = site();
        let style = dir.path().join("site.css");
        std::fs::write(&style, "body {}").unwrap();
        config.style_file = Some(style);
        write_article(&config, "alpha.art", "@title Alpha\n");
        Builder::new(config.clone()).build(&HashSet::new()).unwrap();
        assert!(config.output_dir.join("site.css").exists());
        let html = std::fs::read_to_string(config.output_dir.join("alpha.xhtml")).unwrap();
        assert!(html.contains("href=\"./site.css\""));
    }

    #[test]
    fn test_internal_links_resolve_across_articles() {
        let (_dir, config) = site();
        write_article(&config, "alpha.art", "@title Alpha\n\nsee [[Beta]]\n");
        write_article(&config, "beta.art", "@title Beta\n");
        Builder::new(config.clone()).build(&HashSet::new()).unwrap();
        let alpha = std::fs::read_to_string(config.output_dir.join("alpha.xhtml")).unwrap();
        assert!(alpha.contains("<a href=\"./beta.xhtml\" class=\"internal\">Beta</a>"));
    }

    #[test]
    fn test_step_links_rendered_when_ordered() {
        let (_dir, mut config) = site();
        config.step_order = Some(crate::build::aggregate::StepOrder::Filename);
        write_article(&config, "a.art", "@title First\n");
        write_article(&config, "b.art", "@title Second\n");
        Builder::new(config.clone()).build(&HashSet::new()).unwrap();
        let first = std::fs::read_to_string(config.output_dir.join("a.xhtml")).unwrap();
        assert!(first.contains("step_next"));
        assert!(first.contains("Second"));
        assert!(!first.contains("step_prev"));
    }
}
