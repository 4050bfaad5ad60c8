//! Article body rendering and the page template wrapper.

use std::collections::HashMap;

use serde::Serialize;
use tera::{Context, Tera};

use crate::config::Config;
use crate::util::{cut_text_by_width, slugify};

use super::aggregate::SiteIndex;
use super::article::Article;
use super::directive::{self, DirectiveContext};
use super::escape::esc;
use super::inline::render_text;
use super::links::quote;
use super::section::{Block, Cell, ListItem, split_column_marker};

/// Marker emitted into every generated page; the cleaner uses it to tell
/// generated files from hand-placed ones.
pub const GENERATOR_NAME: &str = "arto";

/// Display-width cap for step link titles.
const STEP_TITLE_WIDTH: f64 = 20.0;

#[derive(thiserror::Error, Debug)]
pub enum RenderError {
    #[error("template error: {0}")]
    Template(#[from] tera::Error),
}

/// Heading anchor assignment. Slugs repeat across a page, so each base slug
/// carries a counter and repeats get a `_N` suffix.
#[derive(Debug, Default)]
pub struct HeadingIds {
    counts: HashMap<String, usize>,
}

impl HeadingIds {
    pub fn assign(&mut self, text: &str) -> String {
        let base = slugify(text);
        let count = self.counts.entry(base.clone()).or_insert(0);
        *count += 1;
        if *count > 1 {
            format!("{}_{}", base, count)
        } else {
            base
        }
    }
}

/// Render an article's blocks into the body HTML fragment.
pub fn render_body(
    config: &Config,
    articles: &[Article],
    index: &SiteIndex,
    article: &Article,
    blocks: &[Block],
) -> String {
    let mut out = String::new();
    out.push_str("<article class=\"main\">\n");
    print_title_area(&mut out, article);
    let ctx = DirectiveContext {
        config,
        articles,
        blocks,
    };
    let mut ids = HeadingIds::default();
    for block in blocks {
        match block {
            Block::Heading { level, text } => {
                let head_id = ids.assign(text);
                out.push_str(&format!(
                    "<h{0} id=\"{1}\">{2}</h{0}>\n",
                    level + 2,
                    esc(&head_id),
                    esc(text)
                ));
            }
            Block::List { items } => print_list(&mut out, index, items),
            Block::Table { rows } => print_table(&mut out, index, rows),
            Block::Preformatted { lines, .. } => {
                out.push_str("<pre>");
                for (i, line) in lines.iter().enumerate() {
                    if i > 0 {
                        out.push('\n');
                    }
                    out.push_str(&esc(line));
                }
                out.push_str("</pre>\n");
            }
            Block::Directive { name, params } => {
                directive::dispatch(&mut out, &ctx, name, params);
            }
            Block::Rule { level } => {
                out.push_str(&format!("<hr class=\"hr{}\"/>\n", level));
            }
            Block::Paragraph { quote_level, lines } => {
                print_paragraph(&mut out, index, *quote_level, lines);
            }
        }
    }
    out.push_str("</article>\n");
    out
}

/// Title and date header. The title links to the page itself so copied
/// fragments keep a way back.
fn print_title_area(out: &mut String, article: &Article) {
    let Some(title) = article.title.as_deref().filter(|t| !t.is_empty()) else {
        return;
    };
    out.push_str("<div class=\"page_title_area\">\n");
    out.push_str(&format!(
        "<h1 class=\"page_title\"><a href=\"./{}\">{}</a></h1>\n",
        esc(&quote(&article.output_name())),
        esc(title)
    ));
    if let Some(date) = article.date.as_deref().filter(|d| !d.is_empty()) {
        out.push_str(&format!("<div class=\"page_date\">{}</div>\n", esc(date)));
    }
    out.push_str("</div>\n");
}

/// A list block renders as one container; the first item's marker decides
/// between `<ul>` and `<ol>`.
fn print_list(out: &mut String, index: &SiteIndex, items: &[ListItem]) {
    let Some(first) = items.first() else {
        return;
    };
    let tag = if first.ordered { "ol" } else { "ul" };
    out.push_str(&format!("<{}>\n", tag));
    for item in items {
        out.push_str(&format!("<li class=\"l{}\">", item.depth));
        out.push_str(&render_text(index, &item.text));
        out.push_str("</li>\n");
    }
    out.push_str(&format!("</{}>\n", tag));
}

fn print_table(out: &mut String, index: &SiteIndex, rows: &[Vec<Cell>]) {
    out.push_str("<table>\n");
    for row in rows {
        out.push_str("<tr>");
        for cell in row {
            out.push_str(&cell_open_tag(cell));
            out.push_str(&render_text(index, &cell.text));
            out.push_str("</td>");
        }
        out.push_str("</tr>\n");
    }
    out.push_str("</table>\n");
}

fn cell_open_tag(cell: &Cell) -> String {
    let mut tag = String::from("<td");
    if cell.colspan > 1 {
        tag.push_str(&format!(" colspan=\"{}\"", cell.colspan));
    }
    if cell.rowspan > 1 {
        tag.push_str(&format!(" rowspan=\"{}\"", cell.rowspan));
    }
    let mut class = String::from(if cell.numeric { "num" } else { "str" });
    if cell.header {
        class.push_str(" head");
    }
    if cell.spread {
        class.push_str(" spread");
    }
    tag.push_str(&format!(" class=\"{}\">", class));
    tag
}

/// Paragraphs whose first line opens with `[!caption!]` become collapsible
/// column areas; the rest are plain `<p>` elements with a quote-level class.
fn print_paragraph(out: &mut String, index: &SiteIndex, quote_level: usize, lines: &[String]) {
    let mut lines = lines.to_vec();
    let column = lines.first().and_then(|line| split_column_marker(line));
    if let Some((_, _, rest)) = &column {
        if rest.is_empty() {
            lines.remove(0);
        } else {
            lines[0] = rest.clone();
        }
    }
    if let Some((covert, caption, _)) = &column {
        let state = if *covert { "covert" } else { "overt" };
        out.push_str(&format!("<div class=\"column_area {}\">\n", state));
        out.push_str(&format!(
            "<div class=\"column_header\" onclick=\"toggle_column(this);\">{}</div>\n",
            render_text(index, caption)
        ));
        out.push_str("<div class=\"column_body\">\n");
    }
    if !lines.is_empty() {
        out.push_str(&format!("<p class=\"lv{}\">", quote_level));
        for (i, line) in lines.iter().enumerate() {
            if i > 0 {
                out.push_str("<br/>");
            }
            out.push_str(&render_text(index, line));
        }
        out.push_str("</p>\n");
    }
    if column.is_some() {
        out.push_str("</div>\n</div>\n");
    }
}

/// The template renderer, wrapping Tera with the embedded page template.
pub struct Renderer {
    tera: Tera,
}

impl Renderer {
    pub fn new() -> Result<Self, RenderError> {
        let mut tera = Tera::default();
        tera.add_raw_template("page.html", include_str!("../../templates/page.html"))?;
        Ok(Self { tera })
    }

    /// Render a full page with the given context.
    pub fn render_page(&self, context: &PageContext) -> Result<String, RenderError> {
        let mut tera_context = Context::new();
        tera_context.insert("site", &context.site);
        tera_context.insert("page", &context.page);
        tera_context.insert("content", &context.content);
        Ok(self.tera.render("page.html", &tera_context)?)
    }
}

/// Context passed to the page template.
#[derive(Debug, Serialize)]
pub struct PageContext {
    pub site: SiteContext,
    pub page: PageInfo,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct SiteContext {
    pub title: String,
    pub subtitle: Option<String>,
    pub url: String,
    pub language: String,
    pub style_name: Option<String>,
    pub script_name: Option<String>,
    pub generator: String,
}

#[derive(Debug, Serialize)]
pub struct PageInfo {
    pub stem: String,
    pub output_name: String,
    /// `<title>` text: the article title, or the site title for untitled pages.
    pub page_title: String,
    /// `weak` when the article has its own title, `strong` otherwise.
    pub site_title_subclass: String,
    pub extra_meta: Vec<MetaPair>,
    /// First `@image` URL, emitted as the `og:image` preview property.
    pub top_image: Option<String>,
    pub tags: Vec<String>,
    pub share_buttons: Vec<ShareButton>,
    pub step_prev: Option<StepLink>,
    pub step_next: Option<StepLink>,
    pub comments: Option<CommentArea>,
    pub search_url: Option<String>,
}

#[derive(Debug, Serialize)]
pub struct MetaPair {
    pub name: String,
    pub content: String,
}

#[derive(Debug, Serialize)]
pub struct ShareButton {
    pub kind: String,
    pub page_url: String,
    pub page_title: String,
    pub locale: String,
}

#[derive(Debug, Serialize)]
pub struct StepLink {
    pub url: String,
    pub title: String,
}

#[derive(Debug, Serialize)]
pub struct CommentArea {
    pub comment_url: String,
    pub stem: String,
}

/// Assemble the template context for one article.
pub fn page_context(
    config: &Config,
    article: &Article,
    description: &str,
    step_prev: Option<&Article>,
    step_next: Option<&Article>,
    content: String,
) -> PageContext {
    let has_own_title = article.title.as_deref().is_some_and(|t| !t.is_empty());
    let page_title = if has_own_title {
        article.title_or_stem().to_string()
    } else {
        config.title.clone()
    };

    let mut extra_meta = vec![MetaPair {
        name: "description".to_string(),
        content: description.to_string(),
    }];
    for pair in &config.extra_meta {
        if let Some((name, content)) = pair.split_once('|') {
            extra_meta.push(MetaPair {
                name: name.trim().to_string(),
                content: content.trim().to_string(),
            });
        } else {
            eprintln!("Warning: invalid extra-meta pair: {}", pair);
        }
    }
    extra_meta.push(MetaPair {
        name: "x-arto-title".to_string(),
        content: article.title.clone().unwrap_or_default(),
    });
    extra_meta.push(MetaPair {
        name: "x-arto-date".to_string(),
        content: article.date.clone().unwrap_or_default(),
    });
    extra_meta.push(MetaPair {
        name: "x-arto-misc".to_string(),
        content: article.misc.clone().unwrap_or_default(),
    });
    let misc = article.misc_flags();
    let page_url = format!(
        "{}{}",
        config.site_url,
        quote(&article.output_name())
    );
    let share_buttons = if misc.iter().any(|f| f == "noshare") {
        Vec::new()
    } else {
        config
            .share_buttons
            .iter()
            .map(|kind| ShareButton {
                kind: kind.clone(),
                page_url: page_url.clone(),
                page_title: page_title.clone(),
                locale: if config.language == "ja" {
                    "ja_JP".to_string()
                } else {
                    "en_US".to_string()
                },
            })
            .collect()
    };

    let step_link = |sibling: Option<&Article>| {
        sibling.map(|a| StepLink {
            url: format!("./{}", quote(&a.output_name())),
            title: cut_text_by_width(a.title_or_stem(), STEP_TITLE_WIDTH),
        })
    };

    let comments = config
        .comment_url
        .as_ref()
        .filter(|_| !misc.iter().any(|f| f == "nocomment"))
        .map(|url| CommentArea {
            comment_url: url.clone(),
            stem: article.stem.clone(),
        });

    PageContext {
        site: SiteContext {
            title: config.title.clone(),
            subtitle: config.subtitle.clone(),
            url: config.site_url.clone(),
            language: config.language.clone(),
            style_name: file_name_of(config.style_file.as_deref()),
            script_name: file_name_of(config.script_file.as_deref()),
            generator: GENERATOR_NAME.to_string(),
        },
        page: PageInfo {
            stem: article.stem.clone(),
            output_name: article.output_name(),
            page_title,
            site_title_subclass: if has_own_title { "weak" } else { "strong" }.to_string(),
            extra_meta,
            top_image: article.top_image_url.clone(),
            tags: super::attrs::parse_tags(article.tags.as_deref().unwrap_or("")),
            share_buttons,
            step_prev: step_link(step_prev),
            step_next: step_link(step_next),
            comments,
            search_url: config.search_url.clone(),
        },
        content,
    }
}

fn file_name_of(path: Option<&std::path::Path>) -> Option<String> {
    path.and_then(|p| p.file_name())
        .map(|n| n.to_string_lossy().to_string())
}
