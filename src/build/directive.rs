//! Directive dispatch: per-block `@name` widgets.

use std::sync::LazyLock;

use regex::Regex;

use crate::config::Config;

use super::aggregate::{StepOrder, TagIndex};
use super::article::Article;
use super::attrs::{Params, to_bool};
use super::escape::esc;
use super::links::quote;
use super::render::HeadingIds;
use super::section::Block;

static YOUTUBE_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"[?&]v=([_a-zA-Z0-9]+)([&#]|$)").unwrap());

/// Directive names that carry article metadata and render nothing.
const METADATA_NAMES: &[&str] = &["title", "date", "tags", "misc", "desc"];

/// Everything a directive may need to render.
pub struct DirectiveContext<'a> {
    pub config: &'a Config,
    pub articles: &'a [Article],
    pub blocks: &'a [Block],
}

/// Render one directive block. Unknown names warn and produce no output.
pub fn dispatch(out: &mut String, ctx: &DirectiveContext, name: &str, params: &str) {
    match name {
        "image" => print_image(out, params),
        "video" => print_video(out, params),
        "youtube" => print_youtube(out, params),
        "maps" => print_maps(out, params),
        "site-tags" => print_site_tags(out, ctx.articles),
        "page-toc" => print_page_toc(out, ctx.blocks),
        "site-toc" => print_site_toc(out, ctx.articles, params),
        "comment-history" => print_comment_history(out, ctx.config, params),
        "search" => print_search(out, ctx.config, params),
        _ if METADATA_NAMES.contains(&name) => {}
        _ => eprintln!("Warning: unknown directive: @{}", name),
    }
}

/// Common per-column attributes of media embeds.
struct MediaColumn {
    url: String,
    caption: Option<String>,
    width: Option<String>,
    float: Option<String>,
    zoom: Option<String>,
    frill: bool,
}

/// Split a media parameter string into its pipe-separated columns.
fn media_columns(params: &str) -> Vec<MediaColumn> {
    params
        .split('|')
        .map(|column| {
            let attrs = Params::parse(column);
            MediaColumn {
                url: attrs.value.clone(),
                caption: attrs.get("caption").map(String::from),
                width: attrs.get("width").map(String::from),
                float: attrs.get("float").map(String::from),
                zoom: attrs.get("zoom").map(String::from),
                frill: attrs.flag("frill"),
            }
        })
        .collect()
}

/// Style declarations for a media column: width percentage and float side.
fn column_styles(column: &MediaColumn, width_prop: &str) -> String {
    let mut styles = Vec::new();
    if let Some(width) = &column.width {
        let digits: String = width.chars().filter(char::is_ascii_digit).collect();
        if !digits.is_empty() {
            styles.push(format!("{}: {}%", width_prop, digits));
        }
    }
    if let Some(side) = &column.float
        && matches!(side.as_str(), "left" | "right")
    {
        styles.push(format!("float: {}", side));
    }
    styles.join(";")
}

fn print_caption(out: &mut String, kind: &str, count: usize, caption: &Option<String>) {
    if let Some(caption) = caption {
        out.push_str(&format!(
            "<span class=\"{0}_caption {0}_caption{1}\">{2}</span>",
            kind,
            count,
            esc(caption)
        ));
    }
}

fn print_image(out: &mut String, params: &str) {
    out.push_str("<div class=\"image_area\">\n");
    let columns = media_columns(params);
    for column in &columns {
        let mut class = format!("emb_image emb_image{}", columns.len());
        if column.frill {
            class.push_str(" frill");
        }
        out.push_str("<span class=\"image_cell\">");
        print_caption(out, "image", columns.len(), &column.caption);
        out.push_str(&format!(
            "<a href=\"{0}\"><img src=\"{0}\" class=\"{1}\" style=\"{2}\"/></a>",
            esc(&column.url),
            class,
            column_styles(column, "max-width")
        ));
        out.push_str("</span>\n");
    }
    out.push_str("</div>\n");
}

fn print_video(out: &mut String, params: &str) {
    out.push_str("<div class=\"video_area\">\n");
    let columns = media_columns(params);
    for column in &columns {
        out.push_str("<span class=\"video_cell\">");
        print_caption(out, "video", columns.len(), &column.caption);
        out.push_str(&format!(
            "<video src=\"{}\" controls=\"controls\" preload=\"metadata\" \
             class=\"emb_video emb_video{}\" style=\"{}\"/>",
            esc(&column.url),
            columns.len(),
            column_styles(column, "max-width")
        ));
        out.push_str("</span>\n");
    }
    out.push_str("</div>\n");
}

fn print_youtube(out: &mut String, params: &str) {
    out.push_str("<div class=\"youtube_area\">\n");
    let columns = media_columns(params);
    for column in &columns {
        out.push_str("<span class=\"youtube_cell\">");
        print_caption(out, "youtube", columns.len(), &column.caption);
        let url = format!(
            "https://www.youtube-nocookie.com/embed/{}",
            youtube_video_id(&column.url)
        );
        out.push_str(&format!(
            "<iframe src=\"{}\" frameborder=\"0\" class=\"youtube{}\" style=\"{}\"></iframe>",
            esc(&url),
            columns.len(),
            column_styles(column, "width")
        ));
        out.push_str("</span>\n");
    }
    out.push_str("</div>\n");
}

/// The `v=` query parameter of a watch URL, or the URL itself reduced to
/// plausible id characters.
fn youtube_video_id(url: &str) -> String {
    if let Some(caps) = YOUTUBE_ID_RE.captures(url) {
        return caps[1].to_string();
    }
    url.chars()
        .filter(|c| c.is_ascii_alphanumeric() || *c == '_')
        .take(16)
        .collect()
}

fn print_maps(out: &mut String, params: &str) {
    out.push_str("<div class=\"maps_area\">\n");
    let columns = media_columns(params);
    for column in &columns {
        out.push_str("<span class=\"maps_cell\">");
        print_caption(out, "maps", columns.len(), &column.caption);
        let mut url = format!("https://maps.google.co.jp/maps?q={}", quote(&column.url));
        if let Some(zoom) = &column.zoom {
            url.push_str(&format!("&z={}", zoom));
        }
        url.push_str("&output=embed");
        out.push_str(&format!(
            "<iframe src=\"{}\" frameborder=\"0\" class=\"maps{}\" style=\"{}\"></iframe>",
            esc(&url),
            columns.len(),
            column_styles(column, "width")
        ));
        out.push_str("</span>\n");
    }
    out.push_str("</div>\n");
}

/// Site-wide tag index as a definition list, most-used tags first.
fn print_site_tags(out: &mut String, articles: &[Article]) {
    let tag_index = TagIndex::build(articles);
    out.push_str("<dl class=\"site_tags_area\">\n");
    for (tag, indices) in tag_index.sorted() {
        out.push_str(&format!(
            "<dt class=\"site_tags_name\">{} <span class=\"site_tags_count\">({})</span></dt>\n",
            esc(tag),
            indices.len()
        ));
        out.push_str("<dd class=\"site_tags_resources\">");
        for (i, &idx) in indices.iter().enumerate() {
            if i > 0 {
                out.push_str(", ");
            }
            let article = &articles[idx];
            out.push_str(&format!(
                "<a href=\"./{}\" class=\"site_tags_link\">{}</a>",
                esc(&article.output_name()),
                esc(article.title_or_stem())
            ));
        }
        out.push_str("</dd>\n");
    }
    out.push_str("</dl>\n");
}

/// Page-local table of contents. Runs its own heading-id counter with the
/// same algorithm as the body pass, so anchors line up.
fn print_page_toc(out: &mut String, blocks: &[Block]) {
    out.push_str("<ul class=\"page_toc_area\">\n");
    let mut ids = HeadingIds::default();
    for block in blocks {
        let Block::Heading { level, text } = block else {
            continue;
        };
        let head_id = ids.assign(text);
        out.push_str(&format!(
            "<li class=\"pagetoc{}\"><a href=\"#{}\">{}</a></li>\n",
            level,
            esc(&head_id),
            esc(text)
        ));
    }
    out.push_str("</ul>\n");
}

/// Site-wide table of contents, with ordering, reversal, and truncation.
fn print_site_toc(out: &mut String, articles: &[Article], params: &str) {
    out.push_str("<div class=\"site_toc_area\">\n");
    let attrs = Params::parse(params);
    let order = attrs
        .get("order")
        .and_then(StepOrder::parse)
        .unwrap_or(StepOrder::Filename);
    let reverse = to_bool(attrs.get("reverse"));
    let max: usize = attrs.get("max").and_then(|m| m.parse().ok()).unwrap_or(0);

    let mut listed: Vec<&Article> = articles.iter().filter(|a| !a.is_notoc()).collect();
    match order {
        StepOrder::Filename => listed.sort_by(|a, b| a.path.cmp(&b.path)),
        StepOrder::Date => {
            listed.retain(|a| a.date.as_deref().is_some_and(|d| !d.is_empty()));
            listed.sort_by(|a, b| a.date.cmp(&b.date));
        }
        StepOrder::Title => {
            listed.retain(|a| a.title.as_deref().is_some_and(|t| !t.is_empty()));
            listed.sort_by(|a, b| a.title.cmp(&b.title));
        }
    }
    if reverse {
        listed.reverse();
    }
    if max > 0 {
        listed.truncate(max);
    }
    out.push_str("<ul>\n");
    for article in listed {
        out.push_str("<li class=\"site_toc_item\">");
        out.push_str(&format!(
            "<a href=\"./{}\">{}</a>",
            esc(&article.output_name()),
            esc(article.title_or_stem())
        ));
        if let Some(date) = article.date.as_deref().filter(|d| !d.is_empty()) {
            out.push_str(&format!(" <span class=\"attrdate\">({})</span>", esc(date)));
        }
        out.push_str("</li>\n");
    }
    out.push_str("</ul>\n</div>\n");
}

/// Stub widget for the externally-hosted comment history service.
fn print_comment_history(out: &mut String, config: &Config, params: &str) {
    let attrs = Params::parse(params);
    let max: usize = attrs.get("max").and_then(|m| m.parse().ok()).unwrap_or(0);
    let Some(comment_url) = config.comment_url.as_deref() else {
        out.push_str("<div>(@comment-history: comment_url is not set)</div>\n");
        return;
    };
    out.push_str(&format!(
        "<div class=\"comment_history_area\" data-comment-url=\"{}\" data-comment-max=\"{}\"></div>\n",
        esc(comment_url),
        max
    ));
}

/// Stub widget for the externally-hosted full-text search service.
fn print_search(out: &mut String, config: &Config, params: &str) {
    let attrs = Params::parse(params);
    let max: usize = attrs.get("max").and_then(|m| m.parse().ok()).unwrap_or(0);
    let Some(search_url) = config.search_url.as_deref() else {
        out.push_str("<div>(@search: search_url is not set)</div>\n");
        return;
    };
    out.push_str(&format!(
        "<div class=\"search_area\" data-search-url=\"{}\" data-search-max=\"{}\">\n",
        esc(search_url),
        max
    ));
    out.push_str("<form class=\"search_form\" onsubmit=\"search_fulltext(this); return false;\">\n");
    out.push_str("<div class=\"search_line\">\n<span class=\"search_control\">\n");
    out.push_str("<input type=\"text\" class=\"search_query\" value=\"\"/>\n");
    out.push_str("<select class=\"search_order\">\n");
    out.push_str("<option value=\"score\">order: score</option>\n");
    out.push_str("<option value=\"name\">name asc</option>\n");
    out.push_str("<option value=\"name_r\">name desc</option>\n");
    out.push_str("<option value=\"title\">title asc</option>\n");
    out.push_str("<option value=\"title_r\">title desc</option>\n");
    out.push_str("<option value=\"date\">date asc</option>\n");
    out.push_str("<option value=\"date_r\">date desc</option>\n");
    out.push_str("</select>\n");
    out.push_str(
        "<input type=\"button\" class=\"search_search\" value=\"search\" \
         onclick=\"search_fulltext(this);\"/>\n",
    );
    out.push_str("</span>\n</div>\n</form>\n");
    out.push_str("<div class=\"search_result\"></div>\n</div>\n");
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::build::article::Article;

    fn article(stem: &str, title: Option<&str>) -> Article {
        Article {
            stem: stem.to_string(),
            name: format!("{}.art", stem),
            path: format!("input/{}.art", stem).into(),
            title: title.map(String::from),
            ..Article::default()
        }
    }

    fn ctx_parts() -> (Config, Vec<Article>) {
        (Config::for_tests(), Vec::new())
    }

    #[test]
    fn test_image_columns() {
        let mut out = String::new();
        print_image(&mut out, "a.jpg [caption=One] [width=50]|b.jpg");
        assert!(out.contains("<img src=\"a.jpg\" class=\"emb_image emb_image2\""));
        assert!(out.contains("image_caption image_caption2\">One</span>"));
        assert!(out.contains("max-width: 50%"));
        assert!(out.contains("<img src=\"b.jpg\""));
    }

    #[test]
    fn test_image_frill_and_float() {
        let mut out = String::new();
        print_image(&mut out, "a.jpg [frill] [float=right]");
        assert!(out.contains("emb_image1 frill"));
        assert!(out.contains("float: right"));
    }

    #[test]
    fn test_youtube_video_id() {
        assert_eq!(
            youtube_video_id("https://www.youtube.com/watch?v=abc_123&t=9"),
            "abc_123"
        );
        assert_eq!(youtube_video_id("raw-id-text"), "rawidtext");
    }

    #[test]
    fn test_site_toc_order_and_max() {
        let mut a = article("a", Some("Zulu"));
        a.date = Some("2024/01/01".into());
        let mut b = article("b", Some("Alpha"));
        b.date = Some("2024/03/01".into());
        let mut c = article("c", Some("Mike"));
        c.date = Some("2024/02/01".into());
        let articles = vec![a, b, c];

        let mut out = String::new();
        print_site_toc(&mut out, &articles, "[order=date] [reverse=yes] [max=2]");
        let b_pos = out.find("Alpha").unwrap();
        let c_pos = out.find("Mike").unwrap();
        assert!(b_pos < c_pos);
        assert!(!out.contains("Zulu"));
    }

    #[test]
    fn test_site_toc_excludes_notoc() {
        let mut a = article("a", Some("One"));
        a.misc = Some("notoc".into());
        let b = article("b", Some("Two"));
        let mut out = String::new();
        print_site_toc(&mut out, &[a, b], "");
        assert!(!out.contains("One"));
        assert!(out.contains("Two"));
    }

    #[test]
    fn test_site_tags() {
        let mut a = article("a", Some("First"));
        a.tags = Some("travel".into());
        let mut b = article("b", Some("Second"));
        b.tags = Some("travel, food".into());
        let mut out = String::new();
        print_site_tags(&mut out, &[a, b]);
        assert!(out.contains("travel <span class=\"site_tags_count\">(2)</span>"));
        assert!(out.contains("food <span class=\"site_tags_count\">(1)</span>"));
        assert!(out.contains("<a href=\"./a.xhtml\" class=\"site_tags_link\">First</a>"));
    }

    #[test]
    fn test_page_toc_assigns_unique_ids() {
        let blocks = vec![
            Block::Heading { level: 1, text: "Setup".into() },
            Block::Heading { level: 2, text: "Setup".into() },
        ];
        let mut out = String::new();
        print_page_toc(&mut out, &blocks);
        assert!(out.contains("href=\"#setup\""));
        assert!(out.contains("href=\"#setup_2\""));
    }

    #[test]
    fn test_comment_history_requires_url() {
        let (mut config, _) = ctx_parts();
        config.comment_url = None;
        let mut out = String::new();
        print_comment_history(&mut out, &config, "");
        assert!(out.contains("comment_url is not set"));

        config.comment_url = Some("https://c.example.com/".into());
        let mut out = String::new();
        print_comment_history(&mut out, &config, "[max=5]");
        assert!(out.contains("data-comment-url=\"https://c.example.com/\""));
        assert!(out.contains("data-comment-max=\"5\""));
    }

    #[test]
    fn test_search_stub() {
        let (mut config, _) = ctx_parts();
        config.search_url = Some("https://s.example.com/".into());
        let mut out = String::new();
        print_search(&mut out, &config, "");
        assert!(out.contains("data-search-url=\"https://s.example.com/\""));
        assert!(out.contains("search_form"));
    }

    #[test]
    fn test_unknown_directive_renders_nothing() {
        let (config, articles) = ctx_parts();
        let ctx = DirectiveContext {
            config: &config,
            articles: &articles,
            blocks: &[],
        };
        let mut out = String::new();
        dispatch(&mut out, &ctx, "bogus", "");
        assert!(out.is_empty());
    }

    #[test]
    fn test_metadata_directives_render_nothing() {
        let (config, articles) = ctx_parts();
        let ctx = DirectiveContext {
            config: &config,
            articles: &articles,
            blocks: &[],
        };
        let mut out = String::new();
        for name in METADATA_NAMES {
            dispatch(&mut out, &ctx, name, "anything");
        }
        assert!(out.is_empty());
    }
}
