//! Block sectionizer: partitions normalized article lines into typed blocks.
//!
//! One forward scan, no lookahead. Check priority per line: fence > list >
//! table > directive > heading > horizontal rule > paragraph continuation >
//! new paragraph.

use std::sync::LazyLock;

use regex::Regex;

static FENCE_OPEN_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(>+)\|([a-z]*)\|$").unwrap());
static DIRECTIVE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^@([a-z-]+)( +(.*))?$").unwrap());
static LINK_PIPE_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"\[\[([^\]]+)\|([^\]]+)\]\]").unwrap());
static COLUMN_RE: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^\[!(.*?)!\](.*)$").unwrap());

/// Maximum nesting depth for lists.
const MAX_LIST_DEPTH: usize = 3;
/// Maximum heading level.
const MAX_HEADING_LEVEL: usize = 3;
/// Maximum quote level for paragraphs.
const MAX_QUOTE_LEVEL: usize = 4;

/// A structural block of an article.
#[derive(Debug, Clone, PartialEq)]
pub enum Block {
    Heading { level: usize, text: String },
    List { items: Vec<ListItem> },
    Table { rows: Vec<Vec<Cell>> },
    Preformatted { lines: Vec<String>, fence_depth: usize },
    Directive { name: String, params: String },
    Rule { level: usize },
    Paragraph { quote_level: usize, lines: Vec<String> },
}

/// One item of a list block. The marker symbol is per-item, so ordered and
/// unordered items may coexist within one block.
#[derive(Debug, Clone, PartialEq)]
pub struct ListItem {
    pub ordered: bool,
    pub depth: usize,
    pub text: String,
}

/// One table cell with its prefix-sigil attributes parsed off.
#[derive(Debug, Clone, PartialEq)]
pub struct Cell {
    pub text: String,
    pub colspan: u32,
    pub rowspan: u32,
    pub numeric: bool,
    pub header: bool,
    pub spread: bool,
}

/// Group normalized lines into blocks.
pub fn organize_sections(lines: &[String]) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut section_break = true;
    let mut i = 0;
    while i < lines.len() {
        let line = &lines[i];
        i += 1;
        if line.is_empty() {
            section_break = true;
            continue;
        }
        if let Some(caps) = FENCE_OPEN_RE.captures(line) {
            let fence_depth = caps[1].len();
            let close = format!("||{}", "<".repeat(fence_depth));
            let mut pre_lines = Vec::new();
            while i < lines.len() {
                let line = &lines[i];
                i += 1;
                if *line == close {
                    break;
                }
                pre_lines.push(line.clone());
            }
            blocks.push(Block::Preformatted {
                lines: pre_lines,
                fence_depth,
            });
            section_break = true;
            continue;
        }
        if let Some(item) = parse_list_item(line) {
            let mut items = vec![item];
            while i < lines.len() {
                match parse_list_item(&lines[i]) {
                    Some(item) => {
                        items.push(item);
                        i += 1;
                    }
                    None => break,
                }
            }
            blocks.push(Block::List { items });
            section_break = true;
            continue;
        }
        if line.starts_with('|') {
            let mut rows = vec![parse_row(line)];
            while i < lines.len() {
                let line = &lines[i];
                if !line.starts_with('|') {
                    break;
                }
                i += 1;
                rows.push(parse_row(line));
            }
            blocks.push(Block::Table { rows });
            section_break = true;
            continue;
        }
        if let Some(caps) = DIRECTIVE_RE.captures(line) {
            blocks.push(Block::Directive {
                name: caps[1].to_string(),
                params: caps.get(3).map(|m| m.as_str().trim()).unwrap_or("").to_string(),
            });
            section_break = true;
            continue;
        }
        if let Some((level, text)) = parse_heading(line) {
            blocks.push(Block::Heading { level, text });
            section_break = true;
            continue;
        }
        if let Some(level) = parse_rule(line) {
            blocks.push(Block::Rule { level });
            section_break = true;
            continue;
        }
        if !section_break
            && let Some(Block::Paragraph { lines, .. }) = blocks.last_mut()
        {
            lines.push(line.clone());
            continue;
        }
        let (quote_level, first) = parse_quote_prefix(line);
        blocks.push(Block::Paragraph {
            quote_level,
            lines: vec![first],
        });
        section_break = false;
    }
    blocks
}

/// A run of `-` or `+` followed by a space opens a list item.
fn parse_list_item(line: &str) -> Option<ListItem> {
    let marker = match line.chars().next() {
        Some(c @ ('-' | '+')) => c,
        _ => return None,
    };
    let run = line.chars().take_while(|&c| c == marker).count();
    let rest = &line[run..];
    if !rest.starts_with(' ') {
        return None;
    }
    Some(ListItem {
        ordered: marker == '+',
        depth: run.min(MAX_LIST_DEPTH),
        text: rest.trim_start().to_string(),
    })
}

/// A run of `*` followed by a space opens a heading.
fn parse_heading(line: &str) -> Option<(usize, String)> {
    if !line.starts_with('*') {
        return None;
    }
    let run = line.chars().take_while(|&c| c == '*').count();
    let rest = &line[run..];
    if !rest.starts_with(' ') {
        return None;
    }
    Some((run.min(MAX_HEADING_LEVEL), rest.trim_start().to_string()))
}

/// A bare run of 2-5 `-` characters is a horizontal rule.
fn parse_rule(line: &str) -> Option<usize> {
    let len = line.chars().count();
    if (2..=5).contains(&len) && line.chars().all(|c| c == '-') {
        Some(len - 2)
    } else {
        None
    }
}

/// A run of `>` followed by a space on the opening paragraph line sets the
/// quote level.
fn parse_quote_prefix(line: &str) -> (usize, String) {
    if !line.starts_with('>') {
        return (0, line.to_string());
    }
    let run = line.chars().take_while(|&c| c == '>').count();
    let rest = &line[run..];
    if !rest.starts_with(' ') {
        return (0, line.to_string());
    }
    (run.min(MAX_QUOTE_LEVEL), rest.trim_start().to_string())
}

/// Split a table line into cells. Pipes inside `[[face|dest]]` links are
/// protected from the split with a sentinel and restored afterwards.
fn parse_row(line: &str) -> Vec<Cell> {
    let line = line.strip_prefix('|').unwrap_or(line);
    let protected = LINK_PIPE_RE.replace_all(line, "[[${1}{{_VERT_}}${2}]]");
    protected
        .split('|')
        .map(|field| parse_cell(&field.replace("{{_VERT_}}", "|")))
        .collect()
}

/// Parse one cell field's prefix sigils: `<N>` colspan, `{N}` rowspan,
/// `#` numeric, `^` header, `=` spread.
fn parse_cell(field: &str) -> Cell {
    let mut field = field;
    let mut colspan = 1;
    let mut rowspan = 1;
    if let Some((n, rest)) = parse_span_sigil(field, '<', '>') {
        colspan = n.max(1);
        field = rest;
    }
    if let Some((n, rest)) = parse_span_sigil(field, '{', '}') {
        rowspan = n.max(1);
        field = rest;
    }
    let numeric = field.starts_with('#');
    if numeric {
        field = &field[1..];
    }
    let header = field.starts_with('^');
    if header {
        field = &field[1..];
    }
    let spread = field.starts_with('=');
    if spread {
        field = &field[1..];
    }
    Cell {
        text: field.trim().to_string(),
        colspan,
        rowspan,
        numeric,
        header,
        spread,
    }
}

/// A collapsible column paragraph opens with `[!caption!]` on its first
/// line; a `~` prefix on the caption makes the column covert (collapsed).
/// Returns `(covert, caption, rest_of_line)`.
pub fn split_column_marker(line: &str) -> Option<(bool, String, String)> {
    let caps = COLUMN_RE.captures(line)?;
    let mut caption = caps[1].to_string();
    let covert = caption.starts_with('~');
    if covert {
        caption.remove(0);
    }
    Some((covert, caption.trim().to_string(), caps[2].trim().to_string()))
}

/// Parse a leading `<digits>`-style sigil, returning the number and the rest.
fn parse_span_sigil(field: &str, open: char, close: char) -> Option<(u32, &str)> {
    let rest = field.strip_prefix(open)?;
    let end = rest.find(close)?;
    let digits = &rest[..end];
    if digits.is_empty() || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some((digits.parse().ok()?, &rest[end + close.len_utf8()..]))
}
