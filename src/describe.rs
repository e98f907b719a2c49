use serde::Serialize;

use crate::text::normalize;

/// One classified unit of a job description.
#[derive(Serialize, Clone, PartialEq, Eq, Debug)]
pub enum DescriptionBlock {
    /// An all-caps line ending in a colon, kept verbatim (`RESPONSIBILITIES:`).
    Heading(String),
    /// `Label: value`, split on the first colon.
    LabelValue(String, String),
    BulletList(Vec<String>),
    Paragraph(String),
}

/// Lines longer than this rule out the flat-list fallback.
const FLAT_LIST_MAX_LINE: usize = 100;

/// Structures a raw HTML description. Shorthand for `structure(normalize(html))`.
pub fn describe(html: &str) -> Vec<DescriptionBlock> {
    structure(&normalize(html))
}

/// Classifies plain-text lines into description blocks, in source order.
///
/// Per non-blank line, the first matching rule wins:
/// 1. heading,
/// 2. label/value,
/// 3. bullet glyph, or any line inside a bullet run,
/// 4. paragraph.
///
/// A bullet run starts at a heading that names responsibilities,
/// requirements, qualifications, duties or tasks, and ends at the next
/// heading. Input with no heading whose lines are all short becomes one
/// flat bullet list instead.
pub fn structure(text: &str) -> Vec<DescriptionBlock> {
    let lines = text
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .collect::<Vec<_>>();

    if is_flat_list(&lines) {
        let items = lines
            .iter()
            .map(|&line| bullet_item(line).unwrap_or(line))
            .filter(|item| !item.is_empty())
            .map(str::to_string)
            .collect();
        return vec![DescriptionBlock::BulletList(items)];
    }

    let mut blocks = Vec::new();
    let mut bullets = Vec::new();
    let mut in_bullet_run = false;
    for line in lines {
        if is_heading(line) {
            flush_bullets(&mut blocks, &mut bullets);
            in_bullet_run = starts_bullet_run(line);
            blocks.push(DescriptionBlock::Heading(line.to_string()));
        } else if let Some((label, value)) = label_value(line) {
            flush_bullets(&mut blocks, &mut bullets);
            blocks.push(DescriptionBlock::LabelValue(label, value));
        } else if let Some(item) = bullet_item(line) {
            if !item.is_empty() {
                bullets.push(item.to_string());
            }
        } else if in_bullet_run {
            bullets.push(line.to_string());
        } else {
            flush_bullets(&mut blocks, &mut bullets);
            blocks.push(DescriptionBlock::Paragraph(line.to_string()));
        }
    }
    flush_bullets(&mut blocks, &mut bullets);

    blocks
}

/// Returns only the glyph-prefixed lines of a raw HTML description, glyphs stripped.
pub fn bullet_points(html: &str) -> Vec<String> {
    normalize(html)
        .lines()
        .filter_map(|line| bullet_item(line.trim()))
        .filter(|item| !item.is_empty())
        .map(str::to_string)
        .collect()
}

fn flush_bullets(blocks: &mut Vec<DescriptionBlock>, bullets: &mut Vec<String>) {
    if !bullets.is_empty() {
        blocks.push(DescriptionBlock::BulletList(std::mem::take(bullets)));
    }
}

fn is_flat_list(lines: &[&str]) -> bool {
    lines.len() >= 2
        && lines
            .iter()
            .all(|line| !is_heading(line) && line.chars().count() <= FLAT_LIST_MAX_LINE)
}

fn is_heading(line: &str) -> bool {
    re!(HEADING_RE, r"^[A-Z\s&()\-]*[A-Z][A-Z\s&()\-]*:$");

    HEADING_RE.is_match(line)
}

fn starts_bullet_run(heading: &str) -> bool {
    re!(
        BULLET_HEADING_RE,
        r"\b(responsibilit\w*|accountabilit\w*|requirement\w*|qualification\w*|duties|tasks)\b",
    );

    let phrase = heading
        .trim_end_matches(':')
        .to_lowercase()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ");
    phrase != "job purpose" && BULLET_HEADING_RE.is_match(&phrase)
}

fn label_value(line: &str) -> Option<(String, String)> {
    re!(LABEL_VALUE_RE, r"^([A-Z][A-Za-z ]{1,29}):\s*(\S.*)$");

    let captures = LABEL_VALUE_RE.captures(line)?;
    Some((
        captures[1].trim_end().to_string(),
        captures[2].trim_end().to_string(),
    ))
}

fn bullet_item(line: &str) -> Option<&str> {
    let rest = line.strip_prefix(['-', '•', '*'])?;
    Some(rest.trim_start())
}
