use html_escape::decode_html_entities;

/// Converts a rich-text description into plain text.
///
/// Block-level tags become line breaks (list items also get a `•` glyph),
/// every other tag is dropped, and entities are decoded. Passes repeat until
/// the text stops changing, so double-escaped markup like `&lt;b&gt;` is
/// removed too and `normalize(normalize(x)) == normalize(x)`.
pub fn normalize(raw: &str) -> String {
    // Terminates: every changing pass drops a tag or shortens an entity.
    let mut text = raw.to_string();
    loop {
        let next = normalize_pass(&text);
        if next == text {
            return text;
        }
        text = next;
    }
}

fn normalize_pass(text: &str) -> String {
    re!(LIST_ITEM_RE, r"(?i)<\s*li\b[^>]*(?:>|$)");
    re!(
        BLOCK_TAG_RE,
        r"(?i)<\s*/?\s*(?:br|p|div|li|h[1-6]|tr|ul|ol)\b[^>]*(?:>|$)",
    );
    // Requires a letter (or `/`, `!`, `?`) after `<` so "a < b" survives.
    re!(TAG_RE, r"<(?:[/!?]|[A-Za-z])[^>]*(?:>|$)");

    let text = LIST_ITEM_RE.replace_all(text, "\n• ");
    let text = BLOCK_TAG_RE.replace_all(&text, "\n");
    let text = TAG_RE.replace_all(&text, "");
    let text = decode_html_entities(&text);

    text.replace("\r\n", "\n")
        .replace('\r', "\n")
        .replace('\u{a0}', " ")
}

/// Collapses whitespace and cuts `text` to at most `max_chars` characters,
/// marking the cut with an ellipsis.
pub fn excerpt(text: &str, max_chars: usize) -> String {
    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if collapsed.chars().count() <= max_chars {
        return collapsed;
    }

    let cut = collapsed.chars().take(max_chars).collect::<String>();
    format!("{}…", cut.trim_end())
}
