// Neutralize free-text form fields before they are interpolated into the prompt.
// Output is a single-line quoted literal: no newlines, no raw angle brackets,
// no unescaped quotes, no text the response parser would mistake for its own marker.

use std::sync::LazyLock;

use regex::Regex;

/// Maximum characters kept from the symptom/medicine query.
pub const MAX_QUERY_CHARS: usize = 2_000;

/// Maximum characters kept from allergies / chronic-condition fields.
pub const MAX_PROFILE_FIELD_CHARS: usize = 500;

static CONFIDENCE_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"(?i)confidence\s+score").expect("valid marker regex"));

/// Clean a field and render it as a quoted literal safe to embed in the prompt.
///
/// `name` is only used for the audit log line; field content is never logged.
pub fn neutralize_field(name: &str, raw: &str, max_chars: usize) -> String {
    let visible = remove_invisible_unicode(raw);
    let single_line = collapse_whitespace(&visible);
    let defused = CONFIDENCE_MARKER.replace_all(&single_line, "confidence-score");
    let truncated = truncate_chars(&defused, max_chars);

    if truncated != raw.trim() {
        tracing::debug!(
            field = name,
            original_len = raw.len(),
            cleaned_len = truncated.len(),
            "Prompt field neutralized"
        );
    }

    quote_literal(&truncated)
}

/// Remove zero-width and invisible Unicode characters.
fn remove_invisible_unicode(text: &str) -> String {
    text.chars()
        .filter(|c| {
            !matches!(
                *c,
                '\u{200B}'..='\u{200F}'  // Zero-width chars
                | '\u{202A}'..='\u{202E}' // Directional formatting
                | '\u{2060}'..='\u{2064}' // Invisible operators
                | '\u{2066}'..='\u{2069}' // Directional isolates
                | '\u{FEFF}'              // BOM
                | '\u{00AD}'              // Soft hyphen
                | '\u{034F}'              // Combining grapheme joiner
                | '\u{061C}'              // Arabic letter mark
                | '\u{180E}'              // Mongolian vowel separator
            )
        })
        .collect()
}

/// Turn every run of whitespace or control characters into one space.
fn collapse_whitespace(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    let mut pending_space = false;
    for c in text.chars() {
        if c.is_whitespace() || c.is_control() {
            pending_space = !out.is_empty();
            continue;
        }
        if pending_space {
            out.push(' ');
            pending_space = false;
        }
        out.push(c);
    }
    out
}

fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => text[..idx].trim_end().to_string(),
        None => text.to_string(),
    }
}

/// JSON string quoting, plus angle brackets escaped so a field can never
/// open or close a section tag.
fn quote_literal(text: &str) -> String {
    serde_json::Value::String(text.to_string())
        .to_string()
        .replace('<', "\\u003c")
        .replace('>', "\\u003e")
}
