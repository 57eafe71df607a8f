use regex::Regex;
use scraper::{Html, Node};
use std::sync::OnceLock;

const ELLIPSIS: char = '…';

/// Reduces a raw feed fragment to bounded plain text
///
/// Markup goes through an HTML5 parser, so malformed input degrades to whatever text can be
/// recovered instead of failing. Text inside `script` and `style` is dropped, entities are
/// decoded, whitespace is collapsed, and the result is cut to at most `max_chars` characters
/// (ellipsis included).
pub fn clean_content(raw: &str, max_chars: usize) -> String {
    let text = if raw.contains('<') || raw.contains('&') {
        html_to_text(raw)
    } else {
        raw.to_string()
    };

    truncate_chars(&tidy_whitespace(&text), max_chars)
}

fn html_to_text(raw: &str) -> String {
    let fragment = Html::parse_fragment(raw);
    let mut parts: Vec<&str> = Vec::new();

    for node in fragment.root_element().descendants() {
        let Node::Text(text) = node.value() else {
            continue;
        };

        let hidden = node.ancestors().any(|ancestor| {
            ancestor
                .value()
                .as_element()
                .is_some_and(|el| matches!(el.name(), "script" | "style" | "noscript"))
        });

        if !hidden {
            parts.push(&**text);
        }
    }

    parts.join(" ")
}

fn tidy_whitespace(text: &str) -> String {
    static SPACE_BEFORE_PUNCT: OnceLock<Regex> = OnceLock::new();
    let re = SPACE_BEFORE_PUNCT
        .get_or_init(|| Regex::new(r"\s+([.,;:!?)\]])").expect("valid punctuation regex"));

    let collapsed = text.split_whitespace().collect::<Vec<_>>().join(" ");
    re.replace_all(&collapsed, "$1").into_owned()
}

/// Cuts `text` to at most `max_chars` characters, preferring a word boundary
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    if text.chars().count() <= max_chars {
        return text.to_string();
    }
    if max_chars == 0 {
        return String::new();
    }

    let keep = max_chars - 1;
    let head: String = text.chars().take(keep).collect();

    // Back off to the last space unless that throws away most of the text
    let cut = match head.rfind(char::is_whitespace) {
        Some(idx) if head[..idx].chars().count() >= keep * 4 / 5 => &head[..idx],
        _ => head.as_str(),
    };

    format!("{}{}", cut.trim_end(), ELLIPSIS)
}
