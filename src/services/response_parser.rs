//! Tolerant extraction of structured data from free-form model output
//!
//! Models are asked for a bare JSON array but regularly wrap it in prose, markdown fences, or
//! stop half way through. The strategies below are tried in order and the first one that
//! yields a non-empty array of the expected shape wins.

use serde::de::DeserializeOwned;

/// Extracts a JSON array of `T` from `response`
///
/// `has_shape` decides whether an element looks like what was asked for; an array is accepted
/// when every element deserializes as `T` and at least one element has the shape. A parseable
/// but empty array is only returned when nothing better exists. `None` means no array could be
/// recovered at all.
pub fn extract_array<T, F>(response: &str, has_shape: F) -> Option<Vec<T>>
where
    T: DeserializeOwned,
    F: Fn(&T) -> bool,
{
    let mut found_empty = false;

    let mut accept = |candidate: &str| -> Option<Vec<T>> {
        let items: Vec<T> = serde_json::from_str(candidate.trim()).ok()?;
        if items.is_empty() {
            found_empty = true;
            return None;
        }
        items.iter().any(&has_shape).then_some(items)
    };

    let trimmed = response.trim();

    // 1. Clean answer
    if let Some(items) = accept(trimmed) {
        return Some(items);
    }

    // 2. Fenced answer
    let unfenced = strip_code_fences(trimmed);
    if unfenced != trimmed {
        if let Some(items) = accept(&unfenced) {
            return Some(items);
        }
    }

    // 3. Array embedded somewhere in prose
    for candidate in balanced_spans(trimmed, '[', ']') {
        if let Some(items) = accept(candidate) {
            return Some(items);
        }
    }

    // 4. Truncated answer: keep whatever complete objects made it through
    let salvaged = salvage_objects(trimmed, &has_shape);
    if !salvaged.is_empty() {
        return Some(salvaged);
    }

    found_empty.then(Vec::new)
}

/// Splits a free-text answer into list items
///
/// Handles one-per-line lists (bulleted or numbered) as well as a single comma separated line.
/// Lead-in lines such as "Here are some keywords:" are not items.
pub fn split_free_text(response: &str) -> Vec<String> {
    let unfenced = strip_code_fences(response.trim());
    let lines: Vec<&str> = unfenced
        .lines()
        .map(str::trim)
        .filter(|l| !l.is_empty() && !l.ends_with(':'))
        .collect();

    let pieces: Vec<&str> = if lines.len() <= 1 {
        lines.iter().flat_map(|l| l.split(',')).collect()
    } else {
        lines
    };

    pieces
        .into_iter()
        .map(clean_list_item)
        .filter(|item| !item.is_empty())
        .collect()
}

fn clean_list_item(item: &str) -> String {
    let item = item.trim();
    // Drop bullets and "1." / "2)" numbering
    let item = item.trim_start_matches(['-', '*', '•', '[', ']']).trim_start();
    let digits = item.chars().take_while(|c| c.is_ascii_digit()).count();
    let item = if digits > 0 {
        let rest = &item[digits..];
        rest.strip_prefix('.')
            .or_else(|| rest.strip_prefix(')'))
            .or_else(|| rest.strip_prefix(':'))
            .map(str::trim_start)
            .unwrap_or(item)
    } else {
        item
    };

    item.trim_matches(|c: char| c == '"' || c == '\'' || c == '`' || c == ',' || c.is_whitespace())
        .to_string()
}

/// Removes markdown code fence lines (```json, ```) keeping their contents
pub fn strip_code_fences(text: &str) -> String {
    if !text.contains("```") {
        return text.to_string();
    }

    text.lines()
        .filter(|line| !line.trim_start().starts_with("```"))
        .collect::<Vec<_>>()
        .join("\n")
        .replace("```", "")
        .trim()
        .to_string()
}

/// Every balanced `open ... close` span, in order of its opening delimiter
///
/// Delimiters inside JSON strings are ignored, as are escaped quotes.
fn balanced_spans(text: &str, open: char, close: char) -> Vec<&str> {
    let mut spans = Vec::new();

    for (start, c) in text.char_indices() {
        if c != open {
            continue;
        }
        if let Some(end) = matching_close(&text[start..], open, close) {
            spans.push(&text[start..start + end]);
        }
    }

    spans
}

/// Byte length of the balanced span starting at `text[0]`, if it closes
fn matching_close(text: &str, open: char, close: char) -> Option<usize> {
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (idx, c) in text.char_indices() {
        if in_string {
            match c {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        if c == '"' {
            in_string = true;
        } else if c == open {
            depth += 1;
        } else if c == close {
            depth = depth.checked_sub(1)?;
            if depth == 0 {
                return Some(idx + c.len_utf8());
            }
        }
    }

    None
}

fn salvage_objects<T, F>(text: &str, has_shape: &F) -> Vec<T>
where
    T: DeserializeOwned,
    F: Fn(&T) -> bool,
{
    let Some(array_start) = text.find('[') else {
        return Vec::new();
    };
    let body = &text[array_start..];

    let mut items = Vec::new();
    let mut cursor = 0;
    while let Some(offset) = body[cursor..].find('{') {
        let start = cursor + offset;
        match matching_close(&body[start..], '{', '}') {
            Some(len) => {
                if let Ok(item) = serde_json::from_str::<T>(&body[start..start + len]) {
                    if has_shape(&item) {
                        items.push(item);
                    }
                }
                cursor = start + len;
            }
            None => break,
        }
    }

    items
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::RawRecommendation;

    fn recs(response: &str) -> Option<Vec<RawRecommendation>> {
        extract_array(response, RawRecommendation::is_reference)
    }

    const ARRAY: &str = r#"[{"id": 1, "title": "B", "link": "https://b.test"}, {"id": 2, "title": "C [live]", "link": "https://c.test"}]"#;

    #[test]
    fn test_clean_array() {
        let parsed = recs(ARRAY).unwrap();
        assert_eq!(parsed.len(), 2);
        assert_eq!(parsed[1].title.as_deref(), Some("C [live]"));
    }

    #[test]
    fn test_fenced_array() {
        let response = format!("```json\n{}\n```", ARRAY);
        assert_eq!(recs(&response), recs(ARRAY));
    }

    #[test]
    fn test_embedded_array_matches_bare_array() {
        let wrappers = [
            format!("Here are my picks:\n{}\nHope this helps!", ARRAY),
            format!("Sure [see below]:\n```\n{}\n```", ARRAY),
            format!("Note: ignore [1] and [].\n{} -- end", ARRAY),
        ];

        let bare = recs(ARRAY).unwrap();
        for response in wrappers {
            assert_eq!(recs(&response).unwrap(), bare, "failed on {:?}", response);
        }
    }

    #[test]
    fn test_brackets_inside_strings_are_ignored() {
        let response = r#"Result: [{"title": "Odd ] title", "link": "https://x.test"}] done"#;
        let parsed = recs(response).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].title.as_deref(), Some("Odd ] title"));
    }

    #[test]
    fn test_truncated_array_salvages_complete_objects() {
        let response = r#"[{"id": 1, "title": "B", "link": "https://b.test"}, {"id": 2, "title": "C", "li"#;
        let parsed = recs(response).unwrap();
        assert_eq!(parsed.len(), 1);
        assert_eq!(parsed[0].id, Some(1));
    }

    #[test]
    fn test_no_array() {
        assert_eq!(recs("I could not find any similar articles."), None);
        assert_eq!(recs(""), None);
        assert_eq!(recs(r#"{"title": "lonely object"}"#), None);
    }

    #[test]
    fn test_wrong_shape_rejected() {
        assert_eq!(recs(r#"[{"foo": 1}, {"bar": 2}]"#), None);
        assert_eq!(recs("[1, 2, 3]"), None);
    }

    #[test]
    fn test_empty_array_reported_as_empty() {
        assert_eq!(recs("[]"), Some(vec![]));
    }

    #[test]
    fn test_string_array() {
        let parsed: Option<Vec<String>> = extract_array(
            "Keywords:\n[\"mars rover\", \"nasa landing\"]",
            |s: &String| !s.trim().is_empty(),
        );
        assert_eq!(
            parsed,
            Some(vec!["mars rover".to_string(), "nasa landing".to_string()])
        );
    }

    #[test]
    fn test_split_free_text_lines() {
        let response = "1. mars rover landing\n2) nasa perseverance\n- red planet water\n* \"jezero crater\"";
        assert_eq!(
            split_free_text(response),
            vec![
                "mars rover landing",
                "nasa perseverance",
                "red planet water",
                "jezero crater"
            ]
        );
    }

    #[test]
    fn test_split_free_text_skips_lead_in() {
        let response = "Here are some keywords:\n- mars rover\n- nasa\n\nAlternatives:\n1. red planet";
        assert_eq!(
            split_free_text(response),
            vec!["mars rover", "nasa", "red planet"]
        );
        assert!(split_free_text("Keywords:").is_empty());
    }

    #[test]
    fn test_split_free_text_commas() {
        assert_eq!(
            split_free_text("mars rover, nasa, \"red planet\""),
            vec!["mars rover", "nasa", "red planet"]
        );
    }

    #[test]
    fn test_strip_code_fences() {
        assert_eq!(strip_code_fences("```json\n[1]\n```"), "[1]");
        assert_eq!(strip_code_fences("no fences"), "no fences");
    }
}
