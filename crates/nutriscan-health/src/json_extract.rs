//! Pulling JSON out of free-form model output

/// Best-effort JSON text from a model response.
///
/// A fenced block (```` ```json ```` or bare ```` ``` ````) wins when its
/// content parses. Otherwise the span from the first `{` to the last `}` is
/// used, and failing that the trimmed response itself.
pub fn extract_json_from_response(response: &str) -> String {
    let response = response.trim();

    if let Some(inner) = fenced_block(response) {
        if serde_json::from_str::<serde_json::Value>(inner).is_ok() {
            return inner.to_string();
        }
    }

    if let (Some(start), Some(end)) = (response.find('{'), response.rfind('}')) {
        if start < end {
            return response[start..=end].to_string();
        }
    }

    response.to_string()
}

/// Content of the first ```` ``` ```` fence, without the language tag line
fn fenced_block(text: &str) -> Option<&str> {
    let open = text.find("```")?;
    let after_open = &text[open + 3..];
    let body_start = after_open.find('\n')? + 1;
    let body = &after_open[body_start..];
    let close = body.find("```").unwrap_or(body.len());
    let inner = body[..close].trim();
    (!inner.is_empty()).then_some(inner)
}

/// The first balanced `{ ... }` span in `text`.
///
/// Braces inside JSON string literals (including escaped quotes) do not
/// count. Returns `None` when there is no `{` or the first one never closes.
pub fn extract_balanced_object(text: &str) -> Option<&str> {
    let start = text.find('{')?;
    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (offset, ch) in text[start..].char_indices() {
        if in_string {
            match ch {
                _ if escaped => escaped = false,
                '\\' => escaped = true,
                '"' => in_string = false,
                _ => {}
            }
            continue;
        }

        match ch {
            '"' => in_string = true,
            '{' => depth += 1,
            '}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..start + offset + 1]);
                }
            }
            _ => {}
        }
    }

    None
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_json_fence() {
        let response = "```json\n{\"allergens\": [\"milk\"]}\n```";
        assert_eq!(extract_json_from_response(response), "{\"allergens\": [\"milk\"]}");
    }

    #[test]
    fn test_generic_fence_with_preamble() {
        let response = "Here is the result:\n```\n{\"a\": 1}\n```\nThanks!";
        assert_eq!(extract_json_from_response(response), "{\"a\": 1}");
    }

    #[test]
    fn test_invalid_fence_falls_back_to_braces() {
        let response = "```json\nnot json at all\n```\nbut later {\"a\": 2}";
        assert_eq!(extract_json_from_response(response), "{\"a\": 2}");
    }

    #[test]
    fn test_bare_object_with_prose() {
        let response = "Sure! {\"a\": {\"b\": 3}} hope that helps";
        assert_eq!(extract_json_from_response(response), "{\"a\": {\"b\": 3}}");
    }

    #[test]
    fn test_no_json_returns_trimmed_text() {
        assert_eq!(extract_json_from_response("  plain words  "), "plain words");
    }

    #[test]
    fn test_balanced_takes_first_object_only() {
        let text = "prefix {\"grade\": \"b\"} and {\"other\": 1}";
        assert_eq!(extract_balanced_object(text), Some("{\"grade\": \"b\"}"));
    }

    #[test]
    fn test_balanced_nested() {
        let text = "{\"a\": {\"b\": {\"c\": 1}}, \"d\": 2} trailing }";
        assert_eq!(
            extract_balanced_object(text),
            Some("{\"a\": {\"b\": {\"c\": 1}}, \"d\": 2}")
        );
    }

    #[test]
    fn test_balanced_ignores_braces_in_strings() {
        let text = r#"{"explanation": "uses } and { and \" quotes", "score": 4}"#;
        assert_eq!(extract_balanced_object(text), Some(text));
    }

    #[test]
    fn test_balanced_unclosed_or_missing() {
        assert_eq!(extract_balanced_object("{\"a\": 1"), None);
        assert_eq!(extract_balanced_object("no braces here"), None);
        assert_eq!(extract_balanced_object(""), None);
    }
}
