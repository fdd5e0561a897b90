//! Structured extraction from LLM output.
//!
//! Model responses that are asked for JSON routinely arrive wrapped in prose
//! or markdown fences. `first_json_object` pulls out the first balanced
//! `{...}` block so the caller can parse it, with an explicit fallback policy
//! upstream when nothing parseable is found.

/// Return the first balanced JSON object embedded in `text`, if any.
///
/// Scans for `{`, then tracks brace depth while skipping string literals and
/// escape sequences. Returns the slice spanning the balanced object.
pub fn first_json_object(text: &str) -> Option<&str> {
    let bytes = text.as_bytes();
    let start = text.find('{')?;

    let mut depth = 0usize;
    let mut in_string = false;
    let mut escaped = false;

    for (i, &b) in bytes.iter().enumerate().skip(start) {
        if in_string {
            if escaped {
                escaped = false;
            } else if b == b'\\' {
                escaped = true;
            } else if b == b'"' {
                in_string = false;
            }
            continue;
        }

        match b {
            b'"' => in_string = true,
            b'{' => depth += 1,
            b'}' => {
                depth -= 1;
                if depth == 0 {
                    return Some(&text[start..=i]);
                }
            }
            _ => {}
        }
    }

    None
}

/// Parse the first JSON object in `text` into a `serde_json::Value`.
/// Returns `None` when no balanced object exists or it is not valid JSON.
pub fn parse_first_json_object(text: &str) -> Option<serde_json::Value> {
    serde_json::from_str(first_json_object(text)?).ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_bare_object() {
        let text = r#"{"agentType": "web_search", "confidence": 0.9}"#;
        assert_eq!(first_json_object(text), Some(text));
    }

    #[test]
    fn test_object_surrounded_by_prose() {
        let text = "Sure! Here is the analysis:\n{\"confidence\": 0.8}\nHope that helps.";
        assert_eq!(first_json_object(text), Some("{\"confidence\": 0.8}"));
    }

    #[test]
    fn test_markdown_fenced_object() {
        let text = "```json\n{\"agentType\": \"product_recommender\"}\n```";
        assert_eq!(
            first_json_object(text),
            Some("{\"agentType\": \"product_recommender\"}")
        );
    }

    #[test]
    fn test_nested_objects_stay_balanced() {
        let text = r#"prefix {"a": {"b": 1}, "c": 2} suffix {"d": 3}"#;
        assert_eq!(first_json_object(text), Some(r#"{"a": {"b": 1}, "c": 2}"#));
    }

    #[test]
    fn test_braces_inside_strings_are_ignored() {
        let text = r#"{"reasoning": "matches {curly} text \" quoted"}"#;
        let parsed = parse_first_json_object(text).expect("should parse");
        assert_eq!(parsed["reasoning"], "matches {curly} text \" quoted");
    }

    #[test]
    fn test_no_object_returns_none() {
        assert_eq!(first_json_object("no json here"), None);
        assert_eq!(first_json_object("unbalanced { start"), None);
    }

    #[test]
    fn test_invalid_json_returns_none_from_parse() {
        assert!(parse_first_json_object("{not valid json}").is_none());
    }
}
