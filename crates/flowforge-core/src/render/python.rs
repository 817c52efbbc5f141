// ABOUTME: Python source helpers shared by the Python-based renderers.
// ABOUTME: Escapes free text into string literals and converts JSON values into Python literals.

use std::fmt::Write;

/// Python 3 hard keywords. Soft keywords (`match`, `case`, `type`, `_`) are
/// valid identifiers and are not listed.
pub const KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
    "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return",
    "try", "while", "with", "yield",
];

pub fn is_keyword(ident: &str) -> bool {
    KEYWORDS.contains(&ident)
}

/// Render `s` as a double-quoted Python string literal.
pub fn string_literal(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if (c as u32) < 0x20 || c == '\u{7f}' => {
                write!(out, "\\x{:02x}", c as u32).unwrap();
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Render a JSON value as the equivalent Python literal. Object keys come
/// out in the map's (sorted) order.
pub fn literal(value: &serde_json::Value) -> String {
    use serde_json::Value;

    match value {
        Value::Null => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => string_literal(s),
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(literal).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Object(map) => {
            let entries: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{}: {}", string_literal(k), literal(v)))
                .collect();
            format!("{{{}}}", entries.join(", "))
        }
    }
}

/// Render a string-keyed mapping of settings as a Python dict literal.
pub fn dict_literal<'a, I>(entries: I) -> String
where
    I: IntoIterator<Item = (&'a String, &'a serde_json::Value)>,
{
    let entries: Vec<String> = entries
        .into_iter()
        .map(|(k, v)| format!("{}: {}", string_literal(k), literal(v)))
        .collect();
    format!("{{{}}}", entries.join(", "))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;
    use std::collections::BTreeMap;

    #[test]
    fn string_literal_escapes_quotes_and_control_chars() {
        assert_eq!(string_literal("plain"), "\"plain\"");
        assert_eq!(string_literal("say \"hi\""), "\"say \\\"hi\\\"\"");
        assert_eq!(string_literal("a\\b"), "\"a\\\\b\"");
        assert_eq!(string_literal("line1\nline2\t"), "\"line1\\nline2\\t\"");
        assert_eq!(string_literal("bell\u{7}"), "\"bell\\x07\"");
        assert_eq!(string_literal("{braces} stay"), "\"{braces} stay\"");
    }

    #[test]
    fn literal_maps_json_to_python() {
        assert_eq!(literal(&json!(null)), "None");
        assert_eq!(literal(&json!(true)), "True");
        assert_eq!(literal(&json!(0.2)), "0.2");
        assert_eq!(literal(&json!([1, "two", false])), "[1, \"two\", False]");
        assert_eq!(
            literal(&json!({"b": 1, "a": null})),
            "{\"a\": None, \"b\": 1}"
        );
    }

    #[test]
    fn dict_literal_sorted_by_key() {
        let mut settings = BTreeMap::new();
        settings.insert("temperature".to_string(), json!(0.0));
        settings.insert("max_tokens".to_string(), json!(256));

        assert_eq!(
            dict_literal(&settings),
            "{\"max_tokens\": 256, \"temperature\": 0.0}"
        );
        assert_eq!(dict_literal(&BTreeMap::new()), "{}");
    }

    #[test]
    fn keywords() {
        assert!(is_keyword("class"));
        assert!(is_keyword("None"));
        assert!(!is_keyword("match"));
        assert!(!is_keyword("approver"));
    }
}
