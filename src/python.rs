//! Small helpers for writing Python source text.

use serde_json::Value;

const KEYWORDS: &[&str] = &[
    "False", "None", "True", "and", "as", "assert", "async", "await", "break", "class",
    "continue", "def", "del", "elif", "else", "except", "finally", "for", "from", "global",
    "if", "import", "in", "is", "lambda", "nonlocal", "not", "or", "pass", "raise", "return",
    "try", "while", "with", "yield",
];

/// Renders a string the way Python's `repr()` does.
pub fn string_literal(value: &str) -> String {
    let quote = if value.contains('\'') && !value.contains('"') {
        '"'
    } else {
        '\''
    };

    let mut out = String::with_capacity(value.len() + 2);
    out.push(quote);
    for c in value.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\t' => out.push_str("\\t"),
            c if c == quote => {
                out.push('\\');
                out.push(c);
            }
            c => out.push(c),
        }
    }
    out.push(quote);
    out
}

/// Renders a JSON value as the equivalent Python literal.
pub fn value_literal(value: &Value) -> String {
    match value {
        Value::Null => "None".to_string(),
        Value::Bool(true) => "True".to_string(),
        Value::Bool(false) => "False".to_string(),
        Value::Number(n) => n.to_string(),
        Value::String(s) => string_literal(s),
        Value::Array(items) => {
            let items: Vec<String> = items.iter().map(value_literal).collect();
            format!("[{}]", items.join(", "))
        }
        Value::Object(map) => {
            let entries: Vec<String> = map
                .iter()
                .map(|(k, v)| format!("{}: {}", string_literal(k), value_literal(v)))
                .collect();
            format!("{{{}}}", entries.join(", "))
        }
    }
}

/// Turns a wire alias into a usable Python identifier.
///
/// Characters that cannot appear in an identifier become `_`; keywords and
/// names starting with a digit get an extra underscore.
pub fn identifier(alias: &str) -> String {
    let mut ident: String = alias
        .chars()
        .map(|c| if c.is_alphanumeric() || c == '_' { c } else { '_' })
        .collect();

    if ident.is_empty() || ident.starts_with(|c: char| c.is_ascii_digit()) {
        ident.insert(0, '_');
    }
    if KEYWORDS.contains(&ident.as_str()) {
        ident.push('_');
    }
    ident
}

/// Prefixes every non-blank line, like `textwrap.indent`.
pub fn indent(text: &str, prefix: &str) -> String {
    text.split_inclusive('\n')
        .map(|line| {
            if line.trim().is_empty() {
                line.to_string()
            } else {
                format!("{}{}", prefix, line)
            }
        })
        .collect()
}

/// Renders a docstring body, escaping embedded triple quotes.
pub fn docstring(text: &str) -> String {
    format!("\"\"\"{}\"\"\"", text.replace("\"\"\"", "\\\"\\\"\\\""))
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_string_literal_quoting() {
        assert_eq!(string_literal("abc"), "'abc'");
        assert_eq!(string_literal("it's"), "\"it's\"");
        assert_eq!(string_literal("both ' and \""), "'both \\' and \"'");
        assert_eq!(string_literal("line\nbreak"), "'line\\nbreak'");
    }

    #[test]
    fn test_value_literal() {
        assert_eq!(value_literal(&json!(null)), "None");
        assert_eq!(value_literal(&json!(true)), "True");
        assert_eq!(value_literal(&json!(10)), "10");
        assert_eq!(value_literal(&json!(2.5)), "2.5");
        assert_eq!(value_literal(&json!(["a", 1])), "['a', 1]");
        assert_eq!(value_literal(&json!({"k": false})), "{'k': False}");
    }

    #[test]
    fn test_identifier() {
        assert_eq!(identifier("item_id"), "item_id");
        assert_eq!(identifier("item-id"), "item_id");
        assert_eq!(identifier("from"), "from_");
        assert_eq!(identifier("2fa"), "_2fa");
    }

    #[test]
    fn test_indent_skips_blank_lines() {
        let text = "def f():\n    pass\n\nx = 1\n";
        assert_eq!(indent(text, "    "), "    def f():\n        pass\n\n    x = 1\n");
    }

    #[test]
    fn test_docstring_escapes_triple_quotes() {
        assert_eq!(docstring("Say \"\"\"hi\"\"\""), r#""""Say \"\"\"hi\"\"\"""""#);
    }
}
