//! Recursive plain-text rendering of full profile payloads.
//!
//! Used by the report's expanded profile view: every field is printed,
//! nested objects and arrays indent one level, URLs are shortened,
//! booleans become Yes/No, and ISO-looking strings are reformatted as
//! dates. Recursion depth is capped so a pathological payload cannot
//! blow the stack.

use serde_json::{Map, Value};

use crate::profile::format::{
    format_datetime, format_short_date, humanize_key, parse_date_str, truncate_url,
};

/// Maximum nesting level rendered; deeper values are elided.
const MAX_RENDER_DEPTH: usize = 8;

/// Renders a whole profile payload, one line per scalar field.
pub fn render_profile(profile: &Map<String, Value>) -> String {
    let mut out = String::new();
    for (key, value) in profile {
        out.push_str(&render_value(&humanize_key(key), value, 0));
    }
    out
}

/// Renders one labelled value at the given depth. Null and empty
/// values produce nothing.
pub fn render_value(key: &str, value: &Value, depth: usize) -> String {
    if depth > MAX_RENDER_DEPTH {
        return format!("{}{}: …\n", indent(depth), key);
    }

    match value {
        Value::Null => String::new(),
        Value::String(s) if s.is_empty() => String::new(),

        Value::Array(items) => {
            if items.is_empty() {
                return String::new();
            }
            let mut out = format!("{}{}:\n", indent(depth), key);
            for item in items {
                match item {
                    Value::Object(obj) => {
                        for (sub_key, sub_value) in obj {
                            out.push_str(&render_value(
                                &humanize_key(sub_key),
                                sub_value,
                                depth + 1,
                            ));
                        }
                    }
                    scalar => {
                        out.push_str(&format!("{}- {}\n", indent(depth + 1), scalar_text(scalar)));
                    }
                }
            }
            out
        }

        Value::Object(obj) => {
            if obj.is_empty() {
                return String::new();
            }
            let mut out = format!("{}{}:\n", indent(depth), key);
            for (sub_key, sub_value) in obj {
                out.push_str(&render_value(&humanize_key(sub_key), sub_value, depth + 1));
            }
            out
        }

        Value::String(s) if s.starts_with("http://") || s.starts_with("https://") => {
            format!("{}{}: {}\n", indent(depth), key, truncate_url(s))
        }

        Value::Bool(b) => {
            format!("{}{}: {}\n", indent(depth), key, yes_no(*b))
        }
        Value::String(s) if s == "True" || s == "False" => {
            format!("{}{}: {}\n", indent(depth), key, yes_no(s == "True"))
        }

        Value::String(s) if looks_like_iso_date(s) => match parse_date_str(s) {
            Some(dt) => {
                let formatted = if s.contains('T') {
                    format_datetime(&dt)
                } else {
                    format_short_date(&dt)
                };
                format!("{}{}: {}\n", indent(depth), key, formatted)
            }
            None => format!("{}{}: {}\n", indent(depth), key, s),
        },

        scalar => format!("{}{}: {}\n", indent(depth), key, scalar_text(scalar)),
    }
}

fn indent(depth: usize) -> String {
    "  ".repeat(depth)
}

fn yes_no(value: bool) -> &'static str {
    if value {
        "Yes"
    } else {
        "No"
    }
}

fn scalar_text(value: &Value) -> String {
    match value {
        Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Cheap shape check before attempting a real date parse: `YYYY-MM-DD`
/// optionally followed by a time.
fn looks_like_iso_date(s: &str) -> bool {
    let bytes = s.as_bytes();
    bytes.len() >= 10
        && bytes[..4].iter().all(u8::is_ascii_digit)
        && bytes[4] == b'-'
        && bytes[5..7].iter().all(u8::is_ascii_digit)
        && bytes[7] == b'-'
        && bytes[8..10].iter().all(u8::is_ascii_digit)
}
