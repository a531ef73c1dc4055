//! Best-effort parsing of JSON that is still being streamed.

/// Parses possibly truncated JSON. Never fails loudly: `None` means
/// "not enough data yet".
pub trait PartialJsonParser: Send + Sync {
    fn parse(&self, candidate: &str) -> Option<serde_json::Value>;
}

/// Closes open strings and containers, backing off to the last complete
/// member when the tail cannot be repaired.
#[derive(Debug, Clone, Copy, Default)]
pub struct LenientJsonParser;

impl PartialJsonParser for LenientJsonParser {
    fn parse(&self, candidate: &str) -> Option<serde_json::Value> {
        let trimmed = candidate.trim();
        if trimmed.is_empty() {
            return None;
        }
        if let Ok(value) = serde_json::from_str(trimmed) {
            return Some(value);
        }

        let mut text = trimmed.to_string();
        loop {
            if let Some(value) = try_close(&text) {
                return Some(value);
            }
            let cut = last_cut_point(&text)?;
            text.truncate(cut);
        }
    }
}

struct Scan {
    closers: Vec<char>,
    in_string: bool,
    dangling_escape: bool,
}

fn scan(text: &str) -> Scan {
    let mut closers = Vec::new();
    let mut in_string = false;
    let mut escaped = false;
    for ch in text.chars() {
        if in_string {
            match (escaped, ch) {
                (true, _) => escaped = false,
                (false, '\\') => escaped = true,
                (false, '"') => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            '{' => closers.push('}'),
            '[' => closers.push(']'),
            '}' | ']' => {
                closers.pop();
            }
            _ => {}
        }
    }
    Scan {
        closers,
        in_string,
        dangling_escape: escaped,
    }
}

fn try_close(text: &str) -> Option<serde_json::Value> {
    let state = scan(text);
    let mut repaired = text.to_string();
    if state.in_string {
        if state.dangling_escape {
            repaired.pop();
        }
        repaired.push('"');
    }

    let body = repaired.trim_end();
    let body = body.strip_suffix(',').unwrap_or(body);
    if body.ends_with(':') {
        return None;
    }

    let mut repaired = body.to_string();
    repaired.extend(state.closers.iter().rev());
    serde_json::from_str(&repaired).ok()
}

/// Byte offset to truncate to: drops the last `,` (and what follows) or keeps
/// the last opening bracket. Only offsets that shrink the text qualify.
fn last_cut_point(text: &str) -> Option<usize> {
    let mut cut = None;
    let mut in_string = false;
    let mut escaped = false;
    for (i, ch) in text.char_indices() {
        if in_string {
            match (escaped, ch) {
                (true, _) => escaped = false,
                (false, '\\') => escaped = true,
                (false, '"') => in_string = false,
                _ => {}
            }
            continue;
        }
        match ch {
            '"' => in_string = true,
            ',' => cut = Some(i),
            '{' | '[' if i + 1 < text.len() => cut = Some(i + 1),
            _ => {}
        }
    }
    cut
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn parse(text: &str) -> Option<serde_json::Value> {
        LenientJsonParser.parse(text)
    }

    #[test]
    fn complete_json_parses_directly() {
        assert_eq!(parse(r#"{"city":"NYC"}"#), Some(json!({"city": "NYC"})));
    }

    #[test]
    fn open_string_is_closed() {
        assert_eq!(parse(r#"{"city":"NY"#), Some(json!({"city": "NY"})));
    }

    #[test]
    fn dangling_key_backs_off() {
        assert_eq!(parse(r#"{"city":"NYC","uni"#), Some(json!({"city": "NYC"})));
        assert_eq!(parse(r#"{"city":"NYC","unit":"#), Some(json!({"city": "NYC"})));
        assert_eq!(parse(r#"{"city":"#), Some(json!({})));
    }

    #[test]
    fn nested_containers_are_closed() {
        assert_eq!(
            parse(r#"{"a":{"b":[1,2"#),
            Some(json!({"a": {"b": [1, 2]}}))
        );
        assert_eq!(parse(r#"{"a":[1,"#), Some(json!({"a": [1]})));
    }

    #[test]
    fn escapes_inside_strings() {
        assert_eq!(parse(r#"{"q":"say \"hi"#), Some(json!({"q": "say \"hi"})));
        assert_eq!(parse(r#"{"q":"a\"#), Some(json!({"q": "a"})));
    }

    #[test]
    fn nothing_parseable_yields_none() {
        assert_eq!(parse(""), None);
        assert_eq!(parse("   "), None);
        assert_eq!(parse("tru"), None);
    }
}
