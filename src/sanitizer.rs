//! HTML sanitization for YouTube comment text.
//!
//! The comments API returns `textDisplay` as HTML: line breaks as `<br>`,
//! links and timestamps as `<a>` tags, and reserved characters as entities.

use std::borrow::Cow;

/// Strips HTML tags and comments from a string, preserving the text content.
///
/// This function:
/// - Turns `<br>` variants into newlines
/// - Removes all other HTML tags and `<!-- ... -->` comments
/// - Decodes common HTML entities
/// - Collapses excessive blank lines (3+ consecutive newlines become 2)
///
/// # Examples
/// ```
/// use yt_comments::sanitizer::strip_html;
///
/// let html = "First<br>Second";
/// assert_eq!(strip_html(html), "First\nSecond");
///
/// let link = r#"see <a href="https://www.youtube.com/watch?v=x&amp;t=42">0:42</a>"#;
/// assert_eq!(strip_html(link), "see 0:42");
/// ```
pub fn strip_html(input: &str) -> Cow<'_, str> {
    // Nothing to strip or decode
    if !input.contains('<') && !input.contains('&') {
        return Cow::Borrowed(input);
    }

    let mut result = String::with_capacity(input.len());
    let mut chars = input.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '<' {
            result.push(c);
            continue;
        }

        if chars.peek() == Some(&'!') {
            let lookahead: String = chars.clone().take(3).collect();
            if lookahead.starts_with("!--") {
                chars.next();
                chars.next();
                chars.next();

                let mut prev_prev = ' ';
                let mut prev = ' ';
                for ch in chars.by_ref() {
                    if prev_prev == '-' && prev == '-' && ch == '>' {
                        break;
                    }
                    prev_prev = prev;
                    prev = ch;
                }
                continue;
            }
        }

        let mut tag = String::new();
        for ch in chars.by_ref() {
            if ch == '>' {
                break;
            }
            tag.push(ch);
        }

        if is_line_break(&tag) {
            result.push('\n');
        }
    }

    let decoded = decode_entities(&result);
    Cow::Owned(collapse_blank_lines(&decoded))
}

/// Returns true for `br`, `br/` and `br /` tag bodies in any case.
fn is_line_break(tag: &str) -> bool {
    let name = tag.trim().trim_end_matches('/').trim();
    name.eq_ignore_ascii_case("br")
}

/// Decodes the named entities YouTube emits plus decimal and hex references.
fn decode_entities(input: &str) -> String {
    if !input.contains('&') {
        return input.to_string();
    }

    let mut result = String::with_capacity(input.len());
    let mut rest = input;

    while let Some(amp) = rest.find('&') {
        result.push_str(&rest[..amp]);
        let tail = &rest[amp..];

        let decoded = tail
            .find(';')
            .filter(|&semi| semi <= 10)
            .and_then(|semi| decode_entity(&tail[1..semi]).map(|ch| (ch, semi)));

        match decoded {
            Some((ch, semi)) => {
                result.push(ch);
                rest = &tail[semi + 1..];
            }
            None => {
                result.push('&');
                rest = &tail[1..];
            }
        }
    }
    result.push_str(rest);

    result
}

fn decode_entity(name: &str) -> Option<char> {
    match name {
        "amp" => Some('&'),
        "lt" => Some('<'),
        "gt" => Some('>'),
        "quot" => Some('"'),
        "apos" => Some('\''),
        "nbsp" => Some('\u{a0}'),
        _ => {
            let code = if let Some(hex) = name
                .strip_prefix("#x")
                .or_else(|| name.strip_prefix("#X"))
            {
                u32::from_str_radix(hex, 16).ok()?
            } else {
                name.strip_prefix('#')?.parse::<u32>().ok()?
            };
            char::from_u32(code)
        }
    }
}

/// Collapses 3 or more consecutive newlines into 2 newlines.
fn collapse_blank_lines(input: &str) -> String {
    let mut result = String::with_capacity(input.len());
    let mut newline_count = 0;

    for c in input.chars() {
        if c == '\n' {
            newline_count += 1;
            if newline_count <= 2 {
                result.push(c);
            }
        } else {
            newline_count = 0;
            result.push(c);
        }
    }

    result
}
