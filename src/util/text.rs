use std::borrow::Cow;

use unicode_width::{UnicodeWidthChar, UnicodeWidthStr};

/// Terminal columns taken by `s`. Wide CJK and emoji count as two.
pub fn display_width(s: &str) -> usize {
    UnicodeWidthStr::width(s)
}

const ELLIPSIS: &str = "...";
const ELLIPSIS_WIDTH: usize = 3;

/// Cut `s` to at most `max_width` columns, ending in "..." when shortened.
///
/// Widths of three or less have no room for the ellipsis and return as many
/// leading characters as fit. Borrows when nothing is cut.
pub fn truncate_to_width(s: &str, max_width: usize) -> Cow<'_, str> {
    if max_width == 0 {
        return Cow::Borrowed("");
    }
    if display_width(s) <= max_width {
        return Cow::Borrowed(s);
    }

    let budget = if max_width <= ELLIPSIS_WIDTH {
        max_width
    } else {
        max_width - ELLIPSIS_WIDTH
    };
    let mut used = 0;
    let mut end = 0;
    for (idx, c) in s.char_indices() {
        let w = UnicodeWidthChar::width(c).unwrap_or(0);
        if used + w > budget {
            break;
        }
        used += w;
        end = idx + c.len_utf8();
    }

    if max_width <= ELLIPSIS_WIDTH {
        Cow::Owned(s[..end].to_string())
    } else {
        Cow::Owned(format!("{}{}", &s[..end], ELLIPSIS))
    }
}

fn is_control(b: u8) -> bool {
    b == 0x7f || (b < 0x20 && b != b'\t' && b != b'\n' && b != b'\r')
}

/// Remove terminal control bytes and ANSI escape sequences from server text.
///
/// Feed titles and item bodies come from arbitrary sites and are drawn straight
/// into the terminal. Tab, newline and carriage return survive.
pub fn strip_control_chars(s: &str) -> Cow<'_, str> {
    let bytes = s.as_bytes();
    if !bytes.iter().any(|&b| b == 0x1b || is_control(b)) {
        return Cow::Borrowed(s);
    }

    let mut out = String::with_capacity(s.len());
    let mut i = 0;
    while i < bytes.len() {
        let b = bytes[i];
        if b == 0x1b {
            match bytes.get(i + 1) {
                // CSI: parameters up to a final byte in 0x40..=0x7e
                Some(b'[') => {
                    i += 2;
                    while i < bytes.len() {
                        let c = bytes[i];
                        i += 1;
                        if (0x40..=0x7e).contains(&c) {
                            break;
                        }
                    }
                }
                // OSC: up to BEL or ST
                Some(b']') => {
                    i += 2;
                    while i < bytes.len() {
                        if bytes[i] == 0x07 {
                            i += 1;
                            break;
                        }
                        if bytes[i] == 0x1b && bytes.get(i + 1) == Some(&b'\\') {
                            i += 2;
                            break;
                        }
                        i += 1;
                    }
                }
                _ => i += 1,
            }
        } else if is_control(b) {
            i += 1;
        } else {
            let start = i;
            while i < bytes.len() && bytes[i] != 0x1b && !is_control(bytes[i]) {
                i += 1;
            }
            // Control bytes are ASCII, so the run ends on a char boundary.
            out.push_str(&s[start..i]);
        }
    }
    Cow::Owned(out)
}

// ============================================================================
// HTML → text
// ============================================================================

/// Tags that end a paragraph.
const BLOCK_TAGS: &[&str] = &[
    "p", "div", "br", "li", "ul", "ol", "h1", "h2", "h3", "h4", "h5", "h6", "blockquote", "pre",
    "tr", "table", "section", "article", "figure", "figcaption", "hr",
];

/// Tags whose content is never shown.
const HIDDEN_TAGS: &[&str] = &["script", "style", "head", "noscript"];

/// Flatten item HTML into paragraphs for the reading pane.
///
/// Block tags split paragraphs, list items get a bullet, the common entities
/// are decoded and whitespace inside a paragraph is collapsed unless
/// `preserve_whitespace` is set.
pub fn html_to_paragraphs(html: &str, preserve_whitespace: bool) -> Vec<String> {
    let html = strip_control_chars(html);
    let mut paragraphs = Vec::new();
    let mut current = String::new();
    let mut hidden_depth = 0usize;
    let mut rest: &str = &html;

    while !rest.is_empty() {
        let Some(lt) = rest.find('<') else {
            if hidden_depth == 0 {
                current.push_str(&decode_entities(rest));
            }
            break;
        };
        if hidden_depth == 0 {
            current.push_str(&decode_entities(&rest[..lt]));
        }
        let after = &rest[lt + 1..];
        let Some(gt) = after.find('>') else {
            if hidden_depth == 0 {
                current.push_str(&decode_entities(&rest[lt..]));
            }
            break;
        };
        let tag = &after[..gt];
        rest = &after[gt + 1..];

        let closing = tag.starts_with('/');
        let name: String = tag
            .trim_start_matches('/')
            .chars()
            .take_while(|c| c.is_ascii_alphanumeric())
            .collect::<String>()
            .to_ascii_lowercase();

        if HIDDEN_TAGS.contains(&name.as_str()) {
            if closing {
                hidden_depth = hidden_depth.saturating_sub(1);
            } else if !tag.ends_with('/') {
                hidden_depth += 1;
            }
            continue;
        }
        if hidden_depth > 0 {
            continue;
        }
        if BLOCK_TAGS.contains(&name.as_str()) {
            push_paragraph(&mut paragraphs, &mut current, preserve_whitespace);
            if name == "li" && !closing {
                current.push_str("• ");
            }
        }
    }
    push_paragraph(&mut paragraphs, &mut current, preserve_whitespace);
    paragraphs
}

fn push_paragraph(out: &mut Vec<String>, current: &mut String, preserve_whitespace: bool) {
    let text = if preserve_whitespace {
        current.trim_matches('\n').to_string()
    } else {
        current.split_whitespace().collect::<Vec<_>>().join(" ")
    };
    current.clear();
    if !text.trim().is_empty() && text.trim() != "•" {
        out.push(text);
    }
}

/// Decode the named entities feeds actually use, plus numeric references.
pub fn decode_entities(s: &str) -> Cow<'_, str> {
    if !s.contains('&') {
        return Cow::Borrowed(s);
    }
    let mut out = String::with_capacity(s.len());
    let mut rest = s;
    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        let after = &rest[amp + 1..];
        let decoded = after.find(';').filter(|&semi| semi <= 10).and_then(|semi| {
            let entity = &after[..semi];
            let c = match entity {
                "amp" => Some('&'),
                "lt" => Some('<'),
                "gt" => Some('>'),
                "quot" => Some('"'),
                "apos" | "#39" => Some('\''),
                "nbsp" => Some(' '),
                "hellip" => Some('…'),
                "mdash" => Some('—'),
                "ndash" => Some('–'),
                _ => entity
                    .strip_prefix("#x")
                    .or_else(|| entity.strip_prefix("#X"))
                    .and_then(|hex| u32::from_str_radix(hex, 16).ok())
                    .or_else(|| entity.strip_prefix('#').and_then(|d| d.parse().ok()))
                    .and_then(char::from_u32),
            };
            c.map(|c| (c, semi))
        });
        match decoded {
            Some((c, semi)) => {
                out.push(c);
                rest = &after[semi + 1..];
            }
            None => {
                out.push('&');
                rest = after;
            }
        }
    }
    out.push_str(rest);
    Cow::Owned(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_display_width_wide_chars() {
        assert_eq!(display_width("Hello"), 5);
        assert_eq!(display_width("你好"), 4);
    }

    #[test]
    fn test_truncate_fits_borrows() {
        assert!(matches!(truncate_to_width("Short", 10), Cow::Borrowed("Short")));
    }

    #[test]
    fn test_truncate_adds_ellipsis() {
        assert_eq!(truncate_to_width("Hello World", 8), "Hello...");
        assert_eq!(truncate_to_width("你好世界", 7), "你好...");
    }

    #[test]
    fn test_truncate_narrow_widths() {
        assert_eq!(truncate_to_width("Test!", 0), "");
        assert_eq!(truncate_to_width("Test!", 1), "T");
        assert_eq!(truncate_to_width("Test!", 3), "Tes");
    }

    #[test]
    fn test_strip_control_chars() {
        assert!(matches!(strip_control_chars("plain\ttext\n"), Cow::Borrowed(_)));
        assert_eq!(strip_control_chars("\x1b[31mred\x1b[0m"), "red");
        assert_eq!(strip_control_chars("a\x1b]0;title\x07b"), "ab");
        assert_eq!(strip_control_chars("bell\x07 del\x7f"), "bell del");
    }

    #[test]
    fn test_html_paragraphs() {
        let html = "<p>First   line\n of text</p><p>Second &amp; last</p>";
        assert_eq!(
            html_to_paragraphs(html, false),
            vec!["First line of text", "Second & last"]
        );
    }

    #[test]
    fn test_html_hides_scripts_and_bullets_lists() {
        let html = "<script>alert(1)</script><ul><li>one</li><li>two</li></ul>";
        assert_eq!(html_to_paragraphs(html, false), vec!["• one", "• two"]);
    }

    #[test]
    fn test_html_preserves_whitespace_when_asked() {
        let html = "<pre>fn main() {\n    run();\n}</pre>";
        assert_eq!(
            html_to_paragraphs(html, true),
            vec!["fn main() {\n    run();\n}"]
        );
    }

    #[test]
    fn test_decode_numeric_entities() {
        assert_eq!(decode_entities("&#8217;s &#x41; &bogus; &"), "’s A &bogus; &");
    }
}
