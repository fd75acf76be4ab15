use std::borrow::Cow;
use std::fmt::Write;

/// Escapes `text` for use as XML character data.
///
/// Besides the markup characters, `\r` (which XML parsers normalize away)
/// and every character XML 1.0 forbids are written as character references.
pub(crate) fn escape(text: &str) -> Cow<'_, str> {
    if !text.chars().any(needs_escape) {
        return Cow::Borrowed(text);
    }

    let mut out = String::with_capacity(text.len() + 8);
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            c if needs_escape(c) => {
                let _ = write!(out, "&#x{:X};", u32::from(c));
            }
            c => out.push(c),
        }
    }
    Cow::Owned(out)
}

fn needs_escape(c: char) -> bool {
    match c {
        '&' | '<' | '>' | '\r' => true,
        '\t' | '\n' => false,
        '\u{0}'..='\u{1F}' | '\u{FFFE}' | '\u{FFFF}' => true,
        _ => false,
    }
}

/// Resolves the entity and character references in `text`.
///
/// Unlike a conforming XML processor this accepts references to any code point,
/// so that everything [`escape`] produces can be read back.
pub(crate) fn unescape(text: &str) -> Result<Cow<'_, str>, String> {
    if !text.contains('&') {
        return Ok(Cow::Borrowed(text));
    }

    let mut out = String::with_capacity(text.len());
    let mut rest = text;

    while let Some(amp) = rest.find('&') {
        out.push_str(&rest[..amp]);
        rest = &rest[amp + 1..];

        let Some(semicolon) = rest.find(';') else {
            return Err(format!("unterminated reference in {text:?}"));
        };
        let reference = &rest[..semicolon];
        rest = &rest[semicolon + 1..];

        match reference {
            "amp" => out.push('&'),
            "lt" => out.push('<'),
            "gt" => out.push('>'),
            "quot" => out.push('"'),
            "apos" => out.push('\''),
            _ => out.push(resolve_char_reference(reference)?),
        }
    }

    out.push_str(rest);
    Ok(Cow::Owned(out))
}

fn resolve_char_reference(reference: &str) -> Result<char, String> {
    let code = if let Some(hex) = reference.strip_prefix("#x") {
        u32::from_str_radix(hex, 16)
    } else if let Some(decimal) = reference.strip_prefix('#') {
        decimal.parse()
    } else {
        return Err(format!("unknown entity `&{reference};`"));
    };

    code.ok()
        .and_then(char::from_u32)
        .ok_or_else(|| format!("invalid character reference `&{reference};`"))
}

/// Whether `name` can be used as an XML element name.
pub(crate) fn is_name(name: &str) -> bool {
    let mut chars = name.chars();
    match chars.next() {
        Some(first) if is_name_start_char(first) => chars.all(is_name_char),
        _ => false,
    }
}

fn is_name_start_char(c: char) -> bool {
    matches!(c,
        ':' | 'A'..='Z' | '_' | 'a'..='z'
        | '\u{C0}'..='\u{D6}' | '\u{D8}'..='\u{F6}' | '\u{F8}'..='\u{2FF}'
        | '\u{370}'..='\u{37D}' | '\u{37F}'..='\u{1FFF}' | '\u{200C}'..='\u{200D}'
        | '\u{2070}'..='\u{218F}' | '\u{2C00}'..='\u{2FEF}' | '\u{3001}'..='\u{D7FF}'
        | '\u{F900}'..='\u{FDCF}' | '\u{FDF0}'..='\u{FFFD}' | '\u{10000}'..='\u{EFFFF}')
}

fn is_name_char(c: char) -> bool {
    is_name_start_char(c)
        || matches!(c,
            '-' | '.' | '0'..='9' | '\u{B7}' | '\u{300}'..='\u{36F}' | '\u{203F}'..='\u{2040}')
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn plain_text_is_borrowed() {
        assert!(matches!(escape("class K {}\n\t"), Cow::Borrowed(_)));
        assert!(matches!(unescape("class K {}"), Ok(Cow::Borrowed(_))));
    }

    #[test]
    fn markup_characters() {
        assert_eq!(escape("a < b && c > \"d\""), "a &lt; b &amp;&amp; c &gt; \"d\"");
    }

    #[test]
    fn control_characters() {
        assert_eq!(escape("a\r\nb\u{0}\u{1B}\u{FFFF}"), "a&#xD;\nb&#x0;&#x1B;&#xFFFF;");
    }

    #[test]
    fn unescapes_references() {
        assert_eq!(unescape("&lt;&gt;&amp;&quot;&apos;").unwrap(), "<>&\"'");
        assert_eq!(unescape("&#65;&#x42;&#0;&#xd;").unwrap(), "AB\u{0}\r");
    }

    #[test]
    fn round_trips_every_ascii_char() {
        let text: String = (0..128_u8).map(char::from).chain(['\u{FFFE}', 'é', '🦀']).collect();
        assert_eq!(unescape(&escape(&text)).unwrap(), text);
    }

    #[test]
    fn rejects_bad_references() {
        assert_eq!(unescape("&nbsp;").unwrap_err(), "unknown entity `&nbsp;`");
        assert_eq!(unescape("&#xD800;").unwrap_err(), "invalid character reference `&#xD800;`");
        assert_eq!(unescape("&#12a;").unwrap_err(), "invalid character reference `&#12a;`");
        assert!(unescape("a & b").is_err());
    }

    #[test]
    fn names() {
        assert!(is_name("compilationUnit"));
        assert!(is_name("TOKENS"));
        assert!(is_name("ERROR_CHAR"));
        assert!(is_name("a-b.c1"));
        assert!(!is_name(""));
        assert!(!is_name("1abc"));
        assert!(!is_name("'+'"));
        assert!(!is_name("a b"));
    }
}
