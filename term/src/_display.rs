use std::fmt::{self, Write};

/// Write `txt` escaped as the content of a double-quoted
/// SPARQL / N-Triples string literal (without the surrounding quotes).
///
/// `"` and `\` are always escaped, as well as control characters
/// and the non-characters U+FFFE and U+FFFF.
pub fn quoted_string<W: Write>(w: &mut W, txt: &str) -> fmt::Result {
    let mut start = 0;
    for (i, c) in txt.char_indices() {
        let escaped = match c {
            '\u{08}' => "\\b",
            '\t' => "\\t",
            '\n' => "\\n",
            '\u{0c}' => "\\f",
            '\r' => "\\r",
            '"' => "\\\"",
            '\\' => "\\\\",
            '\u{00}'..='\u{1f}' | '\u{7f}' | '\u{fffe}' | '\u{ffff}' => "",
            _ => continue,
        };
        w.write_str(&txt[start..i])?;
        if escaped.is_empty() {
            write!(w, "\\u{:04X}", c as u32)?;
        } else {
            w.write_str(escaped)?;
        }
        start = i + c.len_utf8();
    }
    w.write_str(&txt[start..])
}

#[cfg(test)]
mod test {
    use super::*;
    use test_case::test_case;

    #[test_case("plain", "plain"; "nothing to escape")]
    #[test_case("a\"b", "a\\\"b"; "quote")]
    #[test_case("a\\b", "a\\\\b"; "backslash")]
    #[test_case("l1\nl2\r\n", "l1\\nl2\\r\\n"; "newlines")]
    #[test_case("\tx", "\\tx"; "tab")]
    #[test_case("\u{0}\u{7f}", "\\u0000\\u007F"; "other controls")]
    #[test_case("caf\u{e9}", "caf\u{e9}"; "non ascii kept")]
    #[test_case("\u{fffe}", "\\uFFFE"; "non character")]
    fn escape(txt: &str, expected: &str) {
        let mut got = String::new();
        quoted_string(&mut got, txt).unwrap();
        assert_eq!(got, expected);
    }
}
