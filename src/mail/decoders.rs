/// Decodes RFC 2047 encoded-words in a raw header value.
///
/// Used for the `Subject` and `From` display name of rows built from `.eml`
/// files, so rule tokens match the text a reader sees rather than `=?utf-8?...`.
pub fn decode_mime_words(raw: &[u8]) -> String {
    // mailparse expects a full "Key: value" header line
    let mut line = b"X: ".to_vec();
    line.extend_from_slice(raw);
    line.extend_from_slice(b"\r\n");

    match mailparse::parse_header(&line) {
        Ok((h, _idx)) => h.get_value(),
        Err(_) => String::from_utf8_lossy(raw).into_owned(),
    }
}

/// Collapses body text into a single line of at most `max_chars` characters.
///
/// This is the row snippet `content` rules are matched against; blank lines
/// and indentation from the mail body are dropped.
pub fn normalize_snippet(s: &str, max_chars: usize) -> String {
    let mut out = String::new();
    for line in s.lines() {
        let line = line.trim();
        if line.is_empty() {
            continue;
        }
        if !out.is_empty() {
            out.push(' ');
        }
        out.push_str(line);
        if out.chars().count() >= max_chars {
            break;
        }
    }
    out.chars().take(max_chars).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snippet_joins_lines_and_truncates() {
        assert_eq!(normalize_snippet("  hello\n\n world \n", 140), "hello world");
        assert_eq!(normalize_snippet("abcdef", 3), "abc");
    }

    #[test]
    fn decodes_encoded_words() {
        assert_eq!(decode_mime_words(b"=?UTF-8?Q?Caf=C3=A9?="), "Café");
        assert_eq!(decode_mime_words(b"plain"), "plain");
    }
}
