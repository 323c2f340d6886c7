use tracing::trace;
use vtgrid_common::error::{Result, VtGridError};

/// Decode `hexdump -C` style text into the raw octets it describes.
///
/// Each stanza line is an offset in lowercase hex, up to 16 two-digit byte
/// tokens, and an optional `|ascii|` pane that is ignored. Lines that do
/// not start with a well-formed offset (headers such as `stdout:`, blank
/// lines) are skipped; an offset with no byte tokens is the usual trailer
/// and contributes nothing.
pub fn parse_hex_dump(input: &[u8]) -> Result<Vec<u8>> {
    let text = String::from_utf8_lossy(input);
    let mut bytes = Vec::new();
    for (index, line) in text.lines().enumerate() {
        decode_line(line, index + 1, &mut bytes)?;
    }
    Ok(bytes)
}

fn decode_line(line: &str, number: usize, out: &mut Vec<u8>) -> Result<()> {
    // Everything from the first '|' on is the ASCII pane
    let data = line.split('|').next().unwrap_or("");
    let mut tokens = data.split_whitespace();

    let Some(offset) = tokens.next() else {
        return Ok(());
    };
    if !is_offset(offset) {
        trace!("skipping non-dump line {}", number);
        return Ok(());
    }

    let mut count = 0usize;
    for token in tokens {
        count += 1;
        if count > 16 {
            return Err(VtGridError::MalformedHexDump(format!(
                "more than 16 byte pairs on line {number}"
            )));
        }
        if token.len() != 2 || !token.bytes().all(|b| b.is_ascii_hexdigit()) {
            return Err(VtGridError::MalformedHexDump(format!(
                "bad byte token {token:?} on line {number}"
            )));
        }
        let value = u8::from_str_radix(token, 16).map_err(|e| {
            VtGridError::MalformedHexDump(format!("byte token {token:?} on line {number}: {e}"))
        })?;
        out.push(value);
    }
    Ok(())
}

/// An offset is one or more lowercase hexadecimal digits
fn is_offset(token: &str) -> bool {
    !token.is_empty()
        && token
            .bytes()
            .all(|b| b.is_ascii_digit() || (b'a'..=b'f').contains(&b))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_single_line() {
        let input = b"00000000  48 65 6c 6c 6f 2c 20 77  6f 72 6c 64 21           |Hello, world!|\n";
        assert_eq!(parse_hex_dump(input).unwrap(), b"Hello, world!");
    }

    #[test]
    fn test_multi_line_with_trailer() {
        let input = b"\
00000000  54 68 65 20 71 75 69 63  6b 20 62 72 6f 77 6e 20  |The quick brown |
00000010  66 6f 78                                          |fox|
00000013
";
        assert_eq!(parse_hex_dump(input).unwrap(), b"The quick brown fox");
    }

    #[test]
    fn test_header_lines_skipped() {
        let input = b"\
stdout:
00000000  68 69                                             |hi|
";
        assert_eq!(parse_hex_dump(input).unwrap(), b"hi");
    }

    #[test]
    fn test_escape_bytes() {
        let input = b"00000000  1b 5b 48 1b 5b 32 4a                              |.[H.[2J|\n";
        assert_eq!(parse_hex_dump(input).unwrap(), b"\x1b[H\x1b[2J");
    }

    #[test]
    fn test_blank_lines_skipped() {
        let input = b"\n\n00000000  41\n\n";
        assert_eq!(parse_hex_dump(input).unwrap(), b"A");
    }

    #[test]
    fn test_uppercase_offset_is_not_a_stanza() {
        // Offsets are lowercase; this line does not match the pattern
        let input = b"DEADBEEF  41 42\n";
        assert_eq!(parse_hex_dump(input).unwrap(), b"");
    }

    #[test]
    fn test_odd_length_token_fails() {
        let input = b"00000000  48 6\n";
        let err = parse_hex_dump(input).unwrap_err();
        assert!(matches!(err, VtGridError::MalformedHexDump(_)));
    }

    #[test]
    fn test_non_hex_token_fails() {
        let input = b"00000000  48 6g\n";
        let err = parse_hex_dump(input).unwrap_err();
        assert!(matches!(err, VtGridError::MalformedHexDump(_)));
    }

    #[test]
    fn test_too_many_pairs_fails() {
        let mut line = String::from("00000000 ");
        for _ in 0..17 {
            line.push_str(" 41");
        }
        line.push('\n');
        let err = parse_hex_dump(line.as_bytes()).unwrap_err();
        assert!(matches!(err, VtGridError::MalformedHexDump(_)));
    }

    #[test]
    fn test_empty_input() {
        assert_eq!(parse_hex_dump(b"").unwrap(), Vec::<u8>::new());
    }
}
