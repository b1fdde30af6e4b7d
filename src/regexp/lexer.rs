//! Lexical analysis of a regexp pattern into a token stream.
//!
//! Generalizes the teacher's single-character `lex` to a byte-oriented
//! grammar: character classes, binary patterns, and explicit repeat
//! counts are scanned whole here rather than re-tokenized by the parser,
//! since each has its own bracket-delimited sub-grammar (`[...]`,
//! `<...>`, `{...}`) that is awkward to express as a flat token sequence.
//!
//! Byte escapes recognized outside a named class shorthand: `\xHH`,
//! `\r \n \t \f \e \a \b \0`; any other escaped byte stands for itself.
//! `\v` is reserved for the vertical-whitespace named-class shorthand (see
//! [`super`] module docs) rather than doubling as the raw `0x0b` byte —
//! use `\x0b` for the literal vertical tab.

use crate::errors::LexError;
use crate::fa::class::CharClass;

use super::tokens::{ClassAtom, Token, TokenKind};

/// Lexes a full pattern (already stripped of its `^`/`$` anchors by
/// [`super::regexp_fa`]) into a token stream terminated by
/// [`TokenKind::Eos`].
pub fn lex(bytes: &[u8]) -> Result<Vec<Token>, LexError> {
    let mut tokens = Vec::new();
    let mut i = 0;

    while i < bytes.len() {
        let pos = i;
        let b = bytes[i];

        match b {
            b'|' => {
                tokens.push(Token::new(TokenKind::Or, pos));
                i += 1;
            }
            b'*' => {
                tokens.push(Token::new(TokenKind::Star, pos));
                i += 1;
            }
            b'+' => {
                tokens.push(Token::new(TokenKind::Plus, pos));
                i += 1;
            }
            b'?' => {
                tokens.push(Token::new(TokenKind::QMark, pos));
                i += 1;
            }
            b')' => {
                tokens.push(Token::new(TokenKind::RParen, pos));
                i += 1;
            }
            b'(' => {
                if bytes[i..].starts_with(b"(?i:") {
                    tokens.push(Token::new(TokenKind::LParenICase, pos));
                    i += 4;
                } else {
                    tokens.push(Token::new(TokenKind::LParen, pos));
                    i += 1;
                }
            }
            b'.' => {
                tokens.push(Token::new(TokenKind::Dot, pos));
                i += 1;
            }
            b'[' => {
                let (atom, ni) = lex_class(bytes, i + 1)?;
                tokens.push(Token::new(TokenKind::Class(atom), pos));
                i = ni;
            }
            b'<' => {
                let (pat, ni) = lex_binary(bytes, i + 1)?;
                tokens.push(Token::new(TokenKind::Binary(pat), pos));
                i = ni;
            }
            b'{' => match lex_repeat_braces(bytes, i + 1) {
                Some((min, max, exact, ni)) => {
                    tokens.push(Token::new(TokenKind::Repeat { min, max, exact }, pos));
                    i = ni;
                }
                None => {
                    tokens.push(Token::new(TokenKind::Literal(b'{'), pos));
                    i += 1;
                }
            },
            b'\\' => {
                let k = i + 1;
                if k >= bytes.len() {
                    return Err(LexError::new(pos, "dangling escape"));
                }
                if is_class_shorthand(bytes[k]) {
                    let name = (bytes[k] as char).to_string();
                    let class = CharClass::named(&name, false).expect("valid shorthand letter");
                    tokens.push(Token::new(
                        TokenKind::Class(ClassAtom { class, neg: false }),
                        pos,
                    ));
                    i = k + 1;
                } else {
                    let (byte, ni) = byte_escape(bytes, k)?;
                    tokens.push(Token::new(TokenKind::Literal(byte), pos));
                    i = ni;
                }
            }
            _ => {
                tokens.push(Token::new(TokenKind::Literal(b), pos));
                i += 1;
            }
        }
    }

    tokens.push(Token::new(TokenKind::Eos, bytes.len()));
    Ok(tokens)
}

/// `true` for the letters recognized as class-shorthand escapes: `\d \D
/// \s \S \w \W \h \H \v \V`.
fn is_class_shorthand(b: u8) -> bool {
    matches!(
        b,
        b'd' | b'D' | b's' | b'S' | b'w' | b'W' | b'h' | b'H' | b'v' | b'V'
    )
}

/// Decodes one byte escape. `bytes[i]` is the character immediately after
/// the backslash.
fn byte_escape(bytes: &[u8], i: usize) -> Result<(u8, usize), LexError> {
    let Some(&c) = bytes.get(i) else {
        return Err(LexError::new(i, "dangling escape"));
    };

    match c {
        b'x' => {
            let hex = bytes
                .get(i + 1..i + 3)
                .ok_or_else(|| LexError::new(i, "incomplete \\x escape"))?;
            let s = std::str::from_utf8(hex).map_err(|_| LexError::new(i, "invalid \\x escape"))?;
            let v = u8::from_str_radix(s, 16).map_err(|_| LexError::new(i, "invalid \\x escape"))?;
            Ok((v, i + 3))
        }
        b'r' => Ok((b'\r', i + 1)),
        b'n' => Ok((b'\n', i + 1)),
        b't' => Ok((b'\t', i + 1)),
        b'f' => Ok((0x0c, i + 1)),
        b'e' => Ok((0x1b, i + 1)),
        b'a' => Ok((0x07, i + 1)),
        b'b' => Ok((0x08, i + 1)),
        b'0' => Ok((0x00, i + 1)),
        other => Ok((other, i + 1)),
    }
}

/// A byte literal or escape used as one end of an `a-z` range.
fn read_range_endpoint(bytes: &[u8], i: usize) -> Result<(u8, usize), LexError> {
    match bytes.get(i) {
        Some(b'\\') => byte_escape(bytes, i + 1),
        Some(&b) => Ok((b, i + 1)),
        None => Err(LexError::new(i, "unterminated range in character class")),
    }
}

/// Parses a `[:name:]` or `[:^name:]` POSIX bracket expression. `bytes[i]`
/// is the `[` that opens it.
fn lex_posix_name(bytes: &[u8], i: usize) -> Result<(CharClass, usize), LexError> {
    let start = i + 2;
    let mut j = start;
    while j + 1 < bytes.len() && !(bytes[j] == b':' && bytes[j + 1] == b']') {
        j += 1;
    }
    if j + 1 >= bytes.len() {
        return Err(LexError::new(i, "unterminated POSIX class name"));
    }

    let name_bytes = &bytes[start..j];
    let end = j + 2;
    let (name_bytes, neg) = match name_bytes.first() {
        Some(b'^') => (&name_bytes[1..], true),
        _ => (name_bytes, false),
    };
    let name = std::str::from_utf8(name_bytes).map_err(|_| LexError::new(i, "invalid POSIX class name"))?;

    let class = CharClass::named(name, false)
        .ok_or_else(|| LexError::new(i, format!("unknown POSIX class name '{name}'")))?;
    let class = if neg { class.negated_flatten() } else { class };

    Ok((class, end))
}

/// Parses a `[...]` bracket expression. `bytes[i]` is the byte right
/// after the opening `[`.
fn lex_class(bytes: &[u8], i: usize) -> Result<(ClassAtom, usize), LexError> {
    let mut j = i;
    let neg = if bytes.get(j) == Some(&b'^') {
        j += 1;
        true
    } else {
        false
    };

    let mut class = CharClass::empty();
    let mut first = true;

    loop {
        match bytes.get(j) {
            None => return Err(LexError::new(i, "unterminated character class")),
            Some(b']') if !first => {
                j += 1;
                break;
            }
            Some(b'[') if bytes.get(j + 1) == Some(&b':') => {
                let (named, nj) = lex_posix_name(bytes, j)?;
                class = class.merge(named);
                j = nj;
            }
            Some(b'\\') => {
                let k = j + 1;
                if k >= bytes.len() {
                    return Err(LexError::new(j, "dangling escape in character class"));
                }
                if is_class_shorthand(bytes[k]) {
                    let name = (bytes[k] as char).to_string();
                    class = class.merge(CharClass::named(&name, false).expect("valid shorthand letter"));
                    j = k + 1;
                } else {
                    let (b1, nk) = byte_escape(bytes, k)?;
                    if bytes.get(nk) == Some(&b'-') && bytes.get(nk + 1).is_some_and(|&c| c != b']') {
                        let (b2, nk2) = read_range_endpoint(bytes, nk + 1)?;
                        class = class.merge(CharClass::from_ranges(&[(b1, b2)]));
                        j = nk2;
                    } else {
                        class = class.merge(CharClass::from_chars(&[b1]));
                        j = nk;
                    }
                }
            }
            Some(&b1) => {
                let k = j + 1;
                if bytes.get(k) == Some(&b'-') && bytes.get(k + 1).is_some_and(|&c| c != b']') {
                    let (b2, nk2) = read_range_endpoint(bytes, k + 1)?;
                    class = class.merge(CharClass::from_ranges(&[(b1, b2)]));
                    j = nk2;
                } else {
                    class = class.merge(CharClass::from_chars(&[b1]));
                    j = k;
                }
            }
        }
        first = false;
    }

    Ok((ClassAtom { class, neg }, j))
}

/// Parses an unsigned decimal integer starting at `j`.
fn lex_digits(bytes: &[u8], j: usize) -> Option<(u32, usize)> {
    let start = j;
    let mut k = j;
    while k < bytes.len() && bytes[k].is_ascii_digit() {
        k += 1;
    }
    if k == start {
        return None;
    }
    let s = std::str::from_utf8(&bytes[start..k]).ok()?;
    s.parse().ok().map(|v| (v, k))
}

/// Parses `{m}`, `{m,}`, or `{m,n}`. `bytes[i]` is the byte right after
/// the opening `{`. Returns `None` on anything that doesn't parse as a
/// repeat count, so the caller can fall back to treating `{` as a
/// literal byte (as most regex dialects do for a malformed brace group).
fn lex_repeat_braces(bytes: &[u8], i: usize) -> Option<(u32, Option<u32>, bool, usize)> {
    let (min, mut j) = lex_digits(bytes, i)?;

    if bytes.get(j) == Some(&b'}') {
        return Some((min, None, true, j + 1));
    }

    if bytes.get(j) != Some(&b',') {
        return None;
    }
    j += 1;

    if bytes.get(j) == Some(&b'}') {
        return Some((min, None, false, j + 1));
    }

    let (max, nj) = lex_digits(bytes, j)?;
    j = nj;
    if bytes.get(j) == Some(&b'}') {
        return Some((min, Some(max), false, j + 1));
    }

    None
}

/// Parses a `<part,part,...>` binary pattern. `bytes[i]` is the byte
/// right after the opening `<`.
fn lex_binary(bytes: &[u8], i: usize) -> Result<(crate::fa::binary::BinPattern, usize), LexError> {
    use crate::fa::binary::BinPattern;

    let mut pat = BinPattern::new();
    let mut j = i;

    loop {
        if bytes.get(j) == Some(&b'_') {
            j += 1;
            if bytes.get(j) != Some(&b':') {
                return Err(LexError::new(j, "expected ':' after '_' in binary pattern"));
            }
            j += 1;
            let (bits, nj) = lex_digits(bytes, j)
                .ok_or_else(|| LexError::new(j, "expected bit width in binary pattern"))?;
            pat.push_wild(bits);
            j = nj;
        } else {
            let (value, nj) = lex_binary_value(bytes, j)?;
            j = nj;
            if bytes.get(j) != Some(&b':') {
                return Err(LexError::new(j, "expected ':' in binary pattern"));
            }
            j += 1;
            let (bits, nj2) = lex_digits(bytes, j)
                .ok_or_else(|| LexError::new(j, "expected bit width in binary pattern"))?;
            pat.push_value(value, bits);
            j = nj2;
        }

        match bytes.get(j) {
            Some(b',') => {
                j += 1;
            }
            Some(b'>') => {
                j += 1;
                break;
            }
            _ => return Err(LexError::new(j, "expected ',' or '>' in binary pattern")),
        }
    }

    Ok((pat, j))
}

/// Parses one binary-pattern value: `0x` hex, `0b` binary, or plain
/// decimal.
fn lex_binary_value(bytes: &[u8], i: usize) -> Result<(u32, usize), LexError> {
    let (radix, start) = if bytes[i..].starts_with(b"0x") || bytes[i..].starts_with(b"0X") {
        (16, i + 2)
    } else if bytes[i..].starts_with(b"0b") || bytes[i..].starts_with(b"0B") {
        (2, i + 2)
    } else {
        (10, i)
    };

    let mut j = start;
    while j < bytes.len() && (bytes[j] as char).is_digit(radix) {
        j += 1;
    }
    if j == start {
        return Err(LexError::new(i, "expected a value in binary pattern"));
    }

    let s = std::str::from_utf8(&bytes[start..j]).map_err(|_| LexError::new(i, "invalid binary pattern value"))?;
    let v = u32::from_str_radix(s, radix).map_err(|_| LexError::new(i, "binary pattern value out of range"))?;
    Ok((v, j))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lexes_literals_and_metachars() {
        let tokens = lex(b"a|b*").unwrap();
        assert!(matches!(tokens[0].kind, TokenKind::Literal(b'a')));
        assert!(matches!(tokens[1].kind, TokenKind::Or));
        assert!(matches!(tokens[2].kind, TokenKind::Literal(b'b')));
        assert!(matches!(tokens[3].kind, TokenKind::Star));
        assert!(matches!(tokens[4].kind, TokenKind::Eos));
    }

    #[test]
    fn lexes_hex_escape() {
        let tokens = lex(b"\\x41").unwrap();
        assert!(matches!(tokens[0].kind, TokenKind::Literal(b'A')));
    }

    #[test]
    fn lexes_class_range() {
        let tokens = lex(b"[a-z]").unwrap();
        match &tokens[0].kind {
            TokenKind::Class(atom) => {
                let map = atom.class.flatten(atom.neg, false);
                assert!(map.test(b'm'));
                assert!(!map.test(b'A'));
            }
            other => panic!("expected class, got {other:?}"),
        }
    }

    #[test]
    fn lexes_negated_class() {
        let tokens = lex(b"[^a]").unwrap();
        match &tokens[0].kind {
            TokenKind::Class(atom) => assert!(atom.neg),
            other => panic!("expected class, got {other:?}"),
        }
    }

    #[test]
    fn lexes_posix_name_inside_class() {
        let tokens = lex(b"[[:digit:]]").unwrap();
        match &tokens[0].kind {
            TokenKind::Class(atom) => {
                let map = atom.class.flatten(false, false);
                assert!(map.test(b'5'));
                assert!(!map.test(b'a'));
            }
            other => panic!("expected class, got {other:?}"),
        }
    }

    #[test]
    fn lexes_class_shorthand() {
        let tokens = lex(b"\\d").unwrap();
        match &tokens[0].kind {
            TokenKind::Class(atom) => {
                let map = atom.class.flatten(false, false);
                assert!(map.test(b'7'));
            }
            other => panic!("expected class, got {other:?}"),
        }
    }

    #[test]
    fn lexes_repeat_counts() {
        let tokens = lex(b"a{3}b{2,}c{1,4}").unwrap();
        assert!(matches!(
            tokens[1].kind,
            TokenKind::Repeat { min: 3, max: None, exact: true }
        ));
        assert!(matches!(
            tokens[3].kind,
            TokenKind::Repeat { min: 2, max: None, exact: false }
        ));
        assert!(matches!(
            tokens[5].kind,
            TokenKind::Repeat { min: 1, max: Some(4), exact: false }
        ));
    }

    #[test]
    fn malformed_brace_is_literal() {
        let tokens = lex(b"a{x}").unwrap();
        assert!(matches!(tokens[1].kind, TokenKind::Literal(b'{')));
    }

    #[test]
    fn lexes_binary_pattern() {
        let tokens = lex(b"<0xa:4,_:4>").unwrap();
        assert!(matches!(tokens[0].kind, TokenKind::Binary(_)));
    }

    #[test]
    fn lexes_inline_icase_group() {
        let tokens = lex(b"(?i:ab)").unwrap();
        assert!(matches!(tokens[0].kind, TokenKind::LParenICase));
    }
}
