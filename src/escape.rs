use std::iter::Peekable;
use std::str::CharIndices;

use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum DecodeError {
    #[error("\\ at end of string")]
    TrailingBackslash,
    #[error("truncated \\{escape} escape at position {position}")]
    Truncated { escape: char, position: usize },
    #[error("illegal Unicode character U+{code:X} at position {position}")]
    IllegalCodePoint { code: u32, position: usize },
    #[error("malformed \\N character escape at position {position}")]
    MalformedNamed { position: usize },
    #[error("unknown Unicode character name `{name}` at position {position}")]
    UnknownName { name: String, position: usize },
}

/// Decodes backslash escapes the way Python's `unicode_escape` codec does.
///
/// Unknown escapes are kept verbatim, so `\q` stays a backslash followed by `q`.
pub fn decode_escapes(literal: &str) -> Result<String, DecodeError> {
    let mut decoded = String::with_capacity(literal.len());
    let mut chars = literal.char_indices().peekable();

    while let Some((_, ch)) = chars.next() {
        if ch != '\\' {
            decoded.push(ch);
            continue;
        }
        let (position, escape) = chars.next().ok_or(DecodeError::TrailingBackslash)?;
        match escape {
            '\n' => {}
            '\\' => decoded.push('\\'),
            '\'' => decoded.push('\''),
            '"' => decoded.push('"'),
            'a' => decoded.push('\x07'),
            'b' => decoded.push('\x08'),
            'f' => decoded.push('\x0c'),
            'n' => decoded.push('\n'),
            'r' => decoded.push('\r'),
            't' => decoded.push('\t'),
            'v' => decoded.push('\x0b'),
            '0'..='7' => {
                let mut code = escape as u32 - '0' as u32;
                for _ in 0..2 {
                    match chars.peek() {
                        Some(&(_, digit @ '0'..='7')) => {
                            code = code * 8 + (digit as u32 - '0' as u32);
                            chars.next();
                        }
                        _ => break,
                    }
                }
                decoded.push(code_point(code, position)?);
            }
            'x' => decoded.push(hex_escape(&mut chars, 'x', 2, position)?),
            'u' => decoded.push(hex_escape(&mut chars, 'u', 4, position)?),
            'U' => decoded.push(hex_escape(&mut chars, 'U', 8, position)?),
            'N' => decoded.push(named_escape(&mut chars, position)?),
            other => {
                decoded.push('\\');
                decoded.push(other);
            }
        }
    }

    Ok(decoded)
}

/// Decodes a literal and appends the newline every payload ends with.
pub fn decode_line(literal: &str) -> Result<String, DecodeError> {
    let mut line = decode_escapes(literal)?;
    line.push('\n');
    Ok(line)
}

fn hex_escape(
    chars: &mut Peekable<CharIndices<'_>>,
    escape: char,
    width: usize,
    position: usize,
) -> Result<char, DecodeError> {
    let mut code: u32 = 0;
    for _ in 0..width {
        let digit = chars
            .peek()
            .and_then(|&(_, c)| c.to_digit(16))
            .ok_or(DecodeError::Truncated { escape, position })?;
        chars.next();
        code = code * 16 + digit;
    }
    code_point(code, position)
}

fn named_escape(chars: &mut Peekable<CharIndices<'_>>, position: usize) -> Result<char, DecodeError> {
    if chars.next_if(|&(_, c)| c == '{').is_none() {
        return Err(DecodeError::MalformedNamed { position });
    }
    let mut name = String::new();
    loop {
        match chars.next() {
            Some((_, '}')) if !name.is_empty() => break,
            Some((_, c)) if c != '}' => name.push(c),
            _ => return Err(DecodeError::MalformedNamed { position }),
        }
    }
    // Character names are uppercase ASCII; lookups ignore case.
    unicode_names2::character(&name.to_ascii_uppercase())
        .ok_or(DecodeError::UnknownName { name, position })
}

fn code_point(code: u32, position: usize) -> Result<char, DecodeError> {
    char::from_u32(code).ok_or(DecodeError::IllegalCodePoint { code, position })
}
