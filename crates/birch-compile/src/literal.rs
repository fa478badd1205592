//! Number and string literal decoding.
//!
//! Errors are plain messages; the caller attaches the token position.

use crate::ir::Constant;

pub(crate) enum LiteralError {
    Syntax(String),
    Unsupported(&'static str),
}

impl LiteralError {
    fn syntax(message: impl Into<String>) -> Self {
        LiteralError::Syntax(message.into())
    }
}

pub(crate) fn number(text: &str) -> Result<Constant, LiteralError> {
    let invalid = || LiteralError::syntax(format!("invalid numeric literal {text:?}"));

    if matches!(text.as_bytes().last(), Some(b'j' | b'J')) {
        return Err(LiteralError::Unsupported("complex literal"));
    }

    let radix = match text.get(..2).map(str::to_ascii_lowercase).as_deref() {
        Some("0x") => Some(16),
        Some("0o") => Some(8),
        Some("0b") => Some(2),
        _ => None,
    };
    if let Some(radix) = radix {
        let digits = strip_underscores(&text[2..]).ok_or_else(invalid)?;
        if digits.is_empty() || !digits.chars().all(|c| c.is_digit(radix)) {
            return Err(invalid());
        }
        return integer(&digits, radix);
    }

    let digits = strip_underscores(text).ok_or_else(invalid)?;
    if digits.bytes().all(|b| b.is_ascii_digit()) {
        if digits.len() > 1 && digits.starts_with('0') && digits.bytes().any(|b| b != b'0') {
            return Err(LiteralError::syntax(
                "leading zeros in decimal integer literals are not permitted",
            ));
        }
        return integer(&digits, 10);
    }

    let is_float = digits
        .bytes()
        .all(|b| b.is_ascii_digit() || matches!(b, b'.' | b'e' | b'E' | b'+' | b'-'));
    match digits.parse::<f64>() {
        Ok(value) if is_float => Ok(Constant::Float(value)),
        _ => Err(invalid()),
    }
}

fn integer(digits: &str, radix: u32) -> Result<Constant, LiteralError> {
    i64::from_str_radix(digits, radix)
        .map(Constant::Int)
        .or(Err(LiteralError::Unsupported("integer literal wider than 64 bits")))
}

/// Removes `_` separators, which may only sit between two digits.
fn strip_underscores(text: &str) -> Option<String> {
    let bytes = text.as_bytes();
    for (index, &byte) in bytes.iter().enumerate() {
        if byte == b'_' {
            let before = index.checked_sub(1).map(|i| bytes[i]);
            let after = bytes.get(index + 1).copied();
            if !before.is_some_and(|b| b.is_ascii_hexdigit())
                || !after.is_some_and(|b| b.is_ascii_hexdigit())
            {
                return None;
            }
        }
    }
    Some(text.replace('_', ""))
}

/// The value of one STRING token.
pub(crate) enum Text {
    Str(String),
    Bytes(Vec<u8>),
}

pub(crate) fn string(token: &str) -> Result<Text, LiteralError> {
    let malformed = || LiteralError::syntax(format!("malformed string literal {token:?}"));

    let quote_at = token.find(['\'', '"']).ok_or_else(malformed)?;
    let prefix = token[..quote_at].to_ascii_lowercase();
    let (raw, bytes) = match prefix.as_str() {
        "" | "u" => (false, false),
        "r" => (true, false),
        "b" => (false, true),
        "br" | "rb" => (true, true),
        _ => return Err(malformed()),
    };

    let quoted = &token[quote_at..];
    let quote = &quoted[..1];
    let triple = quote.repeat(3);
    let delimiter =
        if quoted.len() >= 6 && quoted.starts_with(&triple) { triple.as_str() } else { quote };
    let body = quoted
        .strip_prefix(delimiter)
        .and_then(|rest| rest.strip_suffix(delimiter))
        .filter(|_| quoted.len() >= 2 * delimiter.len())
        .ok_or_else(malformed)?;

    if bytes {
        if !body.is_ascii() {
            return Err(LiteralError::syntax("bytes can only contain ASCII literal characters"));
        }
        let body = if raw { body.as_bytes().to_vec() } else { unescape_bytes(body)? };
        Ok(Text::Bytes(body))
    } else {
        let body = if raw { body.to_owned() } else { unescape(body)? };
        Ok(Text::Str(body))
    }
}

fn unescape(body: &str) -> Result<String, LiteralError> {
    let mut out = String::with_capacity(body.len());
    let mut chars = body.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }

        let Some(escape) = chars.next() else {
            return Err(LiteralError::syntax("trailing backslash in string literal"));
        };
        match escape {
            '\n' => {}
            '\r' => {
                chars.next_if_eq(&'\n');
            }
            'u' | 'U' => {
                let width = if escape == 'u' { 4 } else { 8 };
                let code = hex_digits(&mut chars, width).ok_or_else(|| {
                    LiteralError::syntax(format!(
                        "truncated \\{escape}{} escape",
                        "X".repeat(width)
                    ))
                })?;
                let c = char::from_u32(code)
                    .ok_or_else(|| LiteralError::syntax("illegal Unicode character"))?;
                out.push(c);
            }
            'x' => {
                let code = hex_digits(&mut chars, 2)
                    .ok_or_else(|| LiteralError::syntax("truncated \\xXX escape"))?;
                out.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
            }
            'N' => return Err(LiteralError::Unsupported("\\N{...} escape")),
            '0'..='7' => {
                let code = octal_digits(escape, &mut chars);
                out.push(char::from_u32(code).unwrap_or(char::REPLACEMENT_CHARACTER));
            }
            _ => match simple_escape(escape) {
                Some(byte) => out.push(char::from(byte)),
                None => {
                    out.push('\\');
                    out.push(escape);
                }
            },
        }
    }

    Ok(out)
}

fn unescape_bytes(body: &str) -> Result<Vec<u8>, LiteralError> {
    let mut out = Vec::with_capacity(body.len());
    let mut chars = body.chars().peekable();

    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c as u8);
            continue;
        }

        let Some(escape) = chars.next() else {
            return Err(LiteralError::syntax("trailing backslash in bytes literal"));
        };
        match escape {
            '\n' => {}
            '\r' => {
                chars.next_if_eq(&'\n');
            }
            'x' => {
                let code = hex_digits(&mut chars, 2)
                    .ok_or_else(|| LiteralError::syntax("truncated \\xXX escape"))?;
                out.push(code as u8);
            }
            '0'..='7' => out.push(octal_digits(escape, &mut chars) as u8),
            _ => match simple_escape(escape) {
                Some(byte) => out.push(byte),
                None => {
                    out.push(b'\\');
                    out.push(escape as u8);
                }
            },
        }
    }

    Ok(out)
}

fn simple_escape(escape: char) -> Option<u8> {
    Some(match escape {
        '\\' => b'\\',
        '\'' => b'\'',
        '"' => b'"',
        'a' => 0x07,
        'b' => 0x08,
        'f' => 0x0c,
        'n' => b'\n',
        'r' => b'\r',
        't' => b'\t',
        'v' => 0x0b,
        _ => return None,
    })
}

fn hex_digits(chars: &mut std::iter::Peekable<std::str::Chars<'_>>, width: usize) -> Option<u32> {
    let mut code = 0u32;
    for _ in 0..width {
        let digit = chars.next_if(char::is_ascii_hexdigit)?.to_digit(16)?;
        code = code.checked_mul(16)?.checked_add(digit)?;
    }
    Some(code)
}

/// Up to three octal digits, the first already consumed. The result fits in
/// nine bits; bytes literals keep the low eight.
fn octal_digits(first: char, chars: &mut std::iter::Peekable<std::str::Chars<'_>>) -> u32 {
    let mut code = first.to_digit(8).unwrap_or_default();
    for _ in 0..2 {
        match chars.next_if(|c| c.is_digit(8)) {
            Some(c) => code = code * 8 + c.to_digit(8).unwrap_or_default(),
            None => break,
        }
    }
    code
}

#[cfg(test)]
mod tests {
    use super::*;

    fn num(text: &str) -> Constant {
        match number(text) {
            Ok(constant) => constant,
            Err(_) => panic!("{text} should be a number"),
        }
    }

    fn num_error(text: &str) -> String {
        match number(text) {
            Ok(constant) => panic!("{text} gave {constant:?}"),
            Err(LiteralError::Syntax(message)) => message,
            Err(LiteralError::Unsupported(construct)) => construct.to_owned(),
        }
    }

    fn str_value(token: &str) -> String {
        match string(token) {
            Ok(Text::Str(text)) => text,
            Ok(Text::Bytes(_)) => panic!("{token} is bytes"),
            Err(_) => panic!("{token} should decode"),
        }
    }

    fn str_error(token: &str) -> String {
        match string(token) {
            Ok(_) => panic!("{token} should fail"),
            Err(LiteralError::Syntax(message)) => message,
            Err(LiteralError::Unsupported(construct)) => construct.to_owned(),
        }
    }

    #[test]
    fn numbers() {
        assert_eq!(num("0"), Constant::Int(0));
        assert_eq!(num("000"), Constant::Int(0));
        assert_eq!(num("42"), Constant::Int(42));
        assert_eq!(num("1_000"), Constant::Int(1000));
        assert_eq!(num("0x1F"), Constant::Int(31));
        assert_eq!(num("0o17"), Constant::Int(15));
        assert_eq!(num("0b101"), Constant::Int(5));
        assert_eq!(num("1.5"), Constant::Float(1.5));
        assert_eq!(num(".5"), Constant::Float(0.5));
        assert_eq!(num("3."), Constant::Float(3.0));
        assert_eq!(num("1e3"), Constant::Float(1000.0));
        assert_eq!(num("1.5e-3"), Constant::Float(0.0015));
        assert_eq!(num("9223372036854775807"), Constant::Int(i64::MAX));
    }

    #[test]
    fn bad_numbers() {
        assert_eq!(
            num_error("0777"),
            "leading zeros in decimal integer literals are not permitted"
        );
        assert_eq!(num_error("0x"), "invalid numeric literal \"0x\"");
        assert_eq!(num_error("0b102"), "invalid numeric literal \"0b102\"");
        assert_eq!(num_error("1e"), "invalid numeric literal \"1e\"");
        assert_eq!(num_error("1abc"), "invalid numeric literal \"1abc\"");
        assert_eq!(num_error("1__0"), "invalid numeric literal \"1__0\"");
        assert_eq!(num_error("10j"), "complex literal");
        assert_eq!(num_error("9223372036854775808"), "integer literal wider than 64 bits");
    }

    #[test]
    fn strings() {
        assert_eq!(str_value("'abc'"), "abc");
        assert_eq!(str_value("\"a'b\""), "a'b");
        assert_eq!(str_value("''"), "");
        assert_eq!(str_value("''''''"), "");
        assert_eq!(str_value("'''a\nb'''"), "a\nb");
        assert_eq!(str_value(r"'a\tb\n'"), "a\tb\n");
        assert_eq!(str_value(r"'\x41\101é\U0001F600'"), "AAé😀");
        assert_eq!(str_value(r"'\q'"), "\\q");
        assert_eq!(str_value(r"r'\n'"), "\\n");
        assert_eq!(str_value(r"U'\''"), "'");
        assert_eq!(str_value("'a\\\nb'"), "ab");
    }

    #[test]
    fn bytes() {
        let Ok(Text::Bytes(value)) = string(r"b'a\x00\n\u'") else { panic!("expected bytes") };
        assert_eq!(value, b"a\x00\n\\u");
        let Ok(Text::Bytes(value)) = string(r"Rb'\n'") else { panic!("expected bytes") };
        assert_eq!(value, b"\\n");
    }

    #[test]
    fn bad_strings() {
        assert_eq!(str_error(r"'\U12345678'"), "illegal Unicode character");
        assert_eq!(str_error(r"'\u1'"), "truncated \\uXXXX escape");
        assert_eq!(str_error(r"'\U0001'"), "truncated \\UXXXXXXXX escape");
        assert_eq!(str_error(r"'\x4'"), "truncated \\xXX escape");
        assert_eq!(str_error(r"'\N{DASH}'"), "\\N{...} escape");
        assert_eq!(str_error("b'é'"), "bytes can only contain ASCII literal characters");
        assert_eq!(str_error("'abc"), "malformed string literal \"'abc\"");
        assert_eq!(str_error("x'abc'"), "malformed string literal \"x'abc'\"");
    }
}
