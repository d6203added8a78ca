//! Purpose: Decode backend JSON text into a `Value` tree.
//! Exports: `decode`, `unescape`, `MAX_DEPTH`.
//! Role: Strict primitive that calling services build on; failures are typed, never partial.
//! Invariants: Object key order follows first appearance in the text; duplicate keys keep the last value.
//! Invariants: Text unescaping inverts `encode::escape` exactly.
//! Invariants: Recursion depth is bounded by `MAX_DEPTH`.

use super::error::ParseError;
use super::scan;
use super::value::{Map, Number, Value, is_json_number};

pub const MAX_DEPTH: usize = 512;

pub fn decode(text: &str) -> Result<Value, ParseError> {
    let mut parser = Parser {
        text,
        bytes: text.as_bytes(),
        pos: 0,
        depth: 0,
    };
    parser.pos = scan::skip_whitespace(parser.bytes, 0);
    if parser.pos == parser.bytes.len() {
        return Err(ParseError::UnexpectedEnd { offset: parser.pos });
    }
    let value = parser.parse_value()?;
    parser.pos = scan::skip_whitespace(parser.bytes, parser.pos);
    if parser.pos < parser.bytes.len() {
        return Err(ParseError::TrailingCharacters { offset: parser.pos });
    }
    Ok(value)
}

/// Resolves escape sequences in the raw text between two quotes.
pub fn unescape(raw: &str) -> Result<String, ParseError> {
    unescape_at(raw, 0)
}

struct Parser<'a> {
    text: &'a str,
    bytes: &'a [u8],
    pos: usize,
    depth: usize,
}

impl Parser<'_> {
    fn peek(&self) -> Option<u8> {
        self.bytes.get(self.pos).copied()
    }

    fn skip_whitespace(&mut self) {
        self.pos = scan::skip_whitespace(self.bytes, self.pos);
    }

    fn unexpected(&self) -> ParseError {
        let found = self.text[self.pos..].chars().next().unwrap_or('\0');
        ParseError::UnexpectedCharacter {
            offset: self.pos,
            found,
        }
    }

    fn parse_value(&mut self) -> Result<Value, ParseError> {
        self.skip_whitespace();
        match self.peek() {
            None => Err(ParseError::UnexpectedEnd { offset: self.pos }),
            Some(b'"') => self.parse_text().map(Value::Text),
            Some(b'{') => self.parse_object(),
            Some(b'[') => self.parse_array(),
            Some(byte) if scan::is_structural(byte) => Err(self.unexpected()),
            Some(_) => self.parse_scalar(),
        }
    }

    fn parse_text(&mut self) -> Result<String, ParseError> {
        let open = self.pos;
        let close = scan::string_end(self.bytes, open)
            .ok_or(ParseError::UnterminatedString { offset: open })?;
        let text = unescape_at(&self.text[open + 1..close], open + 1)?;
        self.pos = close + 1;
        Ok(text)
    }

    fn parse_scalar(&mut self) -> Result<Value, ParseError> {
        let start = self.pos;
        let end = scan::token_end(self.bytes, start);
        let token = &self.text[start..end];
        let value = match token {
            "true" => Value::Bool(true),
            "false" => Value::Bool(false),
            "null" => Value::Null,
            _ if is_json_number(token) => Value::Number(Number::from_validated(token.to_string())),
            _ => {
                return Err(ParseError::MalformedNumber {
                    offset: start,
                    token: token.to_string(),
                });
            }
        };
        self.pos = end;
        Ok(value)
    }

    fn enter(&mut self) -> Result<(), ParseError> {
        if self.depth >= MAX_DEPTH {
            return Err(ParseError::NestingTooDeep {
                offset: self.pos,
                limit: MAX_DEPTH,
            });
        }
        self.depth += 1;
        Ok(())
    }

    fn parse_object(&mut self) -> Result<Value, ParseError> {
        let open = self.pos;
        let unmatched = ParseError::UnmatchedBracket { offset: open, open: '{' };
        self.enter()?;
        self.pos += 1;
        let mut map = Map::new();

        self.skip_whitespace();
        if self.peek() == Some(b'}') {
            self.pos += 1;
            self.depth -= 1;
            return Ok(Value::Object(map));
        }

        loop {
            self.skip_whitespace();
            match self.peek() {
                None => return Err(unmatched),
                Some(b'"') => {}
                Some(_) => return Err(self.unexpected()),
            }
            let key = self.parse_text()?;

            self.skip_whitespace();
            match self.peek() {
                None => return Err(unmatched),
                Some(b':') => self.pos += 1,
                Some(_) => return Err(self.unexpected()),
            }

            self.skip_whitespace();
            if self.peek().is_none() {
                return Err(unmatched);
            }
            let value = self.parse_value()?;
            map.insert(key, value);

            self.skip_whitespace();
            match self.peek() {
                None => return Err(unmatched),
                Some(b',') => self.pos += 1,
                Some(b'}') => {
                    self.pos += 1;
                    break;
                }
                Some(_) => return Err(self.unexpected()),
            }
        }

        self.depth -= 1;
        Ok(Value::Object(map))
    }

    fn parse_array(&mut self) -> Result<Value, ParseError> {
        let open = self.pos;
        let unmatched = ParseError::UnmatchedBracket { offset: open, open: '[' };
        self.enter()?;
        self.pos += 1;
        let mut items = Vec::new();

        self.skip_whitespace();
        if self.peek() == Some(b']') {
            self.pos += 1;
            self.depth -= 1;
            return Ok(Value::Array(items));
        }

        loop {
            self.skip_whitespace();
            if self.peek().is_none() {
                return Err(unmatched);
            }
            items.push(self.parse_value()?);

            self.skip_whitespace();
            match self.peek() {
                None => return Err(unmatched),
                Some(b',') => self.pos += 1,
                Some(b']') => {
                    self.pos += 1;
                    break;
                }
                Some(_) => return Err(self.unexpected()),
            }
        }

        self.depth -= 1;
        Ok(Value::Array(items))
    }
}

/// `base` is the offset of `raw` within the original document, used for error
/// positions.
pub(crate) fn unescape_at(raw: &str, base: usize) -> Result<String, ParseError> {
    if !raw.contains('\\') {
        return Ok(raw.to_string());
    }

    let mut out = String::with_capacity(raw.len());
    let mut chars = raw.char_indices();
    while let Some((idx, ch)) = chars.next() {
        if ch != '\\' {
            out.push(ch);
            continue;
        }
        let invalid = ParseError::InvalidEscape { offset: base + idx };
        let Some((_, escaped)) = chars.next() else {
            return Err(invalid);
        };
        match escaped {
            '\\' => out.push('\\'),
            '"' => out.push('"'),
            '/' => out.push('/'),
            'n' => out.push('\n'),
            'r' => out.push('\r'),
            't' => out.push('\t'),
            'b' => out.push('\u{0008}'),
            'f' => out.push('\u{000C}'),
            'u' => {
                let high = read_hex4(&mut chars).ok_or_else(|| invalid.clone())?;
                let code = if (0xD800..0xDC00).contains(&high) {
                    let (Some((_, '\\')), Some((_, 'u'))) = (chars.next(), chars.next()) else {
                        return Err(invalid);
                    };
                    let low = read_hex4(&mut chars).ok_or_else(|| invalid.clone())?;
                    if !(0xDC00..0xE000).contains(&low) {
                        return Err(invalid);
                    }
                    0x10000 + ((high - 0xD800) << 10) + (low - 0xDC00)
                } else {
                    high
                };
                out.push(char::from_u32(code).ok_or(invalid)?);
            }
            _ => return Err(invalid),
        }
    }
    Ok(out)
}

fn read_hex4(chars: &mut std::str::CharIndices<'_>) -> Option<u32> {
    let mut code = 0u32;
    for _ in 0..4 {
        let (_, ch) = chars.next()?;
        code = code * 16 + ch.to_digit(16)?;
    }
    Some(code)
}
