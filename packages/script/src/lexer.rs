//! Tokenizer for the compile-time lint.
//!
//! Only runs on sources the interpreter has already parsed, so it favours
//! being small over reporting precise syntax errors.

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Name(String),
    Keyword(&'static str),
    Str(String),
    Number(String),
    Symbol(&'static str),
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Spanned {
    pub token: Token,
    pub line: usize,
}

const KEYWORDS: &[&str] = &[
    "and", "break", "do", "else", "elseif", "end", "false", "for", "function", "goto", "if", "in",
    "local", "nil", "not", "or", "repeat", "return", "then", "true", "until", "while",
];

// Longest first so that prefixes never shadow longer symbols.
const SYMBOLS: &[&str] = &[
    "...", "..", "==", "~=", "<=", ">=", "<<", ">>", "//", "::", "+", "-", "*", "/", "%", "^",
    "#", "&", "~", "|", "<", ">", "=", "(", ")", "{", "}", "[", "]", ";", ":", ",", ".",
];

pub(crate) fn tokenize(source: &str) -> Result<Vec<Spanned>, String> {
    let mut lexer = Lexer {
        bytes: source.as_bytes(),
        pos: 0,
        line: 1,
        tokens: Vec::new(),
    };
    lexer.run()?;
    Ok(lexer.tokens)
}

struct Lexer<'a> {
    bytes: &'a [u8],
    pos: usize,
    line: usize,
    tokens: Vec<Spanned>,
}

impl Lexer<'_> {
    fn peek(&self, offset: usize) -> Option<u8> {
        self.bytes.get(self.pos + offset).copied()
    }

    fn push(&mut self, token: Token, line: usize) {
        self.tokens.push(Spanned { token, line });
    }

    fn run(&mut self) -> Result<(), String> {
        if self.bytes.starts_with(b"#") {
            while self.peek(0).is_some_and(|c| c != b'\n') {
                self.pos += 1;
            }
        }

        while let Some(c) = self.peek(0) {
            match c {
                b'\n' => {
                    self.line += 1;
                    self.pos += 1;
                }
                c if c.is_ascii_whitespace() => self.pos += 1,
                b'-' if self.peek(1) == Some(b'-') => self.comment()?,
                b'"' | b'\'' => self.short_string(c)?,
                b'[' if self.long_bracket_level().is_some() => {
                    let line = self.line;
                    let text = self.long_bracket()?;
                    self.push(Token::Str(text), line);
                }
                c if c.is_ascii_digit() => self.number(),
                b'.' if self.peek(1).is_some_and(|d| d.is_ascii_digit()) => self.number(),
                c if c.is_ascii_alphabetic() || c == b'_' => self.name(),
                _ => self.symbol()?,
            }
        }
        Ok(())
    }

    fn comment(&mut self) -> Result<(), String> {
        self.pos += 2;
        if self.peek(0) == Some(b'[') && self.long_bracket_level().is_some() {
            self.long_bracket()?;
            return Ok(());
        }
        while self.peek(0).is_some_and(|c| c != b'\n') {
            self.pos += 1;
        }
        Ok(())
    }

    /// Level of a long bracket (`[[`, `[==[`) opening at the cursor.
    fn long_bracket_level(&self) -> Option<usize> {
        let mut level = 0;
        while self.peek(1 + level) == Some(b'=') {
            level += 1;
        }
        (self.peek(1 + level) == Some(b'[')).then_some(level)
    }

    fn long_bracket(&mut self) -> Result<String, String> {
        let start_line = self.line;
        let level = self.long_bracket_level().unwrap_or(0);
        self.pos += level + 2;
        if self.peek(0) == Some(b'\r') {
            self.pos += 1;
        }
        if self.peek(0) == Some(b'\n') {
            self.line += 1;
            self.pos += 1;
        }

        let start = self.pos;
        loop {
            match self.peek(0) {
                None => return Err(format!("unfinished long string at line {start_line}")),
                Some(b']') => {
                    let closes = (1..=level).all(|k| self.peek(k) == Some(b'='))
                        && self.peek(level + 1) == Some(b']');
                    if closes {
                        let text = String::from_utf8_lossy(&self.bytes[start..self.pos]).into_owned();
                        self.pos += level + 2;
                        return Ok(text);
                    }
                    self.pos += 1;
                }
                Some(b'\n') => {
                    self.line += 1;
                    self.pos += 1;
                }
                Some(_) => self.pos += 1,
            }
        }
    }

    fn short_string(&mut self, quote: u8) -> Result<(), String> {
        let line = self.line;
        let unfinished = || format!("unfinished string at line {line}");
        self.pos += 1;

        let mut buf = Vec::new();
        loop {
            let c = self.peek(0).ok_or_else(unfinished)?;
            if c == quote {
                self.pos += 1;
                break;
            }
            match c {
                b'\n' => return Err(unfinished()),
                b'\\' => {
                    let escape = self.peek(1).ok_or_else(unfinished)?;
                    self.pos += 2;
                    match escape {
                        b'n' => buf.push(b'\n'),
                        b't' => buf.push(b'\t'),
                        b'r' => buf.push(b'\r'),
                        b'a' => buf.push(0x07),
                        b'b' => buf.push(0x08),
                        b'f' => buf.push(0x0c),
                        b'v' => buf.push(0x0b),
                        b'\\' | b'"' | b'\'' => buf.push(escape),
                        b'\n' => {
                            self.line += 1;
                            buf.push(b'\n');
                        }
                        b'z' => {
                            while let Some(w) = self.peek(0).filter(u8::is_ascii_whitespace) {
                                if w == b'\n' {
                                    self.line += 1;
                                }
                                self.pos += 1;
                            }
                        }
                        b'x' => {
                            let hex = self.take_while(2, |b| b.is_ascii_hexdigit());
                            let byte = u8::from_str_radix(&hex, 16)
                                .map_err(|_| format!("invalid hex escape at line {line}"))?;
                            buf.push(byte);
                        }
                        b'0'..=b'9' => {
                            self.pos -= 1;
                            let digits = self.take_while(3, |b| b.is_ascii_digit());
                            let byte = digits
                                .parse::<u8>()
                                .map_err(|_| format!("decimal escape too large at line {line}"))?;
                            buf.push(byte);
                        }
                        b'u' => {
                            if self.peek(0) != Some(b'{') {
                                return Err(format!("missing '{{' in \\u{{xxxx}} at line {line}"));
                            }
                            self.pos += 1;
                            let hex = self.take_while(8, |b| b.is_ascii_hexdigit());
                            if self.peek(0) != Some(b'}') {
                                return Err(format!("missing '}}' in \\u{{xxxx}} at line {line}"));
                            }
                            self.pos += 1;
                            let code = u32::from_str_radix(&hex, 16)
                                .ok()
                                .filter(|code| *code <= 0x7fff_ffff)
                                .ok_or_else(|| format!("invalid unicode escape at line {line}"))?;
                            push_utf8(code, &mut buf);
                        }
                        other => {
                            return Err(format!(
                                "invalid escape sequence '\\{}' at line {line}",
                                other as char
                            ))
                        }
                    }
                }
                _ => {
                    buf.push(c);
                    self.pos += 1;
                }
            }
        }

        self.push(Token::Str(String::from_utf8_lossy(&buf).into_owned()), line);
        Ok(())
    }

    fn take_while(&mut self, max: usize, accept: impl Fn(u8) -> bool) -> String {
        let start = self.pos;
        while self.pos - start < max && self.peek(0).is_some_and(&accept) {
            self.pos += 1;
        }
        String::from_utf8_lossy(&self.bytes[start..self.pos]).into_owned()
    }

    fn number(&mut self) {
        let start = self.pos;
        let hex = self.peek(0) == Some(b'0') && matches!(self.peek(1), Some(b'x' | b'X'));
        if hex {
            self.pos += 2;
        }
        while let Some(c) = self.peek(0) {
            let exponent = if hex {
                matches!(c, b'p' | b'P')
            } else {
                matches!(c, b'e' | b'E')
            };
            if exponent {
                self.pos += 1;
                if matches!(self.peek(0), Some(b'+' | b'-')) {
                    self.pos += 1;
                }
            } else if c.is_ascii_alphanumeric() || c == b'.' {
                self.pos += 1;
            } else {
                break;
            }
        }
        let text = String::from_utf8_lossy(&self.bytes[start..self.pos]).into_owned();
        self.push(Token::Number(text), self.line);
    }

    fn name(&mut self) {
        let start = self.pos;
        while self
            .peek(0)
            .is_some_and(|c| c.is_ascii_alphanumeric() || c == b'_')
        {
            self.pos += 1;
        }
        let text = String::from_utf8_lossy(&self.bytes[start..self.pos]).into_owned();
        let token = match KEYWORDS.iter().find(|k| **k == text) {
            Some(keyword) => Token::Keyword(keyword),
            None => Token::Name(text),
        };
        self.push(token, self.line);
    }

    fn symbol(&mut self) -> Result<(), String> {
        let rest = &self.bytes[self.pos..];
        match SYMBOLS.iter().find(|s| rest.starts_with(s.as_bytes())) {
            Some(symbol) => {
                self.pos += symbol.len();
                self.push(Token::Symbol(symbol), self.line);
                Ok(())
            }
            None => Err(format!(
                "unexpected character {:?} at line {}",
                rest[0] as char, self.line
            )),
        }
    }
}

/// Encode `code` the way Lua does, which extends UTF-8 to 31 bits and
/// allows surrogates.
fn push_utf8(mut code: u32, buf: &mut Vec<u8>) {
    if code < 0x80 {
        buf.push(code as u8);
        return;
    }
    let mut tail = Vec::with_capacity(5);
    let mut first_max = 0x3f;
    while code > first_max {
        tail.push(0x80 | (code & 0x3f) as u8);
        code >>= 6;
        first_max >>= 1;
    }
    buf.push(((!first_max << 1) | code) as u8);
    buf.extend(tail.iter().rev());
}
