//! Tokenizer for the script language.

use super::ScriptError;

/// Token kinds.
#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Number(f64),
    Str(String),
    Ident(String),
    True,
    False,
    Null,
    Return,
    Throw,
    Plus,
    Minus,
    Star,
    Slash,
    Percent,
    Bang,
    Lt,
    Le,
    Gt,
    Ge,
    EqEq,
    NotEq,
    AndAnd,
    OrOr,
    LParen,
    RParen,
    Semicolon,
    Eof,
}

/// A token and the byte offset it starts at.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub offset: usize,
}

/// Split `source` into tokens, ending with [`TokenKind::Eof`].
pub fn tokenize(source: &str) -> Result<Vec<Token>, ScriptError> {
    let mut lexer = Lexer {
        source,
        chars: source.char_indices().peekable(),
    };
    let mut tokens = Vec::new();

    loop {
        let token = lexer.next_token()?;
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);
        if done {
            return Ok(tokens);
        }
    }
}

struct Lexer<'a> {
    source: &'a str,
    chars: std::iter::Peekable<std::str::CharIndices<'a>>,
}

impl<'a> Lexer<'a> {
    fn next_token(&mut self) -> Result<Token, ScriptError> {
        self.skip_whitespace_and_comments();

        let Some((offset, c)) = self.chars.next() else {
            return Ok(Token {
                kind: TokenKind::Eof,
                offset: self.source.len(),
            });
        };

        let kind = match c {
            '+' => TokenKind::Plus,
            '-' => TokenKind::Minus,
            '*' => TokenKind::Star,
            '/' => TokenKind::Slash,
            '%' => TokenKind::Percent,
            '(' => TokenKind::LParen,
            ')' => TokenKind::RParen,
            ';' => TokenKind::Semicolon,
            '<' => self.with_eq(TokenKind::Le, TokenKind::Lt),
            '>' => self.with_eq(TokenKind::Ge, TokenKind::Gt),
            '!' => {
                if self.eat('=') {
                    // `!==` is accepted as a synonym.
                    self.eat('=');
                    TokenKind::NotEq
                } else {
                    TokenKind::Bang
                }
            }
            '=' => {
                if !self.eat('=') {
                    return Err(ScriptError::syntax(offset, "assignment is not supported"));
                }
                self.eat('=');
                TokenKind::EqEq
            }
            '&' => {
                if !self.eat('&') {
                    return Err(ScriptError::syntax(offset, "expected '&&'"));
                }
                TokenKind::AndAnd
            }
            '|' => {
                if !self.eat('|') {
                    return Err(ScriptError::syntax(offset, "expected '||'"));
                }
                TokenKind::OrOr
            }
            '"' | '\'' => TokenKind::Str(self.string(offset, c)?),
            c if c.is_ascii_digit() || c == '.' => TokenKind::Number(self.number(offset)?),
            c if c.is_alphabetic() || c == '_' || c == '$' => self.word(offset),
            other => {
                return Err(ScriptError::syntax(
                    offset,
                    format!("unexpected character '{}'", other),
                ))
            }
        };

        Ok(Token { kind, offset })
    }

    fn skip_whitespace_and_comments(&mut self) {
        while let Some(&(offset, c)) = self.chars.peek() {
            if c.is_whitespace() {
                self.chars.next();
            } else if self.source[offset..].starts_with("//") {
                while let Some(&(_, c)) = self.chars.peek() {
                    if c == '\n' {
                        break;
                    }
                    self.chars.next();
                }
            } else {
                break;
            }
        }
    }

    fn eat(&mut self, expected: char) -> bool {
        if matches!(self.chars.peek(), Some(&(_, c)) if c == expected) {
            self.chars.next();
            true
        } else {
            false
        }
    }

    fn with_eq(&mut self, with: TokenKind, without: TokenKind) -> TokenKind {
        if self.eat('=') {
            with
        } else {
            without
        }
    }

    fn string(&mut self, start: usize, quote: char) -> Result<String, ScriptError> {
        let mut out = String::new();

        while let Some((offset, c)) = self.chars.next() {
            match c {
                c if c == quote => return Ok(out),
                '\\' => {
                    let Some((_, escaped)) = self.chars.next() else {
                        break;
                    };
                    match escaped {
                        'n' => out.push('\n'),
                        't' => out.push('\t'),
                        'r' => out.push('\r'),
                        '0' => out.push('\0'),
                        '\\' | '\'' | '"' => out.push(escaped),
                        other => {
                            return Err(ScriptError::syntax(
                                offset,
                                format!("unknown escape '\\{}'", other),
                            ))
                        }
                    }
                }
                '\n' => break,
                c => out.push(c),
            }
        }

        Err(ScriptError::syntax(start, "unterminated string literal"))
    }

    fn number(&mut self, start: usize) -> Result<f64, ScriptError> {
        let mut end = start + 1;
        let mut seen_exponent = false;

        while let Some(&(offset, c)) = self.chars.peek() {
            let accept = c.is_ascii_digit()
                || c == '.'
                || (!seen_exponent && (c == 'e' || c == 'E'))
                || ((c == '+' || c == '-')
                    && matches!(self.source[..offset].chars().last(), Some('e' | 'E')));
            if !accept {
                break;
            }
            if c == 'e' || c == 'E' {
                seen_exponent = true;
            }
            end = offset + c.len_utf8();
            self.chars.next();
        }

        let text = &self.source[start..end];
        text.parse::<f64>()
            .map_err(|_| ScriptError::syntax(start, format!("invalid number '{}'", text)))
    }

    fn word(&mut self, start: usize) -> TokenKind {
        let mut end = self.source.len();
        while let Some(&(offset, c)) = self.chars.peek() {
            if c.is_alphanumeric() || c == '_' || c == '$' {
                self.chars.next();
            } else {
                end = offset;
                break;
            }
        }

        match &self.source[start..end] {
            "true" => TokenKind::True,
            "false" => TokenKind::False,
            "null" => TokenKind::Null,
            "return" => TokenKind::Return,
            "throw" => TokenKind::Throw,
            ident => TokenKind::Ident(ident.to_string()),
        }
    }
}
