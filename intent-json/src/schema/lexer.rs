//! Tokenizer for schema expressions.

use std::fmt;

use serde_json::Number;

use super::SchemaError;

/// Source position, 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) struct Pos {
    pub line: usize,
    pub column: usize,
}

impl Pos {
    pub(crate) fn error(self, message: impl Into<String>) -> SchemaError {
        SchemaError::Syntax {
            message: message.into(),
            line: self.line,
            column: self.column,
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) enum Token {
    Ident(String),
    Str(String),
    Num(Number),
    Dot,
    Comma,
    Colon,
    LParen,
    RParen,
    LBrace,
    RBrace,
    LBracket,
    RBracket,
    Eof,
}

impl fmt::Display for Token {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Ident(name) => write!(f, "`{name}`"),
            Self::Str(s) => write!(f, "string {s:?}"),
            Self::Num(n) => write!(f, "number {n}"),
            Self::Dot => f.write_str("`.`"),
            Self::Comma => f.write_str("`,`"),
            Self::Colon => f.write_str("`:`"),
            Self::LParen => f.write_str("`(`"),
            Self::RParen => f.write_str("`)`"),
            Self::LBrace => f.write_str("`{`"),
            Self::RBrace => f.write_str("`}`"),
            Self::LBracket => f.write_str("`[`"),
            Self::RBracket => f.write_str("`]`"),
            Self::Eof => f.write_str("end of input"),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub(crate) struct Spanned {
    pub token: Token,
    pub pos: Pos,
}

pub(crate) struct Lexer<'a> {
    chars: std::iter::Peekable<std::str::Chars<'a>>,
    line: usize,
    column: usize,
}

impl<'a> Lexer<'a> {
    pub(crate) fn new(source: &'a str) -> Self {
        Self {
            chars: source.chars().peekable(),
            line: 1,
            column: 1,
        }
    }

    /// Tokenizes the whole input. The last token is always [`Token::Eof`].
    pub(crate) fn tokenize(mut self) -> Result<Vec<Spanned>, SchemaError> {
        let mut tokens = Vec::new();
        loop {
            let spanned = self.next_token()?;
            let done = spanned.token == Token::Eof;
            tokens.push(spanned);
            if done {
                return Ok(tokens);
            }
        }
    }

    fn pos(&self) -> Pos {
        Pos {
            line: self.line,
            column: self.column,
        }
    }

    fn bump(&mut self) -> Option<char> {
        let c = self.chars.next()?;
        if c == '\n' {
            self.line += 1;
            self.column = 1;
        } else {
            self.column += 1;
        }
        Some(c)
    }

    fn skip_trivia(&mut self) -> Result<(), SchemaError> {
        loop {
            match self.chars.peek() {
                Some(c) if c.is_whitespace() => {
                    self.bump();
                }
                Some('/') => {
                    let start = self.pos();
                    let mut lookahead = self.chars.clone();
                    lookahead.next();
                    match lookahead.peek() {
                        Some('/') => {
                            while let Some(c) = self.bump() {
                                if c == '\n' {
                                    break;
                                }
                            }
                        }
                        Some('*') => {
                            self.bump();
                            self.bump();
                            let mut prev = '\0';
                            loop {
                                match self.bump() {
                                    Some('/') if prev == '*' => break,
                                    Some(c) => prev = c,
                                    None => return Err(start.error("unterminated block comment")),
                                }
                            }
                        }
                        _ => {
                            return Err(
                                start.error("regular expression literals are not supported")
                            );
                        }
                    }
                }
                _ => return Ok(()),
            }
        }
    }

    fn next_token(&mut self) -> Result<Spanned, SchemaError> {
        self.skip_trivia()?;
        let pos = self.pos();

        let Some(&c) = self.chars.peek() else {
            return Ok(Spanned {
                token: Token::Eof,
                pos,
            });
        };

        let token = match c {
            '.' => self.single(Token::Dot),
            ',' => self.single(Token::Comma),
            ':' => self.single(Token::Colon),
            '(' => self.single(Token::LParen),
            ')' => self.single(Token::RParen),
            '{' => self.single(Token::LBrace),
            '}' => self.single(Token::RBrace),
            '[' => self.single(Token::LBracket),
            ']' => self.single(Token::RBracket),
            '\'' | '"' | '`' => Token::Str(self.string(pos)?),
            '-' | '0'..='9' => Token::Num(self.number(pos)?),
            c if c.is_alphabetic() || c == '_' || c == '$' => Token::Ident(self.ident()),
            other => return Err(pos.error(format!("unexpected character `{other}`"))),
        };

        Ok(Spanned { token, pos })
    }

    fn single(&mut self, token: Token) -> Token {
        self.bump();
        token
    }

    fn ident(&mut self) -> String {
        let mut name = String::new();
        while let Some(&c) = self.chars.peek() {
            if c.is_alphanumeric() || c == '_' || c == '$' {
                name.push(c);
                self.bump();
            } else {
                break;
            }
        }
        name
    }

    fn number(&mut self, pos: Pos) -> Result<Number, SchemaError> {
        let mut text = String::new();
        if self.chars.peek() == Some(&'-') {
            text.push('-');
            self.bump();
        }
        while let Some(&c) = self.chars.peek() {
            let sign_after_exponent = (c == '-' || c == '+') && text.ends_with(['e', 'E']);
            if c.is_ascii_digit() || matches!(c, '.' | 'e' | 'E' | '_') || sign_after_exponent {
                if c != '_' {
                    text.push(c);
                }
                self.bump();
            } else {
                break;
            }
        }

        if let Ok(int) = text.parse::<i64>() {
            return Ok(Number::from(int));
        }
        text.parse::<f64>()
            .ok()
            .and_then(Number::from_f64)
            .ok_or_else(|| pos.error(format!("invalid number `{text}`")))
    }

    fn string(&mut self, pos: Pos) -> Result<String, SchemaError> {
        let Some(quote) = self.bump() else {
            return Err(pos.error("unterminated string"));
        };
        let mut out = String::new();
        loop {
            match self.bump() {
                None => return Err(pos.error("unterminated string")),
                Some(c) if c == quote => return Ok(out),
                Some('\n') if quote != '`' => return Err(pos.error("unterminated string")),
                Some('$') if quote == '`' && self.chars.peek() == Some(&'{') => {
                    return Err(pos.error("template interpolation is not supported"));
                }
                Some('\\') => {
                    if let Some(c) = self.escape(pos)? {
                        out.push(c);
                    }
                }
                Some(c) => out.push(c),
            }
        }
    }

    /// Decodes one escape sequence. Line continuations decode to nothing.
    fn escape(&mut self, pos: Pos) -> Result<Option<char>, SchemaError> {
        let c = match self.bump() {
            Some('n') => '\n',
            Some('t') => '\t',
            Some('\r') => {
                if self.chars.peek() == Some(&'\n') {
                    self.bump();
                }
                return Ok(None);
            }
            Some('\n' | '\u{2028}' | '\u{2029}') => return Ok(None),
            Some('r') => '\r',
            Some('b') => '\u{8}',
            Some('f') => '\u{c}',
            Some('v') => '\u{b}',
            Some('0') => '\0',
            Some('x') => self.hex_escape(2, pos, "invalid hex escape")?,
            Some('u') => self.hex_escape(4, pos, "invalid unicode escape")?,
            Some(c) => c,
            None => return Err(pos.error("unterminated string")),
        };
        Ok(Some(c))
    }

    fn hex_escape(&mut self, digits: usize, pos: Pos, message: &str) -> Result<char, SchemaError> {
        let mut hex = String::with_capacity(digits);
        for _ in 0..digits {
            match self.bump() {
                Some(h) if h.is_ascii_hexdigit() => hex.push(h),
                _ => return Err(pos.error(message)),
            }
        }
        u32::from_str_radix(&hex, 16)
            .ok()
            .and_then(char::from_u32)
            .ok_or_else(|| pos.error(message))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn tokens(source: &str) -> Vec<Token> {
        Lexer::new(source)
            .tokenize()
            .unwrap()
            .into_iter()
            .map(|s| s.token)
            .collect()
    }

    #[test]
    fn test_call_chain() {
        assert_eq!(
            tokens("z.string().min(1)"),
            vec![
                Token::Ident("z".into()),
                Token::Dot,
                Token::Ident("string".into()),
                Token::LParen,
                Token::RParen,
                Token::Dot,
                Token::Ident("min".into()),
                Token::LParen,
                Token::Num(Number::from(1)),
                Token::RParen,
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_strings_and_comments() {
        assert_eq!(
            tokens("// note\n'a\\'b' /* block */ \"c\" `d`"),
            vec![
                Token::Str("a'b".into()),
                Token::Str("c".into()),
                Token::Str("d".into()),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_hex_escapes_and_line_continuations() {
        assert_eq!(
            tokens("'\\x41\\x62' \"one \\\ntwo\" 'a\\\r\nb'"),
            vec![
                Token::Str("Ab".into()),
                Token::Str("one two".into()),
                Token::Str("ab".into()),
                Token::Eof,
            ]
        );
        assert!(Lexer::new("'\\x4'").tokenize().is_err());
    }

    #[test]
    fn test_numbers() {
        assert_eq!(
            tokens("-3 0.5 1e3 1_000"),
            vec![
                Token::Num(Number::from(-3)),
                Token::Num(Number::from_f64(0.5).unwrap()),
                Token::Num(Number::from_f64(1000.0).unwrap()),
                Token::Num(Number::from(1000)),
                Token::Eof,
            ]
        );
    }

    #[test]
    fn test_positions_are_reported() {
        let err = Lexer::new("z.object({\n  a: #\n})").tokenize().unwrap_err();
        assert_eq!(
            err,
            SchemaError::Syntax {
                message: "unexpected character `#`".into(),
                line: 2,
                column: 6,
            }
        );
    }

    #[test]
    fn test_rejects_interpolation_and_regex() {
        assert!(Lexer::new("`${x}`").tokenize().is_err());
        assert!(Lexer::new("/ab+c/").tokenize().is_err());
        assert!(Lexer::new("'open").tokenize().is_err());
    }
}
