use crate::error::Position;

/// A lexed token. Literal payloads live in the kind; every token records
/// where it started so later stages can point diagnostics at the source.
#[derive(Debug, Clone, PartialEq)]
pub struct Token {
    pub kind: TokenKind,
    pub pos: Position,
}

#[derive(Debug, Clone, PartialEq)]
pub enum TokenKind {
    Eof,
    Ident(String),
    Int(i64),
    Float(f64),
    Str(String),
    Char(char),
    Bool(bool),

    LBrace,
    RBrace,
    Eq,
    Semi,
    Comma,
    LBracket,
    RBracket,
    Dollar,
    Dot,
    Caret,

    KwInt,
    KwFloat,
    KwBool,
    KwString,
    KwRef,
    KwExpr,

    /// A character the lexer does not understand. Not a lex error; the
    /// parser decides whether it is fatal.
    Unknown(char),
}

impl TokenKind {
    /// Short human description used in parse error messages.
    pub fn describe(&self) -> String {
        match self {
            TokenKind::Eof => "end of input".to_string(),
            TokenKind::Ident(name) => format!("identifier '{}'", name),
            TokenKind::Int(v) => format!("integer {}", v),
            TokenKind::Float(v) => format!("float {}", v),
            TokenKind::Str(s) => format!("string \"{}\"", s),
            TokenKind::Char(c) => format!("char '{}'", c.escape_default()),
            TokenKind::Bool(b) => format!("'{}'", b),
            TokenKind::LBrace => "'{'".to_string(),
            TokenKind::RBrace => "'}'".to_string(),
            TokenKind::Eq => "'='".to_string(),
            TokenKind::Semi => "';'".to_string(),
            TokenKind::Comma => "','".to_string(),
            TokenKind::LBracket => "'['".to_string(),
            TokenKind::RBracket => "']'".to_string(),
            TokenKind::Dollar => "'$'".to_string(),
            TokenKind::Dot => "'.'".to_string(),
            TokenKind::Caret => "'^'".to_string(),
            TokenKind::KwInt => "'int'".to_string(),
            TokenKind::KwFloat => "'float'".to_string(),
            TokenKind::KwBool => "'bool'".to_string(),
            TokenKind::KwString => "'string'".to_string(),
            TokenKind::KwRef => "'ref'".to_string(),
            TokenKind::KwExpr => "'expr'".to_string(),
            TokenKind::Unknown(c) => format!("unknown character '{}'", c.escape_default()),
        }
    }
}

/// Lexer state: a cursor over the input string. One instance per
/// tokenize call; nothing is shared between invocations.
struct Lexer<'a> {
    input: &'a str,
    pos: usize,
    line: usize,
    column: usize,
}

/// Tokenize the whole input up front. The returned vector always ends
/// with an `Eof` token, so the parser can peek freely past the end.
pub fn tokenize(input: &str) -> Vec<Token> {
    let mut lexer = Lexer {
        input,
        pos: 0,
        line: 0,
        column: 0,
    };
    // Skip a UTF-8 BOM if present.
    if input.as_bytes().starts_with(&[0xEF, 0xBB, 0xBF]) {
        lexer.pos = 3;
    }

    let mut tokens = Vec::new();
    loop {
        let token = lexer.next_token();
        let done = token.kind == TokenKind::Eof;
        tokens.push(token);
        if done {
            return tokens;
        }
    }
}

impl<'a> Lexer<'a> {
    fn remaining(&self) -> &'a str {
        &self.input[self.pos..]
    }

    fn peek_char(&self) -> Option<char> {
        self.remaining().chars().next()
    }

    fn peek_char_at(&self, n: usize) -> Option<char> {
        self.remaining().chars().nth(n)
    }

    fn bump(&mut self) -> Option<char> {
        let ch = self.peek_char()?;
        self.pos += ch.len_utf8();
        if ch == '\n' {
            self.line += 1;
            self.column = 0;
        } else {
            self.column += 1;
        }
        Some(ch)
    }

    fn position(&self) -> Position {
        Position {
            line: self.line,
            column: self.column,
            offset: self.pos,
        }
    }

    fn skip_ws_and_comments(&mut self) {
        loop {
            match self.peek_char() {
                Some(ch) if ch.is_whitespace() => {
                    self.bump();
                }
                Some('/') if self.peek_char_at(1) == Some('/') => {
                    while let Some(ch) = self.peek_char() {
                        if ch == '\n' {
                            break;
                        }
                        self.bump();
                    }
                }
                Some('/') if self.peek_char_at(1) == Some('*') => {
                    self.bump();
                    self.bump();
                    // An unterminated block comment runs to end of input.
                    while let Some(ch) = self.bump() {
                        if ch == '*' && self.peek_char() == Some('/') {
                            self.bump();
                            break;
                        }
                    }
                }
                _ => return,
            }
        }
    }

    fn next_token(&mut self) -> Token {
        self.skip_ws_and_comments();
        let pos = self.position();

        let ch = match self.peek_char() {
            Some(ch) => ch,
            None => {
                return Token {
                    kind: TokenKind::Eof,
                    pos,
                }
            }
        };

        let punct = match ch {
            '{' => Some(TokenKind::LBrace),
            '}' => Some(TokenKind::RBrace),
            '=' => Some(TokenKind::Eq),
            ';' => Some(TokenKind::Semi),
            ',' => Some(TokenKind::Comma),
            '[' => Some(TokenKind::LBracket),
            ']' => Some(TokenKind::RBracket),
            '$' => Some(TokenKind::Dollar),
            '.' => Some(TokenKind::Dot),
            '^' => Some(TokenKind::Caret),
            _ => None,
        };
        if let Some(kind) = punct {
            self.bump();
            return Token { kind, pos };
        }

        if ch == '"' {
            return Token {
                kind: self.lex_string(),
                pos,
            };
        }
        if ch == '\'' {
            return Token {
                kind: self.lex_char(),
                pos,
            };
        }
        if ch.is_ascii_alphabetic() || ch == '_' {
            return Token {
                kind: self.lex_ident(),
                pos,
            };
        }
        let starts_number = ch.is_ascii_digit()
            || (ch == '-' && self.peek_char_at(1).is_some_and(|c| c.is_ascii_digit()));
        if starts_number {
            return Token {
                kind: self.lex_number(),
                pos,
            };
        }

        self.bump();
        Token {
            kind: TokenKind::Unknown(ch),
            pos,
        }
    }

    /// Decode one character after a backslash. Unrecognized escapes pass
    /// the escaped character through literally.
    fn escape_char(&mut self) -> char {
        match self.bump() {
            Some('n') => '\n',
            Some('t') => '\t',
            Some('r') => '\r',
            Some('0') => '\0',
            Some(ch) => ch,
            None => '\\',
        }
    }

    fn lex_string(&mut self) -> TokenKind {
        self.bump(); // opening quote
        let mut text = String::new();
        while let Some(ch) = self.bump() {
            match ch {
                '"' => break,
                '\\' => text.push(self.escape_char()),
                _ => text.push(ch),
            }
        }
        TokenKind::Str(text)
    }

    fn lex_char(&mut self) -> TokenKind {
        self.bump(); // opening quote
        let ch = match self.bump() {
            Some('\\') => self.escape_char(),
            Some(ch) => ch,
            None => '\0',
        };
        // Tolerate a missing closing quote at end of input.
        if self.peek_char() == Some('\'') {
            self.bump();
        }
        TokenKind::Char(ch)
    }

    fn lex_ident(&mut self) -> TokenKind {
        let start = self.pos;
        while let Some(ch) = self.peek_char() {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                self.bump();
            } else {
                break;
            }
        }
        match &self.input[start..self.pos] {
            "int" => TokenKind::KwInt,
            "float" => TokenKind::KwFloat,
            "bool" => TokenKind::KwBool,
            "string" => TokenKind::KwString,
            "ref" => TokenKind::KwRef,
            "expr" => TokenKind::KwExpr,
            "true" => TokenKind::Bool(true),
            "false" => TokenKind::Bool(false),
            id => TokenKind::Ident(id.to_string()),
        }
    }

    fn lex_number(&mut self) -> TokenKind {
        let start = self.pos;
        if self.peek_char() == Some('-') {
            self.bump();
        }
        while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
            self.bump();
        }
        if self.peek_char() == Some('.') {
            self.bump();
            while self.peek_char().is_some_and(|c| c.is_ascii_digit()) {
                self.bump();
            }
            let text = &self.input[start..self.pos];
            return TokenKind::Float(text.parse().unwrap_or(0.0));
        }
        let text = &self.input[start..self.pos];
        match text.parse::<i64>() {
            Ok(v) => TokenKind::Int(v),
            // out-of-range literal clamps
            Err(_) => TokenKind::Int(if text.starts_with('-') {
                i64::MIN
            } else {
                i64::MAX
            }),
        }
    }
}

/// A cursor over a pre-tokenized stream. Lookahead is an index read, so
/// peeking never disturbs subsequent `advance` calls.
pub struct TokenStream {
    tokens: Vec<Token>,
    pos: usize,
}

impl TokenStream {
    pub fn new(input: &str) -> Self {
        TokenStream {
            tokens: tokenize(input),
            pos: 0,
        }
    }

    /// The current (not yet consumed) token.
    pub fn cur(&self) -> &Token {
        self.at(self.pos)
    }

    /// The token `n` positions ahead of the current one; `peek(0)` is
    /// the current token.
    pub fn peek(&self, n: usize) -> &Token {
        self.at(self.pos + n)
    }

    /// Consume and return the current token.
    pub fn bump(&mut self) -> Token {
        let token = self.cur().clone();
        self.advance();
        token
    }

    pub fn advance(&mut self) {
        // Never step past the trailing Eof token.
        if self.pos + 1 < self.tokens.len() {
            self.pos += 1;
        }
    }

    fn at(&self, index: usize) -> &Token {
        self.tokens
            .get(index)
            .unwrap_or_else(|| self.tokens.last().expect("stream ends with Eof"))
    }
}
