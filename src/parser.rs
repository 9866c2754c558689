use crate::document::{BlockId, Document, Field, FieldType};
use crate::error::{BclError, Result};
use crate::lexer::{TokenKind, TokenStream};
use crate::value::{PathSeg, Ref, RefScope, Value};

/// Parser state: a cursor over the token stream plus the document being
/// built. One instance per parse invocation.
struct Parser {
    stream: TokenStream,
    doc: Document,
}

/// Parse a BCL document. Any token mismatch aborts the whole parse with
/// a positioned error; there is no recovery.
pub fn parse(input: &str) -> Result<Document> {
    let mut parser = Parser {
        stream: TokenStream::new(input),
        doc: Document::new(),
    };

    loop {
        match parser.stream.cur().kind {
            TokenKind::Eof => break,
            TokenKind::Ident(_) => {
                parser.parse_block(None)?;
            }
            _ => return Err(parser.unexpected("top-level block name (identifier)")),
        }
    }

    Ok(parser.doc)
}

impl Parser {
    // ── Helpers ──────────────────────────────────────────────────────

    fn unexpected(&self, expected: &str) -> BclError {
        let token = self.stream.cur();
        BclError::parse(
            format!(
                "unexpected {}, expected {}",
                token.kind.describe(),
                expected
            ),
            token.pos,
        )
    }

    fn expect_ident(&mut self, expected: &str) -> Result<String> {
        match &self.stream.cur().kind {
            TokenKind::Ident(name) => {
                let name = name.clone();
                self.stream.advance();
                Ok(name)
            }
            _ => Err(self.unexpected(expected)),
        }
    }

    fn expect_string(&mut self, expected: &str) -> Result<String> {
        match &self.stream.cur().kind {
            TokenKind::Str(text) => {
                let text = text.clone();
                self.stream.advance();
                Ok(text)
            }
            _ => Err(self.unexpected(expected)),
        }
    }

    fn expect_punct(&mut self, kind: TokenKind, expected: &str) -> Result<()> {
        if self.stream.cur().kind == kind {
            self.stream.advance();
            Ok(())
        } else {
            Err(self.unexpected(expected))
        }
    }

    fn eat(&mut self, kind: TokenKind) -> bool {
        if self.stream.cur().kind == kind {
            self.stream.advance();
            true
        } else {
            false
        }
    }

    // ── Blocks ───────────────────────────────────────────────────────

    /// `block := IDENT STRING? '{' member* '}'`
    fn parse_block(&mut self, parent: Option<BlockId>) -> Result<BlockId> {
        let name = self.expect_ident("block name (identifier)")?;

        let label = match &self.stream.cur().kind {
            TokenKind::Str(text) => {
                let text = text.clone();
                self.stream.advance();
                Some(text)
            }
            _ => None,
        };

        self.expect_punct(TokenKind::LBrace, "'{' after block name")?;
        let id = self.doc.push_block(name, label, parent);

        loop {
            match &self.stream.cur().kind {
                TokenKind::RBrace => {
                    self.stream.advance();
                    break;
                }
                TokenKind::Eof => {
                    return Err(self.unexpected("field, child block, or '}'"));
                }
                TokenKind::KwInt
                | TokenKind::KwFloat
                | TokenKind::KwBool
                | TokenKind::KwString
                | TokenKind::KwRef
                | TokenKind::KwExpr => {
                    self.parse_typed_field(id)?;
                }
                TokenKind::Ident(_) => {
                    // Two tokens of lookahead decide field vs child block.
                    let next = &self.stream.peek(1).kind;
                    if *next == TokenKind::Eq {
                        self.parse_field(id, FieldType::Inferred)?;
                    } else if *next == TokenKind::LBrace
                        || (matches!(next, TokenKind::Str(_))
                            && self.stream.peek(2).kind == TokenKind::LBrace)
                    {
                        self.parse_block(Some(id))?;
                    } else {
                        return Err(
                            self.unexpected("'=' for a field or '{' for a child block")
                        );
                    }
                }
                _ => return Err(self.unexpected("typed field, field, or child block")),
            }
        }

        Ok(id)
    }

    // ── Fields ───────────────────────────────────────────────────────

    /// `typed_field := type_kw ('[' ']')? IDENT '=' literal ';'`
    fn parse_typed_field(&mut self, block: BlockId) -> Result<()> {
        let ty = match self.stream.cur().kind {
            TokenKind::KwInt => FieldType::Int,
            TokenKind::KwFloat => FieldType::Float,
            TokenKind::KwBool => FieldType::Bool,
            TokenKind::KwString => FieldType::Str,
            TokenKind::KwRef => FieldType::Ref,
            TokenKind::KwExpr => FieldType::Expr,
            _ => return Err(self.unexpected("type keyword")),
        };
        self.stream.advance();

        // Optional `[]` suffix: a documentation marker for array-typed
        // fields, parsed and discarded.
        if self.eat(TokenKind::LBracket) {
            self.expect_punct(TokenKind::RBracket, "']' after '[' in array type")?;
        }

        self.parse_field(block, ty)
    }

    fn parse_field(&mut self, block: BlockId, ty: FieldType) -> Result<()> {
        let name = self.expect_ident("field name (identifier)")?;
        self.expect_punct(TokenKind::Eq, "'=' after field name")?;
        let value = self.parse_literal()?;
        self.expect_punct(TokenKind::Semi, "';' after field value")?;

        self.doc.block_mut(block).fields.push(Field { name, ty, value });
        Ok(())
    }

    // ── Literals ─────────────────────────────────────────────────────

    fn parse_literal(&mut self) -> Result<Value> {
        let value = match &self.stream.cur().kind {
            TokenKind::Int(v) => Value::Int(*v),
            TokenKind::Float(v) => Value::Float(*v),
            TokenKind::Bool(v) => Value::Bool(*v),
            TokenKind::Char(c) => Value::Char(*c),
            TokenKind::Str(s) => Value::Str(s.clone()),
            TokenKind::LBrace => return self.parse_array(),
            TokenKind::Dollar | TokenKind::Caret => return self.parse_reference(),
            _ => {
                return Err(self.unexpected(
                    "literal (int, float, bool, string, char, array, or reference)",
                ))
            }
        };
        self.stream.advance();
        Ok(value)
    }

    /// `array := '{' (literal (',' literal)*)? '}'`
    fn parse_array(&mut self) -> Result<Value> {
        self.stream.advance(); // '{'
        let mut items = Vec::new();

        if self.eat(TokenKind::RBrace) {
            return Ok(Value::Array(items));
        }

        loop {
            items.push(self.parse_literal()?);
            if self.eat(TokenKind::Comma) {
                continue;
            }
            if self.eat(TokenKind::RBrace) {
                break;
            }
            return Err(self.unexpected("',' or '}' in array literal"));
        }

        Ok(Value::Array(items))
    }

    // ── References ───────────────────────────────────────────────────

    /// `reference := '$' IDENT seg* | '$' '.' IDENT seg* | '^'+ IDENT seg*`
    fn parse_reference(&mut self) -> Result<Value> {
        let pos = self.stream.cur().pos;

        let (scope, first) = if self.eat(TokenKind::Dollar) {
            if self.eat(TokenKind::Dot) {
                (RefScope::Local, self.expect_ident("identifier after '$.'")?)
            } else {
                (RefScope::Global, self.expect_ident("identifier after '$'")?)
            }
        } else {
            let mut levels = 0;
            while self.eat(TokenKind::Caret) {
                levels += 1;
            }
            (
                RefScope::Parent(levels),
                self.expect_ident("identifier after '^' in parent reference")?,
            )
        };

        let mut segments = vec![PathSeg::Name(first)];
        self.parse_ref_segments(&mut segments)?;

        Ok(Value::Ref(Ref {
            scope,
            segments,
            pos,
        }))
    }

    /// `path_seg := '.' IDENT | '[' STRING ']'`, repeated.
    fn parse_ref_segments(&mut self, segments: &mut Vec<PathSeg>) -> Result<()> {
        loop {
            if self.eat(TokenKind::Dot) {
                let name = self.expect_ident("identifier after '.' in reference")?;
                segments.push(PathSeg::Name(name));
            } else if self.eat(TokenKind::LBracket) {
                let label = self.expect_string("string index in reference")?;
                self.expect_punct(TokenKind::RBracket, "']' after string index in reference")?;
                segments.push(PathSeg::Label(label));
            } else {
                return Ok(());
            }
        }
    }
}
