//! The expression sub-language: a small C-like grammar with casts,
//! unary/binary/ternary operators, and string concatenation. Completely
//! independent of the document grammar; it sees only the raw text of
//! fields declared with type `expr`.
//!
//! The contract is all-or-nothing: `evaluate` returns the result string
//! on success and `None` on any lex, parse, trailing-token, or
//! evaluation failure. There is never partial output.

#[derive(Debug, Clone, PartialEq)]
enum Token {
    End,
    Int(i64),
    Double(f64),
    Str(String),
    Ident(String),
    Op(Op),
    Question,
    Colon,
    LParen,
    RParen,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Op {
    Add,
    Sub,
    Mul,
    Div,
    Mod,
    Lt,
    Gt,
    Le,
    Ge,
    Eq,
    Ne,
    And,
    Or,
    Not,
}

#[derive(Debug, Clone, PartialEq)]
enum Node {
    Int(i64),
    Double(f64),
    Str(String),
    /// A bare identifier evaluates to its own text; there is no
    /// variable binding.
    Ident(String),
    Cast {
        ty: String,
        operand: Box<Node>,
    },
    Neg(Box<Node>),
    Not(Box<Node>),
    Binary {
        op: Op,
        lhs: Box<Node>,
        rhs: Box<Node>,
    },
    Ternary {
        cond: Box<Node>,
        then: Box<Node>,
        otherwise: Box<Node>,
    },
}

/// Runtime value of an expression.
#[derive(Debug, Clone, PartialEq)]
enum EvalValue {
    Int(i64),
    Double(f64),
    Str(String),
}

/// Evaluate an expression to its string form. `None` means the text is
/// not a valid expression (or hit division by zero); the caller treats
/// that as "leave the raw text alone".
pub fn evaluate(text: &str) -> Option<String> {
    let tokens = lex(text)?;
    let mut parser = Parser { tokens, pos: 0 };
    let ast = parser.parse_expr()?;
    if *parser.cur() != Token::End {
        return None;
    }
    Some(eval(&ast)?.into_string())
}

// ── Lexer ───────────────────────────────────────────────────────────

fn lex(text: &str) -> Option<Vec<Token>> {
    let mut chars = text.chars().peekable();
    let mut tokens = Vec::new();

    loop {
        while chars.peek().is_some_and(|c| c.is_whitespace()) {
            chars.next();
        }
        let ch = match chars.peek().copied() {
            Some(ch) => ch,
            None => {
                tokens.push(Token::End);
                return Some(tokens);
            }
        };

        if ch == '"' {
            chars.next();
            let mut text = String::new();
            loop {
                match chars.next()? {
                    '"' => break,
                    '\\' => match chars.next()? {
                        'n' => text.push('\n'),
                        't' => text.push('\t'),
                        'r' => text.push('\r'),
                        '0' => text.push('\0'),
                        other => text.push(other),
                    },
                    other => text.push(other),
                }
            }
            tokens.push(Token::Str(text));
            continue;
        }

        if ch.is_ascii_digit() || ch == '.' {
            let mut number = String::new();
            let mut is_double = false;
            while chars.peek().is_some_and(|c| c.is_ascii_digit()) {
                number.push(chars.next().unwrap_or_default());
            }
            if chars.peek() == Some(&'.') {
                is_double = true;
                number.push(chars.next().unwrap_or_default());
                while chars.peek().is_some_and(|c| c.is_ascii_digit()) {
                    number.push(chars.next().unwrap_or_default());
                }
            }
            // A lone '.' with no digits on either side is not a number.
            if number == "." {
                return None;
            }
            tokens.push(if is_double {
                Token::Double(number.parse().ok()?)
            } else {
                Token::Int(number.parse().ok()?)
            });
            continue;
        }

        if ch.is_ascii_alphabetic() || ch == '_' || ch == '$' {
            let mut ident = String::new();
            while chars
                .peek()
                .is_some_and(|&c| c.is_ascii_alphanumeric() || "_$.".contains(c))
            {
                ident.push(chars.next().unwrap_or_default());
            }
            tokens.push(Token::Ident(ident));
            continue;
        }

        chars.next();
        let two_char = match (ch, chars.peek().copied()) {
            ('<', Some('=')) => Some(Op::Le),
            ('>', Some('=')) => Some(Op::Ge),
            ('=', Some('=')) => Some(Op::Eq),
            ('!', Some('=')) => Some(Op::Ne),
            ('&', Some('&')) => Some(Op::And),
            ('|', Some('|')) => Some(Op::Or),
            _ => None,
        };
        if let Some(op) = two_char {
            chars.next();
            tokens.push(Token::Op(op));
            continue;
        }

        let token = match ch {
            '+' => Token::Op(Op::Add),
            '-' => Token::Op(Op::Sub),
            '*' => Token::Op(Op::Mul),
            '/' => Token::Op(Op::Div),
            '%' => Token::Op(Op::Mod),
            '<' => Token::Op(Op::Lt),
            '>' => Token::Op(Op::Gt),
            '!' => Token::Op(Op::Not),
            '?' => Token::Question,
            ':' => Token::Colon,
            '(' => Token::LParen,
            ')' => Token::RParen,
            _ => return None,
        };
        tokens.push(token);
    }
}

// ── Parser (precedence climbing) ────────────────────────────────────

struct Parser {
    tokens: Vec<Token>,
    pos: usize,
}

impl Parser {
    fn cur(&self) -> &Token {
        self.tokens.get(self.pos).unwrap_or(&Token::End)
    }

    fn advance(&mut self) {
        self.pos += 1;
    }

    fn eat(&mut self, token: &Token) -> bool {
        if self.cur() == token {
            self.advance();
            true
        } else {
            false
        }
    }

    fn eat_op(&mut self, candidates: &[Op]) -> Option<Op> {
        if let Token::Op(op) = *self.cur() {
            if candidates.contains(&op) {
                self.advance();
                return Some(op);
            }
        }
        None
    }

    fn parse_expr(&mut self) -> Option<Node> {
        self.parse_ternary()
    }

    fn parse_ternary(&mut self) -> Option<Node> {
        let cond = self.parse_logical_or()?;
        if self.eat(&Token::Question) {
            let then = self.parse_expr()?;
            if !self.eat(&Token::Colon) {
                return None;
            }
            let otherwise = self.parse_expr()?;
            return Some(Node::Ternary {
                cond: Box::new(cond),
                then: Box::new(then),
                otherwise: Box::new(otherwise),
            });
        }
        Some(cond)
    }

    fn parse_binary_level(
        &mut self,
        ops: &[Op],
        next: fn(&mut Self) -> Option<Node>,
    ) -> Option<Node> {
        let mut lhs = next(self)?;
        while let Some(op) = self.eat_op(ops) {
            let rhs = next(self)?;
            lhs = Node::Binary {
                op,
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Some(lhs)
    }

    fn parse_logical_or(&mut self) -> Option<Node> {
        self.parse_binary_level(&[Op::Or], Self::parse_logical_and)
    }

    fn parse_logical_and(&mut self) -> Option<Node> {
        self.parse_binary_level(&[Op::And], Self::parse_equality)
    }

    fn parse_equality(&mut self) -> Option<Node> {
        self.parse_binary_level(&[Op::Eq, Op::Ne], Self::parse_comparison)
    }

    fn parse_comparison(&mut self) -> Option<Node> {
        self.parse_binary_level(&[Op::Lt, Op::Gt, Op::Le, Op::Ge], Self::parse_additive)
    }

    fn parse_additive(&mut self) -> Option<Node> {
        self.parse_binary_level(&[Op::Add, Op::Sub], Self::parse_multiplicative)
    }

    fn parse_multiplicative(&mut self) -> Option<Node> {
        self.parse_binary_level(&[Op::Mul, Op::Div, Op::Mod], Self::parse_unary)
    }

    fn parse_unary(&mut self) -> Option<Node> {
        if self.eat(&Token::Op(Op::Sub)) {
            return Some(Node::Neg(Box::new(self.parse_unary()?)));
        }
        if self.eat(&Token::Op(Op::Not)) {
            return Some(Node::Not(Box::new(self.parse_unary()?)));
        }

        // C-style cast: '(' IDENT ')' unary. Backtrack if the
        // parenthesized content is anything else.
        if *self.cur() == Token::LParen {
            let saved = self.pos;
            self.advance();
            if let Token::Ident(ty) = self.cur().clone() {
                self.advance();
                if self.eat(&Token::RParen) {
                    let operand = self.parse_unary()?;
                    return Some(Node::Cast {
                        ty,
                        operand: Box::new(operand),
                    });
                }
            }
            self.pos = saved;
        }

        self.parse_primary()
    }

    fn parse_primary(&mut self) -> Option<Node> {
        if self.eat(&Token::LParen) {
            let inner = self.parse_expr()?;
            if !self.eat(&Token::RParen) {
                return None;
            }
            return Some(inner);
        }
        let node = match self.cur().clone() {
            Token::Int(v) => Node::Int(v),
            Token::Double(v) => Node::Double(v),
            Token::Str(s) => Node::Str(s),
            Token::Ident(name) => Node::Ident(name),
            _ => return None,
        };
        self.advance();
        Some(node)
    }
}

// ── Evaluator ───────────────────────────────────────────────────────

impl EvalValue {
    fn into_string(self) -> String {
        match self {
            EvalValue::Int(v) => v.to_string(),
            EvalValue::Double(v) => v.to_string(),
            EvalValue::Str(s) => s,
        }
    }

    fn to_display(&self) -> String {
        self.clone().into_string()
    }

    fn as_double(&self) -> Option<f64> {
        match self {
            EvalValue::Int(v) => Some(*v as f64),
            EvalValue::Double(v) => Some(*v),
            EvalValue::Str(_) => None,
        }
    }

    fn as_int(&self) -> Option<i64> {
        match self {
            EvalValue::Int(v) => Some(*v),
            EvalValue::Double(v) => Some(*v as i64),
            EvalValue::Str(_) => None,
        }
    }

    fn truthy(&self) -> bool {
        match self {
            EvalValue::Int(v) => *v != 0,
            EvalValue::Double(v) => *v != 0.0,
            EvalValue::Str(s) => !s.is_empty(),
        }
    }

    fn is_double(&self) -> bool {
        matches!(self, EvalValue::Double(_))
    }

    fn is_str(&self) -> bool {
        matches!(self, EvalValue::Str(_))
    }
}

fn eval(node: &Node) -> Option<EvalValue> {
    match node {
        Node::Int(v) => Some(EvalValue::Int(*v)),
        Node::Double(v) => Some(EvalValue::Double(*v)),
        Node::Str(s) => Some(EvalValue::Str(s.clone())),
        Node::Ident(name) => Some(EvalValue::Str(name.clone())),

        Node::Cast { ty, operand } => {
            let value = eval(operand)?;
            match ty.as_str() {
                "int" => Some(EvalValue::Int(value.as_int()?)),
                "double" => Some(EvalValue::Double(value.as_double()?)),
                // any other cast type name is a no-op
                _ => Some(value),
            }
        }

        Node::Neg(operand) => match eval(operand)? {
            EvalValue::Int(v) => Some(EvalValue::Int(v.wrapping_neg())),
            EvalValue::Double(v) => Some(EvalValue::Double(-v)),
            EvalValue::Str(_) => None,
        },

        Node::Not(operand) => Some(EvalValue::Int(!eval(operand)?.truthy() as i64)),

        Node::Binary { op, lhs, rhs } => {
            let lhs = eval(lhs)?;
            let rhs = eval(rhs)?;
            eval_binary(*op, lhs, rhs)
        }

        Node::Ternary {
            cond,
            then,
            otherwise,
        } => {
            if eval(cond)?.truthy() {
                eval(then)
            } else {
                eval(otherwise)
            }
        }
    }
}

fn eval_binary(op: Op, lhs: EvalValue, rhs: EvalValue) -> Option<EvalValue> {
    match op {
        Op::Add => {
            // `+` with any string operand is concatenation.
            if lhs.is_str() || rhs.is_str() {
                return Some(EvalValue::Str(lhs.to_display() + &rhs.to_display()));
            }
            numeric(lhs, rhs, |a, b| a.wrapping_add(b), |a, b| a + b)
        }
        Op::Sub => numeric(lhs, rhs, |a, b| a.wrapping_sub(b), |a, b| a - b),
        Op::Mul => numeric(lhs, rhs, |a, b| a.wrapping_mul(b), |a, b| a * b),
        Op::Div => {
            if lhs.is_double() || rhs.is_double() {
                return Some(EvalValue::Double(lhs.as_double()? / rhs.as_double()?));
            }
            let divisor = rhs.as_int()?;
            if divisor == 0 {
                return None;
            }
            Some(EvalValue::Int(lhs.as_int()?.wrapping_div(divisor)))
        }
        Op::Mod => {
            let divisor = rhs.as_int()?;
            if divisor == 0 {
                return None;
            }
            Some(EvalValue::Int(lhs.as_int()?.wrapping_rem(divisor)))
        }
        Op::Lt => compare(lhs, rhs, |o| o == std::cmp::Ordering::Less),
        Op::Gt => compare(lhs, rhs, |o| o == std::cmp::Ordering::Greater),
        Op::Le => compare(lhs, rhs, |o| o != std::cmp::Ordering::Greater),
        Op::Ge => compare(lhs, rhs, |o| o != std::cmp::Ordering::Less),
        Op::Eq | Op::Ne => {
            // Equality stringifies when either side is a string.
            let equal = if lhs.is_str() || rhs.is_str() {
                lhs.to_display() == rhs.to_display()
            } else {
                lhs.as_double()? == rhs.as_double()?
            };
            let wanted = if op == Op::Eq { equal } else { !equal };
            Some(EvalValue::Int(wanted as i64))
        }
        Op::And => Some(EvalValue::Int((lhs.truthy() && rhs.truthy()) as i64)),
        Op::Or => Some(EvalValue::Int((lhs.truthy() || rhs.truthy()) as i64)),
        Op::Not => None, // unary only, never reaches here
    }
}

/// Apply a binary arithmetic op with numeric promotion: any double
/// operand makes the result a double, otherwise integer arithmetic.
fn numeric(
    lhs: EvalValue,
    rhs: EvalValue,
    int_op: fn(i64, i64) -> i64,
    double_op: fn(f64, f64) -> f64,
) -> Option<EvalValue> {
    if lhs.is_double() || rhs.is_double() {
        Some(EvalValue::Double(double_op(
            lhs.as_double()?,
            rhs.as_double()?,
        )))
    } else {
        Some(EvalValue::Int(int_op(lhs.as_int()?, rhs.as_int()?)))
    }
}

fn compare(
    lhs: EvalValue,
    rhs: EvalValue,
    accept: fn(std::cmp::Ordering) -> bool,
) -> Option<EvalValue> {
    let ordering = lhs.as_double()?.partial_cmp(&rhs.as_double()?)?;
    Some(EvalValue::Int(accept(ordering) as i64))
}
