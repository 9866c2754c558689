use crate::error::Position;
use std::fmt;

/// A field value. `Clone` is the deep copy used by reference
/// resolution; arrays copy their elements structurally.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Int(i64),
    Float(f64),
    Bool(bool),
    Char(char),
    Str(String),
    Array(Vec<Value>),
    /// An unresolved reference. Only present between parse and resolve;
    /// a resolved document contains none of these.
    Ref(Ref),
}

impl Value {
    /// True if this value is, or contains, an unresolved reference.
    pub fn has_ref(&self) -> bool {
        match self {
            Value::Ref(_) => true,
            Value::Array(items) => items.iter().any(Value::has_ref),
            _ => false,
        }
    }

    /// The position of the first reference in this value, if any.
    pub fn first_ref_pos(&self) -> Option<Position> {
        match self {
            Value::Ref(r) => Some(r.pos),
            Value::Array(items) => items.iter().find_map(Value::first_ref_pos),
            _ => None,
        }
    }
}

/// Where a reference starts its walk.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RefScope {
    /// `$name...` — search the top-level document list.
    Global,
    /// `$.name...` — start at the block owning the field.
    Local,
    /// `^^name...` — walk up this many parent links (>= 1).
    Parent(usize),
}

/// One step of a reference path: a block/field name, or a `["label"]`
/// index selecting a labeled child block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PathSeg {
    Name(String),
    Label(String),
}

/// An unresolved pointer to another field. Immutable once parsed; the
/// position is that of the introducing `$` or `^` token.
#[derive(Debug, Clone)]
pub struct Ref {
    pub scope: RefScope,
    pub segments: Vec<PathSeg>,
    pub pos: Position,
}

/// Positions are diagnostics, not identity: two refs naming the same
/// target compare equal wherever they appear.
impl PartialEq for Ref {
    fn eq(&self, other: &Self) -> bool {
        self.scope == other.scope && self.segments == other.segments
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Int(v) => write!(f, "{}", v),
            Value::Float(v) => write!(f, "{}", format_float(*v)),
            Value::Bool(v) => write!(f, "{}", v),
            Value::Char(c) => write!(f, "'{}'", escape_char(*c)),
            Value::Str(s) => write!(f, "\"{}\"", escape_str(s)),
            Value::Array(items) => {
                write!(f, "{{")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", item)?;
                }
                write!(f, "}}")
            }
            Value::Ref(r) => write!(f, "{}", r),
        }
    }
}

impl fmt::Display for Ref {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.scope {
            RefScope::Global => write!(f, "$")?,
            RefScope::Local => write!(f, "$.")?,
            RefScope::Parent(levels) => {
                for _ in 0..levels {
                    write!(f, "^")?;
                }
            }
        }
        let mut first = true;
        for seg in &self.segments {
            match seg {
                PathSeg::Name(name) => {
                    if !first {
                        write!(f, ".")?;
                    }
                    write!(f, "{}", name)?;
                }
                PathSeg::Label(label) => write!(f, "[\"{}\"]", escape_str(label))?,
            }
            first = false;
        }
        Ok(())
    }
}

/// Format a float so it re-parses as a float: values with no fractional
/// part keep a trailing `.0`.
pub fn format_float(v: f64) -> String {
    if v.is_finite() && v == v.trunc() {
        format!("{:.1}", v)
    } else {
        format!("{}", v)
    }
}

fn escape_char(c: char) -> String {
    match c {
        '\n' => "\\n".to_string(),
        '\t' => "\\t".to_string(),
        '\r' => "\\r".to_string(),
        '\0' => "\\0".to_string(),
        '\\' => "\\\\".to_string(),
        '\'' => "\\'".to_string(),
        c => c.to_string(),
    }
}

pub(crate) fn escape_str(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\0' => out.push_str("\\0"),
            '\\' => out.push_str("\\\\"),
            '"' => out.push_str("\\\""),
            c => out.push(c),
        }
    }
    out
}
