//! Path queries over a resolved document.
//!
//! A path uses `.` to separate segments and brackets for indexing:
//! `server.listen[0]`, `host["prod"].port`, `nums[2]`. Misses are not
//! errors; every lookup returns an `Option`.

use crate::document::{BlockId, Document};
use crate::value::Value;

/// One parsed query segment: an optional name plus at most one indexer.
struct Segment {
    name: Option<String>,
    label: Option<String>,
    index: Option<usize>,
}

/// Locate a value by path. The first segment selects a root block by
/// name (a label or numeric index disambiguates same-named roots);
/// intermediate segments select child blocks the same way; the final
/// segment must name a field, with an optional numeric index selecting
/// one element of an array-valued field.
pub fn find_value<'a>(doc: &'a Document, path: &str) -> Option<&'a Value> {
    let segments = split_path(path)?;
    if segments.is_empty() {
        return None;
    }

    let mut cur: Option<BlockId> = None;
    for (i, seg) in segments.iter().enumerate() {
        let is_final = i + 1 == segments.len();

        match cur {
            None => {
                cur = Some(select_root(doc, seg)?);
            }
            Some(block) if is_final => {
                let name = seg.name.as_deref()?;
                if seg.label.is_some() {
                    return None;
                }
                let field = doc.block(block).find_field(name)?;
                return match seg.index {
                    None => Some(&field.value),
                    Some(n) => match &field.value {
                        Value::Array(items) => items.get(n),
                        _ => None,
                    },
                };
            }
            Some(block) => {
                cur = Some(select_child(doc, block, seg)?);
            }
        }
    }

    // Path ended on a block, not a field.
    None
}

fn select_root(doc: &Document, seg: &Segment) -> Option<BlockId> {
    match (&seg.name, &seg.label, seg.index) {
        (Some(name), Some(label), None) => doc.find_root_labeled(name, label),
        (Some(name), None, Some(n)) => doc
            .roots()
            .iter()
            .copied()
            .filter(|&id| doc.block(id).name == *name)
            .nth(n),
        (Some(name), None, None) => doc.find_root(name),
        (None, Some(label), None) => doc
            .roots()
            .iter()
            .copied()
            .find(|&id| doc.block(id).label.as_deref() == Some(label.as_str())),
        _ => None,
    }
}

fn select_child(doc: &Document, parent: BlockId, seg: &Segment) -> Option<BlockId> {
    match (&seg.name, &seg.label, seg.index) {
        (Some(name), Some(label), None) => doc.find_child_labeled(parent, name, label),
        // `name[N]`: the Nth child sharing that name among siblings.
        (Some(name), None, Some(n)) => doc
            .block(parent)
            .children
            .iter()
            .copied()
            .filter(|&id| doc.block(id).name == *name)
            .nth(n),
        (Some(name), None, None) => doc.find_child(parent, name),
        (None, Some(label), None) => doc.find_child_by_label(parent, label),
        _ => None,
    }
}

// ── Typed getters ───────────────────────────────────────────────────

pub fn get_int(doc: &Document, path: &str) -> Option<i64> {
    match find_value(doc, path)? {
        Value::Int(v) => Some(*v),
        _ => None,
    }
}

/// Accepts Int as well, widening.
pub fn get_float(doc: &Document, path: &str) -> Option<f64> {
    match find_value(doc, path)? {
        Value::Float(v) => Some(*v),
        Value::Int(v) => Some(*v as f64),
        _ => None,
    }
}

pub fn get_bool(doc: &Document, path: &str) -> Option<bool> {
    match find_value(doc, path)? {
        Value::Bool(v) => Some(*v),
        _ => None,
    }
}

pub fn get_string<'a>(doc: &'a Document, path: &str) -> Option<&'a str> {
    match find_value(doc, path)? {
        Value::Str(s) => Some(s.as_str()),
        _ => None,
    }
}

// ── Path splitting and segment parsing ──────────────────────────────

/// Split a path on `.` outside brackets, then parse each piece.
/// Returns `None` on any malformed segment.
fn split_path(path: &str) -> Option<Vec<Segment>> {
    let mut segments = Vec::new();
    let mut start = 0;
    let mut in_bracket = false;

    for (i, ch) in path.char_indices() {
        match ch {
            '[' => in_bracket = true,
            ']' => in_bracket = false,
            '.' if !in_bracket => {
                segments.push(parse_segment(&path[start..i])?);
                start = i + 1;
            }
            _ => {}
        }
    }
    segments.push(parse_segment(&path[start..])?);
    Some(segments)
}

fn parse_segment(text: &str) -> Option<Segment> {
    let mut chars = text.trim().chars().peekable();

    let mut name = String::new();
    if chars
        .peek()
        .is_some_and(|&c| c.is_ascii_alphabetic() || c == '_')
    {
        while chars
            .peek()
            .is_some_and(|&c| c.is_ascii_alphanumeric() || c == '_')
        {
            name.push(chars.next()?);
        }
    }

    let mut label = None;
    let mut index = None;
    if chars.peek() == Some(&'[') {
        chars.next();
        match chars.peek() {
            Some('"') => {
                chars.next();
                let mut text = String::new();
                loop {
                    match chars.next()? {
                        '"' => break,
                        ch => text.push(ch),
                    }
                }
                label = Some(text);
            }
            Some(c) if c.is_ascii_digit() => {
                let mut digits = String::new();
                while chars.peek().is_some_and(|c| c.is_ascii_digit()) {
                    digits.push(chars.next()?);
                }
                index = Some(digits.parse().ok()?);
            }
            _ => return None,
        }
        if chars.next() != Some(']') {
            return None;
        }
    }

    // Anything left over makes the segment malformed.
    if chars.next().is_some() {
        return None;
    }
    if name.is_empty() && label.is_none() {
        return None;
    }

    Some(Segment {
        name: (!name.is_empty()).then_some(name),
        label,
        index,
    })
}
