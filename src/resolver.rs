use crate::document::{BlockId, Document, FieldType};
use crate::error::{BclError, Result};
use crate::expr;
use crate::value::{PathSeg, Ref, RefScope, Value};
use tracing::{debug, warn};

/// Upper bound on resolution passes. Bounds pathological reference
/// chains (and cycles, which otherwise flip between two Ref values
/// forever).
const MAX_PASSES: usize = 16;

/// Replace every reference value in the document with a deep copy of
/// the value it points at, and evaluate `expr` fields, repeating whole
/// tree passes until a pass changes nothing.
///
/// Re-resolution is needed because a reference may point at a field
/// whose own value is still a reference, or whose expression has not
/// been evaluated yet; such a lookup copies the pending value and
/// yields to the next pass. Failed lookups, by contrast, are
/// immediately fatal.
pub fn resolve(doc: &mut Document) -> Result<()> {
    let block_ids: Vec<BlockId> = doc.block_ids().collect();

    for pass in 0..MAX_PASSES {
        let mut changed = 0usize;

        for &block_id in &block_ids {
            for field_index in 0..doc.block(block_id).fields.len() {
                let field = &doc.block(block_id).fields[field_index];

                if field.value.has_ref() {
                    let pending = field.value.clone();
                    let resolved = resolve_value(doc, block_id, pending)?;
                    let slot = &mut doc.block_mut(block_id).fields[field_index].value;
                    if *slot != resolved {
                        *slot = resolved;
                        changed += 1;
                    }
                } else if field.ty == FieldType::Expr {
                    if let Value::Str(text) = &field.value {
                        match expr::evaluate(text) {
                            Some(result) if result != *text => {
                                doc.block_mut(block_id).fields[field_index].value =
                                    Value::Str(result);
                                changed += 1;
                            }
                            Some(_) => {}
                            None => {
                                // Silent at the API level: the field keeps
                                // its raw text and is retried next pass.
                                warn!(
                                    field = %field.name,
                                    text = %text,
                                    "expression field failed to evaluate"
                                );
                            }
                        }
                    }
                }
            }
        }

        debug!(pass, changed, "resolution pass complete");
        if changed == 0 {
            break;
        }
    }

    // A reference that survives the pass cap never reached a concrete
    // value (a cycle, or a chain longer than the cap).
    for block_id in doc.block_ids() {
        for field in &doc.block(block_id).fields {
            if let Some(pos) = field.value.first_ref_pos() {
                return Err(BclError::resolve(
                    format!(
                        "reference in field '{}' did not settle within {} passes",
                        field.name, MAX_PASSES
                    ),
                    pos,
                ));
            }
        }
    }

    Ok(())
}

/// Resolve one value: a reference becomes a deep copy of its target's
/// current value, arrays resolve each element recursively, anything
/// else passes through. The copy may itself contain references; those
/// are left for the next pass.
fn resolve_value(doc: &Document, owner: BlockId, value: Value) -> Result<Value> {
    match value {
        Value::Ref(r) => resolve_ref(doc, owner, &r),
        Value::Array(items) => items
            .into_iter()
            .map(|item| resolve_value(doc, owner, item))
            .collect::<Result<Vec<_>>>()
            .map(Value::Array),
        other => Ok(other),
    }
}

/// Resolve a reference to a deep copy of the target field's value,
/// given the block that owns the referencing field.
fn resolve_ref(doc: &Document, owner: BlockId, r: &Ref) -> Result<Value> {
    match r.scope {
        RefScope::Global => {
            // The first segment names a root block; a name+label pair
            // selects the first root matching both.
            let (start, consumed) = match (r.segments.first(), r.segments.get(1)) {
                (Some(PathSeg::Name(name)), Some(PathSeg::Label(label))) => (
                    doc.find_root_labeled(name, label).ok_or_else(|| {
                        not_found(r, &format!("no top-level block '{}' [\"{}\"]", name, label))
                    })?,
                    2,
                ),
                (Some(PathSeg::Name(name)), _) => (
                    doc.find_root(name)
                        .ok_or_else(|| not_found(r, &format!("no top-level block '{}'", name)))?,
                    1,
                ),
                _ => return Err(not_found(r, "global reference must start with a name")),
            };
            walk_segments(doc, start, &r.segments[consumed..], r)
        }

        RefScope::Local => walk_segments(doc, owner, &r.segments, r),

        RefScope::Parent(levels) => {
            let mut scope = owner;
            for level in 0..levels {
                scope = doc.block(scope).parent.ok_or_else(|| {
                    not_found(
                        r,
                        &format!("reference goes {} level(s) up but block has only {}", levels, level),
                    )
                })?;
            }
            // Search outward: the leading segment binds in the first
            // enclosing scope (at or above the climbed one) where it
            // resolves; the remaining segments are then strict.
            loop {
                if leading_segment_resolves(doc, scope, &r.segments) {
                    return walk_segments(doc, scope, &r.segments, r);
                }
                scope = match doc.block(scope).parent {
                    Some(parent) => parent,
                    None => {
                        return Err(not_found(
                            r,
                            "parent reference target not found in any enclosing scope",
                        ))
                    }
                };
            }
        }
    }
}

/// Whether the first segment of a parent reference binds in `scope`.
fn leading_segment_resolves(doc: &Document, scope: BlockId, segments: &[PathSeg]) -> bool {
    match (segments.first(), segments.get(1)) {
        (Some(PathSeg::Name(name)), Some(PathSeg::Label(label))) => {
            doc.find_child_labeled(scope, name, label).is_some()
        }
        (Some(PathSeg::Name(name)), None) => doc.block(scope).find_field(name).is_some(),
        (Some(PathSeg::Name(name)), Some(_)) => doc.find_child(scope, name).is_some(),
        (Some(PathSeg::Label(label)), _) => doc.find_child_by_label(scope, label).is_some(),
        (None, _) => false,
    }
}

/// Walk the remaining segments from a block. Name segments select
/// child blocks (pairing with a following label index when present),
/// except the final segment, which must name a field; the field's
/// current value is deep-copied out.
fn walk_segments(doc: &Document, start: BlockId, segments: &[PathSeg], r: &Ref) -> Result<Value> {
    let mut pos = start;
    let mut index = 0;

    while index < segments.len() {
        let is_final = index + 1 == segments.len();
        match &segments[index] {
            PathSeg::Label(label) => {
                pos = doc.find_child_by_label(pos, label).ok_or_else(|| {
                    not_found(r, &format!("no child block labeled \"{}\"", label))
                })?;
                index += 1;
            }
            PathSeg::Name(name) => {
                if let Some(PathSeg::Label(label)) = segments.get(index + 1) {
                    pos = doc.find_child_labeled(pos, name, label).ok_or_else(|| {
                        not_found(r, &format!("no child block '{}' [\"{}\"]", name, label))
                    })?;
                    index += 2;
                } else if is_final {
                    let field = doc.block(pos).find_field(name).ok_or_else(|| {
                        not_found(r, &format!("no field '{}' in block '{}'", name, doc.block(pos).name))
                    })?;
                    return Ok(field.value.clone());
                } else {
                    pos = doc.find_child(pos, name).ok_or_else(|| {
                        not_found(r, &format!("no child block '{}'", name))
                    })?;
                    index += 1;
                }
            }
        }
    }

    // All segments consumed while still positioned on a block.
    Err(not_found(r, "reference must end on a field, not a block"))
}

fn not_found(r: &Ref, detail: &str) -> BclError {
    BclError::resolve(format!("cannot resolve {}: {}", r, detail), r.pos)
}
