use crate::document::{BlockId, Document, Field};
use crate::value::escape_str;
use std::fmt::Write;

struct TreeWriter {
    buf: String,
    depth: usize,
}

impl TreeWriter {
    fn new() -> Self {
        TreeWriter {
            buf: String::new(),
            depth: 0,
        }
    }

    fn indent(&mut self) {
        for _ in 0..self.depth {
            self.buf.push_str("  ");
        }
    }

    fn write_block(&mut self, doc: &Document, id: BlockId) {
        let block = doc.block(id);

        self.indent();
        match &block.label {
            Some(label) => {
                let _ = writeln!(&mut self.buf, "Block: {} \"{}\"", block.name, escape_str(label));
            }
            None => {
                let _ = writeln!(&mut self.buf, "Block: {}", block.name);
            }
        }

        self.depth += 1;
        for field in &block.fields {
            self.write_field(field);
        }
        for &child in &block.children {
            self.write_block(doc, child);
        }
        self.depth -= 1;
    }

    fn write_field(&mut self, field: &Field) {
        self.indent();
        let _ = writeln!(
            &mut self.buf,
            "Field: {} ({}) = {}",
            field.name,
            field.ty.keyword().unwrap_or("inferred"),
            field.value
        );
    }
}

/// Render the document as an indented diagnostic tree, one `Block:` or
/// `Field:` line per node. Not parseable; meant for inspection.
pub fn dump(doc: &Document) -> String {
    let mut w = TreeWriter::new();
    for &root in doc.roots() {
        w.write_block(doc, root);
    }
    w.buf
}

struct SourceWriter {
    buf: String,
    depth: usize,
}

impl SourceWriter {
    fn new() -> Self {
        SourceWriter {
            buf: String::new(),
            depth: 0,
        }
    }

    fn indent(&mut self) {
        for _ in 0..self.depth {
            self.buf.push_str("    ");
        }
    }

    fn write_block(&mut self, doc: &Document, id: BlockId) {
        let block = doc.block(id);

        self.indent();
        self.buf.push_str(&block.name);
        if let Some(label) = &block.label {
            let _ = write!(&mut self.buf, " \"{}\"", escape_str(label));
        }
        self.buf.push_str(" {\n");

        self.depth += 1;
        for field in &block.fields {
            self.write_field(field);
        }
        for &child in &block.children {
            self.write_block(doc, child);
        }
        self.depth -= 1;

        self.indent();
        self.buf.push_str("}\n");
    }

    fn write_field(&mut self, field: &Field) {
        self.indent();
        if let Some(keyword) = field.ty.keyword() {
            self.buf.push_str(keyword);
            self.buf.push(' ');
        }
        let _ = writeln!(&mut self.buf, "{} = {};", field.name, field.value);
    }
}

/// Serialize the document back to source form. The output parses to a
/// document equal to the input (up to positions).
pub fn to_source(doc: &Document) -> String {
    let mut w = SourceWriter::new();
    for &root in doc.roots() {
        w.write_block(doc, root);
    }
    w.buf
}
