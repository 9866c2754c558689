use crate::value::Value;

/// Index of a block in the document arena.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BlockId(pub(crate) usize);

/// Declared type tag of a field. Recorded but not enforced, except that
/// `Expr` marks the field for expression evaluation during resolve.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldType {
    Inferred,
    Int,
    Float,
    Bool,
    Str,
    Ref,
    Expr,
}

impl FieldType {
    /// The source keyword, or `None` for inferred fields.
    pub fn keyword(self) -> Option<&'static str> {
        match self {
            FieldType::Inferred => None,
            FieldType::Int => Some("int"),
            FieldType::Float => Some("float"),
            FieldType::Bool => Some("bool"),
            FieldType::Str => Some("string"),
            FieldType::Ref => Some("ref"),
            FieldType::Expr => Some("expr"),
        }
    }
}

/// A named, optionally typed, single-valued member of a block.
#[derive(Debug, Clone, PartialEq)]
pub struct Field {
    pub name: String,
    pub ty: FieldType,
    pub value: Value,
}

/// A named, optionally labeled container of fields and child blocks.
/// Children and the parent link are arena indices, never ownership.
#[derive(Debug, Clone, PartialEq)]
pub struct Block {
    pub name: String,
    pub label: Option<String>,
    pub fields: Vec<Field>,
    pub children: Vec<BlockId>,
    pub parent: Option<BlockId>,
}

impl Block {
    /// First field with the given name, in declaration order. Duplicate
    /// names are allowed; the first declaration wins.
    pub fn find_field(&self, name: &str) -> Option<&Field> {
        self.fields.iter().find(|f| f.name == name)
    }
}

/// The parse tree and the resolved configuration tree are the same
/// structure: an arena of blocks plus the ordered list of roots.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Document {
    blocks: Vec<Block>,
    roots: Vec<BlockId>,
}

impl Document {
    pub fn new() -> Self {
        Document::default()
    }

    /// Append a block to the arena, wiring it into its parent's child
    /// list (or the root list), and return its id.
    pub fn push_block(
        &mut self,
        name: String,
        label: Option<String>,
        parent: Option<BlockId>,
    ) -> BlockId {
        let id = BlockId(self.blocks.len());
        self.blocks.push(Block {
            name,
            label,
            fields: Vec::new(),
            children: Vec::new(),
            parent,
        });
        match parent {
            Some(parent_id) => self.blocks[parent_id.0].children.push(id),
            None => self.roots.push(id),
        }
        id
    }

    pub fn block(&self, id: BlockId) -> &Block {
        &self.blocks[id.0]
    }

    pub fn block_mut(&mut self, id: BlockId) -> &mut Block {
        &mut self.blocks[id.0]
    }

    /// Top-level blocks in declaration order.
    pub fn roots(&self) -> &[BlockId] {
        &self.roots
    }

    /// Every block id in the arena, in creation order.
    pub fn block_ids(&self) -> impl Iterator<Item = BlockId> {
        (0..self.blocks.len()).map(BlockId)
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// First root block with the given name.
    pub fn find_root(&self, name: &str) -> Option<BlockId> {
        self.roots
            .iter()
            .copied()
            .find(|&id| self.block(id).name == name)
    }

    /// First root block matching both name and label.
    pub fn find_root_labeled(&self, name: &str, label: &str) -> Option<BlockId> {
        self.roots.iter().copied().find(|&id| {
            let b = self.block(id);
            b.name == name && b.label.as_deref() == Some(label)
        })
    }

    /// First child of `parent` with the given name.
    pub fn find_child(&self, parent: BlockId, name: &str) -> Option<BlockId> {
        self.block(parent)
            .children
            .iter()
            .copied()
            .find(|&id| self.block(id).name == name)
    }

    /// First child of `parent` matching both name and label.
    pub fn find_child_labeled(&self, parent: BlockId, name: &str, label: &str) -> Option<BlockId> {
        self.block(parent).children.iter().copied().find(|&id| {
            let b = self.block(id);
            b.name == name && b.label.as_deref() == Some(label)
        })
    }

    /// First child of `parent` (of any name) carrying the given label.
    pub fn find_child_by_label(&self, parent: BlockId, label: &str) -> Option<BlockId> {
        self.block(parent)
            .children
            .iter()
            .copied()
            .find(|&id| self.block(id).label.as_deref() == Some(label))
    }
}
