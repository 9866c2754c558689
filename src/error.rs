use thiserror::Error;

/// A 0-based position in the source text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct Position {
    /// 0-based line number
    pub line: usize,
    /// 0-based column (character offset within the line)
    pub column: usize,
    /// 0-based absolute byte offset from the start of input
    pub offset: usize,
}

pub type Result<T> = std::result::Result<T, BclError>;

/// Errors surfaced by the engine. Both kinds abort the whole operation
/// that raised them; callers decide whether to retry or report.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum BclError {
    /// Unexpected token while parsing a document.
    #[error("parse error at {}:{}: {message}", .pos.line + 1, .pos.column + 1)]
    Parse { message: String, pos: Position },

    /// A reference failed to resolve, or references survived the pass cap.
    #[error("resolve error at {}:{}: {message}", .pos.line + 1, .pos.column + 1)]
    Resolve { message: String, pos: Position },
}

impl BclError {
    pub fn parse(message: impl Into<String>, pos: Position) -> Self {
        BclError::Parse {
            message: message.into(),
            pos,
        }
    }

    pub fn resolve(message: impl Into<String>, pos: Position) -> Self {
        BclError::Resolve {
            message: message.into(),
            pos,
        }
    }

    pub fn pos(&self) -> Position {
        match self {
            BclError::Parse { pos, .. } | BclError::Resolve { pos, .. } => *pos,
        }
    }

    /// Render the source line the error points at, with a caret under the
    /// offending column. Tabs in the prefix are preserved so the caret
    /// lines up in a terminal.
    pub fn context_line(&self, source: &str) -> String {
        let pos = self.pos();
        let line = source.lines().nth(pos.line).unwrap_or("");
        let mut caret = String::new();
        for ch in line.chars().take(pos.column) {
            caret.push(if ch == '\t' { '\t' } else { ' ' });
        }
        caret.push('^');
        format!("  {}\n  {}", line, caret)
    }
}
