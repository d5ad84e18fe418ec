// Python import parser

pub mod ast;
pub mod imports;
pub mod lexer;
pub mod source;
pub mod statement;

// Public API re-exports
pub use ast::{ImportStatement, ImportTargets, ImportedName};
pub use source::{logical_lines, LogicalLine};
pub use statement::{parse_logical_line, Statement};

use lexer::starts_with_keyword;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("invalid syntax at line {line}: {message}")]
pub struct SyntaxError {
    pub line: usize,
    pub message: String,
}

impl SyntaxError {
    pub fn new(line: usize, message: impl Into<String>) -> Self {
        Self {
            line,
            message: message.into(),
        }
    }
}

/// Every name imported anywhere in `source`, in source order.
///
/// Imports nested in blocks (`try:`, `if`, function bodies) are included.
/// Any statement that does not parse fails the whole file.
pub fn find_imports(source: &str) -> Result<Vec<ImportedName>, SyntaxError> {
    let mut found = Vec::new();

    for logical in logical_lines(source)? {
        let text = logical.text.as_str();
        match parse_logical_line(text) {
            Some(Statement::Import(statement)) => found.extend(statement.imported_names()),
            Some(Statement::Other) => {}
            None if starts_with_keyword(text, "import") || starts_with_keyword(text, "from") => {
                return Err(SyntaxError::new(
                    logical.line,
                    format!("malformed import statement `{}`", text),
                ));
            }
            None => {
                return Err(SyntaxError::new(logical.line, format!("unparsable statement `{}`", text)));
            }
        }
    }

    Ok(found)
}
