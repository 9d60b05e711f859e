//! Errors raised while reading translation catalogs.

use std::path::PathBuf;

use thiserror::Error;

use crate::types::SourcePosition;

/// Errors produced by the TS parser.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum CatalogError {
    /// The document is not well-formed XML.
    #[error("Malformed XML at {}:{}: {message}", .position.line + 1, .position.character + 1)]
    Xml { message: String, position: SourcePosition },

    /// The root element is not `TS`.
    #[error("Expected root element <TS>, found <{found}>")]
    UnexpectedRoot { found: String },

    /// The document contains no element at all.
    #[error("Document has no <TS> root element")]
    MissingRoot,

    /// A required child element is absent.
    #[error("<{parent}> at line {} is missing its <{child}> element", .position.line + 1)]
    MissingElement { parent: &'static str, child: &'static str, position: SourcePosition },

    /// An element that the TS format does not define.
    #[error("Unexpected element <{name}> inside <{parent}> at line {}", .position.line + 1)]
    UnexpectedElement { name: String, parent: &'static str, position: SourcePosition },

    /// Character data where only elements are allowed.
    #[error("Unexpected text inside <{parent}> at line {}", .position.line + 1)]
    UnexpectedText { parent: &'static str, position: SourcePosition },

    /// An attribute value that cannot be interpreted.
    #[error("Invalid value '{value}' for attribute '{attribute}' of <{element}>")]
    InvalidAttribute { element: &'static str, attribute: &'static str, value: String },
}

/// Errors produced when loading a catalog from disk.
#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Failed to read '{}': {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse '{}': {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: CatalogError,
    },
}

#[cfg(test)]
mod tests {
    use googletest::prelude::*;

    use super::*;

    #[googletest::test]
    fn test_positions_are_reported_one_based() {
        let error = CatalogError::Xml {
            message: "unclosed tag".to_string(),
            position: SourcePosition { line: 4, character: 0 },
        };

        expect_that!(error.to_string(), eq("Malformed XML at 5:1: unclosed tag"));
    }

    #[googletest::test]
    fn test_load_error_names_the_file() {
        let error = LoadError::Parse {
            path: PathBuf::from("locale/patchance_fr.ts"),
            source: CatalogError::MissingRoot,
        };

        expect_that!(error.to_string(), contains_substring("locale/patchance_fr.ts"));
        expect_that!(error.to_string(), contains_substring("no <TS> root"));
    }
}
