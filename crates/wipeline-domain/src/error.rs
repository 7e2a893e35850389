//! Error types for the domain layer

use thiserror::Error;

/// Errors raised while parsing an export document
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ParseError {
    /// Document ended in the middle of a construct
    #[error("unexpected end of document")]
    UnexpectedEof,

    /// Structurally invalid markup
    #[error("malformed document at byte {offset}: {message}")]
    Malformed {
        /// Byte offset into the input where parsing failed
        offset: usize,
        /// What the parser expected or found
        message: String,
    },

    /// Closing tag does not match the element being closed
    #[error("mismatched closing tag at byte {offset}: expected </{expected}>, found </{found}>")]
    MismatchedTag {
        /// Byte offset of the closing tag
        offset: usize,
        /// Tag of the open element
        expected: String,
        /// Tag found in the closing position
        found: String,
    },

    /// Unknown character entity reference
    #[error("unknown entity reference at byte {offset}: &{entity};")]
    UnknownEntity {
        /// Byte offset of the `&`
        offset: usize,
        /// The entity name as written
        entity: String,
    },
}
