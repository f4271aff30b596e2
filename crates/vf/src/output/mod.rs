//! Output formatting utilities for the vf CLI.
//!
//! This module provides functions for formatting data as text or JSON.
//! It is organized into submodules by what is being shown:
//!
//! - [`ast`] - Parsed filters (tree view, JSON)
//! - [`tokens`] - Token streams (table, JSON)
//! - [`diagnostics`] - Filter error reports

mod ast;
mod diagnostics;
mod tokens;

pub use ast::{format_ast_json, format_ast_tree};
pub use diagnostics::format_diagnostic;
pub use tokens::{format_tokens_json, format_tokens_table};
