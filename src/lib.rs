//! qt-linguist-language-server
//!
//! Qt Linguist `.ts` translation catalogs: a reader, writer and runtime
//! translator, plus a Language Server Protocol (LSP) implementation for
//! editing them.

pub mod catalog;
pub mod config;
pub mod db;
pub mod ide;
pub mod indexer;
pub mod input;
pub mod interned;
pub mod types;

#[cfg(test)]
mod test_utils;

pub use ide::backend::Backend;
