//! Heuristic, language-aware chunk extraction (C3).
//!
//! `config` holds the per-language scan rules; `engine` walks a file's lines
//! against them. Nothing here is an AST: see `engine`'s module doc for why.

mod config;
mod engine;

pub use config::{config_for, LanguageConfig, ScopeMode};
pub use engine::{parse, ParsedChunk};
