//! Per-language scan configuration.
//!
//! Named after the teacher's `domain::chunking::config::LanguageConfig`,
//! but scoped to what a heuristic line-scan needs: which keyword a
//! declaration starts with is the same across languages (spec fixes the
//! keyword lists globally); what varies is how a declaration's *end* is
//! found, and which prefixes introduce a comment or an import.

use crate::domain::types::Language;

/// How a declaration's closing boundary is located.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScopeMode {
    /// Ends when brace nesting returns to zero (C-family, Rust, Swift, …).
    Brace,
    /// Ends when indentation returns to the declaration's own level (Python).
    Indentation,
    /// No structural end marker; ends at the next sibling declaration or
    /// end of file (Ruby's `end`-delimited blocks).
    NextSibling,
}

/// Per-language scan configuration.
#[derive(Debug, Clone, Copy)]
pub struct LanguageConfig {
    /// How this language's declaration scopes end.
    pub scope_mode: ScopeMode,
    /// Line-comment prefix, e.g. `"//"` or `"#"`.
    pub comment_prefix: &'static str,
    /// Prefixes that mark a module-level import/use line.
    pub import_prefixes: &'static [&'static str],
}

/// Look up the scan configuration for a chunkable language.
///
/// Returns `None` for markup/data languages, which have no parser
/// registered at all.
pub fn config_for(language: Language) -> Option<LanguageConfig> {
    use Language::*;
    use ScopeMode::*;
    Some(match language {
        Rust => LanguageConfig {
            scope_mode: Brace,
            comment_prefix: "//",
            import_prefixes: &["use "],
        },
        Swift | ObjC => LanguageConfig {
            scope_mode: Brace,
            comment_prefix: "//",
            import_prefixes: &["import "],
        },
        Kotlin | Java | CSharp | Cpp | C | Go => LanguageConfig {
            scope_mode: Brace,
            comment_prefix: "//",
            import_prefixes: &["import "],
        },
        JavaScript | TypeScript => LanguageConfig {
            scope_mode: Brace,
            comment_prefix: "//",
            import_prefixes: &["import ", "from "],
        },
        Php => LanguageConfig {
            scope_mode: Brace,
            comment_prefix: "//",
            import_prefixes: &["use "],
        },
        Python => LanguageConfig {
            scope_mode: Indentation,
            comment_prefix: "#",
            import_prefixes: &["import ", "from "],
        },
        Ruby => LanguageConfig {
            scope_mode: NextSibling,
            comment_prefix: "#",
            import_prefixes: &["import "],
        },
        Html | Css | Markdown | Json | Yaml | Xml => return None,
    })
}
