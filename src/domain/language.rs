//! Path-extension language detection (C2).
//!
//! Grounded in the teacher's `domain::types::Language::from_extension`,
//! re-scoped to the fixed tag set this engine supports.

use crate::domain::types::Language;

/// Detect a [`Language`] from a file path by its extension, case-insensitive.
/// Unknown extensions yield `None`; such files still participate in Merkle
/// hashing but are never handed to a chunk parser.
pub fn detect(path: &str) -> Option<Language> {
    let ext = path.rsplit('.').next()?.to_lowercase();
    if ext == path.to_lowercase() {
        // No '.' in the path at all (rsplit returned the whole string).
        return None;
    }
    Some(match ext.as_str() {
        "swift" => Language::Swift,
        "kt" | "kts" => Language::Kotlin,
        "java" => Language::Java,
        "ts" | "tsx" => Language::TypeScript,
        "js" | "jsx" | "mjs" => Language::JavaScript,
        "py" => Language::Python,
        "go" => Language::Go,
        "rs" => Language::Rust,
        "cpp" | "cc" | "cxx" | "hpp" | "hh" | "hxx" => Language::Cpp,
        "c" | "h" => Language::C,
        "m" | "mm" => Language::ObjC,
        "rb" => Language::Ruby,
        "php" => Language::Php,
        "cs" => Language::CSharp,
        "html" => Language::Html,
        "css" => Language::Css,
        "md" | "markdown" => Language::Markdown,
        "json" => Language::Json,
        "yaml" | "yml" => Language::Yaml,
        "xml" => Language::Xml,
        _ => return None,
    })
}
