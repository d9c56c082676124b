//! Heuristic line-scan chunk parser (C3).
//!
//! A declaration's chunk begins at its first non-blank line (including any
//! contiguous preceding comment lines) and extends to the matching brace,
//! the next sibling declaration, or an indentation return-to-baseline,
//! whichever the language's [`ScopeMode`] calls for. This is deliberately
//! not an AST: it is the line-scan spec.md mandates in place of the
//! teacher's tree-sitter pipeline (dropped, see DESIGN.md).

use super::config::{config_for, ScopeMode};
use crate::domain::types::{ChunkType, Language};

/// A single chunk produced by the heuristic scan, before it is turned into
/// a [`crate::domain::types::CodeChunk`] by the orchestrator (which adds
/// the content hash, ids, and timestamps).
#[derive(Debug, Clone, PartialEq)]
pub struct ParsedChunk {
    /// 1-based first line of the chunk, inclusive.
    pub start_line: u32,
    /// 1-based last line of the chunk, inclusive.
    pub end_line: u32,
    /// The chunk's source text, leading comments included.
    pub content: String,
    /// The kind of declaration this chunk represents.
    pub chunk_type: ChunkType,
    /// The declared identifier, if one could be extracted.
    pub symbol_name: Option<String>,
    /// Estimated token count, a character-count heuristic.
    pub token_count: u32,
    /// Module-level import/use lines found anywhere in the file.
    pub imports: Vec<String>,
}

const FUNCTION_KEYWORDS: &[&str] = &["func ", "function ", "def ", "fn "];

const CLASS_LIKE: &[(&str, ChunkType)] = &[
    ("class ", ChunkType::Class),
    ("struct ", ChunkType::Struct),
    ("enum ", ChunkType::Enum),
    ("protocol ", ChunkType::Interface),
    ("interface ", ChunkType::Interface),
    ("trait ", ChunkType::Declaration),
    ("impl ", ChunkType::Declaration),
    ("mod ", ChunkType::Declaration),
];

const MODIFIERS: &[&str] = &[
    "pub(crate) ",
    "pub(super) ",
    "pub ",
    "public ",
    "private ",
    "protected ",
    "export default ",
    "export ",
    "static ",
    "async ",
    "override ",
    "final ",
    "abstract ",
];

/// Parse `source` into chunks for `language`. Returns an empty vector for
/// languages with no registered parser (the markup/data tags).
pub fn parse(source: &str, language: Language) -> Vec<ParsedChunk> {
    let Some(cfg) = config_for(language) else {
        return Vec::new();
    };
    let lines: Vec<&str> = source.lines().collect();
    if lines.is_empty() {
        return Vec::new();
    }

    let imports = collect_imports(&lines, cfg.import_prefixes);
    let declarations = find_declarations(&lines);

    if declarations.is_empty() {
        let end = last_non_blank_index(&lines);
        let content = lines[..=end].join("\n");
        return vec![ParsedChunk {
            start_line: 1,
            end_line: (end + 1) as u32,
            token_count: token_count(&content),
            content,
            chunk_type: ChunkType::Module,
            symbol_name: None,
            imports,
        }];
    }

    declarations
        .iter()
        .enumerate()
        .map(|(idx, (decl_idx, chunk_type, symbol))| {
            let start = extend_for_leading_comments(&lines, *decl_idx, cfg.comment_prefix);
            let next_decl_start = declarations.get(idx + 1).map(|(n, _, _)| *n);
            let end = find_end(&lines, *decl_idx, next_decl_start, cfg.scope_mode);
            let content = lines[start..=end].join("\n");
            ParsedChunk {
                start_line: (start + 1) as u32,
                end_line: (end + 1) as u32,
                token_count: token_count(&content),
                content,
                chunk_type: *chunk_type,
                symbol_name: symbol.clone(),
                imports: imports.clone(),
            }
        })
        .collect()
}

fn find_declarations(lines: &[&str]) -> Vec<(usize, ChunkType, Option<String>)> {
    let mut out = Vec::new();
    for (i, line) in lines.iter().enumerate() {
        let trimmed = line.trim();
        if trimmed.is_empty() || indent_of(line) != 0 {
            continue;
        }
        if let Some((chunk_type, symbol)) = classify_declaration(trimmed) {
            out.push((i, chunk_type, symbol));
        }
    }
    out
}

fn classify_declaration(trimmed: &str) -> Option<(ChunkType, Option<String>)> {
    // Arrow function assigned to const/let/var at module scope.
    let var_rest = trimmed
        .strip_prefix("const ")
        .or_else(|| trimmed.strip_prefix("let "))
        .or_else(|| trimmed.strip_prefix("var "));
    if let Some(rest) = var_rest {
        if trimmed.contains("=>") {
            return Some((ChunkType::Function, extract_identifier(rest)));
        }
    }

    // Java/C# style "public static <ret> name(...)", its own prefix, not a
    // stackable modifier, per spec.md's function-like keyword list.
    if let Some(rest) = trimmed.strip_prefix("public static ") {
        let symbol = extract_symbol_before_paren(rest).or_else(|| extract_identifier(rest));
        return Some((ChunkType::Function, symbol));
    }

    let stripped = strip_modifiers(trimmed);

    for kw in FUNCTION_KEYWORDS {
        if let Some(rest) = stripped.strip_prefix(kw) {
            return Some((ChunkType::Function, extract_identifier(rest)));
        }
    }
    for (kw, chunk_type) in CLASS_LIKE {
        if let Some(rest) = stripped.strip_prefix(kw) {
            return Some((*chunk_type, extract_identifier(rest)));
        }
    }
    None
}

fn strip_modifiers(trimmed: &str) -> &str {
    let mut s = trimmed;
    loop {
        let mut changed = false;
        for m in MODIFIERS {
            if let Some(rest) = s.strip_prefix(m) {
                s = rest;
                changed = true;
                break;
            }
        }
        if !changed {
            break;
        }
    }
    s
}

fn extract_identifier(rest: &str) -> Option<String> {
    let ident: String = rest
        .chars()
        .take_while(|c| c.is_alphanumeric() || *c == '_')
        .collect();
    if ident.is_empty() {
        None
    } else {
        Some(ident)
    }
}

fn extract_symbol_before_paren(rest: &str) -> Option<String> {
    let paren_pos = rest.find('(')?;
    rest[..paren_pos]
        .split_whitespace()
        .next_back()
        .map(|tok| tok.trim_matches(|c: char| !(c.is_alphanumeric() || c == '_')).to_string())
        .filter(|s| !s.is_empty())
}

fn extend_for_leading_comments(lines: &[&str], decl_idx: usize, comment_prefix: &str) -> usize {
    let mut start = decl_idx;
    while start > 0 {
        let prev = lines[start - 1].trim();
        if prev.is_empty() || !prev.starts_with(comment_prefix) {
            break;
        }
        start -= 1;
    }
    start
}

fn find_end(
    lines: &[&str],
    decl_idx: usize,
    next_decl_start: Option<usize>,
    mode: ScopeMode,
) -> usize {
    let bound = next_decl_start
        .map(|n| n.saturating_sub(1))
        .unwrap_or(lines.len() - 1);
    let bound = bound.max(decl_idx);

    let raw_end = match mode {
        ScopeMode::Brace => {
            let mut depth = 0i32;
            let mut opened = false;
            let mut end = bound;
            for (i, line) in lines.iter().enumerate().take(bound + 1).skip(decl_idx) {
                depth += line.matches('{').count() as i32;
                depth -= line.matches('}').count() as i32;
                if depth > 0 {
                    opened = true;
                }
                if opened && depth <= 0 {
                    end = i;
                    break;
                }
            }
            end
        }
        ScopeMode::Indentation => {
            let base_indent = indent_of(lines[decl_idx]);
            let mut end = decl_idx;
            for (i, line) in lines.iter().enumerate().take(bound + 1).skip(decl_idx + 1) {
                if line.trim().is_empty() {
                    continue;
                }
                if indent_of(line) <= base_indent {
                    break;
                }
                end = i;
            }
            end
        }
        ScopeMode::NextSibling => bound,
    };

    trim_trailing_blank(lines, raw_end, decl_idx)
}

fn trim_trailing_blank(lines: &[&str], mut end: usize, min: usize) -> usize {
    while end > min && lines[end].trim().is_empty() {
        end -= 1;
    }
    end
}

fn indent_of(line: &str) -> usize {
    line.chars().take_while(|c| c.is_whitespace()).count()
}

fn last_non_blank_index(lines: &[&str]) -> usize {
    for (i, line) in lines.iter().enumerate().rev() {
        if !line.trim().is_empty() {
            return i;
        }
    }
    0
}

fn collect_imports(lines: &[&str], import_prefixes: &[&str]) -> Vec<String> {
    let mut out = Vec::new();
    for line in lines {
        if indent_of(line) != 0 {
            continue;
        }
        let trimmed = line.trim();
        if import_prefixes.iter().any(|p| trimmed.starts_with(p)) {
            out.push(trimmed.to_string());
        }
    }
    out
}

fn token_count(content: &str) -> u32 {
    let len = content.chars().count();
    ((len + 3) / 4) as u32
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_line_python_function() {
        let chunks = parse("def f(): return 1\n", Language::Python);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].chunk_type, ChunkType::Function);
        assert_eq!(chunks[0].symbol_name.as_deref(), Some("f"));
        assert_eq!(chunks[0].start_line, 1);
        assert_eq!(chunks[0].end_line, 1);
    }

    #[test]
    fn no_declarations_yields_one_module_chunk() {
        let chunks = parse("x = 1\ny = 2\n", Language::Python);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].chunk_type, ChunkType::Module);
    }

    #[test]
    fn markup_language_has_no_parser() {
        assert!(parse("# hi\n", Language::Markdown).is_empty());
    }

    #[test]
    fn rust_brace_scoped_function() {
        let source = "pub fn authenticate(user: &str) -> bool {\n    user.len() > 0\n}\n\npub fn authorize(user: &str, role: &str) -> bool {\n    role == \"admin\"\n}\n";
        let chunks = parse(source, Language::Rust);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].symbol_name.as_deref(), Some("authenticate"));
        assert_eq!(chunks[1].symbol_name.as_deref(), Some("authorize"));
        assert_eq!(chunks[0].start_line, 1);
        assert_eq!(chunks[0].end_line, 3);
    }

    #[test]
    fn leading_comment_is_included() {
        let source = "// explains foo\nfn foo() {\n}\n";
        let chunks = parse(source, Language::Rust);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].start_line, 1);
        assert!(chunks[0].content.starts_with("// explains foo"));
    }

    #[test]
    fn python_indentation_scope() {
        let source = "def f():\n    x = 1\n    return x\n\ndef g():\n    return 2\n";
        let chunks = parse(source, Language::Python);
        assert_eq!(chunks.len(), 2);
        assert_eq!(chunks[0].start_line, 1);
        assert_eq!(chunks[0].end_line, 3);
        assert_eq!(chunks[1].start_line, 5);
        assert_eq!(chunks[1].end_line, 6);
    }

    #[test]
    fn imports_are_collected_at_indent_zero() {
        let source = "use std::fmt;\n\nfn f() {}\n";
        let chunks = parse(source, Language::Rust);
        assert_eq!(chunks[0].imports, vec!["use std::fmt;".to_string()]);
    }

    #[test]
    fn token_count_is_character_estimate() {
        let chunks = parse("fn f() {}\n", Language::Rust);
        let expected = ((chunks[0].content.chars().count() + 3) / 4) as u32;
        assert_eq!(chunks[0].token_count, expected);
    }
}
