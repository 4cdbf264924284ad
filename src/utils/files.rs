//! File inclusion support
//!
//! The parser never touches the file system itself. `include::target[]`
//! directives are handed to a [`FileResolver`] collaborator which returns
//! already-materialized text:
//! - `StdFileResolver`: Uses std::fs for real file system access (CLI)
//! - `MemoryFileResolver`: In-memory file storage (testing, embedding)
//! - `NoopFileResolver`: Fails every read (inclusion disabled)
//!
//! Guarding against include cycles is the resolver's business; the parser
//! only enforces a maximum depth.

use lazy_static::lazy_static;
use regex::Regex;
use std::collections::HashMap;
use std::ops::RangeInclusive;
use std::path::{Path, PathBuf};

use crate::features::attributes::parse_attribute_list;

lazy_static! {
    static ref INCLUDE_DIRECTIVE: Regex =
        Regex::new(r"^include::([^\[\s][^\[]*)\[(.*)\]\s*$").unwrap();
}

/// Trait for resolving and reading files
pub trait FileResolver {
    /// Read a file's contents
    fn read_file(&self, path: &str) -> Result<String, FileResolveError>;

    /// Check if a file exists
    fn file_exists(&self, path: &str) -> bool;

    /// Resolve a relative path against the including file
    fn resolve_path(&self, base: &str, relative: &str) -> String;
}

/// Error type for file resolution
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FileResolveError {
    NotFound(String),
    ReadError(String),
    /// The resolver does not read files at all
    Disabled(String),
}

impl std::fmt::Display for FileResolveError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FileResolveError::NotFound(path) => write!(f, "File not found: {}", path),
            FileResolveError::ReadError(msg) => write!(f, "Read error: {}", msg),
            FileResolveError::Disabled(path) => write!(f, "includes are disabled: {}", path),
        }
    }
}

impl std::error::Error for FileResolveError {}

/// Standard filesystem resolver (for CLI usage)
pub struct StdFileResolver {
    /// Directories searched for include targets, in order
    search_paths: Vec<PathBuf>,
}

impl StdFileResolver {
    pub fn new() -> Self {
        Self {
            search_paths: vec![],
        }
    }

    pub fn with_base_dir(base_dir: impl AsRef<Path>) -> Self {
        Self {
            search_paths: vec![base_dir.as_ref().to_path_buf()],
        }
    }

    pub fn add_search_path(&mut self, path: impl AsRef<Path>) {
        self.search_paths.push(path.as_ref().to_path_buf());
    }

    /// Try to find a file in search paths
    fn find_file(&self, filename: &str) -> Option<PathBuf> {
        let path = Path::new(filename);
        if path.is_absolute() && path.exists() {
            return Some(path.to_path_buf());
        }

        for search_path in &self.search_paths {
            let full_path = search_path.join(filename);
            if full_path.exists() {
                return Some(full_path);
            }
        }

        if path.exists() {
            return Some(path.to_path_buf());
        }

        None
    }
}

impl Default for StdFileResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl FileResolver for StdFileResolver {
    fn read_file(&self, path: &str) -> Result<String, FileResolveError> {
        if let Some(full_path) = self.find_file(path) {
            std::fs::read_to_string(&full_path)
                .map_err(|e| FileResolveError::ReadError(e.to_string()))
        } else {
            Err(FileResolveError::NotFound(path.to_string()))
        }
    }

    fn file_exists(&self, path: &str) -> bool {
        self.find_file(path).is_some()
    }

    fn resolve_path(&self, base: &str, relative: &str) -> String {
        let relative_path = Path::new(relative);
        if relative_path.is_absolute() {
            return relative.to_string();
        }
        match Path::new(base).parent() {
            Some(parent) if !parent.as_os_str().is_empty() => {
                parent.join(relative).to_string_lossy().to_string()
            }
            _ => relative.to_string(),
        }
    }
}

/// Memory-based file resolver (for testing and embedding)
#[derive(Debug, Clone)]
pub struct MemoryFileResolver {
    files: HashMap<String, String>,
}

impl MemoryFileResolver {
    pub fn new() -> Self {
        Self {
            files: HashMap::new(),
        }
    }

    /// Add a file to the in-memory storage
    pub fn add_file(&mut self, path: &str, content: &str) {
        self.files.insert(path.to_string(), content.to_string());
    }
}

impl Default for MemoryFileResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl FileResolver for MemoryFileResolver {
    fn read_file(&self, path: &str) -> Result<String, FileResolveError> {
        self.files
            .get(path)
            .cloned()
            .or_else(|| {
                // Try with .adoc extension
                self.files.get(&format!("{}.adoc", path)).cloned()
            })
            .ok_or_else(|| FileResolveError::NotFound(path.to_string()))
    }

    fn file_exists(&self, path: &str) -> bool {
        self.files.contains_key(path) || self.files.contains_key(&format!("{}.adoc", path))
    }

    fn resolve_path(&self, base: &str, relative: &str) -> String {
        // Simple path joining for memory resolver
        if relative.starts_with('/') || relative.starts_with('\\') {
            relative.to_string()
        } else if let Some(last_sep) = base.rfind(['/', '\\']) {
            format!("{}/{}", &base[..last_sep], relative)
        } else {
            relative.to_string()
        }
    }
}

/// No-op file resolver (inclusion disabled)
pub struct NoopFileResolver;

impl FileResolver for NoopFileResolver {
    fn read_file(&self, path: &str) -> Result<String, FileResolveError> {
        Err(FileResolveError::Disabled(path.to_string()))
    }

    fn file_exists(&self, _path: &str) -> bool {
        false
    }

    fn resolve_path(&self, _base: &str, relative: &str) -> String {
        relative.to_string()
    }
}

/// A parsed `include::target[attributes]` directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncludeDirective {
    /// Target path as written
    pub target: String,
    /// Missing targets are skipped instead of failing the parse
    pub optional: bool,
    /// Line ranges to keep (1-indexed, inclusive); empty keeps everything
    pub lines: Vec<RangeInclusive<usize>>,
}

impl IncludeDirective {
    /// Whether 1-indexed line `number` survives the `lines=` selection
    pub fn keeps_line(&self, number: usize) -> bool {
        self.lines.is_empty() || self.lines.iter().any(|r| r.contains(&number))
    }
}

/// Parse an include directive line
pub fn parse_include_directive(line: &str) -> Option<IncludeDirective> {
    let caps = INCLUDE_DIRECTIVE.captures(line)?;
    let target = caps[1].trim().to_string();
    let attrs = parse_attribute_list(&caps[2]);

    let mut optional = false;
    let mut lines = Vec::new();
    if let Some(list) = attrs {
        optional = list
            .named("opts")
            .or_else(|| list.named("options"))
            .map(|v| v.split(',').any(|o| o.trim() == "optional"))
            .unwrap_or(false);
        if let Some(spec) = list.named("lines") {
            lines = parse_line_ranges(spec);
        }
    }

    Some(IncludeDirective {
        target,
        optional,
        lines,
    })
}

/// Parse a `lines=` specification such as `1..3;7;10..-1`
fn parse_line_ranges(spec: &str) -> Vec<RangeInclusive<usize>> {
    spec.split([';', ','])
        .filter_map(|part| {
            let part = part.trim();
            if part.is_empty() {
                return None;
            }
            match part.split_once("..") {
                Some((start, end)) => {
                    let start: usize = start.trim().parse().ok()?;
                    let end = match end.trim() {
                        "" | "-1" => usize::MAX,
                        e => e.parse().ok()?,
                    };
                    Some(start..=end)
                }
                None => {
                    let n: usize = part.parse().ok()?;
                    Some(n..=n)
                }
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_memory_resolver() {
        let mut resolver = MemoryFileResolver::new();
        resolver.add_file("test.adoc", "Hello, world!");

        assert!(resolver.file_exists("test.adoc"));
        assert_eq!(resolver.read_file("test.adoc").unwrap(), "Hello, world!");
    }

    #[test]
    fn test_memory_resolver_adoc_extension() {
        let mut resolver = MemoryFileResolver::new();
        resolver.add_file("chapter1.adoc", "Chapter 1 content");

        assert_eq!(resolver.read_file("chapter1").unwrap(), "Chapter 1 content");
    }

    #[test]
    fn test_memory_resolver_relative_path() {
        let resolver = MemoryFileResolver::new();
        assert_eq!(
            resolver.resolve_path("docs/main.adoc", "part.adoc"),
            "docs/part.adoc"
        );
        assert_eq!(resolver.resolve_path("main.adoc", "part.adoc"), "part.adoc");
    }

    #[test]
    fn test_noop_resolver() {
        let resolver = NoopFileResolver;

        assert!(!resolver.file_exists("any.adoc"));
        let err = resolver.read_file("any.adoc").unwrap_err();
        assert_eq!(err, FileResolveError::Disabled("any.adoc".to_string()));
        assert_eq!(err.to_string(), "includes are disabled: any.adoc");
    }

    #[test]
    fn test_parse_include_directive() {
        let directive = parse_include_directive("include::chapter.adoc[]").unwrap();
        assert_eq!(directive.target, "chapter.adoc");
        assert!(!directive.optional);
        assert!(directive.lines.is_empty());

        assert!(parse_include_directive("include:: chapter.adoc[]").is_none());
        assert!(parse_include_directive("see include::x[] here").is_none());
    }

    #[test]
    fn test_parse_optional_include() {
        let directive = parse_include_directive("include::missing.adoc[opts=optional]").unwrap();
        assert!(directive.optional);
    }

    #[test]
    fn test_include_line_selection() {
        let directive = parse_include_directive(r#"include::a.adoc[lines="2..3;5"]"#).unwrap();
        let kept: Vec<usize> = (1..=6).filter(|n| directive.keeps_line(*n)).collect();
        assert_eq!(kept, vec![2, 3, 5]);
    }

    #[test]
    fn test_open_ended_line_range() {
        let directive = parse_include_directive("include::a.adoc[lines=2..-1]").unwrap();
        assert!(!directive.keeps_line(1));
        assert!(directive.keeps_line(2));
        assert!(directive.keeps_line(10_000));
    }
}
