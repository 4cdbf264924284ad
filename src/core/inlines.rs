//! Normal substitutions
//!
//! Two passes, in this order:
//!
//! 1. [`substitute_attributes`] replaces `{name}` references and applies
//!    `{set:name:value}` directives against the document scope.
//! 2. [`parse_inlines`] turns the result into inline nodes (quoted text,
//!    anchors, cross-references, footnotes, hard line breaks). It does not
//!    touch any shared state; the anchors, references and footnotes it finds
//!    are returned for the caller to register.

use lazy_static::lazy_static;
use regex::{Captures, Regex};

use crate::core::ast::{Footnote, Inline};
use crate::core::scope::AttributeScope;

lazy_static! {
    static ref ATTRIBUTE_REFERENCE: Regex =
        Regex::new(r"(\\)?\{(set:[^}\n]*|[A-Za-z0-9_][A-Za-z0-9_-]*)\}").unwrap();
    static ref INLINE_ANCHOR: Regex =
        Regex::new(r"^\[\[([A-Za-z_:][\w:.-]*)(?:,\s*([^\]]+?))?\]\]").unwrap();
    static ref ANCHOR_MACRO: Regex =
        Regex::new(r"^anchor:([A-Za-z_:][\w:.-]*)\[([^\]]*)\]").unwrap();
    static ref XREF_SHORTHAND: Regex =
        Regex::new(r"^<<([A-Za-z_:#][^\s,>]*)(?:,\s*([^>]+?))?>>").unwrap();
    static ref XREF_MACRO: Regex = Regex::new(r"^xref:([^\s\[]+)\[([^\]]*)\]").unwrap();
    static ref FOOTNOTE_MACRO: Regex =
        Regex::new(r"^footnote:([\w-]*)\[((?:\\\]|[^\]])*)\]").unwrap();
}

// ============================================================================
// Attribute References
// ============================================================================

/// Replace attribute references and apply `{set:...}` directives
///
/// Unknown references are left as written. A backslash in front of a
/// reference escapes it.
pub fn substitute_attributes(text: &str, scope: &mut AttributeScope) -> String {
    if !text.contains('{') {
        return text.to_string();
    }

    ATTRIBUTE_REFERENCE
        .replace_all(text, |caps: &Captures| {
            let body = &caps[2];
            if caps.get(1).is_some() {
                return format!("{{{}}}", body);
            }
            if let Some(directive) = body.strip_prefix("set:") {
                apply_set_directive(directive, scope);
                return String::new();
            }
            match scope.get(&body.to_lowercase()) {
                Some(value) => value.to_string(),
                None => {
                    tracing::debug!(name = body, "missing attribute reference left as written");
                    caps[0].to_string()
                }
            }
        })
        .into_owned()
}

fn apply_set_directive(directive: &str, scope: &mut AttributeScope) {
    match directive.split_once(':') {
        Some((name, value)) => {
            scope.soft_set(&name.to_lowercase(), value);
        }
        None => match directive.strip_suffix('!') {
            Some(name) => {
                scope.soft_unset(&name.to_lowercase());
            }
            None => {
                scope.soft_set(&directive.to_lowercase(), "");
            }
        },
    }
}

// ============================================================================
// Inline Nodes
// ============================================================================

/// An anchor found in inline text
#[derive(Debug, Clone, PartialEq)]
pub struct InlineAnchor {
    pub id: String,
    pub reftext: Option<String>,
}

/// Result of [`parse_inlines`]
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InlineParse {
    pub nodes: Vec<Inline>,
    /// Footnotes defined in the text, numbered after the existing ones
    pub footnotes: Vec<Footnote>,
    pub anchors: Vec<InlineAnchor>,
    /// Cross-reference targets in order of appearance
    pub xrefs: Vec<String>,
}

struct InlineState<'a> {
    existing: &'a [Footnote],
    out: InlineParse,
}

impl InlineState<'_> {
    fn next_footnote_number(&self) -> usize {
        self.existing.len() + self.out.footnotes.len() + 1
    }

    fn footnote_by_id(&self, id: &str) -> Option<usize> {
        self.existing
            .iter()
            .chain(self.out.footnotes.iter())
            .find(|f| f.id.as_deref() == Some(id))
            .map(|f| f.number)
    }
}

/// Parse inline markup
///
/// `footnotes` are the footnotes the owning document already has; new
/// footnotes continue their numbering and `footnote:id[]` may refer to
/// them.
pub fn parse_inlines(text: &str, footnotes: &[Footnote]) -> InlineParse {
    let mut state = InlineState {
        existing: footnotes,
        out: InlineParse::default(),
    };
    state.out.nodes = parse_span(text, &mut state);
    state.out
}

fn is_word(c: char) -> bool {
    c.is_alphanumeric() || c == '_'
}

fn flush(buf: &mut String, nodes: &mut Vec<Inline>) {
    if buf.is_empty() {
        return;
    }
    match nodes.last_mut() {
        Some(Inline::Text(prev)) => prev.push_str(buf),
        _ => nodes.push(Inline::Text(buf.clone())),
    }
    buf.clear();
}

fn wrap(marker: char, children: Vec<Inline>) -> Inline {
    match marker {
        '*' => Inline::Strong(children),
        '_' => Inline::Emphasis(children),
        _ => Inline::Monospace(children),
    }
}

fn parse_span(text: &str, state: &mut InlineState) -> Vec<Inline> {
    let mut nodes = Vec::new();
    let mut buf = String::new();
    let mut i = 0;

    while i < text.len() {
        let rest = &text[i..];
        let Some(c) = rest.chars().next() else { break };
        let prev = text[..i].chars().next_back();

        // Escapes
        if c == '\\' {
            if let Some(next) = rest[1..].chars().next() {
                if matches!(next, '*' | '_' | '`' | '[' | '<' | '\\') {
                    buf.push(next);
                    i += 1 + next.len_utf8();
                    continue;
                }
                if let Some(prefix) = ["footnote:", "anchor:", "xref:"]
                    .iter()
                    .find(|p| rest[1..].starts_with(**p))
                {
                    buf.push_str(prefix);
                    i += 1 + prefix.len();
                    continue;
                }
            }
        }

        // Hard line break
        if c == ' ' && rest.starts_with(" +") {
            let after = &rest[2..];
            if after.is_empty() || after.starts_with('\n') {
                flush(&mut buf, &mut nodes);
                nodes.push(Inline::LineBreak);
                i += if after.is_empty() { 2 } else { 3 };
                continue;
            }
        }

        // Anchors
        if c == '[' {
            if let Some(caps) = INLINE_ANCHOR.captures(rest) {
                flush(&mut buf, &mut nodes);
                let anchor = InlineAnchor {
                    id: caps[1].to_string(),
                    reftext: caps.get(2).map(|m| m.as_str().trim().to_string()),
                };
                nodes.push(Inline::Anchor {
                    id: anchor.id.clone(),
                    reftext: anchor.reftext.clone(),
                });
                state.out.anchors.push(anchor);
                i += caps[0].len();
                continue;
            }
        }
        if c == 'a' && !prev.map(is_word).unwrap_or(false) {
            if let Some(caps) = ANCHOR_MACRO.captures(rest) {
                flush(&mut buf, &mut nodes);
                let reftext = Some(caps[2].trim().to_string()).filter(|t| !t.is_empty());
                nodes.push(Inline::Anchor {
                    id: caps[1].to_string(),
                    reftext: reftext.clone(),
                });
                state.out.anchors.push(InlineAnchor {
                    id: caps[1].to_string(),
                    reftext,
                });
                i += caps[0].len();
                continue;
            }
        }

        // Cross references
        if c == '<' {
            if let Some(caps) = XREF_SHORTHAND.captures(rest) {
                flush(&mut buf, &mut nodes);
                let target = caps[1].trim_start_matches('#').to_string();
                state.out.xrefs.push(target.clone());
                nodes.push(Inline::CrossReference {
                    target,
                    label: caps.get(2).map(|m| m.as_str().trim().to_string()),
                });
                i += caps[0].len();
                continue;
            }
        }
        if c == 'x' && !prev.map(is_word).unwrap_or(false) {
            if let Some(caps) = XREF_MACRO.captures(rest) {
                flush(&mut buf, &mut nodes);
                let target = caps[1].trim_start_matches('#').to_string();
                state.out.xrefs.push(target.clone());
                nodes.push(Inline::CrossReference {
                    target,
                    label: Some(caps[2].trim().to_string()).filter(|l| !l.is_empty()),
                });
                i += caps[0].len();
                continue;
            }
        }

        // Footnotes
        if c == 'f' && !prev.map(is_word).unwrap_or(false) {
            if let Some(caps) = FOOTNOTE_MACRO.captures(rest) {
                let id = Some(caps[1].to_string()).filter(|id| !id.is_empty());
                let body = caps[2].replace("\\]", "]");
                let consumed = caps[0].len();

                if body.trim().is_empty() {
                    if let Some(number) = id.as_deref().and_then(|id| state.footnote_by_id(id)) {
                        flush(&mut buf, &mut nodes);
                        nodes.push(Inline::FootnoteRef { number, id });
                        i += consumed;
                        continue;
                    }
                    tracing::debug!(id = ?id, "footnote reference without definition");
                    buf.push_str(&caps[0]);
                    i += consumed;
                    continue;
                }

                flush(&mut buf, &mut nodes);
                let number = state.next_footnote_number();
                // reserve the number before parsing nested footnotes
                state.out.footnotes.push(Footnote {
                    number,
                    id: id.clone(),
                    content: Vec::new(),
                });
                let content = parse_span(body.trim(), state);
                if let Some(slot) = state.out.footnotes.iter_mut().find(|f| f.number == number) {
                    slot.content = content;
                }
                nodes.push(Inline::FootnoteRef { number, id });
                i += consumed;
                continue;
            }
        }

        // Quoted text
        if matches!(c, '*' | '_' | '`') {
            let double: String = [c, c].iter().collect();
            if rest.starts_with(&double) {
                if let Some(end) = rest[2..].find(&double).filter(|&e| e > 0) {
                    flush(&mut buf, &mut nodes);
                    let inner = &rest[2..2 + end];
                    nodes.push(wrap(c, parse_span(inner, state)));
                    i += 2 + end + 2;
                    continue;
                }
            }

            let opens = !prev
                .map(|p| is_word(p) || matches!(p, ';' | ':' | '}') || p == c)
                .unwrap_or(false);
            let first = rest[1..].chars().next();
            if opens && first.map(|f| !f.is_whitespace() && f != c).unwrap_or(false) {
                if let Some(end) = find_constrained_close(&rest[1..], c) {
                    flush(&mut buf, &mut nodes);
                    let inner = &rest[1..1 + end];
                    nodes.push(wrap(c, parse_span(inner, state)));
                    i += 1 + end + 1;
                    continue;
                }
            }
        }

        buf.push(c);
        i += c.len_utf8();
    }

    flush(&mut buf, &mut nodes);
    nodes
}

/// Byte offset of the closing marker of constrained quoted text
fn find_constrained_close(text: &str, marker: char) -> Option<usize> {
    let mut prev: Option<char> = None;
    for (j, ch) in text.char_indices() {
        if ch == marker && j > 0 && prev.map(|p| !p.is_whitespace()).unwrap_or(false) {
            let next = text[j + ch.len_utf8()..].chars().next();
            if !next.map(is_word).unwrap_or(false) {
                return Some(j);
            }
        }
        prev = Some(ch);
    }
    None
}
