//! Block parser
//!
//! The same parser runs for the top-level source and for every asciidoc
//! table cell. Each run owns its attribute scope and footnote list; the
//! [`ParseContext`] it borrows carries everything shared across the
//! recursion.
//!
//! Lines are read lazily: an `include::` directive is replaced by the
//! included lines when the reader reaches it, so directives inside table
//! bodies and listing blocks are expanded as well. One that cannot be
//! resolved inside a table body is left for the cell that holds it.

use lazy_static::lazy_static;
use regex::{Captures, Regex};

use crate::core::ast::{
    Callout, CalloutList, CalloutListItem, Document, Element, Footnote, Heading, Inline, List,
    ListingBlock, ListingLine, LiteralBlock, Paragraph, TableOfContents,
};
use crate::core::context::ParseContext;
use crate::core::inlines::{parse_inlines, substitute_attributes};
use crate::core::scope::AttributeScope;
use crate::data::constants::DOCTITLE;
use crate::features::attributes::{parse_attribute_list, Attribute, AttributeList, Quoting};
use crate::features::refs::{section_id, RefCatalog, RefKind};
use crate::features::table::{parse_table, CellHost, TableSource};
use crate::utils::diagnostics::{FrameId, SourcePosition};
use crate::utils::error::{ParseError, ParseResult};
use crate::utils::files::{parse_include_directive, IncludeDirective};

lazy_static! {
    static ref ATTRIBUTE_ENTRY: Regex =
        Regex::new(r"^:(!)?([A-Za-z0-9_][A-Za-z0-9_-]*)(!)?:(?:[ \t]+(.*?))?[ \t]*$").unwrap();
    static ref DOCUMENT_TITLE: Regex = Regex::new(r"^=[ \t]+(\S.*?)[ \t]*$").unwrap();
    static ref SECTION_TITLE: Regex = Regex::new(r"^(={2,6})[ \t]+(\S.*?)[ \t]*$").unwrap();
    static ref BLOCK_ANCHOR: Regex =
        Regex::new(r"^\[\[([A-Za-z_:][\w:.-]*)(?:,\s*(.+?))?\]\][ \t]*$").unwrap();
    static ref BLOCK_ATTRIBUTES: Regex = Regex::new(r"^\[(.*)\][ \t]*$").unwrap();
    static ref BLOCK_TITLE: Regex = Regex::new(r"^\.([^\s.].*)$").unwrap();
    static ref TABLE_DELIMITER: Regex = Regex::new(r"^([|,:!])={3,}[ \t]*$").unwrap();
    static ref LISTING_DELIMITER: Regex = Regex::new(r"^-{4,}[ \t]*$").unwrap();
    static ref LITERAL_DELIMITER: Regex = Regex::new(r"^\.{4,}[ \t]*$").unwrap();
    static ref COMMENT_DELIMITER: Regex = Regex::new(r"^/{4,}[ \t]*$").unwrap();
    static ref CALLOUT_ITEM: Regex = Regex::new(r"^<(\d+|\.)>[ \t]+(.*)$").unwrap();
    static ref LIST_ITEM: Regex = Regex::new(r"^[ \t]*(\*|-|\.)[ \t]+(\S.*)$").unwrap();
    static ref TRAILING_CALLOUT: Regex = Regex::new(r"[ \t]*(\\)?<(\d+|\.)>[ \t]*$").unwrap();
    static ref TOC_MACRO: Regex = Regex::new(r"^toc::\[\][ \t]*$").unwrap();
}

/// One physical line and where it came from
#[derive(Debug, Clone, PartialEq)]
pub struct SourceLine {
    pub text: String,
    pub frame: FrameId,
    /// 1-indexed line within the frame
    pub line: usize,
}

impl SourceLine {
    pub fn new(text: impl Into<String>, frame: FrameId, line: usize) -> Self {
        Self {
            text: text.into(),
            frame,
            line,
        }
    }
}

fn source_lines(text: &str, frame: FrameId) -> Vec<SourceLine> {
    text.lines()
        .enumerate()
        .map(|(i, line)| SourceLine::new(line, frame, i + 1))
        .collect()
}

fn is_delimiter(text: &str) -> bool {
    TABLE_DELIMITER.is_match(text)
        || LISTING_DELIMITER.is_match(text)
        || LITERAL_DELIMITER.is_match(text)
        || COMMENT_DELIMITER.is_match(text)
}

// ============================================================================
// Entry Points
// ============================================================================

/// Parse the top-level source
///
/// Cross-references are validated once the whole tree, nested cell
/// documents included, has been read. The anchor catalog is then moved into
/// the returned document.
pub fn parse_root(ctx: &mut ParseContext, source: &str) -> ParseResult<Document> {
    let scope = ctx.options.initial_scope();
    let lines = source_lines(source, ctx.positions.root());
    let mut document = DocumentParser::new(ctx, scope, lines).parse()?;
    ctx.validate_references();
    document.references = std::mem::take(&mut ctx.references);
    Ok(document)
}

/// Parse the text of an asciidoc cell as an independent document
///
/// `(line, column)` is where `text` starts within `parent_frame`. Frames
/// pushed for the nested parse are popped before returning.
pub fn parse_nested(
    ctx: &mut ParseContext,
    parent: &AttributeScope,
    text: &str,
    parent_frame: FrameId,
    line: usize,
    column: usize,
) -> ParseResult<Document> {
    let mark = ctx.positions.mark();
    let frame = ctx.positions.push_nested(parent_frame, line, column);
    ctx.enter_nested();

    let lines = source_lines(text, frame);
    let result = DocumentParser::new(ctx, parent.nested(), lines).parse();

    ctx.leave_nested();
    ctx.positions.truncate(mark);
    result
}

// ============================================================================
// Parser
// ============================================================================

/// Anchor, attribute and title lines waiting for their block
#[derive(Debug, Default)]
struct PendingMeta {
    attributes: AttributeList,
    anchor: Option<(String, Option<String>)>,
    title: Option<String>,
}

impl PendingMeta {
    fn is_empty(&self) -> bool {
        self.attributes.is_empty() && self.anchor.is_none() && self.title.is_none()
    }

    fn id(&self) -> Option<&str> {
        self.anchor
            .as_ref()
            .map(|(id, _)| id.as_str())
            .or_else(|| self.attributes.id())
    }

    fn reftext(&self) -> Option<String> {
        self.anchor.as_ref().and_then(|(_, reftext)| reftext.clone())
    }
}

struct DocumentParser<'c, 'r> {
    ctx: &'c mut ParseContext<'r>,
    scope: AttributeScope,
    footnotes: Vec<Footnote>,
    lines: Vec<SourceLine>,
    pos: usize,
    pending: PendingMeta,
    /// A level-0 title was read
    titled: bool,
}

impl<'c, 'r> DocumentParser<'c, 'r> {
    fn new(ctx: &'c mut ParseContext<'r>, scope: AttributeScope, lines: Vec<SourceLine>) -> Self {
        Self {
            ctx,
            scope,
            footnotes: Vec::new(),
            lines,
            pos: 0,
            pending: PendingMeta::default(),
            titled: false,
        }
    }

    fn parse(mut self) -> ParseResult<Document> {
        let mut blocks = Vec::new();
        while let Some(line) = self.peek()? {
            if line.text.trim().is_empty() {
                self.pos += 1;
                continue;
            }
            let first = blocks.is_empty();
            if let Some(block) = self.parse_block(line, first)? {
                blocks.push(block);
            }
        }
        if !self.pending.is_empty() {
            tracing::debug!("block metadata at end of document has no block to attach to");
        }

        Ok(Document {
            title: self.scope.get(DOCTITLE).map(str::to_string),
            attributes: self.scope,
            blocks,
            footnotes: self.footnotes,
            references: RefCatalog::new(),
        })
    }

    // ------------------------------------------------------------------------
    // Line reader
    // ------------------------------------------------------------------------

    /// Current line, with include directives expanded
    fn peek(&mut self) -> ParseResult<Option<SourceLine>> {
        while let Some(line) = self.lines.get(self.pos) {
            let Some(directive) = parse_include_directive(&line.text) else {
                break;
            };
            let line = line.clone();
            self.include(&line, directive)?;
        }
        Ok(self.lines.get(self.pos).cloned())
    }

    /// Replace the directive at the cursor by the lines it includes
    fn include(&mut self, line: &SourceLine, directive: IncludeDirective) -> ParseResult<()> {
        let target = substitute_attributes(&directive.target, &mut self.scope);
        let position = self.ctx.position(line.frame, line.line, 1);

        let depth = self.ctx.positions.include_depth(line.frame);
        let max_depth = self.ctx.options.max_include_depth;
        if depth >= max_depth {
            return Err(ParseError::IncludeDepthExceeded {
                target,
                depth: max_depth,
                position,
            });
        }

        let resolver = self.ctx.resolver();
        let path = match position.file.as_deref() {
            Some(base) => resolver.resolve_path(base, &target),
            None => target.clone(),
        };

        match resolver.read_file(&path) {
            Ok(content) => {
                tracing::debug!(path = %path, depth = depth + 1, "including file");
                let frame = self.ctx.positions.push_file(line.frame, path.as_str());
                let included: Vec<SourceLine> = content
                    .lines()
                    .enumerate()
                    .filter(|(i, _)| directive.keeps_line(i + 1))
                    .map(|(i, text)| SourceLine::new(text, frame, i + 1))
                    .collect();
                self.lines.splice(self.pos..=self.pos, included);
                Ok(())
            }
            Err(_) if directive.optional => {
                self.ctx.info(
                    line.frame,
                    line.line,
                    1,
                    format!("optional include dropped because include file not found: {}", path),
                );
                self.lines.remove(self.pos);
                Ok(())
            }
            Err(err) => Err(ParseError::unresolved_include(target, err.to_string(), position)),
        }
    }

    /// Lines up to the closing delimiter, which is consumed
    ///
    /// A missing closing delimiter closes the block at the end of input.
    fn delimited_lines(&mut self, opener: &SourceLine, kind: &str) -> ParseResult<Vec<SourceLine>> {
        let delimiter = opener.text.trim_end().to_string();
        self.pos += 1;
        let mut body = Vec::new();
        while let Some(line) = self.peek()? {
            self.pos += 1;
            if line.text.trim_end() == delimiter {
                return Ok(body);
            }
            body.push(line);
        }
        self.ctx.warn(
            opener.frame,
            opener.line,
            1,
            format!("unterminated {} block", kind),
        );
        Ok(body)
    }

    /// Table body lines up to the closing delimiter
    ///
    /// An include that cannot be resolved here stays in the body as written.
    /// The cell holding it resolves it again, so an AsciiDoc cell fails on
    /// its own instead of taking the document down.
    fn table_lines(&mut self, opener: &SourceLine) -> Vec<SourceLine> {
        let delimiter = opener.text.trim_end().to_string();
        self.pos += 1;
        let mut body = Vec::new();
        while let Some(line) = self.lines.get(self.pos).cloned() {
            if let Some(directive) = parse_include_directive(&line.text) {
                let target = directive.target.clone();
                match self.include(&line, directive) {
                    Ok(()) => continue,
                    Err(err) => {
                        tracing::debug!(include = %target, error = %err, "include left in table body");
                        self.ctx.warn(
                            line.frame,
                            line.line,
                            1,
                            format!("include '{}' in table body could not be resolved", target),
                        );
                    }
                }
            }
            self.pos += 1;
            if line.text.trim_end() == delimiter {
                return body;
            }
            body.push(line);
        }
        self.ctx.warn(opener.frame, opener.line, 1, "unterminated table block");
        body
    }

    /// Skip a comment block without expanding includes
    fn skip_comment_block(&mut self, opener: &SourceLine) {
        let delimiter = opener.text.trim_end().to_string();
        self.pos += 1;
        while let Some(line) = self.lines.get(self.pos) {
            self.pos += 1;
            if line.text.trim_end() == delimiter {
                return;
            }
        }
        self.ctx.warn(opener.frame, opener.line, 1, "unterminated comment block");
    }

    fn take_meta(&mut self) -> PendingMeta {
        std::mem::take(&mut self.pending)
    }

    fn register_block_id(&mut self, meta: &PendingMeta, line: &SourceLine) {
        if let Some(id) = meta.id() {
            let position = self.ctx.position(line.frame, line.line, 1);
            self.ctx
                .register_anchor(id, RefKind::Block, meta.reftext(), position);
        }
    }

    // ------------------------------------------------------------------------
    // Blocks
    // ------------------------------------------------------------------------

    fn parse_block(&mut self, line: SourceLine, first: bool) -> ParseResult<Option<Element>> {
        let text = line.text.as_str();

        if COMMENT_DELIMITER.is_match(text) {
            self.skip_comment_block(&line);
            return Ok(None);
        }
        if text.starts_with("//") {
            self.pos += 1;
            return Ok(None);
        }
        if let Some(caps) = ATTRIBUTE_ENTRY.captures(text) {
            self.pos += 1;
            self.attribute_entry(&caps);
            return Ok(None);
        }
        if first && !self.titled && self.pending.is_empty() {
            if let Some(caps) = DOCUMENT_TITLE.captures(text) {
                self.pos += 1;
                self.titled = true;
                let title = substitute_attributes(&caps[1], &mut self.scope);
                self.scope.soft_set(DOCTITLE, title);
                return Ok(None);
            }
        }
        if let Some(caps) = SECTION_TITLE.captures(text) {
            self.pos += 1;
            return Ok(Some(self.section(&line, caps[1].len(), &caps[2])));
        }
        if let Some(caps) = BLOCK_ANCHOR.captures(text) {
            self.pos += 1;
            let reftext = caps.get(2).map(|m| m.as_str().to_string());
            self.pending.anchor = Some((caps[1].to_string(), reftext));
            return Ok(None);
        }
        if !text.starts_with("[[") {
            if let Some(list) = BLOCK_ATTRIBUTES
                .captures(text)
                .and_then(|caps| parse_attribute_list(&caps[1]))
            {
                self.pos += 1;
                self.pending.attributes.extend(list);
                return Ok(None);
            }
        }
        if let Some(caps) = BLOCK_TITLE.captures(text) {
            self.pos += 1;
            self.pending.title = Some(caps[1].trim().to_string());
            return Ok(None);
        }
        if TOC_MACRO.is_match(text) {
            self.pos += 1;
            self.take_meta();
            if self.scope.get("toc") == Some("macro") {
                let location = self.ctx.position(line.frame, line.line, 1);
                return Ok(Some(Element::TableOfContents(TableOfContents { location })));
            }
            tracing::debug!("toc macro ignored because toc is not set to macro");
            return Ok(None);
        }
        if let Some(caps) = TABLE_DELIMITER.captures(text) {
            let delimiter = caps[1].chars().next().unwrap_or('|');
            return self.table(&line, delimiter).map(Some);
        }
        if LISTING_DELIMITER.is_match(text) {
            return self.listing(&line).map(Some);
        }
        if LITERAL_DELIMITER.is_match(text) {
            let body = self.delimited_lines(&line, "literal")?;
            let content = body
                .iter()
                .map(|l| l.text.as_str())
                .collect::<Vec<_>>()
                .join("\n");
            return Ok(Some(self.literal(&line, content)));
        }
        if CALLOUT_ITEM.is_match(text) {
            return self.callout_list(&line).map(Some);
        }
        if let Some(caps) = LIST_ITEM.captures(text) {
            let marker = caps[1].to_string();
            return self.list(&line, &marker).map(Some);
        }
        if text.starts_with([' ', '\t']) {
            return self.literal_paragraph(&line).map(Some);
        }
        self.paragraph(&line)
    }

    fn attribute_entry(&mut self, caps: &Captures) {
        let name = caps[2].to_lowercase();
        if caps.get(1).is_some() || caps.get(3).is_some() {
            self.scope.soft_unset(&name);
            return;
        }
        let raw = caps.get(4).map(|m| m.as_str()).unwrap_or("");
        let value = substitute_attributes(raw, &mut self.scope);
        self.scope.soft_set(&name, value);
    }

    fn section(&mut self, line: &SourceLine, marks: usize, raw_title: &str) -> Element {
        let meta = self.take_meta();
        let location = self.ctx.position(line.frame, line.line, 1);
        let substituted = substitute_attributes(raw_title, &mut self.scope);
        let title = self.inline_content(&substituted, line.frame, line.line, marks + 2);
        let plain = Inline::plain_text(&title);

        let id = match meta.id() {
            Some(id) => id.to_string(),
            None => self.ctx.references.unique_id(&section_id(&plain)),
        };
        let reftext = meta.reftext().or_else(|| Some(plain.clone()));
        self.ctx
            .register_anchor(&id, RefKind::Section, reftext, location.clone());

        tracing::debug!(level = marks - 1, id = %id, "section");
        Element::Heading(Heading {
            level: marks - 1,
            id,
            title,
            location,
        })
    }

    fn table(&mut self, opener: &SourceLine, delimiter: char) -> ParseResult<Element> {
        let body = self.table_lines(opener);
        let meta = self.take_meta();

        let mut attributes = meta.attributes;
        if let Some(title) = meta.title {
            attributes.push(Attribute::Title(title));
        }
        if let Some((id, _)) = meta.anchor {
            if attributes.id().is_none() {
                attributes.push(Attribute::Named {
                    key: "id".to_string(),
                    value: id,
                    quoting: Quoting::Unquoted,
                });
            }
        }

        let source = TableSource {
            delimiter,
            attributes,
            frame: opener.frame,
            line: opener.line,
        };
        let table = parse_table(self, source, &body)?;

        if let Some(id) = table.id() {
            let reftext = table.title().map(str::to_string);
            self.ctx
                .register_anchor(id, RefKind::Table, reftext, table.location.clone());
        }
        Ok(Element::Table(table))
    }

    fn listing(&mut self, opener: &SourceLine) -> ParseResult<Element> {
        let body = self.delimited_lines(opener, "listing")?;
        let meta = self.take_meta();
        self.register_block_id(&meta, opener);

        let mut auto = 0;
        let lines = body
            .iter()
            .map(|line| self.listing_line(&line.text, &mut auto))
            .collect();

        Ok(Element::Listing(ListingBlock {
            title: meta.title,
            lines,
            location: self.ctx.position(opener.frame, opener.line, 1),
        }))
    }

    /// Split trailing callout markers off a listing line
    ///
    /// `<.>` takes the next number of the block. A backslash before a marker
    /// keeps it as text and stops the scan.
    fn listing_line(&mut self, text: &str, auto: &mut u32) -> ListingLine {
        let mut rest = text;
        let mut markers = Vec::new();
        let kept = loop {
            let Some(caps) = TRAILING_CALLOUT.captures(rest) else {
                break rest.to_string();
            };
            if let Some(backslash) = caps.get(1) {
                break format!("{}{}", &rest[..backslash.start()], &rest[backslash.end()..]);
            }
            markers.push(caps[2].to_string());
            let start = caps.get(0).map_or(rest.len(), |m| m.start());
            rest = &rest[..start];
        };

        if markers.is_empty() {
            return ListingLine {
                text: kept,
                callouts: Vec::new(),
            };
        }

        let mut kept = kept.trim_end();
        for comment in ["//", "#", "--", ";;"] {
            if let Some(stripped) = kept.strip_suffix(comment) {
                kept = stripped.trim_end();
                break;
            }
        }

        let callouts = markers
            .iter()
            .rev()
            .filter_map(|marker| {
                let number = if marker == "." {
                    *auto += 1;
                    *auto
                } else {
                    marker.parse().ok()?
                };
                Some(Callout {
                    number,
                    ordinal: self.ctx.next_callout(),
                })
            })
            .collect();

        ListingLine {
            text: kept.to_string(),
            callouts,
        }
    }

    fn callout_list(&mut self, first: &SourceLine) -> ParseResult<Element> {
        let meta = self.take_meta();
        self.register_block_id(&meta, first);
        let mut items = Vec::new();

        while let Some(line) = self.peek()? {
            if line.text.trim().is_empty() {
                let resume = self.pos;
                self.skip_blank_lines()?;
                match self.peek()? {
                    Some(next) if CALLOUT_ITEM.is_match(&next.text) => continue,
                    _ => {
                        self.pos = resume;
                        break;
                    }
                }
            }
            let Some(caps) = CALLOUT_ITEM.captures(&line.text) else {
                break;
            };
            self.pos += 1;
            let number = match &caps[1] {
                "." => items.len() as u32 + 1,
                n => n.parse().unwrap_or(0),
            };
            let text = substitute_attributes(&caps[2], &mut self.scope);
            let column = caps.get(2).map_or(1, |m| m.start() + 1);
            let content = self.inline_content(text.trim(), line.frame, line.line, column);
            items.push(CalloutListItem { number, content });
        }

        Ok(Element::CalloutList(CalloutList {
            items,
            location: self.ctx.position(first.frame, first.line, 1),
        }))
    }

    fn list(&mut self, first: &SourceLine, marker: &str) -> ParseResult<Element> {
        let meta = self.take_meta();
        self.register_block_id(&meta, first);
        let mut items = Vec::new();
        // text lines of the current item and where it started
        let mut current: Option<(Vec<String>, SourceLine)> = None;

        while let Some(line) = self.peek()? {
            if line.text.trim().is_empty() {
                let resume = self.pos;
                self.skip_blank_lines()?;
                let continues = self
                    .peek()?
                    .and_then(|next| LIST_ITEM.captures(&next.text).map(|c| c[1] == *marker))
                    .unwrap_or(false);
                if continues {
                    continue;
                }
                self.pos = resume;
                break;
            }
            if is_delimiter(&line.text) {
                break;
            }
            match LIST_ITEM.captures(&line.text) {
                Some(caps) if caps[1] == *marker => {
                    if let Some((texts, start)) = current.take() {
                        items.push(self.list_item(&texts, &start));
                    }
                    current = Some((vec![caps[2].to_string()], line.clone()));
                }
                Some(_) => break,
                None => match current.as_mut() {
                    Some((texts, _)) => texts.push(line.text.trim().to_string()),
                    None => break,
                },
            }
            self.pos += 1;
        }
        if let Some((texts, start)) = current.take() {
            items.push(self.list_item(&texts, &start));
        }

        Ok(Element::List(List {
            ordered: marker == ".",
            items,
            location: self.ctx.position(first.frame, first.line, 1),
        }))
    }

    fn list_item(&mut self, texts: &[String], start: &SourceLine) -> Vec<Inline> {
        let text = texts
            .iter()
            .map(|t| substitute_attributes(t, &mut self.scope))
            .collect::<Vec<_>>()
            .join("\n");
        let column = start.text.len() - start.text.trim_start().len() + 3;
        self.inline_content(text.trim(), start.frame, start.line, column)
    }

    fn skip_blank_lines(&mut self) -> ParseResult<()> {
        while let Some(line) = self.peek()? {
            if !line.text.trim().is_empty() {
                break;
            }
            self.pos += 1;
        }
        Ok(())
    }

    /// Indented lines, kept verbatim minus their common indentation
    fn literal_paragraph(&mut self, first: &SourceLine) -> ParseResult<Element> {
        let mut texts = Vec::new();
        while let Some(line) = self.peek()? {
            if line.text.trim().is_empty() {
                break;
            }
            texts.push(line.text);
            self.pos += 1;
        }
        let indent = texts
            .iter()
            .map(|t| t.len() - t.trim_start_matches([' ', '\t']).len())
            .min()
            .unwrap_or(0);
        let content = texts
            .iter()
            .map(|t| t[indent..].trim_end())
            .collect::<Vec<_>>()
            .join("\n");
        Ok(self.literal(first, content))
    }

    fn literal(&mut self, opener: &SourceLine, content: String) -> Element {
        let meta = self.take_meta();
        self.register_block_id(&meta, opener);
        Element::Literal(LiteralBlock {
            title: meta.title,
            content,
            location: self.ctx.position(opener.frame, opener.line, 1),
        })
    }

    fn paragraph(&mut self, first: &SourceLine) -> ParseResult<Option<Element>> {
        let mut texts = vec![first.text.clone()];
        self.pos += 1;
        while let Some(line) = self.peek()? {
            if line.text.trim().is_empty() || is_delimiter(&line.text) {
                break;
            }
            texts.push(line.text);
            self.pos += 1;
        }

        let meta = self.take_meta();
        self.register_block_id(&meta, first);
        let texts: Vec<&str> = texts.iter().map(String::as_str).collect();
        Ok(self
            .paragraph_from(&texts, first.frame, first.line, 1, meta.title)
            .map(Element::Paragraph))
    }

    // ------------------------------------------------------------------------
    // Inline content
    // ------------------------------------------------------------------------

    /// Build a paragraph from consecutive non-blank lines
    ///
    /// A line that only held attribute references or `{set:...}`
    /// directives and is empty after substitution is dropped.
    fn paragraph_from(
        &mut self,
        lines: &[&str],
        frame: FrameId,
        line: usize,
        column: usize,
        title: Option<String>,
    ) -> Option<Paragraph> {
        let kept: Vec<String> = lines
            .iter()
            .filter_map(|raw| {
                let substituted = substitute_attributes(raw, &mut self.scope);
                (!substituted.trim().is_empty()).then_some(substituted)
            })
            .collect();
        let text = kept.join("\n");
        let text = text.trim();
        if text.is_empty() {
            return None;
        }
        let content = self.inline_content(text, frame, line, column);
        Some(Paragraph {
            title,
            content,
            location: self.ctx.position(frame, line, column),
        })
    }

    /// Parse inline markup and register what it defines
    fn inline_content(&mut self, text: &str, frame: FrameId, line: usize, column: usize) -> Vec<Inline> {
        let parsed = parse_inlines(text, &self.footnotes);
        let position: SourcePosition = self.ctx.position(frame, line, column);
        for anchor in parsed.anchors {
            self.ctx
                .register_anchor(&anchor.id, RefKind::Inline, anchor.reftext, position.clone());
        }
        for target in parsed.xrefs {
            self.ctx.record_reference(&target, position.clone());
        }
        self.footnotes.extend(parsed.footnotes);
        parsed.nodes
    }
}

impl<'c, 'r> CellHost<'r> for DocumentParser<'c, 'r> {
    fn context(&mut self) -> &mut ParseContext<'r> {
        self.ctx
    }

    fn scope(&self) -> &AttributeScope {
        &self.scope
    }

    fn normal_paragraphs(
        &mut self,
        text: &str,
        frame: FrameId,
        line: usize,
        column: usize,
    ) -> Vec<Paragraph> {
        let mut paragraphs = Vec::new();
        let mut group: Vec<&str> = Vec::new();
        let mut start = (line, column);

        for (offset, raw) in text.split('\n').enumerate() {
            if raw.trim().is_empty() {
                if !group.is_empty() {
                    paragraphs.extend(self.paragraph_from(&group, frame, start.0, start.1, None));
                    group.clear();
                }
                continue;
            }
            if group.is_empty() {
                start = if offset == 0 {
                    (line, column)
                } else {
                    (line + offset, 1)
                };
            }
            group.push(raw);
        }
        if !group.is_empty() {
            paragraphs.extend(self.paragraph_from(&group, frame, start.0, start.1, None));
        }
        paragraphs
    }

    fn nested_document(
        &mut self,
        text: &str,
        frame: FrameId,
        line: usize,
        column: usize,
    ) -> ParseResult<Document> {
        parse_nested(self.ctx, &self.scope, text, frame, line, column)
    }
}
