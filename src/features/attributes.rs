//! Block attribute lists
//!
//! Parses the bracketed text of a block attribute line such as
//! `[%header,cols="1,2a",caption=""]` into an ordered [`AttributeList`].
//! Entry order and quoting are preserved so the list can be written back
//! out exactly as it was read.
//!
//! Supported entry forms:
//! - `key="value"`, `key='value'`, `key=value`
//! - bare positional values
//! - a first positional shorthand packing `style#id.role%option`
//! - `cols=`/`colspec=`, converted into a [`TableColumnsAttribute`]
//! - block titles (`.Title` lines), attached by the block parser

use lazy_static::lazy_static;
use regex::Regex;

use crate::features::table::colspec::parse_column_spec;
use crate::features::table::TableColumn;

lazy_static! {
    static ref NAMED_ENTRY: Regex = Regex::new(r"^([A-Za-z_][A-Za-z0-9_-]*)\s*=\s*(.*)$").unwrap();
    static ref SHORTHAND: Regex = Regex::new(r"^([^#.%\s]*)((?:[#.%][^#.%\s]+)*)$").unwrap();
}

/// How a named value was quoted in the source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(rename_all = "lowercase"))]
pub enum Quoting {
    Double,
    Single,
    Unquoted,
}

/// Style, id, roles and options packed into the first positional entry
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct Shorthand {
    pub style: Option<String>,
    pub id: Option<String>,
    pub roles: Vec<String>,
    pub options: Vec<String>,
}

/// The `cols` attribute after column resolution
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
pub struct TableColumnsAttribute {
    /// `cols` or the deprecated `colspec`
    pub key: String,
    /// Value as written
    pub raw: String,
    pub quoting: Quoting,
    pub columns: Vec<TableColumn>,
}

/// One entry of an attribute list
#[derive(Debug, Clone, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(tag = "kind", content = "value", rename_all = "snake_case"))]
pub enum Attribute {
    Named {
        key: String,
        value: String,
        quoting: Quoting,
    },
    Positional {
        /// 1-based position among positional entries
        index: usize,
        value: String,
    },
    Shorthand(Shorthand),
    Title(String),
    TableColumns(TableColumnsAttribute),
}

/// Ordered attribute entries of a block
#[derive(Debug, Clone, Default, PartialEq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize))]
#[cfg_attr(feature = "serde", serde(transparent))]
pub struct AttributeList {
    entries: Vec<Attribute>,
}

impl AttributeList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, attr: Attribute) {
        self.entries.push(attr);
    }

    /// Append every entry of `other`, keeping its order
    pub fn extend(&mut self, other: AttributeList) {
        self.entries.extend(other.entries);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Attribute> {
        self.entries.iter()
    }

    /// Value of the last named entry with this key
    pub fn named(&self, key: &str) -> Option<&str> {
        self.entries.iter().rev().find_map(|a| match a {
            Attribute::Named { key: k, value, .. } if k == key => Some(value.as_str()),
            Attribute::TableColumns(cols) if cols.key == key => Some(cols.raw.as_str()),
            _ => None,
        })
    }

    /// Positional value at a 1-based index
    pub fn positional(&self, index: usize) -> Option<&str> {
        self.entries.iter().find_map(|a| match a {
            Attribute::Positional { index: i, value } if *i == index => Some(value.as_str()),
            Attribute::Shorthand(s) if index == 1 => s.style.as_deref(),
            _ => None,
        })
    }

    fn shorthand(&self) -> Option<&Shorthand> {
        self.entries.iter().find_map(|a| match a {
            Attribute::Shorthand(s) => Some(s),
            _ => None,
        })
    }

    /// Block style from the first positional entry
    pub fn style(&self) -> Option<&str> {
        self.positional(1).filter(|s| !s.is_empty())
    }

    /// Explicit `id=` wins over a `#id` shorthand
    pub fn id(&self) -> Option<&str> {
        self.named("id")
            .or_else(|| self.shorthand().and_then(|s| s.id.as_deref()))
    }

    pub fn roles(&self) -> Vec<&str> {
        let mut roles: Vec<&str> = self
            .shorthand()
            .map(|s| s.roles.iter().map(String::as_str).collect())
            .unwrap_or_default();
        if let Some(role) = self.named("role") {
            roles.extend(role.split_whitespace());
        }
        roles
    }

    /// Options from `%opt` shorthand segments and `options=`/`opts=` entries
    pub fn options(&self) -> Vec<&str> {
        let mut options: Vec<&str> = Vec::new();
        for attr in &self.entries {
            match attr {
                Attribute::Shorthand(s) => options.extend(s.options.iter().map(String::as_str)),
                Attribute::Named { key, value, .. } if key == "options" || key == "opts" => {
                    options.extend(value.split(',').map(str::trim).filter(|o| !o.is_empty()))
                }
                _ => {}
            }
        }
        options
    }

    pub fn has_option(&self, name: &str) -> bool {
        self.options().contains(&name)
    }

    /// Block title attached from a `.Title` line
    pub fn title(&self) -> Option<&str> {
        self.entries.iter().rev().find_map(|a| match a {
            Attribute::Title(t) => Some(t.as_str()),
            _ => None,
        })
    }

    pub fn table_columns(&self) -> Option<&TableColumnsAttribute> {
        self.entries.iter().rev().find_map(|a| match a {
            Attribute::TableColumns(cols) => Some(cols),
            _ => None,
        })
    }

    /// Write the list back out in attribute line syntax (without title)
    pub fn to_source(&self) -> String {
        let parts: Vec<String> = self
            .entries
            .iter()
            .filter_map(|a| match a {
                Attribute::Named {
                    key,
                    value,
                    quoting,
                } => Some(format!("{}={}", key, quote(value, *quoting))),
                Attribute::TableColumns(cols) => {
                    Some(format!("{}={}", cols.key, quote(&cols.raw, cols.quoting)))
                }
                Attribute::Positional { value, .. } => Some(value.clone()),
                Attribute::Shorthand(s) => {
                    let mut out = s.style.clone().unwrap_or_default();
                    if let Some(id) = &s.id {
                        out.push('#');
                        out.push_str(id);
                    }
                    for role in &s.roles {
                        out.push('.');
                        out.push_str(role);
                    }
                    for opt in &s.options {
                        out.push('%');
                        out.push_str(opt);
                    }
                    Some(out)
                }
                Attribute::Title(_) => None,
            })
            .collect();
        format!("[{}]", parts.join(","))
    }
}

fn quote(value: &str, quoting: Quoting) -> String {
    match quoting {
        Quoting::Double => format!("\"{}\"", value.replace('"', "\\\"")),
        Quoting::Single => format!("'{}'", value.replace('\'', "\\'")),
        Quoting::Unquoted => value.to_string(),
    }
}

/// Parse the text between the brackets of an attribute line
///
/// Returns `None` when the text is not a valid attribute list (unclosed
/// quote or a malformed entry); the caller keeps such a line as literal
/// text.
pub fn parse_attribute_list(text: &str) -> Option<AttributeList> {
    let mut list = AttributeList::new();
    let mut positional = 0;

    for entry in split_entries(text)? {
        let entry = entry.trim();

        if let Some(caps) = NAMED_ENTRY.captures(entry) {
            let key = caps[1].to_lowercase();
            let (value, quoting) = unquote(caps[2].trim())?;
            if key == "cols" || key == "colspec" {
                if let Some(columns) = parse_column_spec(&value) {
                    list.push(Attribute::TableColumns(TableColumnsAttribute {
                        key,
                        raw: value,
                        quoting,
                        columns,
                    }));
                    continue;
                }
            }
            list.push(Attribute::Named {
                key,
                value,
                quoting,
            });
            continue;
        }

        if entry.starts_with('=') {
            return None;
        }

        positional += 1;
        let (value, quoting) = unquote(entry)?;
        if positional == 1 && quoting == Quoting::Unquoted {
            if let Some(shorthand) = parse_shorthand(&value) {
                list.push(Attribute::Shorthand(shorthand));
                continue;
            }
        }
        list.push(Attribute::Positional {
            index: positional,
            value,
        });
    }

    Some(list)
}

/// Split on commas outside quoted values
fn split_entries(text: &str) -> Option<Vec<String>> {
    let mut entries = Vec::new();
    let mut buf = String::new();
    let mut quote: Option<char> = None;
    let mut value_start = true;
    let mut prev = '\0';

    for c in text.chars() {
        match quote {
            Some(q) => {
                buf.push(c);
                if c == q && prev != '\\' {
                    quote = None;
                }
            }
            None => match c {
                ',' => {
                    entries.push(std::mem::take(&mut buf));
                    value_start = true;
                }
                '"' | '\'' if value_start => {
                    quote = Some(c);
                    buf.push(c);
                    value_start = false;
                }
                '=' => {
                    buf.push(c);
                    value_start = true;
                }
                c if c.is_whitespace() && value_start => buf.push(c),
                _ => {
                    buf.push(c);
                    value_start = false;
                }
            },
        }
        prev = c;
    }

    if quote.is_some() {
        return None;
    }
    if !buf.trim().is_empty() || !entries.is_empty() {
        entries.push(buf);
    }
    Some(entries)
}

/// Strip matching quotes, returning the value and how it was quoted
fn unquote(raw: &str) -> Option<(String, Quoting)> {
    for (q, quoting) in [('"', Quoting::Double), ('\'', Quoting::Single)] {
        if let Some(rest) = raw.strip_prefix(q) {
            let inner = rest.strip_suffix(q)?;
            let escaped = format!("\\{}", q);
            return Some((inner.replace(&escaped, &q.to_string()), quoting));
        }
    }
    Some((raw.to_string(), Quoting::Unquoted))
}

fn parse_shorthand(value: &str) -> Option<Shorthand> {
    let caps = SHORTHAND.captures(value)?;
    let mut shorthand = Shorthand {
        style: Some(caps[1].to_string()).filter(|s| !s.is_empty()),
        ..Default::default()
    };

    let segments = &caps[2];
    let mut marker = None;
    let mut current = String::new();
    for c in segments.chars().chain(std::iter::once('\0')) {
        if matches!(c, '#' | '.' | '%' | '\0') {
            match marker {
                Some('#') => shorthand.id = Some(std::mem::take(&mut current)),
                Some('.') => shorthand.roles.push(std::mem::take(&mut current)),
                Some('%') => shorthand.options.push(std::mem::take(&mut current)),
                _ => {}
            }
            marker = Some(c);
        } else {
            current.push(c);
        }
    }

    Some(shorthand)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn test_named_quoting_modes() {
        let list = parse_attribute_list(r#"a="x y",b='z',c=w"#).unwrap();
        let quotings: Vec<Quoting> = list
            .iter()
            .filter_map(|a| match a {
                Attribute::Named { quoting, .. } => Some(*quoting),
                _ => None,
            })
            .collect();
        assert_eq!(
            quotings,
            vec![Quoting::Double, Quoting::Single, Quoting::Unquoted]
        );
        assert_eq!(list.named("a"), Some("x y"));
        assert_eq!(list.named("b"), Some("z"));
    }

    #[test]
    fn test_quoted_value_keeps_commas() {
        let list = parse_attribute_list(r#"cols="1,2,3",options="header,footer""#).unwrap();
        assert_eq!(list.table_columns().map(|c| c.columns.len()), Some(3));
        assert!(list.has_option("header"));
        assert!(list.has_option("footer"));
    }

    #[test]
    fn test_shorthand_segments() {
        let list = parse_attribute_list("source#main.wide.dark%header").unwrap();
        assert_eq!(list.style(), Some("source"));
        assert_eq!(list.id(), Some("main"));
        assert_eq!(list.roles(), vec!["wide", "dark"]);
        assert_eq!(list.options(), vec!["header"]);
    }

    #[test]
    fn test_positional_after_shorthand() {
        let list = parse_attribute_list("%autowidth,second, third value").unwrap();
        assert_eq!(list.style(), None);
        assert_eq!(list.positional(2), Some("second"));
        assert_eq!(list.positional(3), Some("third value"));
        assert!(list.has_option("autowidth"));
    }

    #[test]
    fn test_empty_caption_is_kept() {
        let list = parse_attribute_list(r#"caption="""#).unwrap();
        assert_eq!(list.named("caption"), Some(""));
    }

    #[test]
    fn test_blank_cols_stay_named() {
        let list = parse_attribute_list(r#"cols=" , ""#).unwrap();
        assert!(list.table_columns().is_none());
        assert_eq!(list.named("cols"), Some(" , "));
    }

    #[test]
    fn test_invalid_lists() {
        assert!(parse_attribute_list(r#"title="unclosed"#).is_none());
        assert!(parse_attribute_list("=value").is_none());
    }

    #[test]
    fn test_to_source_round_trip() {
        let text = r#"%header,cols="1,2",frame=ends,caption=''"#;
        let list = parse_attribute_list(text).unwrap();
        assert_eq!(list.to_source(), format!("[{}]", text));
    }
}
