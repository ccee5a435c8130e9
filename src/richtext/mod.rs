//! Restricted rich-text markup.
//!
//! Review and milestone bodies are stored as a closed AST: paragraphs, lists
//! and bold/italic/underline spans, nothing else. The parser accepts a small
//! inline markup (`**bold**`, `*italic*`, `__underline__`, `- ` / `1. ` list
//! lines) and cannot produce any other node, so disallowed markup is
//! unrepresentable rather than sanitized away.

use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq, Eq)]
pub enum RichTextError {
    #[error("unclosed {0} marker")]
    UnclosedMarker(&'static str),
    #[error("content exceeds {max} characters")]
    TooLong { max: usize },
    #[error("malformed rich text payload: {0}")]
    Malformed(String),
}

/// Hard cap on stored plain-text length, matching the add/edit forms.
pub const MAX_CONTENT_CHARS: usize = 20_000;

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Span {
    pub text: String,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub bold: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub italic: bool,
    #[serde(default, skip_serializing_if = "std::ops::Not::not")]
    pub underline: bool,
}

impl Span {
    fn plain(text: impl Into<String>) -> Self {
        Span {
            text: text.into(),
            ..Span::default()
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Block {
    Paragraph { spans: Vec<Span> },
    List { ordered: bool, items: Vec<Vec<Span>> },
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RichText {
    pub blocks: Vec<Block>,
}

impl RichText {
    /// Parses the restricted markup into an AST.
    pub fn parse(markup: &str) -> Result<RichText, RichTextError> {
        let mut blocks = Vec::new();
        let mut paragraph: Vec<Span> = Vec::new();
        let mut list: Option<(bool, Vec<Vec<Span>>)> = None;

        for line in markup.lines() {
            let trimmed = line.trim_end();

            if trimmed.trim().is_empty() {
                flush_paragraph(&mut blocks, &mut paragraph);
                flush_list(&mut blocks, &mut list);
                continue;
            }

            if let Some(item) = trimmed.strip_prefix("- ") {
                flush_paragraph(&mut blocks, &mut paragraph);
                push_list_item(&mut blocks, &mut list, false, parse_spans(item)?);
                continue;
            }

            if let Some(item) = strip_ordered_prefix(trimmed) {
                flush_paragraph(&mut blocks, &mut paragraph);
                push_list_item(&mut blocks, &mut list, true, parse_spans(item)?);
                continue;
            }

            flush_list(&mut blocks, &mut list);
            if !paragraph.is_empty() {
                paragraph.push(Span::plain("\n"));
            }
            paragraph.extend(parse_spans(trimmed)?);
        }

        flush_paragraph(&mut blocks, &mut paragraph);
        flush_list(&mut blocks, &mut list);

        let text = RichText { blocks };
        let len = text.char_count();
        if len > MAX_CONTENT_CHARS {
            return Err(RichTextError::TooLong {
                max: MAX_CONTENT_CHARS,
            });
        }
        Ok(text)
    }

    /// Decodes a stored JSON AST, rejecting anything that does not fit the
    /// closed node set.
    pub fn from_stored_json(raw: &str) -> Result<RichText, RichTextError> {
        serde_json::from_str(raw).map_err(|e| RichTextError::Malformed(e.to_string()))
    }

    pub fn to_stored_json(&self) -> String {
        // The AST contains only strings and bools, serialization cannot fail.
        serde_json::to_string(self).unwrap_or_else(|_| "{\"blocks\":[]}".to_string())
    }

    /// Flattens the AST into plain text, used for length-based rules.
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        for block in &self.blocks {
            if !out.is_empty() {
                out.push('\n');
            }
            match block {
                Block::Paragraph { spans } => {
                    for span in spans {
                        out.push_str(&span.text);
                    }
                }
                Block::List { items, .. } => {
                    for (index, item) in items.iter().enumerate() {
                        if index > 0 {
                            out.push('\n');
                        }
                        for span in item {
                            out.push_str(&span.text);
                        }
                    }
                }
            }
        }
        out
    }

    pub fn char_count(&self) -> usize {
        self.plain_text().chars().count()
    }

    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }
}

fn flush_paragraph(blocks: &mut Vec<Block>, paragraph: &mut Vec<Span>) {
    if !paragraph.is_empty() {
        blocks.push(Block::Paragraph {
            spans: std::mem::take(paragraph),
        });
    }
}

fn flush_list(blocks: &mut Vec<Block>, list: &mut Option<(bool, Vec<Vec<Span>>)>) {
    if let Some((ordered, items)) = list.take() {
        blocks.push(Block::List { ordered, items });
    }
}

fn push_list_item(
    blocks: &mut Vec<Block>,
    list: &mut Option<(bool, Vec<Vec<Span>>)>,
    ordered: bool,
    spans: Vec<Span>,
) {
    match list {
        Some((current_ordered, items)) if *current_ordered == ordered => items.push(spans),
        _ => {
            flush_list(blocks, list);
            *list = Some((ordered, vec![spans]));
        }
    }
}

/// Matches `1. `, `12. ` etc. and returns the rest of the line.
fn strip_ordered_prefix(line: &str) -> Option<&str> {
    let dot = line.find(". ")?;
    if dot == 0 || !line[..dot].bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    Some(&line[dot + 2..])
}

/// Inline markers: `**bold**`, `__underline__`, `*italic*`.
fn parse_spans(text: &str) -> Result<Vec<Span>, RichTextError> {
    let mut spans = Vec::new();
    let mut plain = String::new();
    let mut rest = text;

    while !rest.is_empty() {
        let (marker, name, bold, italic, underline) = if rest.starts_with("**") {
            ("**", "bold", true, false, false)
        } else if rest.starts_with("__") {
            ("__", "underline", false, false, true)
        } else if rest.starts_with('*') {
            ("*", "italic", false, true, false)
        } else {
            let mut chars = rest.chars();
            if let Some(c) = chars.next() {
                plain.push(c);
            }
            rest = chars.as_str();
            continue;
        };

        let inner_start = marker.len();
        let close = rest[inner_start..]
            .find(marker)
            .ok_or(RichTextError::UnclosedMarker(name))?;

        if !plain.is_empty() {
            spans.push(Span::plain(std::mem::take(&mut plain)));
        }
        spans.push(Span {
            text: rest[inner_start..inner_start + close].to_string(),
            bold,
            italic,
            underline,
        });
        rest = &rest[inner_start + close + marker.len()..];
    }

    if !plain.is_empty() {
        spans.push(Span::plain(plain));
    }
    Ok(spans)
}
