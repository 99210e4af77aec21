//! Dialogue markup processing
//!
//! Converts the constrained chat syntax used for spoken lines into a small
//! node tree that renders to escaped HTML.
//!
//! # Syntax
//!
//! Passes run in a fixed order so that combinations compose predictably:
//!
//! 1. `[[base|annotation]]` - ruby annotation (phonetic guide above the base)
//! 2. `***text***` - bold italic
//! 3. `**text**` - bold
//! 4. `*text*` - italic
//! 5. `~text~` - strikethrough
//!
//! Every pattern is non-greedy and its captured span excludes the pattern's
//! own delimiter. A later pass may wrap nodes produced by an earlier pass
//! (`**[[東|ひがし]]**` is a bold ruby), but never the other way around.
//!
//! # Partial rendering
//!
//! [`Markup::truncated`] keeps only the first `n` *visible* characters, where
//! visible means plain text plus ruby base text (annotations do not count).
//! A ruby cut mid-base keeps its full annotation. An emphasis span is only
//! emitted once all of its visible characters are revealed; until then its
//! revealed prefix renders as plain text.
//!
//! ```
//! use speaker_stage_domain::{render, render_partial};
//!
//! assert_eq!(render("Hello **world**!"), "Hello <strong>world</strong>!");
//! assert_eq!(render_partial("Hello **world**!", 7), "Hello w");
//! ```

use std::sync::OnceLock;

use regex_lite::{Captures, Regex};
use serde::{Deserialize, Serialize};

/// CSS class attached to rendered `<ruby>` elements
pub const RUBY_CLASS: &str = "stage-ruby";

// Supplementary Private Use Area-A. Built nodes are parked in the working
// string as one placeholder char each so later passes can match across them.
const PLACEHOLDER_BASE: u32 = 0xF0000;
const PLACEHOLDER_LAST: u32 = 0xFFFFD;

/// A node of parsed dialogue markup
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum MarkupNode {
    Text { text: String },
    Ruby { base: String, annotation: String },
    BoldItalic { children: Vec<MarkupNode> },
    Bold { children: Vec<MarkupNode> },
    Italic { children: Vec<MarkupNode> },
    Strike { children: Vec<MarkupNode> },
}

impl MarkupNode {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text { text: text.into() }
    }

    /// Number of visible characters (ruby annotations excluded)
    pub fn visible_len(&self) -> usize {
        match self {
            Self::Text { text } => text.chars().count(),
            Self::Ruby { base, .. } => base.chars().count(),
            Self::BoldItalic { children }
            | Self::Bold { children }
            | Self::Italic { children }
            | Self::Strike { children } => visible_len(children),
        }
    }

    fn children(&self) -> Option<&[MarkupNode]> {
        match self {
            Self::Text { .. } | Self::Ruby { .. } => None,
            Self::BoldItalic { children }
            | Self::Bold { children }
            | Self::Italic { children }
            | Self::Strike { children } => Some(children),
        }
    }

    fn push_plain(&self, out: &mut String) {
        match self {
            Self::Text { text } => out.push_str(text),
            Self::Ruby { base, .. } => out.push_str(base),
            _ => {
                for child in self.children().unwrap_or_default() {
                    child.push_plain(out);
                }
            }
        }
    }

    fn push_html(&self, out: &mut String) {
        let (open, close) = match self {
            Self::Text { text } => {
                push_escaped(out, text);
                return;
            }
            Self::Ruby { base, annotation } => {
                out.push_str("<ruby class=\"");
                out.push_str(RUBY_CLASS);
                out.push_str("\">");
                push_escaped(out, base);
                out.push_str("<rt>");
                push_escaped(out, annotation);
                out.push_str("</rt></ruby>");
                return;
            }
            Self::BoldItalic { .. } => ("<strong><em>", "</em></strong>"),
            Self::Bold { .. } => ("<strong>", "</strong>"),
            Self::Italic { .. } => ("<em>", "</em>"),
            Self::Strike { .. } => ("<del>", "</del>"),
        };

        out.push_str(open);
        for child in self.children().unwrap_or_default() {
            child.push_html(out);
        }
        out.push_str(close);
    }
}

/// Parsed dialogue markup
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Markup {
    nodes: Vec<MarkupNode>,
}

impl Markup {
    /// Parse raw chat content
    pub fn parse(raw: &str) -> Self {
        if raw.is_empty() {
            return Self::default();
        }

        let mut parker = NodeParker::default();
        let mut working = parker.protect_literals(raw);

        working = apply_pass(ruby_pattern(), &working, &mut parker, |caps, parker| {
            Some(MarkupNode::Ruby {
                base: parker.take_plain(&caps[1]),
                annotation: parker.take_plain(&caps[2]),
            })
        });
        working = apply_pass(bold_italic_pattern(), &working, &mut parker, |caps, parker| {
            Some(MarkupNode::BoldItalic {
                children: parker.take_nodes(&caps[1]),
            })
        });
        working = apply_pass(bold_pattern(), &working, &mut parker, |caps, parker| {
            Some(MarkupNode::Bold {
                children: parker.take_nodes(&caps[1]),
            })
        });
        working = apply_pass(italic_pattern(), &working, &mut parker, |caps, parker| {
            Some(MarkupNode::Italic {
                children: parker.take_nodes(&caps[1]),
            })
        });
        working = apply_pass(strike_pattern(), &working, &mut parker, |caps, parker| {
            Some(MarkupNode::Strike {
                children: parker.take_nodes(&caps[1]),
            })
        });

        Self {
            nodes: parker.take_nodes(&working),
        }
    }

    pub fn nodes(&self) -> &[MarkupNode] {
        &self.nodes
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Visible character count (what the typing effect reveals)
    pub fn visible_len(&self) -> usize {
        visible_len(&self.nodes)
    }

    /// Text content with markup and ruby annotations removed
    pub fn plain_text(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            node.push_plain(&mut out);
        }
        out
    }

    /// Escaped HTML for the whole text
    pub fn to_html(&self) -> String {
        let mut out = String::new();
        for node in &self.nodes {
            node.push_html(&mut out);
        }
        out
    }

    /// Keep only the first `max_visible` visible characters
    pub fn truncated(&self, max_visible: usize) -> Markup {
        let mut budget = max_visible;
        let mut nodes = Vec::new();
        truncate_into(&self.nodes, &mut budget, &mut nodes);
        Markup {
            nodes: merge_text(nodes),
        }
    }

    /// Escaped HTML for the first `max_visible` visible characters
    pub fn partial_html(&self, max_visible: usize) -> String {
        self.truncated(max_visible).to_html()
    }
}

/// Render raw chat content to escaped HTML
pub fn render(raw: &str) -> String {
    Markup::parse(raw).to_html()
}

/// Render only the first `max_visible_chars` visible characters of raw content
pub fn render_partial(raw: &str, max_visible_chars: usize) -> String {
    Markup::parse(raw).partial_html(max_visible_chars)
}

/// Plain text of raw content, as revealed by the typing effect
pub fn plain_text(raw: &str) -> String {
    Markup::parse(raw).plain_text()
}

fn visible_len(nodes: &[MarkupNode]) -> usize {
    nodes.iter().map(MarkupNode::visible_len).sum()
}

fn truncate_into(nodes: &[MarkupNode], budget: &mut usize, out: &mut Vec<MarkupNode>) {
    for node in nodes {
        if *budget == 0 {
            return;
        }

        let len = node.visible_len();
        if len <= *budget {
            out.push(node.clone());
            *budget -= len;
            continue;
        }

        match node {
            MarkupNode::Text { text } => {
                out.push(MarkupNode::text(text.chars().take(*budget).collect::<String>()));
            }
            MarkupNode::Ruby { base, annotation } => {
                out.push(MarkupNode::Ruby {
                    base: base.chars().take(*budget).collect(),
                    annotation: annotation.clone(),
                });
            }
            // Incomplete span: reveal its prefix without the formatting
            _ => truncate_into(node.children().unwrap_or_default(), budget, out),
        }
        *budget = 0;
    }
}

fn merge_text(nodes: Vec<MarkupNode>) -> Vec<MarkupNode> {
    let mut merged: Vec<MarkupNode> = Vec::with_capacity(nodes.len());
    for node in nodes {
        match (merged.last_mut(), node) {
            (Some(MarkupNode::Text { text: last }), MarkupNode::Text { text }) => {
                last.push_str(&text)
            }
            (_, node) => merged.push(node),
        }
    }
    merged
}

fn push_escaped(out: &mut String, text: &str) {
    for ch in text.chars() {
        match ch {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '"' => out.push_str("&quot;"),
            '\'' => out.push_str("&#39;"),
            _ => out.push(ch),
        }
    }
}

/// Holds built nodes while they are represented by placeholder chars
#[derive(Default)]
struct NodeParker {
    slots: Vec<Option<MarkupNode>>,
}

impl NodeParker {
    fn has_capacity(&self) -> bool {
        PLACEHOLDER_BASE + (self.slots.len() as u32) <= PLACEHOLDER_LAST
    }

    fn park(&mut self, node: MarkupNode) -> Option<char> {
        if !self.has_capacity() {
            return None;
        }
        let ch = char::from_u32(PLACEHOLDER_BASE + self.slots.len() as u32)?;
        self.slots.push(Some(node));
        Some(ch)
    }

    fn slot_index(&self, ch: char) -> Option<usize> {
        let code = ch as u32;
        if code < PLACEHOLDER_BASE {
            return None;
        }
        let index = (code - PLACEHOLDER_BASE) as usize;
        (index < self.slots.len()).then_some(index)
    }

    /// Park any input chars that collide with the placeholder range as text
    fn protect_literals(&mut self, raw: &str) -> String {
        raw.chars()
            .map(|ch| {
                let code = ch as u32;
                if (PLACEHOLDER_BASE..=PLACEHOLDER_LAST).contains(&code) {
                    self.park(MarkupNode::text(ch)).unwrap_or(char::REPLACEMENT_CHARACTER)
                } else {
                    ch
                }
            })
            .collect()
    }

    fn take_nodes(&mut self, segment: &str) -> Vec<MarkupNode> {
        let mut nodes = Vec::new();
        let mut buffer = String::new();

        for ch in segment.chars() {
            let parked = self.slot_index(ch).and_then(|index| self.slots[index].take());
            match parked {
                Some(node) => {
                    if !buffer.is_empty() {
                        nodes.push(MarkupNode::text(std::mem::take(&mut buffer)));
                    }
                    nodes.push(node);
                }
                None => buffer.push(ch),
            }
        }
        if !buffer.is_empty() {
            nodes.push(MarkupNode::text(buffer));
        }

        merge_text(nodes)
    }

    fn take_plain(&mut self, segment: &str) -> String {
        let mut out = String::new();
        for node in self.take_nodes(segment) {
            node.push_plain(&mut out);
        }
        out
    }
}

fn apply_pass(
    pattern: &Regex,
    working: &str,
    parker: &mut NodeParker,
    mut build: impl FnMut(&Captures<'_>, &mut NodeParker) -> Option<MarkupNode>,
) -> String {
    pattern
        .replace_all(working, |caps: &Captures<'_>| {
            if !parker.has_capacity() {
                return caps[0].to_string();
            }
            build(caps, &mut *parker)
                .and_then(|node| parker.park(node))
                .map(String::from)
                .unwrap_or_default()
        })
        .into_owned()
}

fn compiled(cell: &'static OnceLock<Regex>, pattern: &str) -> &'static Regex {
    cell.get_or_init(|| match Regex::new(pattern) {
        Ok(re) => re,
        // Patterns are literals exercised by the tests below
        Err(err) => unreachable!("invalid markup pattern {pattern}: {err}"),
    })
}

fn ruby_pattern() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    compiled(&CELL, r"\[\[([^|\]]+?)\|([^\]]+?)\]\]")
}

fn bold_italic_pattern() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    compiled(&CELL, r"\*\*\*([^*]+?)\*\*\*")
}

fn bold_pattern() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    compiled(&CELL, r"\*\*([^*]+?)\*\*")
}

fn italic_pattern() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    compiled(&CELL, r"\*([^*]+?)\*")
}

fn strike_pattern() -> &'static Regex {
    static CELL: OnceLock<Regex> = OnceLock::new();
    compiled(&CELL, r"~([^~]+?)~")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_plain_text_is_escaped() {
        assert_eq!(
            render("<script>alert('x')</script> & co"),
            "&lt;script&gt;alert(&#39;x&#39;)&lt;/script&gt; &amp; co"
        );
    }

    #[test]
    fn test_emphasis_passes() {
        assert_eq!(render("***both***"), "<strong><em>both</em></strong>");
        assert_eq!(render("**bold**"), "<strong>bold</strong>");
        assert_eq!(render("*it*"), "<em>it</em>");
        assert_eq!(render("~gone~"), "<del>gone</del>");
    }

    #[test]
    fn test_emphasis_is_non_greedy() {
        assert_eq!(render("*a* and *b*"), "<em>a</em> and <em>b</em>");
    }

    #[test]
    fn test_unclosed_delimiters_stay_literal() {
        assert_eq!(render("2 * 3 = 6"), "2 * 3 = 6");
        assert_eq!(render("**open"), "**open");
    }

    #[test]
    fn test_ruby_annotation() {
        assert_eq!(
            render("[[東京|とうきょう]] desu"),
            "<ruby class=\"stage-ruby\">東京<rt>とうきょう</rt></ruby> desu"
        );
    }

    #[test]
    fn test_ruby_base_excludes_bracket() {
        assert_eq!(render("[[a]b|c]]"), "[[a]b|c]]");
    }

    #[test]
    fn test_ruby_annotation_may_contain_pipe() {
        assert_eq!(
            render("[[a|b|c]]"),
            "<ruby class=\"stage-ruby\">a<rt>b|c</rt></ruby>"
        );
    }

    #[test]
    fn test_later_pass_wraps_earlier_node() {
        assert_eq!(
            render("**[[東|ひがし]]**"),
            "<strong><ruby class=\"stage-ruby\">東<rt>ひがし</rt></ruby></strong>"
        );
        assert_eq!(render("~**x** y~"), "<del><strong>x</strong> y</del>");
    }

    #[test]
    fn test_ruby_contents_are_escaped() {
        assert_eq!(
            render("[[<b>|\"q\"]]"),
            "<ruby class=\"stage-ruby\">&lt;b&gt;<rt>&quot;q&quot;</rt></ruby>"
        );
    }

    #[test]
    fn test_plain_text_excludes_annotation() {
        let markup = Markup::parse("Hi [[東京|とうきょう]] **there**");
        assert_eq!(markup.plain_text(), "Hi 東京 there");
        assert_eq!(markup.visible_len(), 11);
    }

    #[test]
    fn test_partial_holds_back_incomplete_bold() {
        assert_eq!(render_partial("Hello **world**!", 7), "Hello w");
        assert_eq!(
            render_partial("Hello **world**!", 11),
            "Hello <strong>world</strong>"
        );
    }

    #[test]
    fn test_partial_ruby_keeps_full_annotation() {
        let text = "[[東京|とうきょう]] desu";
        assert_eq!(
            render_partial(text, 1),
            "<ruby class=\"stage-ruby\">東<rt>とうきょう</rt></ruby>"
        );
        assert_eq!(
            render_partial(text, 2),
            "<ruby class=\"stage-ruby\">東京<rt>とうきょう</rt></ruby>"
        );
    }

    #[test]
    fn test_partial_zero_is_empty() {
        assert_eq!(render_partial("**x**", 0), "");
    }

    #[test]
    fn test_partial_keeps_completed_inner_span() {
        assert_eq!(render_partial("~**x** yz~", 3), "<strong>x</strong> y");
    }

    #[test]
    fn test_partial_at_full_length_matches_render() {
        let inputs = [
            "Hello **world**!",
            "[[東京|とうきょう]] desu",
            "***a*** **b** *c* ~d~",
            "plain <tags> & stuff",
            "~**x** [[y|why]]~ tail",
            "",
        ];
        for input in inputs {
            let markup = Markup::parse(input);
            assert_eq!(
                markup.partial_html(markup.visible_len()),
                render(input),
                "input: {input}"
            );
        }
    }

    #[test]
    fn test_placeholder_range_input_survives() {
        let odd = char::from_u32(PLACEHOLDER_BASE).unwrap().to_string();
        let input = format!("{odd} **b**");
        assert_eq!(render(&input), format!("{odd} <strong>b</strong>"));
    }
}
