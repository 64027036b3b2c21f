//! RISC16 highlight grammar and the highlighter port.
//!
//! The crate owns the pattern grammar only. Decorating the displayed code is
//! delegated to a [`Highlighter`] supplied by the host; [`MarkupHighlighter`]
//! is a small host implementation that wraps matches in `<span>` elements.

use crate::dom::{escape_html, Document};
use crate::Result;
use regex::Regex;
use serde::Serialize;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::OnceLock;

/// Instruction mnemonics of the RISC16 ISA
pub const MNEMONICS: [&str; 12] = [
    "nop", "halt", "reset", "addi", "add", "nand", "movi", "lui", "lw", "sw", "beq", "jalr",
];

/// Classes a line can fall into
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Comment,
    Instr,
    Label,
}

impl TokenKind {
    pub fn name(self) -> &'static str {
        match self {
            TokenKind::Comment => "comment",
            TokenKind::Instr => "instr",
            TokenKind::Label => "label",
        }
    }
}

/// One named, line-anchored pattern
#[derive(Debug, Clone)]
pub struct PatternRule {
    kind: TokenKind,
    regex: Regex,
    /// JavaScript literal handed to script hosts
    js_literal: String,
}

impl PatternRule {
    pub fn new(kind: TokenKind, pattern: &str, js_literal: &str) -> Result<Self> {
        let regex = Regex::new(pattern)
            .map_err(|e| crate::Error::Config(format!("bad pattern for {}: {}", kind.name(), e)))?;
        Ok(Self {
            kind,
            regex,
            js_literal: js_literal.to_string(),
        })
    }

    pub fn kind(&self) -> TokenKind {
        self.kind
    }

    pub fn name(&self) -> &'static str {
        self.kind.name()
    }

    /// Matched prefix of `line`, if the rule applies
    pub fn find<'a>(&self, line: &'a str) -> Option<&'a str> {
        self.regex.find(line).map(|m| m.as_str())
    }
}

/// Configuration object in the shape script highlighters expect
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct HighlightConfig {
    pub patterns: Vec<PatternConfig>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct PatternConfig {
    pub name: String,
    #[serde(rename = "match")]
    pub pattern: String,
}

/// Ordered rules, first match wins
#[derive(Debug, Clone)]
pub struct Grammar {
    rules: Vec<PatternRule>,
}

impl Grammar {
    pub fn new(rules: Vec<PatternRule>) -> Self {
        Self { rules }
    }

    /// The built-in RISC16 grammar: comment, then instruction, then label.
    pub fn risc16() -> &'static Grammar {
        static GRAMMAR: OnceLock<Grammar> = OnceLock::new();
        GRAMMAR.get_or_init(|| {
            // ASCII-only case folding, like a JS `/i` regex without the `u` flag
            let instr = format!("(?i-u)^({})", MNEMONICS.join("|"));
            let rules = vec![
                PatternRule::new(TokenKind::Comment, r"^(//.*)", r"/^(\/\/.*)/"),
                PatternRule::new(TokenKind::Instr, &instr, &format!("/^({})/i", MNEMONICS.join("|"))),
                PatternRule::new(TokenKind::Label, r"^([A-Za-z]+:)", r"/^([A-Za-z]+:)/"),
            ];
            Grammar::new(
                rules
                    .into_iter()
                    .collect::<Result<Vec<_>>>()
                    .expect("built-in patterns compile"),
            )
        })
    }

    pub fn rules(&self) -> &[PatternRule] {
        &self.rules
    }

    /// First rule matching at the start of `line`
    pub fn classify(&self, line: &str) -> Option<TokenKind> {
        self.rules.iter().find(|r| r.find(line).is_some()).map(|r| r.kind)
    }

    /// Classify every line of `text`
    pub fn classify_lines<'a>(&self, text: &'a str) -> Vec<(&'a str, Option<TokenKind>)> {
        text.lines().map(|l| (l, self.classify(l))).collect()
    }

    pub fn to_config(&self) -> HighlightConfig {
        HighlightConfig {
            patterns: self
                .rules
                .iter()
                .map(|r| PatternConfig {
                    name: r.name().to_string(),
                    pattern: r.js_literal.clone(),
                })
                .collect(),
        }
    }
}

/// Host-supplied routine that decorates the displayed code
pub trait Highlighter: Send + Sync {
    fn highlight(&self, document: &mut Document, grammar: &Grammar) -> Result<()>;
}

/// Highlighter that does nothing
#[derive(Debug, Default)]
pub struct NoopHighlighter;

impl Highlighter for NoopHighlighter {
    fn highlight(&self, _document: &mut Document, _grammar: &Grammar) -> Result<()> {
        Ok(())
    }
}

/// Counts invocations; useful to observe when the client re-highlights
#[derive(Debug, Default)]
pub struct RecordingHighlighter {
    calls: AtomicUsize,
}

impl RecordingHighlighter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }
}

impl Highlighter for RecordingHighlighter {
    fn highlight(&self, _document: &mut Document, _grammar: &Grammar) -> Result<()> {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Rewrites one element's text as markup, wrapping each line's match in
/// `<span class="{name}">`.
#[derive(Debug, Clone)]
pub struct MarkupHighlighter {
    target: String,
}

impl MarkupHighlighter {
    pub fn new(target: &str) -> Self {
        Self {
            target: target.to_string(),
        }
    }

    pub fn render(text: &str, grammar: &Grammar) -> String {
        text.lines()
            .map(|line| {
                let hit = grammar
                    .rules()
                    .iter()
                    .find_map(|r| r.find(line).map(|m| (r.name(), m)));
                match hit {
                    Some((name, m)) => format!(
                        "<span class=\"{}\">{}</span>{}",
                        name,
                        escape_html(m),
                        escape_html(&line[m.len()..])
                    ),
                    None => escape_html(line),
                }
            })
            .collect::<Vec<_>>()
            .join("\n")
    }
}

impl Highlighter for MarkupHighlighter {
    fn highlight(&self, document: &mut Document, grammar: &Grammar) -> Result<()> {
        // Absent target: nothing on screen to decorate.
        let Some(el) = document.element_mut(&self.target) else {
            return Ok(());
        };
        let text = el.text_content();
        el.set_inner_html(&Self::render(&text, grammar));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dom::Element;

    #[test]
    fn classifies_reference_lines() {
        let g = Grammar::risc16();
        assert_eq!(g.classify("ADDI r1, r2, 4"), Some(TokenKind::Instr));
        assert_eq!(g.classify("// comment"), Some(TokenKind::Comment));
        assert_eq!(g.classify("loop:"), Some(TokenKind::Label));
        assert_eq!(g.classify("mov r1"), None);
    }

    #[test]
    fn patterns_are_anchored_at_line_start() {
        let g = Grammar::risc16();
        assert_eq!(g.classify("  add r1, r1, r2"), None);
        assert_eq!(g.classify("x // trailing"), None);
        assert_eq!(g.classify("3loop:"), None);
    }

    #[test]
    fn precedence_is_comment_then_instr_then_label() {
        let g = Grammar::risc16();
        // "add" prefix wins over the label rule
        assert_eq!(g.classify("address:"), Some(TokenKind::Instr));
        assert_eq!(g.classify("//halt"), Some(TokenKind::Comment));
        assert_eq!(g.classify("start: add r1, r1, r1"), Some(TokenKind::Label));
    }

    #[test]
    fn case_folding_is_ascii_only() {
        let g = Grammar::risc16();
        assert_eq!(g.classify("SW r1, r2, 0"), Some(TokenKind::Instr));
        // U+017F folds to `s` only under Unicode rules
        assert_eq!(g.classify("ſw r1, r2, 0"), None);
    }

    #[test]
    fn every_mnemonic_is_recognised() {
        let g = Grammar::risc16();
        for m in MNEMONICS {
            assert_eq!(g.classify(m), Some(TokenKind::Instr), "{}", m);
            assert_eq!(g.classify(&m.to_uppercase()), Some(TokenKind::Instr), "{}", m);
        }
    }

    #[test]
    fn config_lists_rules_in_order() {
        let cfg = serde_json::to_value(Grammar::risc16().to_config()).unwrap();
        let names: Vec<_> = cfg["patterns"]
            .as_array()
            .unwrap()
            .iter()
            .map(|p| p["name"].as_str().unwrap().to_string())
            .collect();
        assert_eq!(names, vec!["comment", "instr", "label"]);
        assert!(cfg["patterns"][1]["match"].as_str().unwrap().ends_with("/i"));
    }

    #[test]
    fn markup_highlighter_wraps_matches() {
        let mut doc = Document::new();
        let mut el = Element::new("pre");
        el.set_text_content("// init\nmovi r1, 3\nloop:\nmov r1");
        doc.insert("code_result", el);

        MarkupHighlighter::new("code_result")
            .highlight(&mut doc, Grammar::risc16())
            .unwrap();
        assert_eq!(
            doc.element("code_result").unwrap().inner_html(),
            "<span class=\"comment\">// init</span>\n\
             <span class=\"instr\">movi</span> r1, 3\n\
             <span class=\"label\">loop:</span>\n\
             mov r1"
        );
    }

    #[test]
    fn markup_highlighter_skips_missing_target() {
        let mut doc = Document::new();
        assert!(MarkupHighlighter::new("code_result")
            .highlight(&mut doc, Grammar::risc16())
            .is_ok());
    }
}
