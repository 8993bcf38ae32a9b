use comrak::nodes::{AstNode, NodeValue};
use comrak::options::Options;
use comrak::{Arena, parse_document};

/// Block-level node of a narration script, in document order.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum MarkupNode {
    /// Heading of any level, inline text flattened.
    Heading {
        /// Flattened heading text.
        text: String,
    },
    /// Paragraph as its inline text runs in document order.
    Paragraph {
        /// Text runs; the paragraph text is their concatenation.
        runs: Vec<String>,
    },
    /// Fenced (or indented) code block.
    Code {
        /// Source text exactly as written inside the fence.
        source: String,
        /// Info-string language tag, possibly empty.
        language: String,
    },
}

/// Parse a script document into its top-level block nodes.
///
/// A leading `---` front matter block is recognised by the parser and dropped. Block kinds other
/// than headings, paragraphs and code blocks (lists, quotes, tables, ...) are skipped.
pub fn parse_markup(document: &str) -> Vec<MarkupNode> {
    let arena = Arena::new();
    let mut options = Options::default();
    options.extension.front_matter_delimiter = Some("---".to_string());
    let root = parse_document(&arena, document, &options);

    let mut nodes = Vec::new();
    for child in root.children() {
        if let Some(node) = block_node(child) {
            nodes.push(node);
        }
    }
    nodes
}

fn block_node<'a>(node: &'a AstNode<'a>) -> Option<MarkupNode> {
    let data = node.data.borrow();
    match &data.value {
        NodeValue::Heading(_) => Some(MarkupNode::Heading {
            text: inline_runs(node).concat(),
        }),
        NodeValue::Paragraph => Some(MarkupNode::Paragraph {
            runs: inline_runs(node),
        }),
        NodeValue::CodeBlock(block) => Some(MarkupNode::Code {
            source: block.literal.to_string(),
            language: block
                .info
                .split_whitespace()
                .next()
                .unwrap_or_default()
                .to_string(),
        }),
        NodeValue::FrontMatter(_) => None,
        _ => None,
    }
}

fn inline_runs<'a>(node: &'a AstNode<'a>) -> Vec<String> {
    fn walk<'a>(node: &'a AstNode<'a>, runs: &mut Vec<String>) {
        {
            let data = node.data.borrow();
            match &data.value {
                NodeValue::Text(text) => runs.push(text.to_string()),
                NodeValue::Code(code) => runs.push(code.literal.to_string()),
                NodeValue::LineBreak | NodeValue::SoftBreak => runs.push(" ".to_string()),
                _ => {}
            }
        }
        for child in node.children() {
            walk(child, runs);
        }
    }

    let mut runs = Vec::new();
    for child in node.children() {
        walk(child, &mut runs);
    }
    runs
}

#[cfg(test)]
#[path = "../../tests/unit/script/markup.rs"]
mod tests;
