use crate::foundation::error::{ScriptcastError, ScriptcastResult};
use crate::script::language::extension_for_language;
use crate::script::markup::MarkupNode;

/// One unit of playback, in script order.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Segment {
    /// Title card.
    Heading {
        /// Heading text; `": "` separators are already turned into line breaks.
        text: String,
    },
    /// Spoken paragraph shown as a caption.
    Narration {
        /// Paragraph text.
        text: String,
    },
    /// Source code screenshot narrated by the paragraph that introduced it.
    Code(CodeSegment),
}

/// A code block paired with its caption paragraph.
#[derive(Clone, Debug, PartialEq, Eq, serde::Serialize, serde::Deserialize)]
pub struct CodeSegment {
    /// Text of the paragraph immediately preceding the code block.
    pub narration: String,
    /// Code block contents.
    pub source: String,
    /// Language tag from the code fence.
    pub language: String,
    /// File extension mapped from `language` (`""` when unknown).
    pub extension: String,
}

impl Segment {
    /// Short lowercase name, used in logs.
    pub fn kind_name(&self) -> &'static str {
        match self {
            Segment::Heading { .. } => "heading",
            Segment::Narration { .. } => "narration",
            Segment::Code(_) => "code",
        }
    }
}

enum Pending {
    Empty,
    Narration(String),
}

/// Fold markup nodes into segments.
///
/// A paragraph is held back until the next node shows whether it captions a code block. A code
/// block takes the held paragraph as its narration; with nothing held (script start, after a
/// heading, or right after another code block) the script is malformed.
pub fn extract_segments(nodes: &[MarkupNode]) -> ScriptcastResult<Vec<Segment>> {
    let mut segments = Vec::with_capacity(nodes.len());
    let mut pending = Pending::Empty;

    for (index, node) in nodes.iter().enumerate() {
        match node {
            MarkupNode::Heading { text } => {
                flush(&mut pending, &mut segments);
                segments.push(Segment::Heading {
                    text: text.replace(": ", "\n"),
                });
            }
            MarkupNode::Paragraph { runs } => {
                flush(&mut pending, &mut segments);
                pending = Pending::Narration(runs.concat());
            }
            MarkupNode::Code { source, language } => {
                let Pending::Narration(narration) = std::mem::replace(&mut pending, Pending::Empty)
                else {
                    return Err(ScriptcastError::malformed(format!(
                        "code block #{index} ({}) must be preceded by a caption paragraph",
                        if language.is_empty() { "untagged" } else { language }
                    )));
                };
                segments.push(Segment::Code(CodeSegment {
                    narration,
                    source: source.clone(),
                    language: language.clone(),
                    extension: extension_for_language(language).to_string(),
                }));
            }
        }
    }
    flush(&mut pending, &mut segments);

    Ok(segments)
}

fn flush(pending: &mut Pending, segments: &mut Vec<Segment>) {
    if let Pending::Narration(text) = std::mem::replace(pending, Pending::Empty) {
        segments.push(Segment::Narration { text });
    }
}

#[cfg(test)]
#[path = "../../tests/unit/script/segment.rs"]
mod tests;
