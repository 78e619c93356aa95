//! Document structure analysis and structure-aware chunking
//!
//! Text is scanned line by line into headings, list items and paragraphs,
//! each tagged with the section it sits in. Long texts are packed into
//! chunks at block boundaries, and each new chunk is seeded with a short
//! tail of the previous one so statements spanning a cut keep their context.

use crate::config::ExtractorConfig;
use regex::Regex;
use std::sync::LazyLock;

static HEADING: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(#+)\s+(.*)$").expect("heading pattern is valid"));

static LIST_ITEM: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^(\s*)(?:[-*+]|\d+\.)\s+(.*)$").expect("list item pattern is valid")
});

static LIST_MARKER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^(?:[-*+]|\d+\.)\s+").expect("list marker pattern is valid"));

/// Kind of a structural block
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockKind {
    /// A `#`-prefixed heading line
    Heading,
    /// A bullet or numbered list entry, possibly spanning lines
    ListItem,
    /// A run of plain lines
    Paragraph,
}

/// One structural unit of a document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Block {
    /// Heading, list item or paragraph
    pub kind: BlockKind,

    /// Source lines, in order
    pub lines: Vec<String>,

    /// Heading depth or list nesting level; `None` for paragraphs
    pub level: Option<usize>,

    /// Heading text; `None` for other kinds
    pub title: Option<String>,

    /// `" - "`-joined titles of the enclosing headings
    pub section_title: String,

    /// Depth of the innermost enclosing heading, 0 before any heading
    pub section_level: usize,
}

impl Block {
    /// The block's lines joined with newlines
    pub fn content(&self) -> String {
        self.lines.join("\n")
    }

    /// Length of [`content`](Self::content) in characters
    pub fn char_len(&self) -> usize {
        let line_chars: usize = self.lines.iter().map(|l| l.chars().count()).sum();
        line_chars + self.lines.len().saturating_sub(1)
    }
}

/// A chunk of blocks plus the overlap carried over from its predecessor
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Chunk {
    /// Trailing lines of the previous chunk, in original order
    pub overlap: Vec<String>,

    /// Whole blocks owned by this chunk
    pub blocks: Vec<Block>,
}

impl Chunk {
    /// The owned blocks separated by blank lines
    pub fn body(&self) -> String {
        self.blocks
            .iter()
            .map(Block::content)
            .collect::<Vec<_>>()
            .join("\n\n")
    }

    /// Overlap followed by body, as sent to the oracle
    pub fn text(&self) -> String {
        if self.overlap.is_empty() {
            self.body()
        } else {
            format!("{}\n\n{}", self.overlap.join("\n"), self.body())
        }
    }
}

/// Analyzes document structure and chunks long documents
#[derive(Debug, Clone)]
pub struct StructureAnalyzer {
    chunk_size: usize,
    chunk_overlap: usize,
}

impl StructureAnalyzer {
    /// Create an analyzer with explicit chunk bounds (characters)
    pub fn new(chunk_size: usize, chunk_overlap: usize) -> Self {
        Self {
            chunk_size,
            chunk_overlap,
        }
    }

    /// Create an analyzer from extractor configuration
    pub fn from_config(config: &ExtractorConfig) -> Self {
        Self::new(config.chunk_size, config.chunk_overlap)
    }

    /// Scan `text` into ordered blocks
    ///
    /// # Examples
    ///
    /// ```
    /// use pairaudit_extractor::{BlockKind, StructureAnalyzer};
    ///
    /// let analyzer = StructureAnalyzer::new(4000, 200);
    /// let blocks = analyzer.analyze("# Rules\n## Reports\n- Submit weekly\n");
    /// assert_eq!(blocks[2].kind, BlockKind::ListItem);
    /// assert_eq!(blocks[2].section_title, "Rules - Reports");
    /// ```
    pub fn analyze(&self, text: &str) -> Vec<Block> {
        let lines: Vec<&str> = text.lines().collect();
        let mut blocks = Vec::new();
        let mut stack: Vec<(usize, String)> = Vec::new();
        let mut section_title = String::new();
        let mut section_level = 0;

        let mut i = 0;
        while i < lines.len() {
            let raw = lines[i];
            let trimmed = raw.trim();

            if trimmed.is_empty() {
                i += 1;
                continue;
            }

            if let Some(caps) = HEADING.captures(trimmed) {
                let level = caps[1].len();
                let title = caps[2].trim().to_string();

                while stack.last().is_some_and(|(l, _)| *l >= level) {
                    stack.pop();
                }
                stack.push((level, title.clone()));
                section_title = stack
                    .iter()
                    .map(|(_, t)| t.as_str())
                    .collect::<Vec<_>>()
                    .join(" - ");
                section_level = level;

                blocks.push(Block {
                    kind: BlockKind::Heading,
                    lines: vec![trimmed.to_string()],
                    level: Some(level),
                    title: Some(title),
                    section_title: section_title.clone(),
                    section_level,
                });
                i += 1;
                continue;
            }

            if let Some(caps) = LIST_ITEM.captures(raw) {
                let indent = caps[1].chars().count();
                let mut j = i + 1;
                while j < lines.len() {
                    let next = lines[j];
                    let next_trimmed = next.trim();
                    if next_trimmed.is_empty()
                        || is_structural(next_trimmed)
                        || leading_whitespace(next) < indent
                    {
                        break;
                    }
                    j += 1;
                }

                blocks.push(Block {
                    kind: BlockKind::ListItem,
                    lines: lines[i..j].iter().map(|l| l.trim_end().to_string()).collect(),
                    level: Some(indent / 2 + 1),
                    title: None,
                    section_title: section_title.clone(),
                    section_level,
                });
                i = j;
                continue;
            }

            let mut j = i + 1;
            while j < lines.len() {
                let next_trimmed = lines[j].trim();
                if next_trimmed.is_empty() || is_structural(next_trimmed) {
                    break;
                }
                j += 1;
            }

            blocks.push(Block {
                kind: BlockKind::Paragraph,
                lines: lines[i..j].iter().map(|l| l.trim_end().to_string()).collect(),
                level: None,
                title: None,
                section_title: section_title.clone(),
                section_level,
            });
            i = j;
        }

        blocks
    }

    /// Whether `text` exceeds the chunk size
    pub fn should_chunk_text(&self, text: &str) -> bool {
        text.chars().count() > self.chunk_size
    }

    /// Pack the blocks of `text` into overlapping chunks
    ///
    /// Blocks are never split. A chunk is closed when the next block would
    /// push it past the chunk size; a single block larger than the chunk
    /// size gets a chunk of its own.
    pub fn chunk_blocks(&self, text: &str) -> Vec<Chunk> {
        let mut chunks = Vec::new();
        let mut overlap: Vec<String> = Vec::new();
        let mut blocks: Vec<Block> = Vec::new();
        let mut current_len = 0;

        for block in self.analyze(text) {
            let block_len = block.char_len();
            let separator = if current_len > 0 { 2 } else { 0 };

            if !blocks.is_empty() && current_len + separator + block_len > self.chunk_size {
                let closed = Chunk {
                    overlap: std::mem::take(&mut overlap),
                    blocks: std::mem::take(&mut blocks),
                };
                overlap = self.overlap_tail(&closed);
                current_len = joined_len(&overlap);
                chunks.push(closed);
            }

            let separator = if current_len > 0 { 2 } else { 0 };
            current_len += separator + block_len;
            blocks.push(block);
        }

        if !blocks.is_empty() {
            chunks.push(Chunk { overlap, blocks });
        }

        chunks
    }

    /// Chunk `text` into oracle-sized strings
    pub fn chunk_text(&self, text: &str) -> Vec<String> {
        self.chunk_blocks(text).iter().map(Chunk::text).collect()
    }

    /// Trailing lines of a chunk's body, at most `chunk_overlap` characters
    fn overlap_tail(&self, chunk: &Chunk) -> Vec<String> {
        if self.chunk_overlap == 0 {
            return Vec::new();
        }

        let lines: Vec<&String> = chunk
            .blocks
            .iter()
            .flat_map(|b| b.lines.iter())
            .filter(|l| !l.trim().is_empty())
            .collect();

        let mut tail: Vec<String> = Vec::new();
        let mut taken = 0;
        for line in lines.into_iter().rev() {
            let line_len = line.chars().count();
            let cost = if tail.is_empty() { line_len } else { line_len + 1 };

            if taken + cost <= self.chunk_overlap {
                tail.push(line.clone());
                taken += cost;
                continue;
            }
            if tail.is_empty() {
                // Last line alone is too long: keep only its end
                let skip = line_len - self.chunk_overlap;
                tail.push(line.chars().skip(skip).collect());
            }
            break;
        }

        tail.reverse();
        tail
    }

    /// Digest of the block structure used to steer extraction prompts
    pub fn create_structure_summary(blocks: &[Block]) -> String {
        let mut summary = String::from("The document has the following structure:\n\n");

        let headings: Vec<&Block> = blocks.iter().filter(|b| b.kind == BlockKind::Heading).collect();
        if !headings.is_empty() {
            summary.push_str("## Heading outline\n");
            for heading in headings {
                let level = heading.level.unwrap_or(1);
                summary.push_str(&format!(
                    "{}- {}\n",
                    "  ".repeat(level.saturating_sub(1)),
                    heading.title.as_deref().unwrap_or_default()
                ));
            }
            summary.push('\n');
        }

        let list_items = blocks.iter().filter(|b| b.kind == BlockKind::ListItem).count();
        if list_items > 0 {
            summary.push_str("## List items\n");
            summary.push_str(&format!("The document contains {} list items.\n", list_items));
            summary.push_str("Extract list items in the context of the heading they belong to.\n\n");
        }

        let paragraphs = blocks.iter().filter(|b| b.kind == BlockKind::Paragraph).count();
        if paragraphs > 0 {
            summary.push_str("## Paragraphs\n");
            summary.push_str(&format!("The document contains {} paragraphs.\n", paragraphs));
            summary.push_str("Extract paragraphs in the context of the heading they belong to.\n");
        }

        summary
    }
}

impl Default for StructureAnalyzer {
    fn default() -> Self {
        Self::from_config(&ExtractorConfig::default())
    }
}

fn is_structural(trimmed: &str) -> bool {
    HEADING.is_match(trimmed) || LIST_MARKER.is_match(trimmed)
}

fn leading_whitespace(line: &str) -> usize {
    line.chars().take_while(|c| c.is_whitespace()).count()
}

fn joined_len(lines: &[String]) -> usize {
    let chars: usize = lines.iter().map(|l| l.chars().count()).sum();
    chars + lines.len().saturating_sub(1)
}
