//! Text flattening
//!
//! Projects the OCR hierarchy into an ordered list of paragraphs with
//! their text and character-offset range. Offsets are a zero-based
//! document-wide counter over Unicode scalar values; paragraphs follow
//! each other directly, with no separator counted between them.

use crate::ocr::{OcrPage, OcrParagraph};

/// A paragraph with its position in the flattened document text
#[derive(Debug, Clone)]
pub struct FlatParagraph<'a> {
    /// Index of the owning page within the OCR result
    pub page_index: usize,
    pub paragraph: &'a OcrParagraph,
    /// The paragraph's words joined by single spaces
    pub text: String,
    /// First character offset covered by this paragraph
    pub start: usize,
    /// One past the last character offset (start of the next paragraph)
    pub end: usize,
}

/// Flatten every page in order. Recomputed on each call; the OCR input is
/// never mutated.
pub fn flatten(pages: &[OcrPage]) -> Vec<FlatParagraph<'_>> {
    let mut flattened = Vec::new();
    let mut cursor = 0;

    for (page_index, page) in pages.iter().enumerate() {
        for paragraph in &page.paragraphs {
            let text = paragraph_text(paragraph);
            let end = cursor + text.chars().count();
            flattened.push(FlatParagraph {
                page_index,
                paragraph,
                text,
                start: cursor,
                end,
            });
            cursor = end;
        }
    }

    flattened
}

/// All of a paragraph's words joined with single spaces, lines in order.
pub fn paragraph_text(paragraph: &OcrParagraph) -> String {
    paragraph
        .lines
        .iter()
        .flat_map(|line| line.words.iter())
        .map(|word| word.text.as_str())
        .collect::<Vec<_>>()
        .join(" ")
}

/// Total character count of the flattened document (the exclusive upper
/// bound of valid offsets).
pub fn max_position(pages: &[OcrPage]) -> usize {
    flatten(pages).last().map(|par| par.end).unwrap_or(0)
}
