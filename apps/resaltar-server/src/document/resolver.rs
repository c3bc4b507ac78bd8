//! Offset resolver
//!
//! Maps a document-wide character offset back to the paragraph that owns
//! it, using the flattened offset ranges.

use super::flatten::{flatten, FlatParagraph};
use crate::ocr::OcrPage;

/// Resolve `position` to its owning paragraph.
///
/// The first paragraph whose end offset lies strictly beyond `position`
/// wins; an offset equal to a paragraph's end belongs to the next one.
/// Positions at or past the end of the document resolve to `None`.
pub fn resolve_offset(pages: &[OcrPage], position: usize) -> Option<FlatParagraph<'_>> {
    flatten(pages).into_iter().find(|par| position < par.end)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::flatten::fixtures::pages;
    use crate::document::flatten::max_position;

    #[test]
    fn test_every_position_resolves_to_its_covering_paragraph() {
        let pages = pages(&[&[&["alpha", "beta"], &["gamma"]], &[&["delta"]]]);

        for position in 0..max_position(&pages) {
            let flat = resolve_offset(&pages, position)
                .unwrap_or_else(|| panic!("position {} did not resolve", position));
            assert!(
                flat.start <= position && position < flat.end,
                "position {} resolved to range {}..{}",
                position,
                flat.start,
                flat.end
            );
        }
    }

    #[test]
    fn test_boundary_offset_belongs_to_next_paragraph() {
        // "alpha beta" covers 0..10, "gamma" covers 10..15
        let pages = pages(&[&[&["alpha", "beta"], &["gamma"]]]);

        let at_nine = resolve_offset(&pages, 9).unwrap();
        assert_eq!(at_nine.text, "alpha beta");

        let at_ten = resolve_offset(&pages, 10).unwrap();
        assert_eq!(at_ten.text, "gamma");
    }

    #[test]
    fn test_positions_at_or_past_the_end_resolve_to_none() {
        let pages = pages(&[&[&["alpha", "beta"], &["gamma"]]]);
        let max = max_position(&pages);

        assert!(resolve_offset(&pages, max).is_none());
        assert!(resolve_offset(&pages, max + 100).is_none());
    }

    #[test]
    fn test_resolution_crosses_pages() {
        let pages = pages(&[&[&["one"]], &[&["two"]]]);

        let flat = resolve_offset(&pages, 4).unwrap();
        assert_eq!(flat.page_index, 1);
        assert_eq!(flat.text, "two");
    }

    #[test]
    fn test_empty_document_resolves_nothing() {
        assert!(resolve_offset(&[], 0).is_none());
    }
}
