//! Highlight renderer
//!
//! Applies the coordinate mapper to matches or a resolved paragraph and
//! draws the translucent rectangles onto the output document. Pages are
//! addressed by OCR page index; the renderer reports its own geometry per
//! page, so an OCR/renderer page-count mismatch surfaces here.

use super::error::DocumentError;
use super::flatten::FlatParagraph;
use super::geometry::{map_box, page_scale};
use super::matcher::PhraseMatch;
use crate::ocr::OcrPage;
use crate::pdf::{DocumentHandle, HighlightColor};

pub const HIGHLIGHT_COLOR: HighlightColor = HighlightColor::rgb(1.0, 1.0, 0.0);
pub const HIGHLIGHT_OPACITY: f32 = 0.5;

/// Draw one rectangle per matched word.
pub fn draw_word_highlights(
    handle: &mut dyn DocumentHandle,
    pages: &[OcrPage],
    matches: &[PhraseMatch<'_>],
) -> Result<(), DocumentError> {
    for matched in matches {
        let page = pages
            .get(matched.page_index)
            .ok_or(DocumentError::PageIndexOutOfRange {
                page: matched.page_index,
                page_count: pages.len(),
            })?;
        let geometry = handle.page_geometry(matched.page_index)?;
        let scale = page_scale(page.dims, geometry);

        for word in &matched.words {
            handle.draw_rectangle(
                matched.page_index,
                map_box(word.bbox, scale),
                HIGHLIGHT_COLOR,
                HIGHLIGHT_OPACITY,
            )?;
        }
    }
    Ok(())
}

/// Draw one rectangle covering the resolved paragraph.
pub fn draw_paragraph_highlight(
    handle: &mut dyn DocumentHandle,
    pages: &[OcrPage],
    flat: &FlatParagraph<'_>,
) -> Result<(), DocumentError> {
    let page = pages
        .get(flat.page_index)
        .ok_or(DocumentError::PageIndexOutOfRange {
            page: flat.page_index,
            page_count: pages.len(),
        })?;
    let geometry = handle.page_geometry(flat.page_index)?;
    let scale = page_scale(page.dims, geometry);

    handle.draw_rectangle(
        flat.page_index,
        map_box(flat.paragraph.bbox, scale),
        HIGHLIGHT_COLOR,
        HIGHLIGHT_OPACITY,
    )?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::document::flatten::fixtures::pages;
    use crate::document::matcher::match_phrase;
    use crate::document::resolver::resolve_offset;
    use crate::pdf::testing::RecordingHandle;

    #[test]
    fn test_one_rectangle_per_matched_word() {
        let pages = pages(&[&[&["hidden", "treasure", "elsewhere"]]]);
        let matches = match_phrase(&pages, "hidden treasure");
        let mut handle = RecordingHandle::with_pages(1);

        draw_word_highlights(&mut handle, &pages, &matches).unwrap();

        let draws = handle.draws();
        assert_eq!(draws.len(), 2);
        assert!(draws.iter().all(|draw| draw.page == 0));
        assert!(draws.iter().all(|draw| draw.opacity == HIGHLIGHT_OPACITY));
    }

    #[test]
    fn test_paragraph_highlight_uses_paragraph_box() {
        let pages = pages(&[&[&["solo"]]]);
        let flat = resolve_offset(&pages, 0).unwrap();
        let mut handle = RecordingHandle::with_pages(1);

        draw_paragraph_highlight(&mut handle, &pages, &flat).unwrap();

        let draws = handle.draws();
        assert_eq!(draws.len(), 1);
        // fixture paragraphs span 0,0..100,40 on a 1000x1400 raster over
        // a 100x140 page: scale 10 in both axes
        assert_eq!(draws[0].rect.x, 0.0);
        assert_eq!(draws[0].rect.y, 0.0);
        assert_eq!(draws[0].rect.width, 10.0);
        assert_eq!(draws[0].rect.height, -4.0);
    }

    #[test]
    fn test_renderer_page_mismatch_is_reported() {
        // two OCR pages, single-page renderer output
        let pages = pages(&[&[&["uno"]], &[&["dos"]]]);
        let matches = match_phrase(&pages, "dos");
        let mut handle = RecordingHandle::with_pages(1);

        let err = draw_word_highlights(&mut handle, &pages, &matches).unwrap_err();
        assert!(matches!(
            err,
            DocumentError::PageIndexOutOfRange {
                page: 1,
                page_count: 1
            }
        ));
    }
}
