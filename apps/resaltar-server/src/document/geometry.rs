//! Coordinate mapping
//!
//! OCR boxes live in the raster-pixel space of the page image; the
//! renderer reports page geometry in its own units. The two differ per
//! page and per axis, so every box is rescaled independently in x and y.

use crate::ocr::{BoundingBox, PageDimensions};
use crate::pdf::{DrawRect, PageGeometry};

/// Per-axis ratio between OCR pixels and renderer units
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Scale {
    pub x: f64,
    pub y: f64,
}

pub fn page_scale(ocr: PageDimensions, renderer: PageGeometry) -> Scale {
    Scale {
        x: ocr.width / renderer.width,
        y: ocr.height / renderer.height,
    }
}

/// Map an OCR box into renderer space.
///
/// The result is anchored at the box's top-left corner, with `y` measured
/// downward from the page's top edge. Raster boxes have `bottom > top`,
/// so the mapped height `top' - bottom'` comes out negative and the
/// rectangle extends downward from the anchor.
pub fn map_box(bbox: BoundingBox, scale: Scale) -> DrawRect {
    let left = bbox.left / scale.x;
    let right = bbox.right / scale.x;
    let top = bbox.top / scale.y;
    let bottom = bbox.bottom / scale.y;

    DrawRect {
        x: left,
        y: top,
        width: right - left,
        height: top - bottom,
    }
}
