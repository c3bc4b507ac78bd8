pub mod renderer;
pub mod types;

pub use renderer::{DocumentHandle, DocumentRenderer, LopdfRenderer};
#[cfg(test)]
pub use renderer::testing;
pub use types::{DrawRect, HighlightColor, PageGeometry, RenderError};
