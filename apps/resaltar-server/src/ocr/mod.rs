pub mod memo;
pub mod provider;
pub mod service;
pub mod types;

pub use provider::OcrProviderTrait;
pub use service::{OcrService, ProviderStatus};
pub use types::{
    BoundingBox, OcrError, OcrLine, OcrPage, OcrParagraph, OcrProvider, OcrWord, PageDimensions,
};
