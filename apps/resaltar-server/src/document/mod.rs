pub mod error;
pub mod flatten;
pub mod geometry;
pub mod highlighter;
pub mod matcher;
pub mod resolver;
pub mod store;

pub use error::DocumentError;
pub use flatten::{flatten, max_position, FlatParagraph};
pub use matcher::{match_phrase, PhraseMatch};
pub use resolver::resolve_offset;
pub use store::{DocumentStatus, DocumentStatusView, DocumentStore, SearchOutcome, SeekOutcome};
