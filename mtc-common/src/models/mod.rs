//! Domain models shared across the MTC crates

pub mod books;
pub mod build;
pub mod translation;
pub mod word_graph;

pub use books::{book_code, book_number, BookRef};
pub use build::{
    BuildConfig, BuildJob, BuildProvenance, BuildState, EngineStats, TranslationRange,
    START_ACTIVE_STATES,
};
pub use translation::{Phrase, TranslationResult};
pub use word_graph::{TranslationSources, WordAlignmentMatrix, WordGraph, WordGraphArc};
