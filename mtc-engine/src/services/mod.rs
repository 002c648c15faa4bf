//! Stateful services over the remote translation API

pub mod build_poller;
pub mod draft_archive;
pub mod interactive;
pub mod orchestrator;
pub mod word_graph;

pub use build_poller::{BuildPoller, BuildProgressStream};
pub use draft_archive::{
    DiskFileSaver, DraftArchiveAssembler, DraftBookSource, DraftProgress, EmptyBookSource,
    FileSaver, ProjectRef,
};
pub use interactive::InteractiveTranslator;
pub use orchestrator::BuildOrchestrator;
pub use word_graph::WordGraphService;
