//! Client-side orchestration for a remote machine-translation service
//!
//! Runs interactive translation requests without duplicate in-flight
//! work, starts/resumes/polls/cancels long-running build jobs, and
//! packages generated drafts for download. The remote service does the
//! actual translating and training; this crate owns the coordination,
//! retry-by-polling, and degradation policy around it.

pub mod api;
pub mod notify;
pub mod services;
pub mod transport;

pub use api::MachineApi;
pub use notify::{
    AlwaysOnline, ConnectivityProbe, LogNotifier, Notice, NoticeAction, NoticeKind, Notifier,
    SharedConnectivity,
};
pub use services::{
    BuildOrchestrator, BuildPoller, BuildProgressStream, DiskFileSaver, DraftArchiveAssembler,
    DraftBookSource, DraftProgress, EmptyBookSource, FileSaver, InteractiveTranslator, ProjectRef,
    WordGraphService,
};
pub use transport::{HttpResponse, HttpTransport, Transport};
