//! User-visible notification and connectivity seams
//!
//! Degradation policy in the services raises non-blocking notices through
//! `Notifier` instead of surfacing errors to callers; the host application
//! decides how to render them (toast, status bar, log). `ConnectivityProbe`
//! lets the services skip network I/O while the client is known offline.

use std::sync::atomic::{AtomicBool, Ordering};

/// Severity of a user-visible notice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NoticeKind {
    Error,
    Info,
}

/// Optional remediation offered with a notice: a labelled action that
/// navigates to a route in the host application
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct NoticeAction {
    pub label: String,
    pub route: String,
}

/// A non-blocking, user-visible message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Notice {
    pub kind: NoticeKind,
    pub message: String,
    pub action: Option<NoticeAction>,
}

impl Notice {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Error,
            message: message.into(),
            action: None,
        }
    }

    pub fn info(message: impl Into<String>) -> Self {
        Self {
            kind: NoticeKind::Info,
            message: message.into(),
            action: None,
        }
    }

    pub fn with_action(mut self, label: impl Into<String>, route: impl Into<String>) -> Self {
        self.action = Some(NoticeAction {
            label: label.into(),
            route: route.into(),
        });
        self
    }
}

/// Side channel for user-visible degradation messages
pub trait Notifier: Send + Sync {
    fn notify(&self, notice: Notice);
}

/// Notifier that writes notices to the log; the default when the host
/// application does not supply one
#[derive(Debug, Default)]
pub struct LogNotifier;

impl Notifier for LogNotifier {
    fn notify(&self, notice: Notice) {
        match notice.kind {
            NoticeKind::Error => tracing::warn!(message = %notice.message, "notice"),
            NoticeKind::Info => tracing::info!(message = %notice.message, "notice"),
        }
    }
}

/// Online/offline status source
pub trait ConnectivityProbe: Send + Sync {
    fn is_online(&self) -> bool;
}

/// Probe that always reports online
#[derive(Debug, Default)]
pub struct AlwaysOnline;

impl ConnectivityProbe for AlwaysOnline {
    fn is_online(&self) -> bool {
        true
    }
}

/// Probe backed by a settable flag, for hosts that track connectivity
/// themselves (and for tests)
#[derive(Debug)]
pub struct SharedConnectivity {
    online: AtomicBool,
}

impl SharedConnectivity {
    pub fn new(online: bool) -> Self {
        Self {
            online: AtomicBool::new(online),
        }
    }

    pub fn set_online(&self, online: bool) {
        self.online.store(online, Ordering::SeqCst);
    }
}

impl ConnectivityProbe for SharedConnectivity {
    fn is_online(&self) -> bool {
        self.online.load(Ordering::SeqCst)
    }
}
