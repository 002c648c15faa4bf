//! Shared test doubles: scripted transport, recording notifier/saver

#![allow(dead_code)]

use async_trait::async_trait;
use mtc_common::{Error, Result};
use mtc_engine::notify::{Notice, Notifier};
use mtc_engine::services::draft_archive::FileSaver;
use mtc_engine::transport::{HttpResponse, Transport};
use serde_json::Value;
use std::collections::VecDeque;
use std::sync::Mutex;
use std::time::Duration;

/// One scripted response
#[derive(Debug, Clone)]
pub enum Canned {
    /// 200 with a JSON body
    Ok(Value),
    /// 200 with no body (commands)
    NoContent,
    /// Non-success status
    Status(u16, &'static str),
    /// No HTTP response at all
    Network(&'static str),
}

impl Canned {
    fn serve(&self) -> Result<HttpResponse> {
        match self {
            Canned::Ok(value) => Ok(HttpResponse {
                status: 200,
                data: Some(value.clone()),
            }),
            Canned::NoContent => Ok(HttpResponse {
                status: 200,
                data: None,
            }),
            Canned::Status(status, message) => Err(Error::Http {
                status: *status,
                message: message.to_string(),
            }),
            Canned::Network(message) => Err(Error::Network(message.to_string())),
        }
    }
}

struct Rule {
    method: &'static str,
    path_prefix: String,
    queue: VecDeque<Canned>,
}

/// Transport that serves scripted responses and records every call
///
/// Responses for a rule are served in order; the final response of a
/// queue is sticky, so a one-element queue answers every matching call.
#[derive(Default)]
pub struct MockTransport {
    rules: Mutex<Vec<Rule>>,
    calls: Mutex<Vec<String>>,
    delay: Option<Duration>,
}

impl MockTransport {
    pub fn new() -> Self {
        Self::default()
    }

    /// Every request sleeps this long before answering, so tests can hold
    /// several requests in flight at once
    pub fn with_delay(delay_ms: u64) -> Self {
        Self {
            delay: Some(Duration::from_millis(delay_ms)),
            ..Self::default()
        }
    }

    /// Script responses for calls whose path starts with `path_prefix`.
    /// Rules are matched in registration order; register the more
    /// specific prefix first.
    pub fn on(&self, method: &'static str, path_prefix: &str, responses: Vec<Canned>) {
        assert!(!responses.is_empty(), "rule needs at least one response");
        self.rules.lock().unwrap().push(Rule {
            method,
            path_prefix: path_prefix.to_string(),
            queue: responses.into(),
        });
    }

    /// Recorded calls, as `"METHOD path"` (plus the JSON body for POSTs)
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count_with(&self, fragment: &str) -> usize {
        self.calls()
            .iter()
            .filter(|call| call.contains(fragment))
            .count()
    }

    fn serve(&self, method: &'static str, path: &str, body: Option<&Value>) -> Result<HttpResponse> {
        let call = match body {
            Some(body) => format!("{} {} {}", method, path, body),
            None => format!("{} {}", method, path),
        };
        self.calls.lock().unwrap().push(call);

        let mut rules = self.rules.lock().unwrap();
        for rule in rules.iter_mut() {
            if rule.method == method && path.starts_with(&rule.path_prefix) {
                let canned = if rule.queue.len() > 1 {
                    rule.queue.pop_front().unwrap()
                } else {
                    rule.queue.front().cloned().unwrap()
                };
                return canned.serve();
            }
        }
        panic!("no scripted response for {} {}", method, path);
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn get(&self, path: &str) -> Result<HttpResponse> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.serve("GET", path, None)
    }

    async fn post(&self, path: &str, body: Option<Value>) -> Result<HttpResponse> {
        if let Some(delay) = self.delay {
            tokio::time::sleep(delay).await;
        }
        self.serve("POST", path, body.as_ref())
    }
}

/// Notifier that records every notice
#[derive(Default)]
pub struct RecordingNotifier {
    notices: Mutex<Vec<Notice>>,
}

impl RecordingNotifier {
    pub fn notices(&self) -> Vec<Notice> {
        self.notices.lock().unwrap().clone()
    }

    pub fn messages(&self) -> Vec<String> {
        self.notices().into_iter().map(|n| n.message).collect()
    }
}

impl Notifier for RecordingNotifier {
    fn notify(&self, notice: Notice) {
        self.notices.lock().unwrap().push(notice);
    }
}

/// File saver that records saved archives instead of touching disk
#[derive(Default)]
pub struct RecordingFileSaver {
    files: Mutex<Vec<(String, Vec<u8>)>>,
}

impl RecordingFileSaver {
    pub fn saved(&self) -> Vec<(String, Vec<u8>)> {
        self.files.lock().unwrap().clone()
    }
}

impl FileSaver for RecordingFileSaver {
    fn save_file(&self, file_name: &str, contents: &[u8]) -> Result<()> {
        self.files
            .lock()
            .unwrap()
            .push((file_name.to_string(), contents.to_vec()));
        Ok(())
    }
}
