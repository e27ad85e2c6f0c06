//! Scripted network double shared by router and lifecycle tests.

use std::collections::HashMap;
use std::sync::Mutex;

use freshgate_core::{Error, RequestRecord, ResponseRecord};

use crate::fetch::Network;

/// Answers requests from a script keyed by `METHOD URL`.
///
/// Each key holds a queue; the last queued answer repeats once the queue is
/// down to one item. Unscripted requests fail like a refused connection.
#[derive(Default)]
pub struct ScriptedNetwork {
    script: Mutex<HashMap<String, Vec<Result<ResponseRecord, String>>>>,
    calls: Mutex<Vec<RequestRecord>>,
}

impl ScriptedNetwork {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn respond(self, method: &str, url: &str, response: ResponseRecord) -> Self {
        self.push(method, url, Ok(response));
        self
    }

    pub fn fail(self, method: &str, url: &str) -> Self {
        self.push(method, url, Err("connection refused".into()));
        self
    }

    fn push(&self, method: &str, url: &str, answer: Result<ResponseRecord, String>) {
        self.script
            .lock()
            .unwrap()
            .entry(format!("{method} {url}"))
            .or_default()
            .push(answer);
    }

    /// Every request seen so far, in order.
    pub fn calls(&self) -> Vec<RequestRecord> {
        self.calls.lock().unwrap().clone()
    }

    pub fn call_count(&self) -> usize {
        self.calls.lock().unwrap().len()
    }

    pub fn calls_to(&self, method: &str, url: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|r| r.method() == method && r.url().as_str() == url)
            .count()
    }
}

#[async_trait::async_trait]
impl Network for ScriptedNetwork {
    async fn fetch(&self, request: &RequestRecord) -> Result<ResponseRecord, Error> {
        self.calls.lock().unwrap().push(request.clone());

        let key = format!("{} {}", request.method(), request.url());
        let mut script = self.script.lock().unwrap();
        let answer = match script.get_mut(&key) {
            Some(queue) if queue.len() > 1 => queue.remove(0),
            Some(queue) if !queue.is_empty() => queue[0].clone(),
            _ => Err("connection refused".into()),
        };

        answer.map_err(|reason| Error::FetchFailed(format!("{key}: {reason}")))
    }
}

pub fn ok(body: &'static str, content_type: &str) -> ResponseRecord {
    ResponseRecord::new(200)
        .with_header("content-type", content_type)
        .with_body(body)
}
