use std::collections::VecDeque;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Result};
use serde_json::{json, Value};

use crate::adapter::{AdapterModels, GenerationAdapter};
use crate::service::{GenerateContentRequest, GenerationService, ServiceRegistry};

/// Shared view of what a [`ScriptedService`] was asked to do.
#[derive(Default)]
pub(crate) struct Script {
    pub(crate) calls: AtomicUsize,
    requests: Mutex<Vec<GenerateContentRequest>>,
    replies: Mutex<VecDeque<Result<Value, String>>>,
}

impl Script {
    pub(crate) fn requests(&self) -> Vec<GenerateContentRequest> {
        self.requests
            .lock()
            .map(|requests| requests.clone())
            .unwrap_or_default()
    }
}

/// In-memory stand-in registered under the "gemini" name. Replies are
/// consumed in order; an exhausted script answers with an empty response.
pub(crate) struct ScriptedService {
    script: Arc<Script>,
}

impl ScriptedService {
    pub(crate) fn new(replies: Vec<Result<Value, String>>) -> (Self, Arc<Script>) {
        let script = Arc::new(Script {
            replies: Mutex::new(replies.into()),
            ..Script::default()
        });
        (
            Self {
                script: Arc::clone(&script),
            },
            script,
        )
    }
}

impl GenerationService for ScriptedService {
    fn name(&self) -> &str {
        "gemini"
    }

    fn generate_content(&self, request: &GenerateContentRequest) -> Result<Value> {
        self.script.calls.fetch_add(1, Ordering::SeqCst);
        if let Ok(mut requests) = self.script.requests.lock() {
            requests.push(request.clone());
        }
        let reply = self
            .script
            .replies
            .lock()
            .ok()
            .and_then(|mut replies| replies.pop_front());
        match reply {
            Some(Ok(value)) => Ok(value),
            Some(Err(message)) => Err(anyhow!(message)),
            None => Ok(image_response(&[])),
        }
    }
}

pub(crate) fn scripted_adapter(
    replies: Vec<Result<Value, String>>,
) -> (GenerationAdapter, Arc<Script>) {
    let (service, script) = ScriptedService::new(replies);
    let mut services = ServiceRegistry::new();
    services.register(service);
    let models = match AdapterModels::defaults() {
        Ok(models) => models,
        Err(err) => panic!("default models: {err:#}"),
    };
    (GenerationAdapter::new(services, models), script)
}

/// A response whose first candidate carries one text part followed by one
/// inline PNG part per payload.
pub(crate) fn image_response(payloads: &[&str]) -> Value {
    let mut parts = vec![json!({"text": "here you go"})];
    parts.extend(
        payloads
            .iter()
            .map(|data| json!({"inlineData": {"mimeType": "image/png", "data": data}})),
    );
    json!({"candidates": [{"content": {"parts": parts}}]})
}
