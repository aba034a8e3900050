//! Shared fixtures for integration tests: a recording transport with
//! scripted responses, a scripted confirmation prompt and a small registry.

#![allow(dead_code)]

use std::collections::{HashMap, VecDeque};
use std::io;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;
use serde_json::{json, Value};

use workbench_api::clients::{HttpError, HttpRequest, HttpResponse, HttpResponseError, Transport};
use workbench_api::confirm::Prompt;
use workbench_api::rest::{ResourceSchema, TypeRegistry};
use workbench_api::WorkbenchClient;

/// Transport that records every request and replays queued responses.
#[derive(Debug, Default)]
pub struct MockTransport {
    responses: Mutex<VecDeque<HttpResponse>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl MockTransport {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    /// Queues a JSON response.
    pub fn respond(&self, code: u16, body: Value) -> &Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(HttpResponse::new(code, HashMap::new(), body));
        self
    }

    /// Queues a binary response.
    pub fn respond_bytes(&self, code: u16, bytes: &[u8]) -> &Self {
        self.responses
            .lock()
            .unwrap()
            .push_back(HttpResponse::from_bytes(code, HashMap::new(), bytes.to_vec()));
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    pub fn last_request(&self) -> HttpRequest {
        self.requests
            .lock()
            .unwrap()
            .last()
            .cloned()
            .expect("no request was sent")
    }
}

#[async_trait]
impl Transport for MockTransport {
    async fn request(&self, request: HttpRequest) -> Result<HttpResponse, HttpError> {
        request.verify()?;
        self.requests.lock().unwrap().push(request.clone());
        let response = self
            .responses
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| {
                panic!(
                    "unexpected request: {} {}",
                    request.http_method, request.path
                )
            });

        if !response.is_ok() && request.raise_for_status {
            return Err(HttpError::Response(HttpResponseError {
                code: response.code,
                message: response.error_message(),
                error_reference: response.request_id().map(String::from),
            }));
        }
        Ok(response)
    }
}

/// Prompt that replays fixed answers and counts how often it was asked.
#[derive(Debug)]
pub struct ScriptedPrompt {
    answers: Mutex<VecDeque<String>>,
    asked: Mutex<u32>,
}

impl ScriptedPrompt {
    pub fn new(answers: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            answers: Mutex::new(answers.iter().map(ToString::to_string).collect()),
            asked: Mutex::new(0),
        })
    }

    pub fn asked(&self) -> u32 {
        *self.asked.lock().unwrap()
    }
}

impl Prompt for ScriptedPrompt {
    fn read_line(&self, _message: &str) -> io::Result<String> {
        *self.asked.lock().unwrap() += 1;
        self.answers
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| io::Error::new(io::ErrorKind::UnexpectedEof, "no input"))
    }
}

pub fn registry() -> TypeRegistry {
    TypeRegistry::builder()
        .register(
            ResourceSchema::new("investigations")
                .attributes([
                    "close_comment",
                    "created_at",
                    "priority",
                    "short_link",
                    "status",
                    "title",
                ])
                .relationships([
                    "assigned_to_actor",
                    "comments",
                    "investigative_actions",
                    "organization",
                ])
                .relationship_to("assigned_to_actor", "actors"),
        )
        .register(
            ResourceSchema::new("investigative_actions")
                .attributes(["action_type", "created_at", "results", "status", "title"])
                .relationships(["files", "investigation"]),
        )
        .register(
            ResourceSchema::new("comments")
                .attributes(["comment", "created_at"])
                .relationships(["investigation", "organization"]),
        )
        .register(ResourceSchema::new("organizations").attributes(["created_at", "name"]))
        .register(ResourceSchema::new("actors").attributes(["created_at", "display_name"]))
        .register(
            ResourceSchema::new("files")
                .attributes(["created_at", "file_meta", "file_type", "filename"])
                .relationships(["investigative_action"]),
        )
        .build()
        .unwrap()
}

/// Client over `transport` with delete confirmation disabled.
pub fn client(transport: Arc<MockTransport>) -> WorkbenchClient {
    WorkbenchClient::with_transport(transport, Arc::new(registry())).prompt_on_delete(false)
}

/// Client over `transport` that asks `prompt` before deleting.
pub fn confirming_client(
    transport: Arc<MockTransport>,
    prompt: Arc<ScriptedPrompt>,
) -> WorkbenchClient {
    WorkbenchClient::with_transport(transport, Arc::new(registry()))
        .prompt_on_delete(true)
        .prompt(prompt)
}

pub fn entry(type_name: &str, id: &str, attributes: Value) -> Value {
    json!({"id": id, "type": type_name, "attributes": attributes})
}

pub fn investigation(id: &str, title: &str) -> Value {
    json!({
        "id": id,
        "type": "investigations",
        "attributes": {"title": title, "status": "OPEN"},
        "relationships": {
            "organization": {
                "data": {"id": "org-1", "type": "organizations"},
                "links": {"related": format!("/api/v2/investigations/{id}/organization")}
            },
            "comments": {
                "links": {"related": format!("/api/v2/investigations/{id}/comments")}
            }
        }
    })
}

/// Body of a request as JSON.
pub fn json_body(request: &HttpRequest) -> Value {
    request.json_body().cloned().expect("request has no JSON body")
}
