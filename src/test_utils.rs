// Copyright 2026, Jeroen van Erp <jeroen@geeko.me>
// SPDX-License-Identifier: Apache-2.0

//! Test utilities for mocking Kubernetes API responses.

use http::{Request, Response};
use http_body_util::BodyExt;
use kube::client::Body;
use kube::Client;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex};
use std::task::{Context, Poll};
use tower::Service;

type Key = (String, String);

/// A request seen by the mock, with its body decoded as JSON when possible
#[derive(Debug, Clone)]
pub struct RecordedRequest {
    pub method: String,
    pub path: String,
    pub body: Option<serde_json::Value>,
}

/// A mock HTTP service that returns predefined responses based on request paths.
///
/// A path registered with a sequence answers with the next response on every
/// call and keeps repeating the last one once the sequence is exhausted.
#[derive(Clone)]
pub struct MockService {
    responses: Arc<Mutex<HashMap<Key, VecDeque<(u16, String)>>>>,
    requests: Arc<Mutex<Vec<RecordedRequest>>>,
}

impl MockService {
    pub fn new() -> Self {
        Self {
            responses: Arc::new(Mutex::new(HashMap::new())),
            requests: Arc::new(Mutex::new(Vec::new())),
        }
    }

    fn on(self, method: &str, path: &str, responses: Vec<(u16, String)>) -> Self {
        self.responses
            .lock()
            .unwrap()
            .insert((method.to_string(), path.to_string()), responses.into());
        self
    }

    /// Add a response for GET requests matching the path
    pub fn on_get(self, path: &str, status: u16, body: &str) -> Self {
        self.on("GET", path, vec![(status, body.to_string())])
    }

    /// Add a sequence of responses for GET requests matching the path
    pub fn on_get_sequence(self, path: &str, responses: Vec<(u16, String)>) -> Self {
        self.on("GET", path, responses)
    }

    /// Add a response for POST requests matching the path
    pub fn on_post(self, path: &str, status: u16, body: &str) -> Self {
        self.on("POST", path, vec![(status, body.to_string())])
    }

    /// Add a response for PATCH requests matching the path
    pub fn on_patch(self, path: &str, status: u16, body: &str) -> Self {
        self.on("PATCH", path, vec![(status, body.to_string())])
    }

    /// Requests received so far, in order
    pub fn requests(&self) -> Vec<RecordedRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Bodies of all requests with the given method whose path starts with `prefix`
    pub fn bodies(&self, method: &str, prefix: &str) -> Vec<serde_json::Value> {
        self.requests()
            .into_iter()
            .filter(|r| r.method == method && r.path.starts_with(prefix))
            .filter_map(|r| r.body)
            .collect()
    }

    /// Build a kube Client from this mock service
    pub fn into_client(self) -> Client {
        Client::new(self, "default")
    }

    /// Build a kube Client sharing this mock's state, so requests can be inspected afterwards
    pub fn client(&self) -> Client {
        self.clone().into_client()
    }

    fn find_response(&self, method: &str, path: &str) -> Option<(u16, String)> {
        let mut responses = self.responses.lock().unwrap();

        let key = (method.to_string(), path.to_string());
        let key = if responses.contains_key(&key) {
            Some(key)
        } else {
            // Fall back to a prefix match for paths like /api/v1/namespaces/foo
            responses
                .keys()
                .filter(|(m, p)| m == method && path.starts_with(p.as_str()))
                .max_by_key(|(_, p)| p.len())
                .cloned()
        }?;

        let queue = responses.get_mut(&key)?;
        if queue.len() > 1 {
            queue.pop_front()
        } else {
            queue.front().cloned()
        }
    }
}

impl Default for MockService {
    fn default() -> Self {
        Self::new()
    }
}

impl Service<Request<Body>> for MockService {
    type Response = Response<Body>;
    type Error = tower::BoxError;
    type Future = std::pin::Pin<
        Box<dyn std::future::Future<Output = Result<Self::Response, Self::Error>> + Send>,
    >;

    fn poll_ready(&mut self, _cx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        Poll::Ready(Ok(()))
    }

    fn call(&mut self, req: Request<Body>) -> Self::Future {
        let method = req.method().to_string();
        let path = req.uri().path().to_string();
        let this = self.clone();

        Box::pin(async move {
            let bytes = req.into_body().collect().await?.to_bytes();
            let body = serde_json::from_slice(&bytes).ok();
            this.requests.lock().unwrap().push(RecordedRequest {
                method: method.clone(),
                path: path.clone(),
                body,
            });

            let (status, body) = this
                .find_response(&method, &path)
                .unwrap_or_else(|| (404, not_found_json("resource", &path)));

            Ok(Response::builder()
                .status(status)
                .header("content-type", "application/json")
                .body(Body::from(body.into_bytes()))
                .unwrap())
        })
    }
}

/// Create a mock namespace JSON response
pub fn namespace_json(name: &str) -> String {
    serde_json::json!({
        "apiVersion": "v1",
        "kind": "Namespace",
        "metadata": {
            "name": name,
            "uid": "test-uid"
        }
    })
    .to_string()
}

/// Create a mock secret JSON response with the given plain-text entries
pub fn secret_json(name: &str, namespace: &str, entries: &[(&str, &str)]) -> String {
    use base64::{engine::general_purpose::STANDARD, Engine};

    let data: serde_json::Map<String, serde_json::Value> = entries
        .iter()
        .map(|(k, v)| (k.to_string(), STANDARD.encode(v).into()))
        .collect();

    serde_json::json!({
        "apiVersion": "v1",
        "kind": "Secret",
        "metadata": { "name": name, "namespace": namespace },
        "data": data
    })
    .to_string()
}

/// Create a mock custom resource JSON response with the given status
pub fn object_json(
    api_version: &str,
    kind: &str,
    name: &str,
    namespace: &str,
    status: serde_json::Value,
) -> String {
    serde_json::json!({
        "apiVersion": api_version,
        "kind": kind,
        "metadata": { "name": name, "namespace": namespace },
        "spec": {},
        "status": status
    })
    .to_string()
}

/// Create an empty list JSON response
pub fn empty_list_json(api_version: &str, kind: &str) -> String {
    serde_json::json!({
        "apiVersion": api_version,
        "kind": kind,
        "metadata": {},
        "items": []
    })
    .to_string()
}

/// Create a 404 not found response
pub fn not_found_json(resource: &str, name: &str) -> String {
    serde_json::json!({
        "kind": "Status",
        "apiVersion": "v1",
        "status": "Failure",
        "message": format!("{} \"{}\" not found", resource, name),
        "reason": "NotFound",
        "code": 404
    })
    .to_string()
}
