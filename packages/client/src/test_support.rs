//! Scripted transport and fixtures for unit tests.

use std::collections::VecDeque;
use std::sync::Mutex;

use serde_json::{Value, json};

use crate::transport::{HttpRequest, RawResponse, Transport, TransportFailure};

/// Replays queued outcomes in order and records every request it sees.
#[derive(Debug, Default)]
pub struct ScriptedTransport {
    script: Mutex<VecDeque<Result<RawResponse, TransportFailure>>>,
    requests: Mutex<Vec<HttpRequest>>,
}

impl ScriptedTransport {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn json(self, status: u16, body: Value) -> Self {
        self.text(status, &body.to_string())
    }

    pub fn text(self, status: u16, body: &str) -> Self {
        self.script.lock().unwrap().push_back(Ok(RawResponse {
            status,
            url: String::new(),
            body: body.to_owned(),
        }));
        self
    }

    pub fn fail(self, failure: TransportFailure) -> Self {
        self.script.lock().unwrap().push_back(Err(failure));
        self
    }

    pub fn requests(&self) -> Vec<HttpRequest> {
        self.requests.lock().unwrap().clone()
    }

    pub fn request_count(&self) -> usize {
        self.requests.lock().unwrap().len()
    }

    /// The `filter` parameter of the n-th request.
    pub fn filter(&self, n: usize) -> String {
        self.requests()[n].params["filter"].to_string()
    }
}

impl Transport for ScriptedTransport {
    fn send(&self, request: &HttpRequest) -> Result<RawResponse, TransportFailure> {
        self.requests.lock().unwrap().push(request.clone());
        let mut outcome = self
            .script
            .lock()
            .unwrap()
            .pop_front()
            .unwrap_or_else(|| panic!("unexpected request to {}", request.url));
        if let Ok(response) = &mut outcome {
            response.url.clone_from(&request.url);
        }
        outcome
    }
}

/// A feature collection page whose features have ids from `range`.
pub fn page(range: impl IntoIterator<Item = u32>, number_matched: Value) -> Value {
    let features: Vec<Value> = range
        .into_iter()
        .map(|i| json!({"type": "Feature", "id": i.to_string(), "properties": {}}))
        .collect();
    json!({
        "type": "FeatureCollection",
        "numberReturned": features.len(),
        "numberMatched": number_matched,
        "features": features,
    })
}

/// The feature ids of a collection, in order.
pub fn ids(collection: &Value) -> Vec<String> {
    collection["features"]
        .as_array()
        .map(|features| {
            features
                .iter()
                .filter_map(|f| f["id"].as_str().map(str::to_owned))
                .collect()
        })
        .unwrap_or_default()
}

/// A single feature with the given id, geometry and properties.
pub fn feature(id: &str, properties: Value) -> Value {
    json!({
        "type": "Feature",
        "id": id,
        "geometry": {"type": "Point", "coordinates": [16.123_456, 58.789_012]},
        "properties": properties,
    })
}

/// A complete collection of the given features.
pub fn collection(features: Vec<Value>) -> Value {
    json!({
        "type": "FeatureCollection",
        "numberMatched": features.len(),
        "numberReturned": features.len(),
        "features": features,
    })
}
