//! The bridge dispatcher: words in, HTTP out, words back.
//!
//! State machine per inbound batch:
//!
//! 1. Check the first word's message-type nibble; anything that is not
//!    SysEx7 is not for this bridge.
//! 2. Reassemble the payload and parse the Property Exchange envelope.
//! 3. Look up the route for the request property and collect its required
//!    body fields.
//! 4. Perform the HTTP call on its own task, so a slow backend never
//!    blocks the receive path.
//! 5. Chunk the result envelope back onto the transport, packet by packet.
//!
//! Malformed wire input, unparseable envelopes, unrecognized properties,
//! and missing required fields are all dropped without a response. A
//! completed HTTP round trip always produces a response, non-2xx statuses
//! included; when the call itself fails the response carries
//! [`STATUS_UNREACHABLE`] so a counterpart waiting on the wire never
//! hangs. Responses from overlapping requests may interleave in any
//! order; the property id is the only correlation the wire provides.

use std::collections::HashMap;
use std::sync::Arc;

use serde_json::{json, Value};
use tokio::sync::mpsc;
use tracing::{debug, warn};

use umpwire::envelope::{result_property_id, Envelope};
use umpwire::sysex7;

use crate::mapping::{substitute, BodyMode, Route, RouteTable};
use crate::transport::WordSink;

/// Status reported when the HTTP call itself failed (connection refused,
/// client timeout). Distinguishes transport failure from any status a
/// backend could return.
pub const STATUS_UNREACHABLE: u16 = 0;

/// The Property Exchange bridge.
///
/// Holds the read-only route table, one shared HTTP client, and the
/// outbound transport sink. Cheap to share across response tasks.
pub struct Bridge {
    routes: RouteTable,
    http: reqwest::Client,
    sink: Arc<dyn WordSink>,
}

impl Bridge {
    pub fn new(routes: RouteTable, sink: Arc<dyn WordSink>) -> Self {
        Self {
            routes,
            http: reqwest::Client::new(),
            sink,
        }
    }

    /// Consume inbound word batches until the channel closes.
    pub async fn run(self, mut inbound: mpsc::Receiver<Vec<u32>>) {
        let bridge = Arc::new(self);
        while let Some(words) = inbound.recv().await {
            bridge.accept(&words);
        }
        debug!("inbound transport closed, bridge stopping");
    }

    /// Handle one inbound batch, spawning the HTTP round trip if routed.
    pub fn accept(self: &Arc<Self>, words: &[u32]) {
        let Some(first) = words.first() else { return };
        if (*first >> 28) & 0xF != sysex7::MESSAGE_TYPE_SYSEX7 {
            // Not a SysEx7 message; some other consumer's traffic.
            return;
        }

        let payload = sysex7::decode(words);
        if payload.is_empty() {
            return;
        }
        let Some(envelope) = Envelope::parse(&payload) else {
            debug!("dropping undecodable property exchange payload");
            return;
        };
        let Some(route) = self.routes.resolve(&envelope.property_id) else {
            debug!(property_id = %envelope.property_id, "dropping unrecognized property");
            return;
        };

        let route = route.clone();
        let bridge = Arc::clone(self);
        tokio::spawn(async move {
            bridge.forward(route, envelope).await;
        });
    }

    /// Perform the HTTP round trip for one request and emit the response.
    async fn forward(&self, route: Route, envelope: Envelope) {
        let body = envelope.body.clone().unwrap_or_else(|| json!({}));

        let mut values = HashMap::new();
        for field in route.required_fields {
            match body.get(*field).and_then(Value::as_str) {
                Some(value) => {
                    values.insert(*field, value.to_string());
                }
                None => {
                    debug!(
                        property_id = %envelope.property_id,
                        field,
                        "dropping request with missing body field"
                    );
                    return;
                }
            }
        }

        let path = substitute(&route.path_template, &values);
        let url = format!("{}{}", route.base_url, path);

        let mut request = self.http.request(route.method.clone(), &url);
        for field in route.query_fields {
            if let Some(items) = body.get(*field).and_then(Value::as_array) {
                let joined = items
                    .iter()
                    .filter_map(Value::as_str)
                    .collect::<Vec<_>>()
                    .join(",");
                if !joined.is_empty() {
                    request = request.query(&[(*field, joined)]);
                }
            }
        }
        match route.body {
            BodyMode::None => {}
            BodyMode::Envelope => {
                request = request.json(&body);
            }
            BodyMode::Nested => {
                let nested = body.get("body").cloned().unwrap_or_else(|| json!({}));
                request = request.json(&nested);
            }
        }

        let result_id = result_property_id(&envelope.property_id);
        match request.send().await {
            Ok(response) => {
                let status = response.status().as_u16();
                let body = response.json::<Value>().await.unwrap_or_else(|_| json!({}));
                debug!(property_id = %result_id, status, "backend round trip complete");
                self.respond(&result_id, status, body).await;
            }
            Err(error) => {
                warn!(url = %url, error = %error, "backend call failed");
                self.respond(&result_id, STATUS_UNREACHABLE, json!({})).await;
            }
        }
    }

    /// Chunk a result envelope back onto the transport, packet by packet.
    async fn respond(&self, property_id: &str, status: u16, body: Value) {
        let envelope = Envelope::result(property_id, status, body);
        for packet in sysex7::encode(&envelope.to_bytes()) {
            if let Err(error) = self.sink.send(&packet.words()).await {
                warn!(error = %error, "transport rejected response packet");
                return;
            }
        }
    }
}
