use super::error::ToolInvokeError;
use super::interface::ToolTransport;
use super::rpc::{self, Inbound, RpcChannel};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::ACCEPT;
use reqwest::{Client, Url};
use reqwest_eventsource::{Event, EventSource, retry::Never};
use serde_json::Value;
use std::sync::Arc;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// MCP over HTTP with server-sent events.
///
/// `GET <url>` opens the event stream; the server's first `endpoint` event
/// names the URL (carrying a `sessionId`) that requests are POSTed to.
/// Responses come back as `message` events on the stream.
///
/// Server urls may carry an access token in their path, so neither logs
/// nor errors ever include them; only the host is reported.
pub struct SseTransport {
    server: String,
    http: Client,
    endpoint: Url,
    session_id: Option<String>,
    rpc: Arc<RpcChannel>,
    reader: JoinHandle<()>,
}

impl SseTransport {
    pub async fn connect(server: &str, url: &str) -> Result<Self, ToolInvokeError> {
        let base = Url::parse(url)
            .map_err(|err| ToolInvokeError::transport(server, format!("invalid url: {err}")))?;
        let http = Client::new();

        let mut source = EventSource::new(
            http.get(base.clone())
                .header(ACCEPT, "text/event-stream"),
        )
        .map_err(|_| ToolInvokeError::transport(server, "request cannot be cloned"))?;
        source.set_retry_policy(Box::new(Never));

        let endpoint = loop {
            match source.next().await {
                Some(Ok(Event::Open)) => {
                    debug!(server, host = base.host_str(), "SSE stream opened")
                }
                Some(Ok(Event::Message(message))) if message.event == "endpoint" => {
                    let endpoint = base.join(message.data.trim()).map_err(|err| {
                        ToolInvokeError::Handshake {
                            server: server.to_string(),
                            message: format!("invalid endpoint '{}': {err}", message.data),
                        }
                    })?;
                    break endpoint;
                }
                Some(Ok(Event::Message(message))) => {
                    debug!(server, event = %message.event, "ignoring event before endpoint");
                }
                Some(Err(err)) => {
                    source.close();
                    return Err(event_source_error(server, err));
                }
                None => {
                    return Err(ToolInvokeError::Handshake {
                        server: server.to_string(),
                        message: "stream ended before the endpoint event".to_string(),
                    });
                }
            }
        };

        let session_id = endpoint
            .query_pairs()
            .find(|(key, _)| key == "sessionId")
            .map(|(_, value)| value.into_owned());
        info!(
            server,
            session = session_id.as_deref(),
            "SSE session established"
        );

        let rpc = RpcChannel::new(server);
        let reader = tokio::spawn(reader_loop(
            source,
            Arc::clone(&rpc),
            http.clone(),
            endpoint.clone(),
        ));

        Ok(Self {
            server: server.to_string(),
            http,
            endpoint,
            session_id,
            rpc,
            reader,
        })
    }

    pub fn session_id(&self) -> Option<&str> {
        self.session_id.as_deref()
    }
}

#[async_trait]
impl ToolTransport for SseTransport {
    fn server(&self) -> &str {
        &self.server
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, ToolInvokeError> {
        let (payload, pending) = self.rpc.start_request(method, params);
        post_message(&self.http, &self.endpoint, &self.server, &payload).await?;
        pending.wait().await
    }

    async fn notify(&self, method: &str, params: Value) -> Result<(), ToolInvokeError> {
        post_message(
            &self.http,
            &self.endpoint,
            &self.server,
            &rpc::notification(method, params),
        )
        .await
    }
}

impl Drop for SseTransport {
    fn drop(&mut self) {
        self.reader.abort();
        self.rpc.fail_all();
    }
}

async fn reader_loop(mut source: EventSource, rpc: Arc<RpcChannel>, http: Client, endpoint: Url) {
    let server = rpc.server().to_string();
    while let Some(event) = source.next().await {
        let message = match event {
            Ok(Event::Message(message)) => message,
            Ok(Event::Open) => continue,
            Err(reqwest_eventsource::Error::StreamEnded) => break,
            Err(err) => {
                warn!(server = %server, err = %redacted(err), "SSE stream failed");
                break;
            }
        };
        if message.event != "message" {
            debug!(server = %server, event = %message.event, "ignoring SSE event");
            continue;
        }

        let value = match serde_json::from_str::<Value>(&message.data) {
            Ok(value) => value,
            Err(source) => {
                warn!(server = %server, %source, "received invalid JSON over SSE");
                continue;
            }
        };

        match rpc.dispatch(value) {
            Inbound::ServerRequest { id, method } => {
                let reply = rpc::answer_server_request(id, &method);
                if let Err(err) = post_message(&http, &endpoint, &server, &reply).await {
                    warn!(server = %server, method, %err, "failed to answer server request");
                }
            }
            Inbound::Notification { method } => {
                debug!(server = %server, method, "received notification from server");
            }
            Inbound::Response | Inbound::Ignored => {}
        }
    }

    source.close();
    debug!(server = %server, "SSE stream closed");
    rpc.fail_all();
}

async fn post_message(
    http: &Client,
    endpoint: &Url,
    server: &str,
    payload: &Value,
) -> Result<(), ToolInvokeError> {
    let response = http
        .post(endpoint.clone())
        .json(payload)
        .send()
        .await
        .map_err(|err| ToolInvokeError::transport(server, err.without_url().to_string()))?;
    let status = response.status();
    if !status.is_success() {
        return Err(ToolInvokeError::Http {
            server: server.to_string(),
            status: status.as_u16(),
        });
    }
    Ok(())
}

fn event_source_error(server: &str, err: reqwest_eventsource::Error) -> ToolInvokeError {
    match err {
        reqwest_eventsource::Error::InvalidStatusCode(status, _) => ToolInvokeError::Http {
            server: server.to_string(),
            status: status.as_u16(),
        },
        reqwest_eventsource::Error::StreamEnded => ToolInvokeError::Handshake {
            server: server.to_string(),
            message: "stream ended before the endpoint event".to_string(),
        },
        other => ToolInvokeError::transport(server, redacted(other)),
    }
}

/// Render an event-source failure without the request url.
fn redacted(err: reqwest_eventsource::Error) -> String {
    match err {
        reqwest_eventsource::Error::Transport(err) => err.without_url().to_string(),
        reqwest_eventsource::Error::Parser(_) => "malformed event stream".to_string(),
        other => other.to_string(),
    }
}
