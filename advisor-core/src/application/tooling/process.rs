use super::error::ToolInvokeError;
use super::interface::ToolTransport;
use super::rpc::{self, Inbound, RpcChannel};
use async_trait::async_trait;
use serde_json::Value;
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader, BufWriter};
use tokio::process::{Child, ChildStdin, ChildStdout, Command};
use tokio::sync::Mutex as AsyncMutex;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

type SharedWriter = Arc<AsyncMutex<Option<BufWriter<ChildStdin>>>>;

/// MCP over a child process's stdin/stdout, one JSON message per line.
///
/// The child is spawned with kill-on-drop, so dropping the transport (for
/// instance when a connect deadline fires) also ends the process.
pub struct StdioTransport {
    server: String,
    rpc: Arc<RpcChannel>,
    writer: SharedWriter,
    _child: Child,
    reader: JoinHandle<()>,
}

impl StdioTransport {
    pub async fn spawn(
        server: &str,
        command: &Path,
        args: &[String],
        env: &HashMap<String, String>,
        workdir: Option<&PathBuf>,
    ) -> Result<Self, ToolInvokeError> {
        let mut cmd = Command::new(command);
        cmd.stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .kill_on_drop(true);
        if let Some(dir) = workdir {
            cmd.current_dir(dir);
        }
        if !args.is_empty() {
            cmd.args(args);
        }
        for (key, value) in env {
            cmd.env(key, value);
        }

        info!(
            server,
            command = %command.display(),
            args = args.len(),
            env_vars = env.len(),
            "Spawning MCP server process"
        );
        let mut child = cmd.spawn().map_err(|source| ToolInvokeError::Spawn {
            server: server.to_string(),
            source,
        })?;

        let stdin = child
            .stdin
            .take()
            .ok_or_else(|| ToolInvokeError::transport(server, "failed to capture server stdin"))?;
        let stdout = child
            .stdout
            .take()
            .ok_or_else(|| ToolInvokeError::transport(server, "failed to capture server stdout"))?;

        let rpc = RpcChannel::new(server);
        let writer: SharedWriter = Arc::new(AsyncMutex::new(Some(BufWriter::new(stdin))));
        let reader = tokio::spawn(reader_loop(
            Arc::clone(&rpc),
            Arc::clone(&writer),
            stdout,
        ));

        Ok(Self {
            server: server.to_string(),
            rpc,
            writer,
            _child: child,
            reader,
        })
    }
}

#[async_trait]
impl ToolTransport for StdioTransport {
    fn server(&self) -> &str {
        &self.server
    }

    async fn request(&self, method: &str, params: Value) -> Result<Value, ToolInvokeError> {
        let (payload, pending) = self.rpc.start_request(method, params);
        write_message(&self.writer, &self.server, &payload).await?;
        pending.wait().await
    }

    async fn notify(&self, method: &str, params: Value) -> Result<(), ToolInvokeError> {
        write_message(&self.writer, &self.server, &rpc::notification(method, params)).await
    }
}

impl Drop for StdioTransport {
    fn drop(&mut self) {
        self.reader.abort();
        self.rpc.fail_all();
    }
}

async fn reader_loop(rpc: Arc<RpcChannel>, writer: SharedWriter, stdout: ChildStdout) {
    let server = rpc.server().to_string();
    let mut lines = BufReader::new(stdout).lines();
    while let Ok(Some(raw)) = lines.next_line().await {
        let trimmed = raw.trim();
        if trimmed.is_empty() {
            continue;
        }
        if trimmed.starts_with('\u{1b}') {
            debug!(
                server = %server,
                line = trimmed,
                "skipping non-JSON ANSI log line from MCP server"
            );
            continue;
        }
        let value = match serde_json::from_str::<Value>(trimmed) {
            Ok(value) => value,
            Err(source) => {
                warn!(
                    server = %server,
                    line = trimmed,
                    %source,
                    "received invalid JSON from MCP server"
                );
                continue;
            }
        };

        match rpc.dispatch(value) {
            Inbound::ServerRequest { id, method } => {
                let reply = rpc::answer_server_request(id, &method);
                if let Err(err) = write_message(&writer, &server, &reply).await {
                    warn!(server = %server, method, %err, "failed to answer server request");
                }
            }
            Inbound::Notification { method } => {
                debug!(server = %server, method, "received notification from server");
            }
            Inbound::Response | Inbound::Ignored => {}
        }
    }

    debug!(server = %server, "MCP server closed its stdout");
    writer.lock().await.take();
    rpc.fail_all();
}

async fn write_message(
    writer: &SharedWriter,
    server: &str,
    message: &Value,
) -> Result<(), ToolInvokeError> {
    let encoded = serde_json::to_string(message).map_err(|source| ToolInvokeError::InvalidJson {
        server: server.to_string(),
        source,
    })?;

    let mut writer = writer.lock().await;
    let stream = writer
        .as_mut()
        .ok_or_else(|| ToolInvokeError::Terminated {
            server: server.to_string(),
        })?;
    let io_error = |source: std::io::Error| ToolInvokeError::transport(server, source.to_string());
    stream.write_all(encoded.as_bytes()).await.map_err(io_error)?;
    stream.write_all(b"\n").await.map_err(io_error)?;
    stream.flush().await.map_err(io_error)?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn missing_binary_reports_spawn_error() {
        let result = StdioTransport::spawn(
            "ghost",
            Path::new("/nonexistent/advisor-mcp-server"),
            &[],
            &HashMap::new(),
            None,
        )
        .await;
        assert!(matches!(result, Err(ToolInvokeError::Spawn { .. })));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn exited_process_fails_pending_request() {
        // `true` exits immediately without reading stdin.
        let transport = StdioTransport::spawn("short-lived", Path::new("true"), &[], &HashMap::new(), None)
            .await
            .expect("spawn true");
        let result = transport.request("tools/list", json!({})).await;
        assert!(matches!(
            result,
            Err(ToolInvokeError::Terminated { .. }) | Err(ToolInvokeError::Transport { .. })
        ));
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn echoing_process_round_trips_a_request() {
        // A shell loop that answers every request line with a canned result.
        let script = r#"while IFS= read -r line; do
id=$(printf '%s' "$line" | sed -n 's/.*"id":\([0-9]*\).*/\1/p')
if [ -n "$id" ]; then printf '{"jsonrpc":"2.0","id":%s,"result":{"ok":true}}\n' "$id"; fi
done"#;
        let transport = StdioTransport::spawn(
            "echo",
            Path::new("sh"),
            &["-c".to_string(), script.to_string()],
            &HashMap::new(),
            None,
        )
        .await
        .expect("spawn sh");

        let result = transport.request("ping", json!({})).await.expect("reply");
        assert_eq!(result, json!({"ok": true}));
    }
}
