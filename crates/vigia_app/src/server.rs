//! Control socket server.
//!
//! Clients connect over a Unix domain socket and exchange NDJSON: one
//! request per line, one response per line. Monitor-state requests are
//! forwarded to the coordinator loop over a channel; on-demand document
//! queries run a live probe right here so they never disturb the monitor.

use std::io;
use std::path::Path;
use std::sync::Arc;

use tokio::io::{AsyncBufReadExt, AsyncReadExt, AsyncWriteExt, BufReader};
use tokio::net::{UnixListener, UnixStream};
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use vigia_engine::{ProbeContext, Request, Response};
use vigia_logging::{vigia_debug, vigia_info, vigia_warn};

/// Longest accepted request line. The protocol is tiny; anything bigger
/// is a confused client.
const MAX_LINE_LENGTH: usize = 64 * 1024;

/// Total bytes one connection may send, bounding newline-less streams.
const MAX_CONNECTION_BYTES: u64 = 1024 * 1024;

pub type ControlTx = mpsc::Sender<(Request, oneshot::Sender<Response>)>;
pub type ControlRx = mpsc::Receiver<(Request, oneshot::Sender<Response>)>;

pub fn control_channel() -> (ControlTx, ControlRx) {
    mpsc::channel(16)
}

/// Bind the control socket, replacing any stale file from a previous run.
pub fn bind(socket_path: &Path) -> io::Result<UnixListener> {
    if let Some(parent) = socket_path.parent() {
        if !parent.as_os_str().is_empty() {
            std::fs::create_dir_all(parent)?;
        }
    }

    match std::fs::remove_file(socket_path) {
        Ok(()) => {}
        Err(err) if err.kind() == io::ErrorKind::NotFound => {}
        Err(err) => return Err(err),
    }

    let listener = UnixListener::bind(socket_path)?;

    // Owner-only: the socket toggles monitoring, so other local users
    // stay out.
    {
        use std::os::unix::fs::PermissionsExt;
        std::fs::set_permissions(socket_path, std::fs::Permissions::from_mode(0o600))?;
    }

    vigia_info!("Control socket listening at {:?}", socket_path);
    Ok(listener)
}

/// Accept connections until shutdown.
pub async fn serve(
    listener: UnixListener,
    control_tx: ControlTx,
    probe: Arc<ProbeContext>,
    shutdown: CancellationToken,
) {
    loop {
        tokio::select! {
            _ = shutdown.cancelled() => break,
            accepted = listener.accept() => match accepted {
                Ok((stream, _addr)) => {
                    let control_tx = control_tx.clone();
                    let probe = probe.clone();
                    tokio::spawn(async move {
                        if let Err(err) = handle_connection(stream, control_tx, probe).await {
                            vigia_debug!("Control connection ended: {}", err);
                        }
                    });
                }
                Err(err) => {
                    vigia_warn!("Control socket accept failed: {}", err);
                }
            },
        }
    }
    vigia_info!("Control socket stopped");
}

async fn handle_connection(
    stream: UnixStream,
    control_tx: ControlTx,
    probe: Arc<ProbeContext>,
) -> io::Result<()> {
    let (reader, mut writer) = stream.into_split();
    let mut lines = BufReader::new(reader.take(MAX_CONNECTION_BYTES)).lines();

    while let Some(line) = lines.next_line().await? {
        if line.len() > MAX_LINE_LENGTH {
            write_response(&mut writer, &Response::invalid_request()).await?;
            return Err(io::Error::new(
                io::ErrorKind::InvalidData,
                "oversized request line",
            ));
        }

        let line = line.trim();
        if line.is_empty() {
            continue;
        }

        // Any line that is not a known request gets the generic failure
        // answer instead of a connection drop; clients retry blindly.
        let request: Request = match serde_json::from_str(line) {
            Ok(request) => request,
            Err(err) => {
                vigia_debug!("Rejected control request: {}", err);
                write_response(&mut writer, &Response::invalid_request()).await?;
                continue;
            }
        };

        let response = match request {
            Request::GetDocumentState => Response::queue(probe.live_snapshot().await),
            other => match forward(&control_tx, other).await {
                Some(response) => response,
                None => {
                    write_response(&mut writer, &Response::invalid_request()).await?;
                    break;
                }
            },
        };

        write_response(&mut writer, &response).await?;
    }

    Ok(())
}

/// Hand a request to the coordinator and wait for its answer. `None` means
/// the coordinator is gone and the connection should wind down.
async fn forward(control_tx: &ControlTx, request: Request) -> Option<Response> {
    let (reply_tx, reply_rx) = oneshot::channel();
    control_tx.send((request, reply_tx)).await.ok()?;
    reply_rx.await.ok()
}

async fn write_response(
    writer: &mut (impl AsyncWriteExt + Unpin),
    response: &Response,
) -> io::Result<()> {
    let mut json = serde_json::to_string(response)
        .map_err(|err| io::Error::new(io::ErrorKind::InvalidData, err))?;
    json.push('\n');
    writer.write_all(json.as_bytes()).await?;
    writer.flush().await
}
