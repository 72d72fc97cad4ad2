#![cfg(unix)]

use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, AtomicU32, Ordering};
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use serde_json::{json, Value};
use tempfile::TempDir;
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::unix::{OwnedReadHalf, OwnedWriteHalf};
use tokio::net::UnixStream;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;

use vigia_app::daemon::{apply, handle_request};
use vigia_app::runner::EffectRunner;
use vigia_app::server;
use vigia_app::settings::{load_settings, save_settings, Settings};
use vigia_core::{Msg, WatchState, DEFAULT_POLL_INTERVAL};
use vigia_engine::{
    page_id, HostError, Notifier, NotifyError, PageRef, PollTimer, PopupKind, ProbeContext,
    QueueHost, TableRowExtractor, TargetPage, Tick,
};

const BASE: &str = "https://infoleg-sileg.camara.leg.br/autenticador/";

/// Queue host with an adjustable document count, so live probes can be
/// told apart from the stored baseline.
struct FakeQueueHost {
    present: Arc<AtomicBool>,
    rows: Arc<AtomicU32>,
}

#[async_trait]
impl QueueHost for FakeQueueHost {
    async fn discover(&self) -> Result<Vec<PageRef>, HostError> {
        if !self.present.load(Ordering::SeqCst) {
            return Ok(Vec::new());
        }
        Ok(vec![PageRef {
            id: page_id(BASE),
            url: format!("{BASE}#filaDocumento"),
        }])
    }

    async fn reload(&self, _page: &PageRef) -> Result<String, HostError> {
        let rows = self.rows.load(Ordering::SeqCst);
        let mut body = String::from("<table><tbody id=\"listaUsuarios\">");
        for i in 0..rows {
            body.push_str(&format!("<tr><td>PL {i}/2026</td></tr>"));
        }
        body.push_str("</tbody></table>");
        Ok(body)
    }
}

struct SilentNotifier;

#[async_trait]
impl Notifier for SilentNotifier {
    async fn open_popup(&self, _kind: PopupKind) -> Result<(), NotifyError> {
        Ok(())
    }
}

struct Harness {
    _dir: TempDir,
    settings_path: PathBuf,
    socket_path: PathBuf,
    rows: Arc<AtomicU32>,
    _shutdown: CancellationToken,
}

/// Boot a miniature daemon: probe context over the fake host, coordinator
/// loop, and control server on a throwaway socket. The monitor baseline is
/// seeded with one completed probe before any client connects.
async fn start_harness(initial_rows: u32) -> Harness {
    let dir = TempDir::new().expect("tempdir");
    let settings_path = dir.path().join("vigia.ron");
    let socket_path = dir.path().join("vigia.sock");

    let mut settings = Settings::default();
    settings.socket_path = socket_path.clone();
    save_settings(&settings_path, &settings);

    let present = Arc::new(AtomicBool::new(true));
    let rows = Arc::new(AtomicU32::new(initial_rows));
    let host = FakeQueueHost {
        present: present.clone(),
        rows: rows.clone(),
    };
    let target = TargetPage::sileg_default();
    let probe = Arc::new(ProbeContext::new(
        Arc::new(host),
        Arc::new(TableRowExtractor::default()),
        target,
    ));

    let (msg_tx, mut msg_rx) = mpsc::channel::<Msg>(32);
    let (tick_tx, mut tick_rx) = mpsc::channel::<Tick>(4);
    let timer = PollTimer::new(tick_tx);
    let notifier: Arc<dyn Notifier> = Arc::new(SilentNotifier);
    let mut runner = EffectRunner::new(probe.clone(), notifier, timer, msg_tx);

    let (control_tx, mut control_rx) = server::control_channel();
    let listener = server::bind(&socket_path).expect("bind control socket");
    let shutdown = CancellationToken::new();
    tokio::spawn(server::serve(
        listener,
        control_tx,
        probe.clone(),
        shutdown.clone(),
    ));

    let seed = probe.run().await;
    let coordinator_settings_path = settings_path.clone();
    tokio::spawn(async move {
        let mut state = WatchState::new(true, DEFAULT_POLL_INTERVAL);
        state = apply(
            state,
            Msg::ProbeCompleted {
                page: seed.page.map(|page| page.id),
                count: seed.snapshot.count,
            },
            &mut runner,
        );

        loop {
            tokio::select! {
                Some(Tick) = tick_rx.recv() => {
                    state = apply(state, Msg::PollTick, &mut runner);
                }
                Some(msg) = msg_rx.recv() => {
                    state = apply(state, msg, &mut runner);
                }
                request = control_rx.recv() => {
                    let Some((request, reply)) = request else { break };
                    let (next, response) = handle_request(
                        state,
                        request,
                        &mut runner,
                        &mut settings,
                        &coordinator_settings_path,
                    );
                    state = next;
                    let _ = reply.send(response);
                }
            }
        }
    });

    Harness {
        _dir: dir,
        settings_path,
        socket_path,
        rows,
        _shutdown: shutdown,
    }
}

struct Client {
    reader: BufReader<OwnedReadHalf>,
    writer: OwnedWriteHalf,
}

impl Client {
    async fn connect(harness: &Harness) -> Self {
        let stream = UnixStream::connect(&harness.socket_path)
            .await
            .expect("connect to control socket");
        let (reader, writer) = stream.into_split();
        Self {
            reader: BufReader::new(reader),
            writer,
        }
    }

    async fn roundtrip(&mut self, request: &str) -> Value {
        self.writer
            .write_all(request.as_bytes())
            .await
            .expect("write request");
        self.writer.write_all(b"\n").await.expect("write newline");
        self.writer.flush().await.expect("flush");

        let mut line = String::new();
        let read = tokio::time::timeout(
            Duration::from_secs(5),
            self.reader.read_line(&mut line),
        )
        .await
        .expect("response before timeout")
        .expect("read response");
        assert!(read > 0, "server closed the connection");
        serde_json::from_str(line.trim()).expect("response is JSON")
    }
}

#[tokio::test]
async fn fila_state_and_monitored_tab_reflect_the_baseline() {
    let harness = start_harness(3).await;
    let mut client = Client::connect(&harness).await;

    let fila = client.roundtrip(r#"{"action":"getFilaState"}"#).await;
    assert_eq!(fila, json!({"state": "not_empty", "count": 3}));

    let tab = client.roundtrip(r#"{"action":"getMonitoredTabId"}"#).await;
    assert_eq!(tab["tabId"], json!(page_id(BASE)));
}

#[tokio::test]
async fn document_state_probes_live_without_moving_the_baseline() {
    let harness = start_harness(2).await;
    let mut client = Client::connect(&harness).await;

    harness.rows.store(5, Ordering::SeqCst);

    let live = client.roundtrip(r#"{"action":"getDocumentState"}"#).await;
    assert_eq!(live, json!({"state": "not_empty", "count": 5}));

    // The monitor baseline still holds the value from its own last poll.
    let fila = client.roundtrip(r#"{"action":"getFilaState"}"#).await;
    assert_eq!(fila, json!({"state": "not_empty", "count": 2}));
}

#[tokio::test]
async fn toggle_and_interval_changes_are_persisted() {
    let harness = start_harness(0).await;
    let mut client = Client::connect(&harness).await;

    let toggled = client
        .roundtrip(r#"{"action":"toggleExtension","enabled":false}"#)
        .await;
    assert_eq!(toggled, json!({"success": true}));
    assert!(!load_settings(&harness.settings_path).enabled);

    let interval = client
        .roundtrip(r#"{"action":"setRefreshSeconds","seconds":"240"}"#)
        .await;
    assert_eq!(interval, json!({"success": true, "seconds": 240}));
    assert_eq!(
        load_settings(&harness.settings_path).refresh_seconds,
        Some(240.0)
    );

    // Fractional periods persist as sent, not rounded to whole seconds.
    let fractional = client
        .roundtrip(r#"{"action":"setRefreshSeconds","seconds":2.5}"#)
        .await;
    assert_eq!(fractional, json!({"success": true, "seconds": 2.5}));
    assert_eq!(
        load_settings(&harness.settings_path).refresh_seconds,
        Some(2.5)
    );
}

#[tokio::test]
async fn invalid_intervals_are_rejected_without_side_effects() {
    let harness = start_harness(0).await;
    let mut client = Client::connect(&harness).await;

    for request in [
        r#"{"action":"setRefreshSeconds","seconds":0}"#,
        r#"{"action":"setRefreshSeconds","seconds":-15}"#,
        r#"{"action":"setRefreshSeconds","seconds":"abc"}"#,
        // Finite but far beyond any representable timer period; the
        // daemon must answer, not die.
        r#"{"action":"setRefreshSeconds","seconds":1e30}"#,
        r#"{"action":"setRefreshSeconds","seconds":"1e300"}"#,
        // Explicit null is invalid input, unlike an omitted field.
        r#"{"action":"setRefreshSeconds","seconds":null}"#,
    ] {
        let response = client.roundtrip(request).await;
        assert_eq!(
            response,
            json!({"success": false, "message": "invalid_seconds"}),
            "request {request} should be rejected"
        );
    }
    assert_eq!(load_settings(&harness.settings_path).refresh_seconds, None);

    // Omitting the field falls back to the default period.
    let fallback = client.roundtrip(r#"{"action":"setRefreshSeconds"}"#).await;
    assert_eq!(fallback, json!({"success": true, "seconds": 180}));
}

#[tokio::test]
async fn malformed_requests_get_the_generic_failure() {
    let harness = start_harness(0).await;
    let mut client = Client::connect(&harness).await;

    let garbled = client.roundtrip("this is not json").await;
    assert_eq!(garbled, json!({"success": false, "message": "invalid_request"}));

    let unknown = client.roundtrip(r#"{"action":"selfDestruct"}"#).await;
    assert_eq!(unknown, json!({"success": false, "message": "invalid_request"}));

    // The connection survives bad lines.
    let fila = client.roundtrip(r#"{"action":"getFilaState"}"#).await;
    assert_eq!(fila, json!({"state": "empty", "count": 0}));
}

#[tokio::test]
async fn absent_page_reports_an_empty_queue_over_the_socket() {
    let dir = TempDir::new().expect("tempdir");
    let socket_path = dir.path().join("vigia.sock");
    let present = Arc::new(AtomicBool::new(false));
    let rows = Arc::new(AtomicU32::new(4));
    let probe = Arc::new(ProbeContext::new(
        Arc::new(FakeQueueHost { present, rows }),
        Arc::new(TableRowExtractor::default()),
        TargetPage::sileg_default(),
    ));
    let (control_tx, _control_rx) = server::control_channel();
    let listener = server::bind(&socket_path).expect("bind");
    let shutdown = CancellationToken::new();
    tokio::spawn(server::serve(listener, control_tx, probe, shutdown.clone()));

    let stream = UnixStream::connect(&socket_path).await.expect("connect");
    let (reader, mut writer) = stream.into_split();
    let mut reader = BufReader::new(reader);
    writer
        .write_all(b"{\"action\":\"getDocumentState\"}\n")
        .await
        .expect("write");
    let mut line = String::new();
    reader.read_line(&mut line).await.expect("read");
    let response: Value = serde_json::from_str(line.trim()).expect("json");
    assert_eq!(response, json!({"state": "empty", "count": 0}));
}
