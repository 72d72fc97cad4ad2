//! Daemon wiring: state loop, effect execution, and the control surface.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::Context;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use vigia_core::{update, validate_refresh_seconds, Msg, WatchState};
use vigia_engine::{
    coerce_seconds, DesktopNotifier, FetchSettings, HttpQueueHost, Notifier, PollTimer,
    ProbeContext, QueueSnapshot, Request, Response, TableRowExtractor, TargetPage, Tick,
};
use vigia_logging::{vigia_info, LogDestination};

use crate::runner::EffectRunner;
use crate::server;
use crate::settings::{load_settings, save_settings, Settings, SETTINGS_FILENAME};

const LOG_FILENAME: &str = "vigia.log";

pub fn run() -> anyhow::Result<()> {
    vigia_logging::initialize(LogDestination::Both(Path::new(LOG_FILENAME)));
    vigia_info!("vigia {} starting", env!("CARGO_PKG_VERSION"));

    let settings_path = PathBuf::from(SETTINGS_FILENAME);
    let settings = load_settings(&settings_path);

    let runtime = tokio::runtime::Runtime::new().context("create tokio runtime")?;
    runtime.block_on(run_daemon(settings, settings_path))
}

async fn run_daemon(mut settings: Settings, settings_path: PathBuf) -> anyhow::Result<()> {
    let target = TargetPage::new(&settings.target_url, &settings.view_fragment)
        .context("invalid target URL in settings")?;
    vigia_info!("Watching {}", target.full_url());

    let host = HttpQueueHost::new(target.clone(), FetchSettings::default())
        .context("build http client")?
        .with_table_selector(&settings.table_selector);
    let extractor = TableRowExtractor::new(&settings.table_selector);
    let probe = Arc::new(ProbeContext::new(
        Arc::new(host),
        Arc::new(extractor),
        target,
    ));

    let notifier: Arc<dyn Notifier> = Arc::new(DesktopNotifier::new(
        settings.sound_enabled,
        settings.alarm_file.clone(),
    ));

    let (msg_tx, mut msg_rx) = mpsc::channel::<Msg>(32);
    let (tick_tx, mut tick_rx) = mpsc::channel::<Tick>(4);
    let timer = PollTimer::new(tick_tx);
    let mut runner = EffectRunner::new(probe.clone(), notifier, timer, msg_tx);

    let (control_tx, mut control_rx) = server::control_channel();
    let listener = server::bind(&settings.socket_path)
        .with_context(|| format!("bind control socket at {:?}", settings.socket_path))?;
    let shutdown = CancellationToken::new();
    tokio::spawn(server::serve(listener, control_tx, probe, shutdown.clone()));

    let mut state = WatchState::new(settings.enabled, settings.refresh_interval());

    if state.enabled() {
        // Arm the timer, then check once right away instead of waiting a
        // full period.
        state = apply(state, Msg::SetEnabled(true), &mut runner);
        state = apply(state, Msg::PollTick, &mut runner);
    } else {
        vigia_info!("Monitoring disabled; waiting for a control request");
    }

    let ctrl_c = tokio::signal::ctrl_c();
    tokio::pin!(ctrl_c);

    loop {
        tokio::select! {
            _ = &mut ctrl_c => {
                vigia_info!("Interrupt received; shutting down");
                break;
            }
            Some(Tick) = tick_rx.recv() => {
                state = apply(state, Msg::PollTick, &mut runner);
            }
            Some(msg) = msg_rx.recv() => {
                if let Msg::ProbeCompleted { count, .. } = &msg {
                    vigia_info!(
                        "Document count: {} (previous {})",
                        count,
                        state.last_document_count()
                    );
                }
                state = apply(state, msg, &mut runner);
            }
            Some((request, reply)) = control_rx.recv() => {
                let (next, response) =
                    handle_request(state, request, &mut runner, &mut settings, &settings_path);
                state = next;
                let _ = reply.send(response);
            }
        }
    }

    shutdown.cancel();
    let _ = std::fs::remove_file(&settings.socket_path);
    Ok(())
}

/// Feed one message through the state machine and execute its effects.
pub fn apply(state: WatchState, msg: Msg, runner: &mut EffectRunner) -> WatchState {
    let (state, effects) = update(state, msg);
    runner.run(effects);
    state
}

/// Answer one control request, updating state and settings as needed.
pub fn handle_request(
    state: WatchState,
    request: Request,
    runner: &mut EffectRunner,
    settings: &mut Settings,
    settings_path: &Path,
) -> (WatchState, Response) {
    match request {
        Request::GetFilaState => {
            let view = state.view();
            let snapshot = QueueSnapshot {
                state: map_queue_state(view.queue_state),
                count: view.document_count,
            };
            (state, Response::queue(snapshot))
        }
        Request::GetMonitoredTabId => {
            let monitored = state.monitored_page();
            (state, Response::monitored_tab(monitored))
        }
        Request::ToggleExtension { enabled } => {
            vigia_info!(
                "Monitoring {}",
                if enabled { "enabled" } else { "disabled" }
            );
            let state = apply(state, Msg::SetEnabled(enabled), runner);
            settings.enabled = enabled;
            save_settings(settings_path, settings);
            (state, Response::ok())
        }
        Request::SetRefreshSeconds { seconds } => {
            let valid = coerce_seconds(seconds.as_ref())
                .and_then(|seconds| validate_refresh_seconds(seconds).ok().map(|p| (seconds, p)));
            match valid {
                Some((seconds, period)) => {
                    vigia_info!("Poll period set to {} s", seconds);
                    let state = apply(state, Msg::SetInterval(period), runner);
                    settings.set_refresh_seconds(seconds);
                    save_settings(settings_path, settings);
                    (state, Response::interval_set(seconds))
                }
                None => (state, Response::invalid_seconds()),
            }
        }
        // Served directly by the socket layer; kept total for safety.
        Request::GetDocumentState => (state, Response::invalid_request()),
    }
}

fn map_queue_state(state: vigia_core::QueueState) -> vigia_engine::QueueState {
    match state {
        vigia_core::QueueState::Empty => vigia_engine::QueueState::Empty,
        vigia_core::QueueState::NotEmpty => vigia_engine::QueueState::NotEmpty,
    }
}
