//! Executes core effects against the engine.

use std::sync::Arc;

use tokio::sync::mpsc;
use vigia_core::{Effect, Msg, Notification};
use vigia_engine::{Notifier, PollTimer, PopupKind, ProbeContext};
use vigia_logging::{vigia_error, vigia_info, vigia_warn};

pub struct EffectRunner {
    probe: Arc<ProbeContext>,
    notifier: Arc<dyn Notifier>,
    timer: PollTimer,
    msg_tx: mpsc::Sender<Msg>,
}

impl EffectRunner {
    pub fn new(
        probe: Arc<ProbeContext>,
        notifier: Arc<dyn Notifier>,
        timer: PollTimer,
        msg_tx: mpsc::Sender<Msg>,
    ) -> Self {
        Self {
            probe,
            notifier,
            timer,
            msg_tx,
        }
    }

    pub fn run(&mut self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::StartProbe => self.spawn_probe(),
                Effect::Notify(notification) => self.spawn_popup(notification),
                Effect::StartTimer(period) => {
                    vigia_info!("Poll timer armed at {:?}", period);
                    self.timer.restart(period);
                }
                Effect::StopTimer => {
                    vigia_info!("Poll timer stopped");
                    self.timer.stop();
                }
            }
        }
    }

    fn spawn_probe(&self) {
        let probe = self.probe.clone();
        let msg_tx = self.msg_tx.clone();
        tokio::spawn(async move {
            // The probe runs in its own task so that even a panic over
            // there still produces a message and releases the in-progress
            // guard.
            let outcome = tokio::spawn(async move { probe.run().await }).await;
            let msg = match outcome {
                Ok(report) => Msg::ProbeCompleted {
                    page: report.page.map(|page| page.id),
                    count: report.snapshot.count,
                },
                Err(err) => {
                    vigia_error!("Probe task failed: {}", err);
                    Msg::ProbeAborted
                }
            };
            let _ = msg_tx.send(msg).await;
        });
    }

    fn spawn_popup(&self, notification: Notification) {
        let notifier = self.notifier.clone();
        let kind = map_notification(notification);
        tokio::spawn(async move {
            if let Err(err) = notifier.open_popup(kind).await {
                vigia_warn!("Popup failed: {}", err);
            }
        });
    }
}

fn map_notification(notification: Notification) -> PopupKind {
    match notification {
        Notification::NewDocuments { count } => PopupKind::NewDocuments { count },
        Notification::PageUnavailable => PopupKind::PageUnavailable,
    }
}
