use crate::{AlertArm, Effect, Msg, Notification, WatchState};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: WatchState, msg: Msg) -> (WatchState, Vec<Effect>) {
    let effects = match msg {
        Msg::PollTick => {
            // At-most-one-concurrent-poll: a tick during an in-flight probe
            // (or while disabled) is simply dropped.
            if !state.enabled() || state.checking() {
                Vec::new()
            } else {
                state.begin_check();
                vec![Effect::StartProbe]
            }
        }
        Msg::ProbeCompleted { page, count } => {
            state.finish_check();
            state.set_monitored_page(page);
            match page {
                None => {
                    let mut effects = Vec::new();
                    if state.unavailable_alert() == AlertArm::Armed {
                        // Edge-triggered: one popup per contiguous absence.
                        state.suppress_unavailable_alert();
                        effects.push(Effect::Notify(Notification::PageUnavailable));
                    }
                    state.reset_baseline();
                    effects
                }
                Some(_) => {
                    state.rearm_unavailable_alert();
                    let grew = count > state.last_document_count() && count > 0;
                    let effects = if grew {
                        vec![Effect::Notify(Notification::NewDocuments { count })]
                    } else {
                        Vec::new()
                    };
                    // Baseline always tracks the latest observation, fired or not.
                    state.record_count(count);
                    effects
                }
            }
        }
        Msg::ProbeAborted => {
            // Guard release only; baseline and alert arming stay as they were.
            state.finish_check();
            Vec::new()
        }
        Msg::SetEnabled(enabled) => {
            state.set_enabled(enabled);
            if enabled {
                vec![Effect::StartTimer(state.poll_interval())]
            } else {
                vec![Effect::StopTimer]
            }
        }
        Msg::SetInterval(period) => {
            if period.is_zero() {
                Vec::new()
            } else {
                state.set_poll_interval(period);
                if state.enabled() {
                    vec![Effect::StartTimer(period)]
                } else {
                    Vec::new()
                }
            }
        }
    };

    (state, effects)
}
