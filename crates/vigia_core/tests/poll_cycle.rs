use std::sync::Once;

use vigia_core::{update, Effect, Msg, Notification, PageId, WatchState};

fn init_logging() {
    static INIT: Once = Once::new();
    INIT.call_once(vigia_logging::initialize_for_tests);
}

/// Drive one full poll: tick, then deliver the probe report.
fn poll(state: WatchState, page: Option<PageId>, count: u32) -> (WatchState, Vec<Effect>) {
    let (state, effects) = update(state, Msg::PollTick);
    assert_eq!(effects, vec![Effect::StartProbe]);
    update(state, Msg::ProbeCompleted { page, count })
}

fn fired_counts(effects: &[Effect]) -> Vec<u32> {
    effects
        .iter()
        .filter_map(|effect| match effect {
            Effect::Notify(Notification::NewDocuments { count }) => Some(*count),
            _ => None,
        })
        .collect()
}

#[test]
fn tick_while_disabled_is_dropped() {
    init_logging();
    let state = WatchState::new(false, std::time::Duration::from_secs(180));
    let (next, effects) = update(state.clone(), Msg::PollTick);

    assert_eq!(state, next);
    assert!(effects.is_empty());
}

#[test]
fn tick_while_checking_is_dropped() {
    init_logging();
    let state = WatchState::default();
    let (state, effects) = update(state, Msg::PollTick);
    assert_eq!(effects, vec![Effect::StartProbe]);
    assert!(state.view().checking);

    // A second tick while the probe is in flight must be a no-op.
    let (state, effects) = update(state, Msg::PollTick);
    assert!(effects.is_empty());

    let (state, _) = update(
        state,
        Msg::ProbeCompleted {
            page: Some(1),
            count: 0,
        },
    );
    assert!(!state.view().checking);
}

#[test]
fn notification_fires_only_on_increase() {
    init_logging();
    let counts = [0, 0, 3, 3, 5, 2, 2, 6];
    let mut state = WatchState::default();
    let mut fired = Vec::new();

    for count in counts {
        let (next, effects) = poll(state, Some(1), count);
        fired.extend(fired_counts(&effects));
        state = next;
    }

    assert_eq!(fired, vec![3, 5, 6]);
    assert_eq!(state.view().document_count, 6);
}

#[test]
fn first_nonzero_observation_notifies() {
    let state = WatchState::default();
    let (state, effects) = poll(state, Some(1), 4);

    assert_eq!(
        effects,
        vec![Effect::Notify(Notification::NewDocuments { count: 4 })]
    );
    assert_eq!(state.view().document_count, 4);
}

#[test]
fn decrease_is_silent_and_moves_baseline() {
    let state = WatchState::default();
    let (state, _) = poll(state, Some(1), 5);
    let (state, effects) = poll(state, Some(1), 2);

    assert!(effects.is_empty());
    assert_eq!(state.view().document_count, 2);

    // Growing back past the lowered baseline notifies again.
    let (_, effects) = poll(state, Some(1), 3);
    assert_eq!(
        effects,
        vec![Effect::Notify(Notification::NewDocuments { count: 3 })]
    );
}

#[test]
fn repeat_count_is_silent() {
    let state = WatchState::default();
    let (state, effects) = poll(state, Some(1), 3);
    assert_eq!(fired_counts(&effects), vec![3]);

    let (state, effects) = poll(state, Some(1), 3);
    assert!(effects.is_empty());
    assert_eq!(state.view().document_count, 3);
}

#[test]
fn checking_is_released_after_completion_and_abort() {
    let state = WatchState::default();
    let (state, _) = update(state, Msg::PollTick);
    assert!(state.view().checking);
    let (state, _) = update(
        state,
        Msg::ProbeCompleted {
            page: None,
            count: 0,
        },
    );
    assert!(!state.view().checking);

    let (state, _) = update(state, Msg::PollTick);
    assert!(state.view().checking);
    let (state, effects) = update(state, Msg::ProbeAborted);
    assert!(!state.view().checking);
    assert!(effects.is_empty());
}

#[test]
fn abort_leaves_baseline_untouched() {
    let state = WatchState::default();
    let (state, _) = poll(state, Some(1), 4);
    assert_eq!(state.view().document_count, 4);

    let (state, _) = update(state, Msg::PollTick);
    let (state, _) = update(state, Msg::ProbeAborted);
    assert_eq!(state.view().document_count, 4);

    // The aborted poll must not have reset the comparison baseline.
    let (_, effects) = poll(state, Some(1), 4);
    assert!(effects.is_empty());
}
