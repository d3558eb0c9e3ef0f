//! End-to-end tests
//!
//! Runs whole attempts, first against a bare `FieldOfPlay` and then through
//! the registry's event loop with a real (paused) attempt clock.

use std::sync::Arc;
use std::time::Duration;

use libfop::bus::EventReceiver;
use libfop::config::PlatformConfig;
use libfop::repository::memory::InMemoryAthleteRepository;
use libfop::{
    Athlete, Config, FieldOfPlay, FieldOfPlayRegistry, FopEvent, FopEventKind, FopState, Group,
    Originator, UiEvent, UiEventKind,
};

async fn wait_for_state(ui: &mut EventReceiver<UiEvent>, target: FopState) -> Vec<UiEventKind> {
    let mut seen = Vec::new();
    tokio::time::timeout(Duration::from_secs(600), async {
        loop {
            let event = ui.recv().await.expect("ui bus closed");
            let reached = matches!(event.kind, UiEventKind::StateChanged { to, .. } if to == target);
            seen.push(event.kind);
            if reached {
                break;
            }
        }
    })
    .await
    .unwrap_or_else(|_| panic!("never reached {target}"));
    seen
}

#[tokio::test(start_paused = true)]
async fn test_single_attempt_scenario() -> anyhow::Result<()> {
    let lifter = Athlete::new("Dana", 1).with_openers(100, 120);
    let repository = Arc::new(InMemoryAthleteRepository::with_roster([lifter.clone()]));
    let mut fop = FieldOfPlay::new("A", repository.clone()).with_start_time_automatically(true);
    fop.switch_group(Some(Group::new("M89-A")), Vec::new());
    assert!(fop.current_athlete().is_none());

    fop.switch_group(Some(Group::new("M89-A")), vec![lifter.clone()]);
    fop.handle_event(FopEvent::system(FopEventKind::IntermissionDone))?;
    assert_eq!(fop.state(), FopState::CurrentAthleteDisplayed);
    assert_eq!(fop.current_athlete().unwrap().id, lifter.id);
    assert_eq!(fop.time_allowed(), 60_000);

    let announcer = Originator::new();
    fop.handle_event(FopEvent::new(announcer, FopEventKind::AthleteAnnounced))?;
    assert_eq!(fop.state(), FopState::TimeRunning);
    assert_eq!(fop.clock_owner(), Some(lifter.id));

    // A decision straight from TIME_RUNNING is not in the table; the
    // referees' down signal comes first.
    fop.handle_event(FopEvent::new(Originator::new(), FopEventKind::DownSignal))?;
    fop.handle_event(FopEvent::new(
        Originator::new(),
        FopEventKind::RefereeDecision {
            success: true,
            ref1: Some(true),
            ref2: Some(true),
            ref3: Some(false),
        },
    ))?;

    assert_eq!(fop.state(), FopState::DecisionVisible);
    assert_eq!(fop.previous_athlete().unwrap().id, lifter.id);
    assert_eq!(fop.clock_owner(), None);

    let stored = repository.get(&lifter.id)?.expect("athlete is stored");
    assert_eq!(stored.best(libfop::types::Lift::Snatch), Some(100));
    Ok(())
}

#[tokio::test(start_paused = true)]
async fn test_attempt_clock_runs_out_through_event_loop() {
    let lifter = Athlete::new("Dana", 1).with_openers(100, 120);
    let mut config = Config::default_config();
    config.platforms[0].start_time_automatically = true;
    let registry =
        FieldOfPlayRegistry::from_config(&config, Arc::new(InMemoryAthleteRepository::new()))
            .unwrap();
    let platform = registry.get("A").unwrap();
    platform
        .switch_group(Some(Group::new("M89-A")), vec![lifter.clone()])
        .await;
    let mut ui = platform.subscribe_ui();

    platform.dispatch(Originator::new(), FopEventKind::IntermissionDone);
    platform.dispatch(Originator::new(), FopEventKind::AthleteAnnounced);
    wait_for_state(&mut ui, FopState::TimeRunning).await;

    let seen = wait_for_state(&mut ui, FopState::TimeStopped).await;

    assert!(seen.contains(&UiEventKind::StopTime { remaining: 0 }));
    let snapshot = platform.snapshot().await;
    assert_eq!(snapshot.state, FopState::TimeStopped);
    assert_eq!(snapshot.time_remaining, 0);
    assert_eq!(snapshot.clock_owner, Some(lifter.id));
    registry.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_stopped_clock_never_times_out() {
    let lifter = Athlete::new("Dana", 1).with_openers(100, 120);
    let mut registry = FieldOfPlayRegistry::new();
    let platform = registry
        .register(
            FieldOfPlay::new("A", Arc::new(InMemoryAthleteRepository::new()))
                .with_start_time_automatically(true),
        )
        .unwrap();
    platform.switch_group(None, vec![lifter]).await;
    let mut ui = platform.subscribe_ui();

    platform.dispatch(Originator::new(), FopEventKind::IntermissionDone);
    platform.dispatch(Originator::new(), FopEventKind::AthleteAnnounced);
    wait_for_state(&mut ui, FopState::TimeRunning).await;
    tokio::time::sleep(Duration::from_secs(20)).await;
    platform.dispatch(Originator::new(), FopEventKind::TimeStoppedManually);
    wait_for_state(&mut ui, FopState::TimeStopped).await;

    tokio::time::sleep(Duration::from_secs(120)).await;

    assert!(ui.try_recv().is_err());
    let snapshot = platform.snapshot().await;
    assert_eq!(snapshot.state, FopState::TimeStopped);
    assert_eq!(snapshot.time_remaining, 40_000);
    registry.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_platforms_are_independent() {
    let mut config = Config::default_config();
    config.platforms.push(PlatformConfig::new("B"));
    let registry =
        FieldOfPlayRegistry::from_config(&config, Arc::new(InMemoryAthleteRepository::new()))
            .unwrap();
    let a = registry.get("A").unwrap();
    let b = registry.get("B").unwrap();
    a.switch_group(None, vec![Athlete::new("Eli", 1).with_openers(70, 90)])
        .await;
    b.switch_group(None, vec![Athlete::new("Fay", 1).with_openers(60, 80)])
        .await;
    let mut ui_a = a.subscribe_ui();
    let mut ui_b = b.subscribe_ui();

    a.dispatch(Originator::new(), FopEventKind::IntermissionDone);
    wait_for_state(&mut ui_a, FopState::CurrentAthleteDisplayed).await;

    assert_eq!(b.snapshot().await.state, FopState::Intermission);
    assert!(ui_b.try_recv().is_err());
    registry.shutdown().await;
}

#[tokio::test(start_paused = true)]
async fn test_ui_events_name_their_platform_and_originator() {
    let registry = FieldOfPlayRegistry::from_config(
        &Config::default_config(),
        Arc::new(InMemoryAthleteRepository::new()),
    )
    .unwrap();
    let platform = registry.get("A").unwrap();
    platform
        .switch_group(None, vec![Athlete::new("Gus", 3).with_openers(120, 150)])
        .await;
    let mut ui = platform.subscribe_ui();
    let marshal = Originator::new();

    platform.dispatch(marshal, FopEventKind::IntermissionDone);

    let event = tokio::time::timeout(Duration::from_secs(5), ui.recv())
        .await
        .unwrap()
        .unwrap();
    assert_eq!(event.platform, "A");
    assert_eq!(event.origin, marshal);
    assert_eq!(event.kind, UiEventKind::BreakDone);
    registry.shutdown().await;
}
