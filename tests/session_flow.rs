//! End-to-end session runs driven through the public API

use fitts_engine::analysis::PerformanceAnalyzer;
use fitts_engine::{
    BatteryEntry, EngineEvent, EngineState, ExperimentConfig, ExportDocument, FittsError,
    ManualClock, Session, CLICK,
};
use pretty_assertions::assert_eq;

fn session(config: ExperimentConfig) -> (Session, ManualClock) {
    let clock = ManualClock::new(1_700_000_000_000);
    let session = Session::with_clock(config, Box::new(clock.clone())).unwrap();
    (session, clock)
}

/// Move to the live target in a few samples and press on its centre
fn acquire_centre(session: &mut Session, clock: &ManualClock, ms: i64) -> Vec<EngineEvent> {
    let target = *session.engine().target().expect("live target");
    let from = *session.pointer();
    for i in 1..=4 {
        let f = f64::from(i) / 4.0;
        clock.advance(ms / 4);
        session.on_pointer_move(
            from.x + (target.x - from.x) * f,
            from.y + (target.y - from.y) * f,
        );
    }
    session.on_pointer_down(target.x, target.y, &[]).unwrap()
}

#[test]
fn test_single_entry_battery_completes_after_one_hit() {
    let mut config = ExperimentConfig::default();
    config.iso.num = 1;
    config.battery = Some(vec![BatteryEntry::new(50.0, 10.0, &[CLICK])]);
    let (mut session, clock) = session(config);
    assert_eq!(session.engine().current_test(), 0);

    let events = acquire_centre(&mut session, &clock, 400);

    assert_eq!(session.engine().current_test(), 1);
    assert_eq!(session.state(), EngineState::BatteryComplete);
    assert_eq!(events.last(), Some(&EngineEvent::BatteryComplete));
    assert_eq!(session.store().active().records.len(), 1);
    assert_eq!(session.store().active().records[0].time, 400);
}

#[test]
fn test_standard_battery_runs_to_completion() {
    let mut config = ExperimentConfig::default();
    config.iso.num = 5;
    let (mut session, clock) = session(config);
    let tests = session.engine().battery().len();
    assert_eq!(tests, 4);

    let mut advanced = 0;
    while !session.state().is_terminal() {
        let events = acquire_centre(&mut session, &clock, 480);
        advanced += events
            .iter()
            .filter(|e| matches!(e, EngineEvent::BatteryAdvanced { .. }))
            .count();
    }

    assert_eq!(advanced, tests - 1);
    assert_eq!(session.engine().current_test(), tests);
    assert_eq!(session.store().active().records.len(), 5 * tests);

    // four conditions of five records each
    let result = session.analyze(1).unwrap();
    assert_eq!(result.groups.len(), 4);
    assert!(result.groups.iter().all(|g| g.count == 5));
    assert_eq!(result.histogram.bins.len(), 20);
}

#[test]
fn test_end_test_after_first_step() {
    let mut config = ExperimentConfig::default();
    config.iso.num = 3;
    let (mut session, clock) = session(config);

    assert!(matches!(
        session.end_test(),
        Err(FittsError::IllegalTransition(_))
    ));
    for _ in 0..3 {
        acquire_centre(&mut session, &clock, 300);
    }
    assert_eq!(session.engine().current_test(), 1);

    assert_eq!(session.end_test().unwrap(), vec![EngineEvent::TestEnded]);
    assert_eq!(session.state(), EngineState::Ended);
    assert!(session.on_pointer_down(0.0, 0.0, &[]).unwrap().is_empty());
}

#[test]
fn test_export_round_trip_analysis_matches() {
    let mut config = ExperimentConfig::default();
    config.iso.num = 9;
    config.battery = Some(vec![BatteryEntry::new(300.0, 40.0, &[CLICK])]);
    let (mut session, clock) = session(config);

    for i in 0..9 {
        let target = *session.engine().target().expect("live target");
        clock.advance(350 + 10 * i);
        // scatter hits around the centre
        let dx = [-6.0, 4.0, 0.0, 7.0, -3.0, 2.0, -5.0, 1.0, 5.0][i as usize];
        let dy = [2.0, -1.0, 3.0, 0.0, -4.0, 1.0, 0.0, -2.0, 2.0][i as usize];
        session.on_pointer_down(target.x + dx, target.y + dy, &[]).unwrap();
    }
    assert_eq!(session.store().active().records.len(), 9);

    let live = session.analyze(1).unwrap();
    assert!(live.regression.is_some());
    assert_eq!(live.enriched_records.len(), 9);

    let json = session.serialize(&[1], "P12", "mouse").unwrap().to_json().unwrap();
    let document = ExportDocument::from_json(&json).unwrap();
    assert_eq!(document.id, "P12");
    assert_eq!(document.device, "mouse");

    let exported = document.data_set(1).unwrap();
    let offline = PerformanceAnalyzer::analyze(exported.id, &exported.to_data_set());
    assert_eq!(offline.enriched_records.len(), live.enriched_records.len());
    assert_eq!(offline.histogram.counts(), live.histogram.counts());

    let close = |a: f64, b: f64| (a - b).abs() < 1e-6;
    let (offline_fit, live_fit) = (offline.regression.unwrap(), live.regression.unwrap());
    assert!(close(offline_fit.a, live_fit.a));
    assert!(close(offline_fit.b, live_fit.b));
    for (o, l) in offline.enriched_records.iter().zip(&live.enriched_records) {
        assert_eq!(o.record.time, l.record.time);
        assert!(close(o.throughput, l.throughput));
    }
}

#[test]
fn test_data_set_management() {
    let (mut session, clock) = session(ExperimentConfig::default());

    assert!(matches!(
        session.delete_data_set(1),
        Err(FittsError::InvalidOperation(_))
    ));
    assert_eq!(session.store().len(), 1);

    let second = session.create_data_set();
    let third = session.create_data_set();
    assert_eq!((second, third), (2, 3));
    assert_eq!(session.store().active_id(), 3);

    acquire_centre(&mut session, &clock, 250);
    assert_eq!(session.store().get(3).unwrap().records.len(), 1);

    session.delete_data_set(3).unwrap();
    assert_eq!(session.store().active_id(), 1);
    // ids are never reused
    assert_eq!(session.create_data_set(), 4);
    assert!(matches!(
        session.serialize(&[3], "P01", "mouse"),
        Err(FittsError::NotFound(3))
    ));
}
