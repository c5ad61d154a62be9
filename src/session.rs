//! Experiment session
//!
//! `Session` owns everything one running experiment needs: the trial
//! engine, the data set store, the clock and the input state (held keys,
//! last pointer position). Hosts forward raw input events and control
//! actions to it and render the [`EngineEvent`]s it returns.
//!
//! Interactive input is forgiving: actions that cannot apply in the
//! current state (no live target, battery finished) are dropped and yield
//! no events instead of an error.

use rand::Rng;
use std::collections::BTreeSet;
use tracing::{debug, info};
use uuid::Uuid;

use crate::analysis::{AnalysisResult, PerformanceAnalyzer};
use crate::battery::CLICK;
use crate::clock::{Clock, SystemClock};
use crate::config::ExperimentConfig;
use crate::dataset::DataSetStore;
use crate::engine::{EngineEvent, EngineState, TrialEngine};
use crate::error::FittsError;
use crate::export::{ExportDocument, ExportEncoder};
use crate::geometry::Point;

/// A running experiment
pub struct Session {
    config: ExperimentConfig,
    engine: TrialEngine,
    store: DataSetStore,
    clock: Box<dyn Clock>,
    held_keys: BTreeSet<String>,
    pointer: Point,
    first_click: bool,
    instance_id: String,
}

impl Session {
    /// Start a session on the system clock
    pub fn new(config: ExperimentConfig) -> Result<Self, FittsError> {
        Self::with_clock(config, Box::new(SystemClock))
    }

    /// Start a session on the given clock.
    ///
    /// The first movement is timed from the viewport centre at creation time.
    pub fn with_clock(config: ExperimentConfig, clock: Box<dyn Clock>) -> Result<Self, FittsError> {
        config.validate()?;
        let pointer = config.viewport.center().with_time(clock.now_ms());
        let engine = TrialEngine::new(&config, pointer);
        let instance_id = Uuid::new_v4().to_string();

        info!(
            instance_id = %instance_id,
            tests = engine.battery().len(),
            num = config.iso.num,
            "session started"
        );

        Ok(Self {
            config,
            engine,
            store: DataSetStore::new(),
            clock,
            held_keys: BTreeSet::new(),
            pointer,
            first_click: false,
            instance_id,
        })
    }

    fn stamp(&self, x: f64, y: f64) -> Point {
        Point::at(x, y, self.clock.now_ms())
    }

    /// Pointer moved to `(x, y)`
    pub fn on_pointer_move(&mut self, x: f64, y: f64) -> bool {
        let point = self.stamp(x, y);
        self.pointer = point;
        self.engine.pointer_move(point)
    }

    /// Pointer pressed at `(x, y)` with the given modifier keys held
    pub fn on_pointer_down(
        &mut self,
        x: f64,
        y: f64,
        modifiers: &[&str],
    ) -> Result<Vec<EngineEvent>, FittsError> {
        let point = self.stamp(x, y);
        self.pointer = point;

        let mut events = Vec::new();
        if !self.first_click {
            self.first_click = true;
            events.push(EngineEvent::FirstInteraction);
        }

        let mut held = self.held_keys.clone();
        held.extend(modifiers.iter().map(|m| m.to_string()));
        held.insert(CLICK.to_string());

        events.extend(self.acquire(point, &held)?);
        Ok(events)
    }

    /// Key pressed. A fresh press acts at the last pointer position.
    pub fn on_key_down(&mut self, code: &str) -> Result<Vec<EngineEvent>, FittsError> {
        if !self.held_keys.insert(code.to_string()) {
            // auto-repeat
            return Ok(Vec::new());
        }
        let point = self.stamp(self.pointer.x, self.pointer.y);
        let held = self.held_keys.clone();
        self.acquire(point, &held)
    }

    /// Key released
    pub fn on_key_up(&mut self, code: &str) {
        self.held_keys.remove(code);
    }

    fn acquire(
        &mut self,
        point: Point,
        held: &BTreeSet<String>,
    ) -> Result<Vec<EngineEvent>, FittsError> {
        match self
            .engine
            .attempt_acquire(point, held, &mut self.store)
        {
            Ok(events) => Ok(events),
            Err(e) if e.is_ignorable() => {
                debug!(error = %e, "input ignored");
                Ok(Vec::new())
            }
            Err(e) => Err(e),
        }
    }

    /// Replace the ring layout (slider controls)
    pub fn regenerate_layout(
        &mut self,
        num: usize,
        distance: f64,
        width: f64,
    ) -> Result<Vec<EngineEvent>, FittsError> {
        let events = self.engine.regenerate_layout(num, distance, width)?;
        self.config.iso.num = num;
        self.config.iso.distance = distance;
        self.config.iso.width = width;
        Ok(events)
    }

    /// Regenerate the layout with a distance and width drawn from the limits
    pub fn randomize_layout<R: Rng + ?Sized>(
        &mut self,
        rng: &mut R,
    ) -> Result<Vec<EngineEvent>, FittsError> {
        let (distance, width) = self.config.limits.sample(rng);
        self.regenerate_layout(self.config.iso.num, distance, width)
    }

    /// Skip to the next battery entry
    pub fn advance_battery(&mut self) -> Result<Vec<EngineEvent>, FittsError> {
        self.engine.advance_battery()
    }

    /// Stop the test early
    pub fn end_test(&mut self) -> Result<Vec<EngineEvent>, FittsError> {
        self.engine.end_test()
    }

    pub fn create_data_set(&mut self) -> u32 {
        self.store.create()
    }

    pub fn delete_data_set(&mut self, id: u32) -> Result<(), FittsError> {
        self.store.delete(id)
    }

    pub fn set_active(&mut self, id: u32) -> Result<(), FittsError> {
        self.store.set_active(id)
    }

    /// Analyse one data set
    pub fn analyze(&self, id: u32) -> Result<AnalysisResult, FittsError> {
        let set = self.store.get(id)?;
        Ok(PerformanceAnalyzer::analyze(id, set))
    }

    /// Export the given data sets
    pub fn serialize(
        &self,
        ids: &[u32],
        participant: &str,
        device: &str,
    ) -> Result<ExportDocument, FittsError> {
        ExportEncoder::with_instance_id(self.instance_id.clone()).encode(
            &self.store,
            ids,
            participant,
            device,
        )
    }

    pub fn config(&self) -> &ExperimentConfig {
        &self.config
    }

    pub fn engine(&self) -> &TrialEngine {
        &self.engine
    }

    pub fn store(&self) -> &DataSetStore {
        &self.store
    }

    pub fn state(&self) -> EngineState {
        self.engine.state()
    }

    pub fn first_click(&self) -> bool {
        self.first_click
    }

    pub fn held_keys(&self) -> &BTreeSet<String> {
        &self.held_keys
    }

    pub fn pointer(&self) -> &Point {
        &self.pointer
    }

    pub fn instance_id(&self) -> &str {
        &self.instance_id
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::battery::BatteryEntry;
    use crate::clock::ManualClock;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn session(num: usize, battery: Vec<BatteryEntry>) -> (Session, ManualClock) {
        let clock = ManualClock::new(10_000);
        let mut config = ExperimentConfig::default();
        config.iso.num = num;
        config.battery = Some(battery);
        let session = Session::with_clock(config, Box::new(clock.clone())).unwrap();
        (session, clock)
    }

    fn target_xy(session: &Session) -> (f64, f64) {
        let target = session.engine().target().expect("live target");
        (target.x, target.y)
    }

    #[test]
    fn test_rejects_invalid_config() {
        let mut config = ExperimentConfig::default();
        config.iso.num = 0;
        assert!(matches!(
            Session::new(config),
            Err(FittsError::InvalidConfig(_))
        ));
    }

    #[test]
    fn test_first_interaction_emitted_once() {
        let (mut session, clock) = session(9, vec![BatteryEntry::new(300.0, 40.0, &[CLICK])]);
        clock.advance(100);

        let events = session.on_pointer_down(-500.0, -500.0, &[]).unwrap();
        assert_eq!(events[0], EngineEvent::FirstInteraction);
        assert!(matches!(events[1], EngineEvent::Miss { misses: 1, .. }));
        assert!(session.first_click());

        let events = session.on_pointer_down(-500.0, -500.0, &[]).unwrap();
        assert!(!events.contains(&EngineEvent::FirstInteraction));
    }

    #[test]
    fn test_first_hit_is_timed_from_session_start() {
        let (mut session, clock) = session(9, vec![BatteryEntry::new(300.0, 40.0, &[CLICK])]);
        let (x, y) = target_xy(&session);

        clock.advance(250);
        session.on_pointer_move(x - 10.0, y);
        clock.advance(250);
        session.on_pointer_down(x, y, &[]).unwrap();

        let records = &session.store().active().records;
        assert_eq!(records.len(), 1);
        assert_eq!(records[0].time, 500);
        assert_eq!(records[0].start, session.config().viewport.center().with_time(10_000));
        assert_eq!(records[0].path.len(), 1);
    }

    #[test]
    fn test_key_combination_required() {
        let (mut session, clock) = session(
            9,
            vec![BatteryEntry::new(300.0, 40.0, &[CLICK, "ShiftLeft"])],
        );
        let (x, y) = target_xy(&session);
        clock.advance(300);

        let events = session.on_pointer_down(x, y, &[]).unwrap();
        assert_eq!(events, vec![EngineEvent::FirstInteraction]);
        assert!(session.store().active().records.is_empty());

        let events = session.on_pointer_down(x, y, &["ShiftLeft"]).unwrap();
        assert!(matches!(events[0], EngineEvent::Hit { .. }));
        assert_eq!(session.store().active().records[0].key_press, "click,ShiftLeft");
    }

    #[test]
    fn test_key_press_acquires_at_pointer() {
        let (mut session, clock) = session(9, vec![BatteryEntry::new(300.0, 40.0, &["Space"])]);
        let (x, y) = target_xy(&session);

        clock.advance(100);
        session.on_pointer_move(x, y);
        clock.advance(100);
        let events = session.on_key_down("Space").unwrap();
        assert!(matches!(events[0], EngineEvent::Hit { .. }));

        // held key does not repeat
        assert!(session.on_key_down("Space").unwrap().is_empty());
        session.on_key_up("Space");
        assert!(session.held_keys().is_empty());
        assert_eq!(session.store().active().records.len(), 1);
        assert_eq!(session.store().active().records[0].time, 200);
    }

    #[test]
    fn test_input_after_completion_is_ignored() {
        let (mut session, clock) = session(1, vec![BatteryEntry::new(50.0, 10.0, &[CLICK])]);
        let (x, y) = target_xy(&session);
        clock.advance(400);

        let events = session.on_pointer_down(x, y, &[]).unwrap();
        assert_eq!(events.last(), Some(&EngineEvent::BatteryComplete));
        assert_eq!(session.state(), EngineState::BatteryComplete);

        assert!(session.on_pointer_down(x, y, &[]).unwrap().is_empty());
        assert!(!session.on_pointer_move(x + 1.0, y));
        assert_eq!(session.store().active().records.len(), 1);
    }

    #[test]
    fn test_randomize_layout_within_limits() {
        let (mut session, _clock) = session(7, vec![BatteryEntry::new(300.0, 40.0, &[CLICK])]);
        let mut rng = StdRng::seed_from_u64(7);

        let events = session.randomize_layout(&mut rng).unwrap();
        match &events[0] {
            EngineEvent::LayoutRegenerated {
                num,
                distance,
                width,
            } => {
                assert_eq!(*num, 7);
                assert!((120.0..=300.0).contains(distance));
                assert!((10.0..=100.0).contains(width));
                assert_eq!(session.config().iso.distance, *distance);
            }
            other => panic!("unexpected {other:?}"),
        }
    }

    #[test]
    fn test_data_sets_and_export() {
        let (mut session, clock) = session(9, vec![BatteryEntry::new(300.0, 40.0, &[CLICK])]);
        let second = session.create_data_set();
        assert_eq!(second, 2);

        let (x, y) = target_xy(&session);
        clock.advance(350);
        session.on_pointer_down(x, y, &[]).unwrap();
        assert_eq!(session.store().get(2).unwrap().records.len(), 1);
        assert!(session.store().get(1).unwrap().records.is_empty());

        session.set_active(1).unwrap();
        assert!(matches!(session.set_active(5), Err(FittsError::NotFound(5))));

        let doc = session.serialize(&[1, 2], "P03", "mouse").unwrap();
        assert_eq!(doc.data.len(), 2);
        assert_eq!(doc.producer.instance_id, session.instance_id());
        assert!(session.serialize(&[3], "P03", "mouse").is_err());

        session.delete_data_set(2).unwrap();
        assert!(matches!(
            session.delete_data_set(1),
            Err(FittsError::InvalidOperation(_))
        ));
        assert_eq!(session.store().len(), 1);
    }

    #[test]
    fn test_analyze_unknown_set() {
        let (session, _clock) = session(9, vec![BatteryEntry::new(300.0, 40.0, &[CLICK])]);
        assert!(matches!(session.analyze(4), Err(FittsError::NotFound(4))));
        let result = session.analyze(1).unwrap();
        assert!(result.enriched_records.is_empty());
        assert!(result.regression.is_none());
    }
}
