//! Trial engine
//!
//! The engine owns the live ring layout, the active target and the battery
//! cursor. Every transition is synchronous and returns the events it
//! produced so a presentation layer can react without being called back
//! from inside the state machine.
//!
//! ```text
//!   Idle ──next_target──▶ Awaiting ──hit──▶ Idle ──▶ next_target / advance_battery
//!                            │  ▲
//!                       miss └──┘
//!   advance_battery past the last entry ──▶ BatteryComplete (terminal)
//!   end_test                            ──▶ Ended (terminal)
//! ```

use serde::Serialize;
use std::collections::BTreeSet;
use std::mem;
use tracing::{debug, info, trace};

use crate::battery::TrialBattery;
use crate::config::ExperimentConfig;
use crate::dataset::DataSetStore;
use crate::error::FittsError;
use crate::geometry::{offset_from_end, Point};
use crate::layout::{generate_layout, traversal_step};
use crate::types::{Target, TrialRecord};

/// Engine state
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum EngineState {
    /// No target shown
    Idle,
    /// A target is shown and waiting to be acquired
    Awaiting,
    /// Every battery entry was administered
    BatteryComplete,
    /// The test was ended early
    Ended,
}

impl EngineState {
    pub fn is_terminal(&self) -> bool {
        matches!(self, EngineState::BatteryComplete | EngineState::Ended)
    }
}

/// Something observable that happened during a transition
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "event", rename_all = "snake_case")]
pub enum EngineEvent {
    /// First pointer press of the session (emitted by the session facade)
    FirstInteraction,
    LayoutRegenerated {
        num: usize,
        distance: f64,
        width: f64,
    },
    TargetPresented {
        index: usize,
        target: Target,
    },
    Hit {
        target: Target,
        hit: Point,
        /// Hit position along the movement axis, relative to the target centre
        offset_x: f64,
        /// Hit position across the movement axis
        offset_y: f64,
    },
    Recorded {
        data_set: u32,
        records: usize,
        time_ms: i64,
    },
    /// A hit whose movement time could not be used
    OutlierDiscarded {
        time_ms: Option<i64>,
    },
    Miss {
        point: Point,
        misses: u32,
    },
    BatteryAdvanced {
        current_test: usize,
        distance: f64,
        width: f64,
    },
    BatteryComplete,
    TestEnded,
}

/// The trial sequencing state machine
#[derive(Debug, Clone)]
pub struct TrialEngine {
    battery: TrialBattery,
    auto_advance: bool,
    center: Point,
    max_time_ms: i64,

    iso_positions: Vec<Target>,
    current_position: usize,
    current_count: usize,
    miss: u32,
    target: Option<Target>,
    state: EngineState,
    current_path: Vec<Point>,
    start: Point,
    last: Option<Point>,
}

impl TrialEngine {
    /// Create an engine on the first battery entry.
    ///
    /// `start` is the reference point for the first movement and should be
    /// timestamped, otherwise the first hit cannot be timed and is discarded.
    pub fn new(config: &ExperimentConfig, start: Point) -> Self {
        let mut engine = Self {
            battery: config.battery(),
            auto_advance: config.iso.randomize,
            center: config.viewport.center(),
            max_time_ms: config.max_time_ms,
            iso_positions: Vec::new(),
            current_position: 0,
            current_count: 0,
            miss: 0,
            target: None,
            state: EngineState::Idle,
            current_path: Vec::new(),
            start,
            last: None,
        };

        match engine.battery.current_entry().cloned() {
            Some(entry) => {
                engine.apply_layout(config.iso.num, entry.distance, entry.width);
            }
            None => engine.state = EngineState::BatteryComplete,
        }
        engine
    }

    /// Replace the ring layout and present its first target
    pub fn regenerate_layout(
        &mut self,
        num: usize,
        distance: f64,
        width: f64,
    ) -> Result<Vec<EngineEvent>, FittsError> {
        self.ensure_running()?;
        if num == 0 {
            return Err(FittsError::InvalidOperation(
                "a layout needs at least one target".to_string(),
            ));
        }
        if !(distance.is_finite() && distance > 0.0) || !(width.is_finite() && width > 0.0) {
            return Err(FittsError::InvalidOperation(format!(
                "distance and width must be finite and positive, got {distance} / {width}"
            )));
        }
        Ok(self.apply_layout(num, distance, width))
    }

    fn apply_layout(&mut self, num: usize, distance: f64, width: f64) -> Vec<EngineEvent> {
        self.iso_positions = generate_layout(num, distance, width, self.center);
        self.current_count = 0;
        self.current_position = 0;
        self.miss = 0;
        self.target = None;
        self.current_path.clear();
        self.state = EngineState::Idle;
        debug!(num, distance, width, "layout regenerated");

        let mut events = vec![EngineEvent::LayoutRegenerated {
            num,
            distance,
            width,
        }];
        events.extend(self.next_target());
        events
    }

    /// Present the next target in alternating ring order
    pub fn next_target(&mut self) -> Option<EngineEvent> {
        if self.state.is_terminal() || self.iso_positions.is_empty() {
            return None;
        }
        let num = self.iso_positions.len();
        let index = self.current_position;
        let target = self.iso_positions[index];

        self.target = Some(target);
        self.current_position = (self.current_position + traversal_step(num)) % num;
        self.state = EngineState::Awaiting;
        trace!(index, x = target.x, y = target.y, "target presented");

        Some(EngineEvent::TargetPresented { index, target })
    }

    /// Record a pointer sample while a target is shown.
    ///
    /// Returns whether the sample was appended to the current path.
    pub fn pointer_move(&mut self, point: Point) -> bool {
        if self.state != EngineState::Awaiting {
            return false;
        }
        if let Some(last) = &self.last {
            if last.same_position(&point) {
                return false;
            }
        }
        self.current_path.push(point);
        self.last = Some(point);
        true
    }

    /// Classify a pointer action at `point` as hit or miss.
    ///
    /// Nothing happens unless every action required by the current battery
    /// entry is held. A hit appends a record to the active data set of
    /// `store` and moves on to the next target or battery entry; a miss only
    /// bumps the miss counter.
    pub fn attempt_acquire(
        &mut self,
        point: Point,
        held: &BTreeSet<String>,
        store: &mut DataSetStore,
    ) -> Result<Vec<EngineEvent>, FittsError> {
        self.ensure_running()?;
        let target = self
            .target
            .ok_or_else(|| FittsError::IllegalTransition("no active target".to_string()))?;
        let entry = self
            .battery
            .current_entry()
            .ok_or_else(|| FittsError::IllegalTransition("battery complete".to_string()))?;

        if !entry.is_satisfied_by(held) {
            trace!(required = %entry.keys_label(), "required actions not held");
            return Ok(Vec::new());
        }

        if !target.contains(&point) {
            self.miss += 1;
            debug!(x = point.x, y = point.y, misses = self.miss, "miss");
            return Ok(vec![EngineEvent::Miss {
                point,
                misses: self.miss,
            }]);
        }

        let key_press = entry.key_press();
        let (offset_x, offset_y) = offset_from_end(&self.start, &target, &point);
        let mut events = vec![EngineEvent::Hit {
            target,
            hit: point,
            offset_x,
            offset_y,
        }];

        let path = mem::take(&mut self.current_path);
        match TrialRecord::capture(self.start, target, path, point, key_press) {
            Some(record) if record.time < self.max_time_ms => {
                let time_ms = record.time;
                let records = store.append_active(record)?;
                debug!(time_ms, records, "trial recorded");
                events.push(EngineEvent::Recorded {
                    data_set: store.active_id(),
                    records,
                    time_ms,
                });
            }
            other => {
                let time_ms = other.map(|r| r.time);
                debug!(?time_ms, "discarding outlier trial");
                events.push(EngineEvent::OutlierDiscarded { time_ms });
            }
        }

        self.target = None;
        self.state = EngineState::Idle;
        self.current_count += 1;

        if self.auto_advance && self.current_count >= self.iso_positions.len() {
            events.extend(self.advance_battery()?);
        } else {
            events.extend(self.next_target());
        }

        self.last = Some(point);
        self.start = point;
        if !self.state.is_terminal() {
            self.current_path.push(point);
        }
        Ok(events)
    }

    /// Move to the next battery entry, or finish the battery
    pub fn advance_battery(&mut self) -> Result<Vec<EngineEvent>, FittsError> {
        self.ensure_running()?;

        match self.battery.advance().cloned() {
            Some(entry) => {
                let current_test = self.battery.current_index();
                info!(
                    current_test,
                    distance = entry.distance,
                    width = entry.width,
                    "battery advanced"
                );
                let num = self.iso_positions.len().max(1);
                let mut events = vec![EngineEvent::BatteryAdvanced {
                    current_test,
                    distance: entry.distance,
                    width: entry.width,
                }];
                events.extend(self.apply_layout(num, entry.distance, entry.width));
                Ok(events)
            }
            None => {
                info!(tests = self.battery.len(), "battery complete");
                self.clear_target();
                self.state = EngineState::BatteryComplete;
                Ok(vec![EngineEvent::BatteryComplete])
            }
        }
    }

    /// Stop the test before the battery is exhausted.
    ///
    /// Only allowed once at least one battery step has been taken.
    pub fn end_test(&mut self) -> Result<Vec<EngineEvent>, FittsError> {
        self.ensure_running()?;
        if self.battery.current_index() == 0 {
            return Err(FittsError::IllegalTransition(
                "no battery step has been completed yet".to_string(),
            ));
        }
        info!(current_test = self.battery.current_index(), "test ended early");
        self.clear_target();
        self.state = EngineState::Ended;
        Ok(vec![EngineEvent::TestEnded])
    }

    fn clear_target(&mut self) {
        self.target = None;
        self.current_path.clear();
    }

    fn ensure_running(&self) -> Result<(), FittsError> {
        match self.state {
            EngineState::BatteryComplete => Err(FittsError::IllegalTransition(
                "battery already complete".to_string(),
            )),
            EngineState::Ended => {
                Err(FittsError::IllegalTransition("test already ended".to_string()))
            }
            _ => Ok(()),
        }
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    /// Whether a trial is in progress
    pub fn is_active(&self) -> bool {
        self.state == EngineState::Awaiting
    }

    pub fn target(&self) -> Option<&Target> {
        self.target.as_ref()
    }

    pub fn battery(&self) -> &TrialBattery {
        &self.battery
    }

    pub fn current_test(&self) -> usize {
        self.battery.current_index()
    }

    pub fn iso_positions(&self) -> &[Target] {
        &self.iso_positions
    }

    pub fn current_position(&self) -> usize {
        self.current_position
    }

    pub fn current_count(&self) -> usize {
        self.current_count
    }

    pub fn misses(&self) -> u32 {
        self.miss
    }

    pub fn current_path(&self) -> &[Point] {
        &self.current_path
    }

    pub fn start(&self) -> &Point {
        &self.start
    }
}
