// THEORY:
// The `GestureController` is the caller the tracking core was designed for. It owns
// the three things the pipeline deliberately does not: the frame source, the
// `TrackingState` threaded between ticks, and the bus that presentation observers
// listen on. One `step` is one rendered frame: acquire, track, apply, publish.
//
// A failed acquisition surfaces as an error and leaves the paddles where they were.
// A frame with no usable hands is not an error; it simply produces no update.

use crate::core_modules::frame::Frame;
use crate::error::AcquisitionError;
use crate::frame_source::FrameSource;
use crate::pipeline::{TickReport, TrackingPipeline, TrackingState};
use crate::position_bus::{PositionBus, PositionUpdate};
use tracing::{trace, warn};

/// Everything produced by a single step, for callers that want more than positions.
#[derive(Debug, Clone)]
pub struct StepOutcome {
    pub update: PositionUpdate,
    pub report: TickReport,
    pub frame: Frame,
}

pub struct GestureController<S: FrameSource> {
    source: S,
    pipeline: TrackingPipeline,
    state: TrackingState,
    bus: Option<PositionBus>,
    ticks: u64,
}

impl<S: FrameSource> GestureController<S> {
    pub fn new(source: S, pipeline: TrackingPipeline, initial_state: TrackingState) -> Self {
        Self {
            source,
            pipeline,
            state: initial_state,
            bus: None,
            ticks: 0,
        }
    }

    /// Publishes every successful step on `bus`.
    pub fn with_bus(mut self, bus: PositionBus) -> Self {
        self.bus = Some(bus);
        self
    }

    pub fn state(&self) -> TrackingState {
        self.state
    }

    pub fn pipeline(&self) -> &TrackingPipeline {
        &self.pipeline
    }

    /// Number of successful steps so far.
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    pub fn into_source(self) -> S {
        self.source
    }

    /// Acquires one frame, tracks it and applies the result to the paddle state.
    pub fn step(&mut self) -> Result<PositionUpdate, AcquisitionError> {
        self.step_detailed().map(|outcome| outcome.update)
    }

    /// Like `step`, but also hands back the frame and the detection report.
    pub fn step_detailed(&mut self) -> Result<StepOutcome, AcquisitionError> {
        let frame = self.source.next_frame().inspect_err(|err| {
            warn!(error = %err, "frame acquisition failed, paddles unchanged");
        })?;

        let report = self
            .pipeline
            .tick_with_report(self.state.left_y, self.state.right_y, &frame);
        self.state.apply(&report.positions);
        self.ticks += 1;

        let update = PositionUpdate {
            tick: self.ticks,
            positions: report.positions.clone(),
            state: self.state,
        };
        trace!(tick = self.ticks, observed = update.positions.len(), "step complete");

        if let Some(bus) = &self.bus {
            bus.publish(update.clone());
        }

        Ok(StepOutcome {
            update,
            report,
            frame,
        })
    }
}
