// THEORY:
// This file is the main entry point for the `paddle_vision` library crate. It exposes
// the gesture-tracking core that turns a camera feed into two paddle positions for a
// two-player Pong game.
//
// The primary export is the `TrackingPipeline` with its configuration and output
// types. The per-stage building blocks live in `core_modules` and are public so they
// can be tested and reused on their own. Around the core sit the pieces a game loop
// needs to drive it: a `FrameSource` seam for cameras and recordings, the
// `GestureController` that threads `TrackingState` between ticks, and a
// `PositionBus` for presentation observers.

pub mod controller;
pub mod core_modules;
pub mod error;
pub mod frame_source;
pub mod pipeline;
pub mod position_bus;

pub use controller::GestureController;
pub use core_modules::frame::Frame;
pub use core_modules::side_assigner::Side;
pub use error::{AcquisitionError, ConfigError};
pub use frame_source::FrameSource;
pub use pipeline::{SidedPosition, TrackerConfig, TrackingPipeline, TrackingState};
pub use position_bus::{PositionBus, PositionUpdate};
