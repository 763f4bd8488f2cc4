//! Catching mini-game
//!
//! The browser game as a host-driven state machine. The host (a page script,
//! or the `catch_sim` binary) owns the clock: it calls `tick` once per redraw
//! with the current time, and forwards pointer and visibility events to the
//! `Controller`. Everything visible goes through the `PlayField` trait, so the
//! engine runs unchanged against a DOM binding or the in-memory
//! `HeadlessField`.
//!
//! - `geometry` - axis-aligned rectangles and the overlap test
//! - `state` - `GameState`, `GameStatus`, falling objects
//! - `surface` - `PlayField` trait and `HeadlessField`
//! - `engine` - spawning, falling, catching, winning, pause/resume
//! - `controller` - pointer, visibility and button input
//! - `reveal` - envelope → letter → reasons sequence after a win

pub mod controller;
pub mod engine;
pub mod geometry;
pub mod reveal;
pub mod state;
pub mod surface;

pub use controller::{Controller, PointerEvent, Visibility};
pub use engine::{GameConfig, GameEngine, TickReport};
pub use geometry::Rect;
pub use reveal::{RevealSequence, RevealStage};
pub use state::{FallingObject, GameState, GameStatus, ObjectId};
pub use surface::{HeadlessField, PlayField, Section};
