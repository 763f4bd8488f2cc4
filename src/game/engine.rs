//! Game engine - spawning, falling, catching and the win transition
//!
//! Two periodic activities drive a play-through: a fixed-interval spawner and
//! a per-redraw update. Both exist only while the status is `Running`;
//! `pause` and the win transition drop them synchronously, so a `tick` after
//! either call cannot move, spawn or score anything.
//!
//! Within one `tick` the order is: update frame, due spawn, due reveal.
//! Positions advance per frame rather than per elapsed time, which makes
//! pause → resume leave every object exactly where it was.

use crate::game::geometry::Rect;
use crate::game::state::{FallingObject, GameState, GameStatus, ObjectId};
use crate::game::surface::{PlayField, Section};
use rand::rngs::StdRng;
use rand::Rng;
use std::time::Duration;
use tracing::{debug, error, info};

/// Shown in the game message line on a win
pub const WIN_MESSAGE: &str = "Победа!";

#[derive(Debug, Clone)]
pub struct GameConfig {
    pub goal: u32,
    /// Pixels per redraw
    pub fall_speed: f64,
    pub spawn_interval: Duration,
    /// Side of the square falling object
    pub object_size: f64,
    /// Spawn y; negative so objects slide in from above
    pub spawn_top: f64,
    /// Win → envelope section
    pub reveal_delay: Duration,
    /// Start button → game start
    pub start_delay: Duration,
    /// Envelope opened → reasons button
    pub reasons_delay: Duration,
    pub catcher_width: f64,
    pub catcher_height: f64,
    /// Gap between the catcher's bottom edge and the field's
    pub catcher_bottom_offset: f64,
}

impl Default for GameConfig {
    fn default() -> Self {
        Self {
            goal: 15,
            fall_speed: 2.5,
            spawn_interval: Duration::from_millis(900),
            object_size: 25.0,
            spawn_top: -30.0,
            reveal_delay: Duration::from_millis(1500),
            start_delay: Duration::from_millis(400),
            reasons_delay: Duration::from_millis(500),
            catcher_width: 80.0,
            catcher_height: 20.0,
            catcher_bottom_offset: 10.0,
        }
    }
}

/// What one `tick` did
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TickReport {
    pub spawned: u32,
    pub caught: u32,
    pub missed: u32,
    pub won: bool,
    pub revealed: bool,
}

/// Fixed-period spawn activity
#[derive(Debug, Clone, Copy)]
struct SpawnTimer {
    period: Duration,
    next_due: Duration,
}

/// Log a missing play field (cold path)
#[cold]
fn log_field_missing(operation: &'static str) {
    error!(operation = %operation, "game_field_missing");
}

pub struct GameEngine<F, R = StdRng> {
    config: GameConfig,
    state: GameState,
    field: Option<F>,
    rng: R,
    /// `Some` while the spawner runs
    spawn_timer: Option<SpawnTimer>,
    frame_clock_running: bool,
    reveal_at: Option<Duration>,
    next_object_id: u64,
}

impl<F: PlayField, R: Rng> GameEngine<F, R> {
    /// `field` is `None` when the host could not find its play-field
    /// surfaces; every operation then logs and does nothing.
    pub fn new(config: GameConfig, field: Option<F>, rng: R) -> Self {
        Self {
            config,
            state: GameState::default(),
            field,
            rng,
            spawn_timer: None,
            frame_clock_running: false,
            reveal_at: None,
            next_object_id: 0,
        }
    }

    pub fn config(&self) -> &GameConfig {
        &self.config
    }

    pub fn state(&self) -> &GameState {
        &self.state
    }

    pub fn status(&self) -> GameStatus {
        self.state.status
    }

    pub fn score(&self) -> u32 {
        self.state.score
    }

    pub fn field(&self) -> Option<&F> {
        self.field.as_ref()
    }

    pub fn field_mut(&mut self) -> Option<&mut F> {
        self.field.as_mut()
    }

    /// True while either periodic activity is scheduled
    pub fn activities_running(&self) -> bool {
        self.spawn_timer.is_some() || self.frame_clock_running
    }

    pub fn reveal_pending(&self) -> bool {
        self.reveal_at.is_some()
    }

    /// Catcher bounds in field coordinates
    pub fn catcher_rect(&self) -> Option<Rect> {
        let field = self.field.as_ref()?;
        let top = field.height() - self.config.catcher_bottom_offset - self.config.catcher_height;
        Some(Rect::new(
            self.state.catcher_x,
            top,
            self.config.catcher_width,
            self.config.catcher_height,
        ))
    }

    /// Idle or Won → Running with a fresh play-through
    pub fn start(&mut self, now: Duration) -> bool {
        if matches!(self.state.status, GameStatus::Running | GameStatus::Paused) {
            debug!(status = %self.state.status.as_str(), "game_start_ignored");
            return false;
        }
        let Some(field) = self.field.as_mut() else {
            log_field_missing("start");
            return false;
        };

        for object in self.state.active_objects.drain(..) {
            field.remove_object(object.id);
        }
        let catcher_x = (field.width() - self.config.catcher_width).max(0.0) / 2.0;
        self.state.score = 0;
        self.state.catcher_x = catcher_x;
        self.state.status = GameStatus::Running;

        field.show_section(Section::Game);
        field.show_goal(self.config.goal);
        field.show_score(0);
        field.show_message("");
        field.move_catcher(catcher_x);

        self.reveal_at = None;
        info!(goal = %self.config.goal, "game_started");
        if self.state.score >= self.config.goal {
            // Nothing to catch
            self.win(now);
            return true;
        }
        self.start_activities(now);
        true
    }

    /// Running → Paused; objects and score are kept as they are
    pub fn pause(&mut self) -> bool {
        if self.state.status != GameStatus::Running {
            return false;
        }
        self.stop_activities();
        self.state.status = GameStatus::Paused;
        info!(
            score = %self.state.score,
            objects = %self.state.active_objects.len(),
            "game_paused"
        );
        true
    }

    /// Paused → Running, unless the goal was already reached
    pub fn resume(&mut self, now: Duration) -> bool {
        if self.state.status != GameStatus::Paused || self.state.score >= self.config.goal {
            return false;
        }
        self.state.status = GameStatus::Running;
        self.start_activities(now);
        info!(score = %self.state.score, "game_resumed");
        true
    }

    /// Position the catcher under a pointer at `pointer_x` (field coordinates).
    /// Ignored unless Running.
    pub fn move_catcher(&mut self, pointer_x: f64) -> bool {
        if self.state.status != GameStatus::Running || !pointer_x.is_finite() {
            return false;
        }
        let Some(field) = self.field.as_mut() else {
            log_field_missing("move_catcher");
            return false;
        };

        let max_x = (field.width() - self.config.catcher_width).max(0.0);
        let x = (pointer_x - self.config.catcher_width / 2.0).clamp(0.0, max_x);
        self.state.catcher_x = x;
        field.move_catcher(x);
        true
    }

    /// Advance the game to `now`. Call once per redraw.
    pub fn tick(&mut self, now: Duration) -> TickReport {
        let mut report = TickReport::default();

        if self.frame_clock_running {
            self.update_frame(now, &mut report);
        }

        if self.spawn_due(now) && self.spawn_object().is_some() {
            report.spawned += 1;
        }

        if self.reveal_at.is_some_and(|at| now >= at) {
            self.reveal_at = None;
            self.reveal();
            report.revealed = true;
        }

        report
    }

    fn start_activities(&mut self, now: Duration) {
        let period = self.config.spawn_interval;
        self.spawn_timer = Some(SpawnTimer { period, next_due: now + period });
        self.frame_clock_running = true;
    }

    fn stop_activities(&mut self) {
        self.spawn_timer = None;
        self.frame_clock_running = false;
    }

    /// Fires at most once per tick; periods missed during a long stall
    /// coalesce into that one spawn.
    fn spawn_due(&mut self, now: Duration) -> bool {
        let Some(timer) = self.spawn_timer.as_mut() else {
            return false;
        };
        if now < timer.next_due {
            return false;
        }
        timer.next_due += timer.period;
        if timer.next_due <= now {
            timer.next_due = now + timer.period;
        }
        true
    }

    fn spawn_object(&mut self) -> Option<ObjectId> {
        let Some(field) = self.field.as_ref() else {
            log_field_missing("spawn");
            return None;
        };
        let span = field.width() - self.config.object_size;
        let x = if span > 0.0 { self.rng.gen_range(0.0..span) } else { 0.0 };
        self.place_object(x)
    }

    /// Add an object at the top edge with its left side at `x`
    fn place_object(&mut self, x: f64) -> Option<ObjectId> {
        let field = self.field.as_mut()?;
        let id = ObjectId(self.next_object_id);
        self.next_object_id += 1;

        let y = self.config.spawn_top;
        self.state.active_objects.push(FallingObject { id, x, y });
        field.add_object(id, x, y);
        Some(id)
    }

    fn update_frame(&mut self, now: Duration, report: &mut TickReport) {
        let Some(catcher) = self.catcher_rect() else {
            log_field_missing("update");
            return;
        };
        let Some(field) = self.field.as_mut() else {
            return;
        };
        let height = field.height();
        let size = self.config.object_size;
        let mut reached_goal = false;

        let mut index = 0;
        while index < self.state.active_objects.len() {
            let object = &mut self.state.active_objects[index];
            object.y += self.config.fall_speed;
            let (id, x, y) = (object.id, object.x, object.y);
            field.move_object(id, y);

            if Rect::new(x, y, size, size).intersects(&catcher) {
                self.state.active_objects.remove(index);
                field.remove_object(id);
                self.state.score += 1;
                report.caught += 1;
                field.show_score(self.state.score);
                if self.state.score >= self.config.goal {
                    reached_goal = true;
                    break;
                }
            } else if y > height {
                self.state.active_objects.remove(index);
                field.remove_object(id);
                report.missed += 1;
            } else {
                index += 1;
            }
        }

        if reached_goal {
            self.win(now);
            report.won = true;
        }
    }

    /// Stop both activities, clear the field, celebrate, schedule the reveal
    fn win(&mut self, now: Duration) {
        self.stop_activities();
        self.state.status = GameStatus::Won;
        if let Some(field) = self.field.as_mut() {
            for object in self.state.active_objects.drain(..) {
                field.remove_object(object.id);
            }
            field.show_message(WIN_MESSAGE);
            field.celebrate();
        }
        self.reveal_at = Some(now + self.config.reveal_delay);
        info!(score = %self.state.score, "game_won");
    }

    fn reveal(&mut self) {
        let Some(field) = self.field.as_mut() else {
            log_field_missing("reveal");
            return;
        };
        field.hide_section(Section::Game);
        field.show_section(Section::Envelope);
        info!("game_reveal");
    }
}
