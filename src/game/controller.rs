//! Input and visibility controller
//!
//! Translates host events into engine calls:
//! - pointer movement (mouse or first touch point) moves the catcher while
//!   the game runs
//! - the page becoming hidden pauses a running game; becoming visible resumes
//!   it only if it was this controller that paused it
//! - the start and envelope buttons drive the surrounding page flow

use crate::game::engine::{GameConfig, GameEngine, TickReport};
use crate::game::reveal::{RevealSequence, RevealStage};
use crate::game::state::GameStatus;
use crate::game::surface::{PlayField, Section};
use rand::Rng;
use std::time::Duration;
use tracing::{debug, info};

/// Pointer input in page coordinates
#[derive(Debug, Clone, PartialEq)]
pub enum PointerEvent {
    Mouse { client_x: f64 },
    /// Current touch points' x; only the first is used
    Touch { touches: Vec<f64> },
}

impl PointerEvent {
    fn client_x(&self) -> Option<f64> {
        match self {
            PointerEvent::Mouse { client_x } => Some(*client_x),
            PointerEvent::Touch { touches } => touches.first().copied(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    Hidden,
}

#[derive(Debug, Clone)]
pub struct Controller {
    /// Page x of the play field's left edge
    field_left: f64,
    start_delay: Duration,
    reasons_delay: Duration,
    hidden: bool,
    /// Set only when a visibility change paused a running game
    auto_paused: bool,
    start_at: Option<Duration>,
    reasons_at: Option<Duration>,
    reveal: RevealSequence,
}

impl Controller {
    pub fn new(config: &GameConfig) -> Self {
        Self {
            field_left: 0.0,
            start_delay: config.start_delay,
            reasons_delay: config.reasons_delay,
            hidden: false,
            auto_paused: false,
            start_at: None,
            reasons_at: None,
            reveal: RevealSequence::new(),
        }
    }

    /// Host reports where the play field sits on the page (after layout or resize)
    pub fn set_field_left(&mut self, left: f64) {
        self.field_left = left;
    }

    pub fn is_auto_paused(&self) -> bool {
        self.auto_paused
    }

    pub fn reveal_stage(&self) -> RevealStage {
        self.reveal.stage()
    }

    pub fn on_pointer<F: PlayField, R: Rng>(
        &mut self,
        engine: &mut GameEngine<F, R>,
        event: &PointerEvent,
    ) -> bool {
        if engine.status() != GameStatus::Running {
            return false;
        }
        match event.client_x() {
            Some(client_x) => engine.move_catcher(client_x - self.field_left),
            None => false,
        }
    }

    pub fn on_visibility<F: PlayField, R: Rng>(
        &mut self,
        engine: &mut GameEngine<F, R>,
        visibility: Visibility,
        now: Duration,
    ) -> bool {
        match visibility {
            Visibility::Hidden => {
                self.hidden = true;
                if engine.status() == GameStatus::Running && engine.pause() {
                    self.auto_paused = true;
                    return true;
                }
                false
            }
            Visibility::Visible => {
                self.hidden = false;
                if !self.auto_paused {
                    return false;
                }
                self.auto_paused = false;
                engine.resume(now)
            }
        }
    }

    /// Close the intro and schedule the game start
    pub fn on_start_clicked<F: PlayField, R: Rng>(
        &mut self,
        engine: &mut GameEngine<F, R>,
        now: Duration,
    ) -> bool {
        if self.start_at.is_some()
            || matches!(engine.status(), GameStatus::Running | GameStatus::Paused)
        {
            debug!(status = %engine.status().as_str(), "start_click_ignored");
            return false;
        }
        if let Some(field) = engine.field_mut() {
            field.hide_section(Section::IntroModal);
        }
        self.start_at = Some(now + self.start_delay);
        true
    }

    /// Envelope → letter; the reasons button follows after a short delay
    pub fn on_envelope_clicked<F: PlayField, R: Rng>(
        &mut self,
        engine: &mut GameEngine<F, R>,
        now: Duration,
    ) -> bool {
        if !self.reveal.open_envelope() {
            return false;
        }
        if let Some(field) = engine.field_mut() {
            field.hide_section(Section::Envelope);
            field.show_section(Section::Letter);
        }
        self.reasons_at = Some(now + self.reasons_delay);
        info!("envelope_opened");
        true
    }

    /// A fresh play-through starts with the reveal sections closed
    fn reset_reveal<F: PlayField, R: Rng>(&mut self, engine: &mut GameEngine<F, R>) {
        self.reveal = RevealSequence::new();
        self.reasons_at = None;
        if let Some(field) = engine.field_mut() {
            for section in [Section::Envelope, Section::Letter, Section::ReasonsButton] {
                field.hide_section(section);
            }
        }
    }

    /// Run due controller timers, then the engine's tick
    pub fn tick<F: PlayField, R: Rng>(
        &mut self,
        engine: &mut GameEngine<F, R>,
        now: Duration,
    ) -> TickReport {
        if self.start_at.is_some_and(|at| now >= at) {
            self.start_at = None;
            self.auto_paused = false;
            if engine.start(now) {
                self.reset_reveal(engine);
                // Started while the page is hidden: hold it paused until visible
                if self.hidden && engine.pause() {
                    self.auto_paused = true;
                }
            }
        }

        let report = engine.tick(now);
        if report.revealed {
            self.reveal.show_envelope();
        }

        if self.reasons_at.is_some_and(|at| now >= at) {
            self.reasons_at = None;
            if self.reveal.show_reasons() {
                if let Some(field) = engine.field_mut() {
                    field.show_section(Section::ReasonsButton);
                }
            }
        }

        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::game::surface::HeadlessField;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    const FRAME: Duration = Duration::from_millis(16);

    fn setup(width: f64) -> (Controller, GameEngine<HeadlessField>) {
        let config = GameConfig::default();
        let controller = Controller::new(&config);
        let engine =
            GameEngine::new(config, Some(HeadlessField::new(width, 200.0)), StdRng::seed_from_u64(3));
        (controller, engine)
    }

    fn started(width: f64) -> (Controller, GameEngine<HeadlessField>) {
        let (mut controller, mut engine) = setup(width);
        assert!(controller.on_start_clicked(&mut engine, Duration::ZERO));
        controller.tick(&mut engine, Duration::from_millis(400));
        assert_eq!(engine.status(), GameStatus::Running);
        (controller, engine)
    }

    #[test]
    fn test_start_click_hides_intro_and_delays_start() {
        let (mut controller, mut engine) = setup(400.0);
        assert!(engine.field().unwrap().is_visible(Section::IntroModal));

        assert!(controller.on_start_clicked(&mut engine, Duration::ZERO));
        assert!(!engine.field().unwrap().is_visible(Section::IntroModal));
        assert!(!controller.on_start_clicked(&mut engine, Duration::from_millis(100)));

        controller.tick(&mut engine, Duration::from_millis(399));
        assert_eq!(engine.status(), GameStatus::Idle);
        controller.tick(&mut engine, Duration::from_millis(400));
        assert_eq!(engine.status(), GameStatus::Running);
    }

    #[test]
    fn test_pointer_moves_catcher_relative_to_field() {
        let (mut controller, mut engine) = started(400.0);
        controller.set_field_left(100.0);

        assert!(controller.on_pointer(&mut engine, &PointerEvent::Mouse { client_x: 300.0 }));
        assert_eq!(engine.state().catcher_x, 160.0);

        let touch = PointerEvent::Touch { touches: vec![150.0, 390.0] };
        assert!(controller.on_pointer(&mut engine, &touch));
        assert_eq!(engine.state().catcher_x, 10.0);

        let no_touch = PointerEvent::Touch { touches: vec![] };
        assert!(!controller.on_pointer(&mut engine, &no_touch));
        assert_eq!(engine.state().catcher_x, 10.0);
    }

    #[test]
    fn test_pointer_ignored_unless_running() {
        let (mut controller, mut engine) = setup(400.0);
        assert!(!controller.on_pointer(&mut engine, &PointerEvent::Mouse { client_x: 0.0 }));

        let (mut controller, mut engine) = started(400.0);
        engine.pause();
        assert!(!controller.on_pointer(&mut engine, &PointerEvent::Mouse { client_x: 0.0 }));
        assert_eq!(engine.state().catcher_x, 160.0);
    }

    #[test]
    fn test_hidden_pauses_and_visible_resumes() {
        let (mut controller, mut engine) = started(400.0);

        assert!(controller.on_visibility(&mut engine, Visibility::Hidden, Duration::from_secs(1)));
        assert_eq!(engine.status(), GameStatus::Paused);
        assert!(controller.is_auto_paused());

        assert!(controller.on_visibility(&mut engine, Visibility::Visible, Duration::from_secs(9)));
        assert_eq!(engine.status(), GameStatus::Running);
        assert!(!controller.is_auto_paused());
    }

    #[test]
    fn test_visible_does_not_resume_a_manual_pause() {
        let (mut controller, mut engine) = started(400.0);
        engine.pause();

        assert!(!controller.on_visibility(&mut engine, Visibility::Hidden, Duration::from_secs(1)));
        assert!(!controller.on_visibility(&mut engine, Visibility::Visible, Duration::from_secs(2)));
        assert_eq!(engine.status(), GameStatus::Paused);
    }

    #[test]
    fn test_visibility_ignored_when_idle() {
        let (mut controller, mut engine) = setup(400.0);
        assert!(!controller.on_visibility(&mut engine, Visibility::Hidden, Duration::ZERO));
        assert!(!controller.on_visibility(&mut engine, Visibility::Visible, Duration::ZERO));
        assert_eq!(engine.status(), GameStatus::Idle);
    }

    #[test]
    fn test_start_while_hidden_stays_paused_until_visible() {
        let (mut controller, mut engine) = setup(400.0);
        controller.on_start_clicked(&mut engine, Duration::ZERO);
        controller.on_visibility(&mut engine, Visibility::Hidden, Duration::from_millis(100));

        controller.tick(&mut engine, Duration::from_millis(400));
        assert_eq!(engine.status(), GameStatus::Paused);
        assert!(!engine.activities_running());

        controller.on_visibility(&mut engine, Visibility::Visible, Duration::from_secs(3));
        assert_eq!(engine.status(), GameStatus::Running);
    }

    /// Tick every frame from `from` until the engine reports a win
    fn play_to_win(
        controller: &mut Controller,
        engine: &mut GameEngine<HeadlessField>,
        from: Duration,
    ) -> Duration {
        let mut now = from;
        while now < from + Duration::from_secs(60) {
            now += FRAME;
            if controller.tick(engine, now).won {
                return now;
            }
        }
        panic!("game never won");
    }

    #[test]
    fn test_restart_after_reveal_runs_a_fresh_sequence() {
        let (mut controller, mut engine) = started(80.0);

        let won_at = play_to_win(&mut controller, &mut engine, Duration::from_millis(400));
        controller.tick(&mut engine, won_at + Duration::from_millis(1500));
        let opened_at = won_at + Duration::from_secs(2);
        assert!(controller.on_envelope_clicked(&mut engine, opened_at));
        controller.tick(&mut engine, opened_at + Duration::from_millis(500));
        assert_eq!(controller.reveal_stage(), RevealStage::ReasonsAvailable);

        let restart_at = opened_at + Duration::from_secs(1);
        assert!(controller.on_start_clicked(&mut engine, restart_at));
        let started_at = restart_at + Duration::from_millis(400);
        controller.tick(&mut engine, started_at);
        assert_eq!(engine.status(), GameStatus::Running);
        assert_eq!(controller.reveal_stage(), RevealStage::Hidden);
        let field = engine.field().unwrap();
        assert!(field.is_visible(Section::Game));
        for section in [Section::Envelope, Section::Letter, Section::ReasonsButton] {
            assert!(!field.is_visible(section), "{section:?} still visible");
        }

        let won_again = play_to_win(&mut controller, &mut engine, started_at);
        controller.tick(&mut engine, won_again + Duration::from_millis(1500));
        assert_eq!(controller.reveal_stage(), RevealStage::Envelope);
        assert!(controller.on_envelope_clicked(&mut engine, won_again + Duration::from_secs(2)));
        assert_eq!(controller.reveal_stage(), RevealStage::Letter);
    }

    #[test]
    fn test_win_then_reveal_sequence() {
        // Catcher as wide as the field: every object is caught
        let (mut controller, mut engine) = started(80.0);

        let mut now = Duration::from_millis(400);
        let mut won_at = None;
        while now < Duration::from_secs(60) {
            now += FRAME;
            if controller.tick(&mut engine, now).won {
                won_at = Some(now);
                break;
            }
        }
        let won_at = won_at.expect("game never won");
        assert_eq!(engine.score(), 15);

        // Hidden/visible after the win never resumes the game
        assert!(!controller.on_visibility(&mut engine, Visibility::Hidden, won_at));
        assert!(!controller.on_visibility(&mut engine, Visibility::Visible, won_at));
        assert_eq!(engine.status(), GameStatus::Won);

        assert!(!controller.on_envelope_clicked(&mut engine, won_at));
        controller.tick(&mut engine, won_at + Duration::from_millis(1500));
        assert_eq!(controller.reveal_stage(), RevealStage::Envelope);

        let opened_at = won_at + Duration::from_secs(2);
        assert!(controller.on_envelope_clicked(&mut engine, opened_at));
        assert_eq!(controller.reveal_stage(), RevealStage::Letter);
        let field = engine.field().unwrap();
        assert!(field.is_visible(Section::Letter));
        assert!(!field.is_visible(Section::Envelope));

        controller.tick(&mut engine, opened_at + Duration::from_millis(499));
        assert!(!engine.field().unwrap().is_visible(Section::ReasonsButton));
        controller.tick(&mut engine, opened_at + Duration::from_millis(500));
        assert!(engine.field().unwrap().is_visible(Section::ReasonsButton));
        assert_eq!(controller.reveal_stage(), RevealStage::ReasonsAvailable);
    }
}
