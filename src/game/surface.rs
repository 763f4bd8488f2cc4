//! Play-field surface
//!
//! Everything the engine shows goes through `PlayField`: the falling objects,
//! the catcher, the score line, page sections and the win celebration. A
//! browser host binds it to DOM elements; `HeadlessField` keeps the same
//! information in memory for simulation and tests.

use crate::game::state::ObjectId;
use std::collections::BTreeMap;

/// Page sections the game flow shows and hides
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Section {
    IntroModal,
    Game,
    Envelope,
    Letter,
    ReasonsButton,
}

pub trait PlayField {
    /// Current play-field size in pixels
    fn width(&self) -> f64;
    fn height(&self) -> f64;

    fn add_object(&mut self, id: ObjectId, x: f64, y: f64);
    fn move_object(&mut self, id: ObjectId, y: f64);
    fn remove_object(&mut self, id: ObjectId);

    fn move_catcher(&mut self, x: f64);

    fn show_score(&mut self, score: u32);
    fn show_goal(&mut self, goal: u32);
    fn show_message(&mut self, message: &str);

    fn show_section(&mut self, section: Section);
    fn hide_section(&mut self, section: Section);

    /// Win effect (confetti). Optional; a field without one ignores it.
    fn celebrate(&mut self) {}
}

/// In-memory play field
#[derive(Debug, Clone, Default)]
pub struct HeadlessField {
    width: f64,
    height: f64,
    /// Live object elements and their (x, y)
    pub objects: BTreeMap<ObjectId, (f64, f64)>,
    pub catcher_x: f64,
    pub score_text: String,
    pub goal_text: String,
    pub message: String,
    pub visible: Vec<Section>,
    pub celebrations: u32,
    /// Every object element ever created
    pub created: u64,
}

impl HeadlessField {
    pub fn new(width: f64, height: f64) -> Self {
        Self { width, height, visible: vec![Section::IntroModal], ..Self::default() }
    }

    pub fn is_visible(&self, section: Section) -> bool {
        self.visible.contains(&section)
    }

    pub fn live_objects(&self) -> usize {
        self.objects.len()
    }
}

impl PlayField for HeadlessField {
    fn width(&self) -> f64 {
        self.width
    }

    fn height(&self) -> f64 {
        self.height
    }

    fn add_object(&mut self, id: ObjectId, x: f64, y: f64) {
        self.objects.insert(id, (x, y));
        self.created += 1;
    }

    fn move_object(&mut self, id: ObjectId, y: f64) {
        if let Some(position) = self.objects.get_mut(&id) {
            position.1 = y;
        }
    }

    fn remove_object(&mut self, id: ObjectId) {
        self.objects.remove(&id);
    }

    fn move_catcher(&mut self, x: f64) {
        self.catcher_x = x;
    }

    fn show_score(&mut self, score: u32) {
        self.score_text = score.to_string();
    }

    fn show_goal(&mut self, goal: u32) {
        self.goal_text = goal.to_string();
    }

    fn show_message(&mut self, message: &str) {
        self.message = message.to_string();
    }

    fn show_section(&mut self, section: Section) {
        if !self.visible.contains(&section) {
            self.visible.push(section);
        }
    }

    fn hide_section(&mut self, section: Section) {
        self.visible.retain(|s| *s != section);
    }

    fn celebrate(&mut self) {
        self.celebrations += 1;
    }
}
