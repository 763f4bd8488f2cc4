//! Game state owned by the engine

/// Newtype wrapper for falling-object ids
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[repr(transparent)]
pub struct ObjectId(pub u64);

impl std::fmt::Display for ObjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GameStatus {
    Idle,
    Running,
    Paused,
    Won,
}

impl GameStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            GameStatus::Idle => "idle",
            GameStatus::Running => "running",
            GameStatus::Paused => "paused",
            GameStatus::Won => "won",
        }
    }
}

/// One falling object; `x`/`y` are its top-left corner
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FallingObject {
    pub id: ObjectId,
    pub x: f64,
    pub y: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct GameState {
    /// Caught objects, never above the goal
    pub score: u32,
    pub status: GameStatus,
    /// Spawn order
    pub active_objects: Vec<FallingObject>,
    /// Left edge of the catcher
    pub catcher_x: f64,
}

impl Default for GameState {
    fn default() -> Self {
        Self { score: 0, status: GameStatus::Idle, active_objects: Vec::new(), catcher_x: 0.0 }
    }
}

impl GameState {
    pub fn is_running(&self) -> bool {
        self.status == GameStatus::Running
    }

    pub fn object(&self, id: ObjectId) -> Option<&FallingObject> {
        self.active_objects.iter().find(|object| object.id == id)
    }
}
