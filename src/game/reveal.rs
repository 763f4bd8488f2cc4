//! Post-win reveal sequence

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum RevealStage {
    #[default]
    Hidden,
    Envelope,
    Letter,
    ReasonsAvailable,
}

/// Forward-only stage machine; each step is a no-op from any other stage
#[derive(Debug, Clone, Default)]
pub struct RevealSequence {
    stage: RevealStage,
}

impl RevealSequence {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn stage(&self) -> RevealStage {
        self.stage
    }

    fn advance(&mut self, from: RevealStage, to: RevealStage) -> bool {
        if self.stage != from {
            return false;
        }
        self.stage = to;
        true
    }

    pub fn show_envelope(&mut self) -> bool {
        self.advance(RevealStage::Hidden, RevealStage::Envelope)
    }

    pub fn open_envelope(&mut self) -> bool {
        self.advance(RevealStage::Envelope, RevealStage::Letter)
    }

    pub fn show_reasons(&mut self) -> bool {
        self.advance(RevealStage::Letter, RevealStage::ReasonsAvailable)
    }
}
