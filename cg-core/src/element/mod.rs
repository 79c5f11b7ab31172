mod typewriter;
mod unit;
mod scene;

use serde::Serialize;

pub use scene::Scene;
pub use typewriter::Typewriter;
pub use unit::{Appearance, ElementKind, Phase, Speeds, TransitionUnit};

/// What a renderer needs to draw one element.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ElementView {
    pub name: String,
    pub kind: ElementKind,
    pub phase: Phase,
    pub opacity: f32,
    pub active: bool,
    /// Revealed part of the text.
    pub text: String,
    pub text_complete: bool,
    pub speaker: Option<String>,
    pub expression: Option<String>,
    /// Image shown by a scene: the current animation frame or the background.
    pub frame: Option<String>,
}
