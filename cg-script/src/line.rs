//! In-memory form of a single script entry.
//!
//! A [`StoryLine`] is built once by the parser and shared read-only (behind an
//! `Arc`) between the cursor, the playback engine and the element that shows it.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// A tag in the script that does not name any known variant.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("unknown {kind} '{value}'")]
pub struct UnknownTag {
    pub kind: &'static str,
    pub value: String,
}

fn match_tag<T: Copy>(kind: &'static str, raw: &str, table: &[(&str, T)]) -> Result<T, UnknownTag> {
    let raw = raw.trim();
    table
        .iter()
        .find(|(name, _)| name.eq_ignore_ascii_case(raw))
        .map(|(_, v)| *v)
        .ok_or_else(|| UnknownTag { kind, value: raw.to_string() })
}

/// What a story line asks the player to do.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum LineType {
    /// Replace the current background scene.
    Scene,
    /// Fade in the next narration box of the current scene.
    Narration,
    /// Show a line in one of the dialog boxes.
    Dialog,
    /// Run the frame animation of the current scene.
    PlayAnimation,
}

impl FromStr for LineType {
    type Err = UnknownTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match_tag("line type", s, &[
            ("scene", LineType::Scene),
            ("narration", LineType::Narration),
            ("dialog", LineType::Dialog),
            ("playanimation", LineType::PlayAnimation),
            ("play_animation", LineType::PlayAnimation),
        ])
    }
}

/// Box layout hint carried by narration and dialog lines.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TextBoxType {
    #[default]
    Normal,
    NoAvatar,
    /// Keeps the narrations on screen instead of clearing them.
    ReserveAfterScene,
}

impl TextBoxType {
    pub fn reserves_narration(self) -> bool {
        matches!(self, TextBoxType::ReserveAfterScene)
    }

    /// Dialog box variant used to display a line with this box type.
    pub fn dialog_box(self) -> DialogBoxType {
        match self {
            TextBoxType::NoAvatar => DialogBoxType::NoAvatar,
            TextBoxType::Normal | TextBoxType::ReserveAfterScene => DialogBoxType::Normal,
        }
    }
}

impl FromStr for TextBoxType {
    type Err = UnknownTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match_tag("text box type", s, &[
            ("normal", TextBoxType::Normal),
            ("noavatar", TextBoxType::NoAvatar),
            ("reserveafterscene", TextBoxType::ReserveAfterScene),
            ("delayexit", TextBoxType::ReserveAfterScene),
        ])
    }
}

/// The concrete dialog box variants a stage can register.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DialogBoxType {
    /// Box with name strip and character portrait.
    Normal,
    /// Box with name strip only.
    NoAvatar,
}

impl FromStr for DialogBoxType {
    type Err = UnknownTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match_tag("dialog box type", s, &[
            ("normal", DialogBoxType::Normal),
            ("noavatar", DialogBoxType::NoAvatar),
        ])
    }
}

/// How the player moves on once a line has finished displaying.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum ContinuationMode {
    /// Advance on its own after the line's interval.
    #[default]
    Interval,
    /// Wait for a click.
    Click,
    /// Wait for a gesture.
    Gesture,
}

impl ContinuationMode {
    pub fn waits_for_input(self) -> bool {
        !matches!(self, ContinuationMode::Interval)
    }
}

impl FromStr for ContinuationMode {
    type Err = UnknownTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match_tag("continuation mode", s, &[
            ("interval", ContinuationMode::Interval),
            ("click", ContinuationMode::Click),
            ("gesture", ContinuationMode::Gesture),
        ])
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum Language {
    #[default]
    Chinese,
    English,
}

impl Language {
    pub fn toggled(self) -> Self {
        match self {
            Language::Chinese => Language::English,
            Language::English => Language::Chinese,
        }
    }
}

impl fmt::Display for Language {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Language::Chinese => f.write_str("Chinese"),
            Language::English => f.write_str("English"),
        }
    }
}

impl FromStr for Language {
    type Err = UnknownTag;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match_tag("language", s, &[
            ("chinese", Language::Chinese),
            ("zh", Language::Chinese),
            ("english", Language::English),
            ("en", Language::English),
        ])
    }
}

/// One atomic entry of a chapter script.
#[derive(Debug, Clone, PartialEq)]
pub struct StoryLine {
    pub line_type: LineType,
    pub text_box_type: TextBoxType,
    pub character: Option<String>,
    pub expression: Option<String>,
    pub continuation: ContinuationMode,
    /// Seconds to wait before advancing; `None` means the player default.
    pub interval: Option<f32>,
    text: HashMap<Language, String>,
}

impl StoryLine {
    pub fn new(line_type: LineType) -> Self {
        Self {
            line_type,
            text_box_type: TextBoxType::Normal,
            character: None,
            expression: None,
            continuation: ContinuationMode::Interval,
            interval: None,
            text: HashMap::new(),
        }
    }

    pub fn with_text(mut self, language: Language, text: impl Into<String>) -> Self {
        self.text.insert(language, text.into());
        self
    }

    pub fn with_box(mut self, text_box_type: TextBoxType) -> Self {
        self.text_box_type = text_box_type;
        self
    }

    pub fn with_character(mut self, character: impl Into<String>, expression: Option<&str>) -> Self {
        self.character = Some(character.into());
        self.expression = expression.map(str::to_string);
        self
    }

    pub fn with_continuation(mut self, mode: ContinuationMode, interval: Option<f32>) -> Self {
        self.continuation = mode;
        self.interval = interval;
        self
    }

    /// Text for `language`, or an empty string when the script has none.
    pub fn text(&self, language: Language) -> &str {
        self.text.get(&language).map(String::as_str).unwrap_or("")
    }

    pub fn has_text(&self) -> bool {
        self.text.values().any(|t| !t.is_empty())
    }
}
