//! The registry of every element a chapter can show.
//!
//! A chapter's `stage.toml` lists its scenes (each with background, frame
//! animation and narration slots) and its dialog boxes. The [`Stage`] built
//! from it is fixed for the lifetime of the chapter.

use std::collections::HashSet;

use cg_script::{DialogBoxType, Language};
use serde::{Deserialize, Serialize};

use crate::animator::SceneAnimator;
use crate::config::PlayerConfig;
use crate::dialog::DialogCoordinator;
use crate::element::{Appearance, ElementKind, ElementView, Scene, Speeds, TransitionUnit};
use crate::error::{CgError, Result};
use crate::player::PlaybackState;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageLayout {
    /// Font file, relative to the chapter directory.
    #[serde(default)]
    pub font: Option<String>,
    /// Script file, relative to the chapter directory.
    #[serde(default = "default_script")]
    pub script: String,
    #[serde(default, rename = "scene")]
    pub scenes: Vec<SceneLayout>,
    #[serde(default, rename = "dialog")]
    pub dialogs: Vec<DialogLayout>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SceneLayout {
    pub name: String,
    pub background: String,
    #[serde(default)]
    pub frames: Vec<String>,
    #[serde(default)]
    pub frame_rate: Option<u32>,
    /// Narration slot names in display order.
    #[serde(default)]
    pub narrations: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DialogLayout {
    #[serde(rename = "box")]
    pub box_type: DialogBoxType,
    #[serde(default)]
    pub appearance: Appearance,
}

fn default_script() -> String {
    "script.json".into()
}

impl StageLayout {
    pub fn from_toml(src: &str) -> Result<Self> {
        Ok(toml::from_str(src)?)
    }
}

pub struct Stage {
    scenes: Vec<Scene>,
    dialogs: DialogCoordinator,
}

impl Stage {
    pub fn build(layout: &StageLayout, config: &PlayerConfig) -> Result<Self> {
        let speeds = Speeds::from(config);
        if speeds.fade <= 0.0 || speeds.typing <= 0.0 || speeds.fast_typing <= 0.0 {
            return Err(CgError::Config(format!("fade and typing speeds must be positive, got {:?}", speeds)));
        }

        let mut names = HashSet::new();
        let mut scenes = Vec::with_capacity(layout.scenes.len());
        for sl in &layout.scenes {
            if !names.insert(sl.name.as_str()) {
                return Err(CgError::Config(format!("duplicate scene '{}'", sl.name)));
            }
            let frame_rate = sl.frame_rate.unwrap_or(config.frame_rate);
            if frame_rate == 0 {
                return Err(CgError::Config(format!("scene '{}' has a frame rate of 0", sl.name)));
            }
            let mut slots = HashSet::new();
            for slot in &sl.narrations {
                if !slots.insert(slot.as_str()) {
                    return Err(CgError::Config(format!("scene '{}' repeats narration slot '{}'", sl.name, slot)));
                }
            }

            let animator = SceneAnimator::new(sl.frames.clone(), frame_rate);
            scenes.push(Scene::new(&sl.name, &sl.background, animator, &sl.narrations, speeds));
        }

        let dialog_layouts = if layout.dialogs.is_empty() {
            log::debug!("Stage declares no dialog boxes, registering the default ones");
            vec![
                DialogLayout { box_type: DialogBoxType::Normal, appearance: Appearance::Fade },
                DialogLayout { box_type: DialogBoxType::NoAvatar, appearance: Appearance::Fade },
            ]
        } else {
            layout.dialogs.clone()
        };

        let mut boxes = Vec::with_capacity(dialog_layouts.len());
        for dl in dialog_layouts {
            if boxes.iter().any(|(t, _)| *t == dl.box_type) {
                return Err(CgError::Config(format!("dialog box {:?} declared twice", dl.box_type)));
            }
            let name = format!("dialog/{:?}", dl.box_type);
            boxes.push((dl.box_type, TransitionUnit::new(name, ElementKind::Dialog, dl.appearance, speeds)));
        }

        Ok(Self {
            scenes,
            dialogs: DialogCoordinator::new(boxes),
        })
    }

    pub fn scene(&self, index: usize) -> Option<&Scene> {
        self.scenes.get(index)
    }

    pub fn scenes(&self) -> &[Scene] {
        &self.scenes
    }

    pub fn scene_count(&self) -> usize {
        self.scenes.len()
    }

    pub fn dialogs(&self) -> &DialogCoordinator {
        &self.dialogs
    }

    /// Snaps every in-flight transition, text reveal and animation.
    pub fn skip_all(&self) {
        for scene in &self.scenes {
            scene.skip();
        }
        self.dialogs.skip();
    }

    /// Hides everything immediately.
    pub fn reset(&self) {
        for scene in &self.scenes {
            scene.reset();
        }
        self.dialogs.reset();
    }

    /// Views of every visible element: scenes, then narrations, then dialogs.
    pub fn views(&self) -> Vec<ElementView> {
        let mut views: Vec<ElementView> = self
            .scenes
            .iter()
            .filter(|s| s.unit().is_active())
            .map(Scene::view)
            .collect();
        views.extend(
            self.scenes
                .iter()
                .flat_map(|s| s.narrations().iter())
                .filter(|n| n.is_active())
                .map(TransitionUnit::view),
        );
        views.extend(self.dialogs.views());
        views
    }
}

/// Everything a host renderer needs for one frame.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct StageSnapshot {
    pub state: PlaybackState,
    pub language: Language,
    pub auto_play: bool,
    pub fast_forward: bool,
    pub text_visible: bool,
    pub elements: Vec<ElementView>,
}
