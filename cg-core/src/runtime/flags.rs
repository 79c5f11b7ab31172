use std::sync::atomic::{AtomicBool, AtomicU8, Ordering};

use cg_script::Language;

/// Modifiers every in-flight operation polls once per tick.
#[derive(Debug)]
pub struct PlaybackFlags {
    paused: AtomicBool,
    auto_play: AtomicBool,
    fast_forward: AtomicBool,
    text_visible: AtomicBool,
    language: AtomicU8,
}

impl PlaybackFlags {
    pub fn new(language: Language) -> Self {
        Self {
            paused: AtomicBool::new(false),
            auto_play: AtomicBool::new(false),
            fast_forward: AtomicBool::new(false),
            text_visible: AtomicBool::new(true),
            language: AtomicU8::new(encode(language)),
        }
    }

    pub fn is_paused(&self) -> bool {
        self.paused.load(Ordering::Acquire)
    }

    pub fn set_paused(&self, v: bool) {
        self.paused.store(v, Ordering::Release);
    }

    pub fn auto_play(&self) -> bool {
        self.auto_play.load(Ordering::Acquire)
    }

    pub fn set_auto_play(&self, v: bool) {
        self.auto_play.store(v, Ordering::Release);
    }

    pub fn fast_forward(&self) -> bool {
        self.fast_forward.load(Ordering::Acquire)
    }

    pub fn set_fast_forward(&self, v: bool) {
        self.fast_forward.store(v, Ordering::Release);
    }

    pub fn text_visible(&self) -> bool {
        self.text_visible.load(Ordering::Acquire)
    }

    pub fn set_text_visible(&self, v: bool) {
        self.text_visible.store(v, Ordering::Release);
    }

    pub fn language(&self) -> Language {
        match self.language.load(Ordering::Acquire) {
            1 => Language::English,
            _ => Language::Chinese,
        }
    }

    pub fn set_language(&self, language: Language) {
        self.language.store(encode(language), Ordering::Release);
    }
}

impl Default for PlaybackFlags {
    fn default() -> Self {
        Self::new(Language::default())
    }
}

fn encode(language: Language) -> u8 {
    match language {
        Language::Chinese => 0,
        Language::English => 1,
    }
}
