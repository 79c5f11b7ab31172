use std::collections::HashMap;
use std::io::{self, Write};

use crate::element::{ElementKind, ElementView};
use crate::event::PlayerEvent;
use crate::player::PlaybackState;
use crate::renderer::Renderer;
use crate::stage::StageSnapshot;

/// Prints what changed since the previous frame, one line per change.
///
/// Text is printed once it is fully revealed.
pub struct TerminalRenderer<W: Write = io::Stdout> {
    out: W,
    state: Option<PlaybackState>,
    shown: HashMap<String, String>,
}

impl TerminalRenderer {
    pub fn stdout() -> Self {
        Self::new(io::stdout())
    }
}

impl<W: Write> TerminalRenderer<W> {
    pub fn new(out: W) -> Self {
        Self {
            out,
            state: None,
            shown: HashMap::new(),
        }
    }

    pub fn into_inner(self) -> W {
        self.out
    }

    fn emit(&mut self, line: &str) {
        if let Err(e) = writeln!(self.out, "{line}").and_then(|_| self.out.flush()) {
            log::warn!("terminal write failed: {}", e);
        }
    }

    fn describe(view: &ElementView, text_visible: bool) -> Option<String> {
        if !view.active {
            return None;
        }
        match view.kind {
            ElementKind::Scene => Some(format!("[Scene] {} <{}>", view.name, view.frame.as_deref().unwrap_or("-"))),
            _ if !text_visible || !view.text_complete || view.text.is_empty() => None,
            ElementKind::Narration => Some(format!("[Narration] {}", view.text)),
            ElementKind::Dialog => match (&view.speaker, &view.expression) {
                (Some(who), Some(face)) => Some(format!("[Dialog] {who} ({face}): {}", view.text)),
                (Some(who), None) => Some(format!("[Dialog] {who}: {}", view.text)),
                _ => Some(format!("[Dialog] {}", view.text)),
            },
        }
    }
}

impl<W: Write> Renderer for TerminalRenderer<W> {
    fn render(&mut self, snapshot: &StageSnapshot) {
        if self.state != Some(snapshot.state) {
            self.state = Some(snapshot.state);
            self.emit(&format!("-- {:?} --", snapshot.state));
        }

        let mut seen = Vec::with_capacity(snapshot.elements.len());
        for view in &snapshot.elements {
            let Some(line) = Self::describe(view, snapshot.text_visible) else {
                continue;
            };
            seen.push(view.name.clone());
            if self.shown.get(&view.name) != Some(&line) {
                self.emit(&line);
                self.shown.insert(view.name.clone(), line);
            }
        }
        self.shown.retain(|name, _| seen.contains(name));
    }

    fn notify(&mut self, event: PlayerEvent) {
        match event {
            PlayerEvent::PlayCompleted => self.emit("== The End =="),
            PlayerEvent::HideTextAndUi | PlayerEvent::ShowTextAndUi => self.shown.clear(),
            other => self.emit(&format!("({:?})", other)),
        }
    }
}
