/// Progressive character reveal for narration and dialog text.
#[derive(Debug, Clone, Default)]
pub struct Typewriter {
    full_text: String,
    chars: Vec<char>,

    pub display_text: String,
    progress: f32,
    shown: usize,
    finished: bool,
}

impl Typewriter {
    pub fn new() -> Self {
        Self {
            finished: true,
            ..Self::default()
        }
    }

    /// Loads `text` with nothing revealed yet.
    pub fn set_text(&mut self, text: &str) {
        self.full_text = text.to_string();
        self.chars = text.chars().collect(); // 按 Unicode 字符计数
        self.progress = 0.0;
        self.finished = self.chars.is_empty();
        self.update_display_text(0);
    }

    /// Advances the reveal by `speed * dt` characters. Returns `true` once
    /// every character is shown.
    pub fn update(&mut self, dt: f32, speed: f32) -> bool {
        if !self.finished {
            self.progress += speed.max(0.0) * dt.max(0.0);
            let char_count = self.chars.len();
            let visible_count = (self.progress as usize).min(char_count);

            if visible_count != self.shown {
                self.update_display_text(visible_count);
            }
            if visible_count >= char_count {
                self.finished = true;
            }
        }
        self.finished
    }

    pub fn skip(&mut self) {
        self.progress = self.chars.len() as f32;
        self.update_display_text(self.chars.len());
        self.finished = true;
    }

    pub fn clear(&mut self) {
        self.set_text("");
    }

    /// Swaps in a translation while keeping the revealed fraction.
    pub fn relocalize(&mut self, text: &str) {
        if self.full_text == text {
            return;
        }
        let fraction = if self.finished || self.chars.is_empty() {
            1.0
        } else {
            self.shown as f32 / self.chars.len() as f32
        };
        let was_finished = self.finished;

        self.full_text = text.to_string();
        self.chars = text.chars().collect();
        let visible_count = if was_finished {
            self.chars.len()
        } else {
            ((fraction * self.chars.len() as f32) as usize).min(self.chars.len())
        };
        self.progress = visible_count as f32;
        self.finished = was_finished || visible_count >= self.chars.len();
        self.update_display_text(visible_count);
    }

    fn update_display_text(&mut self, visible_count: usize) {
        self.shown = visible_count;
        self.display_text = self.chars[..visible_count].iter().collect();
    }

    pub fn shown(&self) -> usize {
        self.shown
    }

    pub fn len(&self) -> usize {
        self.chars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.chars.is_empty()
    }

    pub fn full_text(&self) -> &str {
        &self.full_text
    }

    pub fn is_active(&self) -> bool {
        !self.finished
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reveals_by_speed_and_time() {
        let mut tw = Typewriter::new();
        tw.set_text("你好世界");
        assert_eq!(tw.display_text, "");

        assert!(!tw.update(0.25, 4.0));
        assert_eq!(tw.display_text, "你");
        assert!(!tw.update(0.5, 4.0));
        assert_eq!(tw.shown(), 3);
        assert!(tw.update(0.5, 4.0));
        assert_eq!(tw.display_text, "你好世界");
        assert!(!tw.is_active());
    }

    #[test]
    fn shown_count_never_decreases() {
        let mut tw = Typewriter::new();
        tw.set_text("Hello there");
        let mut last = 0;
        for dt in [0.1, 0.0, 0.3, -1.0, 0.05, 2.0] {
            tw.update(dt, 10.0);
            assert!(tw.shown() >= last);
            last = tw.shown();
        }
        assert_eq!(last, tw.len());
    }

    #[test]
    fn skip_reveals_everything() {
        let mut tw = Typewriter::new();
        tw.set_text("Hi Bob");
        tw.update(0.1, 10.0);
        tw.skip();
        assert_eq!(tw.display_text, "Hi Bob");
        assert!(!tw.is_active());
    }

    #[test]
    fn empty_text_is_already_finished() {
        let mut tw = Typewriter::new();
        tw.set_text("");
        assert!(!tw.is_active());
        assert!(tw.update(0.1, 10.0));
    }

    #[test]
    fn relocalize_keeps_fraction() {
        let mut tw = Typewriter::new();
        tw.set_text("abcd");
        tw.update(0.2, 10.0);
        assert_eq!(tw.shown(), 2);

        tw.relocalize("abcdefgh");
        assert_eq!(tw.shown(), 4);
        assert!(tw.is_active());
        assert!(tw.update(0.4, 10.0));
        assert_eq!(tw.display_text, "abcdefgh");

        tw.relocalize("完成");
        assert_eq!(tw.display_text, "完成");
        assert!(!tw.is_active());
    }
}
