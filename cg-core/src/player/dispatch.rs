//! Per-line dispatch table.
//!
//! [`Progress`] holds the counters of one play session: which scene is
//! current, which narration slot comes next, and the reserved narrations
//! still on screen from an earlier scene.

use std::sync::Arc;

use cg_script::{LineType, StoryLine};
use tokio::task::JoinSet;

use crate::element::{Scene, TransitionUnit};
use crate::error::{CgError, Result};
use crate::runtime::{Outcome, Pacer};
use crate::stage::Stage;

#[derive(Default)]
pub(crate) struct Progress {
    scene: Option<usize>,
    narration: usize,
    carried: Vec<TransitionUnit>,
}

impl Progress {
    #[cfg(test)]
    fn scene(&self) -> Option<usize> {
        self.scene
    }

    #[cfg(test)]
    fn narration(&self) -> usize {
        self.narration
    }

    pub async fn dispatch(&mut self, stage: &Arc<Stage>, line: Arc<StoryLine>, pacer: &Pacer) -> Result<Outcome> {
        match line.line_type {
            LineType::Scene => self.enter_scene(stage, &line, pacer).await,
            LineType::Narration => self.enter_narration(stage, line, pacer).await,
            LineType::Dialog => self.enter_dialog(stage, line, pacer).await,
            LineType::PlayAnimation => {
                let scene = self.current_scene(stage, "PlayAnimation")?;
                Ok(stage_scene(stage, scene)?.animator().play(pacer).await)
            }
        }
    }

    async fn enter_scene(&mut self, stage: &Arc<Stage>, line: &StoryLine, pacer: &Pacer) -> Result<Outcome> {
        let next = self.scene.map_or(0, |i| i + 1);
        if next >= stage.scene_count() {
            return Err(CgError::Config(format!(
                "scene #{} requested but the stage declares {} scene(s)",
                next + 1,
                stage.scene_count()
            )));
        }

        if let Some(prev) = self.scene {
            let prev = stage_scene(stage, prev)?;
            let mut exits = JoinSet::new();

            let unit = prev.unit().clone();
            let p = pacer.clone();
            exits.spawn(async move { unit.exit(&p).await });

            let st = stage.clone();
            let p = pacer.clone();
            exits.spawn(async move { st.dialogs().exit(&p).await });

            let shown = prev.narrations().iter().filter(|n| n.is_active()).cloned();
            if line.text_box_type.reserves_narration() {
                // 保留的旁白跟到下一个场景，直到下一次清场
                self.carried.extend(shown);
            } else {
                for unit in shown.chain(self.carried.drain(..)) {
                    let p = pacer.clone();
                    exits.spawn(async move { unit.exit(&p).await });
                }
            }

            if join_all(exits).await?.is_cancelled() {
                return Ok(Outcome::Cancelled);
            }
        }

        self.scene = Some(next);
        self.narration = 0;
        Ok(stage_scene(stage, next)?.unit().enter(pacer).await)
    }

    async fn enter_narration(&mut self, stage: &Arc<Stage>, line: Arc<StoryLine>, pacer: &Pacer) -> Result<Outcome> {
        let scene = stage_scene(stage, self.current_scene(stage, "Narration")?)?;
        let unit = scene.narration(self.narration).ok_or_else(|| {
            CgError::Config(format!(
                "narration #{} requested but scene '{}' has {} slot(s)",
                self.narration + 1,
                scene.name(),
                scene.narrations().len()
            ))
        })?;

        if stage.dialogs().exit(pacer).await.is_cancelled() {
            return Ok(Outcome::Cancelled);
        }

        unit.configure(line, pacer.flags().language());
        let outcome = unit.enter(pacer).await;
        if !outcome.is_cancelled() {
            self.narration += 1;
        }
        Ok(outcome)
    }

    async fn enter_dialog(&mut self, stage: &Arc<Stage>, line: Arc<StoryLine>, pacer: &Pacer) -> Result<Outcome> {
        if !line.text_box_type.reserves_narration() {
            let mut exits = JoinSet::new();
            let shown: Vec<TransitionUnit> = match self.scene.and_then(|i| stage.scene(i)) {
                Some(scene) => scene.narrations().iter().filter(|n| n.is_active()).cloned().collect(),
                None => Vec::new(),
            };
            for unit in shown.into_iter().chain(self.carried.drain(..)) {
                let p = pacer.clone();
                exits.spawn(async move { unit.exit(&p).await });
            }
            if join_all(exits).await?.is_cancelled() {
                return Ok(Outcome::Cancelled);
            }
        }

        stage.dialogs().enter(line, pacer).await
    }

    fn current_scene(&self, stage: &Stage, what: &str) -> Result<usize> {
        self.scene.filter(|&i| i < stage.scene_count()).ok_or_else(|| {
            CgError::Config(format!("{what} line before any scene"))
        })
    }
}

fn stage_scene(stage: &Stage, index: usize) -> Result<&Scene> {
    stage
        .scene(index)
        .ok_or_else(|| CgError::Config(format!("scene index {index} out of range")))
}

/// Awaits every task; cancelled if any of them was.
async fn join_all(mut set: JoinSet<Outcome>) -> Result<Outcome> {
    let mut outcome = Outcome::Completed;
    while let Some(res) = set.join_next().await {
        outcome = outcome.and(res?);
    }
    Ok(outcome)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::PlayerConfig;
    use crate::event::EventHub;
    use crate::runtime::PlaybackFlags;
    use crate::stage::StageLayout;
    use cg_script::{Language, TextBoxType};
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;

    fn stage() -> Arc<Stage> {
        let layout = StageLayout::from_toml(
            "[[scene]]\nname = \"s1\"\nbackground = \"1.png\"\nnarrations = [\"n1\", \"n2\"]\n\
             [[scene]]\nname = \"s2\"\nbackground = \"2.png\"\nframes = [\"a.png\", \"b.png\"]\n",
        )
        .unwrap();
        Arc::new(Stage::build(&layout, &PlayerConfig::default()).unwrap())
    }

    fn pacer() -> Pacer {
        Pacer::new(
            CancellationToken::new(),
            Arc::new(PlaybackFlags::new(Language::English)),
            EventHub::new(),
            Duration::from_millis(16),
        )
    }

    fn line(t: LineType, text: &str) -> Arc<StoryLine> {
        Arc::new(StoryLine::new(t).with_text(Language::English, text))
    }

    #[tokio::test(start_paused = true)]
    async fn narration_before_scene_is_rejected() {
        let mut progress = Progress::default();
        let err = progress.dispatch(&stage(), line(LineType::Narration, "x"), &pacer()).await.unwrap_err();
        assert!(matches!(err, CgError::Config(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn narration_slots_run_out() {
        let stage = stage();
        let pacer = pacer();
        let mut progress = Progress::default();
        progress.dispatch(&stage, line(LineType::Scene, ""), &pacer).await.unwrap();
        for text in ["one", "two"] {
            let out = progress.dispatch(&stage, line(LineType::Narration, text), &pacer).await.unwrap();
            assert_eq!(out, Outcome::Completed);
        }
        assert_eq!(progress.narration(), 2);
        let err = progress.dispatch(&stage, line(LineType::Narration, "three"), &pacer).await.unwrap_err();
        assert!(matches!(err, CgError::Config(_)));
    }

    #[tokio::test(start_paused = true)]
    async fn scene_past_the_last_is_rejected() {
        let stage = stage();
        let pacer = pacer();
        let mut progress = Progress::default();
        progress.dispatch(&stage, line(LineType::Scene, ""), &pacer).await.unwrap();
        progress.dispatch(&stage, line(LineType::Scene, ""), &pacer).await.unwrap();
        assert_eq!(progress.scene(), Some(1));
        assert!(progress.dispatch(&stage, line(LineType::Scene, ""), &pacer).await.is_err());
    }

    #[tokio::test(start_paused = true)]
    async fn reserved_narrations_survive_until_next_dialog() {
        let stage = stage();
        let pacer = pacer();
        let mut progress = Progress::default();
        progress.dispatch(&stage, line(LineType::Scene, ""), &pacer).await.unwrap();
        progress.dispatch(&stage, line(LineType::Narration, "kept"), &pacer).await.unwrap();

        let reserve = Arc::new(StoryLine::new(LineType::Scene).with_box(TextBoxType::ReserveAfterScene));
        progress.dispatch(&stage, reserve, &pacer).await.unwrap();

        let n1 = stage.scene(0).unwrap().narration(0).unwrap();
        assert!(!stage.scene(0).unwrap().unit().is_active());
        assert!(n1.is_active());
        assert_eq!(n1.displayed_text(), "kept");

        progress.dispatch(&stage, line(LineType::Dialog, "Hi"), &pacer).await.unwrap();
        assert!(!n1.is_active());
    }

    #[tokio::test(start_paused = true)]
    async fn animation_plays_on_current_scene() {
        let stage = stage();
        let pacer = pacer();
        let mut progress = Progress::default();
        progress.dispatch(&stage, line(LineType::Scene, ""), &pacer).await.unwrap();
        progress.dispatch(&stage, line(LineType::Scene, ""), &pacer).await.unwrap();
        let out = progress.dispatch(&stage, line(LineType::PlayAnimation, ""), &pacer).await.unwrap();
        assert_eq!(out, Outcome::Completed);
        assert_eq!(stage.scene(1).unwrap().animator().current_frame().as_deref(), Some("b.png"));
    }
}
