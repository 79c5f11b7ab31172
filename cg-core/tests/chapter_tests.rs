use std::path::PathBuf;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use cg_core::chapter::list_chapters;
use cg_core::config::PlayerConfig;
use cg_core::{PlaybackState, Player, PlayerEvent};

fn chapters_root() -> PathBuf {
    PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("../chapters")
}

#[test]
fn demo_chapter_is_listed() {
    assert!(list_chapters(chapters_root()).contains(&"demo".to_string()));
}

#[tokio::test(start_paused = true)]
async fn demo_chapter_plays_through_on_fast_forward() {
    let player = Player::new(PlayerConfig::default(), chapters_root());
    player.initialize("demo").await.unwrap();
    assert_eq!(player.chapter_id().as_deref(), Some("demo"));

    let completed = Arc::new(AtomicUsize::new(0));
    let c = completed.clone();
    player
        .events()
        .on(PlayerEvent::PlayCompleted, move || {
            c.fetch_add(1, Ordering::SeqCst);
        })
        .detach();

    player.set_fast_forward(true);
    player.play().unwrap().await.unwrap().unwrap();

    assert_eq!(completed.load(Ordering::SeqCst), 1);
    assert_eq!(player.lines_dispatched(), 9);
    assert_eq!(player.state(), PlaybackState::Idle);

    let stage = player.stage().unwrap();
    let rooftop = stage.scene(1).unwrap();
    assert_eq!(rooftop.animator().current_frame().as_deref(), Some("anim/wind_3.png"));
    assert!(rooftop.unit().is_active());
}
