//! Integration tests for Slidecast Core

use async_trait::async_trait;
use slidecast_core::{
    sim::{SimCommand, SimHarness},
    DeactivationPolicy, Error, PlayerState, ProviderKind, Readiness, Result, SdkEventKind,
    SdkLoader, SlideId, VideoConfig, VideoEvent,
};

const VIDEO: SlideId = SlideId(0);
const OTHER: SlideId = SlideId(1);
const IMAGE: SlideId = SlideId(2);

fn harness(config: VideoConfig) -> SimHarness {
    let _ = tracing_subscriber::fmt()
        .with_env_filter("slidecast_core=debug")
        .with_test_writer()
        .try_init();

    let mut harness = SimHarness::new(config);
    harness.add_slide(VIDEO, ProviderKind::Vimeo, "https://vimeo.com/123");
    harness.add_slide(OTHER, ProviderKind::YouTube, "https://youtu.be/dQw4w9WgXcQ");
    harness
}

// =============================================================================
// Playback scenarios
// =============================================================================

#[test]
fn test_ready_while_active_plays_once() {
    let mut h = harness(VideoConfig::keep_warm());

    h.go_to(VIDEO);
    assert_eq!(h.state(VIDEO), Some(PlayerState::Initializing));
    assert_eq!(h.sdk.commands(VIDEO), vec![SimCommand::Create]);

    h.fire(VIDEO, SdkEventKind::Ready);
    assert_eq!(h.state(VIDEO), Some(PlayerState::Playing));

    h.fire(VIDEO, SdkEventKind::Started);
    assert_eq!(h.state(VIDEO), Some(PlayerState::Playing));

    assert_eq!(h.carousel.count(VIDEO, "video:play"), 1);
    assert_eq!(
        h.carousel.events(),
        vec![VideoEvent::Play {
            slide: VIDEO,
            video_id: "123".into()
        }]
    );
    assert!(!h.carousel.placeholder_visible(VIDEO));
    assert_eq!(
        h.bridge.session(VIDEO).and_then(|s| s.readiness()),
        Some(Readiness::Ready)
    );
}

#[test]
fn test_readiness_after_deactivation_does_not_play() {
    let mut h = harness(VideoConfig::keep_warm());

    h.go_to(VIDEO);
    h.go_to(OTHER);
    h.fire(VIDEO, SdkEventKind::Ready);

    assert_eq!(h.state(VIDEO), Some(PlayerState::Ready));
    assert_eq!(h.carousel.count(VIDEO, "video:play"), 0);
    assert_eq!(h.sdk.count(VIDEO, SimCommand::Play), 0);
    assert!(h.carousel.placeholder_visible(VIDEO));
}

#[test]
fn test_late_duplicate_play_after_pause_stays_ready() {
    let mut h = harness(VideoConfig::keep_warm());

    h.go_to(VIDEO);
    h.fire(VIDEO, SdkEventKind::Ready);
    h.fire(VIDEO, SdkEventKind::Started);
    h.go_to(OTHER);
    assert_eq!(h.state(VIDEO), Some(PlayerState::Ready));
    assert_eq!(h.sdk.count(VIDEO, SimCommand::Pause), 1);

    h.fire(VIDEO, SdkEventKind::Started);

    assert_eq!(h.state(VIDEO), Some(PlayerState::Ready));
    assert_eq!(h.carousel.count(VIDEO, "video:play"), 1);
    assert_eq!(h.carousel.count(VIDEO, "video:pause"), 1);
    assert_eq!(h.sdk.live(VIDEO), 1);
}

#[test]
fn test_play_confirmed_after_leaving_releases_player() {
    let mut h = harness(VideoConfig::keep_warm());

    h.go_to(VIDEO);
    h.fire(VIDEO, SdkEventKind::Ready);
    h.go_to(OTHER);
    assert_eq!(h.state(VIDEO), Some(PlayerState::PlayAborted));
    assert_eq!(h.sdk.count(VIDEO, SimCommand::Pause), 0);

    h.fire(VIDEO, SdkEventKind::Started);

    assert_eq!(h.state(VIDEO), Some(PlayerState::Idle));
    assert_eq!(h.sdk.live(VIDEO), 0);
    assert_eq!(h.sdk.count(VIDEO, SimCommand::Destroy), 1);
    assert!(h.carousel.placeholder_visible(VIDEO));
}

#[test]
fn test_abort_resolution_survives_intervening_navigation() {
    let mut h = harness(VideoConfig::keep_warm());

    h.go_to(VIDEO);
    h.fire(VIDEO, SdkEventKind::Ready);
    h.go_to(OTHER);
    h.go_to(VIDEO);
    assert_eq!(h.state(VIDEO), Some(PlayerState::Playing));
    h.go_to(OTHER);
    h.go_to(IMAGE);
    assert_eq!(h.state(VIDEO), Some(PlayerState::PlayAborted));

    h.fire(VIDEO, SdkEventKind::Started);

    assert_eq!(h.state(VIDEO), Some(PlayerState::Idle));
    assert_eq!(h.sdk.live(VIDEO), 0);
    assert_eq!(h.sdk.max_live(VIDEO), 1);
    assert!(h.carousel.placeholder_visible(VIDEO));
}

#[test]
fn test_confirmation_after_returning_keeps_playing() {
    let mut h = harness(VideoConfig::keep_warm());

    h.go_to(VIDEO);
    h.fire(VIDEO, SdkEventKind::Ready);
    h.go_to(OTHER);
    h.go_to(VIDEO);
    h.fire(VIDEO, SdkEventKind::Started);

    assert_eq!(h.state(VIDEO), Some(PlayerState::Playing));
    assert!(!h.bridge.session(VIDEO).unwrap().is_play_pending());
    assert_eq!(h.sdk.count(VIDEO, SimCommand::Create), 1);
}

#[test]
fn test_pause_policy_resumes_same_player() {
    let mut h = harness(VideoConfig::keep_warm());

    h.go_to(VIDEO);
    h.fire(VIDEO, SdkEventKind::Ready);
    h.fire(VIDEO, SdkEventKind::Started);
    h.go_to(OTHER);
    h.go_to(VIDEO);

    assert_eq!(h.state(VIDEO), Some(PlayerState::Playing));
    assert_eq!(h.sdk.count(VIDEO, SimCommand::Create), 1);
    assert_eq!(h.sdk.count(VIDEO, SimCommand::Play), 2);
    assert_eq!(h.carousel.count(VIDEO, "video:play"), 2);
}

#[test]
fn test_sdk_pause_and_end_return_to_ready() {
    let mut h = harness(VideoConfig::keep_warm());

    h.go_to(VIDEO);
    h.fire(VIDEO, SdkEventKind::Ready);
    h.fire(VIDEO, SdkEventKind::Started);
    h.fire(VIDEO, SdkEventKind::Paused);
    assert_eq!(h.state(VIDEO), Some(PlayerState::Ready));
    assert_eq!(h.carousel.count(VIDEO, "video:pause"), 1);

    h.fire(VIDEO, SdkEventKind::Started);
    assert_eq!(h.state(VIDEO), Some(PlayerState::Playing));

    h.fire(VIDEO, SdkEventKind::Ended);
    assert_eq!(h.state(VIDEO), Some(PlayerState::Ready));
    assert_eq!(h.carousel.count(VIDEO, "video:ended"), 1);
    assert_eq!(h.sdk.live(VIDEO), 1);
}

// =============================================================================
// Destroy policy and teardown
// =============================================================================

#[test]
fn test_destroy_policy_discards_session() {
    let mut h = harness(VideoConfig::tear_down());

    h.go_to(VIDEO);
    h.fire(VIDEO, SdkEventKind::Ready);
    h.go_to(OTHER);

    assert_eq!(h.state(VIDEO), Some(PlayerState::Idle));
    assert!(h.bridge.session(VIDEO).is_none());
    assert_eq!(h.sdk.live(VIDEO), 0);
    assert!(h.carousel.placeholder_visible(VIDEO));

    // Callback from the destroyed player
    h.fire(VIDEO, SdkEventKind::Started);
    assert_eq!(h.state(VIDEO), Some(PlayerState::Idle));

    h.go_to(VIDEO);
    assert_eq!(h.state(VIDEO), Some(PlayerState::Initializing));
    assert_eq!(h.sdk.count(VIDEO, SimCommand::Create), 2);
    assert_eq!(h.sdk.max_live(VIDEO), 1);
}

#[test]
fn test_destroy_is_idempotent() {
    let mut h = harness(VideoConfig::keep_warm());

    h.go_to(VIDEO);
    h.fire(VIDEO, SdkEventKind::Ready);

    h.bridge.deactivate_destroy(VIDEO);
    let events_after_first = h.carousel.events();
    h.bridge.deactivate_destroy(VIDEO);

    assert_eq!(h.state(VIDEO), Some(PlayerState::Idle));
    assert_eq!(h.sdk.count(VIDEO, SimCommand::Destroy), 1);
    assert_eq!(h.carousel.events(), events_after_first);
    assert!(h.carousel.placeholder_visible(VIDEO));
}

#[test]
fn test_carousel_teardown_destroys_every_session() {
    let mut h = harness(VideoConfig::keep_warm());

    h.go_to(VIDEO);
    h.fire(VIDEO, SdkEventKind::Ready);
    h.go_to(OTHER);
    h.fire(OTHER, SdkEventKind::Ready);
    assert_eq!(h.bridge.live_players(), 2);

    h.destroy_carousel();

    assert_eq!(h.bridge.live_players(), 0);
    assert_eq!(h.sdk.live(VIDEO), 0);
    assert_eq!(h.sdk.live(OTHER), 0);
    assert_eq!(h.state(VIDEO), None);
    assert_eq!(h.bridge.slides().count(), 0);
}

#[test]
fn test_removed_slide_releases_player() {
    let mut h = harness(VideoConfig::keep_warm());

    h.go_to(VIDEO);
    h.bridge.remove_slide(VIDEO);

    assert_eq!(h.sdk.live(VIDEO), 0);
    assert_eq!(h.state(VIDEO), None);
}

// =============================================================================
// Failures
// =============================================================================

#[test]
fn test_invalid_source_leaves_navigation_intact() {
    let mut h = harness(VideoConfig::keep_warm());
    h.add_slide(IMAGE, ProviderKind::Vimeo, "https://vimeo.com/about");

    h.go_to(IMAGE);

    assert_eq!(h.state(IMAGE), Some(PlayerState::Idle));
    assert_eq!(h.sdk.count(IMAGE, SimCommand::Create), 0);
    assert_eq!(h.carousel.count(IMAGE, "video:error"), 1);
    match h.carousel.events().last() {
        Some(VideoEvent::Error { code, .. }) => assert_eq!(code, "INVALID_SOURCE"),
        other => panic!("expected error event, got {:?}", other),
    }

    h.go_to(VIDEO);
    assert_eq!(h.state(VIDEO), Some(PlayerState::Initializing));
}

#[test]
fn test_sdk_error_is_not_retried_until_reactivation() {
    let mut h = harness(VideoConfig::keep_warm());
    h.sdk.fail_next(Error::sdk(ProviderKind::Vimeo, "embed blocked"));

    h.go_to(VIDEO);
    assert_eq!(h.state(VIDEO), Some(PlayerState::Idle));
    assert_eq!(h.carousel.count(VIDEO, "video:error"), 1);
    assert_eq!(h.sdk.count(VIDEO, SimCommand::Create), 0);

    h.go_to(OTHER);
    h.go_to(VIDEO);
    assert_eq!(h.state(VIDEO), Some(PlayerState::Initializing));
    assert_eq!(h.sdk.count(VIDEO, SimCommand::Create), 1);
}

#[test]
fn test_failure_before_readiness_allows_retry() {
    let mut h = harness(VideoConfig::keep_warm());

    h.go_to(VIDEO);
    assert_eq!(h.state(VIDEO), Some(PlayerState::Initializing));
    assert!(h.fail(VIDEO, "video is private"));

    assert_eq!(h.state(VIDEO), Some(PlayerState::Idle));
    assert_eq!(h.sdk.live(VIDEO), 0);
    assert!(h.carousel.placeholder_visible(VIDEO));
    let errors: Vec<VideoEvent> = h
        .carousel
        .events()
        .into_iter()
        .filter(|event| event.name() == "video:error")
        .collect();
    match &errors[..] {
        [VideoEvent::Error { code, message, .. }] => {
            assert_eq!(code, "SDK_ERROR");
            assert!(message.contains("video is private"));
        }
        other => panic!("expected one SDK error, got {:?}", other),
    }

    h.go_to(OTHER);
    h.go_to(VIDEO);
    assert_eq!(h.state(VIDEO), Some(PlayerState::Initializing));
    assert_eq!(h.sdk.count(VIDEO, SimCommand::Create), 2);
    assert_eq!(h.sdk.max_live(VIDEO), 1);
}

#[test]
fn test_failure_while_playing_returns_to_idle() {
    let mut h = harness(VideoConfig::tear_down());

    h.go_to(VIDEO);
    h.fire(VIDEO, SdkEventKind::Ready);
    h.fire(VIDEO, SdkEventKind::Started);
    h.fire(VIDEO, SdkEventKind::Failed);

    assert_eq!(h.state(VIDEO), Some(PlayerState::Idle));
    assert_eq!(h.carousel.count(VIDEO, "video:error"), 1);

    // Nothing left to tear down when the slide is left
    h.go_to(OTHER);
    assert_eq!(h.sdk.count(VIDEO, SimCommand::Destroy), 1);
}

#[test]
fn test_unavailable_sdk_disables_provider() {
    let mut h = harness(VideoConfig::keep_warm());
    h.bridge.mark_sdk_unavailable(ProviderKind::YouTube, "script failed to load");

    h.go_to(OTHER);

    assert_eq!(h.state(OTHER), Some(PlayerState::Idle));
    assert_eq!(h.sdk.count(OTHER, SimCommand::Create), 0);
    match h.carousel.events().last() {
        Some(VideoEvent::Error { code, .. }) => assert_eq!(code, "SDK_UNAVAILABLE"),
        other => panic!("expected error event, got {:?}", other),
    }

    h.go_to(VIDEO);
    assert_eq!(h.state(VIDEO), Some(PlayerState::Initializing));
}

#[test]
fn test_non_video_slide_is_ignored() {
    let mut h = harness(VideoConfig::keep_warm());

    h.go_to(IMAGE);
    h.go_to(VIDEO);

    assert_eq!(h.state(IMAGE), None);
    assert!(h.carousel.events().iter().all(|e| e.slide() != IMAGE));
}

// =============================================================================
// Configuration
// =============================================================================

#[test]
fn test_autoplay_off_waits_for_click() {
    let config = VideoConfig {
        autoplay: false,
        ..Default::default()
    };
    let mut h = harness(config);

    h.go_to(VIDEO);
    assert_eq!(h.state(VIDEO), Some(PlayerState::Idle));

    h.play_clicked(OTHER);
    assert_eq!(h.state(OTHER), Some(PlayerState::Idle));

    h.play_clicked(VIDEO);
    h.fire(VIDEO, SdkEventKind::Ready);
    assert_eq!(h.state(VIDEO), Some(PlayerState::Playing));
}

#[test]
fn test_mute_option_and_toggle() {
    let config = VideoConfig::from_json(r#"{"mute": true}"#).unwrap();
    let mut h = harness(config);

    assert!(!h.bridge.set_muted(VIDEO, false));

    h.go_to(VIDEO);
    assert_eq!(h.sdk.commands(VIDEO), vec![SimCommand::Create, SimCommand::Mute]);

    assert!(h.bridge.set_muted(VIDEO, false));
    assert_eq!(h.sdk.commands(VIDEO).last(), Some(&SimCommand::Unmute));
}

#[test]
fn test_policy_is_read_from_config() {
    let h = harness(VideoConfig::tear_down());
    assert_eq!(h.bridge.config().deactivation_policy, DeactivationPolicy::Destroy);
}

#[test]
fn test_slide_lookup() {
    let h = harness(VideoConfig::default());

    assert_eq!(h.bridge.slide(VIDEO).unwrap().source.provider, ProviderKind::Vimeo);
    assert_eq!(h.bridge.slide(SlideId(7)), Err(Error::UnknownSlide(SlideId(7))));
}

// =============================================================================
// SDK loading
// =============================================================================

struct BlockedLoader {
    blocked: ProviderKind,
}

#[async_trait(?Send)]
impl SdkLoader for BlockedLoader {
    async fn load(&self, provider: ProviderKind) -> Result<()> {
        if provider == self.blocked {
            Err(Error::SdkUnavailable {
                provider,
                reason: "network error".into(),
            })
        } else {
            Ok(())
        }
    }
}

#[tokio::test]
async fn test_load_sdks_marks_failures() {
    let mut h = harness(VideoConfig::keep_warm());

    h.bridge
        .load_sdks(&BlockedLoader {
            blocked: ProviderKind::Vimeo,
        })
        .await;

    assert!(!h.bridge.is_sdk_available(ProviderKind::Vimeo));
    assert!(h.bridge.is_sdk_available(ProviderKind::YouTube));

    h.go_to(VIDEO);
    assert_eq!(h.state(VIDEO), Some(PlayerState::Idle));
    assert_eq!(h.carousel.count(VIDEO, "video:error"), 1);
}

#[test]
fn test_reload_restores_provider() {
    let mut h = harness(VideoConfig::keep_warm());
    h.bridge.mark_sdk_unavailable(ProviderKind::Vimeo, "offline");

    tokio_test::block_on(h.bridge.load_sdks(&BlockedLoader {
        blocked: ProviderKind::Html,
    }));

    assert!(h.bridge.is_sdk_available(ProviderKind::Vimeo));
    assert!(!h.bridge.is_sdk_available(ProviderKind::Html));
}
