//! Exhaustive race checks: every short interleaving of navigation and SDK
//! callbacks on one video slide keeps the player invariants.

use slidecast_core::{
    sim::SimHarness, PlayerState, ProviderKind, SdkEventKind, SlideId, VideoConfig,
};

const VIDEO: SlideId = SlideId(0);
const OTHER: SlideId = SlideId(1);
const DEPTH: usize = 5;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Step {
    ShowVideo,
    ShowOther,
    LeaveVideo,
    PlayClicked,
    Sdk(SdkEventKind),
}

const STEPS: [Step; 9] = [
    Step::ShowVideo,
    Step::ShowOther,
    Step::LeaveVideo,
    Step::PlayClicked,
    Step::Sdk(SdkEventKind::Ready),
    Step::Sdk(SdkEventKind::Started),
    Step::Sdk(SdkEventKind::Paused),
    Step::Sdk(SdkEventKind::Ended),
    Step::Sdk(SdkEventKind::Failed),
];

fn apply(h: &mut SimHarness, step: Step) {
    match step {
        Step::ShowVideo => h.go_to(VIDEO),
        Step::ShowOther => h.go_to(OTHER),
        Step::LeaveVideo => h.leave(VIDEO),
        Step::PlayClicked => h.play_clicked(VIDEO),
        Step::Sdk(kind) => {
            h.fire(VIDEO, kind);
        }
    }
}

fn check(h: &SimHarness, before: PlayerState, was_active: bool, step: Step, trace: &[Step]) {
    let state = h.state(VIDEO).unwrap_or(PlayerState::Idle);

    assert!(h.sdk.live(VIDEO) <= 1, "two players alive after {:?}", trace);
    assert!(h.sdk.max_live(VIDEO) <= 1, "two players alive during {:?}", trace);
    assert_eq!(
        h.sdk.live(VIDEO) == 1,
        state.has_player(),
        "player/state mismatch ({}) after {:?}",
        state,
        trace
    );

    match state {
        PlayerState::Idle => assert!(
            h.carousel.placeholder_visible(VIDEO),
            "placeholder hidden while idle after {:?}",
            trace
        ),
        PlayerState::Playing => assert!(
            !h.carousel.placeholder_visible(VIDEO),
            "placeholder shown while playing after {:?}",
            trace
        ),
        _ => {}
    }

    if step == Step::Sdk(SdkEventKind::Failed) && before.has_player() {
        assert_eq!(state, PlayerState::Idle, "failed player kept after {:?}", trace);
    }

    if let Step::Sdk(kind) = step {
        if !was_active {
            if kind == SdkEventKind::Ready {
                assert_ne!(state, PlayerState::Playing, "readiness started playback after {:?}", trace);
            }
            if kind == SdkEventKind::Started
                && matches!(
                    before,
                    PlayerState::Playing | PlayerState::PlayAborted | PlayerState::Initializing
                )
            {
                assert_eq!(state, PlayerState::Idle, "abort not resolved after {:?}", trace);
            }
            if kind == SdkEventKind::Started && before == PlayerState::Ready {
                assert_eq!(state, PlayerState::Ready, "stale play confirmation after {:?}", trace);
            }
        }
    }
}

fn explore(config: &VideoConfig, trace: &mut Vec<Step>) {
    if trace.len() == DEPTH {
        return;
    }

    for step in STEPS {
        trace.push(step);

        let mut h = SimHarness::new(config.clone());
        h.add_slide(VIDEO, ProviderKind::Vimeo, "https://vimeo.com/123");
        h.add_slide(OTHER, ProviderKind::Html, "/media/other.mp4");

        let (last, prefix) = trace.split_last().unwrap();
        for step in prefix {
            apply(&mut h, *step);
        }

        let before = h.state(VIDEO).unwrap_or(PlayerState::Idle);
        let was_active = h.carousel.active() == Some(VIDEO);
        apply(&mut h, *last);
        check(&h, before, was_active, *last, trace);

        explore(config, trace);
        trace.pop();
    }
}

#[test]
fn test_pause_policy_interleavings() {
    explore(&VideoConfig::keep_warm(), &mut Vec::new());
}

#[test]
fn test_destroy_policy_interleavings() {
    explore(&VideoConfig::tear_down(), &mut Vec::new());
}

#[test]
fn test_destroy_twice_matches_destroy_once() {
    for step in STEPS {
        let mut once = SimHarness::new(VideoConfig::keep_warm());
        let mut twice = SimHarness::new(VideoConfig::keep_warm());
        for h in [&mut once, &mut twice] {
            h.add_slide(VIDEO, ProviderKind::Vimeo, "https://vimeo.com/123");
            h.go_to(VIDEO);
            apply(h, step);
        }

        once.bridge.deactivate_destroy(VIDEO);
        twice.bridge.deactivate_destroy(VIDEO);
        twice.bridge.deactivate_destroy(VIDEO);

        assert_eq!(once.state(VIDEO), twice.state(VIDEO));
        assert_eq!(once.sdk.records(), twice.sdk.records());
        assert_eq!(once.carousel.events(), twice.carousel.events());
        assert_eq!(
            once.carousel.placeholder_visible(VIDEO),
            twice.carousel.placeholder_visible(VIDEO)
        );
    }
}
