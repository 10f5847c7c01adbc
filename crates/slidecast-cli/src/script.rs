//! Scripted carousel replay against the simulated SDK

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use slidecast_core::{
    sim::{SimHarness, SimRecord},
    Error, PlayerState, ProviderKind, SdkEventKind, SdkLoader, SlideId, VideoConfig, VideoEvent,
};
use std::collections::BTreeMap;
use std::fmt;

/// A replay script
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(deny_unknown_fields)]
pub struct Script {
    /// Video options; defaults apply when absent
    #[serde(default)]
    pub config: Option<VideoConfig>,
    pub slides: Vec<ScriptSlide>,
    /// Providers whose SDK fails to load
    #[serde(default)]
    pub unavailable: Vec<ProviderKind>,
    pub steps: Vec<Step>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct ScriptSlide {
    pub slide: SlideId,
    pub provider: ProviderKind,
    pub source: String,
}

/// One scripted carousel or SDK event
#[derive(Debug, Clone, PartialEq, Eq, Deserialize, Serialize)]
#[serde(tag = "action", rename_all = "snake_case")]
pub enum Step {
    /// Navigate to the slide; the previous one deactivates first
    Activate { slide: SlideId },
    Deactivate { slide: SlideId },
    PlayClicked { slide: SlideId },
    /// Fire an SDK callback from the slide's latest adapter
    Sdk { slide: SlideId, event: SdkEventKind },
    SetMuted { slide: SlideId, muted: bool },
    DestroyCarousel,
    /// Make the next adapter creation fail
    FailNext { provider: ProviderKind, message: String },
}

impl fmt::Display for Step {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Step::Activate { slide } => write!(f, "activate {}", slide),
            Step::Deactivate { slide } => write!(f, "deactivate {}", slide),
            Step::PlayClicked { slide } => write!(f, "play_clicked {}", slide),
            Step::Sdk { slide, event } => write!(f, "sdk {} {}", slide, event),
            Step::SetMuted { slide, muted } => write!(f, "set_muted {} {}", slide, muted),
            Step::DestroyCarousel => write!(f, "destroy_carousel"),
            Step::FailNext { provider, .. } => write!(f, "fail_next {}", provider),
        }
    }
}

/// What one step changed
#[derive(Debug, Clone, Serialize)]
pub struct TraceStep {
    pub step: usize,
    pub action: Step,
    pub states: BTreeMap<SlideId, PlayerState>,
    pub events: Vec<VideoEvent>,
    pub commands: Vec<SimRecord>,
}

/// Outcome of a full replay
#[derive(Debug, Clone, Serialize)]
pub struct Replay {
    pub config: VideoConfig,
    pub trace: Vec<TraceStep>,
    pub live_players: usize,
    pub max_live_per_slide: usize,
}

/// Fails the providers a script lists as unavailable
struct ScriptedLoader<'a> {
    unavailable: &'a [ProviderKind],
}

#[async_trait(?Send)]
impl SdkLoader for ScriptedLoader<'_> {
    async fn load(&self, provider: ProviderKind) -> slidecast_core::Result<()> {
        if self.unavailable.contains(&provider) {
            return Err(Error::SdkUnavailable {
                provider,
                reason: "disabled by script".to_string(),
            });
        }
        Ok(())
    }
}

impl Script {
    pub fn from_json(json: &str) -> serde_json::Result<Self> {
        serde_json::from_str(json)
    }

    pub async fn replay(&self, config: Option<VideoConfig>) -> Replay {
        let config = config
            .or_else(|| self.config.clone())
            .unwrap_or_default();

        let mut harness = SimHarness::new(config.clone());
        let loader = ScriptedLoader {
            unavailable: &self.unavailable,
        };
        harness.bridge.load_sdks(&loader).await;

        for slide in &self.slides {
            harness.add_slide(slide.slide, slide.provider, &slide.source);
        }

        let mut seen = harness.sdk.records().len();
        let mut trace = Vec::with_capacity(self.steps.len());

        for (index, step) in self.steps.iter().enumerate() {
            apply(&mut harness, step);

            let records = harness.sdk.records();
            let commands = records[seen..].to_vec();
            seen = records.len();

            trace.push(TraceStep {
                step: index + 1,
                action: step.clone(),
                states: self.states(&harness),
                events: harness.carousel.take_events(),
                commands,
            });
        }

        let max_live_per_slide = self
            .slides
            .iter()
            .map(|slide| harness.sdk.max_live(slide.slide))
            .max()
            .unwrap_or(0);

        Replay {
            config,
            trace,
            live_players: harness.bridge.live_players(),
            max_live_per_slide,
        }
    }

    fn states(&self, harness: &SimHarness) -> BTreeMap<SlideId, PlayerState> {
        self.slides
            .iter()
            .map(|slide| {
                let state = harness.state(slide.slide).unwrap_or(PlayerState::Idle);
                (slide.slide, state)
            })
            .collect()
    }
}

fn apply(harness: &mut SimHarness, step: &Step) {
    match step {
        Step::Activate { slide } => harness.go_to(*slide),
        Step::Deactivate { slide } => harness.leave(*slide),
        Step::PlayClicked { slide } => harness.play_clicked(*slide),
        Step::Sdk { slide, event } => {
            if !harness.fire(*slide, *event) {
                tracing::warn!(slide = %slide, event = %event, "No adapter ever created for slide");
            }
        }
        Step::SetMuted { slide, muted } => {
            harness.bridge.set_muted(*slide, *muted);
        }
        Step::DestroyCarousel => harness.destroy_carousel(),
        Step::FailNext { provider, message } => {
            harness.sdk.fail_next(Error::sdk(*provider, message.clone()));
        }
    }
}
