//! Carousel video configuration

use crate::{PlayerOptions, Result};
use serde::{Deserialize, Serialize};

/// What happens to a player when its slide stops being the active one
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DeactivationPolicy {
    /// Pause and keep the player warm; reactivation resumes where it stopped
    #[default]
    Pause,
    /// Tear the player down; reactivation starts a fresh player
    Destroy,
}

impl std::fmt::Display for DeactivationPolicy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            DeactivationPolicy::Pause => write!(f, "pause"),
            DeactivationPolicy::Destroy => write!(f, "destroy"),
        }
    }
}

/// Video options recognized on the carousel
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default, deny_unknown_fields)]
pub struct VideoConfig {
    /// Hide the provider's native controls
    pub hide_controls: bool,
    /// Loop the video
    #[serde(rename = "loop")]
    pub loop_video: bool,
    /// Start muted
    pub mute: bool,
    /// Pause or destroy on deactivation
    pub deactivation_policy: DeactivationPolicy,
    /// Request playback as soon as a video slide becomes active
    pub autoplay: bool,
}

impl Default for VideoConfig {
    fn default() -> Self {
        Self {
            hide_controls: false,
            loop_video: false,
            mute: false,
            deactivation_policy: DeactivationPolicy::Pause,
            autoplay: true,
        }
    }
}

impl VideoConfig {
    /// Parse from the carousel's JSON `video` options
    pub fn from_json(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    /// Keep players warm across navigation
    pub fn keep_warm() -> Self {
        Self::default()
    }

    /// Tear players down as soon as their slide leaves
    pub fn tear_down() -> Self {
        Self {
            deactivation_policy: DeactivationPolicy::Destroy,
            ..Default::default()
        }
    }

    /// Options handed to adapters at creation
    pub fn player_options(&self) -> PlayerOptions {
        PlayerOptions {
            controls: !self.hide_controls,
            loop_video: self.loop_video,
            muted: self.mute,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = VideoConfig::default();
        assert!(!config.hide_controls);
        assert!(config.autoplay);
        assert_eq!(config.deactivation_policy, DeactivationPolicy::Pause);
        assert_eq!(config, VideoConfig::keep_warm());
    }

    #[test]
    fn test_from_json() {
        let config = VideoConfig::from_json(
            r#"{"hideControls": true, "loop": true, "mute": true, "deactivationPolicy": "destroy"}"#,
        )
        .unwrap();

        assert_eq!(config.deactivation_policy, DeactivationPolicy::Destroy);
        assert!(config.autoplay);

        let options = config.player_options();
        assert!(!options.controls);
        assert!(options.loop_video);
        assert!(options.muted);
    }

    #[test]
    fn test_rejects_unknown_policy_and_fields() {
        let err = VideoConfig::from_json(r#"{"deactivationPolicy": "hibernate"}"#).unwrap_err();
        assert_eq!(err.error_code(), "INVALID_CONFIG");
        assert!(VideoConfig::from_json(r#"{"volume": 0.2}"#).is_err());
        assert_eq!(VideoConfig::from_json("{}").unwrap(), VideoConfig::default());
    }
}
