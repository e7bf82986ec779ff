use std::time::Duration;

use ragdoll_core::config::{FollowUpQueryPolicy, ImageSettings, Settings};

/// Per-session runtime knobs taken from `Settings`.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SessionOptions {
    /// Render the first image through the configured renderer
    pub render: bool,
    pub follow_up_query: FollowUpQueryPolicy,
    /// Pause after each provider call that reached the network
    pub delay: Duration,
    pub image: ImageSettings,
}

impl SessionOptions {
    pub fn from_settings(settings: &Settings) -> Self {
        Self {
            render: settings.render,
            follow_up_query: settings.follow_up_query,
            delay: settings.delay,
            image: settings.image.clone(),
        }
    }

    pub fn with_follow_up_query(mut self, policy: FollowUpQueryPolicy) -> Self {
        self.follow_up_query = policy;
        self
    }

    pub fn with_render(mut self, render: bool) -> Self {
        self.render = render;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = delay;
        self
    }
}
