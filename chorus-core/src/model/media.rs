use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaState {
    pub mic: bool,
    pub cam: bool,
}

impl Default for MediaState {
    fn default() -> Self {
        Self {
            mic: true,
            cam: false,
        }
    }
}

impl MediaState {
    /// Applies `patch` and returns only the fields whose value actually changed.
    pub fn apply(&mut self, patch: MediaPatch) -> MediaPatch {
        let mut changed = MediaPatch::default();

        if let Some(mic) = patch.mic.filter(|mic| *mic != self.mic) {
            self.mic = mic;
            changed.mic = Some(mic);
        }
        if let Some(cam) = patch.cam.filter(|cam| *cam != self.cam) {
            self.cam = cam;
            changed.cam = Some(cam);
        }

        changed
    }
}

/// Partial media-state update: only the present fields are meaningful.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MediaPatch {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub mic: Option<bool>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub cam: Option<bool>,
}

impl MediaPatch {
    pub fn mic(enabled: bool) -> Self {
        Self {
            mic: Some(enabled),
            cam: None,
        }
    }

    pub fn cam(enabled: bool) -> Self {
        Self {
            mic: None,
            cam: Some(enabled),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.mic.is_none() && self.cam.is_none()
    }
}
