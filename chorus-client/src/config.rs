use std::time::Duration;

/// Device class the activity sampler runs on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Profile {
    #[default]
    Standard,
    /// Mobile or otherwise power-limited; samples at half the rate.
    Constrained,
}

#[derive(Debug, Clone)]
pub struct ActivityConfig {
    pub base_interval: Duration,
    /// Mean bin energy above which the local participant counts as speaking.
    pub threshold: f32,
    /// Number of frequency bins read per sample.
    pub bins: usize,
    pub profile: Profile,
}

impl ActivityConfig {
    pub fn interval(&self) -> Duration {
        match self.profile {
            Profile::Standard => self.base_interval,
            Profile::Constrained => self.base_interval * 2,
        }
    }
}

impl Default for ActivityConfig {
    fn default() -> Self {
        Self {
            base_interval: Duration::from_millis(100),
            threshold: 10.0,
            bins: 128,
            profile: Profile::Standard,
        }
    }
}

/// Runtime settings for one client session.
#[derive(Debug, Clone)]
pub struct ClientConfig {
    /// Signaling socket, e.g. `ws://127.0.0.1:3000/ws`.
    pub server_url: String,
    pub reconnect_delay: Duration,
    pub max_reconnect_attempts: u32,
    /// How many times a failed link is re-offered before it is torn down.
    pub max_negotiation_attempts: u32,
    /// How long an offerer waits for the answer before starting over.
    pub answer_timeout: Duration,
    pub activity: ActivityConfig,
    pub ice_servers: Vec<String>,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            server_url: "ws://127.0.0.1:3000/ws".into(),
            reconnect_delay: Duration::from_secs(2),
            max_reconnect_attempts: 5,
            max_negotiation_attempts: 3,
            answer_timeout: Duration::from_secs(10),
            activity: ActivityConfig::default(),
            ice_servers: vec!["stun:stun.l.google.com:19302".into()],
        }
    }
}
