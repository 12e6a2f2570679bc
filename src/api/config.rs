use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::Viewport;
use crate::error::{DashError, DashResult};

/// Application shell configuration.
///
/// Serializable so a deployment can keep its settings in a JSON file next to
/// the model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AppOptions {
    #[serde(default = "default_host")]
    pub host: String,
    #[serde(default = "default_port")]
    pub port: u16,
    #[serde(default = "default_launch_browser")]
    pub launch_browser: bool,
    /// Page title; the analysis title is used when unset.
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub chart_viewport: Viewport,
    /// TrueType font registered for text in PNG and JPEG exports.
    #[serde(default)]
    pub bitmap_font: Option<PathBuf>,
    /// Open sessions kept by the server; the least recently used one is
    /// released when a new page load exceeds it.
    #[serde(default = "default_max_sessions")]
    pub max_sessions: usize,
    /// Seconds without a request after which a session is released.
    #[serde(default = "default_session_idle_secs")]
    pub session_idle_secs: u64,
}

impl Default for AppOptions {
    fn default() -> Self {
        Self {
            host: default_host(),
            port: default_port(),
            launch_browser: default_launch_browser(),
            title: None,
            chart_viewport: Viewport::default(),
            bitmap_font: None,
            max_sessions: default_max_sessions(),
            session_idle_secs: default_session_idle_secs(),
        }
    }
}

impl AppOptions {
    pub fn from_json_str(input: &str) -> DashResult<Self> {
        let options: Self = serde_json::from_str(input)
            .map_err(|e| DashError::Configuration(format!("failed to parse app options: {e}")))?;
        options.validate()?;
        Ok(options)
    }

    pub fn validate(&self) -> DashResult<()> {
        self.chart_viewport.validate()?;
        if self.max_sessions == 0 {
            return Err(DashError::Configuration(
                "max_sessions must be at least 1".to_owned(),
            ));
        }
        Ok(())
    }

    #[must_use]
    pub fn with_host(mut self, host: impl Into<String>) -> Self {
        self.host = host.into();
        self
    }

    /// Port `0` lets the system pick a free port.
    #[must_use]
    pub fn with_port(mut self, port: u16) -> Self {
        self.port = port;
        self
    }

    #[must_use]
    pub fn with_launch_browser(mut self, launch_browser: bool) -> Self {
        self.launch_browser = launch_browser;
        self
    }

    #[must_use]
    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    #[must_use]
    pub fn with_chart_viewport(mut self, viewport: Viewport) -> Self {
        self.chart_viewport = viewport;
        self
    }

    #[must_use]
    pub fn with_bitmap_font(mut self, path: impl Into<PathBuf>) -> Self {
        self.bitmap_font = Some(path.into());
        self
    }

    #[must_use]
    pub fn with_max_sessions(mut self, max_sessions: usize) -> Self {
        self.max_sessions = max_sessions;
        self
    }

    #[must_use]
    pub fn with_session_idle_secs(mut self, seconds: u64) -> Self {
        self.session_idle_secs = seconds;
        self
    }

    #[must_use]
    pub fn address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

fn default_host() -> String {
    "127.0.0.1".to_owned()
}

const fn default_port() -> u16 {
    8000
}

const fn default_launch_browser() -> bool {
    true
}

const fn default_max_sessions() -> usize {
    16
}

const fn default_session_idle_secs() -> u64 {
    60 * 60
}
