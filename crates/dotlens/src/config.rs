use std::time::Duration;

use serde::Deserialize;

use dotlens_core::{
    color::Color,
    engine::{LayoutAlgorithm, LayoutMethod},
};

/// Application configuration loaded from TOML file
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    /// Layout configuration section
    #[serde(default)]
    pub layout: LayoutConfig,

    /// Style configuration section
    #[serde(default)]
    pub style: StyleConfig,

    /// Scene configuration section
    #[serde(default)]
    pub scene: SceneConfig,
}

/// Layout configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct LayoutConfig {
    /// Run Graphviz as a child process or lay out in-process
    #[serde(default)]
    pub method: LayoutMethod,

    /// Graphviz program used when no explicit command is set
    #[serde(default)]
    pub algorithm: LayoutAlgorithm,

    /// Full layout command line, e.g. `"dot -Txdot"`; overrides `algorithm`
    #[serde(default)]
    pub command: Option<String>,

    /// Seconds an external layout may run before it is killed
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
}

fn default_timeout_secs() -> u64 {
    30
}

impl Default for LayoutConfig {
    fn default() -> Self {
        Self {
            method: LayoutMethod::default(),
            algorithm: LayoutAlgorithm::default(),
            command: None,
            timeout_secs: default_timeout_secs(),
        }
    }
}

impl LayoutConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// Style configuration section
#[derive(Debug, Default, Clone, Deserialize)]
pub struct StyleConfig {
    /// Background color used when the graph sets no `bgcolor`
    #[serde(default)]
    background_color: Option<String>,
}

impl StyleConfig {
    /// Get the background color from configuration
    /// Returns None if no background color is configured
    pub fn background_color(&self) -> Result<Option<Color>, String> {
        self.background_color
            .as_ref()
            .map(|color| Color::from_graphviz(color))
            .transpose()
            .map_err(|err| format!("Invalid background color in config: {err}"))
    }

    pub fn set_background_color(&mut self, color: Option<String>) {
        self.background_color = color;
    }
}

/// How much the scene enlarges layout coordinates.
#[derive(Debug, Default, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DetailLevel {
    Low,
    #[default]
    Normal,
    High,
}

impl DetailLevel {
    /// Multiplier applied on top of the graph's own scale.
    pub fn factor(self) -> f64 {
        match self {
            Self::Low => 0.7,
            Self::Normal => 1.0,
            Self::High => 1.3,
        }
    }
}

/// Scene configuration section
#[derive(Debug, Clone, Deserialize)]
pub struct SceneConfig {
    /// Blank border around the drawing, in scene units
    #[serde(default = "default_margin")]
    pub margin: f64,

    #[serde(default)]
    pub detail_level: DetailLevel,
}

fn default_margin() -> f64 {
    50.0
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            margin: default_margin(),
            detail_level: DetailLevel::default(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults() {
        let config = AppConfig::default();
        assert_eq!(config.layout.method, LayoutMethod::External);
        assert_eq!(config.layout.timeout(), Duration::from_secs(30));
        assert_eq!(config.scene.margin, 50.0);
        assert_eq!(config.scene.detail_level.factor(), 1.0);
        assert_eq!(config.style.background_color(), Ok(None));
    }

    #[test]
    fn test_invalid_background_color() {
        let mut style = StyleConfig::default();
        style.set_background_color(Some("not-a-color".to_string()));
        assert!(style.background_color().is_err());

        style.set_background_color(Some("/x11/lightgrey".to_string()));
        assert!(style.background_color().unwrap().is_some());
    }
}
