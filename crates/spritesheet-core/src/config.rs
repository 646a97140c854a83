use serde::{Deserialize, Serialize};
use std::str::FromStr;

/// Alpha trimming modes.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TrimMode {
    /// Keep sprites as decoded.
    None,
    /// Any pixel with non-zero alpha counts as content.
    Lenient,
    /// Only fully opaque pixels count as content.
    Strict,
}

impl TrimMode {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::None => "none",
            Self::Lenient => "lenient",
            Self::Strict => "strict",
        }
    }
}

impl FromStr for TrimMode {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "none" | "off" => Ok(Self::None),
            "lenient" | "all_alpha" | "alpha" => Ok(Self::Lenient),
            "strict" | "max_alpha" | "opaque" => Ok(Self::Strict),
            _ => Err(()),
        }
    }
}

/// Pixel layout tag of the output buffer. Sprites are composed as RGBA and
/// converted only when the canvas is handed to an encoder.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum PixelFormat {
    Rgba8,
    Rgb8,
    La8,
    L8,
}

impl PixelFormat {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Rgba8 => "RGBA8888",
            Self::Rgb8 => "RGB888",
            Self::La8 => "LA88",
            Self::L8 => "L8",
        }
    }

    pub fn has_alpha(&self) -> bool {
        matches!(self, Self::Rgba8 | Self::La8)
    }
}

impl FromStr for PixelFormat {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "rgba8" | "rgba8888" | "rgba" => Ok(Self::Rgba8),
            "rgb8" | "rgb888" | "rgb" => Ok(Self::Rgb8),
            "la8" | "la88" | "la" => Ok(Self::La8),
            "l8" | "gray" | "l" => Ok(Self::L8),
            _ => Err(()),
        }
    }
}

/// Frame ordering fed to the packer. Every mode sorts largest first.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SortMode {
    Height,
    Width,
    Area,
    MaxSide,
}

impl FromStr for SortMode {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "height" | "height_desc" => Ok(Self::Height),
            "width" | "width_desc" => Ok(Self::Width),
            "area" | "area_desc" => Ok(Self::Area),
            "maxside" | "max_side" | "max_side_desc" => Ok(Self::MaxSide),
            _ => Err(()),
        }
    }
}

/// MaxRects placement heuristics.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MaxRectsHeuristic {
    BestShortSideFit,
    BestLongSideFit,
}

impl FromStr for MaxRectsHeuristic {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "bssf" | "bestshortsidefit" => Ok(Self::BestShortSideFit),
            "blsf" | "bestlongsidefit" => Ok(Self::BestLongSideFit),
            _ => Err(()),
        }
    }
}

/// What to do with an image that has no content pixel at all when trimming.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum TransparentPolicy {
    /// Keep the full image untrimmed.
    Keep,
    /// Trim down to the single pixel at (0, 0).
    OneByOne,
}

impl FromStr for TransparentPolicy {
    type Err = ();
    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "keep" => Ok(Self::Keep),
            "one_by_one" | "1x1" => Ok(Self::OneByOne),
            _ => Err(()),
        }
    }
}

/// Packing configuration for one atlas build.
/// Key notes:
///   - `max_width`/`max_height` bound the final canvas; the sizing search never exceeds them
///   - `border_padding` surrounds every sprite, `texture_padding` is added once between neighbours
///   - `initial_slack`/`slack_step` drive the canvas-sizing search
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AtlasConfig {
    /// Maximum canvas width in pixels.
    pub max_width: u32,
    /// Maximum canvas height in pixels.
    pub max_height: u32,
    /// Downscale factor applied to every source before trimming. Values >= 1.0 keep sizes.
    pub scale: f32,
    pub trim_mode: TrimMode,
    #[serde(default = "default_transparent_policy")]
    pub transparent_policy: TransparentPolicy,

    /// Pixels reserved on every side of each sprite.
    pub border_padding: u32,
    /// Extra pixels between neighbouring sprites.
    pub texture_padding: u32,

    /// Force the canvas to be square.
    pub square: bool,
    /// Round canvas dimensions up to powers of two.
    pub power_of_two: bool,
    pub output_format: PixelFormat,

    /// Allow 90° rotations where the packer finds a better fit.
    #[serde(default = "default_allow_rotation")]
    pub allow_rotation: bool,
    /// Pack pixel-identical sprites once.
    #[serde(default = "default_detect_duplicates")]
    pub detect_duplicates: bool,
    #[serde(default = "default_sort_mode")]
    pub sort_mode: SortMode,
    #[serde(default = "default_heuristic")]
    pub heuristic: MaxRectsHeuristic,

    /// Area budget over the ideal area for the first trial (0.10 = 10%).
    #[serde(default = "default_initial_slack")]
    pub initial_slack: f64,
    /// Slack added after every failed trial.
    #[serde(default = "default_slack_step")]
    pub slack_step: f64,
}

impl Default for AtlasConfig {
    fn default() -> Self {
        Self {
            max_width: 2048,
            max_height: 2048,
            scale: 1.0,
            trim_mode: TrimMode::Lenient,
            transparent_policy: default_transparent_policy(),
            border_padding: 0,
            texture_padding: 0,
            square: false,
            power_of_two: false,
            output_format: PixelFormat::Rgba8,
            allow_rotation: default_allow_rotation(),
            detect_duplicates: default_detect_duplicates(),
            sort_mode: default_sort_mode(),
            heuristic: default_heuristic(),
            initial_slack: default_initial_slack(),
            slack_step: default_slack_step(),
        }
    }
}

impl AtlasConfig {
    /// Validates the configuration parameters.
    ///
    /// Returns an error if:
    /// - Dimensions are zero
    /// - Scale or slack values are not finite positive numbers
    /// - Padding would leave no room for even a 1x1 sprite
    pub fn validate(&self) -> crate::error::Result<()> {
        use crate::error::SpritesheetError;

        if self.max_width == 0 || self.max_height == 0 {
            return Err(SpritesheetError::InvalidDimensions {
                width: self.max_width,
                height: self.max_height,
            });
        }

        if !self.scale.is_finite() || self.scale <= 0.0 {
            return Err(SpritesheetError::InvalidConfig(format!(
                "scale must be a positive number, got {}",
                self.scale
            )));
        }

        if !self.initial_slack.is_finite() || self.initial_slack < 0.0 {
            return Err(SpritesheetError::InvalidConfig(format!(
                "initial_slack must be >= 0, got {}",
                self.initial_slack
            )));
        }
        if !self.slack_step.is_finite() || self.slack_step <= 0.0 {
            return Err(SpritesheetError::InvalidConfig(format!(
                "slack_step must be > 0, got {}",
                self.slack_step
            )));
        }

        let overhead = self.slot_overhead();
        if overhead >= self.max_width || overhead >= self.max_height {
            return Err(SpritesheetError::InvalidConfig(format!(
                "border_padding ({}) * 2 + texture_padding ({}) leaves no room in {}x{}",
                self.border_padding, self.texture_padding, self.max_width, self.max_height
            )));
        }

        Ok(())
    }

    /// Pixels added to each sprite dimension when reserving its packer slot.
    pub fn slot_overhead(&self) -> u32 {
        self.border_padding
            .saturating_mul(2)
            .saturating_add(self.texture_padding)
    }
}

fn default_transparent_policy() -> TransparentPolicy {
    TransparentPolicy::Keep
}
fn default_allow_rotation() -> bool {
    true
}
fn default_detect_duplicates() -> bool {
    true
}
fn default_sort_mode() -> SortMode {
    SortMode::MaxSide
}
fn default_heuristic() -> MaxRectsHeuristic {
    MaxRectsHeuristic::BestLongSideFit
}
fn default_initial_slack() -> f64 {
    0.10
}
fn default_slack_step() -> f64 {
    0.02
}

/// Builder for `AtlasConfig` for ergonomic construction.
#[derive(Debug, Default, Clone)]
pub struct AtlasConfigBuilder {
    cfg: AtlasConfig,
}

impl AtlasConfigBuilder {
    pub fn new() -> Self {
        Self {
            cfg: AtlasConfig::default(),
        }
    }
    pub fn with_max_dimensions(mut self, w: u32, h: u32) -> Self {
        self.cfg.max_width = w;
        self.cfg.max_height = h;
        self
    }
    pub fn scale(mut self, v: f32) -> Self {
        self.cfg.scale = v;
        self
    }
    pub fn trim_mode(mut self, v: TrimMode) -> Self {
        self.cfg.trim_mode = v;
        self
    }
    pub fn transparent_policy(mut self, v: TransparentPolicy) -> Self {
        self.cfg.transparent_policy = v;
        self
    }
    pub fn border_padding(mut self, v: u32) -> Self {
        self.cfg.border_padding = v;
        self
    }
    pub fn texture_padding(mut self, v: u32) -> Self {
        self.cfg.texture_padding = v;
        self
    }
    pub fn square(mut self, v: bool) -> Self {
        self.cfg.square = v;
        self
    }
    pub fn pow2(mut self, v: bool) -> Self {
        self.cfg.power_of_two = v;
        self
    }
    pub fn output_format(mut self, v: PixelFormat) -> Self {
        self.cfg.output_format = v;
        self
    }
    pub fn allow_rotation(mut self, v: bool) -> Self {
        self.cfg.allow_rotation = v;
        self
    }
    pub fn detect_duplicates(mut self, v: bool) -> Self {
        self.cfg.detect_duplicates = v;
        self
    }
    pub fn sort_mode(mut self, v: SortMode) -> Self {
        self.cfg.sort_mode = v;
        self
    }
    pub fn heuristic(mut self, v: MaxRectsHeuristic) -> Self {
        self.cfg.heuristic = v;
        self
    }
    pub fn initial_slack(mut self, v: f64) -> Self {
        self.cfg.initial_slack = v;
        self
    }
    pub fn slack_step(mut self, v: f64) -> Self {
        self.cfg.slack_step = v;
        self
    }
    pub fn build(self) -> AtlasConfig {
        self.cfg
    }
}

impl AtlasConfig {
    /// Create a fluent builder for `AtlasConfig`.
    pub fn builder() -> AtlasConfigBuilder {
        AtlasConfigBuilder::new()
    }
}
