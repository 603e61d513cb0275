use clap::ValueEnum;
use color_eyre::eyre::eyre;
use color_eyre::Result;
use ratatui::style::Color;
use ratatui::symbols::Marker;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use supports_color::Stream;

use crate::labels::LabelStyle;
use crate::pivot::Orientation;
use crate::{FileFormat, LabelStyleArg, OrientationArg};

pub const CONFIG_VERSION: &str = "0.1";

/// Manages config directory and config file operations
#[derive(Clone)]
pub struct ConfigManager {
    pub(crate) config_dir: PathBuf,
}

impl ConfigManager {
    /// Create a ConfigManager with a custom config directory (primarily for testing)
    pub fn with_dir(config_dir: PathBuf) -> Self {
        Self { config_dir }
    }

    pub fn new(app_name: &str) -> Result<Self> {
        let config_dir = dirs::config_dir()
            .ok_or_else(|| eyre!("Could not determine config directory"))?
            .join(app_name);

        Ok(Self { config_dir })
    }

    pub fn config_dir(&self) -> &Path {
        &self.config_dir
    }

    pub fn config_path(&self, path: &str) -> PathBuf {
        self.config_dir.join(path)
    }

    pub fn ensure_config_dir(&self) -> Result<()> {
        if !self.config_dir.exists() {
            std::fs::create_dir_all(&self.config_dir)?;
        }
        Ok(())
    }

    pub fn generate_default_config(&self) -> String {
        DEFAULT_CONFIG_TEMPLATE.to_string()
    }

    /// Write the bundled template to `config.toml`. Refuses to overwrite unless `force`.
    pub fn write_default_config(&self, force: bool) -> Result<PathBuf> {
        let config_path = self.config_path("config.toml");

        if config_path.exists() && !force {
            return Err(eyre!(
                "Config file already exists at {}. Use --force to overwrite.",
                config_path.display()
            ));
        }

        self.ensure_config_dir()?;
        std::fs::write(&config_path, DEFAULT_CONFIG_TEMPLATE)?;

        Ok(config_path)
    }
}

/// Complete application configuration
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct AppConfig {
    /// Configuration format version
    pub version: String,
    pub file_loading: FileLoadingConfig,
    pub display: DisplayConfig,
    pub performance: PerformanceConfig,
    pub theme: ThemeConfig,
    pub debug: DebugConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct FileLoadingConfig {
    /// Data file used when no path is given on the command line.
    pub default_path: String,
    /// "csv" or "tsv"; unset means detect from the extension.
    pub format: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    pub orientation: String,
    pub label_style: String,
    pub plot_marker: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct PerformanceConfig {
    pub event_poll_interval_ms: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ThemeConfig {
    pub color_mode: String,
    pub colors: ColorConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ColorConfig {
    pub primary: String,
    pub secondary: String,
    pub error: String,
    pub dimmed: String,
    pub controls_bg: String,
    pub text_primary: String,
    pub text_inverse: String,
    pub grid_header: String,
    pub grid_border: String,
    pub cursor: String,
    pub modal_border: String,
    pub modal_border_error: String,
    pub series_fallback: String,
}

#[derive(Debug, Clone, Serialize, Deserialize, Default)]
#[serde(default)]
pub struct DebugConfig {
    pub enabled: bool,
}

impl Default for AppConfig {
    fn default() -> Self {
        Self {
            version: CONFIG_VERSION.to_string(),
            file_loading: FileLoadingConfig::default(),
            display: DisplayConfig::default(),
            performance: PerformanceConfig::default(),
            theme: ThemeConfig::default(),
            debug: DebugConfig::default(),
        }
    }
}

impl Default for FileLoadingConfig {
    fn default() -> Self {
        Self {
            default_path: "data/umap_df_for_js_plot.csv".to_string(),
            format: None,
        }
    }
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            orientation: "subset-rows".to_string(),
            label_style: "abbr".to_string(),
            plot_marker: "braille".to_string(),
        }
    }
}

impl Default for PerformanceConfig {
    fn default() -> Self {
        Self {
            event_poll_interval_ms: 25,
        }
    }
}

impl Default for ThemeConfig {
    fn default() -> Self {
        Self {
            color_mode: "auto".to_string(),
            colors: ColorConfig::default(),
        }
    }
}

impl Default for ColorConfig {
    fn default() -> Self {
        Self {
            primary: "cyan".to_string(),
            secondary: "yellow".to_string(),
            error: "red".to_string(),
            dimmed: "dark_gray".to_string(),
            controls_bg: "indexed(236)".to_string(),
            text_primary: "white".to_string(),
            text_inverse: "black".to_string(),
            grid_header: "white".to_string(),
            grid_border: "cyan".to_string(),
            cursor: "yellow".to_string(),
            modal_border: "cyan".to_string(),
            modal_border_error: "red".to_string(),
            series_fallback: "magenta".to_string(),
        }
    }
}

impl AppConfig {
    /// Load configuration from all layers (default → user)
    pub fn load(app_name: &str) -> Result<Self> {
        let manager = ConfigManager::new(app_name)?;
        Self::load_from(&manager)
    }

    /// Load defaults merged with `config.toml` in `manager`'s directory, if present.
    pub fn load_from(manager: &ConfigManager) -> Result<Self> {
        let mut config = AppConfig::default();
        config.merge(Self::load_user_config(manager)?);
        config.validate()?;
        Ok(config)
    }

    fn load_user_config(manager: &ConfigManager) -> Result<AppConfig> {
        let config_path = manager.config_path("config.toml");

        if !config_path.exists() {
            return Ok(AppConfig::default());
        }

        let content = std::fs::read_to_string(&config_path).map_err(|e| {
            eyre!(
                "Failed to read config file at {}: {}",
                config_path.display(),
                e
            )
        })?;

        toml::from_str(&content).map_err(|e| {
            eyre!(
                "Failed to parse config file at {}: {}",
                config_path.display(),
                e
            )
        })
    }

    /// Merge another config into this one (other takes precedence)
    pub fn merge(&mut self, other: AppConfig) {
        if other.version != AppConfig::default().version {
            self.version = other.version;
        }

        self.file_loading.merge(other.file_loading);
        self.display.merge(other.display);
        self.performance.merge(other.performance);
        self.theme.merge(other.theme);
        self.debug.merge(other.debug);
    }

    pub fn validate(&self) -> Result<()> {
        if !self.version.starts_with(CONFIG_VERSION) {
            return Err(eyre!(
                "Unsupported config version: {}. Expected {}.x",
                self.version,
                CONFIG_VERSION
            ));
        }

        if self.performance.event_poll_interval_ms == 0 {
            return Err(eyre!("event_poll_interval_ms must be greater than 0"));
        }

        if self.file_loading.default_path.trim().is_empty() {
            return Err(eyre!("file_loading.default_path must not be empty"));
        }
        self.file_loading.format()?;

        self.display.orientation()?;
        self.display.label_style()?;
        self.display.plot_marker()?;

        match self.theme.color_mode.as_str() {
            "light" | "dark" | "auto" => {}
            _ => {
                return Err(eyre!(
                    "Invalid color_mode: {}. Must be 'light', 'dark', or 'auto'",
                    self.theme.color_mode
                ))
            }
        }

        let parser = ColorParser::new();
        self.theme.colors.validate(&parser)?;

        Ok(())
    }
}

impl FileLoadingConfig {
    pub fn merge(&mut self, other: Self) {
        if other.default_path != FileLoadingConfig::default().default_path {
            self.default_path = other.default_path;
        }
        if other.format.is_some() {
            self.format = other.format;
        }
    }

    pub fn default_path(&self) -> PathBuf {
        PathBuf::from(&self.default_path)
    }

    pub fn format(&self) -> Result<Option<FileFormat>> {
        self.format
            .as_deref()
            .map(|s| {
                FileFormat::from_str(s, true)
                    .map_err(|_| eyre!("Invalid file_loading.format: '{}'. Use 'csv' or 'tsv'", s))
            })
            .transpose()
    }
}

impl DisplayConfig {
    pub fn merge(&mut self, other: Self) {
        let default = DisplayConfig::default();
        if other.orientation != default.orientation {
            self.orientation = other.orientation;
        }
        if other.label_style != default.label_style {
            self.label_style = other.label_style;
        }
        if other.plot_marker != default.plot_marker {
            self.plot_marker = other.plot_marker;
        }
    }

    pub fn orientation(&self) -> Result<Orientation> {
        OrientationArg::from_str(&self.orientation, true)
            .map(Orientation::from)
            .map_err(|_| {
                eyre!(
                    "Invalid display.orientation: '{}'. Use 'subset-rows' or 'disruption-rows'",
                    self.orientation
                )
            })
    }

    pub fn label_style(&self) -> Result<LabelStyle> {
        LabelStyleArg::from_str(&self.label_style, true)
            .map(LabelStyle::from)
            .map_err(|_| {
                eyre!(
                    "Invalid display.label_style: '{}'. Use 'abbr' or 'full'",
                    self.label_style
                )
            })
    }

    pub fn plot_marker(&self) -> Result<Marker> {
        match self.plot_marker.to_lowercase().as_str() {
            "braille" => Ok(Marker::Braille),
            "dot" => Ok(Marker::Dot),
            "block" => Ok(Marker::Block),
            "bar" => Ok(Marker::Bar),
            "half_block" | "halfblock" => Ok(Marker::HalfBlock),
            other => Err(eyre!(
                "Invalid display.plot_marker: '{}'. Use braille, dot, block, bar or half_block",
                other
            )),
        }
    }
}

impl PerformanceConfig {
    pub fn merge(&mut self, other: Self) {
        if other.event_poll_interval_ms != PerformanceConfig::default().event_poll_interval_ms {
            self.event_poll_interval_ms = other.event_poll_interval_ms;
        }
    }
}

impl ThemeConfig {
    pub fn merge(&mut self, other: Self) {
        let default = ThemeConfig::default();
        if other.color_mode != default.color_mode {
            self.color_mode = other.color_mode;
        }
        self.colors.merge(other.colors);
    }
}

impl ColorConfig {
    /// (name, value) of every color setting, in declaration order.
    fn entries(&self) -> [(&'static str, &String); 13] {
        [
            ("primary", &self.primary),
            ("secondary", &self.secondary),
            ("error", &self.error),
            ("dimmed", &self.dimmed),
            ("controls_bg", &self.controls_bg),
            ("text_primary", &self.text_primary),
            ("text_inverse", &self.text_inverse),
            ("grid_header", &self.grid_header),
            ("grid_border", &self.grid_border),
            ("cursor", &self.cursor),
            ("modal_border", &self.modal_border),
            ("modal_border_error", &self.modal_border_error),
            ("series_fallback", &self.series_fallback),
        ]
    }

    fn validate(&self, parser: &ColorParser) -> Result<()> {
        for (name, value) in self.entries() {
            parser
                .parse(value)
                .map_err(|e| eyre!("Invalid color value for '{}': {}", name, e))?;
        }
        Ok(())
    }

    pub fn merge(&mut self, other: Self) {
        let default = ColorConfig::default();
        let pick = |mine: &mut String, theirs: String, default: &String| {
            if &theirs != default {
                *mine = theirs;
            }
        };

        pick(&mut self.primary, other.primary, &default.primary);
        pick(&mut self.secondary, other.secondary, &default.secondary);
        pick(&mut self.error, other.error, &default.error);
        pick(&mut self.dimmed, other.dimmed, &default.dimmed);
        pick(&mut self.controls_bg, other.controls_bg, &default.controls_bg);
        pick(&mut self.text_primary, other.text_primary, &default.text_primary);
        pick(&mut self.text_inverse, other.text_inverse, &default.text_inverse);
        pick(&mut self.grid_header, other.grid_header, &default.grid_header);
        pick(&mut self.grid_border, other.grid_border, &default.grid_border);
        pick(&mut self.cursor, other.cursor, &default.cursor);
        pick(&mut self.modal_border, other.modal_border, &default.modal_border);
        pick(
            &mut self.modal_border_error,
            other.modal_border_error,
            &default.modal_border_error,
        );
        pick(
            &mut self.series_fallback,
            other.series_fallback,
            &default.series_fallback,
        );
    }
}

impl DebugConfig {
    pub fn merge(&mut self, other: Self) {
        if other.enabled != DebugConfig::default().enabled {
            self.enabled = other.enabled;
        }
    }
}

impl From<LabelStyleArg> for LabelStyle {
    fn from(arg: LabelStyleArg) -> Self {
        match arg {
            LabelStyleArg::Abbr => Self::Abbr,
            LabelStyleArg::Full => Self::Full,
        }
    }
}

/// Color parser with terminal capability detection
#[derive(Debug, Clone, Copy)]
pub struct ColorParser {
    supports_true_color: bool,
    supports_256: bool,
    no_color: bool,
}

impl ColorParser {
    /// Create a new ColorParser with automatic terminal capability detection
    pub fn new() -> Self {
        let no_color = std::env::var("NO_COLOR").is_ok();
        let support = supports_color::on(Stream::Stdout);

        Self {
            supports_true_color: support.as_ref().map(|s| s.has_16m).unwrap_or(false),
            supports_256: support.as_ref().map(|s| s.has_256).unwrap_or(false),
            no_color,
        }
    }

    /// Parser with fixed capabilities instead of detected ones.
    pub fn with_capabilities(true_color: bool, ansi256: bool, no_color: bool) -> Self {
        Self {
            supports_true_color: true_color,
            supports_256: ansi256,
            no_color,
        }
    }

    /// Parse a color string (hex, indexed or named) into a terminal color
    pub fn parse(&self, s: &str) -> Result<Color> {
        if self.no_color {
            return Ok(Color::Reset);
        }

        let trimmed = s.trim();

        if trimmed.starts_with('#') && trimmed.len() == 7 {
            let (r, g, b) = parse_hex(trimmed)?;
            return Ok(self.rgb(r, g, b));
        }

        if trimmed.to_lowercase().starts_with("indexed(") && trimmed.ends_with(')') {
            let num_str = &trimmed[8..trimmed.len() - 1];
            let num = num_str.parse::<u8>().map_err(|_| {
                eyre!(
                    "Invalid indexed color: '{}'. Expected format: indexed(0-255)",
                    trimmed
                )
            })?;
            return Ok(Color::Indexed(num));
        }

        let lower = trimmed.to_lowercase();
        match lower.as_str() {
            "black" => Ok(Color::Black),
            "red" => Ok(Color::Red),
            "green" => Ok(Color::Green),
            "yellow" => Ok(Color::Yellow),
            "blue" => Ok(Color::Blue),
            "magenta" => Ok(Color::Magenta),
            "cyan" => Ok(Color::Cyan),
            "white" => Ok(Color::White),

            "bright_black" | "bright black" => Ok(Color::Indexed(8)),
            "bright_red" | "bright red" => Ok(Color::Indexed(9)),
            "bright_green" | "bright green" => Ok(Color::Indexed(10)),
            "bright_yellow" | "bright yellow" => Ok(Color::Indexed(11)),
            "bright_blue" | "bright blue" => Ok(Color::Indexed(12)),
            "bright_magenta" | "bright magenta" => Ok(Color::Indexed(13)),
            "bright_cyan" | "bright cyan" => Ok(Color::Indexed(14)),
            "bright_white" | "bright white" => Ok(Color::Indexed(15)),

            "gray" | "grey" => Ok(Color::Indexed(8)),
            "dark_gray" | "dark gray" | "dark_grey" | "dark grey" => Ok(Color::Indexed(8)),
            "light_gray" | "light gray" | "light_grey" | "light grey" => Ok(Color::Indexed(7)),

            "reset" => Ok(Color::Reset),

            _ => Err(eyre!(
                "Unknown color name: '{}'. Supported: basic ANSI colors (red, blue, etc.), \
                 bright variants (bright_red, etc.), indexed(N), or hex colors (#ff0000)",
                trimmed
            )),
        }
    }

    /// Best terminal color for an RGB triple given the detected capabilities.
    pub fn rgb(&self, r: u8, g: u8, b: u8) -> Color {
        if self.no_color {
            Color::Reset
        } else if self.supports_true_color {
            Color::Rgb(r, g, b)
        } else if self.supports_256 {
            Color::Indexed(rgb_to_256_color(r, g, b))
        } else {
            rgb_to_basic_ansi(r, g, b)
        }
    }
}

impl Default for ColorParser {
    fn default() -> Self {
        Self::new()
    }
}

/// Parse `#rrggbb` into its channels.
pub fn parse_hex(s: &str) -> Result<(u8, u8, u8)> {
    if !s.starts_with('#') || s.len() != 7 || !s.is_ascii() {
        return Err(eyre!(
            "Invalid hex color format: '{}'. Expected format: #rrggbb",
            s
        ));
    }

    let r = u8::from_str_radix(&s[1..3], 16)
        .map_err(|_| eyre!("Invalid red component in hex color: {}", s))?;
    let g = u8::from_str_radix(&s[3..5], 16)
        .map_err(|_| eyre!("Invalid green component in hex color: {}", s))?;
    let b = u8::from_str_radix(&s[5..7], 16)
        .map_err(|_| eyre!("Invalid blue component in hex color: {}", s))?;

    Ok((r, g, b))
}

/// Convert RGB to nearest xterm 256-color palette index
pub fn rgb_to_256_color(r: u8, g: u8, b: u8) -> u8 {
    let max_diff = r.max(g).max(b) as i16 - r.min(g).min(b) as i16;
    if max_diff < 10 {
        // grayscale ramp (232-255)
        let gray = (r as u16 + g as u16 + b as u16) / 3;
        if gray < 8 {
            return 16;
        } else if gray > 247 {
            return 231;
        } else {
            return 232 + ((gray - 8) * 24 / 240) as u8;
        }
    }

    // 6x6x6 color cube (16-231)
    let r_idx = (r as u16 * 5 / 255) as u8;
    let g_idx = (g as u16 * 5 / 255) as u8;
    let b_idx = (b as u16 * 5 / 255) as u8;

    16 + 36 * r_idx + 6 * g_idx + b_idx
}

/// Convert RGB to nearest basic ANSI color (8 colors)
pub fn rgb_to_basic_ansi(r: u8, g: u8, b: u8) -> Color {
    let max_diff = r.max(g).max(b) as i16 - r.min(g).min(b) as i16;
    if max_diff < 30 {
        let avg = (r as u16 + g as u16 + b as u16) / 3;
        return if avg < 64 { Color::Black } else { Color::White };
    }

    match (r > 128, g > 128, b > 128) {
        (false, false, false) => Color::Black,
        (true, false, false) => Color::Red,
        (false, true, false) => Color::Green,
        (true, true, false) => Color::Yellow,
        (false, false, true) => Color::Blue,
        (true, false, true) => Color::Magenta,
        (false, true, true) => Color::Cyan,
        (true, true, true) => Color::White,
    }
}

/// Theme containing parsed colors ready for use
#[derive(Debug, Clone)]
pub struct Theme {
    pub colors: HashMap<String, Color>,
    parser: ColorParser,
}

impl Theme {
    /// Create a Theme from a ThemeConfig by parsing all color strings
    pub fn from_config(config: &ThemeConfig) -> Result<Self> {
        Self::from_config_with(config, ColorParser::new())
    }

    pub fn from_config_with(config: &ThemeConfig, parser: ColorParser) -> Result<Self> {
        let mut colors = HashMap::new();
        for (name, value) in config.colors.entries() {
            colors.insert(name.to_string(), parser.parse(value)?);
        }
        Ok(Self { colors, parser })
    }

    /// Get a color by name, returns Reset if not found
    pub fn get(&self, name: &str) -> Color {
        self.colors.get(name).copied().unwrap_or(Color::Reset)
    }

    pub fn get_optional(&self, name: &str) -> Option<Color> {
        self.colors.get(name).copied()
    }

    /// Terminal color for a data-driven RGB value (cell gradient, show colors).
    pub fn rgb(&self, r: u8, g: u8, b: u8) -> Color {
        self.parser.rgb(r, g, b)
    }

    /// Terminal color for a `#rrggbb` string, if it parses.
    pub fn hex(&self, hex: &str) -> Option<Color> {
        parse_hex(hex).ok().map(|(r, g, b)| self.rgb(r, g, b))
    }
}

impl Default for Theme {
    fn default() -> Self {
        Self::from_config(&ThemeConfig::default()).unwrap_or_else(|_| Self {
            colors: HashMap::new(),
            parser: ColorParser::new(),
        })
    }
}

// Default configuration template
const DEFAULT_CONFIG_TEMPLATE: &str = include_str!("../config/default.toml");

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn display_settings_parse() {
        let display = DisplayConfig::default();
        assert_eq!(display.orientation().unwrap(), Orientation::SubsetRows);
        assert_eq!(display.label_style().unwrap(), LabelStyle::Abbr);
        assert_eq!(display.plot_marker().unwrap(), Marker::Braille);

        let transposed = DisplayConfig {
            orientation: "disruption-rows".to_string(),
            label_style: "FULL".to_string(),
            plot_marker: "dot".to_string(),
        };
        assert_eq!(transposed.orientation().unwrap(), Orientation::DisruptionRows);
        assert_eq!(transposed.label_style().unwrap(), LabelStyle::Full);
        assert_eq!(transposed.plot_marker().unwrap(), Marker::Dot);
    }

    #[test]
    fn file_format_setting() {
        let mut loading = FileLoadingConfig::default();
        assert_eq!(loading.format().unwrap(), None);
        loading.format = Some("tsv".to_string());
        assert_eq!(loading.format().unwrap(), Some(FileFormat::Tsv));
        loading.format = Some("parquet".to_string());
        assert!(loading.format().is_err());
    }

    #[test]
    fn rgb_respects_capabilities() {
        let truecolor = ColorParser::with_capabilities(true, true, false);
        assert_eq!(truecolor.rgb(255, 128, 0), Color::Rgb(255, 128, 0));

        let ansi256 = ColorParser::with_capabilities(false, true, false);
        assert_eq!(ansi256.rgb(255, 0, 0), Color::Indexed(196));

        let basic = ColorParser::with_capabilities(false, false, false);
        assert_eq!(basic.rgb(0, 255, 0), Color::Green);

        let none = ColorParser::with_capabilities(true, true, true);
        assert_eq!(none.rgb(0, 255, 0), Color::Reset);
    }

    #[test]
    fn theme_hex_lookup() {
        let parser = ColorParser::with_capabilities(true, true, false);
        let theme = Theme::from_config_with(&ThemeConfig::default(), parser).unwrap();
        assert_eq!(theme.get("primary"), Color::Cyan);
        assert_eq!(theme.get("missing"), Color::Reset);
        assert_eq!(theme.hex("#fe2b2b"), Some(Color::Rgb(0xfe, 0x2b, 0x2b)));
        assert_eq!(theme.hex("red"), None);
    }
}
