use ratatui::style::Color;
use sepviz::config::{AppConfig, ColorParser, ConfigManager, Theme};
use sepviz::labels::LabelStyle;
use sepviz::pivot::Orientation;
use sepviz::FileFormat;
use std::fs;
use tempfile::TempDir;

// Helper to create a temporary config directory for testing
fn setup_test_config_dir() -> (TempDir, ConfigManager) {
    let temp_dir = TempDir::new().expect("Failed to create temp dir");
    let config_manager = ConfigManager::with_dir(temp_dir.path().to_path_buf());
    (temp_dir, config_manager)
}

fn write_config(manager: &ConfigManager, content: &str) {
    manager.ensure_config_dir().unwrap();
    fs::write(manager.config_path("config.toml"), content).unwrap();
}

#[test]
fn test_default_config() {
    let config = AppConfig::default();

    assert_eq!(config.version, "0.1");
    assert_eq!(
        config.file_loading.default_path,
        "data/umap_df_for_js_plot.csv"
    );
    assert!(config.file_loading.format.is_none());
    assert_eq!(config.display.orientation().unwrap(), Orientation::SubsetRows);
    assert_eq!(config.display.label_style().unwrap(), LabelStyle::Abbr);
    assert_eq!(config.performance.event_poll_interval_ms, 25);
    assert_eq!(config.theme.color_mode, "auto");
    assert!(!config.debug.enabled);
    assert!(config.validate().is_ok());
}

#[test]
fn test_generate_default_config() {
    let (_temp_dir, config_manager) = setup_test_config_dir();
    let template = config_manager.generate_default_config();

    for section in [
        "[file_loading]",
        "[display]",
        "[performance]",
        "[theme]",
        "[theme.colors]",
        "[debug]",
    ] {
        assert!(template.contains(section), "missing {}", section);
    }
    assert!(template.contains("version = \"0.1\""));

    // The shipped template must itself be a valid config.
    let parsed: AppConfig = toml::from_str(&template).expect("template parses");
    assert!(parsed.validate().is_ok());
}

#[test]
fn test_write_default_config_refuses_overwrite() {
    let (_temp_dir, config_manager) = setup_test_config_dir();

    let path = config_manager
        .write_default_config(false)
        .expect("Failed to write config");
    assert!(path.exists());

    let err = config_manager.write_default_config(false).unwrap_err();
    assert!(err.to_string().contains("--force"));

    fs::write(&path, "# edited").unwrap();
    config_manager
        .write_default_config(true)
        .expect("force overwrites");
    let content = fs::read_to_string(&path).unwrap();
    assert!(content.contains("[display]"));
}

#[test]
fn test_load_without_config_file() {
    let (_temp_dir, config_manager) = setup_test_config_dir();
    let config = AppConfig::load_from(&config_manager).unwrap();
    assert_eq!(config.display.orientation, "subset-rows");
}

#[test]
fn test_load_partial_config() {
    let (_temp_dir, config_manager) = setup_test_config_dir();
    write_config(
        &config_manager,
        r##"
[file_loading]
format = "tsv"

[display]
orientation = "disruption-rows"

[theme.colors]
cursor = "#ff8800"
"##,
    );

    let config = AppConfig::load_from(&config_manager).unwrap();
    assert_eq!(config.file_loading.format().unwrap(), Some(FileFormat::Tsv));
    assert_eq!(
        config.display.orientation().unwrap(),
        Orientation::DisruptionRows
    );
    // Untouched settings keep their defaults.
    assert_eq!(config.display.label_style, "abbr");
    assert_eq!(config.theme.colors.primary, "cyan");
    assert_eq!(config.theme.colors.cursor, "#ff8800");
}

#[test]
fn test_merge_prefers_non_default_values() {
    let mut base = AppConfig::default();
    base.display.label_style = "full".to_string();

    let mut other = AppConfig::default();
    other.performance.event_poll_interval_ms = 50;
    base.merge(other);

    assert_eq!(base.display.label_style, "full");
    assert_eq!(base.performance.event_poll_interval_ms, 50);
}

#[test]
fn test_invalid_configs_are_rejected() {
    let mut config = AppConfig::default();
    config.version = "9.0".to_string();
    assert!(config
        .validate()
        .unwrap_err()
        .to_string()
        .contains("Unsupported config version"));

    let mut config = AppConfig::default();
    config.performance.event_poll_interval_ms = 0;
    assert!(config.validate().is_err());

    let mut config = AppConfig::default();
    config.display.orientation = "diagonal".to_string();
    assert!(config.validate().is_err());

    let mut config = AppConfig::default();
    config.file_loading.format = Some("parquet".to_string());
    assert!(config.validate().is_err());

    let mut config = AppConfig::default();
    config.theme.colors.cursor = "not_a_color".to_string();
    assert!(config.validate().is_err());
}

#[test]
fn test_broken_config_file_reports_path() {
    let (_temp_dir, config_manager) = setup_test_config_dir();
    write_config(&config_manager, "[display\norientation = ");
    let err = AppConfig::load_from(&config_manager).unwrap_err();
    assert!(err.to_string().contains("config.toml"));
}

#[test]
fn test_theme_from_config() {
    let mut config = AppConfig::default();
    config.theme.colors.error = "#102030".to_string();
    let parser = ColorParser::with_capabilities(true, true, false);
    let theme = Theme::from_config_with(&config.theme, parser).unwrap();

    assert_eq!(theme.get("error"), Color::Rgb(16, 32, 48));
    assert_eq!(theme.get("primary"), Color::Cyan);
    assert!(theme.get_optional("no_such_color").is_none());
}
