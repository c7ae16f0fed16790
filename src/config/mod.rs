use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use toml::map::Entry;
use tracing::warn;

/// Index range of the zoom ramp; a dock at this index is fully magnified.
pub const MAX_MAGNITUDE_INDEX: u32 = 1000;

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub icons: IconsConfig,
    pub dock: DockConfig,
    pub system: SystemConfig,
    pub screen: ScreenConfig,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            icons: IconsConfig::default(),
            dock: DockConfig::default(),
            system: SystemConfig::default(),
            screen: ScreenConfig::default(),
        }
    }
}

impl Config {
    /// Loads the layered configuration, lowest priority first: system file,
    /// user file, `./dockwave.toml`, then the `DOCKWAVE_PROFILE` override.
    pub fn load() -> Self {
        let mut merged = match toml::Value::try_from(Self::default()) {
            Ok(value) => value,
            Err(err) => {
                warn!("default config does not serialize: {err}");
                return Self::default();
            }
        };

        let mut found_any_config = false;

        // 1. System config
        if let Some(system_config) = get_system_config_path() {
            found_any_config |= merge_file(&mut merged, &system_config, "system");
        }

        // 2. User config (XDG)
        if let Some(user_config) = get_user_config_path() {
            found_any_config |= merge_file(&mut merged, &user_config, "user");
        }

        // 3. Current directory (dev override)
        let local = PathBuf::from("dockwave.toml");
        if local.exists() {
            found_any_config |= merge_file(&mut merged, &local, "local");
        }

        // 4. Profile overrides (highest priority)
        if let Ok(profile) = std::env::var("DOCKWAVE_PROFILE") {
            for candidate in profile_override_candidates(&profile) {
                tracing::debug!("Trying to load profile override config: {}", &candidate);
                let path = PathBuf::from(&candidate);
                if path.exists() && merge_file(&mut merged, &path, "profile override") {
                    found_any_config = true;
                    break;
                }
            }
        }

        if !found_any_config {
            warn!("No configuration file found, using default config");
        }

        let config: Config = merged.try_into().unwrap_or_else(|err| {
            warn!("Falling back to default config due to invalid overrides: {err}");
            Self::default()
        });
        tracing::info!(
            "Config initialized: icon size {}, amplitude {}, visibility {:?}",
            config.icons.icon_size,
            config.icons.amplitude,
            config.dock.visibility
        );
        config
    }

    /// Reads a single file on top of the defaults, surfacing errors instead
    /// of falling back.
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&content).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

fn merge_file(merged: &mut toml::Value, path: &Path, label: &str) -> bool {
    let content = match std::fs::read_to_string(path) {
        Ok(content) => content,
        Err(err) => {
            warn!("Failed to read {}: {err}", path.display());
            return false;
        }
    };
    match content.parse::<toml::Value>() {
        Ok(value) => {
            merge_value(merged, value);
            tracing::info!("Loaded {label} config from {}", path.display());
            true
        }
        Err(err) => {
            warn!("Failed to parse {}: {err}", path.display());
            false
        }
    }
}

fn merge_value(base: &mut toml::Value, overrides: toml::Value) {
    match (base, overrides) {
        (toml::Value::Table(base_map), toml::Value::Table(override_map)) => {
            for (key, override_value) in override_map {
                match base_map.entry(key) {
                    Entry::Occupied(mut entry) => merge_value(entry.get_mut(), override_value),
                    Entry::Vacant(entry) => {
                        entry.insert(override_value);
                    }
                }
            }
        }
        (base_value, override_value) => {
            *base_value = override_value;
        }
    }
}

fn get_system_config_path() -> Option<PathBuf> {
    let path = PathBuf::from("/etc/dockwave/config.toml");
    if path.exists() {
        Some(path)
    } else {
        None
    }
}

fn get_user_config_path() -> Option<PathBuf> {
    let config_dir = std::env::var("XDG_CONFIG_HOME")
        .ok()
        .map(PathBuf::from)
        .or_else(|| {
            std::env::var("HOME")
                .ok()
                .map(|home| PathBuf::from(home).join(".config"))
        })?;

    let path = config_dir.join("dockwave").join("config.toml");
    if path.exists() {
        Some(path)
    } else {
        None
    }
}

fn profile_override_candidates(profile: &str) -> Vec<String> {
    match profile {
        "vertical-left" | "vertical-right" => vec![
            format!("dockwave.{profile}.toml"),
            "dockwave.vertical.toml".into(),
        ],
        other => vec![format!("dockwave.{other}.toml")],
    }
}

/// Geometry shared by every icon of every dock.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct IconsConfig {
    /// Space between two icons, in pixels.
    #[serde(default = "default_icon_gap")]
    pub icon_gap: f64,
    /// Radius of influence of the zoom wave around the cursor.
    #[serde(default = "default_sinusoid_width")]
    pub sinusoid_width: f64,
    /// Extra scale reached by the icon under the cursor (1.0 doubles it).
    #[serde(default = "default_amplitude")]
    pub amplitude: f64,
    #[serde(default = "default_icon_size")]
    pub icon_size: f64,
    #[serde(default = "default_separator_size")]
    pub separator_size: f64,
    #[serde(default)]
    pub label_size: f64,
}

impl Default for IconsConfig {
    fn default() -> Self {
        Self {
            icon_gap: default_icon_gap(),
            sinusoid_width: default_sinusoid_width(),
            amplitude: default_amplitude(),
            icon_size: default_icon_size(),
            separator_size: default_separator_size(),
            label_size: 0.0,
        }
    }
}

fn default_icon_gap() -> f64 {
    2.0
}

fn default_sinusoid_width() -> f64 {
    250.0
}

fn default_amplitude() -> f64 {
    1.0
}

fn default_icon_size() -> f64 {
    48.0
}

fn default_separator_size() -> f64 {
    12.0
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum VisibilityMode {
    /// Always on top, never hides.
    #[default]
    KeepAbove,
    /// Always on top and reserves its strip of the screen.
    Reserve,
    /// Stays below windows, pops up when entered.
    KeepBelow,
    /// Slides out of the screen when left.
    AutoHide,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct DockConfig {
    pub frame_margin: f64,
    pub line_width: f64,
    pub radius: f64,
    /// Position along the screen edge: 0 left/top, 1 right/bottom.
    pub align: f64,
    pub gap_x: i32,
    pub gap_y: i32,
    pub visibility: VisibilityMode,
    pub horizontal: bool,
    pub direction_up: bool,
    pub leave_sub_dock_delay_ms: u64,
    pub show_sub_dock_delay_ms: u64,
    pub show_sub_dock_on_click: bool,
    pub unhide_delay_ms: u64,
    pub hide_back_delay_ms: u64,
    pub animate_sub_dock: bool,
    pub mixed_groups_separators: bool,
    /// Upper bound for the dock width; 0 means the screen width.
    pub max_authorized_width: u32,
    /// Stretch the frame of a root dock to the authorized width.
    pub extended: bool,
}

impl Default for DockConfig {
    fn default() -> Self {
        Self {
            frame_margin: 4.0,
            line_width: 1.0,
            radius: 6.0,
            align: 0.5,
            gap_x: 0,
            gap_y: 0,
            visibility: VisibilityMode::default(),
            horizontal: true,
            direction_up: true,
            leave_sub_dock_delay_ms: 330,
            show_sub_dock_delay_ms: 300,
            show_sub_dock_on_click: false,
            unhide_delay_ms: 0,
            hide_back_delay_ms: 2000,
            animate_sub_dock: true,
            mixed_groups_separators: true,
            max_authorized_width: 0,
            extended: true,
        }
    }
}

/// Animation pacing.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct SystemConfig {
    pub grow_nb_steps: u32,
    pub shrink_nb_steps: u32,
    pub unhide_nb_steps: u32,
    pub hide_nb_steps: u32,
    /// Animation frames per second.
    pub refresh_frequency: u32,
    pub unfold_duration_ms: u64,
    /// Ratio ceiling of sub-docks relative to their icons' nominal size.
    pub sub_dock_size_ratio: f64,
    pub max_sizing_iterations: u32,
    /// Zoom ceiling of sub-docks; root docks always zoom fully.
    pub sub_dock_magnitude_max: f64,
}

impl Default for SystemConfig {
    fn default() -> Self {
        Self {
            grow_nb_steps: 10,
            shrink_nb_steps: 8,
            unhide_nb_steps: 10,
            hide_nb_steps: 12,
            refresh_frequency: 25,
            unfold_duration_ms: 400,
            sub_dock_size_ratio: 0.8,
            max_sizing_iterations: 8,
            sub_dock_magnitude_max: 0.8,
        }
    }
}

impl SystemConfig {
    pub fn grow_interval(&self) -> u32 {
        (MAX_MAGNITUDE_INDEX / self.grow_nb_steps.max(1)).max(1)
    }

    pub fn shrink_interval(&self) -> u32 {
        (MAX_MAGNITUDE_INDEX / self.shrink_nb_steps.max(1)).max(1)
    }

    pub fn frame_interval_ms(&self) -> u64 {
        (1000 / u64::from(self.refresh_frequency.max(1))).max(1)
    }
}

/// Screen size used when no windowing layer reports one.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct ScreenConfig {
    #[serde(default = "default_screen_width")]
    pub width: u32,
    #[serde(default = "default_screen_height")]
    pub height: u32,
}

impl Default for ScreenConfig {
    fn default() -> Self {
        Self {
            width: default_screen_width(),
            height: default_screen_height(),
        }
    }
}

fn default_screen_width() -> u32 {
    1920
}

fn default_screen_height() -> u32 {
    1080
}

#[cfg(test)]
mod tests {
    use super::*;
    use serial_test::serial;
    use std::env;
    use std::fs;

    #[test]
    fn visibility_defaults_to_keep_above() {
        let config = Config::default();
        assert_eq!(config.dock.visibility, VisibilityMode::KeepAbove);
    }

    #[test]
    fn visibility_overrides_in_toml() {
        let overrides = r#"
            [dock]
            visibility = "auto_hide"
        "#;

        let config: Config = toml::from_str(overrides).expect("Config should deserialize");
        assert_eq!(config.dock.visibility, VisibilityMode::AutoHide);
        assert_eq!(config.dock.leave_sub_dock_delay_ms, 330);
    }

    #[test]
    fn test_intervals_from_steps() {
        let system = SystemConfig::default();
        assert_eq!(system.grow_interval(), 100);
        assert_eq!(system.shrink_interval(), 125);
        assert_eq!(system.frame_interval_ms(), 40);

        let degenerate = SystemConfig {
            grow_nb_steps: 0,
            shrink_nb_steps: 5000,
            refresh_frequency: 0,
            ..SystemConfig::default()
        };
        assert_eq!(degenerate.grow_interval(), 1000);
        assert_eq!(degenerate.shrink_interval(), 1);
        assert_eq!(degenerate.frame_interval_ms(), 1000);
    }

    #[test]
    #[serial]
    fn test_get_user_config_path_with_xdg_config_home() {
        let temp_dir = tempfile::tempdir().unwrap();

        let old_xdg = env::var("XDG_CONFIG_HOME").ok();
        env::set_var("XDG_CONFIG_HOME", temp_dir.path());

        let config_dir = temp_dir.path().join("dockwave");
        fs::create_dir_all(&config_dir).unwrap();
        let config_file = config_dir.join("config.toml");
        fs::write(&config_file, "# test config").unwrap();

        let path = get_user_config_path();
        assert_eq!(path, Some(config_file));

        if let Some(old) = old_xdg {
            env::set_var("XDG_CONFIG_HOME", old);
        } else {
            env::remove_var("XDG_CONFIG_HOME");
        }
    }

    #[test]
    #[serial]
    fn test_get_user_config_path_without_file() {
        let temp_dir = tempfile::tempdir().unwrap();

        let old_xdg = env::var("XDG_CONFIG_HOME").ok();
        env::set_var("XDG_CONFIG_HOME", temp_dir.path());

        assert!(get_user_config_path().is_none());

        if let Some(old) = old_xdg {
            env::set_var("XDG_CONFIG_HOME", old);
        } else {
            env::remove_var("XDG_CONFIG_HOME");
        }
    }

    #[test]
    #[serial]
    fn test_load_picks_up_user_file() {
        let temp_dir = tempfile::tempdir().unwrap();
        let old_xdg = env::var("XDG_CONFIG_HOME").ok();
        env::set_var("XDG_CONFIG_HOME", temp_dir.path());

        let config_dir = temp_dir.path().join("dockwave");
        fs::create_dir_all(&config_dir).unwrap();
        fs::write(
            config_dir.join("config.toml"),
            "[icons]\namplitude = 0.5\n[system]\ngrow_nb_steps = 4\n",
        )
        .unwrap();

        let config = Config::load();
        assert_eq!(config.icons.amplitude, 0.5);
        assert_eq!(config.system.grow_nb_steps, 4);
        assert_eq!(config.icons.icon_gap, 2.0);

        if let Some(old) = old_xdg {
            env::set_var("XDG_CONFIG_HOME", old);
        } else {
            env::remove_var("XDG_CONFIG_HOME");
        }
    }

    #[test]
    fn test_config_merge_priority() {
        let mut base =
            toml::Value::try_from(Config::default()).expect("default config is valid toml");

        let first: toml::Value = r#"
            [icons]
            sinusoid_width = 100.0
            [dock]
            align = 0.0
        "#
        .parse()
        .unwrap();
        let second: toml::Value = r#"
            [dock]
            align = 1.0
        "#
        .parse()
        .unwrap();

        merge_value(&mut base, first);
        merge_value(&mut base, second);

        let config: Config = base.try_into().unwrap();
        assert_eq!(config.icons.sinusoid_width, 100.0);
        assert_eq!(config.dock.align, 1.0);
        assert_eq!(config.dock.frame_margin, 4.0);
    }

    #[test]
    fn test_from_path_reports_parse_errors() {
        let temp_dir = tempfile::tempdir().unwrap();
        let file = temp_dir.path().join("broken.toml");
        fs::write(&file, "[icons\namplitude = ").unwrap();

        let err = Config::from_path(&file).unwrap_err();
        assert!(matches!(err, ConfigError::Parse { .. }));

        let missing = Config::from_path(temp_dir.path().join("missing.toml")).unwrap_err();
        assert!(matches!(missing, ConfigError::Io { .. }));
    }

    #[test]
    fn test_profile_override_candidates() {
        assert_eq!(
            profile_override_candidates("vertical-left"),
            vec!["dockwave.vertical-left.toml", "dockwave.vertical.toml"]
        );
        assert_eq!(
            profile_override_candidates("demo"),
            vec!["dockwave.demo.toml"]
        );
    }
}
