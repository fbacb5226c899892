//! Configuration Vault – reads/writes `~/.stancelink/config.toml`.

use serde::{Deserialize, Serialize};
use stancelink_runtime::PostureConfig;
use std::fs;
use std::path::{Path, PathBuf};

/// Persisted run configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Config {
    /// Simulation ticks per second.
    #[serde(default = "default_tick_hz")]
    pub tick_hz: u32,

    /// Where sensor records come from: a path (e.g. `/dev/ttyACM0`, a FIFO)
    /// or `-` for stdin.
    #[serde(default = "default_source")]
    pub source: String,

    /// Label of the serial port the insole is attached to.  Informational;
    /// the line itself is configured outside StanceLink.
    #[serde(default = "default_port_label")]
    pub port_label: String,

    /// Baud rate the insole firmware runs at.  Informational, like
    /// `port_label`.
    #[serde(default = "default_baud_rate")]
    pub baud_rate: u32,

    /// Posture state machine tuning.
    #[serde(default)]
    pub posture: PostureConfig,
}

fn default_tick_hz() -> u32 {
    50
}
fn default_source() -> String {
    "-".to_string()
}
fn default_port_label() -> String {
    "COM1".to_string()
}
fn default_baud_rate() -> u32 {
    9600
}

impl Default for Config {
    fn default() -> Self {
        Self {
            tick_hz: default_tick_hz(),
            source: default_source(),
            port_label: default_port_label(),
            baud_rate: default_baud_rate(),
            posture: PostureConfig::default(),
        }
    }
}

/// Return the path to `~/.stancelink/config.toml`.
pub fn config_path() -> PathBuf {
    config_path_for_home(
        &std::env::var("HOME")
            .or_else(|_| std::env::var("USERPROFILE"))
            .unwrap_or_else(|_| ".".to_string()),
    )
}

/// Build the config path relative to the given home directory.
pub(crate) fn config_path_for_home(home: &str) -> PathBuf {
    PathBuf::from(home).join(".stancelink").join("config.toml")
}

/// Load the config at `path` and apply `STANCELINK_*` overrides.  Falls back
/// to defaults (plus overrides) when the file does not exist.
pub fn load(path: &Path) -> Result<Config, String> {
    let mut cfg = load_from(path)?.unwrap_or_default();
    apply_env_overrides(&mut cfg);
    Ok(cfg)
}

/// Load the config from a specific path.  Returns `None` if the file does
/// not exist.  No environment overrides are applied.
pub(crate) fn load_from(path: &Path) -> Result<Option<Config>, String> {
    if !path.exists() {
        return Ok(None);
    }
    let raw = fs::read_to_string(path)
        .map_err(|e| format!("Failed to read config at {}: {}", path.display(), e))?;
    let cfg: Config =
        toml::from_str(&raw).map_err(|e| format!("Failed to parse config: {}", e))?;
    Ok(Some(cfg))
}

/// Apply `STANCELINK_*` environment variable overrides to `cfg`.
///
/// | Variable | Config field |
/// |---|---|
/// | `STANCELINK_SOURCE` | `source` |
/// | `STANCELINK_TICK_HZ` | `tick_hz` |
/// | `STANCELINK_THRESHOLD` | `posture.threshold` |
/// | `STANCELINK_MOVE_DURATION` | `posture.move_duration_secs` |
///
/// Values that fail to parse are ignored.
pub fn apply_env_overrides(cfg: &mut Config) {
    if let Ok(v) = std::env::var("STANCELINK_SOURCE") {
        cfg.source = v;
    }
    if let Ok(v) = std::env::var("STANCELINK_TICK_HZ")
        && let Ok(hz) = v.parse::<u32>()
    {
        cfg.tick_hz = hz;
    }
    if let Ok(v) = std::env::var("STANCELINK_THRESHOLD")
        && let Ok(threshold) = v.parse::<f32>()
    {
        cfg.posture.threshold = threshold;
    }
    if let Ok(v) = std::env::var("STANCELINK_MOVE_DURATION")
        && let Ok(secs) = v.parse::<f32>()
    {
        cfg.posture.move_duration_secs = secs;
    }
}

/// Save the config to a specific path, creating the parent directory.
pub fn save_to(cfg: &Config, path: &Path) -> Result<(), String> {
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .map_err(|e| format!("Failed to create config directory: {}", e))?;
        // Owner-only directory (rwx------) on Unix.
        #[cfg(unix)]
        {
            use std::os::unix::fs::PermissionsExt;
            fs::set_permissions(parent, fs::Permissions::from_mode(0o700))
                .map_err(|e| format!("Failed to set config directory permissions: {}", e))?;
        }
    }
    let raw =
        toml::to_string_pretty(cfg).map_err(|e| format!("Failed to serialize config: {}", e))?;
    // Owner-only file (rw-------) on Unix.
    #[cfg(unix)]
    {
        use std::os::unix::fs::OpenOptionsExt;
        fs::OpenOptions::new()
            .write(true)
            .create(true)
            .truncate(true)
            .mode(0o600)
            .open(path)
            .and_then(|mut f| {
                use std::io::Write;
                f.write_all(raw.as_bytes())
            })
            .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    }
    #[cfg(not(unix))]
    fs::write(path, raw)
        .map_err(|e| format!("Failed to write config at {}: {}", path.display(), e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn roundtrip_default_config() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());

        save_to(&Config::default(), &path).expect("save");
        let loaded = load_from(&path).expect("load ok").expect("some");
        assert_eq!(loaded, Config::default());
    }

    #[test]
    fn partial_file_fills_in_defaults() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "source = \"/dev/ttyACM0\"\n\n[posture]\nthreshold = 250.0\n")
            .expect("write");

        let cfg = load_from(&path).expect("load ok").expect("some");
        assert_eq!(cfg.source, "/dev/ttyACM0");
        assert_eq!(cfg.tick_hz, 50);
        assert_eq!(cfg.baud_rate, 9600);
        assert!((cfg.posture.threshold - 250.0).abs() < f32::EPSILON);
        assert!((cfg.posture.sitting_y - (-3.0)).abs() < f32::EPSILON);
    }

    #[test]
    fn invalid_toml_is_reported() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = dir.path().join("config.toml");
        fs::write(&path, "tick_hz = \"fast\"").expect("write");
        let err = load_from(&path).unwrap_err();
        assert!(err.contains("Failed to parse config"));
    }

    #[cfg(unix)]
    #[test]
    fn config_file_has_restrictive_permissions() {
        use std::os::unix::fs::PermissionsExt;
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());

        save_to(&Config::default(), &path).expect("save");

        let file_mode = fs::metadata(&path).expect("file metadata").permissions().mode() & 0o777;
        assert_eq!(file_mode, 0o600, "config file must have 0o600 permissions");

        let dir_mode = fs::metadata(path.parent().unwrap())
            .expect("dir metadata")
            .permissions()
            .mode()
            & 0o777;
        assert_eq!(dir_mode, 0o700, "config directory must have 0o700 permissions");
    }

    #[test]
    fn config_path_points_to_stancelink_dir() {
        let p = config_path_for_home("/home/testuser");
        assert!(p.to_string_lossy().contains(".stancelink"));
        assert!(p.to_string_lossy().ends_with("config.toml"));
    }

    #[test]
    fn load_from_returns_none_when_missing() {
        let dir = tempfile::tempdir().expect("tmp dir");
        let path = config_path_for_home(&dir.path().to_string_lossy());
        assert!(load_from(&path).expect("no error").is_none());
    }

    #[test]
    fn apply_env_overrides_changes_threshold() {
        // SAFETY: each env test owns a distinct variable.
        unsafe { std::env::set_var("STANCELINK_THRESHOLD", "512.5") };
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert!((cfg.posture.threshold - 512.5).abs() < f32::EPSILON);
        unsafe { std::env::remove_var("STANCELINK_THRESHOLD") };
    }

    #[test]
    fn apply_env_overrides_changes_move_duration() {
        // SAFETY: each env test owns a distinct variable.
        unsafe { std::env::set_var("STANCELINK_MOVE_DURATION", "0.25") };
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert!((cfg.posture.move_duration_secs - 0.25).abs() < f32::EPSILON);
        unsafe { std::env::remove_var("STANCELINK_MOVE_DURATION") };
    }

    #[test]
    fn apply_env_overrides_ignores_invalid_tick_rate() {
        // SAFETY: each env test owns a distinct variable.
        unsafe { std::env::set_var("STANCELINK_TICK_HZ", "fast") };
        let mut cfg = Config::default();
        apply_env_overrides(&mut cfg);
        assert_eq!(cfg.tick_hz, 50);
        unsafe { std::env::remove_var("STANCELINK_TICK_HZ") };
    }
}
