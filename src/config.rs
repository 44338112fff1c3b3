//! Settings for the `bf` binary.
//!
//! Values are resolved in this order: command-line flags, environment
//! variables, `$XDG_CONFIG_HOME/bf.toml`, built-in defaults. Flags are applied
//! by the commands themselves; this module handles the rest.

use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

use cross_xdg::BaseDirs;
use nu_ansi_term::Color;

use crate::debugger::{DEFAULT_PACING, DEFAULT_WINDOW_RADIUS};
use crate::guard::{HistoryPolicy, Limits};
use crate::theme::Palette;

/// Scripts directory used when nothing else is configured.
pub const DEFAULT_SCRIPTS_DIR: &str = "scripts";

pub const ENV_CONFIG: &str = "BF_CONFIG";
pub const ENV_MAX_ITERATIONS: &str = "BF_MAX_ITERATIONS";
pub const ENV_TIMEOUT_SECS: &str = "BF_TIMEOUT_SECS";
pub const ENV_DEBUG_DELAY_MS: &str = "BF_DEBUG_DELAY_MS";
pub const ENV_SCRIPTS_DIR: &str = "BF_SCRIPTS_DIR";
pub const ENV_LOG_FILE: &str = "BF_LOG_FILE";

#[derive(Debug, Clone)]
pub struct Settings {
    pub limits: Limits,
    pub timeout: Option<Duration>,
    pub debug_delay: Duration,
    pub window_radius: usize,
    pub scripts_dir: PathBuf,
    pub log_file: Option<PathBuf>,
    pub palette: Palette,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            limits: Limits::default(),
            timeout: None,
            debug_delay: DEFAULT_PACING,
            window_radius: DEFAULT_WINDOW_RADIUS,
            scripts_dir: PathBuf::from(DEFAULT_SCRIPTS_DIR),
            log_file: None,
            palette: Palette::default(),
        }
    }
}

impl Settings {
    /// Defaults, overlaid with the config file (if any) and the environment.
    pub fn load() -> Self {
        let mut settings = config_path()
            .and_then(|path| fs::read_to_string(path).ok())
            .map(|content| Self::from_toml(&content))
            .unwrap_or_default();
        settings.apply_env(|key| env::var(key).ok());
        settings
    }

    /// Parse the small TOML subset we understand. Unknown sections, keys, and
    /// unparsable values are ignored.
    pub fn from_toml(content: &str) -> Self {
        let sections = parse_sections(content);
        let mut cfg = Self::default();
        let get = |section: &str, key: &str| sections.get(section).and_then(|s| s.get(key)).map(String::as_str);

        if let Some(v) = get("limits", "max_iterations").and_then(|s| s.parse().ok()) {
            cfg.limits.max_iterations = v;
        }
        if let Some(v) = get("limits", "loop_detection").and_then(parse_bool) {
            cfg.limits.loop_detection = v;
        }
        if let Some(v) = get("limits", "repeat_threshold").and_then(|s| s.parse().ok()) {
            cfg.limits.repeat_threshold = v;
        }
        if let Some(v) = get("limits", "history_capacity").and_then(|s| s.parse().ok()) {
            cfg.limits.history_capacity = v;
        }
        if let Some(v) = get("limits", "history_policy").and_then(parse_policy) {
            cfg.limits.history_policy = v;
        }
        if let Some(v) = get("limits", "timeout_secs").and_then(parse_secs) {
            cfg.timeout = Some(v);
        }

        if let Some(v) = get("debugger", "delay_ms").and_then(|s| s.parse().ok()) {
            cfg.debug_delay = Duration::from_millis(v);
        }
        if let Some(v) = get("debugger", "window_radius").and_then(|s| s.parse().ok()) {
            cfg.window_radius = v;
        }

        if let Some(v) = get("scripts", "dir") {
            cfg.scripts_dir = PathBuf::from(v);
        }
        if let Some(v) = get("logging", "file") {
            cfg.log_file = Some(PathBuf::from(v));
        }

        macro_rules! set_color {
            ($field:ident) => {
                if let Some(v) = get("colors", stringify!($field)).and_then(parse_color) {
                    cfg.palette.$field = v;
                }
            };
        }
        set_color!(cursor);
        set_color!(cell_nonzero);
        set_color!(cell_empty);
        set_color!(breakpoint);
        set_color!(output);
        set_color!(label);
        set_color!(instruction);

        cfg
    }

    /// Overlay environment variables looked up through `var`.
    pub fn apply_env<F>(&mut self, var: F)
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(v) = var(ENV_MAX_ITERATIONS).and_then(|s| s.trim().parse().ok()) {
            self.limits.max_iterations = v;
        }
        if let Some(v) = var(ENV_TIMEOUT_SECS).and_then(|s| parse_secs(&s)) {
            self.timeout = Some(v);
        }
        if let Some(v) = var(ENV_DEBUG_DELAY_MS).and_then(|s| s.trim().parse().ok()) {
            self.debug_delay = Duration::from_millis(v);
        }
        if let Some(v) = var(ENV_SCRIPTS_DIR).filter(|s| !s.trim().is_empty()) {
            self.scripts_dir = PathBuf::from(v);
        }
        if let Some(v) = var(ENV_LOG_FILE).filter(|s| !s.trim().is_empty()) {
            self.log_file = Some(PathBuf::from(v));
        }
    }
}

/// `$BF_CONFIG` if set, otherwise `bf.toml` in the XDG config home.
pub fn config_path() -> Option<PathBuf> {
    if let Ok(explicit) = env::var(ENV_CONFIG) {
        return Some(PathBuf::from(explicit));
    }

    // On Linux: resolves to /home/<user>/.config
    // On Windows: resolves to C:\Users\<user>\.config
    // On macOS: resolves to /Users/<user>/.config
    let base_dirs = BaseDirs::new().ok()?;
    let mut path = PathBuf::from(base_dirs.config_home());
    path.push("bf.toml");
    Some(path)
}

/// Split `content` into `section -> key -> value`. Values may be quoted.
fn parse_sections(content: &str) -> HashMap<String, HashMap<String, String>> {
    let mut sections: HashMap<String, HashMap<String, String>> = HashMap::new();
    let mut current = String::new();

    for line in content.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        if line.starts_with('[') && line.ends_with(']') {
            current = line[1..line.len() - 1].trim().to_string();
            continue;
        }
        if let Some(eq) = line.find('=') {
            let key = line[..eq].trim().to_string();
            let val_raw = line[eq + 1..].trim();
            let val = if val_raw.starts_with('"') && val_raw.ends_with('"') && val_raw.len() >= 2 {
                val_raw[1..val_raw.len() - 1].to_string()
            } else {
                val_raw.to_string()
            };
            sections.entry(current.clone()).or_default().insert(key, val);
        }
    }

    sections
}

fn parse_bool(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "true" | "yes" | "on" | "1" => Some(true),
        "false" | "no" | "off" | "0" => Some(false),
        _ => None,
    }
}

fn parse_policy(value: &str) -> Option<HistoryPolicy> {
    match value.trim().to_ascii_lowercase().as_str() {
        "clear" | "clear_when_full" => Some(HistoryPolicy::ClearWhenFull),
        "evict" | "evict_oldest" => Some(HistoryPolicy::EvictOldest),
        _ => None,
    }
}

/// Non-negative, finite seconds, fractions allowed.
pub fn parse_secs(value: &str) -> Option<Duration> {
    let secs: f64 = value.trim().parse().ok()?;
    if secs.is_finite() && secs >= 0.0 {
        Some(Duration::from_secs_f64(secs))
    } else {
        None
    }
}

fn parse_color(value: &str) -> Option<Color> {
    let s = value.trim();
    if let Some(hex) = s.strip_prefix('#') {
        if hex.len() == 6 {
            if let (Ok(r), Ok(g), Ok(b)) = (
                u8::from_str_radix(&hex[0..2], 16),
                u8::from_str_radix(&hex[2..4], 16),
                u8::from_str_radix(&hex[4..6], 16),
            ) {
                return Some(Color::Rgb(r, g, b));
            }
        }
        return None;
    }

    let name = s.to_ascii_lowercase();
    Some(match name.as_str() {
        "black" => Color::Black,
        "red" => Color::Red,
        "green" => Color::Green,
        "yellow" => Color::Yellow,
        "blue" => Color::Blue,
        "magenta" | "purple" => Color::Purple,
        "cyan" => Color::Cyan,
        "white" => Color::White,
        "gray" | "grey" | "darkgray" | "dark_gray" | "darkgrey" | "dark_grey" => Color::DarkGray,
        "lightred" | "light_red" => Color::LightRed,
        "lightgreen" | "light_green" => Color::LightGreen,
        "lightblue" | "light_blue" => Color::LightBlue,
        "lightcyan" | "light_cyan" => Color::LightCyan,
        "lightgray" | "light_gray" | "lightgrey" | "light_grey" => Color::LightGray,
        _ => return None,
    })
}
