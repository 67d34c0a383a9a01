//! Persistent application settings — a small `key=value` file in the OS
//! config directory.  Only preferences live here; edit state never does.

use std::path::PathBuf;

pub struct AppSettings {
    /// Credential handed to whichever generative backend the embedder wires
    /// up.  The editing core itself never reads it.
    pub api_key: String,
    /// Font family used for new text layers.
    pub default_font_family: String,
    /// Seconds before a user-visible notice auto-dismisses.
    pub notice_duration_secs: u64,
    /// JPEG quality (1-100) for lossy saves in headless mode.
    pub jpeg_quality: u8,
}

impl Default for AppSettings {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            default_font_family: "Arial".to_string(),
            notice_duration_secs: 6,
            jpeg_quality: 90,
        }
    }
}

impl AppSettings {
    /// Path to the settings file.
    /// On Linux:   ~/.config/retouchfe/retouchfe_settings.cfg  (XDG_CONFIG_HOME respected)
    /// On Windows: %APPDATA%\RetouchFE\retouchfe_settings.cfg
    /// On macOS:   ~/Library/Application Support/RetouchFE/retouchfe_settings.cfg
    /// Fallback:   same directory as the executable.
    pub(crate) fn settings_path() -> Option<PathBuf> {
        #[cfg(target_os = "linux")]
        {
            let config_dir = std::env::var("XDG_CONFIG_HOME")
                .map(PathBuf::from)
                .unwrap_or_else(|_| {
                    let home = std::env::var("HOME").unwrap_or_else(|_| "~".to_string());
                    PathBuf::from(home).join(".config")
                })
                .join("retouchfe");
            let _ = std::fs::create_dir_all(&config_dir);
            return Some(config_dir.join("retouchfe_settings.cfg"));
        }
        #[cfg(target_os = "windows")]
        {
            // Use %APPDATA% so the settings live in the user profile and stay
            // isolated from other users.
            let appdata = std::env::var("APPDATA")
                .or_else(|_| std::env::var("USERPROFILE"))
                .unwrap_or_else(|_| {
                    std::env::current_exe()
                        .ok()
                        .and_then(|p| p.parent().map(|d| d.to_string_lossy().into_owned()))
                        .unwrap_or_default()
                });
            let config_dir = PathBuf::from(appdata).join("RetouchFE");
            let _ = std::fs::create_dir_all(&config_dir);
            return Some(config_dir.join("retouchfe_settings.cfg"));
        }
        #[cfg(target_os = "macos")]
        {
            let home = std::env::var("HOME").unwrap_or_else(|_| "~".to_string());
            let config_dir = PathBuf::from(home)
                .join("Library")
                .join("Application Support")
                .join("RetouchFE");
            let _ = std::fs::create_dir_all(&config_dir);
            return Some(config_dir.join("retouchfe_settings.cfg"));
        }
        #[cfg(not(any(target_os = "linux", target_os = "windows", target_os = "macos")))]
        {
            std::env::current_exe()
                .ok()
                .and_then(|p| p.parent().map(|d| d.join("retouchfe_settings.cfg")))
        }
    }

    /// Save settings to disk
    pub fn save(&self) {
        let Some(path) = Self::settings_path() else { return };
        let content = format!(
            "api_key={}\n\
             default_font_family={}\n\
             notice_duration_secs={}\n\
             jpeg_quality={}\n",
            self.api_key, self.default_font_family, self.notice_duration_secs, self.jpeg_quality,
        );
        let _ = std::fs::write(path, content);
    }

    /// Load settings from disk (returns default if file missing or corrupt)
    pub fn load() -> Self {
        let Some(path) = Self::settings_path() else { return Self::default() };
        let Ok(content) = std::fs::read_to_string(&path) else { return Self::default() };

        let mut s = Self::default();
        for line in content.lines() {
            let Some((key, val)) = line.split_once('=') else { continue };
            s.apply_line(key.trim(), val.trim());
        }
        s
    }

    /// Apply one parsed `key=value` line.  Unknown keys are ignored so old
    /// installs can read files written by newer versions.
    fn apply_line(&mut self, key: &str, val: &str) {
        match key {
            "api_key" => self.api_key = val.to_string(),
            "default_font_family" => {
                if !val.is_empty() {
                    self.default_font_family = val.to_string();
                }
            }
            "notice_duration_secs" => {
                self.notice_duration_secs = val.parse().unwrap_or(self.notice_duration_secs);
            }
            "jpeg_quality" => {
                if let Ok(q) = val.parse::<u8>() {
                    self.jpeg_quality = q.clamp(1, 100);
                }
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_apply_line_known_keys() {
        let mut s = AppSettings::default();
        s.apply_line("default_font_family", "Georgia");
        s.apply_line("notice_duration_secs", "9");
        s.apply_line("jpeg_quality", "75");
        assert_eq!(s.default_font_family, "Georgia");
        assert_eq!(s.notice_duration_secs, 9);
        assert_eq!(s.jpeg_quality, 75);
    }

    #[test]
    fn test_apply_line_ignores_unknown_and_bad_values() {
        let mut s = AppSettings::default();
        s.apply_line("no_such_key", "whatever");
        s.apply_line("notice_duration_secs", "not-a-number");
        s.apply_line("jpeg_quality", "400");
        assert_eq!(s.notice_duration_secs, 6);
        assert_eq!(s.jpeg_quality, 90);
    }

    #[test]
    fn test_empty_font_family_keeps_default() {
        let mut s = AppSettings::default();
        s.apply_line("default_font_family", "");
        assert_eq!(s.default_font_family, "Arial");
    }
}
