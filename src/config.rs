use log::debug;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::Path;

use crate::error::{Id3TsError, Result};
use crate::segment::{SegmentOptions, DEFAULT_ID3_PID, DEFAULT_ID3_PTS, DEFAULT_PMT_PID};

/// Config files looked up, in order, when no path is given
pub const DEFAULT_CONFIG_PATHS: [&str; 1] = ["./id3ts.toml"];

const ENV_PMT_PID: &str = "ID3TS_PMT_PID";
const ENV_ID3_PID: &str = "ID3TS_ID3_PID";
const ENV_ID3_PTS: &str = "ID3TS_ID3_PTS";
const ENV_VIDEO_PID: &str = "ID3TS_VIDEO_PID";
const ENV_AUDIO_PID: &str = "ID3TS_AUDIO_PID";
const ENV_DESCRIPTION: &str = "ID3TS_DESCRIPTION";

/// Segment settings that do not change from one tag to the next.
///
/// Layered from defaults, then a TOML file, then `ID3TS_*` environment
/// variables. Command line flags are applied on top by the binary.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct Config {
    pub pmt_pid: u16,
    pub id3_pid: u16,
    pub id3_pts: u64,
    pub video_pid: Option<u16>,
    pub audio_pid: Option<u16>,
    pub description: String,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            pmt_pid: DEFAULT_PMT_PID,
            id3_pid: DEFAULT_ID3_PID,
            id3_pts: DEFAULT_ID3_PTS,
            video_pid: None,
            audio_pid: None,
            description: String::new(),
        }
    }
}

impl Config {
    /// Parses a TOML document; missing keys keep their defaults.
    pub fn from_toml_str(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_toml_str(&contents)
    }

    /// Loads the full configuration stack.
    ///
    /// An explicit `path` must exist. Without one, the first of
    /// [`DEFAULT_CONFIG_PATHS`] that exists is used, if any.
    pub fn load(path: Option<&Path>) -> Result<Self> {
        let mut config = match path {
            Some(path) => {
                debug!("loading config from {}", path.display());
                Self::from_file(path)?
            }
            None => match DEFAULT_CONFIG_PATHS.iter().map(Path::new).find(|p| p.exists()) {
                Some(path) => {
                    debug!("loading config from {}", path.display());
                    Self::from_file(path)?
                }
                None => {
                    debug!("no config file found, using defaults");
                    Self::default()
                }
            },
        };
        config.apply_env(|key| env::var(key).ok())?;
        Ok(config)
    }

    /// Overrides fields from `ID3TS_*` variables as returned by `lookup`.
    pub fn apply_env<F>(&mut self, lookup: F) -> Result<()>
    where
        F: Fn(&str) -> Option<String>,
    {
        if let Some(value) = lookup(ENV_PMT_PID) {
            self.pmt_pid = parse_pid(&value)?;
        }
        if let Some(value) = lookup(ENV_ID3_PID) {
            self.id3_pid = parse_pid(&value)?;
        }
        if let Some(value) = lookup(ENV_ID3_PTS) {
            self.id3_pts = parse_int(&value)?;
        }
        if let Some(value) = lookup(ENV_VIDEO_PID) {
            self.video_pid = Some(parse_pid(&value)?);
        }
        if let Some(value) = lookup(ENV_AUDIO_PID) {
            self.audio_pid = Some(parse_pid(&value)?);
        }
        if let Some(value) = lookup(ENV_DESCRIPTION) {
            self.description = value;
        }
        Ok(())
    }

    /// Segment options carrying `data` with these settings.
    pub fn into_options(self, data: impl Into<Vec<u8>>) -> SegmentOptions {
        SegmentOptions::new(data)
            .with_pmt_pid(self.pmt_pid)
            .with_id3_pid(self.id3_pid)
            .with_video_pid(self.video_pid)
            .with_audio_pid(self.audio_pid)
            .with_id3_pts(self.id3_pts)
            .with_description(self.description)
    }
}

/// Parses a decimal or `0x`-prefixed hexadecimal integer.
pub fn parse_int(s: &str) -> Result<u64> {
    let s = s.trim();
    let value = match s.strip_prefix("0x").or_else(|| s.strip_prefix("0X")) {
        Some(hex) => u64::from_str_radix(hex, 16)?,
        None => s.parse()?,
    };
    Ok(value)
}

/// Like [`parse_int`] but bounded to 16 bits. Range checking against the
/// valid PID space happens when the segment is built.
pub fn parse_pid(s: &str) -> Result<u16> {
    let value = parse_int(s)?;
    u16::try_from(value).map_err(|_| Id3TsError::Config(format!("{} is not a valid PID", s.trim())))
}

/// Creates a default config template file if it doesn't exist
pub fn create_default_config_template<P: AsRef<Path>>(path: P) -> std::io::Result<()> {
    if !path.as_ref().exists() {
        let template = r#"# id3ts configuration
# Every key is optional. Environment variables (ID3TS_PMT_PID, ...) and
# command line flags take precedence over this file.

pmt_pid = 0x100
id3_pid = 0x103
id3_pts = 282743
# video_pid = 0x101
# audio_pid = 0x102
description = ""
"#;
        fs::write(path, template)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;

    fn env_of(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = Config::default();
        assert_eq!(config.pmt_pid, 0x100);
        assert_eq!(config.id3_pid, 0x103);
        assert_eq!(config.id3_pts, 282743);
        assert_eq!(config.video_pid, None);
    }

    #[test]
    fn test_toml_overrides_defaults() {
        let config = Config::from_toml_str("id3_pid = 0x180\nvideo_pid = 257\n").unwrap();
        assert_eq!(config.pmt_pid, 0x100);
        assert_eq!(config.id3_pid, 0x180);
        assert_eq!(config.video_pid, Some(257));
    }

    #[test]
    fn test_unknown_key_rejected() {
        let err = Config::from_toml_str("pmtPid = 1\n").unwrap_err();
        assert!(matches!(err, Id3TsError::Toml(_)));
    }

    #[test]
    fn test_env_overrides() {
        let mut config = Config::default();
        config
            .apply_env(env_of(&[
                ("ID3TS_PMT_PID", "0x101"),
                ("ID3TS_ID3_PTS", "1234567890"),
                ("ID3TS_AUDIO_PID", "0X1FF"),
                ("ID3TS_DESCRIPTION", "chapter"),
            ]))
            .unwrap();
        assert_eq!(config.pmt_pid, 0x101);
        assert_eq!(config.id3_pid, 0x103);
        assert_eq!(config.id3_pts, 1234567890);
        assert_eq!(config.audio_pid, Some(0x1ff));
        assert_eq!(config.description, "chapter");
    }

    #[test]
    fn test_env_rejects_garbage() {
        let mut config = Config::default();
        let err = config.apply_env(env_of(&[("ID3TS_ID3_PID", "abc")])).unwrap_err();
        assert!(matches!(err, Id3TsError::ParseInt(_)));

        let err = config.apply_env(env_of(&[("ID3TS_ID3_PID", "70000")])).unwrap_err();
        assert!(matches!(err, Id3TsError::Config(_)));
    }

    #[test]
    fn test_parse_int() {
        assert_eq!(parse_int("256").unwrap(), 256);
        assert_eq!(parse_int(" 0x100 ").unwrap(), 256);
        assert!(parse_int("0x").is_err());
        assert!(parse_int("-1").is_err());
    }

    #[test]
    fn test_config_file_and_template() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("id3ts.toml");

        create_default_config_template(&path).unwrap();
        assert_eq!(Config::from_file(&path).unwrap(), Config::default());

        // An existing file is left alone
        fs::write(&path, "id3_pts = 90000\n").unwrap();
        create_default_config_template(&path).unwrap();
        let config = Config::load(Some(path.as_path())).unwrap();
        assert_eq!(config.id3_pts, 90000);
    }

    #[test]
    fn test_missing_explicit_file() {
        let dir = tempfile::tempdir().unwrap();
        let err = Config::load(Some(dir.path().join("nope.toml").as_path())).unwrap_err();
        assert!(matches!(err, Id3TsError::Io(_)));
    }

    #[test]
    fn test_into_options() {
        let config = Config {
            video_pid: Some(0x101),
            description: "key".to_string(),
            ..Config::default()
        };
        let options = config.into_options("value");
        assert_eq!(options.pmt_pid, 0x100);
        assert_eq!(options.video_pid, Some(0x101));
        assert_eq!(options.description, b"key".to_vec());
        assert_eq!(options.data, b"value".to_vec());
    }
}
