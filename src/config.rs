use crate::cloak::{ColorRange, Compositor, DEFAULT_FRAMES_NEEDED};
use anyhow::{Context, Result};
use serde::Deserialize;
use std::path::Path;

/// Cloak settings as read from a TOML file.
///
/// ```toml
/// lower_bound = [90, 50, 50]
/// upper_bound = [130, 255, 255]
/// frames_needed = 40
/// ```
///
/// Missing keys fall back to the blue cloak and 40 priming frames.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct CloakConfig {
    /// Lower HSV bound, hue in [0, 180)
    pub lower_bound: [u8; 3],
    /// Upper HSV bound, hue in [0, 180)
    pub upper_bound: [u8; 3],
    pub frames_needed: usize,
}

impl Default for CloakConfig {
    fn default() -> Self {
        Self {
            lower_bound: ColorRange::BLUE.lower(),
            upper_bound: ColorRange::BLUE.upper(),
            frames_needed: DEFAULT_FRAMES_NEEDED,
        }
    }
}

impl CloakConfig {
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config at {}", path.display()))?;
        Self::from_toml(&contents)
            .with_context(|| format!("Failed to parse config at {}", path.display()))
    }

    pub fn from_toml(contents: &str) -> Result<Self> {
        Ok(toml::from_str(contents)?)
    }

    /// Apply command line overrides on top of the file values
    pub fn with_overrides(
        mut self,
        lower_bound: Option<[u8; 3]>,
        upper_bound: Option<[u8; 3]>,
        frames_needed: Option<usize>,
    ) -> Self {
        if let Some(lower) = lower_bound {
            self.lower_bound = lower;
        }
        if let Some(upper) = upper_bound {
            self.upper_bound = upper;
        }
        if let Some(frames) = frames_needed {
            self.frames_needed = frames;
        }
        self
    }

    pub fn color_range(&self) -> crate::error::Result<ColorRange> {
        ColorRange::new(self.lower_bound, self.upper_bound)
    }

    pub fn build_compositor(&self) -> crate::error::Result<Compositor> {
        Compositor::new(self.color_range()?, self.frames_needed)
    }
}

/// Parse an `H,S,V` triple from the command line
pub fn parse_hsv(value: &str) -> std::result::Result<[u8; 3], String> {
    let parts: Vec<&str> = value.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        return Err(format!("expected H,S,V but got '{}'", value));
    }

    let mut triple = [0u8; 3];
    for (slot, part) in triple.iter_mut().zip(&parts) {
        *slot = part
            .parse()
            .map_err(|e| format!("invalid channel '{}': {}", part, e))?;
    }
    Ok(triple)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cloak::Phase;
    use crate::error::CloakError;

    #[test]
    fn test_empty_file_uses_defaults() {
        let config = CloakConfig::from_toml("").unwrap();
        assert_eq!(config, CloakConfig::default());
        assert_eq!(config.color_range().unwrap(), ColorRange::BLUE);
        assert_eq!(config.frames_needed, 40);
    }

    #[test]
    fn test_full_file() {
        let config = CloakConfig::from_toml(
            "lower_bound = [35, 80, 40]\nupper_bound = [85, 255, 255]\nframes_needed = 12\n",
        )
        .unwrap();
        assert_eq!(config.lower_bound, [35, 80, 40]);
        assert_eq!(config.upper_bound, [85, 255, 255]);
        assert_eq!(config.frames_needed, 12);

        let compositor = config.build_compositor().unwrap();
        assert_eq!(compositor.frames_needed(), 12);
        assert_eq!(compositor.phase(), Phase::Learning);
    }

    #[test]
    fn test_rejects_unknown_keys_and_bad_values() {
        assert!(CloakConfig::from_toml("frames = 3").is_err());
        assert!(CloakConfig::from_toml("lower_bound = [90, 50, 300]").is_err());
        assert!(CloakConfig::from_toml("lower_bound = [90, 50]").is_err());
    }

    #[test]
    fn test_invalid_range_fails_at_construction() {
        let config = CloakConfig::from_toml("lower_bound = [140, 50, 50]").unwrap();
        assert!(matches!(
            config.build_compositor(),
            Err(CloakError::Configuration(_))
        ));

        let config = CloakConfig::from_toml("frames_needed = 0").unwrap();
        assert!(matches!(
            config.build_compositor(),
            Err(CloakError::Configuration(_))
        ));
    }

    #[test]
    fn test_overrides() {
        let config = CloakConfig::default().with_overrides(Some([0, 0, 0]), None, Some(5));
        assert_eq!(config.lower_bound, [0, 0, 0]);
        assert_eq!(config.upper_bound, [130, 255, 255]);
        assert_eq!(config.frames_needed, 5);
    }

    #[test]
    fn test_load_from_file() {
        let path = std::env::temp_dir().join(format!("cloak-config-{}.toml", std::process::id()));
        std::fs::write(&path, "frames_needed = 7\n").unwrap();

        let config = CloakConfig::load(&path).unwrap();
        std::fs::remove_file(&path).unwrap();

        assert_eq!(config.frames_needed, 7);
        assert!(CloakConfig::load(&path).is_err());
    }

    #[test]
    fn test_parse_hsv() {
        assert_eq!(parse_hsv("90,50,50"), Ok([90, 50, 50]));
        assert_eq!(parse_hsv(" 130, 255 ,255 "), Ok([130, 255, 255]));
        assert!(parse_hsv("90,50").is_err());
        assert!(parse_hsv("90,50,256").is_err());
        assert!(parse_hsv("a,b,c").is_err());
    }
}
