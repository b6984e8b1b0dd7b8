//! Context configuration
//!
//! Stored as RON so it can be edited by hand next to the assets.

use std::fs;
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::rasterizer::{RenderState, Scissor};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ContextConfig {
    /// Initial render state
    pub state: RenderState,
    /// Upper bound on live textures
    pub max_textures: usize,
    /// Fail instead of falling back to software emulation
    pub require_hardware: bool,
    /// Initial clip rectangle; `None` clips to the draw region
    pub scissor: Option<Scissor>,
}

impl Default for ContextConfig {
    fn default() -> Self {
        Self {
            state: RenderState::default(),
            max_textures: 64,
            require_hardware: false,
            scissor: None,
        }
    }
}

impl ContextConfig {
    pub fn from_ron_str(s: &str) -> Result<Self> {
        Ok(ron::from_str(s)?)
    }

    /// Load from a RON file
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let contents = fs::read_to_string(path)?;
        Self::from_ron_str(&contents)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::RasterError;
    use crate::rasterizer::ShadingMode;

    #[test]
    fn test_empty_config_uses_defaults() {
        assert_eq!(ContextConfig::from_ron_str("()").unwrap(), ContextConfig::default());
    }

    #[test]
    fn test_partial_config() {
        let config = ContextConfig::from_ron_str(
            "(
                max_textures: 8,
                require_hardware: true,
                state: (shading: Smooth, zbuffer: false),
                scissor: Some((left: 4, top: 4, width: 32, height: 16)),
            )",
        )
        .unwrap();
        assert_eq!(config.max_textures, 8);
        assert!(config.require_hardware);
        assert_eq!(config.state.shading, ShadingMode::Smooth);
        assert!(!config.state.zbuffer);
        // Unset state fields keep their defaults
        assert!(config.state.texturing);
        assert_eq!(config.scissor.map(|s| s.right()), Some(36));
    }

    #[test]
    fn test_bad_config_is_reported() {
        assert!(matches!(
            ContextConfig::from_ron_str("(max_textures: \"many\")"),
            Err(RasterError::Config(_))
        ));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("context.ron");
        std::fs::write(&path, "(max_textures: 3)").unwrap();
        assert_eq!(ContextConfig::load(&path).unwrap().max_textures, 3);

        assert!(matches!(
            ContextConfig::load(dir.path().join("missing.ron")),
            Err(RasterError::FileRead(_))
        ));
    }
}
