use std::ffi::OsString;
use std::path::{Path, PathBuf};

use thiserror::Error;

use crate::shared::constants::{
    MODELS_DIR_ENV, STAGE1_MODEL_NAME, STAGE2_MODEL_NAME, STAGE3_MODEL_NAME, TRACKING_MODEL_NAME,
};

#[derive(Error, Debug)]
pub enum ModelResolveError {
    #[error("could not determine cache directory")]
    NoCacheDir,
    #[error("models directory {0} does not exist")]
    MissingDir(PathBuf),
    #[error("model {name} not found in {dir}")]
    MissingModel { name: String, dir: PathBuf },
}

/// Locations of the four cascade networks.
#[derive(Debug, Clone, PartialEq)]
pub struct ModelPaths {
    pub stage1: PathBuf,
    pub stage2: PathBuf,
    pub stage3: PathBuf,
    pub tracking: PathBuf,
}

/// Resolve the directory holding the cascade models and check that every
/// model is present.
///
/// Resolution order:
/// 1. `explicit` (the `--models-dir` flag)
/// 2. the `EQUIRECT_BLUR_MODELS` environment variable
/// 3. the platform cache directory
pub fn resolve(explicit: Option<&Path>) -> Result<ModelPaths, ModelResolveError> {
    let dir = models_dir(explicit, std::env::var_os(MODELS_DIR_ENV))?;
    log::info!("using models from {}", dir.display());
    locate(&dir)
}

fn models_dir(explicit: Option<&Path>, env: Option<OsString>) -> Result<PathBuf, ModelResolveError> {
    if let Some(dir) = explicit {
        return Ok(dir.to_path_buf());
    }
    if let Some(dir) = env.filter(|v| !v.is_empty()) {
        return Ok(PathBuf::from(dir));
    }
    model_cache_dir()
}

/// Paths of all four models inside `dir`, failing on the first one missing.
pub fn locate(dir: &Path) -> Result<ModelPaths, ModelResolveError> {
    if !dir.is_dir() {
        return Err(ModelResolveError::MissingDir(dir.to_path_buf()));
    }
    let find = |name: &str| {
        let path = dir.join(name);
        if path.is_file() {
            Ok(path)
        } else {
            Err(ModelResolveError::MissingModel {
                name: name.to_string(),
                dir: dir.to_path_buf(),
            })
        }
    };
    Ok(ModelPaths {
        stage1: find(STAGE1_MODEL_NAME)?,
        stage2: find(STAGE2_MODEL_NAME)?,
        stage3: find(STAGE3_MODEL_NAME)?,
        tracking: find(TRACKING_MODEL_NAME)?,
    })
}

/// Platform-specific model cache directory.
///
/// - macOS: `~/Library/Application Support/EquirectBlur/models/`
/// - Linux: `$XDG_CACHE_HOME/EquirectBlur/models/` or `~/.cache/EquirectBlur/models/`
/// - Windows: `%LOCALAPPDATA%/EquirectBlur/models/`
pub fn model_cache_dir() -> Result<PathBuf, ModelResolveError> {
    #[cfg(target_os = "macos")]
    {
        dirs::data_dir()
            .map(|d| d.join("EquirectBlur").join("models"))
            .ok_or(ModelResolveError::NoCacheDir)
    }
    #[cfg(not(target_os = "macos"))]
    {
        dirs::cache_dir()
            .map(|d| d.join("EquirectBlur").join("models"))
            .ok_or(ModelResolveError::NoCacheDir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::shared::constants::MODEL_NAMES;
    use std::fs;
    use tempfile::TempDir;

    fn populated() -> TempDir {
        let tmp = TempDir::new().unwrap();
        for name in MODEL_NAMES {
            fs::write(tmp.path().join(name), b"onnx").unwrap();
        }
        tmp
    }

    #[test]
    fn test_explicit_dir_wins_over_env() {
        let dir = models_dir(Some(Path::new("/flag")), Some(OsString::from("/env"))).unwrap();
        assert_eq!(dir, PathBuf::from("/flag"));
    }

    #[test]
    fn test_env_used_without_flag() {
        let dir = models_dir(None, Some(OsString::from("/env"))).unwrap();
        assert_eq!(dir, PathBuf::from("/env"));
    }

    #[test]
    fn test_empty_env_falls_back_to_cache() {
        let dir = models_dir(None, Some(OsString::new())).unwrap();
        assert_eq!(dir, model_cache_dir().unwrap());
    }

    #[test]
    fn test_locate_finds_all_models() {
        let tmp = populated();
        let paths = locate(tmp.path()).unwrap();
        assert_eq!(paths.stage1, tmp.path().join("PCN-1.onnx"));
        assert_eq!(paths.tracking, tmp.path().join("PCN-Tracking.onnx"));
    }

    #[test]
    fn test_locate_reports_missing_model() {
        let tmp = populated();
        fs::remove_file(tmp.path().join("PCN-3.onnx")).unwrap();
        match locate(tmp.path()) {
            Err(ModelResolveError::MissingModel { name, .. }) => assert_eq!(name, "PCN-3.onnx"),
            other => panic!("expected missing model, got {other:?}"),
        }
    }

    #[test]
    fn test_locate_reports_missing_dir() {
        let tmp = TempDir::new().unwrap();
        let missing = tmp.path().join("nope");
        assert!(matches!(locate(&missing), Err(ModelResolveError::MissingDir(_))));
    }

    #[test]
    fn test_model_cache_dir_is_app_specific() {
        let path = model_cache_dir().unwrap();
        assert!(path.ends_with("EquirectBlur/models"));
    }
}
