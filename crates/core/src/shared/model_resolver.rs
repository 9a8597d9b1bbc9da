use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use thiserror::Error;

#[derive(Error, Debug)]
pub enum ModelResolveError {
    #[error("failed to create cache directory: {0}")]
    CacheDir(#[source] std::io::Error),
    #[error("download failed for {url}: {source}")]
    Download {
        url: String,
        #[source]
        source: reqwest::Error,
    },
    #[error("failed to write model to {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("could not determine cache directory")]
    NoCacheDir,
}

/// Progress callback: `(bytes_downloaded, total_bytes)`.
/// `total_bytes` is 0 if the server didn't provide Content-Length.
pub type ProgressFn = Box<dyn Fn(u64, u64) + Send>;

/// Finds a model asset on disk without touching the network.
///
/// Lookup order:
/// 1. `explicit` path, if given (returned only when it exists)
/// 2. `cache_dir/name`
/// 3. `bundled_dir/name`
/// 4. `name` relative to the working directory
pub fn locate(
    name: &str,
    explicit: Option<&Path>,
    cache_dir: Option<&Path>,
    bundled_dir: Option<&Path>,
) -> Option<PathBuf> {
    if let Some(path) = explicit {
        return path.exists().then(|| path.to_path_buf());
    }

    [cache_dir, bundled_dir]
        .into_iter()
        .flatten()
        .map(|dir| dir.join(name))
        .chain(std::iter::once(PathBuf::from(name)))
        .find(|candidate| candidate.exists())
}

/// Resolve a model file by name, checking local locations before downloading.
///
/// Resolution order:
/// 1. Anything [`locate`] finds (explicit path, user cache, bundled dir, cwd)
/// 2. Download from URL into the user cache
pub fn resolve(
    name: &str,
    url: &str,
    explicit: Option<&Path>,
    bundled_dir: Option<&Path>,
    progress: Option<ProgressFn>,
) -> Result<PathBuf, ModelResolveError> {
    let cache_dir = model_cache_dir()?;
    resolve_in(&cache_dir, name, url, explicit, bundled_dir, progress)
}

fn resolve_in(
    cache_dir: &Path,
    name: &str,
    url: &str,
    explicit: Option<&Path>,
    bundled_dir: Option<&Path>,
    progress: Option<ProgressFn>,
) -> Result<PathBuf, ModelResolveError> {
    if let Some(found) = locate(name, explicit, Some(cache_dir), bundled_dir) {
        return Ok(found);
    }

    fs::create_dir_all(cache_dir).map_err(ModelResolveError::CacheDir)?;
    let cached_path = cache_dir.join(name);
    download(url, &cached_path, progress)?;
    Ok(cached_path)
}

/// Platform-specific model cache directory.
///
/// - macOS: `~/Library/Application Support/Emotion Stream/models/`
/// - Linux: `$XDG_CACHE_HOME/Emotion Stream/models/` or `~/.cache/Emotion Stream/models/`
/// - Windows: `%LOCALAPPDATA%/Emotion Stream/models/`
pub fn model_cache_dir() -> Result<PathBuf, ModelResolveError> {
    #[cfg(target_os = "macos")]
    {
        dirs::data_dir()
            .map(|d| d.join("Emotion Stream").join("models"))
            .ok_or(ModelResolveError::NoCacheDir)
    }
    #[cfg(not(target_os = "macos"))]
    {
        dirs::cache_dir()
            .map(|d| d.join("Emotion Stream").join("models"))
            .ok_or(ModelResolveError::NoCacheDir)
    }
}

fn download(url: &str, dest: &Path, progress: Option<ProgressFn>) -> Result<(), ModelResolveError> {
    let to_download_error = |e| ModelResolveError::Download {
        url: url.to_string(),
        source: e,
    };
    let response = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(to_download_error)?;

    let total = response.content_length().unwrap_or(0);
    let bytes = response.bytes().map_err(to_download_error)?;

    // Write to a temp file first, then rename for atomicity
    let temp_path = dest.with_extension("part");
    let write_error = |e| ModelResolveError::Write {
        path: temp_path.clone(),
        source: e,
    };
    let mut file = fs::File::create(&temp_path).map_err(write_error)?;

    let mut downloaded: u64 = 0;
    for chunk in bytes.chunks(1024 * 1024) {
        file.write_all(chunk).map_err(write_error)?;
        downloaded += chunk.len() as u64;
        if let Some(ref cb) = progress {
            cb(downloaded, total);
        }
    }
    file.flush().map_err(write_error)?;
    drop(file);

    fs::rename(&temp_path, dest).map_err(|e| ModelResolveError::Write {
        path: dest.to_path_buf(),
        source: e,
    })?;

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_locate_prefers_explicit_path() {
        let tmp = TempDir::new().unwrap();
        let explicit = tmp.path().join("custom.xml");
        fs::write(&explicit, b"x").unwrap();
        fs::write(tmp.path().join("model.xml"), b"y").unwrap();

        let found = locate("model.xml", Some(&explicit), Some(tmp.path()), None);
        assert_eq!(found, Some(explicit));
    }

    #[test]
    fn test_locate_missing_explicit_path_is_none() {
        let tmp = TempDir::new().unwrap();
        fs::write(tmp.path().join("model.xml"), b"y").unwrap();

        let found = locate(
            "model.xml",
            Some(&tmp.path().join("absent.xml")),
            Some(tmp.path()),
            None,
        );
        assert!(found.is_none());
    }

    #[test]
    fn test_locate_checks_cache_before_bundled() {
        let cache = TempDir::new().unwrap();
        let bundled = TempDir::new().unwrap();
        fs::write(cache.path().join("m.onnx"), b"cache").unwrap();
        fs::write(bundled.path().join("m.onnx"), b"bundled").unwrap();

        let found = locate("m.onnx", None, Some(cache.path()), Some(bundled.path())).unwrap();
        assert_eq!(found, cache.path().join("m.onnx"));
    }

    #[test]
    fn test_locate_falls_back_to_bundled() {
        let cache = TempDir::new().unwrap();
        let bundled = TempDir::new().unwrap();
        fs::write(bundled.path().join("m.onnx"), b"bundled").unwrap();

        let found = locate("m.onnx", None, Some(cache.path()), Some(bundled.path())).unwrap();
        assert_eq!(found, bundled.path().join("m.onnx"));
    }

    #[test]
    fn test_locate_nothing_found() {
        let cache = TempDir::new().unwrap();
        assert!(locate("definitely-not-here-4821.onnx", None, Some(cache.path()), None).is_none());
    }

    #[test]
    fn test_resolve_in_uses_local_copy_without_network() {
        let cache = TempDir::new().unwrap();
        fs::write(cache.path().join("m.onnx"), b"cached").unwrap();

        let path = resolve_in(
            cache.path(),
            "m.onnx",
            "http://invalid.nonexistent.example.com/m.onnx",
            None,
            None,
            None,
        )
        .unwrap();
        assert_eq!(fs::read(path).unwrap(), b"cached");
    }

    #[test]
    fn test_model_cache_dir_returns_path() {
        let path = model_cache_dir().unwrap();
        assert!(path.to_string_lossy().contains("Emotion Stream"));
        assert!(path.to_string_lossy().contains("models"));
    }

    #[test]
    fn test_download_invalid_url_leaves_no_partial_file() {
        let tmp = TempDir::new().unwrap();
        let dest = tmp.path().join("model.onnx");
        let result = download("http://invalid.nonexistent.example.com/model", &dest, None);
        assert!(result.is_err());
        assert!(!dest.exists());
        assert!(!dest.with_extension("part").exists());
    }
}
