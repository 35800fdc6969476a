//! Thumbnail cache engine.
//!
//! Given a source image path, a requested size, a quality and a crop mode,
//! [`ThumbnailCache::get_or_create`] returns the path of a thumbnail that is
//! at least as new as its source, deriving it first if needed.
//! [`ThumbnailCache::invalidate`] throws cached thumbnails away.
//!
//! # Design
//!
//! ## Layout
//!
//! There is no manifest. The path *is* the cache key, and thumbnails live in
//! a directory per requested size, next to their source:
//!
//! ```text
//! <root>/photos/dawn.jpg              ← source
//! <root>/photos/150x75/dawn.jpg       ← thumbnail requested at 150x75
//! <root>/photos/200x0/dawn.jpg        ← height derived from aspect ratio
//! ```
//!
//! The bucket is named after the *requested* size, not the size the image
//! ends up with after contain fitting or upscale clamping.
//!
//! ## Freshness
//!
//! A thumbnail is fresh iff it exists and its mtime, truncated to whole
//! seconds, is strictly greater than the source's. Equal seconds count as
//! stale. A fresh hit costs two `stat` calls and no pixel I/O.
//!
//! ## Skips versus errors
//!
//! A missing source or an extension other than jpg/jpeg/png/gif is a
//! [`Lookup::Skipped`], not an error: callers render nothing and move on.
//! Codec failures and directory creation failures are [`CacheError`]s.
//!
//! ## Concurrency
//!
//! The engine keeps no state between calls. Two calls racing on the same
//! source and size both derive the thumbnail and the last rename wins; each
//! publish is atomic, so readers see either version but never a torn file.

use crate::config::EngineConfig;
use crate::imaging::{
    BackendError, CropMode, ImageBackend, Quality, RustBackend, Size, SourceFormat,
    ThumbnailConfig, create_thumbnail,
};
use crate::storage::{FsStorage, Storage};
use std::fmt;
use std::io;
use std::path::{Path, PathBuf};
use std::time::{SystemTime, UNIX_EPOCH};
use thiserror::Error;
use tracing::{debug, warn};

#[derive(Error, Debug)]
pub enum CacheError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),
    #[error("Image processing failed: {0}")]
    Imaging(#[from] BackendError),
}

/// Caller intent for one thumbnail.
#[derive(Debug, Clone, PartialEq)]
pub struct ThumbnailRequest {
    /// Source path relative to the root. A leading separator is ignored.
    pub source: String,
    pub size: Size,
    pub quality: Quality,
    pub crop: CropMode,
    /// Overrides the configured root for this request.
    pub root: Option<PathBuf>,
}

impl ThumbnailRequest {
    /// A request with the stock defaults: 75x75, quality 85, no crop.
    pub fn new(source: impl Into<String>) -> Self {
        let defaults = ThumbnailConfig::default();
        Self {
            source: source.into(),
            size: defaults.size,
            quality: defaults.quality,
            crop: defaults.crop,
            root: None,
        }
    }

    pub fn with_size(mut self, width: u32, height: u32) -> Self {
        self.size = Size::new(width, height);
        self
    }

    /// Accepts any number; see [`Quality::new`] for the clamping rule.
    pub fn with_quality(mut self, quality: f64) -> Self {
        self.quality = Quality::new(quality);
        self
    }

    pub fn with_crop(mut self, crop: CropMode) -> Self {
        self.crop = crop;
        self
    }

    pub fn with_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.root = Some(root.into());
        self
    }

    fn thumbnail_config(&self) -> ThumbnailConfig {
        ThumbnailConfig {
            size: self.size,
            crop: self.crop,
            quality: self.quality,
        }
    }
}

/// Whether a thumbnail came from disk or was just derived.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Outcome {
    Cached,
    Generated,
}

/// A thumbnail on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Thumbnail {
    /// Path relative to the root, `/`-separated, e.g. `photos/150x75/dawn.jpg`.
    pub path: String,
    /// Absolute (root-joined) filesystem path.
    pub file: PathBuf,
    pub outcome: Outcome,
}

/// Why no thumbnail was produced.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SkipReason {
    SourceNotFound(PathBuf),
    UnsupportedFormat(PathBuf),
}

impl fmt::Display for SkipReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::SourceNotFound(p) => write!(f, "source not found: {}", p.display()),
            Self::UnsupportedFormat(p) => write!(f, "unsupported format: {}", p.display()),
        }
    }
}

/// Result of [`ThumbnailCache::get_or_create`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Lookup {
    Ready(Thumbnail),
    Skipped(SkipReason),
}

impl Lookup {
    /// The root-relative thumbnail path, if there is one.
    pub fn path(&self) -> Option<&str> {
        match self {
            Self::Ready(thumb) => Some(&thumb.path),
            Self::Skipped(_) => None,
        }
    }

    pub fn thumbnail(&self) -> Option<&Thumbnail> {
        match self {
            Self::Ready(thumb) => Some(thumb),
            Self::Skipped(_) => None,
        }
    }
}

/// Where a source and its thumbnail at one size live.
#[derive(Debug, Clone, PartialEq, Eq)]
struct CacheLocation {
    source: PathBuf,
    bucket: PathBuf,
    file: PathBuf,
    web_path: String,
}

/// Resolve `source` under `root` and derive its cache location at `size`.
///
/// Leading separators are stripped and `.` segments dropped. Returns `None`
/// for paths with no file name or with `..` segments, which could otherwise
/// reach outside the root.
fn locate(root: &Path, source: &str, size: Size) -> Option<CacheLocation> {
    let mut segments = Vec::new();
    for segment in source.split(['/', '\\']) {
        match segment {
            "" | "." => {}
            ".." => return None,
            s => segments.push(s),
        }
    }
    let (name, dirs) = segments.split_last()?;

    let source_dir = dirs.iter().fold(root.to_path_buf(), |p, d| p.join(d));
    let bucket_name = size.bucket_name();
    let bucket = source_dir.join(&bucket_name);

    let mut web = dirs.to_vec();
    web.push(&bucket_name);
    web.push(name);

    Some(CacheLocation {
        source: source_dir.join(name),
        file: bucket.join(name),
        bucket,
        web_path: web.join("/"),
    })
}

/// Seconds since the epoch, floored. Pre-epoch times go negative.
fn whole_seconds(time: SystemTime) -> i64 {
    match time.duration_since(UNIX_EPOCH) {
        Ok(d) => d.as_secs() as i64,
        Err(e) => {
            let d = e.duration();
            let partial = u64::from(d.subsec_nanos() > 0);
            -((d.as_secs() + partial) as i64)
        }
    }
}

/// Whether a cached thumbnail modified at `cached` may be served for a
/// source modified at `source`.
pub fn is_fresh(cached: SystemTime, source: SystemTime) -> bool {
    whole_seconds(cached) > whole_seconds(source)
}

/// The thumbnail cache engine.
///
/// Build one per application and share it; it holds only configuration and
/// its two collaborators.
pub struct ThumbnailCache<B = RustBackend, S = FsStorage> {
    config: EngineConfig,
    backend: B,
    storage: S,
}

impl ThumbnailCache {
    /// Engine on the real filesystem with the `image`-crate backend.
    pub fn new(config: EngineConfig) -> Self {
        Self::with_parts(config, RustBackend::new(), FsStorage)
    }
}

impl<B: ImageBackend, S: Storage> ThumbnailCache<B, S> {
    pub fn with_parts(config: EngineConfig, backend: B, storage: S) -> Self {
        Self {
            config,
            backend,
            storage,
        }
    }

    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// A request for `source` pre-filled with the configured defaults.
    pub fn request(&self, source: impl Into<String>) -> ThumbnailRequest {
        ThumbnailRequest {
            size: self.config.defaults.size(),
            quality: self.config.defaults.quality(),
            ..ThumbnailRequest::new(source)
        }
    }

    /// Return a fresh thumbnail for `request`, deriving it if the cached one
    /// is missing or stale.
    pub fn get_or_create(&self, request: &ThumbnailRequest) -> Result<Lookup, CacheError> {
        let root = request.root.as_deref().unwrap_or(self.config.root());

        let Some(location) = locate(root, &request.source, request.size) else {
            debug!(source = %request.source, "source path does not name a file under the root");
            return Ok(Lookup::Skipped(SkipReason::SourceNotFound(
                root.join(request.source.trim_start_matches(['/', '\\'])),
            )));
        };

        if !self.storage.exists(&location.source) {
            debug!(source = %location.source.display(), "source not found, skipping");
            return Ok(Lookup::Skipped(SkipReason::SourceNotFound(location.source)));
        }

        let Some(format) = SourceFormat::from_path(&location.source) else {
            debug!(source = %location.source.display(), "unsupported format, skipping");
            return Ok(Lookup::Skipped(SkipReason::UnsupportedFormat(location.source)));
        };

        self.storage.ensure_dir(&location.bucket)?;

        if self.is_fresh_entry(&location)? {
            debug!(thumbnail = %location.web_path, "cache hit");
            return Ok(Lookup::Ready(Thumbnail {
                path: location.web_path,
                file: location.file,
                outcome: Outcome::Cached,
            }));
        }

        debug!(
            thumbnail = %location.web_path,
            size = %request.size,
            quality = request.quality.value(),
            crop = ?request.crop,
            "deriving thumbnail"
        );
        let params = create_thumbnail(
            &self.backend,
            &location.source,
            &location.file,
            format,
            &request.thumbnail_config(),
        )?;
        debug!(
            thumbnail = %location.web_path,
            width = params.output_size.width,
            height = params.output_size.height,
            "thumbnail written"
        );

        Ok(Lookup::Ready(Thumbnail {
            path: location.web_path,
            file: location.file,
            outcome: Outcome::Generated,
        }))
    }

    /// Only stat-level checks; no pixels are read.
    fn is_fresh_entry(&self, location: &CacheLocation) -> Result<bool, CacheError> {
        if !self.storage.exists(&location.file) {
            return Ok(false);
        }
        // Vanished between the two calls: treat as stale and rebuild.
        let Ok(cached) = self.storage.last_modified(&location.file) else {
            return Ok(false);
        };
        let source = self.storage.last_modified(&location.source)?;
        Ok(is_fresh(cached, source))
    }

    /// Delete the cached thumbnail of `source` at `size` under the
    /// configured root; with `purge_all`, delete the whole size bucket.
    ///
    /// Best effort: failures are logged, never returned.
    pub fn invalidate(&self, source: &str, size: Size, purge_all: bool) {
        self.invalidate_under(self.config.root(), source, size, purge_all);
    }

    /// [`invalidate`](Self::invalidate) against an explicit root.
    pub fn invalidate_under(&self, root: &Path, source: &str, size: Size, purge_all: bool) {
        let Some(location) = locate(root, source, size) else {
            debug!(source, "nothing to invalidate");
            return;
        };

        match self.storage.delete(&location.file) {
            Ok(true) => debug!(thumbnail = %location.web_path, "thumbnail deleted"),
            Ok(false) => {}
            Err(e) => warn!(thumbnail = %location.file.display(), error = %e, "failed to delete thumbnail"),
        }

        if purge_all {
            match self.storage.delete_recursive(&location.bucket) {
                Ok(true) => debug!(bucket = %location.bucket.display(), "size bucket purged"),
                Ok(false) => {}
                Err(e) => warn!(bucket = %location.bucket.display(), error = %e, "failed to purge size bucket"),
            }
        }
    }
}

/// Tally of lookups, kept by the caller across a batch.
#[derive(Debug, Default)]
pub struct CacheStats {
    pub cached: u32,
    pub generated: u32,
    pub skipped: u32,
}

impl CacheStats {
    pub fn record(&mut self, lookup: &Lookup) {
        match lookup {
            Lookup::Ready(Thumbnail {
                outcome: Outcome::Cached,
                ..
            }) => self.cached += 1,
            Lookup::Ready(Thumbnail {
                outcome: Outcome::Generated,
                ..
            }) => self.generated += 1,
            Lookup::Skipped(_) => self.skipped += 1,
        }
    }

    pub fn total(&self) -> u32 {
        self.cached + self.generated + self.skipped
    }
}

impl fmt::Display for CacheStats {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.cached == 0 && self.skipped == 0 {
            return write!(f, "{} generated", self.generated);
        }
        write!(f, "{} cached, {} generated", self.cached, self.generated)?;
        if self.skipped > 0 {
            write!(f, ", {} skipped", self.skipped)?;
        }
        write!(f, " ({} total)", self.total())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::imaging::backend::tests::{MockBackend, RecordedOp};
    use crate::imaging::{CropRect, OutputSize, SampleRect};
    use crate::test_helpers::*;
    use std::fs;
    use std::time::Duration;
    use tempfile::TempDir;

    fn mock_cache(root: &Path, width: u32, height: u32) -> ThumbnailCache<MockBackend> {
        ThumbnailCache::with_parts(
            EngineConfig::with_root(root),
            MockBackend::with_dimensions(width, height),
            FsStorage,
        )
    }

    /// A source file the mock backend pretends is `width`x`height`.
    fn fake_source(root: &Path, rel: &str) -> PathBuf {
        let path = root.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(&path, b"source").unwrap();
        backdate(&path, 60);
        path
    }

    fn ready(lookup: Lookup) -> Thumbnail {
        match lookup {
            Lookup::Ready(thumb) => thumb,
            Lookup::Skipped(reason) => panic!("expected a thumbnail, got skip: {reason}"),
        }
    }

    // =========================================================================
    // Path scheme
    // =========================================================================

    #[test]
    fn locate_builds_bucket_next_to_source() {
        let loc = locate(Path::new("/srv/data"), "photos/2024/dawn.jpg", Size::new(150, 75))
            .unwrap();
        assert_eq!(loc.source, PathBuf::from("/srv/data/photos/2024/dawn.jpg"));
        assert_eq!(loc.bucket, PathBuf::from("/srv/data/photos/2024/150x75"));
        assert_eq!(loc.file, PathBuf::from("/srv/data/photos/2024/150x75/dawn.jpg"));
        assert_eq!(loc.web_path, "photos/2024/150x75/dawn.jpg");
    }

    #[test]
    fn locate_strips_leading_separator() {
        let a = locate(Path::new("/root"), "/img/a.png", Size::new(10, 10)).unwrap();
        let b = locate(Path::new("/root"), "img/a.png", Size::new(10, 10)).unwrap();
        assert_eq!(a, b);
    }

    #[test]
    fn locate_accepts_backslashes_and_dot_segments() {
        let loc = locate(Path::new("/root"), "\\img\\.\\a.gif", Size::new(0, 40)).unwrap();
        assert_eq!(loc.web_path, "img/0x40/a.gif");
    }

    #[test]
    fn locate_file_at_root() {
        let loc = locate(Path::new("/root"), "a.jpg", Size::new(75, 75)).unwrap();
        assert_eq!(loc.web_path, "75x75/a.jpg");
        assert_eq!(loc.file, PathBuf::from("/root/75x75/a.jpg"));
    }

    #[test]
    fn locate_rejects_parent_segments_and_empty() {
        assert_eq!(locate(Path::new("/root"), "../etc/a.jpg", Size::default()), None);
        assert_eq!(locate(Path::new("/root"), "img/../../a.jpg", Size::default()), None);
        assert_eq!(locate(Path::new("/root"), "/", Size::default()), None);
        assert_eq!(locate(Path::new("/root"), "", Size::default()), None);
    }

    // =========================================================================
    // Freshness
    // =========================================================================

    #[test]
    fn fresh_requires_strictly_newer_second() {
        let base = UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        assert!(is_fresh(base + Duration::from_secs(1), base));
        assert!(!is_fresh(base, base));
        assert!(!is_fresh(base - Duration::from_secs(1), base));
    }

    #[test]
    fn fresh_ignores_sub_second_differences() {
        let base = UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        let source = base + Duration::from_millis(100);
        let cached = base + Duration::from_millis(900);
        assert!(!is_fresh(cached, source));
    }

    #[test]
    fn whole_seconds_floors_pre_epoch() {
        assert_eq!(whole_seconds(UNIX_EPOCH - Duration::from_millis(1500)), -2);
        assert_eq!(whole_seconds(UNIX_EPOCH - Duration::from_secs(3)), -3);
        assert_eq!(whole_seconds(UNIX_EPOCH + Duration::from_millis(1500)), 1);
    }

    // =========================================================================
    // get_or_create
    // =========================================================================

    #[test]
    fn miss_generates_into_size_bucket() {
        let tmp = TempDir::new().unwrap();
        fake_source(tmp.path(), "photos/dawn.jpg");
        let cache = mock_cache(tmp.path(), 800, 400);

        let thumb = ready(
            cache
                .get_or_create(&ThumbnailRequest::new("/photos/dawn.jpg").with_size(100, 100))
                .unwrap(),
        );

        assert_eq!(thumb.outcome, Outcome::Generated);
        assert_eq!(thumb.path, "photos/100x100/dawn.jpg");
        assert_eq!(thumb.file, tmp.path().join("photos/100x100/dawn.jpg"));
        assert!(thumb.file.exists());

        let ops = cache.backend.get_operations();
        assert!(matches!(
            &ops[1],
            RecordedOp::Thumbnail {
                format: SourceFormat::Jpeg,
                output_size: OutputSize {
                    width: 100,
                    height: 50
                },
                quality: 85,
                ..
            }
        ));
    }

    #[test]
    fn second_call_is_a_hit_without_pixel_work() {
        let tmp = TempDir::new().unwrap();
        fake_source(tmp.path(), "a.png");
        let cache = mock_cache(tmp.path(), 64, 64);
        let request = ThumbnailRequest::new("a.png").with_size(32, 32);

        let first = ready(cache.get_or_create(&request).unwrap());
        let written = mtime(&first.file);
        let second = ready(cache.get_or_create(&request).unwrap());

        assert_eq!(second.outcome, Outcome::Cached);
        assert_eq!(first.path, second.path);
        assert_eq!(mtime(&second.file), written);
        // identify + thumbnail for the first call only
        assert_eq!(cache.backend.get_operations().len(), 2);
    }

    #[test]
    fn equal_second_mtime_is_stale() {
        let tmp = TempDir::new().unwrap();
        let source = fake_source(tmp.path(), "a.jpg");
        let cache = mock_cache(tmp.path(), 64, 64);
        let request = ThumbnailRequest::new("a.jpg").with_size(32, 32);
        let thumb = ready(cache.get_or_create(&request).unwrap());

        let base = UNIX_EPOCH + Duration::from_secs(1_700_000_000);
        set_mtime(&source, base + Duration::from_millis(100));
        set_mtime(&thumb.file, base + Duration::from_millis(900));

        let again = ready(cache.get_or_create(&request).unwrap());
        assert_eq!(again.outcome, Outcome::Generated);
        assert_eq!(cache.backend.thumbnail_count(), 2);
    }

    #[test]
    fn newer_source_forces_regeneration() {
        let tmp = TempDir::new().unwrap();
        let source = fake_source(tmp.path(), "a.jpg");
        let cache = mock_cache(tmp.path(), 64, 64);
        let request = ThumbnailRequest::new("a.jpg");
        let thumb = ready(cache.get_or_create(&request).unwrap());

        backdate(&thumb.file, 30);
        set_mtime(&source, SystemTime::now());

        assert_eq!(ready(cache.get_or_create(&request).unwrap()).outcome, Outcome::Generated);
    }

    #[test]
    fn missing_source_is_skipped() {
        let tmp = TempDir::new().unwrap();
        let cache = mock_cache(tmp.path(), 64, 64);

        let lookup = cache.get_or_create(&ThumbnailRequest::new("nope.jpg")).unwrap();
        assert_eq!(
            lookup,
            Lookup::Skipped(SkipReason::SourceNotFound(tmp.path().join("nope.jpg")))
        );
        assert!(lookup.path().is_none());
        assert!(cache.backend.get_operations().is_empty());
    }

    #[test]
    fn directory_named_like_image_is_skipped() {
        let tmp = TempDir::new().unwrap();
        fs::create_dir_all(tmp.path().join("album.jpg")).unwrap();
        let cache = mock_cache(tmp.path(), 64, 64);

        let lookup = cache.get_or_create(&ThumbnailRequest::new("album.jpg")).unwrap();
        assert_eq!(
            lookup,
            Lookup::Skipped(SkipReason::SourceNotFound(tmp.path().join("album.jpg")))
        );
        assert!(!tmp.path().join("75x75").exists());
        assert!(cache.backend.get_operations().is_empty());
    }

    #[test]
    fn escaping_source_is_skipped() {
        let tmp = TempDir::new().unwrap();
        let cache = mock_cache(&tmp.path().join("root"), 64, 64);
        fake_source(tmp.path(), "outside.jpg");

        let lookup = cache.get_or_create(&ThumbnailRequest::new("../outside.jpg")).unwrap();
        assert!(matches!(lookup, Lookup::Skipped(SkipReason::SourceNotFound(_))));
        assert!(!tmp.path().join("75x75").exists());
    }

    #[test]
    fn unsupported_format_skips_before_creating_bucket() {
        let tmp = TempDir::new().unwrap();
        fake_source(tmp.path(), "img/source.bmp");
        let cache = mock_cache(tmp.path(), 64, 64);

        let lookup = cache
            .get_or_create(&ThumbnailRequest::new("img/source.bmp").with_size(50, 50))
            .unwrap();

        assert_eq!(
            lookup,
            Lookup::Skipped(SkipReason::UnsupportedFormat(tmp.path().join("img/source.bmp")))
        );
        assert!(!tmp.path().join("img/50x50").exists());
        assert!(cache.backend.get_operations().is_empty());
    }

    #[test]
    fn uppercase_extension_is_supported() {
        let tmp = TempDir::new().unwrap();
        fake_source(tmp.path(), "IMG_0001.JPG");
        let cache = mock_cache(tmp.path(), 64, 64);

        let thumb = ready(cache.get_or_create(&ThumbnailRequest::new("IMG_0001.JPG")).unwrap());
        assert_eq!(thumb.path, "75x75/IMG_0001.JPG");
    }

    #[test]
    fn codec_failure_is_an_error() {
        let tmp = TempDir::new().unwrap();
        fake_source(tmp.path(), "a.gif");
        let cache = ThumbnailCache::with_parts(
            EngineConfig::with_root(tmp.path()),
            MockBackend::failing(64, 64),
            FsStorage,
        );

        let result = cache.get_or_create(&ThumbnailRequest::new("a.gif"));
        assert!(matches!(result, Err(CacheError::Imaging(_))));
    }

    #[test]
    fn bucket_creation_failure_is_an_error() {
        let tmp = TempDir::new().unwrap();
        fake_source(tmp.path(), "a.jpg");
        // A file where the bucket directory should go
        fs::write(tmp.path().join("75x75"), b"in the way").unwrap();
        let cache = mock_cache(tmp.path(), 64, 64);

        let result = cache.get_or_create(&ThumbnailRequest::new("a.jpg"));
        assert!(matches!(result, Err(CacheError::Io(_))));
    }

    #[test]
    fn explicit_crop_reaches_backend() {
        let tmp = TempDir::new().unwrap();
        fake_source(tmp.path(), "a.png");
        let cache = mock_cache(tmp.path(), 50, 50);
        let request = ThumbnailRequest::new("a.png")
            .with_size(200, 200)
            .with_crop(CropMode::Explicit(CropRect::new(0, 0, 16, 16)))
            .with_quality(150.0);

        cache.get_or_create(&request).unwrap();

        let ops = cache.backend.get_operations();
        assert_eq!(
            ops[1],
            RecordedOp::Thumbnail {
                source: tmp.path().join("a.png").to_string_lossy().to_string(),
                output: tmp
                    .path()
                    .join("200x200/a.png")
                    .to_string_lossy()
                    .to_string(),
                format: SourceFormat::Png,
                sample: SampleRect {
                    x: 0,
                    y: 0,
                    width: 16,
                    height: 16
                },
                output_size: OutputSize {
                    width: 200,
                    height: 200
                },
                quality: 100,
            }
        );
    }

    #[test]
    fn request_root_overrides_config_root() {
        let tmp = TempDir::new().unwrap();
        let other = tmp.path().join("other");
        fake_source(&other, "a.jpg");
        let cache = mock_cache(&tmp.path().join("configured"), 64, 64);

        let thumb = ready(
            cache
                .get_or_create(&ThumbnailRequest::new("a.jpg").with_root(&other))
                .unwrap(),
        );
        assert_eq!(thumb.file, other.join("75x75/a.jpg"));
        assert_eq!(thumb.path, "75x75/a.jpg");
    }

    #[test]
    fn request_uses_configured_defaults() {
        let mut config = EngineConfig::with_root("/data");
        config.defaults.size = [150, 0];
        config.defaults.quality = 60;
        let cache = ThumbnailCache::with_parts(config, MockBackend::new(), FsStorage);

        let request = cache.request("a.jpg");
        assert_eq!(request.size, Size::new(150, 0));
        assert_eq!(request.quality.value(), 60);
        assert_eq!(request.crop, CropMode::None);
        assert_eq!(request.root, None);
    }

    // =========================================================================
    // invalidate
    // =========================================================================

    #[test]
    fn invalidate_removes_single_thumbnail() {
        let tmp = TempDir::new().unwrap();
        fake_source(tmp.path(), "img/a.jpg");
        fake_source(tmp.path(), "img/b.jpg");
        let cache = mock_cache(tmp.path(), 64, 64);
        let a = ready(cache.get_or_create(&ThumbnailRequest::new("img/a.jpg")).unwrap());
        let b = ready(cache.get_or_create(&ThumbnailRequest::new("img/b.jpg")).unwrap());

        cache.invalidate("/img/a.jpg", Size::default(), false);

        assert!(!a.file.exists());
        assert!(b.file.exists());
        assert!(tmp.path().join("img/a.jpg").exists());
    }

    #[test]
    fn invalidate_then_lookup_regenerates() {
        let tmp = TempDir::new().unwrap();
        fake_source(tmp.path(), "a.jpg");
        let cache = mock_cache(tmp.path(), 64, 64);
        let request = ThumbnailRequest::new("a.jpg");
        ready(cache.get_or_create(&request).unwrap());

        cache.invalidate("a.jpg", Size::default(), false);

        assert_eq!(ready(cache.get_or_create(&request).unwrap()).outcome, Outcome::Generated);
        assert_eq!(cache.backend.thumbnail_count(), 2);
    }

    #[test]
    fn invalidate_purge_all_removes_bucket_only() {
        let tmp = TempDir::new().unwrap();
        fake_source(tmp.path(), "img/a.jpg");
        let cache = mock_cache(tmp.path(), 64, 64);
        ready(cache.get_or_create(&ThumbnailRequest::new("img/a.jpg")).unwrap());
        ready(
            cache
                .get_or_create(&ThumbnailRequest::new("img/a.jpg").with_size(20, 20))
                .unwrap(),
        );
        // A file the engine never created
        fs::write(tmp.path().join("img/75x75/foreign.png"), b"x").unwrap();

        cache.invalidate("img/a.jpg", Size::default(), true);

        assert!(!tmp.path().join("img/75x75").exists());
        assert!(tmp.path().join("img/20x20/a.jpg").exists());
        assert!(tmp.path().join("img/a.jpg").exists());
    }

    #[test]
    fn invalidate_missing_is_silent() {
        let tmp = TempDir::new().unwrap();
        let cache = mock_cache(tmp.path(), 64, 64);

        cache.invalidate("never/made.jpg", Size::new(10, 10), true);
        cache.invalidate("../escape.jpg", Size::new(10, 10), true);
        assert!(fs::read_dir(tmp.path()).unwrap().next().is_none());
    }

    #[test]
    fn invalidate_under_explicit_root() {
        let tmp = TempDir::new().unwrap();
        let other = tmp.path().join("other");
        fake_source(&other, "a.jpg");
        let cache = mock_cache(&tmp.path().join("configured"), 64, 64);
        let thumb = ready(
            cache
                .get_or_create(&ThumbnailRequest::new("a.jpg").with_root(&other))
                .unwrap(),
        );

        cache.invalidate_under(&other, "a.jpg", Size::default(), false);
        assert!(!thumb.file.exists());
    }

    // =========================================================================
    // CacheStats
    // =========================================================================

    fn lookup(outcome: Outcome) -> Lookup {
        Lookup::Ready(Thumbnail {
            path: "75x75/a.jpg".into(),
            file: PathBuf::from("/r/75x75/a.jpg"),
            outcome,
        })
    }

    #[test]
    fn cache_stats_records_lookups() {
        let mut s = CacheStats::default();
        s.record(&lookup(Outcome::Cached));
        s.record(&lookup(Outcome::Cached));
        s.record(&lookup(Outcome::Generated));
        s.record(&Lookup::Skipped(SkipReason::UnsupportedFormat("a.bmp".into())));
        assert_eq!((s.cached, s.generated, s.skipped), (2, 1, 1));
        assert_eq!(s.total(), 4);
    }

    #[test]
    fn cache_stats_display() {
        let mut s = CacheStats::default();
        s.generated = 3;
        assert_eq!(s.to_string(), "3 generated");

        s.cached = 5;
        assert_eq!(s.to_string(), "5 cached, 3 generated (8 total)");

        s.skipped = 1;
        assert_eq!(s.to_string(), "5 cached, 3 generated, 1 skipped (9 total)");
    }
}
