//! # Image Version
//!
//! Derives resized and cropped thumbnails of JPEG, PNG and GIF images on the
//! local filesystem, caches them next to their sources, and serves the cached
//! copy for as long as it is newer than the source.
//!
//! ```no_run
//! use image_version::{EngineConfig, Lookup, ThumbnailCache, ThumbnailRequest};
//!
//! let cache = ThumbnailCache::new(EngineConfig::with_root("public"));
//! let request = ThumbnailRequest::new("/photos/dawn.jpg").with_size(150, 75);
//!
//! match cache.get_or_create(&request)? {
//!     Lookup::Ready(thumb) => println!("<img src=\"/{}\">", thumb.path),
//!     Lookup::Skipped(reason) => eprintln!("no thumbnail: {reason}"),
//! }
//! # Ok::<(), image_version::CacheError>(())
//! ```
//!
//! # Module Map
//!
//! | Module | Role |
//! |--------|------|
//! | [`cache`] | The engine: path scheme, freshness check, get-or-create, invalidation |
//! | [`imaging`] | Pure-Rust image operations: geometry, decode, resample, encode |
//! | [`storage`] | Filesystem primitives the engine is built on |
//! | [`config`] | `image-version.toml` loading and validation |
//!
//! # Design Decisions
//!
//! ## The Path Is The Key
//!
//! A thumbnail of `photos/dawn.jpg` at 150x75 always lives at
//! `photos/150x75/dawn.jpg`. There is no index to load, corrupt or keep in
//! sync; deleting a bucket directory by hand is a valid invalidation.
//!
//! ## Modification Times, Not Hashes
//!
//! Freshness is decided from two `stat` calls. A cache hit reads no pixels
//! and hashes nothing. The comparison is at whole seconds and strict, so a
//! source touched in the same second as its thumbnail forces a rebuild.
//!
//! ## Same Format In, Same Format Out
//!
//! A JPEG thumbnail is a (progressive) JPEG, a PNG keeps its alpha channel,
//! a GIF stays a GIF. Anything else is skipped, not converted.
//!
//! ## Pure-Rust Imaging
//!
//! Decoding, Lanczos3 resampling and encoding go through the `image` crate
//! and `jpeg-encoder`. There are no system libraries to install.
//!
//! ## Logging
//!
//! The crate emits `tracing` events (`debug` for hits, misses and skips,
//! `warn` for failed invalidations) and never installs a subscriber.

pub mod cache;
pub mod config;
pub mod imaging;
pub mod storage;

pub use cache::{
    CacheError, CacheStats, Lookup, Outcome, SkipReason, Thumbnail, ThumbnailCache,
    ThumbnailRequest, is_fresh,
};
pub use config::{ConfigError, EngineConfig, load_config};
pub use imaging::{CropMode, CropRect, Quality, Size};

#[cfg(test)]
pub(crate) mod test_helpers;
