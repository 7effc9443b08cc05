//! Content-addressed image cache.
//!
//! Images are stored in a single flat directory. The file name of each image
//! is derived from its source URL only (see [`derive_key`]), so repeated runs
//! find previously downloaded images without any index file.
//!
//! ```text
//! https://cdn.example.com/u/42.jpg
//!         │
//!         ▼ sha256(url) + path extension
//! <cache_dir>/5f1c…e09a.jpg
//! ```

mod key;
mod store;

pub use key::{derive_key, CacheKey, KeyError};
pub use store::{CacheStats, ClearResult, ImageCache};
