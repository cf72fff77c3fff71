//! Method index for tracked utility libraries.
//!
//! This module knows which functions each tracked library exports and which
//! internal submodule backs each one. The index is built once per process by
//! scanning the installed library's own `src/` layout, then shared read-only
//! by every compilation unit.
//!
//! # Supported Libraries
//!
//! - **ramda** - `ramda/src/<name>.js`
//! - **ramda-extension** - `ramda-extension/src/<name>.js`
//!
//! # Example
//!
//! ```ignore
//! use std::path::Path;
//! use modshake::modules::{MethodIndex, TrackedLibrary};
//!
//! let index = MethodIndex::build(Path::new("."), &TrackedLibrary::defaults())?;
//! let path = index.resolve(&TrackedLibrary::new("ramda"), "compose")?;
//! assert_eq!(path, "ramda/src/compose");
//! ```

pub mod index;
pub mod layout;

// Re-export main types for convenience
pub use index::{
    IndexError, IndexResult, MethodIndex, ResolutionError, TrackedLibrary, DEFAULT_LIBRARIES,
};
pub use layout::{list_library_modules, locate_library};
