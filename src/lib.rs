//! modshake - rewrites whole-library ramda imports into direct submodule imports
//!
//! A unit that imports `ramda` (or `ramda-extension`) and uses a handful of
//! its functions is rewritten so each used function is imported from its own
//! submodule, letting bundlers drop the rest of the library.
//!
//! ```text
//! import { compose, map } from 'ramda';      import _compose from "ramda/src/compose";
//! compose(f, g);                        =>   _compose(f, g);
//! ```

pub mod logging;
pub mod modules;
pub mod report;
pub mod syntax;
pub mod transform;

pub use modules::{MethodIndex, TrackedLibrary};
pub use transform::{TransformError, TransformOutput, Transformer};
