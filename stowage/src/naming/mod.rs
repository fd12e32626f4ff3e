//! Storage name handling
//!
//! Client filenames pass through [`NameSanitizer`] and then
//! [`UniqueNameResolver`] before anything is written, so the final name is
//! safe on every backend and free under its path.

mod locks;
mod sanitize;
mod unique;

pub use locks::{PathGuard, PathLocks};
pub use sanitize::{NameSanitizer, DEFAULT_MAX_LEN, MAX_EXTENSION_LEN};
pub use unique::{suffixed, NamingPolicy, UniqueNameResolver, DEFAULT_MAX_SUFFIX};
