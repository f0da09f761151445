//! Convention-driven environment overrides for in-memory configuration.
//!
//! Deployment environments override single fields of an already-loaded
//! configuration value without per-field code: every field of an
//! [`Overridable`] structure answers to the key
//! `UPPER(prefix + "_" + field path)`, nested structures extend the
//! prefix with their own name, and elements of a sequence answer both
//! to the plain key and to one suffixed with `_<index>`.
//!
//! The walk mutates the target in place. Values come from an abstract
//! [`Source`]; [`Env`] reads the process environment, while any
//! `HashMap<String, String>` works for tests.
//!
//! ```
//! use std::collections::HashMap;
//! use envoverlay::{Field, Overlay, Overridable};
//!
//! struct Server {
//!     host: String,
//!     port: u16,
//! }
//!
//! impl Overridable for Server {
//!     fn fields(&mut self) -> Vec<Field<'_>> {
//!         vec![
//!             Field::new("host", &mut self.host),
//!             Field::new("port", &mut self.port),
//!         ]
//!     }
//! }
//!
//! # fn main() -> Result<(), envoverlay::Error> {
//! let mut config = Server { host: "localhost".into(), port: 8080 };
//!
//! let mut source = HashMap::new();
//! source.insert("APP_PORT".to_string(), "9090".to_string());
//! Overlay::new(source).apply("APP", &mut config)?;
//!
//! assert_eq!(config.port, 9090);
//! assert_eq!(config.host, "localhost");
//! # Ok(())
//! # }
//! ```

mod coerce;
mod error;
mod field;
mod overlay;
mod source;

pub use crate::{
    error::Error,
    field::{Field, Kind, Node, Overridable, Scalar},
    overlay::{Overlay, OverlayBuilder, OverlayBuilderError, DEFAULT_MAX_DEPTH},
    source::{Env, Source},
};

/// Apply process environment overrides beneath `prefix` to `target`.
///
/// Convenience entry over [`Overlay::new`] with [`Env`] as the source
/// and the default depth bound.
pub fn apply_env_overrides<'a>(
    prefix: &str,
    target: impl Into<Node<'a>>,
) -> Result<(), Error> {
    Overlay::new(Env).apply(prefix, target)
}
