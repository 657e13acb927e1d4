//! Layered, order-preserving YAML settings.
//!
//! `strata_config` reads one or more YAML documents, merges them with a
//! deep override algebra, applies environment-variable overrides keyed by
//! hierarchical path, and exposes the result as an ordered,
//! attribute-addressable [`Document`] that round-trips back to YAML text
//! with anchors and aliases intact.
//!
//! The pieces, bottom up:
//!
//! - [`Document`] and [`Value`] — the ordered tree. Nested mappings are
//!   shared handles, so YAML alias sites stay one node across merges.
//! - The merge algebra — [`Document::update`], [`Document::rebase`],
//!   [`Document::deep_clone`], [`Document::limit`].
//! - Traversal — [`Document::flat`], [`Document::inflate`],
//!   [`Document::traverse`] with replace-or-descend [`Visitor`] semantics.
//! - [`update_from_env`] — `CONFIG_DATABASE_HOST` overrides
//!   `config.database.host`.
//! - [`Document::parse`] / [`to_yaml`] — order- and alias-preserving
//!   (de)serialization.
//! - [`Registry`] and [`Resolver`] — scheme dispatch from locators like
//!   `file://settings.yml` to document text, with first-candidate-wins
//!   loading over ordered candidate lists.
//! - [`SettingsBuilder`] — the defaults + overrides + environment façade
//!   with named-section inheritance.
//!
//! ```
//! use strata_config::{Document, Registry, StaticResolver};
//!
//! # fn main() -> strata_config::SettingsResult<()> {
//! let registry = Registry::new().with_resolver(
//!     StaticResolver::new().with_document("defaults", "config:\n  greet: Hello\n"),
//! );
//! let settings = registry.load(&["mem://missing", "mem://defaults"], None)?;
//! let overrides = Document::parse("config:\n  greet: Yo\n")?;
//! settings.update(&overrides);
//! assert_eq!(settings.get_path("config.greet")?.as_str(), Some("Yo"));
//! # Ok(())
//! # }
//! ```
//!
//! Documents are single-threaded by design: alias sharing uses `Rc`, so a
//! [`Document`] is not `Send`. Callers needing cross-thread access must
//! serialize it externally.

mod de;
mod document;
mod env;
mod error;
mod merge;
pub mod resolver;
mod ser;
mod settings;
mod traverse;

pub use document::{Document, Value};
pub use env::{env_var_name, update_from_env};
pub use error::{SettingsError, SettingsResult};
pub use resolver::{FileResolver, Registry, Resolver, SettingsCache, StaticResolver, Target};
pub use ser::{save, save_all, to_yaml, to_yaml_multi};
pub use settings::{Settings, SettingsBuilder, update_from_file, validate_required};
pub use traverse::{PathSegment, Visitor, render_path};
