/*!
Validating, path-tracked access to the input document.

The document is held as a [`serde_json::Value`], whether it was read from
JSON or from YAML. Handlers never touch the raw value; they walk it through
[`ConfigNode`]s so that the first schema violation aborts the compilation
with the breadcrumb of the offending field.
*/
mod node;
mod path;

pub use node::{ConfigNode, DISCRIMINANT_KEY};
pub use path::{Breadcrumb, PathSegment};
