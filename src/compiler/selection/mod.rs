/*!
Tagged-variant dispatch.

Parts of the input document which can take one of several shapes are stored
as objects carrying their variant name in the `_compoundName` field. A
[`Selection`] maps those names onto handlers.
*/
mod selection;
mod tests;

pub use selection::{Selection, SelectionError};
