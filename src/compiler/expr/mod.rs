/*!
The expression tree which describes the generated program as a nesting of
template instantiations, together with its renderer.
*/
mod expr;
mod tests;

pub use expr::{Expr, Indent, LIST_WRAPPER};
