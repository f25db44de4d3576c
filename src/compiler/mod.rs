/*!
 * The Compiler takes a declarative description of a printer and its board
 * and converts it into the main source file of a firmware build.
 *
 * Compilation happens in two phases. During the collect phase the document
 * is walked depth first, in document order, by the handlers in `board`. The
 * handlers validate every field they read through `config`, register the
 * named hardware objects and singletons in the `registry`, and emit the
 * items of the generated program: includes, constants, config options,
 * global code, init calls and global resources. Type expressions for the
 * generated program are built with `expr`.
 *
 * Some items can only be produced once everything has been read, for
 * example the ADC resource which lists every analog pin in use. Handlers
 * defer those to finalize actions. In the finalize phase the actions run in
 * reverse order of registration, the singletons finalize themselves, and
 * every accumulator is rendered into a named slot.
 *
 * Any violation of the implicit schema of the document is a user error:
 * it aborts the compilation with the path of the offending field. Violations
 * of the registry protocol are bugs in the handlers and panic.
 *
 * Finally, `template` fills the slots into the source template.
 */
pub mod board;
pub mod compiler;
pub mod config;
pub mod error;
pub mod expr;
pub mod pattern;
pub mod registry;
pub mod selection;
pub mod template;

mod tests;

pub use compiler::{compile, generate, Compiled, GenerateError, Generated};
