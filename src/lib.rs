pub mod cli;
pub mod compiler;
pub mod io;
pub mod package;

pub use cli::*;
pub use compiler::{compile, generate, Compiled, GenerateError, Generated};
pub use io::{read_document, read_template, MAIN_TEMPLATE};
pub use package::nix_expression;
