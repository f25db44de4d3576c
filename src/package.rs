/*!
Packages generated sources as Nix expressions which build the firmware.
*/

use crate::compiler::Generated;

/// Quotes `s` as a Nix string literal.
pub fn escape_nix_string(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '\\' | '"' | '$' => {
                out.push('\\');
                out.push(c);
            }
            _ => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Wraps the generated source in a call of the `aprinterFunc` build
/// function found in the Nix expressions at `nix_dir`.
pub fn nix_expression(nix_dir: &str, generated: &Generated) -> String {
    format!(
        "with import (builtins.toPath {}); aprinterFunc {{ boardName = {}; buildName = \"aprinter\"; desiredOutputs = [{}]; mainText = {}; }}",
        escape_nix_string(nix_dir),
        escape_nix_string(&generated.board_for_build),
        escape_nix_string(&generated.output_type.to_string()),
        escape_nix_string(&generated.main_source),
    )
}
