extern crate log;
extern crate simplelog;

use firmgen::*;

fn main() -> Result<(), i32> {
    let config = configure_cli().get_matches();

    if let Some(level) = get_log_level(&config) {
        if let Err(e) = configure_logging(level) {
            print_errs(&[e]);
            return Err(ERR_INVALID_ARGS);
        }
    }

    run(&config)
}
