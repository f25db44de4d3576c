use std::path::Path;
use std::time::Instant;

use clap::{App, Arg, ArgMatches};
use log::{info, LevelFilter};
use simplelog::{ColorChoice, Config, TermLogger, TerminalMode};

use crate::compiler::{compile, template::substitute, Generated};
use crate::io::{read_document, read_template, write_output, write_slots};
use crate::package::nix_expression;

// Exit Codes for different types of errors
pub const ERR_CONFIG_READ: i32 = 1;
pub const ERR_GENERATE: i32 = 2;
pub const ERR_TEMPLATE: i32 = 3;
pub const ERR_OUTPUT_WRITE: i32 = 4;
pub const ERR_INVALID_ARGS: i32 = 5;

pub fn print_errs<E: std::fmt::Display>(errs: &[E]) {
    for e in errs {
        eprintln!("{}", e);
    }
}

pub fn configure_cli() -> clap::App<'static, 'static> {
    let app = App::new("Firmware Generator")
        .version("0.1.0")
        .about("Compiles a printer and board description into the main source file of a firmware build")
        .arg(
            Arg::with_name("config")
                .short("c")
                .long("config")
                .takes_value(true)
                .required(true)
                .help("The configuration document to compile, in JSON (.json) or YAML (.yaml, .yml)"),
        )
        .arg(
            Arg::with_name("cfg-name")
                .long("cfg-name")
                .takes_value(true)
                .help("Name of the configuration to compile. Defaults to the selected_config of the document."),
        )
        .arg(
            Arg::with_name("output")
                .short("o")
                .long("output")
                .takes_value(true)
                .required(true)
                .help("Name the output file that the generated source will be written to"),
        )
        .arg(
            Arg::with_name("template")
                .long("template")
                .takes_value(true)
                .help("Source template to fill in. Defaults to the bundled main template.")
        )
        .arg(
            Arg::with_name("nix")
                .long("nix")
                .requires("nix-dir")
                .help("When set, the output is a Nix expression which builds the firmware rather than the bare source")
        )
        .arg(
            Arg::with_name("nix-dir")
                .long("nix-dir")
                .takes_value(true)
                .help("Directory of the Nix expressions which provide aprinterFunc")
        )
        .arg(
            Arg::with_name("emit-slots")
                .long("emit-slots")
                .takes_value(true)
                .help("Writes the text of every generated slot to the given file as YAML. This is for debugging handlers.")
        )
        .arg(
            Arg::with_name("log-level")
                .long("log-level")
                .possible_values(&["error", "warn", "info", "debug", "trace"])
                .takes_value(true)
                .help("Enables logging to stderr at the given level")
        );
    app
}

pub fn get_log_level(args: &ArgMatches) -> Option<LevelFilter> {
    match args.value_of("log-level")? {
        "error" => Some(LevelFilter::Error),
        "warn" => Some(LevelFilter::Warn),
        "info" => Some(LevelFilter::Info),
        "debug" => Some(LevelFilter::Debug),
        "trace" => Some(LevelFilter::Trace),
        _ => None,
    }
}

pub fn configure_logging(level: LevelFilter) -> Result<(), log::SetLoggerError> {
    TermLogger::init(
        level,
        Config::default(),
        TerminalMode::Stderr,
        ColorChoice::Auto,
    )
}

/// Runs every stage of a generation for the parsed command line. The error is
/// the process exit code; the messages have already been printed to stderr.
pub fn run(config: &ArgMatches) -> Result<(), i32> {
    // clap enforces both of these
    let (input, output) = match (config.value_of("config"), config.value_of("output")) {
        (Some(input), Some(output)) => (Path::new(input), Path::new(output)),
        _ => return Err(ERR_INVALID_ARGS),
    };

    let document = match read_document(input) {
        Ok(document) => document,
        Err(e) => {
            print_errs(&[format!("Could not read {}: {}", input.display(), e)]);
            return Err(ERR_CONFIG_READ);
        }
    };

    let template = match read_template(config.value_of("template").map(Path::new)) {
        Ok(template) => template,
        Err(e) => {
            print_errs(&[format!("Could not read the template: {}", e)]);
            return Err(ERR_TEMPLATE);
        }
    };

    let compile_time = Instant::now();
    let compiled = match compile(&document, config.value_of("cfg-name")) {
        Ok(compiled) => compiled,
        Err(e) => {
            print_errs(&[e]);
            return Err(ERR_GENERATE);
        }
    };
    info!("Compile: {}", compile_time.elapsed().as_secs_f32());

    if let Some(slots_path) = config.value_of("emit-slots") {
        let written = std::fs::File::create(slots_path)
            .map_err(|e| e.to_string())
            .and_then(|mut file| write_slots(&mut file, &compiled.slots).map_err(|e| e.to_string()));
        if let Err(msg) = written {
            print_errs(&[format!("Could not write slots to {}: {}", slots_path, msg)]);
            return Err(ERR_OUTPUT_WRITE);
        }
    }

    let main_source = match substitute(&template, &compiled.slots) {
        Ok(source) => source,
        Err(e) => {
            print_errs(&[e]);
            return Err(ERR_TEMPLATE);
        }
    };
    let generated = Generated {
        main_source,
        board_for_build: compiled.board_for_build,
        output_type: compiled.output_type,
    };

    let text = if config.is_present("nix") {
        match config.value_of("nix-dir") {
            Some(nix_dir) => nix_expression(nix_dir, &generated),
            None => {
                print_errs(&["--nix requires --nix-dir"]);
                return Err(ERR_INVALID_ARGS);
            }
        }
    } else {
        generated.main_source
    };

    if let Err(e) = write_output(output, &text) {
        print_errs(&[format!("Could not write {}: {}", output.display(), e)]);
        return Err(ERR_OUTPUT_WRITE);
    }

    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn required_arguments() {
        let result = configure_cli().get_matches_from_safe(vec!["firmgen", "-c", "printer.json"]);
        assert!(result.is_err());

        let args = configure_cli()
            .get_matches_from_safe(vec!["firmgen", "-c", "printer.json", "-o", "main.cpp"])
            .unwrap();
        assert_eq!(args.value_of("config"), Some("printer.json"));
        assert_eq!(args.value_of("output"), Some("main.cpp"));
        assert_eq!(args.value_of("cfg-name"), None);
        assert!(!args.is_present("nix"));
    }

    #[test]
    fn nix_requires_a_directory() {
        let result = configure_cli().get_matches_from_safe(vec![
            "firmgen", "-c", "printer.json", "-o", "out.nix", "--nix",
        ]);
        assert!(result.is_err());

        let args = configure_cli()
            .get_matches_from_safe(vec![
                "firmgen", "-c", "printer.json", "-o", "out.nix", "--nix", "--nix-dir", "/nix",
            ])
            .unwrap();
        assert!(args.is_present("nix"));
        assert_eq!(args.value_of("nix-dir"), Some("/nix"));
    }

    #[test]
    fn log_level() {
        let args = configure_cli()
            .get_matches_from_safe(vec![
                "firmgen", "-c", "a.json", "-o", "b.cpp", "--log-level", "debug",
            ])
            .unwrap();
        assert_eq!(get_log_level(&args), Some(LevelFilter::Debug));

        let args = configure_cli()
            .get_matches_from_safe(vec!["firmgen", "-c", "a.json", "-o", "b.cpp"])
            .unwrap();
        assert_eq!(get_log_level(&args), None);
    }

    fn sample_args(template: Option<&str>, output: &Path) -> Vec<String> {
        let mut args = vec![
            "firmgen".to_string(),
            "-c".to_string(),
            concat!(env!("CARGO_MANIFEST_DIR"), "/configs/avr_sample.json").to_string(),
            "-o".to_string(),
            output.display().to_string(),
        ];
        if let Some(template) = template {
            args.push("--template".to_string());
            args.push(template.to_string());
        }
        args
    }

    #[test]
    fn missing_template_is_a_template_error() {
        let output = std::env::temp_dir().join("firmgen_missing_template.cpp");
        let args = configure_cli()
            .get_matches_from_safe(sample_args(Some("/nonexistent/main_template.cpp"), &output))
            .unwrap();
        assert_eq!(run(&args), Err(ERR_TEMPLATE));
        assert!(!output.exists());
    }

    #[test]
    fn missing_config_is_a_read_error() {
        let output = std::env::temp_dir().join("firmgen_missing_config.cpp");
        let args = configure_cli()
            .get_matches_from_safe(vec![
                "firmgen",
                "-c",
                "/nonexistent/printer.json",
                "-o",
                output.to_str().unwrap(),
            ])
            .unwrap();
        assert_eq!(run(&args), Err(ERR_CONFIG_READ));
    }

    #[test]
    fn sample_runs_to_completion() {
        let output = std::env::temp_dir().join("firmgen_sample_run.cpp");
        let args = configure_cli()
            .get_matches_from_safe(sample_args(None, &output))
            .unwrap();
        assert_eq!(run(&args), Ok(()));
        let text = std::fs::read_to_string(&output).unwrap();
        assert!(text.contains("using MyClock = "));
        std::fs::remove_file(&output).unwrap();
    }
}
