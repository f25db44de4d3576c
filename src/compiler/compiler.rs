use log::{debug, info};

use super::{
    board::{setup_board, setup_printer, OutputType},
    config::ConfigNode,
    error::{CompilerError, ConfigError, ConfigResult},
    registry::{Registry, SlotMap},
    template::{substitute, TemplateError},
};

/// The slots produced by compiling one configuration, together with the
/// build parameters read from its board.
#[derive(Clone, Debug, PartialEq)]
pub struct Compiled {
    pub slots: SlotMap,
    pub board_for_build: String,
    pub output_type: OutputType,
}

/// The generated main source file and the build parameters which go with it.
#[derive(Clone, Debug, PartialEq)]
pub struct Generated {
    pub main_source: String,
    pub board_for_build: String,
    pub output_type: OutputType,
}

#[derive(Clone, Debug, PartialEq)]
pub enum GenerateError {
    Config(CompilerError<ConfigError>),
    Template(TemplateError),
}

impl std::fmt::Display for GenerateError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            GenerateError::Config(err) => write!(f, "Configuration error: {}", err),
            GenerateError::Template(err) => write!(f, "Template error: {}", err),
        }
    }
}

impl std::error::Error for GenerateError {}

impl From<CompilerError<ConfigError>> for GenerateError {
    fn from(err: CompilerError<ConfigError>) -> Self {
        GenerateError::Config(err)
    }
}

impl From<TemplateError> for GenerateError {
    fn from(err: TemplateError) -> Self {
        GenerateError::Template(err)
    }
}

/**
Compiles one configuration of `document` into the slot map of the main
source file.

The configuration is the element of `configurations` named `cfg_name`, or
the one named by `selected_config` when no name is given. Its `board` field
names the element of `boards` which describes the hardware.

The board is walked before the printer, each in document order. Once the
whole document has been read, the deferred finalize actions run and every
accumulator is rendered into its slot.
 */
pub fn compile(document: &serde_json::Value, cfg_name: Option<&str>) -> ConfigResult<Compiled> {
    let root = ConfigNode::root(document);
    let cfg_name = match cfg_name {
        Some(name) => name,
        None => root.get_string("selected_config")?,
    };
    info!("Compiling configuration '{}'", cfg_name);

    let config = root.enter_elem_by_id("configurations", "name", cfg_name)?;
    let board_name = config.get_string("board")?;
    let board_node = root.enter_elem_by_id("boards", "name", board_name)?;
    debug!("Using board '{}' at {}", board_name, board_node.path());

    let mut reg = Registry::new();
    let board = setup_board(&mut reg, &board_node)?;
    let board_for_build = board.board_for_build.clone();
    let output_type = board.output_type;
    setup_printer(&mut reg, &config, board)?;

    let slots = reg.finalize()?;
    info!("Produced {} slots", slots.len());

    Ok(Compiled {
        slots,
        board_for_build,
        output_type,
    })
}

/// Compiles one configuration of `document` and fills the slots into
/// `template`.
pub fn generate(
    document: &serde_json::Value,
    cfg_name: Option<&str>,
    template: &str,
) -> Result<Generated, GenerateError> {
    let compiled = compile(document, cfg_name)?;
    let main_source = substitute(template, &compiled.slots)?;
    debug!("Generated {} bytes of main source", main_source.len());

    Ok(Generated {
        main_source,
        board_for_build: compiled.board_for_build,
        output_type: compiled.output_type,
    })
}
