use crate::compiler::{
    config::ConfigNode,
    error::{ConfigError, ConfigResult},
    expr::Expr,
    pattern::is_word,
    registry::{ObjectKind, Registry, Subst},
};

use super::{
    get_pin, setup_adc, setup_clock, setup_pins, setup_platform, setup_pwm, setup_watchdog,
    use_config_manager, use_interrupt_timer, use_sdcard, use_serial, BoardSelection,
};

/// Maximum number of board helper headers.
const MAX_HELPER_INCLUDES: usize = 20;

/// The format of the firmware image the build produces.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum OutputType {
    Hex,
    Bin,
}

impl std::fmt::Display for OutputType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            OutputType::Hex => f.write_str("hex"),
            OutputType::Bin => f.write_str("bin"),
        }
    }
}

impl std::str::FromStr for OutputType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "hex" => Ok(OutputType::Hex),
            "bin" => Ok(OutputType::Bin),
            _ => Err(ConfigError::FormatError("expected 'hex' or 'bin'".into())),
        }
    }
}

/**
What the board section contributes to the printer.

The board describes the hardware: the platform and its drivers, the named
pins and ports, and the communication peripherals. The printer section
combines these expressions with the machine description into the
`PrinterMain` resource.
 */
#[derive(Clone, Debug)]
pub struct Board<'doc> {
    pub board_for_build: String,
    pub output_type: OutputType,
    pub performance: ConfigNode<'doc>,
    pub led_pin: Expr,
    pub event_channel_timer: Expr,
    pub watchdog: Expr,
    pub serial: Expr,
    pub sdcard: Expr,
    pub config_manager: Expr,
}

/// Walks the board section `board`: sets up the platform, registers the named
/// hardware objects and builds the board level printer parameters.
pub fn setup_board<'doc>(reg: &mut Registry<'doc>, board: &ConfigNode<'doc>) -> ConfigResult<Board<'doc>> {
    let platform_config = board.enter_config("platform_config")?;

    let board_for_build = platform_config.get_string("board_for_build")?;
    if !is_word(board_for_build) {
        return platform_config.key_error(
            "board_for_build",
            ConfigError::FormatError("expected a word".into()),
        );
    }
    reg.emit()
        .add_subst("BoardForBuild", Subst::text(board_for_build));

    let output_type = match platform_config.get_string("output_type")?.parse::<OutputType>() {
        Ok(output_type) => output_type,
        Err(e) => return platform_config.key_error("output_type", e),
    };

    setup_platform(reg, &platform_config, "platform")?;

    let platform = platform_config.enter_config("platform")?;
    setup_clock(reg, &platform, "clock")?;
    setup_pins(reg, &platform, "pins")?;
    let watchdog = setup_watchdog(reg, &platform, "watchdog", "MyPrinter::GetWatchdog")?;
    setup_adc(reg, &platform, "adc")?;
    if platform.has("pwm") {
        setup_pwm(reg, &platform, "pwm")?;
    }

    for helper in platform_config.get_string_list("board_helper_includes", 0, MAX_HELPER_INCLUDES)? {
        if !is_word(helper) {
            return platform_config.key_error(
                "board_helper_includes",
                ConfigError::FormatError(format!("invalid helper name '{}'", helper)),
            );
        }
        reg.emit()
            .add_framework_include(&format!("board/{}.h", helper));
    }

    reg.register_object_list(ObjectKind::DigitalInput, board, "digital_inputs")?;
    reg.register_object_list(ObjectKind::StepperPort, board, "stepper_ports")?;
    reg.register_object_list(ObjectKind::AnalogInput, board, "analog_inputs")?;
    reg.register_object_list(ObjectKind::PwmOutput, board, "pwm_outputs")?;

    let led_pin: Expr = get_pin(reg, board, "LedPin")?.into();
    let event_channel_timer = use_interrupt_timer(
        reg,
        board,
        "EventChannelTimer",
        "MyPrinter::GetEventChannelTimer",
        Some("EventChannelTimerClearance"),
    )?;

    let performance = board.enter_config("performance")?;
    reg.emit().add_typedef(
        "TheAxisDriverPrecisionParams",
        performance.get_identifier("AxisDriverPrecisionParams")?,
    );
    reg.emit().add_float_constant(
        "EventChannelTimerClearance",
        performance.get_float("EventChannelTimerClearance")?,
    );

    let serial = setup_serial(reg, &board.enter_config("serial")?)?;
    let sdcard = board
        .enter_config("sdcard_config")?
        .do_selection("sdcard", reg, sdcard_options())?;
    let config_manager = use_config_manager(
        reg,
        &board.enter_config("runtime_config")?,
        "config_manager",
        "MyPrinter::GetConfigManager",
    )?;

    Ok(Board {
        board_for_build: board_for_build.into(),
        output_type,
        performance,
        led_pin,
        event_channel_timer,
        watchdog,
        serial,
        sdcard,
        config_manager,
    })
}

fn setup_serial<'doc>(reg: &mut Registry<'doc>, serial: &ConfigNode<'doc>) -> ConfigResult<Expr> {
    Ok(Expr::inst(
        "PrinterMainSerialParams",
        vec![
            format!("UINT32_C({})", serial.get_int_constant("BaudRate")?).into(),
            serial.get_int_constant("RecvBufferSizeExp")?.into(),
            serial.get_int_constant("SendBufferSizeExp")?.into(),
            Expr::inst(
                "GcodeParserParams",
                vec![serial.get_int_constant("GcodeMaxParts")?.into()],
            ),
            use_serial(reg, serial, "Service", "MyPrinter::GetSerial")?,
        ],
    ))
}

fn sdcard_options<'h, 'doc>() -> BoardSelection<'h, 'doc, Expr> {
    BoardSelection::<Expr>::new()
        .option("NoSdCard", |_, _| Ok("PrinterMainNoSdCardParams".into()))
        .option("SdCard", |reg, sdcard| {
            let mut args = vec![use_sdcard(
                reg,
                sdcard,
                "SdCardService",
                "MyPrinter::GetSdCard<>",
            )?];
            args.extend(sdcard.do_selection("GcodeParser", reg, gcode_parsers())?);
            args.push(sdcard.get_int("BufferBaseSize")?.into());
            args.push(sdcard.get_int("MaxCommandSize")?.into());
            Ok(Expr::inst("PrinterMainSdCardParams", args))
        })
}

/// The parser of G-code read from the SD card. Yields the parser and its
/// parameters, which are passed as two arguments.
fn gcode_parsers<'h, 'doc>() -> BoardSelection<'h, 'doc, Vec<Expr>> {
    BoardSelection::<Vec<Expr>>::new()
        .option("TextGcodeParser", |_, parser| {
            Ok(vec![
                "FileGcodeParser".into(),
                Expr::inst("GcodeParserParams", vec![parser.get_int("MaxParts")?.into()]),
            ])
        })
        .option("BinaryGcodeParser", |_, parser| {
            Ok(vec![
                "BinaryGcodeParser".into(),
                Expr::inst(
                    "BinaryGcodeParserParams",
                    vec![parser.get_int("MaxParts")?.into()],
                ),
            ])
        })
}
