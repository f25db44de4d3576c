use std::collections::BTreeSet;

use crate::compiler::{
    config::ConfigNode,
    error::{ConfigError, ConfigResult},
    expr::Expr,
    registry::{Registry, Subst},
};

use super::{
    setup_fans, setup_heaters, setup_steppers, setup_transform, use_digital_input, Board,
    BoardSelection,
};

/// Maximum number of probing points.
const MAX_PROBE_POINTS: usize = 20;

/**
A namespace of single letter names.

The names of axes, heaters and fans prefix the configuration options
declared for them, so two objects of the same namespace with the same name
would declare the same options twice.
 */
#[derive(Clone, Debug)]
pub struct UniqueNames {
    what: &'static str,
    seen: BTreeSet<char>,
}

impl UniqueNames {
    pub fn new(what: &'static str) -> UniqueNames {
        UniqueNames {
            what,
            seen: BTreeSet::new(),
        }
    }

    /// Reads the name at `key` of `node` and claims it.
    pub fn claim(&mut self, node: &ConfigNode<'_>, key: &str) -> ConfigResult<char> {
        let name = node.get_id_char(key)?;
        if !self.seen.insert(name) {
            return node.key_error(key, ConfigError::DuplicateName(self.what.into()));
        }
        Ok(name)
    }
}

/// Declares the config option `{prefix}{field}` for each of `fields`, with
/// the value of the same field of `node`, and returns their names in order.
pub(super) fn float_configs(
    reg: &mut Registry<'_>,
    node: &ConfigNode<'_>,
    prefix: &str,
    fields: &[&str],
) -> ConfigResult<Vec<Expr>> {
    fields
        .iter()
        .map(|field| -> ConfigResult<Expr> {
            let value = node.get_float(field)?;
            Ok(Expr::from(
                reg.emit()
                    .add_float_config(&format!("{}{}", prefix, field), value),
            ))
        })
        .collect()
}

/// Sets up the bed probe, declaring the probe geometry and the probing
/// points as config options.
pub fn setup_probe<'doc>(reg: &mut Registry<'doc>, config: &ConfigNode<'doc>) -> ConfigResult<Expr> {
    let sel = BoardSelection::<Expr>::new()
        .option("NoProbe", |_, _| Ok("PrinterMainNoProbeParams".into()))
        .option("Probe", |reg, probe| {
            let mut settings = float_configs(
                reg,
                probe,
                "Probe",
                &[
                    "OffsetX",
                    "OffsetY",
                    "StartHeight",
                    "LowHeight",
                    "RetractDist",
                    "MoveSpeed",
                    "FastSpeed",
                    "RetractSpeed",
                    "SlowSpeed",
                ],
            )?;

            let mut points = vec![];
            for (idx, point) in probe
                .iter_list_config("ProbePoints", 1, MAX_PROBE_POINTS)?
                .iter()
                .enumerate()
            {
                let prefix = format!("ProbeP{}", idx + 1);
                points.push(Expr::list(float_configs(reg, point, &prefix, &["X", "Y"])?));
            }

            let offset: Vec<Expr> = settings.drain(..2).collect();
            let mut args = vec![
                Expr::list(vec![
                    Expr::inst("WrapInt", vec![Expr::ch('X')]),
                    Expr::inst("WrapInt", vec![Expr::ch('Y')]),
                ]),
                Expr::ch('Z'),
            ];
            args.extend(use_digital_input(reg, probe, "ProbePin")?);
            args.push(probe.get_bool_constant("InvertInput")?.into());
            args.push(Expr::list(offset));
            args.extend(settings);
            args.push(Expr::list(points));
            Ok(Expr::inst("PrinterMainProbeParams", args))
        });

    config
        .enter_config("probe_config")?
        .do_selection("probe", reg, sel)
}

/**
Walks the printer section of the configuration `config` and emits the
`MyPrinter` global resource, combining the machine description with the
board expressions in `board`.

Sections are processed in the order advanced settings, probe, steppers,
heaters, transform, fans. Steppers and the virtual axes of the transform
share one namespace.
 */
pub fn setup_printer<'doc>(
    reg: &mut Registry<'doc>,
    config: &ConfigNode<'doc>,
    board: Board<'doc>,
) -> ConfigResult<()> {
    reg.emit().add_framework_include("printer/PrinterMain.h");
    reg.emit()
        .add_float_constant("FanSpeedMultiply", 1.0 / 255.0);

    let advanced = config.enter_config("advanced")?;
    reg.emit()
        .add_float_constant("LedBlinkInterval", advanced.get_float("LedBlinkInterval")?);
    reg.emit()
        .add_float_config("ForceTimeout", advanced.get_float("ForceTimeout")?);

    let probe = setup_probe(reg, config)?;
    let mut axis_names = UniqueNames::new("axis");
    let steppers = setup_steppers(reg, config, &mut axis_names)?;
    let heaters = setup_heaters(reg, config)?;
    let transform = setup_transform(reg, config, &mut axis_names)?;
    let fans = setup_fans(reg, config)?;

    let performance = &board.performance;
    let params = Expr::inst(
        "PrinterMainParams",
        vec![
            board.serial,
            board.led_pin,
            "LedBlinkInterval".into(),
            reg.emit()
                .add_float_config("InactiveTime", config.get_float("InactiveTime")?)
                .into(),
            reg.emit()
                .add_float_constant("SpeedLimitMultiply", 1.0 / 60.0)
                .into(),
            reg.emit()
                .add_float_config("MaxStepsPerCycle", performance.get_float("MaxStepsPerCycle")?)
                .into(),
            performance
                .get_int_constant("StepperSegmentBufferSize")?
                .into(),
            performance.get_int_constant("EventChannelBufferSize")?.into(),
            performance.get_int_constant("LookaheadBufferSize")?.into(),
            performance.get_int_constant("LookaheadCommitCount")?.into(),
            "ForceTimeout".into(),
            performance
                .get_identifier_with("FpType", |t| t == "float" || t == "double")?
                .into(),
            board.event_channel_timer,
            board.watchdog,
            board.sdcard,
            probe,
            "PrinterMainNoCurrentParams".into(),
            board.config_manager,
            "ConfigList".into(),
            steppers,
            transform,
            heaters,
            fans,
        ],
    );

    reg.emit().add_global_resource(
        30,
        "MyPrinter",
        Expr::inst("PrinterMain", vec!["MyContext".into(), "Program".into(), params]),
        None,
    );
    reg.emit()
        .add_subst("FastEventRoot", Subst::text("MyPrinter"));
    reg.emit()
        .add_subst("EmergencyProvider", Subst::text("MyPrinter"));
    Ok(())
}
