use crate::compiler::{
    config::ConfigNode,
    error::{ConfigError, ConfigResult},
    expr::Expr,
    registry::{ObjectKind, Registry},
};

use super::{
    get_pin, printer::float_configs, use_digital_input, use_interrupt_timer, BoardSelection,
    UniqueNames,
};

const MAX_STEPPERS: usize = 15;

/// Maximum number of dimensions of a coordinate transform.
const MAX_TRANSFORM_DIMENSIONS: usize = 3;

/// The config options shared by the homing of steppers and of virtual axes,
/// after the endstop and the homing direction.
const HOMING_MOTION: &[&str] = &[
    "HomeFastMaxDist",
    "HomeRetractDist",
    "HomeSlowMaxDist",
    "HomeFastSpeed",
    "HomeRetractSpeed",
    "HomeSlowSpeed",
];

fn bool_config(reg: &mut Registry<'_>, node: &ConfigNode<'_>, name: char, field: &str) -> ConfigResult<Expr> {
    let value = node.get_bool(field)?;
    Ok(reg
        .emit()
        .add_bool_config(&format!("{}{}", name, field), value)
        .into())
}

fn stepper_homing<'h, 'doc>(name: char) -> BoardSelection<'h, 'doc, Expr> {
    BoardSelection::<Expr>::new()
        .option("no_homing", |_, _| Ok("PrinterMainNoHomingParams".into()))
        .option("homing", move |reg, homing| {
            reg.emit().add_framework_include("printer/AxisHomer.h");
            let home_dir = bool_config(reg, homing, name, "HomeDir")?;

            let mut homer = use_digital_input(reg, homing, "HomeEndstopInput")?;
            homer.push(bool_config(reg, homing, name, "HomeEndInvert")?);
            homer.extend(float_configs(reg, homing, &name.to_string(), HOMING_MOTION)?);

            Ok(Expr::inst(
                "PrinterMainHomingParams",
                vec![home_dir, Expr::inst("AxisHomerService", homer)],
            ))
        })
}

/**
Sets up the steppers listed in the configuration `config`.

Each stepper drives its axis through the stepper port it references, whose
pins and interrupt timer are taken from the board. Stepper names are
claimed in `axis_names`.
 */
pub fn setup_steppers<'doc>(
    reg: &mut Registry<'doc>,
    config: &ConfigNode<'doc>,
    axis_names: &mut UniqueNames,
) -> ConfigResult<Expr> {
    config.do_list("steppers", 1, MAX_STEPPERS, reg, |reg, stepper, idx| {
        let name = axis_names.claim(stepper, "Name")?;
        let port = reg.get_object(ObjectKind::StepperPort, stepper, "stepper_port")?;
        reg.emit().add_framework_include("driver/AxisDriver.h");

        let mut args = vec![
            Expr::ch(name),
            get_pin(reg, &port, "DirPin")?.into(),
            get_pin(reg, &port, "StepPin")?.into(),
            get_pin(reg, &port, "EnablePin")?.into(),
            bool_config(reg, stepper, name, "InvertDir")?,
        ];
        args.extend(float_configs(
            reg,
            stepper,
            &name.to_string(),
            &[
                "StepsPerUnit",
                "MinPos",
                "MaxPos",
                "MaxSpeed",
                "MaxAccel",
                "DistanceFactor",
                "CorneringDistance",
            ],
        )?);
        args.push(stepper.do_selection("homing", reg, stepper_homing(name))?);
        args.push(stepper.get_bool("EnableCartesianSpeedLimit")?.into());
        args.push(Expr::Int(32));
        args.push(Expr::inst(
            "AxisDriverService",
            vec![
                use_interrupt_timer(
                    reg,
                    &port,
                    "StepperTimer",
                    &format!("MyPrinter::GetAxisTimer<{}>", idx),
                    None,
                )?,
                "TheAxisDriverPrecisionParams".into(),
            ],
        ));
        args.push("PrinterMainNoMicroStepParams".into());

        Ok(Expr::inst("PrinterMainAxisParams", args))
    })
}

fn virtual_homing<'h, 'doc>(name: char) -> BoardSelection<'h, 'doc, Expr> {
    BoardSelection::<Expr>::new()
        .option("no_homing", |_, _| Ok("PrinterMainNoVirtualHomingParams".into()))
        .option("homing", move |reg, homing| {
            let mut args = use_digital_input(reg, homing, "HomeEndstopInput")?;
            args.push(bool_config(reg, homing, name, "HomeEndInvert")?);
            args.push(bool_config(reg, homing, name, "HomeDir")?);
            args.extend(float_configs(reg, homing, &name.to_string(), HOMING_MOTION)?);
            Ok(Expr::inst("PrinterMainVirtualHomingParams", args))
        })
}

fn virtual_axis<'doc>(
    reg: &mut Registry<'doc>,
    axis: &ConfigNode<'doc>,
    axis_names: &mut UniqueNames,
) -> ConfigResult<Expr> {
    let name = axis_names.claim(axis, "Name")?;
    let mut args = vec![Expr::ch(name)];
    args.extend(float_configs(
        reg,
        axis,
        &name.to_string(),
        &["MinPos", "MaxPos", "MaxSpeed"],
    )?);
    args.push(axis.do_selection("homing", reg, virtual_homing(name))?);
    Ok(Expr::inst("PrinterMainVirtualAxisParams", args))
}

/// Resolves a stepper taking part in the transform. Such a stepper must not
/// be subject to the cartesian speed limit.
fn transform_stepper(config: &ConfigNode<'_>, stepper: &ConfigNode<'_>) -> ConfigResult<Expr> {
    let name = stepper.get_id_char("StepperName")?;
    let target = match config.enter_elem_by_id("steppers", "Name", &name.to_string()) {
        Ok(target) => target,
        Err(_) => {
            return stepper.error(ConfigError::Invalid(format!(
                "Unknown stepper '{}' referenced",
                name
            )))
        }
    };
    if target.get_bool("EnableCartesianSpeedLimit")? {
        return target.key_error(
            "EnableCartesianSpeedLimit",
            ConfigError::Invalid(
                "A stepper involved in a coordinate transform may not be cartesian".into(),
            ),
        );
    }
    Ok(Expr::inst("WrapInt", vec![Expr::ch(name)]))
}

fn transform_types<'h, 'doc>() -> BoardSelection<'h, 'doc, Expr> {
    BoardSelection::<Expr>::new()
        .option("CoreXY", |reg, _| {
            reg.emit()
                .add_framework_include("printer/transform/CoreXyTransform.h");
            Ok("CoreXyTransformService".into())
        })
        .option("Delta", |reg, transform| {
            reg.emit()
                .add_framework_include("printer/transform/DeltaTransform.h");
            let emit = reg.emit();
            let mut args = vec![Expr::from(
                emit.add_float_config("DeltaDiagonalRod", transform.get_float("DiagnalRod")?),
            )];
            for field in ["SmoothRodOffset", "EffectorOffset", "CarriageOffset"] {
                let value = transform.get_float(field)?;
                args.push(emit.add_float_config(&format!("Delta{}", field), value).into());
            }
            args.push(Expr::inst(
                "DistanceSplitterParams",
                vec![
                    emit.add_float_constant(
                        "DeltaMinSplitLength",
                        transform.get_float("MinSplitLength")?,
                    )
                    .into(),
                    emit.add_float_constant(
                        "DeltaMaxSplitLength",
                        transform.get_float("MaxSplitLength")?,
                    )
                    .into(),
                ],
            ));
            Ok(Expr::inst("DeltaTransformService", args))
        })
}

/**
Sets up the coordinate transform of the configuration `config`.

Apart from `NoTransform` every tag names a transform type. The virtual
(cartesian) axes and the steppers the transform drives are read first, then
the type specific parameters. Virtual axis names are claimed in
`axis_names`, so they must not collide with stepper names.
 */
pub fn setup_transform<'doc>(
    reg: &mut Registry<'doc>,
    config: &ConfigNode<'doc>,
    axis_names: &mut UniqueNames,
) -> ConfigResult<Expr> {
    let sel = BoardSelection::<Expr>::new()
        .option("NoTransform", |_, _| Ok("PrinterMainNoTransformParams".into()))
        .default(|reg, tag, transform| {
            let virtual_axes = transform.do_keyed_list(
                "DimensionCount",
                "CartesianAxes",
                "VirtualAxis",
                1,
                MAX_TRANSFORM_DIMENSIONS,
                reg,
                |reg, axis, _| virtual_axis(reg, axis, axis_names),
            )?;
            let steppers = transform.do_keyed_list(
                "DimensionCount",
                "Steppers",
                "TransformStepper",
                1,
                MAX_TRANSFORM_DIMENSIONS,
                reg,
                |_, stepper, _| transform_stepper(config, stepper),
            )?;
            let segments_per_second = reg.emit().add_float_constant(
                "SegmentsPerSecond",
                transform.get_float("SegmentsPerSecond")?,
            );
            let transform_type = transform.select(tag, reg, transform_types())?;

            Ok(Expr::inst(
                "PrinterMainTransformParams",
                vec![
                    virtual_axes,
                    steppers,
                    segments_per_second.into(),
                    transform_type,
                ],
            ))
        });

    config.do_selection("transform", reg, sel)
}
