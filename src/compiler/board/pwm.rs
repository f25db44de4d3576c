use crate::compiler::{
    config::ConfigNode,
    error::ConfigResult,
    expr::Expr,
    registry::{ObjectKind, Registry},
};

use super::{get_pin, use_interrupt_timer, BoardSelection, Clock};

/// Sets up the hardware PWM module of the board, if it has one.
pub fn setup_pwm<'doc>(
    reg: &mut Registry<'doc>,
    node: &ConfigNode<'doc>,
    key: &str,
) -> ConfigResult<()> {
    let sel = BoardSelection::<Option<Expr>>::new()
        .option("Disabled", |_, _| Ok(None))
        .option("At91Sam3xPwm", |reg, pwm| {
            reg.emit().add_framework_include("system/At91Sam3xPwm.h");
            Ok(Some(Expr::inst(
                "At91Sam3xPwm",
                vec![
                    "MyContext".into(),
                    "Program".into(),
                    Expr::inst(
                        "At91Sam3xPwmParams",
                        vec![
                            pwm.get_int("PreA")?.into(),
                            pwm.get_int("DivA")?.into(),
                            pwm.get_int("PreB")?.into(),
                            pwm.get_int("DivB")?.into(),
                        ],
                    ),
                ],
            )))
        });

    if let Some(pwm) = node.do_selection(key, reg, sel)? {
        reg.emit().add_global_resource(25, "MyPwm", pwm, Some("Pwm"));
    }
    Ok(())
}

/**
Resolves the PWM output referenced at `key` of `node` and returns its
service.

`user` is the expression through which the generated code reaches the
output's owner and `username` prefixes the constants declared for it.
 */
pub fn use_pwm_output<'doc>(
    reg: &mut Registry<'doc>,
    node: &ConfigNode<'doc>,
    key: &str,
    user: &str,
    username: &str,
) -> ConfigResult<Expr> {
    let output = reg.get_object(ObjectKind::PwmOutput, node, key)?;

    let sel = BoardSelection::<Expr>::new()
        .option("SoftPwm", |reg, backend| {
            reg.emit().add_framework_include("printer/pwm/SoftPwm.h");
            Ok(Expr::inst(
                "SoftPwmService",
                vec![
                    get_pin(reg, backend, "OutputPin")?.into(),
                    backend.get_bool("OutputInvert")?.into(),
                    reg.emit()
                        .add_float_constant(
                            &format!("{}PulseInterval", username),
                            backend.get_float("PulseInterval")?,
                        )
                        .into(),
                    use_interrupt_timer(
                        reg,
                        backend,
                        "Timer",
                        &format!("{}::TheTimer", user),
                        None,
                    )?,
                ],
            ))
        })
        .option("HardPwm", |reg, backend| {
            reg.emit().add_framework_include("printer/pwm/HardPwm.h");
            let driver = backend.do_selection("HardPwmDriver", reg, hard_pwm_drivers())?;
            Ok(Expr::inst("HardPwmService", vec![driver]))
        });

    output.do_selection("Backend", reg, sel)
}

fn hard_pwm_drivers<'h, 'doc>() -> BoardSelection<'h, 'doc, Expr> {
    BoardSelection::<Expr>::new()
        .option("AvrClockPwm", |reg, driver| {
            let oc_unit = reg.singleton::<Clock>().check_oc_unit(driver, "oc_unit")?;
            Ok(Expr::inst(
                "AvrClockPwmService",
                vec![
                    format!("AvrClockTcChannel{}{}", oc_unit.tc, oc_unit.channel).into(),
                    get_pin(reg, driver, "OutputPin")?.into(),
                ],
            ))
        })
        .option("At91Sam3xPwmChannel", |reg, driver| {
            Ok(Expr::inst(
                "At91Sam3xPwmChannelService",
                vec![
                    driver.get_int("ChannelPrescaler")?.into(),
                    driver.get_int("ChannelPeriod")?.into(),
                    driver.get_int("ChannelNumber")?.into(),
                    get_pin(reg, driver, "OutputPin")?.into(),
                    format!("'{}'", driver.get_identifier("Signal")?).into(),
                ],
            ))
        })
}
