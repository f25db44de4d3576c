use crate::compiler::{config::ConfigNode, error::ConfigResult, expr::Expr, registry::Registry};

use super::{printer::float_configs, use_analog_input, use_pwm_output, UniqueNames};

const MAX_HEATERS: usize = 15;
const MAX_FANS: usize = 15;

/// Sets up the heaters: a thermistor input, a PID control loop and a
/// temperature observer driving a PWM output. Every option of heater `E`
/// is prefixed with `EHeater`.
pub fn setup_heaters<'doc>(reg: &mut Registry<'doc>, config: &ConfigNode<'doc>) -> ConfigResult<Expr> {
    let mut names = UniqueNames::new("heater");

    config.do_list("heaters", 0, MAX_HEATERS, reg, |reg, heater, idx| {
        let name = names.claim(heater, "Name")?;
        let prefix = format!("{}Heater", name);

        let conversion = heater.enter_config("conversion")?;
        reg.emit()
            .add_framework_include("printer/thermistor/GenericThermistor.h");
        let thermistor = Expr::inst(
            "GenericThermistorService",
            float_configs(
                reg,
                &conversion,
                &format!("{}Temp", prefix),
                &["ResistorR", "R0", "Beta", "MinTemp", "MaxTemp"],
            )?,
        );

        let control = heater.enter_config("control")?;
        reg.emit()
            .add_framework_include("printer/temp_control/PidControl.h");
        let control_interval = control.get_float("ControlInterval")?;
        let control_service = Expr::inst(
            "PidControlService",
            float_configs(
                reg,
                &control,
                &prefix,
                &["PidP", "PidI", "PidD", "PidIStateMin", "PidIStateMax", "PidDHistory"],
            )?,
        );

        let observer = heater.enter_config("observer")?;
        reg.emit()
            .add_framework_include("printer/TemperatureObserver.h");
        let observer_service = Expr::inst(
            "TemperatureObserverService",
            float_configs(
                reg,
                &observer,
                &prefix,
                &["ObserverInterval", "ObserverTolerance", "ObserverMinTime"],
            )?,
        );

        let mut args = vec![
            Expr::ch(name),
            heater.get_int("SetMCommand")?.into(),
            heater.get_int("WaitMCommand")?.into(),
            use_analog_input(reg, heater, "ThermistorInput")?,
            thermistor,
        ];
        args.extend(float_configs(
            reg,
            heater,
            &prefix,
            &["MinSafeTemp", "MaxSafeTemp"],
        )?);
        args.push(
            reg.emit()
                .add_float_config(&format!("{}ControlInterval", prefix), control_interval)
                .into(),
        );
        args.push(control_service);
        args.push(observer_service);
        args.push(use_pwm_output(
            reg,
            heater,
            "pwm_output",
            &format!("MyPrinter::GetHeaterPwm<{}>", idx),
            &prefix,
        )?);

        Ok(Expr::inst("PrinterMainHeaterParams", args))
    })
}

pub fn setup_fans<'doc>(reg: &mut Registry<'doc>, config: &ConfigNode<'doc>) -> ConfigResult<Expr> {
    let mut names = UniqueNames::new("fan");

    config.do_list("fans", 0, MAX_FANS, reg, |reg, fan, idx| {
        let name = names.claim(fan, "Name")?;
        Ok(Expr::inst(
            "PrinterMainFanParams",
            vec![
                fan.get_int("SetMCommand")?.into(),
                fan.get_int("OffMCommand")?.into(),
                "FanSpeedMultiply".into(),
                use_pwm_output(
                    reg,
                    fan,
                    "pwm_output",
                    &format!("MyPrinter::GetFanPwm<{}>", idx),
                    &format!("{}Fan", name),
                )?,
            ],
        ))
    })
}
