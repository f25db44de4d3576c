use crate::compiler::{
    config::ConfigNode,
    error::ConfigResult,
    expr::Expr,
    registry::{IntType, ObjectKind, Registry, Singleton, SingletonKind},
};

use super::{get_pin, BoardSelection};

/// Pins of the analog inputs in use, in the order they were first used.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct AdcPins(pub Vec<String>);

impl Singleton for AdcPins {
    const KIND: SingletonKind = SingletonKind::AdcPins;
}

/// The ADC drivers. The driver can only be instantiated once every analog
/// input has been seen.
#[derive(Debug)]
enum AdcDriver {
    At91Sam { params: Expr },
    Mk20,
    Avr,
}

impl AdcDriver {
    fn pin(&self, pin: &str) -> Expr {
        match self {
            AdcDriver::At91Sam { .. } => Expr::inst(
                "At91SamAdcSmoothPin",
                vec![pin.into(), "AdcSmoothing".into()],
            ),
            AdcDriver::Mk20 | AdcDriver::Avr => pin.into(),
        }
    }

    fn resource(self, pins: Expr) -> Expr {
        let mut args: Vec<Expr> = vec!["MyContext".into(), "Program".into(), pins];
        let name = match self {
            AdcDriver::At91Sam { params } => {
                args.push(params);
                "At91SamAdc"
            }
            AdcDriver::Mk20 => {
                args.push("AdcADiv".into());
                "Mk20Adc"
            }
            AdcDriver::Avr => {
                args.push("AdcRefSel".into());
                args.push("AdcPrescaler".into());
                "AvrAdc"
            }
        };
        Expr::inst(name, args)
    }
}

/// Scales the smoothing factor to the 16 bit fixed point value used by the
/// AT91SAM ADC driver.
fn smoothing_factor(smoothing: f64) -> i64 {
    ((smoothing * 65536.0) as i64).clamp(0, 65535)
}

/**
Sets up the ADC driver.

The driver is emitted as the `MyAdc` global resource by a finalize action,
once the handlers of the rest of the document have claimed their analog
inputs through [`use_analog_input`].
 */
pub fn setup_adc<'doc>(
    reg: &mut Registry<'doc>,
    node: &ConfigNode<'doc>,
    key: &str,
) -> ConfigResult<()> {
    let sel = BoardSelection::<AdcDriver>::new()
        .option("At91SamAdc", |reg, adc| {
            reg.emit().add_framework_include("system/At91SamAdc.h");
            reg.emit().add_float_constant("AdcFreq", adc.get_float("freq")?);
            reg.emit()
                .add_float_constant("AdcAvgInterval", adc.get_float("avg_interval")?);
            reg.emit().add_int_constant(
                IntType::Uint16,
                "AdcSmoothing",
                smoothing_factor(adc.get_float("smoothing")?),
            );
            reg.emit().add_isr("AMBRO_AT91SAM_ADC_GLOBAL(MyAdc, MyContext())");

            let params = Expr::inst(
                "At91SamAdcParams",
                vec![
                    "AdcFreq".into(),
                    adc.get_int("startup")?.into(),
                    adc.get_int("settling")?.into(),
                    adc.get_int("tracking")?.into(),
                    adc.get_int("transfer")?.into(),
                    Expr::inst("At91SamAdcAvgParams", vec!["AdcAvgInterval".into()]),
                ],
            );
            Ok(AdcDriver::At91Sam { params })
        })
        .option("Mk20Adc", |reg, adc| {
            reg.emit().add_framework_include("system/Mk20Adc.h");
            reg.emit()
                .add_int_constant(IntType::Int32, "AdcADiv", adc.get_int("AdcADiv")?);
            reg.emit().add_isr("AMBRO_MK20_ADC_ISRS(MyAdc, MyContext())");
            Ok(AdcDriver::Mk20)
        })
        .option("AvrAdc", |reg, adc| {
            reg.emit().add_framework_include("system/AvrAdc.h");
            reg.emit()
                .add_int_constant(IntType::Int32, "AdcRefSel", adc.get_int("RefSel")?);
            reg.emit()
                .add_int_constant(IntType::Int32, "AdcPrescaler", adc.get_int("Prescaler")?);
            reg.emit().add_isr("AMBRO_AVR_ADC_ISRS(MyAdc, MyContext())");
            Ok(AdcDriver::Avr)
        });

    let driver = node.do_selection(key, reg, sel)?;
    reg.register_singleton(AdcPins::default());
    reg.add_finalize_action(move |reg| {
        let pins = reg
            .singleton::<AdcPins>()
            .0
            .iter()
            .map(|pin| driver.pin(pin))
            .collect();
        let adc = driver.resource(Expr::list(pins));
        reg.emit().add_global_resource(20, "MyAdc", adc, Some("Adc"));
        Ok(())
    });
    Ok(())
}

/// Resolves the analog input referenced at `key` of `node` and connects its
/// pin to the ADC.
pub fn use_analog_input<'doc>(
    reg: &mut Registry<'doc>,
    node: &ConfigNode<'doc>,
    key: &str,
) -> ConfigResult<Expr> {
    let input = reg.get_object(ObjectKind::AnalogInput, node, key)?;
    let pin = get_pin(reg, &input, "Pin")?;
    reg.singleton_mut::<AdcPins>().0.push(pin.clone());
    Ok(pin.into())
}
