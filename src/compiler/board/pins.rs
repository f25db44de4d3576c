use crate::compiler::{
    config::ConfigNode,
    error::{ConfigError, ConfigResult},
    expr::Expr,
    pattern::PinPattern,
    registry::{ObjectKind, Registry, Singleton, SingletonKind},
};

use super::BoardSelection;

/// The grammars a pin name may match: any identifier, plus the native pin
/// syntax of the pin driver in use.
#[derive(Clone, Debug, PartialEq)]
pub struct PinPatterns(pub Vec<PinPattern>);

impl Singleton for PinPatterns {
    const KIND: SingletonKind = SingletonKind::PinPatterns;
}

/// Sets up the pin driver of the board.
pub fn setup_pins<'doc>(
    reg: &mut Registry<'doc>,
    node: &ConfigNode<'doc>,
    key: &str,
) -> ConfigResult<()> {
    let sel = BoardSelection::<(Expr, PinPattern)>::new()
        .option("At91SamPins", |reg, _| {
            reg.emit().add_framework_include("system/At91SamPins.h");
            Ok(pin_driver(
                "At91SamPins",
                PinPattern::Port {
                    pin: "At91SamPin",
                    port: "At91SamPio",
                },
            ))
        })
        .option("Mk20Pins", |reg, _| {
            reg.emit().add_framework_include("system/Mk20Pins.h");
            Ok(pin_driver(
                "Mk20Pins",
                PinPattern::Port {
                    pin: "Mk20Pin",
                    port: "Mk20Port",
                },
            ))
        })
        .option("AvrPins", |reg, _| {
            reg.emit().add_framework_include("system/AvrPins.h");
            Ok(pin_driver(
                "AvrPins",
                PinPattern::Port {
                    pin: "AvrPin",
                    port: "AvrPort",
                },
            ))
        });

    let (driver, pattern) = node.do_selection(key, reg, sel)?;
    reg.emit()
        .add_global_resource(10, "MyPins", driver, Some("Pins"));
    reg.register_singleton(PinPatterns(vec![PinPattern::Identifier, pattern]));
    Ok(())
}

fn pin_driver(name: &str, pattern: PinPattern) -> (Expr, PinPattern) {
    (
        Expr::inst(name, vec!["MyContext".into(), "Program".into()]),
        pattern,
    )
}

/// Reads a pin name, which must match one of the registered pin grammars.
pub fn get_pin(reg: &Registry<'_>, node: &ConfigNode<'_>, key: &str) -> ConfigResult<String> {
    let pin = node.get_string(key)?;
    if !reg.singleton::<PinPatterns>().0.iter().any(|p| p.matches(pin)) {
        return node.key_error(key, ConfigError::FormatError("invalid pin value".into()));
    }
    Ok(pin.into())
}

/// Resolves the digital input referenced at `key` of `node`. Yields the pin
/// and the input mode, which are passed to the user as two arguments.
pub fn use_digital_input<'doc>(
    reg: &mut Registry<'doc>,
    node: &ConfigNode<'doc>,
    key: &str,
) -> ConfigResult<Vec<Expr>> {
    let input = reg.get_object(ObjectKind::DigitalInput, node, key)?;
    Ok(vec![
        get_pin(reg, &input, "Pin")?.into(),
        input.get_identifier("InputMode")?.into(),
    ])
}
