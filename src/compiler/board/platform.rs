use crate::compiler::{config::ConfigNode, error::ConfigResult, registry::Registry};

use super::BoardSelection;

/// Emits the platform support includes and the platform level init calls.
pub fn setup_platform<'doc>(
    reg: &mut Registry<'doc>,
    node: &ConfigNode<'doc>,
    key: &str,
) -> ConfigResult<()> {
    let sel = BoardSelection::<()>::new()
        .option("At91Sam3x8e", |reg, _| {
            reg.emit()
                .add_platform_include("aprinter/platform/at91sam3x/at91sam3x_support.h");
            reg.emit().add_init_call(-1, "platform_init();");
            Ok(())
        })
        .option("Teensy3", |reg, _| {
            reg.emit()
                .add_platform_include("aprinter/platform/teensy3/teensy3_support.h");
            Ok(())
        })
        .options(&["AVR ATmega2560", "AVR ATmega1284p"], |reg, _, _| {
            reg.emit().add_platform_include("avr/io.h");
            reg.emit()
                .add_platform_include("aprinter/platform/avr/avr_support.h");
            reg.emit().add_init_call(-3, "sei();");
            Ok(())
        });

    node.do_selection(key, reg, sel)
}
