/*!
Handlers which turn the sections of the input document into emitted items
and expressions.

Every handler takes the [`Registry`] of the current compilation and the
[`ConfigNode`](crate::compiler::config::ConfigNode) it reads from, and returns the expression which the caller
splices into its own expression. Handlers of tagged sections build a
[`BoardSelection`] with one option per supported backend.
*/
mod adc;
mod axes;
mod board;
mod clock;
mod peripherals;
mod pins;
mod platform;
mod printer;
mod pwm;
mod thermal;

pub use adc::{setup_adc, use_analog_input, AdcPins};
pub use axes::{setup_steppers, setup_transform};
pub use board::{setup_board, Board, OutputType};
pub use clock::{setup_clock, use_interrupt_timer, Clock, ClockBackend, OcUnit};
pub use peripherals::{
    setup_watchdog, use_config_manager, use_eeprom, use_i2c, use_sdcard, use_serial, use_spi,
};
pub use pins::{get_pin, setup_pins, use_digital_input, PinPatterns};
pub use platform::setup_platform;
pub use printer::{setup_printer, setup_probe, UniqueNames};
pub use pwm::{setup_pwm, use_pwm_output};
pub use thermal::{setup_fans, setup_heaters};

use crate::compiler::{registry::Registry, selection::Selection};

/// A [`Selection`] whose handlers work on the [`Registry`] of a
/// compilation.
pub type BoardSelection<'h, 'doc, T> = Selection<'h, 'doc, Registry<'doc>, T>;
