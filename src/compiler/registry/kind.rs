use std::any::Any;

use crate::compiler::error::ConfigResult;

use super::Emitter;

/// The pools of named hardware resources which a board declares and the
/// rest of the document refers to by name.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ObjectKind {
    DigitalInput,
    StepperPort,
    AnalogInput,
    PwmOutput,
}

impl std::fmt::Display for ObjectKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            ObjectKind::DigitalInput => "digital_input",
            ObjectKind::StepperPort => "stepper_port",
            ObjectKind::AnalogInput => "analog_input",
            ObjectKind::PwmOutput => "pwm_output",
        };
        f.write_str(s)
    }
}

/// The slots which hold state shared between handlers during one
/// compilation.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum SingletonKind {
    Clock,
    PinPatterns,
    AdcPins,
}

impl std::fmt::Display for SingletonKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            SingletonKind::Clock => "clock",
            SingletonKind::PinPatterns => "pin_patterns",
            SingletonKind::AdcPins => "adc_pins",
        };
        f.write_str(s)
    }
}

/**
A value stored in one of the singleton slots of a
[`Registry`](super::Registry).

Every [`SingletonKind`] is bound to exactly one implementing type, so a slot
is addressed by its Rust type and lookups are statically typed. A singleton
which has work to do once the whole document has been read overrides
[`Singleton::finalize`].
 */
pub trait Singleton: Any {
    const KIND: SingletonKind;

    /// Called once during finalization, after every finalize action has run.
    fn finalize(&mut self, _emitter: &mut Emitter) -> ConfigResult<()> {
        Ok(())
    }
}

/// Object safe view of a [`Singleton`] so that values of different types
/// can share one list.
pub(super) trait SingletonSlot {
    fn kind(&self) -> SingletonKind;
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
    fn finalize_slot(&mut self, emitter: &mut Emitter) -> ConfigResult<()>;
}

impl<T: Singleton> SingletonSlot for T {
    fn kind(&self) -> SingletonKind {
        T::KIND
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }

    fn finalize_slot(&mut self, emitter: &mut Emitter) -> ConfigResult<()> {
        self.finalize(emitter)
    }
}
