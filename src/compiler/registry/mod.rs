/*!
The state shared by all handlers of one compilation: the pools of named
hardware objects, the singleton slots, the emission accumulators and the
deferred finalize actions.
*/
mod emitter;
mod kind;
mod registry;

pub use emitter::{format_float, Emitter, IntType, SlotMap, Subst, GENERATED_WARNING, ISR_PRIORITY};
pub use kind::{ObjectKind, Singleton, SingletonKind};
pub use registry::{Phase, Registry, MAX_OBJECTS_PER_LIST};
