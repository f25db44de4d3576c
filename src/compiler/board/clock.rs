use std::collections::{BTreeMap, BTreeSet};

use log::debug;

use crate::compiler::{
    config::ConfigNode,
    error::{ConfigError, ConfigResult},
    expr::{Expr, Indent},
    pattern::{CharRange, TimerGrammar},
    registry::{Emitter, Registry, Singleton, SingletonKind, Subst},
    selection::Selection,
};

use super::BoardSelection;

/// Maximum number of explicitly configured timers.
const MAX_TIMERS: usize = 20;

/// The clock drivers of the supported microcontroller families.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ClockBackend {
    At91Sam3x,
    Mk20,
    Avr,
}

/// An output compare unit: a timer and one of its channels.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct OcUnit {
    pub tc: char,
    pub channel: char,
}

impl ClockBackend {
    fn include(self) -> &'static str {
        match self {
            ClockBackend::At91Sam3x => "system/At91Sam3xClock.h",
            ClockBackend::Mk20 => "system/Mk20Clock.h",
            ClockBackend::Avr => "system/AvrClock.h",
        }
    }

    fn driver(self) -> &'static str {
        match self {
            ClockBackend::At91Sam3x => "At91Sam3xClock",
            ClockBackend::Mk20 => "Mk20Clock",
            ClockBackend::Avr => "AvrClock",
        }
    }

    fn prescaler_key(self) -> &'static str {
        match self {
            ClockBackend::At91Sam3x | ClockBackend::Mk20 => "prescaler",
            ClockBackend::Avr => "PrescaleDivide",
        }
    }

    fn grammar(self) -> TimerGrammar {
        match self {
            ClockBackend::At91Sam3x => TimerGrammar {
                prefix: "TC",
                separator: None,
                channel: CharRange('A', 'C'),
            },
            ClockBackend::Mk20 => TimerGrammar {
                prefix: "FTM",
                separator: Some('_'),
                channel: CharRange('0', '9'),
            },
            ClockBackend::Avr => TimerGrammar {
                prefix: "TC",
                separator: Some('_'),
                channel: CharRange('A', 'Z'),
            },
        }
    }

    /// Only the AVR clock lets the configuration set up the mode of each
    /// timer; the other backends always allocate timers on demand.
    fn has_configurable_timers(self) -> bool {
        self == ClockBackend::Avr
    }

    fn interrupt_timer_expr(self, it: OcUnit, clearance: Option<&str>) -> Expr {
        let (service, mut args) = match self {
            ClockBackend::At91Sam3x => (
                "At91Sam3xClockInterruptTimerService",
                vec![
                    Expr::from(format!("At91Sam3xClockTC{}", it.tc)),
                    Expr::from(format!("At91Sam3xClockComp{}", it.channel)),
                ],
            ),
            ClockBackend::Mk20 => (
                "Mk20ClockInterruptTimerService",
                vec![
                    Expr::from(format!("Mk20ClockFTM{}", it.tc)),
                    Expr::from(it.channel.to_string()),
                ],
            ),
            ClockBackend::Avr => (
                "AvrClockInterruptTimerService",
                vec![Expr::from(format!("AvrClockTcChannel{}{}", it.tc, it.channel))],
            ),
        };
        if let Some(clearance) = clearance {
            args.push(clearance.into());
        }
        Expr::inst(service, args)
    }

    fn interrupt_timer_isr(self, it: OcUnit, user: &str) -> String {
        match self {
            ClockBackend::At91Sam3x => format!(
                "AMBRO_AT91SAM3X_CLOCK_INTERRUPT_TIMER_GLOBAL(At91Sam3xClockTC{}, At91Sam3xClockComp{}, {}, MyContext())",
                it.tc, it.channel, user
            ),
            ClockBackend::Mk20 => format!(
                "AMBRO_MK20_CLOCK_INTERRUPT_TIMER_GLOBAL(Mk20ClockFTM{}, {}, {}, MyContext())",
                it.tc, it.channel, user
            ),
            ClockBackend::Avr => format!(
                "AMBRO_AVR_CLOCK_INTERRUPT_TIMER_ISRS({}, {}, {}, MyContext())",
                it.tc, it.channel, user
            ),
        }
    }

    /// The specification of a timer which is used with its default settings.
    fn timer_expr(self, tc: char) -> Expr {
        match self {
            ClockBackend::At91Sam3x => format!("At91Sam3xClockTC{}", tc).into(),
            ClockBackend::Mk20 => {
                Expr::inst("Mk20ClockFtmSpec", vec![format!("Mk20ClockFTM{}", tc).into()])
            }
            ClockBackend::Avr => {
                Expr::inst("AvrClockTcSpec", vec![format!("AvrClockTc{}", tc).into()])
            }
        }
    }

    fn timer_isr(self, tc: char) -> Option<String> {
        match self {
            ClockBackend::At91Sam3x => Some(format!(
                "AMBRO_AT91SAM3X_CLOCK_TC{}_GLOBAL(MyClock, MyContext())",
                tc
            )),
            ClockBackend::Mk20 => Some(format!(
                "AMBRO_MK20_CLOCK_FTM_GLOBAL({}, MyClock, MyContext())",
                tc
            )),
            ClockBackend::Avr => None,
        }
    }

    fn clock_isr(self, primary_timer: char) -> Option<String> {
        match self {
            ClockBackend::Avr => Some(format!(
                "AMBRO_AVR_CLOCK_ISRS({}, MyClock, MyContext())",
                primary_timer
            )),
            _ => None,
        }
    }
}

/**
The clock of the board.

The clock owns the hardware timers. Timers can be configured explicitly
(AVR only), and every timer which is referenced by an interrupt timer or is
the primary timer but was not configured is allocated with default settings
when the clock is finalized. The finalized clock fills the `CLOCK` slot with
its timers ordered primary timer first, the rest by timer id.
 */
#[derive(Debug)]
pub struct Clock {
    backend: ClockBackend,
    prescaler: String,
    primary_timer: char,
    timers: BTreeMap<char, Expr>,
    interrupt_timers: Vec<OcUnit>,
}

impl Clock {
    /// Reads the clock section of the given backend.
    pub fn new(backend: ClockBackend, node: &ConfigNode<'_>) -> ConfigResult<Clock> {
        let prescaler = node.get_int_constant(backend.prescaler_key())?;

        let mut timers = BTreeMap::new();
        if backend.has_configurable_timers() {
            for timer in node.iter_list_config("timers", 0, MAX_TIMERS)? {
                let id = read_timer(backend, &timer, "Timer")?;
                if timers.contains_key(&id) {
                    return timer.error(ConfigError::DuplicateName("timer".into()));
                }
                timers.insert(id, avr_timer_spec(id, &timer)?);
            }
        }

        Ok(Clock {
            backend,
            prescaler,
            primary_timer: read_timer(backend, node, "primary_timer")?,
            timers,
            interrupt_timers: vec![],
        })
    }

    /// Reads the name of an output compare unit.
    pub fn check_oc_unit(&self, node: &ConfigNode<'_>, key: &str) -> ConfigResult<OcUnit> {
        let name = node.get_string(key)?;
        match self.backend.grammar().match_channel(name) {
            Some((tc, channel)) => Ok(OcUnit { tc, channel }),
            None => node.key_error(key, ConfigError::FormatError("incorrect OC unit name".into())),
        }
    }

    /// Claims the output compare unit named at `oc_unit` of `node` for an
    /// interrupt timer. Returns the timer service and the ISR binding it to
    /// `user`.
    pub fn add_interrupt_timer(
        &mut self,
        node: &ConfigNode<'_>,
        user: &str,
        clearance: Option<&str>,
    ) -> ConfigResult<(Expr, String)> {
        let it = self.check_oc_unit(node, "oc_unit")?;
        self.interrupt_timers.push(it);
        Ok((
            self.backend.interrupt_timer_expr(it, clearance),
            self.backend.interrupt_timer_isr(it, user),
        ))
    }
}

impl Singleton for Clock {
    const KIND: SingletonKind = SingletonKind::Clock;

    fn finalize(&mut self, emitter: &mut Emitter) -> ConfigResult<()> {
        let mut wanted: BTreeSet<char> = self.interrupt_timers.iter().map(|it| it.tc).collect();
        wanted.insert(self.primary_timer);

        for tc in wanted {
            if self.timers.contains_key(&tc) {
                continue;
            }
            debug!("Allocating timer {} with default settings", tc);
            self.timers.insert(tc, self.backend.timer_expr(tc));
            if let Some(isr) = self.backend.timer_isr(tc) {
                emitter.add_isr(&isr);
            }
        }

        if let Some(isr) = self.backend.clock_isr(self.primary_timer) {
            emitter.add_isr(&isr);
        }

        let primary = self.primary_timer;
        let timers = self
            .timers
            .get(&primary)
            .into_iter()
            .chain(
                self.timers
                    .iter()
                    .filter(|(id, _)| **id != primary)
                    .map(|(_, spec)| spec),
            )
            .cloned()
            .collect();

        let clock = Expr::inst(
            self.backend.driver(),
            vec![
                "MyContext".into(),
                "Program".into(),
                self.prescaler.as_str().into(),
                Expr::list(timers),
            ],
        );
        emitter.add_subst("CLOCK", Subst::Expr(clock, Indent::Level(0)));
        Ok(())
    }
}

fn read_timer(backend: ClockBackend, node: &ConfigNode<'_>, key: &str) -> ConfigResult<char> {
    let name = node.get_string(key)?;
    match backend.grammar().match_timer(name) {
        Some(id) => Ok(id),
        None => node.key_error(key, ConfigError::FormatError("incorrect timer name".into())),
    }
}

fn avr_timer_spec(id: char, timer: &ConfigNode<'_>) -> ConfigResult<Expr> {
    let mode = Selection::<(), Expr>::new()
        .option("AvrClockTcModeClock", |_, _| Ok("AvrClockTcModeClock".into()))
        .option("AvrClockTcMode8BitPwm", |_, mode| {
            Ok(Expr::inst(
                "AvrClockTcMode8BitPwm",
                vec![mode.get_int("PrescaleDivide")?.into()],
            ))
        })
        .option("AvrClockTcMode16BitPwm", |_, mode| {
            Ok(Expr::inst(
                "AvrClockTcMode16BitPwm",
                vec![
                    mode.get_int("PrescaleDivide")?.into(),
                    mode.get_int("TopVal")?.into(),
                ],
            ))
        });

    Ok(Expr::inst(
        "AvrClockTcSpec",
        vec![
            format!("AvrClockTc{}", id).into(),
            timer.do_selection("Mode", &mut (), mode)?,
        ],
    ))
}

/// Reads the clock section and registers the [`Clock`] singleton.
pub fn setup_clock<'doc>(
    reg: &mut Registry<'doc>,
    node: &ConfigNode<'doc>,
    key: &str,
) -> ConfigResult<()> {
    let sel = BoardSelection::<Clock>::new()
        .option("At91Sam3xClock", |_, clock| Clock::new(ClockBackend::At91Sam3x, clock))
        .option("Mk20Clock", |_, clock| Clock::new(ClockBackend::Mk20, clock))
        .option("AvrClock", |_, clock| Clock::new(ClockBackend::Avr, clock));

    let clock = node.do_selection(key, reg, sel)?;
    reg.emit().add_framework_include(clock.backend.include());
    reg.register_singleton(clock);
    Ok(())
}

/// Claims the interrupt timer configured in the object at `key` of `node`
/// for `user` and returns its timer service.
pub fn use_interrupt_timer<'doc>(
    reg: &mut Registry<'doc>,
    node: &ConfigNode<'doc>,
    key: &str,
    user: &str,
    clearance: Option<&str>,
) -> ConfigResult<Expr> {
    let it_config = node.enter_config(key)?;
    let (expr, isr) = reg
        .singleton_mut::<Clock>()
        .add_interrupt_timer(&it_config, user, clearance)?;
    reg.emit().add_isr(&isr);
    Ok(expr)
}
