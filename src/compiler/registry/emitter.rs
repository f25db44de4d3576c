use std::collections::{BTreeMap, BTreeSet, HashSet};
use std::str::FromStr;

use log::debug;
use serde::Serialize;

use crate::compiler::{
    error::ConfigError,
    expr::{Expr, Indent},
};

/// Banner substituted into the header of every generated file.
pub const GENERATED_WARNING: &str = "WARNING: This file was automatically generated!";

/// Priority given to interrupt service routine bindings in the global code.
pub const ISR_PRIORITY: i32 = -1;

/// Formats a float with 17 significant digits in scientific notation, which
/// is enough for the text to parse back to exactly the same value.
pub fn format_float(v: f64) -> String {
    format!("{:.16E}", v)
}

/// Fixed width integer types which a constant can be declared with.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum IntType {
    Int8,
    Int16,
    Int32,
    Int64,
    Uint8,
    Uint16,
    Uint32,
    Uint64,
}

impl IntType {
    fn is_unsigned(self) -> bool {
        matches!(
            self,
            IntType::Uint8 | IntType::Uint16 | IntType::Uint32 | IntType::Uint64
        )
    }

    fn bits(self) -> u8 {
        match self {
            IntType::Int8 | IntType::Uint8 => 8,
            IntType::Int16 | IntType::Uint16 => 16,
            IntType::Int32 | IntType::Uint32 => 32,
            IntType::Int64 | IntType::Uint64 => 64,
        }
    }
}

impl std::fmt::Display for IntType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let sign = if self.is_unsigned() { "u" } else { "" };
        write!(f, "{}int{}", sign, self.bits())
    }
}

impl FromStr for IntType {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "int8" => Ok(IntType::Int8),
            "int16" => Ok(IntType::Int16),
            "int32" => Ok(IntType::Int32),
            "int64" => Ok(IntType::Int64),
            "uint8" => Ok(IntType::Uint8),
            "uint16" => Ok(IntType::Uint16),
            "uint32" => Ok(IntType::Uint32),
            "uint64" => Ok(IntType::Uint64),
            _ => Err(ConfigError::InvalidIntegerType(s.into())),
        }
    }
}

/// The value a named slot of the template is filled with.
#[derive(Clone, Debug, PartialEq)]
pub enum Subst {
    Text(String),

    /// An expression which is rendered with the given layout when the slots
    /// are produced.
    Expr(Expr, Indent),
}

impl Subst {
    pub fn text<S: Into<String>>(text: S) -> Subst {
        Subst::Text(text.into())
    }

    fn render(&self) -> String {
        match self {
            Subst::Text(text) => text.clone(),
            Subst::Expr(expr, indent) => expr.render(*indent),
        }
    }
}

/**
The final text of every named slot, ordered by slot name.
 */
#[derive(Clone, Debug, Default, PartialEq, Serialize)]
#[serde(transparent)]
pub struct SlotMap(BTreeMap<String, String>);

impl SlotMap {
    pub fn get(&self, slot: &str) -> Option<&str> {
        self.0.get(slot).map(|s| s.as_str())
    }

    pub fn contains(&self, slot: &str) -> bool {
        self.0.contains_key(slot)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    fn insert(&mut self, slot: &str, text: String) {
        assert!(
            self.0.insert(slot.into(), text).is_none(),
            "Slot {} filled twice",
            slot
        );
    }
}

#[derive(Debug)]
struct Constant {
    decl: String,
    name: String,
    value: String,
}

#[derive(Debug)]
struct ConfigOption {
    name: String,
    dtype: String,
    value: String,
}

#[derive(Debug)]
struct GlobalResource {
    name: String,
    expr: Expr,
    alias: Option<String>,
}

/// An item of an accumulator which is ordered by priority. Items with equal
/// priority keep the order they were added in.
#[derive(Debug)]
struct Prioritized<T> {
    priority: i32,
    seq: usize,
    item: T,
}

fn sorted<T>(mut items: Vec<Prioritized<T>>) -> Vec<T> {
    items.sort_by_key(|p| (p.priority, p.seq));
    items.into_iter().map(|p| p.item).collect()
}

/**
Accumulates the side effects of the handlers: constants, config options,
includes, global code, init calls, global resources and directly filled
template slots. Nothing is written out until [`Emitter::render`], which
orders every prioritized list by `(priority, insertion index)` and renders
each accumulator into the slot it fills.

Every name declared in the generated code (constants, typedefs, config
options and global resources) must be unique; declaring a name twice
panics.
 */
#[derive(Debug, Default)]
pub struct Emitter {
    seq: usize,
    symbols: HashSet<String>,
    constants: Vec<Constant>,
    config_options: Vec<ConfigOption>,
    platform_includes: Vec<String>,
    framework_includes: BTreeSet<String>,
    global_code: Vec<Prioritized<String>>,
    init_calls: Vec<Prioritized<String>>,
    global_resources: Vec<Prioritized<GlobalResource>>,
    substs: BTreeMap<String, Subst>,
}

impl Emitter {
    pub fn new() -> Emitter {
        Emitter::default()
    }

    fn next_seq(&mut self) -> usize {
        self.seq += 1;
        self.seq
    }

    fn claim_symbol(&mut self, name: &str) {
        assert!(
            self.symbols.insert(name.into()),
            "Symbol {} declared twice",
            name
        );
    }

    /// Adds a runtime configurable option and returns its name.
    pub fn add_config(&mut self, name: &str, dtype: &str, value: &str) -> String {
        debug!("Config option: {} = {}", name, value);
        self.claim_symbol(name);
        self.config_options.push(ConfigOption {
            name: name.into(),
            dtype: dtype.into(),
            value: value.into(),
        });
        name.into()
    }

    pub fn add_float_config(&mut self, name: &str, value: f64) -> String {
        self.add_config(name, "DOUBLE", &format_float(value))
    }

    pub fn add_bool_config(&mut self, name: &str, value: bool) -> String {
        self.add_config(name, "BOOL", if value { "true" } else { "false" })
    }

    fn add_constant(&mut self, decl: &str, name: &str, value: String) -> String {
        debug!("Constant: {} {} = {}", decl, name, value);
        self.claim_symbol(name);
        self.constants.push(Constant {
            decl: decl.into(),
            name: name.into(),
            value,
        });
        name.into()
    }

    /// Declares a compile time floating point constant and returns its name.
    pub fn add_float_constant(&mut self, name: &str, value: f64) -> String {
        self.add_constant(
            "using",
            name,
            format!("AMBRO_WRAP_DOUBLE({})", format_float(value)),
        )
    }

    pub fn add_typedef(&mut self, name: &str, value: &str) -> String {
        self.add_constant("using", name, value.into())
    }

    pub fn add_int_constant(&mut self, ty: IntType, name: &str, value: i64) -> String {
        let prefix = if ty.is_unsigned() { "U" } else { "" };
        self.add_constant(
            &format!("static {}_t const", ty),
            name,
            format!("{}INT{}_C({})", prefix, ty.bits(), value),
        )
    }

    pub fn add_platform_include(&mut self, path: &str) {
        self.platform_includes.push(path.into());
    }

    /// Adds an include of the target framework. Includes are deduplicated
    /// and emitted in sorted order.
    pub fn add_framework_include(&mut self, path: &str) {
        self.framework_includes.insert(path.into());
    }

    pub fn add_global_code(&mut self, priority: i32, code: &str) {
        let seq = self.next_seq();
        self.global_code.push(Prioritized {
            priority,
            seq,
            item: code.into(),
        });
    }

    /// Adds global code binding an interrupt service routine.
    pub fn add_isr(&mut self, isr: &str) {
        self.add_global_code(ISR_PRIORITY, isr)
    }

    pub fn add_init_call(&mut self, priority: i32, call: &str) {
        let seq = self.next_seq();
        self.init_calls.push(Prioritized {
            priority,
            seq,
            item: call.into(),
        });
    }

    /// Adds a top level object of the generated program. `alias` names the
    /// object inside the program context.
    pub fn add_global_resource(&mut self, priority: i32, name: &str, expr: Expr, alias: Option<&str>) {
        debug!("Global resource: {} (priority {})", name, priority);
        self.claim_symbol(name);
        let seq = self.next_seq();
        self.global_resources.push(Prioritized {
            priority,
            seq,
            item: GlobalResource {
                name: name.into(),
                expr,
                alias: alias.map(|a| a.into()),
            },
        });
    }

    /// Fills the template slot `slot` directly.
    pub fn add_subst(&mut self, slot: &str, value: Subst) {
        assert!(
            self.substs.insert(slot.into(), value).is_none(),
            "Substitution {} set twice",
            slot
        );
    }

    /// Renders every accumulator into its slot.
    pub fn render(self) -> SlotMap {
        let mut slots = SlotMap::default();
        for (slot, value) in &self.substs {
            slots.insert(slot, value.render());
        }

        slots.insert("GENERATED_WARNING", GENERATED_WARNING.into());
        slots.insert(
            "EXTRA_CONSTANTS",
            self.constants
                .iter()
                .map(|c| format!("{} {} = {};\n", c.decl, c.name, c.value))
                .collect(),
        );
        slots.insert(
            "ConfigOptions",
            self.config_options
                .iter()
                .map(|c| {
                    format!(
                        "APRINTER_CONFIG_OPTION_{}({}, {}, ConfigNoProperties)\n",
                        c.dtype, c.name, c.value
                    )
                })
                .collect(),
        );
        slots.insert(
            "PLATFORM_INCLUDES",
            self.platform_includes
                .iter()
                .map(|inc| format!("#include <{}>\n", inc))
                .collect(),
        );
        slots.insert(
            "AprinterIncludes",
            self.framework_includes
                .iter()
                .map(|inc| format!("#include <aprinter/{}>\n", inc))
                .collect(),
        );
        slots.insert(
            "GlobalCode",
            sorted(self.global_code)
                .iter()
                .map(|code| format!("{}\n", code))
                .collect(),
        );
        slots.insert(
            "InitCalls",
            sorted(self.init_calls)
                .iter()
                .map(|call| format!("    {}\n", call))
                .collect(),
        );

        let resources = sorted(self.global_resources);
        slots.insert(
            "GlobalResourceExprs",
            resources
                .iter()
                .map(|r| format!("using {} = {};\n", r.name, r.expr.render(Indent::Level(0))))
                .collect(),
        );
        slots.insert(
            "GlobalResourceContextAliases",
            resources
                .iter()
                .filter_map(|r| {
                    r.alias
                        .as_ref()
                        .map(|alias| format!("    using {} = {};\n", alias, r.name))
                })
                .collect(),
        );
        slots.insert(
            "GlobalResourceProgramChildren",
            resources
                .iter()
                .map(|r| format!("    {},\n", r.name))
                .collect(),
        );
        slots.insert(
            "GlobalResourceInit",
            resources
                .iter()
                .map(|r| format!("    {}::init(c);\n", r.name))
                .collect(),
        );

        slots
    }
}
