use log::trace;
use stdext::function_name;

use crate::compiler::{
    config::ConfigNode,
    error::{CompilerError, ConfigError, ConfigResult},
};

type Handler<'h, 'a, C, T> =
    Box<dyn FnOnce(&mut C, &str, &ConfigNode<'a>) -> ConfigResult<T> + 'h>;

/// Reasons a [`Selection`] can fail to produce a value.
#[derive(Debug, PartialEq)]
pub enum SelectionError {
    /// The tag matched no option and there is no default handler.
    UnknownVariant(String),

    /// The selected handler failed.
    Handler(CompilerError<ConfigError>),
}

impl std::fmt::Display for SelectionError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SelectionError::UnknownVariant(tag) => write!(f, "Unknown variant '{}'", tag),
            SelectionError::Handler(e) => write!(f, "{}", e),
        }
    }
}

/**
Dispatches a discriminant-tagged config node to exactly one handler.

A selection is built at the call site, one option per accepted tag, and is
consumed by [`Selection::run`]. Handlers receive the caller's context `C`
mutably together with the node being dispatched on, and all of them produce
the same result type `T`.

```ignore
let driver = Selection::new()
    .option("Mk20Clock", |ctx, node| mk20_clock(ctx, node))
    .options(&["AvrClock", "AvrClock2"], |ctx, tag, node| avr_clock(ctx, tag, node))
    .run(tag, &mut ctx, &node)?;
```

Registering the same tag twice is a programming error and panics.
 */
pub struct Selection<'h, 'a, C, T> {
    tags: Vec<(&'static str, usize)>,
    handlers: Vec<Handler<'h, 'a, C, T>>,
    default: Option<Handler<'h, 'a, C, T>>,
}

#[allow(clippy::new_without_default)]
impl<'h, 'a, C, T> Selection<'h, 'a, C, T> {
    pub fn new() -> Self {
        Selection {
            tags: vec![],
            handlers: vec![],
            default: None,
        }
    }

    /// Adds a handler for the variant named `tag`.
    pub fn option<F>(self, tag: &'static str, handler: F) -> Self
    where
        F: FnOnce(&mut C, &ConfigNode<'a>) -> ConfigResult<T> + 'h,
    {
        self.add(
            &[tag],
            Box::new(move |ctx: &mut C, _: &str, node: &ConfigNode<'a>| handler(ctx, node)),
        )
    }

    /// Adds one handler shared by several variants; the handler is told
    /// which tag selected it.
    pub fn options<F>(self, tags: &[&'static str], handler: F) -> Self
    where
        F: FnOnce(&mut C, &str, &ConfigNode<'a>) -> ConfigResult<T> + 'h,
    {
        self.add(tags, Box::new(handler))
    }

    /// Sets the handler used when no option matches the tag.
    pub fn default<F>(mut self, handler: F) -> Self
    where
        F: FnOnce(&mut C, &str, &ConfigNode<'a>) -> ConfigResult<T> + 'h,
    {
        assert!(self.default.is_none(), "Selection default set twice");
        self.default = Some(Box::new(handler));
        self
    }

    fn add(mut self, tags: &[&'static str], handler: Handler<'h, 'a, C, T>) -> Self {
        let idx = self.handlers.len();
        for tag in tags {
            assert!(
                !self.tags.iter().any(|(t, _)| t == tag),
                "Selection option '{}' registered twice",
                tag
            );
            self.tags.push((*tag, idx));
        }
        self.handlers.push(handler);
        self
    }

    /// The tags for which an option has been registered, in registration
    /// order.
    pub fn tags(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.tags.iter().map(|(t, _)| *t)
    }

    /// Invokes the handler registered for `tag`, or the default handler if
    /// there is none. Exactly one handler runs.
    pub fn run(self, tag: &str, ctx: &mut C, node: &ConfigNode<'a>) -> Result<T, SelectionError> {
        let selected = self
            .tags
            .iter()
            .find(|(t, _)| *t == tag)
            .map(|(_, idx)| *idx);

        let handler = match selected {
            Some(idx) => {
                trace!("{}: option '{}' at {}", function_name!(), tag, node.path());
                self.handlers.into_iter().nth(idx)
            }
            None => {
                trace!("{}: default for '{}' at {}", function_name!(), tag, node.path());
                self.default
            }
        };

        match handler {
            Some(handler) => handler(ctx, tag, node).map_err(SelectionError::Handler),
            None => Err(SelectionError::UnknownVariant(tag.into())),
        }
    }
}
