use serde_json::Value;

use crate::compiler::{
    error::{CompilerError, ConfigError, ConfigResult, ValueKind},
    expr::Expr,
    pattern,
    registry::format_float,
    selection::{Selection, SelectionError},
};

use super::Breadcrumb;

/// Field which names the variant of a tagged (sum type) object.
pub const DISCRIMINANT_KEY: &str = "_compoundName";

/**
An immutable view into one subtree of the input document.

Every accessor validates the shape of the field it reads at the point of
use, and every failure is reported as a [`CompilerError`] carrying the
breadcrumb of the offending field. Descending into a child produces a new
[`ConfigNode`] whose breadcrumb extends the parent's.
 */
#[derive(Clone, Debug)]
pub struct ConfigNode<'a> {
    value: &'a Value,
    path: Breadcrumb,
}

impl<'a> ConfigNode<'a> {
    /// Creates a view over the whole document.
    pub fn root(value: &'a Value) -> ConfigNode<'a> {
        ConfigNode {
            value,
            path: Breadcrumb::new(),
        }
    }

    /// The breadcrumb leading to this node.
    pub fn path(&self) -> &Breadcrumb {
        &self.path
    }

    /// The breadcrumb leading to the field `key` of this node.
    pub fn key_path(&self, key: &str) -> Breadcrumb {
        self.path.key(key)
    }

    /// Fails with `inner` located at this node.
    pub fn error<T>(&self, inner: ConfigError) -> ConfigResult<T> {
        Err(CompilerError::new(self.path.clone(), inner))
    }

    /// Fails with `inner` located at the field `key` of this node.
    pub fn key_error<T>(&self, key: &str, inner: ConfigError) -> ConfigResult<T> {
        Err(CompilerError::new(self.key_path(key), inner))
    }

    /// Returns true if this node is an object which has the field `key`.
    pub fn has(&self, key: &str) -> bool {
        self.value
            .as_object()
            .map(|o| o.contains_key(key))
            .unwrap_or(false)
    }

    fn field(&self, key: &str) -> ConfigResult<&'a Value> {
        let value: &'a Value = self.value;
        match value.as_object().and_then(|o| o.get(key)) {
            Some(v) => Ok(v),
            None => self.key_error(key, ConfigError::MissingField),
        }
    }

    pub fn get_string(&self, key: &str) -> ConfigResult<&'a str> {
        match self.field(key)?.as_str() {
            Some(s) => Ok(s),
            None => self.key_error(key, ConfigError::WrongType(ValueKind::String)),
        }
    }

    pub fn get_int(&self, key: &str) -> ConfigResult<i64> {
        match self.field(key)?.as_i64() {
            Some(i) => Ok(i),
            None => self.key_error(key, ConfigError::WrongType(ValueKind::Integer)),
        }
    }

    /// Reads a number; integers are accepted and converted.
    pub fn get_float(&self, key: &str) -> ConfigResult<f64> {
        match self.field(key)?.as_f64() {
            Some(f) => Ok(f),
            None => self.key_error(key, ConfigError::WrongType(ValueKind::Number)),
        }
    }

    pub fn get_bool(&self, key: &str) -> ConfigResult<bool> {
        match self.field(key)?.as_bool() {
            Some(b) => Ok(b),
            None => self.key_error(key, ConfigError::WrongType(ValueKind::Bool)),
        }
    }

    fn get_list(&self, key: &str, min: usize, max: usize) -> ConfigResult<&'a Vec<Value>> {
        let list = match self.field(key)?.as_array() {
            Some(list) => list,
            None => return self.key_error(key, ConfigError::WrongType(ValueKind::List)),
        };

        if list.len() < min || list.len() > max {
            return self.key_error(
                key,
                ConfigError::CountOutOfRange {
                    count: list.len() as i64,
                    min,
                    max,
                },
            );
        }

        Ok(list)
    }

    /// Reads a list of strings which must have between `min` and `max`
    /// elements.
    pub fn get_string_list(&self, key: &str, min: usize, max: usize) -> ConfigResult<Vec<&'a str>> {
        let list = self.get_list(key, min, max)?;
        let path = self.key_path(key);
        list.iter()
            .enumerate()
            .map(|(idx, v)| match v.as_str() {
                Some(s) => Ok(s),
                None => Err(CompilerError::new(
                    path.index(idx),
                    ConfigError::WrongType(ValueKind::String),
                )),
            })
            .collect()
    }

    /// Returns a node for every object in the list at `key`, which must have
    /// between `min` and `max` elements.
    pub fn iter_list_config(
        &self,
        key: &str,
        min: usize,
        max: usize,
    ) -> ConfigResult<Vec<ConfigNode<'a>>> {
        let list = self.get_list(key, min, max)?;
        let path = self.key_path(key);
        list.iter()
            .enumerate()
            .map(|(idx, value)| {
                let node = ConfigNode {
                    value,
                    path: path.index(idx),
                };
                if value.is_object() {
                    Ok(node)
                } else {
                    node.error(ConfigError::MissingOrNotAnObject)
                }
            })
            .collect()
    }

    /// Descends into the object at `key`.
    pub fn enter_config(&self, key: &str) -> ConfigResult<ConfigNode<'a>> {
        let value: &'a Value = self.value;
        match value.as_object().and_then(|o| o.get(key)) {
            Some(v) if v.is_object() => Ok(ConfigNode {
                value: v,
                path: self.key_path(key),
            }),
            _ => self.key_error(key, ConfigError::MissingOrNotAnObject),
        }
    }

    /// Descends into the first object of the list at `list_key` whose string
    /// field `id_field` equals `id_value`.
    pub fn enter_elem_by_id(
        &self,
        list_key: &str,
        id_field: &str,
        id_value: &str,
    ) -> ConfigResult<ConfigNode<'a>> {
        let list = match self.field(list_key)?.as_array() {
            Some(list) => list,
            None => return self.key_error(list_key, ConfigError::WrongType(ValueKind::List)),
        };

        let path = self.key_path(list_key);
        list.iter()
            .enumerate()
            .find(|(_, elem)| elem.get(id_field).and_then(|v| v.as_str()) == Some(id_value))
            .map(|(idx, value)| ConfigNode {
                value,
                path: path.index(idx),
            })
            .ok_or_else(|| {
                CompilerError::new(
                    path.clone(),
                    ConfigError::NotFound {
                        field: id_field.into(),
                        value: id_value.into(),
                    },
                )
            })
    }

    /// Reads a string which must be a valid identifier in the generated code.
    pub fn get_identifier(&self, key: &str) -> ConfigResult<&'a str> {
        self.get_identifier_with(key, |_| true)
    }

    /// Reads an identifier which must additionally pass `validate`.
    pub fn get_identifier_with<F>(&self, key: &str, validate: F) -> ConfigResult<&'a str>
    where
        F: Fn(&str) -> bool,
    {
        let val = self.get_string(key)?;
        if !pattern::is_identifier(val) {
            return self.key_error(key, ConfigError::FormatError("expected an identifier".into()));
        }
        if !validate(val) {
            return self.key_error(key, ConfigError::FormatError("custom validation failed".into()));
        }
        Ok(val)
    }

    /// Reads a single uppercase letter, used to name axes and heaters.
    pub fn get_id_char(&self, key: &str) -> ConfigResult<char> {
        let val = self.get_string(key)?;
        match pattern::as_id_char(val) {
            Some(c) => Ok(c),
            None => self.key_error(
                key,
                ConfigError::FormatError("expected a single uppercase letter".into()),
            ),
        }
    }

    pub fn get_int_constant(&self, key: &str) -> ConfigResult<String> {
        Ok(self.get_int(key)?.to_string())
    }

    pub fn get_bool_constant(&self, key: &str) -> ConfigResult<&'static str> {
        Ok(if self.get_bool(key)? { "true" } else { "false" })
    }

    pub fn get_float_constant(&self, key: &str) -> ConfigResult<String> {
        Ok(format_float(self.get_float(key)?))
    }

    /// Descends into the tagged object at `key` and dispatches on its
    /// discriminant.
    pub fn do_selection<C, T>(
        &self,
        key: &str,
        ctx: &mut C,
        selection: Selection<'_, 'a, C, T>,
    ) -> ConfigResult<T> {
        let node = self.enter_config(key)?;
        let tag = node.get_string(DISCRIMINANT_KEY)?;
        node.select(tag, ctx, selection)
    }

    /// Dispatches this node on a tag which has already been read.
    pub fn select<C, T>(
        &self,
        tag: &str,
        ctx: &mut C,
        selection: Selection<'_, 'a, C, T>,
    ) -> ConfigResult<T> {
        match selection.run(tag, ctx, self) {
            Ok(result) => Ok(result),
            Err(SelectionError::UnknownVariant(tag)) => self.error(ConfigError::UnknownChoice(tag)),
            Err(SelectionError::Handler(e)) => Err(e),
        }
    }

    /// Maps every object of the list at `key` through `cb` and collects the
    /// results into a type list.
    pub fn do_list<C, F>(
        &self,
        key: &str,
        min: usize,
        max: usize,
        ctx: &mut C,
        mut cb: F,
    ) -> ConfigResult<Expr>
    where
        F: FnMut(&mut C, &ConfigNode<'a>, usize) -> ConfigResult<Expr>,
    {
        let elems = self
            .iter_list_config(key, min, max)?
            .iter()
            .enumerate()
            .map(|(idx, elem)| cb(ctx, elem, idx))
            .collect::<ConfigResult<Vec<_>>>()?;
        Ok(Expr::list(elems))
    }

    /// Like [`ConfigNode::do_list`] but for elements stored as the fields
    /// `{prefix}0`, `{prefix}1`, ... of the object at `elems_key`, with the
    /// element count read from `count_key`.
    #[allow(clippy::too_many_arguments)]
    pub fn do_keyed_list<C, F>(
        &self,
        count_key: &str,
        elems_key: &str,
        prefix: &str,
        min: usize,
        max: usize,
        ctx: &mut C,
        mut cb: F,
    ) -> ConfigResult<Expr>
    where
        F: FnMut(&mut C, &ConfigNode<'a>, usize) -> ConfigResult<Expr>,
    {
        let count = self.get_int(count_key)?;
        if count < min as i64 || count > max as i64 {
            return self.key_error(
                count_key,
                ConfigError::CountOutOfRange {
                    count,
                    min,
                    max,
                },
            );
        }

        let elems_config = self.enter_config(elems_key)?;
        let mut elems = vec![];
        for idx in 0..count as usize {
            let elem = elems_config.enter_config(&format!("{}{}", prefix, idx))?;
            elems.push(cb(ctx, &elem, idx)?);
        }
        Ok(Expr::list(elems))
    }
}
