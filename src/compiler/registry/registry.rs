use std::collections::BTreeMap;

use log::{debug, info};

use crate::compiler::{
    config::ConfigNode,
    error::{ConfigError, ConfigResult},
};

use super::{
    kind::{Singleton, SingletonSlot},
    Emitter, ObjectKind, SlotMap,
};

/// Maximum number of objects a board may declare in one list.
pub const MAX_OBJECTS_PER_LIST: usize = 20;

/// Field holding the name of a declared object.
const OBJECT_NAME_KEY: &str = "Name";

type FinalizeAction<'doc> = Box<dyn FnOnce(&mut Registry<'doc>) -> ConfigResult<()> + 'doc>;

/// Where a [`Registry`] is in its lifecycle. A registry which has finished
/// finalizing has been consumed and no longer exists.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Phase {
    Collecting,
    Finalizing,
}

/**
The mutable state of one compilation.

The registry owns the named-object pools, the singleton slots, the
[`Emitter`] and the queue of deferred finalize actions. It is created fresh
for every compilation and passed explicitly to every handler.

During collection handlers register objects and singletons, emit items and
enqueue finalize actions for work which can only be done once the whole
document has been read. [`Registry::finalize`] then consumes the registry and
produces the [`SlotMap`].
 */
pub struct Registry<'doc> {
    phase: Phase,
    objects: BTreeMap<ObjectKind, BTreeMap<String, ConfigNode<'doc>>>,
    singletons: Vec<Box<dyn SingletonSlot>>,
    finalize_actions: Vec<FinalizeAction<'doc>>,
    emitter: Emitter,
}

impl<'doc> Registry<'doc> {
    pub fn new() -> Registry<'doc> {
        Registry {
            phase: Phase::Collecting,
            objects: BTreeMap::new(),
            singletons: vec![],
            finalize_actions: vec![],
            emitter: Emitter::new(),
        }
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    /// The accumulators which handlers emit into. Emission is allowed in
    /// both phases.
    pub fn emit(&mut self) -> &mut Emitter {
        &mut self.emitter
    }

    fn assert_collecting(&self, op: &str) {
        assert!(
            self.phase == Phase::Collecting,
            "{} called while {:?}",
            op,
            self.phase
        );
    }

    /// Adds every node to the pool of `kind` under the name in its `Name`
    /// field.
    pub fn register_objects(&mut self, kind: ObjectKind, nodes: Vec<ConfigNode<'doc>>) -> ConfigResult<()> {
        self.assert_collecting("register_objects");
        let pool = self.objects.entry(kind).or_default();
        for node in nodes {
            let name = node.get_string(OBJECT_NAME_KEY)?;
            if pool.contains_key(name) {
                return node.error(ConfigError::DuplicateName(kind.to_string()));
            }
            debug!("Registered {} {}", kind, name);
            pool.insert(name.into(), node);
        }
        Ok(())
    }

    /// Registers the objects listed at `key` of `node`.
    pub fn register_object_list(
        &mut self,
        kind: ObjectKind,
        node: &ConfigNode<'doc>,
        key: &str,
    ) -> ConfigResult<()> {
        let nodes = node.iter_list_config(key, 0, MAX_OBJECTS_PER_LIST)?;
        self.register_objects(kind, nodes)
    }

    /// Resolves the reference stored at `key` of `referencing` to the
    /// declared object it names.
    pub fn get_object(
        &self,
        kind: ObjectKind,
        referencing: &ConfigNode<'_>,
        key: &str,
    ) -> ConfigResult<ConfigNode<'doc>> {
        let name = referencing.get_string(key)?;
        match self.objects.get(&kind).and_then(|pool| pool.get(name)) {
            Some(node) => Ok(node.clone()),
            None => referencing.key_error(key, ConfigError::UnknownReference(kind, name.into())),
        }
    }

    /// Stores `value` in its singleton slot and returns it.
    ///
    /// Panics if the slot is already set.
    pub fn register_singleton<T: Singleton>(&mut self, value: T) -> &mut T {
        self.assert_collecting("register_singleton");
        assert!(
            !self.singletons.iter().any(|s| s.kind() == T::KIND),
            "Singleton {} registered twice",
            T::KIND
        );
        debug!("Registered singleton {}", T::KIND);
        self.singletons.push(Box::new(value));
        match self
            .singletons
            .last_mut()
            .and_then(|s| s.as_any_mut().downcast_mut::<T>())
        {
            Some(s) => s,
            None => panic!("Singleton {} lost after registration", T::KIND),
        }
    }

    /// Panics if the slot is not set.
    pub fn singleton<T: Singleton>(&self) -> &T {
        match self
            .singletons
            .iter()
            .find(|s| s.kind() == T::KIND)
            .and_then(|s| s.as_any().downcast_ref::<T>())
        {
            Some(s) => s,
            None => panic!("Singleton {} used before it was registered", T::KIND),
        }
    }

    /// Panics if the slot is not set.
    pub fn singleton_mut<T: Singleton>(&mut self) -> &mut T {
        match self
            .singletons
            .iter_mut()
            .find(|s| s.kind() == T::KIND)
            .and_then(|s| s.as_any_mut().downcast_mut::<T>())
        {
            Some(s) => s,
            None => panic!("Singleton {} used before it was registered", T::KIND),
        }
    }

    /// Defers `action` until the whole document has been read.
    pub fn add_finalize_action<F>(&mut self, action: F)
    where
        F: FnOnce(&mut Registry<'doc>) -> ConfigResult<()> + 'doc,
    {
        self.assert_collecting("add_finalize_action");
        self.finalize_actions.push(Box::new(action));
    }

    /**
    Ends the compilation and renders every template slot.

    Finalization runs in three steps:

    1. The finalize actions run in reverse order of registration, so an
    action registered early sees the effects of every action registered
    after it.
    2. The finalize hook of every singleton runs, in the order the
    singletons were registered.
    3. Every accumulator is rendered into its slot.

    Finalize actions and hooks may emit items but may not register objects,
    singletons or further finalize actions.
     */
    pub fn finalize(mut self) -> ConfigResult<SlotMap> {
        self.phase = Phase::Finalizing;

        let actions = std::mem::take(&mut self.finalize_actions);
        info!("Running {} finalize actions", actions.len());
        for action in actions.into_iter().rev() {
            action(&mut self)?;
        }

        let mut singletons = std::mem::take(&mut self.singletons);
        for singleton in singletons.iter_mut() {
            debug!("Finalizing singleton {}", singleton.kind());
            singleton.finalize_slot(&mut self.emitter)?;
        }

        Ok(self.emitter.render())
    }
}

impl<'doc> Default for Registry<'doc> {
    fn default() -> Self {
        Registry::new()
    }
}
