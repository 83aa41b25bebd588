use crate::builtin::{BuiltinCommand, Cd, Echo, Exit, Pwd, Type};
use crate::command::{CommandFactory, ExecutableCommand};
use std::collections::BTreeMap;

/// Factory allows creating instances of a builtin command.
pub(crate) struct Factory<T> {
    _phantom: std::marker::PhantomData<T>,
}

impl<T> Default for Factory<T> {
    fn default() -> Self {
        Self {
            _phantom: std::marker::PhantomData,
        }
    }
}

impl<T: BuiltinCommand + 'static> CommandFactory for Factory<T> {
    fn name(&self) -> &'static str {
        T::name()
    }

    fn create(&self, args: &[String]) -> Box<dyn ExecutableCommand> {
        Box::new(T::from_args(args))
    }
}

/// Immutable table of the builtins known to the shell.
///
/// Built once at startup and handed to the interpreter. Lookups are by exact name.
pub struct BuiltinTable {
    factories: BTreeMap<&'static str, Box<dyn CommandFactory>>,
}

impl BuiltinTable {
    /// Create a table from a custom set of factories.
    ///
    /// A later factory with the same name replaces an earlier one.
    pub fn new(factories: Vec<Box<dyn CommandFactory>>) -> Self {
        Self {
            factories: factories.into_iter().map(|f| (f.name(), f)).collect(),
        }
    }

    /// Find the factory for a builtin by name.
    pub fn resolve(&self, name: &str) -> Option<&dyn CommandFactory> {
        self.factories.get(name).map(|f| &**f)
    }

    /// Whether `name` refers to a builtin.
    pub fn is_builtin(&self, name: &str) -> bool {
        self.factories.contains_key(name)
    }

    /// Names of all builtins in sorted order.
    pub fn names(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.factories.keys().copied()
    }
}

impl Default for BuiltinTable {
    /// The standard builtins: `exit`, `cd`, `pwd`, `echo` and `type`.
    fn default() -> Self {
        Self::new(vec![
            Box::new(Factory::<Exit>::default()),
            Box::new(Factory::<Cd>::default()),
            Box::new(Factory::<Pwd>::default()),
            Box::new(Factory::<Echo>::default()),
            Box::new(Factory::<Type>::default()),
        ])
    }
}
