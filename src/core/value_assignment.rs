// This module implements the binding table the code generator uses to track where each IR
// name lives. Identifiers are scoped to the function that declares them, so `x` in one
// function and `x` in another never share a register; IR temporaries are numbered globally
// by the lowering pass and need no scope. A binding is either a physical register or a
// deferred immediate: a single-assignment temporary that was assigned a constant keeps the
// constant until some instruction needs it in a register, at which point the generator
// synthesizes a load. The table only ever grows during generation.

//! Name-to-location bindings for code generation.

use super::register_file::AsmReg;
use hashbrown::HashMap;

/// Key of an IR name in the binding table.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum BindingKey {
    /// Lowering temporary `t<N>`, unique across the compilation unit.
    Temporary(u32),
    /// Source identifier, scoped to its enclosing function.
    Local { func: String, name: String },
}

impl BindingKey {
    pub fn local(func: &str, name: &str) -> Self {
        BindingKey::Local {
            func: func.to_string(),
            name: name.to_string(),
        }
    }
}

/// Where the value of a bound name can be found.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Binding {
    Register(AsmReg),
    /// Constant not yet materialized into any register.
    Immediate(i32),
}

/// Monotonic table of bindings for one compilation.
#[derive(Debug, Default)]
pub struct ValueAssignmentManager {
    bindings: HashMap<BindingKey, Binding>,
}

impl ValueAssignmentManager {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, key: &BindingKey) -> Option<Binding> {
        self.bindings.get(key).copied()
    }

    /// Register currently holding `key`, if it is register-bound.
    pub fn register_of(&self, key: &BindingKey) -> Option<AsmReg> {
        match self.bindings.get(key) {
            Some(Binding::Register(reg)) => Some(*reg),
            _ => None,
        }
    }

    /// Bind `key`. A name that already holds a register keeps it; only an
    /// unbound name or a deferred immediate can take a new binding.
    pub fn bind(&mut self, key: BindingKey, binding: Binding) {
        match self.bindings.get(&key) {
            Some(Binding::Register(existing)) => {
                log::warn!("{:?} already bound to {}, keeping it", key, existing);
            }
            _ => {
                log::trace!("bind {:?} -> {:?}", key, binding);
                self.bindings.insert(key, binding);
            }
        }
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::register_file::RegPool;

    #[test]
    fn test_locals_are_scoped_by_function() {
        let mut mgr = ValueAssignmentManager::new();
        let s0 = AsmReg::new(RegPool::Saved, 0);
        mgr.bind(BindingKey::local("f", "x"), Binding::Register(s0));

        assert_eq!(mgr.register_of(&BindingKey::local("f", "x")), Some(s0));
        assert_eq!(mgr.get(&BindingKey::local("main", "x")), None);
    }

    #[test]
    fn test_register_binding_is_never_replaced() {
        let mut mgr = ValueAssignmentManager::new();
        let t0 = AsmReg::new(RegPool::Temporary, 0);
        let t1 = AsmReg::new(RegPool::Temporary, 1);

        mgr.bind(BindingKey::Temporary(4), Binding::Register(t0));
        mgr.bind(BindingKey::Temporary(4), Binding::Register(t1));
        assert_eq!(mgr.register_of(&BindingKey::Temporary(4)), Some(t0));
        assert_eq!(mgr.len(), 1);
    }

    #[test]
    fn test_deferred_immediate_can_be_upgraded() {
        let mut mgr = ValueAssignmentManager::new();
        let t2 = AsmReg::new(RegPool::Temporary, 2);

        mgr.bind(BindingKey::Temporary(0), Binding::Immediate(5));
        assert_eq!(mgr.get(&BindingKey::Temporary(0)), Some(Binding::Immediate(5)));
        assert_eq!(mgr.register_of(&BindingKey::Temporary(0)), None);

        mgr.bind(BindingKey::Temporary(0), Binding::Register(t2));
        assert_eq!(mgr.register_of(&BindingKey::Temporary(0)), Some(t2));
    }
}
