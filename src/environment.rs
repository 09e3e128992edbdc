use crate::error::RuntimeError;
use crate::value::Value;
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Shared handle to a scope.  Blocks, call frames and closures all hold one;
/// the scope lives as long as the longest holder.
pub type EnvRef<'p> = Rc<RefCell<Environment<'p>>>;

/// One lexical scope: its own bindings plus a link to the enclosing scope
/// (`None` for the global scope).
#[derive(Debug, Default)]
pub struct Environment<'p> {
    values: HashMap<String, Value<'p>>,
    enclosing: Option<EnvRef<'p>>,
}

impl<'p> Environment<'p> {
    pub fn new() -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: None,
        }
    }

    pub fn with_enclosing(enclosing: EnvRef<'p>) -> Self {
        Environment {
            values: HashMap::new(),
            enclosing: Some(enclosing),
        }
    }

    /// Wrap a fresh scope chained to `enclosing` in a shared handle.
    pub fn child_of(enclosing: &EnvRef<'p>) -> EnvRef<'p> {
        Rc::new(RefCell::new(Self::with_enclosing(Rc::clone(enclosing))))
    }

    /// Create or overwrite a binding in *this* scope.
    pub fn define(&mut self, name: &str, value: Value<'p>) {
        self.values.insert(name.to_string(), value);
    }

    /// Innermost binding of `name`, searching outward to the global scope.
    pub fn get(&self, name: &str, line: usize) -> Result<Value<'p>, RuntimeError> {
        if let Some(value) = self.values.get(name) {
            Ok(value.clone())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow().get(name, line)
        } else {
            Err(RuntimeError::UndefinedVariable {
                name: name.to_string(),
                line,
            })
        }
    }

    /// Overwrite the innermost existing binding of `name`.  Never creates one.
    pub fn assign(
        &mut self,
        name: &str,
        value: Value<'p>,
        line: usize,
    ) -> Result<(), RuntimeError> {
        if let Some(slot) = self.values.get_mut(name) {
            *slot = value;
            Ok(())
        } else if let Some(enclosing) = &self.enclosing {
            enclosing.borrow_mut().assign(name, value, line)
        } else {
            Err(RuntimeError::UndefinedVariable {
                name: name.to_string(),
                line,
            })
        }
    }
}
