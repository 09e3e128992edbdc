//! Runtime values and the object model: functions, classes and instances.
//!
//! `'p` is the lifetime of the [`Program`](crate::ast::Program) being run.
//! Function values point straight at their declaration inside that tree
//! instead of copying it.

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

use crate::ast::FunctionDecl;
use crate::environment::{EnvRef, Environment};

/// Name the receiver is bound to inside methods.
pub const RECEIVER: &str = "this";

/// Name of the method run by a class call.
pub const INITIALIZER: &str = "init";

#[derive(Clone)]
pub enum Value<'p> {
    Nil,
    Bool(bool),
    Number(f64),
    String(String),
    Function(Rc<Function<'p>>),
    Class(Rc<Class<'p>>),
    Instance(Rc<RefCell<Instance<'p>>>),
}

impl<'p> Value<'p> {
    /// `nil` and `false` are falsy, everything else is truthy.
    pub fn is_truthy(&self) -> bool {
        !matches!(self, Value::Nil | Value::Bool(false))
    }

    /// Tag name used in type‑mismatch messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Nil => "nil",
            Value::Bool(_) => "boolean",
            Value::Number(_) => "number",
            Value::String(_) => "string",
            Value::Function(_) => "function",
            Value::Class(_) => "class",
            Value::Instance(_) => "instance",
        }
    }
}

impl<'p> PartialEq for Value<'p> {
    /// Scalars compare by value, objects by identity.
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Bool(a), Value::Bool(b)) => a == b,
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Class(a), Value::Class(b)) => Rc::ptr_eq(a, b),
            (Value::Instance(a), Value::Instance(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}

impl<'p> fmt::Display for Value<'p> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => write!(f, "nil"),

            Value::Bool(b) => write!(f, "{}", b),

            Value::Number(n) => write!(f, "{}", format_number(*n)),

            Value::String(s) => write!(f, "{}", s),

            Value::Function(func) => write!(f, "<fn {}>", func.name()),

            Value::Class(class) => write!(f, "<class {}>", class.name),

            Value::Instance(instance) => {
                write!(f, "<instance of {}>", instance.borrow().class.name)
            }
        }
    }
}

impl<'p> fmt::Debug for Value<'p> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::String(s) => write!(f, "{:?}", s),
            other => write!(f, "{}", other),
        }
    }
}

/// Shortest decimal form: `3` not `3.0`, `2.5` not `2.50`, `-0` keeps its sign.
pub fn format_number(n: f64) -> String {
    if n.fract() == 0.0 && n.abs() < 1e15 {
        let mut buf: itoa::Buffer = itoa::Buffer::new();
        let digits: &str = buf.format(n as i64);

        // `-0.0 as i64` is plain 0
        if n == 0.0 && n.is_sign_negative() {
            format!("-{}", digits)
        } else {
            digits.to_string()
        }
    } else {
        n.to_string()
    }
}

/// A user function: its declaration plus the scope it closes over.
pub struct Function<'p> {
    pub declaration: &'p FunctionDecl,
    pub closure: EnvRef<'p>,
}

impl<'p> Function<'p> {
    pub fn new(declaration: &'p FunctionDecl, closure: EnvRef<'p>) -> Self {
        Self {
            declaration,
            closure,
        }
    }

    pub fn name(&self) -> &str {
        &self.declaration.name.lexeme
    }

    pub fn arity(&self) -> usize {
        self.declaration.arity()
    }

    /// Copy of this method whose scope additionally binds `this` to
    /// `instance`.
    pub fn bind(&self, instance: Rc<RefCell<Instance<'p>>>) -> Function<'p> {
        let scope: EnvRef<'p> = Environment::child_of(&self.closure);

        scope
            .borrow_mut()
            .define(RECEIVER, Value::Instance(instance));

        Function::new(self.declaration, scope)
    }
}

impl<'p> fmt::Debug for Function<'p> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Function")
            .field("name", &self.name())
            .field("arity", &self.arity())
            .finish()
    }
}

/// A class value.  Immutable once created.
pub struct Class<'p> {
    pub name: String,
    pub methods: HashMap<String, Rc<Function<'p>>>,
}

impl<'p> Class<'p> {
    pub fn new(name: String, methods: HashMap<String, Rc<Function<'p>>>) -> Self {
        Self { name, methods }
    }

    pub fn find_method(&self, name: &str) -> Option<&Rc<Function<'p>>> {
        self.methods.get(name)
    }

    /// Constructor arity: that of `init`, or zero without one.
    pub fn arity(&self) -> usize {
        self.find_method(INITIALIZER).map_or(0, |init| init.arity())
    }
}

impl<'p> fmt::Debug for Class<'p> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut methods: Vec<&String> = self.methods.keys().collect();
        methods.sort();

        f.debug_struct("Class")
            .field("name", &self.name)
            .field("methods", &methods)
            .finish()
    }
}

/// An object created by calling a class.  Fields are per instance; the class
/// is shared.
pub struct Instance<'p> {
    pub class: Rc<Class<'p>>,
    fields: HashMap<String, Value<'p>>,
}

impl<'p> Instance<'p> {
    pub fn new(class: Rc<Class<'p>>) -> Self {
        Self {
            class,
            fields: HashMap::new(),
        }
    }

    pub fn field(&self, name: &str) -> Option<Value<'p>> {
        self.fields.get(name).cloned()
    }

    pub fn set_field(&mut self, name: &str, value: Value<'p>) {
        self.fields.insert(name.to_string(), value);
    }
}

impl<'p> fmt::Debug for Instance<'p> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let mut fields: Vec<&String> = self.fields.keys().collect();
        fields.sort();

        f.debug_struct("Instance")
            .field("class", &self.class.name)
            .field("fields", &fields)
            .finish()
    }
}
