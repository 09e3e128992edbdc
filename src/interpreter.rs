//! Tree‑walking evaluator.
//!
//! The interpreter keeps a single "current environment" handle.  Entering a
//! block or a call swaps a new scope in and swapping back happens on every
//! exit path, including runtime errors, so the scope chain is always the one
//! that was active before the block started.
//!
//! `return` is not an error: statement execution yields a [`Flow`] that tells
//! the enclosing call whether the body finished normally or handed back a
//! value.

use std::cell::RefCell;
use std::collections::HashMap;
use std::io::{self, Stdout, Write};
use std::mem;
use std::rc::Rc;

use log::{debug, info};

use crate::ast::{ClassDecl, Expr, FunctionDecl, LiteralValue, Program, Stmt};
use crate::environment::{EnvRef, Environment};
use crate::error::{Result, RuntimeError};
use crate::token::{Token, TokenType};
use crate::value::{Class, Function, Instance, Value, INITIALIZER, RECEIVER};

/// Nested calls allowed before a run is aborted with
/// [`RuntimeError::StackOverflow`].
pub const MAX_CALL_DEPTH: usize = 200;

/// How a statement finished.
#[derive(Debug, Clone, PartialEq)]
pub enum Flow<'p> {
    /// Fell off the end; continue with the next statement.
    Normal,

    /// A `return` ran; unwind to the nearest call.
    Return(Value<'p>),
}

/// Evaluates a [`Program`], writing `print` output to `W`.
///
/// # Example
///
/// ```
/// use quill::interpreter::Interpreter;
/// use quill::parser::Parser;
/// use quill::scanner::Scanner;
///
/// let program = Parser::new(Scanner::new("print 2 + 3 * 4;"))
///     .parse()
///     .expect("valid program");
///
/// let mut interpreter = Interpreter::with_output(Vec::new());
/// interpreter.execute(&program)?;
///
/// assert_eq!(interpreter.output(), b"14\n");
/// # Ok::<(), quill::error::LoxError>(())
/// ```
pub struct Interpreter<'p, W: Write> {
    environment: EnvRef<'p>,
    output: W,
    /// Calls currently on the stack.
    depth: usize,
}

impl<'p> Interpreter<'p, Stdout> {
    /// Interpreter that prints to standard output.
    pub fn new() -> Self {
        Self::with_output(io::stdout())
    }
}

impl<'p> Default for Interpreter<'p, Stdout> {
    fn default() -> Self {
        Self::new()
    }
}

impl<'p, W: Write> Interpreter<'p, W> {
    pub fn with_output(output: W) -> Self {
        info!("Initializing Interpreter");

        Self {
            environment: Rc::new(RefCell::new(Environment::new())),
            output,
            depth: 0,
        }
    }

    /// Sink that received the `print` output so far.
    pub fn output(&self) -> &W {
        &self.output
    }

    pub fn into_output(self) -> W {
        self.output
    }

    /// Run every top‑level declaration in order against a fresh global scope.
    ///
    /// The first runtime error stops the run and is returned; output printed
    /// before it stays printed.
    pub fn execute(&mut self, program: &'p Program) -> Result<()> {
        info!(
            "Executing program with {} declaration(s)",
            program.declarations.len()
        );

        self.environment = Rc::new(RefCell::new(Environment::new()));
        self.depth = 0;

        let result: Result<()> = self.run_top_level(&program.declarations);

        self.output.flush()?;

        match &result {
            Ok(()) => info!("Program executed successfully"),
            Err(e) => debug!("Program aborted: {}", e),
        }

        result
    }

    fn run_top_level(&mut self, declarations: &'p [Stmt]) -> Result<()> {
        for stmt in declarations {
            if let Flow::Return(value) = self.execute_stmt(stmt)? {
                info!("Top-level return with {}; stopping", value);
                break;
            }
        }

        Ok(())
    }

    // ───────────────────────────── statements ─────────────────────────────

    /// Executes a single statement.
    pub fn execute_stmt(&mut self, stmt: &'p Stmt) -> Result<Flow<'p>> {
        match stmt {
            Stmt::Expression(expr) => {
                debug!("Evaluating expression statement");
                self.evaluate(expr)?;
                Ok(Flow::Normal)
            }

            Stmt::Print(expr) => {
                let value = self.evaluate(expr)?;
                writeln!(self.output, "{}", value)?;
                debug!("Printed value: {}", value);
                Ok(Flow::Normal)
            }

            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                debug!("Defining variable '{}' = {}", name.lexeme, value);
                self.environment.borrow_mut().define(&name.lexeme, value);
                Ok(Flow::Normal)
            }

            Stmt::Block(statements) => {
                debug!("Entering block with {} statements", statements.len());
                let scope = Environment::child_of(&self.environment);
                let flow = self.execute_block(statements, scope);
                debug!("Exited block");
                flow
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                if self.evaluate(condition)?.is_truthy() {
                    debug!("Condition is truthy; executing then branch");
                    self.execute_stmt(then_branch)
                } else if let Some(else_stmt) = else_branch {
                    debug!("Condition is falsy; executing else branch");
                    self.execute_stmt(else_stmt)
                } else {
                    Ok(Flow::Normal)
                }
            }

            Stmt::While { condition, body } => {
                debug!("Entering while loop");
                while self.evaluate(condition)?.is_truthy() {
                    if let Flow::Return(value) = self.execute_stmt(body)? {
                        return Ok(Flow::Return(value));
                    }
                }
                debug!("Exited while loop");
                Ok(Flow::Normal)
            }

            Stmt::Return { value, .. } => {
                let value = match value {
                    Some(expr) => self.evaluate(expr)?,
                    None => Value::Nil,
                };
                debug!("Returning value: {}", value);
                Ok(Flow::Return(value))
            }

            Stmt::Function(declaration) => {
                self.define_function(declaration);
                Ok(Flow::Normal)
            }

            Stmt::Class(declaration) => {
                self.define_class(declaration);
                Ok(Flow::Normal)
            }
        }
    }

    /// Run `statements` with `scope` as the current environment, restoring
    /// the previous environment afterwards whatever the outcome.
    fn execute_block(
        &mut self,
        statements: &'p [Stmt],
        scope: EnvRef<'p>,
    ) -> Result<Flow<'p>> {
        let previous: EnvRef<'p> = mem::replace(&mut self.environment, scope);

        let result = self.run_statements(statements);

        self.environment = previous;

        result
    }

    fn run_statements(&mut self, statements: &'p [Stmt]) -> Result<Flow<'p>> {
        for stmt in statements {
            if let Flow::Return(value) = self.execute_stmt(stmt)? {
                return Ok(Flow::Return(value));
            }
        }

        Ok(Flow::Normal)
    }

    fn define_function(&mut self, declaration: &'p FunctionDecl) {
        debug!(
            "Defining function '{}' with {} parameters",
            declaration.name.lexeme,
            declaration.arity()
        );

        // Capture the current environment as the closure.
        let function = Function::new(declaration, Rc::clone(&self.environment));

        self.environment
            .borrow_mut()
            .define(&declaration.name.lexeme, Value::Function(Rc::new(function)));
    }

    fn define_class(&mut self, declaration: &'p ClassDecl) {
        debug!(
            "Defining class '{}' with {} methods",
            declaration.name.lexeme,
            declaration.methods.len()
        );

        let methods: HashMap<String, Rc<Function<'p>>> = declaration
            .methods
            .iter()
            .map(|method| {
                let function = Function::new(method, Rc::clone(&self.environment));
                (method.name.lexeme.clone(), Rc::new(function))
            })
            .collect();

        let class = Class::new(declaration.name.lexeme.clone(), methods);

        self.environment
            .borrow_mut()
            .define(&declaration.name.lexeme, Value::Class(Rc::new(class)));
    }

    // ──────────────────────────── expressions ─────────────────────────────

    /// Evaluates an expression and returns a Value.
    pub fn evaluate(&mut self, expr: &Expr) -> Result<Value<'p>> {
        let value = match expr {
            Expr::Literal { value, .. } => literal_value(value),

            Expr::Grouping(inner) => self.evaluate(inner)?,

            Expr::Unary { operator, right } => self.evaluate_unary(operator, right)?,

            Expr::Binary {
                left,
                operator,
                right,
            } => self.evaluate_binary(left, operator, right)?,

            Expr::Variable(name) => self.environment.borrow().get(&name.lexeme, name.line)?,

            Expr::This(keyword) => self.environment.borrow().get(RECEIVER, keyword.line)?,

            Expr::Assign { name, value } => {
                let value = self.evaluate(value)?;
                self.environment
                    .borrow_mut()
                    .assign(&name.lexeme, value.clone(), name.line)?;
                debug!("Assigned {} to '{}'", value, name.lexeme);
                value
            }

            Expr::Call {
                callee,
                paren,
                arguments,
            } => {
                let callee = self.evaluate(callee)?;

                let mut args: Vec<Value<'p>> = Vec::with_capacity(arguments.len());
                for arg in arguments {
                    args.push(self.evaluate(arg)?);
                }

                self.call_value(callee, args, paren.line)?
            }

            Expr::Get { object, name } => {
                let instance = self.instance_of(object, name.line)?;
                self.get_property(&instance, name)?
            }

            Expr::Set {
                object,
                name,
                value,
            } => {
                let instance = self.instance_of(object, name.line)?;
                let value = self.evaluate(value)?;
                debug!("Setting field '{}' = {}", name.lexeme, value);
                instance.borrow_mut().set_field(&name.lexeme, value.clone());
                value
            }
        };

        Ok(value)
    }

    fn evaluate_unary(&mut self, operator: &Token, right: &Expr) -> Result<Value<'p>> {
        let right = self.evaluate(right)?;

        match operator.token_type {
            TokenType::MINUS => match right {
                Value::Number(n) => Ok(Value::Number(-n)),
                _ => {
                    Err(RuntimeError::type_mismatch(operator.line, "Operand must be a number.").into())
                }
            },

            TokenType::BANG => Ok(Value::Bool(!right.is_truthy())),

            _ => Err(RuntimeError::type_mismatch(
                operator.line,
                format!("Invalid unary operator '{}'.", operator.lexeme),
            )
            .into()),
        }
    }

    fn evaluate_binary(
        &mut self,
        left: &Expr,
        operator: &Token,
        right: &Expr,
    ) -> Result<Value<'p>> {
        let left = self.evaluate(left)?;
        let right = self.evaluate(right)?;

        debug!("Binary '{}' on {} and {}", operator.lexeme, left, right);

        let line = operator.line;

        let value = match operator.token_type {
            TokenType::PLUS => match (left, right) {
                (Value::Number(a), Value::Number(b)) => Value::Number(a + b),
                (Value::String(a), Value::String(b)) => Value::String(a + &b),
                _ => {
                    return Err(RuntimeError::type_mismatch(
                        line,
                        "Operands must be two numbers or two strings.",
                    )
                    .into());
                }
            },

            TokenType::MINUS => {
                let (a, b) = number_operands(line, &left, &right)?;
                Value::Number(a - b)
            }

            TokenType::STAR => {
                let (a, b) = number_operands(line, &left, &right)?;
                Value::Number(a * b)
            }

            TokenType::SLASH => {
                let (a, b) = number_operands(line, &left, &right)?;
                if b == 0.0 {
                    return Err(RuntimeError::DivisionByZero { line }.into());
                }
                Value::Number(a / b)
            }

            TokenType::GREATER => {
                let (a, b) = number_operands(line, &left, &right)?;
                Value::Bool(a > b)
            }

            TokenType::GREATER_EQUAL => {
                let (a, b) = number_operands(line, &left, &right)?;
                Value::Bool(a >= b)
            }

            TokenType::LESS => {
                let (a, b) = number_operands(line, &left, &right)?;
                Value::Bool(a < b)
            }

            TokenType::LESS_EQUAL => {
                let (a, b) = number_operands(line, &left, &right)?;
                Value::Bool(a <= b)
            }

            TokenType::EQUAL_EQUAL => Value::Bool(left == right),

            TokenType::BANG_EQUAL => Value::Bool(left != right),

            _ => {
                return Err(RuntimeError::type_mismatch(
                    line,
                    format!("Invalid binary operator '{}'.", operator.lexeme),
                )
                .into());
            }
        };

        Ok(value)
    }

    /// Evaluate `object` and insist that it is an instance.
    fn instance_of(
        &mut self,
        object: &Expr,
        line: usize,
    ) -> Result<Rc<RefCell<Instance<'p>>>> {
        match self.evaluate(object)? {
            Value::Instance(instance) => Ok(instance),
            _ => Err(RuntimeError::NotAnInstance { line }.into()),
        }
    }

    /// Fields shadow methods; a method comes back bound to the instance.
    fn get_property(
        &self,
        instance: &Rc<RefCell<Instance<'p>>>,
        name: &Token,
    ) -> Result<Value<'p>> {
        if let Some(value) = instance.borrow().field(&name.lexeme) {
            return Ok(value);
        }

        let method: Option<Rc<Function<'p>>> = instance
            .borrow()
            .class
            .find_method(&name.lexeme)
            .cloned();

        match method {
            Some(method) => {
                debug!("Binding method '{}'", name.lexeme);
                let bound = method.bind(Rc::clone(instance));
                Ok(Value::Function(Rc::new(bound)))
            }

            None => Err(RuntimeError::UndefinedProperty {
                name: name.lexeme.clone(),
                line: name.line,
            }
            .into()),
        }
    }

    // ─────────────────────────────── calls ────────────────────────────────

    fn call_value(
        &mut self,
        callee: Value<'p>,
        args: Vec<Value<'p>>,
        line: usize,
    ) -> Result<Value<'p>> {
        match callee {
            Value::Function(function) => self.call_function(&function, args, line),

            Value::Class(class) => self.construct(class, args, line),

            other => {
                debug!("Attempted to call a {}", other.type_name());
                Err(RuntimeError::NotCallable { line }.into())
            }
        }
    }

    fn call_function(
        &mut self,
        function: &Function<'p>,
        args: Vec<Value<'p>>,
        line: usize,
    ) -> Result<Value<'p>> {
        debug!("Calling function '{}'", function.name());

        if args.len() != function.arity() {
            return Err(RuntimeError::ArityMismatch {
                expected: function.arity(),
                got: args.len(),
                line,
            }
            .into());
        }

        if self.depth >= MAX_CALL_DEPTH {
            debug!("Call depth limit {} reached", MAX_CALL_DEPTH);
            return Err(RuntimeError::StackOverflow { line }.into());
        }

        let declaration: &'p FunctionDecl = function.declaration;

        // Chain to the closure, not the caller.
        let scope: EnvRef<'p> = Environment::child_of(&function.closure);
        {
            let mut frame = scope.borrow_mut();
            for (param, arg) in declaration.params.iter().zip(args) {
                frame.define(&param.lexeme, arg);
            }
        }

        self.depth += 1;
        let result = self.execute_block(&declaration.body, scope);
        self.depth -= 1;

        let value = match result? {
            Flow::Return(value) => value,
            Flow::Normal => Value::Nil,
        };

        debug!("Function '{}' returned: {}", function.name(), value);

        Ok(value)
    }

    /// Calling a class allocates an instance and runs `init` on it.  The
    /// result is always the instance.
    fn construct(
        &mut self,
        class: Rc<Class<'p>>,
        args: Vec<Value<'p>>,
        line: usize,
    ) -> Result<Value<'p>> {
        debug!("Constructing instance of '{}'", class.name);

        if args.len() != class.arity() {
            return Err(RuntimeError::ArityMismatch {
                expected: class.arity(),
                got: args.len(),
                line,
            }
            .into());
        }

        let instance = Rc::new(RefCell::new(Instance::new(Rc::clone(&class))));

        if let Some(init) = class.find_method(INITIALIZER) {
            let bound = init.bind(Rc::clone(&instance));
            self.call_function(&bound, args, line)?;
        }

        Ok(Value::Instance(instance))
    }
}

fn literal_value<'p>(literal: &LiteralValue) -> Value<'p> {
    match literal {
        LiteralValue::Number(n) => Value::Number(*n),
        LiteralValue::Str(s) => Value::String(s.clone()),
        LiteralValue::True => Value::Bool(true),
        LiteralValue::False => Value::Bool(false),
        LiteralValue::Nil => Value::Nil,
    }
}

fn number_operands(
    line: usize,
    left: &Value<'_>,
    right: &Value<'_>,
) -> std::result::Result<(f64, f64), RuntimeError> {
    match (left, right) {
        (Value::Number(a), Value::Number(b)) => Ok((*a, *b)),
        _ => Err(RuntimeError::type_mismatch(
            line,
            format!(
                "Operands must be numbers, got {} and {}.",
                left.type_name(),
                right.type_name()
            ),
        )),
    }
}
