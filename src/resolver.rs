//! Static scope checker for **Quill** programs.
//!
//! One read‑only walk over the tree that mirrors the evaluator's scoping:
//! a global scope, a scope per block, a scope per function (parameters and
//! body share it) and a scope per class body with `this` pre‑defined.
//!
//! It reports, without stopping:
//! 1. reads of and assignments to names not visible at that point,
//! 2. assignments to constants (functions and classes),
//! 3. duplicate definitions within one scope,
//! 4. `return` at top level and `this` outside a class.
//!
//! Diagnostics are advisory; nothing here changes the tree or blocks
//! evaluation.

use crate::ast::{ClassDecl, Expr, FunctionDecl, Program, Stmt};
use crate::error::LoxError;
use crate::token::Token;
use crate::value::RECEIVER;
use log::{debug, info};
use std::collections::HashMap;

/// What introduced a name.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum SymbolKind {
    Variable,
    Parameter,
    Function,
    Class,
    Receiver,
}

impl SymbolKind {
    /// Functions and classes cannot be reassigned.
    fn is_const(self) -> bool {
        matches!(
            self,
            SymbolKind::Function | SymbolKind::Class | SymbolKind::Receiver
        )
    }

    fn label(self) -> &'static str {
        match self {
            SymbolKind::Variable => "Variable",
            SymbolKind::Parameter => "Parameter",
            SymbolKind::Function => "Function",
            SymbolKind::Class => "Class",
            SymbolKind::Receiver => "Receiver",
        }
    }
}

/// Are we inside a user function?  Used to validate `return`.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
enum FunctionType {
    None,
    Function,
    Method,
}

/// Scope checker: tracks scopes and collects diagnostics.
pub struct Resolver {
    scopes: Vec<HashMap<String, SymbolKind>>,
    current_function: FunctionType,
    in_class: bool,
    diagnostics: Vec<LoxError>,
}

impl Default for Resolver {
    fn default() -> Self {
        Self::new()
    }
}

impl Resolver {
    /// Create a checker holding only the (empty) global scope.
    pub fn new() -> Self {
        info!("Resolver instantiated");

        Resolver {
            scopes: vec![HashMap::new()],
            current_function: FunctionType::None,
            in_class: false,
            diagnostics: Vec::new(),
        }
    }

    /// Walk all top‑level declarations and return every diagnostic found.
    pub fn check(mut self, program: &Program) -> Vec<LoxError> {
        info!(
            "Beginning scope check over {} declaration(s)",
            program.declarations.len()
        );

        for stmt in &program.declarations {
            self.resolve_stmt(stmt);
        }

        info!("Scope check found {} issue(s)", self.diagnostics.len());

        self.diagnostics
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Statement resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Expression(expr) | Stmt::Print(expr) => self.resolve_expr(expr),

            Stmt::Var { name, initializer } => {
                // Initializer first: `let x = x;` reads the outer `x`.
                if let Some(expr) = initializer {
                    self.resolve_expr(expr);
                }
                self.define(name, SymbolKind::Variable);
            }

            Stmt::Block(statements) => {
                self.begin_scope();
                for s in statements {
                    self.resolve_stmt(s);
                }
                self.end_scope();
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                self.resolve_expr(condition);
                self.resolve_stmt(then_branch);
                if let Some(eb) = else_branch.as_deref() {
                    self.resolve_stmt(eb);
                }
            }

            Stmt::While { condition, body } => {
                self.resolve_expr(condition);
                self.resolve_stmt(body);
            }

            Stmt::Return { keyword, value } => {
                if self.current_function == FunctionType::None {
                    self.report(keyword.line, "Cannot return from top-level code.");
                }
                if let Some(expr) = value {
                    self.resolve_expr(expr);
                }
            }

            Stmt::Function(declaration) => {
                // The name is visible inside its own body.
                self.define(&declaration.name, SymbolKind::Function);
                self.resolve_function(declaration, FunctionType::Function);
            }

            Stmt::Class(declaration) => self.resolve_class(declaration),
        }
    }

    fn resolve_class(&mut self, declaration: &ClassDecl) {
        self.define(&declaration.name, SymbolKind::Class);

        let enclosing_class = self.in_class;
        self.in_class = true;

        self.begin_scope();
        self.insert(RECEIVER, SymbolKind::Receiver);

        // Method names live here only to catch duplicates.  At run time a bare
        // `m()` inside a method does not find them; only `this.m()` does.
        for method in &declaration.methods {
            self.define(&method.name, SymbolKind::Function);
            self.resolve_function(method, FunctionType::Method);
        }

        self.end_scope();

        self.in_class = enclosing_class;
    }

    /// Parameters and body share one fresh scope.
    fn resolve_function(&mut self, declaration: &FunctionDecl, kind: FunctionType) {
        let enclosing = self.current_function;
        self.current_function = kind;

        self.begin_scope();
        for param in &declaration.params {
            self.define(param, SymbolKind::Parameter);
        }
        for stmt in &declaration.body {
            self.resolve_stmt(stmt);
        }
        self.end_scope();

        self.current_function = enclosing;
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Expression resolution
    // ─────────────────────────────────────────────────────────────────────────

    fn resolve_expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Literal { .. } => {}

            Expr::Grouping(inner) => self.resolve_expr(inner),

            Expr::Unary { right, .. } => self.resolve_expr(right),

            Expr::Binary { left, right, .. } => {
                self.resolve_expr(left);
                self.resolve_expr(right);
            }

            Expr::Variable(name) => {
                if self.lookup(&name.lexeme).is_none() {
                    self.report(name.line, format!("Undefined variable '{}'.", name.lexeme));
                }
            }

            Expr::Assign { name, value } => {
                self.resolve_expr(value);

                match self.lookup(&name.lexeme) {
                    None => {
                        self.report(name.line, format!("Undefined variable '{}'.", name.lexeme))
                    }
                    Some(kind) if kind.is_const() => self.report(
                        name.line,
                        format!("Cannot assign to constant '{}'.", name.lexeme),
                    ),
                    Some(_) => {}
                }
            }

            Expr::Call {
                callee, arguments, ..
            } => {
                self.resolve_expr(callee);
                for arg in arguments {
                    self.resolve_expr(arg);
                }
            }

            Expr::Get { object, .. } => self.resolve_expr(object),

            Expr::Set { object, value, .. } => {
                self.resolve_expr(object);
                self.resolve_expr(value);
            }

            Expr::This(keyword) => {
                if !self.in_class {
                    self.report(keyword.line, "Cannot use 'this' outside of a class.");
                }
            }
        }
    }

    // ─────────────────────────────────────────────────────────────────────────
    // Scope management
    // ─────────────────────────────────────────────────────────────────────────

    #[inline]
    fn begin_scope(&mut self) {
        self.scopes.push(HashMap::new());
    }

    #[inline]
    fn end_scope(&mut self) {
        self.scopes.pop();
    }

    /// Add `name` to the innermost scope, reporting a duplicate.
    fn define(&mut self, name: &Token, kind: SymbolKind) {
        let duplicate = self
            .scopes
            .last()
            .is_some_and(|scope| scope.contains_key(&name.lexeme));

        if duplicate {
            self.report(
                name.line,
                format!(
                    "{} '{}' is already defined in this scope.",
                    kind.label(),
                    name.lexeme
                ),
            );
            return;
        }

        self.insert(&name.lexeme, kind);
    }

    fn insert(&mut self, name: &str, kind: SymbolKind) {
        let depth = self.scopes.len().saturating_sub(1);

        if let Some(scope) = self.scopes.last_mut() {
            debug!("Defined {:?} '{}' at depth {}", kind, name, depth);
            scope.insert(name.to_string(), kind);
        }
    }

    /// Innermost → outermost.
    fn lookup(&self, name: &str) -> Option<SymbolKind> {
        self.scopes
            .iter()
            .rev()
            .find_map(|scope| scope.get(name).copied())
    }

    fn report<S: Into<String>>(&mut self, line: usize, message: S) {
        self.diagnostics.push(LoxError::scope(line, message));
    }
}
