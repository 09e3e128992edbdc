//! Renders a syntax tree as C++ source text for inspection and export.
//!
//! Top‑level functions and classes are hoisted above `main`; everything else
//! runs inside `main`.  Functions declared inside a body become lambdas.  The
//! output is never read back by the interpreter.

use log::{debug, info};

use crate::ast::{ClassDecl, Expr, FunctionDecl, LiteralValue, Program, Stmt};
use crate::value::format_number;

const INDENT: &str = "  ";

/// Translate `program` into C++.
pub fn translate(program: &Program) -> String {
    Translator::new().translate(program)
}

/// Stateful C++ emitter; see [`translate`].
#[derive(Debug, Default)]
pub struct Translator {
    out: String,
    depth: usize,
}

impl Translator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn translate(mut self, program: &Program) -> String {
        info!(
            "Translating {} declaration(s) to C++",
            program.declarations.len()
        );

        self.out.push_str("// Generated code\n");
        self.out.push_str("#include <iostream>\n");
        self.out.push_str("#include <string>\n\n");

        let (hoisted, body): (Vec<&Stmt>, Vec<&Stmt>) = program
            .declarations
            .iter()
            .partition(|stmt| matches!(stmt, Stmt::Function(_) | Stmt::Class(_)));

        for stmt in hoisted {
            match stmt {
                Stmt::Function(declaration) => self.emit_function(declaration),
                Stmt::Class(declaration) => self.emit_class(declaration),
                _ => {}
            }
        }

        self.out.push_str("int main() {\n");
        self.depth += 1;

        for stmt in body {
            self.emit_stmt(stmt);
        }

        self.line("return 0;");
        self.depth -= 1;
        self.out.push_str("}\n");

        self.out
    }

    // ───────────────────────────── declarations ─────────────────────────────

    fn emit_function(&mut self, declaration: &FunctionDecl) {
        debug!("Emitting function '{}'", declaration.name.lexeme);

        let header = format!(
            "auto {}({}) {{",
            declaration.name.lexeme,
            parameter_list(declaration)
        );

        self.line(&header);
        self.emit_body(&declaration.body);
        self.line("}");
        self.out.push('\n');
    }

    fn emit_class(&mut self, declaration: &ClassDecl) {
        debug!("Emitting class '{}'", declaration.name.lexeme);

        self.line(&format!("class {} {{", declaration.name.lexeme));
        self.line("public:");
        self.depth += 1;

        for method in &declaration.methods {
            self.emit_function(method);
        }

        self.depth -= 1;
        self.line("};");
        self.out.push('\n');
    }

    /// A function declared inside a body: a by‑reference capturing lambda.
    fn emit_lambda(&mut self, declaration: &FunctionDecl) {
        let header = format!(
            "auto {} = [&]({}) {{",
            declaration.name.lexeme,
            parameter_list(declaration)
        );

        self.line(&header);
        self.emit_body(&declaration.body);
        self.line("};");
    }

    // ────────────────────────────── statements ──────────────────────────────

    fn emit_body(&mut self, statements: &[Stmt]) {
        self.depth += 1;
        for stmt in statements {
            self.emit_stmt(stmt);
        }
        self.depth -= 1;
    }

    /// Branch or loop body, always braced.
    fn emit_braced(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Block(statements) => self.emit_body(statements),
            other => self.emit_body(std::slice::from_ref(other)),
        }
    }

    fn emit_stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Expression(expr) => {
                let text = format!("{};", self.expr(expr));
                self.line(&text);
            }

            Stmt::Print(expr) => {
                let text = format!("std::cout << {} << std::endl;", self.expr(expr));
                self.line(&text);
            }

            Stmt::Var { name, initializer } => {
                let value = match initializer {
                    Some(expr) => self.expr(expr),
                    None => "nullptr".to_string(),
                };
                self.line(&format!("auto {} = {};", name.lexeme, value));
            }

            Stmt::Block(statements) => {
                self.line("{");
                self.emit_body(statements);
                self.line("}");
            }

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => {
                let header = format!("if ({}) {{", self.expr(condition));
                self.line(&header);
                self.emit_braced(then_branch);

                if let Some(else_branch) = else_branch {
                    self.line("} else {");
                    self.emit_braced(else_branch);
                }

                self.line("}");
            }

            Stmt::While { condition, body } => {
                let header = format!("while ({}) {{", self.expr(condition));
                self.line(&header);
                self.emit_braced(body);
                self.line("}");
            }

            Stmt::Return { value, .. } => match value {
                Some(expr) => {
                    let text = format!("return {};", self.expr(expr));
                    self.line(&text);
                }
                None => self.line("return;"),
            },

            Stmt::Function(declaration) => self.emit_lambda(declaration),

            Stmt::Class(declaration) => self.emit_class(declaration),
        }
    }

    // ───────────────────────────── expressions ──────────────────────────────

    fn expr(&self, expr: &Expr) -> String {
        match expr {
            Expr::Literal { value, .. } => match value {
                LiteralValue::Number(n) => format_number(*n),
                LiteralValue::Str(s) => format!("std::string(\"{}\")", escape(s)),
                LiteralValue::True => "true".to_string(),
                LiteralValue::False => "false".to_string(),
                LiteralValue::Nil => "nullptr".to_string(),
            },

            Expr::Unary { operator, right } => format!("({}{})", operator.lexeme, self.expr(right)),

            Expr::Binary {
                left,
                operator,
                right,
            } => format!(
                "({} {} {})",
                self.expr(left),
                operator.lexeme,
                self.expr(right)
            ),

            // Binary output is already parenthesised.
            Expr::Grouping(inner) => self.expr(inner),

            Expr::Variable(name) => name.lexeme.clone(),

            Expr::Assign { name, value } => format!("{} = {}", name.lexeme, self.expr(value)),

            Expr::Call {
                callee, arguments, ..
            } => {
                let args: Vec<String> = arguments.iter().map(|arg| self.expr(arg)).collect();
                format!("{}({})", self.expr(callee), args.join(", "))
            }

            Expr::Get { object, name } => format!("{}{}", self.receiver(object), name.lexeme),

            Expr::Set {
                object,
                name,
                value,
            } => format!(
                "{}{} = {}",
                self.receiver(object),
                name.lexeme,
                self.expr(value)
            ),

            Expr::This(_) => "(*this)".to_string(),
        }
    }

    /// Member‑access prefix: `this->` for the receiver, `obj.` otherwise.
    fn receiver(&self, object: &Expr) -> String {
        match object {
            Expr::This(_) => "this->".to_string(),
            other => format!("{}.", self.expr(other)),
        }
    }

    fn line(&mut self, text: &str) {
        for _ in 0..self.depth {
            self.out.push_str(INDENT);
        }
        self.out.push_str(text);
        self.out.push('\n');
    }
}

fn parameter_list(declaration: &FunctionDecl) -> String {
    declaration
        .params
        .iter()
        .map(|param| format!("auto {}", param.lexeme))
        .collect::<Vec<_>>()
        .join(", ")
}

fn escape(text: &str) -> String {
    let mut out = String::with_capacity(text.len());

    for c in text.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            other => out.push(other),
        }
    }

    out
}
