use crate::ast::{ClassDecl, Expr, FunctionDecl, LiteralValue, Program, Stmt};
use crate::value::format_number;

/// Renders a syntax tree as parenthesised prefix text, e.g. `(+ 1 (* 2 3))`.
pub struct AstPrinter;

impl AstPrinter {
    /// One line per top‑level declaration.
    pub fn print_program(&self, program: &Program) -> String {
        program
            .declarations
            .iter()
            .map(|stmt| self.print_stmt(stmt))
            .collect::<Vec<_>>()
            .join("\n")
    }

    pub fn print_stmt(&self, stmt: &Stmt) -> String {
        match stmt {
            Stmt::Expression(expr) => format!("(expr {})", self.print(expr)),

            Stmt::Print(expr) => format!("(print {})", self.print(expr)),

            Stmt::Var { name, initializer } => match initializer {
                Some(expr) => format!("(let {} {})", name.lexeme, self.print(expr)),
                None => format!("(let {})", name.lexeme),
            },

            Stmt::Block(statements) => self.parenthesize_stmts("block", statements),

            Stmt::If {
                condition,
                then_branch,
                else_branch,
            } => match else_branch {
                Some(else_branch) => format!(
                    "(if {} {} {})",
                    self.print(condition),
                    self.print_stmt(then_branch),
                    self.print_stmt(else_branch)
                ),
                None => format!(
                    "(if {} {})",
                    self.print(condition),
                    self.print_stmt(then_branch)
                ),
            },

            Stmt::While { condition, body } => {
                format!("(while {} {})", self.print(condition), self.print_stmt(body))
            }

            Stmt::Return { value, .. } => match value {
                Some(expr) => format!("(return {})", self.print(expr)),
                None => "(return)".to_string(),
            },

            Stmt::Function(declaration) => self.print_function(declaration),

            Stmt::Class(declaration) => self.print_class(declaration),
        }
    }

    fn print_function(&self, declaration: &FunctionDecl) -> String {
        let params: Vec<&str> = declaration
            .params
            .iter()
            .map(|p| p.lexeme.as_str())
            .collect();

        let mut out = format!("(fn {} ({})", declaration.name.lexeme, params.join(" "));

        for stmt in &declaration.body {
            out.push(' ');
            out.push_str(&self.print_stmt(stmt));
        }

        out.push(')');
        out
    }

    fn print_class(&self, declaration: &ClassDecl) -> String {
        let mut out = format!("(class {}", declaration.name.lexeme);

        for method in &declaration.methods {
            out.push(' ');
            out.push_str(&self.print_function(method));
        }

        out.push(')');
        out
    }

    fn parenthesize_stmts(&self, head: &str, statements: &[Stmt]) -> String {
        let mut out = format!("({}", head);

        for stmt in statements {
            out.push(' ');
            out.push_str(&self.print_stmt(stmt));
        }

        out.push(')');
        out
    }

    pub fn print(&self, expr: &Expr) -> String {
        match expr {
            Expr::Binary {
                left,
                operator,
                right,
            } => format!(
                "({} {} {})",
                operator.lexeme,
                self.print(left),
                self.print(right)
            ),

            Expr::Unary { operator, right } => {
                format!("({} {})", operator.lexeme, self.print(right))
            }

            Expr::Literal { value, .. } => match value {
                LiteralValue::Number(n) => format_number(*n),

                LiteralValue::Str(s) => format!("\"{}\"", s),

                LiteralValue::True => "true".to_string(),

                LiteralValue::False => "false".to_string(),

                LiteralValue::Nil => "nil".to_string(),
            },

            Expr::Grouping(expr) => format!("(group {})", self.print(expr)),

            Expr::Variable(token) => token.lexeme.clone(),

            Expr::Assign { name, value } => format!("(= {} {})", name.lexeme, self.print(value)),

            Expr::Call {
                callee, arguments, ..
            } => {
                let mut out = format!("(call {}", self.print(callee));

                for arg in arguments {
                    out.push(' ');
                    out.push_str(&self.print(arg));
                }

                out.push(')');
                out
            }

            Expr::Get { object, name } => format!("(. {} {})", self.print(object), name.lexeme),

            Expr::Set {
                object,
                name,
                value,
            } => format!(
                "(.= {} {} {})",
                self.print(object),
                name.lexeme,
                self.print(value)
            ),

            Expr::This(_) => "this".to_string(),
        }
    }
}
