/*!
Recursive‑descent parser for Quill
==================================

The parser pulls tokens from a [`Scanner`] one at a time and keeps a single
token of lookahead (`current`) plus the most recently consumed token
(`previous`).  The scanner cannot un‑read, so every decision is made from
`current` alone.

### Time & space

| Phase / function              | Cost | Rationale                                          |
|-------------------------------|-----:|----------------------------------------------------|
| `Parser::parse` main loop     | Θ(n) | Each token is pulled from the scanner once.        |
| Individual productions        | O(1) per token | No backtracking.                         |
| Error recovery `synchronize()`| O(k) | Discards tokens ≤ next statement boundary.         |

Call‑stack depth grows with syntactic nesting and is capped by [`MAX_NESTING`].

### Logging

`info!` marks the start and end of a parse, `debug!` traces descent into
declarations and statements and every recorded error.

--------------------------------------------------------------------------------
Grammar (EBNF)
--------------

```text
program        → declaration* EOF ;
declaration    → classDecl | funDecl | varDecl | statement ;
classDecl      → "class" IDENT "{" ( "fn" function | <skipped token> )* "}" ;
funDecl        → "fn" function ;
function       → IDENT "(" parameters? ")" "{" declaration* "}" ;
varDecl        → "let" IDENT ( "=" expression )? ";" ;
statement      → exprStmt | printStmt | whileStmt
               | ifStmt | block | returnStmt ;
exprStmt       → expression ";" ;
printStmt      → "print" expression ";" ;
returnStmt     → "return" expression? ";" ;
whileStmt      → "while" "(" expression ")" statement ;
ifStmt         → "if" "(" expression ")" statement
               ( "else" statement )? ;
block          → "{" declaration* "}" ;
parameters     → IDENT ( "," IDENT )* ;
expression     → assignment ;
assignment     → ( call "." )? IDENT "=" assignment | equality ;
equality       → comparison ( ( "!=" | "==" ) comparison )* ;
comparison     → term ( ( ">" | ">=" | "<" | "<=" ) term )* ;
term           → factor ( ( "-" | "+" ) factor )* ;
factor         → unary ( ( "/" | "*" ) unary )* ;
unary          → ( "!" | "-" ) unary | call ;
call           → primary ( "(" arguments? ")" | "." IDENT )* ;
arguments      → expression ( "," expression )* ;
primary        → NUMBER | STRING | "true" | "false" | "nil" | "this"
               | IDENT | "(" expression ")" ;
```

Errors inside one declaration are recorded, the parser re‑synchronises at the
next statement boundary and carries on, so a single run reports every
independent mistake.
*/

use std::mem;

use crate::ast::{ClassDecl, Expr, FunctionDecl, LiteralValue, Program, Stmt};
use crate::error::{LoxError, Result};
use crate::scanner::Scanner;
use crate::token::{Token, TokenType};

use log::{debug, info};

/// Upper bound on parameters and call arguments.
const MAX_ARITY: usize = 255;

/// How deeply statements, functions and expressions may nest before the
/// parser gives up with "Too much nesting." instead of exhausting the stack.
pub const MAX_NESTING: usize = 200;

/// Top‑level parser over a pull‑based token stream.
pub struct Parser<'a> {
    scanner: Scanner<'a>,
    current: Token,
    previous: Token,
    errors: Vec<LoxError>,
    /// Nested rules currently being parsed.
    depth: usize,
}

impl<'a> Parser<'a> {
    /// Construct a new parser and prime the one‑token lookahead.
    pub fn new(scanner: Scanner<'a>) -> Self {
        info!("Parser created");

        let placeholder = Token::new(TokenType::EOF, "", 1);
        let mut parser = Self {
            scanner,
            current: placeholder.clone(),
            previous: placeholder,
            errors: Vec::new(),
            depth: 0,
        };

        parser.current = parser.pull();

        parser
    }

    /// Parse the entire token stream.
    ///
    /// Every declaration is attempted even after an error.  If any lexical or
    /// syntax error was seen the collected errors are returned instead of the
    /// tree.
    pub fn parse(&mut self) -> std::result::Result<Program, Vec<LoxError>> {
        info!("Beginning parse phase");

        let mut declarations: Vec<Stmt> = Vec::new();

        while !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                declarations.push(stmt);
            }
        }

        if self.errors.is_empty() {
            info!("Parsed {} top-level declarations", declarations.len());

            Ok(Program::new(declarations))
        } else {
            info!("Parse finished with {} error(s)", self.errors.len());

            Err(mem::take(&mut self.errors))
        }
    }

    /// Parse one declaration, recording and recovering from any error.
    fn declaration(&mut self) -> Option<Stmt> {
        debug!("Entering declaration at {:?}", self.current.token_type);

        let result = if self.matches(TokenType::CLASS) {
            self.class_declaration()
        } else if self.matches(TokenType::FN) {
            self.nested(Self::function).map(Stmt::Function)
        } else if self.matches(TokenType::LET) {
            self.var_declaration()
        } else {
            self.statement()
        };

        match result {
            Ok(stmt) => Some(stmt),
            Err(e) => {
                debug!("Parse error: {}", e);
                self.errors.push(e);
                self.synchronize();
                None
            }
        }
    }

    fn class_declaration(&mut self) -> Result<Stmt> {
        let name: Token = self.consume(TokenType::IDENTIFIER, "Expect class name.")?;

        self.consume(TokenType::LEFT_BRACE, "Expect '{' before class body.")?;

        let mut methods: Vec<FunctionDecl> = Vec::new();

        while !self.check(TokenType::RIGHT_BRACE) && !self.is_at_end() {
            if self.matches(TokenType::FN) {
                methods.push(self.nested(Self::function)?);
            } else {
                // Only methods belong in a class body; anything else is dropped.
                debug!("Skipping {:?} inside class body", self.current.token_type);
                self.advance();
            }
        }

        self.consume(TokenType::RIGHT_BRACE, "Expect '}' after class body.")?;

        Ok(Stmt::Class(ClassDecl { name, methods }))
    }

    /// `IDENT "(" parameters? ")" block` – the `fn` keyword is already consumed.
    fn function(&mut self) -> Result<FunctionDecl> {
        let name: Token = self.consume(TokenType::IDENTIFIER, "Expect function name.")?;

        self.consume(TokenType::LEFT_PAREN, "Expect '(' after function name.")?;

        let mut params: Vec<Token> = Vec::new();

        if !self.check(TokenType::RIGHT_PAREN) {
            loop {
                if params.len() >= MAX_ARITY {
                    return Err(LoxError::parse(
                        self.current.line,
                        "Can't have more than 255 parameters.",
                    ));
                }

                params.push(self.consume(TokenType::IDENTIFIER, "Expect parameter name.")?);

                if !self.matches(TokenType::COMMA) {
                    break;
                }
            }
        }

        self.consume(TokenType::RIGHT_PAREN, "Expect ')' after parameters.")?;
        self.consume(TokenType::LEFT_BRACE, "Expect '{' before function body.")?;

        let body: Vec<Stmt> = self.block()?;

        Ok(FunctionDecl { name, params, body })
    }

    fn var_declaration(&mut self) -> Result<Stmt> {
        let name: Token = self.consume(TokenType::IDENTIFIER, "Expect variable name.")?;

        let initializer: Option<Expr> = if self.matches(TokenType::EQUAL) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(
            TokenType::SEMICOLON,
            "Expect ';' after variable declaration.",
        )?;

        Ok(Stmt::Var { name, initializer })
    }

    fn statement(&mut self) -> Result<Stmt> {
        self.nested(Self::statement_kind)
    }

    fn statement_kind(&mut self) -> Result<Stmt> {
        debug!("Entering statement at {:?}", self.current.token_type);

        if self.matches(TokenType::IF) {
            self.if_statement()
        } else if self.matches(TokenType::WHILE) {
            self.while_statement()
        } else if self.matches(TokenType::RETURN) {
            self.return_statement()
        } else if self.matches(TokenType::LEFT_BRACE) {
            Ok(Stmt::Block(self.block()?))
        } else if self.matches(TokenType::PRINT) {
            self.print_statement()
        } else {
            self.expression_statement()
        }
    }

    fn print_statement(&mut self) -> Result<Stmt> {
        let value: Expr = self.expression()?;

        self.consume(TokenType::SEMICOLON, "Expect ';' after value.")?;

        Ok(Stmt::Print(value))
    }

    fn expression_statement(&mut self) -> Result<Stmt> {
        let expr: Expr = self.expression()?;

        self.consume(TokenType::SEMICOLON, "Expect ';' after expression.")?;

        Ok(Stmt::Expression(expr))
    }

    fn if_statement(&mut self) -> Result<Stmt> {
        self.consume(TokenType::LEFT_PAREN, "Expect '(' after 'if'.")?;
        let condition: Expr = self.expression()?;
        self.consume(TokenType::RIGHT_PAREN, "Expect ')' after if condition.")?;

        // Greedy `else`: it binds to the innermost `if` still being parsed.
        let then_branch: Box<Stmt> = Box::new(self.statement()?);
        let else_branch: Option<Box<Stmt>> = if self.matches(TokenType::ELSE) {
            Some(Box::new(self.statement()?))
        } else {
            None
        };

        Ok(Stmt::If {
            condition,
            then_branch,
            else_branch,
        })
    }

    fn while_statement(&mut self) -> Result<Stmt> {
        self.consume(TokenType::LEFT_PAREN, "Expect '(' after 'while'.")?;
        let condition: Expr = self.expression()?;
        self.consume(TokenType::RIGHT_PAREN, "Expect ')' after condition.")?;
        let body: Box<Stmt> = Box::new(self.statement()?);

        Ok(Stmt::While { condition, body })
    }

    fn return_statement(&mut self) -> Result<Stmt> {
        let keyword: Token = self.previous.clone();

        let value: Option<Expr> = if !self.check(TokenType::SEMICOLON) {
            Some(self.expression()?)
        } else {
            None
        };

        self.consume(TokenType::SEMICOLON, "Expect ';' after return value.")?;

        Ok(Stmt::Return { keyword, value })
    }

    /// Declarations up to the matching `}`.  Errors inside the block are
    /// recorded by [`declaration`] and do not abandon the block.
    fn block(&mut self) -> Result<Vec<Stmt>> {
        let mut statements: Vec<Stmt> = Vec::new();

        while !self.check(TokenType::RIGHT_BRACE) && !self.is_at_end() {
            if let Some(stmt) = self.declaration() {
                statements.push(stmt);
            }
        }

        self.consume(TokenType::RIGHT_BRACE, "Expect '}' after block.")?;

        Ok(statements)
    }

    fn expression(&mut self) -> Result<Expr> {
        self.nested(Self::assignment)
    }

    /// Right‑associative: `a = b = c` is `a = (b = c)`.
    fn assignment(&mut self) -> Result<Expr> {
        let expr: Expr = self.equality()?;

        if self.matches(TokenType::EQUAL) {
            let equals: Token = self.previous.clone();
            let value: Expr = self.expression()?;

            return match expr {
                Expr::Variable(name) => Ok(Expr::Assign {
                    name,
                    value: Box::new(value),
                }),

                Expr::Get { object, name } => Ok(Expr::Set {
                    object,
                    name,
                    value: Box::new(value),
                }),

                _ => Err(LoxError::parse(equals.line, "Invalid assignment target.")),
            };
        }

        Ok(expr)
    }

    fn equality(&mut self) -> Result<Expr> {
        self.binary_level(
            &[TokenType::BANG_EQUAL, TokenType::EQUAL_EQUAL],
            Self::comparison,
        )
    }

    fn comparison(&mut self) -> Result<Expr> {
        self.binary_level(
            &[
                TokenType::GREATER,
                TokenType::GREATER_EQUAL,
                TokenType::LESS,
                TokenType::LESS_EQUAL,
            ],
            Self::term,
        )
    }

    fn term(&mut self) -> Result<Expr> {
        self.binary_level(&[TokenType::MINUS, TokenType::PLUS], Self::factor)
    }

    fn factor(&mut self) -> Result<Expr> {
        self.binary_level(&[TokenType::SLASH, TokenType::STAR], Self::unary)
    }

    /// One left‑associative precedence level: `operand ( op operand )*`.
    fn binary_level(
        &mut self,
        operators: &[TokenType],
        operand: fn(&mut Self) -> Result<Expr>,
    ) -> Result<Expr> {
        let mut expr: Expr = operand(self)?;

        while self.match_any(operators) {
            let operator: Token = self.previous.clone();
            let right: Expr = operand(self)?;

            expr = Expr::Binary {
                left: Box::new(expr),
                operator,
                right: Box::new(right),
            };
        }

        Ok(expr)
    }

    fn unary(&mut self) -> Result<Expr> {
        if self.matches(TokenType::BANG) || self.matches(TokenType::MINUS) {
            let operator: Token = self.previous.clone();
            let right: Expr = self.nested(Self::unary)?;

            return Ok(Expr::Unary {
                operator,
                right: Box::new(right),
            });
        }

        self.call()
    }

    fn call(&mut self) -> Result<Expr> {
        let mut expr: Expr = self.primary()?;

        loop {
            if self.matches(TokenType::LEFT_PAREN) {
                expr = self.finish_call(expr)?;
            } else if self.matches(TokenType::DOT) {
                let name: Token =
                    self.consume(TokenType::IDENTIFIER, "Expect property name after '.'.")?;

                expr = Expr::Get {
                    object: Box::new(expr),
                    name,
                };
            } else {
                break;
            }
        }

        Ok(expr)
    }

    fn finish_call(&mut self, callee: Expr) -> Result<Expr> {
        let mut arguments: Vec<Expr> = Vec::new();

        if !self.check(TokenType::RIGHT_PAREN) {
            loop {
                if arguments.len() >= MAX_ARITY {
                    return Err(LoxError::parse(
                        self.current.line,
                        "Can't have more than 255 arguments.",
                    ));
                }

                arguments.push(self.expression()?);

                if !self.matches(TokenType::COMMA) {
                    break;
                }
            }
        }

        let paren: Token = self.consume(TokenType::RIGHT_PAREN, "Expect ')' after arguments.")?;

        Ok(Expr::Call {
            callee: Box::new(callee),
            paren,
            arguments,
        })
    }

    fn primary(&mut self) -> Result<Expr> {
        let line: usize = self.current.line;

        let literal: Option<LiteralValue> = match &self.current.token_type {
            TokenType::FALSE => Some(LiteralValue::False),
            TokenType::TRUE => Some(LiteralValue::True),
            TokenType::NIL => Some(LiteralValue::Nil),
            TokenType::NUMBER(n) => Some(LiteralValue::Number(*n)),
            TokenType::STRING(s) => Some(LiteralValue::Str(s.clone())),
            _ => None,
        };

        if let Some(value) = literal {
            self.advance();

            return Ok(Expr::Literal { value, line });
        }

        if self.matches(TokenType::IDENTIFIER) {
            return Ok(Expr::Variable(self.previous.clone()));
        }

        if self.matches(TokenType::THIS) {
            return Ok(Expr::This(self.previous.clone()));
        }

        if self.matches(TokenType::LEFT_PAREN) {
            let expr: Expr = self.expression()?;

            self.consume(TokenType::RIGHT_PAREN, "Expect ')' after expression.")?;

            return Ok(Expr::Grouping(Box::new(expr)));
        }

        Err(self.error_at_current("Expect expression."))
    }

    /// Pull the next usable token.  `UNKNOWN` tokens are recorded as lexical
    /// errors and skipped so they do not cascade into syntax errors.
    fn pull(&mut self) -> Token {
        loop {
            match self.scanner.next() {
                Some(token) if token.is_unknown() => {
                    let message = if token.lexeme.is_empty() {
                        "Unterminated string.".to_string()
                    } else {
                        format!("Unexpected character: {}", token.lexeme)
                    };

                    self.errors.push(LoxError::lex(token.line, message));
                }

                Some(token) => return token,

                None => return Token::new(TokenType::EOF, "", self.scanner.line()),
            }
        }
    }

    #[inline(always)]
    fn matches(&mut self, ttype: TokenType) -> bool {
        if self.check(ttype) {
            self.advance();

            return true;
        }

        false
    }

    /// Run `rule` one level deeper, failing once [`MAX_NESTING`] is reached.
    fn nested<T>(&mut self, rule: fn(&mut Self) -> Result<T>) -> Result<T> {
        if self.depth >= MAX_NESTING {
            return Err(self.error_at_current("Too much nesting."));
        }

        self.depth += 1;
        let result = rule(self);
        self.depth -= 1;

        result
    }

    fn match_any(&mut self, kinds: &[TokenType]) -> bool {
        let hit = kinds.iter().any(|kind| self.check(kind.clone()));

        if hit {
            self.advance();
        }

        hit
    }

    #[inline(always)]
    fn consume(&mut self, ttype: TokenType, message: &str) -> Result<Token> {
        if self.check(ttype) {
            self.advance();

            return Ok(self.previous.clone());
        }

        Err(self.error_at_current(message))
    }

    #[inline(always)]
    fn check(&self, ttype: TokenType) -> bool {
        if self.is_at_end() {
            return false;
        }

        self.current.token_type == ttype
    }

    /// Shift the lookahead into `previous`.  A no‑op at EOF.
    #[inline(always)]
    fn advance(&mut self) {
        if !self.is_at_end() {
            let next: Token = self.pull();

            self.previous = mem::replace(&mut self.current, next);
        }
    }

    #[inline(always)]
    fn is_at_end(&self) -> bool {
        matches!(self.current.token_type, TokenType::EOF)
    }

    fn error_at_current(&self, message: &str) -> LoxError {
        let location = if self.is_at_end() {
            "at end".to_string()
        } else {
            format!("at '{}'", self.current.lexeme)
        };

        debug!("Syntax error {} on line {}", location, self.current.line);

        LoxError::parse(self.current.line, format!("{}: {}", location, message))
    }

    /// Discards tokens until it thinks it is at a statement boundary: just
    /// past a `;`, or in front of a keyword that starts a declaration or
    /// statement.
    fn synchronize(&mut self) {
        self.advance();

        while !self.is_at_end() {
            if matches!(self.previous.token_type, TokenType::SEMICOLON) {
                return;
            }

            match self.current.token_type {
                TokenType::CLASS
                | TokenType::FN
                | TokenType::LET
                | TokenType::IF
                | TokenType::WHILE
                | TokenType::PRINT
                | TokenType::RETURN => return,
                _ => {}
            }

            self.advance();
        }
    }
}
