//! Diagnostics for every stage of a Quill run.
//!
//! Positional problems found before execution (lexing, parsing, scope
//! checking) share one rendering, `[line N] Error: message`.  Failures while a
//! program runs are a separate typed enum, [`RuntimeError`], wrapped into
//! [`LoxError`] so that `?` works across the crate.  Nothing here prints;
//! callers decide where diagnostics go.

use std::io;
use thiserror::Error;

use log::info;

#[derive(Debug, Error)]
#[non_exhaustive]
pub enum LoxError {
    /// Stray character or unterminated string.
    #[error("[line {line}] Error: {message}")]
    Lex { message: String, line: usize },

    #[error("[line {line}] Error: {message}")]
    Parse { message: String, line: usize },

    /// Advisory; never stops evaluation.
    #[error("[line {line}] Error: {message}")]
    Scope { message: String, line: usize },

    #[error(transparent)]
    Runtime(#[from] RuntimeError),

    /// Writing `print` output failed.
    #[error(transparent)]
    Io(#[from] io::Error),

    #[error(transparent)]
    Utf8(#[from] std::string::FromUtf8Error),
}

impl LoxError {
    pub fn lex(line: usize, message: impl Into<String>) -> Self {
        let message = message.into();
        info!("Lex error on line {}: {}", line, message);
        LoxError::Lex { message, line }
    }

    pub fn parse(line: usize, message: impl Into<String>) -> Self {
        let message = message.into();
        info!("Syntax error on line {}: {}", line, message);
        LoxError::Parse { message, line }
    }

    pub fn scope(line: usize, message: impl Into<String>) -> Self {
        let message = message.into();
        info!("Scope diagnostic on line {}: {}", line, message);
        LoxError::Scope { message, line }
    }

    /// Source line of the error, when one is known.
    pub fn line(&self) -> Option<usize> {
        match self {
            LoxError::Lex { line, .. }
            | LoxError::Parse { line, .. }
            | LoxError::Scope { line, .. } => Some(*line),
            LoxError::Runtime(e) => Some(e.line()),
            LoxError::Io(_) | LoxError::Utf8(_) => None,
        }
    }
}

/// Failures raised while evaluating a program.  Each one aborts the current
/// `execute` call.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum RuntimeError {
    #[error("{message}\n[line {line}]")]
    TypeMismatch { message: String, line: usize },

    #[error("Division by zero.\n[line {line}]")]
    DivisionByZero { line: usize },

    #[error("Undefined variable '{name}'.\n[line {line}]")]
    UndefinedVariable { name: String, line: usize },

    #[error("Undefined property '{name}'.\n[line {line}]")]
    UndefinedProperty { name: String, line: usize },

    #[error("Expected {expected} arguments but got {got}.\n[line {line}]")]
    ArityMismatch {
        expected: usize,
        got: usize,
        line: usize,
    },

    #[error("Stack overflow.\n[line {line}]")]
    StackOverflow { line: usize },

    #[error("Can only call functions and classes.\n[line {line}]")]
    NotCallable { line: usize },

    #[error("Only instances have properties.\n[line {line}]")]
    NotAnInstance { line: usize },
}

impl RuntimeError {
    pub fn type_mismatch<S: Into<String>>(line: usize, msg: S) -> Self {
        RuntimeError::TypeMismatch {
            message: msg.into(),
            line,
        }
    }

    /// Line of the expression that failed.
    pub fn line(&self) -> usize {
        match self {
            RuntimeError::TypeMismatch { line, .. }
            | RuntimeError::DivisionByZero { line }
            | RuntimeError::UndefinedVariable { line, .. }
            | RuntimeError::UndefinedProperty { line, .. }
            | RuntimeError::ArityMismatch { line, .. }
            | RuntimeError::StackOverflow { line }
            | RuntimeError::NotCallable { line }
            | RuntimeError::NotAnInstance { line } => *line,
        }
    }
}

pub type Result<T> = std::result::Result<T, LoxError>;
