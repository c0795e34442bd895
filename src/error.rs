//! Error types for tessera-core

use crate::term::FunctionSym;
use thiserror::Error;

/// Main error type for tessera-core operations
#[derive(Error, Debug, Clone, PartialEq)]
pub enum Error {
    /// Wrong argument count for a predicate, function or reducer
    #[error("arity mismatch for {symbol}: expected {expected}, got {actual}")]
    ArityMismatch {
        /// The offending symbol
        symbol: String,
        /// Expected arity (or registered variadic arity rendered as -1)
        expected: i16,
        /// Actual number of arguments supplied
        actual: usize,
    },

    /// A constant of the wrong kind was passed to an operator requiring a specific shape
    #[error("type mismatch in {context}: {message}")]
    TypeMismatch {
        /// Where the mismatch was detected (symbol or operation name)
        context: String,
        /// Human-readable detail
        message: String,
    },

    /// Division by zero
    #[error("division by zero in {0}")]
    DivisionByZero(String),

    /// `fn:list:get` index out of bounds
    #[error("index {index} out of bounds for list of length {len}")]
    IndexOutOfBounds {
        /// Index that was requested
        index: i64,
        /// Actual length of the list
        len: usize,
    },

    /// `fn:map:get` / `fn:struct:get` missing key
    #[error("key not found: {0}")]
    KeyNotFound(String),

    /// Two distinct constants could not be unified
    #[error("unification failure: {left} != {right}")]
    UnificationFailure {
        /// Left-hand constant, rendered
        left: String,
        /// Right-hand constant, rendered
        right: String,
    },

    /// Predicate or function symbol is not registered
    #[error("unknown symbol: {0}")]
    UnknownSymbol(String),

    /// A ground atom matched no bound row of its predicate's declaration
    #[error("type check failed for {predicate}: {reasons:?}")]
    TypeCheckFailure {
        /// Predicate whose declaration was checked against
        predicate: String,
        /// Per-row failure diagnostics, one per bound row that rejected the fact
        reasons: Vec<String>,
    },

    /// A dependency cycle was found while desugaring predicate name-bounds
    #[error("cyclic dependency: {}", .path.join(" -> "))]
    CyclicDependency {
        /// The cycle, in traversal order, repeating the first predicate at the end
        path: Vec<String>,
    },

    /// A type expression failed well-formedness checking
    #[error("malformed type: {0}")]
    MalformedType(String),

    /// A bounded recursive walk exceeded its configured depth limit
    #[error("recursion limit of {limit} exceeded while evaluating {context}")]
    RecursionLimitExceeded {
        /// The configured limit that was hit
        limit: usize,
        /// What kind of walk hit it (eval_expr, has_type, type_conforms, ...)
        context: String,
    },
}

impl Error {
    /// Construct an [`Error::ArityMismatch`] for a function/predicate symbol.
    pub fn arity(symbol: &FunctionSym, actual: usize) -> Self {
        Error::ArityMismatch {
            symbol: symbol.symbol.to_string(),
            expected: symbol.arity,
            actual,
        }
    }
}

/// Result type alias for tessera-core operations
pub type Result<T> = std::result::Result<T, Error>;
