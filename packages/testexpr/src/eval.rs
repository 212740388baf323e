//! Conditional-expression evaluation for `test` / `[`.
//!
//! An argument vector has no type information: a token that spells an
//! operator is an operator only in operator position. Dispatch therefore
//! goes by slice length first and token content second, so `test -f` is a
//! one-token string test, not a file test.

use serde::{Deserialize, Serialize};
use std::slice;

use crate::host::{AccessMode, FsProbe};

// ---------------------------------------------------------------------------
// Public types
// ---------------------------------------------------------------------------

/// Result of one invocation: the uniform contract every command in the
/// collection exposes. `stdout` is always empty for this utility; `stderr`
/// carries the one-line diagnostic on a malformed expression.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunResult {
    pub exit_code: i32,
    pub stdout: String,
    pub stderr: String,
}

impl RunResult {
    fn status(value: bool) -> Self {
        Self {
            exit_code: if value { 0 } else { 1 },
            stdout: String::new(),
            stderr: String::new(),
        }
    }

    fn usage_error(name: &str, err: &TestError) -> Self {
        Self {
            exit_code: 2,
            stdout: String::new(),
            stderr: format!("{name}: {err}\n"),
        }
    }
}

/// Parse failures. Distinct from an expression that evaluates to false:
/// these map to exit status 2.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TestError {
    UnknownUnaryOperator(String),
    UnknownOperator(String),
    TooManyArguments,
    MissingBracket,
}

impl std::fmt::Display for TestError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::UnknownUnaryOperator(op) => write!(f, "unknown unary operator: {op}"),
            Self::UnknownOperator(op) => write!(f, "unknown operator: {op}"),
            Self::TooManyArguments => write!(f, "too many arguments"),
            Self::MissingBracket => write!(f, "missing ']'"),
        }
    }
}

// ---------------------------------------------------------------------------
// Entry points
// ---------------------------------------------------------------------------

/// `test EXPR...`: `args` holds every token after the program name.
pub fn eval_test(args: &[String], probe: &dyn FsProbe) -> RunResult {
    finish("test", eval_expr(args, probe))
}

/// `[ EXPR... ]`: same grammar, but the final token must be literal `]`.
pub fn eval_bracket(args: &[String], probe: &dyn FsProbe) -> RunResult {
    match args.last().map(String::as_str) {
        Some("]") => finish("[", eval_expr(&args[..args.len() - 1], probe)),
        _ => RunResult::usage_error("[", &TestError::MissingBracket),
    }
}

fn finish(name: &str, outcome: Result<bool, TestError>) -> RunResult {
    match outcome {
        Ok(value) => RunResult::status(value),
        Err(e) => RunResult::usage_error(name, &e),
    }
}

// ---------------------------------------------------------------------------
// Arity dispatcher
// ---------------------------------------------------------------------------

/// Evaluate a token slice. Pure and reentrant; the only I/O is read-only
/// probes issued by the unary file predicates.
pub fn eval_expr(tokens: &[String], probe: &dyn FsProbe) -> Result<bool, TestError> {
    match tokens {
        // Empty expression is false.
        [] => Ok(false),

        // One token: non-emptiness, even when the token spells an operator.
        [word] => Ok(!word.is_empty()),

        // Leading `!` negates the evaluation of the remaining slice; every
        // length applies this rule first.
        [bang, rest @ ..] if bang.as_str() == "!" => Ok(!eval_expr(rest, probe)?),

        // Two tokens: a unary operator and its operand.
        [op, operand] => match UnaryOp::from_token(op) {
            Some(unary) => Ok(unary.apply(operand, probe)),
            None => Err(TestError::UnknownUnaryOperator(op.clone())),
        },

        // Three tokens: connective between two words, binary operator, or
        // the unary fallback, in that order.
        [lhs, mid, rhs] => match mid.as_str() {
            "-a" => {
                let left = eval_expr(slice::from_ref(lhs), probe)?;
                let right = eval_expr(slice::from_ref(rhs), probe)?;
                Ok(left && right)
            }
            "-o" => {
                let left = eval_expr(slice::from_ref(lhs), probe)?;
                let right = eval_expr(slice::from_ref(rhs), probe)?;
                Ok(left || right)
            }
            _ => match BinaryOp::from_token(mid) {
                Some(binary) => Ok(binary.apply(lhs, rhs)),
                // Unknown token in operator position: last chance is a
                // unary operator at [0] applied to [1].
                None => match UnaryOp::from_token(lhs) {
                    Some(unary) => Ok(unary.apply(mid, probe)),
                    None => Err(TestError::UnknownOperator(lhs.clone())),
                },
            },
        },

        // Four or more: split at the leftmost connective. Each side is an
        // independent sub-expression; an empty side is the empty expression.
        _ => match tokens.iter().position(|t| matches!(t.as_str(), "-a" | "-o")) {
            Some(i) => {
                let left = eval_expr(&tokens[..i], probe)?;
                let right = eval_expr(&tokens[i + 1..], probe)?;
                if tokens[i].as_str() == "-a" {
                    Ok(left && right)
                } else {
                    Ok(left || right)
                }
            }
            None => Err(TestError::TooManyArguments),
        },
    }
}

// ---------------------------------------------------------------------------
// Unary predicate table
// ---------------------------------------------------------------------------

/// One variant per table row, so each predicate is testable in isolation.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnaryOp {
    /// `-z`: operand is the empty string
    ZeroLength,
    /// `-n`: operand is non-empty
    NonZeroLength,
    /// `-e`: path exists
    Exists,
    /// `-f`: path is a regular file
    IsFile,
    /// `-d`: path is a directory
    IsDir,
    /// `-r`: readable by the effective user
    Readable,
    /// `-w`: writable by the effective user
    Writable,
    /// `-x`: executable by the effective user
    Executable,
    /// `-s`: path exists with size > 0
    NonEmptyFile,
    /// `-L` / `-h`: path is a symbolic link
    IsSymlink,
}

impl UnaryOp {
    pub fn from_token(tok: &str) -> Option<Self> {
        match tok {
            "-z" => Some(Self::ZeroLength),
            "-n" => Some(Self::NonZeroLength),
            "-e" => Some(Self::Exists),
            "-f" => Some(Self::IsFile),
            "-d" => Some(Self::IsDir),
            "-r" => Some(Self::Readable),
            "-w" => Some(Self::Writable),
            "-x" => Some(Self::Executable),
            "-s" => Some(Self::NonEmptyFile),
            "-L" | "-h" => Some(Self::IsSymlink),
            _ => None,
        }
    }

    /// Apply the predicate to its operand. A probe fault counts as a
    /// negative answer, never as an evaluation error.
    pub fn apply(self, operand: &str, probe: &dyn FsProbe) -> bool {
        match self {
            Self::ZeroLength => operand.is_empty(),
            Self::NonZeroLength => !operand.is_empty(),
            Self::Exists => probe.stat(operand).map(|s| s.exists).unwrap_or(false),
            Self::IsFile => probe
                .stat(operand)
                .map(|s| s.exists && s.is_file)
                .unwrap_or(false),
            Self::IsDir => probe
                .stat(operand)
                .map(|s| s.exists && s.is_dir)
                .unwrap_or(false),
            Self::Readable => probe.access(operand, AccessMode::Read),
            Self::Writable => probe.access(operand, AccessMode::Write),
            Self::Executable => probe.access(operand, AccessMode::Execute),
            Self::NonEmptyFile => probe
                .stat(operand)
                .map(|s| s.exists && s.size > 0)
                .unwrap_or(false),
            // Must not follow the link: a dangling symlink still satisfies -L.
            Self::IsSymlink => probe.lstat(operand).map(|s| s.is_symlink).unwrap_or(false),
        }
    }
}

// ---------------------------------------------------------------------------
// Binary operator table
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BinaryOp {
    /// `=` / `==`: byte-for-byte string equality
    StrEq,
    /// `!=`: string inequality
    StrNe,
    /// `<`: byte-wise lexicographic less-than
    StrLt,
    /// `>`: byte-wise lexicographic greater-than
    StrGt,
    IntEq,
    IntNe,
    IntGt,
    IntGe,
    IntLt,
    IntLe,
}

impl BinaryOp {
    pub fn from_token(tok: &str) -> Option<Self> {
        match tok {
            "=" | "==" => Some(Self::StrEq),
            "!=" => Some(Self::StrNe),
            "<" => Some(Self::StrLt),
            ">" => Some(Self::StrGt),
            "-eq" => Some(Self::IntEq),
            "-ne" => Some(Self::IntNe),
            "-gt" => Some(Self::IntGt),
            "-ge" => Some(Self::IntGe),
            "-lt" => Some(Self::IntLt),
            "-le" => Some(Self::IntLe),
            _ => None,
        }
    }

    pub fn apply(self, lhs: &str, rhs: &str) -> bool {
        match self {
            Self::StrEq => lhs == rhs,
            Self::StrNe => lhs != rhs,
            Self::StrLt => lhs < rhs,
            Self::StrGt => lhs > rhs,
            Self::IntEq => to_int(lhs) == to_int(rhs),
            Self::IntNe => to_int(lhs) != to_int(rhs),
            Self::IntGt => to_int(lhs) > to_int(rhs),
            Self::IntGe => to_int(lhs) >= to_int(rhs),
            Self::IntLt => to_int(lhs) < to_int(rhs),
            Self::IntLe => to_int(lhs) <= to_int(rhs),
        }
    }
}

/// Lenient base-10 parse: a non-numeric operand counts as 0, uniformly
/// across the whole integer table.
fn to_int(s: &str) -> i64 {
    s.parse::<i64>().unwrap_or(0)
}

// ---------------------------------------------------------------------------
// Tests
// ---------------------------------------------------------------------------
