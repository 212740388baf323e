//! test - evaluate conditional expressions
//!
//! Usage: test EXPRESSION
//!        [ EXPRESSION ]
//!
//! Exits 0 (true), 1 (false) or 2 (malformed expression). There are no
//! flags: every token after the program name is expression content, so
//! `test --help` is a one-token string test and evaluates true.

use std::env;
use std::process;

use ferrobox_testexpr::eval::{eval_bracket, eval_test};
use ferrobox_testexpr::host::LocalFs;

fn main() {
    let args: Vec<String> = env::args().collect();

    // BusyBox-style: the bracket spelling is selected by the name the
    // binary was invoked under (install a `[` hard link or symlink).
    let bracket = args
        .first()
        .map(|name| name.rsplit('/').next().unwrap_or("").ends_with('['))
        .unwrap_or(false);

    let expr = if args.is_empty() { &args[..] } else { &args[1..] };
    let result = if bracket {
        eval_bracket(expr, &LocalFs)
    } else {
        eval_test(expr, &LocalFs)
    };

    if !result.stderr.is_empty() {
        eprint!("{}", result.stderr);
    }
    process::exit(result.exit_code);
}
