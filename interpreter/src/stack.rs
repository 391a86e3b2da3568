//! Native stack growth for the recursive evaluator and parser.
//!
//! Mython has no loops, so repetition is written as recursion and every method call nests
//! several evaluator frames. The stack is grown on demand instead of relying on the size of
//! whatever thread runs the interpreter.

// Grow once less than this much stack is left
const RED_ZONE: usize = 128 * 1024;

// Size of each newly allocated stack segment
const STACK_PER_RECURSION: usize = 1024 * 1024;

#[inline]
#[cfg(not(target_arch = "wasm32"))]
pub(crate) fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    stacker::maybe_grow(RED_ZONE, STACK_PER_RECURSION, f)
}

#[inline]
#[cfg(target_arch = "wasm32")]
pub(crate) fn ensure_sufficient_stack<R>(f: impl FnOnce() -> R) -> R {
    f()
}
