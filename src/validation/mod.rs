//! 校验模块：嵌套校验器共享同一个问题累加器。
//!
//! # Validation Module
//!
//! Validators report issues into an explicit [`ValidationContext`] that is
//! threaded through nested calls. The context tracks call depth, so statistics
//! accumulate across sub-validations and are reset only by starting a new
//! outermost validation.
//!
//! | Component | Description |
//! |-----------|-------------|
//! | [`Validator`] | Trait implemented by anything that can check itself |
//! | [`ValidationContext`] | Depth-tracked accumulator passed to validators |
//! | [`ValidationIssues`] | Collected issues with per-kind counts |
//! | [`IssueKind`] | Problem, glitch, quibble or warning |
//!
//! ```rust
//! use batchpipe::validation::{validate, ValidationContext, Validator};
//!
//! struct Port(u32);
//!
//! impl Validator for Port {
//!     fn on_validate(&self, ctx: &mut ValidationContext) {
//!         ctx.problem_if_not_in_range_inclusive(self.0 as i64, "port", 1, 65535);
//!     }
//! }
//!
//! assert!(validate(&Port(8080)).is_valid());
//! assert!(!validate(&Port(0)).is_valid());
//! ```

mod context;
mod issues;

pub use context::{ValidationContext, Validator};
pub use issues::{Issue, IssueKind, ValidationIssues};

/// Validates `validator` from a fresh context and returns everything it reported.
pub fn validate(validator: &dyn Validator) -> ValidationIssues {
    let mut ctx = ValidationContext::new();
    ctx.validate(validator);
    ctx.into_issues()
}
