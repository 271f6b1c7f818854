//! Depth-tracked issue accumulator.

use super::issues::{Issue, IssueKind, ValidationIssues};
use tracing::info;

/// Something that can check itself and report issues into a [`ValidationContext`].
pub trait Validator {
    /// Report issues for this target. Nested validators are run with
    /// [`ValidationContext::validate`].
    fn on_validate(&self, ctx: &mut ValidationContext);

    /// Name used in the validation report.
    fn validation_target(&self) -> &str {
        "object"
    }

    /// Whether the outermost validation logs a summary line.
    fn should_show_validation_report(&self) -> bool {
        false
    }
}

/// Accumulates issues across nested validators.
///
/// Issues are only reset when a new context is created, i.e. at the outermost
/// entry ([`validate`](crate::validation::validate)). Nested calls see and add
/// to the same list, and each level reports whether *it* introduced new
/// problems or glitches.
#[derive(Debug, Default)]
pub struct ValidationContext {
    issues: ValidationIssues,
    depth: usize,
}

impl ValidationContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Current nesting depth; zero outside any `validate` call.
    pub fn depth(&self) -> usize {
        self.depth
    }

    pub fn issues(&self) -> &ValidationIssues {
        &self.issues
    }

    pub fn into_issues(self) -> ValidationIssues {
        self.issues
    }

    pub fn is_valid(&self) -> bool {
        self.issues.is_valid()
    }

    /// Runs `validator` at the next nesting level.
    ///
    /// Returns `true` if the validator (and anything it validated in turn)
    /// added no problems or glitches.
    pub fn validate(&mut self, validator: &dyn Validator) -> bool {
        let problems_before = self.issues.count(IssueKind::Problem);
        let glitches_before = self.issues.count(IssueKind::Glitch);

        self.depth += 1;
        validator.on_validate(self);
        self.depth -= 1;

        let problems = self.issues.count(IssueKind::Problem);
        let glitches = self.issues.count(IssueKind::Glitch);

        if self.depth == 0 && validator.should_show_validation_report() {
            info!(
                target_name = validator.validation_target(),
                problems,
                glitches,
                warnings = self.issues.count(IssueKind::Warning),
                "Validated {}",
                validator.validation_target()
            );
        }

        problems == problems_before && glitches == glitches_before
    }

    pub fn validate_optional(&mut self, validator: Option<&dyn Validator>) -> bool {
        match validator {
            Some(v) => self.validate(v),
            None => {
                self.problem("Null validator");
                false
            }
        }
    }

    pub fn problem(&mut self, message: impl Into<String>) {
        self.add(IssueKind::Problem, message);
    }

    pub fn glitch(&mut self, message: impl Into<String>) {
        self.add(IssueKind::Glitch, message);
    }

    pub fn quibble(&mut self, message: impl Into<String>) {
        self.add(IssueKind::Quibble, message);
    }

    pub fn warning(&mut self, message: impl Into<String>) {
        self.add(IssueKind::Warning, message);
    }

    pub fn problem_if(&mut self, invalid: bool, message: impl Into<String>) -> bool {
        if invalid {
            self.problem(message);
        }
        invalid
    }

    pub fn glitch_if(&mut self, invalid: bool, message: impl Into<String>) -> bool {
        if invalid {
            self.glitch(message);
        }
        invalid
    }

    pub fn quibble_if(&mut self, invalid: bool, message: impl Into<String>) -> bool {
        if invalid {
            self.quibble(message);
        }
        invalid
    }

    pub fn warning_if(&mut self, invalid: bool, message: impl Into<String>) -> bool {
        if invalid {
            self.warning(message);
        }
        invalid
    }

    pub fn problem_if_none<T>(&mut self, value: Option<&T>, message: impl Into<String>) -> bool {
        self.problem_if(value.is_none(), message)
    }

    pub fn problem_if_not_in_range_inclusive(
        &mut self,
        value: i64,
        name: &str,
        minimum: i64,
        maximum: i64,
    ) -> bool {
        self.problem_if(
            !(minimum..=maximum).contains(&value),
            format!("Invalid {}: {} not in [{}, {}]", name, value, minimum, maximum),
        )
    }

    pub fn problem_if_not_in_range_exclusive(
        &mut self,
        value: i64,
        name: &str,
        minimum: i64,
        maximum: i64,
    ) -> bool {
        self.problem_if(
            !(value > minimum && value < maximum),
            format!("Invalid {}: {} not in ({}, {})", name, value, minimum, maximum),
        )
    }

    fn add(&mut self, kind: IssueKind, message: impl Into<String>) {
        self.issues.add(Issue::new(kind, message));
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    struct Leaf {
        bad: bool,
    }

    impl Validator for Leaf {
        fn on_validate(&self, ctx: &mut ValidationContext) {
            ctx.problem_if(self.bad, "leaf is bad");
            ctx.warning("leaf checked");
        }
    }

    struct Parent {
        children: Vec<Leaf>,
        depth_seen: std::cell::Cell<usize>,
    }

    impl Validator for Parent {
        fn on_validate(&self, ctx: &mut ValidationContext) {
            self.depth_seen.set(ctx.depth());
            for child in &self.children {
                ctx.validate(child);
            }
        }
    }

    #[test]
    fn test_nested_issues_accumulate() {
        let parent = Parent {
            children: vec![Leaf { bad: false }, Leaf { bad: true }, Leaf { bad: true }],
            depth_seen: Default::default(),
        };
        let mut ctx = ValidationContext::new();
        assert!(!ctx.validate(&parent));
        assert_eq!(parent.depth_seen.get(), 1);
        assert_eq!(ctx.depth(), 0);

        let issues = ctx.into_issues();
        assert_eq!(issues.count(IssueKind::Problem), 2);
        assert_eq!(issues.count(IssueKind::Warning), 3);
    }

    #[test]
    fn test_each_level_reports_its_own_outcome() {
        let mut ctx = ValidationContext::new();
        assert!(!ctx.validate(&Leaf { bad: true }));
        // earlier problems do not make a later clean validator fail
        assert!(ctx.validate(&Leaf { bad: false }));
        assert!(!ctx.is_valid());
    }

    #[test]
    fn test_range_checks() {
        let mut ctx = ValidationContext::new();
        assert!(!ctx.problem_if_not_in_range_inclusive(5, "n", 1, 5));
        assert!(ctx.problem_if_not_in_range_exclusive(5, "n", 1, 5));
        assert!(ctx.problem_if_not_in_range_inclusive(0, "n", 1, 5));
        assert_eq!(ctx.issues().count(IssueKind::Problem), 2);
    }

    #[test]
    fn test_missing_validator_is_a_problem() {
        let mut ctx = ValidationContext::new();
        assert!(!ctx.validate_optional(None));
        assert_eq!(ctx.issues().summary(), "Null validator");
    }
}
