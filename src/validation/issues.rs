//! Validation issues.

use std::fmt;

/// Severity of a validation finding.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IssueKind {
    /// Data is invalid and should be discarded.
    Problem,
    /// Data is compromised but kept.
    Glitch,
    /// Minor issue that does not invalidate.
    Quibble,
    /// Should be corrected, but is not a validation failure.
    Warning,
}

impl IssueKind {
    /// Problems and glitches invalidate; quibbles and warnings do not.
    pub fn is_invalidating(self) -> bool {
        matches!(self, IssueKind::Problem | IssueKind::Glitch)
    }
}

impl fmt::Display for IssueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            IssueKind::Problem => "problem",
            IssueKind::Glitch => "glitch",
            IssueKind::Quibble => "quibble",
            IssueKind::Warning => "warning",
        };
        f.write_str(s)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Issue {
    pub kind: IssueKind,
    pub message: String,
}

impl Issue {
    pub fn new(kind: IssueKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for Issue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.kind, self.message)
    }
}

/// Ordered list of issues collected during one (possibly nested) validation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationIssues {
    issues: Vec<Issue>,
}

impl ValidationIssues {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, issue: Issue) {
        self.issues.push(issue);
    }

    pub fn count(&self, kind: IssueKind) -> usize {
        self.issues.iter().filter(|i| i.kind == kind).count()
    }

    /// Number of problems plus glitches.
    pub fn invalidating(&self) -> usize {
        self.issues
            .iter()
            .filter(|i| i.kind.is_invalidating())
            .count()
    }

    pub fn is_valid(&self) -> bool {
        self.invalidating() == 0
    }

    pub fn problems(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter().filter(|i| i.kind == IssueKind::Problem)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Issue> {
        self.issues.iter()
    }

    pub fn len(&self) -> usize {
        self.issues.len()
    }

    pub fn is_empty(&self) -> bool {
        self.issues.is_empty()
    }

    pub fn clear(&mut self) {
        self.issues.clear();
    }

    /// One-line summary, e.g. `"batch_size must be at least 1; no consumer"`.
    pub fn summary(&self) -> String {
        self.issues
            .iter()
            .map(|i| i.message.as_str())
            .collect::<Vec<_>>()
            .join("; ")
    }
}

impl IntoIterator for ValidationIssues {
    type Item = Issue;
    type IntoIter = std::vec::IntoIter<Issue>;

    fn into_iter(self) -> Self::IntoIter {
        self.issues.into_iter()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_counts_and_validity() {
        let mut issues = ValidationIssues::new();
        assert!(issues.is_valid());

        issues.add(Issue::new(IssueKind::Warning, "slow"));
        issues.add(Issue::new(IssueKind::Quibble, "odd"));
        assert!(issues.is_valid());

        issues.add(Issue::new(IssueKind::Glitch, "truncated"));
        assert!(!issues.is_valid());
        assert_eq!(issues.count(IssueKind::Glitch), 1);
        assert_eq!(issues.invalidating(), 1);
        assert_eq!(issues.len(), 3);
    }

    #[test]
    fn test_summary_joins_messages() {
        let mut issues = ValidationIssues::new();
        issues.add(Issue::new(IssueKind::Problem, "a"));
        issues.add(Issue::new(IssueKind::Problem, "b"));
        assert_eq!(issues.summary(), "a; b");
        assert_eq!(issues.problems().count(), 2);
        assert_eq!(issues.iter().next().map(|i| i.to_string()), Some("problem: a".into()));
    }
}
