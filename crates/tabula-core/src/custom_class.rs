//! Custom cell classes.
//!
//! A table may carry a map from CSS class names to rules. A rule either
//! compares the cell value for equality or runs a predicate on it. The
//! classes of all matching rules are joined with spaces, in insertion order.

use crate::value::CellValue;
use std::fmt;
use std::sync::Arc;

/// A single class rule.
#[derive(Clone)]
pub enum ClassRule {
    /// Matches cells equal to the value
    Equals(CellValue),
    /// Matches cells for which the predicate returns true
    Predicate(Arc<dyn Fn(&CellValue) -> bool + Send + Sync>),
}

impl ClassRule {
    /// Wrap a predicate function
    pub fn predicate<F>(f: F) -> Self
    where
        F: Fn(&CellValue) -> bool + Send + Sync + 'static,
    {
        ClassRule::Predicate(Arc::new(f))
    }

    /// Evaluate the rule against a cell
    pub fn matches(&self, value: &CellValue) -> bool {
        match self {
            ClassRule::Equals(expected) => expected == value,
            ClassRule::Predicate(f) => f(value),
        }
    }
}

impl fmt::Debug for ClassRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ClassRule::Equals(v) => f.debug_tuple("Equals").field(v).finish(),
            ClassRule::Predicate(_) => f.write_str("Predicate(..)"),
        }
    }
}

/// Ordered class-name to rule map
#[derive(Debug, Clone, Default)]
pub struct CustomClasses {
    rules: Vec<(String, ClassRule)>,
}

impl CustomClasses {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a rule; a class added twice keeps its first position and the new rule
    pub fn insert(&mut self, class: impl Into<String>, rule: ClassRule) {
        let class = class.into();
        match self.rules.iter_mut().find(|(c, _)| *c == class) {
            Some(entry) => entry.1 = rule,
            None => self.rules.push((class, rule)),
        }
    }

    /// Builder form of [`insert`](Self::insert)
    pub fn with(mut self, class: impl Into<String>, rule: ClassRule) -> Self {
        self.insert(class, rule);
        self
    }

    pub fn len(&self) -> usize {
        self.rules.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rules.is_empty()
    }

    /// Space-joined classes whose rule matches `value`, `None` if none match
    pub fn classes_for(&self, value: &CellValue) -> Option<String> {
        let matched: Vec<&str> = self
            .rules
            .iter()
            .filter(|(_, rule)| rule.matches(value))
            .map(|(class, _)| class.as_str())
            .collect();

        if matched.is_empty() {
            None
        } else {
            Some(matched.join(" "))
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn starts_with(prefix: &'static str) -> ClassRule {
        ClassRule::predicate(move |v| v.as_str().map_or(false, |s| s.starts_with(prefix)))
    }

    fn classes() -> CustomClasses {
        CustomClasses::new()
            .with("label label-danger", ClassRule::Equals(CellValue::from("active")))
            .with("secret secret-number", ClassRule::Equals(CellValue::from(123.456)))
            .with("btn btn-sm", starts_with("http"))
            .with("secure", starts_with("https"))
    }

    #[test]
    fn test_no_class() {
        let classes = classes();
        for value in [
            CellValue::from(""),
            CellValue::from("something"),
            CellValue::from(123),
            CellValue::from(vec![1, 2, 3]),
            CellValue::Null,
        ] {
            assert_eq!(classes.classes_for(&value), None);
        }
    }

    #[test]
    fn test_equality_rules() {
        let classes = classes();
        assert_eq!(
            classes.classes_for(&CellValue::from("active")).as_deref(),
            Some("label label-danger")
        );
        assert_eq!(
            classes.classes_for(&CellValue::from(123.456)).as_deref(),
            Some("secret secret-number")
        );
    }

    #[test]
    fn test_predicate_rules_joined_in_order() {
        let classes = classes();
        assert_eq!(
            classes.classes_for(&CellValue::from("http://no.ssl")).as_deref(),
            Some("btn btn-sm")
        );
        assert_eq!(
            classes.classes_for(&CellValue::from("https://secure.it")).as_deref(),
            Some("btn btn-sm secure")
        );
    }

    #[test]
    fn test_insert_replaces_rule() {
        let mut classes = CustomClasses::new();
        classes.insert("x", ClassRule::Equals(CellValue::from(1)));
        classes.insert("x", ClassRule::Equals(CellValue::from(2)));
        assert_eq!(classes.len(), 1);
        assert_eq!(classes.classes_for(&CellValue::from(1)), None);
        assert!(classes.classes_for(&CellValue::from(2)).is_some());
    }
}
