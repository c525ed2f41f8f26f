use std::fmt;
use std::ops::Not;

use super::{OperatorKind, Value};

/// A leaf test against one document field.
///
/// The operator decides how the values are interpreted when rendered: `Filter`
/// is an equality test, `Exclude` an inequality test, `Contain` a membership
/// test and `Exists` a presence check. `Unfilter` never appears in a leaf built
/// by [`build_predicate`](crate::build_predicate); the emitter rejects it.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldTest {
    pub field: String,
    pub operator: OperatorKind,
    pub values: Vec<Value>,
}

impl FieldTest {
    #[must_use]
    pub fn new(field: &str, operator: OperatorKind, values: Vec<Value>) -> Self {
        Self {
            field: field.to_owned(),
            operator,
            values,
        }
    }

    #[must_use]
    pub fn equals(field: &str, value: impl Into<Value>) -> Self {
        Self::new(field, OperatorKind::Filter, vec![value.into()])
    }

    #[must_use]
    pub fn one_of(field: &str, values: Vec<Value>) -> Self {
        Self::new(field, OperatorKind::Contain, values)
    }

    #[must_use]
    pub fn exists(field: &str) -> Self {
        Self::new(field, OperatorKind::Exists, Vec::new())
    }
}

impl fmt::Display for FieldTest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let field = &self.field;
        let joined = || {
            self.values
                .iter()
                .map(ToString::to_string)
                .collect::<Vec<_>>()
                .join(", ")
        };
        match self.operator {
            OperatorKind::Filter => write!(f, "({field} == {})", joined()),
            OperatorKind::Exclude => write!(f, "({field} != {})", joined()),
            OperatorKind::Contain => write!(f, "({field} IN [{}])", joined()),
            OperatorKind::Exists => write!(f, "({field} EXISTS)"),
            OperatorKind::Unfilter => write!(f, "({field} UNFILTER)"),
        }
    }
}

/// Boolean combinator tree over [`FieldTest`] leaves.
///
/// One predicate is built per metric. A metric without constraints is
/// [`Predicate::Always`], never absent.
#[derive(Debug, Clone, PartialEq)]
pub enum Predicate {
    Always,
    Test(FieldTest),
    And(Box<Predicate>, Box<Predicate>),
    Or(Box<Predicate>, Box<Predicate>),
    Not(Box<Predicate>),
}

impl fmt::Display for Predicate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Predicate::Always => write!(f, "TRUE"),
            Predicate::Test(test) => write!(f, "{test}"),
            Predicate::And(a, b) => write!(f, "({a} AND {b})"),
            Predicate::Or(a, b) => write!(f, "({a} OR {b})"),
            Predicate::Not(inner) => write!(f, "(NOT {inner})"),
        }
    }
}

impl Predicate {
    #[must_use]
    pub fn and(self, other: Predicate) -> Predicate {
        Predicate::And(Box::new(self), Box::new(other))
    }

    #[must_use]
    pub fn or(self, other: Predicate) -> Predicate {
        Predicate::Or(Box::new(self), Box::new(other))
    }

    /// Left-associative conjunction. An empty input yields [`Predicate::Always`].
    #[must_use]
    pub fn all(parts: impl IntoIterator<Item = Predicate>) -> Predicate {
        parts
            .into_iter()
            .reduce(Predicate::and)
            .unwrap_or(Predicate::Always)
    }

    /// Left-associative disjunction. `None` for an empty input.
    #[must_use]
    pub fn any(parts: impl IntoIterator<Item = Predicate>) -> Option<Predicate> {
        parts.into_iter().reduce(Predicate::or)
    }

    #[must_use]
    pub fn is_always(&self) -> bool {
        matches!(self, Predicate::Always)
    }

    /// Leaf tests in left-to-right order.
    #[must_use]
    pub fn tests(&self) -> Vec<&FieldTest> {
        let mut out = Vec::new();
        collect_tests(self, &mut out);
        out
    }
}

fn collect_tests<'a>(predicate: &'a Predicate, out: &mut Vec<&'a FieldTest>) {
    match predicate {
        Predicate::Always => {}
        Predicate::Test(test) => out.push(test),
        Predicate::And(a, b) | Predicate::Or(a, b) => {
            collect_tests(a, out);
            collect_tests(b, out);
        }
        Predicate::Not(inner) => collect_tests(inner, out),
    }
}

impl Not for Predicate {
    type Output = Predicate;

    fn not(self) -> Predicate {
        Predicate::Not(Box::new(self))
    }
}

impl From<FieldTest> for Predicate {
    fn from(test: FieldTest) -> Self {
        Predicate::Test(test)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn eq(field: &str, value: &str) -> Predicate {
        FieldTest::equals(field, value).into()
    }

    #[test]
    fn equals_leaf() {
        let test = FieldTest::equals("status", "active");
        assert_eq!(test.operator, OperatorKind::Filter);
        assert_eq!(test.values, vec![Value::String("active".into())]);
        assert_eq!(test.to_string(), "(status == \"active\")");
    }

    #[test]
    fn leaf_display() {
        assert_eq!(
            FieldTest::one_of("tier", vec![1_i64.into(), 2_i64.into()]).to_string(),
            "(tier IN [1, 2])"
        );
        assert_eq!(FieldTest::exists("owner").to_string(), "(owner EXISTS)");
        assert_eq!(
            FieldTest::new("x", OperatorKind::Exclude, vec![true.into()]).to_string(),
            "(x != true)"
        );
    }

    #[test]
    fn and_or_not_display() {
        let p = eq("type", "A").and(!eq("type", "B"));
        assert_eq!(
            p.to_string(),
            "((type == \"A\") AND (NOT (type == \"B\")))"
        );
        let p = eq("a", "1").or(eq("b", "2"));
        assert_eq!(p.to_string(), "((a == \"1\") OR (b == \"2\"))");
    }

    #[test]
    fn all_of_nothing_is_always() {
        let p = Predicate::all(Vec::new());
        assert!(p.is_always());
        assert_eq!(p.to_string(), "TRUE");
    }

    #[test]
    fn all_single_part_is_unwrapped() {
        assert_eq!(Predicate::all(vec![eq("a", "1")]), eq("a", "1"));
    }

    #[test]
    fn all_is_left_associative() {
        let p = Predicate::all(vec![eq("a", "1"), eq("b", "2"), eq("c", "3")]);
        match p {
            Predicate::And(left, right) => {
                assert_eq!(*right, eq("c", "3"));
                assert!(matches!(*left, Predicate::And(_, _)));
            }
            other => panic!("expected And, got {other:?}"),
        }
    }

    #[test]
    fn any_of_nothing_is_none() {
        assert_eq!(Predicate::any(Vec::new()), None);
        assert_eq!(Predicate::any(vec![eq("a", "1")]), Some(eq("a", "1")));
    }

    #[test]
    fn tests_in_order() {
        let p = eq("a", "1").and(!eq("b", "2").or(eq("c", "3")));
        let fields: Vec<&str> = p.tests().iter().map(|t| t.field.as_str()).collect();
        assert_eq!(fields, vec!["a", "b", "c"]);
    }
}
