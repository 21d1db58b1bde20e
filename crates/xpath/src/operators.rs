//! Comparison, arithmetic and union operators.

use crate::ast::BinaryOperator;
use crate::error::XPathError;
use crate::node::XPathNode;
use crate::value::{XPathValue, string_to_number};

pub fn apply<'a, N: XPathNode<'a>>(
    op: BinaryOperator,
    left: XPathValue<N>,
    right: XPathValue<N>,
) -> Result<XPathValue<N>, XPathError> {
    use BinaryOperator::*;
    match op {
        Union => union(left, right),
        Plus | Minus | Multiply | Divide | Modulo => {
            let (l, r) = (left.to_number(), right.to_number());
            Ok(XPathValue::Number(match op {
                Plus => l + r,
                Minus => l - r,
                Multiply => l * r,
                Divide => l / r,
                _ => l % r,
            }))
        }
        Equals | NotEquals | LessThan | LessThanOrEqual | GreaterThan | GreaterThanOrEqual => {
            Ok(XPathValue::Boolean(compare(op, &left, &right)))
        }
        // Short-circuited by the evaluator.
        And => Ok(XPathValue::Boolean(left.to_bool() && right.to_bool())),
        Or => Ok(XPathValue::Boolean(left.to_bool() || right.to_bool())),
    }
}

fn union<'a, N: XPathNode<'a>>(
    left: XPathValue<N>,
    right: XPathValue<N>,
) -> Result<XPathValue<N>, XPathError> {
    match (left, right) {
        (XPathValue::NodeSet(mut l), XPathValue::NodeSet(r)) => {
            l.extend(r);
            l.sort();
            l.dedup();
            Ok(XPathValue::NodeSet(l))
        }
        _ => Err(XPathError::Type(
            "the '|' operator requires node-sets on both sides".to_string(),
        )),
    }
}

/// A comparison involving a node-set holds if it holds for any member.
fn compare<'a, N: XPathNode<'a>>(
    op: BinaryOperator,
    left: &XPathValue<N>,
    right: &XPathValue<N>,
) -> bool {
    match (left, right) {
        (XPathValue::NodeSet(l), XPathValue::NodeSet(r)) => {
            let right_strings: Vec<String> = r.iter().map(|n| n.string_value()).collect();
            l.iter().any(|a| {
                let a = a.string_value();
                right_strings.iter().any(|b| compare_strings(op, &a, b))
            })
        }
        (XPathValue::NodeSet(nodes), XPathValue::Boolean(b)) => {
            compare_atoms(op, &Atom::Boolean(!nodes.is_empty()), &Atom::Boolean(*b))
        }
        (XPathValue::Boolean(b), XPathValue::NodeSet(nodes)) => {
            compare_atoms(op, &Atom::Boolean(*b), &Atom::Boolean(!nodes.is_empty()))
        }
        (XPathValue::NodeSet(nodes), other) => {
            let other = atom(other);
            nodes
                .iter()
                .any(|n| compare_atoms(op, &node_atom(*n, &other), &other))
        }
        (other, XPathValue::NodeSet(nodes)) => {
            let other = atom(other);
            nodes
                .iter()
                .any(|n| compare_atoms(op, &other, &node_atom(*n, &other)))
        }
        (l, r) => compare_atoms(op, &atom(l), &atom(r)),
    }
}

enum Atom {
    String(String),
    Number(f64),
    Boolean(bool),
}

fn atom<'a, N: XPathNode<'a>>(value: &XPathValue<N>) -> Atom {
    match value {
        XPathValue::String(s) => Atom::String(s.clone()),
        XPathValue::Number(n) => Atom::Number(*n),
        XPathValue::Boolean(b) => Atom::Boolean(*b),
        XPathValue::NodeSet(_) => Atom::String(value.to_string()),
    }
}

/// A node compared with a scalar takes the scalar's type.
fn node_atom<'a, N: XPathNode<'a>>(node: N, other: &Atom) -> Atom {
    let s = node.string_value();
    match other {
        Atom::Number(_) => Atom::Number(string_to_number(&s)),
        _ => Atom::String(s),
    }
}

fn compare_strings(op: BinaryOperator, a: &str, b: &str) -> bool {
    compare_atoms(op, &Atom::String(a.to_string()), &Atom::String(b.to_string()))
}

fn compare_atoms(op: BinaryOperator, left: &Atom, right: &Atom) -> bool {
    use BinaryOperator::*;
    match op {
        Equals | NotEquals => {
            let equal = match (left, right) {
                (Atom::Boolean(_), _) | (_, Atom::Boolean(_)) => {
                    as_bool(left) == as_bool(right)
                }
                (Atom::Number(_), _) | (_, Atom::Number(_)) => as_number(left) == as_number(right),
                (Atom::String(a), Atom::String(b)) => a == b,
            };
            if op == Equals { equal } else { !equal }
        }
        _ => {
            let (l, r) = (as_number(left), as_number(right));
            match op {
                LessThan => l < r,
                LessThanOrEqual => l <= r,
                GreaterThan => l > r,
                _ => l >= r,
            }
        }
    }
}

fn as_bool(atom: &Atom) -> bool {
    match atom {
        Atom::String(s) => !s.is_empty(),
        Atom::Number(n) => *n != 0.0 && !n.is_nan(),
        Atom::Boolean(b) => *b,
    }
}

fn as_number(atom: &Atom) -> f64 {
    match atom {
        Atom::String(s) => string_to_number(s),
        Atom::Number(n) => *n,
        Atom::Boolean(b) => {
            if *b {
                1.0
            } else {
                0.0
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::mock::{MockNode, create_test_tree};

    #[test]
    fn test_node_set_comparisons_are_existential() {
        let tree = create_test_tree();
        let ranks: XPathValue<MockNode> = XPathValue::NodeSet(vec![
            MockNode { id: 4, tree: &tree },
            MockNode { id: 8, tree: &tree },
        ]);
        assert!(compare(BinaryOperator::Equals, &ranks, &XPathValue::Number(1.0)));
        assert!(compare(BinaryOperator::NotEquals, &ranks, &XPathValue::Number(1.0)));
        assert!(!compare(BinaryOperator::GreaterThan, &ranks, &XPathValue::Number(2.0)));
        assert!(compare(BinaryOperator::Equals, &ranks, &XPathValue::String("2".into())));
    }

    #[test]
    fn test_empty_node_set_compares_false() {
        let empty: XPathValue<MockNode> = XPathValue::NodeSet(vec![]);
        assert!(!compare(BinaryOperator::Equals, &empty, &XPathValue::String("".into())));
        assert!(!compare(BinaryOperator::NotEquals, &empty, &XPathValue::String("".into())));
        assert!(compare(BinaryOperator::Equals, &empty, &XPathValue::Boolean(false)));
    }

    #[test]
    fn test_scalar_comparisons() {
        let v = |s: &str| XPathValue::<MockNode>::String(s.to_string());
        assert!(compare(BinaryOperator::Equals, &v("1.0"), &XPathValue::Number(1.0)));
        assert!(!compare(BinaryOperator::Equals, &v("a"), &v("b")));
        assert!(compare(BinaryOperator::LessThan, &v("2"), &v("10")));
    }

    #[test]
    fn test_union_requires_node_sets() {
        let result: Result<XPathValue<MockNode>, _> = apply(
            BinaryOperator::Union,
            XPathValue::NodeSet(vec![]),
            XPathValue::Number(1.0),
        );
        assert!(matches!(result, Err(XPathError::Type(_))));
    }
}
