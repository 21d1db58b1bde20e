//! Evaluates a parsed expression against any tree implementing `XPathNode`.

use crate::ast::{Axis, BinaryOperator, Expression, KindTest, LocationPath, NodeTest, Step};
use crate::error::XPathError;
use crate::node::{NodeType, XPathNode};
use crate::value::XPathValue;
use crate::{axes, functions, operators};

/// The dynamic context of one evaluation.
#[derive(Debug, Clone, Copy)]
pub struct EvaluationContext<N> {
    pub context_node: N,
    /// 1-based position of the context node within the current node list.
    pub position: usize,
    pub size: usize,
}

impl<N> EvaluationContext<N> {
    pub fn new(context_node: N) -> Self {
        Self {
            context_node,
            position: 1,
            size: 1,
        }
    }

    fn at(context_node: N, position: usize, size: usize) -> Self {
        Self {
            context_node,
            position,
            size,
        }
    }
}

pub fn evaluate<'a, N>(
    expr: &Expression,
    ctx: &EvaluationContext<N>,
) -> Result<XPathValue<N>, XPathError>
where
    N: XPathNode<'a> + 'a,
{
    match expr {
        Expression::Literal(s) => Ok(XPathValue::String(s.clone())),
        Expression::Number(n) => Ok(XPathValue::Number(*n)),
        Expression::Path(path) => Ok(XPathValue::NodeSet(evaluate_location_path(path, ctx)?)),
        Expression::FunctionCall { name, args } => {
            let mut evaluated = Vec::with_capacity(args.len());
            for arg in args {
                evaluated.push(evaluate(arg, ctx)?);
            }
            functions::call(name, evaluated, ctx)
        }
        Expression::Negate(inner) => Ok(XPathValue::Number(-evaluate(inner, ctx)?.to_number())),
        Expression::BinaryOp { left, op, right } => match op {
            BinaryOperator::Or => {
                let lhs = evaluate(left, ctx)?.to_bool();
                Ok(XPathValue::Boolean(lhs || evaluate(right, ctx)?.to_bool()))
            }
            BinaryOperator::And => {
                let lhs = evaluate(left, ctx)?.to_bool();
                Ok(XPathValue::Boolean(lhs && evaluate(right, ctx)?.to_bool()))
            }
            _ => {
                let lhs = evaluate(left, ctx)?;
                let rhs = evaluate(right, ctx)?;
                operators::apply(*op, lhs, rhs)
            }
        },
    }
}

fn evaluate_location_path<'a, N>(
    path: &LocationPath,
    ctx: &EvaluationContext<N>,
) -> Result<Vec<N>, XPathError>
where
    N: XPathNode<'a> + 'a,
{
    let mut current = if let Some(start) = &path.start {
        match evaluate(start, ctx)? {
            XPathValue::NodeSet(nodes) => nodes,
            other => {
                return Err(XPathError::Type(format!(
                    "cannot apply a path to a non-node value '{}'",
                    other
                )));
            }
        }
    } else if path.absolute {
        vec![ctx.context_node.root()]
    } else {
        vec![ctx.context_node]
    };

    for step in &path.steps {
        current = evaluate_step(step, &current)?;
    }
    Ok(current)
}

fn evaluate_step<'a, N>(step: &Step, input: &[N]) -> Result<Vec<N>, XPathError>
where
    N: XPathNode<'a> + 'a,
{
    let mut result = Vec::new();
    for &node in input {
        // Axis order is kept here so predicate positions count along the axis.
        let mut candidates: Vec<N> = axes::collect(step.axis, node)
            .into_iter()
            .filter(|n| matches_test(&step.test, step.axis, *n))
            .collect();
        for predicate in &step.predicates {
            candidates = filter_by_predicate(predicate, candidates)?;
        }
        result.extend(candidates);
    }
    result.sort();
    result.dedup();
    Ok(result)
}

fn filter_by_predicate<'a, N>(predicate: &Expression, nodes: Vec<N>) -> Result<Vec<N>, XPathError>
where
    N: XPathNode<'a> + 'a,
{
    let size = nodes.len();
    let mut kept = Vec::with_capacity(size);
    for (index, node) in nodes.into_iter().enumerate() {
        let ctx = EvaluationContext::at(node, index + 1, size);
        let keep = match evaluate(predicate, &ctx)? {
            XPathValue::Number(n) => n == (index + 1) as f64,
            other => other.to_bool(),
        };
        if keep {
            kept.push(node);
        }
    }
    Ok(kept)
}

fn matches_test<'a, N: XPathNode<'a>>(test: &NodeTest, axis: Axis, node: N) -> bool {
    let principal = if axis == Axis::Attribute {
        NodeType::Attribute
    } else {
        NodeType::Element
    };
    match test {
        NodeTest::Wildcard => node.node_type() == principal,
        NodeTest::Name(name) => {
            node.node_type() == principal && node.name().is_some_and(|q| q.local == name)
        }
        NodeTest::Kind(KindTest::Node) => true,
        NodeTest::Kind(KindTest::Text) => node.node_type() == NodeType::Text,
        NodeTest::Kind(KindTest::Comment) => node.node_type() == NodeType::Comment,
        NodeTest::Kind(KindTest::ProcessingInstruction) => {
            node.node_type() == NodeType::ProcessingInstruction
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::node::mock::{MockNode, create_test_tree};
    use crate::parser::parse_expression;

    fn eval<'a>(expr: &str, node: MockNode<'a>) -> XPathValue<MockNode<'a>> {
        let ast = parse_expression(expr).unwrap();
        evaluate(&ast, &EvaluationContext::new(node)).unwrap()
    }

    fn ids(value: XPathValue<MockNode>) -> Vec<usize> {
        match value {
            XPathValue::NodeSet(nodes) => nodes.into_iter().map(|n| n.id).collect(),
            other => panic!("expected a node-set, got {:?}", other),
        }
    }

    #[test]
    fn test_child_and_attribute_steps() {
        let tree = create_test_tree();
        let root = MockNode { id: 0, tree: &tree };
        assert_eq!(ids(eval("list/item", root)), vec![3, 7]);
        assert_eq!(ids(eval("list/item/@rank", root)), vec![4, 8]);
        assert_eq!(ids(eval("list/@*", root)), vec![2]);
    }

    #[test]
    fn test_absolute_and_descendant_paths() {
        let tree = create_test_tree();
        let text = MockNode { id: 9, tree: &tree };
        assert_eq!(ids(eval("/list", text)), vec![1]);
        assert_eq!(ids(eval("//text()", text)), vec![5, 9]);
        assert_eq!(ids(eval("//comment()", text)), vec![6]);
        assert_eq!(ids(eval("//processing-instruction()", text)), vec![10]);
        assert_eq!(ids(eval("/", text)), vec![0]);
    }

    #[test]
    fn test_parent_and_self() {
        let tree = create_test_tree();
        let text = MockNode { id: 9, tree: &tree };
        assert_eq!(ids(eval("..", text)), vec![7]);
        assert_eq!(ids(eval("../..", text)), vec![1]);
        assert_eq!(ids(eval(".", text)), vec![9]);
    }

    #[test]
    fn test_positional_predicates() {
        let tree = create_test_tree();
        let root = MockNode { id: 0, tree: &tree };
        assert_eq!(ids(eval("list/item[1]", root)), vec![3]);
        assert_eq!(ids(eval("list/item[last()]", root)), vec![7]);
        assert_eq!(ids(eval("list/item[position() = 2]", root)), vec![7]);
    }

    #[test]
    fn test_reverse_axis_positions() {
        let tree = create_test_tree();
        let second = MockNode { id: 7, tree: &tree };
        // Nearest preceding sibling element first.
        assert_eq!(ids(eval("preceding-sibling::*[1]", second)), vec![3]);
        assert_eq!(ids(eval("ancestor::node()[1]", second)), vec![1]);
    }

    #[test]
    fn test_boolean_predicates() {
        let tree = create_test_tree();
        let root = MockNode { id: 0, tree: &tree };
        assert_eq!(ids(eval("list/item[@rank = '1']", root)), vec![7]);
        assert_eq!(ids(eval("list/item[@rank > 1]", root)), vec![3]);
        assert_eq!(ids(eval("list/item[. = 'b']", root)), vec![3]);
        assert_eq!(ids(eval("list/item[@missing]", root)), Vec::<usize>::new());
    }

    #[test]
    fn test_union_is_sorted_and_deduplicated() {
        let tree = create_test_tree();
        let list = MockNode { id: 1, tree: &tree };
        assert_eq!(ids(eval("item[2] | item | comment()", list)), vec![3, 6, 7]);
        assert_eq!(ids(eval("(item | comment())/text()", list)), vec![5, 9]);
    }

    #[test]
    fn test_scalar_expressions() {
        let tree = create_test_tree();
        let root = MockNode { id: 0, tree: &tree };
        assert_eq!(eval("count(//item)", root), XPathValue::Number(2.0));
        assert_eq!(eval("string(/list)", root), XPathValue::String("ba".into()));
        assert_eq!(eval("1 + 2 * 3", root), XPathValue::Number(7.0));
        assert_eq!(eval("7 mod 3 = 1 and not(false())", root), XPathValue::Boolean(true));
        assert_eq!(eval("-(2)", root), XPathValue::Number(-2.0));
    }

    #[test]
    fn test_path_from_non_node_value_is_a_type_error() {
        let tree = create_test_tree();
        let root = MockNode { id: 0, tree: &tree };
        let ast = parse_expression("string(.)/x").unwrap();
        let result = evaluate(&ast, &EvaluationContext::new(root));
        assert!(matches!(result, Err(XPathError::Type(_))));
    }
}
