//! A `nom`-based parser for path query expressions.

use super::ast::*;
use crate::error::XPathError;
use nom::{
    IResult, Parser,
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, digit0, digit1, multispace0},
    combinator::{map, map_res, opt, peek, recognize},
    multi::{many0, separated_list0},
    sequence::{delimited, pair, preceded},
};

pub fn parse_expression(input: &str) -> Result<Expression, XPathError> {
    let trimmed = input.trim();
    if trimmed.is_empty() {
        return Err(XPathError::parse(input, "empty expression"));
    }
    match expression(trimmed) {
        Ok(("", expr)) => Ok(expr),
        Ok((rest, _)) => Err(XPathError::parse(
            input,
            format!("unexpected input at '{}'", rest),
        )),
        Err(e) => Err(XPathError::parse(input, e.to_string())),
    }
}

fn ws<'a, F, O, E>(inner: F) -> impl Parser<&'a str, Output = O, Error = E>
where
    F: Parser<&'a str, Output = O, Error = E>,
    E: nom::error::ParseError<&'a str>,
{
    delimited(multispace0, inner, multispace0)
}

/// Left-associative chain of `operand (op operand)*`.
fn binary_chain<'a, F, G>(
    operand: F,
    operator: G,
) -> impl FnMut(&'a str) -> IResult<&'a str, Expression>
where
    F: Parser<&'a str, Output = Expression, Error = nom::error::Error<&'a str>> + Clone,
    G: Parser<&'a str, Output = BinaryOperator, Error = nom::error::Error<&'a str>> + Clone,
{
    move |input: &str| {
        let (input, mut left) = operand.clone().parse(input)?;
        let (input, rest) = many0(pair(ws(operator.clone()), operand.clone())).parse(input)?;
        for (op, right) in rest {
            left = Expression::BinaryOp {
                left: Box::new(left),
                op,
                right: Box::new(right),
            };
        }
        Ok((input, left))
    }
}

fn expression(input: &str) -> IResult<&str, Expression> {
    or_expr(input)
}

fn or_expr(input: &str) -> IResult<&str, Expression> {
    binary_chain(and_expr, |i| map(tag("or"), |_| BinaryOperator::Or).parse(i))(input)
}

fn and_expr(input: &str) -> IResult<&str, Expression> {
    binary_chain(equality_expr, |i| {
        map(tag("and"), |_| BinaryOperator::And).parse(i)
    })(input)
}

fn equality_op(input: &str) -> IResult<&str, BinaryOperator> {
    alt((
        map(tag("!="), |_| BinaryOperator::NotEquals),
        map(tag("="), |_| BinaryOperator::Equals),
    ))
    .parse(input)
}

fn relational_op(input: &str) -> IResult<&str, BinaryOperator> {
    alt((
        map(tag("<="), |_| BinaryOperator::LessThanOrEqual),
        map(tag(">="), |_| BinaryOperator::GreaterThanOrEqual),
        map(tag("<"), |_| BinaryOperator::LessThan),
        map(tag(">"), |_| BinaryOperator::GreaterThan),
    ))
    .parse(input)
}

fn additive_op(input: &str) -> IResult<&str, BinaryOperator> {
    alt((
        map(char('+'), |_| BinaryOperator::Plus),
        map(char('-'), |_| BinaryOperator::Minus),
    ))
    .parse(input)
}

fn multiplicative_op(input: &str) -> IResult<&str, BinaryOperator> {
    alt((
        map(char('*'), |_| BinaryOperator::Multiply),
        map(tag("div"), |_| BinaryOperator::Divide),
        map(tag("mod"), |_| BinaryOperator::Modulo),
    ))
    .parse(input)
}

fn equality_expr(input: &str) -> IResult<&str, Expression> {
    binary_chain(relational_expr, equality_op)(input)
}

fn relational_expr(input: &str) -> IResult<&str, Expression> {
    binary_chain(additive_expr, relational_op)(input)
}

fn additive_expr(input: &str) -> IResult<&str, Expression> {
    binary_chain(multiplicative_expr, additive_op)(input)
}

fn multiplicative_expr(input: &str) -> IResult<&str, Expression> {
    binary_chain(unary_expr, multiplicative_op)(input)
}

fn unary_expr(input: &str) -> IResult<&str, Expression> {
    let (i, negated) = opt(ws(char('-'))).parse(input)?;
    if negated.is_some() {
        let (i, expr) = unary_expr(i)?;
        return Ok((i, Expression::Negate(Box::new(expr))));
    }
    union_expr(i)
}

fn union_expr(input: &str) -> IResult<&str, Expression> {
    binary_chain(path_expr, |i| {
        map(char('|'), |_| BinaryOperator::Union).parse(i)
    })(input)
}

/// A primary expression optionally followed by more steps, or a plain location path.
fn path_expr(input: &str) -> IResult<&str, Expression> {
    // Primary first: `count(x)` would otherwise be taken as a step named `count`.
    let (i, head) = alt((primary_expr, map(location_path, Expression::Path))).parse(input)?;
    let (i, tail) = many0(pair(alt((tag("//"), tag("/"))), step)).parse(i)?;
    if tail.is_empty() {
        return Ok((i, head));
    }

    let (start, absolute, mut steps) = match head {
        Expression::Path(path) => (path.start, path.absolute, path.steps),
        other => (Some(Box::new(other)), false, vec![]),
    };
    push_steps(&mut steps, tail);
    Ok((
        i,
        Expression::Path(LocationPath {
            start,
            absolute,
            steps,
        }),
    ))
}

fn push_steps(steps: &mut Vec<Step>, tail: Vec<(&str, Step)>) {
    for (separator, next) in tail {
        if separator == "//" {
            steps.push(Step::descendant_or_self());
        }
        steps.push(next);
    }
}

fn primary_expr(input: &str) -> IResult<&str, Expression> {
    ws(alt((
        map(number, Expression::Number),
        map(string_literal, Expression::Literal),
        function_call,
        delimited(ws(char('(')), expression, ws(char(')'))),
    )))
    .parse(input)
}

fn number(input: &str) -> IResult<&str, f64> {
    map_res(
        alt((
            recognize(pair(digit1, opt(pair(char('.'), digit0)))),
            recognize(pair(char('.'), digit1)),
        )),
        |s: &str| s.parse::<f64>(),
    )
    .parse(input)
}

fn string_literal(input: &str) -> IResult<&str, String> {
    map(
        alt((
            delimited(char('\''), take_while(|c| c != '\''), char('\'')),
            delimited(char('"'), take_while(|c| c != '"'), char('"')),
        )),
        |s: &str| s.to_string(),
    )
    .parse(input)
}

fn nc_name(input: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while1(|c: char| c.is_alphabetic() || c == '_'),
        take_while(|c: char| c.is_alphanumeric() || c == '_' || c == '-' || c == '.'),
    ))
    .parse(input)
}

fn q_name(input: &str) -> IResult<&str, &str> {
    recognize(pair(nc_name, opt(pair(char(':'), nc_name)))).parse(input)
}

fn kind_test(input: &str) -> IResult<&str, NodeTest> {
    let (i, kind) = alt((
        tag("text"),
        tag("node"),
        tag("comment"),
        tag("processing-instruction"),
    ))
    .parse(input)?;
    let (i, _) = pair(ws(char('(')), char(')')).parse(i)?;
    let kind = match kind {
        "text" => KindTest::Text,
        "comment" => KindTest::Comment,
        "processing-instruction" => KindTest::ProcessingInstruction,
        _ => KindTest::Node,
    };
    Ok((i, NodeTest::Kind(kind)))
}

fn node_test(input: &str) -> IResult<&str, NodeTest> {
    alt((
        map(char('*'), |_| NodeTest::Wildcard),
        kind_test,
        map(q_name, |name: &str| {
            let local = name.rsplit(':').next().unwrap_or(name);
            NodeTest::Name(local.to_string())
        }),
    ))
    .parse(input)
}

fn axis(input: &str) -> IResult<&str, Axis> {
    let (i, name) = alt((
        tag("ancestor-or-self"),
        tag("ancestor"),
        tag("attribute"),
        tag("child"),
        tag("descendant-or-self"),
        tag("descendant"),
        tag("following-sibling"),
        tag("following"),
        tag("parent"),
        tag("preceding-sibling"),
        tag("preceding"),
        tag("self"),
    ))
    .parse(input)?;
    let (i, _) = tag("::").parse(i)?;
    let axis = match name {
        "ancestor-or-self" => Axis::AncestorOrSelf,
        "ancestor" => Axis::Ancestor,
        "attribute" => Axis::Attribute,
        "descendant-or-self" => Axis::DescendantOrSelf,
        "descendant" => Axis::Descendant,
        "following-sibling" => Axis::FollowingSibling,
        "following" => Axis::Following,
        "parent" => Axis::Parent,
        "preceding-sibling" => Axis::PrecedingSibling,
        "preceding" => Axis::Preceding,
        "self" => Axis::SelfAxis,
        _ => Axis::Child,
    };
    Ok((i, axis))
}

fn predicate(input: &str) -> IResult<&str, Expression> {
    delimited(ws(char('[')), expression, ws(char(']'))).parse(input)
}

fn step(input: &str) -> IResult<&str, Step> {
    alt((
        map(tag(".."), |_| Step {
            axis: Axis::Parent,
            test: NodeTest::Kind(KindTest::Node),
            predicates: vec![],
        }),
        map(char('.'), |_| Step {
            axis: Axis::SelfAxis,
            test: NodeTest::Kind(KindTest::Node),
            predicates: vec![],
        }),
        full_step,
    ))
    .parse(input)
}

fn full_step(input: &str) -> IResult<&str, Step> {
    let (i, (axis, test)) = alt((
        map(preceded(char('@'), node_test), |test| (Axis::Attribute, test)),
        map(pair(opt(axis), node_test), |(axis, test)| {
            (axis.unwrap_or(Axis::Child), test)
        }),
    ))
    .parse(input)?;
    let (i, predicates) = many0(predicate).parse(i)?;
    Ok((
        i,
        Step {
            axis,
            test,
            predicates,
        },
    ))
}

fn location_path(input: &str) -> IResult<&str, LocationPath> {
    let (i, absolute, mut steps) = if let Ok((rest, _)) = tag::<_, _, nom::error::Error<&str>>("//").parse(input) {
        let (rest, first) = step(rest)?;
        (rest, true, vec![Step::descendant_or_self(), first])
    } else if let Ok((rest, _)) = char::<_, nom::error::Error<&str>>('/').parse(input) {
        match step(rest) {
            Ok((rest, first)) => (rest, true, vec![first]),
            Err(_) => (rest, true, vec![]),
        }
    } else {
        let (rest, first) = step(input)?;
        (rest, false, vec![first])
    };

    let (i, tail) = many0(pair(alt((tag("//"), tag("/"))), step)).parse(i)?;
    push_steps(&mut steps, tail);
    Ok((
        i,
        LocationPath {
            start: None,
            absolute,
            steps,
        },
    ))
}

fn function_call(input: &str) -> IResult<&str, Expression> {
    let (i, name) = q_name(input)?;
    let (i, _) = peek(ws(char('('))).parse(i)?;

    // Kind tests look like calls but belong to the step grammar.
    if matches!(name, "text" | "node" | "comment" | "processing-instruction") {
        return Err(nom::Err::Error(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Verify,
        )));
    }

    let (i, _) = multispace0(i)?;
    let (i, args) = delimited(
        char('('),
        separated_list0(ws(char(',')), expression),
        ws(char(')')),
    )
    .parse(i)?;

    Ok((
        i,
        Expression::FunctionCall {
            name: name.to_string(),
            args,
        },
    ))
}
