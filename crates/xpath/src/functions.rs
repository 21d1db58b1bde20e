//! The core function library.

use crate::engine::EvaluationContext;
use crate::error::XPathError;
use crate::node::XPathNode;
use crate::value::{XPathValue, string_to_number};

pub fn call<'a, N: XPathNode<'a>>(
    name: &str,
    mut args: Vec<XPathValue<N>>,
    ctx: &EvaluationContext<N>,
) -> Result<XPathValue<N>, XPathError> {
    match name {
        // Node-set
        "position" => {
            arity(name, &args, 0, 0)?;
            Ok(XPathValue::Number(ctx.position as f64))
        }
        "last" => {
            arity(name, &args, 0, 0)?;
            Ok(XPathValue::Number(ctx.size as f64))
        }
        "count" => {
            arity(name, &args, 1, 1)?;
            match args.remove(0) {
                XPathValue::NodeSet(nodes) => Ok(XPathValue::Number(nodes.len() as f64)),
                _ => Err(XPathError::function(name, "argument must be a node-set")),
            }
        }
        "local-name" | "name" => {
            arity(name, &args, 0, 1)?;
            let node = match args.pop() {
                None => Some(ctx.context_node),
                Some(XPathValue::NodeSet(nodes)) => nodes.first().copied(),
                Some(_) => return Err(XPathError::function(name, "argument must be a node-set")),
            };
            let local = node
                .and_then(|n| n.name())
                .map(|q| q.local.to_string())
                .unwrap_or_default();
            Ok(XPathValue::String(local))
        }

        // String
        "string" => {
            arity(name, &args, 0, 1)?;
            Ok(XPathValue::String(string_arg(args.pop(), ctx)))
        }
        "concat" => {
            if args.len() < 2 {
                return Err(XPathError::function(name, "expected at least 2 arguments"));
            }
            Ok(XPathValue::String(args.iter().map(|a| a.to_string()).collect()))
        }
        "starts-with" | "contains" | "substring-before" | "substring-after" => {
            arity(name, &args, 2, 2)?;
            let needle = args.remove(1).to_string();
            let haystack = args.remove(0).to_string();
            Ok(match name {
                "starts-with" => XPathValue::Boolean(haystack.starts_with(&needle)),
                "contains" => XPathValue::Boolean(haystack.contains(&needle)),
                "substring-before" => XPathValue::String(
                    haystack
                        .find(&needle)
                        .map(|i| haystack[..i].to_string())
                        .unwrap_or_default(),
                ),
                _ => XPathValue::String(
                    haystack
                        .find(&needle)
                        .map(|i| haystack[i + needle.len()..].to_string())
                        .unwrap_or_default(),
                ),
            })
        }
        "substring" => {
            arity(name, &args, 2, 3)?;
            let length = if args.len() == 3 {
                Some(args.remove(2).to_number())
            } else {
                None
            };
            let start = args.remove(1).to_number();
            let s = args.remove(0).to_string();
            Ok(XPathValue::String(substring(&s, start, length)))
        }
        "string-length" => {
            arity(name, &args, 0, 1)?;
            let s = string_arg(args.pop(), ctx);
            Ok(XPathValue::Number(s.chars().count() as f64))
        }
        "normalize-space" => {
            arity(name, &args, 0, 1)?;
            let s = string_arg(args.pop(), ctx);
            Ok(XPathValue::String(
                s.split_whitespace().collect::<Vec<_>>().join(" "),
            ))
        }
        "translate" => {
            arity(name, &args, 3, 3)?;
            let to: Vec<char> = args.remove(2).to_string().chars().collect();
            let from: Vec<char> = args.remove(1).to_string().chars().collect();
            let s = args.remove(0).to_string();
            let translated = s
                .chars()
                .filter_map(|c| match from.iter().position(|f| *f == c) {
                    Some(i) => to.get(i).copied(),
                    None => Some(c),
                })
                .collect();
            Ok(XPathValue::String(translated))
        }

        // Boolean
        "not" => {
            arity(name, &args, 1, 1)?;
            Ok(XPathValue::Boolean(!args[0].to_bool()))
        }
        "true" | "false" => {
            arity(name, &args, 0, 0)?;
            Ok(XPathValue::Boolean(name == "true"))
        }
        "boolean" => {
            arity(name, &args, 1, 1)?;
            Ok(XPathValue::Boolean(args[0].to_bool()))
        }

        // Number
        "number" => {
            arity(name, &args, 0, 1)?;
            let n = match args.pop() {
                Some(value) => value.to_number(),
                None => string_to_number(&ctx.context_node.string_value()),
            };
            Ok(XPathValue::Number(n))
        }
        "sum" => {
            arity(name, &args, 1, 1)?;
            match args.remove(0) {
                XPathValue::NodeSet(nodes) => Ok(XPathValue::Number(
                    nodes
                        .iter()
                        .map(|n| string_to_number(&n.string_value()))
                        .sum(),
                )),
                _ => Err(XPathError::function(name, "argument must be a node-set")),
            }
        }
        "floor" | "ceiling" | "round" => {
            arity(name, &args, 1, 1)?;
            let n = args[0].to_number();
            Ok(XPathValue::Number(match name {
                "floor" => n.floor(),
                "ceiling" => n.ceil(),
                // Halves round towards positive infinity.
                _ => (n + 0.5).floor(),
            }))
        }

        _ => Err(XPathError::function(name, "unknown function")),
    }
}

fn arity<N>(name: &str, args: &[XPathValue<N>], min: usize, max: usize) -> Result<(), XPathError> {
    if args.len() < min || args.len() > max {
        let expected = if min == max {
            format!("{}", min)
        } else {
            format!("{} to {}", min, max)
        };
        return Err(XPathError::function(
            name,
            format!("expected {} arguments, got {}", expected, args.len()),
        ));
    }
    Ok(())
}

fn string_arg<'a, N: XPathNode<'a>>(
    arg: Option<XPathValue<N>>,
    ctx: &EvaluationContext<N>,
) -> String {
    match arg {
        Some(value) => value.to_string(),
        None => ctx.context_node.string_value(),
    }
}

fn substring(s: &str, start: f64, length: Option<f64>) -> String {
    let first = (start + 0.5).floor();
    let last = match length {
        Some(l) => first + (l + 0.5).floor(),
        None => f64::INFINITY,
    };
    s.chars()
        .enumerate()
        .filter(|(i, _)| {
            let pos = (*i + 1) as f64;
            pos >= first && pos < last
        })
        .map(|(_, c)| c)
        .collect()
}
