use crate::error::AbeError;
use crate::utils::policy::PolicyNode;
use pest::iterators::Pair;
use pest_derive::Parser;

#[derive(Parser)]
#[grammar = "human.policy.pest"]
pub(crate) struct HumanPolicyParser;

pub(crate) fn parse(pair: Pair<Rule>) -> Result<PolicyNode, AbeError> {
    match pair.as_rule() {
        Rule::content => match pair.into_inner().next() {
            Some(inner) => parse(inner),
            None => Err(AbeError::PolicySyntaxError("empty policy".to_string())),
        },
        Rule::attribute => {
            let token = pair.as_str();
            token
                .parse::<usize>()
                .map(PolicyNode::Leaf)
                .map_err(|_| AbeError::PolicySyntaxError(format!("unresolvable attribute {}", token)))
        },
        Rule::and => {
            let mut vec = Vec::new();
            for child in pair.into_inner() {
                vec.push(parse(child)?);
            }
            collapse(vec, PolicyNode::and)
        },
        Rule::or => {
            let mut vec = Vec::new();
            for child in pair.into_inner() {
                vec.push(parse(child)?);
            }
            collapse(vec, PolicyNode::or)
        },
        Rule::threshold => {
            let mut inner = pair.into_inner();
            let count = match inner.next() {
                Some(count) => count.as_str(),
                None => return Err(AbeError::PolicySyntaxError("missing threshold".to_string())),
            };
            let threshold = count
                .parse::<usize>()
                .map_err(|_| AbeError::PolicySyntaxError(format!("invalid threshold {}", count)))?;
            let mut vec = Vec::new();
            for child in inner {
                vec.push(parse(child)?);
            }
            PolicyNode::threshold(threshold, vec)
        },
        other => Err(AbeError::PolicySyntaxError(format!("unexpected token {:?}", other))),
    }
}

// a chain of a single operand is the operand itself
fn collapse(
    mut children: Vec<PolicyNode>,
    gate: fn(Vec<PolicyNode>) -> Result<PolicyNode, AbeError>,
) -> Result<PolicyNode, AbeError> {
    if children.len() == 1 {
        Ok(children.remove(0))
    } else {
        gate(children)
    }
}
