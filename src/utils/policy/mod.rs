//! Monotone access policies.
//!
//! A policy is a tree of attribute leaves and threshold gates; `AND` and
//! `OR` are the `n-of-n` and `1-of-n` special cases. Policies are written
//! in the human policy language (see [`pest`]) and parsed once into a
//! [`PolicyNode`].
pub mod pest;

use std::collections::BTreeSet;
use std::fmt::{Display, Formatter, Result as FormatResult};
use rabe_bn::Fr;
use crate::error::AbeError;
use crate::utils::{
    secretsharing::recover_coefficients,
    tools::{contains, usize_to_fr}
};

/// A node of a policy tree.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum PolicyNode {
    Leaf(usize),
    Gate {
        threshold: usize,
        children: Vec<PolicyNode>,
    },
}

/// One leaf of a satisfying subtree.
#[derive(Clone, PartialEq, Debug)]
pub struct Witness {
    /// Position of the leaf in depth-first order.
    pub leaf: usize,
    pub attribute: usize,
    /// Product of the Lagrange coefficients on the path from the root.
    pub coefficient: Fr,
}

impl PolicyNode {
    /// Parses a human readable policy such as `(0 AND 3) OR 2`.
    pub fn parse(policy: &str) -> Result<PolicyNode, AbeError> {
        pest::parse(policy)
    }

    pub fn leaf(attribute: usize) -> PolicyNode {
        PolicyNode::Leaf(attribute)
    }

    /// A `k-of-n` gate. Fails unless `1 <= k <= n`.
    pub fn threshold(threshold: usize, children: Vec<PolicyNode>) -> Result<PolicyNode, AbeError> {
        if threshold == 0 || threshold > children.len() {
            return Err(AbeError::PolicySyntaxError(format!(
                "threshold {} is invalid for {} children",
                threshold,
                children.len()
            )));
        }
        Ok(PolicyNode::Gate { threshold, children })
    }

    pub fn and(children: Vec<PolicyNode>) -> Result<PolicyNode, AbeError> {
        let n = children.len();
        PolicyNode::threshold(n, children)
    }

    pub fn or(children: Vec<PolicyNode>) -> Result<PolicyNode, AbeError> {
        PolicyNode::threshold(1, children)
    }

    /// Combines several policies so that satisfying any one of them suffices.
    pub fn any_of(mut policies: Vec<PolicyNode>) -> Result<PolicyNode, AbeError> {
        match policies.len() {
            0 => Err(AbeError::PolicySyntaxError("no policy to combine".to_string())),
            1 => Ok(policies.remove(0)),
            _ => PolicyNode::or(policies),
        }
    }

    /// Attributes of all leaves in depth-first order (with repetitions).
    pub fn leaves(&self) -> Vec<usize> {
        let mut result = Vec::new();
        self.collect_leaves(&mut result);
        result
    }

    fn collect_leaves(&self, result: &mut Vec<usize>) {
        match self {
            PolicyNode::Leaf(attribute) => result.push(*attribute),
            PolicyNode::Gate { children, .. } => {
                for child in children {
                    child.collect_leaves(result);
                }
            }
        }
    }

    pub fn leaf_count(&self) -> usize {
        match self {
            PolicyNode::Leaf(_) => 1,
            PolicyNode::Gate { children, .. } => children.iter().map(|c| c.leaf_count()).sum(),
        }
    }

    /// The distinct attributes mentioned by the policy.
    pub fn attributes(&self) -> BTreeSet<usize> {
        self.leaves().into_iter().collect()
    }

    /// Fails with `InvalidAttribute` for the first leaf outside `[0, universe_size)`.
    /// Checks `1 <= k <= n` on every gate of a tree that was not built
    /// through [`PolicyNode::threshold`].
    pub fn validate(&self) -> Result<(), AbeError> {
        match self {
            PolicyNode::Leaf(_) => Ok(()),
            PolicyNode::Gate { threshold, children } => {
                if *threshold == 0 || *threshold > children.len() {
                    return Err(AbeError::PolicySyntaxError(format!(
                        "threshold {} is invalid for {} children",
                        threshold,
                        children.len()
                    )));
                }
                children.iter().try_for_each(PolicyNode::validate)
            }
        }
    }

    pub fn check_universe(&self, universe_size: usize) -> Result<(), AbeError> {
        match self.leaves().into_iter().find(|a| *a >= universe_size) {
            Some(attribute) => Err(AbeError::InvalidAttribute { attribute, universe_size }),
            None => Ok(()),
        }
    }

    pub fn satisfied_by(&self, attributes: &[usize]) -> bool {
        match self {
            PolicyNode::Leaf(attribute) => contains(attributes, *attribute),
            PolicyNode::Gate { threshold, children } => {
                let mut satisfied = 0usize;
                for child in children {
                    if child.satisfied_by(attributes) {
                        satisfied += 1;
                        if satisfied >= *threshold {
                            return true;
                        }
                    }
                }
                false
            }
        }
    }

    /// Picks the leaves used to reconstruct the root secret, or `None` if
    /// the attributes do not satisfy the policy.
    ///
    /// A gate uses its first `k` satisfied children in declared order, so
    /// the choice is deterministic.
    pub fn minimal_satisfying_set(&self, attributes: &[usize]) -> Option<Vec<Witness>> {
        self.witness(attributes, 0)
    }

    fn witness(&self, attributes: &[usize], first_leaf: usize) -> Option<Vec<Witness>> {
        match self {
            PolicyNode::Leaf(attribute) => {
                if contains(attributes, *attribute) {
                    Some(vec![Witness {
                        leaf: first_leaf,
                        attribute: *attribute,
                        coefficient: Fr::one(),
                    }])
                } else {
                    None
                }
            }
            PolicyNode::Gate { threshold, children } => {
                let mut chosen: Vec<(usize, Vec<Witness>)> = Vec::with_capacity(*threshold);
                let mut offset = first_leaf;
                for (i, child) in children.iter().enumerate() {
                    if chosen.len() == *threshold {
                        break;
                    }
                    if let Some(leaves) = child.witness(attributes, offset) {
                        chosen.push((i + 1, leaves));
                    }
                    offset += child.leaf_count();
                }
                if chosen.len() < *threshold {
                    return None;
                }
                let indices: Vec<Fr> = chosen.iter().map(|(i, _)| usize_to_fr(*i)).collect();
                let coefficients = recover_coefficients(&indices)?;
                let mut result = Vec::new();
                for ((_, leaves), lagrange) in chosen.into_iter().zip(coefficients) {
                    for mut w in leaves {
                        w.coefficient = w.coefficient * lagrange;
                        result.push(w);
                    }
                }
                Some(result)
            }
        }
    }
}

impl Display for PolicyNode {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        match self {
            PolicyNode::Leaf(attribute) => write!(f, "{}", attribute),
            PolicyNode::Gate { threshold, children } => {
                let parts: Vec<String> = children.iter().map(|c| c.to_string()).collect();
                let n = children.len();
                if n >= 2 && *threshold == n {
                    write!(f, "({})", parts.join(" AND "))
                } else if n >= 2 && *threshold == 1 {
                    write!(f, "({})", parts.join(" OR "))
                } else {
                    write!(f, "{}-of-({})", threshold, parts.join(", "))
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(list: &[usize]) -> Vec<usize> {
        list.to_vec()
    }

    #[test]
    fn test_satisfied_by() {
        let policy = PolicyNode::parse("(0 AND 3) OR 2").unwrap();
        assert!(policy.satisfied_by(&attrs(&[0, 3])));
        assert!(policy.satisfied_by(&attrs(&[2])));
        assert!(policy.satisfied_by(&attrs(&[0, 1, 2, 3])));
        assert!(!policy.satisfied_by(&attrs(&[1])));
        assert!(!policy.satisfied_by(&attrs(&[0])));
        assert!(!policy.satisfied_by(&attrs(&[])));
    }

    #[test]
    fn test_threshold_semantics() {
        let or = PolicyNode::parse("1-of-(0, 1, 2)").unwrap();
        let and = PolicyNode::parse("3-of-(0, 1, 2)").unwrap();
        let two = PolicyNode::parse("2-of-(0, 1, 2)").unwrap();
        for set in [vec![], vec![0], vec![1], vec![0, 2], vec![1, 2], vec![0, 1, 2]] {
            let hits = set.len();
            assert_eq!(or.satisfied_by(&set), hits >= 1);
            assert_eq!(two.satisfied_by(&set), hits >= 2);
            assert_eq!(and.satisfied_by(&set), hits >= 3);
        }
        assert_eq!(or, PolicyNode::parse("0 OR 1 OR 2").unwrap());
        assert_eq!(and, PolicyNode::parse("0 AND 1 AND 2").unwrap());
    }

    #[test]
    fn test_minimal_satisfying_set() {
        let policy = PolicyNode::parse("(0 AND 3) OR 2").unwrap();
        let witness = policy.minimal_satisfying_set(&attrs(&[0, 2, 3])).unwrap();
        // the first satisfied child of the OR gate wins
        assert_eq!(witness.len(), 2);
        assert_eq!((witness[0].leaf, witness[0].attribute), (0, 0));
        assert_eq!((witness[1].leaf, witness[1].attribute), (1, 3));
        let witness = policy.minimal_satisfying_set(&attrs(&[2])).unwrap();
        assert_eq!(witness.len(), 1);
        assert_eq!((witness[0].leaf, witness[0].attribute), (2, 2));
        assert_eq!(witness[0].coefficient, Fr::one());
        assert!(policy.minimal_satisfying_set(&attrs(&[1, 3])).is_none());
    }

    #[test]
    fn test_witness_threshold_prefers_first_children() {
        let policy = PolicyNode::parse("2-of-(0, 1, 2)").unwrap();
        let witness = policy.minimal_satisfying_set(&attrs(&[0, 1, 2])).unwrap();
        let leaves: Vec<usize> = witness.iter().map(|w| w.leaf).collect();
        assert_eq!(leaves, vec![0, 1]);
        let witness = policy.minimal_satisfying_set(&attrs(&[0, 2])).unwrap();
        let leaves: Vec<usize> = witness.iter().map(|w| w.leaf).collect();
        assert_eq!(leaves, vec![0, 2]);
    }

    #[test]
    fn test_witness_coefficients_reconstruct() {
        // shares of the polynomial q(x) = x + 5 for indices 1 and 2
        let policy = PolicyNode::parse("0 AND 1").unwrap();
        let witness = policy.minimal_satisfying_set(&attrs(&[0, 1])).unwrap();
        let secret = witness[0].coefficient * usize_to_fr(6) + witness[1].coefficient * usize_to_fr(7);
        assert_eq!(secret, usize_to_fr(5));
    }

    #[test]
    fn test_repeated_attribute() {
        let policy = PolicyNode::parse("(0 AND 1) OR (0 AND 2)").unwrap();
        assert_eq!(policy.leaves(), vec![0, 1, 0, 2]);
        assert_eq!(policy.attributes().into_iter().collect::<Vec<_>>(), vec![0, 1, 2]);
        let witness = policy.minimal_satisfying_set(&attrs(&[0, 2])).unwrap();
        let leaves: Vec<usize> = witness.iter().map(|w| w.leaf).collect();
        assert_eq!(leaves, vec![2, 3]);
    }

    #[test]
    fn test_display_round_trip() {
        for text in ["(0 AND 3) OR 2", "2-of-(0, 1 and 4, 3)", "7", "((0 AND 1) AND 2)", "1-of-(5)"] {
            let policy = PolicyNode::parse(text).unwrap();
            assert_eq!(PolicyNode::parse(&policy.to_string()).unwrap(), policy);
        }
        assert_eq!(PolicyNode::parse("(0 AND 3) OR 2").unwrap().to_string(), "((0 AND 3) OR 2)");
    }

    #[test]
    fn test_constructors() {
        assert!(PolicyNode::threshold(0, vec![PolicyNode::leaf(1)]).is_err());
        assert!(PolicyNode::threshold(2, vec![PolicyNode::leaf(1)]).is_err());
        assert!(PolicyNode::and(vec![]).is_err());
        let combined = PolicyNode::any_of(vec![
            PolicyNode::parse("0 AND 3").unwrap(),
            PolicyNode::parse("2").unwrap(),
        ]).unwrap();
        assert_eq!(combined, PolicyNode::parse("(0 AND 3) OR 2").unwrap());
        assert_eq!(PolicyNode::any_of(vec![PolicyNode::leaf(4)]).unwrap(), PolicyNode::leaf(4));
        assert!(PolicyNode::any_of(vec![]).is_err());
    }

    #[test]
    fn test_validate() {
        assert!(PolicyNode::parse("(0 AND 3) OR 2").unwrap().validate().is_ok());
        let too_high = PolicyNode::Gate { threshold: 3, children: vec![PolicyNode::Leaf(0)] };
        assert!(matches!(too_high.validate(), Err(AbeError::PolicySyntaxError(_))));
        let nested = PolicyNode::Gate {
            threshold: 1,
            children: vec![
                PolicyNode::Leaf(1),
                PolicyNode::Gate { threshold: 0, children: vec![PolicyNode::Leaf(0)] },
            ],
        };
        assert!(matches!(nested.validate(), Err(AbeError::PolicySyntaxError(_))));
        let empty = PolicyNode::Gate { threshold: 1, children: vec![] };
        assert!(empty.validate().is_err());
    }

    #[test]
    fn test_check_universe() {
        let policy = PolicyNode::parse("0 OR 4").unwrap();
        assert!(policy.check_universe(5).is_ok());
        assert_eq!(
            policy.check_universe(4),
            Err(AbeError::InvalidAttribute { attribute: 4, universe_size: 4 })
        );
    }
}
