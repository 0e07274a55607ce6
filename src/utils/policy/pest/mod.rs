//! Parser for the human policy language.
//!
//! ```text
//! (0 AND 3) OR 2
//! 2-of-(0, 1, 3 and 4)
//! ```
//!
//! Leaves are integer attribute ids (names are resolved beforehand, see
//! [`crate::directory`]). `AND` / `OR` are matched case-insensitively and
//! `AND` binds tighter than `OR`.
use pest::Parser;
use crate::error::AbeError;
use crate::utils::policy::PolicyNode;

pub(crate) mod human;

use self::human::{HumanPolicyParser, Rule};

pub fn parse(policy: &str) -> Result<PolicyNode, AbeError> {
    match HumanPolicyParser::parse(Rule::content, policy) {
        Ok(mut result) => match result.next() {
            Some(content) => human::parse(content),
            None => Err(AbeError::PolicySyntaxError("empty policy".to_string())),
        },
        Err(e) => Err(e.into()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn leaf(a: usize) -> PolicyNode {
        PolicyNode::Leaf(a)
    }

    fn gate(threshold: usize, children: Vec<PolicyNode>) -> PolicyNode {
        PolicyNode::Gate { threshold, children }
    }

    #[test]
    fn test_single_parsing() {
        assert_eq!(parse("7").unwrap(), leaf(7));
        assert_eq!(parse("  ( 7 )  ").unwrap(), leaf(7));
    }

    #[test]
    fn test_and_or_parsing() {
        assert_eq!(
            parse("(0 AND 3) OR 2").unwrap(),
            gate(1, vec![gate(2, vec![leaf(0), leaf(3)]), leaf(2)])
        );
        assert_eq!(parse("0 and 1 and 2").unwrap(), gate(3, vec![leaf(0), leaf(1), leaf(2)]));
    }

    #[test]
    fn test_case_insensitive_connectives() {
        let expected = parse("0 AND 1 OR 2").unwrap();
        assert_eq!(parse("0 and 1 or 2").unwrap(), expected);
        assert_eq!(parse("0 And 1 oR 2").unwrap(), expected);
    }

    #[test]
    fn test_precedence() {
        // AND binds tighter than OR
        assert_eq!(
            parse("0 OR 1 AND 2").unwrap(),
            gate(1, vec![leaf(0), gate(2, vec![leaf(1), leaf(2)])])
        );
    }

    #[test]
    fn test_threshold_parsing() {
        assert_eq!(
            parse("2-of-(0, 1, 3 AND 4)").unwrap(),
            gate(2, vec![leaf(0), leaf(1), gate(2, vec![leaf(3), leaf(4)])])
        );
        assert_eq!(parse("2-OF-(0,1)").unwrap(), gate(2, vec![leaf(0), leaf(1)]));
    }

    #[test]
    fn test_syntax_errors() {
        for policy in [
            "",
            "(0 AND 1",
            "0 AND 1)",
            "0 XOR 1",
            "0 AND",
            "doctor AND 1",
            "0 AND -1",
            "3-of-(0, 1)",
            "0-of-(0, 1)",
            "99999999999999999999999999 OR 1",
        ] {
            assert!(
                matches!(parse(policy), Err(AbeError::PolicySyntaxError(_))),
                "policy {:?} should not parse",
                policy
            );
        }
    }
}
