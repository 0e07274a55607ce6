use rabe_bn::Fr;
use rand::Rng;
use crate::utils::{
    policy::PolicyNode,
    tools::usize_to_fr
};

/// Lagrange coefficients at `x = 0` for the given (distinct) share indices.
///
/// Returns `None` if two indices coincide.
pub fn recover_coefficients(list: &[Fr]) -> Option<Vec<Fr>> {
    let mut coeff: Vec<Fr> = Vec::with_capacity(list.len());
    for (a, i) in list.iter().enumerate() {
        let mut result = Fr::one();
        for (b, j) in list.iter().enumerate() {
            if a != b {
                result = result * ((Fr::zero() - *j) * (*i - *j).inverse()?);
            }
        }
        coeff.push(result);
    }
    Some(coeff)
}

/// Shares `secret` with a random polynomial of degree `k - 1`.
///
/// The result has `n + 1` entries: index 0 is the secret itself, index
/// `i` is the share of the `i`-th child.
pub fn gen_shares(secret: Fr, k: usize, n: usize) -> Vec<Fr> {
    let mut shares: Vec<Fr> = Vec::new();
    if k <= n {
        let mut rng = rand::thread_rng();
        // polynomial coefficients, a[0] is the secret
        let mut a: Vec<Fr> = Vec::with_capacity(k);
        for i in 0..k {
            if i == 0 {
                a.push(secret);
            } else {
                a.push(rng.gen())
            }
        }
        for i in 0..(n + 1) {
            shares.push(polynomial(&a, usize_to_fr(i)));
        }
    }
    shares
}

/// Distributes `secret` over the policy tree. The returned shares are in
/// depth-first leaf order.
pub fn gen_shares_policy(secret: Fr, policy: &PolicyNode) -> Vec<Fr> {
    let mut result: Vec<Fr> = Vec::new();
    collect_shares(secret, policy, &mut result);
    result
}

fn collect_shares(secret: Fr, node: &PolicyNode, result: &mut Vec<Fr>) {
    match node {
        PolicyNode::Leaf(_) => result.push(secret),
        PolicyNode::Gate { threshold, children } => {
            let shares = gen_shares(secret, *threshold, children.len());
            for (i, child) in children.iter().enumerate() {
                collect_shares(shares[i + 1], child, result);
            }
        }
    }
}

/// Horner evaluation of `coeff[0] + coeff[1] x + ...`.
pub fn polynomial(coeff: &[Fr], x: Fr) -> Fr {
    let mut share = Fr::zero();
    for c in coeff.iter().rev() {
        share = share * x + *c;
    }
    share
}

#[cfg(test)]
mod tests {

    use super::*;

    fn recover_secret(shares: &[(usize, Fr)]) -> Fr {
        let indices: Vec<Fr> = shares.iter().map(|(i, _)| usize_to_fr(*i)).collect();
        let coeff = recover_coefficients(&indices).unwrap();
        let mut secret = Fr::zero();
        for (c, (_, share)) in coeff.iter().zip(shares.iter()) {
            secret = secret + (*c * *share);
        }
        secret
    }

    #[test]
    fn test_secret_sharing_or() {
        let mut rng = rand::thread_rng();
        let secret: Fr = rng.gen();
        let shares = gen_shares(secret, 1, 2);
        assert_eq!(shares[0], secret);
        assert_eq!(recover_secret(&[(1, shares[1])]), secret);
        assert_eq!(recover_secret(&[(2, shares[2])]), secret);
    }

    #[test]
    fn test_secret_sharing_and() {
        let mut rng = rand::thread_rng();
        let secret: Fr = rng.gen();
        let shares = gen_shares(secret, 2, 2);
        assert_eq!(recover_secret(&[(1, shares[1]), (2, shares[2])]), secret);
        assert!(recover_secret(&[(1, shares[1])]) != secret);
    }

    #[test]
    fn test_secret_sharing_threshold() {
        let mut rng = rand::thread_rng();
        let secret: Fr = rng.gen();
        let shares = gen_shares(secret, 3, 5);
        assert_eq!(shares.len(), 6);
        assert_eq!(recover_secret(&[(1, shares[1]), (3, shares[3]), (5, shares[5])]), secret);
        assert_eq!(recover_secret(&[(2, shares[2]), (4, shares[4]), (5, shares[5])]), secret);
    }

    #[test]
    fn test_invalid_threshold() {
        assert!(gen_shares(Fr::one(), 3, 2).is_empty());
    }

    #[test]
    fn test_duplicate_indices() {
        assert!(recover_coefficients(&[Fr::one(), Fr::one()]).is_none());
    }

    #[test]
    fn test_polynomial() {
        // 3 + 2x + x^2 at x = 2
        let two = usize_to_fr(2);
        let coeff = vec![usize_to_fr(3), two, Fr::one()];
        assert_eq!(polynomial(&coeff, two), usize_to_fr(11));
    }

    #[test]
    fn test_gen_shares_policy() {
        let mut rng = rand::thread_rng();
        let secret: Fr = rng.gen();
        let policy = PolicyNode::parse("(0 AND 3) OR 2").unwrap();
        let shares = gen_shares_policy(secret, &policy);
        assert_eq!(shares.len(), 3);
        // the OR gate hands the secret unchanged to both branches
        assert_eq!(shares[2], secret);
        assert_eq!(recover_secret(&[(1, shares[0]), (2, shares[1])]), secret);
    }
}
