//! `Waters11` CP-ABE scheme by Brent Waters.
//!
//! * Developed by Brent Waters, "Ciphertext-Policy Attribute-Based Encryption: An Expressive, Efficient, and Provably Secure Realization", see Section 3
//! * Published in Public Key Cryptography - PKC 2011
//! * Available from <https://eprint.iacr.org/2008/290.pdf>
//! * Type: encryption (attribute-based)
//! * Setting: bilinear groups (asymmetric)
//! * Attributes: small universe of integer ids `0..N`
//!
//! The scheme encrypts a single `Gt` element; use [`crate::kem`] to turn it
//! into a symmetric key.
//!
//! # Examples
//!
//! ```
//! use medabe::schemes::waters11::*;
//! use medabe::utils::policy::PolicyNode;
//! use rabe_bn::Gt;
//! use rand::Rng;
//! let scheme = Waters11::new(4).unwrap();
//! let (pk, msk) = scheme.setup();
//! let policy = PolicyNode::parse("(0 AND 3) OR 2").unwrap();
//! let msg: Gt = rand::thread_rng().gen();
//! let ct = scheme.encrypt(&pk, &msg, &policy).unwrap();
//! let sk = scheme.keygen(&pk, &msk, &[0, 3]).unwrap();
//! assert_eq!(scheme.decrypt(&pk, &ct, &sk).unwrap(), msg);
//! ```
use rabe_bn::{Fr, G1, G2, Gt, pairing};
use rand::Rng;
use crate::error::AbeError;
use crate::utils::{
    policy::PolicyNode,
    secretsharing::gen_shares_policy,
    tools::normalize_attributes
};

/// A Waters11 Public Key (PK)
#[derive(Clone, PartialEq, Debug)]
pub struct W11PublicKey {
    pub universe_size: usize,
    pub g1: G1,
    pub g2: G2,
    pub g1_a: G1,
    /// one blinding element per attribute id
    pub h: Vec<G1>,
    pub e_gg_alpha: Gt,
}

/// A Waters11 Master Key (MSK)
#[derive(Clone, PartialEq, Debug)]
pub struct W11MasterKey {
    pub g1_alpha: G1,
}

/// A Waters11 Secret Key (SK), bound to a set of attributes.
#[derive(Clone, PartialEq, Debug)]
pub struct W11SecretKey {
    pub universe_size: usize,
    /// sorted, without duplicates
    pub attributes: Vec<usize>,
    pub k0: G1,
    pub l: G2,
    /// `(x, h[x]^t)` in the order of `attributes`
    pub k: Vec<(usize, G1)>,
}

/// The ciphertext part of a single policy leaf.
#[derive(Clone, PartialEq, Debug)]
pub struct W11Leaf {
    pub attribute: usize,
    pub c: G1,
    pub d: G2,
}

/// A Waters11 Ciphertext (CT). `leaves` follows the depth-first leaf order of `policy`.
#[derive(Clone, PartialEq, Debug)]
pub struct W11Ciphertext {
    pub universe_size: usize,
    pub policy: PolicyNode,
    pub c0: G2,
    pub c_m: Gt,
    pub leaves: Vec<W11Leaf>,
}

impl W11PublicKey {
    fn blinding(&self, attribute: usize) -> Result<G1, AbeError> {
        self.h.get(attribute).copied().ok_or(AbeError::InvalidAttribute {
            attribute,
            universe_size: self.h.len(),
        })
    }
}

impl W11SecretKey {
    fn component(&self, attribute: usize) -> Option<&G1> {
        self.k.iter().find(|(x, _)| *x == attribute).map(|(_, k)| k)
    }
}

/// A Waters11 instance over a fixed attribute universe.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Waters11 {
    universe_size: usize,
}

impl Waters11 {
    pub fn new(universe_size: usize) -> Result<Waters11, AbeError> {
        if universe_size == 0 {
            return Err(AbeError::Config("universe size must be positive".to_string()));
        }
        Ok(Waters11 { universe_size })
    }

    pub fn universe_size(&self) -> usize {
        self.universe_size
    }

    fn check_universe(&self, universe_size: usize) -> Result<(), AbeError> {
        if universe_size == self.universe_size {
            Ok(())
        } else {
            Err(AbeError::GroupMismatch {
                expected: format!("universe of size {}", self.universe_size),
                found: format!("universe of size {}", universe_size),
            })
        }
    }

    /// The setup algorithm. Generates a W11PublicKey and a W11MasterKey.
    pub fn setup(&self) -> (W11PublicKey, W11MasterKey) {
        let mut rng = rand::thread_rng();
        let g1: G1 = rng.gen();
        let g2: G2 = rng.gen();
        let alpha: Fr = rng.gen();
        let a: Fr = rng.gen();
        let mut h: Vec<G1> = Vec::with_capacity(self.universe_size);
        for _ in 0..self.universe_size {
            h.push(rng.gen());
        }
        (
            W11PublicKey {
                universe_size: self.universe_size,
                g1,
                g2,
                g1_a: g1 * a,
                h,
                e_gg_alpha: pairing(g1, g2).pow(alpha),
            },
            W11MasterKey { g1_alpha: g1 * alpha },
        )
    }

    /// The key generation algorithm. Generates a W11SecretKey for a set of attribute ids.
    ///
    /// # Arguments
    ///
    ///	* `pk` - A Public Key (PK), generated by [`Waters11::setup`]
    ///	* `msk` - The matching Master Key (MSK)
    ///	* `attributes` - Attribute ids in `[0, N)`; duplicates are ignored
    ///
    pub fn keygen(
        &self,
        pk: &W11PublicKey,
        msk: &W11MasterKey,
        attributes: &[usize]
    ) -> Result<W11SecretKey, AbeError> {
        self.check_universe(pk.universe_size)?;
        if attributes.is_empty() {
            return Err(AbeError::EmptyAttributeSet);
        }
        let attributes = normalize_attributes(attributes);
        if let Some(attribute) = attributes.iter().find(|x| **x >= self.universe_size) {
            return Err(AbeError::InvalidAttribute {
                attribute: *attribute,
                universe_size: self.universe_size,
            });
        }
        let t: Fr = rand::thread_rng().gen();
        let mut k = Vec::with_capacity(attributes.len());
        for x in attributes.iter() {
            k.push((*x, pk.blinding(*x)? * t));
        }
        Ok(W11SecretKey {
            universe_size: self.universe_size,
            attributes,
            k0: msk.g1_alpha + pk.g1_a * t,
            l: pk.g2 * t,
            k,
        })
    }

    /// The encrypt algorithm. Encrypts `msg` under `policy`.
    ///
    /// # Arguments
    ///
    ///	* `pk` - A Public Key (PK), generated by [`Waters11::setup`]
    ///	* `msg` - The `Gt` element to hide
    ///	* `policy` - An access policy over attribute ids in `[0, N)`
    ///
    pub fn encrypt(
        &self,
        pk: &W11PublicKey,
        msg: &Gt,
        policy: &PolicyNode
    ) -> Result<W11Ciphertext, AbeError> {
        self.check_universe(pk.universe_size)?;
        policy.validate()?;
        policy.check_universe(self.universe_size)?;
        let mut rng = rand::thread_rng();
        let s: Fr = rng.gen();
        let shares = gen_shares_policy(s, policy);
        let mut leaves: Vec<W11Leaf> = Vec::with_capacity(shares.len());
        for (attribute, lambda) in policy.leaves().into_iter().zip(shares) {
            let r: Fr = rng.gen();
            leaves.push(W11Leaf {
                attribute,
                c: pk.g1_a * lambda - pk.blinding(attribute)? * r,
                d: pk.g2 * r,
            });
        }
        Ok(W11Ciphertext {
            universe_size: self.universe_size,
            policy: policy.clone(),
            c0: pk.g2 * s,
            c_m: pk.e_gg_alpha.pow(s) * *msg,
            leaves,
        })
    }

    /// The decrypt algorithm. Recovers the `Gt` element of a W11Ciphertext
    /// with a matching W11SecretKey.
    ///
    /// Fails with `PolicyNotSatisfied` if the attributes of `sk` do not
    /// satisfy the policy of `ct`.
    pub fn decrypt(
        &self,
        pk: &W11PublicKey,
        ct: &W11Ciphertext,
        sk: &W11SecretKey
    ) -> Result<Gt, AbeError> {
        self.check_universe(pk.universe_size)?;
        self.check_universe(sk.universe_size)?;
        self.check_universe(ct.universe_size)?;
        ct.policy.validate()?;
        let policy_leaves = ct.policy.leaves();
        if policy_leaves.len() != ct.leaves.len() {
            return Err(AbeError::MalformedElement(format!(
                "ciphertext has {} leaf components but its policy has {} leaves",
                ct.leaves.len(),
                policy_leaves.len()
            )));
        }
        if let Some(i) = policy_leaves.iter().zip(ct.leaves.iter()).position(|(x, leaf)| *x != leaf.attribute) {
            return Err(AbeError::MalformedElement(format!(
                "leaf {} names attribute {} but the policy expects {}",
                i, ct.leaves[i].attribute, policy_leaves[i]
            )));
        }
        let witness = ct
            .policy
            .minimal_satisfying_set(&sk.attributes)
            .ok_or(AbeError::PolicyNotSatisfied)?;
        let mut a = Gt::one();
        for w in witness {
            let leaf = &ct.leaves[w.leaf];
            let k_x = sk
                .component(w.attribute)
                .ok_or_else(|| AbeError::MalformedElement(format!("secret key lacks K_{}", w.attribute)))?;
            a = a * (pairing(leaf.c, sk.l) * pairing(*k_x, leaf.d)).pow(w.coefficient);
        }
        Ok(ct.c_m * a * pairing(sk.k0, ct.c0).inverse())
    }
}
