//! Key encapsulation on top of [`Waters11`].
//!
//! `wrap` hides a uniformly random `Gt` element under a policy and derives
//! the AES-256 key from it as `SHA-256(serialize(m))`. A verification tag
//! over the same element travels with the ciphertext so that `unwrap` can
//! tell a wrong recovery apart from a successful one.
//!
//! ```
//! use medabe::kem;
//! use medabe::schemes::waters11::Waters11;
//! use medabe::utils::policy::PolicyNode;
//! let scheme = Waters11::new(4).unwrap();
//! let (pk, msk) = scheme.setup();
//! let (ek, key) = kem::wrap(&pk, &PolicyNode::parse("0 OR 1").unwrap()).unwrap();
//! let sk = scheme.keygen(&pk, &msk, &[1]).unwrap();
//! assert_eq!(kem::unwrap(&pk, &ek, &sk).unwrap(), key);
//! ```
use rabe_bn::Gt;
use rand::Rng;
use crate::error::AbeError;
use crate::schemes::waters11::{W11Ciphertext, W11PublicKey, W11SecretKey, Waters11};
use crate::utils::{
    aes::SymmetricKey,
    group::{Element, PairingGroup},
    hash::{sha256, verification_tag},
    policy::PolicyNode
};

/// Name of the verification tag construction, as written into records.
pub const TAG_METHOD: &str = "sha3-256(sha-256)";

/// A Waters11 ciphertext of the key material plus its verification tag.
#[derive(Clone, PartialEq, Debug)]
pub struct EncapsulatedKey {
    pub ct: W11Ciphertext,
    pub tag: [u8; 32],
}

fn derive(msg: &Gt) -> Result<(SymmetricKey, [u8; 32]), AbeError> {
    let bytes = PairingGroup.serialize(&Element::GT(*msg))?;
    Ok((SymmetricKey::from_bytes(sha256(&bytes)), verification_tag(&bytes)))
}

/// Encapsulates a fresh symmetric key under `policy`.
pub fn wrap(pk: &W11PublicKey, policy: &PolicyNode) -> Result<(EncapsulatedKey, SymmetricKey), AbeError> {
    let scheme = Waters11::new(pk.universe_size)?;
    let msg: Gt = rand::thread_rng().gen();
    let ct = scheme.encrypt(pk, &msg, policy)?;
    let (key, tag) = derive(&msg)?;
    Ok((EncapsulatedKey { ct, tag }, key))
}

/// Recovers the symmetric key of `ek` with `sk`.
///
/// Errors of the scheme are returned unchanged; a recovered element whose
/// tag differs from the stored one yields `KeyVerificationFailed`.
pub fn unwrap(pk: &W11PublicKey, ek: &EncapsulatedKey, sk: &W11SecretKey) -> Result<SymmetricKey, AbeError> {
    let scheme = Waters11::new(pk.universe_size)?;
    let msg = scheme.decrypt(pk, &ek.ct, sk)?;
    let (key, tag) = derive(&msg)?;
    if tag != ek.tag {
        return Err(AbeError::KeyVerificationFailed);
    }
    Ok(key)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::utils::aes;

    #[test]
    fn test_wrap_unwrap() {
        let scheme = Waters11::new(4).unwrap();
        let (pk, msk) = scheme.setup();
        let policy = PolicyNode::parse("(0 AND 3) OR 2").unwrap();
        let (ek, key) = wrap(&pk, &policy).unwrap();
        assert_eq!(key.len(), 32);
        let sk_a = scheme.keygen(&pk, &msk, &[0, 3]).unwrap();
        let sk_b = scheme.keygen(&pk, &msk, &[2]).unwrap();
        // every satisfying key recovers the same symmetric key, every time
        assert_eq!(unwrap(&pk, &ek, &sk_a).unwrap(), key);
        assert_eq!(unwrap(&pk, &ek, &sk_a).unwrap(), key);
        assert_eq!(unwrap(&pk, &ek, &sk_b).unwrap(), key);
    }

    #[test]
    fn test_fresh_key_per_wrap() {
        let scheme = Waters11::new(2).unwrap();
        let (pk, _) = scheme.setup();
        let policy = PolicyNode::parse("0").unwrap();
        let (first, k1) = wrap(&pk, &policy).unwrap();
        let (second, k2) = wrap(&pk, &policy).unwrap();
        assert_ne!(k1, k2);
        assert_ne!(first.tag, second.tag);
    }

    #[test]
    fn test_unwrap_not_satisfied() {
        let scheme = Waters11::new(4).unwrap();
        let (pk, msk) = scheme.setup();
        let (ek, _) = wrap(&pk, &PolicyNode::parse("0 AND 1").unwrap()).unwrap();
        let sk = scheme.keygen(&pk, &msk, &[0, 2, 3]).unwrap();
        assert_eq!(unwrap(&pk, &ek, &sk), Err(AbeError::PolicyNotSatisfied));
    }

    #[test]
    fn test_unwrap_tag_mismatch() {
        let scheme = Waters11::new(4).unwrap();
        let (pk, msk) = scheme.setup();
        let (mut ek, _) = wrap(&pk, &PolicyNode::parse("1").unwrap()).unwrap();
        let sk = scheme.keygen(&pk, &msk, &[1]).unwrap();
        ek.tag[0] ^= 1;
        assert_eq!(unwrap(&pk, &ek, &sk), Err(AbeError::KeyVerificationFailed));
        // a key from another authority recovers garbage, which the tag catches
        let (other_pk, other_msk) = scheme.setup();
        let (ek, _) = wrap(&pk, &PolicyNode::parse("1").unwrap()).unwrap();
        let foreign = scheme.keygen(&other_pk, &other_msk, &[1]).unwrap();
        assert_eq!(unwrap(&pk, &ek, &foreign), Err(AbeError::KeyVerificationFailed));
    }

    #[test]
    fn test_diagnosis_round_trip() {
        let scheme = Waters11::new(4).unwrap();
        let (pk, msk) = scheme.setup();
        let (ek, key) = wrap(&pk, &PolicyNode::parse("0 OR 1").unwrap()).unwrap();
        assert_eq!(key.as_bytes().len(), 32);
        let iv = [0x24u8; aes::IV_LENGTH];
        let blob = aes::encrypt(b"diagnosis: flu", &key, &iv).unwrap();
        let sk = scheme.keygen(&pk, &msk, &[1]).unwrap();
        let recovered = unwrap(&pk, &ek, &sk).unwrap();
        assert_eq!(aes::decrypt(&blob, &recovered, &iv).unwrap(), b"diagnosis: flu".to_vec());
    }
}
