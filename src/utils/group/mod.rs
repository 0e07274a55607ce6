//! Pairing group wrapper around [`rabe_bn`].
//!
//! Elements of the four algebraic structures (`Zr`, `G1`, `G2`, `Gt`) are
//! wrapped into a tagged [`Element`] so that serialized bytes are
//! self-describing: the first byte names the element type, the rest is the
//! canonical `borsh` encoding of the element.
//!
//! ```
//! use medabe::utils::group::{PairingGroup, ElementType};
//! let group = PairingGroup::default();
//! let e = group.sample(ElementType::GT);
//! let bytes = group.serialize(&e).unwrap();
//! assert_eq!(group.deserialize(&bytes, ElementType::GT).unwrap(), e);
//! ```
use std::fmt::{Display, Formatter, Result as FormatResult};
use base64::{Engine as _, engine::general_purpose::STANDARD};
use rabe_bn::{Fr, G1, G2, Gt, pairing};
use rand::Rng;
use crate::error::AbeError;

/// Name of the only curve this crate is built for.
pub const GROUP_NAME: &str = "BN254";

/// The algebraic structure an element lives in.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Hash)]
pub enum ElementType {
    ZR,
    G1,
    G2,
    GT,
}

impl ElementType {
    fn tag(&self) -> u8 {
        match self {
            ElementType::ZR => 0,
            ElementType::G1 => 1,
            ElementType::G2 => 2,
            ElementType::GT => 3,
        }
    }

    fn from_tag(tag: u8) -> Option<ElementType> {
        match tag {
            0 => Some(ElementType::ZR),
            1 => Some(ElementType::G1),
            2 => Some(ElementType::G2),
            3 => Some(ElementType::GT),
            _ => None,
        }
    }
}

impl Display for ElementType {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        let name = match self {
            ElementType::ZR => "ZR",
            ElementType::G1 => "G1",
            ElementType::G2 => "G2",
            ElementType::GT => "GT",
        };
        write!(f, "{}", name)
    }
}

/// A group element of any of the four types.
#[derive(Clone, Copy, PartialEq, Debug)]
pub enum Element {
    ZR(Fr),
    G1(G1),
    G2(G2),
    GT(Gt),
}

impl Element {
    pub fn element_type(&self) -> ElementType {
        match self {
            Element::ZR(_) => ElementType::ZR,
            Element::G1(_) => ElementType::G1,
            Element::G2(_) => ElementType::G2,
            Element::GT(_) => ElementType::GT,
        }
    }

    /// The group operation. `G1` and `G2` are written additively by `rabe_bn`.
    pub fn mul(&self, other: &Element) -> Result<Element, AbeError> {
        match (self, other) {
            (Element::ZR(a), Element::ZR(b)) => Ok(Element::ZR(*a * *b)),
            (Element::G1(a), Element::G1(b)) => Ok(Element::G1(*a + *b)),
            (Element::G2(a), Element::G2(b)) => Ok(Element::G2(*a + *b)),
            (Element::GT(a), Element::GT(b)) => Ok(Element::GT(*a * *b)),
            (a, b) => Err(mismatch(a.element_type(), b.element_type())),
        }
    }

    /// Exponentiation by a scalar.
    pub fn pow(&self, exp: &Fr) -> Element {
        match self {
            Element::ZR(a) => Element::ZR(a.pow(*exp)),
            Element::G1(a) => Element::G1(*a * *exp),
            Element::G2(a) => Element::G2(*a * *exp),
            Element::GT(a) => Element::GT(a.pow(*exp)),
        }
    }

    /// Inverse with respect to the group operation.
    pub fn inverse(&self) -> Result<Element, AbeError> {
        match self {
            Element::ZR(a) => a.inverse().map(Element::ZR).ok_or(AbeError::InvalidElement {
                expected: "invertible ZR".to_string(),
                found: "zero".to_string(),
            }),
            Element::G1(a) => Ok(Element::G1(-*a)),
            Element::G2(a) => Ok(Element::G2(-*a)),
            Element::GT(a) => Ok(Element::GT(a.inverse())),
        }
    }

    pub fn as_zr(&self) -> Result<Fr, AbeError> {
        match self {
            Element::ZR(v) => Ok(*v),
            other => Err(wrong_type(ElementType::ZR, other.element_type())),
        }
    }

    pub fn as_g1(&self) -> Result<G1, AbeError> {
        match self {
            Element::G1(v) => Ok(*v),
            other => Err(wrong_type(ElementType::G1, other.element_type())),
        }
    }

    pub fn as_g2(&self) -> Result<G2, AbeError> {
        match self {
            Element::G2(v) => Ok(*v),
            other => Err(wrong_type(ElementType::G2, other.element_type())),
        }
    }

    pub fn as_gt(&self) -> Result<Gt, AbeError> {
        match self {
            Element::GT(v) => Ok(*v),
            other => Err(wrong_type(ElementType::GT, other.element_type())),
        }
    }
}

fn mismatch(expected: ElementType, found: ElementType) -> AbeError {
    AbeError::GroupMismatch {
        expected: expected.to_string(),
        found: found.to_string(),
    }
}

fn wrong_type(expected: ElementType, found: ElementType) -> AbeError {
    AbeError::InvalidElement {
        expected: expected.to_string(),
        found: found.to_string(),
    }
}

/// The bilinear group `e: G1 x G2 -> GT` with scalar field `Zr`.
#[derive(Clone, Copy, PartialEq, Eq, Debug, Default)]
pub struct PairingGroup;

impl PairingGroup {
    pub fn name(&self) -> &'static str {
        GROUP_NAME
    }

    /// Fails with `GroupMismatch` when `name` denotes another group.
    pub fn ensure_same(&self, name: &str) -> Result<(), AbeError> {
        if name == GROUP_NAME {
            Ok(())
        } else {
            Err(AbeError::GroupMismatch {
                expected: GROUP_NAME.to_string(),
                found: name.to_string(),
            })
        }
    }

    /// Samples a uniformly random element of the given type.
    pub fn sample(&self, element_type: ElementType) -> Element {
        let mut rng = rand::thread_rng();
        match element_type {
            ElementType::ZR => Element::ZR(rng.gen()),
            ElementType::G1 => Element::G1(rng.gen()),
            ElementType::G2 => Element::G2(rng.gen()),
            ElementType::GT => Element::GT(rng.gen()),
        }
    }

    pub fn pair(&self, g1: &G1, g2: &G2) -> Gt {
        pairing(*g1, *g2)
    }

    /// Type tag followed by the `borsh` encoding of the element.
    pub fn serialize(&self, element: &Element) -> Result<Vec<u8>, AbeError> {
        let body = match element {
            Element::ZR(v) => borsh::to_vec(v),
            Element::G1(v) => borsh::to_vec(v),
            Element::G2(v) => borsh::to_vec(v),
            Element::GT(v) => borsh::to_vec(v),
        }
        .map_err(|e| AbeError::MalformedElement(e.to_string()))?;
        let mut bytes = Vec::with_capacity(body.len() + 1);
        bytes.push(element.element_type().tag());
        bytes.extend_from_slice(&body);
        Ok(bytes)
    }

    /// Inverse of [`PairingGroup::serialize`].
    ///
    /// Corrupt bytes yield `MalformedElement`; a well-formed element of
    /// another type yields `InvalidElement`.
    pub fn deserialize(&self, bytes: &[u8], expected: ElementType) -> Result<Element, AbeError> {
        let (tag, body) = match bytes.split_first() {
            Some((tag, body)) => (*tag, body),
            None => return Err(AbeError::malformed("empty element encoding")),
        };
        let found = ElementType::from_tag(tag)
            .ok_or_else(|| AbeError::MalformedElement(format!("unknown element tag {}", tag)))?;
        if found != expected {
            return Err(wrong_type(expected, found));
        }
        let decoded = match found {
            ElementType::ZR => borsh::from_slice::<Fr>(body).map(Element::ZR),
            ElementType::G1 => borsh::from_slice::<G1>(body).map(Element::G1),
            ElementType::G2 => borsh::from_slice::<G2>(body).map(Element::G2),
            ElementType::GT => borsh::from_slice::<Gt>(body).map(Element::GT),
        };
        decoded.map_err(|e| AbeError::MalformedElement(format!("{} ({} bytes): {}", found, body.len(), e)))
    }

    pub fn serialize_b64(&self, element: &Element) -> Result<String, AbeError> {
        Ok(encode_b64(&self.serialize(element)?))
    }

    pub fn deserialize_b64(&self, data: &str, expected: ElementType) -> Result<Element, AbeError> {
        self.deserialize(&decode_b64(data)?, expected)
    }
}

/// Standard, padded base64.
pub fn encode_b64(bytes: &[u8]) -> String {
    STANDARD.encode(bytes)
}

/// Decodes base64 produced by lenient encoders: whitespace is dropped, the
/// URL-safe alphabet is mapped to the standard one and missing `=` padding
/// is restored before decoding.
pub fn decode_b64(data: &str) -> Result<Vec<u8>, AbeError> {
    let mut normalized: String = data
        .chars()
        .filter(|c| !c.is_whitespace())
        .map(|c| match c {
            '-' => '+',
            '_' => '/',
            other => other,
        })
        .collect();
    // only trailing padding may be dropped
    normalized.truncate(normalized.trim_end_matches('=').len());
    while normalized.len() % 4 != 0 {
        normalized.push('=');
    }
    Ok(STANDARD.decode(normalized)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rabe_bn::Group;

    #[test]
    fn test_serialize_all_types() {
        let group = PairingGroup::default();
        for element_type in [ElementType::ZR, ElementType::G1, ElementType::G2, ElementType::GT] {
            let element = group.sample(element_type);
            let bytes = group.serialize(&element).unwrap();
            assert_eq!(bytes[0], element_type.tag());
            assert_eq!(group.deserialize(&bytes, element_type).unwrap(), element);
        }
    }

    #[test]
    fn test_serialize_is_canonical() {
        let group = PairingGroup::default();
        let element = group.sample(ElementType::GT);
        let bytes = group.serialize(&element).unwrap();
        let again = group.deserialize(&bytes, ElementType::GT).unwrap();
        assert_eq!(group.serialize(&again).unwrap(), bytes);
    }

    #[test]
    fn test_deserialize_wrong_type() {
        let group = PairingGroup::default();
        let bytes = group.serialize(&group.sample(ElementType::G1)).unwrap();
        assert_eq!(
            group.deserialize(&bytes, ElementType::G2),
            Err(AbeError::InvalidElement {
                expected: "G2".to_string(),
                found: "G1".to_string()
            })
        );
    }

    #[test]
    fn test_deserialize_malformed() {
        let group = PairingGroup::default();
        let mut bytes = group.serialize(&group.sample(ElementType::GT)).unwrap();
        assert!(matches!(group.deserialize(&[], ElementType::GT), Err(AbeError::MalformedElement(_))));
        assert!(matches!(group.deserialize(&[9, 1, 2], ElementType::GT), Err(AbeError::MalformedElement(_))));
        bytes.truncate(bytes.len() / 2);
        assert!(matches!(group.deserialize(&bytes, ElementType::GT), Err(AbeError::MalformedElement(_))));
    }

    #[test]
    fn test_base64_missing_padding() {
        let group = PairingGroup::default();
        let element = group.sample(ElementType::G2);
        let encoded = group.serialize_b64(&element).unwrap();
        let unpadded = encoded.trim_end_matches('=');
        assert_eq!(group.deserialize_b64(unpadded, ElementType::G2).unwrap(), element);
        assert_eq!(decode_b64("YQ").unwrap(), b"a".to_vec());
        assert_eq!(decode_b64("YWI").unwrap(), b"ab".to_vec());
        assert_eq!(decode_b64(" YW\nJj ").unwrap(), b"abc".to_vec());
        assert_eq!(decode_b64("YQ==").unwrap(), b"a".to_vec());
        assert_eq!(decode_b64("YQ=").unwrap(), b"a".to_vec());
        assert!(decode_b64("Y=Q").is_err());
        assert!(decode_b64("Y=Q=").is_err());
        assert_eq!(decode_b64("-_8").unwrap(), STANDARD.decode("+/8=").unwrap());
    }

    #[test]
    fn test_element_ops() {
        let group = PairingGroup::default();
        let g1 = group.sample(ElementType::G1);
        let inv = g1.inverse().unwrap();
        assert_eq!(g1.mul(&inv).unwrap(), Element::G1(G1::zero()));
        let gt = group.sample(ElementType::GT);
        assert_eq!(gt.mul(&gt.inverse().unwrap()).unwrap(), Element::GT(Gt::one()));
        let two = Fr::one() + Fr::one();
        assert_eq!(gt.pow(&two), gt.mul(&gt).unwrap());
        assert!(matches!(g1.mul(&gt), Err(AbeError::GroupMismatch { .. })));
        assert!(Element::ZR(Fr::zero()).inverse().is_err());
    }

    #[test]
    fn test_pairing_is_bilinear() {
        let group = PairingGroup::default();
        let g1 = group.sample(ElementType::G1).as_g1().unwrap();
        let g2 = group.sample(ElementType::G2).as_g2().unwrap();
        let a = group.sample(ElementType::ZR).as_zr().unwrap();
        assert_eq!(group.pair(&(g1 * a), &g2), group.pair(&g1, &g2).pow(a));
        assert_eq!(group.pair(&g1, &(g2 * a)), group.pair(&g1, &g2).pow(a));
    }

    #[test]
    fn test_group_name() {
        let group = PairingGroup::default();
        assert!(group.ensure_same("BN254").is_ok());
        assert!(matches!(group.ensure_same("SS512"), Err(AbeError::GroupMismatch { .. })));
    }
}
