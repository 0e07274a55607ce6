//! Serialized forms of keys, ciphertexts and encrypted fields.
//!
//! Every record names its pairing group and stores each group element as a
//! base64 string (type tag + canonical bytes, see [`PairingGroup::serialize`]).
//! Record shapes are fixed: a missing, unexpected or mis-typed component is
//! rejected instead of being ignored.
use std::collections::{BTreeMap, BTreeSet};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use crate::error::AbeError;
use crate::kem::{EncapsulatedKey, TAG_METHOD};
use crate::schemes::waters11::{W11Ciphertext, W11Leaf, W11MasterKey, W11PublicKey, W11SecretKey};
use crate::utils::{
    aes::{SealedField, IV_LENGTH},
    group::{decode_b64, encode_b64, Element, ElementType, PairingGroup},
    policy::PolicyNode,
    tools::normalize_attributes
};

/// JSON and base64(JSON) envelopes shared by all records.
pub trait Envelope: Serialize + DeserializeOwned {
    fn to_json(&self) -> Result<String, AbeError> {
        Ok(serde_json::to_string(self)?)
    }

    fn from_json(data: &str) -> Result<Self, AbeError> {
        Ok(serde_json::from_str(data)?)
    }

    fn to_base64(&self) -> Result<String, AbeError> {
        Ok(encode_b64(self.to_json()?.as_bytes()))
    }

    /// Accepts unpadded and URL-safe input.
    fn from_base64(data: &str) -> Result<Self, AbeError> {
        Ok(serde_json::from_slice(&decode_b64(data)?)?)
    }
}

/// Element name to base64 encoding.
pub type Components = BTreeMap<String, String>;

/// The verification tag of an encapsulated key.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct TagRecord {
    pub method: String,
    pub value: String,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CiphertextRecord {
    pub group: String,
    pub universe_size: usize,
    pub policy: String,
    pub components: Components,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tag: Option<TagRecord>,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SecretKeyRecord {
    pub group: String,
    pub universe_size: usize,
    pub attributes: Vec<usize>,
    pub components: Components,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct PublicKeyRecord {
    pub group: String,
    pub universe_size: usize,
    pub components: Components,
}

#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct MasterKeyRecord {
    pub group: String,
    pub components: Components,
}

/// One AES-GCM encrypted field: IV and `ciphertext || tag`, both base64.
#[derive(Clone, PartialEq, Eq, Debug, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct FieldRecord {
    pub iv: String,
    pub blob: String,
}

impl Envelope for CiphertextRecord {}
impl Envelope for SecretKeyRecord {}
impl Envelope for PublicKeyRecord {}
impl Envelope for MasterKeyRecord {}
impl Envelope for FieldRecord {}

struct Writer {
    components: Components,
}

impl Writer {
    fn new() -> Writer {
        Writer { components: Components::new() }
    }

    fn put(&mut self, name: &str, element: Element) -> Result<(), AbeError> {
        self.components.insert(name.to_string(), PairingGroup.serialize_b64(&element)?);
        Ok(())
    }

    fn finish(self) -> Components {
        self.components
    }
}

/// Checks the component names against `expected`, then decodes on demand.
struct Reader<'a> {
    components: &'a Components,
}

impl<'a> Reader<'a> {
    fn open(group: &str, components: &'a Components, expected: &BTreeSet<String>) -> Result<Reader<'a>, AbeError> {
        PairingGroup.ensure_same(group)?;
        if let Some(name) = expected.iter().find(|n| !components.contains_key(*n)) {
            return Err(AbeError::MalformedElement(format!("missing component {}", name)));
        }
        if let Some(name) = components.keys().find(|n| !expected.contains(*n)) {
            return Err(AbeError::MalformedElement(format!("unexpected component {}", name)));
        }
        Ok(Reader { components })
    }

    fn get(&self, name: &str, element_type: ElementType) -> Result<Element, AbeError> {
        let data = self
            .components
            .get(name)
            .ok_or_else(|| AbeError::MalformedElement(format!("missing component {}", name)))?;
        PairingGroup.deserialize_b64(data, element_type)
    }
}

fn names(fixed: &[&str], indexed: &[(&str, Vec<usize>)]) -> BTreeSet<String> {
    let mut result: BTreeSet<String> = fixed.iter().map(|n| n.to_string()).collect();
    for (prefix, indices) in indexed {
        for i in indices {
            result.insert(format!("{}_{}", prefix, i));
        }
    }
    result
}

fn check_count(components: &Components, expected: usize) -> Result<(), AbeError> {
    if components.len() == expected {
        Ok(())
    } else {
        Err(AbeError::MalformedElement(format!(
            "expected {} components but found {}",
            expected,
            components.len()
        )))
    }
}

impl CiphertextRecord {
    pub fn from_ciphertext(ct: &W11Ciphertext) -> Result<CiphertextRecord, AbeError> {
        let mut writer = Writer::new();
        writer.put("c0", Element::G2(ct.c0))?;
        writer.put("c_m", Element::GT(ct.c_m))?;
        for (i, leaf) in ct.leaves.iter().enumerate() {
            writer.put(&format!("C_{}", i), Element::G1(leaf.c))?;
            writer.put(&format!("D_{}", i), Element::G2(leaf.d))?;
        }
        Ok(CiphertextRecord {
            group: PairingGroup.name().to_string(),
            universe_size: ct.universe_size,
            policy: ct.policy.to_string(),
            components: writer.finish(),
            tag: None,
        })
    }

    pub fn to_ciphertext(&self) -> Result<W11Ciphertext, AbeError> {
        PairingGroup.ensure_same(&self.group)?;
        let policy = PolicyNode::parse(&self.policy)?;
        policy.check_universe(self.universe_size)?;
        let attributes = policy.leaves();
        check_count(&self.components, 2 + 2 * attributes.len())?;
        let leaf_ids: Vec<usize> = (0..attributes.len()).collect();
        let expected = names(&["c0", "c_m"], &[("C", leaf_ids.clone()), ("D", leaf_ids)]);
        let reader = Reader::open(&self.group, &self.components, &expected)?;
        let mut leaves = Vec::with_capacity(attributes.len());
        for (i, attribute) in attributes.into_iter().enumerate() {
            leaves.push(W11Leaf {
                attribute,
                c: reader.get(&format!("C_{}", i), ElementType::G1)?.as_g1()?,
                d: reader.get(&format!("D_{}", i), ElementType::G2)?.as_g2()?,
            });
        }
        Ok(W11Ciphertext {
            universe_size: self.universe_size,
            policy,
            c0: reader.get("c0", ElementType::G2)?.as_g2()?,
            c_m: reader.get("c_m", ElementType::GT)?.as_gt()?,
            leaves,
        })
    }

    pub fn from_encapsulated(ek: &EncapsulatedKey) -> Result<CiphertextRecord, AbeError> {
        let mut record = CiphertextRecord::from_ciphertext(&ek.ct)?;
        record.tag = Some(TagRecord {
            method: TAG_METHOD.to_string(),
            value: encode_b64(&ek.tag),
        });
        Ok(record)
    }

    /// Fails with `MalformedElement` if the record carries no (or an unknown) tag.
    pub fn to_encapsulated(&self) -> Result<EncapsulatedKey, AbeError> {
        let tag = match &self.tag {
            Some(tag) if tag.method == TAG_METHOD => tag,
            Some(tag) => {
                return Err(AbeError::MalformedElement(format!("unknown tag method {}", tag.method)))
            }
            None => return Err(AbeError::malformed("missing key verification tag")),
        };
        let value: [u8; 32] = decode_b64(&tag.value)?.as_slice().try_into()?;
        Ok(EncapsulatedKey {
            ct: self.to_ciphertext()?,
            tag: value,
        })
    }
}

impl SecretKeyRecord {
    pub fn from_secret_key(sk: &W11SecretKey) -> Result<SecretKeyRecord, AbeError> {
        let mut writer = Writer::new();
        writer.put("k0", Element::G1(sk.k0))?;
        writer.put("L", Element::G2(sk.l))?;
        for (x, k) in sk.k.iter() {
            writer.put(&format!("K_{}", x), Element::G1(*k))?;
        }
        Ok(SecretKeyRecord {
            group: PairingGroup.name().to_string(),
            universe_size: sk.universe_size,
            attributes: sk.attributes.clone(),
            components: writer.finish(),
        })
    }

    pub fn to_secret_key(&self) -> Result<W11SecretKey, AbeError> {
        PairingGroup.ensure_same(&self.group)?;
        if self.attributes.is_empty() {
            return Err(AbeError::EmptyAttributeSet);
        }
        if normalize_attributes(&self.attributes) != self.attributes {
            return Err(AbeError::malformed("attributes must be sorted and distinct"));
        }
        if let Some(attribute) = self.attributes.iter().find(|x| **x >= self.universe_size) {
            return Err(AbeError::InvalidAttribute {
                attribute: *attribute,
                universe_size: self.universe_size,
            });
        }
        check_count(&self.components, 2 + self.attributes.len())?;
        let expected = names(&["k0", "L"], &[("K", self.attributes.clone())]);
        let reader = Reader::open(&self.group, &self.components, &expected)?;
        let mut k = Vec::with_capacity(self.attributes.len());
        for x in self.attributes.iter() {
            k.push((*x, reader.get(&format!("K_{}", x), ElementType::G1)?.as_g1()?));
        }
        Ok(W11SecretKey {
            universe_size: self.universe_size,
            attributes: self.attributes.clone(),
            k0: reader.get("k0", ElementType::G1)?.as_g1()?,
            l: reader.get("L", ElementType::G2)?.as_g2()?,
            k,
        })
    }
}

impl PublicKeyRecord {
    pub fn from_public_key(pk: &W11PublicKey) -> Result<PublicKeyRecord, AbeError> {
        let mut writer = Writer::new();
        writer.put("g1", Element::G1(pk.g1))?;
        writer.put("g2", Element::G2(pk.g2))?;
        writer.put("g1_a", Element::G1(pk.g1_a))?;
        writer.put("e_gg_alpha", Element::GT(pk.e_gg_alpha))?;
        for (i, h) in pk.h.iter().enumerate() {
            writer.put(&format!("h_{}", i), Element::G1(*h))?;
        }
        Ok(PublicKeyRecord {
            group: PairingGroup.name().to_string(),
            universe_size: pk.universe_size,
            components: writer.finish(),
        })
    }

    pub fn to_public_key(&self) -> Result<W11PublicKey, AbeError> {
        PairingGroup.ensure_same(&self.group)?;
        if self.universe_size == 0 {
            return Err(AbeError::malformed("empty attribute universe"));
        }
        let count = self
            .universe_size
            .checked_add(4)
            .ok_or_else(|| AbeError::malformed("attribute universe too large"))?;
        check_count(&self.components, count)?;
        let expected = names(
            &["g1", "g2", "g1_a", "e_gg_alpha"],
            &[("h", (0..self.universe_size).collect())],
        );
        let reader = Reader::open(&self.group, &self.components, &expected)?;
        let mut h = Vec::with_capacity(self.universe_size);
        for i in 0..self.universe_size {
            h.push(reader.get(&format!("h_{}", i), ElementType::G1)?.as_g1()?);
        }
        Ok(W11PublicKey {
            universe_size: self.universe_size,
            g1: reader.get("g1", ElementType::G1)?.as_g1()?,
            g2: reader.get("g2", ElementType::G2)?.as_g2()?,
            g1_a: reader.get("g1_a", ElementType::G1)?.as_g1()?,
            h,
            e_gg_alpha: reader.get("e_gg_alpha", ElementType::GT)?.as_gt()?,
        })
    }
}

impl MasterKeyRecord {
    pub fn from_master_key(msk: &W11MasterKey) -> Result<MasterKeyRecord, AbeError> {
        let mut writer = Writer::new();
        writer.put("g1_alpha", Element::G1(msk.g1_alpha))?;
        Ok(MasterKeyRecord {
            group: PairingGroup.name().to_string(),
            components: writer.finish(),
        })
    }

    pub fn to_master_key(&self) -> Result<W11MasterKey, AbeError> {
        let reader = Reader::open(&self.group, &self.components, &names(&["g1_alpha"], &[]))?;
        Ok(W11MasterKey {
            g1_alpha: reader.get("g1_alpha", ElementType::G1)?.as_g1()?,
        })
    }
}

impl From<&SealedField> for FieldRecord {
    fn from(field: &SealedField) -> FieldRecord {
        FieldRecord {
            iv: encode_b64(&field.iv),
            blob: encode_b64(&field.ciphertext),
        }
    }
}

impl FieldRecord {
    pub fn to_sealed_field(&self) -> Result<SealedField, AbeError> {
        let iv = decode_b64(&self.iv)?;
        if iv.len() != IV_LENGTH {
            return Err(AbeError::MalformedElement(format!("IV of {} bytes", iv.len())));
        }
        Ok(SealedField {
            iv: iv.as_slice().try_into()?,
            ciphertext: decode_b64(&self.blob)?,
        })
    }
}
