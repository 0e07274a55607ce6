//! AES-256-GCM field encryption.
//!
//! The key always comes out of [`crate::kem`]; the IV must be fresh for every
//! plaintext encrypted under the same key. [`encrypt`] / [`decrypt`] take the
//! IV from the caller, the other helpers draw a new one per call.
use std::collections::BTreeMap;
use std::fmt::{Debug, Formatter, Result as FormatResult};
use aes_gcm::aead::{Aead, KeyInit};
use aes_gcm::{Aes256Gcm, Key, Nonce};
use rand::Rng;
use zeroize::Zeroize;
use crate::error::AbeError;

pub const KEY_LENGTH: usize = 32;
pub const IV_LENGTH: usize = 12;
pub const TAG_LENGTH: usize = 16;

/// A 96 bit GCM nonce.
pub type Iv = [u8; IV_LENGTH];

/// A 256 bit content key. Wiped on drop and never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct SymmetricKey([u8; KEY_LENGTH]);

impl SymmetricKey {
    pub fn from_bytes(bytes: [u8; KEY_LENGTH]) -> SymmetricKey {
        SymmetricKey(bytes)
    }

    pub fn try_from_slice(bytes: &[u8]) -> Result<SymmetricKey, AbeError> {
        let key: [u8; KEY_LENGTH] = bytes.try_into()?;
        Ok(SymmetricKey(key))
    }

    pub fn as_bytes(&self) -> &[u8; KEY_LENGTH] {
        &self.0
    }

    pub fn len(&self) -> usize {
        KEY_LENGTH
    }

    pub fn is_empty(&self) -> bool {
        false
    }
}

impl Drop for SymmetricKey {
    fn drop(&mut self) {
        self.0.zeroize();
    }
}

impl Debug for SymmetricKey {
    fn fmt(&self, f: &mut Formatter<'_>) -> FormatResult {
        write!(f, "SymmetricKey(..)")
    }
}

/// One encrypted field together with the IV it was encrypted under.
#[derive(Clone, PartialEq, Eq, Debug)]
pub struct SealedField {
    pub iv: Iv,
    /// ciphertext || tag
    pub ciphertext: Vec<u8>,
}

pub fn generate_iv() -> Iv {
    rand::thread_rng().gen()
}

fn cipher(key: &SymmetricKey) -> Aes256Gcm {
    Aes256Gcm::new(Key::<Aes256Gcm>::from_slice(key.as_bytes()))
}

/// Encrypts `plaintext`, returning `ciphertext || tag`.
pub fn encrypt(plaintext: &[u8], key: &SymmetricKey, iv: &Iv) -> Result<Vec<u8>, AbeError> {
    cipher(key)
        .encrypt(Nonce::from_slice(iv), plaintext)
        .map_err(|_| AbeError::malformed("plaintext exceeds the AES-GCM limit"))
}

/// Decrypts `ciphertext || tag`. Any modification of either part, or a
/// wrong key / IV, yields `AuthenticationFailed`.
pub fn decrypt(ciphertext: &[u8], key: &SymmetricKey, iv: &Iv) -> Result<Vec<u8>, AbeError> {
    if ciphertext.len() < TAG_LENGTH {
        return Err(AbeError::AuthenticationFailed);
    }
    cipher(key)
        .decrypt(Nonce::from_slice(iv), ciphertext)
        .map_err(|_| AbeError::AuthenticationFailed)
}

/// Encrypts under a fresh IV and prepends it: `iv || ciphertext || tag`.
pub fn encrypt_symmetric(key: &SymmetricKey, plaintext: &[u8]) -> Result<Vec<u8>, AbeError> {
    let iv = generate_iv();
    let mut result = iv.to_vec();
    result.append(&mut encrypt(plaintext, key, &iv)?);
    Ok(result)
}

/// Inverse of [`encrypt_symmetric`].
pub fn decrypt_symmetric(key: &SymmetricKey, iv_ct: &[u8]) -> Result<Vec<u8>, AbeError> {
    if iv_ct.len() < IV_LENGTH + TAG_LENGTH {
        return Err(AbeError::AuthenticationFailed);
    }
    let (iv, data) = iv_ct.split_at(IV_LENGTH);
    let iv: Iv = iv.try_into()?;
    decrypt(data, key, &iv)
}

/// Encrypts every field of a record, each under its own fresh IV.
pub fn seal_fields<'a, I>(key: &SymmetricKey, fields: I) -> Result<BTreeMap<String, SealedField>, AbeError>
where
    I: IntoIterator<Item = (&'a str, &'a [u8])>,
{
    let mut sealed = BTreeMap::new();
    for (name, plaintext) in fields {
        let iv = generate_iv();
        let ciphertext = encrypt(plaintext, key, &iv)?;
        sealed.insert(name.to_string(), SealedField { iv, ciphertext });
    }
    Ok(sealed)
}

/// Decrypts every field sealed by [`seal_fields`]; the first failing field aborts.
pub fn open_fields(
    key: &SymmetricKey,
    fields: &BTreeMap<String, SealedField>,
) -> Result<BTreeMap<String, Vec<u8>>, AbeError> {
    let mut opened = BTreeMap::new();
    for (name, field) in fields {
        opened.insert(name.clone(), decrypt(&field.ciphertext, key, &field.iv)?);
    }
    Ok(opened)
}
