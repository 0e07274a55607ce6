//! medabe is a rust library for attribute-protected clinical records.
//!
//! It combines the Waters11 ciphertext-policy ABE scheme over the BN254
//! pairing ([`schemes::waters11`]) with a key encapsulation layer ([`kem`])
//! and AES-256-GCM field encryption ([`utils::aes`]). A record is written by
//! wrapping a fresh symmetric key under an access policy and sealing every
//! field with it; anyone whose attributes satisfy the policy can unwrap the
//! key and open the fields.
//!
//! ```
//! use medabe::{kem, utils::aes, utils::policy::PolicyNode, schemes::waters11::Waters11};
//! let scheme = Waters11::new(4).unwrap();
//! let (pk, msk) = scheme.setup();
//! let policy = PolicyNode::parse("(0 AND 3) OR 2").unwrap();
//!
//! let (ek, key) = kem::wrap(&pk, &policy).unwrap();
//! let iv = aes::generate_iv();
//! let blob = aes::encrypt(b"diagnosis: flu", &key, &iv).unwrap();
//!
//! let sk = scheme.keygen(&pk, &msk, &[2]).unwrap();
//! let key = kem::unwrap(&pk, &ek, &sk).unwrap();
//! assert_eq!(aes::decrypt(&blob, &key, &iv).unwrap(), b"diagnosis: flu");
//! ```
pub mod config;
pub mod directory;
pub mod error;
pub mod kem;
pub mod keystore;
pub mod schemes;
pub mod utils;
pub mod wire;

pub use error::AbeError;
