//! Building blocks shared by the scheme, the KEM and the record layer.
//!
//! Currently those are:
//! aes
//! group
//! hash
//! policy
//! secretsharing
//! tools
//!
pub mod aes;
pub mod group;
pub mod hash;
pub mod policy;
pub mod secretsharing;
pub mod tools;
