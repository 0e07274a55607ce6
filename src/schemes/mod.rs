//! Attribute-based encryption schemes.
//!
//! Currently those are:
//! * Waters11 CP-ABE (small universe)
//!
pub mod waters11;
