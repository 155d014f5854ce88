//! Anonymous credentials built on CL signatures.
//!
//! Issuers publish credential definitions, sign credentials over a holder's
//! blinded master secret and revoke them through a pairing based accumulator.
//! Holders build zero-knowledge presentations that reveal a subset of
//! attributes, prove predicates over hidden ones and prove non-revocation.
#![warn(missing_docs)]
#![deny(trivial_casts, trivial_numeric_casts, unused_import_braces)]

#[macro_use]
/// Crate errors
pub mod error;

/// Credential related types
pub mod credential;
/// Deterministic identifiers
pub mod identifiers;
/// Issuer operations
pub mod issuer;
/// Cryptographic primitives
pub mod knox;
/// Presentation nonces
pub mod nonce;
/// Presentation requests and proofs
pub mod presentation;
/// Holder operations
pub mod prover;
/// Revocation registries and deltas
pub mod revocation_registry;
/// Tails storage
pub mod tails;
/// Presentation verification
pub mod verifier;

mod utils;

pub use error::{Error, ErrorKind};
pub use utils::{attr_common_view, encode_credential_attribute, encode_credential_attributes};

/// Result type for this crate
pub type CredxResult<T> = Result<T, Error>;

/// Common imports
pub mod prelude {
    pub use super::{
        credential::*, identifiers::*, issuer, nonce::*, presentation::*, prover,
        revocation_registry::*, tails::*, verifier, encode_credential_attribute,
        encode_credential_attributes, CredxResult, Error, ErrorKind,
    };
    pub use crate::knox::cl::{PredicateType, MASTER_SECRET};
}
