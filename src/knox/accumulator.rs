/// The CKS pairing based accumulator used for credential revocation
pub mod cks;
