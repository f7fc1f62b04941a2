//! Domain-separated message signing.
//!
//! Payloads are hashed, the digest is prefixed with the standard
//! signed-message domain separator and hashed again, and the final digest is
//! signed. The output is the 65-byte `r ‖ s ‖ v` concatenation; verification
//! recovers the signer's address from the same double-hashed digest.

use alloy_primitives::{Address, B256, Signature, keccak256, utils::eip191_hash_message};
use alloy_signer::SignerSync;
use alloy_signer_local::PrivateKeySigner;
use eyre::{Result, WrapErr};

/// The double-hashed digest that is actually signed.
pub fn signing_digest(payload: &[u8]) -> B256 {
    eip191_hash_message(keccak256(payload))
}

/// Signs `payload` under the signed-message domain with the given key.
pub fn sign_payload(signer: &PrivateKeySigner, payload: &[u8]) -> Result<[u8; 65]> {
    let signature = signer
        .sign_hash_sync(&signing_digest(payload))
        .wrap_err("Failed to sign payload digest")?;
    Ok(signature.as_bytes())
}

/// Recovers the signing address from a payload and its 65-byte signature.
pub fn recover_signer(payload: &[u8], signature: &[u8; 65]) -> Result<Address> {
    let signature = Signature::try_from(signature.as_slice())
        .wrap_err("Malformed 65-byte signature")?;
    signature
        .recover_address_from_prehash(&signing_digest(payload))
        .wrap_err("Signature recovery failed")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_signature_recovers_signer() {
        let signer = PrivateKeySigner::random();
        let payload = b"transfer 100 tokens to the vault";

        let signature = sign_payload(&signer, payload).unwrap();
        let recovered = recover_signer(payload, &signature).unwrap();

        assert_eq!(recovered, signer.address());
    }

    #[test]
    fn test_signature_is_payload_sensitive() {
        let signer = PrivateKeySigner::random();
        let payload = b"transfer 100 tokens to the vault".to_vec();

        let signature = sign_payload(&signer, &payload).unwrap();

        let mut altered = payload.clone();
        altered[0] ^= 0x01;
        let altered_signature = sign_payload(&signer, &altered).unwrap();

        assert_ne!(signature, altered_signature);
        assert_ne!(recover_signer(&altered, &signature).unwrap(), signer.address());
    }

    #[test]
    fn test_digest_double_hashes() {
        let payload = b"payload";
        assert_eq!(signing_digest(payload), eip191_hash_message(keccak256(payload)));
        assert_ne!(signing_digest(payload), eip191_hash_message(payload));
        assert_ne!(signing_digest(payload), B256::from(keccak256(payload)));
    }

    #[test]
    fn test_wrong_key_does_not_verify() {
        let signer = PrivateKeySigner::random();
        let other = PrivateKeySigner::random();
        let payload = b"withdraw everything";

        let signature = sign_payload(&signer, payload).unwrap();
        assert_ne!(recover_signer(payload, &signature).unwrap(), other.address());
    }
}
