//! Multi-Signer
//!
//! Attaches local keypair signatures to serialized transactions built by
//! the backend. Each key goes into the signature slot that matches its
//! public key among the message's required signers. Signing is ed25519, so
//! the same key over the same message always gives the same bytes.

use solana_sdk::{
    pubkey::Pubkey,
    signature::{Keypair, Signature, Signer},
    transaction::VersionedTransaction,
};
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum SignerError {
    #[error("Malformed transaction: {0}")]
    MalformedTransaction(String),
    #[error("Signing failed: {0}")]
    SigningError(String),
}

fn decode(blob: &[u8]) -> Result<VersionedTransaction, SignerError> {
    let tx: VersionedTransaction = bincode::deserialize(blob)
        .map_err(|e| SignerError::MalformedTransaction(e.to_string()))?;

    let required = tx.message.header().num_required_signatures as usize;
    if tx.message.static_account_keys().len() < required {
        return Err(SignerError::MalformedTransaction(format!(
            "header requires {} signers but message has {} keys",
            required,
            tx.message.static_account_keys().len()
        )));
    }
    if tx.signatures.len() != required {
        return Err(SignerError::MalformedTransaction(format!(
            "expected {} signatures, found {}",
            required,
            tx.signatures.len()
        )));
    }

    Ok(tx)
}

fn decode_base58(blob: &str) -> Result<Vec<u8>, SignerError> {
    bs58::decode(blob)
        .into_vec()
        .map_err(|e| SignerError::MalformedTransaction(format!("invalid base58: {}", e)))
}

/// Public keys that must sign, in slot order
pub fn required_signers(blob: &[u8]) -> Result<Vec<Pubkey>, SignerError> {
    let tx = decode(blob)?;
    let required = tx.message.header().num_required_signatures as usize;
    Ok(tx.message.static_account_keys()[..required].to_vec())
}

/// Required signers whose slot still holds the default signature
pub fn missing_signers(blob: &[u8]) -> Result<Vec<Pubkey>, SignerError> {
    let tx = decode(blob)?;
    let keys = tx.message.static_account_keys();
    Ok(tx
        .signatures
        .iter()
        .zip(keys)
        .filter(|(sig, _)| **sig == Signature::default())
        .map(|(_, key)| *key)
        .collect())
}

/// Sign `blob` with every key, in the order given
pub fn sign_transaction(blob: &[u8], keys: &[&Keypair]) -> Result<Vec<u8>, SignerError> {
    if keys.is_empty() {
        return Err(SignerError::SigningError("no signing keys supplied".into()));
    }

    let mut tx = decode(blob)?;
    let required = tx.message.header().num_required_signatures as usize;
    let message = tx.message.serialize();

    for key in keys {
        let pubkey = key.pubkey();
        let slot = tx.message.static_account_keys()[..required]
            .iter()
            .position(|k| *k == pubkey)
            .ok_or_else(|| {
                SignerError::SigningError(format!("{} is not a required signer", pubkey))
            })?;

        let signature = key
            .try_sign_message(&message)
            .map_err(|e| SignerError::SigningError(e.to_string()))?;
        tx.signatures[slot] = signature;
    }

    bincode::serialize(&tx).map_err(|e| SignerError::MalformedTransaction(e.to_string()))
}

/// Base58 in, base58 out
pub fn sign_base58(blob: &str, keys: &[&Keypair]) -> Result<String, SignerError> {
    let bytes = decode_base58(blob)?;
    let signed = sign_transaction(&bytes, keys)?;
    Ok(bs58::encode(signed).into_string())
}

/// Pick the keys from `pool` that this blob needs, keeping pool order
pub fn select_signers<'a>(blob: &[u8], pool: &'a [Keypair]) -> Result<Vec<&'a Keypair>, SignerError> {
    let required = required_signers(blob)?;
    Ok(pool
        .iter()
        .filter(|kp| required.contains(&kp.pubkey()))
        .collect())
}

/// Sign a base58 blob with whichever pool keys it needs. Blobs needing
/// none of them pass through unchanged. Returns the signed blob and the
/// signers still missing afterwards.
pub fn sign_with_pool(blob: &str, pool: &[Keypair]) -> Result<(String, Vec<Pubkey>), SignerError> {
    let bytes = decode_base58(blob)?;
    let keys = select_signers(&bytes, pool)?;

    let signed = if keys.is_empty() {
        bytes
    } else {
        sign_transaction(&bytes, &keys)?
    };

    let missing = missing_signers(&signed)?;
    Ok((bs58::encode(signed).into_string(), missing))
}
