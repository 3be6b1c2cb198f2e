pub mod rpc;
pub mod signer;

pub use rpc::{SolanaClient, SolanaClientError};
pub use signer::{
    missing_signers, required_signers, select_signers, sign_base58, sign_transaction,
    sign_with_pool, SignerError,
};
