use agora_types::{Address, TypesError};
use thiserror::Error;

/// Errors raised by governed resources.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ContractError {
    #[error("Caller {caller} is not the owner {owner}")]
    NotOwner { caller: Address, owner: Address },

    #[error("Zero address not allowed")]
    ZeroAddress,

    #[error("Resource does not accept value")]
    NotPayable,

    #[error("Encoding error: {0}")]
    Encoding(#[from] TypesError),
}
