pub mod address;
pub mod params;

pub use address::{
    SwapAddressKind, SwapAddresses, check_swap_address, derive_address, derive_swap_addresses,
    nested_script_hash_address, script_hash_address, witness_script_hash_address,
};
pub use params::ChainParams;
