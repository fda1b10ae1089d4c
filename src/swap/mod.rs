pub mod memory;
pub mod record;
pub mod status;
pub mod store;

pub use memory::MemorySwapStore;
pub use record::{Preimage, ReverseSwap, ReverseSwapSerialized, Swap, SwapKey, SwapSerialized};
pub use status::SwapStatus;
pub use store::{SqliteSwapStore, SwapStore};

use crate::chain::ChainParams;
use crate::error::Result;

/// Persists `swap` only if its lockup address is the witness script hash address of its
/// redeem script.
pub fn create_swap_checked<S: SwapStore + ?Sized>(
    store: &mut S,
    params: &ChainParams,
    swap: &Swap,
) -> Result<()> {
    swap.check_address(params)?;
    store.create_swap(swap)
}

/// Persists `reverse_swap` only if the provider's `lockup_address` is the nested script hash
/// address of its redeem script.
pub fn create_reverse_swap_checked<S: SwapStore + ?Sized>(
    store: &mut S,
    params: &ChainParams,
    lockup_address: &str,
    reverse_swap: &ReverseSwap,
) -> Result<()> {
    reverse_swap.check_lockup_address(params, lockup_address)?;
    store.create_reverse_swap(reverse_swap)
}
