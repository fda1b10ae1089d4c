use super::{ReverseSwap, Swap, SwapStatus, SwapStore};
use crate::error::{Error, RecordKind, Result};

/// Non-durable [`SwapStore`] with the same filter semantics as the SQLite backend.
///
/// Records are cloned on the way in and out, so callers never alias stored key material.
#[derive(Debug, Default)]
pub struct MemorySwapStore {
    swaps: Vec<Swap>,
    reverse_swaps: Vec<ReverseSwap>,
}

impl MemorySwapStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn swap_mut(&mut self, id: &str) -> Result<&mut Swap> {
        self.swaps
            .iter_mut()
            .find(|swap| swap.id == id)
            .ok_or_else(|| Error::not_found(RecordKind::Swap, id))
    }

    fn reverse_swap_mut(&mut self, id: &str) -> Result<&mut ReverseSwap> {
        self.reverse_swaps
            .iter_mut()
            .find(|reverse_swap| reverse_swap.id == id)
            .ok_or_else(|| Error::not_found(RecordKind::ReverseSwap, id))
    }
}

impl SwapStore for MemorySwapStore {
    fn create_swap(&mut self, swap: &Swap) -> Result<()> {
        swap.validate()?;
        if self.swaps.iter().any(|s| s.id == swap.id) {
            return Err(Error::DuplicateId {
                kind: RecordKind::Swap,
                id: swap.id.clone(),
            });
        }
        let mut swap = swap.clone();
        swap.status = swap.status.normalized();
        tracing::info!(swap_id = %swap.id, status = %swap.status, "created swap");
        self.swaps.push(swap);
        Ok(())
    }

    fn get_swap(&self, id: &str) -> Result<Swap> {
        self.swaps
            .iter()
            .find(|swap| swap.id == id)
            .cloned()
            .ok_or_else(|| Error::not_found(RecordKind::Swap, id))
    }

    fn list_swaps(&self) -> Result<Vec<Swap>> {
        Ok(self.swaps.clone())
    }

    fn list_pending_swaps(&self) -> Result<Vec<Swap>> {
        Ok(self
            .swaps
            .iter()
            .filter(|swap| !swap.status.is_completed())
            .cloned()
            .collect())
    }

    fn list_refundable_swaps(&self, current_height: u32) -> Result<Vec<Swap>> {
        Ok(self
            .swaps
            .iter()
            .filter(|swap| {
                !swap.status.is_completed() && swap.timeout_block_height <= current_height
            })
            .cloned()
            .collect())
    }

    fn update_swap_status(&mut self, id: &str, status: &SwapStatus) -> Result<()> {
        self.swap_mut(id)?.status = status.normalized();
        tracing::debug!(swap_id = %id, %status, "updated swap status");
        Ok(())
    }

    fn set_swap_invoice(&mut self, id: &str, invoice: &str) -> Result<()> {
        self.swap_mut(id)?.invoice = Some(invoice.to_string());
        Ok(())
    }

    fn set_swap_lockup_transaction_id(&mut self, id: &str, txid: &str) -> Result<()> {
        self.swap_mut(id)?.lockup_transaction_id = Some(txid.to_string());
        Ok(())
    }

    fn set_swap_refund_transaction_id(&mut self, id: &str, txid: &str) -> Result<()> {
        let swap = self.swap_mut(id)?;
        swap.status = SwapStatus::Refunded;
        swap.refund_transaction_id = Some(txid.to_string());
        tracing::info!(swap_id = %id, refund_txid = %txid, "swap refunded");
        Ok(())
    }

    fn create_reverse_swap(&mut self, reverse_swap: &ReverseSwap) -> Result<()> {
        reverse_swap.validate()?;
        if self.reverse_swaps.iter().any(|s| s.id == reverse_swap.id) {
            return Err(Error::DuplicateId {
                kind: RecordKind::ReverseSwap,
                id: reverse_swap.id.clone(),
            });
        }
        let mut reverse_swap = reverse_swap.clone();
        reverse_swap.status = reverse_swap.status.normalized();
        tracing::info!(
            swap_id = %reverse_swap.id,
            status = %reverse_swap.status,
            "created reverse swap"
        );
        self.reverse_swaps.push(reverse_swap);
        Ok(())
    }

    fn get_reverse_swap(&self, id: &str) -> Result<ReverseSwap> {
        self.reverse_swaps
            .iter()
            .find(|reverse_swap| reverse_swap.id == id)
            .cloned()
            .ok_or_else(|| Error::not_found(RecordKind::ReverseSwap, id))
    }

    fn list_reverse_swaps(&self) -> Result<Vec<ReverseSwap>> {
        Ok(self.reverse_swaps.clone())
    }

    fn list_pending_reverse_swaps(&self) -> Result<Vec<ReverseSwap>> {
        Ok(self
            .reverse_swaps
            .iter()
            .filter(|reverse_swap| !reverse_swap.status.is_completed())
            .cloned()
            .collect())
    }

    fn update_reverse_swap_status(&mut self, id: &str, status: &SwapStatus) -> Result<()> {
        self.reverse_swap_mut(id)?.status = status.normalized();
        tracing::debug!(swap_id = %id, %status, "updated reverse swap status");
        Ok(())
    }

    fn set_reverse_swap_lockup_transaction_id(&mut self, id: &str, txid: &str) -> Result<()> {
        self.reverse_swap_mut(id)?.lockup_transaction_id = Some(txid.to_string());
        Ok(())
    }

    fn set_reverse_swap_claim_transaction_id(&mut self, id: &str, txid: &str) -> Result<()> {
        self.reverse_swap_mut(id)?.claim_transaction_id = Some(txid.to_string());
        Ok(())
    }
}
