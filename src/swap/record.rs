use std::fmt;

use bitcoin::ScriptBuf;
use bitcoin::hashes::{Hash as _, sha256};
use bitcoin::secp256k1::{PublicKey, Secp256k1, SecretKey};
use serde::{Deserialize, Serialize};
use zeroize::{Zeroize, ZeroizeOnDrop, Zeroizing};

use super::SwapStatus;
use crate::chain::{ChainParams, check_swap_address};
use crate::error::{Error, Result};

/// Signing key owned by exactly one swap: the refund key of a forward swap or the claim key
/// of a reverse swap. Erased when dropped.
#[derive(Clone, PartialEq, Eq)]
pub struct SwapKey(SecretKey);

impl SwapKey {
    pub fn new(secret_key: SecretKey) -> Self {
        Self(secret_key)
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self> {
        SecretKey::from_slice(bytes)
            .map(Self)
            .map_err(|e| Error::Encoding(format!("invalid private key: {e}")))
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        let bytes = Zeroizing::new(decode_hex("private key", s)?);
        Self::from_slice(&bytes)
    }

    pub fn to_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(hex::encode(&*self.secret_bytes()))
    }

    fn secret_bytes(&self) -> Zeroizing<[u8; 32]> {
        Zeroizing::new(self.0.secret_bytes())
    }

    pub fn secret_key(&self) -> &SecretKey {
        &self.0
    }

    pub fn public_key(&self) -> PublicKey {
        PublicKey::from_secret_key(&Secp256k1::signing_only(), &self.0)
    }
}

impl Drop for SwapKey {
    fn drop(&mut self) {
        self.0.non_secure_erase();
    }
}

impl fmt::Debug for SwapKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("SwapKey(***)")
    }
}

/// Hash-lock secret. Zeroed when dropped.
#[derive(Clone, PartialEq, Eq, Zeroize, ZeroizeOnDrop)]
pub struct Preimage(Vec<u8>);

impl Preimage {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn from_hex(s: &str) -> Result<Self> {
        decode_hex("preimage", s).map(Self)
    }

    pub fn to_hex(&self) -> Zeroizing<String> {
        Zeroizing::new(hex::encode(&self.0))
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// SHA-256 of the preimage, as embedded in the redeem script and the invoice.
    pub fn payment_hash(&self) -> [u8; 32] {
        sha256::Hash::hash(&self.0).to_byte_array()
    }
}

impl fmt::Debug for Preimage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Preimage(***)")
    }
}

/// Forward swap: we lock on-chain funds, the provider claims them with the preimage once it
/// has paid our invoice, and we can refund after `timeout_block_height`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Swap {
    pub id: String,
    pub status: SwapStatus,
    pub private_key: SwapKey,
    pub preimage: Option<Preimage>,
    pub redeem_script: ScriptBuf,
    pub invoice: Option<String>,
    pub address: String,
    pub expected_amount: u64,
    pub timeout_block_height: u32,
    pub lockup_transaction_id: Option<String>,
    pub refund_transaction_id: Option<String>,
}

impl Swap {
    /// Verifies that `address` is the witness script hash address of the redeem script.
    pub fn check_address(&self, params: &ChainParams) -> Result<()> {
        check_swap_address(params, &self.address, &self.redeem_script, false)
    }

    pub fn serialized(&self) -> SwapSerialized {
        SwapSerialized::from(self)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        require(!self.id.is_empty(), "swap id is empty")?;
        require(
            !self.redeem_script.is_empty(),
            "swap redeem script is empty",
        )?;
        require(!self.address.is_empty(), "swap address is empty")?;
        require(
            self.preimage.as_ref().is_none_or(|p| !p.is_empty()),
            "swap preimage is set but empty",
        )?;
        Ok(())
    }
}

/// Reverse swap: the provider locks on-chain funds after we pay its invoice, and we claim
/// them to `claim_address` with the preimage we generated.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReverseSwap {
    pub id: String,
    pub status: SwapStatus,
    pub accept_zero_conf: bool,
    pub private_key: SwapKey,
    pub preimage: Preimage,
    pub redeem_script: ScriptBuf,
    pub invoice: String,
    pub claim_address: String,
    pub onchain_amount: u64,
    pub timeout_block_height: u32,
    pub lockup_transaction_id: Option<String>,
    pub claim_transaction_id: Option<String>,
}

impl ReverseSwap {
    /// Verifies that the provider's lockup address is the nested script hash address of the
    /// redeem script.
    pub fn check_lockup_address(&self, params: &ChainParams, lockup_address: &str) -> Result<()> {
        check_swap_address(params, lockup_address, &self.redeem_script, true)
    }

    pub fn serialized(&self) -> ReverseSwapSerialized {
        ReverseSwapSerialized::from(self)
    }

    pub(crate) fn validate(&self) -> Result<()> {
        require(!self.id.is_empty(), "reverse swap id is empty")?;
        require(
            !self.redeem_script.is_empty(),
            "reverse swap redeem script is empty",
        )?;
        require(!self.preimage.is_empty(), "reverse swap preimage is empty")?;
        require(!self.invoice.is_empty(), "reverse swap invoice is empty")?;
        require(
            !self.claim_address.is_empty(),
            "reverse swap claim address is empty",
        )?;
        Ok(())
    }
}

/// Storage and API form of a [`Swap`]. Binary fields are lower-case hex; a missing preimage
/// is the empty string. The hex secrets are zeroed when dropped.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(rename_all = "camelCase")]
pub struct SwapSerialized {
    #[zeroize(skip)]
    pub id: String,
    #[zeroize(skip)]
    pub status: String,
    pub private_key: String,
    pub preimage: String,
    #[zeroize(skip)]
    pub redeem_script: String,
    #[zeroize(skip)]
    pub invoice: Option<String>,
    #[zeroize(skip)]
    pub address: String,
    #[zeroize(skip)]
    pub expected_amount: u64,
    #[zeroize(skip)]
    pub timeout_block_height: u32,
    #[zeroize(skip)]
    pub lockup_transaction_id: Option<String>,
    #[zeroize(skip)]
    pub refund_transaction_id: Option<String>,
}

impl From<&Swap> for SwapSerialized {
    fn from(swap: &Swap) -> Self {
        Self {
            id: swap.id.clone(),
            status: swap.status.to_string(),
            private_key: hex::encode(&*swap.private_key.secret_bytes()),
            preimage: swap
                .preimage
                .as_ref()
                .map(|p| hex::encode(p.as_bytes()))
                .unwrap_or_default(),
            redeem_script: hex::encode(swap.redeem_script.as_bytes()),
            invoice: swap.invoice.clone(),
            address: swap.address.clone(),
            expected_amount: swap.expected_amount,
            timeout_block_height: swap.timeout_block_height,
            lockup_transaction_id: swap.lockup_transaction_id.clone(),
            refund_transaction_id: swap.refund_transaction_id.clone(),
        }
    }
}

impl TryFrom<SwapSerialized> for Swap {
    type Error = Error;

    fn try_from(s: SwapSerialized) -> Result<Self> {
        let preimage = if s.preimage.is_empty() {
            None
        } else {
            Some(Preimage::from_hex(&s.preimage)?)
        };

        Ok(Self {
            private_key: SwapKey::from_hex(&s.private_key)?,
            preimage,
            redeem_script: ScriptBuf::from_bytes(decode_hex("redeem script", &s.redeem_script)?),
            status: SwapStatus::from(s.status.as_str()),
            id: s.id.clone(),
            invoice: s.invoice.clone(),
            address: s.address.clone(),
            expected_amount: s.expected_amount,
            timeout_block_height: s.timeout_block_height,
            lockup_transaction_id: s.lockup_transaction_id.clone(),
            refund_transaction_id: s.refund_transaction_id.clone(),
        })
    }
}

/// Storage and API form of a [`ReverseSwap`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, Zeroize, ZeroizeOnDrop)]
#[serde(rename_all = "camelCase")]
pub struct ReverseSwapSerialized {
    #[zeroize(skip)]
    pub id: String,
    #[zeroize(skip)]
    pub status: String,
    #[zeroize(skip)]
    pub accept_zero_conf: bool,
    pub private_key: String,
    pub preimage: String,
    #[zeroize(skip)]
    pub redeem_script: String,
    #[zeroize(skip)]
    pub invoice: String,
    #[zeroize(skip)]
    pub claim_address: String,
    #[zeroize(skip)]
    pub onchain_amount: u64,
    #[zeroize(skip)]
    pub timeout_block_height: u32,
    #[zeroize(skip)]
    pub lockup_transaction_id: Option<String>,
    #[zeroize(skip)]
    pub claim_transaction_id: Option<String>,
}

impl From<&ReverseSwap> for ReverseSwapSerialized {
    fn from(reverse_swap: &ReverseSwap) -> Self {
        Self {
            id: reverse_swap.id.clone(),
            status: reverse_swap.status.to_string(),
            accept_zero_conf: reverse_swap.accept_zero_conf,
            private_key: hex::encode(&*reverse_swap.private_key.secret_bytes()),
            preimage: hex::encode(reverse_swap.preimage.as_bytes()),
            redeem_script: hex::encode(reverse_swap.redeem_script.as_bytes()),
            invoice: reverse_swap.invoice.clone(),
            claim_address: reverse_swap.claim_address.clone(),
            onchain_amount: reverse_swap.onchain_amount,
            timeout_block_height: reverse_swap.timeout_block_height,
            lockup_transaction_id: reverse_swap.lockup_transaction_id.clone(),
            claim_transaction_id: reverse_swap.claim_transaction_id.clone(),
        }
    }
}

impl TryFrom<ReverseSwapSerialized> for ReverseSwap {
    type Error = Error;

    fn try_from(s: ReverseSwapSerialized) -> Result<Self> {
        Ok(Self {
            private_key: SwapKey::from_hex(&s.private_key)?,
            preimage: Preimage::from_hex(&s.preimage)?,
            redeem_script: ScriptBuf::from_bytes(decode_hex("redeem script", &s.redeem_script)?),
            status: SwapStatus::from(s.status.as_str()),
            id: s.id.clone(),
            accept_zero_conf: s.accept_zero_conf,
            invoice: s.invoice.clone(),
            claim_address: s.claim_address.clone(),
            onchain_amount: s.onchain_amount,
            timeout_block_height: s.timeout_block_height,
            lockup_transaction_id: s.lockup_transaction_id.clone(),
            claim_transaction_id: s.claim_transaction_id.clone(),
        })
    }
}

fn decode_hex(field: &str, s: &str) -> Result<Vec<u8>> {
    hex::decode(s).map_err(|e| Error::Encoding(format!("decode {field} hex: {e}")))
}

fn require(ok: bool, what: &str) -> Result<()> {
    if ok {
        Ok(())
    } else {
        Err(Error::ConstraintViolation(what.to_string()))
    }
}
