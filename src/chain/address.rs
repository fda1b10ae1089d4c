use bitcoin::Script;
use bitcoin::base58;
use bitcoin::bech32::segwit;
use bitcoin::hashes::{Hash as _, hash160, sha256};
use serde::Serialize;

use super::params::ChainParams;
use crate::error::{Error, Result};

const OP_0: u8 = 0x00;
const OP_PUSHBYTES_32: u8 = 0x20;

/// The on-chain templates a redeem script can be paid through.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SwapAddressKind {
    /// Native segwit v0 pay-to-witness-script-hash.
    WitnessScriptHash,
    /// Legacy pay-to-script-hash of the script itself.
    ScriptHash,
    /// Pay-to-script-hash of the v0 witness program wrapping the script.
    NestedScriptHash,
}

impl SwapAddressKind {
    /// The only template accepted for a swap direction.
    pub fn for_direction(is_reverse_swap: bool) -> Self {
        if is_reverse_swap {
            SwapAddressKind::NestedScriptHash
        } else {
            SwapAddressKind::WitnessScriptHash
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SwapAddresses {
    pub witness_script_hash: String,
    pub script_hash: String,
    pub nested_script_hash: String,
}

pub fn witness_script_hash_address(params: &ChainParams, redeem_script: &Script) -> Result<String> {
    let hrp = params.hrp()?;
    let program = sha256::Hash::hash(redeem_script.as_bytes()).to_byte_array();
    segwit::encode_v0(hrp, &program)
        .map_err(|e| Error::Encoding(format!("encode witness script hash address: {e}")))
}

pub fn script_hash_address(params: &ChainParams, redeem_script: &Script) -> Result<String> {
    Ok(encode_script_hash(params, redeem_script.as_bytes()))
}

pub fn nested_script_hash_address(params: &ChainParams, redeem_script: &Script) -> Result<String> {
    Ok(encode_script_hash(params, &witness_program(redeem_script)))
}

pub fn derive_address(
    params: &ChainParams,
    redeem_script: &Script,
    kind: SwapAddressKind,
) -> Result<String> {
    match kind {
        SwapAddressKind::WitnessScriptHash => witness_script_hash_address(params, redeem_script),
        SwapAddressKind::ScriptHash => script_hash_address(params, redeem_script),
        SwapAddressKind::NestedScriptHash => nested_script_hash_address(params, redeem_script),
    }
}

pub fn derive_swap_addresses(params: &ChainParams, redeem_script: &Script) -> Result<SwapAddresses> {
    Ok(SwapAddresses {
        witness_script_hash: witness_script_hash_address(params, redeem_script)?,
        script_hash: script_hash_address(params, redeem_script)?,
        nested_script_hash: nested_script_hash_address(params, redeem_script)?,
    })
}

/// Accepts `address` only if it is exactly the encoding of `redeem_script` expected for the
/// swap direction: nested script hash for reverse swaps, witness script hash otherwise.
pub fn check_swap_address(
    params: &ChainParams,
    address: &str,
    redeem_script: &Script,
    is_reverse_swap: bool,
) -> Result<()> {
    if address.trim().is_empty() {
        tracing::debug!(is_reverse_swap, "rejecting empty swap address");
        return Err(Error::InvalidAddress(address.to_string()));
    }

    let kind = SwapAddressKind::for_direction(is_reverse_swap);
    let expected = derive_address(params, redeem_script, kind)?;
    if address != expected {
        tracing::debug!(
            address,
            expected = %expected,
            ?kind,
            "swap address does not match redeem script"
        );
        return Err(Error::InvalidAddress(address.to_string()));
    }

    Ok(())
}

fn witness_program(redeem_script: &Script) -> Vec<u8> {
    let hash = sha256::Hash::hash(redeem_script.as_bytes());
    let mut program = Vec::with_capacity(34);
    program.push(OP_0);
    program.push(OP_PUSHBYTES_32);
    program.extend_from_slice(hash.as_byte_array());
    program
}

fn encode_script_hash(params: &ChainParams, script: &[u8]) -> String {
    let hash = hash160::Hash::hash(script);
    let mut payload = Vec::with_capacity(21);
    payload.push(params.p2sh_version());
    payload.extend_from_slice(hash.as_byte_array());
    base58::encode_check(&payload)
}
