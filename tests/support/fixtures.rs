use bitcoin::ScriptBuf;
use btc_swap_core::swap::{Preimage, ReverseSwap, Swap, SwapKey, SwapStatus};

pub const REDEEM_SCRIPT_HEX: &str = "a9146a24b142de20b50871a247c1c66a6e41ee199017876321038ce1d1be5a22b396ccafc109c86717bc081301fe58d1958546d5aba647047af3670381a81ab1752102d23a7d39395f40a71a490cf79e0f2df5da2fb006fdab660bc0c78ef0c9ba457668ac";

/// Mainnet witness script hash address of [`REDEEM_SCRIPT_HEX`].
pub const LOCKUP_ADDRESS: &str = "bc1q73lzkly9le40qxym5wh5wyp0davanw3u9m0u28wafay4ay7z34cscztt48";

/// Mainnet nested script hash address of [`REDEEM_SCRIPT_HEX`].
pub const NESTED_LOCKUP_ADDRESS: &str = "3F8UixJcrfxCaGpRryyRuKotBFXRFeW7ej";

pub fn redeem_script() -> ScriptBuf {
    ScriptBuf::from_bytes(hex::decode(REDEEM_SCRIPT_HEX).expect("redeem script hex"))
}

pub fn swap_key(seed: u8) -> SwapKey {
    SwapKey::from_slice(&[seed; 32]).expect("swap key")
}

pub fn sample_swap(id: &str, status: SwapStatus, timeout_block_height: u32) -> Swap {
    Swap {
        id: id.to_string(),
        status,
        private_key: swap_key(1),
        preimage: None,
        redeem_script: redeem_script(),
        invoice: Some(format!("lnbc1invoice{id}")),
        address: LOCKUP_ADDRESS.to_string(),
        expected_amount: 250_000,
        timeout_block_height,
        lockup_transaction_id: None,
        refund_transaction_id: None,
    }
}

pub fn sample_reverse_swap(id: &str, status: SwapStatus) -> ReverseSwap {
    ReverseSwap {
        id: id.to_string(),
        status,
        accept_zero_conf: true,
        private_key: swap_key(2),
        preimage: Preimage::new(vec![0x42; 32]),
        redeem_script: redeem_script(),
        invoice: format!("lnbc1holdinvoice{id}"),
        claim_address: "bc1qw508d6qejxtdg4y5r3zarvary0c5xw7kv8f3t4".to_string(),
        onchain_amount: 99_000,
        timeout_block_height: 800_100,
        lockup_transaction_id: None,
        claim_transaction_id: None,
    }
}
