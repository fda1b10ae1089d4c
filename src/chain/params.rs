use bitcoin::Network;
use bitcoin::bech32::Hrp;

use crate::error::{Error, Result};

const P2SH_VERSION_MAIN: u8 = 0x05;
const P2SH_VERSION_TEST: u8 = 0xc4;

/// Address-encoding constants of one chain.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ChainParams {
    bech32_hrp: String,
    p2sh_version: u8,
}

impl ChainParams {
    pub fn new(bech32_hrp: impl Into<String>, p2sh_version: u8) -> Self {
        Self {
            bech32_hrp: bech32_hrp.into(),
            p2sh_version,
        }
    }

    pub fn bech32_hrp(&self) -> &str {
        &self.bech32_hrp
    }

    pub fn p2sh_version(&self) -> u8 {
        self.p2sh_version
    }

    pub(crate) fn hrp(&self) -> Result<Hrp> {
        if self.bech32_hrp.is_empty() {
            return Err(Error::Encoding("chain params: bech32 hrp is unset".to_string()));
        }
        Hrp::parse(&self.bech32_hrp).map_err(|e| {
            Error::Encoding(format!(
                "chain params: invalid bech32 hrp {:?}: {e}",
                self.bech32_hrp
            ))
        })
    }
}

impl From<Network> for ChainParams {
    fn from(network: Network) -> Self {
        match network {
            Network::Bitcoin => Self::new("bc", P2SH_VERSION_MAIN),
            Network::Regtest => Self::new("bcrt", P2SH_VERSION_TEST),
            _ => Self::new("tb", P2SH_VERSION_TEST),
        }
    }
}
