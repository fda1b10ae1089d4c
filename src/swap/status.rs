use std::convert::Infallible;
use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Lifecycle status of a swap as reported by the swap provider or set locally.
///
/// Values written by newer code that this build does not know are kept verbatim in
/// [`SwapStatus::Unknown`] and are never treated as completed.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(from = "String", into = "String")]
pub enum SwapStatus {
    Created,
    Expired,
    Refunded,
    Abandoned,

    InvoiceSet,
    InvoicePending,
    InvoicePaid,
    InvoiceSettled,
    InvoiceFailedToPay,

    ChannelCreated,

    TransactionMempool,
    TransactionConfirmed,
    TransactionClaimed,
    TransactionRefunded,
    TransactionFailed,
    TransactionLockupFailed,

    MinerFeePaid,

    Unknown(String),
}

impl SwapStatus {
    pub const KNOWN: &'static [SwapStatus] = &[
        SwapStatus::Created,
        SwapStatus::Expired,
        SwapStatus::Refunded,
        SwapStatus::Abandoned,
        SwapStatus::InvoiceSet,
        SwapStatus::InvoicePending,
        SwapStatus::InvoicePaid,
        SwapStatus::InvoiceSettled,
        SwapStatus::InvoiceFailedToPay,
        SwapStatus::ChannelCreated,
        SwapStatus::TransactionMempool,
        SwapStatus::TransactionConfirmed,
        SwapStatus::TransactionClaimed,
        SwapStatus::TransactionRefunded,
        SwapStatus::TransactionFailed,
        SwapStatus::TransactionLockupFailed,
        SwapStatus::MinerFeePaid,
    ];

    /// Terminal statuses: nothing is left to claim or refund.
    pub const COMPLETED: &'static [SwapStatus] = &[
        SwapStatus::Refunded,
        SwapStatus::Abandoned,
        SwapStatus::InvoiceSettled,
        SwapStatus::TransactionClaimed,
        SwapStatus::TransactionRefunded,
        SwapStatus::TransactionFailed,
    ];

    pub fn as_str(&self) -> &str {
        match self {
            SwapStatus::Created => "swap.created",
            SwapStatus::Expired => "swap.expired",
            SwapStatus::Refunded => "swap.refunded",
            SwapStatus::Abandoned => "swap.abandoned",
            SwapStatus::InvoiceSet => "invoice.set",
            SwapStatus::InvoicePending => "invoice.pending",
            SwapStatus::InvoicePaid => "invoice.paid",
            SwapStatus::InvoiceSettled => "invoice.settled",
            SwapStatus::InvoiceFailedToPay => "invoice.failedToPay",
            SwapStatus::ChannelCreated => "channel.created",
            SwapStatus::TransactionMempool => "transaction.mempool",
            SwapStatus::TransactionConfirmed => "transaction.confirmed",
            SwapStatus::TransactionClaimed => "transaction.claimed",
            SwapStatus::TransactionRefunded => "transaction.refunded",
            SwapStatus::TransactionFailed => "transaction.failed",
            SwapStatus::TransactionLockupFailed => "transaction.lockupFailed",
            SwapStatus::MinerFeePaid => "minerfee.paid",
            SwapStatus::Unknown(raw) => raw,
        }
    }

    /// Classified by wire string, so `Unknown` carrying a known value agrees with the store
    /// filters.
    pub fn is_completed(&self) -> bool {
        Self::COMPLETED
            .iter()
            .any(|status| status.as_str() == self.as_str())
    }

    /// The status as it reads back from storage: `Unknown` carrying a known wire string
    /// becomes that variant.
    pub fn normalized(&self) -> SwapStatus {
        SwapStatus::from(self.as_str())
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, SwapStatus::Unknown(_))
    }
}

impl From<&str> for SwapStatus {
    fn from(s: &str) -> Self {
        Self::KNOWN
            .iter()
            .find(|status| status.as_str() == s)
            .cloned()
            .unwrap_or_else(|| SwapStatus::Unknown(s.to_string()))
    }
}

impl From<String> for SwapStatus {
    fn from(s: String) -> Self {
        match SwapStatus::from(s.as_str()) {
            SwapStatus::Unknown(_) => SwapStatus::Unknown(s),
            known => known,
        }
    }
}

impl From<SwapStatus> for String {
    fn from(status: SwapStatus) -> Self {
        match status {
            SwapStatus::Unknown(raw) => raw,
            known => known.as_str().to_string(),
        }
    }
}

impl FromStr for SwapStatus {
    type Err = Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(SwapStatus::from(s))
    }
}

impl fmt::Display for SwapStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}
