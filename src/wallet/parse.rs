use anyhow::{Context, Result, anyhow};
use serde::Deserialize;
use serde_json::Value;

use super::types::{Direction, TransactionRecord};

const WEI_PER_ETH: f64 = 1e18;

/// One entry of an explorer transfer export. Explorers report every numeric
/// field as a decimal string.
#[derive(Clone, Debug, Deserialize)]
pub(super) struct RawTransfer {
    #[serde(default)]
    pub(super) from: String,
    #[serde(default)]
    pub(super) to: String,
    #[serde(default)]
    pub(super) value: String,
    #[serde(default)]
    pub(super) hash: String,
    #[serde(default, rename = "timeStamp")]
    pub(super) time_stamp: String,
    #[serde(default, rename = "gasUsed")]
    pub(super) gas_used: String,
    #[serde(default, rename = "gasPrice")]
    pub(super) gas_price: String,
}

/// Parses a transfer export into records, inferring each record's direction
/// relative to `address`. Exports come in two shapes: the full explorer
/// response (`{"status": ..., "result": [...]}`) and a bare array.
pub(super) fn parse_transfer_export(raw: &str, address: &str) -> Result<Vec<TransactionRecord>> {
    let parsed: Value = serde_json::from_str(raw).context("invalid JSON in transaction export")?;

    let entries = if let Some(object) = parsed.as_object() {
        object
            .get("result")
            .and_then(Value::as_array)
            .ok_or_else(|| anyhow!("transaction export object carries no result array"))?
            .as_slice()
    } else if let Some(array) = parsed.as_array() {
        array.as_slice()
    } else {
        return Err(anyhow!("unexpected JSON type in transaction export"));
    };

    let mut records = Vec::with_capacity(entries.len());
    for value in entries {
        let Ok(entry) = RawTransfer::deserialize(value) else {
            continue;
        };

        let direction = if entry.from.eq_ignore_ascii_case(address) {
            Direction::Outgoing
        } else {
            Direction::Incoming
        };

        records.push(TransactionRecord {
            amount: parse_wei(&entry.value),
            timestamp: entry.time_stamp.trim().parse().unwrap_or(0),
            gas_cost: gas_cost_ether(&entry.gas_used, &entry.gas_price),
            source_address: entry.from,
            target_address: entry.to,
            transaction_id: entry.hash,
            direction,
        });
    }

    Ok(records)
}

fn parse_wei(value: &str) -> f64 {
    let value = value.trim();
    if let Ok(wei) = value.parse::<u128>() {
        return wei as f64 / WEI_PER_ETH;
    }
    // Some exports carry values too large for u128 digits-wise or with an
    // exponent; fall back to float parsing of the wei figure.
    value
        .parse::<f64>()
        .map(|wei| (wei / WEI_PER_ETH).max(0.0))
        .unwrap_or(0.0)
}

fn gas_cost_ether(gas_used: &str, gas_price: &str) -> f64 {
    let used = gas_used.trim().parse::<f64>().unwrap_or(0.0);
    let price = gas_price.trim().parse::<f64>().unwrap_or(0.0);
    ((used * price) / WEI_PER_ETH).max(0.0)
}
