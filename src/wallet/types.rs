/// Transfer direction relative to the address whose export a record came
/// from, and later relative to the focus node of the graph.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Direction {
    Incoming,
    Outgoing,
}

impl Direction {
    pub fn label(self) -> &'static str {
        match self {
            Self::Incoming => "incoming",
            Self::Outgoing => "outgoing",
        }
    }
}

/// One raw transfer as reported by a block explorer. Amounts are in ETH.
#[derive(Clone, Debug)]
pub struct TransactionRecord {
    pub source_address: String,
    pub target_address: String,
    pub amount: f64,
    pub timestamp: i64,
    pub transaction_id: String,
    pub direction: Direction,
    pub gas_cost: f64,
}

impl TransactionRecord {
    /// A record is usable only when both endpoints are present and distinct.
    pub fn is_valid(&self) -> bool {
        !self.source_address.is_empty()
            && !self.target_address.is_empty()
            && !self
                .source_address
                .eq_ignore_ascii_case(&self.target_address)
    }

}

/// Caps how many records feed the graph so simulation cost stays bounded.
#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum DetailLevel {
    Low,
    Medium,
    High,
}

impl DetailLevel {
    pub fn record_cap(self) -> usize {
        match self {
            Self::Low => 25,
            Self::Medium => 50,
            Self::High => 100,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}
