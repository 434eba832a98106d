use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::cmp::Ordering;
use std::collections::BTreeSet;
use std::fmt;

/// Statistics tracked for every coin, in crawl order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Metric {
    Price,
    Transactions,
    Addresses,
    LargeTransactions,
}

impl Metric {
    pub const ALL: [Metric; 4] = [
        Metric::Price,
        Metric::Transactions,
        Metric::Addresses,
        Metric::LargeTransactions,
    ];

    /// Name used in history file names
    pub fn as_str(&self) -> &'static str {
        match self {
            Metric::Price => "price",
            Metric::Transactions => "transactions",
            Metric::Addresses => "addresses",
            Metric::LargeTransactions => "large_transactions",
        }
    }

    /// Endpoint path below `/api-internal/stats/v1/{coin}/`
    pub fn path(&self) -> &'static str {
        match self {
            Metric::Price => "financial/price",
            Metric::Transactions => "network/transactions",
            Metric::Addresses => "network/addresses",
            Metric::LargeTransactions => "financial/large_transactions",
        }
    }

    /// Field of the response body holding the record array
    pub fn field_name(&self) -> &'static str {
        match self {
            Metric::Price => "price",
            Metric::Transactions => "txsStats",
            Metric::Addresses => "addressesStats",
            Metric::LargeTransactions => "largeTxs",
        }
    }
}

impl fmt::Display for Metric {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A single dated observation.
///
/// The whole JSON object is kept as it arrived, `date` included, so fields
/// stay in API order. Deserializing rejects objects without a `date`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "Map<String, Value>", into = "Map<String, Value>")]
pub struct Record {
    fields: Map<String, Value>,
}

impl Record {
    pub fn new(date: impl Into<Value>) -> Self {
        let mut fields = Map::new();
        fields.insert("date".to_string(), date.into());
        Self { fields }
    }

    /// Builder-style field setter
    pub fn with(mut self, key: &str, value: impl Into<Value>) -> Self {
        self.fields.insert(key.to_string(), value.into());
        self
    }

    pub fn date(&self) -> &Value {
        static NULL: Value = Value::Null;
        // present by construction
        self.fields.get("date").unwrap_or(&NULL)
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.fields.get(key)
    }

    pub fn fields(&self) -> &Map<String, Value> {
        &self.fields
    }

    /// Hashable identity of the date, used to match records across series.
    ///
    /// This is the JSON text of the date, so numeric dates written as `1` and
    /// `1.0` are distinct keys. The API only sends string dates.
    pub fn date_key(&self) -> String {
        self.date().to_string()
    }

    /// Shallow update: fields of `other` replace ours in place, new fields are
    /// appended, fields only we carry survive.
    pub fn update(&mut self, other: Record) {
        self.fields.extend(other.fields);
    }
}

impl TryFrom<Map<String, Value>> for Record {
    type Error = String;

    fn try_from(fields: Map<String, Value>) -> Result<Self, Self::Error> {
        if fields.contains_key("date") {
            Ok(Self { fields })
        } else {
            Err("missing field `date`".to_string())
        }
    }
}

impl From<Record> for Map<String, Value> {
    fn from(record: Record) -> Self {
        record.fields
    }
}

/// Accumulated history for one (metric, coin), ascending by date.
pub type Series = Vec<Record>;

/// Total order over JSON dates.
///
/// Numbers compare numerically and strings lexicographically, which keeps
/// ISO-8601 dates in calendar order. Values of different kinds are ordered by
/// kind so mixed series still sort deterministically.
pub fn compare_dates(a: &Value, b: &Value) -> Ordering {
    fn rank(v: &Value) -> u8 {
        match v {
            Value::Null => 0,
            Value::Bool(_) => 1,
            Value::Number(_) => 2,
            Value::String(_) => 3,
            Value::Array(_) => 4,
            Value::Object(_) => 5,
        }
    }

    match (a, b) {
        (Value::Bool(x), Value::Bool(y)) => x.cmp(y),
        (Value::Number(x), Value::Number(y)) => match (x.as_f64(), y.as_f64()) {
            (Some(x), Some(y)) => x.total_cmp(&y),
            _ => x.to_string().cmp(&y.to_string()),
        },
        (Value::String(x), Value::String(y)) => x.cmp(y),
        _ => rank(a)
            .cmp(&rank(b))
            .then_with(|| a.to_string().cmp(&b.to_string())),
    }
}

/// Entry of the trading-pairs listing
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TradingPair {
    /// Pair name, e.g. "BTC/USD"
    pub name: String,
}

impl TradingPair {
    /// Lowercased base asset, `None` when the name has no base
    pub fn base(&self) -> Option<String> {
        let base = self.name.split('/').next()?.trim();
        if base.is_empty() {
            None
        } else {
            Some(base.to_lowercase())
        }
    }
}

/// Distinct lowercase base assets, sorted.
pub fn coins_from_pairs(pairs: &[TradingPair]) -> Vec<String> {
    pairs
        .iter()
        .filter_map(TradingPair::base)
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}
