//! Finalized, read-only statistics handed to renderers.
//!
//! Field names here are the contract consumed by report writers.

use crate::utils::config::GLOBAL_GROUP;
use chrono::{DateTime, Utc};
use serde::de::{MapAccess, Visitor};
use serde::ser::SerializeMap;
use serde::{Deserialize, Deserializer, Serialize, Serializer};
use std::fmt;

/// One computed percentile
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Percentile {
    /// Requested percentile (0..=100)
    pub percent: f64,

    /// Interpolated value over the retained reservoir
    pub value: f64,
}

/// Summary of one numeric distribution (durations or sizes)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DistributionStats {
    /// Exact minimum over every ingested value
    pub min: u64,

    /// Exact maximum over every ingested value
    pub max: u64,

    /// Exact mean over every ingested value
    pub mean: f64,

    /// Exact sum
    pub sum: u128,

    /// Values in the reservoir the percentiles were computed from
    pub retained: usize,

    /// Percentile estimates, in configured order
    pub percentiles: Vec<Percentile>,
}

impl DistributionStats {
    /// Look up a computed percentile
    pub fn percentile(&self, percent: f64) -> Option<f64> {
        self.percentiles
            .iter()
            .find(|p| (p.percent - percent).abs() < f64::EPSILON)
            .map(|p| p.value)
    }

    pub fn median(&self) -> Option<f64> {
        self.percentile(50.0)
    }

    /// True when percentiles cover every ingested value
    pub fn is_exact(&self, count: u64) -> bool {
        self.retained as u64 == count
    }
}

/// Immutable statistics for one group
///
/// Statistics are `None` when no sample was ingested, so "no data" is never
/// confused with "all zero".
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Snapshot {
    pub count: u64,
    pub success_count: u64,
    pub error_count: u64,
    pub first_timestamp: Option<DateTime<Utc>>,
    pub last_timestamp: Option<DateTime<Utc>>,
    pub duration: Option<DistributionStats>,
    pub size: Option<DistributionStats>,
}

impl Snapshot {
    /// Snapshot of a group that never received a sample
    pub fn empty() -> Self {
        Self {
            count: 0,
            success_count: 0,
            error_count: 0,
            first_timestamp: None,
            last_timestamp: None,
            duration: None,
            size: None,
        }
    }

    pub fn has_data(&self) -> bool {
        self.count > 0
    }

    /// Percentage of failed samples
    pub fn error_rate(&self) -> Option<f64> {
        if self.count == 0 {
            return None;
        }
        Some(self.error_count as f64 / self.count as f64 * 100.0)
    }

    /// Samples per second between the first and last timestamp
    ///
    /// `None` when the span is zero (fewer than two distinct timestamps).
    pub fn throughput(&self) -> Option<f64> {
        let (first, last) = (self.first_timestamp?, self.last_timestamp?);
        let span_ms = (last - first).num_milliseconds();
        if span_ms <= 0 {
            return None;
        }
        Some(self.count as f64 / (span_ms as f64 / 1000.0))
    }
}

/// Snapshots of one run, keyed by group name
///
/// The global totals come first under [`GLOBAL_GROUP`], followed by every
/// group that received samples, in first-seen order.
#[derive(Debug, Clone, PartialEq)]
pub struct AggregationResult {
    global: Snapshot,
    groups: Vec<(String, Snapshot)>,
}

impl AggregationResult {
    pub(crate) fn new(global: Snapshot, groups: Vec<(String, Snapshot)>) -> Self {
        Self { global, groups }
    }

    /// Totals over every sample in the stream
    pub fn global(&self) -> &Snapshot {
        &self.global
    }

    /// Snapshot by key, including the reserved global key
    pub fn get(&self, name: &str) -> Option<&Snapshot> {
        if name == GLOBAL_GROUP {
            return Some(&self.global);
        }
        self.groups
            .iter()
            .find(|(group, _)| group == name)
            .map(|(_, snapshot)| snapshot)
    }

    /// Named groups only, in first-seen order
    pub fn groups(&self) -> impl Iterator<Item = (&str, &Snapshot)> {
        self.groups.iter().map(|(name, s)| (name.as_str(), s))
    }

    /// Every entry, global first
    pub fn iter(&self) -> impl Iterator<Item = (&str, &Snapshot)> {
        std::iter::once((GLOBAL_GROUP, &self.global)).chain(self.groups())
    }

    pub fn names(&self) -> Vec<&str> {
        self.iter().map(|(name, _)| name).collect()
    }

    /// Number of entries including the global one
    pub fn len(&self) -> usize {
        self.groups.len() + 1
    }

    /// Always false: the global entry is present even for an empty stream
    pub fn is_empty(&self) -> bool {
        false
    }
}

impl Serialize for AggregationResult {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.len()))?;
        for (name, snapshot) in self.iter() {
            map.serialize_entry(name, snapshot)?;
        }
        map.end()
    }
}

impl<'de> Deserialize<'de> for AggregationResult {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        deserializer.deserialize_map(ResultVisitor)
    }
}

/// Reads entries in document order so group ordering survives a round trip
struct ResultVisitor;

impl<'de> Visitor<'de> for ResultVisitor {
    type Value = AggregationResult;

    fn expecting(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(f, "a map of group names to snapshots containing '{}'", GLOBAL_GROUP)
    }

    fn visit_map<A: MapAccess<'de>>(self, mut access: A) -> Result<Self::Value, A::Error> {
        let mut global = None;
        let mut groups: Vec<(String, Snapshot)> = Vec::new();

        while let Some((name, snapshot)) = access.next_entry::<String, Snapshot>()? {
            let duplicate = if name == GLOBAL_GROUP {
                global.is_some()
            } else {
                groups.iter().any(|(existing, _)| *existing == name)
            };
            if duplicate {
                return Err(serde::de::Error::custom(format!("duplicate group '{}'", name)));
            }

            if name == GLOBAL_GROUP {
                global = Some(snapshot);
            } else {
                groups.push((name, snapshot));
            }
        }

        let global = global.ok_or_else(|| serde::de::Error::missing_field(GLOBAL_GROUP))?;
        Ok(AggregationResult::new(global, groups))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn snapshot(count: u64, errors: u64) -> Snapshot {
        Snapshot {
            count,
            success_count: count - errors,
            error_count: errors,
            ..Snapshot::empty()
        }
    }

    #[test]
    fn test_lookup_includes_global_key() {
        let result = AggregationResult::new(
            snapshot(4, 1),
            vec![("page".to_string(), snapshot(2, 0))],
        );

        assert_eq!(result.len(), 2);
        assert_eq!(result.get(GLOBAL_GROUP).unwrap().count, 4);
        assert_eq!(result.get("page").unwrap().count, 2);
        assert!(result.get("blob").is_none());
        assert_eq!(result.names(), vec![GLOBAL_GROUP, "page"]);
    }

    #[test]
    fn test_error_rate() {
        assert_eq!(snapshot(4, 1).error_rate(), Some(25.0));
        assert_eq!(Snapshot::empty().error_rate(), None);
    }

    #[test]
    fn test_throughput() {
        let mut s = snapshot(11, 0);
        s.first_timestamp = Utc.timestamp_millis_opt(0).single();
        s.last_timestamp = Utc.timestamp_millis_opt(2_000).single();
        assert_eq!(s.throughput(), Some(5.5));

        s.last_timestamp = s.first_timestamp;
        assert_eq!(s.throughput(), None);
    }

    #[test]
    fn test_json_preserves_group_order() {
        let result = AggregationResult::new(
            snapshot(3, 0),
            vec![
                ("zeta".to_string(), snapshot(1, 0)),
                ("alpha".to_string(), snapshot(2, 0)),
            ],
        );

        let json = serde_json::to_string(&result).unwrap();
        assert!(json.find("zeta").unwrap() < json.find("alpha").unwrap());

        let back: AggregationResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
    }

    #[test]
    fn test_json_requires_global_entry() {
        let json = r#"{"page": {"count":0,"success_count":0,"error_count":0,
            "first_timestamp":null,"last_timestamp":null,"duration":null,"size":null}}"#;
        assert!(serde_json::from_str::<AggregationResult>(json).is_err());
    }

    #[test]
    fn test_json_rejects_duplicate_global_entry() {
        let entry = serde_json::to_string(&snapshot(1, 0)).unwrap();
        let json = format!(r#"{{"{0}": {1}, "{0}": {1}}}"#, GLOBAL_GROUP, entry);

        let err = serde_json::from_str::<AggregationResult>(&json).unwrap_err();
        assert!(err.to_string().contains("duplicate group"));
    }

    #[test]
    fn test_large_sum_survives_json() {
        let stats = DistributionStats {
            min: u64::MAX,
            max: u64::MAX,
            mean: u64::MAX as f64,
            sum: u128::from(u64::MAX) * 2,
            retained: 2,
            percentiles: Vec::new(),
        };
        let global = Snapshot {
            duration: Some(stats),
            ..snapshot(2, 0)
        };
        let result = AggregationResult::new(global, Vec::new());

        let json = serde_json::to_string(&result).unwrap();
        let back: AggregationResult = serde_json::from_str(&json).unwrap();
        assert_eq!(back, result);
    }
}
