//! Discovered-attribute aggregation.
//!
//! The tracker is an explicit context object owned by whoever runs the
//! batch. There is no global registry: two orchestrators (or two test
//! runs) never see each other's discoveries.

use std::collections::HashMap;

use atelier_core::defaults;
use atelier_core::models::DiscoveredAttribute;

/// Promotion thresholds for discovered attributes.
#[derive(Debug, Clone, Copy)]
pub struct DiscoveryPolicy {
    /// Minimum batch frequency before a discovery is promotable.
    pub min_frequency: u32,
    /// Minimum confidence (0-100) before a discovery is promotable.
    pub min_confidence: f64,
}

impl Default for DiscoveryPolicy {
    fn default() -> Self {
        Self {
            min_frequency: defaults::DISCOVERY_MIN_FREQUENCY,
            min_confidence: defaults::DISCOVERY_MIN_CONFIDENCE,
        }
    }
}

#[derive(Debug, Clone)]
struct DiscoveryAgg {
    discovery: DiscoveredAttribute,
    frequency: u32,
    max_confidence: f64,
    values: Vec<String>,
}

/// Aggregates discoveries across a batch, keyed by attribute key.
#[derive(Debug, Default)]
pub struct DiscoveryTracker {
    seen: HashMap<String, DiscoveryAgg>,
}

impl DiscoveryTracker {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one discovery from one row.
    pub fn record(&mut self, discovery: &DiscoveredAttribute) {
        let agg = self
            .seen
            .entry(discovery.key.clone())
            .or_insert_with(|| DiscoveryAgg {
                discovery: discovery.clone(),
                frequency: 0,
                max_confidence: 0.0,
                values: Vec::new(),
            });
        agg.frequency += 1;
        agg.max_confidence = agg.max_confidence.max(discovery.confidence);
        if !agg.values.contains(&discovery.normalized_value) {
            agg.values.push(discovery.normalized_value.clone());
        }
    }

    /// Number of distinct discovered attribute keys.
    pub fn len(&self) -> usize {
        self.seen.len()
    }

    pub fn is_empty(&self) -> bool {
        self.seen.is_empty()
    }

    /// Discoveries meeting both policy thresholds, with aggregated
    /// frequency, best confidence, and the distinct values observed.
    pub fn promotable(&self, policy: &DiscoveryPolicy) -> Vec<DiscoveredAttribute> {
        let mut out: Vec<DiscoveredAttribute> = self
            .seen
            .values()
            .filter(|agg| {
                agg.frequency >= policy.min_frequency
                    && agg.max_confidence >= policy.min_confidence
            })
            .map(|agg| {
                let mut d = agg.discovery.clone();
                d.frequency = agg.frequency;
                d.confidence = agg.max_confidence;
                d.possible_values = agg.values.clone();
                d
            })
            .collect();
        out.sort_by(|a, b| a.key.cmp(&b.key));
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn discovery(key: &str, value: &str, confidence: f64) -> DiscoveredAttribute {
        DiscoveredAttribute {
            key: key.to_string(),
            label: key.to_string(),
            normalized_value: value.to_string(),
            raw_value: value.to_string(),
            confidence,
            frequency: 0,
            reasoning: String::new(),
            possible_values: Vec::new(),
        }
    }

    #[test]
    fn test_single_sighting_not_promotable() {
        let mut tracker = DiscoveryTracker::new();
        tracker.record(&discovery("cuff_style", "ribbed", 90.0));
        assert!(tracker.promotable(&DiscoveryPolicy::default()).is_empty());
    }

    #[test]
    fn test_frequency_and_confidence_both_required() {
        let mut tracker = DiscoveryTracker::new();
        // Frequent but weak.
        tracker.record(&discovery("hem_style", "curved", 40.0));
        tracker.record(&discovery("hem_style", "curved", 50.0));
        // Confident but seen once.
        tracker.record(&discovery("cuff_style", "ribbed", 95.0));

        assert!(tracker.promotable(&DiscoveryPolicy::default()).is_empty());
    }

    #[test]
    fn test_promotable_aggregates() {
        let mut tracker = DiscoveryTracker::new();
        tracker.record(&discovery("cuff_style", "ribbed", 80.0));
        tracker.record(&discovery("cuff_style", "elastic", 92.0));

        let promoted = tracker.promotable(&DiscoveryPolicy::default());
        assert_eq!(promoted.len(), 1);
        assert_eq!(promoted[0].key, "cuff_style");
        assert_eq!(promoted[0].frequency, 2);
        assert_eq!(promoted[0].confidence, 92.0);
        assert_eq!(promoted[0].possible_values, vec!["ribbed", "elastic"]);
    }

    #[test]
    fn test_trackers_are_isolated() {
        let mut a = DiscoveryTracker::new();
        let b = DiscoveryTracker::new();
        a.record(&discovery("cuff_style", "ribbed", 90.0));
        assert_eq!(a.len(), 1);
        assert!(b.is_empty());
    }

    #[test]
    fn test_custom_policy() {
        let mut tracker = DiscoveryTracker::new();
        tracker.record(&discovery("cuff_style", "ribbed", 60.0));
        let lax = DiscoveryPolicy {
            min_frequency: 1,
            min_confidence: 50.0,
        };
        assert_eq!(tracker.promotable(&lax).len(), 1);
    }
}
