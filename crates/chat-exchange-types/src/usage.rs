use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Token accounting reported by a provider.
///
/// `total_tokens` is taken as reported; it is never recomputed from, or
/// checked against, the input and output counts.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageDetails {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub input_tokens: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub output_tokens: Option<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub total_tokens: Option<i64>,
    /// Provider-specific counters (cached tokens, reasoning tokens, ...).
    #[serde(default, skip_serializing_if = "IndexMap::is_empty")]
    pub additional_counts: IndexMap<String, i64>,
}

/// Absent + absent stays absent; otherwise an absent side counts as zero.
fn add_optional(a: Option<i64>, b: Option<i64>) -> Option<i64> {
    match (a, b) {
        (None, None) => None,
        (Some(v), None) | (None, Some(v)) => Some(v),
        (Some(a), Some(b)) => Some(a.saturating_add(b)),
    }
}

impl UsageDetails {
    pub fn new(input_tokens: i64, output_tokens: i64) -> Self {
        Self {
            input_tokens: Some(input_tokens),
            output_tokens: Some(output_tokens),
            ..Default::default()
        }
    }

    /// Builder-style setter for total_tokens.
    pub fn total_tokens(mut self, total_tokens: i64) -> Self {
        self.total_tokens = Some(total_tokens);
        self
    }

    /// Builder-style setter for one additional counter.
    pub fn additional_count(mut self, key: impl Into<String>, value: i64) -> Self {
        self.additional_counts.insert(key.into(), value);
        self
    }

    /// True when nothing has been reported.
    pub fn is_empty(&self) -> bool {
        self.input_tokens.is_none()
            && self.output_tokens.is_none()
            && self.total_tokens.is_none()
            && self.additional_counts.is_empty()
    }

    /// Field-wise accumulate `other` into `self`.
    pub fn accumulate(&mut self, other: &UsageDetails) {
        self.input_tokens = add_optional(self.input_tokens, other.input_tokens);
        self.output_tokens = add_optional(self.output_tokens, other.output_tokens);
        self.total_tokens = add_optional(self.total_tokens, other.total_tokens);
        for (key, value) in &other.additional_counts {
            let slot = self.additional_counts.entry(key.clone()).or_insert(0);
            *slot = slot.saturating_add(*value);
        }
    }
}

impl std::ops::Add for UsageDetails {
    type Output = UsageDetails;
    fn add(mut self, rhs: UsageDetails) -> UsageDetails {
        self.accumulate(&rhs);
        self
    }
}

impl std::ops::Add for &UsageDetails {
    type Output = UsageDetails;
    fn add(self, rhs: &UsageDetails) -> UsageDetails {
        let mut sum = self.clone();
        sum.accumulate(rhs);
        sum
    }
}

impl std::ops::AddAssign<&UsageDetails> for UsageDetails {
    fn add_assign(&mut self, rhs: &UsageDetails) {
        self.accumulate(rhs);
    }
}

impl std::ops::AddAssign for UsageDetails {
    fn add_assign(&mut self, rhs: UsageDetails) {
        self.accumulate(&rhs);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_usage_default_is_empty() {
        let u = UsageDetails::default();
        assert!(u.is_empty());
        assert_eq!(u.input_tokens, None);
    }

    #[test]
    fn test_usage_addition_none_plus_none_stays_none() {
        let sum = UsageDetails::default() + UsageDetails::default();
        assert_eq!(sum.input_tokens, None);
        assert_eq!(sum.output_tokens, None);
        assert_eq!(sum.total_tokens, None);
    }

    #[test]
    fn test_usage_addition_some_plus_none() {
        let a = UsageDetails {
            input_tokens: Some(10),
            ..Default::default()
        };
        let b = UsageDetails {
            output_tokens: Some(5),
            total_tokens: Some(15),
            ..Default::default()
        };
        let sum = &a + &b;
        assert_eq!(sum.input_tokens, Some(10));
        assert_eq!(sum.output_tokens, Some(5));
        assert_eq!(sum.total_tokens, Some(15));
        // Originals are not consumed
        assert_eq!(a.output_tokens, None);
    }

    #[test]
    fn test_usage_total_not_recomputed() {
        let mut a = UsageDetails::new(10, 5).total_tokens(100);
        a += UsageDetails::new(1, 1);
        assert_eq!(a.total_tokens, Some(100));
    }

    #[test]
    fn test_usage_additional_counts_summed_keywise() {
        let mut a = UsageDetails::default()
            .additional_count("cached", 3)
            .additional_count("reasoning", 2);
        let b = UsageDetails::default()
            .additional_count("cached", 4)
            .additional_count("audio", 1);
        a += &b;
        assert_eq!(a.additional_counts["cached"], 7);
        assert_eq!(a.additional_counts["reasoning"], 2);
        assert_eq!(a.additional_counts["audio"], 1);
    }

    #[test]
    fn test_usage_serde_omits_absent_fields() {
        let u = UsageDetails {
            input_tokens: Some(3),
            ..Default::default()
        };
        let json = serde_json::to_string(&u).unwrap();
        assert_eq!(json, r#"{"input_tokens":3}"#);
        let back: UsageDetails = serde_json::from_str(&json).unwrap();
        assert_eq!(back, u);
    }

    fn usage_strategy() -> impl Strategy<Value = UsageDetails> {
        (
            proptest::option::of(0i64..1_000_000),
            proptest::option::of(0i64..1_000_000),
            proptest::option::of(0i64..1_000_000),
            proptest::collection::vec((prop::sample::select(vec!["a", "b", "c"]), 0i64..1000), 0..3),
        )
            .prop_map(|(input, output, total, extra)| {
                let mut u = UsageDetails {
                    input_tokens: input,
                    output_tokens: output,
                    total_tokens: total,
                    ..Default::default()
                };
                for (k, v) in extra {
                    u.additional_counts.insert(k.to_string(), v);
                }
                u
            })
    }

    fn same_counts(a: &UsageDetails, b: &UsageDetails) -> bool {
        a.input_tokens == b.input_tokens
            && a.output_tokens == b.output_tokens
            && a.total_tokens == b.total_tokens
            && a.additional_counts.len() == b.additional_counts.len()
            && a
                .additional_counts
                .iter()
                .all(|(k, v)| b.additional_counts.get(k) == Some(v))
    }

    proptest! {
        #[test]
        fn prop_empty_is_identity(u in usage_strategy()) {
            let sum = &u + &UsageDetails::default();
            prop_assert!(same_counts(&sum, &u));
        }

        #[test]
        fn prop_addition_commutes(a in usage_strategy(), b in usage_strategy()) {
            prop_assert!(same_counts(&(&a + &b), &(&b + &a)));
        }

        #[test]
        fn prop_addition_associates(a in usage_strategy(), b in usage_strategy(), c in usage_strategy()) {
            let left = &(&a + &b) + &c;
            let right = &a + &(&b + &c);
            prop_assert!(same_counts(&left, &right));
        }
    }
}
