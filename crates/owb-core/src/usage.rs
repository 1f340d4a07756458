//! Process-lifetime usage accounting across all users.

use std::sync::Mutex;

use serde::Deserialize;

/// Token/timing metrics for one completed model call, deserialized straight
/// from the API's `usage` object. Absent counters default to zero; the speed
/// field is only reported by some backends.
#[derive(Clone, Debug, Default, PartialEq, Deserialize)]
pub struct UsageSample {
    #[serde(default)]
    pub prompt_tokens: u64,
    #[serde(default)]
    pub completion_tokens: u64,
    #[serde(default)]
    pub total_tokens: u64,
    #[serde(default, rename = "total_duration")]
    pub duration_ns: u64,
    #[serde(default, rename = "response_token/s")]
    pub tokens_per_second: Option<f64>,
}

#[derive(Default)]
struct Totals {
    total_requests: u64,
    total_tokens: u64,
    total_prompt_tokens: u64,
    total_completion_tokens: u64,
    total_duration_ns: u64,
    speed_samples: Vec<f64>,
}

/// Point-in-time view of the running totals.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct UsageReport {
    pub total_requests: u64,
    pub total_tokens: u64,
    pub total_prompt_tokens: u64,
    pub total_completion_tokens: u64,
    pub total_duration_ns: u64,
    /// Arithmetic mean of the collected tokens/sec samples; 0 if none.
    pub avg_tokens_per_second: f64,
}

/// Cumulative usage statistics for the whole process. Counters only grow;
/// the only reset is a process restart.
#[derive(Default)]
pub struct UsageStats {
    totals: Mutex<Totals>,
}

impl UsageStats {
    pub fn new() -> Self {
        Self::default()
    }

    /// Apply one sample atomically: exactly one call per successful model
    /// request.
    pub fn record(&self, sample: &UsageSample) {
        let mut t = self.totals.lock().expect("usage totals lock");
        t.total_requests += 1;
        t.total_tokens += sample.total_tokens;
        t.total_prompt_tokens += sample.prompt_tokens;
        t.total_completion_tokens += sample.completion_tokens;
        t.total_duration_ns += sample.duration_ns;
        if let Some(speed) = sample.tokens_per_second {
            t.speed_samples.push(speed);
        }
    }

    pub fn snapshot(&self) -> UsageReport {
        let t = self.totals.lock().expect("usage totals lock");
        let avg = if t.speed_samples.is_empty() {
            0.0
        } else {
            t.speed_samples.iter().sum::<f64>() / t.speed_samples.len() as f64
        };
        UsageReport {
            total_requests: t.total_requests,
            total_tokens: t.total_tokens,
            total_prompt_tokens: t.total_prompt_tokens,
            total_completion_tokens: t.total_completion_tokens,
            total_duration_ns: t.total_duration_ns,
            avg_tokens_per_second: avg,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_snapshot_is_all_zero() {
        let stats = UsageStats::new();
        assert_eq!(stats.snapshot(), UsageReport::default());
    }

    #[test]
    fn totals_accumulate_across_records() {
        let stats = UsageStats::new();
        for i in 1..=3u64 {
            stats.record(&UsageSample {
                prompt_tokens: i,
                completion_tokens: 2 * i,
                total_tokens: 3 * i,
                duration_ns: 1_000 * i,
                tokens_per_second: None,
            });
        }

        let report = stats.snapshot();
        assert_eq!(report.total_requests, 3);
        assert_eq!(report.total_prompt_tokens, 6);
        assert_eq!(report.total_completion_tokens, 12);
        assert_eq!(report.total_tokens, 18);
        assert_eq!(report.total_duration_ns, 6_000);
    }

    #[test]
    fn average_speed_uses_only_present_samples() {
        let stats = UsageStats::new();
        stats.record(&UsageSample {
            tokens_per_second: Some(10.0),
            ..Default::default()
        });
        stats.record(&UsageSample::default());
        stats.record(&UsageSample {
            tokens_per_second: Some(30.0),
            ..Default::default()
        });

        let report = stats.snapshot();
        assert_eq!(report.total_requests, 3);
        assert!((report.avg_tokens_per_second - 20.0).abs() < f64::EPSILON);
    }

    #[test]
    fn deserializes_from_api_usage_object() {
        let sample: UsageSample = serde_json::from_str(
            r#"{
              "prompt_tokens": 5,
              "completion_tokens": 3,
              "total_tokens": 8,
              "total_duration": 2000000000,
              "response_token/s": 41.5
            }"#,
        )
        .unwrap();
        assert_eq!(sample.prompt_tokens, 5);
        assert_eq!(sample.duration_ns, 2_000_000_000);
        assert_eq!(sample.tokens_per_second, Some(41.5));

        // Missing fields default rather than fail.
        let sparse: UsageSample = serde_json::from_str("{}").unwrap();
        assert_eq!(sparse, UsageSample::default());
    }
}
