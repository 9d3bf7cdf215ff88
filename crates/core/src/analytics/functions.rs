use std::collections::BTreeMap;

use serde_json::Value;

use super::{EngagementMilestone, MetadataCount, TimeOnPageBucket, UtmPerformance, VisitorSplit};

/// Time-on-page buckets as `(label, exclusive upper bound in seconds)`.
pub const TIME_ON_PAGE_BUCKETS: [(&str, Option<i64>); 6] = [
    ("0-10s", Some(10)),
    ("10-30s", Some(30)),
    ("30-60s", Some(60)),
    ("1-2min", Some(120)),
    ("2-5min", Some(300)),
    ("5min+", None),
];

/// Counts durations per time-on-page bucket. All six buckets are always present.
pub fn bucket_durations(durations: &[i64]) -> Vec<TimeOnPageBucket> {
    let mut counts = [0i64; TIME_ON_PAGE_BUCKETS.len()];

    for duration in durations {
        let idx = TIME_ON_PAGE_BUCKETS
            .iter()
            .position(|(_, upper)| upper.is_none_or(|upper| *duration < upper))
            .unwrap_or(TIME_ON_PAGE_BUCKETS.len() - 1);
        counts[idx] += 1;
    }

    TIME_ON_PAGE_BUCKETS
        .iter()
        .zip(counts)
        .map(|((label, _), count)| TimeOnPageBucket {
            time_range: label.to_string(),
            count,
        })
        .collect()
}

/// Returning visitors versus the rest of the sessions.
pub fn visitor_split(returning: i64, total_sessions: i64) -> VisitorSplit {
    VisitorSplit {
        returning_visitors: returning,
        new_visitors: total_sessions - returning,
    }
}

fn parse_metadata(raw: Option<&str>) -> Option<Value> {
    serde_json::from_str(raw.unwrap_or("{}")).ok()
}

fn non_empty_str(value: &Value, key: &str) -> Option<String> {
    value
        .get(key)
        .and_then(Value::as_str)
        .filter(|s| !s.is_empty())
        .map(String::from)
}

/// Groups UTM tracking events by campaign, source and medium.
///
/// Metadata that isn't valid JSON lands in the all-`None` group. Result is
/// ordered by sessions, most first.
pub fn utm_performance(rows: &[MetadataCount]) -> Vec<UtmPerformance> {
    let mut groups: BTreeMap<(Option<String>, Option<String>, Option<String>), i64> =
        BTreeMap::new();

    for row in rows {
        let key = match parse_metadata(row.metadata.as_deref()) {
            Some(meta) => (
                non_empty_str(&meta, "campaign"),
                non_empty_str(&meta, "source"),
                non_empty_str(&meta, "medium"),
            ),
            None => (None, None, None),
        };
        *groups.entry(key).or_insert(0) += row.count;
    }

    let mut result: Vec<UtmPerformance> = groups
        .into_iter()
        .map(|((campaign, source, medium), sessions)| UtmPerformance {
            campaign,
            source,
            medium,
            sessions,
        })
        .collect();
    result.sort_by(|a, b| b.sessions.cmp(&a.sessions));
    result
}

/// Groups time milestone events by their `seconds` value, ascending.
///
/// Missing, zero or unparseable `seconds` count towards milestone 0.
pub fn engagement_milestones(rows: &[MetadataCount]) -> Vec<EngagementMilestone> {
    let mut groups: BTreeMap<i64, i64> = BTreeMap::new();

    for row in rows {
        let seconds = parse_metadata(row.metadata.as_deref())
            .and_then(|meta| {
                let seconds = meta.get("seconds")?;
                seconds
                    .as_i64()
                    .or_else(|| seconds.as_f64().map(|f| f as i64))
            })
            .unwrap_or(0);
        *groups.entry(seconds).or_insert(0) += row.count;
    }

    groups
        .into_iter()
        .map(|(milestone, user_count)| EngagementMilestone {
            milestone,
            user_count,
        })
        .collect()
}
