//! `TS.INFO` reply parsing
//!
//! RESP2 servers answer with a flat `[key, value, key, value, ...]` array,
//! RESP3 servers with a map. Rules come as `[dest, bucket_ms, aggregator, ...]`
//! arrays, or as a map keyed by destination on newer module versions.

use redis::Value;

use crate::errors::{Result, ServiceError};

/// One compaction rule attached to a source series
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TimeSeriesRule {
    pub destination: String,
    pub bucket_ms: i64,
    pub aggregator: String,
}

/// The parts of `TS.INFO` the service uses
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TimeSeriesInfo {
    pub total_samples: i64,
    pub retention_ms: i64,
    pub first_timestamp: i64,
    pub last_timestamp: i64,
    pub source_key: Option<String>,
    pub labels: Vec<(String, String)>,
    pub rules: Vec<TimeSeriesRule>,
}

impl TimeSeriesInfo {
    pub fn from_value(value: &Value) -> Result<Self> {
        let mut info = TimeSeriesInfo::default();
        for (key, value) in pairs(value)? {
            let Some(key) = as_string(key) else { continue };
            match key.as_str() {
                "totalSamples" => info.total_samples = as_int(value).unwrap_or_default(),
                "retentionTime" => info.retention_ms = as_int(value).unwrap_or_default(),
                "firstTimestamp" => info.first_timestamp = as_int(value).unwrap_or_default(),
                "lastTimestamp" => info.last_timestamp = as_int(value).unwrap_or_default(),
                "sourceKey" => info.source_key = as_string(value),
                "labels" => info.labels = parse_labels(value),
                "rules" => info.rules = parse_rules(value),
                _ => {}
            }
        }
        Ok(info)
    }

    pub fn rule_destinations(&self) -> impl Iterator<Item = &str> {
        self.rules.iter().map(|r| r.destination.as_str())
    }
}

fn pairs(value: &Value) -> Result<Vec<(&Value, &Value)>> {
    match value {
        Value::Map(entries) => Ok(entries.iter().map(|(k, v)| (k, v)).collect()),
        Value::Array(items) => Ok(items
            .chunks_exact(2)
            .map(|pair| (&pair[0], &pair[1]))
            .collect()),
        other => Err(ServiceError::time_series(format!(
            "Unexpected TS.INFO reply: {:?}",
            other
        ))),
    }
}

fn as_string(value: &Value) -> Option<String> {
    match value {
        Value::BulkString(bytes) => Some(String::from_utf8_lossy(bytes).into_owned()),
        Value::SimpleString(s) => Some(s.clone()),
        Value::Int(i) => Some(i.to_string()),
        Value::Okay => Some("OK".to_string()),
        _ => None,
    }
}

fn as_int(value: &Value) -> Option<i64> {
    match value {
        Value::Int(i) => Some(*i),
        other => as_string(other).and_then(|s| s.parse().ok()),
    }
}

fn parse_labels(value: &Value) -> Vec<(String, String)> {
    match value {
        Value::Map(entries) => entries
            .iter()
            .filter_map(|(k, v)| Some((as_string(k)?, as_string(v)?)))
            .collect(),
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::Array(pair) if pair.len() == 2 => {
                    Some((as_string(&pair[0])?, as_string(&pair[1])?))
                }
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

fn parse_rules(value: &Value) -> Vec<TimeSeriesRule> {
    match value {
        Value::Array(items) => items
            .iter()
            .filter_map(|item| match item {
                Value::Array(parts) if parts.len() >= 3 => Some(TimeSeriesRule {
                    destination: as_string(&parts[0])?,
                    bucket_ms: as_int(&parts[1])?,
                    aggregator: as_string(&parts[2])?.to_lowercase(),
                }),
                _ => None,
            })
            .collect(),
        Value::Map(entries) => entries
            .iter()
            .filter_map(|(dest, rest)| match rest {
                Value::Array(parts) if parts.len() >= 2 => Some(TimeSeriesRule {
                    destination: as_string(dest)?,
                    bucket_ms: as_int(&parts[0])?,
                    aggregator: as_string(&parts[1])?.to_lowercase(),
                }),
                _ => None,
            })
            .collect(),
        _ => Vec::new(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn bulk(s: &str) -> Value {
        Value::BulkString(s.as_bytes().to_vec())
    }

    #[test]
    fn test_parse_resp2_reply() {
        let reply = Value::Array(vec![
            bulk("totalSamples"),
            Value::Int(3),
            bulk("retentionTime"),
            Value::Int(2000),
            bulk("lastTimestamp"),
            Value::Int(1700000000000),
            bulk("sourceKey"),
            Value::Nil,
            bulk("labels"),
            Value::Array(vec![
                Value::Array(vec![bulk("name"), bulk("svc")]),
                Value::Array(vec![bulk("type"), bulk("src")]),
            ]),
            bulk("rules"),
            Value::Array(vec![
                Value::Array(vec![
                    bulk("ch_avg_1s"),
                    Value::Int(1000),
                    Value::SimpleString("AVG".to_string()),
                    Value::Int(0),
                ]),
                Value::Array(vec![bulk("ch_std.s_1s"), Value::Int(1000), bulk("STD.S")]),
            ]),
        ]);

        let info = TimeSeriesInfo::from_value(&reply).unwrap();
        assert_eq!(info.total_samples, 3);
        assert_eq!(info.retention_ms, 2000);
        assert_eq!(info.last_timestamp, 1700000000000);
        assert_eq!(info.source_key, None);
        assert_eq!(
            info.labels,
            vec![
                ("name".to_string(), "svc".to_string()),
                ("type".to_string(), "src".to_string())
            ]
        );
        assert_eq!(info.rules.len(), 2);
        assert_eq!(info.rules[0].aggregator, "avg");
        assert_eq!(info.rules[1].destination, "ch_std.s_1s");
        assert_eq!(
            info.rule_destinations().collect::<Vec<_>>(),
            vec!["ch_avg_1s", "ch_std.s_1s"]
        );
    }

    #[test]
    fn test_parse_resp3_map_reply() {
        let reply = Value::Map(vec![
            (Value::SimpleString("totalSamples".into()), Value::Int(7)),
            (
                Value::SimpleString("rules".into()),
                Value::Map(vec![(
                    bulk("ch_avg_60s"),
                    Value::Array(vec![Value::Int(60000), bulk("avg"), Value::Int(0)]),
                )]),
            ),
        ]);

        let info = TimeSeriesInfo::from_value(&reply).unwrap();
        assert_eq!(info.total_samples, 7);
        assert_eq!(
            info.rules,
            vec![TimeSeriesRule {
                destination: "ch_avg_60s".to_string(),
                bucket_ms: 60000,
                aggregator: "avg".to_string(),
            }]
        );
    }

    #[test]
    fn test_unexpected_reply_is_error() {
        let result = TimeSeriesInfo::from_value(&Value::Int(1));
        assert!(matches!(result, Err(ServiceError::TimeSeries(_))));
    }
}
