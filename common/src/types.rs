// Core telemetry data types - wire messages and the samples handed to subscribers
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// One decoded telemetry sample handed to a subscriber callback.
///
/// Constructed per inbound frame, dispatched synchronously, never retained
/// by the core.
#[derive(Debug, Clone, Serialize)]
pub struct ParameterSample {
    pub channel: String,
    pub timestamp: Option<DateTime<Utc>>,
    pub value: Option<EngineeringValue>,
    pub violation: Option<LimitViolation>,
}

/// A discrete event record, delivered as-is to the event channel subscriber.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    pub data: serde_json::Value,
}

impl EventRecord {
    pub fn message(&self) -> Option<&str> {
        self.data.get("message").and_then(|v| v.as_str())
    }

    pub fn severity(&self) -> Option<&str> {
        self.data.get("severity").and_then(|v| v.as_str())
    }
}

/// What the registry delivers to a subscriber callback.
#[derive(Debug, Clone)]
pub enum Update {
    Parameter(ParameterSample),
    Event(EventRecord),
}

/// Normalized engineering value extracted from the wire representation.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum EngineeringValue {
    Float(f64),
    Integer(i64),
    Unsigned(u64),
    Boolean(bool),
    Text(String),
}

impl EngineeringValue {
    /// Numeric view of the value, when it has one.
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            EngineeringValue::Float(v) => Some(*v),
            EngineeringValue::Integer(v) => Some(*v as f64),
            EngineeringValue::Unsigned(v) => Some(*v as f64),
            EngineeringValue::Boolean(_) | EngineeringValue::Text(_) => None,
        }
    }
}

/// Recognized alarm severities, ordered least to most severe.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum AlarmSeverity {
    Watch,
    Warning,
    Distress,
    Critical,
    Severe,
}

impl AlarmSeverity {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "WATCH" => Some(AlarmSeverity::Watch),
            "WARNING" => Some(AlarmSeverity::Warning),
            "DISTRESS" => Some(AlarmSeverity::Distress),
            "CRITICAL" => Some(AlarmSeverity::Critical),
            "SEVERE" => Some(AlarmSeverity::Severe),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            AlarmSeverity::Watch => "WATCH",
            AlarmSeverity::Warning => "WARNING",
            AlarmSeverity::Distress => "DISTRESS",
            AlarmSeverity::Critical => "CRITICAL",
            AlarmSeverity::Severe => "SEVERE",
        }
    }
}

/// Which side of the acceptable range a sample fell out of.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum RangeCondition {
    Low,
    High,
}

impl RangeCondition {
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "LOW" => Some(RangeCondition::Low),
            "HIGH" => Some(RangeCondition::High),
            _ => None,
        }
    }
}

/// Limit-violation metadata attached to a sample whose monitoring result
/// classified it outside an acceptable range. Derived, never persisted.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct LimitViolation {
    pub severity: AlarmSeverity,
    pub name: String,
    pub low: Option<f64>,
    pub high: Option<f64>,
    pub css_class: String,
}

// Wire-level message types

/// Per-channel update as it appears inside a PARAMETER frame body.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ParameterUpdate {
    pub id: ParameterId,
    #[serde(default)]
    pub generation_time: Option<DateTime<Utc>>,
    #[serde(default)]
    pub eng_value: Option<WireValue>,
    #[serde(default)]
    pub monitoring_result: Option<String>,
    #[serde(default)]
    pub range_condition: Option<String>,
    #[serde(default)]
    pub alarm_range: Vec<AlarmRange>,
}

/// Qualified identifier of a parameter on the wire.
#[derive(Debug, Clone, Deserialize)]
pub struct ParameterId {
    pub name: String,
    #[serde(default)]
    pub namespace: Option<String>,
}

/// Typed engineering value union as encoded on the wire. Exactly one of the
/// value fields is populated, selected by the `type` tag.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct WireValue {
    #[serde(rename = "type")]
    pub value_type: String,
    #[serde(default)]
    pub float_value: Option<f64>,
    #[serde(default)]
    pub double_value: Option<f64>,
    #[serde(default)]
    pub sint32_value: Option<i32>,
    #[serde(default)]
    pub uint32_value: Option<u32>,
    #[serde(default)]
    pub sint64_value: Option<i64>,
    #[serde(default)]
    pub uint64_value: Option<u64>,
    #[serde(default)]
    pub boolean_value: Option<bool>,
    #[serde(default)]
    pub string_value: Option<String>,
}

/// One alarm range definition carried alongside a parameter update.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AlarmRange {
    pub level: String,
    #[serde(default)]
    pub min_inclusive: Option<f64>,
    #[serde(default)]
    pub min_exclusive: Option<f64>,
    #[serde(default)]
    pub max_inclusive: Option<f64>,
    #[serde(default)]
    pub max_exclusive: Option<f64>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parameter_update_deserializes_limit_fields() {
        let raw = r#"{
            "id": {"name": "/power/battery1/voltage"},
            "generationTime": "2025-03-14T12:00:00Z",
            "engValue": {"type": "FLOAT", "floatValue": 11.7},
            "monitoringResult": "CRITICAL",
            "rangeCondition": "LOW",
            "alarmRange": [
                {"level": "CRITICAL", "minInclusive": 12.0, "maxInclusive": 16.0}
            ]
        }"#;

        let update: ParameterUpdate = serde_json::from_str(raw).unwrap();
        assert_eq!(update.id.name, "/power/battery1/voltage");
        assert_eq!(update.monitoring_result.as_deref(), Some("CRITICAL"));
        assert_eq!(update.range_condition.as_deref(), Some("LOW"));
        assert_eq!(update.alarm_range.len(), 1);
        assert_eq!(update.alarm_range[0].min_inclusive, Some(12.0));
    }

    #[test]
    fn parameter_update_tolerates_missing_optional_fields() {
        let raw = r#"{"id": {"name": "/thermal/sensor3"}}"#;
        let update: ParameterUpdate = serde_json::from_str(raw).unwrap();
        assert!(update.eng_value.is_none());
        assert!(update.monitoring_result.is_none());
        assert!(update.alarm_range.is_empty());
    }

    #[test]
    fn severity_parse_rejects_unknown() {
        assert_eq!(AlarmSeverity::parse("CRITICAL"), Some(AlarmSeverity::Critical));
        assert_eq!(AlarmSeverity::parse("NOMINAL"), None);
        assert_eq!(AlarmSeverity::parse("critical"), None);
    }
}
