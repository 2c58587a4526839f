// Limit evaluation for inbound telemetry samples
//
// Pure mapping from one parameter update's monitoring fields to an optional
// violation descriptor. No state, no side effects; safe to call from any
// dispatch path concurrently.

use groundlink_common::{AlarmSeverity, LimitViolation, ParameterUpdate, RangeCondition};

const CAUTION_CLASS: &str = "limit-caution";
const DANGER_CLASS: &str = "limit-danger";
const LOW_CLASS: &str = "limit-low";
const HIGH_CLASS: &str = "limit-high";

fn severity_class(severity: AlarmSeverity) -> &'static str {
    match severity {
        AlarmSeverity::Watch | AlarmSeverity::Warning | AlarmSeverity::Distress => CAUTION_CLASS,
        AlarmSeverity::Critical | AlarmSeverity::Severe => DANGER_CLASS,
    }
}

/// Evaluate one update against its own monitoring metadata.
///
/// Returns `None` when the update carries no monitoring result or an
/// unrecognized one. A recognized range condition appends the directional
/// style token and copies the bounds from the alarm range whose level matches
/// the severity; the inclusive bound is read first, so an exclusive bound
/// overwrites it when both are present.
pub fn evaluate(update: &ParameterUpdate) -> Option<LimitViolation> {
    let severity = update
        .monitoring_result
        .as_deref()
        .and_then(AlarmSeverity::parse)?;

    let mut css_class = severity_class(severity).to_string();
    let mut low = None;
    let mut high = None;

    let condition = update
        .range_condition
        .as_deref()
        .and_then(RangeCondition::parse);
    if let Some(condition) = condition {
        css_class.push(' ');
        css_class.push_str(match condition {
            RangeCondition::Low => LOW_CLASS,
            RangeCondition::High => HIGH_CLASS,
        });

        let range = update
            .alarm_range
            .iter()
            .find(|range| AlarmSeverity::parse(&range.level) == Some(severity));
        if let Some(range) = range {
            if let Some(bound) = range.min_inclusive {
                low = Some(bound);
            }
            if let Some(bound) = range.min_exclusive {
                low = Some(bound);
            }
            if let Some(bound) = range.max_inclusive {
                high = Some(bound);
            }
            if let Some(bound) = range.max_exclusive {
                high = Some(bound);
            }
        }
    }

    Some(LimitViolation {
        severity,
        name: severity.as_str().to_string(),
        low,
        high,
        css_class,
    })
}
