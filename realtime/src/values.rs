// Wire engineering value -> normalized scalar/string extraction
use groundlink_common::{EngineeringValue, WireValue};

/// Extract the value field selected by the wire `type` tag. Unknown tags and
/// tags whose matching field is absent yield `None`.
pub fn extract(value: &WireValue) -> Option<EngineeringValue> {
    match value.value_type.as_str() {
        "FLOAT" => value.float_value.map(EngineeringValue::Float),
        "DOUBLE" => value.double_value.map(EngineeringValue::Float),
        "SINT32" => value.sint32_value.map(|v| EngineeringValue::Integer(v as i64)),
        "UINT32" => value.uint32_value.map(|v| EngineeringValue::Unsigned(v as u64)),
        "SINT64" => value.sint64_value.map(EngineeringValue::Integer),
        "UINT64" => value.uint64_value.map(EngineeringValue::Unsigned),
        "BOOLEAN" => value.boolean_value.map(EngineeringValue::Boolean),
        "STRING" | "ENUMERATED" => value.string_value.clone().map(EngineeringValue::Text),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn wire(value_type: &str) -> WireValue {
        WireValue {
            value_type: value_type.to_string(),
            ..Default::default()
        }
    }

    #[test]
    fn extracts_numeric_types() {
        let mut v = wire("FLOAT");
        v.float_value = Some(3.5);
        assert_eq!(extract(&v), Some(EngineeringValue::Float(3.5)));

        let mut v = wire("SINT32");
        v.sint32_value = Some(-7);
        assert_eq!(extract(&v), Some(EngineeringValue::Integer(-7)));

        let mut v = wire("UINT64");
        v.uint64_value = Some(u64::MAX);
        assert_eq!(extract(&v), Some(EngineeringValue::Unsigned(u64::MAX)));
    }

    #[test]
    fn enumerated_values_normalize_to_text() {
        let mut v = wire("ENUMERATED");
        v.string_value = Some("SAFE_MODE".to_string());
        assert_eq!(
            extract(&v),
            Some(EngineeringValue::Text("SAFE_MODE".to_string()))
        );
    }

    #[test]
    fn unknown_type_yields_none() {
        let mut v = wire("AGGREGATE");
        v.string_value = Some("ignored".to_string());
        assert_eq!(extract(&v), None);
    }

    #[test]
    fn tag_without_matching_field_yields_none() {
        // Tag says FLOAT but only a string field is present.
        let mut v = wire("FLOAT");
        v.string_value = Some("3.5".to_string());
        assert_eq!(extract(&v), None);
    }
}
