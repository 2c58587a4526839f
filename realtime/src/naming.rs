// Channel key <-> wire qualified-name translation
//
// Channel keys are dot-separated ("power.battery1.voltage"); the wire wants
// slash-separated qualified names with a leading slash
// ("/power/battery1/voltage"). Both directions are pure.

pub fn to_qualified_name(key: &str) -> String {
    let mut name = String::with_capacity(key.len() + 1);
    for segment in key.split('.') {
        name.push('/');
        name.push_str(segment);
    }
    name
}

pub fn to_channel_key(qualified: &str) -> String {
    qualified
        .trim_start_matches('/')
        .split('/')
        .collect::<Vec<_>>()
        .join(".")
}

/// A subscribable channel key: non-empty, with no empty segments.
pub fn is_valid_key(key: &str) -> bool {
    !key.is_empty() && key.split('.').all(|segment| !segment.is_empty())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn translation_round_trips() {
        let key = "power.battery1.voltage";
        let qualified = to_qualified_name(key);
        assert_eq!(qualified, "/power/battery1/voltage");
        assert_eq!(to_channel_key(&qualified), key);
    }

    #[test]
    fn single_segment_keys_translate() {
        assert_eq!(to_qualified_name("heartbeat"), "/heartbeat");
        assert_eq!(to_channel_key("/heartbeat"), "heartbeat");
    }

    #[test]
    fn validity_rejects_empty_segments() {
        assert!(is_valid_key("a.b"));
        assert!(is_valid_key("heartbeat"));
        assert!(!is_valid_key(""));
        assert!(!is_valid_key("a..b"));
        assert!(!is_valid_key(".a"));
    }
}
