//! Priority-prefixed data encoding
//!
//! Providers store the priority of MX, SRV and URI records as the leading
//! token of the data string (`"10 mail.example.com"`). Callers keep it as a
//! separate field.

/// Record types whose provider data carries a leading priority token
const PRIORITY_TYPES: [&str; 3] = ["MX", "SRV", "URI"];

/// Whether records of this type encode a priority in their data
pub fn has_priority(rtype: &str) -> bool {
    PRIORITY_TYPES.iter().any(|t| t.eq_ignore_ascii_case(rtype))
}

/// Render a caller value (and optional priority) as provider data
///
/// An empty value stays empty so it keeps acting as a wildcard in matching.
pub fn encode_data(rtype: &str, value: &str, priority: Option<u16>) -> String {
    match priority {
        Some(priority) if has_priority(rtype) && !value.is_empty() => {
            format!("{} {}", priority, value)
        }
        _ => value.to_string(),
    }
}

/// Split provider data into priority and value
///
/// Data without a leading numeric token is returned whole with no priority.
pub fn decode_data(rtype: &str, data: &str) -> (Option<u16>, String) {
    if !has_priority(rtype) {
        return (None, data.to_string());
    }

    match data.split_once(' ') {
        Some((head, rest)) => match head.parse::<u16>() {
            Ok(priority) => (Some(priority), rest.trim_start().to_string()),
            Err(_) => (None, data.to_string()),
        },
        None => (None, data.to_string()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn mx_priority_is_prefixed() {
        let data = encode_data("MX", "mail.example.com", Some(10));
        assert_eq!(data, "10 mail.example.com");

        let (priority, value) = decode_data("MX", &data);
        assert_eq!(priority, Some(10));
        assert_eq!(value, "mail.example.com");
    }

    #[test]
    fn srv_keeps_remaining_fields() {
        let (priority, value) = decode_data("SRV", "5 0 5060 sip.example.com");
        assert_eq!(priority, Some(5));
        assert_eq!(value, "0 5060 sip.example.com");
    }

    #[test]
    fn non_priority_types_pass_through() {
        assert_eq!(encode_data("A", "1.1.1.1", Some(10)), "1.1.1.1");
        assert_eq!(decode_data("TXT", "10 apples"), (None, "10 apples".to_string()));
    }

    #[test]
    fn malformed_priority_is_kept_in_value() {
        assert_eq!(
            decode_data("MX", "mail.example.com"),
            (None, "mail.example.com".to_string())
        );
        assert_eq!(
            decode_data("MX", "ten mail.example.com"),
            (None, "ten mail.example.com".to_string())
        );
    }

    #[test]
    fn empty_value_stays_empty() {
        assert_eq!(encode_data("MX", "", Some(10)), "");
    }
}
