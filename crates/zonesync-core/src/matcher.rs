//! Record matching
//!
//! Decides whether a desired record and a provider record refer to the same
//! record. Every unset desired field is a wildcard.

use std::time::Duration;

use crate::record::{DesiredRecord, ProviderRecord};

/// Per-field outcome of comparing a desired record with a provider record
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MatchResult {
    pub name: bool,
    pub rtype: bool,
    pub data: bool,
    pub ttl: bool,
}

impl MatchResult {
    /// Every field matches
    pub fn all(&self) -> bool {
        self.name && self.rtype && self.data && self.ttl
    }

    /// At least one field matches
    pub fn any(&self) -> bool {
        self.name || self.rtype || self.data || self.ttl
    }

    /// No field matches
    pub fn none(&self) -> bool {
        !self.any()
    }

    /// Name and type match, i.e. both records belong to the same RRset
    pub fn rrset(&self) -> bool {
        self.name && self.rtype
    }
}

/// Compare `desired` against `provider` field by field
///
/// Data is compared in provider form, so an MX record with priority 10 and
/// value `mail.example.com` matches provider data `10 mail.example.com`.
pub fn match_record(desired: &DesiredRecord, provider: &ProviderRecord) -> MatchResult {
    MatchResult {
        name: desired.name.is_empty() || desired.name == provider.host,
        rtype: desired.rtype.is_empty() || desired.rtype.eq_ignore_ascii_case(&provider.rtype),
        data: desired.value.is_empty() || desired.provider_data() == provider.data,
        ttl: desired.ttl.is_zero() || desired.ttl == Duration::from_secs(u64::from(provider.ttl)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::RecordId;

    fn provider(host: &str, rtype: &str, data: &str, ttl: u32) -> ProviderRecord {
        ProviderRecord {
            id: RecordId(1),
            zone: "example.com".to_string(),
            host: host.to_string(),
            rtype: rtype.to_string(),
            data: data.to_string(),
            ttl,
        }
    }

    fn desired(name: &str, rtype: &str, value: &str, ttl: u64) -> DesiredRecord {
        DesiredRecord::new(name, rtype, value, Duration::from_secs(ttl))
    }

    #[test]
    fn full_match() {
        let m = match_record(
            &desired("test", "A", "1.1.1.1", 3600),
            &provider("test", "A", "1.1.1.1", 3600),
        );
        assert!(m.all());
    }

    #[test]
    fn unset_fields_are_wildcards() {
        let p = provider("test", "A", "1.1.1.1", 3600);

        assert!(match_record(&desired("", "A", "1.1.1.1", 0), &p).all());
        assert!(match_record(&desired("test", "", "1.1.1.1", 3600), &p).all());
        assert!(match_record(&DesiredRecord::default(), &p).all());
    }

    #[test]
    fn all_unset_matches_any_record() {
        let unset = DesiredRecord::default();
        for p in [
            provider("www", "A", "1.1.1.1", 3600),
            provider("@", "MX", "10 mail.example.com", 300),
            provider("_acme", "TXT", "token", 60),
        ] {
            assert_eq!(
                match_record(&unset, &p),
                MatchResult {
                    name: true,
                    rtype: true,
                    data: true,
                    ttl: true
                }
            );
        }
    }

    #[test]
    fn changing_one_field_flips_only_that_field() {
        let p = provider("test", "A", "1.1.1.1", 3600);
        let base = desired("test", "A", "1.1.1.1", 3600);

        let mut d = base.clone();
        d.name = "other".to_string();
        assert_eq!(
            match_record(&d, &p),
            MatchResult { name: false, rtype: true, data: true, ttl: true }
        );

        let mut d = base.clone();
        d.rtype = "CNAME".to_string();
        assert_eq!(
            match_record(&d, &p),
            MatchResult { name: true, rtype: false, data: true, ttl: true }
        );

        let mut d = base.clone();
        d.value = "2.2.2.2".to_string();
        assert_eq!(
            match_record(&d, &p),
            MatchResult { name: true, rtype: true, data: false, ttl: true }
        );

        let mut d = base;
        d.ttl = Duration::from_secs(60);
        assert_eq!(
            match_record(&d, &p),
            MatchResult { name: true, rtype: true, data: true, ttl: false }
        );
    }

    #[test]
    fn priority_is_compared_in_provider_form() {
        let p = provider("@", "MX", "10 mail.example.com", 3600);

        let d = desired("@", "MX", "mail.example.com", 3600).with_priority(10);
        assert!(match_record(&d, &p).all());

        let d = desired("@", "MX", "mail.example.com", 3600).with_priority(20);
        assert!(!match_record(&d, &p).data);
    }

    #[test]
    fn rrset_and_summaries() {
        let p = provider("www", "A", "1.1.1.1", 3600);
        let m = match_record(&desired("www", "A", "2.2.2.2", 60), &p);
        assert!(m.rrset());
        assert!(m.any());
        assert!(!m.all());

        let m = match_record(&desired("mail", "TXT", "x", 60), &p);
        assert!(m.none());
    }
}
