//! MSISDN normalization and lookup-key expansion
//!
//! Subscriber numbers arrive in every format humans can produce: spaced,
//! dashed, `+`-prefixed, country-code-prefixed, trunk-`0`-prefixed. The
//! reference tables are no better. Normalization canonicalizes a raw string
//! into one comparable key; expansion generates the alternate textual forms
//! a table might hold the same subscriber under, for querying only.

/// Canonicalizes raw MSISDN strings into comparable keys.
///
/// Normalization never validates and never errors: malformed input comes
/// out canonicalized but otherwise untouched, and an empty input yields an
/// empty string (which must never match any reference set).
#[derive(Debug, Clone)]
pub struct Normalizer {
    country_code: String,
    national_number_length: usize,
    trunk_strip_min_length: usize,
}

impl Default for Normalizer {
    fn default() -> Self {
        Self::new("234", 10)
    }
}

impl Normalizer {
    pub fn new<S: Into<String>>(country_code: S, national_number_length: usize) -> Self {
        Self {
            country_code: country_code.into(),
            national_number_length,
            // A trunk-prefixed national number is nsn_len + 1 digits; only
            // strip the 0 while the string is still longer than nsn_len - 1.
            trunk_strip_min_length: national_number_length.saturating_sub(1),
        }
    }

    /// Canonicalize a raw MSISDN into a normalized key.
    ///
    /// Rules, in order: drop whitespace, dashes and `+`; strip the leading
    /// country code while the result is longer than the national number
    /// length; strip the leading trunk `0` while the remainder is still
    /// longer than the trunk threshold. Idempotent.
    pub fn normalize(&self, raw: &str) -> String {
        let mut key: String = raw
            .trim()
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-' && *c != '+')
            .collect();

        // Strip to a fixpoint: removing one prefix can expose another, and
        // a normalized key must re-normalize to itself.
        loop {
            let len_before = key.len();

            while key.len() > self.national_number_length && key.starts_with(&self.country_code) {
                key.replace_range(..self.country_code.len(), "");
            }

            while key.len() > self.trunk_strip_min_length && key.starts_with('0') {
                key.remove(0);
            }

            if key.len() == len_before {
                break;
            }
        }

        key
    }

    /// Strip country-code and trunk prefixes unconditionally.
    ///
    /// Operator series prefixes are published trunk-prefixed (`0803`) and
    /// too short for the length guards in [`normalize`](Self::normalize);
    /// this keeps the prefix path aligned with the key path.
    pub fn normalize_prefix(&self, prefix: &str) -> String {
        let cleaned: String = prefix
            .trim()
            .chars()
            .filter(|c| !c.is_whitespace() && *c != '-' && *c != '+')
            .collect();

        let stripped = cleaned
            .strip_prefix(&self.country_code)
            .unwrap_or(&cleaned);
        let stripped = stripped.strip_prefix('0').unwrap_or(stripped);
        stripped.to_string()
    }

    /// Expand a raw or normalized MSISDN into the alternate textual forms
    /// an authoritative table might store the same subscriber under.
    ///
    /// Returned forms are deduplicated and used only for querying; stored
    /// numbers are never rewritten. Empty input expands to nothing.
    pub fn expand(&self, raw: &str) -> Vec<String> {
        let key = self.normalize(raw);
        if key.is_empty() {
            return Vec::new();
        }

        let mut forms = vec![
            key.clone(),
            format!("0{key}"),
            format!("{}{key}", self.country_code),
            format!("+{}{key}", self.country_code),
        ];

        // Trailing suffixes for partially recorded numbers
        for suffix_len in [9, 8] {
            if key.len() > suffix_len {
                forms.push(key[key.len() - suffix_len..].to_string());
            }
        }

        let mut seen = std::collections::HashSet::new();
        forms.retain(|f| seen.insert(f.clone()));
        forms
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn normalizer() -> Normalizer {
        Normalizer::default()
    }

    #[test]
    fn strips_formatting_characters() {
        let n = normalizer();
        assert_eq!(n.normalize(" 0803 123-4567 "), "8031234567");
        assert_eq!(n.normalize("+234-803-123-4567"), "8031234567");
    }

    #[test]
    fn strips_country_code_only_when_long_enough() {
        let n = normalizer();
        assert_eq!(n.normalize("2348031234567"), "8031234567");
        // Exactly the national length: "234..." is a valid subscriber prefix
        assert_eq!(n.normalize("2341234567"), "2341234567");
    }

    #[test]
    fn strips_trunk_zero_only_when_long_enough() {
        let n = normalizer();
        assert_eq!(n.normalize("08031234567"), "8031234567");
        // Nine digits or fewer keeps its leading zero
        assert_eq!(n.normalize("080312345"), "080312345");
    }

    #[test]
    fn normalization_is_idempotent() {
        let n = normalizer();
        for raw in [
            "08031234567",
            "+2348031234567",
            "2348031234567",
            "0803 123 4567",
            "8031234567",
            "00803123456",
            "234234123456789",
            "02348031234567",
            "garbage-in",
            "",
        ] {
            let once = n.normalize(raw);
            assert_eq!(n.normalize(&once), once, "not idempotent for {raw:?}");
        }
    }

    #[test]
    fn repeated_prefixes_strip_to_a_fixpoint() {
        let n = normalizer();
        // Doubled trunk zero
        assert_eq!(n.normalize("00803123456"), "803123456");
        // Repeated country code
        assert_eq!(n.normalize("234234123456789"), "123456789");
        // Trunk zero hiding a country code
        assert_eq!(n.normalize("02348031234567"), "8031234567");
    }

    #[test]
    fn empty_and_blank_input_normalize_to_empty() {
        let n = normalizer();
        assert_eq!(n.normalize(""), "");
        assert_eq!(n.normalize("   "), "");
        assert!(n.expand("").is_empty());
        assert!(n.expand(" - ").is_empty());
    }

    #[test]
    fn malformed_input_is_canonicalized_not_rejected() {
        let n = normalizer();
        assert_eq!(n.normalize("0803x123456"), "803x123456");
    }

    #[test]
    fn expansion_contains_all_storage_forms() {
        let n = normalizer();
        let forms = n.expand("8031234567");
        for expected in [
            "8031234567",
            "08031234567",
            "2348031234567",
            "+2348031234567",
        ] {
            assert!(forms.contains(&expected.to_string()), "missing {expected}");
        }
        // Trailing suffixes for partial records
        assert!(forms.contains(&"031234567".to_string()));
        assert!(forms.contains(&"31234567".to_string()));
    }

    #[test]
    fn expansion_normalizes_first() {
        let n = normalizer();
        assert_eq!(n.expand("+234 803 123 4567"), n.expand("08031234567"));
    }

    #[test]
    fn prefix_normalization_aligns_with_key_normalization() {
        let n = normalizer();
        assert_eq!(n.normalize_prefix("0803"), "803");
        assert_eq!(n.normalize_prefix("234803"), "803");
        assert_eq!(n.normalize_prefix("705"), "705");

        let key = n.normalize("08031234567");
        assert!(key.starts_with(&n.normalize_prefix("0803")));
    }
}
