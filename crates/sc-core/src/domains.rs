//! Domain list parsing
//!
//! Cosmetic rules carry a `,`-separated domain list before their marker and network
//! rules a `|`-separated one in `$domain=`. Both are parsed here into permitted and
//! restricted (`~`-prefixed) domains.
//!
//! ASCII domains are stored exactly as written. Exception matching later compares
//! domains by string equality, so nothing is lowercased or otherwise rewritten unless
//! the segment contains non-ASCII bytes, in which case it is converted to punycode.

use url::Host;

use crate::rule::RuleError;

const TILDE: u8 = b'~';
const SLASH: u8 = b'/';

/// Permitted and restricted domains of a rule, in encounter order.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DomainList {
    pub permitted: Vec<String>,
    pub restricted: Vec<String>,
}

impl DomainList {
    /// Parse a single domain list string.
    pub fn parse(domains: &str, separator: u8) -> Result<Self, RuleError> {
        let mut list = Self::default();
        list.add_domains(domains, separator)?;
        Ok(list)
    }

    /// Append the domains from `domains` to this list.
    ///
    /// Does not clear existing state, so several `$domain=` occurrences on one rule
    /// accumulate. A single trailing separator is accepted; any other empty segment is
    /// an error.
    pub fn add_domains(&mut self, domains: &str, separator: u8) -> Result<(), RuleError> {
        debug_assert!(separator.is_ascii());

        if domains.is_empty() {
            return Err(RuleError::InvalidDomain("empty domain list".to_string()));
        }

        let bytes = domains.as_bytes();
        let mut start = 0;
        let mut non_ascii = false;

        for (i, &b) in bytes.iter().enumerate() {
            if b == separator {
                self.push_segment(&domains[start..i], non_ascii)?;
                start = i + 1;
                non_ascii = false;
            } else if b >= 0x80 {
                non_ascii = true;
            }
        }

        self.push_segment(&domains[start..], non_ascii)
    }

    pub fn is_empty(&self) -> bool {
        self.permitted.is_empty() && self.restricted.is_empty()
    }

    fn push_segment(&mut self, segment: &str, non_ascii: bool) -> Result<(), RuleError> {
        let (restricted, domain) = match segment.as_bytes().first() {
            Some(&TILDE) => (true, &segment[1..]),
            _ => (false, segment),
        };

        let bytes = domain.as_bytes();
        if bytes.len() <= 2 {
            return Err(RuleError::InvalidDomain(format!(
                "empty or too short domain: '{segment}'"
            )));
        }

        if bytes[0] == TILDE {
            return Err(RuleError::InvalidDomain(format!("misplaced '~' in '{segment}'")));
        }

        if bytes[0] == SLASH && bytes[bytes.len() - 1] == SLASH {
            return Err(RuleError::InvalidDomain(format!(
                "regular expressions are not supported in domain modifiers: '{segment}'"
            )));
        }

        let domain = if non_ascii {
            match Host::parse(domain) {
                Ok(Host::Domain(ascii)) => ascii,
                Ok(host) => host.to_string(),
                Err(e) => {
                    return Err(RuleError::InvalidDomain(format!(
                        "cannot convert '{domain}' to punycode: {e}"
                    )));
                }
            }
        } else {
            domain.to_string()
        };

        if restricted {
            self.restricted.push(domain);
        } else {
            self.permitted.push(domain);
        }

        Ok(())
    }
}
