//! Domain blocklist, §3: a host is blocked iff its hostname-part is
//! suffix-matched by any blocklist entry, or its bare IP literally
//! matches an entry.

use parking_lot::RwLock;
use std::collections::HashSet;

#[derive(Default)]
pub struct Blocklist {
    entries: RwLock<HashSet<String>>,
}

impl Blocklist {
    pub fn new(entries: impl IntoIterator<Item = String>) -> Self {
        Self {
            entries: RwLock::new(entries.into_iter().collect()),
        }
    }

    pub fn replace(&self, entries: impl IntoIterator<Item = String>) {
        *self.entries.write() = entries.into_iter().collect();
    }

    pub fn is_blocked(&self, net_address: &str) -> bool {
        let host_part = net_address.rsplit_once(':').map(|(h, _)| h).unwrap_or(net_address);
        let host_part = host_part.trim_start_matches('[').trim_end_matches(']');
        let entries = self.entries.read();
        entries.iter().any(|entry| host_part == entry || host_part.ends_with(&format!(".{entry}")))
    }

    pub fn len(&self) -> usize {
        self.entries.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn suffix_matches_subdomain() {
        let list = Blocklist::new(["evil.example".to_string()]);
        assert!(list.is_blocked("host.evil.example:9982"));
        assert!(list.is_blocked("evil.example:9982"));
        assert!(!list.is_blocked("notevil.example:9982"));
    }

    #[test]
    fn bare_ip_literal_match() {
        let list = Blocklist::new(["1.2.3.4".to_string()]);
        assert!(list.is_blocked("1.2.3.4:9982"));
        assert!(!list.is_blocked("1.2.3.5:9982"));
    }
}
