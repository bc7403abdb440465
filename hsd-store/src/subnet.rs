//! Subnet-family folding, §9 REDESIGN FLAGS: "replace the current
//! string-contains heuristic with CIDR prefix folding (/24 for v4, /54
//! for v6)". Used for I6's `active_hosts_in_subnet` tally — two hosts
//! whose folded prefixes match count as the same subnet family.

use std::net::IpAddr;

pub fn fingerprint(ip: IpAddr) -> String {
    match ip {
        IpAddr::V4(v4) => {
            let octets = v4.octets();
            format!("v4:{}.{}.{}.0/24", octets[0], octets[1], octets[2])
        }
        IpAddr::V6(v6) => {
            let segments = v6.segments();
            // /54 keeps the top 54 bits: 3 full 16-bit segments plus the
            // top 6 bits of the fourth.
            let masked_fourth = segments[3] & 0xFFC0;
            format!(
                "v6:{:x}:{:x}:{:x}:{:x}::/54",
                segments[0], segments[1], segments[2], masked_fourth
            )
        }
    }
}

pub fn parse_host_ip(net_address: &str) -> Option<IpAddr> {
    let host_part = net_address.rsplit_once(':').map(|(h, _)| h).unwrap_or(net_address);
    let trimmed = host_part.trim_start_matches('[').trim_end_matches(']');
    trimmed.parse().ok()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ipv4_slash_24_folds_last_octet() {
        let a = fingerprint("1.2.3.4".parse().unwrap());
        let b = fingerprint("1.2.3.200".parse().unwrap());
        assert_eq!(a, b);
        let c = fingerprint("1.2.4.4".parse().unwrap());
        assert_ne!(a, c);
    }

    #[test]
    fn parses_host_from_net_address() {
        assert_eq!(parse_host_ip("1.2.3.4:9982"), Some("1.2.3.4".parse().unwrap()));
        assert_eq!(parse_host_ip("[::1]:9982"), Some("::1".parse().unwrap()));
    }
}
