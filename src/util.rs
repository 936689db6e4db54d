use std::collections::hash_map::DefaultHasher;
use std::hash::{Hash, Hasher};

/// Canonical form used for every address identity check; Ethereum addresses
/// are checksummed through casing, so comparisons must ignore it.
pub fn canonical_address(address: &str) -> String {
    address.trim().to_ascii_lowercase()
}

pub fn short_address(address: &str) -> String {
    if address.len() <= 12 || !address.is_ascii() {
        return address.to_string();
    }
    format!("{}…{}", &address[..6], &address[address.len() - 4..])
}

pub fn format_ether(amount: f64) -> String {
    if amount >= 1000.0 {
        format!("{amount:.0} ETH")
    } else if amount >= 1.0 {
        format!("{amount:.2} ETH")
    } else if amount >= 0.001 {
        format!("{amount:.4} ETH")
    } else if amount > 0.0 {
        format!("{amount:.6} ETH")
    } else {
        "0 ETH".to_string()
    }
}

pub fn stable_pair(id: &str) -> (f32, f32) {
    let mut hasher = DefaultHasher::new();
    id.hash(&mut hasher);
    let hash = hasher.finish();

    let x = ((hash & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    let y = (((hash >> 32) & 0xffff_ffff) as f64 / u32::MAX as f64) as f32;
    ((x * 2.0) - 1.0, (y * 2.0) - 1.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn canonical_address_ignores_case_and_whitespace() {
        assert_eq!(
            canonical_address(" 0xAbCd00000000000000000000000000000000Ef12 "),
            "0xabcd00000000000000000000000000000000ef12"
        );
    }

    #[test]
    fn short_address_keeps_head_and_tail() {
        let short = short_address("0x1234567890abcdef1234567890abcdef12345678");
        assert_eq!(short, "0x1234…5678");
    }

    #[test]
    fn short_address_passes_short_inputs_through() {
        assert_eq!(short_address("0xabc"), "0xabc");
    }

    #[test]
    fn format_ether_picks_precision_by_magnitude() {
        assert_eq!(format_ether(1234.6), "1235 ETH");
        assert_eq!(format_ether(2.5), "2.50 ETH");
        assert_eq!(format_ether(0.0123), "0.0123 ETH");
        assert_eq!(format_ether(0.0), "0 ETH");
    }

    #[test]
    fn stable_pair_is_deterministic_and_bounded() {
        let (x1, y1) = stable_pair("0xdeadbeef");
        let (x2, y2) = stable_pair("0xdeadbeef");
        assert_eq!((x1, y1), (x2, y2));
        assert!((-1.0..=1.0).contains(&x1));
        assert!((-1.0..=1.0).contains(&y1));
    }
}
