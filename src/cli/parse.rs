use std::{fmt::Display, ops::RangeInclusive, str::FromStr};

use chrono_tz::Tz;

const SIZE_UNITS: [(&str, u32); 5] = [("k", 1), ("m", 2), ("g", 3), ("t", 4), ("b", 0)];

pub fn parse_range_inclusive<N: PartialOrd + FromStr + Display>(
    s: &str,
    range: RangeInclusive<N>,
) -> Result<N, String> {
    let value: N = s
        .trim()
        .parse()
        .map_err(|_| format!("`{s}` is not a valid number"))?;
    check_range(value, &range)
}

/// A byte count, either plain (`1073741824`) or with a binary unit suffix
/// (`512K`, `1G`, `2GiB`).
pub fn parse_size(s: &str, range: RangeInclusive<u64>) -> Result<u64, String> {
    let lower = s.trim().to_ascii_lowercase();
    let digits_end = lower
        .find(|c: char| !c.is_ascii_digit())
        .unwrap_or(lower.len());
    let (digits, unit) = lower.split_at(digits_end);

    let count: u64 = digits
        .parse()
        .map_err(|_| format!("`{s}` is not a valid size"))?;
    let unit = unit.trim();
    let unit = unit
        .strip_suffix("ib")
        .or_else(|| unit.strip_suffix('b').filter(|rest| !rest.is_empty()))
        .unwrap_or(unit);

    let exponent = if unit.is_empty() {
        0
    } else {
        SIZE_UNITS
            .iter()
            .find(|(name, _)| *name == unit)
            .map(|(_, exponent)| *exponent)
            .ok_or_else(|| format!("unknown size unit in `{s}`"))?
    };

    let value = 1024u64
        .checked_pow(exponent)
        .and_then(|multiplier| count.checked_mul(multiplier))
        .ok_or_else(|| format!("`{s}` is too large"))?;
    check_range(value, &range)
}

/// An IANA time zone name such as `Europe/Berlin`.
pub fn parse_timezone(s: &str) -> Result<Tz, String> {
    s.trim()
        .parse()
        .map_err(|err| format!("unknown time zone `{s}` ({err})"))
}

fn check_range<N: PartialOrd + Display>(value: N, range: &RangeInclusive<N>) -> Result<N, String> {
    if range.contains(&value) {
        Ok(value)
    } else {
        Err(format!(
            "{value} is not in range {}-{}",
            range.start(),
            range.end()
        ))
    }
}

#[cfg(test)]
mod tests {
    use super::{parse_range_inclusive, parse_size, parse_timezone};

    #[test]
    fn numbers_in_range() {
        assert_eq!(parse_range_inclusive("7", 1u8..=19), Ok(7));
        assert_eq!(parse_range_inclusive(" 19 ", 1u8..=19), Ok(19));
        assert!(parse_range_inclusive("0", 1u8..=19).is_err());
        assert!(parse_range_inclusive("three", 1u8..=19).is_err());
    }

    #[test]
    fn sizes_with_units() {
        let any = 0..=u64::MAX;
        assert_eq!(parse_size("1073741824", any.clone()), Ok(1 << 30));
        assert_eq!(parse_size("512K", any.clone()), Ok(512 * 1024));
        assert_eq!(parse_size("1G", any.clone()), Ok(1 << 30));
        assert_eq!(parse_size("2GiB", any.clone()), Ok(2 << 30));
        assert_eq!(parse_size("3mb", any.clone()), Ok(3 << 20));
        assert_eq!(parse_size("100b", any.clone()), Ok(100));
        assert!(parse_size("1X", any.clone()).is_err());
        assert!(parse_size("G", any.clone()).is_err());
        assert!(parse_size("99999999999T", any).is_err());
    }

    #[test]
    fn sizes_in_range() {
        assert!(parse_size("0", 1..=u64::MAX).is_err());
        assert_eq!(parse_size("1", 1..=u64::MAX), Ok(1));
    }

    #[test]
    fn time_zones_by_name() {
        assert_eq!(parse_timezone("Europe/Berlin"), Ok(chrono_tz::Europe::Berlin));
        assert_eq!(parse_timezone(" UTC "), Ok(chrono_tz::UTC));
        assert!(parse_timezone("Mars/Olympus_Mons").is_err());
    }
}
