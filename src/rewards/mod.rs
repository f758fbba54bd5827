//! Reward bookkeeping.
//!
//! Pure rules for earning and spending points. The atomic parts (claim
//! windows, balance checks) are re-applied inside the repository updates;
//! the functions here decide what to ask for and how to parse user input.

mod cooldown;
mod error;
mod session;

use rand::Rng;

pub use cooldown::{cooldown_remaining, window_start, ClaimKind};
pub use error::RewardError;
pub use session::AdSessionTracker;

/// Longest payout destination we store.
const MAX_DESTINATION_LEN: usize = 200;

/// Roll a lucky spin: uniform in `0..=max`.
pub fn roll_spin<R: Rng + ?Sized>(rng: &mut R, max: i64) -> i64 {
    if max <= 0 {
        0
    } else {
        rng.gen_range(0..=max)
    }
}

/// Check a withdrawal amount against the minimum and the known balance.
pub fn validate_withdraw(amount: i64, balance: i64, minimum: i64) -> Result<(), RewardError> {
    if amount <= 0 {
        return Err(RewardError::InvalidAmount);
    }
    if amount < minimum {
        return Err(RewardError::BelowMinimum { minimum });
    }
    if balance < amount {
        return Err(RewardError::InsufficientPoints {
            balance,
            requested: amount,
        });
    }
    Ok(())
}

/// Parse `"<amount> [destination]"`, e.g. `"1.500 DANA 0812345"`.
///
/// The amount may use one kind of thousands separator (`.`, `,` or `_`)
/// between 3-digit groups: `1.500`, `12,345,678`.
pub fn parse_withdraw_input(text: &str) -> Result<(i64, Option<String>), RewardError> {
    let text = text.trim();
    let (amount, rest) = match text.split_once(char::is_whitespace) {
        Some((amount, rest)) => (amount, rest.trim()),
        None => (text, ""),
    };

    let amount = parse_grouped_amount(amount)?;
    if amount <= 0 {
        return Err(RewardError::InvalidAmount);
    }

    let destination = (!rest.is_empty()).then(|| rest.chars().take(MAX_DESTINATION_LEN).collect());
    Ok((amount, destination))
}

fn parse_grouped_amount(amount: &str) -> Result<i64, RewardError> {
    let mut separators = amount.chars().filter(|c| matches!(c, '.' | ',' | '_'));
    let digits = match separators.next() {
        None => amount.to_string(),
        Some(sep) => {
            if separators.any(|c| c != sep) {
                return Err(RewardError::InvalidAmount);
            }
            let mut groups = amount.split(sep);
            let head = groups.next().unwrap_or_default();
            if head.is_empty() || head.len() > 3 {
                return Err(RewardError::InvalidAmount);
            }
            let mut digits = head.to_string();
            for group in groups {
                if group.len() != 3 {
                    return Err(RewardError::InvalidAmount);
                }
                digits.push_str(group);
            }
            digits
        }
    };

    if digits.is_empty() || !digits.chars().all(|c| c.is_ascii_digit()) {
        return Err(RewardError::InvalidAmount);
    }
    digits.parse::<i64>().map_err(|_| RewardError::InvalidAmount)
}

/// Extract the referrer from a `/start` payload (`"12345"` or `"ref_12345"`).
pub fn parse_referrer(payload: &str, self_id: i64) -> Option<i64> {
    let payload = payload.trim();
    let raw = payload
        .strip_prefix("ref_")
        .or_else(|| payload.strip_prefix("ref"))
        .unwrap_or(payload);

    raw.parse::<i64>()
        .ok()
        .filter(|id| *id > 0 && *id != self_id)
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    #[test]
    fn test_roll_spin_in_range() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let value = roll_spin(&mut rng, 100);
            assert!((0..=100).contains(&value));
        }
        assert_eq!(roll_spin(&mut rng, 0), 0);
        assert_eq!(roll_spin(&mut rng, -5), 0);
    }

    #[test]
    fn test_validate_withdraw() {
        assert!(validate_withdraw(100, 100, 100).is_ok());
        assert!(matches!(
            validate_withdraw(99, 500, 100),
            Err(RewardError::BelowMinimum { minimum: 100 })
        ));
        assert!(matches!(
            validate_withdraw(150, 120, 100),
            Err(RewardError::InsufficientPoints {
                balance: 120,
                requested: 150
            })
        ));
        assert!(matches!(
            validate_withdraw(0, 500, 100),
            Err(RewardError::InvalidAmount)
        ));
    }

    #[test]
    fn test_parse_withdraw_input() {
        let (amount, dest) = parse_withdraw_input("150").unwrap();
        assert_eq!(amount, 150);
        assert!(dest.is_none());

        let (amount, dest) = parse_withdraw_input("  1.500   DANA 0812345 ").unwrap();
        assert_eq!(amount, 1500);
        assert_eq!(dest.as_deref(), Some("DANA 0812345"));

        assert_eq!(parse_withdraw_input("12.345.678").unwrap().0, 12_345_678);
        assert_eq!(parse_withdraw_input("2,500").unwrap().0, 2500);
        assert_eq!(parse_withdraw_input("10_000 OVO 0812").unwrap().0, 10_000);

        for malformed in ["150.50", "1,5", "1.0.0", "1.500,000", "1500.", ".500", "1..500", "1234.567"] {
            assert!(
                matches!(parse_withdraw_input(malformed), Err(RewardError::InvalidAmount)),
                "{malformed} should be rejected"
            );
        }

        assert!(parse_withdraw_input("abc").is_err());
        assert!(parse_withdraw_input("-100").is_err());
        assert!(parse_withdraw_input("").is_err());
        assert!(parse_withdraw_input("0").is_err());
    }

    #[test]
    fn test_parse_referrer() {
        assert_eq!(parse_referrer("12345", 1), Some(12345));
        assert_eq!(parse_referrer("ref_12345", 1), Some(12345));
        assert_eq!(parse_referrer("12345", 12345), None);
        assert_eq!(parse_referrer("", 1), None);
        assert_eq!(parse_referrer("help", 1), None);
        assert_eq!(parse_referrer("-5", 1), None);
    }
}
