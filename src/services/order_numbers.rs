use crate::entities::order::{self, Entity as OrderEntity};
use crate::errors::ServiceError;
use chrono::{Datelike, Utc};
use rand::Rng;
use sea_orm::{ColumnTrait, ConnectionTrait, EntityTrait, PaginatorTrait, QueryFilter};
use tracing::warn;

/// Code alphabet with visually ambiguous glyphs removed (no 0/O, no 1/I).
const CODE_ALPHABET: &[u8] = b"ABCDEFGHJKLMNPQRSTUVWXYZ23456789";
const CODE_LEN: usize = 6;
const MAX_ATTEMPTS: usize = 5;

/// Generates a human-readable order number: `<PREFIX>-<YEAR>-<CODE>`.
///
/// Each candidate is checked against existing orders; after five
/// collisions (effectively impossible at this alphabet size) the code
/// falls back to a timestamp-derived suffix. The unique index on
/// `orders.order_number` backs this check-then-act at the storage level.
pub async fn generate<C: ConnectionTrait>(
    db: &C,
    prefix: &str,
) -> Result<String, ServiceError> {
    let year = Utc::now().year();

    for attempt in 1..=MAX_ATTEMPTS {
        let candidate = format!("{}-{}-{}", prefix, year, random_code());
        let taken = OrderEntity::find()
            .filter(order::Column::OrderNumber.eq(&candidate))
            .count(db)
            .await?
            > 0;
        if !taken {
            return Ok(candidate);
        }
        warn!(attempt, candidate = %candidate, "order number collision, retrying");
    }

    // No format guarantee, but collision-safe in practice.
    let fallback = format!("{}-{}-T{:X}", prefix, year, Utc::now().timestamp_millis());
    warn!(fallback = %fallback, "falling back to timestamp-derived order number");
    Ok(fallback)
}

/// Six characters drawn uniformly from the restricted alphabet.
pub fn random_code() -> String {
    let mut rng = rand::thread_rng();
    (0..CODE_LEN)
        .map(|_| CODE_ALPHABET[rng.gen_range(0..CODE_ALPHABET.len())] as char)
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn code_has_expected_length_and_alphabet() {
        for _ in 0..500 {
            let code = random_code();
            assert_eq!(code.len(), CODE_LEN);
            for ch in code.chars() {
                assert!(
                    CODE_ALPHABET.contains(&(ch as u8)),
                    "unexpected character {ch}"
                );
                assert!(!"01OI".contains(ch), "ambiguous character {ch}");
            }
        }
    }

    #[test]
    fn codes_are_not_trivially_repeating() {
        let codes: std::collections::HashSet<String> =
            (0..200).map(|_| random_code()).collect();
        // Duplicates among 200 draws from a 32^6 space would indicate a
        // broken generator, not bad luck.
        assert_eq!(codes.len(), 200);
    }
}
