//! Small pure helpers used across the engine: public id generation and the rating swing calculation.
mod rating_policy;

use rand::{distributions::Alphanumeric, Rng};
pub use rating_policy::{settlement_swing, RatingSwing, BASE_WIN, MARGIN_BONUS_CAP, UPSET_BONUS, UPSET_THRESHOLD};

/// A random lowercase alphanumeric identifier, suitable for public match / challenge ids and invite tokens.
pub fn random_public_id(len: usize) -> String {
    rand::thread_rng().sample_iter(&Alphanumeric).take(len).map(char::from).collect::<String>().to_lowercase()
}

#[cfg(test)]
mod test {
    use super::random_public_id;

    #[test]
    fn public_ids_have_requested_length() {
        assert_eq!(random_public_id(16).len(), 16);
        assert_eq!(random_public_id(10).len(), 10);
    }

    #[test]
    fn public_ids_are_lowercase_alphanumeric() {
        let id = random_public_id(64);
        assert!(id.chars().all(|c| c.is_ascii_lowercase() || c.is_ascii_digit()));
    }
}
