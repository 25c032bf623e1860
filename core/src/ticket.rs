//! Ticket number generation.

use rand::Rng;

const ALPHABET: &[u8] = b"ABCDEFGHIJKLMNOPQRSTUVWXYZ0123456789";
const SUFFIX_LEN: usize = 8;

/// Generate a ticket number: the configured prefix followed by 8 random
/// uppercase alphanumeric characters.
///
/// Collisions are treated as negligible but not impossible; the activity
/// tracker retries on a uniqueness violation from the store.
#[must_use]
pub fn generate_ticket_number(prefix: &str) -> String {
    let mut rng = rand::thread_rng();
    let mut out = String::with_capacity(prefix.len() + SUFFIX_LEN);
    out.push_str(prefix);
    for _ in 0..SUFFIX_LEN {
        let idx = rng.gen_range(0..ALPHABET.len());
        out.push(ALPHABET[idx] as char);
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn matches_configured_format() {
        let ticket = generate_ticket_number("TICKET-");
        assert!(ticket.starts_with("TICKET-"));
        let suffix = &ticket["TICKET-".len()..];
        assert_eq!(suffix.len(), 8);
        assert!(
            suffix
                .chars()
                .all(|c| c.is_ascii_uppercase() || c.is_ascii_digit())
        );
    }

    #[test]
    fn successive_tickets_differ() {
        // 36^8 values; two draws colliding would point at a broken RNG.
        let a = generate_ticket_number("T-");
        let b = generate_ticket_number("T-");
        assert_ne!(a, b);
    }
}
