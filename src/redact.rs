/// Secret redaction utilities for logging
///
/// Masks session identifiers, tokens and API keys so they never appear
/// in logs while still allowing two values to be told apart.

/// Redact a secret, keeping only the last 4 characters visible.
/// Example: "1uoyuc45nc2ljibx5plcoxav" -> "********************oxav"
pub fn secret(value: &str) -> String {
    let count = value.chars().count();

    if count <= 4 {
        // Too short to meaningfully redact
        return "*".repeat(count);
    }

    let visible: String = value.chars().skip(count - 4).collect();
    format!("{}{}", "*".repeat(count - 4), visible)
}


#[cfg(test)]
mod proptests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        /// Redaction keeps the character count
        #[test]
        fn secret_preserves_length(value in ".{0,64}") {
            prop_assert_eq!(secret(&value).chars().count(), value.chars().count());
        }

        /// Redaction never reveals more than 4 characters
        #[test]
        fn secret_reveals_at_most_four(value in "[a-z0-9]{5,64}") {
            let redacted = secret(&value);
            let visible = redacted.chars().filter(|c| *c != '*').count();
            prop_assert_eq!(visible, 4);
        }
    }
}
