/// Consonants that get doubled with an `o` in between.
const CONSONANTS: &str = "BCDGFHJKLMNPQRSTVWXZbcdfghjklmnpqrstvwxz";

/// Rövarspråket: every consonant `c` becomes `c` + `o` + lowercase `c`.
///
/// Anything outside [`CONSONANTS`] (vowels, `y`, digits, punctuation, non-ASCII)
/// passes through unchanged.
pub fn encode(input: &str) -> String {
    let mut encoded = String::with_capacity(input.len() * 2);
    for letter in input.chars() {
        encoded.push(letter);
        if CONSONANTS.contains(letter) {
            encoded.push('o');
            encoded.push(letter.to_ascii_lowercase());
        }
    }
    encoded
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn encodes_uppercase_consonant() {
        assert_eq!(encode("Go"), "Gogo");
    }

    #[test]
    fn encodes_sentence() {
        assert_eq!(encode("Fix bug"), "Fofixox bobugog");
    }

    #[test]
    fn vowels_digits_and_punctuation_pass_through() {
        let input = "aeiou AEIOU 123 !?., yY";
        assert_eq!(encode(input), input);
    }

    #[test]
    fn non_ascii_passes_through() {
        assert_eq!(encode("åäö"), "åäö");
        assert_eq!(encode("ß"), "ß");
    }

    #[test]
    fn never_shrinks() {
        for input in ["", "x", "Rust", "Bolt CMS 4.0"] {
            assert!(encode(input).len() >= input.len());
        }
    }
}
