//! Arithmetic challenge gating the launcher's administrative actions.

use rand::Rng;
use serde::{Deserialize, Serialize};

const MIN_OPERAND: u8 = 1;
const MAX_OPERAND: u8 = 9;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
/// Single-digit addition problem shown before admin options unlock.
pub struct ParentalChallenge {
    /// Left operand.
    pub lhs: u8,
    /// Right operand.
    pub rhs: u8,
}

impl ParentalChallenge {
    /// Creates a challenge from explicit operands.
    pub const fn new(lhs: u8, rhs: u8) -> Self {
        Self { lhs, rhs }
    }

    /// Draws both operands uniformly from `1..=9`.
    pub fn generate<R: Rng + ?Sized>(rng: &mut R) -> Self {
        Self {
            lhs: rng.gen_range(MIN_OPERAND..=MAX_OPERAND),
            rhs: rng.gen_range(MIN_OPERAND..=MAX_OPERAND),
        }
    }

    /// Draws a challenge from the thread-local generator.
    pub fn random() -> Self {
        Self::generate(&mut rand::thread_rng())
    }

    /// Returns the correct answer.
    pub const fn expected_answer(self) -> u16 {
        self.lhs as u16 + self.rhs as u16
    }

    /// Returns whether `answer` (surrounding whitespace ignored) is the correct sum.
    pub fn accepts(self, answer: &str) -> bool {
        answer
            .trim()
            .parse::<u16>()
            .is_ok_and(|value| value == self.expected_answer())
    }

    /// Returns the question text, e.g. `"What is 3 + 4?"`.
    pub fn prompt(self) -> String {
        format!("What is {} + {}?", self.lhs, self.rhs)
    }
}

#[cfg(test)]
mod tests {
    use rand::{rngs::StdRng, SeedableRng};

    use super::*;

    #[test]
    fn generated_operands_stay_single_digit() {
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..500 {
            let challenge = ParentalChallenge::generate(&mut rng);
            assert!((1..=9).contains(&challenge.lhs));
            assert!((1..=9).contains(&challenge.rhs));
        }
    }

    #[test]
    fn answers_are_trimmed_and_parsed() {
        let challenge = ParentalChallenge::new(3, 4);

        assert!(challenge.accepts("7"));
        assert!(challenge.accepts(" 7\n"));
        assert!(!challenge.accepts("8"));
        assert!(!challenge.accepts("seven"));
        assert!(!challenge.accepts(""));
        assert!(!challenge.accepts("-7"));
        assert_eq!(challenge.prompt(), "What is 3 + 4?");
    }
}
