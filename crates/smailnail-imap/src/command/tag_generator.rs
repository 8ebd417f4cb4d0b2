//! Command tag generator.

use std::cell::Cell;

/// Generates sequential command tags (`A0000`, `A0001`, ...).
///
/// The counter wraps instead of failing; a session never has more than
/// one command in flight, so reuse after 2^32 commands is harmless.
#[derive(Debug, Clone)]
pub struct TagGenerator {
    counter: Cell<u32>,
    prefix: char,
}

impl TagGenerator {
    /// Creates a new tag generator with the given prefix.
    #[must_use]
    pub const fn new(prefix: char) -> Self {
        Self {
            counter: Cell::new(0),
            prefix,
        }
    }

    /// Generates the next tag.
    #[must_use]
    pub fn next(&self) -> String {
        let n = self.counter.get();
        self.counter.set(n.wrapping_add(1));
        format!("{}{:04}", self.prefix, n)
    }
}

impl Default for TagGenerator {
    fn default() -> Self {
        Self::new('A')
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn sequential_tags() {
        let generator = TagGenerator::default();
        assert_eq!(generator.next(), "A0000");
        assert_eq!(generator.next(), "A0001");
    }

    #[test]
    fn custom_prefix_and_padding() {
        let generator = TagGenerator::new('S');
        for _ in 0..100 {
            let _ = generator.next();
        }
        assert_eq!(generator.next(), "S0100");
    }

    #[test]
    fn wraps_without_panicking() {
        let generator = TagGenerator::default();
        generator.counter.set(u32::MAX);
        assert_eq!(generator.next(), format!("A{}", u32::MAX));
        assert_eq!(generator.next(), "A0000");
    }
}
