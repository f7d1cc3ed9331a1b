use rand::Rng;

pub const DEFAULT_SCRAMBLE_LENGTH: usize = 20;

const FACES: [char; 6] = ['U', 'D', 'L', 'R', 'F', 'B'];
const MODIFIERS: [&str; 3] = ["", "'", "2"];

fn opposite(face: char) -> char {
    match face {
        'U' => 'D',
        'D' => 'U',
        'L' => 'R',
        'R' => 'L',
        'F' => 'B',
        'B' => 'F',
        _ => face,
    }
}

/// Handles scramble sequence generation for the 3x3 event.
pub struct ScrambleGenerator {
    length: usize,
}

impl ScrambleGenerator {
    pub fn new(length: usize) -> Self {
        Self { length }
    }

    /// Generate a space-joined scramble using the thread rng.
    pub fn generate(&self) -> String {
        self.generate_with_rng(&mut rand::thread_rng())
    }

    /// Generate with a caller-supplied rng (deterministic in tests).
    ///
    /// Legality constraints: no two consecutive tokens share a face, and a
    /// face may not follow its opposite when that opposite was itself
    /// preceded by the current face (rejects same-axis runs like `R L R`).
    pub fn generate_with_rng<R: Rng>(&self, rng: &mut R) -> String {
        let mut tokens: Vec<String> = Vec::with_capacity(self.length);
        let mut prev: Option<char> = None;
        let mut prev_prev: Option<char> = None;

        while tokens.len() < self.length {
            let face = FACES[rng.gen_range(0..FACES.len())];

            if prev == Some(face) {
                continue;
            }
            if prev == Some(opposite(face)) && prev_prev == Some(face) {
                continue;
            }

            let modifier = MODIFIERS[rng.gen_range(0..MODIFIERS.len())];
            tokens.push(format!("{}{}", face, modifier));

            prev_prev = prev;
            prev = Some(face);
        }

        tokens.join(" ")
    }
}

impl Default for ScrambleGenerator {
    fn default() -> Self {
        Self::new(DEFAULT_SCRAMBLE_LENGTH)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::rngs::StdRng;
    use rand::SeedableRng;

    fn faces_of(scramble: &str) -> Vec<char> {
        scramble
            .split_whitespace()
            .map(|t| t.chars().next().unwrap())
            .collect()
    }

    #[test]
    fn default_length_is_twenty_tokens() {
        let scramble = ScrambleGenerator::default().generate();
        assert_eq!(scramble.split_whitespace().count(), 20);
    }

    #[test]
    fn tokens_are_legal_moves() {
        let scramble = ScrambleGenerator::default().generate();
        for token in scramble.split_whitespace() {
            let mut chars = token.chars();
            let face = chars.next().unwrap();
            assert!(FACES.contains(&face), "unexpected face in {}", token);
            let suffix: String = chars.collect();
            assert!(
                suffix.is_empty() || suffix == "'" || suffix == "2",
                "unexpected modifier in {}",
                token
            );
        }
    }

    #[test]
    fn no_adjacent_tokens_share_a_face() {
        let gen = ScrambleGenerator::default();
        let mut rng = StdRng::seed_from_u64(7);
        for _ in 0..10_000 {
            let faces = faces_of(&gen.generate_with_rng(&mut rng));
            for pair in faces.windows(2) {
                assert_ne!(pair[0], pair[1], "adjacent faces repeat");
            }
        }
    }

    #[test]
    fn no_same_axis_triples() {
        let gen = ScrambleGenerator::default();
        let mut rng = StdRng::seed_from_u64(42);
        for _ in 0..10_000 {
            let faces = faces_of(&gen.generate_with_rng(&mut rng));
            for w in faces.windows(3) {
                let sandwich = w[0] == w[2] && w[1] == opposite(w[2]);
                assert!(!sandwich, "same-axis triple {:?}", w);
            }
        }
    }

    #[test]
    fn custom_length_respected() {
        let scramble = ScrambleGenerator::new(5).generate();
        assert_eq!(scramble.split_whitespace().count(), 5);
    }
}
