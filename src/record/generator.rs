//! Random record generation
//!
//! Produces valid records for demos, benchmarks and tests.

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};

use super::{Record, RecordValidator, NATIONAL_ID_LEN};

/// First key handed out by a fresh generator
pub const DEFAULT_FIRST_KEY: u32 = 100_000_001;

const MAX_ATTEMPTS_PER_RECORD: usize = 8;

const NAMES: &[&str] = &[
    "Alice Moreau", "Bruno Keller", "Clara Jensen", "Daniel Ortiz", "Elena Novak",
    "Felix Brandt", "Grace Okafor", "Hugo Lindqvist", "Irene Castillo", "Jonas Weber",
    "Karin Holm", "Luca Bianchi", "Maya Fischer", "Nikolai Petrov", "Olivia Dunn",
    "Pavel Horak", "Quinn Gallagher", "Rosa Martins", "Samuel Adeyemi", "Tara Lindgren",
];

const PROGRAMS: &[&str] = &[
    "Computer Science", "Software Engineering", "Information Systems",
    "Civil Engineering", "Business Administration", "Law", "Medicine",
    "Psychology", "Economics", "Architecture",
];

const GUARDIANS_A: &[&str] = &[
    "Marie Moreau", "Helga Keller", "Ingrid Jensen", "Lucia Ortiz", "Vera Novak",
    "Ute Brandt", "Ngozi Okafor", "Astrid Lindqvist", "Carmen Castillo", "Heike Weber",
];

const GUARDIANS_B: &[&str] = &[
    "Pierre Moreau", "Klaus Keller", "Erik Jensen", "Mateo Ortiz", "Jan Novak",
    "Dieter Brandt", "Emeka Okafor", "Lars Lindqvist", "Diego Castillo", "Stefan Weber",
];

/// Seeded generator of valid records with sequential keys
pub struct RecordGenerator {
    rng: StdRng,
    next_key: u32,
}

impl RecordGenerator {
    /// Deterministic generator for reproducible files
    pub fn seeded(seed: u64) -> Self {
        Self {
            rng: StdRng::seed_from_u64(seed),
            next_key: DEFAULT_FIRST_KEY,
        }
    }

    /// Generator seeded from the operating system
    pub fn from_entropy() -> Self {
        Self {
            rng: StdRng::from_entropy(),
            next_key: DEFAULT_FIRST_KEY,
        }
    }

    /// Start handing out keys at `key`
    pub fn starting_at(mut self, key: u32) -> Self {
        self.next_key = key;
        self
    }

    /// Generate `count` records, each normalized and validated by `validator`
    pub fn generate(&mut self, count: usize, validator: &dyn RecordValidator) -> Vec<Record> {
        let mut records = Vec::with_capacity(count);
        let mut attempts = 0usize;

        while records.len() < count {
            attempts += 1;
            if attempts > count.saturating_mul(MAX_ATTEMPTS_PER_RECORD) {
                tracing::warn!(
                    "Validator rejected too many generated records; returning {} of {}",
                    records.len(),
                    count
                );
                break;
            }

            let mut record = self.next_record();
            validator.truncate_to_limits(&mut record);

            match validator.validate(&record) {
                Ok(()) => records.push(record),
                Err(e) => tracing::warn!("Discarding generated record {}: {}", record.key, e),
            }
        }

        records
    }

    fn next_record(&mut self) -> Record {
        let key = self.next_key;
        self.next_key = self.next_key.wrapping_add(1);

        let national_id: String = (0..NATIONAL_ID_LEN)
            .map(|_| char::from(b'0' + self.rng.gen_range(0..10u8)))
            .collect();

        // Scores land in [5.00, 10.00] at two-decimal precision
        let hundredths: u32 = self.rng.gen_range(500..=1000);

        Record {
            key,
            name: self.pick(NAMES),
            national_id,
            program: self.pick(PROGRAMS),
            guardian_a: self.pick(GUARDIANS_A),
            guardian_b: self.pick(GUARDIANS_B),
            enrollment_year: self.rng.gen_range(2015..=2024),
            score: f64::from(hundredths) / 100.0,
        }
    }

    fn pick(&mut self, pool: &[&str]) -> String {
        pool[self.rng.gen_range(0..pool.len())].to_string()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::record::FieldValidator;

    #[test]
    fn test_generates_requested_count_with_sequential_keys() {
        let validator = FieldValidator::new();
        let records = RecordGenerator::seeded(7).generate(25, &validator);

        assert_eq!(records.len(), 25);
        for (i, record) in records.iter().enumerate() {
            assert_eq!(record.key, DEFAULT_FIRST_KEY + i as u32);
            assert!(validator.validate(record).is_ok());
        }
    }

    #[test]
    fn test_same_seed_same_records() {
        let validator = FieldValidator::new();
        let a = RecordGenerator::seeded(42).generate(10, &validator);
        let b = RecordGenerator::seeded(42).generate(10, &validator);
        assert_eq!(a, b);
    }

    #[test]
    fn test_starting_at_offsets_keys() {
        let validator = FieldValidator::new();
        let records = RecordGenerator::seeded(1).starting_at(500).generate(3, &validator);
        let keys: Vec<u32> = records.iter().map(|r| r.key).collect();
        assert_eq!(keys, vec![500, 501, 502]);
    }
}
