use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum_macros::Display;

pub const MANIFEST_FILE: &str = "manifest.json";
pub const MANIFEST_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize, Display)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum DistanceMetric {
    /// `1 - cos(a, b)`; 0 for identical directions.
    #[default]
    Cosine,
    Euclidean,
}

impl DistanceMetric {
    pub fn distance(&self, a: &[f32], b: &[f32]) -> f32 {
        match self {
            DistanceMetric::Cosine => {
                let (dot, norm_a, norm_b) = a.iter().zip(b).fold(
                    (0.0f32, 0.0f32, 0.0f32),
                    |(dot, na, nb), (x, y)| (dot + x * y, na + x * x, nb + y * y),
                );
                if norm_a == 0.0 || norm_b == 0.0 {
                    return 1.0;
                }
                (1.0 - dot / (norm_a.sqrt() * norm_b.sqrt())).max(0.0)
            }
            DistanceMetric::Euclidean => a
                .iter()
                .zip(b)
                .map(|(x, y)| (x - y) * (x - y))
                .sum::<f32>()
                .sqrt(),
        }
    }
}

/// The only file whose presence marks a collection as indexed. It names the
/// generation of data files that belong to the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexManifest {
    pub version: u32,
    pub model_id: String,
    pub dimension: usize,
    pub metric: DistanceMetric,
    pub vector_count: usize,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub generation: String,
    pub chunks_file: String,
    pub vectors_file: String,
    /// Hex SHA-256 of the chunks file
    pub chunks_sha256: String,
    /// Hex SHA-256 of the vectors file
    pub vectors_sha256: String,
}

pub(crate) fn chunks_file_name(generation: &str) -> String {
    format!("chunks-{generation}.json")
}

pub(crate) fn vectors_file_name(generation: &str) -> String {
    format!("vectors-{generation}.bin")
}

/// True for data files written by any generation.
pub(crate) fn is_data_file(name: &str) -> bool {
    (name.starts_with("chunks-") && name.ends_with(".json"))
        || (name.starts_with("vectors-") && name.ends_with(".bin"))
}

#[cfg(test)]
mod tests {
    use pretty_assertions::assert_eq;

    use super::*;

    #[test]
    fn test_cosine_identity_is_zero() {
        let fixture = [0.3, -1.2, 4.0];
        let actual = DistanceMetric::Cosine.distance(&fixture, &fixture);
        assert!(actual.abs() < 1e-6);
    }

    #[test]
    fn test_cosine_orthogonal_is_one() {
        let actual = DistanceMetric::Cosine.distance(&[1.0, 0.0], &[0.0, 2.0]);
        let expected = 1.0;
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_cosine_zero_vector() {
        let actual = DistanceMetric::Cosine.distance(&[0.0, 0.0], &[1.0, 0.0]);
        let expected = 1.0;
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_euclidean() {
        let actual = DistanceMetric::Euclidean.distance(&[0.0, 0.0], &[3.0, 4.0]);
        let expected = 5.0;
        assert_eq!(actual, expected);
    }

    #[test]
    fn test_data_file_names() {
        assert!(is_data_file(&chunks_file_name("abc")));
        assert!(is_data_file(&vectors_file_name("abc")));
        assert!(!is_data_file(MANIFEST_FILE));
        assert!(!is_data_file("manifest.json.tmp"));
    }
}
