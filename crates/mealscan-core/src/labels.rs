//! Label vocabulary mapping output-tensor indices to class names.

use std::io::{BufRead, BufReader};
use std::path::Path;

use tracing::{info, warn};

/// Number of placeholder labels synthesized when neither a label file nor the
/// model's output length is available.
const FALLBACK_CLASS_COUNT: usize = 100;

/// Ordered class names, index-aligned with the model's output tensor.
/// Immutable after load.
#[derive(Debug, Clone)]
pub struct LabelVocabulary {
    names: Vec<String>,
    synthesized: bool,
}

impl LabelVocabulary {
    /// Load the label file colocated with the model artifact.
    ///
    /// One label per line, whitespace trimmed, blank lines skipped, file
    /// order preserved as class-index order. A missing or unreadable file is
    /// a degraded mode, not a failure: placeholder names are synthesized so
    /// classification can still return structured output.
    pub fn load(model_path: &Path, labels_filename: &str, output_len: Option<usize>) -> Self {
        let labels_path = model_path
            .parent()
            .unwrap_or_else(|| Path::new("."))
            .join(labels_filename);

        match std::fs::File::open(&labels_path) {
            Ok(file) => {
                let names: Vec<String> = BufReader::new(file)
                    .lines()
                    .map_while(|line| line.ok())
                    .map(|line| line.trim().to_string())
                    .filter(|line| !line.is_empty())
                    .collect();
                if names.is_empty() {
                    warn!(
                        "Label file {:?} contains no labels, synthesizing placeholders",
                        labels_path
                    );
                    Self::synthesized(output_len.unwrap_or(FALLBACK_CLASS_COUNT))
                } else {
                    info!("Loaded {} labels from {:?}", names.len(), labels_path);
                    Self {
                        names,
                        synthesized: false,
                    }
                }
            }
            Err(e) => {
                warn!(
                    "Label file {:?} unavailable ({}), synthesizing placeholders",
                    labels_path, e
                );
                Self::synthesized(output_len.unwrap_or(FALLBACK_CLASS_COUNT))
            }
        }
    }

    /// Build a vocabulary of `class_<index>` placeholder names.
    pub fn synthesized(count: usize) -> Self {
        Self {
            names: (0..count).map(|i| format!("class_{i}")).collect(),
            synthesized: true,
        }
    }

    /// Build from explicit names. Used by tests and the CLI.
    pub fn from_names(names: Vec<String>) -> Self {
        Self {
            names,
            synthesized: false,
        }
    }

    /// Class name at `index`, or a `class_<index>` placeholder when the model
    /// output reaches past the vocabulary. Guards against label-file/model
    /// mismatch without failing the request.
    pub fn name_for(&self, index: usize) -> String {
        self.names
            .get(index)
            .cloned()
            .unwrap_or_else(|| format!("class_{index}"))
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    /// True when the vocabulary was synthesized rather than read from disk.
    pub fn is_synthesized(&self) -> bool {
        self.synthesized
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn test_load_trims_and_skips_blanks() {
        let dir = tempfile::tempdir().unwrap();
        let model_path = dir.path().join("food.onnx");
        let mut file = std::fs::File::create(dir.path().join("labels_final.txt")).unwrap();
        writeln!(file, "  apple  ").unwrap();
        writeln!(file).unwrap();
        writeln!(file, "bread").unwrap();
        writeln!(file, "   ").unwrap();
        writeln!(file, "candy").unwrap();
        drop(file);

        let vocab = LabelVocabulary::load(&model_path, "labels_final.txt", Some(3));
        assert_eq!(vocab.len(), 3);
        assert_eq!(vocab.name_for(0), "apple");
        assert_eq!(vocab.name_for(1), "bread");
        assert_eq!(vocab.name_for(2), "candy");
        assert!(!vocab.is_synthesized());
    }

    #[test]
    fn test_missing_file_synthesizes_from_output_len() {
        let dir = tempfile::tempdir().unwrap();
        let model_path = dir.path().join("food.onnx");

        let vocab = LabelVocabulary::load(&model_path, "labels_final.txt", Some(7));
        assert_eq!(vocab.len(), 7);
        assert!(vocab.is_synthesized());
        assert_eq!(vocab.name_for(0), "class_0");
        assert_eq!(vocab.name_for(6), "class_6");
    }

    #[test]
    fn test_missing_file_without_output_len_defaults_to_100() {
        let dir = tempfile::tempdir().unwrap();
        let model_path = dir.path().join("food.onnx");

        let vocab = LabelVocabulary::load(&model_path, "labels_final.txt", None);
        assert_eq!(vocab.len(), 100);
        assert!(vocab.is_synthesized());
    }

    #[test]
    fn test_out_of_range_index_falls_back() {
        let vocab = LabelVocabulary::from_names(vec!["apple".to_string()]);
        assert_eq!(vocab.name_for(0), "apple");
        assert_eq!(vocab.name_for(5), "class_5");
    }

    #[test]
    fn test_empty_file_synthesizes() {
        let dir = tempfile::tempdir().unwrap();
        let model_path = dir.path().join("food.onnx");
        std::fs::write(dir.path().join("labels_final.txt"), "\n\n  \n").unwrap();

        let vocab = LabelVocabulary::load(&model_path, "labels_final.txt", Some(4));
        assert_eq!(vocab.len(), 4);
        assert!(vocab.is_synthesized());
    }
}
