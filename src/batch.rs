use pyo3::exceptions::PyKeyError;
use pyo3::prelude::*;

use crate::common::Record;
use crate::config::PreprocessConfig;
use crate::error::{PackError, Result};

/// The prompt and response columns of one `datasets` batch.
///
/// Cells are `None` where the dataset had a null value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RecordBatch {
    prompts: Vec<Option<String>>,
    responses: Vec<Option<String>>,
}

impl RecordBatch {
    pub fn from_columns(
        prompts: Vec<Option<String>>,
        responses: Vec<Option<String>>,
        config: &PreprocessConfig,
    ) -> Result<Self> {
        if prompts.len() != responses.len() {
            return Err(PackError::ColumnLengthMismatch {
                column: config.response_column.clone(),
                expected: prompts.len(),
                found: responses.len(),
            });
        }
        Ok(RecordBatch { prompts, responses })
    }

    /// Pull the configured columns out of a batch mapping (a `dict` or the
    /// `LazyBatch` handed to `Dataset.map`); other columns are ignored.
    pub fn from_py_mapping(examples: &Bound<'_, PyAny>, config: &PreprocessConfig) -> Result<Self> {
        let column = |name: &str| -> Result<Vec<Option<String>>> {
            let values = examples.get_item(name).map_err(|err| {
                if err.is_instance_of::<PyKeyError>(examples.py()) {
                    PackError::MissingColumn(name.to_string())
                } else {
                    PackError::from(err)
                }
            })?;
            Ok(values.extract()?)
        };
        let prompts = column(&config.prompt_column)?;
        let responses = column(&config.response_column)?;
        RecordBatch::from_columns(prompts, responses, config)
    }

    pub fn len(&self) -> usize {
        self.prompts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.prompts.is_empty()
    }

    /// Records with both fields non-empty, in their original order.
    pub fn retained(&self) -> Vec<Record> {
        let records: Vec<Record> = self
            .prompts
            .iter()
            .zip(self.responses.iter())
            .filter_map(|(prompt, response)| match (prompt, response) {
                (Some(prompt), Some(response)) if !prompt.is_empty() && !response.is_empty() => {
                    Some(Record {
                        prompt: prompt.clone(),
                        response: response.clone(),
                    })
                }
                _ => None,
            })
            .collect();
        if records.len() < self.len() {
            log::debug!(
                "dropped {} of {} records with an empty prompt or response",
                self.len() - records.len(),
                self.len()
            );
        }
        records
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> PreprocessConfig {
        PreprocessConfig::builder()
            .prompt_column("content")
            .response_column("summary")
            .max_source_length(8)
            .max_target_length(8)
            .build()
            .unwrap()
    }

    fn cell(s: &str) -> Option<String> {
        Some(s.to_string())
    }

    #[test]
    fn test_retained_keeps_order() {
        let batch = RecordBatch::from_columns(
            vec![cell("a"), cell("b"), None, cell("d"), cell("")],
            vec![cell("1"), cell(""), cell("3"), cell("4"), cell("5")],
            &config(),
        )
        .unwrap();
        let records = batch.retained();
        assert_eq!(records.len(), 2);
        assert_eq!(records[0].prompt, "a");
        assert_eq!(records[1].prompt, "d");
        assert_eq!(records[1].response, "4");
    }

    #[test]
    fn test_column_length_mismatch() {
        let err = RecordBatch::from_columns(vec![cell("a")], vec![], &config()).unwrap_err();
        assert!(matches!(
            err,
            PackError::ColumnLengthMismatch { expected: 1, found: 0, .. }
        ));
    }

    #[test]
    fn test_from_py_mapping() {
        pyo3::prepare_freethreaded_python();
        Python::with_gil(|py| {
            let examples = pyo3::types::PyDict::new(py);
            examples.set_item("content", vec![Some("a"), None, Some("c")]).unwrap();
            examples.set_item("summary", vec!["1", "2", ""]).unwrap();
            examples.set_item("id", vec![7, 8, 9]).unwrap();

            let batch = RecordBatch::from_py_mapping(&examples, &config()).unwrap();
            assert_eq!(batch.len(), 3);
            let records = batch.retained();
            assert_eq!(records.len(), 1);
            assert_eq!(records[0].prompt, "a");

            examples.del_item("summary").unwrap();
            let err = RecordBatch::from_py_mapping(&examples, &config()).unwrap_err();
            assert!(matches!(err, PackError::MissingColumn(column) if column == "summary"));
        });
    }
}
