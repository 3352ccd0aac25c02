use pyo3::{prelude::*, types::PyDict};
use std::collections::HashMap;

pub mod batch;
pub mod common;
pub mod config;
pub mod encoder;
pub mod error;
pub mod inspect;
pub mod packer;
use batch::RecordBatch;
use common::{LabelSequence, PackedTable, Sequence, INPUT_IDS_KEY, LABELS_KEY};
use config::PreprocessConfig;
use encoder::python::PyTokenizer;
use error::{PackingOverflowError, PreprocessError};
use packer::{EvalPacker, TrainPacker};

#[derive(IntoPyObject)]
pub enum Column {
    Tokens(Vec<Sequence>),
    // Labels are signed because of the loss-ignore sentinel
    Labels(Vec<LabelSequence>),
}

impl From<PackedTable> for HashMap<String, Column> {
    fn from(table: PackedTable) -> Self {
        let mut result = HashMap::new();
        result.insert(INPUT_IDS_KEY.to_string(), Column::Tokens(table.input_ids));
        result.insert(LABELS_KEY.to_string(), Column::Labels(table.labels));
        result
    }
}

/// Turns (prompt, response) batches into `input_ids`/`labels` columns for
/// supervised fine-tuning. Meant to be passed to `Dataset.map(batched=True)`.
#[pyclass]
pub struct Preprocessor {
    config: PreprocessConfig,
    tokenizer: Py<PyAny>,
}

#[pymethods]
impl Preprocessor {
    #[new]
    #[pyo3(signature = (tokenizer, prompt_column, response_column, max_source_length, max_target_length, ignore_pad_token_for_loss=true, **kwargs))]
    fn new(
        tokenizer: Py<PyAny>,
        prompt_column: String,
        response_column: String,
        max_source_length: usize,
        max_target_length: usize,
        ignore_pad_token_for_loss: bool,
        kwargs: Option<&Bound<'_, PyDict>>,
    ) -> PyResult<Self> {
        let config = PreprocessConfig::builder()
            .prompt_column(prompt_column)
            .response_column(response_column)
            .max_source_length(max_source_length)
            .max_target_length(max_target_length)
            .ignore_pad_token_for_loss(ignore_pad_token_for_loss)
            .from_py_dict(kwargs)?
            .build()?;
        Ok(Preprocessor { config, tokenizer })
    }

    /// Build from an arguments object carrying `prompt_column`,
    /// `response_column`, `max_source_length`, `max_target_length` and
    /// optionally `ignore_pad_token_for_loss`.
    #[staticmethod]
    fn from_data_args(data_args: &Bound<'_, PyAny>, tokenizer: Py<PyAny>) -> PyResult<Self> {
        let config = PreprocessConfig::builder()
            .from_py_object(data_args)?
            .build()?;
        Ok(Preprocessor { config, tokenizer })
    }

    /// Fixed-length rows: `prompt ++ response ++ [eos]`, right-padded to
    /// `max_source_length + max_target_length`.
    fn preprocess_function_train(
        &self,
        py: Python<'_>,
        examples: &Bound<'_, PyAny>,
    ) -> PyResult<HashMap<String, Column>> {
        let batch = RecordBatch::from_py_mapping(examples, &self.config)?;
        let tokenizer = PyTokenizer::new(self.tokenizer.bind(py).clone());
        let table = TrainPacker::new(&self.config).process(&batch, &tokenizer)?;
        Ok(table.into())
    }

    /// Batch-padded prompts (left-truncated) and targets for generation-style eval.
    fn preprocess_function_eval(
        &self,
        py: Python<'_>,
        examples: &Bound<'_, PyAny>,
    ) -> PyResult<HashMap<String, Column>> {
        let batch = RecordBatch::from_py_mapping(examples, &self.config)?;
        let tokenizer = PyTokenizer::new(self.tokenizer.bind(py).clone());
        let table = EvalPacker::new(&self.config).process(&batch, &tokenizer)?;
        Ok(table.into())
    }

    #[getter]
    fn max_seq_length(&self) -> usize {
        self.config.max_seq_length()
    }

    fn __repr__(&self) -> String {
        format!(
            "Preprocessor(prompt_column={:?}, response_column={:?}, max_source_length={}, max_target_length={}, ignore_pad_token_for_loss={})",
            self.config.prompt_column,
            self.config.response_column,
            self.config.max_source_length,
            self.config.max_target_length,
            if self.config.ignore_pad_token_for_loss { "True" } else { "False" },
        )
    }
}

/// Log and return a readable dump of one preprocessed row.
#[pyfunction]
fn format_dataset_example(
    example: &Bound<'_, PyAny>,
    tokenizer: &Bound<'_, PyAny>,
) -> PyResult<String> {
    let input_ids: Sequence = example.get_item(INPUT_IDS_KEY)?.extract()?;
    let labels: LabelSequence = example.get_item(LABELS_KEY)?.extract()?;
    let tokenizer = PyTokenizer::new(tokenizer.clone());
    let rendered = inspect::render_example(&input_ids, &labels, &tokenizer)?;
    log::info!("{}", rendered);
    Ok(rendered)
}

/// A Python module implemented in Rust.
#[pymodule]
fn sftpack_rs(m: &Bound<'_, PyModule>) -> PyResult<()> {
    pyo3_log::init();
    m.add_class::<Preprocessor>()?;
    m.add_function(wrap_pyfunction!(format_dataset_example, m)?)?;
    m.add("PreprocessError", m.py().get_type::<PreprocessError>())?;
    m.add("PackingOverflowError", m.py().get_type::<PackingOverflowError>())?;
    m.add("IGNORE_INDEX", common::IGNORE_INDEX)?;
    Ok(())
}
