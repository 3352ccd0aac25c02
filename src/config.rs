use pyo3::prelude::*;
use pyo3::types::PyDict;

use crate::common::TruncationSide;
use crate::error::{PackError, Result};

/// Settings shared by the train and eval packers for one preprocessing run.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PreprocessConfig {
    pub prompt_column: String,
    pub response_column: String,
    pub max_source_length: usize,
    pub max_target_length: usize,
    pub ignore_pad_token_for_loss: bool,
    /// Side used by the train packer's single-text encodes.
    pub train_truncation_side: TruncationSide,
    /// Side used when encoding eval prompts; left keeps the prompt tail.
    pub eval_source_truncation_side: TruncationSide,
    pub eval_target_truncation_side: TruncationSide,
}

impl PreprocessConfig {
    pub fn builder() -> PreprocessConfigBuilder {
        PreprocessConfigBuilder::default()
    }

    /// Fixed row length emitted by the train packer.
    pub fn max_seq_length(&self) -> usize {
        self.max_source_length + self.max_target_length
    }

    fn validate(&self) -> std::result::Result<(), String> {
        if self.prompt_column.is_empty() || self.response_column.is_empty() {
            return Err("prompt_column and response_column must be set".to_string());
        }
        if self.prompt_column == self.response_column {
            return Err(format!(
                "prompt_column and response_column are both '{}'",
                self.prompt_column
            ));
        }
        if self.max_source_length == 0 || self.max_target_length == 0 {
            return Err(
                "max_source_length and max_target_length must be greater than 0".to_string(),
            );
        }
        Ok(())
    }
}

pub struct PreprocessConfigBuilder {
    prompt_column: Option<String>,
    response_column: Option<String>,
    max_source_length: Option<usize>,
    max_target_length: Option<usize>,
    ignore_pad_token_for_loss: bool,
    train_truncation_side: TruncationSide,
    eval_source_truncation_side: TruncationSide,
    eval_target_truncation_side: TruncationSide,
}

impl Default for PreprocessConfigBuilder {
    fn default() -> Self {
        PreprocessConfigBuilder {
            prompt_column: None,
            response_column: None,
            max_source_length: None,
            max_target_length: None,
            ignore_pad_token_for_loss: true,
            train_truncation_side: TruncationSide::Right,
            eval_source_truncation_side: TruncationSide::Left,
            eval_target_truncation_side: TruncationSide::Right,
        }
    }
}

fn parse_side(key: &str, value: &str) -> Result<TruncationSide> {
    value.parse().map_err(|_| {
        PackError::InvalidConfig(format!("{key} must be 'left' or 'right', got '{value}'"))
    })
}

impl PreprocessConfigBuilder {
    pub fn prompt_column(mut self, column: impl Into<String>) -> Self {
        self.prompt_column = Some(column.into());
        self
    }

    pub fn response_column(mut self, column: impl Into<String>) -> Self {
        self.response_column = Some(column.into());
        self
    }

    pub fn max_source_length(mut self, len: usize) -> Self {
        self.max_source_length = Some(len);
        self
    }

    pub fn max_target_length(mut self, len: usize) -> Self {
        self.max_target_length = Some(len);
        self
    }

    pub fn ignore_pad_token_for_loss(mut self, ignore: bool) -> Self {
        self.ignore_pad_token_for_loss = ignore;
        self
    }

    pub fn train_truncation_side(mut self, side: TruncationSide) -> Self {
        self.train_truncation_side = side;
        self
    }

    pub fn eval_source_truncation_side(mut self, side: TruncationSide) -> Self {
        self.eval_source_truncation_side = side;
        self
    }

    pub fn eval_target_truncation_side(mut self, side: TruncationSide) -> Self {
        self.eval_target_truncation_side = side;
        self
    }

    fn set_side(&mut self, key: &str, value: &str) -> Result<()> {
        let side = parse_side(key, value)?;
        match key {
            "train_truncation_side" => self.train_truncation_side = side,
            "eval_source_truncation_side" => self.eval_source_truncation_side = side,
            "eval_target_truncation_side" => self.eval_target_truncation_side = side,
            _ => {}
        }
        Ok(())
    }

    /// Pick up the optional truncation-side overrides from constructor kwargs.
    pub fn from_py_dict(mut self, kwargs: Option<&Bound<'_, PyDict>>) -> Result<Self> {
        if let Some(kwargs) = kwargs {
            for (key, value) in kwargs.iter() {
                if let Ok(key_str) = key.extract::<&str>() {
                    match key_str {
                        "train_truncation_side"
                        | "eval_source_truncation_side"
                        | "eval_target_truncation_side" => {
                            let side: String = value.extract()?;
                            self.set_side(key_str, &side)?;
                        }
                        _ => {
                            return Err(PackError::InvalidConfig(format!(
                                "unexpected keyword argument '{key_str}'"
                            )))
                        }
                    }
                }
            }
        }
        Ok(self)
    }

    /// Read every setting off an argument object such as a training
    /// script's data arguments. Truncation sides are optional attributes.
    pub fn from_py_object(mut self, args: &Bound<'_, PyAny>) -> Result<Self> {
        self.prompt_column = Some(args.getattr("prompt_column")?.extract()?);
        self.response_column = Some(args.getattr("response_column")?.extract()?);
        self.max_source_length = Some(args.getattr("max_source_length")?.extract()?);
        self.max_target_length = Some(args.getattr("max_target_length")?.extract()?);
        if let Ok(value) = args.getattr("ignore_pad_token_for_loss") {
            self.ignore_pad_token_for_loss = value.extract()?;
        }
        for key in [
            "train_truncation_side",
            "eval_source_truncation_side",
            "eval_target_truncation_side",
        ] {
            if let Ok(value) = args.getattr(key) {
                if let Some(side) = value.extract::<Option<String>>()? {
                    self.set_side(key, &side)?;
                }
            }
        }
        Ok(self)
    }

    pub fn build(self) -> Result<PreprocessConfig> {
        let missing = |name: &str| PackError::InvalidConfig(format!("{name} is required"));
        let config = PreprocessConfig {
            prompt_column: self.prompt_column.ok_or_else(|| missing("prompt_column"))?,
            response_column: self.response_column.ok_or_else(|| missing("response_column"))?,
            max_source_length: self
                .max_source_length
                .ok_or_else(|| missing("max_source_length"))?,
            max_target_length: self
                .max_target_length
                .ok_or_else(|| missing("max_target_length"))?,
            ignore_pad_token_for_loss: self.ignore_pad_token_for_loss,
            train_truncation_side: self.train_truncation_side,
            eval_source_truncation_side: self.eval_source_truncation_side,
            eval_target_truncation_side: self.eval_target_truncation_side,
        };

        config.validate().map_err(PackError::InvalidConfig)?;
        Ok(config)
    }
}
