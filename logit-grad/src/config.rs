use std::{
    fs,
    path::{Path, PathBuf},
};

use serde::{Deserialize, Serialize};

use crate::{
    data::ClassRange,
    error::{LogRegErr, Result},
};

/// Everything a run depends on. The defaults reproduce the reference run.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TrainingConfig {
    pub seed: u64,
    pub samples_per_class: usize,
    pub blue_range: ClassRange,
    pub red_range: ClassRange,
    pub epochs: usize,
    pub learning_rate: f32,
    pub plot: PlotConfig,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PlotConfig {
    pub curve_path: PathBuf,
    /// `None` skips the loss chart.
    pub loss_path: Option<PathBuf>,
    pub width: u32,
    pub height: u32,
}

impl Default for TrainingConfig {
    fn default() -> Self {
        Self {
            seed: 42,
            samples_per_class: 20,
            blue_range: ClassRange::new(0.0, 7.0),
            red_range: ClassRange::new(3.0, 10.0),
            epochs: 2000,
            learning_rate: 0.1,
            plot: PlotConfig::default(),
        }
    }
}

impl Default for PlotConfig {
    fn default() -> Self {
        Self {
            curve_path: PathBuf::from("decision_curve.png"),
            loss_path: Some(PathBuf::from("loss.png")),
            width: 1280,
            height: 720,
        }
    }
}

impl PlotConfig {
    pub fn size(&self) -> (u32, u32) {
        (self.width, self.height)
    }
}

impl TrainingConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        let config: Self = serde_json::from_str(json)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_json_file(path: &Path) -> Result<Self> {
        Self::from_json_str(&fs::read_to_string(path)?)
    }

    pub fn validate(&self) -> Result<()> {
        if self.epochs == 0 {
            return Err(invalid("epochs must be at least 1"));
        }
        if self.samples_per_class == 0 {
            return Err(invalid("samples_per_class must be at least 1"));
        }
        if !self.learning_rate.is_finite() || self.learning_rate <= 0.0 {
            return Err(invalid(format!(
                "learning_rate must be a positive number, got {}",
                self.learning_rate
            )));
        }
        if self.plot.width == 0 || self.plot.height == 0 {
            return Err(invalid("plot dimensions must be non-zero"));
        }
        self.blue_range.validate("blue")?;
        self.red_range.validate("red")?;
        Ok(())
    }
}

fn invalid(reason: impl Into<String>) -> LogRegErr {
    LogRegErr::InvalidConfig(reason.into())
}
