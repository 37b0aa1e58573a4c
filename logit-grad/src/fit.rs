use std::{
    fmt::{self, Display},
    io::Write,
};

use log::{debug, info, warn};
use rand::{rngs::StdRng, SeedableRng};

use crate::{
    config::TrainingConfig,
    data::SampleSet,
    error::{LogRegErr, Result},
    loss_functions::{binary_cross_entropy_loss, EpochLoss},
    nn::{FittedCurve, LogisticRegression, Module},
};

/// The block written after every epoch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochReport {
    /// 1-based.
    pub epoch: usize,
    pub loss: f32,
    pub slope: f32,
    pub intercept: f32,
}

/// Five decimals, with a space where a minus sign would go.
/// Non-finite values print as ` nan`, ` inf` and `-inf`.
struct Signed(f32);

impl Display for Signed {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let value = self.0;
        if value.is_nan() {
            write!(f, " nan")
        } else if value.is_infinite() {
            write!(f, "{}inf", if value < 0.0 { "-" } else { " " })
        } else if value.is_sign_negative() {
            write!(f, "{:.5}", value)
        } else {
            write!(f, " {:.5}", value)
        }
    }
}

impl Display for EpochReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "epoch: {}", self.epoch)?;
        writeln!(f, "loss: {}", Signed(self.loss))?;
        writeln!(f, "slope: {}", Signed(self.slope))?;
        writeln!(f, "intercept: {}", Signed(self.intercept))?;
        writeln!(f)
    }
}

/// Full-batch gradient descent on binary cross entropy.
///
/// Runs exactly `num_iterations` steps, writing one `EpochReport` per step
/// to `out`. The reported loss is the one the step was taken on, slope and
/// intercept are the values after the update.
pub fn sgd<W: Write>(
    model: &mut LogisticRegression,
    inputs: &[f32],
    target: &[f32],
    num_iterations: usize,
    learning_rate: f32,
    out: &mut W,
) -> Result<Vec<EpochLoss>> {
    if inputs.len() != target.len() {
        return Err(LogRegErr::SizeMismatch {
            a: "inputs",
            b: "target",
            got: target.len(),
            expected: inputs.len(),
        });
    }
    if inputs.is_empty() {
        return Err(LogRegErr::EmptyDataset);
    }

    let mut epoch_loss = Vec::with_capacity(num_iterations);

    for epoch in 0..num_iterations {
        model.zero_grad();

        // Forward pass
        let ypreds = model.predict_batch(inputs);
        let loss = binary_cross_entropy_loss(&ypreds, target);

        // Backward pass
        loss.backward();

        // Update params
        for p in model.parameters() {
            let mut p = p.borrow_mut();
            // We want the loss to go down so we add by negative grad
            p.data += -learning_rate * p.grad;
        }

        let loss = loss.data();
        if !loss.is_finite() {
            warn!("loss became {loss} at epoch {}", epoch + 1);
        }

        let report = EpochReport {
            epoch: epoch + 1,
            loss,
            slope: model.slope(),
            intercept: model.intercept(),
        };
        write!(out, "{report}")?;

        epoch_loss.push(EpochLoss { epoch, loss });
    }

    Ok(epoch_loss)
}

/// Everything a finished run leaves behind for plotting.
pub struct TrainingRun {
    pub samples: SampleSet,
    pub model: LogisticRegression,
    pub history: Vec<EpochLoss>,
}

impl TrainingRun {
    pub fn fitted(&self) -> FittedCurve {
        self.model.fitted()
    }

    pub fn final_loss(&self) -> Option<f32> {
        self.history.last().map(|e| e.loss)
    }
}

/// Generates the samples, initializes the model and trains it.
///
/// A single generator seeded with `config.seed` feeds, in order, the weight,
/// the bias, the blue features and the red features.
pub fn train<W: Write>(config: &TrainingConfig, out: &mut W) -> Result<TrainingRun> {
    config.validate()?;

    let mut rng = StdRng::seed_from_u64(config.seed);
    let mut model = LogisticRegression::new(&mut rng);
    let samples = SampleSet::generate(
        &mut rng,
        config.samples_per_class,
        config.blue_range,
        config.red_range,
    )?;
    debug!(
        "seed {}: initial slope {}, intercept {}, blue {:?}, red {:?}",
        config.seed,
        model.slope(),
        model.intercept(),
        samples.blue_x,
        samples.red_x
    );

    info!(
        "training on {} samples for {} epochs, learning rate {}",
        samples.len(),
        config.epochs,
        config.learning_rate
    );
    let history = sgd(
        &mut model,
        &samples.features(),
        &samples.labels(),
        config.epochs,
        config.learning_rate,
        out,
    )?;
    out.flush()?;

    let fitted = model.fitted();
    info!(
        "finished with loss {:?}, slope {}, intercept {}, decision boundary {:?}",
        history.last().map(|e| e.loss),
        fitted.slope,
        fitted.intercept,
        fitted.decision_boundary()
    );

    Ok(TrainingRun {
        samples,
        model,
        history,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::data::ClassRange;

    fn run_default() -> (TrainingRun, String) {
        let mut out = Vec::new();
        let run = train(&TrainingConfig::default(), &mut out).unwrap();
        (run, String::from_utf8(out).unwrap())
    }

    #[test]
    fn test_report_format() {
        let report = EpochReport {
            epoch: 1,
            loss: 0.693147,
            slope: -0.123456,
            intercept: 2.5,
        };
        assert_eq!(
            "epoch: 1\nloss:  0.69315\nslope: -0.12346\nintercept:  2.50000\n\n",
            report.to_string()
        );
    }

    #[test]
    fn test_report_non_finite() {
        let report = EpochReport {
            epoch: 7,
            loss: f32::NAN,
            slope: f32::INFINITY,
            intercept: f32::NEG_INFINITY,
        };
        assert_eq!(
            "epoch: 7\nloss:  nan\nslope:  inf\nintercept: -inf\n\n",
            report.to_string()
        );
    }

    #[test]
    fn test_sgd_single_step() {
        // p = sigmoid(0) = 0.5 everywhere, so dL/dw = mean((p - y) * x), dL/db = mean(p - y)
        let mut model = LogisticRegression::from_parameters(0.0, 0.0);
        let mut out = Vec::new();
        let history = sgd(&mut model, &[1.0, 3.0], &[0.0, 1.0], 1, 0.1, &mut out).unwrap();

        assert_eq!(1, history.len());
        assert_eq!(0, history[0].epoch);
        assert!((history[0].loss - 2.0f32.ln()).abs() < 1e-6);
        // dL/dw = (0.5 * 1 - 0.5 * 3) / 2 = -0.5, dL/db = 0
        assert!((model.slope() - 0.05).abs() < 1e-6, "{}", model.slope());
        assert!(model.intercept().abs() < 1e-6, "{}", model.intercept());

        let out = String::from_utf8(out).unwrap();
        assert!(out.starts_with("epoch: 1\nloss:  0.69315\nslope:  0.05000\n"));
    }

    #[test]
    fn test_sgd_size_mismatch() {
        let mut model = LogisticRegression::from_parameters(0.0, 0.0);
        let result = sgd(&mut model, &[1.0, 2.0], &[1.0], 10, 0.1, &mut Vec::<u8>::new());
        assert!(matches!(
            result,
            Err(LogRegErr::SizeMismatch {
                got: 1,
                expected: 2,
                ..
            })
        ));
    }

    #[test]
    fn test_sgd_empty_dataset() {
        let mut model = LogisticRegression::from_parameters(0.0, 0.0);
        let result = sgd(&mut model, &[], &[], 10, 0.1, &mut Vec::<u8>::new());
        assert!(matches!(result, Err(LogRegErr::EmptyDataset)));
    }

    #[test]
    fn test_train_prints_every_epoch() {
        let (run, out) = run_default();
        assert_eq!(2000, run.history.len());
        assert_eq!(40, run.samples.len());
        assert_eq!(2000 * 5, out.lines().count());
        assert!(out.starts_with("epoch: 1\n"));
        assert!(out.contains("\nepoch: 2000\n"));
        assert!(out.ends_with("\n\n"));
    }

    #[test]
    fn test_train_loss_is_non_negative_and_non_increasing() {
        let (run, _) = run_default();
        for e in run.history.iter() {
            assert!(e.loss >= 0.0 && e.loss.is_finite(), "epoch {}: {}", e.epoch, e.loss);
        }
        for pair in run.history.windows(2) {
            assert!(
                pair[1].loss <= pair[0].loss + 1e-4,
                "loss went up at epoch {}: {} -> {}",
                pair[1].epoch,
                pair[0].loss,
                pair[1].loss
            );
        }
    }

    #[test]
    fn test_train_converges() {
        let (run, _) = run_default();
        let first = run.history[0].loss;
        let last = run.final_loss().unwrap();
        assert!(last < first, "first: {}, last: {}", first, last);
        // Better than the constant 0.5 predictor
        assert!(last < 0.68, "last: {}", last);
    }

    #[test]
    fn test_train_boundary_inside_overlap() {
        let (run, _) = run_default();
        let fitted = run.fitted();
        assert!(fitted.slope > 0.0, "{:?}", fitted);
        let boundary = fitted.decision_boundary().unwrap();
        assert!(
            ClassRange::new(3.0, 7.0).contains(boundary),
            "boundary {} outside the overlap",
            boundary
        );

        for x in [boundary - 1.0, boundary - 0.1, 0.0] {
            assert!(fitted.predict(x) < 0.5, "{}", x);
        }
        for x in [boundary + 0.1, boundary + 1.0, 10.0] {
            assert!(fitted.predict(x) > 0.5, "{}", x);
        }
    }

    #[test]
    fn test_train_is_reproducible() {
        let (first_run, first_out) = run_default();
        let (second_run, second_out) = run_default();
        assert_eq!(first_run.samples, second_run.samples);
        assert_eq!(first_run.fitted(), second_run.fitted());
        assert_eq!(first_out, second_out);
    }

    #[test]
    fn test_train_large_sample_count() {
        let config = TrainingConfig {
            samples_per_class: 50_000,
            epochs: 1,
            ..TrainingConfig::default()
        };
        let mut out = Vec::new();
        let run = train(&config, &mut out).unwrap();
        assert_eq!(100_000, run.samples.len());
        assert_eq!(1, run.history.len());
        assert!(run.history[0].loss.is_finite() && run.history[0].loss >= 0.0);
        assert!(String::from_utf8(out).unwrap().starts_with("epoch: 1\n"));
    }

    #[test]
    fn test_train_rejects_invalid_config() {
        let config = TrainingConfig {
            learning_rate: 0.0,
            ..TrainingConfig::default()
        };
        let result = train(&config, &mut Vec::<u8>::new());
        assert!(matches!(result, Err(LogRegErr::InvalidConfig(_))));
    }
}
