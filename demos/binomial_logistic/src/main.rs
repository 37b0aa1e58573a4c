#![deny(warnings)]

use std::{env, io, path::PathBuf};

use anyhow::Context;
use log::{debug, info};
use logit_grad::{
    config::TrainingConfig,
    fit::train,
    plot::{plot_decision_curve, plot_loss},
};

/// Optional path to a JSON `TrainingConfig`.
const CONFIG_ENV: &str = "LOGREG_CONFIG";

fn load_config() -> anyhow::Result<TrainingConfig> {
    match env::var_os(CONFIG_ENV) {
        Some(path) => {
            let path = PathBuf::from(path);
            info!("loading config from {}", path.display());
            TrainingConfig::from_json_file(&path)
                .with_context(|| format!("failed to load config from {}", path.display()))
        }
        None => Ok(TrainingConfig::default()),
    }
}

fn binomial_logistic_example() -> anyhow::Result<()> {
    let config = load_config()?;
    debug!("config: {}", serde_json::to_string(&config)?);

    let run = {
        let stdout = io::stdout();
        let mut out = stdout.lock();
        train(&config, &mut out).context("training failed")?
    };

    let size = config.plot.size();
    if let Some(loss_path) = &config.plot.loss_path {
        plot_loss(&run.history, loss_path, size).context("failed to plot the loss")?;
    }
    plot_decision_curve(&run.samples, &run.fitted(), &config.plot.curve_path, size)
        .context("failed to plot the decision curve")?;

    Ok(())
}

fn main() -> anyhow::Result<()> {
    env_logger::init();
    binomial_logistic_example()
}
