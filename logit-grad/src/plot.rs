use std::path::Path;

use log::info;
use plotters::{
    prelude::{BitMapBackend, ChartBuilder, Circle, IntoDrawingArea, LabelAreaPosition},
    series::LineSeries,
    style::{Color, BLUE, GREEN, RED, WHITE},
};

use crate::{
    data::{SampleSet, BLUE_LABEL, RED_LABEL},
    error::{plot_err, LogRegErr, Result},
    loss_functions::EpochLoss,
    nn::FittedCurve,
};

pub const CURVE_STEP: f32 = 0.1;
pub const CURVE_POINTS: usize = 100;
pub const X_MIN: f32 = 0.0;
pub const X_MAX: f32 = 10.0;

/// `sigmoid(slope * x + intercept)` at x = 0.0, 0.1, ..., 9.9.
pub fn curve_points(curve: &FittedCurve) -> Vec<(f32, f32)> {
    (0..CURVE_POINTS)
        .map(|i| {
            let x = X_MIN + i as f32 * CURVE_STEP;
            (x, curve.predict(x))
        })
        .collect()
}

/// Each sample sits at its label's height.
pub fn scatter_points(xs: &[f32], label: f32) -> Vec<(f32, f32)> {
    xs.iter().map(|x| (*x, label)).collect()
}

/// Draws the fitted sigmoid over both classes.
pub fn plot_decision_curve(
    samples: &SampleSet,
    curve: &FittedCurve,
    path: &Path,
    size: (u32, u32),
) -> Result<()> {
    let root_area = BitMapBackend::new(path, size).into_drawing_area();
    root_area.fill(&WHITE).map_err(plot_err)?;

    let mut ctx = ChartBuilder::on(&root_area)
        .set_label_area_size(LabelAreaPosition::Left, 40)
        .set_label_area_size(LabelAreaPosition::Bottom, 40)
        .caption("Binomial logistic regression", ("sans-serif", 40))
        .build_cartesian_2d(X_MIN..X_MAX, -0.05f32..1.05f32)
        .map_err(plot_err)?;

    ctx.configure_mesh().draw().map_err(plot_err)?;

    ctx.draw_series(LineSeries::new(curve_points(curve), &GREEN))
        .map_err(plot_err)?;

    for (xs, label, color) in [
        (&samples.blue_x, BLUE_LABEL, BLUE),
        (&samples.red_x, RED_LABEL, RED),
    ] {
        ctx.draw_series(
            scatter_points(xs, label)
                .into_iter()
                .map(|point| Circle::new(point, 5, color.filled())),
        )
        .map_err(plot_err)?;
    }

    root_area.present().map_err(plot_err)?;
    info!("wrote decision curve to {}", path.display());
    Ok(())
}

pub fn plot_loss(epoch_loss: &[EpochLoss], path: &Path, size: (u32, u32)) -> Result<()> {
    let max_epoch = epoch_loss
        .iter()
        .map(|x| x.epoch)
        .max()
        .ok_or_else(|| LogRegErr::Plot("no epochs to plot".to_string()))?;
    let max_loss = epoch_loss
        .iter()
        .map(|x| x.loss)
        .filter(|loss| loss.is_finite())
        .reduce(f32::max)
        .unwrap_or(1.0);

    let root_area = BitMapBackend::new(path, size).into_drawing_area();
    root_area.fill(&WHITE).map_err(plot_err)?;

    let mut ctx = ChartBuilder::on(&root_area)
        .set_label_area_size(LabelAreaPosition::Left, 40)
        .set_label_area_size(LabelAreaPosition::Bottom, 40)
        .caption("Loss", ("sans-serif", 40))
        .build_cartesian_2d(0..max_epoch + 1, 0.0f32..(max_loss * 1.1 + f32::EPSILON))
        .map_err(plot_err)?;

    ctx.configure_mesh().draw().map_err(plot_err)?;

    ctx.draw_series(LineSeries::new(
        epoch_loss.iter().map(|point| point.into()),
        &GREEN,
    ))
    .map_err(plot_err)?;

    root_area.present().map_err(plot_err)?;
    info!("wrote loss curve to {}", path.display());
    Ok(())
}
