#![deny(warnings)]

//! Binomial logistic regression on a scalar reverse-mode autograd engine.

pub mod config;
pub mod data;
pub mod engine;
pub mod error;
pub mod fit;
pub mod loss_functions;
pub mod nn;
pub mod plot;

pub use error::{LogRegErr, Result};
