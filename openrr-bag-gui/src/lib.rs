#![warn(rust_2018_idioms)]

mod error;
mod joint_state_plot;

pub use crate::{error::*, joint_state_plot::*};
