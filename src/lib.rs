pub mod error;
pub mod logging;
pub mod types;

pub mod io;
pub mod mgh;
pub mod plot_utils;
pub mod qc;

pub mod cluster;
pub mod extract;
pub mod index;
pub mod legend;
pub mod overlap;
pub mod render;
