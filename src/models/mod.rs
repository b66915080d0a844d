pub mod bs;
pub mod grid_interp;
pub mod implied_vol;
