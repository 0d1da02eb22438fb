pub mod estimate;
pub mod run;
