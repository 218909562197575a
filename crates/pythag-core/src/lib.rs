// Library root: Pythagorean exponent estimation from team game logs.
//
// Pipeline: raw game entries -> record (ingest) -> season (aggregate)
// -> estimate (fit k) -> predict (wins/residuals), with one_run as a
// model-independent breakdown alongside.

pub mod error;
pub mod estimate;
pub mod one_run;
pub mod predict;
pub mod record;
pub mod season;

pub use error::PythagError;
