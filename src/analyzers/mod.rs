//! Positivity and regional statistics over case records.
//!
//! [`positivity`] attaches daily and rolling positivity to a county's
//! records; [`aggregate`] averages several counties into a synthetic
//! regional series.

pub mod aggregate;
pub mod positivity;
pub mod types;
pub mod utility;
