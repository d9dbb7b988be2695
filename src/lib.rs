//! labstage: configuration, logging and command-line front end for the
//! OptoSigma SBIS26 stage driver.
//!
//! The driver itself lives in `labstage-driver-optosigma`; the transport and
//! shared traits in `labstage-core`.

pub mod cli;
pub mod config;
pub mod logging;

pub use labstage_driver_optosigma as optosigma;
