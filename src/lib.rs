//! AGamePack - AppImage game packager
//!
//! Library crate with the packaging pipeline: configuration resolution,
//! runtime classification, save path planning, link materialization and
//! package assembly. The command line front end lives in `main.rs`.

pub mod assembler;
pub mod bundler;
pub mod classifier;
pub mod config;
pub mod error;
pub mod icon;
pub mod logging;
pub mod materializer;
pub mod paths;
pub mod planner;
pub mod resolver;
pub mod scripts;
pub mod tools;
pub mod wizard;

pub use assembler::{BuildResult, PackageAssembler, PackageTree};
pub use error::{MaterializeError, PackError, ValidationError};
pub use resolver::{BuildFlags, ConfigResolver, Configuration, ParamSet, Runtime};
