//! TruthLens command-line interface

pub mod cli;
