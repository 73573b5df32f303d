#![deny(unsafe_code)]
#![warn(clippy::pedantic)]
#![allow(clippy::module_name_repetitions, clippy::similar_names)]

pub mod cli;

mod archive;
mod config;
mod discover;
mod error;
mod format;
mod logger;
mod notify;
mod ops;
mod schedule;
mod storage;

#[cfg(test)]
mod testing;
