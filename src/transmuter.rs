//! Main module for transmuter library functionality

pub mod common;
pub mod config;
pub mod error;
pub mod formats;
pub mod grammars;
pub mod lexing;
pub mod parsing;
pub mod range;
pub mod testing;
