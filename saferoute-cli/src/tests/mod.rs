//! Shared test harness modules for the SafeRoute CLI.

use super::*;

mod commands;
mod helpers;
