//! Test suites for the Courier server.

mod support;
mod unit;
