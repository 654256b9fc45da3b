//! Integration suites for the command bridge.

mod bridge_behaviour;
mod support;
