//! End-to-end scenarios, each swept across every concurrency-control mode.

mod common;

mod basic;
mod contention;
mod stress;
