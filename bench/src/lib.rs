//! Benchmark utilities for the ECS core.
//!
//! - [`components`]: representative component/feature-tag types shared by every benchmark, sized
//!   and shaped the way the micro and scenario benchmarks need them.
//! - [`scenarios`]: synthetic "game world" population + update-frame helpers reused by the
//!   criterion scenario benchmarks.
//!
//! # Running
//!
//! ```bash
//! cargo bench -p rusty_ecs_bench
//! cargo bench -p rusty_ecs_bench -- spawn
//! ```
//!
//! Results land in `target/criterion/` with HTML reports. These benchmarks are diagnostic, not
//! correctness tests — they visualize the joined-iteration "driver + probe" performance contract,
//! they don't gate it.

pub mod components;
pub mod scenarios;
