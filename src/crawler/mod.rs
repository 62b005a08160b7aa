//! Crawler module for discovering and rendering pages
//!
//! This module contains the core crawling logic, including:
//! - The URL frontier with claim and commit
//! - The per-page render pipeline and exists-mode policy
//! - The worker pool
//! - Overall crawl coordination

mod coordinator;
mod frontier;
mod renderer;
mod scheduler;

pub use coordinator::{run_crawl, Coordinator};
pub use frontier::{Claim, ClaimResult, Commit, Frontier};
pub use renderer::{PageOutcome, PageRenderer};
pub use scheduler::{Scheduler, SchedulerSettings};
