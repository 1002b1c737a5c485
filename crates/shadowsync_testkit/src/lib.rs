//! # ShadowSync Testkit
//!
//! Test utilities shared by the workspace's test suites:
//! - [`ManualClock`] — a hand-advanced time source for exercising
//!   periodic update policies deterministically
//! - [`UpdateBuilder`] — constructs inbound wire payloads without
//!   going through a `DeviceShadow`
//! - [`generators`] — proptest strategies for wire scalars and
//!   property names

mod clock;
pub mod generators;
mod payload;

pub use clock::ManualClock;
pub use payload::UpdateBuilder;
