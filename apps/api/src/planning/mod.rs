// BreakEven: spend-reduction planning.
// Implements: plan rules, plan generation, the bounded plan store, demo profile data.

pub mod demo;
pub mod generator;
pub mod handlers;
pub mod rules;
pub mod store;
