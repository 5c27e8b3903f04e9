pub mod allocation_engine;
pub mod recompute_service;
pub mod reversal_service;
pub mod settlement_service;

pub use allocation_engine::{AllocationEngine, AllocationInput};
pub use recompute_service::{RecomputeService, RecomputedCurrencyTotals};
pub use reversal_service::ReversalService;
pub use settlement_service::SettlementService;
