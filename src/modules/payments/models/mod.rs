pub mod allocation_line;
pub mod payment;
pub mod payment_allocation;

pub use allocation_line::AllocationLine;
pub use payment::{Payment, PaymentDraft};
pub use payment_allocation::PaymentAllocation;
