pub mod specimen_ctx;
pub mod specimen_flow;

pub use specimen_ctx::SpecimenCtx;
pub use specimen_flow::{FlowResult, SpecimenFlow};
