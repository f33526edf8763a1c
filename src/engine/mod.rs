pub mod handoff;
pub mod lifecycle;
pub mod pricing;
pub mod routing;
pub mod validation;
pub mod walker;
pub mod worklist;
