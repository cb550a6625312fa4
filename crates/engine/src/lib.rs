//! Security evaluator, read filter, write authorizer, and the request service.

pub mod authorizer;
pub mod evaluator;
pub mod filter;
pub mod patch;
pub mod report;
pub mod service;

pub use authorizer::{authorize, Authorized};
pub use evaluator::{grant, Bucket, Layout, UNASSIGNED};
pub use filter::filter_metadata;
pub use report::{BoxRow, LayoutReport};
pub use service::{Gatekeeper, MutationOutcome};
