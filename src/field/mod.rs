pub mod chladni;
pub mod engine;
pub mod service;

pub use chladni::ChladniService;
pub use engine::{Completion, FetchEngine};
pub use service::{ServiceError, SurfacePayload, SurfaceQuery, SurfaceService};
