//! Remote shape generation.
//!
//! * [`ShapeService`]: async trait implemented by shape backends.
//! * [`HttpShapeService`]: client for the generation server's `/generate`.
//! * [`ShapeResponse`]: wire format, decodable into a
//!   [`ShapeTexture`](crate::render::ShapeTexture).
//! * [`RemoteShapeCoordinator`]: single in-flight slot with epoch tagging,
//!   drained once per frame.
//! * [`RemoteError`]: error variants for remote operations.

pub mod coordinator;
pub mod response;
pub mod service;

pub use coordinator::{RemoteOutcome, RemoteShapeCoordinator};
pub use response::{BoundingBox, GenerateRequest, ShapeResponse};
pub use service::{HttpShapeService, RemoteError, ShapeService};
