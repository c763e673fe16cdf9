//! Phone events: model, lifecycle and storage.
//!
//! An event is classified once when it is captured, then only its state
//! changes:
//! - accepted events start `Pending` and become `Processed` once emailed
//! - rejected events are `Ignored` and never emailed

mod lifecycle;
mod model;
mod repository;

pub use lifecycle::{after_delivery, initial_state};
pub use model::{
    Direction, EventId, EventState, GeoCoordinates, PhoneEvent, StateReason, Trigger,
};
pub use repository::EventRepository;
