//! Model-based testing of the safety controllers.
//!
//! [`ModelWorld`] is a deliberately naive reference implementation of the
//! SOS and check-in lifecycles. [`RealWorld`] drives the production
//! [`safeline_app::Bridge`] with the same [`Operation`]s. After every
//! operation their [`ObservableState`]s must be equal.

mod operation;
mod real;
mod world;

pub use operation::{ModelSession, Operation};
pub use real::RealWorld;
pub use world::{ModelCheckIn, ModelDispatch, ModelSos, ModelWorld, ObservableState};
