//! Serialisable detector events and the observers that publish them to
//! other threads and async tasks.

pub mod events;
pub mod observers;
