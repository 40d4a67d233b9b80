//! Umbrella crate for the gtrack workspace. Each member is re-exported behind
//! a feature of the same name.

#[cfg(feature = "core")]
#[doc(inline)]
pub use gtrack_core as core;

#[cfg(feature = "cache")]
#[doc(inline)]
pub use gtrack_cache as cache;

#[cfg(feature = "source")]
#[doc(inline)]
pub use gtrack_source as source;
