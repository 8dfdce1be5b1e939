//! # Lumen Compositor Core
//!
//! The surface composition tree of the Lumen Wayland compositor. It covers:
//! - Surfaces: compositor-side wrappers bound to one client resource each,
//!   with damage conversion from buffer space to logical space and centering
//!   of undersized buffers.
//! - Views: windows, sub-surfaces, popups, layer surfaces and lock surfaces
//!   behind one [`View`] contract.
//! - Sub-surface and popup trees rooted at their owning views, kept in sync
//!   with protocol notifications and reporting damage to a [`DamageSink`].
//! - Render-order collection of everything shown on a workspace.
//!
//! Protocol notifications are queued as work and handled by
//! [`Scene::dispatch_pending`]; every node is addressed through a
//! generation-checked [`Key`], so handles to freed nodes resolve to nothing.

pub mod arena;
pub mod context;
pub mod layer;
pub mod output;
pub mod popup;
pub mod protocol;
pub mod region;
pub mod scene;
pub mod signal;
pub mod subsurface;
pub mod surface;
pub mod transform;
pub mod view;
pub mod window;
pub mod workspace;

#[cfg(test)]
mod testing;

pub use arena::{Arena, Key};
pub use context::{DamageSink, InputSink, SiblingDamagePolicy, TreeConfig};
pub use layer::{KeyboardInteractivity, Layer, LayerDescriptor, LayerId, LockSurfaceId};
pub use output::{Monitor, MonitorId, WorkspaceId};
pub use popup::{PopupId, PopupOwner};
pub use protocol::{ProtocolError, ResourceId, ResourceStore, SurfaceRole, Viewport};
pub use region::Region;
pub use scene::{Scene, SceneError};
pub use signal::{Signal, Subscription};
pub use subsurface::{SubsurfaceId, SubsurfaceOwner};
pub use surface::{ConstraintId, SurfaceId};
pub use transform::OutputTransform;
pub use view::{View, ViewId, ViewType};
pub use window::{WindowDescriptor, WindowId};
