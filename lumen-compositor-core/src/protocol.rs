//! In-process model of the client protocol objects the composition tree reads.
//!
//! A [`DrawableResource`] plays the part of a `wl_surface` plus whichever role
//! object is attached to it. Requests mutate the pending state; [`ResourceStore::commit`]
//! latches it into the current state and fires the resource's `commit` event.
//! Role lifecycle (map, unmap, destroy, popup repositioning) is driven explicitly
//! by the caller and reported through the same per-resource [`ResourceEvents`].

use bitflags::bitflags;
use lumen_core::types::{PointF, RectF, SizeF};
use thiserror::Error;
use tracing::{debug, trace};

use crate::arena::{Arena, Key};
use crate::region::Region;
use crate::signal::Signal;
use crate::surface::SurfaceId;
use crate::transform::OutputTransform;

pub type ResourceId = Key<DrawableResource>;

bitflags! {
    /// Which parts of the pending state were touched since the last commit.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
    pub struct PendingChanges: u32 {
        const BUFFER = 1 << 0;
        const SCALE = 1 << 1;
        const TRANSFORM = 1 << 2;
        const VIEWPORT = 1 << 3;
        const DAMAGE = 1 << 4;
        const INPUT_REGION = 1 << 5;
        const GEOMETRY = 1 << 6;
    }
}

/// `wp_viewport` state.
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Viewport {
    /// Source rectangle in surface-local (buffer / scale) coordinates.
    pub source: Option<RectF>,
    /// Destination size in logical coordinates.
    pub destination: Option<SizeF>,
}

/// Double-buffered surface state.
#[derive(Debug, Clone, PartialEq)]
pub struct SurfaceAttributes {
    /// Untransformed buffer size in pixels, `None` while no buffer is attached.
    pub buffer_size: Option<SizeF>,
    pub scale: i32,
    pub transform: OutputTransform,
    pub viewport: Viewport,
    /// Damage accumulated for this commit, in buffer coordinates.
    pub buffer_damage: Region,
    /// `None` means the whole surface accepts input.
    pub input_region: Option<Region>,
    /// `xdg_surface.set_window_geometry`, relative to the surface origin.
    pub geometry: Option<RectF>,
}

impl Default for SurfaceAttributes {
    fn default() -> Self {
        Self {
            buffer_size: None,
            scale: 1,
            transform: OutputTransform::Normal,
            viewport: Viewport::default(),
            buffer_damage: Region::new(),
            input_region: None,
            geometry: None,
        }
    }
}

impl SurfaceAttributes {
    pub fn has_buffer(&self) -> bool {
        self.buffer_size.is_some()
    }

    fn buffer_scale(&self) -> f64 {
        f64::from(self.scale.max(1))
    }

    /// Buffer size after the buffer transform, zero without a buffer.
    pub fn transformed_buffer_size(&self) -> SizeF {
        self.buffer_size
            .map(|size| self.transform.transform_size(size))
            .unwrap_or_else(SizeF::zero)
    }

    /// Logical surface size: the viewport destination, else the viewport source
    /// size, else the transformed buffer divided by the buffer scale.
    pub fn size(&self) -> SizeF {
        if !self.has_buffer() {
            return SizeF::zero();
        }
        if let Some(destination) = self.viewport.destination {
            return destination;
        }
        if let Some(source) = self.viewport.source {
            return source.size;
        }
        let scale = self.buffer_scale();
        let buffer = self.transformed_buffer_size();
        SizeF::new(buffer.width / scale, buffer.height / scale)
    }

    /// Window geometry, falling back to the full surface.
    pub fn geometry_or_surface(&self) -> RectF {
        self.geometry.unwrap_or_else(|| RectF::from_size(self.size()))
    }
}

/// Position-bearing role state for subsurfaces and popups.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ChildRole {
    pub parent: ResourceId,
    /// Applied position relative to the parent: the surface origin for
    /// subsurfaces, the parent's geometry origin for popups.
    pub position: PointF,
    pub pending_position: Option<PointF>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum SurfaceRole {
    Toplevel,
    Subsurface(ChildRole),
    Popup(ChildRole),
    Layer,
    Lock,
    Cursor,
    DragIcon,
}

/// Notifications raised by one resource. Every payload is the id of the
/// resource concerned: the emitting one, or the newly created child for
/// `new_subsurface` and `new_popup`.
#[derive(Debug, Default)]
pub struct ResourceEvents {
    pub commit: Signal<ResourceId>,
    pub map: Signal<ResourceId>,
    pub unmap: Signal<ResourceId>,
    pub destroy: Signal<ResourceId>,
    pub new_subsurface: Signal<ResourceId>,
    pub new_popup: Signal<ResourceId>,
    pub reposition_requested: Signal<ResourceId>,
    pub repositioned: Signal<ResourceId>,
}

#[derive(Debug, Default)]
pub struct DrawableResource {
    role: Option<SurfaceRole>,
    pending: SurfaceAttributes,
    pending_changes: PendingChanges,
    current: SurfaceAttributes,
    mapped: bool,
    committed_once: bool,
    initial_commit: bool,
    configure_serial: u32,
    preferred: Option<(f64, OutputTransform)>,
    subsurfaces: Vec<ResourceId>,
    popups: Vec<ResourceId>,
    owner: Option<SurfaceId>,
    events: ResourceEvents,
}

impl DrawableResource {
    pub fn role(&self) -> Option<&SurfaceRole> {
        self.role.as_ref()
    }

    pub fn current(&self) -> &SurfaceAttributes {
        &self.current
    }

    pub fn pending(&self) -> &SurfaceAttributes {
        &self.pending
    }

    pub fn pending_changes(&self) -> PendingChanges {
        self.pending_changes
    }

    pub fn is_mapped(&self) -> bool {
        self.mapped
    }

    /// True between the first commit and the configure that answers it.
    pub fn initial_commit(&self) -> bool {
        self.initial_commit
    }

    pub fn configure_serial(&self) -> u32 {
        self.configure_serial
    }

    /// Last preferred buffer scale and transform sent to the client.
    pub fn preferred_scale(&self) -> Option<(f64, OutputTransform)> {
        self.preferred
    }

    /// Child subsurfaces in creation order.
    pub fn subsurfaces(&self) -> &[ResourceId] {
        &self.subsurfaces
    }

    pub fn popups(&self) -> &[ResourceId] {
        &self.popups
    }

    /// The compositor surface wrapper currently claiming this resource.
    pub fn owner(&self) -> Option<SurfaceId> {
        self.owner
    }

    pub fn events(&self) -> &ResourceEvents {
        &self.events
    }

    fn child_role(&self) -> Option<&ChildRole> {
        match &self.role {
            Some(SurfaceRole::Subsurface(role)) | Some(SurfaceRole::Popup(role)) => Some(role),
            _ => None,
        }
    }

    /// Parent resource for subsurfaces and popups.
    pub fn parent(&self) -> Option<ResourceId> {
        self.child_role().map(|role| role.parent)
    }

    /// Applied position relative to the parent, for subsurfaces and popups.
    pub fn position(&self) -> Option<PointF> {
        self.child_role().map(|role| role.position)
    }
}

/// Errors raised for requests a real client would get a protocol error for.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum ProtocolError {
    #[error("resource {0:?} does not exist")]
    BadSurface(ResourceId),
    #[error("parent resource {0:?} does not exist")]
    BadParent(ResourceId),
    #[error("resource {0:?} already has a role")]
    SurfaceHasRole(ResourceId),
    #[error("resource {0:?} is not a subsurface")]
    NotASubsurface(ResourceId),
    #[error("resource {0:?} is not a popup")]
    NotAPopup(ResourceId),
    #[error("making {child:?} a child of {parent:?} would create a cycle")]
    CycleDetected { child: ResourceId, parent: ResourceId },
}

/// Owns every [`DrawableResource`].
#[derive(Debug, Default)]
pub struct ResourceStore {
    resources: Arena<DrawableResource>,
}

impl ResourceStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a role-less surface resource.
    pub fn create_surface(&mut self) -> ResourceId {
        let id = self.resources.insert(DrawableResource::default());
        trace!("Created resource {:?}", id);
        id
    }

    pub fn get(&self, id: ResourceId) -> Option<&DrawableResource> {
        self.resources.get(id)
    }

    pub fn contains(&self, id: ResourceId) -> bool {
        self.resources.contains(id)
    }

    fn get_mut_or_err(&mut self, id: ResourceId) -> Result<&mut DrawableResource, ProtocolError> {
        self.resources.get_mut(id).ok_or(ProtocolError::BadSurface(id))
    }

    /// Assigns a parent-less role (toplevel, layer, lock, cursor or drag icon).
    pub fn set_role(&mut self, id: ResourceId, role: SurfaceRole) -> Result<(), ProtocolError> {
        let resource = self.get_mut_or_err(id)?;
        if resource.role.is_some() {
            return Err(ProtocolError::SurfaceHasRole(id));
        }
        resource.role = Some(role);
        Ok(())
    }

    /// `wl_subcompositor.get_subsurface`: makes `child` a subsurface of `parent`
    /// and announces it through the parent's `new_subsurface` event.
    pub fn create_subsurface(&mut self, child: ResourceId, parent: ResourceId) -> Result<(), ProtocolError> {
        if !self.contains(child) {
            return Err(ProtocolError::BadSurface(child));
        }
        if !self.contains(parent) {
            return Err(ProtocolError::BadParent(parent));
        }
        if child == parent {
            return Err(ProtocolError::CycleDetected { child, parent });
        }

        // Walk up from the parent; meeting the child means it is an ancestor.
        let mut ancestor = Some(parent);
        while let Some(current) = ancestor {
            if current == child {
                return Err(ProtocolError::CycleDetected { child, parent });
            }
            ancestor = self.get(current).and_then(|r| r.parent());
        }

        let resource = self.get_mut_or_err(child)?;
        if resource.role.is_some() {
            return Err(ProtocolError::SurfaceHasRole(child));
        }
        resource.role = Some(SurfaceRole::Subsurface(ChildRole {
            parent,
            position: PointF::zero(),
            pending_position: None,
        }));
        self.get_mut_or_err(parent)?.subsurfaces.push(child);
        debug!("Resource {:?} became a subsurface of {:?}", child, parent);

        if let Some(parent) = self.get(parent) {
            parent.events.new_subsurface.emit(&child);
        }
        Ok(())
    }

    /// `xdg_surface.get_popup`: makes `popup` a popup of `parent`, placed at
    /// `position` relative to the parent's window geometry.
    pub fn create_popup(&mut self, popup: ResourceId, parent: ResourceId, position: PointF) -> Result<(), ProtocolError> {
        if !self.contains(popup) {
            return Err(ProtocolError::BadSurface(popup));
        }
        if !self.contains(parent) {
            return Err(ProtocolError::BadParent(parent));
        }
        if popup == parent {
            return Err(ProtocolError::CycleDetected { child: popup, parent });
        }
        let resource = self.get_mut_or_err(popup)?;
        if resource.role.is_some() {
            return Err(ProtocolError::SurfaceHasRole(popup));
        }
        resource.role = Some(SurfaceRole::Popup(ChildRole {
            parent,
            position,
            pending_position: None,
        }));
        self.get_mut_or_err(parent)?.popups.push(popup);
        debug!("Resource {:?} became a popup of {:?}", popup, parent);

        if let Some(parent) = self.get(parent) {
            parent.events.new_popup.emit(&popup);
        }
        Ok(())
    }

    /// Attaches a buffer of the given pixel size, or detaches with `None`.
    pub fn attach_buffer(&mut self, id: ResourceId, size: Option<SizeF>) -> Result<(), ProtocolError> {
        let resource = self.get_mut_or_err(id)?;
        resource.pending.buffer_size = size;
        resource.pending_changes |= PendingChanges::BUFFER;
        Ok(())
    }

    pub fn set_buffer_scale(&mut self, id: ResourceId, scale: i32) -> Result<(), ProtocolError> {
        let resource = self.get_mut_or_err(id)?;
        resource.pending.scale = scale.max(1);
        resource.pending_changes |= PendingChanges::SCALE;
        Ok(())
    }

    pub fn set_buffer_transform(&mut self, id: ResourceId, transform: OutputTransform) -> Result<(), ProtocolError> {
        let resource = self.get_mut_or_err(id)?;
        resource.pending.transform = transform;
        resource.pending_changes |= PendingChanges::TRANSFORM;
        Ok(())
    }

    pub fn set_viewport(&mut self, id: ResourceId, viewport: Viewport) -> Result<(), ProtocolError> {
        let resource = self.get_mut_or_err(id)?;
        resource.pending.viewport = viewport;
        resource.pending_changes |= PendingChanges::VIEWPORT;
        Ok(())
    }

    /// `wl_surface.damage_buffer`, in buffer pixels.
    pub fn damage_buffer(&mut self, id: ResourceId, rect: RectF) -> Result<(), ProtocolError> {
        let resource = self.get_mut_or_err(id)?;
        resource.pending.buffer_damage.add(rect);
        resource.pending_changes |= PendingChanges::DAMAGE;
        Ok(())
    }

    pub fn set_input_region(&mut self, id: ResourceId, region: Option<Region>) -> Result<(), ProtocolError> {
        let resource = self.get_mut_or_err(id)?;
        resource.pending.input_region = region;
        resource.pending_changes |= PendingChanges::INPUT_REGION;
        Ok(())
    }

    pub fn set_window_geometry(&mut self, id: ResourceId, geometry: Option<RectF>) -> Result<(), ProtocolError> {
        let resource = self.get_mut_or_err(id)?;
        resource.pending.geometry = geometry;
        resource.pending_changes |= PendingChanges::GEOMETRY;
        Ok(())
    }

    /// `wl_subsurface.set_position`; applied on the parent's next commit.
    pub fn set_subsurface_position(&mut self, id: ResourceId, position: PointF) -> Result<(), ProtocolError> {
        let resource = self.get_mut_or_err(id)?;
        match &mut resource.role {
            Some(SurfaceRole::Subsurface(role)) => {
                role.pending_position = Some(position);
                Ok(())
            }
            _ => Err(ProtocolError::NotASubsurface(id)),
        }
    }

    /// Latches pending state, applies pending child subsurface positions and
    /// emits `commit`. Damage does not carry over between commits.
    pub fn commit(&mut self, id: ResourceId) -> Result<(), ProtocolError> {
        let resource = self.get_mut_or_err(id)?;
        let changes = std::mem::take(&mut resource.pending_changes);
        let pending = &mut resource.pending;
        let current = &mut resource.current;

        if changes.contains(PendingChanges::BUFFER) {
            current.buffer_size = pending.buffer_size;
        }
        if changes.contains(PendingChanges::SCALE) {
            current.scale = pending.scale;
        }
        if changes.contains(PendingChanges::TRANSFORM) {
            current.transform = pending.transform;
        }
        if changes.contains(PendingChanges::VIEWPORT) {
            current.viewport = pending.viewport;
        }
        if changes.contains(PendingChanges::INPUT_REGION) {
            current.input_region = pending.input_region.clone();
        }
        if changes.contains(PendingChanges::GEOMETRY) {
            current.geometry = pending.geometry;
        }
        current.buffer_damage = std::mem::take(&mut pending.buffer_damage);

        resource.initial_commit = !resource.committed_once;
        resource.committed_once = true;
        let children = resource.subsurfaces.clone();

        for child in children {
            if let Some(DrawableResource {
                role: Some(SurfaceRole::Subsurface(role)),
                ..
            }) = self.resources.get_mut(child)
            {
                if let Some(position) = role.pending_position.take() {
                    role.position = position;
                }
            }
        }

        trace!("Committed resource {:?} ({:?})", id, changes);
        if let Some(resource) = self.get(id) {
            resource.events.commit.emit(&id);
        }
        Ok(())
    }

    /// Maps the resource. Mapping an already mapped resource does nothing.
    pub fn map(&mut self, id: ResourceId) -> Result<(), ProtocolError> {
        let resource = self.get_mut_or_err(id)?;
        if resource.mapped {
            return Ok(());
        }
        resource.mapped = true;
        if let Some(resource) = self.get(id) {
            resource.events.map.emit(&id);
        }
        Ok(())
    }

    /// Unmaps the resource. Unmapping an unmapped resource does nothing.
    pub fn unmap(&mut self, id: ResourceId) -> Result<(), ProtocolError> {
        let resource = self.get_mut_or_err(id)?;
        if !resource.mapped {
            return Ok(());
        }
        resource.mapped = false;
        if let Some(resource) = self.get(id) {
            resource.events.unmap.emit(&id);
        }
        Ok(())
    }

    /// Emits `destroy`, detaches the resource from its parent and frees it.
    /// Children keep their (now stale) parent id.
    pub fn destroy(&mut self, id: ResourceId) -> Result<(), ProtocolError> {
        let resource = self.resources.get(id).ok_or(ProtocolError::BadSurface(id))?;
        resource.events.destroy.emit(&id);

        let parent = resource.parent();
        if let Some(parent) = parent.and_then(|p| self.resources.get_mut(p)) {
            parent.subsurfaces.retain(|child| *child != id);
            parent.popups.retain(|child| *child != id);
        }
        self.resources.remove(id);
        debug!("Destroyed resource {:?}", id);
        Ok(())
    }

    /// `xdg_popup.reposition`: stores the requested position and emits
    /// `reposition_requested`. The position takes effect in [`ResourceStore::apply_positioning`].
    pub fn reposition(&mut self, id: ResourceId, position: PointF) -> Result<(), ProtocolError> {
        let resource = self.get_mut_or_err(id)?;
        match &mut resource.role {
            Some(SurfaceRole::Popup(role)) => role.pending_position = Some(position),
            _ => return Err(ProtocolError::NotAPopup(id)),
        }
        if let Some(resource) = self.get(id) {
            resource.events.reposition_requested.emit(&id);
        }
        Ok(())
    }

    /// Resolves the popup's placement so that it fits inside `bounds`, given
    /// relative to the parent's geometry origin, by sliding it along each axis.
    /// Emits `repositioned`.
    pub fn apply_positioning(&mut self, id: ResourceId, bounds: RectF) -> Result<(), ProtocolError> {
        let resource = self.get_mut_or_err(id)?;
        let size = resource.current.geometry_or_surface().size;
        let role = match &mut resource.role {
            Some(SurfaceRole::Popup(role)) => role,
            _ => return Err(ProtocolError::NotAPopup(id)),
        };

        let wanted = role.pending_position.take().unwrap_or(role.position);
        role.position = PointF::new(
            slide(wanted.x, size.width, bounds.x(), bounds.right()),
            slide(wanted.y, size.height, bounds.y(), bounds.bottom()),
        );
        debug!("Popup {:?} positioned at {:?}", id, role.position);

        if let Some(resource) = self.get(id) {
            resource.events.repositioned.emit(&id);
        }
        Ok(())
    }

    /// Sends a configure, which also answers the initial commit.
    pub fn schedule_configure(&mut self, id: ResourceId) -> Result<u32, ProtocolError> {
        let resource = self.get_mut_or_err(id)?;
        resource.initial_commit = false;
        resource.configure_serial = resource.configure_serial.wrapping_add(1);
        Ok(resource.configure_serial)
    }

    /// Tells the client which buffer scale and transform suit its output.
    pub fn send_preferred_scale(
        &mut self,
        id: ResourceId,
        scale: f64,
        transform: OutputTransform,
    ) -> Result<(), ProtocolError> {
        self.get_mut_or_err(id)?.preferred = Some((scale, transform));
        Ok(())
    }

    pub(crate) fn set_owner(&mut self, id: ResourceId, owner: Option<SurfaceId>) {
        if let Some(resource) = self.resources.get_mut(id) {
            resource.owner = owner;
        }
    }
}

/// Clamps a span of `length` starting at `start` into `[low, high)`, aligning it
/// to `low` when it does not fit.
fn slide(start: f64, length: f64, low: f64, high: f64) -> f64 {
    if length >= high - low {
        return low;
    }
    start.max(low).min(high - length)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn buffer(width: f64, height: f64) -> Option<SizeF> {
        Some(SizeF::new(width, height))
    }

    #[test]
    fn test_commit_latches_pending_state() {
        let mut store = ResourceStore::new();
        let id = store.create_surface();
        store.attach_buffer(id, buffer(200.0, 100.0)).unwrap();
        store.set_buffer_scale(id, 2).unwrap();

        assert_eq!(store.get(id).unwrap().current().size(), SizeF::zero());
        store.commit(id).unwrap();

        let resource = store.get(id).unwrap();
        assert_eq!(resource.current().size(), SizeF::new(100.0, 50.0));
        assert!(resource.initial_commit());
        assert!(resource.pending_changes().is_empty());
    }

    #[test]
    fn test_damage_is_per_commit() {
        let mut store = ResourceStore::new();
        let id = store.create_surface();
        store.damage_buffer(id, RectF::from_coords(0.0, 0.0, 10.0, 10.0)).unwrap();
        store.commit(id).unwrap();
        assert!(!store.get(id).unwrap().current().buffer_damage.is_empty());

        store.commit(id).unwrap();
        assert!(store.get(id).unwrap().current().buffer_damage.is_empty());
        assert!(!store.get(id).unwrap().initial_commit());
    }

    #[test]
    fn test_subsurface_position_applies_on_parent_commit() {
        let mut store = ResourceStore::new();
        let parent = store.create_surface();
        let child = store.create_surface();
        store.create_subsurface(child, parent).unwrap();
        store.set_subsurface_position(child, PointF::new(10.0, 20.0)).unwrap();

        store.commit(child).unwrap();
        assert_eq!(store.get(child).unwrap().position(), Some(PointF::zero()));

        store.commit(parent).unwrap();
        assert_eq!(store.get(child).unwrap().position(), Some(PointF::new(10.0, 20.0)));
    }

    #[test]
    fn test_create_subsurface_rejects_cycles_and_roles() {
        let mut store = ResourceStore::new();
        let a = store.create_surface();
        let b = store.create_surface();
        let c = store.create_surface();
        store.create_subsurface(b, a).unwrap();

        assert_eq!(
            store.create_subsurface(a, b),
            Err(ProtocolError::CycleDetected { child: a, parent: b })
        );
        assert_eq!(store.create_subsurface(b, c), Err(ProtocolError::SurfaceHasRole(b)));
        assert_eq!(
            store.create_subsurface(c, c),
            Err(ProtocolError::CycleDetected { child: c, parent: c })
        );
    }

    #[test]
    fn test_new_subsurface_event_carries_child() {
        let mut store = ResourceStore::new();
        let parent = store.create_surface();
        let child = store.create_surface();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let s = seen.clone();
        let _sub = store
            .get(parent)
            .unwrap()
            .events()
            .new_subsurface
            .subscribe(move |id| s.borrow_mut().push(*id));

        store.create_subsurface(child, parent).unwrap();
        assert_eq!(*seen.borrow(), vec![child]);
        assert_eq!(store.get(parent).unwrap().subsurfaces(), &[child]);
    }

    #[test]
    fn test_map_and_unmap_are_idempotent() {
        let mut store = ResourceStore::new();
        let id = store.create_surface();
        let count = Rc::new(RefCell::new(0));
        let c = count.clone();
        let _sub = store.get(id).unwrap().events().map.subscribe(move |_| *c.borrow_mut() += 1);

        store.map(id).unwrap();
        store.map(id).unwrap();
        store.unmap(id).unwrap();
        store.unmap(id).unwrap();
        assert_eq!(*count.borrow(), 1);
    }

    #[test]
    fn test_destroy_detaches_from_parent() {
        let mut store = ResourceStore::new();
        let parent = store.create_surface();
        let popup = store.create_surface();
        store.create_popup(popup, parent, PointF::new(5.0, 5.0)).unwrap();
        store.destroy(popup).unwrap();

        assert!(!store.contains(popup));
        assert!(store.get(parent).unwrap().popups().is_empty());
        assert_eq!(store.destroy(popup), Err(ProtocolError::BadSurface(popup)));
    }

    #[test]
    fn test_apply_positioning_slides_into_bounds() {
        let mut store = ResourceStore::new();
        let parent = store.create_surface();
        let popup = store.create_surface();
        store.create_popup(popup, parent, PointF::zero()).unwrap();
        store.attach_buffer(popup, buffer(100.0, 50.0)).unwrap();
        store.commit(popup).unwrap();

        store.reposition(popup, PointF::new(950.0, -20.0)).unwrap();
        store
            .apply_positioning(popup, RectF::from_coords(0.0, 0.0, 1000.0, 800.0))
            .unwrap();
        assert_eq!(store.get(popup).unwrap().position(), Some(PointF::new(900.0, 0.0)));
    }

    #[test]
    fn test_schedule_configure_clears_initial_commit() {
        let mut store = ResourceStore::new();
        let id = store.create_surface();
        store.commit(id).unwrap();
        assert!(store.get(id).unwrap().initial_commit());
        assert_eq!(store.schedule_configure(id).unwrap(), 1);
        assert!(!store.get(id).unwrap().initial_commit());
    }
}
