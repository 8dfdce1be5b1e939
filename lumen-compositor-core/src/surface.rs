//! Compositor-side wrapper around one drawable resource.
//!
//! A [`Surface`] is either anonymous (cursor images, drag icons) or bound to
//! exactly one view. It turns the resource's buffer-space damage into logical
//! damage and knows how to center a buffer that is smaller than the space its
//! window wants to fill.

use lumen_core::types::{PointF, RectF, SizeF};
use tracing::{debug, trace};

use crate::arena::Key;
use crate::protocol::{ResourceId, SurfaceAttributes};
use crate::region::Region;
use crate::scene::{Scene, Work};
use crate::signal::{Signal, Subscription};
use crate::subsurface::SubsurfaceId;
use crate::view::ViewId;
use crate::window::Window;

pub type SurfaceId = Key<Surface>;

/// Handle of a pointer constraint (lock or confine) attached to a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct ConstraintId(pub u64);

#[derive(Debug, Default)]
pub struct SurfaceEvents {
    /// Fired once when the surface loses its resource.
    pub destroy: Signal<SurfaceId>,
}

#[derive(Debug)]
pub struct Surface {
    resource: Option<ResourceId>,
    view: Option<ViewId>,
    constraint: Option<ConstraintId>,
    fill_ignore_small: bool,
    inert: bool,
    destroy_listener: Option<Subscription>,
    events: SurfaceEvents,
}

impl Surface {
    fn new() -> Self {
        Self {
            resource: None,
            view: None,
            constraint: None,
            fill_ignore_small: false,
            inert: true,
            destroy_listener: None,
            events: SurfaceEvents::default(),
        }
    }
}

impl Scene {
    /// Creates an unbound surface.
    pub fn create_surface(&mut self) -> SurfaceId {
        self.surfaces.insert(Surface::new())
    }

    /// Binds `resource` to an anonymous surface.
    ///
    /// # Panics
    ///
    /// If the surface is already bound, or the resource is missing or already
    /// claimed by another surface.
    pub fn assign_surface(&mut self, id: SurfaceId, resource: ResourceId) {
        self.bind_surface(id, resource, None);
    }

    /// Binds `resource` to a surface owned by `view`.
    ///
    /// # Panics
    ///
    /// Same conditions as [`Scene::assign_surface`].
    pub fn assign_surface_to_view(&mut self, id: SurfaceId, resource: ResourceId, view: ViewId) {
        self.bind_surface(id, resource, Some(view));
    }

    fn bind_surface(&mut self, id: SurfaceId, resource: ResourceId, view: Option<ViewId>) {
        let res = match self.resources.get(resource) {
            Some(res) => res,
            None => panic!("cannot bind surface {:?} to missing resource {:?}", id, resource),
        };
        assert!(
            res.owner().is_none(),
            "attempted to duplicate surface ownership of {:?} (already claimed by {:?})",
            resource,
            res.owner()
        );
        let listener = self
            .work
            .forward(&res.events().destroy, move |_| Work::SurfaceDestroyed(id));

        let surface = match self.surfaces.get_mut(id) {
            Some(surface) => surface,
            None => panic!("cannot bind stale surface {:?}", id),
        };
        assert!(
            surface.resource.is_none(),
            "surface {:?} is already bound to {:?}",
            id,
            surface.resource
        );
        surface.resource = Some(resource);
        surface.view = view;
        surface.inert = false;
        surface.destroy_listener = Some(listener);
        self.resources.set_owner(resource, Some(id));
        trace!("Surface {:?} bound to {:?} (view {:?})", id, resource, view);
    }

    /// Severs the binding. Equivalent to destroying the surface.
    pub fn unassign_surface(&mut self, id: SurfaceId) {
        self.destroy_surface(id);
    }

    /// Idempotent teardown: fires the destroy signal, drops the constraint and
    /// the resource claim, detaches the view and clears the cursor cache.
    pub(crate) fn destroy_surface(&mut self, id: SurfaceId) {
        let Some(surface) = self.surfaces.get(id) else {
            return;
        };
        if surface.inert && surface.resource.is_none() {
            return;
        }
        surface.events.destroy.emit(&id);

        let Some(surface) = self.surfaces.get_mut(id) else {
            return;
        };
        surface.constraint = None;
        surface.destroy_listener = None;
        surface.view = None;
        surface.inert = true;
        let resource = surface.resource.take();

        if let Some(resource) = resource {
            if self.resources.get(resource).and_then(|r| r.owner()) == Some(id) {
                self.resources.set_owner(resource, None);
            }
        }
        if self.cursor.last_surface == Some(id) {
            self.cursor.last_surface = None;
        }
        debug!("Surface {:?} destroyed (resource {:?})", id, resource);
    }

    /// Destroys the surface and frees its slot.
    pub fn remove_surface(&mut self, id: SurfaceId) {
        self.destroy_surface(id);
        self.surfaces.remove(id);
    }

    pub fn surface(&self, id: SurfaceId) -> Option<SurfaceRef<'_>> {
        self.surfaces.get(id).map(|surface| SurfaceRef {
            scene: self,
            id,
            surface,
        })
    }

    /// The surface currently claiming `resource`.
    pub fn surface_from_resource(&self, resource: ResourceId) -> Option<SurfaceId> {
        self.resources
            .get(resource)
            .and_then(|r| r.owner())
            .filter(|id| self.surfaces.contains(*id))
    }

    pub fn surface_events(&self, id: SurfaceId) -> Option<&SurfaceEvents> {
        self.surfaces.get(id).map(|s| &s.events)
    }

    /// Attaches (or with `None` detaches) a pointer constraint.
    pub fn append_constraint(&mut self, id: SurfaceId, constraint: Option<ConstraintId>) {
        if let Some(surface) = self.surfaces.get_mut(id) {
            surface.constraint = constraint;
        }
    }

    /// Opts the surface out of small-buffer centering.
    pub fn set_fill_ignore_small(&mut self, id: SurfaceId, ignore: bool) {
        if let Some(surface) = self.surfaces.get_mut(id) {
            surface.fill_ignore_small = ignore;
        }
    }

    /// Records the surface the cursor was last over.
    pub fn set_cursor_surface(&mut self, id: Option<SurfaceId>) {
        self.cursor.last_surface = id;
    }

    pub fn cursor_surface(&self) -> Option<SurfaceId> {
        self.cursor.last_surface
    }

    /// Reports the surface's committed damage, placed at `origin` and optionally
    /// scaled around it.
    pub(crate) fn damage_surface(&mut self, id: SurfaceId, origin: PointF, scale: f64) {
        let Some(surface) = self.surface(id) else {
            return;
        };
        let mut damage = surface.compute_damage();
        if damage.is_empty() {
            return;
        }
        if scale != 1.0 {
            damage.scale(scale, scale);
        }
        damage.translate(origin);
        if self.config.log_damage {
            trace!("Damage from surface {:?}: {:?}", id, damage.rects());
        }
        self.damage.damage_region(&damage);
    }
}

/// Read-only view of a [`Surface`] with access to the rest of the scene.
#[derive(Clone, Copy)]
pub struct SurfaceRef<'a> {
    scene: &'a Scene,
    id: SurfaceId,
    surface: &'a Surface,
}

impl<'a> SurfaceRef<'a> {
    pub fn id(&self) -> SurfaceId {
        self.id
    }

    /// The bound resource, if it still exists.
    pub fn resource(&self) -> Option<ResourceId> {
        self.surface
            .resource
            .filter(|r| self.scene.resources.contains(*r))
    }

    pub fn exists(&self) -> bool {
        self.resource().is_some()
    }

    pub fn view(&self) -> Option<ViewId> {
        self.surface.view
    }

    pub fn inert(&self) -> bool {
        self.surface.inert
    }

    pub fn constraint(&self) -> Option<ConstraintId> {
        self.surface.constraint
    }

    pub fn fill_ignore_small(&self) -> bool {
        self.surface.fill_ignore_small
    }

    /// Current state of the bound resource.
    pub fn current(&self) -> Option<&'a SurfaceAttributes> {
        let scene: &'a Scene = self.scene;
        self.surface
            .resource
            .and_then(|r| scene.resources.get(r))
            .map(|r| r.current())
    }

    fn window(&self) -> Option<&'a Window> {
        let scene: &'a Scene = self.scene;
        match self.surface.view {
            Some(ViewId::Window(window)) => scene.windows.get(window),
            _ => None,
        }
    }

    /// True when the owning window asked for noticeably more space than the
    /// committed buffer covers.
    pub fn small(&self) -> bool {
        let Some(window) = self.window() else {
            return false;
        };
        if !window.is_drawn(self.scene) {
            return false;
        }
        let Some(current) = self.current().filter(|c| c.has_buffer()) else {
            return false;
        };
        let size = current.size();
        let reported = window.reported_size;
        reported.width > size.width + 1.0 || reported.height > size.height + 1.0
    }

    /// Viewport destination if set, else the transformed buffer size.
    pub fn viewporter_corrected_size(&self) -> SizeF {
        let Some(current) = self.current().filter(|c| c.has_buffer()) else {
            return SizeF::zero();
        };
        current
            .viewport
            .destination
            .unwrap_or_else(|| current.transformed_buffer_size())
    }

    /// Offset that centers a small buffer inside its window, in logical space.
    pub fn correct_small_vec(&self) -> PointF {
        let Some(window) = self.window() else {
            return PointF::zero();
        };
        if self.surface.fill_ignore_small || !self.small() {
            return PointF::zero();
        }
        let corrected = self.viewporter_corrected_size();
        let reported = window.reported_size;
        let centering = PointF::new(
            (reported.width - corrected.width) / 2.0,
            (reported.height - corrected.height) / 2.0,
        )
        .max(0.0);
        let (sx, sy) = window.reported_to_logical();
        centering.scaled(sx, sy)
    }

    /// The same centering, in buffer space.
    pub fn correct_small_vec_buf(&self) -> PointF {
        if self.surface.fill_ignore_small || !self.small() {
            return PointF::zero();
        }
        let Some(current) = self.current().filter(|c| c.has_buffer()) else {
            return PointF::zero();
        };
        let buffer = current.transformed_buffer_size();
        let corrected = self.viewporter_corrected_size();
        PointF::new(
            (buffer.width - corrected.width) / 2.0,
            (buffer.height - corrected.height) / 2.0,
        )
        .max(0.0)
    }

    /// Converts the committed buffer damage into surface-local logical damage.
    ///
    /// The viewport crop must happen in buffer space before any rescaling, or
    /// cropped and scaled clients get misplaced damage.
    pub fn compute_damage(&self) -> Region {
        let Some(current) = self.current() else {
            return Region::new();
        };
        let Some(buffer) = current.buffer_size else {
            return Region::new();
        };
        let transformed = current.transformed_buffer_size();
        if transformed.is_empty() {
            return Region::new();
        }
        let scale = f64::from(current.scale.max(1));

        let mut damage = current.buffer_damage.clone();
        damage.transform(current.transform, buffer.width, buffer.height);

        let extent = match current.viewport.source {
            Some(source) => {
                let source_px = source.scaled(scale, scale);
                damage.intersect_rect(source_px).translate(-source_px.origin);
                source_px.size
            }
            None => transformed,
        };
        if !extent.is_empty() {
            damage.scale(transformed.width / extent.width, transformed.height / extent.height);
        }

        damage.translate(self.correct_small_vec_buf());

        match self.surface_box_global() {
            Some(surface_box) => {
                damage
                    .scale(
                        surface_box.width() / transformed.width,
                        surface_box.height() / transformed.height,
                    )
                    .intersect_rect(RectF::from_size(surface_box.size));
            }
            None => {
                damage.scale(1.0 / scale, 1.0 / scale);
            }
        }
        damage
    }

    /// Where the owning view places this surface, in global logical coordinates.
    pub fn surface_box_global(&self) -> Option<RectF> {
        let scene = self.scene;
        match self.surface.view? {
            ViewId::Window(window) => scene.windows.get(window)?.content_box(scene),
            ViewId::Subsurface(node) => subsurface_box(scene, node),
            ViewId::Popup(node) => {
                let popup = scene.popups.get(node)?;
                Some(RectF::new(popup.coords_global(scene), popup.size()))
            }
            ViewId::Layer(layer) => Some(scene.layers.get(layer)?.geometry),
            ViewId::LockScreen(lock) => scene.lock_box(lock),
        }
    }

    /// Anonymous surfaces are always visible.
    pub fn visible(&self) -> bool {
        match self.surface.view {
            Some(view) => self.scene.view(view).map_or(false, |v| v.visible(self.scene)),
            None => true,
        }
    }

    pub fn keyboard_focusable(&self) -> bool {
        match self.surface.view {
            Some(view) => self
                .scene
                .view(view)
                .map_or(false, |v| v.keyboard_focusable(self.scene)),
            None => false,
        }
    }
}

fn subsurface_box(scene: &Scene, node: SubsurfaceId) -> Option<RectF> {
    let node = scene.subsurfaces.get(node)?;
    Some(RectF::new(node.coords_global(scene), node.size(scene)))
}
