//! Sub-surface trees.
//!
//! Every window and every popup owns one tree. Its root is a dummy node that
//! listens for new sub-surfaces on the owner's resource; every other node
//! mirrors one sub-surface resource and forwards its damage in global
//! coordinates.

use lumen_core::types::{PointF, RectF, SizeF};
use tracing::debug;

use crate::arena::Key;
use crate::context::SiblingDamagePolicy;
use crate::popup::PopupId;
use crate::protocol::ResourceId;
use crate::scene::{NodeEvent, Scene, Work};
use crate::signal::Subscription;
use crate::surface::SurfaceId;
use crate::view::{View, ViewId, ViewType};
use crate::window::WindowId;

pub type SubsurfaceId = Key<SubsurfaceNode>;

/// The view a sub-surface tree hangs off.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SubsurfaceOwner {
    Window(WindowId),
    Popup(PopupId),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SubsurfaceLink {
    /// Dummy head of a tree, bound to no resource of its own.
    Root,
    Child {
        parent: SubsurfaceId,
        resource: ResourceId,
        surface: SurfaceId,
    },
}

#[derive(Debug)]
pub struct SubsurfaceNode {
    owner: SubsurfaceOwner,
    link: SubsurfaceLink,
    children: Vec<SubsurfaceId>,
    last_size: SizeF,
    last_position: PointF,
    inert: bool,
    listeners: Vec<Subscription>,
}

impl SubsurfaceNode {
    fn new(owner: SubsurfaceOwner, link: SubsurfaceLink) -> Self {
        Self {
            owner,
            link,
            children: Vec::new(),
            last_size: SizeF::zero(),
            last_position: PointF::zero(),
            inert: false,
            listeners: Vec::new(),
        }
    }

    pub fn owner(&self) -> SubsurfaceOwner {
        self.owner
    }

    pub fn link(&self) -> SubsurfaceLink {
        self.link
    }

    pub fn is_root(&self) -> bool {
        self.link == SubsurfaceLink::Root
    }

    pub fn children(&self) -> &[SubsurfaceId] {
        &self.children
    }

    /// Set once the resource is gone; an inert node ignores every event.
    pub fn inert(&self) -> bool {
        self.inert
    }

    /// Size seen at the last handled commit or map.
    pub fn last_size(&self) -> SizeF {
        self.last_size
    }

    pub fn last_position(&self) -> PointF {
        self.last_position
    }

    fn resource(&self) -> Option<ResourceId> {
        match self.link {
            SubsurfaceLink::Child { resource, .. } => Some(resource),
            SubsurfaceLink::Root => None,
        }
    }

    /// Position relative to the parent surface; zero for a root.
    pub fn coords_relative_to_parent(&self, scene: &Scene) -> PointF {
        match self.link {
            SubsurfaceLink::Root => PointF::zero(),
            SubsurfaceLink::Child { resource, .. } => scene
                .resources
                .get(resource)
                .and_then(|r| r.position())
                .unwrap_or(self.last_position),
        }
    }

    /// Global logical position: the offsets of every ancestor plus the
    /// owner's origin.
    pub fn coords_global(&self, scene: &Scene) -> PointF {
        let mut position = self.coords_relative_to_parent(scene);
        let mut link = self.link;
        while let SubsurfaceLink::Child { parent, .. } = link {
            let Some(parent) = scene.subsurfaces.get(parent) else {
                break;
            };
            position = position + parent.coords_relative_to_parent(scene);
            link = parent.link;
        }
        position + owner_origin(scene, self.owner)
    }

    /// Current logical size of the resource; zero for a root.
    pub fn size(&self, scene: &Scene) -> SizeF {
        match self.link {
            SubsurfaceLink::Root => SizeF::zero(),
            SubsurfaceLink::Child { resource, .. } => scene
                .resources
                .get(resource)
                .map_or(self.last_size, |r| r.current().size()),
        }
    }
}

impl View for SubsurfaceNode {
    fn view_type(&self) -> ViewType {
        ViewType::Subsurface
    }

    fn surface(&self) -> Option<SurfaceId> {
        match self.link {
            SubsurfaceLink::Child { surface, .. } => Some(surface),
            SubsurfaceLink::Root => None,
        }
    }

    /// Visible while the parent node is, or, under a root, while the owner is drawn.
    fn visible(&self, scene: &Scene) -> bool {
        if let SubsurfaceLink::Child { parent, .. } = self.link {
            if let Some(parent) = scene.subsurfaces.get(parent).filter(|p| !p.is_root()) {
                return parent.alive_and_visible(scene);
            }
        }
        owner_drawn(scene, self.owner)
    }

    fn logical_box(&self, scene: &Scene) -> Option<RectF> {
        self.alive_and_visible(scene)
            .then(|| RectF::new(self.coords_global(scene), self.size(scene)))
    }
}

fn owner_origin(scene: &Scene, owner: SubsurfaceOwner) -> PointF {
    match owner {
        SubsurfaceOwner::Window(window) => scene
            .windows
            .get(window)
            .map_or(PointF::zero(), |w| w.real_position),
        SubsurfaceOwner::Popup(popup) => scene
            .popups
            .get(popup)
            .map_or(PointF::zero(), |p| p.coords_global(scene)),
    }
}

fn owner_drawn(scene: &Scene, owner: SubsurfaceOwner) -> bool {
    match owner {
        SubsurfaceOwner::Window(window) => scene.windows.get(window).map_or(false, |w| w.is_drawn(scene)),
        SubsurfaceOwner::Popup(popup) => scene.popups.get(popup).map_or(false, |p| p.alive_and_visible(scene)),
    }
}

impl Scene {
    pub fn subsurface(&self, id: SubsurfaceId) -> Option<&SubsurfaceNode> {
        self.subsurfaces.get(id)
    }

    /// The node's resource, if it has one and it still exists.
    pub fn subsurface_resource(&self, id: SubsurfaceId) -> Option<ResourceId> {
        self.subsurfaces
            .get(id)?
            .resource()
            .filter(|r| self.resources.contains(*r))
    }

    pub fn subsurface_coords_global(&self, id: SubsurfaceId) -> Option<PointF> {
        self.subsurfaces.get(id).map(|node| node.coords_global(self))
    }

    pub fn subsurface_children(&self, id: SubsurfaceId) -> &[SubsurfaceId] {
        self.subsurfaces.get(id).map_or(&[], |node| node.children())
    }

    /// Creates the dummy root for `owner` and adopts sub-surfaces its resource
    /// already has.
    ///
    /// # Panics
    ///
    /// If `owner` is a stale handle.
    pub(crate) fn create_subsurface_root(&mut self, owner: SubsurfaceOwner) -> SubsurfaceId {
        let surface = match owner {
            SubsurfaceOwner::Window(window) => self.windows.get(window).map(|w| Some(w.surface_id())),
            SubsurfaceOwner::Popup(popup) => self.popups.get(popup).map(|p| p.surface()),
        };
        let surface = match surface {
            Some(surface) => surface,
            None => panic!("sub-surface root requested for stale owner {:?}", owner),
        };
        let resource = surface.and_then(|s| self.surface(s)).and_then(|s| s.resource());

        let id = self.subsurfaces.insert(SubsurfaceNode::new(owner, SubsurfaceLink::Root));
        if let Some(resource) = resource {
            self.listen_for_subsurfaces(id, resource);
            self.adopt_existing_subsurfaces(id, resource);
        }
        debug!("Created sub-surface root {:?} for {:?}", id, owner);
        id
    }

    fn listen_for_subsurfaces(&mut self, node: SubsurfaceId, resource: ResourceId) {
        let Some(res) = self.resources.get(resource) else {
            return;
        };
        let listener = self.work.forward(&res.events().new_subsurface, move |child| {
            Work::Subsurface(node, NodeEvent::NewChild(*child))
        });
        if let Some(node) = self.subsurfaces.get_mut(node) {
            node.listeners.push(listener);
        }
    }

    fn adopt_existing_subsurfaces(&mut self, parent: SubsurfaceId, resource: ResourceId) {
        let children = self
            .resources
            .get(resource)
            .map(|r| r.subsurfaces().to_vec())
            .unwrap_or_default();
        for child in children {
            if self.resources.get(child).map_or(false, |r| r.owner().is_none()) {
                self.create_subsurface_child(parent, child);
            }
        }
    }

    pub(crate) fn on_new_subsurface(&mut self, parent: SubsurfaceId, resource: ResourceId) {
        if self.subsurfaces.get(parent).map_or(true, |p| p.inert) {
            return;
        }
        if self.resources.get(resource).map_or(true, |r| r.owner().is_some()) {
            return;
        }
        self.create_subsurface_child(parent, resource);
    }

    fn create_subsurface_child(&mut self, parent: SubsurfaceId, resource: ResourceId) -> Option<SubsurfaceId> {
        let owner = self.subsurfaces.get(parent)?.owner;
        if !self.resources.contains(resource) {
            return None;
        }

        let surface = self.create_surface();
        let id = self.subsurfaces.insert(SubsurfaceNode::new(
            owner,
            SubsurfaceLink::Child {
                parent,
                resource,
                surface,
            },
        ));
        self.assign_surface_to_view(surface, resource, ViewId::Subsurface(id));

        let events = self.resources.get(resource)?.events();
        let listeners = vec![
            self.work
                .forward(&events.commit, move |_| Work::Subsurface(id, NodeEvent::Commit)),
            self.work.forward(&events.map, move |_| Work::Subsurface(id, NodeEvent::Map)),
            self.work
                .forward(&events.unmap, move |_| Work::Subsurface(id, NodeEvent::Unmap)),
            self.work
                .forward(&events.destroy, move |_| Work::Subsurface(id, NodeEvent::Destroy)),
            self.work.forward(&events.new_subsurface, move |child| {
                Work::Subsurface(id, NodeEvent::NewChild(*child))
            }),
        ];

        let node = self.subsurfaces.get(id)?;
        let (size, position) = (node.size(self), node.coords_relative_to_parent(self));
        if let Some(node) = self.subsurfaces.get_mut(id) {
            node.listeners = listeners;
            node.last_size = size;
            node.last_position = position;
        }
        if let Some(parent) = self.subsurfaces.get_mut(parent) {
            parent.children.push(id);
        }
        debug!("New sub-surface {:?} under {:?} for {:?}", id, parent, resource);

        self.adopt_existing_subsurfaces(id, resource);
        Some(id)
    }

    pub(crate) fn on_subsurface_commit(&mut self, id: SubsurfaceId) {
        let Some(node) = self.subsurfaces.get(id) else {
            return;
        };
        let SubsurfaceLink::Child { resource, surface, .. } = node.link else {
            return;
        };
        if node.inert || !self.resources.contains(resource) {
            return;
        }
        let owner = node.owner;
        let size = node.size(self);
        let position = node.coords_relative_to_parent(self);

        if !owner_drawn(self, owner) {
            if self.config.log_damage {
                debug!("Refusing damage from sub-surface {:?}: {:?} is not drawn", id, owner);
            }
            if let Some(node) = self.subsurfaces.get_mut(id) {
                node.last_size = size;
                node.last_position = position;
            }
            return;
        }

        let coords = node.coords_global(self);
        let (last_size, last_position) = (node.last_size, node.last_position);

        self.damage_surface(surface, coords, 1.0);

        // The owner's popups may sit on top of this sub-surface.
        match owner {
            SubsurfaceOwner::Popup(popup) => {
                if self.popups.get(popup).map_or(false, |p| !p.inert()) {
                    self.recheck_popup_tree(popup);
                }
            }
            SubsurfaceOwner::Window(window) => {
                if let Some(root) = self.windows.get(window).and_then(|w| w.popup_root()) {
                    self.recheck_popup_tree(root);
                }
            }
        }

        if !self.subsurfaces.contains(id) {
            return;
        }
        if self.config.sibling_damage == SiblingDamagePolicy::DamageSiblings {
            self.damage_subsurface_siblings(id);
        }

        if size != last_size || position != last_position {
            let previous = RectF::new(coords - position + last_position, last_size);
            self.push_damage(previous);
            if let Some(node) = self.subsurfaces.get_mut(id) {
                node.last_size = size;
                node.last_position = position;
            }
            self.push_damage(RectF::new(coords, size));
        }
    }

    /// Re-reports the damage of the other sub-surfaces under the same parent.
    fn damage_subsurface_siblings(&mut self, id: SubsurfaceId) {
        let Some(node) = self.subsurfaces.get(id) else {
            return;
        };
        let SubsurfaceLink::Child { parent, .. } = node.link else {
            return;
        };
        let scale = match node.owner {
            SubsurfaceOwner::Window(window) => self
                .windows
                .get(window)
                .filter(|w| w.is_x11)
                .map_or(1.0, |w| 1.0 / w.x11_surface_scaled_by),
            SubsurfaceOwner::Popup(_) => 1.0,
        };

        let siblings: Vec<SubsurfaceId> = self
            .subsurface_children(parent)
            .iter()
            .copied()
            .filter(|sibling| *sibling != id)
            .collect();
        for sibling in siblings {
            let Some(node) = self.subsurfaces.get(sibling) else {
                continue;
            };
            if let SubsurfaceLink::Child { surface, .. } = node.link {
                let coords = node.coords_global(self);
                self.damage_surface(surface, coords, scale);
            }
        }
    }

    /// Re-reports the damage of every direct child of `id`.
    pub fn recheck_damage_for_subsurfaces(&mut self, id: SubsurfaceId) {
        let children = self.subsurface_children(id).to_vec();
        for child in children {
            let Some(node) = self.subsurfaces.get(child) else {
                continue;
            };
            if let SubsurfaceLink::Child { surface, .. } = node.link {
                let coords = node.coords_global(self);
                self.damage_surface(surface, coords, 1.0);
            }
        }
    }

    pub(crate) fn on_subsurface_map(&mut self, id: SubsurfaceId) {
        let Some(node) = self.subsurfaces.get(id) else {
            return;
        };
        let SubsurfaceLink::Child { resource, .. } = node.link else {
            return;
        };
        if node.inert {
            return;
        }
        let (owner, size, position, coords) = (
            node.owner,
            node.size(self),
            node.coords_relative_to_parent(self),
            node.coords_global(self),
        );
        if let Some(node) = self.subsurfaces.get_mut(id) {
            node.last_size = size;
            node.last_position = position;
        }

        let margin = self.config.map_damage_margin;
        self.push_damage(RectF::new(coords, size).expanded(margin));

        match owner {
            SubsurfaceOwner::Window(window) => self.update_window_scale_transform(window),
            SubsurfaceOwner::Popup(_) => {
                let Some(monitor) = self.monitor_at(coords).and_then(|m| self.monitors.get(m)) else {
                    return;
                };
                let (scale, transform) = (monitor.scale, monitor.transform);
                if let Err(e) = self.resources.send_preferred_scale(resource, scale, transform) {
                    debug!("Skipping preferred scale for {:?}: {}", resource, e);
                }
            }
        }
    }

    pub(crate) fn on_subsurface_unmap(&mut self, id: SubsurfaceId) {
        let Some(node) = self.subsurfaces.get(id) else {
            return;
        };
        let SubsurfaceLink::Child { resource, .. } = node.link else {
            return;
        };
        if node.inert {
            return;
        }
        let area = RectF::new(node.coords_global(self), node.last_size);
        let margin = self.config.map_damage_margin;
        self.push_damage(area.expanded(margin));

        if self.input.pointer_focus() == Some(resource) {
            self.input.release_all_buttons();
        }
        self.input.refocus_pointer();
    }

    /// The resource is going away: stop listening, free the children and
    /// detach from the parent.
    pub(crate) fn destroy_subsurface_node(&mut self, id: SubsurfaceId) {
        let Some(node) = self.subsurfaces.get_mut(id) else {
            return;
        };
        node.inert = true;
        node.listeners.clear();
        let children = std::mem::take(&mut node.children);
        let link = node.link;

        for child in children {
            self.free_subsurface_subtree(child);
        }
        if let SubsurfaceLink::Child { parent, .. } = link {
            if let Some(parent) = self.subsurfaces.get_mut(parent) {
                parent.children.retain(|c| *c != id);
            }
            self.free_subsurface_subtree(id);
        }
        debug!("Destroyed sub-surface node {:?}", id);
    }

    /// Frees `id` and everything below it, releasing their resources. The
    /// caller unlinks `id` from its parent.
    pub(crate) fn free_subsurface_subtree(&mut self, id: SubsurfaceId) {
        let Some(node) = self.subsurfaces.remove(id) else {
            return;
        };
        let SubsurfaceNode {
            link,
            children,
            listeners,
            ..
        } = node;
        drop(listeners);
        for child in children {
            self.free_subsurface_subtree(child);
        }
        if let SubsurfaceLink::Child { surface, .. } = link {
            self.remove_surface(surface);
        }
    }

    /// Every live node of the tree under `root`, level by level, `root` first.
    pub fn subsurfaces_breadth_first(&self, root: SubsurfaceId) -> Vec<SubsurfaceId> {
        let mut order = Vec::new();
        let mut level = vec![root];
        while !level.is_empty() {
            let mut next = Vec::new();
            for id in level {
                let Some(node) = self.subsurfaces.get(id).filter(|n| !n.inert) else {
                    continue;
                };
                order.push(id);
                next.extend_from_slice(&node.children);
            }
            level = next;
        }
        order
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{attach_subsurface, desktop, mapped_window, recording_scene};
    use pretty_assertions::assert_eq;

    #[test]
    fn test_root_adopts_existing_subsurfaces() {
        let (mut scene, _, _) = recording_scene();
        let (_, ws) = desktop(&mut scene);
        let parent = scene.resources_mut().create_surface();
        let child = scene.resources_mut().create_surface();
        scene.resources_mut().create_subsurface(child, parent).unwrap();
        scene.dispatch_pending();

        let window = scene
            .add_window(
                parent,
                crate::window::WindowDescriptor {
                    workspace: ws,
                    position: PointF::zero(),
                    size: SizeF::new(100.0, 100.0),
                },
            )
            .unwrap();
        let root = scene.window(window).unwrap().subsurface_root().unwrap();
        let children = scene.subsurface_children(root).to_vec();

        assert_eq!(children.len(), 1);
        assert_eq!(scene.subsurface_resource(children[0]), Some(child));
        assert!(scene.surface_from_resource(child).is_some());
    }

    #[test]
    fn test_new_subsurface_event_builds_child_node() {
        let (mut scene, _, _) = recording_scene();
        let (_, ws) = desktop(&mut scene);
        let (window, resource) = mapped_window(&mut scene, ws, PointF::new(100.0, 100.0), SizeF::new(300.0, 200.0));
        let (node, _) = attach_subsurface(&mut scene, resource, PointF::new(10.0, 20.0), SizeF::new(50.0, 50.0));

        let root = scene.window(window).unwrap().subsurface_root().unwrap();
        assert_eq!(scene.subsurface_children(root), &[node]);
        assert_eq!(scene.subsurface_coords_global(node), Some(PointF::new(110.0, 120.0)));
        assert_eq!(
            scene.view(ViewId::Subsurface(node)).unwrap().logical_box(&scene),
            Some(RectF::from_coords(110.0, 120.0, 50.0, 50.0))
        );
    }

    #[test]
    fn test_commit_of_hidden_window_records_size_only() {
        let (mut scene, damage, _) = recording_scene();
        let (_, ws) = desktop(&mut scene);
        let (window, resource) = mapped_window(&mut scene, ws, PointF::zero(), SizeF::new(300.0, 200.0));
        let (node, child) = attach_subsurface(&mut scene, resource, PointF::zero(), SizeF::new(50.0, 50.0));
        scene.set_window_hidden(window, true).unwrap();
        damage.clear();

        scene.client_request(|store| {
            store.attach_buffer(child, Some(SizeF::new(80.0, 40.0))).unwrap();
            store.damage_buffer(child, RectF::from_coords(0.0, 0.0, 80.0, 40.0)).unwrap();
            store.commit(child).unwrap();
        });

        assert!(damage.boxes().is_empty());
        assert_eq!(scene.subsurface(node).unwrap().last_size(), SizeF::new(80.0, 40.0));
    }

    #[test]
    fn test_destroy_frees_node_and_children() {
        let (mut scene, _, _) = recording_scene();
        let (window, resource) = {
            let (_, ws) = desktop(&mut scene);
            mapped_window(&mut scene, ws, PointF::zero(), SizeF::new(300.0, 200.0))
        };
        let (outer, outer_resource) =
            attach_subsurface(&mut scene, resource, PointF::zero(), SizeF::new(50.0, 50.0));
        let (inner, inner_resource) =
            attach_subsurface(&mut scene, outer_resource, PointF::zero(), SizeF::new(10.0, 10.0));

        scene.client_request(|store| store.destroy(outer_resource).unwrap());

        let root = scene.window(window).unwrap().subsurface_root().unwrap();
        assert!(scene.subsurface(outer).is_none());
        assert!(scene.subsurface(inner).is_none());
        assert!(scene.subsurface_children(root).is_empty());
        // The inner resource survives and may be claimed again.
        assert_eq!(scene.surface_from_resource(inner_resource), None);
    }

    #[test]
    fn test_unmap_releases_buttons_when_focused() {
        let (mut scene, _, input) = recording_scene();
        let (_, ws) = desktop(&mut scene);
        let (_, resource) = mapped_window(&mut scene, ws, PointF::zero(), SizeF::new(300.0, 200.0));
        let (_, child) = attach_subsurface(&mut scene, resource, PointF::zero(), SizeF::new(50.0, 50.0));
        input.set_focus(Some(child));

        scene.client_request(|store| store.unmap(child).unwrap());

        assert_eq!(input.releases(), 1);
        assert_eq!(input.refocuses(), 1);
    }

    #[test]
    fn test_breadth_first_lists_levels_in_order() {
        let (mut scene, _, _) = recording_scene();
        let (_, ws) = desktop(&mut scene);
        let (window, resource) = mapped_window(&mut scene, ws, PointF::zero(), SizeF::new(300.0, 200.0));
        let (a, a_resource) = attach_subsurface(&mut scene, resource, PointF::zero(), SizeF::new(10.0, 10.0));
        let (b, _) = attach_subsurface(&mut scene, resource, PointF::zero(), SizeF::new(10.0, 10.0));
        let (c, _) = attach_subsurface(&mut scene, a_resource, PointF::zero(), SizeF::new(10.0, 10.0));

        let root = scene.window(window).unwrap().subsurface_root().unwrap();
        assert_eq!(scene.subsurfaces_breadth_first(root), vec![root, a, b, c]);
    }
}
