//! Scene graph and hierarchical scene organization.
//!
//! A [`Scene`] is an arena of [`Node`]s. Node 0 is the root and every other
//! node hangs below it. Nodes carry a 2D transform and any number of
//! components; a component is any `'static` type implementing [`Component`]
//! and is looked up by its concrete type.
//!
//! Nodes are never removed, so a [`NodeId`] stays valid for the lifetime of
//! its scene.

use std::{
    any::Any,
    sync::atomic::{AtomicU32, Ordering},
};

use cgmath::{Basis2, Rad, Rotation, Rotation2, Vector2, Vector3};

use crate::error::SampleError;

static NEXT_SCENE_ID: AtomicU32 = AtomicU32::new(1);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct SceneId(u32);

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(usize);

impl NodeId {
    pub fn index(&self) -> usize {
        self.0
    }
}

/// Helper trait to downcast `dyn Component` to the concrete type.
pub trait AsAny {
    fn as_any(&self) -> &dyn Any;
    fn as_any_mut(&mut self) -> &mut dyn Any;
}

impl<T: Any> AsAny for T {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}

/// Something that can be attached to a node.
pub trait Component: AsAny + 'static {
    fn type_name(&self) -> &'static str {
        std::any::type_name::<Self>()
    }
}

/// Local 2D transform of a node. `position.z` only orders drawing.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Transform2D {
    pub position: Vector3<f32>,
    /// Counter-clockwise rotation in radians.
    pub rotation: f32,
    pub scale: Vector2<f32>,
}

impl Default for Transform2D {
    fn default() -> Self {
        Self {
            position: Vector3::new(0.0, 0.0, 0.0),
            rotation: 0.0,
            scale: Vector2::new(1.0, 1.0),
        }
    }
}

impl Transform2D {
    /// `self` applied after `local`, i.e. the world transform of a child.
    pub fn then(&self, local: &Transform2D) -> Transform2D {
        let scaled = Vector2::new(
            local.position.x * self.scale.x,
            local.position.y * self.scale.y,
        );
        let rotated = Basis2::from_angle(Rad(self.rotation)).rotate_vector(scaled);
        Transform2D {
            position: Vector3::new(
                self.position.x + rotated.x,
                self.position.y + rotated.y,
                self.position.z + local.position.z,
            ),
            rotation: self.rotation + local.rotation,
            scale: Vector2::new(self.scale.x * local.scale.x, self.scale.y * local.scale.y),
        }
    }
}

pub struct Node {
    pub name: String,
    pub transform: Transform2D,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    components: Vec<Box<dyn Component>>,
}

impl Node {
    fn new(name: &str, parent: Option<NodeId>) -> Self {
        Self {
            name: name.to_string(),
            transform: Transform2D::default(),
            parent,
            children: Vec::new(),
            components: Vec::new(),
        }
    }

    pub fn parent(&self) -> Option<NodeId> {
        self.parent
    }

    pub fn children(&self) -> &[NodeId] {
        &self.children
    }

    pub fn set_position(&mut self, position: Vector3<f32>) {
        self.transform.position = position;
    }

    /// Attach `component` and return a handle to it.
    ///
    /// A node holds at most one component per type; attaching a second one
    /// replaces the first.
    pub fn create_component<T: Component>(&mut self, component: T) -> &mut T {
        self.components
            .retain(|existing| !(**existing).as_any().is::<T>());
        self.components.push(Box::new(component));
        let last = self.components.len() - 1;
        (*self.components[last])
            .as_any_mut()
            .downcast_mut::<T>()
            .expect("component was pushed with this type")
    }

    pub fn get_component<T: Component>(&self) -> Option<&T> {
        self.components
            .iter()
            .find_map(|c| (**c).as_any().downcast_ref::<T>())
    }

    pub fn get_component_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.components
            .iter_mut()
            .find_map(|c| (**c).as_any_mut().downcast_mut::<T>())
    }

    /// Borrow two different component types mutably at once.
    pub fn get_components_mut<A: Component, B: Component>(
        &mut self,
    ) -> (Option<&mut A>, Option<&mut B>) {
        let mut a = None;
        let mut b = None;
        for component in self.components.iter_mut() {
            let any = (**component).as_any_mut();
            if a.is_none() && any.is::<A>() {
                a = any.downcast_mut::<A>();
            } else if b.is_none() && any.is::<B>() {
                b = any.downcast_mut::<B>();
            }
        }
        (a, b)
    }

    pub fn has_component<T: Component>(&self) -> bool {
        self.get_component::<T>().is_some()
    }

    pub fn component_names(&self) -> Vec<&'static str> {
        self.components.iter().map(|c| c.type_name()).collect()
    }
}

pub struct Scene {
    id: SceneId,
    nodes: Vec<Node>,
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

impl Scene {
    pub fn new() -> Self {
        let id = SceneId(NEXT_SCENE_ID.fetch_add(1, Ordering::Relaxed));
        Self {
            id,
            nodes: vec![Node::new("Scene", None)],
        }
    }

    pub fn id(&self) -> SceneId {
        self.id
    }

    pub fn root(&self) -> NodeId {
        NodeId(0)
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        // the root always exists
        false
    }

    /// Create a direct child of the root node.
    pub fn create_child(&mut self, name: &str) -> NodeId {
        let root = self.root();
        self.nodes.push(Node::new(name, Some(root)));
        let id = NodeId(self.nodes.len() - 1);
        self.nodes[root.0].children.push(id);
        id
    }

    pub fn create_child_of(&mut self, parent: NodeId, name: &str) -> Result<NodeId, SampleError> {
        if parent.0 >= self.nodes.len() {
            return Err(SampleError::UnknownNode(parent, self.id));
        }
        self.nodes.push(Node::new(name, Some(parent)));
        let id = NodeId(self.nodes.len() - 1);
        self.nodes[parent.0].children.push(id);
        Ok(id)
    }

    pub fn node(&self, id: NodeId) -> Option<&Node> {
        self.nodes.get(id.0)
    }

    pub fn node_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        self.nodes.get_mut(id.0)
    }

    pub fn root_node(&self) -> &Node {
        &self.nodes[0]
    }

    pub fn root_node_mut(&mut self) -> &mut Node {
        &mut self.nodes[0]
    }

    /// Depth-first search for the first node called `name`.
    pub fn find_child(&self, name: &str) -> Option<NodeId> {
        let mut to_visit = vec![self.root()];
        while let Some(id) = to_visit.pop() {
            let node = &self.nodes[id.0];
            if id != self.root() && node.name == name {
                return Some(id);
            }
            to_visit.extend(node.children.iter().rev().copied());
        }
        None
    }

    pub fn create_component<T: Component>(&mut self, component: T) -> &mut T {
        self.root_node_mut().create_component(component)
    }

    pub fn get_component<T: Component>(&self) -> Option<&T> {
        self.root_node().get_component::<T>()
    }

    pub fn get_component_mut<T: Component>(&mut self) -> Option<&mut T> {
        self.root_node_mut().get_component_mut::<T>()
    }

    pub fn get_components_mut<A: Component, B: Component>(
        &mut self,
    ) -> (Option<&mut A>, Option<&mut B>) {
        self.root_node_mut().get_components_mut::<A, B>()
    }

    /// Accumulated transform from the root down to `id`.
    pub fn world_transform(&self, id: NodeId) -> Option<Transform2D> {
        let mut chain = Vec::new();
        let mut current = Some(id);
        while let Some(node_id) = current {
            let node = self.nodes.get(node_id.0)?;
            chain.push(node.transform);
            current = node.parent;
        }
        Some(
            chain
                .iter()
                .rev()
                .fold(Transform2D::default(), |world, local| world.then(local)),
        )
    }
}
