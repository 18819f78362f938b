use tracing::{debug, warn};

use crate::error::QuadtreeError;
use crate::QuadtreeVisitor;

/// Extracts the 2D position of an element.
pub type CoordinateFn<T> = Box<dyn Fn(&T) -> (f64, f64)>;

/// Given the full overflowed element list of a leaf, returns how many leading
/// elements stay at that node. The rest are pushed into its children.
pub type SplitPolicy<T> = Box<dyn Fn(&[T]) -> usize>;

/// Half-open square `[min_x, min_x + size) x [min_y, min_y + size)`.
#[derive(Copy, Clone, Debug, PartialEq)]
pub struct Bounds {
    pub min_x: f64,
    pub min_y: f64,
    pub half_size: f64,
}

impl Default for Bounds {
    fn default() -> Self {
        Self::square(0.0, 0.0, 1.0)
    }
}

impl Bounds {
    pub fn square(min_x: f64, min_y: f64, size: f64) -> Self {
        Self {
            min_x,
            min_y,
            half_size: size * 0.5,
        }
    }

    pub fn size(&self) -> f64 {
        self.half_size * 2.0
    }

    /// Child index of a point: `x_bit + 2 * y_bit`, a bit being set when the
    /// point is at or past the midpoint on that axis. No bounds check is made,
    /// so points outside the square land in the nearest child on each axis.
    pub fn quadrant(&self, x: f64, y: f64) -> usize {
        let xi = (x - self.min_x >= self.half_size) as usize;
        let yi = (y - self.min_y >= self.half_size) as usize;
        xi + 2 * yi
    }

    pub fn child(&self, index: usize) -> Bounds {
        debug_assert!(index < 4);
        Bounds {
            min_x: self.min_x + (index % 2) as f64 * self.half_size,
            min_y: self.min_y + (index / 2) as f64 * self.half_size,
            half_size: self.half_size * 0.5,
        }
    }

    pub fn contains(&self, x: f64, y: f64) -> bool {
        x >= self.min_x
            && x < self.min_x + self.size()
            && y >= self.min_y
            && y < self.min_y + self.size()
    }
}

#[derive(Clone, Debug)]
pub struct Node<T> {
    bounds: Bounds,
    depth: u8,
    elements: Vec<T>,
    children: Option<Box<[Node<T>; 4]>>,
}

impl<T> Node<T> {
    fn new(bounds: Bounds, depth: u8) -> Self {
        Self {
            bounds,
            depth,
            elements: Vec::new(),
            children: None,
        }
    }

    pub fn bounds(&self) -> &Bounds {
        &self.bounds
    }

    pub fn depth(&self) -> u8 {
        self.depth
    }

    /// Elements retained at this node, in insertion order.
    pub fn elements(&self) -> &[T] {
        &self.elements
    }

    /// The four children in `[(-,-), (+,-), (-,+), (+,+)]` order, or `None` for a leaf.
    pub fn children(&self) -> Option<&[Node<T>; 4]> {
        self.children.as_deref()
    }

    pub fn is_leaf(&self) -> bool {
        self.children.is_none()
    }

    fn subdivide(&mut self) {
        let bounds = self.bounds;
        let depth = self.depth + 1;
        self.children = Some(Box::new(
            [0, 1, 2, 3].map(|i| Node::new(bounds.child(i), depth)),
        ));
    }
}

/// A capacity-bounded quadtree that keeps the first-inserted elements of an
/// overflowing node at that node and pushes the rest down.
///
/// Callers are expected to insert elements in order of decreasing importance
/// (brightest star first). The tree never reorders what it is given; the only
/// say it has over retention is the split index chosen on overflow, which is
/// `capacity` unless a [`SplitPolicy`] is supplied.
pub struct SortedQuadTree<T> {
    root: Node<T>,
    coordinate_of: CoordinateFn<T>,
    policy: Option<SplitPolicy<T>>,
    capacity: usize,
    max_depth: u8,
}

impl<T> SortedQuadTree<T> {
    pub const DEFAULT_MAX_DEPTH: u8 = 24;

    /// Creates a tree over the unit square at the origin.
    pub fn new<F>(coordinate_of: F, capacity: usize) -> Result<Self, QuadtreeError>
    where
        F: Fn(&T) -> (f64, f64) + 'static,
    {
        Self::with_bounds(coordinate_of, capacity, Bounds::default())
    }

    pub fn with_bounds<F>(
        coordinate_of: F,
        capacity: usize,
        bounds: Bounds,
    ) -> Result<Self, QuadtreeError>
    where
        F: Fn(&T) -> (f64, f64) + 'static,
    {
        if capacity < 1 {
            return Err(QuadtreeError::InvalidConfiguration(
                "capacity must be at least 1".to_string(),
            ));
        }
        if !(bounds.half_size > 0.0 && bounds.half_size.is_finite()) {
            return Err(QuadtreeError::InvalidConfiguration(format!(
                "size must be positive and finite, got {}",
                bounds.size()
            )));
        }
        if !(bounds.min_x.is_finite() && bounds.min_y.is_finite()) {
            return Err(QuadtreeError::InvalidConfiguration(format!(
                "origin must be finite, got ({}, {})",
                bounds.min_x, bounds.min_y
            )));
        }
        Ok(Self {
            root: Node::new(bounds, 0),
            coordinate_of: Box::new(coordinate_of),
            policy: None,
            capacity,
            max_depth: Self::DEFAULT_MAX_DEPTH,
        })
    }

    pub fn with_policy<P>(mut self, policy: P) -> Self
    where
        P: Fn(&[T]) -> usize + 'static,
    {
        self.policy = Some(Box::new(policy));
        self
    }

    /// Deepest level a node may subdivide from. A leaf at this depth that
    /// overflows makes the insert fail with [`QuadtreeError::MaxDepthExceeded`].
    pub fn with_max_depth(mut self, max_depth: u8) -> Self {
        self.max_depth = max_depth;
        self
    }

    pub fn root(&self) -> &Node<T> {
        &self.root
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn max_depth(&self) -> u8 {
        self.max_depth
    }

    /// Total number of elements held across all nodes.
    pub fn len(&self) -> usize {
        self.nodes().map(|node| node.elements.len()).sum()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn node_count(&self) -> usize {
        self.nodes().count()
    }

    /// Inserts an element.
    ///
    /// On error the element that overflowed the failing leaf is dropped so
    /// that every node stays within capacity. Nothing else is rolled back:
    /// if the failure happened while a parent was pushing its overflow down,
    /// the elements it had not yet pushed are dropped too.
    pub fn add(&mut self, element: T) -> Result<(), QuadtreeError> {
        let rules = Rules {
            coordinate_of: &self.coordinate_of,
            policy: self.policy.as_ref(),
            capacity: self.capacity,
            max_depth: self.max_depth,
        };
        rules.node_insert(&mut self.root, element)
    }

    /// Depth-first, root first, children in index order.
    pub fn nodes(&self) -> Nodes<'_, T> {
        Nodes {
            to_process: vec![&self.root],
        }
    }

    pub fn traverse<V>(&self, visitor: &mut V)
    where
        V: QuadtreeVisitor<T>,
    {
        for node in self.nodes() {
            if node.is_leaf() {
                visitor.leaf(node.depth, &node.bounds, &node.elements);
            } else {
                visitor.branch(node.depth, &node.bounds, &node.elements);
            }
        }
    }
}

pub struct Nodes<'a, T> {
    to_process: Vec<&'a Node<T>>,
}

impl<'a, T> Iterator for Nodes<'a, T> {
    type Item = &'a Node<T>;

    fn next(&mut self) -> Option<Self::Item> {
        let node = self.to_process.pop()?;
        if let Some(children) = node.children.as_deref() {
            // Reversed so they pop in index order.
            self.to_process.extend(children.iter().rev());
        }
        Some(node)
    }
}

/// Per-tree settings shared by every node during one insert.
struct Rules<'a, T> {
    coordinate_of: &'a CoordinateFn<T>,
    policy: Option<&'a SplitPolicy<T>>,
    capacity: usize,
    max_depth: u8,
}

impl<T> Rules<'_, T> {
    fn node_insert(&self, node: &mut Node<T>, element: T) -> Result<(), QuadtreeError> {
        match node.children.as_deref_mut() {
            Some(children) => {
                let (x, y) = (self.coordinate_of)(&element);
                let index = node.bounds.quadrant(x, y);
                self.node_insert(&mut children[index], element)
            }
            None => self.leaf_insert(node, element),
        }
    }

    fn leaf_insert(&self, node: &mut Node<T>, element: T) -> Result<(), QuadtreeError> {
        node.elements.push(element);
        if node.elements.len() <= self.capacity {
            return Ok(());
        }

        let split = match self.split_index(node) {
            Ok(split) => split,
            Err(err) => {
                node.elements.pop();
                warn!(depth = node.depth, %err, "rejected insert");
                return Err(err);
            }
        };

        // The leaf is full, split it.
        node.subdivide();
        let pushed = node.elements.split_off(split);
        debug!(
            depth = node.depth,
            kept = split,
            pushed = pushed.len(),
            "subdivided node"
        );

        // Transfer the overflow, in order, to the new children.
        for element in pushed {
            self.node_insert(node, element)?;
        }
        Ok(())
    }

    fn split_index(&self, node: &Node<T>) -> Result<usize, QuadtreeError> {
        if node.depth >= self.max_depth {
            return Err(QuadtreeError::MaxDepthExceeded {
                max_depth: self.max_depth,
            });
        }
        let len = node.elements.len();
        let split = match self.policy {
            Some(policy) => policy(node.elements.as_slice()),
            None => self.capacity,
        };
        // Keeping more than `capacity` would leave an internal node over its bound.
        if split > len || split > self.capacity {
            return Err(QuadtreeError::PolicyContractViolation {
                split,
                len,
                capacity: self.capacity,
            });
        }
        Ok(split)
    }
}
