//! Cluster items and the clusters built from them

use crate::utils::{LatLng, SphericalMercatorProjection};
use crate::QuadTreeItem;
use geo::Point;
use std::collections::HashSet;
use std::hash::{Hash, Hasher};

#[cfg(feature = "serde")]
use serde::{Deserialize, Serialize};

/// A caller-owned point of interest that can be grouped into clusters
///
/// Equality and hashing identify the item: two values that compare equal are treated
/// as the same marker by every algorithm, whatever their positions. Items are cloned
/// into cluster results, so wrap large payloads in an `Arc`.
pub trait ClusterItem: Clone + Eq + Hash + Send + Sync + 'static {
    fn position(&self) -> LatLng;

    fn title(&self) -> Option<&str> {
        None
    }

    fn snippet(&self) -> Option<&str> {
        None
    }
}

/// A simple marker identified by `id`
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(Serialize, Deserialize))]
pub struct PoiItem {
    pub id: u64,
    pub position: LatLng,
    pub title: Option<String>,
    pub snippet: Option<String>,
}

impl PoiItem {
    pub fn new(id: u64, latitude: f64, longitude: f64) -> Self {
        Self {
            id,
            position: LatLng::new(latitude, longitude),
            title: None,
            snippet: None,
        }
    }

    pub fn with_title(mut self, title: impl Into<String>) -> Self {
        self.title = Some(title.into());
        self
    }

    pub fn with_snippet(mut self, snippet: impl Into<String>) -> Self {
        self.snippet = Some(snippet.into());
        self
    }
}

impl PartialEq for PoiItem {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for PoiItem {}

impl Hash for PoiItem {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}

impl ClusterItem for PoiItem {
    fn position(&self) -> LatLng {
        self.position
    }

    fn title(&self) -> Option<&str> {
        self.title.as_deref()
    }

    fn snippet(&self) -> Option<&str> {
        self.snippet.as_deref()
    }
}

/// An item together with its projected point
///
/// Indexable by the quadtree, and emitted as-is as a one-member cluster. Equality and
/// hashing delegate to the wrapped item.
#[derive(Debug, Clone)]
pub struct QuadItem<T> {
    item: T,
    position: LatLng,
    point: Point<f64>,
}

impl<T: ClusterItem> QuadItem<T> {
    pub fn new(item: T, projection: &SphericalMercatorProjection) -> Self {
        let position = item.position();
        Self {
            point: projection.to_point(position),
            position,
            item,
        }
    }
}

impl<T> QuadItem<T> {
    #[inline]
    pub fn item(&self) -> &T {
        &self.item
    }

    #[inline]
    pub fn into_item(self) -> T {
        self.item
    }

    #[inline]
    pub fn position(&self) -> LatLng {
        self.position
    }
}

impl<T> QuadTreeItem for QuadItem<T> {
    #[inline]
    fn point(&self) -> Point<f64> {
        self.point
    }
}

impl<T: PartialEq> PartialEq for QuadItem<T> {
    fn eq(&self, other: &Self) -> bool {
        self.item == other.item
    }
}

impl<T: Eq> Eq for QuadItem<T> {}

impl<T: Hash> Hash for QuadItem<T> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.item.hash(state);
    }
}

/// A group of items at a fixed position
///
/// Membership keeps insertion order and never holds the same item twice.
#[derive(Debug, Clone)]
pub struct StaticCluster<T> {
    position: LatLng,
    items: Vec<T>,
    members: HashSet<T>,
}

impl<T: ClusterItem> StaticCluster<T> {
    pub fn new(position: LatLng) -> Self {
        Self {
            position,
            items: Vec::new(),
            members: HashSet::new(),
        }
    }

    /// Add an item, returning `false` if it was already a member
    pub fn add(&mut self, item: T) -> bool {
        if !self.members.insert(item.clone()) {
            return false;
        }
        self.items.push(item);
        true
    }

    /// Remove an item, returning whether it was a member
    pub fn remove(&mut self, item: &T) -> bool {
        if !self.members.remove(item) {
            return false;
        }
        if let Some(index) = self.items.iter().position(|existing| existing == item) {
            self.items.remove(index);
        }
        true
    }

    #[inline]
    pub fn contains(&self, item: &T) -> bool {
        self.members.contains(item)
    }
}

impl<T> StaticCluster<T> {
    #[inline]
    pub fn position(&self) -> LatLng {
        self.position
    }

    #[inline]
    pub fn items(&self) -> &[T] {
        &self.items
    }

    #[inline]
    pub fn count(&self) -> usize {
        self.items.len()
    }
}

/// One entry of a clustering result
#[derive(Debug, Clone)]
pub enum Cluster<T> {
    /// An item that had no neighbours in range, standing alone
    Single(QuadItem<T>),
    /// Several items shown at one position
    Group(StaticCluster<T>),
}

impl<T> Cluster<T> {
    pub fn position(&self) -> LatLng {
        match self {
            Cluster::Single(item) => item.position(),
            Cluster::Group(cluster) => cluster.position(),
        }
    }

    pub fn items(&self) -> &[T] {
        match self {
            Cluster::Single(item) => std::slice::from_ref(item.item()),
            Cluster::Group(cluster) => cluster.items(),
        }
    }

    pub fn count(&self) -> usize {
        match self {
            Cluster::Single(_) => 1,
            Cluster::Group(cluster) => cluster.count(),
        }
    }

    #[inline]
    pub fn is_single(&self) -> bool {
        matches!(self, Cluster::Single(_))
    }
}
