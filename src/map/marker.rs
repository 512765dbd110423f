//! Markers and the layer they are drawn on

use crate::models::LatLng;

/// Icon a marker is drawn with
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum IconVariant {
    Home,
    School,
    Generic,
}

/// A point on the map with a popup
#[derive(Debug, Clone, PartialEq)]
pub struct Marker {
    pub position: LatLng,
    pub icon: IconVariant,
    pub popup_text: String,
}

impl Marker {
    pub fn new(position: LatLng, icon: IconVariant, popup_text: impl Into<String>) -> Self {
        Self {
            position,
            icon,
            popup_text: popup_text.into(),
        }
    }

    /// The user's home marker
    pub fn home(position: LatLng) -> Self {
        Self::new(position, IconVariant::Home, "Your home")
    }
}

/// Handle for a marker in a [`MarkerSet`]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct MarkerId(u64);

/// Yes/No question anchored at a map position
#[derive(Debug, Clone, PartialEq)]
pub struct ConfirmPopup {
    pub at: LatLng,
    pub question: String,
}

impl ConfirmPopup {
    pub fn set_home(at: LatLng) -> Self {
        Self {
            at,
            question: "Set this location as your home?".to_string(),
        }
    }
}

/// Drawing surface for markers and popups.
///
/// Implementations only render. Which markers exist is decided by
/// [`MarkerSet`], which calls these methods in step with its own bookkeeping.
pub trait MapLayer {
    fn add_marker(&mut self, id: MarkerId, marker: &Marker);

    fn remove_marker(&mut self, id: MarkerId);

    /// Show a confirmation popup; at most one is open at a time
    fn open_popup(&mut self, popup: &ConfirmPopup);

    fn close_popup(&mut self);
}

/// Markers currently on the map, kept in step with the layer that draws them
pub struct MarkerSet<L: MapLayer> {
    layer: L,
    entries: Vec<(MarkerId, Marker)>,
    next_id: u64,
}

impl<L: MapLayer> MarkerSet<L> {
    pub fn new(layer: L) -> Self {
        Self {
            layer,
            entries: Vec::new(),
            next_id: 1,
        }
    }

    pub fn add(&mut self, marker: Marker) -> MarkerId {
        let id = MarkerId(self.next_id);
        self.next_id += 1;
        self.layer.add_marker(id, &marker);
        self.entries.push((id, marker));
        id
    }

    /// Remove a marker, returning it if it was present
    pub fn remove(&mut self, id: MarkerId) -> Option<Marker> {
        let index = self.entries.iter().position(|(entry_id, _)| *entry_id == id)?;
        self.layer.remove_marker(id);
        Some(self.entries.remove(index).1)
    }

    pub fn clear(&mut self) {
        for (id, _) in self.entries.drain(..) {
            self.layer.remove_marker(id);
        }
    }

    pub fn get(&self, id: MarkerId) -> Option<&Marker> {
        self.entries
            .iter()
            .find(|(entry_id, _)| *entry_id == id)
            .map(|(_, marker)| marker)
    }

    /// Markers in insertion order
    pub fn iter(&self) -> impl Iterator<Item = (MarkerId, &Marker)> {
        self.entries.iter().map(|(id, marker)| (*id, marker))
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn layer(&self) -> &L {
        &self.layer
    }

    pub fn layer_mut(&mut self) -> &mut L {
        &mut self.layer
    }
}
