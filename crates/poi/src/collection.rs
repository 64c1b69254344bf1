//! Marker and label visibility for the loaded POIs.
//!
//! Membership is fixed after load. Three independent switches decide what is
//! on screen:
//! - markers are hidden while the 3D view is active;
//! - labels follow the user's label setting;
//! - labels are suppressed by coarse detail levels.
//!
//! A label is only visible while its marker is.

use crate::source::PoiRecord;

#[derive(Debug, Clone, PartialEq)]
pub struct PoiMarker {
    pub record: PoiRecord,
    marker_visible: bool,
    label_visible: bool,
}

impl PoiMarker {
    pub fn marker_visible(&self) -> bool {
        self.marker_visible
    }

    pub fn label_visible(&self) -> bool {
        self.label_visible
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct PoiCollection {
    markers: Vec<PoiMarker>,
    markers_shown: bool,
    labels_enabled: bool,
    labels_allowed_by_detail: bool,
}

impl Default for PoiCollection {
    fn default() -> Self {
        Self::new(Vec::new())
    }
}

impl PoiCollection {
    pub fn new(records: Vec<PoiRecord>) -> Self {
        let mut collection = Self {
            markers: Vec::new(),
            markers_shown: true,
            labels_enabled: true,
            labels_allowed_by_detail: true,
        };
        collection.replace_records(records);
        collection
    }

    /// Install a freshly loaded set; the visibility switches carry over.
    pub fn replace_records(&mut self, records: Vec<PoiRecord>) {
        self.markers = records
            .into_iter()
            .map(|record| PoiMarker {
                record,
                marker_visible: false,
                label_visible: false,
            })
            .collect();
        self.sync();
    }

    pub fn len(&self) -> usize {
        self.markers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.markers.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PoiMarker> {
        self.markers.iter()
    }

    pub fn markers_shown(&self) -> bool {
        self.markers_shown
    }

    pub fn labels_enabled(&self) -> bool {
        self.labels_enabled
    }

    /// Whether labels are currently on screen.
    pub fn labels_shown(&self) -> bool {
        self.markers_shown && self.labels_enabled && self.labels_allowed_by_detail
    }

    pub fn hide_all(&mut self) {
        self.markers_shown = false;
        self.sync();
    }

    /// Show markers again; labels re-synchronise with the label setting.
    pub fn show_all(&mut self) {
        self.markers_shown = true;
        self.sync();
    }

    pub fn set_labels_enabled(&mut self, enabled: bool) {
        self.labels_enabled = enabled;
        self.sync();
    }

    pub fn set_labels_allowed_by_detail(&mut self, allowed: bool) {
        self.labels_allowed_by_detail = allowed;
        self.sync();
    }

    pub fn visible_marker_count(&self) -> usize {
        self.markers.iter().filter(|m| m.marker_visible).count()
    }

    pub fn visible_label_count(&self) -> usize {
        self.markers.iter().filter(|m| m.label_visible).count()
    }

    fn sync(&mut self) {
        let marker = self.markers_shown;
        let label = self.labels_shown();
        for m in &mut self.markers {
            m.marker_visible = marker;
            m.label_visible = label;
        }
    }
}
