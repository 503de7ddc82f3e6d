/// Simplified ByteTrack multi-object tracker.
///
/// Two-stage association strategy: high-confidence detections are matched
/// first, then low-confidence detections fill remaining unmatched tracks.
/// This prevents spurious tracks from weak detections while allowing
/// existing tracks to survive momentary confidence drops.
///
/// New tracks start tentative and are only reported once they have been
/// matched on `min_hits` consecutive frames; a tentative track that misses
/// a frame is dropped immediately.
use std::collections::HashSet;

use crate::engagement::domain::tracked_identity::IdentityId;
use crate::perception::domain::face_detector::Detection;
use crate::perception::domain::identity_tracker::{IdentityTracker, TrackedFace};
use crate::shared::bounding_box::BoundingBox;
use crate::shared::frame::Frame;

const HIGH_THRESH: f64 = 0.5;
const MATCH_THRESH: f64 = 0.3;

#[derive(Clone, Debug)]
struct TrackState {
    id: IdentityId,
    bbox: BoundingBox,
    frames_lost: usize,
    hits: usize,
    confirmed: bool,
    matched: bool,
}

pub struct ByteTracker {
    tracks: Vec<TrackState>,
    next_id: IdentityId,
    max_lost: usize,
    min_hits: usize,
}

impl ByteTracker {
    pub fn new(max_lost: usize, min_hits: usize) -> Self {
        Self {
            tracks: Vec::new(),
            next_id: 1,
            max_lost,
            min_hits: min_hits.max(1),
        }
    }

    pub fn update(&mut self, detections: &[Detection]) -> Vec<TrackedFace> {
        let (high, low) = split_by_confidence(detections);

        self.reset_match_flags();
        let num_existing = self.tracks.len();
        let matched_high = self.match_high_confidence(&high);
        self.match_low_confidence(&low);
        self.create_new_tracks(&high, &matched_high);
        self.age_unmatched_tracks(num_existing);

        self.active_tracks()
    }

    fn reset_match_flags(&mut self) {
        for track in &mut self.tracks {
            track.matched = false;
        }
    }

    fn match_high_confidence(&mut self, high: &[(usize, &Detection)]) -> HashSet<usize> {
        let track_refs: Vec<(usize, BoundingBox)> = self
            .tracks
            .iter()
            .enumerate()
            .map(|(i, t)| (i, t.bbox))
            .collect();

        let mut matched_det_indices = HashSet::new();
        for (ti, di, bbox) in greedy_match(&track_refs, high, MATCH_THRESH) {
            self.apply_match(ti, bbox);
            matched_det_indices.insert(di);
        }
        matched_det_indices
    }

    fn match_low_confidence(&mut self, low: &[(usize, &Detection)]) {
        let unmatched_refs: Vec<(usize, BoundingBox)> = self
            .tracks
            .iter()
            .enumerate()
            .filter(|(_, t)| !t.matched)
            .map(|(i, t)| (i, t.bbox))
            .collect();

        for (ti, _, bbox) in greedy_match(&unmatched_refs, low, MATCH_THRESH) {
            self.apply_match(ti, bbox);
        }
    }

    fn apply_match(&mut self, track_idx: usize, bbox: BoundingBox) {
        let min_hits = self.min_hits;
        let track = &mut self.tracks[track_idx];
        track.bbox = bbox;
        track.frames_lost = 0;
        track.matched = true;
        track.hits += 1;
        if track.hits >= min_hits {
            track.confirmed = true;
        }
    }

    fn create_new_tracks(&mut self, high: &[(usize, &Detection)], matched: &HashSet<usize>) {
        for (di, det) in high {
            if !matched.contains(di) {
                self.tracks.push(TrackState {
                    id: self.next_id,
                    bbox: det.bbox,
                    frames_lost: 0,
                    hits: 1,
                    confirmed: self.min_hits <= 1,
                    matched: true,
                });
                self.next_id += 1;
            }
        }
    }

    fn age_unmatched_tracks(&mut self, num_existing: usize) {
        for track in self.tracks.iter_mut().take(num_existing) {
            if !track.matched {
                track.frames_lost += 1;
            }
        }
        let max_lost = self.max_lost;
        self.tracks
            .retain(|t| t.frames_lost <= max_lost && (t.confirmed || t.frames_lost == 0));
    }

    /// Only matched, confirmed tracks produce output; lost tracks are kept
    /// internally so a returning face keeps its id.
    fn active_tracks(&self) -> Vec<TrackedFace> {
        self.tracks
            .iter()
            .filter(|t| t.matched && t.confirmed)
            .map(|t| TrackedFace {
                id: t.id,
                bbox: t.bbox,
            })
            .collect()
    }
}

impl IdentityTracker for ByteTracker {
    fn track(
        &mut self,
        detections: &[Detection],
        _frame: &Frame,
    ) -> Result<Vec<TrackedFace>, Box<dyn std::error::Error>> {
        Ok(self.update(detections))
    }
}

type IndexedDets<'a> = Vec<(usize, &'a Detection)>;

fn split_by_confidence(detections: &[Detection]) -> (IndexedDets<'_>, IndexedDets<'_>) {
    let mut high = Vec::new();
    let mut low = Vec::new();
    for (i, det) in detections.iter().enumerate() {
        if det.confidence >= HIGH_THRESH {
            high.push((i, det));
        } else {
            low.push((i, det));
        }
    }
    (high, low)
}

/// Greedy IoU matching: pairs sorted by descending IoU, each track/detection
/// used at most once. Returns `(track_index, detection_index, detection_bbox)`.
fn greedy_match(
    tracks: &[(usize, BoundingBox)],
    dets: &[(usize, &Detection)],
    thresh: f64,
) -> Vec<(usize, usize, BoundingBox)> {
    let mut pairs: Vec<(usize, usize, BoundingBox, f64)> = Vec::new();
    for (ti, bbox) in tracks {
        for (di, det) in dets {
            let score = bbox.iou(&det.bbox);
            if score >= thresh {
                pairs.push((*ti, *di, det.bbox, score));
            }
        }
    }
    pairs.sort_by(|a, b| b.3.partial_cmp(&a.3).unwrap_or(std::cmp::Ordering::Equal));

    let mut used_tracks = HashSet::new();
    let mut used_dets = HashSet::new();
    let mut matches = Vec::new();

    for (ti, di, bbox, _) in &pairs {
        if !used_tracks.contains(ti) && !used_dets.contains(di) {
            used_tracks.insert(*ti);
            used_dets.insert(*di);
            matches.push((*ti, *di, *bbox));
        }
    }
    matches
}

#[cfg(test)]
mod tests {
    use super::*;

    fn det(x1: f64, y1: f64, x2: f64, y2: f64, score: f64) -> Detection {
        Detection {
            bbox: BoundingBox::new(x1, y1, x2, y2),
            confidence: score,
            class_label: "face".to_string(),
        }
    }

    #[test]
    fn test_new_detections_get_unique_ids() {
        let mut tracker = ByteTracker::new(5, 1);
        let tracks = tracker.update(&[
            det(0.0, 0.0, 50.0, 50.0, 0.9),
            det(100.0, 100.0, 150.0, 150.0, 0.8),
        ]);
        assert_eq!(tracks.len(), 2);
        assert_ne!(tracks[0].id, tracks[1].id);
    }

    #[test]
    fn test_consistent_id_across_frames() {
        let mut tracker = ByteTracker::new(5, 1);
        let t1 = tracker.update(&[det(10.0, 10.0, 60.0, 60.0, 0.9)]);
        let id = t1[0].id;

        let t2 = tracker.update(&[det(12.0, 12.0, 62.0, 62.0, 0.9)]);
        assert_eq!(t2.len(), 1);
        assert_eq!(t2[0].id, id);
        assert_eq!(t2[0].bbox, BoundingBox::new(12.0, 12.0, 62.0, 62.0));
    }

    #[test]
    fn test_lost_track_removal() {
        let mut tracker = ByteTracker::new(2, 1);
        let first = tracker.update(&[det(10.0, 10.0, 60.0, 60.0, 0.9)])[0].id;

        tracker.update(&[]);
        tracker.update(&[]);
        tracker.update(&[]);
        let t = tracker.update(&[det(10.0, 10.0, 60.0, 60.0, 0.9)]);
        assert_ne!(t[0].id, first, "removed track's id must not be reused");
    }

    #[test]
    fn test_track_survives_within_max_lost() {
        let mut tracker = ByteTracker::new(3, 1);
        let t1 = tracker.update(&[det(10.0, 10.0, 60.0, 60.0, 0.9)]);
        let id = t1[0].id;

        assert!(tracker.update(&[]).is_empty());
        assert!(tracker.update(&[]).is_empty());

        let t2 = tracker.update(&[det(12.0, 12.0, 62.0, 62.0, 0.9)]);
        assert_eq!(t2.len(), 1);
        assert_eq!(t2[0].id, id);
    }

    #[test]
    fn test_low_confidence_matches_existing_track() {
        let mut tracker = ByteTracker::new(5, 1);
        let t1 = tracker.update(&[det(10.0, 10.0, 60.0, 60.0, 0.9)]);
        let id = t1[0].id;

        let t2 = tracker.update(&[det(12.0, 12.0, 62.0, 62.0, 0.3)]);
        assert_eq!(t2.len(), 1);
        assert_eq!(t2[0].id, id);
    }

    #[test]
    fn test_low_confidence_does_not_start_new_track() {
        let mut tracker = ByteTracker::new(5, 1);
        assert!(tracker
            .update(&[det(10.0, 10.0, 60.0, 60.0, 0.3)])
            .is_empty());
    }

    #[test]
    fn test_multiple_tracks_independent() {
        let mut tracker = ByteTracker::new(5, 1);
        let t1 = tracker.update(&[
            det(0.0, 0.0, 50.0, 50.0, 0.9),
            det(200.0, 200.0, 250.0, 250.0, 0.9),
        ]);
        let id_a = t1[0].id;
        let id_b = t1[1].id;

        let t2 = tracker.update(&[
            det(2.0, 2.0, 52.0, 52.0, 0.9),
            det(202.0, 202.0, 252.0, 252.0, 0.9),
        ]);
        let ids: Vec<IdentityId> = t2.iter().map(|t| t.id).collect();
        assert!(ids.contains(&id_a));
        assert!(ids.contains(&id_b));
    }

    #[test]
    fn test_tentative_track_hidden_until_confirmed() {
        let mut tracker = ByteTracker::new(5, 3);
        assert!(tracker.update(&[det(10.0, 10.0, 60.0, 60.0, 0.9)]).is_empty());
        assert!(tracker.update(&[det(11.0, 11.0, 61.0, 61.0, 0.9)]).is_empty());
        let t = tracker.update(&[det(12.0, 12.0, 62.0, 62.0, 0.9)]);
        assert_eq!(t.len(), 1);
        assert_eq!(t[0].id, 1);
    }

    #[test]
    fn test_tentative_track_dropped_on_first_miss() {
        let mut tracker = ByteTracker::new(5, 3);
        tracker.update(&[det(10.0, 10.0, 60.0, 60.0, 0.9)]);
        tracker.update(&[det(10.0, 10.0, 60.0, 60.0, 0.9)]);
        tracker.update(&[]);
        // restarts as a fresh tentative track with a new id
        tracker.update(&[det(10.0, 10.0, 60.0, 60.0, 0.9)]);
        tracker.update(&[det(10.0, 10.0, 60.0, 60.0, 0.9)]);
        let t = tracker.update(&[det(10.0, 10.0, 60.0, 60.0, 0.9)]);
        assert_eq!(t.len(), 1);
        assert_eq!(t[0].id, 2);
    }

    #[test]
    fn test_confirmed_track_survives_misses() {
        let mut tracker = ByteTracker::new(5, 2);
        tracker.update(&[det(10.0, 10.0, 60.0, 60.0, 0.9)]);
        let id = tracker.update(&[det(10.0, 10.0, 60.0, 60.0, 0.9)])[0].id;
        tracker.update(&[]);
        let t = tracker.update(&[det(11.0, 11.0, 61.0, 61.0, 0.9)]);
        assert_eq!(t[0].id, id);
    }

    #[test]
    fn test_track_port_delegates_to_update() {
        let mut tracker = ByteTracker::new(5, 1);
        let frame = Frame::new(vec![0; 12], 2, 2, 3, 0);
        let faces = tracker
            .track(&[det(0.0, 0.0, 1.0, 1.0, 0.9)], &frame)
            .unwrap();
        assert_eq!(faces.len(), 1);
    }
}
