//! Difference detection engine.
//!
//! Turns two equal-size images into the canonical list of difference regions
//! in three passes:
//!
//! 1. raw pass: a pixel differs when its RGB channels differ (alpha never
//!    reaches this engine, images are compared as RGB);
//! 2. extension: every raw difference marks the pixels closer than
//!    `radius + 1` around it;
//! 3. grouping: marked pixels are joined with their 8 neighbours into
//!    connected regions.

use std::sync::OnceLock;

use image::{Rgb, RgbImage};
use serde::{Deserialize, Serialize};

use super::{
    difference::{DifferenceRegion, DifferenceSnapshot},
    error::DetectionError,
    pixel_set::PixelSet,
    value_object::{Coordinate, ExtensionRadius, IMAGE_HEIGHT, IMAGE_WIDTH},
};

/// Minimum region count of a playable game
pub const MIN_DIFFERENCES: usize = 3;
/// Maximum region count of a playable game
pub const MAX_DIFFERENCES: usize = 9;
/// Region count from which a game may be hard
pub const HARD_MIN_DIFFERENCES: usize = 7;
/// Largest raw difference ratio of a hard game
pub const HARD_MAX_RATIO: f64 = 0.15;

/// Summary reported to the game author.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct GameClassification {
    pub is_valid: bool,
    pub is_hard: bool,
    pub difference_count: usize,
}

impl GameClassification {
    pub fn new(difference_count: usize, raw_ratio: f64) -> Self {
        Self {
            is_valid: (MIN_DIFFERENCES..=MAX_DIFFERENCES).contains(&difference_count),
            is_hard: difference_count >= HARD_MIN_DIFFERENCES && raw_ratio <= HARD_MAX_RATIO,
            difference_count,
        }
    }
}

pub struct DifferenceDetector {
    radius: ExtensionRadius,
    offsets: &'static [(i32, i32)],
}

impl DifferenceDetector {
    pub fn new(radius: ExtensionRadius) -> Self {
        Self {
            radius,
            offsets: extension_offsets(radius),
        }
    }

    pub fn radius(&self) -> ExtensionRadius {
        self.radius
    }

    /// Compare `original` and `modified` and group their differences.
    pub fn detect(
        &self,
        original: &RgbImage,
        modified: &RgbImage,
    ) -> Result<DifferenceReport, DetectionError> {
        check_dimensions(original)?;
        check_dimensions(modified)?;

        let (raw, raw_count) = raw_differences(original, modified);
        let extended = self.extend(&raw);
        let snapshot = group_regions(&extended);

        let total = (IMAGE_WIDTH * IMAGE_HEIGHT) as f64;
        let report = DifferenceReport {
            snapshot,
            raw_ratio: raw_count as f64 / total,
        };
        tracing::debug!(
            radius = self.radius.value(),
            raw_pixels = raw_count,
            regions = report.difference_count(),
            "difference detection finished"
        );
        Ok(report)
    }

    fn extend(&self, raw: &[bool]) -> Vec<bool> {
        let mut extended = raw.to_vec();
        for (slot, _) in raw.iter().enumerate().filter(|(_, differs)| **differs) {
            let origin = coordinate_of(slot);
            for (dx, dy) in self.offsets {
                if let Some(pixel) = origin.offset(*dx, *dy) {
                    extended[slot_of(pixel)] = true;
                }
            }
        }
        extended
    }
}

/// Output of one detection run.
#[derive(Debug, Clone)]
pub struct DifferenceReport {
    snapshot: DifferenceSnapshot,
    raw_ratio: f64,
}

impl DifferenceReport {
    pub fn difference_count(&self) -> usize {
        self.snapshot.len()
    }

    /// Share of raw differing pixels over the whole board.
    pub fn raw_ratio(&self) -> f64 {
        self.raw_ratio
    }

    pub fn classification(&self) -> GameClassification {
        GameClassification::new(self.difference_count(), self.raw_ratio)
    }

    pub fn is_valid(&self) -> bool {
        self.classification().is_valid
    }

    pub fn is_hard(&self) -> bool {
        self.classification().is_hard
    }

    pub fn snapshot(&self) -> &DifferenceSnapshot {
        &self.snapshot
    }

    pub fn into_snapshot(self) -> DifferenceSnapshot {
        self.snapshot
    }

    /// Every region pixel painted black on a white board.
    pub fn render(&self) -> RgbImage {
        let mut canvas = RgbImage::from_pixel(IMAGE_WIDTH, IMAGE_HEIGHT, Rgb([255, 255, 255]));
        for pixel in self.snapshot.regions().iter().flat_map(|r| r.pixels()) {
            canvas.put_pixel(pixel.x, pixel.y, Rgb([0, 0, 0]));
        }
        canvas
    }
}

fn check_dimensions(image: &RgbImage) -> Result<(), DetectionError> {
    let (width, height) = image.dimensions();
    if width != IMAGE_WIDTH || height != IMAGE_HEIGHT {
        return Err(DetectionError::InvalidDimensions {
            expected_width: IMAGE_WIDTH,
            expected_height: IMAGE_HEIGHT,
            width,
            height,
        });
    }
    Ok(())
}

fn slot_of(pixel: Coordinate) -> usize {
    (pixel.y * IMAGE_WIDTH + pixel.x) as usize
}

fn coordinate_of(slot: usize) -> Coordinate {
    let slot = slot as u32;
    Coordinate::new(slot % IMAGE_WIDTH, slot / IMAGE_WIDTH)
}

fn raw_differences(original: &RgbImage, modified: &RgbImage) -> (Vec<bool>, usize) {
    let mut count = 0;
    let raster = original
        .pixels()
        .zip(modified.pixels())
        .map(|(a, b)| {
            let differs = a != b;
            count += differs as usize;
            differs
        })
        .collect();
    (raster, count)
}

fn group_regions(extended: &[bool]) -> DifferenceSnapshot {
    // forward neighbours are linked when the scan reaches them
    const BACKWARD: [(i32, i32); 4] = [(-1, 0), (-1, -1), (0, -1), (1, -1)];

    let mut set = PixelSet::new();
    for (slot, _) in extended.iter().enumerate().filter(|(_, marked)| **marked) {
        let pixel = coordinate_of(slot);
        set.add(pixel);
        for (dx, dy) in BACKWARD {
            if let Some(neighbour) = pixel.offset(dx, dy)
                && extended[slot_of(neighbour)]
            {
                set.union(pixel, neighbour);
            }
        }
    }

    DifferenceSnapshot::new(set.groups().into_iter().map(DifferenceRegion::new).collect())
}

/// Offsets strictly closer than `radius + 1`, origin excluded. Computed once per radius.
fn extension_offsets(radius: ExtensionRadius) -> &'static [(i32, i32)] {
    static CACHE: [OnceLock<Vec<(i32, i32)>>; 4] =
        [OnceLock::new(), OnceLock::new(), OnceLock::new(), OnceLock::new()];

    let slot = ExtensionRadius::ALLOWED
        .iter()
        .position(|allowed| *allowed == radius.value())
        .unwrap_or(0);
    CACHE[slot].get_or_init(|| {
        let r = radius.value() as i32;
        let limit = (r + 1) * (r + 1);
        let mut offsets = Vec::new();
        for dy in -r..=r {
            for dx in -r..=r {
                let distance = dx * dx + dy * dy;
                if distance != 0 && distance < limit {
                    offsets.push((dx, dy));
                }
            }
        }
        offsets
    })
}
