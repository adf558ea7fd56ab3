//! Named tap regions.
//!
//! Regions come from the annotation tool's JSON export. Boxes are stored
//! as percentages of the original screenshot and converted to pixels on
//! lookup:
//!
//! ```json
//! [
//!   {
//!     "ocr": "",
//!     "id": 1,
//!     "bbox": [{ "x": 10.0, "y": 90.0, "width": 8.0, "height": 4.0,
//!                "rotation": 0, "original_width": 1080, "original_height": 2400 }],
//!     "transcription": ["to_chief_profile"]
//!   }
//! ]
//! ```
//!
//! The `i`-th transcription names the `i`-th box.

use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::{Arc, RwLock};
use tracing::info;

use crate::errors::RegionError;

const DEFAULT_SCREEN_WIDTH: u32 = 1080;
const DEFAULT_SCREEN_HEIGHT: u32 = 2400;

/// Axis-aligned box in device pixels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct PixelRect {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl PixelRect {
    pub fn new(x: i32, y: i32, width: i32, height: i32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center(&self) -> (i32, i32) {
        (self.x + self.width / 2, self.y + self.height / 2)
    }

    pub fn contains(&self, px: i32, py: i32) -> bool {
        px >= self.x && px < self.x + self.width.max(1) && py >= self.y && py < self.y + self.height.max(1)
    }
}

/// Bounding box in percent of the original screenshot.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct BBox {
    pub x: f64,
    pub y: f64,
    pub width: f64,
    pub height: f64,
    #[serde(default)]
    pub rotation: f64,
    #[serde(default = "default_width")]
    pub original_width: u32,
    #[serde(default = "default_height")]
    pub original_height: u32,
}

fn default_width() -> u32 {
    DEFAULT_SCREEN_WIDTH
}

fn default_height() -> u32 {
    DEFAULT_SCREEN_HEIGHT
}

impl BBox {
    pub fn to_pixels(&self) -> PixelRect {
        let w = f64::from(self.original_width);
        let h = f64::from(self.original_height);
        PixelRect {
            x: (self.x * w / 100.0).round() as i32,
            y: (self.y * h / 100.0).round() as i32,
            width: (self.width * w / 100.0).round() as i32,
            height: (self.height * h / 100.0).round() as i32,
        }
    }

    pub fn from_pixels(rect: PixelRect, original_width: u32, original_height: u32) -> Self {
        let w = f64::from(original_width);
        let h = f64::from(original_height);
        Self {
            x: f64::from(rect.x) * 100.0 / w,
            y: f64::from(rect.y) * 100.0 / h,
            width: f64::from(rect.width) * 100.0 / w,
            height: f64::from(rect.height) * 100.0 / h,
            rotation: 0.0,
            original_width,
            original_height,
        }
    }
}

/// One annotation record.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AreaReference {
    #[serde(default)]
    pub ocr: String,
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub bbox: Vec<BBox>,
    #[serde(default)]
    pub transcription: Vec<String>,
}

/// Region lookup with copy-on-write updates.
///
/// Readers take a cheap snapshot of the current table; learning a region
/// at runtime swaps in a new table without disturbing readers.
#[derive(Debug, Default)]
pub struct AreaLookup {
    refs: RwLock<Arc<Vec<AreaReference>>>,
}

impl AreaLookup {
    pub fn new(refs: Vec<AreaReference>) -> Self {
        Self {
            refs: RwLock::new(Arc::new(refs)),
        }
    }

    /// Load an annotation export.
    pub fn load(path: &Path) -> Result<Self, RegionError> {
        let content = std::fs::read_to_string(path).map_err(|source| RegionError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let refs: Vec<AreaReference> =
            serde_json::from_str(&content).map_err(|source| RegionError::Parse {
                path: path.to_path_buf(),
                source,
            })?;
        Ok(Self::new(refs))
    }

    /// A grid of boxes, one per name, for dry runs without an annotation file.
    pub fn synthetic<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let refs = names
            .into_iter()
            .enumerate()
            .map(|(i, name)| {
                let col = (i % 10) as f64;
                let row = ((i / 10) % 20) as f64;
                AreaReference {
                    ocr: "synthetic".to_string(),
                    id: i as i64,
                    bbox: vec![BBox {
                        x: col * 10.0,
                        y: row * 5.0,
                        width: 10.0,
                        height: 5.0,
                        rotation: 0.0,
                        original_width: DEFAULT_SCREEN_WIDTH,
                        original_height: DEFAULT_SCREEN_HEIGHT,
                    }],
                    transcription: vec![name.into()],
                }
            })
            .collect();
        Self::new(refs)
    }

    fn snapshot(&self) -> Arc<Vec<AreaReference>> {
        match self.refs.read() {
            Ok(guard) => Arc::clone(&*guard),
            Err(poisoned) => Arc::clone(&*poisoned.into_inner()),
        }
    }

    pub fn get(&self, name: &str) -> Option<PixelRect> {
        self.snapshot().iter().find_map(|area| {
            area.transcription
                .iter()
                .position(|label| label == name)
                .and_then(|i| area.bbox.get(i))
                .map(BBox::to_pixels)
        })
    }

    pub fn resolve(&self, name: &str) -> Result<PixelRect, RegionError> {
        self.get(name).ok_or_else(|| RegionError::Unknown {
            name: name.to_string(),
        })
    }

    pub fn contains(&self, name: &str) -> bool {
        self.get(name).is_some()
    }

    /// Every region name, in file order.
    pub fn names(&self) -> Vec<String> {
        self.snapshot()
            .iter()
            .flat_map(|area| area.transcription.iter().cloned())
            .collect()
    }

    /// Replace or append a region learned at runtime.
    pub fn add_temporary_region(&self, name: &str, rect: PixelRect) {
        let bbox = BBox::from_pixels(rect, DEFAULT_SCREEN_WIDTH, DEFAULT_SCREEN_HEIGHT);
        let mut table: Vec<AreaReference> = self.snapshot().as_ref().clone();

        let existing = table.iter().enumerate().find_map(|(i, area)| {
            area.transcription
                .iter()
                .position(|label| label == name)
                .filter(|&j| j < area.bbox.len())
                .map(|j| (i, j))
        });

        match existing {
            Some((i, j)) => {
                table[i].bbox[j] = bbox;
                info!(region = name, x = rect.x, y = rect.y, "Updated temporary region");
            }
            None => {
                table.push(AreaReference {
                    ocr: "generated".to_string(),
                    id: -1,
                    bbox: vec![bbox],
                    transcription: vec![name.to_string()],
                });
                info!(region = name, x = rect.x, y = rect.y, "Added temporary region");
            }
        }

        let mut guard = match self.refs.write() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        *guard = Arc::new(table);
    }
}
