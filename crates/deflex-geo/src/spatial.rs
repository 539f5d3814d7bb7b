use crate::index::RegionIndex;
use deflex_core::config::SpatialJoinConfig;
use deflex_core::error::Result;
use deflex_core::models::RegionSet;
use serde_json::json;

/// Buffer growth for points that fall outside every region, in degrees
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct JoinOptions {
    /// Buffer increment per pass
    pub step: f64,
    /// Largest buffer tried
    pub limit: f64,
}

impl Default for JoinOptions {
    fn default() -> Self {
        Self { step: 0.05, limit: 1.0 }
    }
}

impl From<SpatialJoinConfig> for JoinOptions {
    fn from(config: SpatialJoinConfig) -> Self {
        Self { step: config.step, limit: config.limit }
    }
}

/// Counts of a spatial join run
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct JoinSummary {
    pub total: usize,
    /// Points inside a region
    pub within: usize,
    /// Points assigned through a buffer
    pub buffered: usize,
    /// Points without region, including points without coordinates
    pub unmatched: usize,
    /// Largest buffer that produced a match
    pub max_buffer: f64,
}

impl JoinSummary {
    pub fn to_json(&self) -> serde_json::Value {
        json!({
            "total": self.total,
            "within": self.within,
            "buffered": self.buffered,
            "unmatched": self.unmatched,
            "max_buffer": self.max_buffer,
        })
    }
}

/// Region label per input point, in input order
#[derive(Debug, Clone, PartialEq)]
pub struct JoinResult {
    pub labels: Vec<Option<String>>,
    pub summary: JoinSummary,
}

/// Assign every point to a region, buffering points that miss all polygons
///
/// Points are `[lon, lat]`. A point first gets the region it lies within.
/// Remaining points are buffered by `step`, `2 * step`, ... up to `limit`
/// and take the nearest region their buffer reaches.
pub fn spatial_join_with_buffer(
    points: &[Option<[f64; 2]>],
    regions: &RegionSet,
    options: JoinOptions,
) -> Result<JoinResult> {
    let index = RegionIndex::from_regions(regions)?;
    Ok(join_indexed(points, &index, options))
}

/// Same as [`spatial_join_with_buffer`] with a prebuilt index
pub fn join_indexed(
    points: &[Option<[f64; 2]>],
    index: &RegionIndex,
    options: JoinOptions,
) -> JoinResult {
    tracing::info!("Doing spatial join of {} points with {} regions", points.len(), index.len());

    let mut summary = JoinSummary { total: points.len(), ..Default::default() };
    let mut labels: Vec<Option<String>> = points
        .iter()
        .map(|p| p.and_then(|p| index.locate(p)).map(str::to_string))
        .collect();
    summary.within = labels.iter().filter(|l| l.is_some()).count();

    let mut pending: Vec<usize> = (0..points.len())
        .filter(|&i| labels[i].is_none() && points[i].is_some())
        .collect();

    let mut pass = 1;
    while !pending.is_empty() && options.step > 0.0 {
        let radius = options.step * pass as f64;
        if radius > options.limit + f64::EPSILON {
            break;
        }
        tracing::debug!("Buffer {:.3}: {} points left", radius, pending.len());

        pending.retain(|&i| {
            let Some(point) = points[i] else {
                return false;
            };
            match index.nearest_within(point, radius) {
                Some(name) => {
                    labels[i] = Some(name.to_string());
                    summary.buffered += 1;
                    summary.max_buffer = radius;
                    false
                }
                None => true,
            }
        });
        pass += 1;
    }

    summary.unmatched = labels.iter().filter(|l| l.is_none()).count();
    if summary.unmatched > 0 {
        tracing::warn!(
            "{} of {} points could not be assigned to any region (buffer limit {})",
            summary.unmatched,
            summary.total,
            options.limit
        );
    } else {
        tracing::info!("All points assigned, {} of them through a buffer", summary.buffered);
    }

    JoinResult { labels, summary }
}
