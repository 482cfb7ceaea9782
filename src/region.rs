use serde::Serialize;
use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Error)]
pub enum RegionError {
    #[error("split factor must be at least 1")]
    ZeroSplit,
    #[error("coordinate string is missing `{0}`")]
    MissingCoordinate(&'static str),
    #[error("cannot parse `{key}` value {value:?}")]
    BadCoordinate { key: &'static str, value: String },
}

/// Rectangular search area plus the running totals gathered while scanning it.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct GeoRegion {
    base: String,
    pub sw_lat: f64,
    pub sw_lng: f64,
    pub ne_lat: f64,
    pub ne_lng: f64,
    unit_count: u64,
    price_sum: u64,
}

impl GeoRegion {
    pub fn new(base: impl Into<String>, sw_lat: f64, sw_lng: f64, ne_lat: f64, ne_lng: f64) -> Self {
        Self {
            base: base.into(),
            sw_lat,
            sw_lng,
            ne_lat,
            ne_lng,
            unit_count: 0,
            price_sum: 0,
        }
    }

    /// Reads a map-search fragment such as
    /// `ne_lat=18.47&ne_lng=-66.10&sw_lat=18.45&sw_lng=-66.12`.
    pub fn from_coordinates(base: impl Into<String>, text: &str) -> Result<Self, RegionError> {
        let mut ne_lat = None;
        let mut ne_lng = None;
        let mut sw_lat = None;
        let mut sw_lng = None;

        for part in text.split('&') {
            let Some((key, value)) = part.trim().split_once('=') else {
                continue;
            };
            let (name, slot) = match key {
                "ne_lat" => ("ne_lat", &mut ne_lat),
                "ne_lng" => ("ne_lng", &mut ne_lng),
                "sw_lat" => ("sw_lat", &mut sw_lat),
                "sw_lng" => ("sw_lng", &mut sw_lng),
                _ => continue,
            };
            let parsed = value.trim().parse::<f64>().map_err(|_| RegionError::BadCoordinate {
                key: name,
                value: value.to_string(),
            })?;
            *slot = Some(parsed);
        }

        Ok(Self::new(
            base,
            sw_lat.ok_or(RegionError::MissingCoordinate("sw_lat"))?,
            sw_lng.ok_or(RegionError::MissingCoordinate("sw_lng"))?,
            ne_lat.ok_or(RegionError::MissingCoordinate("ne_lat"))?,
            ne_lng.ok_or(RegionError::MissingCoordinate("ne_lng"))?,
        ))
    }

    pub fn base(&self) -> &str {
        &self.base
    }

    /// Search URL restricted to this rectangle.
    pub fn query(&self) -> String {
        format!(
            "{}&ne_lat={}&ne_lng={}&sw_lat={}&sw_lng={}&search_by_map=true",
            self.base, self.ne_lat, self.ne_lng, self.sw_lat, self.sw_lng
        )
    }

    /// Cuts the rectangle into an `n` x `n` grid.
    ///
    /// Cells are emitted longitude column by column, latitude row by row
    /// within each column. Adjacent cells share the exact same edge value.
    pub fn split(&self, pieces: usize) -> Result<Vec<GeoRegion>, RegionError> {
        if pieces == 0 {
            return Err(RegionError::ZeroSplit);
        }
        if pieces == 1 {
            return Ok(vec![self.clone()]);
        }

        let lat_edge = |i: usize| interpolate(self.sw_lat, self.ne_lat, i, pieces);
        let lng_edge = |i: usize| interpolate(self.sw_lng, self.ne_lng, i, pieces);

        let mut cells = Vec::with_capacity(pieces * pieces);
        for col in 0..pieces {
            for row in 0..pieces {
                cells.push(GeoRegion::new(
                    self.base.clone(),
                    lat_edge(row),
                    lng_edge(col),
                    lat_edge(row + 1),
                    lng_edge(col + 1),
                ));
            }
        }
        Ok(cells)
    }

    pub fn area(&self) -> f64 {
        ((self.ne_lat - self.sw_lat) * (self.ne_lng - self.sw_lng)).abs()
    }

    /// Folds accepted listings from one query into the running totals.
    pub fn record(&mut self, units: u64, price_sum: u64) {
        self.unit_count += units;
        self.price_sum += price_sum;
    }

    pub fn unit_count(&self) -> u64 {
        self.unit_count
    }

    pub fn price_sum(&self) -> u64 {
        self.price_sum
    }

    /// `None` until at least one listing has been attributed to the region.
    pub fn average_price(&self) -> Option<f64> {
        if self.unit_count == 0 {
            None
        } else {
            Some(self.price_sum as f64 / self.unit_count as f64)
        }
    }
}

fn interpolate(start: f64, end: f64, step: usize, pieces: usize) -> f64 {
    if step == pieces {
        return end;
    }
    start + (end - start) * step as f64 / pieces as f64
}
