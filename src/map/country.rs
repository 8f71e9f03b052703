/// A closed ring of (lon, lat) vertices
pub type Ring = Vec<(f64, f64)>;

/// A polygon: exterior ring first, then holes
pub type Polygon = Vec<Ring>;

/// Lon/lat bounding box
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Bounds {
    pub min_lon: f64,
    pub min_lat: f64,
    pub max_lon: f64,
    pub max_lat: f64,
}

impl Bounds {
    pub const EMPTY: Bounds = Bounds {
        min_lon: f64::INFINITY,
        min_lat: f64::INFINITY,
        max_lon: f64::NEG_INFINITY,
        max_lat: f64::NEG_INFINITY,
    };

    pub fn extend(&mut self, lon: f64, lat: f64) {
        self.min_lon = self.min_lon.min(lon);
        self.min_lat = self.min_lat.min(lat);
        self.max_lon = self.max_lon.max(lon);
        self.max_lat = self.max_lat.max(lat);
    }

    pub fn is_empty(&self) -> bool {
        self.min_lon > self.max_lon
    }
}

/// One feature of the countries layer
#[derive(Clone, Debug)]
pub struct Country {
    /// Display name
    pub name: String,
    /// Sovereign name, the key production figures join on
    pub sovereign: String,
    pub polygons: Vec<Polygon>,
    pub bounds: Bounds,
}

impl Country {
    pub fn new(name: String, sovereign: String, polygons: Vec<Polygon>) -> Self {
        let mut bounds = Bounds::EMPTY;
        for &(lon, lat) in polygons.iter().flatten().flatten() {
            bounds.extend(lon, lat);
        }
        Self {
            name,
            sovereign,
            polygons,
            bounds,
        }
    }

    /// Exterior rings, the outlines drawn on the map
    pub fn outlines(&self) -> impl Iterator<Item = &Ring> + '_ {
        self.polygons.iter().filter_map(|p| p.first())
    }

    /// Axis-aligned square country, for tests and benches
    #[doc(hidden)]
    pub fn square(sovereign: &str, lon: f64, lat: f64, size: f64) -> Self {
        let ring = vec![
            (lon, lat),
            (lon + size, lat),
            (lon + size, lat + size),
            (lon, lat + size),
            (lon, lat),
        ];
        Self::new(sovereign.to_string(), sovereign.to_string(), vec![vec![ring]])
    }
}
