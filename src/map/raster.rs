use crate::map::country::Country;
use crate::map::geometry::fill_rings;
use crate::map::projection::Viewport;

/// Which country covers each pixel of a projected canvas
#[derive(Clone, Debug)]
pub struct OwnerRaster {
    width: usize,
    height: usize,
    owners: Vec<u32>,
}

impl OwnerRaster {
    const NONE: u32 = u32::MAX;

    pub fn new(width: usize, height: usize) -> Self {
        Self {
            width,
            height,
            owners: vec![Self::NONE; width * height],
        }
    }

    pub fn width(&self) -> usize {
        self.width
    }

    pub fn height(&self) -> usize {
        self.height
    }

    /// Index of the country owning a pixel
    #[inline]
    pub fn owner(&self, x: usize, y: usize) -> Option<usize> {
        if x >= self.width || y >= self.height {
            return None;
        }
        match self.owners[y * self.width + x] {
            Self::NONE => None,
            idx => Some(idx as usize),
        }
    }

    /// Owner at signed coordinates, for cursor lookups
    pub fn owner_signed(&self, x: i32, y: i32) -> Option<usize> {
        if x < 0 || y < 0 {
            return None;
        }
        self.owner(x as usize, y as usize)
    }
}

/// Scan-convert every country into a raster the size of the viewport.
/// Later countries win where polygons overlap.
pub fn rasterize(countries: &[Country], viewport: &Viewport) -> OwnerRaster {
    let mut raster = OwnerRaster::new(viewport.width, viewport.height);
    let mut projected: Vec<Vec<(f64, f64)>> = Vec::new();

    for (idx, country) in countries.iter().enumerate() {
        if country.bounds.is_empty() {
            continue;
        }
        let b = &country.bounds;
        let corner_a = viewport.project(b.min_lon, b.max_lat);
        let corner_b = viewport.project(b.max_lon, b.min_lat);
        if !viewport.box_might_be_visible(corner_a, corner_b) {
            continue;
        }

        for polygon in &country.polygons {
            projected.clear();
            projected.extend(polygon.iter().map(|ring| {
                ring.iter()
                    .map(|&(lon, lat)| viewport.project_f(lon, lat))
                    .collect::<Vec<_>>()
            }));
            let width = raster.width;
            let owners = &mut raster.owners;
            fill_rings(&projected, raster.width, raster.height, |x, y| {
                owners[y * width + x] = idx as u32;
            });
        }
    }

    raster
}
