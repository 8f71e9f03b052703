use std::f64::consts::PI;

/// Web Mercator breaks down at the poles; clamp latitudes to the usual square-world limit
pub const MAX_LAT: f64 = 85.05112878;

/// Latitude band shown by the world view; Antarctica is left out
const WORLD_SOUTH: f64 = -58.0;
const WORLD_NORTH: f64 = 84.0;

/// Viewport representing the visible map area and zoom level
#[derive(Clone, Debug, PartialEq)]
pub struct Viewport {
    /// Center longitude (-180 to 180)
    pub center_lon: f64,
    /// Center latitude (-85 to 85)
    pub center_lat: f64,
    /// Zoom level (1.0 = whole world spans the canvas width)
    pub zoom: f64,
    /// Canvas pixel width
    pub width: usize,
    /// Canvas pixel height
    pub height: usize,
}

impl Viewport {
    pub const MIN_ZOOM: f64 = 0.5;
    pub const MAX_ZOOM: f64 = 40.0;

    pub fn new(center_lon: f64, center_lat: f64, zoom: f64, width: usize, height: usize) -> Self {
        Self {
            center_lon,
            center_lat,
            zoom,
            width,
            height,
        }
    }

    /// All longitudes, with the inhabited latitude band fitted into the canvas
    pub fn world(width: usize, height: usize) -> Self {
        Self::fit_band(width, height, WORLD_SOUTH, WORLD_NORTH)
    }

    /// Centre on the latitude band [south, north] and zoom so it fits, never past zoom 1
    pub fn fit_band(width: usize, height: usize, south: f64, north: f64) -> Self {
        let (_, y_north) = Self::mercator(0.0, north);
        let (_, y_south) = Self::mercator(0.0, south);
        let span = (y_south - y_north).max(f64::EPSILON);
        let zoom = (height as f64 / (width.max(1) as f64 * span)).min(1.0);
        let y_mid = (y_north + y_south) / 2.0;
        let center_lat = (PI * (1.0 - 2.0 * y_mid)).sinh().atan() * 180.0 / PI;
        Self::new(0.0, center_lat, zoom, width, height)
    }

    pub fn resize(&mut self, width: usize, height: usize) {
        self.width = width;
        self.height = height;
    }

    /// Pan the viewport by pixel delta
    pub fn pan(&mut self, dx: i32, dy: i32) {
        let scale = 360.0 / (self.zoom * self.width.max(1) as f64);
        self.center_lon += dx as f64 * scale;
        self.center_lat -= dy as f64 * scale * 0.5;

        if self.center_lon > 180.0 {
            self.center_lon -= 360.0;
        } else if self.center_lon < -180.0 {
            self.center_lon += 360.0;
        }

        self.center_lat = self.center_lat.clamp(-MAX_LAT, MAX_LAT);
    }

    pub fn zoom_in(&mut self) {
        self.zoom = (self.zoom * 1.5).min(Self::MAX_ZOOM);
    }

    pub fn zoom_out(&mut self) {
        self.zoom = (self.zoom / 1.5).max(Self::MIN_ZOOM);
    }

    /// Zoom in towards a specific pixel location
    pub fn zoom_in_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, 1.5);
    }

    /// Zoom out from a specific pixel location
    pub fn zoom_out_at(&mut self, px: i32, py: i32) {
        self.zoom_at(px, py, 1.0 / 1.5);
    }

    /// Zoom by factor while keeping the point under the cursor fixed
    fn zoom_at(&mut self, px: i32, py: i32, factor: f64) {
        let (lon, lat) = self.unproject(px, py);
        self.zoom = (self.zoom * factor).clamp(Self::MIN_ZOOM, Self::MAX_ZOOM);
        let (new_px, new_py) = self.project(lon, lat);
        self.pan(new_px - px, new_py - py);
    }

    /// Normalized Web Mercator coordinates in [0, 1]
    #[inline]
    fn mercator(lon: f64, lat: f64) -> (f64, f64) {
        let x = (lon + 180.0) / 360.0;
        let lat_rad = lat.clamp(-MAX_LAT, MAX_LAT) * PI / 180.0;
        let y = (1.0 - (lat_rad.tan() + 1.0 / lat_rad.cos()).ln() / PI) / 2.0;
        (x, y)
    }

    #[inline]
    fn scale(&self) -> f64 {
        self.zoom * self.width as f64
    }

    /// Unproject pixel coordinates back to geographic coordinates (lon, lat)
    pub fn unproject(&self, px: i32, py: i32) -> (f64, f64) {
        let (center_x, center_y) = Self::mercator(self.center_lon, self.center_lat);
        let scale = self.scale();

        let x = (px as f64 - self.width as f64 / 2.0) / scale + center_x;
        let y = (py as f64 - self.height as f64 / 2.0) / scale + center_y;

        let lon = x * 360.0 - 180.0;
        let lat = (PI * (1.0 - 2.0 * y)).sinh().atan() * 180.0 / PI;
        (lon, lat)
    }

    /// Project to sub-pixel coordinates, for polygon filling
    #[inline]
    pub fn project_f(&self, lon: f64, lat: f64) -> (f64, f64) {
        let (x, y) = Self::mercator(lon, lat);
        let (center_x, center_y) = Self::mercator(self.center_lon, self.center_lat);
        let scale = self.scale();
        (
            (x - center_x) * scale + self.width as f64 / 2.0,
            (y - center_y) * scale + self.height as f64 / 2.0,
        )
    }

    /// Project a geographic coordinate (lon, lat) to pixel coordinates
    #[inline]
    pub fn project(&self, lon: f64, lat: f64) -> (i32, i32) {
        let (x, y) = self.project_f(lon, lat);
        (x.floor() as i32, y.floor() as i32)
    }

    /// Check if a projected box overlaps the canvas
    pub fn box_might_be_visible(&self, p1: (i32, i32), p2: (i32, i32)) -> bool {
        let min_x = p1.0.min(p2.0);
        let max_x = p1.0.max(p2.0);
        let min_y = p1.1.min(p2.1);
        let max_y = p1.1.max(p2.1);

        max_x >= 0 && min_x < self.width as i32 && max_y >= 0 && min_y < self.height as i32
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_project_center() {
        let vp = Viewport::new(0.0, 0.0, 1.0, 100, 100);
        assert_eq!(vp.project(0.0, 0.0), (50, 50));
    }

    #[test]
    fn test_pan() {
        let mut vp = Viewport::new(0.0, 0.0, 1.0, 100, 100);
        vp.pan(10, 0);
        assert!(vp.center_lon > 0.0);
    }

    #[test]
    fn test_unproject_inverts_project() {
        let vp = Viewport::world(400, 200);
        let (px, py) = vp.project_f(10.0, 60.0);
        let (lon, lat) = vp.unproject(px.round() as i32, py.round() as i32);
        assert!((lon - 10.0).abs() < 1.0);
        assert!((lat - 60.0).abs() < 1.0);
    }

    #[test]
    fn test_world_view_fits_band() {
        let vp = Viewport::world(400, 180);
        let (_, north) = vp.project_f(0.0, WORLD_NORTH);
        let (_, south) = vp.project_f(0.0, WORLD_SOUTH);
        assert!(north >= -0.5 && south <= 180.5, "{north} {south}");
        let (west, _) = vp.project_f(-180.0, 0.0);
        let (east, _) = vp.project_f(180.0, 0.0);
        assert!(west >= -0.5 && east <= 400.5);
    }

    #[test]
    fn test_poles_stay_finite() {
        let vp = Viewport::world(400, 200);
        let (_, y) = vp.project_f(0.0, -90.0);
        assert!(y.is_finite());
    }

    #[test]
    fn test_zoom_at_keeps_point_fixed() {
        let mut vp = Viewport::world(400, 200);
        let before = vp.unproject(300, 50);
        vp.zoom_in_at(300, 50);
        let after = vp.unproject(300, 50);
        // Latitude panning is linearised, so only longitude is held exactly
        assert!((before.0 - after.0).abs() < 1.0);
        assert!(vp.zoom > 1.0);
    }
}
