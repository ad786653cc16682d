//! 多边形区域 (Polygon zones)
//! 点在多边形内判定, 边界上的点视为在内部

/// 共线判定容差 (像素坐标下足够)
const EDGE_EPSILON: f64 = 1e-6;

/// 二维点 (像素坐标)
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct Point2 {
    x: f32,
    y: f32,
}

impl Point2 {
    pub fn new(x: f32, y: f32) -> Self {
        Self { x, y }
    }

    pub fn x(&self) -> f32 {
        self.x
    }

    pub fn y(&self) -> f32 {
        self.y
    }
}

impl From<(i32, i32)> for Point2 {
    fn from((x, y): (i32, i32)) -> Self {
        Self::new(x as f32, y as f32)
    }
}

impl From<[i32; 2]> for Point2 {
    fn from([x, y]: [i32; 2]) -> Self {
        Self::new(x as f32, y as f32)
    }
}

/// 闭合多边形区域, 启动时配置, 之后不可变
#[derive(Debug, Clone, PartialEq)]
pub struct Zone {
    name: String,
    vertices: Vec<Point2>,
}

impl Zone {
    pub fn new<P: Into<Point2> + Copy>(name: impl Into<String>, vertices: &[P]) -> Self {
        Self {
            name: name.into(),
            vertices: vertices.iter().map(|&v| v.into()).collect(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn vertices(&self) -> &[Point2] {
        &self.vertices
    }

    pub fn contains(&self, point: &Point2) -> bool {
        contains(&self.vertices, point)
    }
}

/// 点在多边形内判定 (射线法 + 边界检测)
///
/// 顶点按顺序给出, 最后一个顶点与第一个顶点自动闭合。
/// 少于3个顶点的多边形不包含任何点。
pub fn contains(polygon: &[Point2], point: &Point2) -> bool {
    let n = polygon.len();
    if n < 3 {
        return false;
    }

    let px = point.x as f64;
    let py = point.y as f64;

    let mut inside = false;
    let mut j = n - 1;
    for i in 0..n {
        let (ax, ay) = (polygon[i].x as f64, polygon[i].y as f64);
        let (bx, by) = (polygon[j].x as f64, polygon[j].y as f64);

        if on_segment((ax, ay), (bx, by), (px, py)) {
            return true;
        }

        if (ay > py) != (by > py) {
            let x_cross = ax + (py - ay) * (bx - ax) / (by - ay);
            if px < x_cross {
                inside = !inside;
            }
        }
        j = i;
    }

    inside
}

fn on_segment(a: (f64, f64), b: (f64, f64), p: (f64, f64)) -> bool {
    let cross = (b.0 - a.0) * (p.1 - a.1) - (b.1 - a.1) * (p.0 - a.0);
    if cross.abs() > EDGE_EPSILON {
        return false;
    }
    p.0 >= a.0.min(b.0) - EDGE_EPSILON
        && p.0 <= a.0.max(b.0) + EDGE_EPSILON
        && p.1 >= a.1.min(b.1) - EDGE_EPSILON
        && p.1 <= a.1.max(b.1) + EDGE_EPSILON
}

#[cfg(test)]
mod tests {
    use super::*;

    fn square() -> Zone {
        Zone::new("square", &[(0, 0), (10, 0), (10, 10), (0, 10)])
    }

    #[test]
    fn test_square_inside_and_outside() {
        let zone = square();
        assert!(zone.contains(&Point2::new(5.0, 5.0)));
        assert!(!zone.contains(&Point2::new(15.0, 15.0)));
    }

    #[test]
    fn test_boundary_is_inside() {
        let zone = square();
        assert!(zone.contains(&Point2::new(0.0, 5.0)));
        assert!(zone.contains(&Point2::new(10.0, 10.0))); // 顶点
        assert!(zone.contains(&Point2::new(5.0, 0.0)));
        assert!(!zone.contains(&Point2::new(10.5, 5.0)));
    }

    #[test]
    fn test_slanted_strip() {
        // 斜向条带 (与实际部署区域形状一致)
        let zone = Zone::new("strip", &[(250, 444), (211, 444), (473, 575), (514, 566)]);
        assert!(zone.contains(&Point2::new(490.0, 570.0)));
        assert!(!zone.contains(&Point2::new(400.0, 560.0)));
    }

    #[test]
    fn test_degenerate_polygon() {
        let line = Zone::new("line", &[(0, 0), (10, 10)]);
        assert!(!line.contains(&Point2::new(5.0, 5.0)));
        assert!(!contains(&[], &Point2::new(0.0, 0.0)));
    }
}
