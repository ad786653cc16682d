/// 工具模块
/// Utility modules
pub mod polygon;

pub use polygon::{contains, Point2, Zone};
