mod core;
mod curve;
mod diagnostics;
mod mesh;
mod patch;
pub mod primitives;
mod projection;
mod shading;
mod skeleton;
mod skinning;
mod spline;
mod subdivision;

pub use core::{BBox, Point3, Tolerance, Transform, Vec3};
pub use curve::{
    AdaptiveOptions, AdaptiveSubdivision, BezierCurve, CubicBezier3, Curve3, CurveError, Line3,
    MAX_RECURSIVE_DEPTH, QuadraticBezier3, adaptive_subdivide, cubic_bernstein,
    de_casteljau_segments, leaves_to_polyline, tessellate_curve_uniform,
};
pub use diagnostics::MeshDiagnostics;
pub use mesh::{GeomMesh, MeshError, PolyMesh, normalized_edge_pair};
pub use patch::{
    BezierPatch, PatchCage, PatchError, PatchKind, debug_patch, flat_patch, tessellate_bezier_patch,
    tessellate_cage, tessellate_spline_patch, wire_cage,
};
pub use projection::{
    ProjectedWireframe, ProjectionError, Viewport, perspective_divide, project_wireframe,
};
pub use shading::{PhongMaterial, PointLight, shade_lambert, shade_phong};
pub use skeleton::{Joint, JointId, Skeleton, SkeletonError};
pub use skinning::{
    SkinError, SkinMesh, SkinMode, SkinningOptions, compute_linear_weights,
    compute_rigid_weights, distance_to_segment,
};
pub use spline::{
    EndCondition, SplineKind, bspline_basis, catmull_rom_tangents, clamped_parameters,
    evaluate_catmull_rom, evaluate_clamped_spline, evaluate_cubic_spline_segment, evaluate_spline,
};
pub use subdivision::{SubdDiagnostics, SubdError, catmull_clark, subdivide};

#[cfg(test)]
mod tests;
