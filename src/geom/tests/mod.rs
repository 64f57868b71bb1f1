mod test_curve_basic;
mod test_mesh_sanity;
mod test_spline_basic;
