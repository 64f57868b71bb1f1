#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod geom;

use std::fmt;

use geom::{
    AdaptiveOptions, BezierCurve, BezierPatch, JointId, Line3, PatchCage, PatchKind, Point3,
    PolyMesh, Skeleton, SkinMesh, SkinMode, SplineKind, Vec3, Viewport, primitives,
};
use serde::Serialize;
use wasm_bindgen::JsError;
use wasm_bindgen::prelude::*;

cfg_if::cfg_if! {
    if #[cfg(all(feature = "console_error_panic_hook", target_arch = "wasm32"))] {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            console_error_panic_hook::set_once();
            init_logger();
        }
    } else {
        #[wasm_bindgen(start)]
        pub fn initialize() {
            // no-op fallback when panic hook is disabled
            init_logger();
        }
    }
}

#[cfg(feature = "debug_logs")]
fn init_logger() {
    use log::LevelFilter;
    use wasm_bindgen_console_logger::DEFAULT_LOGGER;
    // a second `initialize` keeps the logger that is already installed
    if log::set_logger(&DEFAULT_LOGGER).is_ok() {
        log::set_max_level(LevelFilter::Debug);
    }
}

#[cfg(not(feature = "debug_logs"))]
fn init_logger() {
    // no-op fallback when debug logs are disabled
}

#[cfg(all(feature = "parallel", target_arch = "wasm32"))]
#[wasm_bindgen]
pub async fn initialize_parallel(worker_count: Option<u32>) -> Result<(), JsError> {
    let threads = worker_count
        .map(|count| count.max(1) as usize)
        .or_else(|| {
            std::thread::available_parallelism()
                .map(|value| value.get())
                .ok()
        })
        .unwrap_or(1);

    wasm_bindgen_rayon::init_thread_pool(threads)
        .await
        .map_err(|err| JsError::new(&format!("kon rayon threadpool niet initialiseren: {err}")))
}

#[macro_export]
macro_rules! debug_log {
    ($($t:tt)*) => {{
        #[cfg(feature = "debug_logs")]
        {
            #[cfg(target_arch = "wasm32")]
            {
                ::web_sys::console::log_1(&::wasm_bindgen::JsValue::from_str(&format!($($t)*)));
            }
            #[cfg(not(target_arch = "wasm32"))]
            {
                println!("{}", format!($($t)*));
            }
        }
    }};
}

#[derive(Debug, Serialize, Clone, PartialEq)]
#[serde(tag = "type")]
enum GeometryItem {
    Point {
        coordinates: [f64; 3],
    },
    Line {
        start: [f64; 3],
        end: [f64; 3],
    },
    Polyline {
        points: Vec<[f64; 3]>,
    },
    Mesh {
        vertices: Vec<[f64; 3]>,
        faces: Vec<Vec<u32>>,
    },
}

impl From<Line3> for GeometryItem {
    fn from(line: Line3) -> Self {
        GeometryItem::Line {
            start: line.start.to_array(),
            end: line.end.to_array(),
        }
    }
}

impl GeometryItem {
    fn polyline(points: &[Point3]) -> Self {
        GeometryItem::Polyline {
            points: points.iter().map(|p| p.to_array()).collect(),
        }
    }

    fn mesh(mesh: &PolyMesh) -> Result<Self, String> {
        let faces = mesh
            .faces
            .iter()
            .map(|face| {
                face.iter()
                    .map(|&i| u32::try_from(i).map_err(|_| format!("vertex index {i} past u32")))
                    .collect()
            })
            .collect::<Result<Vec<Vec<u32>>, String>>()?;
        Ok(GeometryItem::Mesh {
            vertices: mesh.vertices.iter().map(|p| p.to_array()).collect(),
            faces,
        })
    }
}

#[derive(Debug, Serialize)]
struct AdaptiveDrawing {
    items: Vec<GeometryItem>,
    segment_count: usize,
    capped_leaves: usize,
    max_depth: u32,
}

#[derive(Debug, Serialize)]
struct SubdivisionExport {
    mesh: GeometryItem,
    levels: usize,
    diagnostics: String,
}

/// Public entry point for consumers.
#[wasm_bindgen]
pub struct Engine {
    initialized: bool,
    /// Skelet in opbouw; wordt bij `bind_skeleton` aan de skin gekoppeld.
    pending_skeleton: Skeleton,
    skin: Option<SkinMesh>,
}

impl Default for Engine {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl Engine {
    #[wasm_bindgen(constructor)]
    pub fn new() -> Engine {
        Engine {
            initialized: true,
            pending_skeleton: Skeleton::new(),
            skin: None,
        }
    }

    /// Geeft terug of de engine de minimale initialisatie heeft doorlopen.
    #[wasm_bindgen]
    pub fn is_initialized(&self) -> bool {
        self.initialized
    }

    // ─────────────────────────────────────────────────────────────────────
    // Curves
    // ─────────────────────────────────────────────────────────────────────

    /// Splits een Bezier-curve (3 of 4 punten) op parameter `t`.
    #[wasm_bindgen]
    pub fn split_curve(&self, points: Vec<f64>, t: f64) -> Result<JsValue, JsValue> {
        let items = split_items(&points, t).map_err(to_js_error)?;
        to_js_value(&items)
    }

    /// Recursieve De Casteljau-tekening tot een vaste diepte.
    #[wasm_bindgen]
    pub fn de_casteljau_draw(&self, points: Vec<f64>, depth: u32) -> Result<JsValue, JsValue> {
        let items = recursive_items(&points, depth).map_err(to_js_error)?;
        to_js_value(&items)
    }

    /// Adaptieve onderverdeling tot elk segment vlak genoeg is.
    #[wasm_bindgen]
    pub fn adaptive_draw(&self, points: Vec<f64>, threshold: f64) -> Result<JsValue, JsValue> {
        let drawing = adaptive_items(&points, threshold).map_err(to_js_error)?;
        to_js_value(&drawing)
    }

    /// Evalueert een B-spline of Catmull-Rom spline; geeft vlakke xyz-samples terug.
    #[wasm_bindgen]
    pub fn evaluate_spline(
        &self,
        points: Vec<f64>,
        segments: usize,
        kind: &str,
        tension: Option<f64>,
    ) -> Result<Vec<f64>, JsValue> {
        spline_samples(&points, segments, kind, tension).map_err(to_js_error)
    }

    /// Raaklijnen van de Catmull-Rom spline in de binnenste knooppunten.
    #[wasm_bindgen]
    pub fn catmull_rom_tangents(&self, points: Vec<f64>, length: f64) -> Result<JsValue, JsValue> {
        let points = points_from_flat(&points).map_err(to_js_error)?;
        let items: Vec<GeometryItem> = geom::catmull_rom_tangents(&points, length)
            .into_iter()
            .map(GeometryItem::from)
            .collect();
        to_js_value(&items)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Patches & subdivision
    // ─────────────────────────────────────────────────────────────────────

    /// Tesselleert een 4x4 patch (48 getallen) als "bezier" of "spline".
    #[wasm_bindgen]
    pub fn tessellate_patch(
        &self,
        points: Vec<f64>,
        n: usize,
        kind: &str,
    ) -> Result<JsValue, JsValue> {
        let items = patch_items(&points, n, kind).map_err(to_js_error)?;
        to_js_value(&items)
    }

    /// Catmull-Clark op een polygoonmesh; `faces` is een array van index-arrays.
    #[wasm_bindgen]
    pub fn subdivide_mesh(
        &self,
        vertices: Vec<f64>,
        faces: JsValue,
        levels: usize,
    ) -> Result<JsValue, JsValue> {
        let faces: Vec<Vec<usize>> = serde_wasm_bindgen::from_value(faces)
            .map_err(|err| JsError::new(&err.to_string()))?;
        let export = subdivision_export(&vertices, faces, levels).map_err(to_js_error)?;
        to_js_value(&export)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Skinning
    // ─────────────────────────────────────────────────────────────────────

    /// Laad een driehoeksmesh als skin; een eerder skelet blijft in opbouw.
    #[wasm_bindgen]
    pub fn load_skin(&mut self, positions: Vec<f64>, indices: Vec<u32>) -> Result<(), JsValue> {
        let positions = points_from_flat(&positions).map_err(to_js_error)?;
        self.skin = Some(SkinMesh::new(positions, indices));
        Ok(())
    }

    /// Laad de standaardcilinder met het bijbehorende twee-botten-skelet.
    #[wasm_bindgen]
    pub fn load_cylinder_skin(&mut self) {
        let mesh = primitives::cylinder_x(primitives::CylinderOptions::default());
        let (skeleton, _, _) = primitives::two_bone_rig();
        self.skin = Some(SkinMesh::from_geom_mesh(&mesh));
        self.pending_skeleton = skeleton;
    }

    /// Voeg een gewricht toe; geeft de index van het nieuwe gewricht terug.
    #[wasm_bindgen]
    pub fn add_joint(
        &mut self,
        name: &str,
        parent: Option<usize>,
        origin: Vec<f64>,
        tip: Vec<f64>,
        axis: Vec<f64>,
    ) -> Result<usize, JsValue> {
        let id = self
            .pending_skeleton
            .add_joint(
                name,
                parent.map(JointId),
                vec3_from_slice(&origin).map_err(to_js_error)?,
                vec3_from_slice(&tip).map_err(to_js_error)?,
                vec3_from_slice(&axis).map_err(to_js_error)?,
            )
            .map_err(to_js_error)?;
        Ok(id.0)
    }

    /// Koppel het skelet in opbouw aan de skin ("rigid" of "linear").
    #[wasm_bindgen]
    pub fn bind_skeleton(&mut self, mode: &str) -> Result<(), JsValue> {
        let mode = SkinMode::parse(mode)
            .ok_or_else(|| js_error(&format!("onbekende skin-modus `{mode}`")))?;
        let skin = self
            .skin
            .as_mut()
            .ok_or_else(|| js_error("er is nog geen skin geladen"))?;
        skin.bind_skeleton(self.pending_skeleton.clone(), mode)
            .map_err(to_js_error)?;
        debug_log!(
            "bind_skeleton: {} gewrichten, {} vertices ({mode:?})",
            self.pending_skeleton.len(),
            skin.vertex_count()
        );
        Ok(())
    }

    #[wasm_bindgen]
    pub fn set_joint_angle(&mut self, joint: usize, degrees: f64) -> Result<(), JsValue> {
        self.skin_mut()?
            .set_joint_angle(JointId(joint), degrees)
            .map_err(to_js_error)
    }

    /// Vervormde posities als vlakke xyz-buffer.
    #[wasm_bindgen]
    pub fn deformed_positions(&self) -> Result<Vec<f64>, JsValue> {
        let skin = self.skin_ref()?;
        if skin.skeleton().is_none() {
            return Err(js_error("er is nog geen skelet gekoppeld"));
        }
        Ok(skin.deformed_positions_flat())
    }

    #[wasm_bindgen]
    pub fn skin_indices(&self) -> Result<Vec<u32>, JsValue> {
        Ok(self.skin_ref()?.indices().to_vec())
    }

    /// Gewichten van één gewricht per vertex, voor visualisatie.
    #[wasm_bindgen]
    pub fn joint_weights(&self, joint: usize) -> Result<Vec<f64>, JsValue> {
        self.skin_ref()?
            .joint_weights(JointId(joint))
            .map_err(to_js_error)
    }

    // ─────────────────────────────────────────────────────────────────────
    // Projection
    // ─────────────────────────────────────────────────────────────────────

    /// Projecteert lijnparen op een canvas; geeft `[x0, y0, x1, y1, ...]` terug.
    #[wasm_bindgen]
    pub fn project_wireframe(
        &self,
        positions: Vec<f64>,
        line_indices: Vec<u32>,
        width: f64,
        height: f64,
    ) -> Result<Vec<f64>, JsValue> {
        projected_segments(&positions, &line_indices, width, height).map_err(to_js_error)
    }
}

impl Engine {
    fn skin_ref(&self) -> Result<&SkinMesh, JsValue> {
        self.skin
            .as_ref()
            .ok_or_else(|| js_error("er is nog geen skin geladen"))
    }

    fn skin_mut(&mut self) -> Result<&mut SkinMesh, JsValue> {
        self.skin
            .as_mut()
            .ok_or_else(|| js_error("er is nog geen skin geladen"))
    }
}

fn points_from_flat(values: &[f64]) -> Result<Vec<Point3>, String> {
    if values.len() % 3 != 0 {
        return Err(format!(
            "verwacht xyz-drietallen, kreeg {} getallen",
            values.len()
        ));
    }
    Ok(values
        .chunks_exact(3)
        .map(|c| Point3::new(c[0], c[1], c[2]))
        .collect())
}

fn vec3_from_slice(values: &[f64]) -> Result<Vec3, String> {
    match values {
        [x, y, z] => Ok(Vec3::new(*x, *y, *z)),
        _ => Err(format!("verwacht 3 getallen, kreeg {}", values.len())),
    }
}

fn curve_from_flat(values: &[f64]) -> Result<BezierCurve, String> {
    let points = points_from_flat(values)?;
    BezierCurve::from_points(&points).map_err(|err| err.to_string())
}

fn split_items(values: &[f64], t: f64) -> Result<Vec<GeometryItem>, String> {
    let curve = curve_from_flat(values)?;
    let (left, right) = curve.split(t).map_err(|err| err.to_string())?;
    Ok(vec![
        GeometryItem::polyline(&left.control_points()),
        GeometryItem::polyline(&right.control_points()),
        GeometryItem::Point {
            coordinates: left.last().to_array(),
        },
    ])
}

fn recursive_items(values: &[f64], depth: u32) -> Result<Vec<GeometryItem>, String> {
    let curve = curve_from_flat(values)?;
    let leaves = geom::de_casteljau_segments(&curve, depth);
    let mut items: Vec<GeometryItem> = curve
        .control_polygon()
        .into_iter()
        .map(GeometryItem::from)
        .collect();
    items.push(GeometryItem::polyline(&geom::leaves_to_polyline(&leaves)));
    Ok(items)
}

fn adaptive_items(values: &[f64], threshold: f64) -> Result<AdaptiveDrawing, String> {
    let curve = curve_from_flat(values)?;
    let result = geom::adaptive_subdivide(&curve, AdaptiveOptions::with_threshold(threshold))
        .map_err(|err| err.to_string())?;

    let mut items = vec![GeometryItem::polyline(&result.polyline())];
    items.extend(result.markers.iter().map(|p| GeometryItem::Point {
        coordinates: p.to_array(),
    }));
    Ok(AdaptiveDrawing {
        items,
        segment_count: result.segments.len(),
        capped_leaves: result.capped_leaves,
        max_depth: result.max_depth_reached,
    })
}

fn spline_samples(
    values: &[f64],
    segments: usize,
    kind: &str,
    tension: Option<f64>,
) -> Result<Vec<f64>, String> {
    let kind = match kind.trim().to_ascii_lowercase().as_str() {
        "bspline" | "b-spline" => SplineKind::BSpline,
        "catmull-rom" | "catmullrom" | "catmull_rom" => SplineKind::CatmullRom {
            tension: tension.unwrap_or(SplineKind::DEFAULT_TENSION),
        },
        other => return Err(format!("onbekend spline-type `{other}`")),
    };
    let points = points_from_flat(values)?;
    let samples = geom::evaluate_spline(&points, segments, kind).map_err(|err| err.to_string())?;
    Ok(samples.iter().flat_map(|p| p.to_array()).collect())
}

fn patch_items(values: &[f64], n: usize, kind: &str) -> Result<Vec<GeometryItem>, String> {
    let kind = match kind.trim().to_ascii_lowercase().as_str() {
        "bezier" => PatchKind::Bezier,
        "spline" | "bspline" => PatchKind::Spline,
        other => return Err(format!("onbekend patch-type `{other}`")),
    };
    let patch = BezierPatch::from_flat(&points_from_flat(values)?).map_err(|err| err.to_string())?;
    let cage = PatchCage::from_patch(&patch);
    let mesh = geom::tessellate_cage(&cage, n, kind).map_err(|err| err.to_string())?;
    let net = geom::wire_cage(&cage).map_err(|err| err.to_string())?;
    Ok(vec![GeometryItem::mesh(&mesh)?, GeometryItem::mesh(&net)?])
}

fn subdivision_export(
    values: &[f64],
    faces: Vec<Vec<usize>>,
    levels: usize,
) -> Result<SubdivisionExport, String> {
    let mesh = PolyMesh::new(points_from_flat(values)?, faces);
    let (refined, diagnostics) =
        geom::subdivide(&mesh, levels).map_err(|err| err.to_string())?;
    debug_log!("subdivide_mesh: {} niveaus, {}", diagnostics.levels, diagnostics.output);
    Ok(SubdivisionExport {
        mesh: GeometryItem::mesh(&refined)?,
        levels: diagnostics.levels,
        diagnostics: diagnostics.output.to_string(),
    })
}

fn projected_segments(
    values: &[f64],
    line_indices: &[u32],
    width: f64,
    height: f64,
) -> Result<Vec<f64>, String> {
    let viewport = Viewport::new(width, height).map_err(|err| err.to_string())?;
    let positions = points_from_flat(values)?;
    let indices: Vec<usize> = line_indices.iter().map(|&i| i as usize).collect();
    let projected =
        geom::project_wireframe(&positions, &indices, viewport).map_err(|err| err.to_string())?;
    Ok(projected
        .segments
        .iter()
        .flat_map(|[a, b]| [a[0], a[1], b[0], b[1]])
        .collect())
}

fn to_js_value<T: Serialize>(value: &T) -> Result<JsValue, JsValue> {
    serde_wasm_bindgen::to_value(value).map_err(|err| JsError::new(&err.to_string()).into())
}

fn to_js_error<E: fmt::Display>(error: E) -> JsValue {
    js_error(&error.to_string())
}

fn js_error(message: &str) -> JsValue {
    #[cfg(target_arch = "wasm32")]
    {
        JsError::new(message).into()
    }
    #[cfg(not(target_arch = "wasm32"))]
    {
        let _ = message;
        JsValue::NULL
    }
}

#[cfg(test)]
mod tests {
    use super::{
        Engine, GeometryItem, adaptive_items, patch_items, points_from_flat, projected_segments,
        recursive_items, spline_samples, split_items, subdivision_export,
    };

    const ARCH: [f64; 12] = [
        0.0, 0.0, 0.0, 50.0, 150.0, 0.0, 250.0, 150.0, 0.0, 300.0, 0.0, 0.0,
    ];

    #[test]
    fn split_returns_both_halves_and_split_point() {
        let items = split_items(&ARCH, 0.5).unwrap();
        assert_eq!(items.len(), 3);
        match (&items[0], &items[1], &items[2]) {
            (
                GeometryItem::Polyline { points: left },
                GeometryItem::Polyline { points: right },
                GeometryItem::Point { coordinates },
            ) => {
                assert_eq!(left.len(), 4);
                assert_eq!(left[3], right[0]);
                assert_eq!(*coordinates, left[3]);
            }
            other => panic!("verwacht twee polylines en een punt, kreeg {other:?}"),
        }
    }

    #[test]
    fn split_rejects_wrong_point_count() {
        assert!(split_items(&ARCH[..6], 0.5).is_err());
        assert!(split_items(&ARCH[..11], 0.5).is_err());
    }

    #[test]
    fn recursive_draw_has_control_polygon_and_polyline() {
        let items = recursive_items(&ARCH, 3).unwrap();
        assert_eq!(items.len(), 4);
        assert!(matches!(items[0], GeometryItem::Line { .. }));
        match items.last() {
            Some(GeometryItem::Polyline { points }) => assert_eq!(points.len(), 1 + 3 * 8),
            other => panic!("verwacht Polyline, kreeg {other:?}"),
        }
    }

    #[test]
    fn adaptive_drawing_reports_markers() {
        let drawing = adaptive_items(&ARCH, 1.0).unwrap();
        assert_eq!(drawing.items.len(), 1 + 2 * drawing.segment_count);
        assert_eq!(drawing.capped_leaves, 0);
        assert!(adaptive_items(&ARCH, 0.0).is_err());
    }

    #[test]
    fn spline_kind_names_are_parsed() {
        let polygon: Vec<f64> = (0..6)
            .flat_map(|i| [f64::from(i), f64::from(i % 2), 0.0])
            .collect();
        assert_eq!(spline_samples(&polygon, 4, "bspline", None).unwrap().len(), 3 * 13);
        assert_eq!(
            spline_samples(&polygon, 4, "Catmull-Rom", Some(0.5))
                .unwrap()
                .len(),
            3 * 13
        );
        assert!(spline_samples(&polygon, 4, "nurbs", None).is_err());
    }

    #[test]
    fn patch_items_contain_surface_and_cage() {
        let flat: Vec<f64> = geom_flat_patch();
        let items = patch_items(&flat, 4, "bezier").unwrap();
        match (&items[0], &items[1]) {
            (
                GeometryItem::Mesh { vertices, faces },
                GeometryItem::Mesh {
                    vertices: net_vertices,
                    faces: net_faces,
                },
            ) => {
                assert_eq!(vertices.len(), 25);
                assert_eq!(faces.len(), 16);
                assert_eq!(net_vertices.len(), 16);
                assert_eq!(net_faces.len(), 9);
            }
            other => panic!("verwacht twee meshes, kreeg {other:?}"),
        }
        assert!(patch_items(&flat, 0, "bezier").is_err());
        assert!(patch_items(&flat[..45], 4, "bezier").is_err());
    }

    fn geom_flat_patch() -> Vec<f64> {
        crate::geom::flat_patch(0.5)
            .points
            .iter()
            .flatten()
            .flat_map(|p| p.to_array())
            .collect()
    }

    #[test]
    fn subdivision_export_of_cube() {
        let cube = crate::geom::primitives::cube();
        let flat: Vec<f64> = cube.vertices.iter().flat_map(|p| p.to_array()).collect();
        let export = subdivision_export(&flat, cube.faces, 1).unwrap();
        assert_eq!(export.levels, 1);
        assert!(export.diagnostics.starts_with("V=26 E=48 F=24"));
        assert!(subdivision_export(&flat, vec![vec![0, 1]], 1).is_err());
    }

    #[test]
    fn projection_flattens_segments() {
        let positions = [0.0, 0.0, 1.0, 1.0, 0.0, 2.0, 0.0, 1.0, 0.0];
        let out = projected_segments(&positions, &[0, 1, 1, 2], 800.0, 600.0).unwrap();
        // the second segment touches z = 0 and is skipped
        assert_eq!(out.len(), 4);
        assert!((out[0] - 400.0).abs() < 1e-9);
        assert!(projected_segments(&positions, &[0], 800.0, 600.0).is_err());
        assert!(points_from_flat(&positions[..4]).is_err());
    }

    #[test]
    fn cylinder_skin_round_trip() {
        let mut engine = Engine::new();
        assert!(engine.is_initialized());
        assert!(engine.deformed_positions().is_err());

        engine.load_cylinder_skin();
        assert!(engine.bind_skeleton("rigid").is_ok());
        let rest = engine.deformed_positions().unwrap();
        assert!(engine.set_joint_angle(1, 30.0).is_ok());
        let bent = engine.deformed_positions().unwrap();
        assert_eq!(rest.len(), bent.len());
        assert_ne!(rest, bent);
        assert_eq!(engine.joint_weights(0).unwrap().len(), rest.len() / 3);
    }

    #[test]
    fn custom_skeleton_is_built_joint_by_joint() {
        let mut engine = Engine::new();
        let positions = vec![0.5, 0.25, 0.0, 1.5, 0.25, 0.0];
        assert!(engine.load_skin(positions, Vec::new()).is_ok());
        let root = engine
            .add_joint("root", None, vec![0.0; 3], vec![1.0, 0.0, 0.0], vec![0.0, 0.0, 1.0])
            .unwrap();
        let child = engine
            .add_joint(
                "tip",
                Some(root),
                vec![1.0, 0.0, 0.0],
                vec![1.0, 0.0, 0.0],
                vec![0.0, 0.0, 1.0],
            )
            .unwrap();
        assert_eq!((root, child), (0, 1));
        assert!(engine.add_joint("bad", Some(9), vec![0.0; 3], vec![0.0; 3], vec![0.0, 0.0, 1.0]).is_err());
        assert!(engine.bind_skeleton("linear").is_ok());
        assert!(engine.bind_skeleton("dual-quat").is_err());
        assert_eq!(engine.deformed_positions().unwrap().len(), 6);
    }
}
