#[cfg(target_arch = "wasm32")]
fn main() {}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    if let Err(err) = native::run() {
        eprintln!("mesh_cli error: {err}");
        std::process::exit(1);
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use cg_engine::geom::primitives::{self, CylinderOptions};
    use cg_engine::geom::{
        MeshDiagnostics, PatchCage, PatchKind, Point3, PolyMesh, SkinMesh, SkinMode,
        SubdDiagnostics, debug_patch, subdivide, tessellate_cage, wire_cage,
    };
    use std::fmt::Write as _;
    use std::fs::{self, File};
    use std::io::{BufWriter, Write};
    use std::path::{Path, PathBuf};

    const SNAPSHOT_QUANTIZE: f64 = 1e-6;
    const SNAPSHOT_DECIMALS: usize = 6;

    const PATCH_RESOLUTION: usize = 8;
    const SUBDIVISION_LEVELS: usize = 2;
    const ELBOW_BEND_DEGREES: f64 = 45.0;

    const USAGE: &str = r"mesh_cli (cg-engine)

USAGE:
  mesh_cli list
  mesh_cli run <scenario|all> [options]

SCENARIOS:
  bezier_patch_debug
  spline_patch_debug
  catmull_clark_cube
  catmull_clark_icosahedron
  skin_cylinder_bend

OPTIONS (run):
  --out-dir <dir>    Write <scenario>.obj and/or <scenario>.snap to this dir (required for `all`)
  --obj <path>       Write OBJ (single scenario only)
  --snap <path>      Write snapshot (single scenario only)
  --no-obj           Skip OBJ when using --out-dir
  --no-snap          Skip snapshot when using --out-dir
  --overwrite        Overwrite existing output files
  -h, --help         Show this help
";

    pub fn run() -> Result<(), String> {
        let args: Vec<String> = std::env::args().skip(1).collect();
        let mut args = Args::new(args);

        let Some(command) = args.next() else {
            print_usage();
            return Ok(());
        };

        match command.as_str() {
            "list" => {
                print_scenarios();
                Ok(())
            }
            "run" => cmd_run(&mut args),
            "-h" | "--help" | "help" => {
                print_usage();
                Ok(())
            }
            other => Err(format!("unknown command `{other}`\n\n{USAGE}")),
        }
    }

    fn print_usage() {
        println!("{USAGE}");
    }

    fn print_scenarios() {
        for scenario in Scenario::ALL {
            println!("{}", scenario.name());
        }
    }

    fn cmd_run(args: &mut Args) -> Result<(), String> {
        let scenario_name = args.next().ok_or("missing scenario name")?;

        let mut out_dir: Option<PathBuf> = None;
        let mut obj_path: Option<PathBuf> = None;
        let mut snap_path: Option<PathBuf> = None;
        let mut overwrite = false;
        let mut write_obj = true;
        let mut write_snap = true;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--out-dir" => out_dir = Some(PathBuf::from(args.value("--out-dir")?)),
                "--obj" => obj_path = Some(PathBuf::from(args.value("--obj")?)),
                "--snap" => snap_path = Some(PathBuf::from(args.value("--snap")?)),
                "--overwrite" => overwrite = true,
                "--no-obj" => write_obj = false,
                "--no-snap" => write_snap = false,
                "-h" | "--help" => {
                    print_usage();
                    return Ok(());
                }
                other => return Err(format!("unknown option `{other}`\n\n{USAGE}")),
            }
        }

        if let Some(dir) = out_dir.as_ref() {
            if obj_path.is_some() || snap_path.is_some() {
                return Err("use either --out-dir or --obj/--snap (not both)".to_string());
            }
            if !write_obj && !write_snap {
                return Err("nothing to write (both --no-obj and --no-snap set)".to_string());
            }

            fs::create_dir_all(dir).map_err(|e| format!("create out dir: {e}"))?;

            if scenario_name == "all" {
                for scenario in Scenario::ALL {
                    run_one_scenario_to_dir(*scenario, dir, write_obj, write_snap, overwrite)?;
                }
                return Ok(());
            }

            let scenario = Scenario::from_str(scenario_name.as_str())
                .ok_or_else(|| unknown_scenario(&scenario_name))?;
            return run_one_scenario_to_dir(scenario, dir, write_obj, write_snap, overwrite);
        }

        if scenario_name == "all" {
            return Err("`run all` requires --out-dir".to_string());
        }

        let scenario = Scenario::from_str(scenario_name.as_str())
            .ok_or_else(|| unknown_scenario(&scenario_name))?;
        let output = run_scenario(scenario)?;

        if let Some(path) = snap_path.as_deref() {
            write_text_file(path, &output.snapshot, overwrite)?;
            eprintln!("wrote {}", path.display());
        } else {
            print!("{}", output.snapshot);
        }

        if let Some(path) = obj_path.as_deref() {
            write_obj_file(path, &output.mesh, output.name, overwrite)?;
            eprintln!("wrote {}", path.display());
        }

        eprintln!("{}: {}", output.name, output.diag);
        Ok(())
    }

    fn run_one_scenario_to_dir(
        scenario: Scenario,
        dir: &Path,
        write_obj: bool,
        write_snap: bool,
        overwrite: bool,
    ) -> Result<(), String> {
        let output = run_scenario(scenario)?;

        if write_snap {
            let path = dir.join(format!("{}.snap", output.name));
            write_text_file(&path, &output.snapshot, overwrite)?;
            eprintln!("wrote {}", path.display());
        }

        if write_obj {
            let path = dir.join(format!("{}.obj", output.name));
            write_obj_file(&path, &output.mesh, output.name, overwrite)?;
            eprintln!("wrote {}", path.display());
        }

        eprintln!("{}: {}", output.name, output.diag);
        Ok(())
    }

    fn unknown_scenario(name: &str) -> String {
        let mut msg = format!("unknown scenario `{name}`\n\navailable scenarios:\n");
        for scenario in Scenario::ALL {
            let _ = writeln!(msg, "  {}", scenario.name());
        }
        msg
    }

    fn refuse_existing(path: &Path, overwrite: bool) -> Result<(), String> {
        if path.exists() && !overwrite {
            return Err(format!(
                "refusing to overwrite existing file {} (use --overwrite)",
                path.display()
            ));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .map_err(|e| format!("create dir {}: {e}", parent.display()))?;
        }
        Ok(())
    }

    fn write_text_file(path: &Path, text: &str, overwrite: bool) -> Result<(), String> {
        refuse_existing(path, overwrite)?;
        fs::write(path, normalize_snapshot_text(text))
            .map_err(|e| format!("write {}: {e}", path.display()))
    }

    /// Polygon faces are written as-is; OBJ has no arity limit.
    fn write_obj_file(path: &Path, mesh: &PolyMesh, name: &str, overwrite: bool) -> Result<(), String> {
        mesh.validate()
            .map_err(|e| format!("mesh validation failed: {e}"))?;
        refuse_existing(path, overwrite)?;

        let file = File::create(path).map_err(|e| format!("create {}: {e}", path.display()))?;
        let mut w = BufWriter::new(file);

        writeln!(w, "# cg-engine mesh_cli").map_err(|e| format!("write obj: {e}"))?;
        writeln!(w, "o {name}").map_err(|e| format!("write obj: {e}"))?;

        for p in &mesh.vertices {
            writeln!(w, "v {} {} {}", p.x, p.y, p.z).map_err(|e| format!("write obj: {e}"))?;
        }

        for face in &mesh.faces {
            let mut line = String::from("f");
            for &i in face {
                let _ = write!(line, " {}", i + 1);
            }
            writeln!(w, "{line}").map_err(|e| format!("write obj: {e}"))?;
        }

        w.flush()
            .map_err(|e| format!("flush {}: {e}", path.display()))
    }

    fn normalize_snapshot_text(text: &str) -> String {
        let normalized = text.replace("\r\n", "\n");
        if normalized.ends_with('\n') {
            normalized
        } else {
            format!("{normalized}\n")
        }
    }

    fn quantize_f64(value: f64) -> f64 {
        if !value.is_finite() {
            return value;
        }
        let q = (value / SNAPSHOT_QUANTIZE).round() * SNAPSHOT_QUANTIZE;
        // -0.0 and 0.0 print differently
        if q == 0.0 { 0.0 } else { q }
    }

    fn write_f64(out: &mut String, value: f64) {
        let value = quantize_f64(value);
        let _ = write!(out, "{value:.SNAPSHOT_DECIMALS$}");
    }

    fn write_point_line(out: &mut String, prefix: &str, p: Point3) {
        let _ = write!(out, "{prefix} ");
        write_f64(out, p.x);
        out.push(' ');
        write_f64(out, p.y);
        out.push(' ');
        write_f64(out, p.z);
        out.push('\n');
    }

    fn write_mesh_diagnostics(out: &mut String, diag: &MeshDiagnostics) {
        let _ = writeln!(out, "mesh_diag.vertex_count {}", diag.vertex_count);
        let _ = writeln!(out, "mesh_diag.face_count {}", diag.face_count);
        let _ = writeln!(out, "mesh_diag.edge_count {}", diag.edge_count);
        let _ = writeln!(out, "mesh_diag.boundary_edge_count {}", diag.boundary_edge_count);
        let _ = writeln!(
            out,
            "mesh_diag.non_manifold_edge_count {}",
            diag.non_manifold_edge_count
        );
        let _ = writeln!(out, "mesh_diag.non_quad_face_count {}", diag.non_quad_face_count);
        let _ = writeln!(out, "mesh_diag.euler {}", diag.euler_characteristic());
    }

    fn write_subdivision_diagnostics(out: &mut String, diag: &SubdDiagnostics) {
        let _ = writeln!(out, "subd.levels {}", diag.levels);
        let _ = writeln!(out, "subd.face_points {}", diag.face_points);
        let _ = writeln!(out, "subd.edge_points {}", diag.edge_points);
        let _ = writeln!(out, "subd.input {}", diag.input);
    }

    fn write_mesh(out: &mut String, mesh: &PolyMesh) {
        let _ = writeln!(out, "mesh.vertices {}", mesh.vertex_count());
        for p in &mesh.vertices {
            write_point_line(out, "p", *p);
        }

        let _ = writeln!(out, "mesh.faces {}", mesh.face_count());
        for face in &mesh.faces {
            out.push('f');
            for i in face {
                let _ = write!(out, " {i}");
            }
            out.push('\n');
        }
    }

    fn snapshot(op: &str, sections: impl FnOnce(&mut String)) -> String {
        let mut out = String::new();
        let _ = writeln!(out, "# cg-engine snapshot v1");
        let _ = writeln!(out, "op {op}");
        let _ = writeln!(out, "quantize {SNAPSHOT_QUANTIZE:.1e}");
        sections(&mut out);
        normalize_snapshot_text(&out)
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Scenario {
        BezierPatchDebug,
        SplinePatchDebug,
        CatmullClarkCube,
        CatmullClarkIcosahedron,
        SkinCylinderBend,
    }

    impl Scenario {
        const ALL: &'static [Scenario] = &[
            Scenario::BezierPatchDebug,
            Scenario::SplinePatchDebug,
            Scenario::CatmullClarkCube,
            Scenario::CatmullClarkIcosahedron,
            Scenario::SkinCylinderBend,
        ];

        fn name(self) -> &'static str {
            match self {
                Scenario::BezierPatchDebug => "bezier_patch_debug",
                Scenario::SplinePatchDebug => "spline_patch_debug",
                Scenario::CatmullClarkCube => "catmull_clark_cube",
                Scenario::CatmullClarkIcosahedron => "catmull_clark_icosahedron",
                Scenario::SkinCylinderBend => "skin_cylinder_bend",
            }
        }

        fn from_str(name: &str) -> Option<Self> {
            Self::ALL.iter().copied().find(|s| s.name() == name)
        }
    }

    struct ScenarioOutput {
        name: &'static str,
        mesh: PolyMesh,
        diag: MeshDiagnostics,
        snapshot: String,
    }

    fn run_scenario(scenario: Scenario) -> Result<ScenarioOutput, String> {
        match scenario {
            Scenario::BezierPatchDebug => scenario_patch(scenario, PatchKind::Bezier),
            Scenario::SplinePatchDebug => scenario_patch(scenario, PatchKind::Spline),
            Scenario::CatmullClarkCube => scenario_subdivision(scenario, &primitives::cube()),
            Scenario::CatmullClarkIcosahedron => {
                scenario_subdivision(scenario, &primitives::icosahedron())
            }
            Scenario::SkinCylinderBend => scenario_skin_cylinder_bend(),
        }
    }

    fn scenario_patch(scenario: Scenario, kind: PatchKind) -> Result<ScenarioOutput, String> {
        let cage = PatchCage::from_patch(&debug_patch());
        let mesh = tessellate_cage(&cage, PATCH_RESOLUTION, kind).map_err(|e| e.to_string())?;
        let net = wire_cage(&cage).map_err(|e| e.to_string())?;
        let diag = MeshDiagnostics::from_mesh(&mesh);

        let snap = snapshot(scenario.name(), |out| {
            let _ = writeln!(out, "patch.kind {kind:?}");
            let _ = writeln!(out, "patch.resolution {PATCH_RESOLUTION}");
            let _ = writeln!(out, "cage {}", MeshDiagnostics::from_mesh(&net));
            write_mesh_diagnostics(out, &diag);
            write_mesh(out, &mesh);
        });

        Ok(ScenarioOutput {
            name: scenario.name(),
            mesh,
            diag,
            snapshot: snap,
        })
    }

    fn scenario_subdivision(scenario: Scenario, base: &PolyMesh) -> Result<ScenarioOutput, String> {
        let (mesh, subd) = subdivide(base, SUBDIVISION_LEVELS).map_err(|e| e.to_string())?;

        let snap = snapshot(scenario.name(), |out| {
            write_subdivision_diagnostics(out, &subd);
            write_mesh_diagnostics(out, &subd.output);
            write_mesh(out, &mesh);
        });

        Ok(ScenarioOutput {
            name: scenario.name(),
            mesh,
            diag: subd.output,
            snapshot: snap,
        })
    }

    fn scenario_skin_cylinder_bend() -> Result<ScenarioOutput, String> {
        let cylinder = primitives::cylinder_x(CylinderOptions::default());
        let (skeleton, root, elbow) = primitives::two_bone_rig();

        let mut skin = SkinMesh::from_geom_mesh(&cylinder);
        skin.bind_skeleton(skeleton, SkinMode::Linear)
            .map_err(|e| e.to_string())?;
        skin.set_joint_angle(elbow, ELBOW_BEND_DEGREES)
            .map_err(|e| e.to_string())?;

        let faces = skin
            .indices()
            .chunks_exact(3)
            .map(|tri| tri.iter().map(|&i| i as usize).collect())
            .collect();
        let mesh = PolyMesh::new(skin.deformed_positions().to_vec(), faces);
        let diag = MeshDiagnostics::from_mesh(&mesh);
        let root_weights = skin.joint_weights(root).map_err(|e| e.to_string())?;

        let snap = snapshot("skin_cylinder_bend", |out| {
            let _ = writeln!(out, "skin.mode {:?}", skin.mode());
            let _ = write!(out, "skin.elbow_degrees ");
            write_f64(out, ELBOW_BEND_DEGREES);
            out.push('\n');
            let _ = writeln!(out, "skin.root_weights {}", root_weights.len());
            for w in &root_weights {
                let _ = write!(out, "w ");
                write_f64(out, *w);
                out.push('\n');
            }
            write_mesh_diagnostics(out, &diag);
            write_mesh(out, &mesh);
        });

        Ok(ScenarioOutput {
            name: "skin_cylinder_bend",
            mesh,
            diag,
            snapshot: snap,
        })
    }

    struct Args {
        args: Vec<String>,
        pos: usize,
    }

    impl Args {
        fn new(args: Vec<String>) -> Self {
            Self { args, pos: 0 }
        }

        fn next(&mut self) -> Option<String> {
            let arg = self.args.get(self.pos)?.clone();
            self.pos += 1;
            Some(arg)
        }

        fn value(&mut self, flag: &str) -> Result<String, String> {
            self.next().ok_or_else(|| format!("missing value for {flag}"))
        }
    }
}
