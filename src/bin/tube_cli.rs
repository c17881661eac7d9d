#[cfg(target_arch = "wasm32")]
fn main() {
}

#[cfg(not(target_arch = "wasm32"))]
fn main() {
    if let Err(err) = native::run() {
        eprintln!("tube_cli error: {err}");
        std::process::exit(1);
    }
}

#[cfg(not(target_arch = "wasm32"))]
mod native {
    use rand::rngs::StdRng;
    use rand::{Rng, SeedableRng};
    use std::fmt::Write as _;
    use std::fs::{self, File};
    use std::io::{BufWriter, Write};
    use std::path::{Path, PathBuf};
    use tube_engine::geom::{
        CapEnd, Point3, PolylineSet, TCoordMode, TubeConfig, TubeDiagnostics, TubeGenerator,
        TubeMesh, TubeOptions, Vec3, VaryRadius,
    };

    const SNAPSHOT_QUANTIZE: f64 = 1e-6;
    const SNAPSHOT_DECIMALS: usize = 6;

    const USAGE: &str = r#"tube_cli (tube-engine)

USAGE:
  tube_cli list
  tube_cli run <scenario|all> [options]

SCENARIOS:
  helix_constant
  helix_by_scalar
  flow_by_vector
  striped_octagon
  faceted_caps
  closed_ring
  random_walk

OPTIONS (run):
  --config <path>    JSON file with tube options overriding the scenario's own
  --out-dir <dir>    Write <scenario>.obj and/or <scenario>.snap to this dir (required for `all`)
  --obj <path>       Write OBJ (single scenario only)
  --snap <path>      Write golden-style snapshot (single scenario only)
  --no-obj           Skip OBJ when using --out-dir
  --no-snap          Skip snapshot when using --out-dir
  --overwrite        Overwrite existing output files
  -h, --help         Show this help
"#;

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
        let mut overrides: Option<String> = None;
        let mut overwrite = false;
        let mut write_obj = true;
        let mut write_snap = true;

        while let Some(arg) = args.next() {
            match arg.as_str() {
                "--config" => {
                    let path = PathBuf::from(args.value("--config")?);
                    let text = fs::read_to_string(&path)
                        .map_err(|e| format!("read {}: {e}", path.display()))?;
                    overrides = Some(text);
                }
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
        let overrides = overrides.as_deref();

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
                    let output = run_scenario(*scenario, overrides)?;
                    write_output_to_dir(&output, dir, write_obj, write_snap, overwrite)?;
                }
                return Ok(());
            }

            let scenario = Scenario::from_str(scenario_name.as_str())
                .ok_or_else(|| unknown_scenario(&scenario_name))?;
            let output = run_scenario(scenario, overrides)?;
            return write_output_to_dir(&output, dir, write_obj, write_snap, overwrite);
        }

        if scenario_name == "all" {
            return Err("`run all` requires --out-dir".to_string());
        }

        let scenario =
            Scenario::from_str(scenario_name.as_str()).ok_or_else(|| unknown_scenario(&scenario_name))?;
        let output = run_scenario(scenario, overrides)?;

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

        report(&output);
        Ok(())
    }

    fn write_output_to_dir(
        output: &ScenarioOutput,
        dir: &Path,
        write_obj: bool,
        write_snap: bool,
        overwrite: bool,
    ) -> Result<(), String> {
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

        report(output);
        Ok(())
    }

    fn report(output: &ScenarioOutput) {
        eprintln!(
            "{}: vertices={} triangles={} | {}",
            output.name,
            output.mesh.vertex_count(),
            output.mesh.triangle_count(),
            output.diag.summary()
        );
    }

    fn unknown_scenario(name: &str) -> String {
        let mut msg = String::new();
        let _ = writeln!(msg, "unknown scenario `{name}`\n\navailable scenarios:");
        for scenario in Scenario::ALL {
            let _ = writeln!(msg, "  {}", scenario.name());
        }
        msg
    }

    fn write_text_file(path: &Path, text: &str, overwrite: bool) -> Result<(), String> {
        if path.exists() && !overwrite {
            return Err(format!(
                "refusing to overwrite existing file {} (use --overwrite)",
                path.display()
            ));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| format!("create dir {}: {e}", parent.display()))?;
        }
        fs::write(path, normalize_snapshot_text(text)).map_err(|e| format!("write {}: {e}", path.display()))
    }

    fn write_obj_file(path: &Path, mesh: &TubeMesh, name: &str, overwrite: bool) -> Result<(), String> {
        mesh.validate().map_err(|e| format!("mesh validation failed: {e}"))?;

        if path.exists() && !overwrite {
            return Err(format!(
                "refusing to overwrite existing file {} (use --overwrite)",
                path.display()
            ));
        }
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).map_err(|e| format!("create dir {}: {e}", parent.display()))?;
        }

        let file = File::create(path).map_err(|e| format!("create {}: {e}", path.display()))?;
        let mut w = BufWriter::new(file);

        writeln!(w, "# tube-engine tube_cli").map_err(|e| format!("write obj: {e}"))?;
        writeln!(w, "o {name}").map_err(|e| format!("write obj: {e}"))?;

        for p in mesh.positions.iter().copied() {
            writeln!(w, "v {} {} {}", p[0], p[1], p[2]).map_err(|e| format!("write obj: {e}"))?;
        }

        if let Some(tcoords) = mesh.tcoords.as_ref() {
            for t in tcoords.iter().copied() {
                writeln!(w, "vt {t} 0").map_err(|e| format!("write obj: {e}"))?;
            }
        }

        for n in mesh.normals.iter().copied() {
            writeln!(w, "vn {} {} {}", n[0], n[1], n[2]).map_err(|e| format!("write obj: {e}"))?;
        }

        let has_tcoords = mesh.tcoords.is_some();

        for tri in mesh.to_triangles() {
            let [a, b, c] = tri.map(|i| i + 1);
            let written = if has_tcoords {
                writeln!(w, "f {a}/{a}/{a} {b}/{b}/{b} {c}/{c}/{c}")
            } else {
                writeln!(w, "f {a}//{a} {b}//{b} {c}//{c}")
            };
            written.map_err(|e| format!("write obj: {e}"))?;
        }

        w.flush().map_err(|e| format!("flush {}: {e}", path.display()))
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
        let value = if value == -0.0 { 0.0 } else { value };
        let q = (value / SNAPSHOT_QUANTIZE).round() * SNAPSHOT_QUANTIZE;
        if q == -0.0 { 0.0 } else { q }
    }

    fn write_f64(out: &mut String, value: f64) {
        let value = quantize_f64(value);
        let _ = write!(out, "{value:.SNAPSHOT_DECIMALS$}");
    }

    fn write_vec3_line(out: &mut String, prefix: &str, v: [f64; 3]) {
        let _ = write!(out, "{prefix} ");
        write_f64(out, v[0]);
        out.push(' ');
        write_f64(out, v[1]);
        out.push(' ');
        write_f64(out, v[2]);
        out.push('\n');
    }

    fn write_index_line(out: &mut String, prefix: &str, indices: &[u32]) {
        let _ = write!(out, "{prefix}");
        for index in indices {
            let _ = write!(out, " {index}");
        }
        out.push('\n');
    }

    fn write_tube_diagnostics(out: &mut String, diag: &TubeDiagnostics) {
        let _ = writeln!(out, "tube_diag.line_count {}", diag.line_count);
        let _ = writeln!(out, "tube_diag.tubed_line_count {}", diag.tubed_line_count);
        let _ = writeln!(out, "tube_diag.vertex_count {}", diag.vertex_count);
        let _ = writeln!(out, "tube_diag.strip_count {}", diag.strip_count);
        let _ = writeln!(out, "tube_diag.cap_count {}", diag.cap_count);
        let _ = writeln!(out, "tube_diag.triangle_count {}", diag.triangle_count);
        let _ = writeln!(out, "tube_diag.skipped_count {}", diag.skipped.len());
        for skipped in &diag.skipped {
            let _ = writeln!(out, "tube_diag.skipped.{} {}", skipped.line, skipped.defect);
        }
        let _ = writeln!(out, "tube_diag.warning_count {}", diag.warnings.len());
        for (idx, warning) in diag.warnings.iter().enumerate() {
            let _ = writeln!(out, "tube_diag.warning.{idx} {warning}");
        }
    }

    fn write_mesh(out: &mut String, mesh: &TubeMesh) -> Result<(), String> {
        mesh.validate().map_err(|e| format!("mesh validation failed: {e}"))?;

        let _ = writeln!(out, "mesh.vertex_count {}", mesh.vertex_count());
        let _ = writeln!(out, "mesh.triangle_count {}", mesh.triangle_count());
        let _ = writeln!(out, "mesh.has_tcoords {}", mesh.tcoords.is_some());
        let _ = writeln!(out, "mesh.has_point_scalars {}", mesh.point_scalars.is_some());

        let _ = writeln!(out, "mesh.positions {}", mesh.positions.len());
        for p in mesh.positions.iter().copied() {
            write_vec3_line(out, "p", p);
        }

        let _ = writeln!(out, "mesh.normals {}", mesh.normals.len());
        for n in mesh.normals.iter().copied() {
            write_vec3_line(out, "n", n);
        }

        if let Some(tcoords) = mesh.tcoords.as_ref() {
            let _ = writeln!(out, "mesh.tcoords {}", tcoords.len());
            for t in tcoords.iter().copied() {
                out.push_str("t ");
                write_f64(out, t);
                out.push('\n');
            }
        } else {
            let _ = writeln!(out, "mesh.tcoords none");
        }

        let _ = writeln!(out, "mesh.strips {}", mesh.strips.len());
        for strip in &mesh.strips {
            write_index_line(out, &format!("s {} {}", strip.line, strip.side), &strip.indices);
        }

        let _ = writeln!(out, "mesh.caps {}", mesh.caps.len());
        for cap in &mesh.caps {
            let end = match cap.end {
                CapEnd::Start => "start",
                CapEnd::End => "end",
            };
            write_index_line(out, &format!("c {} {end}", cap.line), &cap.indices);
        }

        Ok(())
    }

    fn snapshot(op: &str, sections: impl FnOnce(&mut String) -> Result<(), String>) -> Result<String, String> {
        let mut out = String::new();
        let _ = writeln!(out, "# tube-engine golden v1");
        let _ = writeln!(out, "op {op}");
        let _ = writeln!(out, "quantize {SNAPSHOT_QUANTIZE:.1e}");
        sections(&mut out)?;
        Ok(normalize_snapshot_text(&out))
    }

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Scenario {
        HelixConstant,
        HelixByScalar,
        FlowByVector,
        StripedOctagon,
        FacetedCaps,
        ClosedRing,
        RandomWalk,
    }

    impl Scenario {
        const ALL: &'static [Scenario] = &[
            Scenario::HelixConstant,
            Scenario::HelixByScalar,
            Scenario::FlowByVector,
            Scenario::StripedOctagon,
            Scenario::FacetedCaps,
            Scenario::ClosedRing,
            Scenario::RandomWalk,
        ];

        fn name(self) -> &'static str {
            match self {
                Scenario::HelixConstant => "helix_constant",
                Scenario::HelixByScalar => "helix_by_scalar",
                Scenario::FlowByVector => "flow_by_vector",
                Scenario::StripedOctagon => "striped_octagon",
                Scenario::FacetedCaps => "faceted_caps",
                Scenario::ClosedRing => "closed_ring",
                Scenario::RandomWalk => "random_walk",
            }
        }

        fn from_str(name: &str) -> Option<Self> {
            Self::ALL.iter().copied().find(|scenario| scenario.name() == name)
        }

        fn input(self) -> (PolylineSet, TubeOptions) {
            match self {
                Scenario::HelixConstant => scenario_helix_constant(),
                Scenario::HelixByScalar => scenario_helix_by_scalar(),
                Scenario::FlowByVector => scenario_flow_by_vector(),
                Scenario::StripedOctagon => scenario_striped_octagon(),
                Scenario::FacetedCaps => scenario_faceted_caps(),
                Scenario::ClosedRing => scenario_closed_ring(),
                Scenario::RandomWalk => scenario_random_walk(),
            }
        }
    }

    struct ScenarioOutput {
        name: &'static str,
        mesh: TubeMesh,
        diag: TubeDiagnostics,
        snapshot: String,
    }

    fn run_scenario(scenario: Scenario, overrides: Option<&str>) -> Result<ScenarioOutput, String> {
        let name = scenario.name();
        let (lines, options) = scenario.input();
        let config = match overrides {
            Some(text) => merge_options(&options, text)?,
            None => TubeConfig::new(options).map_err(|e| e.to_string())?,
        };

        let (mesh, diag) = TubeGenerator::new(config)
            .generate(&lines)
            .map_err(|e| format!("{name}: {e}"))?;

        let snap = snapshot(name, |out| {
            write_tube_diagnostics(out, &diag);
            write_mesh(out, &mesh)
        })?;

        Ok(ScenarioOutput {
            name,
            mesh,
            diag,
            snapshot: snap,
        })
    }

    /// Overlays the keys of a JSON object onto the scenario's options.
    fn merge_options(base: &TubeOptions, text: &str) -> Result<TubeConfig, String> {
        let mut merged = serde_json::to_value(base).map_err(|e| format!("encode options: {e}"))?;
        let patch: serde_json::Value =
            serde_json::from_str(text).map_err(|e| format!("invalid config json: {e}"))?;

        let (Some(target), Some(patch)) = (merged.as_object_mut(), patch.as_object()) else {
            return Err("config must be a JSON object".to_string());
        };
        for (key, value) in patch {
            target.insert(key.clone(), value.clone());
        }

        let options: TubeOptions =
            serde_json::from_value(merged).map_err(|e| format!("invalid tube options: {e}"))?;
        TubeConfig::new(options).map_err(|e| e.to_string())
    }

    fn helix(turns: f64, count: usize) -> Vec<Point3> {
        (0..count)
            .map(|i| {
                let t = turns * std::f64::consts::TAU * i as f64 / (count - 1) as f64;
                Point3::new(t.cos(), t.sin(), 0.15 * t)
            })
            .collect()
    }

    fn scenario_helix_constant() -> (PolylineSet, TubeOptions) {
        let lines = PolylineSet::from_points(&helix(2.0, 48));
        let options = TubeOptions {
            radius: 0.2,
            number_of_sides: 12,
            capping: true,
            ..TubeOptions::default()
        };
        (lines, options)
    }

    fn scenario_helix_by_scalar() -> (PolylineSet, TubeOptions) {
        let points = helix(2.0, 48);
        let scalars = (0..points.len()).map(|i| i as f64).collect();
        let lines = PolylineSet::from_points(&points).with_scalars(scalars);
        let options = TubeOptions {
            radius: 0.05,
            radius_factor: 4.0,
            vary_radius: VaryRadius::ByScalar,
            number_of_sides: 12,
            generate_tcoords: TCoordMode::NormalizedLength,
            ..TubeOptions::default()
        };
        (lines, options)
    }

    fn scenario_flow_by_vector() -> (PolylineSet, TubeOptions) {
        let points: Vec<Point3> = (0..40)
            .map(|i| {
                let x = f64::from(i) * 0.25;
                Point3::new(x, 0.3 * x.sin(), 0.0)
            })
            .collect();
        let vectors = points
            .iter()
            .map(|p| {
                let speed = 1.0 + 0.75 * (0.5 * p.x).sin();
                Vec3::new(speed, 0.0, 0.0).to_array()
            })
            .collect();
        let lines = PolylineSet::from_points(&points).with_vectors(vectors);
        let options = TubeOptions {
            radius: 0.1,
            vary_radius: VaryRadius::ByVector,
            number_of_sides: 16,
            capping: true,
            ..TubeOptions::default()
        };
        (lines, options)
    }

    fn scenario_striped_octagon() -> (PolylineSet, TubeOptions) {
        let points: Vec<Point3> = (0..6).map(|i| Point3::new(0.0, 0.0, f64::from(i))).collect();
        let lines = PolylineSet::from_points(&points);
        let options = TubeOptions {
            radius: 0.5,
            number_of_sides: 8,
            on_ratio: 2,
            offset: 1,
            ..TubeOptions::default()
        };
        (lines, options)
    }

    fn scenario_faceted_caps() -> (PolylineSet, TubeOptions) {
        let lines = PolylineSet::from_points(&[
            Point3::new(0.0, 0.0, 0.0),
            Point3::new(2.0, 0.0, 0.0),
            Point3::new(2.0, 2.0, 1.0),
            Point3::new(0.0, 3.0, 1.0),
        ]);
        let options = TubeOptions {
            radius: 0.3,
            number_of_sides: 6,
            sides_share_vertices: false,
            capping: true,
            ..TubeOptions::default()
        };
        (lines, options)
    }

    fn scenario_closed_ring() -> (PolylineSet, TubeOptions) {
        let count: u32 = 24;
        let mut lines = PolylineSet::new();
        lines.points = (0..count)
            .map(|i| {
                let t = std::f64::consts::TAU * f64::from(i) / f64::from(count);
                [2.0 * t.cos(), 2.0 * t.sin(), 0.0]
            })
            .collect();
        let mut ids: Vec<usize> = (0..count as usize).collect();
        ids.push(0);
        lines.push_line(ids);
        let options = TubeOptions {
            radius: 0.25,
            number_of_sides: 10,
            capping: true,
            generate_tcoords: TCoordMode::Length,
            texture_length: 2.0,
            ..TubeOptions::default()
        };
        (lines, options)
    }

    fn scenario_random_walk() -> (PolylineSet, TubeOptions) {
        let mut rng = StdRng::seed_from_u64(42);
        let mut lines = PolylineSet::new();
        for _ in 0..5 {
            let mut p = Point3::new(
                rng.random_range(-4.0..4.0),
                rng.random_range(-4.0..4.0),
                0.0,
            );
            let mut points = vec![p];
            for _ in 0..24 {
                let step = Vec3::new(
                    rng.random_range(-0.5..0.5),
                    rng.random_range(-0.5..0.5),
                    rng.random_range(0.1..0.5),
                );
                p = p.add_vec(step);
                points.push(p);
            }
            lines.push_polyline(&points);
        }
        let scalars = (0..lines.points.len()).map(|_| rng.random_range(0.0..1.0)).collect();
        let lines = lines.with_scalars(scalars);
        let options = TubeOptions {
            radius: 0.08,
            number_of_sides: 8,
            generate_tcoords: TCoordMode::Scalars,
            ..TubeOptions::default()
        };
        (lines, options)
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
            self.next()
                .ok_or_else(|| format!("missing value for {flag}"))
        }
    }
}
