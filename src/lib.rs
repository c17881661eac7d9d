#![warn(clippy::all, clippy::pedantic)]
#![allow(clippy::module_name_repetitions)]

pub mod geom;

use geom::{PolylineSet, TubeConfig, TubeDiagnostics, TubeGenerator, TubeMesh, TubeOptions};
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

/// Publiek toegangspunt voor JS: polylines in, buisoppervlak uit.
#[wasm_bindgen]
pub struct TubeEngine {
    config: TubeConfig,
    polylines: Option<PolylineSet>,
    mesh: Option<TubeMesh>,
    diagnostics: Option<TubeDiagnostics>,
}

impl Default for TubeEngine {
    fn default() -> Self {
        Self::new()
    }
}

#[wasm_bindgen]
impl TubeEngine {
    #[wasm_bindgen(constructor)]
    pub fn new() -> TubeEngine {
        TubeEngine {
            config: TubeConfig::default(),
            polylines: None,
            mesh: None,
            diagnostics: None,
        }
    }

    /// Stel de buisopties in vanuit een JSON-document. Ontbrekende velden
    /// krijgen hun standaardwaarde.
    #[wasm_bindgen]
    pub fn set_options_json(&mut self, json: &str) -> Result<(), JsValue> {
        let config = TubeConfig::from_json(json).map_err(|err| js_error(&err))?;
        self.apply_config(config);
        Ok(())
    }

    /// Stel de buisopties in vanuit een JS-object.
    #[wasm_bindgen]
    pub fn set_options(&mut self, options: JsValue) -> Result<(), JsValue> {
        let options: TubeOptions = serde_wasm_bindgen::from_value(options)
            .map_err(|err| js_error(&format!("ongeldige buisopties: {err}")))?;
        let config = TubeConfig::new(options).map_err(to_js_error)?;
        self.apply_config(config);
        Ok(())
    }

    /// Laad polylines (punten, lijnen en optionele attributen) uit JSON.
    #[wasm_bindgen]
    pub fn load_polylines_json(&mut self, json: &str) -> Result<(), JsValue> {
        let polylines = PolylineSet::from_json(json).map_err(|err| js_error(&err))?;
        debug_log!(
            "polylines geladen: {} punten, {} lijnen",
            polylines.points.len(),
            polylines.lines.len()
        );
        self.polylines = Some(polylines);
        self.clear_result();
        Ok(())
    }

    /// Genereer de buizen voor de geladen polylines.
    #[wasm_bindgen]
    pub fn generate(&mut self) -> Result<(), JsValue> {
        let polylines = self
            .polylines
            .as_ref()
            .ok_or_else(|| js_error("er zijn geen polylines geladen"))?;

        let generator = TubeGenerator::new(self.config.clone());
        let (mesh, diagnostics) = generator.generate(polylines).map_err(to_js_error)?;
        debug_log!("tube: {}", diagnostics.summary());

        self.mesh = Some(mesh);
        self.diagnostics = Some(diagnostics);
        Ok(())
    }

    #[wasm_bindgen]
    pub fn vertex_count(&self) -> usize {
        self.mesh.as_ref().map_or(0, TubeMesh::vertex_count)
    }

    #[wasm_bindgen]
    pub fn strip_count(&self) -> usize {
        self.mesh.as_ref().map_or(0, TubeMesh::strip_count)
    }

    #[wasm_bindgen]
    pub fn cap_count(&self) -> usize {
        self.mesh.as_ref().map_or(0, TubeMesh::cap_count)
    }

    #[wasm_bindgen]
    pub fn skipped_line_count(&self) -> usize {
        self.diagnostics
            .as_ref()
            .map_or(0, TubeDiagnostics::skipped_line_count)
    }

    /// Haal de volledige mesh op (punten, normalen, strips en kappen).
    #[wasm_bindgen]
    pub fn get_mesh(&self) -> Result<JsValue, JsValue> {
        let mesh = self
            .mesh
            .as_ref()
            .ok_or_else(|| js_error("er is nog geen buis gegenereerd"))?;
        serde_wasm_bindgen::to_value(mesh).map_err(|err| JsError::new(&err.to_string()).into())
    }

    /// Haal de diagnostiek van de laatste generatie op.
    #[wasm_bindgen]
    pub fn get_diagnostics(&self) -> Result<JsValue, JsValue> {
        let diagnostics = self
            .diagnostics
            .as_ref()
            .ok_or_else(|| js_error("er is nog geen buis gegenereerd"))?;
        serde_wasm_bindgen::to_value(diagnostics)
            .map_err(|err| JsError::new(&err.to_string()).into())
    }

    /// Posities als platte buffer `[x0, y0, z0, x1, ...]`.
    #[wasm_bindgen]
    pub fn get_positions(&self) -> Vec<f64> {
        self.mesh
            .as_ref()
            .map(|mesh| mesh.positions_flat().to_vec())
            .unwrap_or_default()
    }

    #[wasm_bindgen]
    pub fn get_normals(&self) -> Vec<f64> {
        self.mesh
            .as_ref()
            .map(|mesh| mesh.normals_flat().to_vec())
            .unwrap_or_default()
    }

    /// Strips en kappen uitgeschreven als driehoekslijst.
    #[wasm_bindgen]
    pub fn get_triangle_indices(&self) -> Vec<u32> {
        self.mesh
            .as_ref()
            .map(TubeMesh::triangle_indices)
            .unwrap_or_default()
    }

    #[wasm_bindgen]
    pub fn vary_radius_name(&self) -> String {
        self.config.vary_radius().as_str().to_string()
    }

    #[wasm_bindgen]
    pub fn tcoords_name(&self) -> String {
        self.config.generate_tcoords().as_str().to_string()
    }
}

fn to_js_error(err: impl std::fmt::Display) -> JsValue {
    js_error(&err.to_string())
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

impl TubeEngine {
    fn apply_config(&mut self, config: TubeConfig) {
        debug_log!("{}", config);
        self.config = config;
        self.clear_result();
    }

    fn clear_result(&mut self) {
        self.mesh = None;
        self.diagnostics = None;
    }

    /// De huidige, gevalideerde configuratie.
    #[must_use]
    pub fn config(&self) -> &TubeConfig {
        &self.config
    }

    /// De mesh van de laatste generatie, indien aanwezig.
    #[must_use]
    pub fn mesh(&self) -> Option<&TubeMesh> {
        self.mesh.as_ref()
    }

    #[must_use]
    pub fn diagnostics(&self) -> Option<&TubeDiagnostics> {
        self.diagnostics.as_ref()
    }
}
