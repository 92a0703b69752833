//! WASM bindings for texform
//!
//! JavaScript-accessible entry points. Structured values cross the boundary
//! as JSON text; every fallible call returns a [`ConvertResult`] envelope.

#[cfg(feature = "wasm")]
use wasm_bindgen::prelude::*;

#[cfg(feature = "wasm")]
use serde::{Deserialize, Serialize};

#[cfg(feature = "wasm")]
use crate::core::{color, math, pgfplots, tikz};
#[cfg(feature = "wasm")]
use crate::core::preview::{PreviewOptions, Viewport};
#[cfg(feature = "wasm")]
use crate::utils::error::TranscodeResult;
#[cfg(feature = "wasm")]
use crate::utils::names;
#[cfg(feature = "wasm")]
use texform_model::{MathComponent, PlotConfig, Shape, ShapeId};

/// Preview settings passed from JavaScript. Missing fields take defaults.
#[cfg(feature = "wasm")]
#[derive(Serialize, Deserialize, Default)]
pub struct RenderOptions {
    #[serde(default)]
    pub viewport: Option<Viewport>,
    #[serde(default)]
    pub preview: Option<PreviewOptions>,
    /// Focused shape id (shapes only)
    #[serde(default)]
    pub selected: Option<u32>,
}

/// Safely serialize a value to JsValue, returning an error object on failure.
#[cfg(feature = "wasm")]
fn to_js_value<T: Serialize>(value: &T) -> JsValue {
    serde_wasm_bindgen::to_value(value).unwrap_or_else(|e| {
        let error_obj = ConvertResult::failure(format!("Serialization error: {}", e));
        serde_wasm_bindgen::to_value(&error_obj).unwrap_or(JsValue::NULL)
    })
}

/// Conversion result with additional metadata
#[cfg(feature = "wasm")]
#[derive(Serialize, Deserialize)]
pub struct ConvertResult {
    /// Generated text: LaTeX, SVG or JSON depending on the call
    pub output: String,
    /// Whether the conversion was successful
    pub success: bool,
    /// Error message if conversion failed
    pub error: Option<String>,
    /// Options or commands dropped while parsing
    pub warnings: Vec<String>,
}

#[cfg(feature = "wasm")]
impl ConvertResult {
    fn success(output: String, warnings: Vec<String>) -> Self {
        ConvertResult {
            output,
            success: true,
            error: None,
            warnings,
        }
    }

    fn failure(error: String) -> Self {
        ConvertResult {
            output: String::new(),
            success: false,
            error: Some(error),
            warnings: vec![],
        }
    }
}

/// Run a conversion, turning both errors and panics into a failed envelope.
#[cfg(feature = "wasm")]
fn guarded<F>(f: F) -> JsValue
where
    F: FnOnce() -> TranscodeResult<(String, Vec<String>)>,
{
    let result = match std::panic::catch_unwind(std::panic::AssertUnwindSafe(f)) {
        Ok(Ok((output, warnings))) => ConvertResult::success(output, warnings),
        Ok(Err(err)) => ConvertResult::failure(err.to_string()),
        Err(e) => {
            let error_msg = if let Some(s) = e.downcast_ref::<&str>() {
                format!("Conversion failed: {}", s)
            } else if let Some(s) = e.downcast_ref::<String>() {
                format!("Conversion failed: {}", s)
            } else {
                "Conversion failed: unknown error (check browser console for details)".to_string()
            };
            ConvertResult::failure(error_msg)
        }
    };
    to_js_value(&result)
}

#[cfg(feature = "wasm")]
fn render_options(options: JsValue) -> RenderOptions {
    serde_wasm_bindgen::from_value(options).unwrap_or_default()
}

/// Initialize panic hook for better error messages in browser console
#[cfg(feature = "wasm")]
#[wasm_bindgen(start)]
pub fn init() {
    console_error_panic_hook::set_once();
}

/// Get version information
#[cfg(feature = "wasm")]
#[wasm_bindgen(js_name = "getVersion")]
pub fn get_version() -> String {
    env!("CARGO_PKG_VERSION").to_string()
}

// ===== Math =====

/// Classify a math fragment; returns the kebab-case tag name.
#[cfg(feature = "wasm")]
#[wasm_bindgen(js_name = "classifyMath")]
pub fn classify_math_wasm(input: &str) -> String {
    math::classify(input).name().to_string()
}

/// Parse a math fragment into component JSON. An empty `tag` classifies.
#[cfg(feature = "wasm")]
#[wasm_bindgen(js_name = "parseMath")]
pub fn parse_math_wasm(input: &str, tag: &str) -> JsValue {
    guarded(|| {
        let component = if tag.trim().is_empty() {
            math::parse_auto(input)
        } else {
            math::parse(input, names::math_tag(tag)?)
        };
        Ok((serde_json::to_string(&component)?, vec![]))
    })
}

/// Build canonical LaTeX from component JSON.
#[cfg(feature = "wasm")]
#[wasm_bindgen(js_name = "buildMath")]
pub fn build_math_wasm(component_json: &str) -> JsValue {
    guarded(|| {
        let component: MathComponent = serde_json::from_str(component_json)?;
        Ok((math::build(&component), vec![]))
    })
}

// ===== Charts =====

/// Parse PGFPlots code into chart JSON. Dropped options become warnings.
#[cfg(feature = "wasm")]
#[wasm_bindgen(js_name = "parseChart")]
pub fn parse_chart_wasm(input: &str) -> JsValue {
    guarded(|| {
        let (config, report) = pgfplots::parse_with_report(input, &pgfplots::DataTables::new());
        let warnings = report
            .losses
            .iter()
            .map(|l| format!("{}: {}", l.context, l.name))
            .collect();
        match config {
            Some(config) => Ok((serde_json::to_string(&config)?, warnings)),
            None => pgfplots::try_parse(input).map(|_| (String::new(), warnings)),
        }
    })
}

/// Build canonical PGFPlots code from chart JSON.
#[cfg(feature = "wasm")]
#[wasm_bindgen(js_name = "buildChart")]
pub fn build_chart_wasm(config_json: &str) -> JsValue {
    guarded(|| {
        let config: PlotConfig = serde_json::from_str(config_json)?;
        Ok((pgfplots::build(&config), vec![]))
    })
}

/// Render chart JSON as SVG.
#[cfg(feature = "wasm")]
#[wasm_bindgen(js_name = "renderChart")]
pub fn render_chart_wasm(config_json: &str, options: JsValue) -> JsValue {
    let opts = render_options(options);
    guarded(|| {
        let config: PlotConfig = serde_json::from_str(config_json)?;
        let mut svg = String::new();
        pgfplots::render(
            &config,
            opts.viewport.unwrap_or_default(),
            &opts.preview.unwrap_or_default(),
            &mut svg,
        );
        Ok((svg, vec![]))
    })
}

// ===== Shapes =====

/// Generate TikZ code from a JSON shape list.
#[cfg(feature = "wasm")]
#[wasm_bindgen(js_name = "shapesToTikz")]
pub fn shapes_to_tikz_wasm(shapes_json: &str) -> JsValue {
    guarded(|| {
        let shapes: Vec<Shape> = serde_json::from_str(shapes_json)?;
        Ok((tikz::generate_code(&shapes), vec![]))
    })
}

/// Render a JSON shape list as SVG, optionally focused on one shape.
#[cfg(feature = "wasm")]
#[wasm_bindgen(js_name = "renderShapes")]
pub fn render_shapes_wasm(shapes_json: &str, options: JsValue) -> JsValue {
    let opts = render_options(options);
    guarded(|| {
        let shapes: Vec<Shape> = serde_json::from_str(shapes_json)?;
        let mut svg = String::new();
        tikz::render(
            &shapes,
            opts.viewport.unwrap_or_default(),
            opts.selected.map(ShapeId),
            &opts.preview.unwrap_or_default(),
            &mut svg,
        );
        Ok((svg, vec![]))
    })
}

// ===== Colors =====

/// Resolve an xcolor expression to `#rrggbb`.
#[cfg(feature = "wasm")]
#[wasm_bindgen(js_name = "colorToHex")]
pub fn color_to_hex_wasm(token: &str) -> String {
    color::resolve_hex(token)
}

/// Resolve an xcolor expression to CSS `rgb(...)`/`rgba(...)`.
#[cfg(feature = "wasm")]
#[wasm_bindgen(js_name = "colorToCss")]
pub fn color_to_css_wasm(token: &str) -> String {
    color::resolve_css(token)
}
