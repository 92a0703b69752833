use serde::{Deserialize, Serialize};

/// Stable identity of a series. Assigned once by [`PlotConfig::push_series`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SeriesId(pub u32);

impl std::fmt::Display for SeriesId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "series-{}", self.0)
    }
}

/// Axis-level settings. Every field is optional text; empty means "auto".
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct AxisConfig {
    pub title: String,
    pub xlabel: String,
    pub ylabel: String,
    pub zlabel: String,
    pub xmin: String,
    pub xmax: String,
    pub ymin: String,
    pub ymax: String,
    /// `major`, `minor`, `both` or `none`.
    pub grid: String,
    /// PGFPlots `legend pos`, e.g. `north west`.
    pub legend_pos: String,
    pub width: String,
    pub height: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum LineStyle {
    #[default]
    Solid,
    Dashed,
    Dotted,
    DashDotted,
}

impl LineStyle {
    /// TikZ option keyword.
    pub fn keyword(self) -> &'static str {
        match self {
            LineStyle::Solid => "solid",
            LineStyle::Dashed => "dashed",
            LineStyle::Dotted => "dotted",
            LineStyle::DashDotted => "dashdotted",
        }
    }
}

/// Styling shared by every series kind.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct SeriesStyle {
    /// Color token (`blue`, `red!50!black`, `#ff8800`). Empty uses the cycle list.
    pub color: String,
    /// TeX dimension, e.g. `1pt`. Empty keeps the default width.
    pub line_width: String,
    pub line_style: LineStyle,
    /// PGFPlots mark name (`*`, `o`, `square*`). Empty draws no marks.
    pub marker: String,
    /// Legend entry; empty means the series has none.
    pub legend: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ChartType {
    #[default]
    Line,
    Scatter,
    Bar,
    Area,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SurfaceStyle {
    #[default]
    Surf,
    Mesh,
}

impl SurfaceStyle {
    pub fn keyword(self) -> &'static str {
        match self {
            SurfaceStyle::Surf => "surf",
            SurfaceStyle::Mesh => "mesh",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum SeriesKind {
    Function2d {
        expression: String,
        domain: [f64; 2],
        samples: u32,
    },
    Function3d {
        expression: String,
        domain_x: [f64; 2],
        domain_y: [f64; 2],
        samples: u32,
        plot_style: SurfaceStyle,
        colormap: String,
    },
    Data {
        chart_type: ChartType,
        /// Tabular text, one row per line.
        data: String,
        x_column: String,
        y_column: String,
        has_header: bool,
    },
}

impl SeriesKind {
    pub fn function_2d(expression: impl Into<String>) -> Self {
        SeriesKind::Function2d {
            expression: expression.into(),
            domain: [-5.0, 5.0],
            samples: 100,
        }
    }

    pub fn function_3d(expression: impl Into<String>) -> Self {
        SeriesKind::Function3d {
            expression: expression.into(),
            domain_x: [-2.0, 2.0],
            domain_y: [-2.0, 2.0],
            samples: 25,
            plot_style: SurfaceStyle::Surf,
            colormap: String::new(),
        }
    }

    pub fn data(chart_type: ChartType, data: impl Into<String>) -> Self {
        SeriesKind::Data {
            chart_type,
            data: data.into(),
            x_column: String::new(),
            y_column: String::new(),
            has_header: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PlotSeries {
    pub id: SeriesId,
    #[serde(default)]
    pub style: SeriesStyle,
    pub kind: SeriesKind,
}

/// An axis with its ordered series.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct PlotConfig {
    #[serde(default)]
    pub axis: AxisConfig,
    #[serde(default)]
    pub plots: Vec<PlotSeries>,
    #[serde(default)]
    next_id: u32,
}

impl PlotConfig {
    pub fn new(axis: AxisConfig) -> Self {
        PlotConfig {
            axis,
            plots: Vec::new(),
            next_id: 0,
        }
    }

    /// Append a series and give it a fresh id.
    pub fn push_series(&mut self, style: SeriesStyle, kind: SeriesKind) -> SeriesId {
        // Deserialized configs may carry ids past the stored counter.
        let floor = self.plots.iter().map(|p| p.id.0.saturating_add(1)).max().unwrap_or(0);
        let id = SeriesId(self.next_id.max(floor));
        self.next_id = id.0.saturating_add(1);
        self.plots.push(PlotSeries { id, style, kind });
        id
    }

    pub fn remove_series(&mut self, id: SeriesId) -> Option<PlotSeries> {
        let index = self.plots.iter().position(|p| p.id == id)?;
        Some(self.plots.remove(index))
    }

    pub fn series(&self, id: SeriesId) -> Option<&PlotSeries> {
        self.plots.iter().find(|p| p.id == id)
    }

    pub fn series_mut(&mut self, id: SeriesId) -> Option<&mut PlotSeries> {
        self.plots.iter_mut().find(|p| p.id == id)
    }

    /// Move a series to `index` (clamped), keeping the relative order of the rest.
    pub fn move_series(&mut self, id: SeriesId, index: usize) -> bool {
        let Some(from) = self.plots.iter().position(|p| p.id == id) else {
            return false;
        };
        let series = self.plots.remove(from);
        let index = index.min(self.plots.len());
        self.plots.insert(index, series);
        true
    }

    pub fn has_legend(&self) -> bool {
        self.plots.iter().any(|p| !p.style.legend.trim().is_empty())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn ids_are_assigned_once_and_never_reused() {
        let mut cfg = PlotConfig::default();
        let a = cfg.push_series(SeriesStyle::default(), SeriesKind::function_2d("x"));
        let b = cfg.push_series(SeriesStyle::default(), SeriesKind::function_2d("x^2"));
        assert_ne!(a, b);
        cfg.remove_series(b);
        let c = cfg.push_series(SeriesStyle::default(), SeriesKind::function_2d("x^3"));
        assert_ne!(b, c);
        assert_eq!(cfg.plots.iter().map(|p| p.id).collect::<Vec<_>>(), vec![a, c]);
    }

    #[test]
    fn move_series_keeps_ids() {
        let mut cfg = PlotConfig::default();
        let a = cfg.push_series(SeriesStyle::default(), SeriesKind::function_2d("a"));
        let b = cfg.push_series(SeriesStyle::default(), SeriesKind::function_2d("b"));
        assert!(cfg.move_series(b, 0));
        assert_eq!(cfg.plots[0].id, b);
        assert_eq!(cfg.plots[1].id, a);
        assert!(!cfg.move_series(SeriesId(42), 0));
    }

    #[test]
    fn deserialized_ids_are_respected() {
        let json = r#"{"plots":[{"id":7,"kind":{"type":"function2d","expression":"x","domain":[0,1],"samples":10}}]}"#;
        let mut cfg: PlotConfig = serde_json::from_str(json).unwrap();
        let id = cfg.push_series(SeriesStyle::default(), SeriesKind::function_2d("y"));
        assert_eq!(id, SeriesId(8));
    }

    #[test]
    fn max_id_does_not_overflow() {
        let json = format!(
            r#"{{"plots":[{{"id":{},"kind":{{"type":"function2d","expression":"x","domain":[0,1],"samples":10}}}}]}}"#,
            u32::MAX
        );
        let mut cfg: PlotConfig = serde_json::from_str(&json).unwrap();
        let id = cfg.push_series(SeriesStyle::default(), SeriesKind::function_2d("y"));
        assert_eq!(id, SeriesId(u32::MAX));
        assert_eq!(cfg.plots.len(), 2);
    }
}
