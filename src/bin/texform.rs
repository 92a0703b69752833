//! texform CLI - structured transcoders for LaTeX math, PGFPlots charts and TikZ shapes

#[cfg(feature = "cli")]
use clap::{Args, Parser, Subcommand};
#[cfg(feature = "cli")]
use std::fs;
#[cfg(feature = "cli")]
use std::io::{self, Read, Write};
#[cfg(feature = "cli")]
use std::path::Path;
#[cfg(feature = "cli")]
use texform::{
    core::{color, math, pgfplots, tikz},
    utils::names,
    DataTables, MathComponent, PlotConfig, PreviewOptions, SeriesKind, SeriesStyle, Shape,
    ShapeId, TranscodeError, TranscodeResult, Viewport,
};

#[cfg(feature = "cli")]
#[derive(Parser)]
#[command(name = "texform")]
#[command(version)]
#[command(about = "texform - structured transcoders for LaTeX math, PGFPlots charts and TikZ shapes", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Output file path (writes to stdout if not provided)
    #[arg(short, long, global = true)]
    output: Option<String>,

    /// Log debug information to stderr (overrides TEXFORM_LOG)
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum Commands {
    /// Math fragments
    #[command(subcommand)]
    Math(MathCommand),

    /// PGFPlots charts
    #[command(subcommand)]
    Plot(PlotCommand),

    /// TikZ shapes
    #[command(subcommand)]
    Shapes(ShapesCommand),

    /// Resolve an xcolor expression
    Color {
        /// Color token, e.g. `red!50!blue`
        token: String,

        /// Print CSS `rgb(...)` instead of `#rrggbb`
        #[arg(long)]
        css: bool,
    },
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum MathCommand {
    /// Print the tag of a LaTeX math fragment
    Classify { input: Option<String> },

    /// Parse a fragment into component JSON
    Parse {
        input: Option<String>,

        /// Parse as this tag instead of classifying (e.g. `fraction`)
        #[arg(short, long)]
        tag: Option<String>,
    },

    /// Build canonical LaTeX from component JSON
    Build { input: Option<String> },
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum PlotCommand {
    /// Parse PGFPlots code into chart JSON
    Parse {
        input: Option<String>,

        /// Print the dropped options and commands to stderr
        #[arg(long)]
        report: bool,

        /// Named table for `table {\name}`, as NAME=FILE (repeatable)
        #[arg(long = "table", value_name = "NAME=FILE")]
        tables: Vec<String>,
    },

    /// Build canonical PGFPlots code from chart JSON
    Build { input: Option<String> },

    /// Append a series to chart JSON (starts an empty chart without input)
    Add {
        input: Option<String>,

        #[command(flatten)]
        series: SeriesArgs,

        /// Print PGFPlots code instead of chart JSON
        #[arg(long)]
        code: bool,
    },

    /// Render chart JSON as SVG
    Render {
        input: Option<String>,

        #[command(flatten)]
        preview: PreviewArgs,
    },
}

#[cfg(feature = "cli")]
#[derive(Subcommand)]
enum ShapesCommand {
    /// Generate TikZ code from a JSON shape list
    Code { input: Option<String> },

    /// Render a JSON shape list as SVG
    Render {
        input: Option<String>,

        /// Focus on this shape id; others are drawn muted
        #[arg(long)]
        selected: Option<u32>,

        #[command(flatten)]
        preview: PreviewArgs,
    },
}

#[cfg(feature = "cli")]
#[derive(Args)]
struct SeriesArgs {
    /// Function of `x` (and `y` with --surface)
    #[arg(long, conflicts_with = "data")]
    expression: Option<String>,

    /// Data file, one row per line
    #[arg(long)]
    data: Option<String>,

    /// Data series type: line, scatter, bar or area
    #[arg(long, default_value = "line")]
    chart_type: String,

    /// Surface style for a 3D function: surf or mesh
    #[arg(long)]
    surface: Option<String>,

    /// solid, dashed, dotted or dashdotted
    #[arg(long, default_value = "solid")]
    line_style: String,

    /// xcolor token, e.g. `blue!50!black`
    #[arg(long)]
    color: Option<String>,

    #[arg(long)]
    legend: Option<String>,
}

#[cfg(feature = "cli")]
fn series_from_args(
    args: &SeriesArgs,
    rows: Option<String>,
) -> TranscodeResult<(SeriesStyle, SeriesKind)> {
    let chart_type = names::chart_type(&args.chart_type)?;
    let style = SeriesStyle {
        color: args.color.clone().unwrap_or_default(),
        line_style: names::line_style(&args.line_style)?,
        legend: args.legend.clone().unwrap_or_default(),
        ..SeriesStyle::default()
    };
    let kind = match (rows, args.expression.as_deref()) {
        (Some(rows), _) => SeriesKind::data(chart_type, rows),
        (None, Some(expression)) => match args.surface.as_deref() {
            Some(surface) => {
                let mut kind = SeriesKind::function_3d(expression);
                if let SeriesKind::Function3d { plot_style, .. } = &mut kind {
                    *plot_style = names::surface_style(surface)?;
                }
                kind
            }
            None => SeriesKind::function_2d(expression),
        },
        (None, None) => {
            return Err(TranscodeError::invalid(
                "plot add needs --expression or --data",
            ))
        }
    };
    Ok((style, kind))
}

#[cfg(feature = "cli")]
#[derive(Args)]
struct PreviewArgs {
    /// Viewport width in pixels
    #[arg(long, default_value_t = 400.0)]
    width: f64,

    /// Viewport height in pixels
    #[arg(long, default_value_t = 300.0)]
    height: f64,

    /// Preview options file (.toml or .json)
    #[arg(long)]
    config: Option<String>,
}

#[cfg(feature = "cli")]
impl PreviewArgs {
    fn viewport(&self) -> Viewport {
        Viewport::new(self.width, self.height)
    }

    fn options(&self) -> TranscodeResult<PreviewOptions> {
        match &self.config {
            Some(path) => load_preview_options(Path::new(path)),
            None => Ok(PreviewOptions::default()),
        }
    }
}

#[cfg(feature = "cli")]
fn load_preview_options(path: &Path) -> TranscodeResult<PreviewOptions> {
    let text = fs::read_to_string(path)?;
    let is_json = path
        .extension()
        .and_then(|ext| ext.to_str())
        .is_some_and(|ext| ext.eq_ignore_ascii_case("json"));
    if is_json {
        Ok(serde_json::from_str(&text)?)
    } else {
        toml::from_str(&text)
            .map_err(|e| TranscodeError::invalid(format!("{}: {}", path.display(), e)))
    }
}

#[cfg(feature = "cli")]
fn init_logging(verbose: bool) {
    use tracing_subscriber::EnvFilter;

    let filter = if verbose {
        EnvFilter::new("texform=debug")
    } else {
        EnvFilter::try_from_env("TEXFORM_LOG").unwrap_or_else(|_| EnvFilter::new("warn"))
    };
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(io::stderr)
        .without_time()
        .init();
}

#[cfg(feature = "cli")]
fn read_input(input: Option<&str>) -> TranscodeResult<String> {
    match input {
        Some(path) => Ok(fs::read_to_string(path)?),
        None => {
            let mut buffer = String::new();
            io::stdin().read_to_string(&mut buffer)?;
            Ok(buffer)
        }
    }
}

#[cfg(feature = "cli")]
fn write_output(output: Option<&str>, content: &str) -> TranscodeResult<()> {
    match output {
        Some(path) => {
            fs::write(path, content)?;
            eprintln!("Output written to: {}", path);
        }
        None => {
            let stdout = io::stdout();
            let mut handle = stdout.lock();
            writeln!(handle, "{}", content)?;
        }
    }
    Ok(())
}

#[cfg(feature = "cli")]
fn load_tables(entries: &[String]) -> TranscodeResult<DataTables> {
    let mut tables = DataTables::new();
    for entry in entries {
        let (name, path) = entry
            .split_once('=')
            .ok_or_else(|| TranscodeError::invalid(format!("expected NAME=FILE, got '{}'", entry)))?;
        let name = name.trim().trim_start_matches('\\');
        tables.insert(name.to_string(), fs::read_to_string(path.trim())?);
    }
    Ok(tables)
}

#[cfg(feature = "cli")]
fn run_math(cmd: MathCommand) -> TranscodeResult<String> {
    match cmd {
        MathCommand::Classify { input } => {
            let text = read_input(input.as_deref())?;
            Ok(math::classify(text.trim()).name().to_string())
        }
        MathCommand::Parse { input, tag } => {
            let text = read_input(input.as_deref())?;
            let text = text.trim();
            let component = match tag {
                Some(tag) => math::parse(text, names::math_tag(&tag)?),
                None => math::parse_auto(text),
            };
            Ok(serde_json::to_string_pretty(&component)?)
        }
        MathCommand::Build { input } => {
            let component: MathComponent = serde_json::from_str(&read_input(input.as_deref())?)?;
            Ok(math::build(&component))
        }
    }
}

#[cfg(feature = "cli")]
fn run_plot(cmd: PlotCommand) -> TranscodeResult<String> {
    match cmd {
        PlotCommand::Parse {
            input,
            report,
            tables,
        } => {
            let code = read_input(input.as_deref())?;
            let tables = load_tables(&tables)?;
            let (config, losses) = pgfplots::parse_with_report(&code, &tables);
            if report {
                for loss in &losses.losses {
                    eprintln!("dropped {:?} '{}' in {}", loss.kind, loss.name, loss.context);
                }
            }
            match config {
                Some(config) => Ok(serde_json::to_string_pretty(&config)?),
                // Re-run to recover the reason (no axis vs. no series).
                None => Err(pgfplots::try_parse(&code)
                    .err()
                    .unwrap_or(TranscodeError::NoSeries)),
            }
        }
        PlotCommand::Build { input } => {
            let config: PlotConfig = serde_json::from_str(&read_input(input.as_deref())?)?;
            Ok(pgfplots::build(&config))
        }
        PlotCommand::Add {
            input,
            series,
            code,
        } => {
            let mut config: PlotConfig = match input {
                Some(path) => serde_json::from_str(&fs::read_to_string(path)?)?,
                None => PlotConfig::default(),
            };
            let rows = series.data.as_deref().map(fs::read_to_string).transpose()?;
            let (style, kind) = series_from_args(&series, rows)?;
            config.push_series(style, kind);
            if code {
                Ok(pgfplots::build(&config))
            } else {
                Ok(serde_json::to_string_pretty(&config)?)
            }
        }
        PlotCommand::Render { input, preview } => {
            let config: PlotConfig = serde_json::from_str(&read_input(input.as_deref())?)?;
            let mut svg = String::new();
            pgfplots::render(&config, preview.viewport(), &preview.options()?, &mut svg);
            Ok(svg)
        }
    }
}

#[cfg(feature = "cli")]
fn run_shapes(cmd: ShapesCommand) -> TranscodeResult<String> {
    match cmd {
        ShapesCommand::Code { input } => {
            let shapes: Vec<Shape> = serde_json::from_str(&read_input(input.as_deref())?)?;
            Ok(tikz::generate_code(&shapes))
        }
        ShapesCommand::Render {
            input,
            selected,
            preview,
        } => {
            let shapes: Vec<Shape> = serde_json::from_str(&read_input(input.as_deref())?)?;
            let mut svg = String::new();
            tikz::render(
                &shapes,
                preview.viewport(),
                selected.map(ShapeId),
                &preview.options()?,
                &mut svg,
            );
            Ok(svg)
        }
    }
}

#[cfg(feature = "cli")]
fn run(cli: Cli) -> TranscodeResult<()> {
    let output = match cli.command {
        Commands::Math(cmd) => run_math(cmd)?,
        Commands::Plot(cmd) => run_plot(cmd)?,
        Commands::Shapes(cmd) => run_shapes(cmd)?,
        Commands::Color { token, css } => {
            if !color::is_color(&token) {
                eprintln!("Warning: '{}' is not a known color, using black", token);
            }
            if css {
                color::resolve_css(&token)
            } else {
                color::resolve_hex(&token)
            }
        }
    };
    write_output(cli.output.as_deref(), &output)
}

#[cfg(feature = "cli")]
fn main() {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    if let Err(err) = run(cli) {
        eprintln!("Error: {}", err);
        std::process::exit(1);
    }
}

#[cfg(not(feature = "cli"))]
fn main() {
    eprintln!("CLI feature not enabled. Build with --features cli");
    eprintln!();
    eprintln!("Usage:");
    eprintln!("  cargo install texform --features cli");
    eprintln!("  texform <math|plot|shapes|color> ...");
}

#[cfg(all(test, feature = "cli"))]
mod tests {
    use super::*;
    use texform::{ChartType, LineStyle, SurfaceStyle};

    fn args(expression: Option<&str>) -> SeriesArgs {
        SeriesArgs {
            expression: expression.map(String::from),
            data: None,
            chart_type: "line".into(),
            surface: None,
            line_style: "solid".into(),
            color: None,
            legend: None,
        }
    }

    #[test]
    fn test_series_flags_resolve_names() {
        let mut flags = args(None);
        flags.chart_type = "bar".into();
        flags.line_style = "dashed".into();
        let (style, kind) = series_from_args(&flags, Some("1 2\n2 3".into())).unwrap();
        assert_eq!(style.line_style, LineStyle::Dashed);
        assert_eq!(kind, SeriesKind::data(ChartType::Bar, "1 2\n2 3"));

        let mut flags = args(Some("x*y"));
        flags.surface = Some("mesh".into());
        match series_from_args(&flags, None).unwrap().1 {
            SeriesKind::Function3d { plot_style, .. } => assert_eq!(plot_style, SurfaceStyle::Mesh),
            other => panic!("unexpected {:?}", other),
        }
    }

    #[test]
    fn test_series_flags_reject_unknown_names() {
        let mut flags = args(Some("x"));
        flags.line_style = "wavy".into();
        assert_eq!(
            series_from_args(&flags, None).err(),
            Some(TranscodeError::unknown("line style", "wavy"))
        );
        let mut flags = args(Some("x"));
        flags.chart_type = "pie".into();
        assert!(series_from_args(&flags, None).is_err());
        assert!(series_from_args(&args(None), None).is_err());
    }
}
