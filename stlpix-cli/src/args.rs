//! Command-line definition and conversion to [`RenderOptions`].
use anyhow::{Context, Result};
use clap::{value_parser, Arg, ArgAction, ArgMatches, Command};
use image::Rgb;
use nalgebra::Vector3;
use std::path::PathBuf;

use stlpix_core::{Axes, GroundGrid, RenderOptions, ScreenGrid, ViewAngles};

/// Parsed invocation: where to read, where to write, how to render.
#[derive(Debug, Clone)]
pub struct Invocation {
    pub stl: PathBuf,
    pub out: PathBuf,
    pub verbose: bool,
    pub options: RenderOptions,
}

pub fn create_clap_command() -> Command {
    Command::new("stlpix")
        .about("Render an STL mesh to a PNG image without a GPU")
        .version(env!("CARGO_PKG_VERSION"))
        .arg(
            Arg::new("stl")
                .long("stl")
                .value_name("FILE")
                .help("Input STL file (binary or ASCII)")
                .required(true)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("out")
                .long("out")
                .value_name("FILE")
                .help("Output PNG path; parent directories are created")
                .required(true)
                .value_parser(value_parser!(PathBuf)),
        )
        .arg(
            Arg::new("size")
                .long("size")
                .value_name("PX")
                .help("Side of the square output image")
                .default_value("1024")
                .value_parser(value_parser!(u32)),
        )
        .arg(color_arg("bg", "Background color").default_value("#0b0f14"))
        .arg(color_arg("color", "Surface color").default_value("#4cc9f0"))
        .arg(flag("grid", "Draw a 2-D grid behind the model"))
        .arg(
            Arg::new("grid-step")
                .long("grid-step")
                .value_name("PX")
                .help("Screen grid spacing in pixels")
                .default_value("80")
                .value_parser(value_parser!(u32)),
        )
        .arg(color_arg("grid-color", "Screen grid color").default_value("#2a313a"))
        .arg(float_arg("grid-alpha", "ALPHA", "Screen grid opacity").default_value("0.45"))
        .arg(flag("two-sided", "Draw faces regardless of winding"))
        .arg(flag("no-auto-upright", "Keep the mesh orientation as stored"))
        .arg(flag("axes", "Draw an XYZ axis triad on the ground plane"))
        .arg(float_arg("axes-len", "L", "Axis length relative to the mesh radius").default_value("0.9"))
        .arg(flag("ground-grid", "Draw a grid on the ground plane under the model"))
        .arg(
            float_arg("ground-step", "S", "Ground grid spacing in model units (0 = auto)")
                .default_value("0"),
        )
        .arg(
            float_arg("ground-extent", "E", "Ground grid half-width relative to the mesh radius")
                .default_value("1.35"),
        )
        .arg(color_arg("ground-color", "Ground grid color").default_value("#24303b"))
        .arg(float_arg("ground-alpha", "ALPHA", "Ground grid opacity").default_value("0.55"))
        .arg(float_arg("azim-deg", "DEG", "Rotation about the vertical axis").default_value("-35"))
        .arg(float_arg("elev-deg", "DEG", "Tilt toward or away from the viewer").default_value("-35"))
        .arg(float_arg("fov-deg", "DEG", "Vertical field of view").default_value("35"))
        .arg(float_arg("margin", "M", "Border left free around the model, in [0, 1)").default_value("0.08"))
        .arg(
            Arg::new("light-dir")
                .long("light-dir")
                .value_name("X,Y,Z")
                .help("Direction toward the light in camera space")
                .default_value("-0.4,-0.3,1.0")
                .allow_hyphen_values(true)
                .value_parser(parse_vec3),
        )
        .arg(
            Arg::new("verbose")
                .short('v')
                .long("verbose")
                .help("Log pipeline details")
                .action(ArgAction::SetTrue),
        )
}

fn flag(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name).long(name).help(help).action(ArgAction::SetTrue)
}

fn color_arg(name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .long(name)
        .value_name("HEX")
        .help(help)
        .value_parser(parse_hex_color)
}

fn float_arg(name: &'static str, value_name: &'static str, help: &'static str) -> Arg {
    Arg::new(name)
        .long(name)
        .value_name(value_name)
        .help(help)
        .allow_negative_numbers(true)
        .value_parser(value_parser!(f64))
}

/// Parse `#rrggbb` or `rrggbb`.
pub fn parse_hex_color(input: &str) -> std::result::Result<Rgb<u8>, String> {
    let hex = input.trim();
    let hex = hex.strip_prefix('#').unwrap_or(hex);
    if hex.len() != 6 || !hex.chars().all(|c| c.is_ascii_hexdigit()) {
        return Err(format!("invalid hex color '{input}', expected #rrggbb"));
    }
    let channel = |i: usize| {
        u8::from_str_radix(&hex[i..i + 2], 16)
            .map_err(|e| format!("invalid hex color '{input}': {e}"))
    };
    Ok(Rgb([channel(0)?, channel(2)?, channel(4)?]))
}

/// Parse three comma-separated floats.
pub fn parse_vec3(input: &str) -> std::result::Result<Vector3<f64>, String> {
    let parts: Vec<&str> = input.split(',').map(str::trim).collect();
    if parts.len() != 3 {
        return Err(format!(
            "expected three comma-separated numbers, got '{input}'"
        ));
    }
    let mut v = Vector3::zeros();
    for (i, part) in parts.iter().enumerate() {
        v[i] = part
            .parse::<f64>()
            .map_err(|e| format!("invalid number '{part}' in '{input}': {e}"))?;
    }
    Ok(v)
}

fn get<T: Clone + Send + Sync + 'static>(matches: &ArgMatches, id: &str) -> Result<T> {
    matches
        .get_one::<T>(id)
        .cloned()
        .with_context(|| format!("missing value for --{id}"))
}

pub fn handle_clap_matches(matches: &ArgMatches) -> Result<Invocation> {
    let screen_grid = if matches.get_flag("grid") {
        Some(ScreenGrid {
            step: get(matches, "grid-step")?,
            color: get(matches, "grid-color")?,
            alpha: get(matches, "grid-alpha")?,
        })
    } else {
        None
    };
    let ground_grid = if matches.get_flag("ground-grid") {
        Some(GroundGrid {
            step: get(matches, "ground-step")?,
            extent: get(matches, "ground-extent")?,
            color: get(matches, "ground-color")?,
            alpha: get(matches, "ground-alpha")?,
        })
    } else {
        None
    };
    let axes = if matches.get_flag("axes") {
        Some(Axes {
            length: get(matches, "axes-len")?,
        })
    } else {
        None
    };

    let options = RenderOptions {
        size: get(matches, "size")?,
        background: get(matches, "bg")?,
        color: get(matches, "color")?,
        view: ViewAngles::new(get(matches, "azim-deg")?, get(matches, "elev-deg")?),
        fov_deg: get(matches, "fov-deg")?,
        margin: get(matches, "margin")?,
        light_dir: get(matches, "light-dir")?,
        two_sided: matches.get_flag("two-sided"),
        auto_upright: !matches.get_flag("no-auto-upright"),
        screen_grid,
        ground_grid,
        axes,
    };

    Ok(Invocation {
        stl: get(matches, "stl")?,
        out: get(matches, "out")?,
        verbose: matches.get_flag("verbose"),
        options,
    })
}
