#![deny(unsafe_code)]
//! CLI binary for the perceptual color core.
//!
//! Subcommands:
//! - `info` - print profile metadata and black/white point lightness
//! - `convert <L> <C> <h>` - map an LCh color to the nearest displayable RGB
//! - `chroma-hue`, `chroma-lightness`, `wheel`, `gradient` - write PNG snapshots
//! - `list` - print built-in profile names

mod error;

use clap::{Parser, Subcommand};
use error::CliError;
use perceptual_color_core::{
    ChromaHueImage, ChromaLightnessImage, GradientImage, HueWheelImage, Lch, Lcha, Raster,
    RgbColorSpace, RgbProfile, MAXIMUM_CHROMA, SRGB_VERSATILE_CHROMA,
};
use std::path::{Path, PathBuf};
use std::process;
use std::rc::Rc;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "perceptual-color", about = "Perceptual LCh color tools")]
struct Cli {
    /// Output as JSON instead of human-readable text.
    #[arg(long, global = true)]
    json: bool,

    /// Built-in profile name or path to an ICC profile (.icc, .icm).
    #[arg(short, long, global = true, default_value = "srgb")]
    profile: String,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Show profile metadata and the lightness of its black and white points.
    Info,
    /// Convert an LCh color to the nearest displayable RGB color.
    Convert {
        /// Lightness in [0, 100].
        #[arg(allow_negative_numbers = true)]
        lightness: f64,
        /// Chroma.
        #[arg(allow_negative_numbers = true)]
        chroma: f64,
        /// Hue in degrees.
        #[arg(allow_negative_numbers = true)]
        hue: f64,
    },
    /// Write the a/b plane at one lightness, masked to a circle.
    ChromaHue {
        #[arg(short, long, default_value_t = 50.0)]
        lightness: f64,

        /// Image diameter in logical pixels.
        #[arg(short, long, default_value_t = 256)]
        size: usize,

        /// Border around the circle in logical pixels.
        #[arg(short, long, default_value_t = 0.0)]
        border: f64,

        /// Chroma at the edge of the circle.
        #[arg(long, default_value_t = MAXIMUM_CHROMA)]
        max_chroma: f64,

        /// Device pixel ratio.
        #[arg(long, default_value_t = 1.0)]
        scale: f64,

        #[arg(short, long, default_value = "chroma-hue.png")]
        output: PathBuf,
    },
    /// Write the chroma/lightness plane at one hue.
    ChromaLightness {
        #[arg(long, default_value_t = 0.0)]
        hue: f64,

        #[arg(short = 'W', long, default_value_t = 256)]
        width: usize,

        #[arg(short = 'H', long, default_value_t = 256)]
        height: usize,

        #[arg(long, default_value_t = 1.0)]
        scale: f64,

        #[arg(short, long, default_value = "chroma-lightness.png")]
        output: PathBuf,
    },
    /// Write a hue ring at fixed lightness and chroma.
    Wheel {
        #[arg(short, long, default_value_t = 256)]
        size: usize,

        /// Ring thickness in logical pixels.
        #[arg(short, long, default_value_t = 24.0)]
        thickness: f64,

        #[arg(short, long, default_value_t = 0.0)]
        border: f64,

        #[arg(short, long, default_value_t = 50.0)]
        lightness: f64,

        #[arg(short, long, default_value_t = SRGB_VERSATILE_CHROMA)]
        chroma: f64,

        #[arg(long, default_value_t = 1.0)]
        scale: f64,

        #[arg(short, long, default_value = "wheel.png")]
        output: PathBuf,
    },
    /// Write a gradient between two "L,C,h[,a]" colors.
    Gradient {
        #[arg(long, allow_hyphen_values = true)]
        from: String,

        #[arg(long, allow_hyphen_values = true)]
        to: String,

        #[arg(short, long, default_value_t = 256)]
        length: usize,

        #[arg(short, long, default_value_t = 32)]
        thickness: usize,

        #[arg(long, default_value_t = 1.0)]
        scale: f64,

        #[arg(short, long, default_value = "gradient.png")]
        output: PathBuf,
    },
    /// List built-in profiles.
    List,
}

/// Resolves `--profile`: an existing file or an `.icc`/`.icm` path is
/// loaded, anything else is a built-in name.
fn load_color_space(profile: &str) -> Result<Rc<RgbColorSpace>, CliError> {
    let path = Path::new(profile);
    let looks_like_icc = path
        .extension()
        .is_some_and(|ext| ext.eq_ignore_ascii_case("icc") || ext.eq_ignore_ascii_case("icm"));
    let profile = if path.is_file() || looks_like_icc {
        RgbProfile::load(path)?
    } else {
        RgbProfile::from_name(profile)?
    };
    Ok(Rc::new(RgbColorSpace::new(profile)?))
}

/// Logical length to physical pixels at an already sanitized scale.
fn physical(logical: f64, scale: f64) -> f64 {
    (logical * scale).round()
}

fn write_snapshot(kind: &str, raster: &Raster, output: &Path, json: bool) -> Result<(), CliError> {
    if raster.is_empty() {
        return Err(CliError::Input(format!(
            "{kind} image is empty; check size, border and thickness"
        )));
    }
    perceptual_color_snapshot::write_png(raster, output)?;
    if json {
        let info = serde_json::json!({
            "image": kind,
            "width": raster.width(),
            "height": raster.height(),
            "device_pixel_ratio": raster.device_pixel_ratio(),
            "output": output.display().to_string(),
        });
        println!("{}", serde_json::to_string_pretty(&info)?);
    } else {
        eprintln!(
            "rendered {kind} ({}x{} @{}x) -> {}",
            raster.width(),
            raster.height(),
            raster.device_pixel_ratio(),
            output.display()
        );
    }
    Ok(())
}

fn run(cli: Cli) -> Result<(), CliError> {
    match cli.command {
        Command::List => {
            let profiles = RgbProfile::list_names();
            if cli.json {
                let info = serde_json::json!({ "profiles": profiles });
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                println!("Profiles:");
                for name in profiles {
                    println!("  {name}");
                }
            }
        }
        Command::Info => {
            let space = load_color_space(&cli.profile)?;
            if cli.json {
                let info = serde_json::json!({
                    "description": space.profile_description(),
                    "copyright": space.profile_copyright(),
                    "manufacturer": space.profile_manufacturer(),
                    "model": space.profile_model(),
                    "black_point_lightness": space.black_point_lightness(),
                    "white_point_lightness": space.white_point_lightness(),
                });
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                println!("Description:  {}", space.profile_description());
                println!("Copyright:    {}", space.profile_copyright());
                println!("Manufacturer: {}", space.profile_manufacturer());
                println!("Model:        {}", space.profile_model());
                println!("Black point:  L {:.4}", space.black_point_lightness());
                println!("White point:  L {:.4}", space.white_point_lightness());
            }
        }
        Command::Convert {
            lightness,
            chroma,
            hue,
        } => {
            let space = load_color_space(&cli.profile)?;
            let lch = Lch {
                l: lightness,
                c: chroma,
                h: hue,
            };
            let in_gamut = space.in_gamut_lch(lch);
            let nearest = space.reduce_chroma_to_fit(lch);
            let hex = space.to_rgb_bound(lch).to_hex();
            if cli.json {
                let info = serde_json::json!({
                    "input": { "l": lch.l, "c": lch.c, "h": lch.h },
                    "in_gamut": in_gamut,
                    "nearest": { "l": nearest.l, "c": nearest.c, "h": nearest.h },
                    "rgb": hex,
                });
                println!("{}", serde_json::to_string_pretty(&info)?);
            } else {
                println!("{hex}");
                if !in_gamut {
                    eprintln!(
                        "out of gamut; nearest LCh {:.3}, {:.3}, {:.3}",
                        nearest.l, nearest.c, nearest.h
                    );
                }
            }
        }
        Command::ChromaHue {
            lightness,
            size,
            border,
            max_chroma,
            scale,
            output,
        } => {
            let space = load_color_space(&cli.profile)?;
            let mut image = ChromaHueImage::new(space);
            image.set_device_pixel_ratio(scale);
            let scale = image.device_pixel_ratio();
            image.set_image_size_physical(physical(size as f64, scale) as usize);
            image.set_border_physical(physical(border, scale));
            image.set_lightness(lightness);
            image.set_chroma_range(max_chroma);
            write_snapshot("chroma-hue", image.image(), &output, cli.json)?;
        }
        Command::ChromaLightness {
            hue,
            width,
            height,
            scale,
            output,
        } => {
            let space = load_color_space(&cli.profile)?;
            let mut image = ChromaLightnessImage::new(space);
            image.set_device_pixel_ratio(scale);
            let scale = image.device_pixel_ratio();
            image.set_image_size_physical(
                physical(width as f64, scale) as usize,
                physical(height as f64, scale) as usize,
            );
            image.set_hue(hue);
            write_snapshot("chroma-lightness", image.image(), &output, cli.json)?;
        }
        Command::Wheel {
            size,
            thickness,
            border,
            lightness,
            chroma,
            scale,
            output,
        } => {
            let space = load_color_space(&cli.profile)?;
            let mut image = HueWheelImage::new(space);
            image.set_device_pixel_ratio(scale);
            let scale = image.device_pixel_ratio();
            image.set_image_size_physical(physical(size as f64, scale) as usize);
            image.set_wheel_thickness_physical(physical(thickness, scale));
            image.set_border_physical(physical(border, scale));
            image.set_lightness(lightness);
            image.set_chroma(chroma);
            write_snapshot("wheel", image.image(), &output, cli.json)?;
        }
        Command::Gradient {
            from,
            to,
            length,
            thickness,
            scale,
            output,
        } => {
            let first: Lcha = from.parse()?;
            let second: Lcha = to.parse()?;
            let space = load_color_space(&cli.profile)?;
            let mut image = GradientImage::new(space);
            image.set_device_pixel_ratio(scale);
            let scale = image.device_pixel_ratio();
            image.set_first_color(first);
            image.set_second_color(second);
            image.set_gradient_length(physical(length as f64, scale) as usize);
            image.set_gradient_thickness(physical(thickness as f64, scale) as usize);
            write_snapshot("gradient", image.image(), &output, cli.json)?;
        }
    }

    Ok(())
}

fn main() {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "warn".into()),
        )
        .with(
            tracing_subscriber::fmt::layer()
                .without_time()
                .with_writer(std::io::stderr),
        )
        .init();

    let cli = Cli::parse();
    let json_mode = cli.json;
    if let Err(e) = run(cli) {
        if json_mode {
            let j = serde_json::json!({"error": e.to_string(), "exit_code": e.exit_code()});
            eprintln!("{}", serde_json::to_string_pretty(&j).unwrap_or_default());
        } else {
            eprintln!("error: {e}");
        }
        process::exit(e.exit_code());
    }
}
