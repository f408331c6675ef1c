mod shaders;

use std::{
    fs::File,
    io::{self, BufWriter},
    path::{Path, PathBuf},
};

use anyhow::Context;
use geom::{cross, v3};
use model::Model;
use render::{depth, rgb, tga, Frame, Transform};

use crate::shaders::ShaderKind;

/// Renders a mesh into a color image and a depth image.
#[derive(argh::FromArgs)]
struct Args {
    /// wavefront obj mesh, defaults to obj/sample.obj
    #[argh(positional, default = "PathBuf::from(\"obj/sample.obj\")")]
    model: PathBuf,

    /// width of the image, in pixels
    #[argh(option, default = "800")]
    width: u32,

    /// height of the image, in pixels
    #[argh(option, default = "800")]
    height: u32,

    /// camera position, as x,y,z
    #[argh(option, default = "v3(1.0, 1.0, 3.0)")]
    eye: v3,

    /// point the camera looks at
    #[argh(option, default = "v3::ZERO")]
    center: v3,

    /// camera up direction
    #[argh(option, default = "v3(0.0, 1.0, 0.0)")]
    up: v3,

    /// direction towards the light
    #[argh(option, default = "v3(1.0, 1.0, 1.0)")]
    light: v3,

    /// gouraud, normal or phong
    #[argh(option, default = "ShaderKind::Gouraud")]
    shader: ShaderKind,

    /// surface color of the gouraud shader, as #rrggbb
    #[argh(option, default = "rgb::Color::new_white()")]
    color: rgb::Color,

    /// background color, as #rrggbb
    #[argh(option, default = "rgb::Color::new_black()")]
    background: rgb::Color,

    /// color image, .tga or .ppm
    #[argh(option, default = "PathBuf::from(\"output.tga\")")]
    output: PathBuf,

    /// depth image, .tga or .ppm
    #[argh(option, default = "PathBuf::from(\"zbuffer.tga\")")]
    zbuffer: PathBuf,
}

fn main() -> anyhow::Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();
    let args: Args = argh::from_env();
    check(&args)?;

    let model = Model::load(&args.model)
        .with_context(|| format!("loading {}", args.model.display()))?;

    let dim = [args.width, args.height];
    let [w, h] = dim.map(f64::from);
    let transform =
        Transform::camera(args.eye, args.center, args.up, [w / 8.0, h / 8.0, w * 0.75, h * 0.75]);
    let mut shader = shaders::new(args.shader, &model, &transform, args.light, args.color)
        .with_context(|| format!("setting up the {:?} shader", args.shader))?;

    let n_pixels = args.width as usize * args.height as usize;
    let mut color = vec![args.background; n_pixels];
    let mut depth = vec![depth::EMPTY; n_pixels];
    let mut frame = Frame::new(rgb::Buf::new(dim, &mut color), depth::Buf::new(dim, &mut depth));

    let stats = render::render(&model, &mut *shader, &transform, &mut frame);
    log::info!(
        "rendered {} faces ({} degenerate), {} pixels written",
        stats.faces,
        stats.degenerate,
        stats.pixels
    );

    save(frame.color(), tga::Format::Rgb, &args.output)?;
    let mut gray = frame.depth().buf().iter().map(|&it| depth::to_gray(it)).collect::<Vec<_>>();
    save(&rgb::Buf::new(dim, &mut gray), tga::Format::Grayscale, &args.zbuffer)?;
    Ok(())
}

/// Rejects arguments that would only fail, or render nothing, after the frame is drawn.
fn check(args: &Args) -> anyhow::Result<()> {
    let (width, height) = (args.width, args.height);
    if width == 0 || height == 0 {
        anyhow::bail!("image must be at least 1x1, got {width}x{height}");
    }
    let max = u32::from(u16::MAX);
    for path in [&args.output, &args.zbuffer] {
        if !is_ppm(path) && (width > max || height > max) {
            anyhow::bail!(
                "{} is a tga image, which is at most {max}x{max}, got {width}x{height}",
                path.display()
            );
        }
    }
    let view = args.eye - args.center;
    if !(view.norm() > 0.0) {
        anyhow::bail!("--eye and --center must differ, both are {}", args.eye);
    }
    if !(cross(args.up, view.to_unit()).norm() > 1e-9) {
        anyhow::bail!("--up {} must not be parallel to the view direction {view}", args.up);
    }
    Ok(())
}

fn is_ppm(path: &Path) -> bool {
    path.extension().and_then(|it| it.to_str()) == Some("ppm")
}

fn save(buf: &rgb::Buf, format: tga::Format, path: &Path) -> anyhow::Result<()> {
    let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
    let mut w = BufWriter::new(file);
    let res = if is_ppm(path) {
        write_ppm(buf, &mut w).map_err(tga::Error::from)
    } else {
        tga::write(buf, format, &mut w)
    };
    res.with_context(|| format!("writing {}", path.display()))?;
    log::info!("wrote {}", path.display());
    Ok(())
}

/// Plain-text PPM, top row first.
fn write_ppm(buf: &rgb::Buf, w: &mut dyn io::Write) -> io::Result<()> {
    let magic_number = "P3";
    let max_color = 255;
    write!(w, "{}\n{} {}\n{}\n", magic_number, buf.width(), buf.height(), max_color)?;

    for [x, y] in buf.by_row() {
        if x == 0 {
            write!(w, "\n")?;
        }
        let rgb::Color { r, g, b } = buf[[x, buf.height() - 1 - y]];
        write!(w, "{r:3} {g:3} {b:3}  ")?;
    }
    w.flush()
}

#[test]
fn test_write_ppm_top_row_first() {
    let mut pixels = vec![rgb::Color::new_gray(1), rgb::Color::new(255, 0, 7)];
    let buf = rgb::Buf::new([1, 2], &mut pixels);
    let mut out = Vec::new();
    write_ppm(&buf, &mut out).unwrap();
    let text = String::from_utf8(out).unwrap();
    assert_eq!(text, "P3\n1 2\n255\n\n255   0   7  \n  1   1   1  ");
}

#[cfg(test)]
fn parse_args(args: &[&str]) -> Args {
    use argh::FromArgs;
    Args::from_args(&["tiny"], args).unwrap_or_else(|exit| panic!("{}", exit.output))
}

#[test]
fn test_check_accepts_defaults() {
    assert!(check(&parse_args(&[])).is_ok());
    let wide = parse_args(&["--width", "70000", "--output", "big.ppm", "--zbuffer", "z.ppm"]);
    assert!(check(&wide).is_ok());
}

#[test]
fn test_check_rejects_bad_sizes() {
    let err = |args: &[&str]| check(&parse_args(args)).unwrap_err().to_string();
    assert_eq!(err(&["--height", "0"]), "image must be at least 1x1, got 800x0");
    assert_eq!(
        err(&["--width", "70000", "--output", "big.ppm"]),
        "zbuffer.tga is a tga image, which is at most 65535x65535, got 70000x800"
    );
}

#[test]
fn test_check_rejects_degenerate_camera() {
    let err = |args: &[&str]| check(&parse_args(args)).unwrap_err().to_string();
    assert_eq!(
        err(&["--eye", "1,2,3", "--center", "1,2,3"]),
        "--eye and --center must differ, both are 1,2,3"
    );
    let looking_down = err(&["--eye", "0,4,0", "--up", "0,1,0"]);
    assert!(looking_down.starts_with("--up 0,1,0 must not be parallel"), "{looking_down}");
    assert!(err(&["--up", "0,0,0"]).starts_with("--up 0,0,0"));
}
