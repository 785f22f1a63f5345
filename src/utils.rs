use color_eyre::Result;
use eyre::eyre;

use crate::{Demo, SCREENSHOT_FOLDER};
use shadetoy_types::{Frame, ImageDimensions};

use std::{
    fs::File,
    io::{self, BufWriter},
    path::{Path, PathBuf},
    time::Instant,
};

pub fn print_help() {
    println!("\n- `F1`:   Print help");
    println!("- `F2`:   Toggle play/pause");
    println!("- `F5`:   Restart playback (`iTime` = 0)");
    println!("- `F6`:   Print parameters");
    println!("- `F11`:  Take Screenshot");
    println!("- `ESC`:  Exit the application\n");
}

pub fn create_folder<P: AsRef<Path>>(name: P) -> io::Result<()> {
    match std::fs::create_dir(name) {
        Ok(_) => {}
        Err(e) if e.kind() == io::ErrorKind::AlreadyExists => {}
        Err(e) => return Err(e),
    }

    Ok(())
}

/// ShaderToy-style GLSL demos.
#[derive(Debug, Clone, clap::Parser)]
#[command(version, about)]
pub struct Args {
    /// Demo to run
    #[arg(long, value_enum, default_value_t = Demo::Minimal)]
    pub demo: Demo,

    /// Window size, `WIDTHxHEIGHT`
    #[arg(long, value_name = "WxH", value_parser = parse_size, default_value = "800x600")]
    pub size: (u32, u32),

    /// Fragment shader of the scene pass, watched for changes.
    /// Created from the built-in shader when missing.
    #[arg(long, value_name = "PATH")]
    pub frag: Option<PathBuf>,

    /// Fragment shader of the composite pass (multipass demo only)
    #[arg(long, value_name = "PATH")]
    pub post_frag: Option<PathBuf>,

    /// Frame rate cap, 0 disables it
    #[arg(long, value_name = "N", default_value_t = 8192)]
    pub max_fps: u32,
}

pub fn parse_size(value: &str) -> Result<(u32, u32)> {
    let (w, h) = value
        .split_once('x')
        .ok_or_else(|| eyre!("Failed to parse window size: Missing 'x' delimiter"))?;
    let (w, h): (u32, u32) = (w.trim().parse()?, h.trim().parse()?);
    if w == 0 || h == 0 {
        return Err(eyre!("Window size must be non-zero, got {value}"));
    }
    Ok((w, h))
}

/// Drops row padding and reorders BGRA pixels into RGBA.
pub fn unpad_rows(data: &[u8], dimensions: &ImageDimensions, bgra: bool) -> Vec<u8> {
    let padded = dimensions.padded_bytes_per_row as usize;
    let unpadded = dimensions.unpadded_bytes_per_row as usize;
    let mut pixels = Vec::with_capacity(unpadded * dimensions.height as usize);
    for row in data
        .chunks(padded)
        .take(dimensions.height as usize)
        .map(|chunk| &chunk[..unpadded])
    {
        pixels.extend_from_slice(row);
    }
    if bgra {
        for pixel in pixels.chunks_exact_mut(4) {
            pixel.swap(0, 2);
        }
    }
    pixels
}

pub fn save_screenshot(frame: Frame) -> std::thread::JoinHandle<Result<PathBuf>> {
    std::thread::spawn(move || {
        let result = write_png(&frame);
        match &result {
            Ok(path) => println!("Saved: {}", path.display()),
            Err(err) => log::error!("Failed to save screenshot: {err:#}"),
        }
        result
    })
}

fn write_png(frame: &Frame) -> Result<PathBuf> {
    let now = Instant::now();
    let screenshots_folder = Path::new(SCREENSHOT_FOLDER);
    create_folder(screenshots_folder)?;
    let path = screenshots_folder.join(format!(
        "screenshot-{}.png",
        chrono::Local::now().format("%d-%m-%Y-%H-%M-%S%.3f")
    ));
    let file = File::create(&path)?;
    let w = BufWriter::new(file);
    let mut encoder = png::Encoder::new(w, frame.dimensions.width, frame.dimensions.height);
    encoder.set_color(png::ColorType::Rgba);
    encoder.set_depth(png::BitDepth::Eight);
    let pixels = unpad_rows(&frame.data, &frame.dimensions, frame.bgra);
    let mut writer = encoder.write_header()?;
    writer.write_image_data(&pixels)?;
    writer.finish()?;
    log::info!("Encode image: {:#.2?}", now.elapsed());
    Ok(path)
}
