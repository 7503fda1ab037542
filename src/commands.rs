use crate::color::Rgb;
use crate::error::Error;
use crate::img::SolidImage;
use crate::inspect::inspect;
use clap::Subcommand;
use log::info;
use std::fs;
use std::io::Cursor;
use std::path::{Path, PathBuf};

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Write square app icons (pwa-NxN.png) into a directory
    Icons {
        #[arg(short, long, default_value = "public", help = "Directory the icons are written to")]
        out_dir: PathBuf,
        #[arg(short, long, default_value = "#3b82f6", help = "Fill color: #rrggbb, rrggbb or r,g,b")]
        color: Rgb,
        #[arg(
            short,
            long,
            value_delimiter = ',',
            default_values_t = [192, 512],
            help = "Comma-separated icon edge lengths"
        )]
        sizes: Vec<u32>,
    },
    /// Write a single solid-color .png
    Encode {
        output: PathBuf,
        #[arg(short = 'W', long)]
        width: u32,
        #[arg(short = 'H', long)]
        height: u32,
        #[arg(short, long, default_value = "#3b82f6", help = "Fill color: #rrggbb, rrggbb or r,g,b")]
        color: Rgb,
    },
    /// Show the chunks and header of .png files and check their pixels
    Inspect { files: Vec<PathBuf> },
}

impl Command {
    pub fn run(self) -> Result<(), Error> {
        match self {
            Command::Icons {
                out_dir,
                color,
                sizes,
            } => {
                let written = icons(&out_dir, color, &sizes)?;
                info!("wrote {} icons to {}", written.len(), out_dir.display());
                println!("Generated PWA icons.");
                Ok(())
            }
            Command::Encode {
                output,
                width,
                height,
                color,
            } => encode(&output, width, height, color),
            Command::Inspect { files } => files.iter().try_for_each(|f| print_inspection(f)),
        }
    }
}

/// File name an icon of edge `size` is written under.
pub fn icon_file_name(size: u32) -> String {
    format!("pwa-{size}x{size}.png")
}

/// Encode every size first, then write; a bad size leaves the directory untouched.
pub fn icons(out_dir: &Path, color: Rgb, sizes: &[u32]) -> Result<Vec<PathBuf>, Error> {
    let encoded = sizes
        .iter()
        .map(|&size| SolidImage::square(size, color)?.encode())
        .collect::<Result<Vec<_>, _>>()?;

    fs::create_dir_all(out_dir).map_err(|e| Error::io(out_dir, e))?;

    let mut written = Vec::with_capacity(encoded.len());
    for image in encoded {
        let path = out_dir.join(icon_file_name(image.width()));
        write_file(&path, image.bytes())?;
        written.push(path);
    }
    Ok(written)
}

fn encode(output: &Path, width: u32, height: u32, color: Rgb) -> Result<(), Error> {
    let image = SolidImage::new(width, height, color)?.encode()?;
    write_file(output, image.bytes())
}

fn write_file(path: &Path, bytes: &[u8]) -> Result<(), Error> {
    fs::write(path, bytes).map_err(|e| Error::io(path, e))?;
    info!("wrote {} ({} bytes)", path.display(), bytes.len());
    Ok(())
}

/// Dimensions and color type as reported by the `png` crate's decoder.
pub fn decode_info(bytes: &[u8]) -> Result<png::OutputInfo, Error> {
    let decoder = png::Decoder::new(Cursor::new(bytes));
    let mut reader = decoder.read_info()?;
    let mut buf = vec![0; reader.output_buffer_size()];
    Ok(reader.next_frame(&mut buf)?)
}

fn print_inspection(path: &Path) -> Result<(), Error> {
    let bytes = fs::read(path).map_err(|e| Error::io(path, e))?;
    let inspection = inspect(&bytes)?;

    println!("{}", path.display());
    for chunk in &inspection.chunks {
        println!(
            "  {} length {} crc {:#010x}",
            chunk.chunk_type, chunk.length, chunk.crc
        );
    }
    let header = inspection.header;
    println!("  width: {}", header.width);
    println!("  height: {}", header.height);
    println!("  bit depth: {}", header.bit_depth);
    println!("  color type: {}", header.color_type);
    println!("  compression method: {}", header.compression);
    println!("  filter method: {}", header.filter);
    println!("  interlace method: {}", header.interlace);
    println!("  raw bytes: {}", inspection.raw_len);
    match inspection.uniform_color {
        Some(color) => println!("  uniform color: {}", color),
        None => println!("  uniform color: no"),
    }

    let info = decode_info(&bytes)?;
    println!(
        "  png decoder: {}x{} {:?} {:?}",
        info.width, info.height, info.color_type, info.bit_depth
    );
    Ok(())
}
