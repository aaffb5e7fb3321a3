use crate::chunk;
use crate::error::{Error, Result};
use crate::img::DepthImage;
use crate::png;
use crate::raw16;
use std::fs;
use std::path::{Path, PathBuf};

const CONVERTED_SUFFIX: &str = "_converted.png";
const RESTORED_SUFFIX: &str = "_restored.raw";

#[derive(Debug, Default, clap::Args)]
pub struct ConvertArgs {
    /// Raw16 depth images to convert.
    pub files: Vec<PathBuf>,
    /// Log failing files and carry on with the rest.
    #[arg(short, long)]
    pub keep_going: bool,
    /// Re-read every written PNG and check its chunk CRCs and header.
    #[arg(long)]
    pub verify: bool,
}

#[derive(Debug, clap::Args)]
pub struct RestoreArgs {
    /// PNG images previously produced by `convert`.
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
    /// Format tag written as the first header token.
    #[arg(short, long, default_value = "P5")]
    pub tag: String,
    #[arg(short, long)]
    pub keep_going: bool,
}

#[derive(Debug, clap::Args)]
pub struct InfoArgs {
    #[arg(required = true)]
    pub files: Vec<PathBuf>,
}

/// Byte offset at which the last `n` characters of `bytes` start. A byte
/// outside any valid UTF-8 sequence counts as one character.
fn tail_start(bytes: &[u8], n: usize) -> usize {
    let mut starts = Vec::with_capacity(bytes.len());
    let mut offset = 0;
    for chunk in bytes.utf8_chunks() {
        starts.extend(chunk.valid().char_indices().map(|(i, _)| offset + i));
        offset += chunk.valid().len();
        starts.extend(offset..offset + chunk.invalid().len());
        offset += chunk.invalid().len();
    }
    starts.len().checked_sub(n).map_or(0, |i| starts[i])
}

/// Drops the last four characters of `path` (conventionally a `.xxx`
/// extension) and appends `suffix`.
pub fn derived_path(path: &Path, suffix: &str) -> PathBuf {
    if let Some(name) = path.to_str() {
        let mut out = name[..tail_start(name.as_bytes(), 4)].to_owned();
        out.push_str(suffix);
        return PathBuf::from(out);
    }

    #[cfg(unix)]
    {
        use std::os::unix::ffi::OsStrExt;

        let bytes = path.as_os_str().as_bytes();
        let mut out = std::ffi::OsStr::from_bytes(&bytes[..tail_start(bytes, 4)]).to_owned();
        out.push(suffix);
        PathBuf::from(out)
    }

    // Non-UTF-8 paths outside unix have no byte view to cut.
    #[cfg(not(unix))]
    {
        let name = path.to_string_lossy();
        let mut out = name[..tail_start(name.as_bytes(), 4)].to_owned();
        out.push_str(suffix);
        PathBuf::from(out)
    }
}

pub fn converted_path(path: &Path) -> PathBuf {
    derived_path(path, CONVERTED_SUFFIX)
}

fn run_batch(
    files: &[PathBuf],
    keep_going: bool,
    mut convert_one: impl FnMut(&Path) -> Result<PathBuf>,
) -> Result<()> {
    let mut failures = Vec::new();
    for path in files {
        let _guard = tracing::trace_span!("file", path = %path.display()).entered();
        match convert_one(path) {
            Ok(output) => {
                tracing::info!("{} -> {}", path.display(), output.display());
            }
            Err(e) => {
                let e = e.in_file(path);
                if !keep_going {
                    return Err(e);
                }
                tracing::warn!("{e}; continuing");
                failures.push(e);
            }
        }
    }

    if !failures.is_empty() {
        return Err(Error::Batch {
            failures,
            total: files.len(),
        });
    }
    Ok(())
}

pub fn convert(args: &ConvertArgs) -> Result<()> {
    if args.files.is_empty() {
        return Err(Error::Usage);
    }
    run_batch(&args.files, args.keep_going, |path| {
        convert_file(path, args.verify)
    })
}

/// Converts one raw16 file and returns the path of the PNG written.
pub fn convert_file(path: &Path, verify: bool) -> Result<PathBuf> {
    let bytes = fs::read(path)?;
    let (_, depth) = raw16::parse_img(&bytes)?;
    let rgba = depth.to_rgba8();
    let encoded = png::encode_img(&rgba)?;

    let output = converted_path(path);
    tracing::debug!(output = %output.display(), bytes = encoded.len(), "Writing PNG");
    fs::write(&output, &encoded)?;

    if verify {
        let written = fs::read(&output)?;
        chunk::verify_rgba8(&written, rgba.width(), rgba.height())?;
        tracing::debug!("Verified {}", output.display());
    }
    Ok(output)
}

pub fn restore(args: &RestoreArgs) -> Result<()> {
    run_batch(&args.files, args.keep_going, |path| {
        restore_file(path, &args.tag)
    })
}

/// Recombines a converted PNG back into a raw16 file.
pub fn restore_file(path: &Path, tag: &str) -> Result<PathBuf> {
    let file = fs::File::open(path)?;
    let rgba = png::decode_img(std::io::BufReader::new(file))?;
    let depth = DepthImage::from_rgba8(&rgba);
    let encoded = raw16::encode_img(tag, &depth)?;

    let output = derived_path(path, RESTORED_SUFFIX);
    fs::write(&output, encoded)?;
    Ok(output)
}

pub fn info(args: &InfoArgs) -> Result<()> {
    for path in &args.files {
        let bytes = fs::read(path).map_err(|e| Error::from(e).in_file(path))?;
        let (header, depth) = raw16::parse_img(&bytes).map_err(|e| e.in_file(path))?;
        println!("{}:", path.display());
        println!("  tag:    {}", header.tag);
        println!("  size:   {}x{}", header.width, header.height);
        if let Some((min, max)) = depth.min_max() {
            println!("  depth:  {min}..={max}");
        }
    }
    Ok(())
}
