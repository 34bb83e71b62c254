use std::path::PathBuf;
use std::process::ExitCode;

use clap::Parser;

use yaffs_extract::config::{Config, Endianness};
use yaffs_extract::{detect, extractor::ObjectTable, parser::LogParser, YaffsError};

/// Extracts a YAFFS flash filesystem image into a directory tree.
#[derive(Parser, Debug)]
#[command(name = "yaffs-extract", version, about)]
struct Args {
    /// Input image file.
    #[arg(short = 'f', long = "file")]
    file: PathBuf,

    /// Output directory. Must not already exist.
    #[arg(short = 'd', long = "dir")]
    dir: PathBuf,

    /// Page size in bytes.
    #[arg(short = 'p', long = "page-size")]
    page_size: Option<u32>,

    /// Spare (out-of-band) area size in bytes.
    #[arg(short = 's', long = "spare-size")]
    spare_size: Option<u32>,

    /// Image byte order.
    #[arg(short = 'e', long = "endianness", value_enum)]
    endianness: Option<Endianness>,

    /// Disable ECC spare layout (2-byte junk prefix before chunk_id).
    #[arg(short = 'n', long = "no-ecc")]
    no_ecc: bool,

    /// Detect page size, endianness, and ECC layout from the first 10 KiB.
    #[arg(short = 'a', long = "auto")]
    auto: bool,

    /// Preserve uid/gid ownership (requires appropriate privilege).
    #[arg(short = 'o', long = "ownership")]
    ownership: bool,

    /// Print a record dump of every parsed object.
    #[arg(short = 'D', long = "debug")]
    debug: bool,
}

impl clap::ValueEnum for Endianness {
    fn value_variants<'a>() -> &'a [Self] {
        &[Endianness::Little, Endianness::Big]
    }

    fn to_possible_value(&self) -> Option<clap::builder::PossibleValue> {
        Some(match self {
            Endianness::Little => clap::builder::PossibleValue::new("little"),
            Endianness::Big => clap::builder::PossibleValue::new("big"),
        })
    }
}

fn run(args: Args) -> Result<(), YaffsError> {
    let image = std::fs::read(&args.file).map_err(|source| YaffsError::ImageOpen {
        path: args.file.display().to_string(),
        source,
    })?;

    let mut config = if args.auto {
        let sample_end = detect::SAMPLE_SIZE.min(image.len());
        detect::detect(&image[..sample_end])?
    } else {
        Config::default()
    };

    if let Some(page_size) = args.page_size {
        config.page_size = page_size;
    }
    if let Some(spare_size) = args.spare_size {
        config.spare_size = spare_size;
    }
    if let Some(endianness) = args.endianness {
        config.endianness = endianness;
    }
    if args.no_ecc {
        config.ecc_layout = false;
    }
    config.preserve_owner = args.ownership;
    config.debug = args.debug;

    std::fs::create_dir(&args.dir).map_err(|source| YaffsError::OutputDirCreate {
        path: args.dir.display().to_string(),
        source,
    })?;

    let table = ObjectTable::build(LogParser::new(&image, &config))?;
    let counters = table.materialise(&args.dir, &config);

    println!(
        "{} director{}, {} file{}, {} link{} created",
        counters.dirs_created,
        if counters.dirs_created == 1 { "y" } else { "ies" },
        counters.files_created,
        if counters.files_created == 1 { "" } else { "s" },
        counters.links_created,
        if counters.links_created == 1 { "" } else { "s" },
    );

    Ok(())
}

fn main() -> ExitCode {
    let args = match Args::try_parse() {
        Ok(args) => args,
        Err(e) => {
            eprintln!("yaffs-extract: {}", YaffsError::InvalidArgument(e.to_string()));
            return ExitCode::FAILURE;
        }
    };

    // `-D/--debug` (§6) sets the default log level directly, rather than
    // relying on the caller to separately export `RUST_LOG`.
    env_logger::Builder::new()
        .filter_level(if args.debug { log::LevelFilter::Debug } else { log::LevelFilter::Warn })
        .parse_default_env()
        .init();

    match run(args) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("yaffs-extract: {e}");
            ExitCode::FAILURE
        }
    }
}
