// This Source Code Form is subject to the terms of the Mozilla Public
// License, v. 2.0. If a copy of the MPL was not distributed with this
// file, You can obtain one at https://mozilla.org/MPL/2.0/.

use std::{ffi::OsString, path::PathBuf, process::exit};

use anyhow::{Context, Result};
use clap::{error::ErrorKind, Parser};
use imageinfo::{BuildEnv, ImageDescriptor};
use log::{debug, info};

/// Writes the JSON metadata describing one firmware image.
///
/// Everything about the image (its location, target, device and titles) is
/// taken from the environment the build system runs us in, e.g. `FILE_DIR`,
/// `FILE_NAME`, `TARGET`, `DEVICE_ID` and `SOURCE_DATE_EPOCH`. If the image
/// was not built, nothing is written and we exit successfully.
#[derive(Parser, Debug)]
#[clap(name = "image-json", version, max_term_width = 80)]
struct Args {
    /// Path of the JSON file to write
    #[clap(allow_hyphen_values = true)]
    output: PathBuf,
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(
        env_logger::Env::default().default_filter_or("warn"),
    )
    .init();

    // The output path is the one and only argument, even if it looks like
    // an option; `--` on its own names no file.
    let argv: Vec<OsString> = std::env::args_os().collect();
    if argv.len() != 2 || argv[1] == "--" {
        usage_error();
    }

    let args = match Args::try_parse_from(&argv) {
        Ok(args) => args,
        Err(e)
            if matches!(
                e.kind(),
                ErrorKind::DisplayHelp | ErrorKind::DisplayVersion
            ) =>
        {
            e.exit()
        }
        Err(e) => {
            debug!("bad arguments: {e}");
            usage_error();
        }
    };

    let env = BuildEnv::from_env();
    let image = env.image_path().context("locating image")?;

    if !image.is_file() {
        println!(
            "Skip JSON creation for non existing file {}",
            image.display()
        );
        return Ok(());
    }

    let descriptor = ImageDescriptor::generate(&env, &image)
        .with_context(|| format!("describing {}", image.display()))?;
    descriptor.write(&args.output)?;
    info!("wrote {}", args.output.display());

    Ok(())
}

fn usage_error() -> ! {
    println!("ERROR: JSON info script requires output arg");
    exit(1);
}
