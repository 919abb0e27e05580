use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use coalign_core::cancel::CancelToken;
use coalign_core::detection::detect_limb;
use coalign_core::io::image_io::load_image;
use coalign_core::pipeline::config::LimbConfig;

use crate::summary::print_disc;

#[derive(Args)]
pub struct InfoArgs {
    /// Input images
    #[arg(required = true)]
    pub files: Vec<PathBuf>,

    /// Also run limb detection and report the fitted disc
    #[arg(long)]
    pub limb: bool,
}

pub fn run(args: &InfoArgs) -> Result<()> {
    let limb_config = LimbConfig::default();
    let cancel = CancelToken::new();

    for (index, path) in args.files.iter().enumerate() {
        let frame =
            load_image(path).with_context(|| format!("Failed to read {}", path.display()))?;
        let (min, max) = frame
            .data
            .iter()
            .fold((f32::INFINITY, f32::NEG_INFINITY), |(lo, hi), &v| {
                (lo.min(v), hi.max(v))
            });

        println!("File:        {}", path.display());
        println!("Dimensions:  {}x{}", frame.width(), frame.height());
        println!("Bit depth:   {}", frame.original_bit_depth);
        println!("Range:       {:.4} - {:.4}", min, max);

        if args.limb {
            match detect_limb(&frame.data, index, &limb_config, &cancel) {
                Ok(detection) => print_disc(&detection.disc),
                Err(e) => println!("Disc:        not found ({e})"),
            }
        }
        println!();
    }

    Ok(())
}
