//! Range command - show a distance band around a cell

use anyhow::{bail, Result};
use clap::Args;

use hexfront_core::{cells_within_range, ring_size, Hex};

use crate::render::render_band;

#[derive(Args)]
pub struct RangeArgs {
    /// Origin column
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    pub x: i32,

    /// Origin row
    #[arg(long, default_value = "0", allow_hyphen_values = true)]
    pub y: i32,

    /// Smallest distance included
    #[arg(long, default_value = "0")]
    pub min: i32,

    /// Largest distance included
    #[arg(long, default_value = "2")]
    pub max: i32,

    /// Print coordinates instead of a picture
    #[arg(long)]
    pub list: bool,
}

pub fn run(args: RangeArgs) -> Result<()> {
    if args.max > 64 {
        bail!("Range {} is too large to display", args.max);
    }

    let origin = Hex::new(args.x, args.y);
    let cells: Vec<Hex> = cells_within_range(origin, args.min, args.max).collect();

    println!(
        "{} cells within {}..={} of {} (full footprint {})",
        cells.len(),
        args.min,
        args.max,
        origin,
        ring_size(args.max) + 1
    );

    if args.list {
        for hex in &cells {
            println!("{}", hex);
        }
    } else {
        print!("{}", render_band(origin, &cells));
    }
    Ok(())
}
