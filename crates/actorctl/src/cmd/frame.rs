use anyhow::Context;
use clap::Subcommand;
use function_client::{codec, FrameLimits};

use crate::output::{print_blobs, print_json};

#[derive(Subcommand)]
pub enum FrameSubcommand {
    /// Pack arguments into one frame and print it as hex
    Encode {
        /// Blobs, in order (may be empty)
        args: Vec<String>,
    },
    /// Unpack a hex-encoded frame and print its blobs
    Decode {
        /// The frame as hex
        hex: String,
    },
}

pub fn run(limits: &FrameLimits, subcmd: FrameSubcommand, json: bool) -> anyhow::Result<()> {
    match subcmd {
        FrameSubcommand::Encode { args } => encode(&args, json),
        FrameSubcommand::Decode { hex } => decode(limits, &hex, json),
    }
}

fn encode(args: &[String], json: bool) -> anyhow::Result<()> {
    let frame = codec::encode(args);
    let hex = hex::encode(&frame);
    if json {
        print_json(&serde_json::json!({ "blobs": args.len(), "len": frame.len(), "hex": hex }))
    } else {
        println!("{hex}");
        Ok(())
    }
}

fn decode(limits: &FrameLimits, input: &str, json: bool) -> anyhow::Result<()> {
    let cleaned: String = input.chars().filter(|c| !c.is_whitespace()).collect();
    let frame = hex::decode(&cleaned).context("frame is not valid hex")?;
    let blobs = codec::decode_with(&frame, limits)?;
    print_blobs(&blobs, json)
}
