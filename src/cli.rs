use clap::Parser;
use std::path::PathBuf;

use crate::model::knn::DistanceMetric;

#[derive(Parser, Debug)]
#[command(name = "speakerid", about = "Identify speakers from voice recordings using MFCC fingerprints")]
pub struct Cli {
    /// Config file (defaults to ./speakerid.toml or the user config dir)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// JSON file to restore training samples from and save them to
    #[arg(short, long)]
    pub training_data: Option<PathBuf>,

    /// Number of neighbors consulted when classifying
    #[arg(short, long)]
    pub k: Option<usize>,

    /// Distance metric for neighbor search
    #[arg(long, value_enum)]
    pub metric: Option<DistanceMetric>,
}
