use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "snapclass")]
#[command(author, version, about = "Classify images with a pre-trained model")]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Classify one image
    Classify {
        /// Classifier configuration file
        #[arg(short, long, default_value = "snapclass.yaml", env = "SNAPCLASS_CONFIG")]
        config: PathBuf,

        /// Configured model name
        #[arg(short, long)]
        model: String,

        /// Image file
        image: PathBuf,

        /// Print the label text instead of the parsed class id
        #[arg(long)]
        label: bool,

        /// Resize the image to the model input first
        #[arg(long)]
        resize: bool,

        /// Print the full prediction as JSON
        #[arg(long, conflicts_with = "label")]
        json: bool,
    },

    /// List a model's labels
    Labels {
        /// Classifier configuration file
        #[arg(short, long, default_value = "snapclass.yaml", env = "SNAPCLASS_CONFIG")]
        config: PathBuf,

        /// Configured model name
        #[arg(short, long)]
        model: String,
    },
}
