// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction. Parses arguments with
// `clap`, hands a config to the matching use case and prints
// the report it returns.
//
// Three commands are supported:
//   1. `sentiment` — BiLSTM on SST-2, then accuracy + confusion matrix
//   2. `chirp`     — GRU forecaster on a synthetic chirp
//   3. `mnist`     — feed-forward digit classifier
//
// Reference: Rust Book §12 (CLI programs)

pub mod commands;

use anyhow::Result;
use clap::Parser;
use commands::{ChirpArgs, Commands, MnistArgs, SentimentArgs};

#[derive(Parser, Debug)]
#[command(
    name = "rnn-exercises",
    version = "0.1.0",
    about = "Recurrent network training exercises: BiLSTM sentiment, GRU chirp forecasting, MNIST."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Route to the use case; no computation happens here.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Sentiment(args) => run_sentiment(args),
            Commands::Chirp(args)     => run_chirp(args),
            Commands::Mnist(args)     => run_mnist(args),
        }
    }
}

fn run_sentiment(args: SentimentArgs) -> Result<()> {
    use crate::application::sentiment_use_case::SentimentUseCase;

    tracing::info!("Training data: '{}'", args.data_dir);
    let report = SentimentUseCase::new(args.into()).execute()?;

    tracing::info!(
        "{} of {} dev sentences classified correctly",
        report.confusion.trace(),
        report.confusion.total(),
    );
    println!("The accuracy on the test set is {:.2}%", report.accuracy);
    println!("The confusion matrix is");
    print!("{}", report.confusion);
    Ok(())
}

fn run_chirp(args: ChirpArgs) -> Result<()> {
    use crate::application::chirp_use_case::ChirpUseCase;

    let report = ChirpUseCase::new(args.into()).execute()?;

    println!("Final test loss {:.5}", report.final_test_loss);
    if let (Some(loss), Some(epoch)) = (report.best_test_loss, report.best_epoch) {
        println!("Best test loss {:.5} at epoch {}", loss, epoch);
    }
    Ok(())
}

fn run_mnist(args: MnistArgs) -> Result<()> {
    use crate::application::mnist_use_case::MnistUseCase;

    let report = MnistUseCase::new(args.into()).execute()?;

    if let Some(epoch) = report.best_epoch {
        println!("Best checkpoint from epoch {}", epoch);
    }
    println!("The accuracy on the test set is {:.2}%", report.accuracy);
    println!("The confusion matrix is");
    print!("{}", report.confusion);
    Ok(())
}
