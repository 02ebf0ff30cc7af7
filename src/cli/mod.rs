// ============================================================
// Layer 1 — CLI / Presentation Layer
// ============================================================
// Entry point for all user interaction. Parses arguments with
// clap and delegates to Layer 2 (application).
//
//   1. `train`   — fit LeNet and log holdout accuracy
//   2. `predict` — classify one image file
//   3. `serve`   — expose training and prediction over HTTP
//
// Reference: Rust Book §7 (Modules), §12 (CLI programs)

pub mod commands;

use anyhow::{Context, Result};
use clap::Parser;
use commands::{Commands, PredictArgs, ServeArgs, TrainArgs};

use crate::application::{
    predict_use_case::PredictUseCase,
    train_use_case::{TrainConfig, TrainUseCase},
};
use crate::ml::backend::{default_device, Engine};

#[derive(Parser, Debug)]
#[command(
    name = "lenet-digits",
    version = "0.1.0",
    about = "Train a LeNet handwritten-digit classifier and classify images."
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    /// Dispatch to the selected subcommand. Routes only, never computes.
    pub fn run(self) -> Result<()> {
        match self.command {
            Commands::Train(args)   => run_train(args),
            Commands::Predict(args) => run_predict(args),
            Commands::Serve(args)   => run_serve(args),
        }
    }
}

fn run_train(args: TrainArgs) -> Result<()> {
    let dataset = args.dataset_config();
    let holdout = args.holdout;

    let outcome = TrainUseCase::new(args.into(), dataset)
        .with_holdout(holdout)
        .execute()?;

    match outcome.holdout_accuracy {
        Some(accuracy) => println!("Training complete. Holdout accuracy: {:.2}%", accuracy * 100.0),
        None           => println!("Training complete."),
    }
    Ok(())
}

fn run_predict(args: PredictArgs) -> Result<()> {
    let mut use_case = if args.untrained {
        tracing::warn!("Predicting with untrained weights");
        let mut use_case = PredictUseCase::new(engine_from(&args.train)?);
        use_case.build_model();
        use_case
    } else {
        let dataset = args.train.dataset_config();
        let holdout = args.train.holdout;
        let outcome = TrainUseCase::new(args.train.clone().into(), dataset)
            .with_holdout(holdout)
            .execute()?;
        PredictUseCase::new(outcome.engine)
    };

    let digit = use_case.predict_file(&args.image)?;
    println!("{digit}");
    Ok(())
}

fn run_serve(args: ServeArgs) -> Result<()> {
    let mut use_case = PredictUseCase::new(engine_from(&args.train)?);
    if args.train_on_start {
        use_case.train()?;
    }

    let runtime = tokio::runtime::Builder::new_multi_thread()
        .enable_all()
        .build()
        .context("Failed to start the async runtime")?;

    runtime.block_on(crate::server::serve(&args.addr, use_case))
}

fn engine_from(args: &TrainArgs) -> Result<Engine> {
    let source = args.dataset_config().into_source()?;
    let config = TrainConfig::from(args.clone());
    Ok(Engine::new(source, config, default_device()))
}
