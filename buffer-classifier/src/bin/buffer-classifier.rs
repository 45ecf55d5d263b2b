// Copyright (c) Microsoft Corporation.
// Licensed under the MIT License.

use std::io::{stdout, Write};
use std::path::PathBuf;

use anyhow::{Context, Result};
use buffer_classifier::{fault::FAULT_ENV, tester::Tester, Classifier, FaultMode};
use clap::{Parser, Subcommand};

#[derive(Parser, Debug)]
#[command(version, about = "Demonstration fuzz target with a known crash")]
struct Opt {
    #[command(subcommand)]
    command: Cmd,
}

#[derive(Subcommand, Debug)]
enum Cmd {
    /// Classify a single input in-process. Crashes on the trigger input.
    Classify {
        input: PathBuf,

        #[arg(long, env = FAULT_ENV, default_value_t = FaultMode::Abort)]
        fault: FaultMode,
    },

    /// Run inputs in child processes and report how each one terminated.
    Test {
        #[arg(required = true, num_args = 1..)]
        inputs: Vec<PathBuf>,

        #[arg(long, env = FAULT_ENV, default_value_t = FaultMode::Abort)]
        fault: FaultMode,

        /// Per-input timeout, in seconds.
        #[arg(short, long, default_value_t = 5)]
        timeout: u64,

        #[arg(long)]
        json: bool,
    },
}

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let opt = Opt::parse();

    match opt.command {
        Cmd::Classify { input, fault } => {
            let data = std::fs::read(&input)
                .with_context(|| format!("unable to read input: {}", input.display()))?;
            let flag = Classifier::new(fault).classify(&data);
            println!("{flag}");
        }
        Cmd::Test {
            inputs,
            fault,
            timeout,
            json,
        } => {
            let exe = std::env::current_exe().context("unable to locate own executable")?;

            let mut tester = Tester::new(&exe);
            tester.timeout(timeout).fault(fault);

            // Resolve every input up front so a bad path fails before any child runs.
            let inputs = inputs
                .iter()
                .map(|input| {
                    std::fs::canonicalize(input)
                        .with_context(|| format!("unable to resolve input: {}", input.display()))
                })
                .collect::<Result<Vec<_>>>()?;

            let mut results = vec![];
            for input in &inputs {
                results.push(tester.test_input(input)?);
            }

            if json {
                serde_json::to_writer_pretty(stdout(), &results)?;
                println!();
            } else {
                let mut out = stdout().lock();
                for result in &results {
                    writeln!(out, "{}: {}", result.input.display(), result.outcome)?;
                }
            }

            let crashes = results.iter().filter(|r| r.outcome.is_crash()).count();
            if crashes > 0 {
                log::info!("{} of {} inputs crashed", crashes, results.len());
                std::process::exit(1);
            }
        }
    }

    Ok(())
}
