//! GENNET - CLI entry point.
//!
//! Trains a built-in XOR demo task, resumes checkpointed runs, and
//! inspects checkpoint files.

use clap::{Parser, Subcommand};
use gennet::checkpoint::{Checkpoint, CheckpointManager};
use gennet::{Config, Trainer};
use std::path::PathBuf;
use std::time::Instant;

#[derive(Parser)]
#[command(name = "gennet")]
#[command(version)]
#[command(about = "Neuroevolution trainer for fixed-topology feed-forward networks")]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Train the built-in XOR demo task
    Demo {
        /// Configuration file (YAML); evolution settings are honored,
        /// the network topology is fixed by the task
        #[arg(short, long, default_value = "config.yaml")]
        config: PathBuf,

        /// Number of generations to train
        #[arg(short, long, default_value = "200")]
        generations: u64,

        /// Output directory for checkpoints and stats
        #[arg(short, long, default_value = "output")]
        output: PathBuf,

        /// Random seed for reproducibility
        #[arg(long)]
        seed: Option<u64>,

        /// Quiet mode (minimal output)
        #[arg(short, long)]
        quiet: bool,
    },

    /// Resume the XOR demo from a checkpoint
    Resume {
        /// Checkpoint file to resume from
        #[arg(short, long)]
        checkpoint: PathBuf,

        /// Number of additional generations
        #[arg(short, long, default_value = "200")]
        generations: u64,

        /// Output directory
        #[arg(short, long, default_value = "output")]
        output: PathBuf,
    },

    /// Generate default configuration file
    Init {
        /// Output path
        #[arg(short, long, default_value = "config.yaml")]
        output: PathBuf,
    },

    /// Analyze a checkpoint file
    Analyze {
        /// Checkpoint file
        checkpoint: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error>> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();

    match cli.command {
        Commands::Demo {
            config,
            generations,
            output,
            seed,
            quiet,
        } => run_demo(config, generations, output, seed, quiet),

        Commands::Resume {
            checkpoint,
            generations,
            output,
        } => resume_demo(checkpoint, generations, output),

        Commands::Init { output } => generate_config(output),

        Commands::Analyze { checkpoint } => analyze_checkpoint(checkpoint),
    }
}

/// XOR task: two inputs, one output, score in [0, 10] per evaluation.
fn xor_fitness(input: &[f64], output: &[f64]) -> f64 {
    let expected = if (input[0] > 0.5) != (input[1] > 0.5) {
        1.0
    } else {
        0.0
    };
    (1.0 - (output[0] - expected).abs()) * 10.0
}

/// The four XOR input patterns, cycled per specimen.
const XOR_PATTERNS: [[f64; 2]; 4] = [[0.0, 0.0], [0.0, 1.0], [1.0, 0.0], [1.0, 1.0]];

fn run_demo(
    config_path: PathBuf,
    generations: u64,
    output: PathBuf,
    seed: Option<u64>,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    // The demo owns its topology; evolution settings come from the file.
    let mut config = if config_path.exists() {
        println!("Loading config from: {:?}", config_path);
        Config::from_file(&config_path)?
    } else {
        println!("Using default configuration");
        Config::default()
    };
    config.network.layer_sizes = vec![2, 4, 1];
    config.network.activation = gennet::Activation::Sigmoid;

    let mut trainer = if let Some(s) = seed {
        println!("Using seed: {}", s);
        Trainer::with_seed(config, s)?
    } else {
        Trainer::new(config)?
    };
    trainer.set_fitness_fn(xor_fitness);

    println!("Starting XOR demo");
    println!("  Population: {}", trainer.population_size());
    println!("  Generations: {}", generations);
    println!();

    let target = trainer.generation() + generations;
    drive(&mut trainer, target, &output, quiet)
}

fn resume_demo(
    checkpoint_path: PathBuf,
    generations: u64,
    output: PathBuf,
) -> Result<(), Box<dyn std::error::Error>> {
    println!("Loading checkpoint: {:?}", checkpoint_path);

    let checkpoint = Checkpoint::load(&checkpoint_path)?;
    let mut trainer = Trainer::from_checkpoint(checkpoint);
    trainer.set_fitness_fn(xor_fitness);

    println!("Resumed at generation {}", trainer.generation());
    println!("Running {} additional generations", generations);
    println!();

    let target = trainer.generation() + generations;
    drive(&mut trainer, target, &output, false)
}

/// Run the generational loop until `target` generations have completed.
fn drive(
    trainer: &mut Trainer,
    target: u64,
    output: &PathBuf,
    quiet: bool,
) -> Result<(), Box<dyn std::error::Error>> {
    std::fs::create_dir_all(output)?;

    let mut checkpoint_mgr = CheckpointManager::new(
        output.to_string_lossy().to_string(),
        trainer.config().logging.checkpoint_interval,
        10, // keep the last 10 checkpoints
    );

    let start = Instant::now();

    while trainer.generation() < target {
        let before = trainer.generation();
        let input = XOR_PATTERNS[trainer.cursor() % XOR_PATTERNS.len()];
        trainer.train(&input)?;

        // A generation just completed.
        if trainer.generation() != before {
            if !quiet {
                if let Some(stats) = trainer.history().latest() {
                    println!("{}", stats.summary());
                }
            }

            if checkpoint_mgr.should_save(trainer.generation()) {
                let checkpoint = trainer.create_checkpoint();
                match checkpoint_mgr.save(&checkpoint) {
                    Ok(path) => {
                        if !quiet {
                            println!("  Checkpoint saved: {}", path);
                        }
                    }
                    Err(e) => eprintln!("  Checkpoint error: {}", e),
                }
            }
        }
    }

    let elapsed = start.elapsed();

    println!();
    println!("=== Training Complete ===");
    println!("Time: {:.2}s", elapsed.as_secs_f64());
    println!("Generations: {}", trainer.generation());
    println!("Best of last generation: {:.3}", trainer.last_generation_best());
    if let Some(best) = trainer.history().best_ever() {
        println!("Best ever: {:.3}", best);
    }

    // Final checkpoint and stats exports.
    let final_path = output.join("checkpoint_final.bin");
    trainer.create_checkpoint().save(&final_path)?;
    println!("Final checkpoint: {:?}", final_path);

    let stats_json = output.join("stats_history.json");
    trainer.history().save(stats_json.to_string_lossy().as_ref())?;
    let stats_csv = output.join("stats_history.csv");
    trainer.history().save_csv(stats_csv.to_string_lossy().as_ref())?;
    println!("Stats history: {:?}, {:?}", stats_json, stats_csv);

    Ok(())
}

fn generate_config(output: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    let config = Config::default();
    config.save(&output)?;
    println!("Configuration saved to: {:?}", output);
    Ok(())
}

fn analyze_checkpoint(checkpoint_path: PathBuf) -> Result<(), Box<dyn std::error::Error>> {
    println!("=== Checkpoint Analysis ===");
    println!("File: {:?}", checkpoint_path);
    println!();

    let checkpoint = Checkpoint::load(&checkpoint_path)?;

    println!("Generation: {}", checkpoint.generation);
    println!("Cursor: {}", checkpoint.cursor);
    println!("Population: {}", checkpoint.population.len());
    println!("Seed: {}", checkpoint.seed);
    println!();

    println!("Topology: {:?}", checkpoint.config.network.layer_sizes);
    println!("Activation: {}", checkpoint.config.network.activation);
    println!("Breeding: {}", checkpoint.config.evolution.breeding);
    println!(
        "Mutation: chance {}, severity {:?}",
        checkpoint.config.evolution.mutation_chance, checkpoint.config.evolution.mutation_severity
    );
    println!();

    println!("Last generation total: {:.3}", checkpoint.last_generation_score);
    println!("Last generation best: {:.3}", checkpoint.last_generation_best);
    if let Some(best) = checkpoint.history.best_ever() {
        println!("Best ever: {:.3}", best);
    }

    if let Some(network) = checkpoint.population.first() {
        println!("Parameters per network: {}", network.parameter_count());
    }

    println!();
    println!(
        "Checkpoint size: {:.2} MB",
        checkpoint.size_bytes() as f64 / 1_000_000.0
    );

    Ok(())
}
