//! Command-line front end: `initialize`, `sign`, and `verify`.

use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;

use clap::{Parser, Subcommand};
use tracing::{error, info};

use hardyhash::error::{Error, Result};
use hardyhash::keygen::{initialize, write_signer_states};
use hardyhash::params::Params;
use hardyhash::sign::{sign, write_signature};
use hardyhash::verify::{load_public_key, load_signature, verify};

#[derive(Parser)]
#[command(name = "hardyhash")]
#[command(about = "Stateful hash-based signatures over a Merkle hypertree", long_about = None)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Create signer state files and a public key
    Initialize {
        /// Log2 of the number of signers; even, between 2 and 16
        lg_n_signers: u32,

        /// Log2 of the number of messages per signer; even, between
        /// 2 and 16
        lg_messages_per_signer: u32,

        /// Entropy seed, at most 1024 characters
        randomness: String,

        /// Output directory; must not exist yet
        output_dir: PathBuf,
    },

    /// Sign a message, consuming one leaf of a signer state
    Sign {
        /// Path to the signer state file
        state_path: PathBuf,

        /// Path to the message to sign
        message_path: PathBuf,

        /// Where to write the signature
        signature_path: PathBuf,
    },

    /// Verify a signature against a public key
    Verify {
        /// Path to the public key file
        public_key_path: PathBuf,

        /// Path to the signed message
        message_path: PathBuf,

        /// Path to the signature file
        signature_path: PathBuf,
    },
}

fn read_message(path: &Path) -> Result<Vec<u8>> {
    fs::read(path).map_err(|source| Error::Io {
        context: "reading message file",
        source,
    })
}

fn create_output_dir(path: &Path) -> Result<()> {
    if path.exists() {
        return Err(Error::Usage {
            reason: "output directory already exists",
        });
    }
    let mut builder = fs::DirBuilder::new();
    #[cfg(unix)]
    {
        use std::os::unix::fs::DirBuilderExt;
        builder.mode(0o700);
    }
    builder.create(path).map_err(|source| Error::Io {
        context: "creating output directory",
        source,
    })
}

fn run(cli: Cli) -> Result<()> {
    match cli.command {
        Commands::Initialize {
            lg_n_signers,
            lg_messages_per_signer,
            randomness,
            output_dir,
        } => {
            let params = Params::new(lg_n_signers, lg_messages_per_signer)?;
            create_output_dir(&output_dir)?;
            info!("initializing");
            let keys = initialize(params, randomness.as_bytes())?;
            info!(output_dir = %output_dir.display(), "writing signer states and public key");
            write_signer_states(&keys, &output_dir)?;
            info!(public_key = %hex::encode(keys.public_key), "initialized successfully");
            Ok(())
        }
        Commands::Sign {
            state_path,
            message_path,
            signature_path,
        } => {
            let message = read_message(&message_path)?;
            let signature = sign(&state_path, &message)?;
            write_signature(&signature_path, &signature)?;
            Ok(())
        }
        Commands::Verify {
            public_key_path,
            message_path,
            signature_path,
        } => {
            let public_key = load_public_key(&public_key_path)?;
            let message = read_message(&message_path)?;
            let signature = load_signature(&signature_path)?;
            if !verify(&public_key, &message, &signature) {
                return Err(Error::Verification);
            }
            println!("Verified successfully.");
            Ok(())
        }
    }
}

fn main() -> ExitCode {
    tracing_subscriber::fmt::init();

    let cli = match Cli::try_parse() {
        Ok(cli) => cli,
        Err(err) => {
            // Usage problems exit 1, like every other failure here.
            let _ = err.print();
            return ExitCode::FAILURE;
        }
    };

    match run(cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(Error::Verification) => {
            eprintln!("Verification failed.");
            ExitCode::FAILURE
        }
        Err(err) => {
            error!("{}", err);
            ExitCode::FAILURE
        }
    }
}
