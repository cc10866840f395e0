use clap::{Parser, Subcommand};

use integrity_core::defaults::TOKEN_FILE_NAME;

#[derive(Parser, Debug, Clone)]
#[command(name = "integrity", version, about = "File integrity token generator and verifier")]
pub struct Cli {
    /// Emit JSON output on stdout.
    #[arg(long, global = true)]
    pub json: bool,

    /// Log verification stages to stderr (RUST_LOG overrides).
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Command {
    /// Sign a single file.
    Sign {
        /// Input file name.
        #[arg(long = "in")]
        input: String,

        /// Output file name.
        #[arg(long, default_value = TOKEN_FILE_NAME)]
        out: String,

        /// Path to PEM-encoded signing key file (PKCS8/RSA).
        #[arg(long)]
        key: String,

        /// Integrity file issuer.
        #[arg(long)]
        issuer: String,
    },

    /// Sign a manifest covering several files.
    Manifest {
        /// Files to cover. Recorded exactly as given.
        #[arg(required = true)]
        paths: Vec<String>,

        /// Output file name.
        #[arg(long, default_value = TOKEN_FILE_NAME)]
        out: String,

        /// Path to PEM-encoded signing key file (PKCS8/RSA).
        #[arg(long)]
        key: String,

        /// Integrity file issuer.
        #[arg(long)]
        issuer: String,

        /// Expand directory arguments into the files below them.
        #[arg(long, short)]
        recursive: bool,
    },

    /// Verify a single file against its integrity token.
    Verify {
        /// File to verify.
        #[arg(long = "in")]
        input: String,

        /// Integrity token file.
        #[arg(long, default_value = TOKEN_FILE_NAME)]
        token: String,

        /// Path to PEM-encoded public key file.
        #[arg(long)]
        key: String,

        /// Expected issuer.
        #[arg(long)]
        issuer: String,
    },

    /// Verify every file listed in a manifest token.
    VerifyManifest {
        /// Manifest token file, relative to --root.
        #[arg(long, default_value = TOKEN_FILE_NAME)]
        token: String,

        /// Directory holding the manifest token. Entries are still resolved
        /// against the working directory.
        #[arg(long, default_value = "")]
        root: String,

        /// Path to PEM-encoded public key file.
        #[arg(long)]
        key: String,

        /// Expected issuer.
        #[arg(long)]
        issuer: String,
    },
}
