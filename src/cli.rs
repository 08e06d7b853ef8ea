use std::{
    fs::OpenOptions,
    io::{self, Write},
    path::{Path, PathBuf},
};

use anyhow::{ensure, Context, Result};
use clap::{ArgAction, Args, CommandFactory, Parser, Subcommand, ValueHint};
use clap_complete::Shell;
use otpgate_core::Algorithm;
use otpgate_gen::TotpConfig;

#[derive(Parser)]
#[command(about, author, version, propagate_version = true)]
pub struct Opt {
    /// Increase the log output, may be repeated.
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,
    #[command(flatten)]
    pub totp: TotpArgs,
    #[command(subcommand)]
    pub cmd: Command,
}

impl Opt {
    pub fn parse() -> Self {
        <Opt as Parser>::parse()
    }
}

/// Parameters of the generated codes. Both sides of an enrollment must agree on them.
#[derive(Args)]
pub struct TotpArgs {
    /// Digest algorithm used to derive codes (SHA1, SHA256 or SHA512).
    #[arg(long, global = true, env = "OTPGATE_ALGORITHM", default_value_t = Algorithm::Sha1)]
    pub algorithm: Algorithm,
    /// Amount of digits per code, between 6 and 8.
    #[arg(long, global = true, env = "OTPGATE_DIGITS", default_value_t = 6)]
    pub digits: u8,
    /// Seconds that a single code is valid.
    #[arg(long, global = true, env = "OTPGATE_PERIOD", default_value_t = 30)]
    pub period: u64,
    /// Amount of time steps before and after the current one that are accepted as well.
    #[arg(long, global = true, env = "OTPGATE_WINDOW", default_value_t = 1)]
    pub window: u32,
    /// Length of newly generated secrets in bytes, at least 16.
    #[arg(long, global = true, env = "OTPGATE_SECRET_LENGTH", default_value_t = 20)]
    pub secret_length: usize,
    /// Unix time at which the first time step begins.
    #[arg(long, global = true, env = "OTPGATE_EPOCH", default_value_t = 0)]
    pub epoch: u64,
}

impl TotpArgs {
    pub fn config(&self) -> Result<TotpConfig> {
        let config = TotpConfig {
            algorithm: self.algorithm,
            digits: self.digits,
            period: self.period,
            epoch: self.epoch,
            window: self.window,
            secret_length: self.secret_length,
        };

        config.validate().context("invalid TOTP settings")?;

        Ok(config)
    }
}

#[derive(Subcommand)]
pub enum Command {
    /// Create a new secret and print it together with its enrollment URI.
    Enroll {
        /// Name of the service, shown as title in authenticator apps.
        #[arg(long, env = "OTPGATE_ISSUER")]
        issuer: String,
        /// Account the secret is created for, like a user name or mail address.
        #[arg(long)]
        account: String,
        /// Print the response body of the enrollment endpoint instead.
        #[arg(long)]
        json: bool,
    },
    /// Check a code against a secret and the current time.
    Verify {
        /// The code to check.
        code: String,
        /// The Base32 encoded secret. Asked for interactively if not given.
        #[arg(long, env = "OTPGATE_SECRET", hide_env_values = true)]
        secret: Option<String>,
        /// Print the response body of the verification endpoint instead.
        #[arg(long)]
        json: bool,
    },
    /// Print the currently valid code of a secret.
    Code {
        /// The Base32 encoded secret. Asked for interactively if not given.
        #[arg(long, env = "OTPGATE_SECRET", hide_env_values = true)]
        secret: Option<String>,
    },
    /// Show the settings of an `otpauth://` URI, without its secret.
    Inspect {
        /// The URI, as encoded in enrollment QR codes.
        uri: String,
    },
    /// Generate auto-completion scripts for various shells.
    Completions {
        /// Shell to generate an auto-completion script for.
        #[arg(value_enum)]
        shell: Shell,
    },
    /// Generate man pages into the given directory.
    Manpages {
        /// Target directory, that must already exist and be empty. If the any file with the same
        /// name as any of the man pages already exist, it'll not be overwritten, but instead an
        /// error be returned.
        #[arg(value_hint = ValueHint::DirPath)]
        dir: PathBuf,
    },
}

#[allow(clippy::unnecessary_wraps)]
pub fn completions(shell: Shell) -> Result<()> {
    clap_complete::generate(
        shell,
        &mut Opt::command(),
        env!("CARGO_PKG_NAME"),
        &mut io::stdout().lock(),
    );
    Ok(())
}

pub fn manpages(dir: &Path) -> Result<()> {
    fn print(dir: &Path, app: &clap::Command) -> Result<()> {
        let name = app.get_display_name().unwrap_or_else(|| app.get_name());
        let out = dir.join(format!("{name}.1"));
        let mut out = OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&out)
            .with_context(|| format!("the file `{}` already exists", out.display()))?;

        clap_mangen::Man::new(app.clone()).render(&mut out)?;
        out.flush()?;

        for sub in app.get_subcommands() {
            print(dir, sub)?;
        }

        Ok(())
    }

    ensure!(dir.try_exists()?, "target directory doesn't exist");

    let mut app = Opt::command();
    app.build();

    print(dir, &app)
}
