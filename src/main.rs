#![deny(rust_2018_idioms, clippy::all, clippy::pedantic)]

use std::time::SystemTime;

use anyhow::{Context, Result};
use otpgate_api::{Authenticator, Reply, VerifyRequest};
use otpgate_core::{Enrollment, SecretKey};
use otpgate_gen::TotpConfig;
use secrecy::{ExposeSecret, SecretString, Zeroize};
use tracing::debug;
use tracing_subscriber::EnvFilter;

use crate::cli::{Command, Opt};

mod cli;

fn main() -> Result<()> {
    let opt = Opt::parse();
    init_logging(opt.verbose);

    match opt.cmd {
        Command::Enroll {
            issuer,
            account,
            json,
        } => enroll(opt.totp.config()?, issuer, &account, json),
        Command::Verify { code, secret, json } => verify(opt.totp.config()?, code, secret, json),
        Command::Code { secret } => code(&opt.totp.config()?, secret),
        Command::Inspect { uri } => inspect(&uri),
        Command::Completions { shell } => cli::completions(shell),
        Command::Manpages { dir } => cli::manpages(&dir),
    }
}

fn init_logging(verbose: u8) {
    let directives = match verbose {
        0 => "warn",
        1 => "otpgate=info,otpgate_api=info",
        _ => "otpgate=debug,otpgate_api=debug",
    };

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(directives)),
        )
        .with_writer(std::io::stderr)
        .init();
}

fn enroll(config: TotpConfig, issuer: String, account: &str, json: bool) -> Result<()> {
    let auth = Authenticator::new(issuer, config)?;
    let reply = auth.enroll(account);

    if json {
        println!("{}", reply.to_json()?);
    }

    let enrolled = outcome(reply)?;
    if !json {
        println!("Secret: {}", enrolled.encoded_secret);
        println!("URI:    {}", enrolled.enrollment_uri);
    }

    Ok(())
}

fn verify(config: TotpConfig, code: String, secret: Option<String>, json: bool) -> Result<()> {
    let secret = read_secret(secret)?;
    let auth = Authenticator::new(env!("CARGO_PKG_NAME"), config)?;

    let mut request = VerifyRequest {
        submitted_code: Some(code),
        encoded_secret: Some(secret.expose_secret().clone()),
    };
    let reply = auth.verify(&request, SystemTime::now());
    request.encoded_secret.zeroize();

    if json {
        println!("{}", reply.to_json()?);
    }

    outcome(reply)?;
    if !json {
        println!("Code accepted");
    }

    Ok(())
}

/// Turn an error reply into an error, so it propagates and ends the program with a failure status.
fn outcome<T>(reply: Reply<T>) -> Result<T> {
    reply.into_result().map_err(anyhow::Error::msg)
}

fn code(config: &TotpConfig, secret: Option<String>) -> Result<()> {
    let secret = read_secret(secret)?;
    let secret =
        SecretKey::from_base32(secret.expose_secret()).context("failed decoding the secret")?;

    let now = SystemTime::now();
    let code = otpgate_gen::generate(&secret, config, now)?;
    let remaining = config.clock()?.remaining(now)?;

    println!("{code}");
    println!("valid for {remaining}s");

    Ok(())
}

fn inspect(uri: &str) -> Result<()> {
    let enrollment = uri.parse::<Enrollment>()?;
    debug!(issuer = %enrollment.issuer, "parsed enrollment URI");

    println!("Issuer:    {}", enrollment.issuer);
    println!("Account:   {}", enrollment.account);
    println!("Algorithm: {}", enrollment.algorithm);
    println!("Digits:    {}", enrollment.digits);
    println!("Period:    {}s", enrollment.period);
    println!("Secret:    {} bits", enrollment.secret.len() * 8);

    Ok(())
}

fn read_secret(secret: Option<String>) -> Result<SecretString> {
    let secret = match secret {
        Some(secret) => secret,
        None => rpassword::prompt_password("Secret:")?,
    };

    Ok(SecretString::new(secret))
}
