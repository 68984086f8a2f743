//! pwseal: password envelope CLI
//!
//! Commands:
//!   encrypt [TEXT]          - seal text under a password, print the envelope
//!   decrypt [ENVELOPE]      - open an envelope, print the text
//!   base64 encode|decode    - plain Base64 of UTF-8 text, no encryption
//!   backends                - show which backend serves each primitive
//!   config show             - display current configuration

use anyhow::{Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use secrecy::SecretString;
use std::io::Read;
use std::path::{Path, PathBuf};

use pwseal_core::config::{expand_tilde, BackendChoice, PwsealConfig};
use pwseal_core::{Algorithm, Backend, TextEncoding};
use pwseal_crypto::Sealer;

const AUTH_FAILURE: &str = "decryption failed: wrong password, wrong algorithm, or corrupted data";

// ── CLI structure ──────────────────────────────────────────────────────────────

#[derive(Parser, Debug)]
#[command(
    name = "pwseal",
    version,
    about = "Password-based text encryption",
    long_about = "pwseal: seal text under a password with AES-256-GCM or ChaCha20-Poly1305"
)]
struct Cli {
    /// Path to config.toml
    #[arg(long, short = 'c', env = "PWSEAL_CONFIG", default_value = "~/.config/pwseal/config.toml")]
    config: PathBuf,

    /// Log level (overrides [log] level; RUST_LOG overrides both)
    #[arg(long, env = "PWSEAL_LOG")]
    log: Option<String>,

    /// Log format (overrides [log] format)
    #[arg(long, env = "PWSEAL_LOG_FORMAT")]
    log_format: Option<LogFormat>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Clone, Debug, ValueEnum)]
enum LogFormat {
    Json,
    Text,
}

#[derive(clap::Args, Debug)]
struct CipherArgs {
    /// AEAD algorithm: AES-256-GCM or ChaCha20-Poly1305 (default from config)
    #[arg(long, short = 'a')]
    algorithm: Option<Algorithm>,

    /// Envelope text encoding (default from config)
    #[arg(long, short = 'e')]
    encoding: Option<TextEncoding>,

    /// Password; prompted for when neither this nor PWSEAL_PASSWORD is set
    #[arg(long, short = 'p', env = "PWSEAL_PASSWORD", hide_env_values = true)]
    password: Option<String>,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Encrypt text (read from stdin when TEXT is omitted)
    Encrypt {
        text: Option<String>,
        #[command(flatten)]
        cipher: CipherArgs,
    },

    /// Decrypt an envelope (read from stdin when ENVELOPE is omitted)
    Decrypt {
        envelope: Option<String>,
        #[command(flatten)]
        cipher: CipherArgs,
    },

    /// Base64 helpers, independent of encryption
    Base64 {
        #[command(subcommand)]
        action: Base64Action,
    },

    /// Show backend capabilities for this machine
    Backends {
        /// Emit JSON instead of a table
        #[arg(long)]
        json: bool,
    },

    /// Configuration management
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand, Debug)]
enum Base64Action {
    /// Base64 of the UTF-8 bytes of TEXT
    Encode { text: Option<String> },
    /// Decode Base64 back to UTF-8 text
    Decode { text: Option<String> },
}

#[derive(Subcommand, Debug)]
enum ConfigAction {
    /// Print the active configuration (merged defaults + config file)
    Show,
}

// ── Entry point ───────────────────────────────────────────────────────────────

fn main() -> Result<()> {
    let cli = Cli::parse();
    let config_path = expand_tilde(&cli.config);
    let config = PwsealConfig::load(&config_path).context("loading configuration")?;

    let level = cli.log.as_deref().unwrap_or(config.log.level.as_str());
    let format = match cli.log_format {
        Some(f) => f,
        None => parse_log_format(&config.log.format)?,
    };
    init_logging(level, &format);
    tracing::debug!(
        config = %config_path.display(),
        backend = ?config.cipher.backend,
        algorithm = %config.cipher.algorithm,
        "configuration loaded"
    );

    match cli.command {
        Commands::Encrypt { text, cipher } => cmd_encrypt(&config, text, cipher),
        Commands::Decrypt { envelope, cipher } => cmd_decrypt(&config, envelope, cipher),
        Commands::Base64 { action: Base64Action::Encode { text } } => {
            println!("{}", pwseal_crypto::to_base64(&input_or_stdin(text)?));
            Ok(())
        }
        Commands::Base64 { action: Base64Action::Decode { text } } => {
            let decoded = pwseal_crypto::from_base64(&input_or_stdin(text)?)
                .context("decoding Base64")?;
            println!("{decoded}");
            Ok(())
        }
        Commands::Backends { json } => cmd_backends(&config, json),
        Commands::Config { action: ConfigAction::Show } => cmd_config_show(&config, &config_path),
    }
}

fn init_logging(level: &str, format: &LogFormat) {
    use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

    match format {
        LogFormat::Json => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().json().with_writer(std::io::stderr))
                .init();
        }
        LogFormat::Text => {
            tracing_subscriber::registry()
                .with(filter)
                .with(fmt::layer().with_writer(std::io::stderr))
                .init();
        }
    }
}

fn parse_log_format(s: &str) -> Result<LogFormat> {
    LogFormat::from_str(s, true)
        .map_err(|_| anyhow::anyhow!("invalid [log] format '{s}': expected 'text' or 'json'"))
}

// ── Helpers ───────────────────────────────────────────────────────────────────

fn sealer_for(choice: BackendChoice) -> Sealer {
    match choice {
        BackendChoice::Auto => Sealer::platform(),
        BackendChoice::Native => Sealer::with_backend(Backend::Native),
        BackendChoice::Fallback => Sealer::with_backend(Backend::Fallback),
    }
}

/// Use the positional argument, or read all of stdin with one trailing newline stripped.
fn input_or_stdin(arg: Option<String>) -> Result<String> {
    match arg {
        Some(text) => Ok(text),
        None => {
            let mut buf = String::new();
            std::io::stdin()
                .read_to_string(&mut buf)
                .context("reading stdin")?;
            Ok(strip_trailing_newline(buf))
        }
    }
}

fn strip_trailing_newline(mut s: String) -> String {
    if s.ends_with('\n') {
        s.pop();
        if s.ends_with('\r') {
            s.pop();
        }
    }
    s
}

fn resolve_password(arg: Option<String>) -> Result<SecretString> {
    match arg {
        Some(p) => Ok(SecretString::from(p)),
        None => {
            let p = rpassword::prompt_password("Password: ").context("reading password")?;
            Ok(SecretString::from(p))
        }
    }
}

struct Resolved {
    algorithm: Algorithm,
    encoding: TextEncoding,
    password: SecretString,
}

fn resolve_cipher(config: &PwsealConfig, args: CipherArgs) -> Result<Resolved> {
    Ok(Resolved {
        algorithm: args.algorithm.unwrap_or(config.cipher.algorithm),
        encoding: args.encoding.unwrap_or_else(|| config.cipher.encoding.clone()),
        password: resolve_password(args.password)?,
    })
}

// ── `pwseal encrypt` / `pwseal decrypt` ──────────────────────────────────────

fn cmd_encrypt(config: &PwsealConfig, text: Option<String>, args: CipherArgs) -> Result<()> {
    let text = input_or_stdin(text)?;
    let cipher = resolve_cipher(config, args)?;
    let sealer = sealer_for(config.cipher.backend);

    let envelope = sealer
        .encrypt(&text, &cipher.password, cipher.algorithm, &cipher.encoding)
        .with_context(|| format!("encrypting with {}", cipher.algorithm))?;
    println!("{envelope}");
    Ok(())
}

fn cmd_decrypt(config: &PwsealConfig, envelope: Option<String>, args: CipherArgs) -> Result<()> {
    let envelope = input_or_stdin(envelope)?;
    let cipher = resolve_cipher(config, args)?;
    let sealer = sealer_for(config.cipher.backend);

    match sealer.decrypt(&envelope, &cipher.password, cipher.algorithm, &cipher.encoding) {
        Ok(text) => {
            println!("{text}");
            Ok(())
        }
        Err(e) if e.is_authentication() => anyhow::bail!(AUTH_FAILURE),
        Err(e) => Err(e).with_context(|| format!("decrypting with {}", cipher.algorithm)),
    }
}

// ── `pwseal backends` ────────────────────────────────────────────────────────

fn cmd_backends(config: &PwsealConfig, json: bool) -> Result<()> {
    let sealer = sealer_for(config.cipher.backend);
    let caps = sealer.initialize();

    if json {
        let rendered = serde_json::to_string_pretty(&caps).context("serializing capabilities")?;
        println!("{rendered}");
        return Ok(());
    }

    println!("selection:          {:?}", config.cipher.backend);
    println!("AES-256-GCM:        {}", caps.aes_256_gcm);
    println!("ChaCha20-Poly1305:  {}", caps.chacha20_poly1305);
    println!("PBKDF2-HMAC-SHA256: {}", caps.pbkdf2);
    println!("random:             {}", caps.random);
    Ok(())
}

// ── `pwseal config show` ─────────────────────────────────────────────────────

fn cmd_config_show(config: &PwsealConfig, config_path: &Path) -> Result<()> {
    if config_path.exists() {
        println!("# Configuration from: {}", config_path.display());
    } else {
        println!("# Configuration: defaults (no file at {})", config_path.display());
    }
    println!();
    let rendered = toml::to_string_pretty(config).context("serializing config to TOML")?;
    print!("{rendered}");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_cli_parses_encrypt_flags() {
        let cli = Cli::try_parse_from([
            "pwseal",
            "encrypt",
            "hello",
            "--algorithm",
            "chacha",
            "--password",
            "pw",
        ])
        .unwrap();
        match cli.command {
            Commands::Encrypt { text, cipher } => {
                assert_eq!(text.as_deref(), Some("hello"));
                assert_eq!(cipher.algorithm, Some(Algorithm::ChaCha20Poly1305));
                assert!(cipher.encoding.is_none());
            }
            other => panic!("unexpected command: {other:?}"),
        }
    }

    #[test]
    fn test_cli_rejects_unknown_algorithm() {
        assert!(Cli::try_parse_from(["pwseal", "decrypt", "x", "--algorithm", "des"]).is_err());
    }

    #[test]
    fn test_strip_trailing_newline() {
        assert_eq!(strip_trailing_newline("abc\n".into()), "abc");
        assert_eq!(strip_trailing_newline("abc\r\n".into()), "abc");
        assert_eq!(strip_trailing_newline("abc\n\n".into()), "abc\n");
        assert_eq!(strip_trailing_newline("abc".into()), "abc");
    }

    #[test]
    fn test_flags_override_config() {
        let config = PwsealConfig::parse("[cipher]\nalgorithm = \"ChaCha20-Poly1305\"\n").unwrap();
        let args = CipherArgs {
            algorithm: Some(Algorithm::Aes256Gcm),
            encoding: None,
            password: Some("pw".into()),
        };
        let resolved = resolve_cipher(&config, args).unwrap();
        assert_eq!(resolved.algorithm, Algorithm::Aes256Gcm);
        assert_eq!(resolved.encoding, TextEncoding::Base64);
    }

    #[test]
    fn test_parse_log_format() {
        assert!(matches!(parse_log_format("JSON").unwrap(), LogFormat::Json));
        assert!(matches!(parse_log_format("text").unwrap(), LogFormat::Text));
        assert!(parse_log_format("xml").is_err());
    }

    #[test]
    fn test_fallback_sealer_roundtrip() {
        let sealer = sealer_for(BackendChoice::Fallback);
        let pw = SecretString::from("pw");
        let env = sealer.encrypt_aes("cli", &pw).unwrap();
        assert_eq!(sealer.decrypt_aes(&env, &pw).unwrap(), "cli");
    }
}
