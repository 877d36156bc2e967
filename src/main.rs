//! DKES command line interface

use std::fs;
use std::io::{self, Read};
use std::path::PathBuf;

use anyhow::{anyhow, Context, Result};
use clap::{Parser, Subcommand, ValueEnum};
use serde_json::json;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};
use zeroize::Zeroizing;

use dkes::config::DkesConfig;
use dkes::crypto::envelope::Envelope;
use dkes::facade::{self, DeriveRequest};
use dkes::multisig::{MultisigArtifact, MultisigConfig, MultisigKind};
use dkes::types::{Coin, Network, WordCount};
use dkes::wallet::derivation::{derive_evm_accounts, DerivedKeypair};
use dkes::wallet::os_rng;

/// DKES - deterministic keys, encrypted envelopes and multisig addresses
#[derive(Parser)]
#[command(name = "dkes")]
#[command(about = "Mnemonics, HD keys, BIP-85, password envelopes and multisig addresses")]
#[command(version)]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Print machine-readable JSON
    #[arg(long, global = true)]
    json: bool,

    /// Path to a JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,
}

#[derive(Subcommand)]
enum Commands {
    /// Generate a new BIP-39 mnemonic
    Generate {
        /// 12, 15, 18, 21 or 24
        #[arg(long, default_value_t = 12)]
        words: u32,
    },

    /// Validate and score a mnemonic (reads DKES_MNEMONIC or stdin if omitted)
    Validate {
        #[arg(long)]
        mnemonic: Option<String>,
    },

    /// Print the 64-byte BIP-39 seed
    Seed {
        #[arg(long)]
        mnemonic: Option<String>,
        #[arg(long)]
        passphrase: Option<String>,
    },

    /// Derive addresses for a chain
    Derive {
        #[arg(value_enum)]
        chain: Chain,
        #[arg(long)]
        mnemonic: Option<String>,
        #[arg(long)]
        passphrase: Option<String>,
        /// EVM account level
        #[arg(long, default_value_t = 0)]
        account: u32,
        /// First address index (Solana: account index)
        #[arg(long, default_value_t = 0)]
        index: u32,
        /// Number of consecutive indices
        #[arg(long, default_value_t = 1)]
        count: u32,
        /// Bitcoin native SegWit (BIP-84) instead of legacy P2PKH
        #[arg(long)]
        segwit: bool,
        #[arg(long)]
        testnet: bool,
        /// Also print private keys
        #[arg(long)]
        show_secret: bool,
    },

    /// Derive a BIP-85 child mnemonic
    Bip85 {
        #[arg(long)]
        mnemonic: Option<String>,
        #[arg(long, default_value_t = 0)]
        index: u32,
        /// 12, 18 or 24
        #[arg(long, default_value_t = 12)]
        words: u32,
        #[arg(long, default_value_t = 0)]
        lang: u32,
    },

    /// Encrypt a secret into a v2.0 envelope (reads stdin if --input is omitted)
    Encrypt {
        /// Falls back to DKES_PASSWORD
        #[arg(long)]
        password: Option<String>,
        #[arg(long)]
        input: Option<String>,
    },

    /// Decrypt a v2.0 envelope (reads stdin if --envelope is omitted)
    Decrypt {
        /// Falls back to DKES_PASSWORD
        #[arg(long)]
        password: Option<String>,
        /// Path to the envelope JSON
        #[arg(long)]
        envelope: Option<PathBuf>,
    },

    /// Build a multisig address
    Multisig {
        #[arg(value_enum)]
        kind: MultisigChoice,
        /// Required signatures; a simple majority of members if omitted
        #[arg(long)]
        threshold: Option<u32>,
        /// Compressed public key (Bitcoin) or owner address (Safe); repeat per member
        #[arg(long = "member", required = true)]
        members: Vec<String>,
        /// Safe salt nonce; random if omitted
        #[arg(long)]
        salt_nonce: Option<u32>,
        /// Safe factory; defaults to the configured one
        #[arg(long)]
        factory: Option<String>,
        #[arg(long)]
        testnet: bool,
    },

    /// Check an address for a chain
    CheckAddress {
        #[arg(value_enum)]
        chain: Chain,
        address: String,
        #[arg(long)]
        testnet: bool,
    },

    /// Score a password
    ScorePassword { password: String },
}

#[derive(Clone, Copy, ValueEnum)]
enum Chain {
    Evm,
    Bitcoin,
    Solana,
}

#[derive(Clone, Copy, ValueEnum)]
enum MultisigChoice {
    P2sh,
    P2wsh,
    Safe,
}

impl From<MultisigChoice> for MultisigKind {
    fn from(choice: MultisigChoice) -> Self {
        match choice {
            MultisigChoice::P2sh => MultisigKind::P2sh,
            MultisigChoice::P2wsh => MultisigKind::P2wsh,
            MultisigChoice::Safe => MultisigKind::GnosisSafe,
        }
    }
}

fn main() -> Result<()> {
    // Logs go to stderr so stdout stays parseable
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "dkes=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(io::stderr))
        .init();

    let cli = Cli::parse();
    let mut config = load_config(cli.config.as_ref())?;
    let json = cli.json;

    match cli.command {
        Commands::Generate { words } => {
            let word_count = WordCount::try_from(words)?;
            let mnemonic = facade::generate_mnemonic(word_count, &mut os_rng())?;
            if json {
                print_json(&json!({ "mnemonic": mnemonic.phrase(), "words": word_count }))?;
            } else {
                println!("{}", mnemonic.phrase());
            }
        }

        Commands::Validate { mnemonic } => {
            let phrase = read_mnemonic(mnemonic)?;
            let score = facade::score_mnemonic(&phrase, &config);
            let checked = facade::validate_mnemonic(&phrase);
            if json {
                print_json(&json!({
                    "valid": checked.is_ok(),
                    "error": checked.as_ref().err(),
                    "score": score,
                }))?;
            } else {
                match &checked {
                    Ok(m) => println!("valid ({} words, {} unique)", m.word_count(), score.unique_words),
                    Err(e) => println!("invalid: {}", e.message),
                }
                if let Some(reason) = &score.reason {
                    println!("note: {}", reason);
                }
            }
            if checked.is_err() {
                std::process::exit(1);
            }
        }

        Commands::Seed { mnemonic, passphrase } => {
            let phrase = read_mnemonic(mnemonic)?;
            let seed = facade::seed_from_phrase(&phrase, passphrase.as_deref())?;
            let seed_hex = seed.to_hex();
            if json {
                print_json(&json!({ "seed": seed_hex.as_str() }))?;
            } else {
                println!("{}", seed_hex.as_str());
            }
        }

        Commands::Derive { chain, mnemonic, passphrase, account, index, count, segwit, testnet, show_secret } => {
            let phrase = read_mnemonic(mnemonic)?;
            let seed = facade::seed_from_phrase(&phrase, passphrase.as_deref())?;
            let network = if testnet { Network::Testnet } else { Network::Mainnet };
            let end = index
                .checked_add(count)
                .ok_or_else(|| anyhow!("index range overflows"))?;

            let keypairs = match chain {
                Chain::Evm => derive_evm_accounts(seed.as_bytes(), account, index..end)?,
                Chain::Bitcoin | Chain::Solana => {
                    let coin = match chain {
                        Chain::Solana => Coin::Solana,
                        _ if segwit => Coin::BitcoinP2wpkh,
                        _ => Coin::BitcoinP2pkh,
                    };
                    (index..end)
                        .map(|i| facade::derive_keypair(&seed, &DeriveRequest::new(coin, i).on(network)))
                        .collect::<Result<Vec<_>, _>>()?
                }
            };

            print_keypairs(&keypairs, show_secret, json)?;
        }

        Commands::Bip85 { mnemonic, index, words, lang } => {
            let master = facade::validate_mnemonic(&read_mnemonic(mnemonic)?)?;
            let child = facade::derive_child_mnemonic(&master, index, WordCount::try_from(words)?, lang)?;
            if json {
                print_json(&json!({ "mnemonic": child.mnemonic.phrase(), "record": child.record }))?;
            } else {
                println!("{}", child.mnemonic.phrase());
                println!("path: {}", child.record.path);
            }
        }

        Commands::Encrypt { password, input } => {
            let password = read_password(password)?;
            let plaintext = match input {
                Some(text) => Zeroizing::new(text),
                None => Zeroizing::new(read_stdin()?.trim_end_matches(&['\r', '\n'][..]).to_string()),
            };
            let envelope = facade::encrypt_secret(plaintext.as_bytes(), &password, &config, &mut os_rng())?;
            println!("{}", envelope.to_json_pretty()?);
        }

        Commands::Decrypt { password, envelope } => {
            let password = read_password(password)?;
            let raw = match envelope {
                Some(path) => fs::read_to_string(&path)
                    .with_context(|| format!("reading {}", path.display()))?,
                None => read_stdin()?,
            };
            let envelope = Envelope::from_json(&raw)?;
            let plaintext = facade::decrypt_secret(&envelope, &password, &config)?;
            let rendered = match std::str::from_utf8(plaintext.expose()) {
                Ok(text) => Zeroizing::new(text.to_string()),
                Err(_) => Zeroizing::new(hex::encode(plaintext.expose())),
            };
            if json {
                print_json(&json!({ "plaintext": rendered.as_str() }))?;
            } else {
                println!("{}", rendered.as_str());
            }
        }

        Commands::Multisig { kind, threshold, members, salt_nonce, factory, testnet } => {
            if testnet {
                config.multisig.network = Network::Testnet;
            }
            if let Some(factory) = factory {
                config.multisig.safe_factory = factory;
            }
            let mut request = match threshold {
                Some(threshold) => MultisigConfig::new(kind.into(), members, threshold),
                None => facade::majority_multisig(kind.into(), members),
            };
            request.salt_nonce = salt_nonce;

            let artifact = facade::build_multisig(&request, &config, &mut os_rng())?;
            print_artifact(&artifact, json)?;
        }

        Commands::CheckAddress { chain, address, testnet } => {
            let network = if testnet { Network::Testnet } else { Network::Mainnet };
            let coin = match chain {
                Chain::Evm => Coin::Evm,
                Chain::Bitcoin => Coin::BitcoinP2wpkh,
                Chain::Solana => Coin::Solana,
            };
            let validation = facade::validate_address(&address, coin, network);
            if json {
                print_json(&validation)?;
            } else {
                match &validation.normalized {
                    Some(normalized) if validation.is_valid => println!("valid: {}", normalized),
                    _ => println!("invalid"),
                }
                for warning in &validation.warnings {
                    println!("- {}", warning);
                }
            }
            if !validation.is_valid {
                std::process::exit(1);
            }
        }

        Commands::ScorePassword { password } => {
            let strength = facade::score_password(&password);
            if json {
                print_json(&strength)?;
            } else {
                println!("{} ({}/100)", strength.label, strength.score);
                for hint in &strength.feedback {
                    println!("- {}", hint);
                }
            }
        }
    }

    Ok(())
}

fn load_config(path: Option<&PathBuf>) -> Result<DkesConfig> {
    let Some(path) = path else {
        return Ok(DkesConfig::default());
    };
    let raw = fs::read_to_string(path).with_context(|| format!("reading {}", path.display()))?;
    let config = DkesConfig::from_json(&raw)?;
    for warning in config.validate()? {
        tracing::warn!(target: "dkes", "{}", warning);
    }
    Ok(config)
}

fn read_stdin() -> Result<String> {
    let mut buffer = String::new();
    io::stdin().read_to_string(&mut buffer)?;
    Ok(buffer)
}

fn read_mnemonic(arg: Option<String>) -> Result<Zeroizing<String>> {
    if let Some(phrase) = arg {
        return Ok(Zeroizing::new(phrase));
    }
    if let Ok(phrase) = std::env::var("DKES_MNEMONIC") {
        return Ok(Zeroizing::new(phrase));
    }
    Ok(Zeroizing::new(read_stdin()?.trim().to_string()))
}

fn read_password(arg: Option<String>) -> Result<Zeroizing<String>> {
    arg.or_else(|| std::env::var("DKES_PASSWORD").ok())
        .map(Zeroizing::new)
        .ok_or_else(|| anyhow!("a password is required (--password or DKES_PASSWORD)"))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn print_keypairs(keypairs: &[DerivedKeypair], show_secret: bool, json: bool) -> Result<()> {
    let mut rows = Vec::with_capacity(keypairs.len());
    for keypair in keypairs {
        let account = &keypair.account;
        let secret = show_secret.then(|| Zeroizing::new(hex::encode(keypair.secret().expose())));

        if json {
            let mut row = json!({
                "coin": account.coin,
                "path": account.path.to_string(),
                "address": account.address_string(),
                "public_key": hex::encode(&account.public_key),
            });
            if let Some(secret) = &secret {
                row["private_key"] = json!(secret.as_str());
            }
            rows.push(row);
        } else {
            println!("{}  {}", account.path, account.address_string());
            if let Some(secret) = &secret {
                println!("    private key: {}", secret.as_str());
            }
        }
    }

    if json {
        print_json(&rows)?;
    }
    Ok(())
}

fn print_artifact(artifact: &MultisigArtifact, json: bool) -> Result<()> {
    if json {
        return print_json(artifact);
    }
    println!("address: {}", artifact.address);
    if let Some(script) = &artifact.script {
        println!("script:  {}", script);
    }
    if let Some(safe) = &artifact.safe {
        println!("salt nonce: {}", safe.salt_nonce);
        println!("init data hash: {}", safe.init_data_hash);
        println!("deployed: {}", safe.deployed);
    }
    for warning in &artifact.warnings {
        println!("{}", warning);
    }
    Ok(())
}
