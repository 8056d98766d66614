//! The `wolochaind` command tree

use anyhow::{anyhow, bail, Result};
use clap::{Args, Command, CommandFactory, FromArgMatches, Parser, Subcommand};
use colored::Colorize;
use dialoguer::{Confirm, Password};
use std::collections::BTreeMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::debug;
use wolochain_core::{default_chain_id, flags, Coin, Coins};
use wolochain_crypto::KeyPair;
use wolochain_node::{AppCreator, GenesisDoc, ModuleRegistry};

use crate::client::ApiClient;
use crate::config::ClientConfig;
use crate::debug;
use crate::genesis;
use crate::keyring::{Keyring, BACKEND_TEST};
use crate::logging::init_logging;
use crate::server::{self, ExportArgs, StartArgs};
use crate::txs;

pub const DEFAULT_NODE: &str = "http://127.0.0.1:1317";

/// Default node home: `$HOME/.wolochain`
pub fn default_home() -> PathBuf {
    dirs::home_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(format!(".{}", wolochain_core::APP_NAME))
}

#[derive(Parser, Debug)]
#[command(name = "wolochaind")]
#[command(about = "Wolochain node daemon and client")]
#[command(version)]
pub struct Cli {
    /// Directory for config and data
    #[arg(long, global = true, default_value_os_t = default_home())]
    pub home: PathBuf,

    /// The logging level (trace|debug|info|warn|error)
    #[arg(long = "log_level", global = true, default_value = "info")]
    pub log_level: String,

    /// The logging format (plain|json)
    #[arg(long = "log_format", global = true, default_value = "plain")]
    pub log_format: String,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Initialize private validator, node configuration and genesis files
    Init {
        /// Node moniker
        moniker: String,

        /// Genesis file chain-id
        #[arg(long)]
        chain_id: Option<String>,

        /// Overwrite the genesis.json file
        #[arg(short, long)]
        overwrite: bool,

        /// Bond and gas-price denomination
        #[arg(long)]
        default_denom: Option<String>,
    },

    /// Add a genesis account to genesis.json
    AddGenesisAccount {
        /// Account address or key name
        address_or_key: String,

        /// Initial coins, e.g. 1000stake,10token
        coins: String,

        /// Select keyring's backend (test|memory)
        #[arg(long)]
        keyring_backend: Option<String>,
    },

    /// Generate a genesis tx carrying a self delegation
    Gentx {
        /// Name of the validator key
        key_name: String,

        /// Self-delegation amount, e.g. 1000000stake
        amount: String,

        /// The network chain ID
        #[arg(long)]
        chain_id: Option<String>,

        /// The validator's name; defaults to the node moniker
        #[arg(long)]
        moniker: Option<String>,

        /// Select keyring's backend (test|memory)
        #[arg(long)]
        keyring_backend: Option<String>,

        /// Write the genesis transaction JSON document to the given file
        #[arg(long)]
        output_document: Option<PathBuf>,
    },

    /// Collect genesis txs and output a genesis.json file
    CollectGentxs {
        /// Override default "gentx" directory from which collect and execute genesis transactions
        #[arg(long)]
        gentx_dir: Option<PathBuf>,
    },

    /// Validate the genesis file at the default location or at the location passed as an arg
    ValidateGenesis {
        file: Option<PathBuf>,
    },

    /// Migrate genesis to a specified target version
    Migrate {
        /// Target version (v1)
        target_version: String,

        genesis_file: PathBuf,

        /// Override chain_id with this flag
        #[arg(long)]
        chain_id: Option<String>,

        /// Override genesis_time with this flag
        #[arg(long)]
        genesis_time: Option<String>,
    },

    /// Manage your application's keys
    Keys {
        /// Select keyring's backend (test|memory)
        #[arg(long)]
        keyring_backend: Option<String>,

        #[command(subcommand)]
        action: KeysAction,
    },

    /// Run the full node
    Start(StartArgs),

    /// Export state to JSON
    Export(ExportArgs),

    /// Query remote node for status
    Status {
        /// Node to connect to
        #[arg(long)]
        node: Option<String>,
    },

    /// Querying subcommands
    #[command(alias = "q")]
    Query(QueryArgs),

    /// Transactions subcommands
    Tx(TxArgs),

    /// Create or query an application CLI configuration file
    Config {
        /// chain-id, keyring-backend or node; all settings when omitted
        key: Option<String>,

        /// New value for `key`
        value: Option<String>,
    },

    /// Tool for helping with debugging your application
    Debug {
        #[command(subcommand)]
        action: DebugAction,
    },

    /// Output shell completion code for the specified shell
    Completion {
        shell: clap_complete::Shell,
    },
}

#[derive(Subcommand, Debug)]
pub enum DebugAction {
    /// Convert an address between hex and base64
    Addr { address: String },

    /// Decode a public key from hex or base64 and show its address
    Pubkey { pubkey: String },

    /// Convert raw bytes output (eg. [10 21 13 255]) to hex
    RawBytes { raw_bytes: String },
}

#[derive(Subcommand, Debug)]
pub enum KeysAction {
    /// Add a new key, or import one with --recover
    Add {
        name: String,

        /// Provide the secret key (hex) to recover an existing key
        #[arg(long)]
        recover: bool,
    },

    /// List all keys
    List,

    /// Retrieve key information by name
    Show { name: String },

    /// Delete the given key
    Delete {
        name: String,

        /// Skip confirmation prompt when deleting keys
        #[arg(short, long)]
        yes: bool,
    },
}

#[derive(Args, Debug)]
pub struct QueryArgs {
    /// The network chain ID
    #[arg(long, global = true)]
    pub chain_id: Option<String>,

    /// Node to connect to
    #[arg(long, global = true)]
    pub node: Option<String>,

    /// Use a specific height to query state at
    #[arg(long)]
    pub height: Option<u64>,

    #[command(subcommand)]
    pub target: QueryTarget,
}

#[derive(Subcommand, Debug)]
pub enum QueryTarget {
    /// Get verified data for the block at the given height, or the latest block
    Block { height: Option<u64> },

    /// Get the full validator set at the latest height
    ValidatorSet,

    /// <module> <command> [args...]
    #[command(external_subcommand)]
    Module(Vec<String>),
}

#[derive(Args, Debug)]
pub struct TxArgs {
    /// The network chain ID
    #[arg(long, global = true)]
    pub chain_id: Option<String>,

    /// Node to connect to
    #[arg(long, global = true)]
    pub node: Option<String>,

    #[command(subcommand)]
    pub action: TxAction,
}

#[derive(Subcommand, Debug)]
pub enum TxAction {
    /// Sign a transaction generated offline
    Sign {
        file: PathBuf,

        /// Name of the signing key
        #[arg(long)]
        from: String,

        /// Select keyring's backend (test|memory)
        #[arg(long)]
        keyring_backend: Option<String>,

        /// The document is written to the given file instead of STDOUT
        #[arg(long)]
        output_document: Option<PathBuf>,
    },

    /// Broadcast transactions generated offline
    Broadcast { file: PathBuf },

    /// Encode transactions generated offline
    Encode { file: PathBuf },

    /// Decode a binary encoded transaction string
    Decode { tx_bytes: String },
}

/// Set new defaults for the flags named in `defaults` on `cmd` and every
/// command below it. Commands form a tree, so the walk visits each once.
pub fn overwrite_flag_defaults(mut cmd: Command, defaults: &BTreeMap<&str, String>) -> Command {
    let targets: Vec<(String, String)> = cmd
        .get_arguments()
        .filter_map(|arg| {
            let value = defaults.get(arg.get_long()?)?;
            Some((arg.get_id().to_string(), value.clone()))
        })
        .collect();
    for (id, value) in targets {
        cmd = cmd.mut_arg(id, |arg| arg.default_value(value));
    }

    let names: Vec<String> = cmd
        .get_subcommands()
        .map(|sub| sub.get_name().to_string())
        .collect();
    for name in names {
        cmd = cmd.mut_subcommand(name, |sub| overwrite_flag_defaults(sub, defaults));
    }
    cmd
}

fn query_help(registry: &ModuleRegistry) -> String {
    let mut help = String::from("Module queries:\n");
    for (module, commands) in registry.query_commands() {
        for command in commands {
            let args: Vec<String> = command.args.iter().map(|a| format!("<{a}>")).collect();
            help.push_str(&format!(
                "  {module} {} {}\n      {}\n",
                command.name,
                args.join(" "),
                command.about
            ));
        }
    }
    help
}

/// The fully assembled command tree, with the chain-id and keyring-backend
/// defaults applied everywhere those flags appear.
pub fn build_command(registry: &ModuleRegistry) -> Command {
    build_command_with(registry, &ClientConfig::default())
}

/// [`build_command`] with the settings of `client.toml` layered over the
/// application defaults
pub fn build_command_with(registry: &ModuleRegistry, client: &ClientConfig) -> Command {
    let cmd = Cli::command().mut_subcommand("query", |query| query.after_help(query_help(registry)));

    let mut defaults = BTreeMap::from([
        (flags::CHAIN_ID, default_chain_id()),
        (flags::KEYRING_BACKEND, BACKEND_TEST.to_string()),
    ]);
    defaults.extend(client.flag_defaults());
    overwrite_flag_defaults(cmd, &defaults)
}

/// `--home` as given in `args`, before the full command line is parsed
fn home_from_args(args: &[OsString]) -> PathBuf {
    let mut iter = args.iter().skip(1);
    while let Some(arg) = iter.next() {
        let arg = arg.to_string_lossy();
        if arg == "--home" {
            if let Some(value) = iter.next() {
                return PathBuf::from(value);
            }
        } else if let Some(value) = arg.strip_prefix("--home=") {
            return PathBuf::from(value);
        }
    }
    default_home()
}

fn required<T>(value: Option<T>, flag: &str) -> Result<T> {
    value.ok_or_else(|| anyhow!("--{flag} is required"))
}

fn print_json<T: serde::Serialize>(value: &T) -> Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

fn write_document<T: serde::Serialize>(value: &T, output: Option<&PathBuf>) -> Result<()> {
    match output {
        Some(path) => {
            std::fs::write(path, serde_json::to_string_pretty(value)?)?;
            Ok(())
        }
        None => print_json(value),
    }
}

/// Resolve `<module> <command> [args...]` against the commands modules contribute
fn module_query_path(registry: &ModuleRegistry, args: &[String]) -> Result<(String, Vec<String>)> {
    let (module, rest) = args
        .split_first()
        .ok_or_else(|| anyhow!("no module given"))?;
    let commands = registry
        .query_commands()
        .into_iter()
        .find(|(name, _)| *name == module.as_str())
        .map(|(_, commands)| commands)
        .ok_or_else(|| anyhow!("unknown query target {module}"))?;

    let (name, values) = rest
        .split_first()
        .ok_or_else(|| anyhow!("no {module} query given"))?;
    let command = commands
        .iter()
        .find(|c| c.name == name.as_str())
        .ok_or_else(|| anyhow!("unknown {module} query {name}"))?;
    if values.len() != command.args.len() {
        bail!(
            "{module} {name} expects {} argument(s): {}",
            command.args.len(),
            command.args.join(" ")
        );
    }

    let mut path = vec![name.clone()];
    path.extend(values.iter().cloned());
    Ok((module.clone(), path))
}

/// Parse `args` and run the selected command
pub async fn run_from<I, T>(args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    let args: Vec<OsString> = args.into_iter().map(Into::into).collect();
    let registry = Arc::new(ModuleRegistry::standard());
    let client = ClientConfig::load(&home_from_args(&args))?;
    let matches = build_command_with(&registry, &client).try_get_matches_from(&args)?;
    let cli = Cli::from_arg_matches(&matches)?;
    init_logging(&cli.log_level, &cli.log_format)?;
    debug!("Home directory {}", cli.home.display());

    let home = cli.home;
    let creator = AppCreator::new(registry.clone());

    match cli.command {
        Commands::Init {
            moniker,
            chain_id,
            overwrite,
            default_denom,
        } => {
            let chain_id = required(chain_id, flags::CHAIN_ID)?;
            let doc = genesis::init(&home, &registry, &moniker, &chain_id, overwrite, default_denom.as_deref())?;
            print_json(&serde_json::json!({
                "moniker": moniker,
                "chain_id": doc.chain_id,
                "app_message": doc.app_state,
            }))?;
        }

        Commands::AddGenesisAccount {
            address_or_key,
            coins,
            keyring_backend,
        } => {
            let keyring = Keyring::open(&required(keyring_backend, flags::KEYRING_BACKEND)?, &home)?;
            let address = keyring.resolve_address(&address_or_key)?;
            let coins: Coins = coins.parse()?;
            genesis::add_genesis_account(&home, address, &coins)?;
            println!("Added genesis account {} with {}", address, coins);
        }

        Commands::Gentx {
            key_name,
            amount,
            chain_id,
            moniker,
            keyring_backend,
            output_document,
        } => {
            let keyring = Keyring::open(&required(keyring_backend, flags::KEYRING_BACKEND)?, &home)?;
            let keypair = keyring.get(&key_name)?;
            let moniker = match moniker {
                Some(moniker) => moniker,
                None => wolochain_core::NodeConfig::load(&genesis::config_dir(&home).join("config.toml"))?.moniker,
            };
            let amount: Coin = amount.parse()?;
            let path = genesis::gentx(
                &home,
                &keypair,
                &required(chain_id, flags::CHAIN_ID)?,
                &moniker,
                amount,
                output_document.as_deref(),
            )?;
            println!("Genesis transaction written to {:?}", path);
        }

        Commands::CollectGentxs { gentx_dir } => {
            let doc = genesis::collect_gentxs(&home, &registry, gentx_dir.as_deref())?;
            print_json(&serde_json::json!({
                "chain_id": doc.chain_id,
                "gentxs_dir": gentx_dir.unwrap_or_else(|| genesis::gentx_dir(&home)),
                "app_message": doc.app_state,
            }))?;
        }

        Commands::ValidateGenesis { file } => {
            let path = file.unwrap_or_else(|| GenesisDoc::path_in_home(&home));
            genesis::validate_genesis(&path, &registry)?;
            println!("File at {} is a valid genesis file", path.display());
        }

        Commands::Migrate {
            target_version,
            genesis_file,
            chain_id,
            genesis_time,
        } => {
            let doc = genesis::migrate(
                &target_version,
                &genesis_file,
                &registry,
                chain_id.as_deref(),
                genesis_time.as_deref(),
            )?;
            print_json(&doc)?;
        }

        Commands::Keys {
            keyring_backend,
            action,
        } => {
            let mut keyring = Keyring::open(&required(keyring_backend, flags::KEYRING_BACKEND)?, &home)?;
            run_keys(&mut keyring, action)?;
        }

        Commands::Start(args) => server::start(&creator, &home, &args).await?,

        Commands::Export(args) => {
            let doc = server::export(&creator, &home, &args)?;
            write_document(&doc, args.output_document.as_ref())?;
        }

        Commands::Status { node } => {
            let client = ApiClient::new(node.as_deref().unwrap_or(DEFAULT_NODE))?;
            print_json(&client.status().await?)?;
        }

        Commands::Query(args) => {
            let client = ApiClient::new(args.node.as_deref().unwrap_or(DEFAULT_NODE))?;
            let result = match args.target {
                QueryTarget::Block { height } => client.block(height).await?,
                QueryTarget::ValidatorSet => client.validator_set().await?,
                QueryTarget::Module(query) => {
                    let (module, path) = module_query_path(&registry, &query)?;
                    client.query(&module, &path, args.height).await?
                }
            };
            print_json(&result)?;
        }

        Commands::Tx(args) => run_tx(args, &home).await?,

        Commands::Config { key, value } => run_config(&home, key, value)?,

        Commands::Debug { action } => match action {
            DebugAction::Addr { address } => print_json(&debug::addr(&address)?)?,
            DebugAction::Pubkey { pubkey } => print_json(&debug::pubkey(&pubkey)?)?,
            DebugAction::RawBytes { raw_bytes } => println!("{}", debug::raw_bytes(&raw_bytes)?),
        },

        Commands::Completion { shell } => {
            let mut cmd = build_command_with(&registry, &client);
            clap_complete::generate(shell, &mut cmd, "wolochaind", &mut std::io::stdout());
        }
    }

    Ok(())
}

fn run_keys(keyring: &mut Keyring, action: KeysAction) -> Result<()> {
    match action {
        KeysAction::Add { name, recover } => {
            if recover {
                let secret = Password::new()
                    .with_prompt("Enter your secret key (hex)")
                    .interact()?;
                let info = keyring.import(&name, KeyPair::from_secret_hex(&secret)?)?;
                print_json(&info)?;
            } else {
                let (info, keypair) = keyring.add(&name)?;
                print_json(&info)?;
                println!();
                println!(
                    "{}",
                    "**Important** write this secret key in a safe place. It is the only way to recover your account."
                        .yellow()
                );
                println!();
                println!("{}", keypair.secret_bytes().to_hex());
            }
        }

        KeysAction::List => {
            let keys = keyring.list()?;
            if keys.is_empty() {
                println!("No keys found in the {} keyring.", keyring.backend());
            } else {
                print_json(&keys)?;
            }
        }

        KeysAction::Show { name } => print_json(&keyring.show(&name)?)?,

        KeysAction::Delete { name, yes } => {
            keyring.show(&name)?;
            if !yes {
                let confirmed = Confirm::new()
                    .with_prompt(format!("Key {name} will be deleted. Continue?"))
                    .default(false)
                    .interact()?;
                if !confirmed {
                    println!("Aborted.");
                    return Ok(());
                }
            }
            keyring.delete(&name)?;
            println!("Key deleted forever (uh oh!)");
        }
    }
    Ok(())
}

fn run_config(home: &Path, key: Option<String>, value: Option<String>) -> Result<()> {
    let mut config = ClientConfig::load(home)?;
    match (key, value) {
        (None, _) => print_json(&config)?,
        (Some(key), None) => println!("{}", config.get(&key)?),
        (Some(key), Some(value)) => {
            config.set(&key, value)?;
            config.save(home)?;
        }
    }
    Ok(())
}

async fn run_tx(args: TxArgs, home: &Path) -> Result<()> {
    match args.action {
        TxAction::Sign {
            file,
            from,
            keyring_backend,
            output_document,
        } => {
            let keyring = Keyring::open(&required(keyring_backend, flags::KEYRING_BACKEND)?, home)?;
            let keypair = keyring.get(&from)?;
            let tx = txs::sign_file(&file, &keypair, &required(args.chain_id, flags::CHAIN_ID)?)?;
            write_document(&tx, output_document.as_ref())?;
        }

        TxAction::Broadcast { file } => {
            let client = ApiClient::new(args.node.as_deref().unwrap_or(DEFAULT_NODE))?;
            let response = client.broadcast(&txs::encode_file(&file)?).await?;
            print_json(&response)?;
            if response.code != wolochain_node::codes::OK {
                bail!("transaction rejected with code {}: {}", response.code, response.raw_log);
            }
        }

        TxAction::Encode { file } => println!("{}", txs::encode_file(&file)?),

        TxAction::Decode { tx_bytes } => print_json(&txs::decode(&tx_bytes)?)?,
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn command() -> Command {
        build_command(&ModuleRegistry::standard())
    }

    fn default_of(cmd: &Command, path: &[&str], long: &str) -> Option<String> {
        let mut current = cmd;
        for name in path {
            current = current.find_subcommand(name)?;
        }
        current
            .get_arguments()
            .find(|a| a.get_long() == Some(long))
            .and_then(|a| a.get_default_values().first())
            .map(|v| v.to_string_lossy().to_string())
    }

    #[test]
    fn test_defaults_reach_nested_commands() {
        let cmd = command();
        assert_eq!(default_of(&cmd, &["init"], "chain-id").as_deref(), Some("wolochain"));
        assert_eq!(default_of(&cmd, &["query"], "chain-id").as_deref(), Some("wolochain"));
        assert_eq!(default_of(&cmd, &["keys"], "keyring-backend").as_deref(), Some("test"));
        assert_eq!(default_of(&cmd, &["tx", "sign"], "keyring-backend").as_deref(), Some("test"));
        assert_eq!(default_of(&cmd, &["gentx"], "chain-id").as_deref(), Some("wolochain"));
        assert!(default_of(&cmd, &["start"], "chain-id").is_none());
        cmd.debug_assert();
    }

    #[test]
    fn test_defaults_can_be_overridden() {
        let matches = command()
            .try_get_matches_from(["wolochaind", "init", "node0", "--chain-id", "custom-1"])
            .unwrap();
        let cli = Cli::from_arg_matches(&matches).unwrap();
        match cli.command {
            Commands::Init { chain_id, .. } => assert_eq!(chain_id.as_deref(), Some("custom-1")),
            other => panic!("unexpected command {other:?}"),
        }

        let matches = command()
            .try_get_matches_from(["wolochaind", "keys", "list"])
            .unwrap();
        match Cli::from_arg_matches(&matches).unwrap().command {
            Commands::Keys { keyring_backend, .. } => assert_eq!(keyring_backend.as_deref(), Some("test")),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_client_config_sets_flag_defaults() {
        let mut client = ClientConfig::default();
        client.set("chain-id", "testnet-9").unwrap();
        client.set("node", "http://10.0.0.2:1317").unwrap();
        let cmd = build_command_with(&ModuleRegistry::standard(), &client);
        assert_eq!(default_of(&cmd, &["gentx"], "chain-id").as_deref(), Some("testnet-9"));
        assert_eq!(default_of(&cmd, &["tx", "sign"], "chain-id").as_deref(), Some("testnet-9"));
        assert_eq!(default_of(&cmd, &["status"], "node").as_deref(), Some("http://10.0.0.2:1317"));
        assert_eq!(default_of(&cmd, &["keys"], "keyring-backend").as_deref(), Some("test"));

        let matches = cmd
            .try_get_matches_from(["wolochaind", "init", "node0", "--chain-id", "flag-wins"])
            .unwrap();
        match Cli::from_arg_matches(&matches).unwrap().command {
            Commands::Init { chain_id, .. } => assert_eq!(chain_id.as_deref(), Some("flag-wins")),
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_home_from_args() {
        let args = |v: &[&str]| v.iter().map(OsString::from).collect::<Vec<_>>();
        assert_eq!(home_from_args(&args(&["wolochaind", "--home", "/tmp/a", "keys", "list"])), PathBuf::from("/tmp/a"));
        assert_eq!(home_from_args(&args(&["wolochaind", "keys", "list", "--home=/tmp/b"])), PathBuf::from("/tmp/b"));
        assert_eq!(home_from_args(&args(&["wolochaind", "status"])), default_home());
    }

    #[test]
    fn test_debug_and_completion_commands() {
        let matches = command()
            .try_get_matches_from(["wolochaind", "debug", "raw-bytes", "[1 2]"])
            .unwrap();
        assert!(matches!(
            Cli::from_arg_matches(&matches).unwrap().command,
            Commands::Debug { action: DebugAction::RawBytes { .. } }
        ));

        let matches = command()
            .try_get_matches_from(["wolochaind", "completion", "bash"])
            .unwrap();
        assert!(matches!(
            Cli::from_arg_matches(&matches).unwrap().command,
            Commands::Completion { shell: clap_complete::Shell::Bash }
        ));
        assert!(command()
            .try_get_matches_from(["wolochaind", "completion", "cmd.exe"])
            .is_err());
    }

    #[tokio::test]
    async fn test_config_command_writes_client_toml() {
        let tmp = tempfile::TempDir::new().unwrap();
        let home = tmp.path().to_string_lossy().to_string();
        run_from(["wolochaind", "--home", &home, "config", "chain-id", "from-file"])
            .await
            .unwrap();
        assert_eq!(ClientConfig::load(tmp.path()).unwrap().chain_id, "from-file");
        assert!(run_from(["wolochaind", "--home", &home, "config", "colour", "red"]).await.is_err());
    }

    #[test]
    fn test_export_flags() {
        let matches = command()
            .try_get_matches_from([
                "wolochaind",
                "export",
                "--height",
                "-1",
                "--modules-to-export",
                "bank,staking",
            ])
            .unwrap();
        match Cli::from_arg_matches(&matches).unwrap().command {
            Commands::Export(args) => {
                assert_eq!(args.height, -1);
                assert_eq!(args.modules_to_export, vec!["bank", "staking"]);
                assert!(!args.for_zero_height);
            }
            other => panic!("unexpected command {other:?}"),
        }
    }

    #[test]
    fn test_module_query_paths() {
        let registry = ModuleRegistry::standard();
        let args = |v: &[&str]| v.iter().map(|s| s.to_string()).collect::<Vec<_>>();

        let (module, path) = module_query_path(&registry, &args(&["bank", "balances", "ab"])).unwrap();
        assert_eq!(module, "bank");
        assert_eq!(path, vec!["balances", "ab"]);

        assert!(module_query_path(&registry, &args(&["bank", "balances"])).is_err());
        assert!(module_query_path(&registry, &args(&["mint", "params"])).is_err());
        assert!(module_query_path(&registry, &args(&["staking", "delegations"])).is_err());
    }
}
