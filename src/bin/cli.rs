//! TagKV CLI
//!
//! Command-line interface for inspecting and loading a TagKV store file.

use std::path::PathBuf;

use clap::{Parser, Subcommand, ValueEnum};
use tagkv::{Config, Database, RedbBackend, Result, TagKvError, Value, ValueType};
use tracing_subscriber::{fmt, EnvFilter};

/// TagKV CLI
#[derive(Parser, Debug)]
#[command(name = "tagkv-cli")]
#[command(about = "CLI for TagKV typed key-value store")]
#[command(version)]
struct Args {
    /// Store file
    #[arg(short, long, default_value = "data.db")]
    db: PathBuf,

    /// Namespace prefix applied to every key
    #[arg(short, long)]
    prefix: Option<String>,

    /// Flush after every write
    #[arg(long)]
    autosync: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Get a value by key
    Get {
        /// The key to get
        key: String,

        /// Require the stored value to have this type
        #[arg(short = 't', long = "type")]
        expected: Option<TypeArg>,
    },

    /// Set a key to a JSON value (bare words are stored as strings)
    Set {
        /// The key to set
        key: String,

        /// The value to set
        value: String,

        /// Fail if the key already exists
        #[arg(long, conflicts_with = "update")]
        create: bool,

        /// Fail if the key does not exist
        #[arg(long)]
        update: bool,
    },

    /// Delete a key
    Del {
        /// The key to delete
        key: String,
    },

    /// List keys in the namespace
    Keys,

    /// Import a JSON object of key -> value, in file order
    Import {
        /// JSON file
        file: PathBuf,

        /// Leave existing keys untouched
        #[arg(long)]
        no_overwrite: bool,
    },

    /// Ingest a JSON array of objects keyed by one of their fields
    Ingest {
        /// JSON file
        file: PathBuf,

        /// Field whose value becomes the key
        #[arg(short, long)]
        key_field: String,

        /// Leave existing keys untouched
        #[arg(long)]
        no_overwrite: bool,
    },
}

#[derive(Clone, Copy, Debug, ValueEnum)]
enum TypeArg {
    Int,
    Float,
    Str,
    Dict,
    List,
    Tuple,
}

impl From<TypeArg> for ValueType {
    fn from(t: TypeArg) -> Self {
        match t {
            TypeArg::Int => ValueType::Int,
            TypeArg::Float => ValueType::Float,
            TypeArg::Str => ValueType::Str,
            TypeArg::Dict => ValueType::Dict,
            TypeArg::List => ValueType::List,
            TypeArg::Tuple => ValueType::Tuple,
        }
    }
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("warn,tagkv=info"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_writer(std::io::stderr)
        .init();

    let args = Args::parse();

    let mut builder = Config::builder().path(&args.db).autosync(args.autosync);
    if let Some(prefix) = &args.prefix {
        builder = builder.default_prefix(prefix);
    }
    let config = builder.build();

    tracing::debug!("TagKV CLI v{}", tagkv::VERSION);

    if let Err(e) = Database::scoped(config, |db| run(db, args.command)) {
        tracing::error!("{}", e);
        std::process::exit(1);
    }
}

/// Execute one subcommand against an open database
fn run(db: &mut Database<RedbBackend>, command: Commands) -> Result<()> {
    match command {
        Commands::Get { key, expected } => {
            let value = db.get_with(&key, None, None, expected.map(ValueType::from))?;
            println!("{}", render(&value));
        }
        Commands::Set {
            key,
            value,
            create,
            update,
        } => {
            let value = parse_value(&value);
            if create {
                db.create(&key, value, None)?;
            } else if update {
                db.update(&key, value, None)?;
            } else {
                db.set(&key, value, None)?;
            }
        }
        Commands::Del { key } => {
            println!("{}", db.delete(&key, None)?);
        }
        Commands::Keys => {
            for key in db.keys(None)? {
                println!("{}", key?);
            }
        }
        Commands::Import { file, no_overwrite } => {
            let json = serde_json::from_slice::<serde_json::Value>(&std::fs::read(&file)?)?;
            let serde_json::Value::Object(entries) = json else {
                return Err(TagKvError::Decode(format!(
                    "{}: expected a JSON object",
                    file.display()
                )));
            };
            let stats = db.import_mapping(
                entries.into_iter().map(|(k, v)| (k, Value::from(v))),
                None,
                !no_overwrite,
            )?;
            println!("{}", serde_json::to_string(&stats)?);
        }
        Commands::Ingest {
            file,
            key_field,
            no_overwrite,
        } => {
            let stats = db.ingest_json_file(&file, &key_field, None, !no_overwrite)?;
            println!("{}", serde_json::to_string(&stats)?);
        }
    }
    Ok(())
}

/// Parse a command-line value as JSON, falling back to a plain string
fn parse_value(raw: &str) -> Value {
    match serde_json::from_str::<serde_json::Value>(raw) {
        Ok(json) => Value::from(json),
        Err(_) => Value::Str(raw.to_string()),
    }
}

fn render(value: &Value) -> String {
    match value.to_json() {
        Ok(json) => json.to_string(),
        Err(_) => format!("{:?}", value),
    }
}
