//! storage-cli - command line access to the configured disks / 命令行访问已配置的磁盘

use std::path::PathBuf;

use anyhow::{anyhow, Context};
use clap::{Parser, Subcommand};
use serde_json::Value;
use tokio::io::AsyncWriteExt;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use custom_storage::config::{get_config_path, load_config, CONFIG_ENV};
use custom_storage::drivers::qiniu::QiniuDriver;
use custom_storage::storage::{Expiration, StorageManager, UrlOptions, WriteOptions};

#[derive(Parser, Debug)]
#[command(name = "storage-cli")]
#[command(version = concat!(env!("CARGO_PKG_VERSION"), " (built ", env!("BUILD_TIME"), ")"))]
#[command(about = "Object storage disks from the command line", long_about = None)]
struct Args {
    /// Config file (defaults to ./config.json)
    #[arg(long, global = true, env = CONFIG_ENV)]
    config: Option<PathBuf>,

    /// Disk name (defaults to the configured default disk)
    #[arg(short, long, global = true)]
    disk: Option<String>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List registered drivers and their config items
    Drivers,
    /// List objects under a prefix
    Ls {
        #[arg(default_value = "")]
        path: String,
        /// Include objects in sub-prefixes
        #[arg(long)]
        deep: bool,
    },
    /// Print an object to stdout
    Cat { path: String },
    /// Upload a local file
    Put {
        path: String,
        file: PathBuf,
        /// Content type; guessed from the extension when omitted
        #[arg(long)]
        mime: Option<String>,
    },
    /// Delete objects
    Rm {
        #[arg(required = true)]
        paths: Vec<String>,
    },
    /// Move an object
    Mv { from: String, to: String },
    /// Copy an object
    Cp { from: String, to: String },
    /// Print object metadata as JSON
    Stat { path: String },
    /// Print the public URL
    Url { path: String },
    /// Print a signed temporary URL
    TempUrl {
        path: String,
        /// Seconds, "+1 hour", "@<unix ts>" or a date-time
        #[arg(long, default_value = "+1 hour")]
        expires: String,
        /// Extra query parameters (key=value)
        #[arg(long = "param", value_parser = parse_param)]
        params: Vec<(String, String)>,
    },
    /// Print a Qiniu upload token
    UploadToken {
        key: Option<String>,
        #[arg(long, default_value = "3600")]
        expires: u64,
    },
    /// Refresh CDN caches of objects (Qiniu)
    Refresh {
        #[arg(required = true)]
        paths: Vec<String>,
    },
}

fn parse_param(s: &str) -> Result<(String, String), String> {
    s.split_once('=')
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .ok_or_else(|| format!("expected key=value, got {}", s))
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "custom_storage=info".into()),
        )
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let manager = StorageManager::new();
    custom_storage::register_storage_drivers(&manager).await?;

    if let Command::Drivers = args.command {
        for (driver_type, info) in manager.driver_infos().await {
            println!("{} ({})", driver_type, info.config.name);
            for item in info.common.iter().chain(info.additional.iter()) {
                let required = if item.required { " *" } else { "" };
                println!("  {:<20} {}{}", item.name, item.item_type, required);
            }
        }
        return Ok(());
    }

    let config_path = args.config.unwrap_or_else(get_config_path);
    let config = load_config(&config_path).map_err(|e| anyhow!(e))?;
    let (name, disk_config) = config
        .disk(args.disk.as_deref())
        .ok_or_else(|| anyhow!("Disk not configured: {}", args.disk.as_deref().unwrap_or(&config.default)))?;
    let disk = manager
        .create_disk(name, &disk_config.driver, Value::Object(disk_config.options.clone()))
        .await?;

    match args.command {
        Command::Drivers => {}
        Command::Ls { path, deep } => {
            for file in disk.list(&path, deep).await? {
                println!("{:>12}  {}", file.file_size.unwrap_or(0), file.path);
            }
        }
        Command::Cat { path } => {
            let mut reader = disk.read_stream(&path).await?;
            let mut stdout = tokio::io::stdout();
            tokio::io::copy(&mut reader, &mut stdout).await?;
            stdout.flush().await?;
        }
        Command::Put { path, file, mime } => {
            let data = tokio::fs::read(&file)
                .await
                .with_context(|| format!("Failed to read {:?}", file))?;
            match mime {
                Some(mime) => disk.put_with(&path, data, &WriteOptions::with_mime(mime)).await?,
                None => disk.put(&path, data).await?,
            }
            tracing::info!("Uploaded {:?} to {}:{}", file, name, path);
        }
        Command::Rm { paths } => {
            let paths: Vec<&str> = paths.iter().map(String::as_str).collect();
            disk.delete(&paths).await?;
        }
        Command::Mv { from, to } => disk.move_file(&from, &to).await?,
        Command::Cp { from, to } => disk.copy(&from, &to).await?,
        Command::Stat { path } => {
            let meta = disk.metadata(&path).await?;
            println!("{}", serde_json::to_string_pretty(&meta)?);
        }
        Command::Url { path } => println!("{}", disk.url(&path)?),
        Command::TempUrl { path, expires, params } => {
            let options: UrlOptions = params.into_iter().collect();
            let expiration: Expiration = match expires.parse::<u64>() {
                Ok(secs) => secs.into(),
                Err(_) => expires.into(),
            };
            let url = disk.temporary_url(&path, expiration, &options).await?;
            println!("{}", url);
        }
        Command::UploadToken { key, expires } => {
            let qiniu = disk
                .downcast::<QiniuDriver>()
                .ok_or_else(|| anyhow!("upload-token needs a custom-qiniu disk, {} is {}", name, disk.driver_name()))?;
            println!("{}", qiniu.upload_token(key.as_deref(), expires, None, true)?);
        }
        Command::Refresh { paths } => {
            let qiniu = disk
                .downcast::<QiniuDriver>()
                .ok_or_else(|| anyhow!("refresh needs a custom-qiniu disk, {} is {}", name, disk.driver_name()))?;
            let paths: Vec<&str> = paths.iter().map(String::as_str).collect();
            let result = qiniu.refresh_cdn(&paths).await?;
            println!("request_id={} quota_left={}", result.request_id, result.url_surplus_day);
        }
    }

    Ok(())
}
