use clap::Parser;
use std::path::PathBuf;
use tracing::{debug, error};

use wsus_recon::inventory::{LdapDirectorySource, ScopeFilter, WsusClient};
use wsus_recon::report::render_table;
use wsus_recon::{pipeline, RunConfig};

/// Reconcile Active Directory computer accounts against WSUS computer targets
#[derive(Parser)]
#[command(name = "wsus-recon")]
#[command(about = "Find machines unmanaged by WSUS and WSUS targets with disabled accounts", long_about = None)]
struct Cli {
    /// Enable verbose output (-v for debug, -vv for trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    /// Path to a TOML configuration file; flags override file values
    #[arg(short = 'c', long)]
    config: Option<PathBuf>,

    /// WSUS server host name
    #[arg(long)]
    server: Option<String>,

    /// WSUS server port (8530 plain, 8531 TLS)
    #[arg(long)]
    port: Option<u16>,

    /// Talk to the WSUS server over HTTPS
    #[arg(long)]
    use_tls: bool,

    /// Which directory computers to check for WSUS coverage
    #[arg(long, value_enum)]
    scope: Option<ScopeFilter>,

    /// Directory the two CSV reports are written into
    #[arg(short = 'o', long)]
    output_dir: Option<PathBuf>,

    /// File name for the missing-from-WSUS report
    #[arg(long)]
    missing_file: Option<String>,

    /// File name for the stale-in-WSUS report
    #[arg(long)]
    stale_file: Option<String>,

    /// Print result tables to stdout in addition to writing CSVs
    #[arg(short, long)]
    interactive: bool,

    /// Directory (LDAP) server host name
    #[arg(long)]
    directory_host: Option<String>,

    /// Directory server port (389 plain, 636 LDAPS)
    #[arg(long)]
    directory_port: Option<u16>,

    /// Talk to the directory server over LDAPS
    #[arg(long)]
    directory_tls: bool,

    /// Base DN searched for computer accounts
    #[arg(long)]
    base_dn: Option<String>,

    /// Bind DN for the directory connection
    #[arg(long)]
    bind_dn: Option<String>,

    /// Bind password for the directory connection
    #[arg(long)]
    bind_password: Option<String>,
}

impl Cli {
    /// File values (or defaults) with CLI flags layered on top.
    fn into_config(self) -> anyhow::Result<RunConfig> {
        let mut config = match &self.config {
            Some(path) => RunConfig::from_file(path)?,
            None => RunConfig::default(),
        };

        if let Some(server) = self.server {
            config.server = server;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if self.use_tls {
            config.use_tls = true;
        }
        if let Some(scope) = self.scope {
            config.scope = scope;
        }
        if let Some(output_dir) = self.output_dir {
            config.output_dir = output_dir;
        }
        if let Some(missing_file) = self.missing_file {
            config.missing_file = missing_file;
        }
        if let Some(stale_file) = self.stale_file {
            config.stale_file = stale_file;
        }
        if self.interactive {
            config.interactive = true;
        }
        if let Some(host) = self.directory_host {
            config.directory.host = host;
        }
        if let Some(port) = self.directory_port {
            config.directory.port = port;
        }
        if self.directory_tls {
            config.directory.use_tls = true;
        }
        if let Some(base_dn) = self.base_dn {
            config.directory.base_dn = base_dn;
        }
        if let Some(bind_dn) = self.bind_dn {
            config.directory.bind_dn = bind_dn;
        }
        if let Some(bind_password) = self.bind_password {
            config.directory.bind_password = Some(bind_password);
        }

        Ok(config)
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    let log_level = match cli.verbose {
        0 => "info",
        1 => "debug",
        _ => "trace",
    };

    tracing_subscriber::fmt()
        .with_env_filter(log_level)
        .with_target(cli.verbose >= 2)
        .init();

    if let Err(e) = run(cli).await {
        error!("Fatal error: {}", e);
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run(cli: Cli) -> anyhow::Result<()> {
    let config = cli.into_config()?;
    debug!(server = %config.server, port = config.port, scope = %config.scope, "starting run");

    let directory = LdapDirectorySource::new(config.directory.clone())?;
    let patch_server = WsusClient::new(config.patch_server_url());

    let report = pipeline::run(&config, &directory, &patch_server).await?;
    pipeline::export(&config, &report)?;

    println!(
        "{} computer(s) missing from WSUS -> {}",
        report.missing.len(),
        config.missing_path().display()
    );
    println!(
        "{} stale WSUS target(s) -> {}",
        report.stale.len(),
        config.stale_path().display()
    );

    if config.interactive {
        print!("\n{}", render_table("Missing from WSUS", &report.missing));
        print!("\n{}", render_table("Stale in WSUS", &report.stale));
    }

    Ok(())
}
