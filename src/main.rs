//! Binary entry point for the `vmpool` CLI.

use std::io::{self, Write};
use std::process;

use clap::Parser;
use thiserror::Error;
use tracing_subscriber::EnvFilter;

use vmpool::{
    DnsSynchronizer, GcpCompute, GcpDns, PoolError, PoolManager, ProviderConfig, VirtualMachine,
};

mod cli;

use cli::Cli;

#[derive(Debug, Error)]
enum CliError {
    #[error("configuration error: {0}")]
    Config(String),
    #[error(transparent)]
    Pool(#[from] PoolError),
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::from_default_env().add_directive(tracing::Level::INFO.into()),
        )
        .init();

    let cli = Cli::parse();
    let exit_code = match dispatch(cli).await {
        Ok(code) => code,
        Err(err) => {
            report_error(&err);
            1
        }
    };
    process::exit(exit_code);
}

async fn dispatch(cli: Cli) -> Result<i32, CliError> {
    let config =
        ProviderConfig::load_without_cli_args().map_err(|err| CliError::Config(err.to_string()))?;
    config.validate().map_err(|err| CliError::Config(err.to_string()))?;

    let compute = GcpCompute::new(&config.project, &config.access_token);
    let dns = config.dns_zone.as_ref().map(|zone| {
        DnsSynchronizer::new(GcpDns::new(&config.project, &config.access_token), zone)
    });
    let manager = PoolManager::new(config, compute, dns);

    match cli {
        Cli::List { pool } => {
            let members = manager.list_pool_members(&pool).await?;
            let mut stdout = io::stdout();
            for member in &members {
                writeln!(stdout, "{}\t{}\t{}", member.name, member.status, member.hostname).ok();
            }
            Ok(0)
        }
        Cli::Show { pool, name } => match manager.get_vm(&pool, &name).await? {
            Some(vm) => {
                print_vm(&vm);
                Ok(0)
            }
            None => {
                writeln!(io::stderr(), "VM '{name}' not found in pool '{pool}'").ok();
                Ok(1)
            }
        },
        Cli::Create { pool, name } => {
            let vm = manager.create_vm(&pool, &name).await?;
            print_vm(&vm);
            Ok(0)
        }
        Cli::AddDisk { pool, name, size_gb } => {
            manager.create_disk(&pool, &name, size_gb).await?;
            Ok(0)
        }
        Cli::Snapshot { pool, name, snapshot } => {
            manager.create_snapshot(&pool, &name, &snapshot).await?;
            Ok(0)
        }
        Cli::Revert { pool, name, snapshot } => {
            manager.revert_snapshot(&pool, &name, &snapshot).await?;
            Ok(0)
        }
        Cli::Destroy { pool, name } => {
            manager.destroy_vm(&pool, &name).await?;
            Ok(0)
        }
        Cli::Ready { pool, name } => {
            let ready = manager.is_ready(&pool, &name).await?;
            writeln!(io::stdout(), "{}", if ready { "ready" } else { "not ready" }).ok();
            Ok(i32::from(!ready))
        }
        Cli::Purge { allow } => {
            let allow_list = if allow.is_empty() { None } else { Some(allow.as_slice()) };
            let summary = manager.purge_unconfigured(allow_list).await?;
            writeln!(
                io::stdout(),
                "purged {} instances, {} disks, {} snapshots",
                summary.instances,
                summary.disks,
                summary.snapshots
            )
            .ok();
            Ok(0)
        }
    }
}

fn print_vm(vm: &VirtualMachine) {
    let mut stdout = io::stdout();
    writeln!(stdout, "name:         {}", vm.name).ok();
    writeln!(stdout, "pool:         {}", vm.pool).ok();
    writeln!(stdout, "status:       {}", vm.status).ok();
    writeln!(stdout, "hostname:     {}", vm.hostname).ok();
    writeln!(stdout, "zone:         {}", vm.zone).ok();
    writeln!(stdout, "machine type: {}", vm.machine_type).ok();
    writeln!(stdout, "template:     {}", vm.template).ok();
    writeln!(stdout, "boot time:    {}", vm.boot_time).ok();
    match vm.ip {
        Some(ip) => writeln!(stdout, "internal ip:  {ip}").ok(),
        None => writeln!(stdout, "internal ip:  (unassigned)").ok(),
    };
}

fn report_error(err: &CliError) {
    writeln!(io::stderr(), "{err}").ok();
}
