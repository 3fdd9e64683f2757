use clap::{Parser, Subcommand};
use rand::Rng;
use sleeqc::cli as prog_cli;
use sleeqc::config::{ServiceConfig, load_config};
use std::path::PathBuf;
use std::process::ExitCode;

const DEFAULT_MESSAGE: &str = "Resource adaptive PQC signing test";

#[derive(Parser, Debug)]
#[command(name = "sleeqc", version, about = "Resource-adaptive post-quantum signing service", long_about = None)]
struct Cli {
    /// Path to a config file (TOML)
    #[arg(long, help = "Path to a config file (TOML). If omitted, the default search path is used.")]
    config: Option<PathBuf>,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    #[command(about = "Generate both keypairs and serve signing requests until Ctrl-C")]
    Serve {
        #[arg(long, help = "TCP port to listen on (default 8080)")]
        port: Option<u16>,
        #[arg(long, help = "Address to bind (default 0.0.0.0)")]
        bind: Option<String>,
        #[arg(long = "max-request-bytes", help = "Largest request accepted in one receive")]
        max_request_bytes: Option<usize>,
    },
    #[command(about = "Send a payload to a running service and verify the returned signature")]
    Sign {
        #[arg(long, default_value = "127.0.0.1:8080")]
        addr: String,
        #[arg(long, conflicts_with = "random", help = "Message to sign")]
        message: Option<String>,
        #[arg(long, help = "Sign N random bytes instead of a message")]
        random: Option<usize>,
    },
    #[command(about = "Time keygen, sign and verify for both profiles")]
    Bench {
        #[arg(long, default_value_t = 10)]
        iterations: u32,
        #[arg(long, help = "Message to sign during the benchmark")]
        message: Option<String>,
    },
    #[command(name = "show-config", about = "Print the effective configuration as TOML")]
    ShowConfig,
}

fn apply_overrides(cfg: &mut ServiceConfig, command: &Commands) {
    if let Commands::Serve { port, bind, max_request_bytes } = command {
        if let Some(p) = port { cfg.port = *p; }
        if let Some(b) = bind { cfg.bind = b.clone(); }
        if let Some(m) = max_request_bytes { cfg.max_request_bytes = *m; }
    }
}

fn random_payload(len: usize) -> Vec<u8> {
    let mut buf = vec![0u8; len];
    rand::rng().fill(&mut buf[..]);
    buf
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let cli = Cli::parse();
    let mut cfg = match load_config(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => { eprintln!("error: {}", e); return ExitCode::FAILURE; }
    };
    apply_overrides(&mut cfg, &cli.command);
    if let Err(e) = cfg.validate() {
        eprintln!("error: {}", e);
        return ExitCode::FAILURE;
    }

    let cmd = match cli.command {
        Commands::Serve { .. } => prog_cli::Command::Serve,
        Commands::Sign { addr, message, random } => {
            let payload = match random {
                Some(n) => random_payload(n),
                None => message.unwrap_or_else(|| DEFAULT_MESSAGE.to_string()).into_bytes(),
            };
            prog_cli::Command::Sign { addr, payload }
        }
        Commands::Bench { iterations, message } => prog_cli::Command::Bench {
            iterations,
            message: message.unwrap_or_else(|| DEFAULT_MESSAGE.to_string()).into_bytes(),
        },
        Commands::ShowConfig => prog_cli::Command::ShowConfig,
    };

    match prog_cli::run(&cfg, cmd).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("error: {}", e);
            ExitCode::FAILURE
        }
    }
}
