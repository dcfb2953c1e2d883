use color_eyre::eyre::{
    Result,
    WrapErr,
    eyre,
};
use flipside::client;
use std::path::PathBuf;

fn print_usage_and_exit() -> ! {
    println!(
        "Usage: flipside [--server-url <url>] [--state-dir <path>] [--log-file <path>]\n\
         \n\
         Flags:\n\
           --server-url <url>  Coin-flip server to connect to (default {})\n\
           --state-dir <path>  Where to keep the saved session (default ~/.flipside)\n\
           --log-file <path>   Append tracing output to this file\n\
           --no-state          Do not load or save the session between runs",
        client::DEFAULT_SERVER_URL,
    );
    std::process::exit(0);
}

struct CliArgs {
    config: client::AppConfig,
    log_file: Option<PathBuf>,
}

fn parse_cli_args() -> Result<CliArgs> {
    let mut args = std::env::args().skip(1);
    let mut server_url: Option<String> = None;
    let mut state_dir: Option<String> = None;
    let mut log_file: Option<String> = None;
    let mut no_state = false;

    while let Some(arg) = args.next() {
        match arg.as_str() {
            "--server-url" => {
                let url = args
                    .next()
                    .ok_or_else(|| eyre!("--server-url requires a URL argument"))?;
                if server_url.is_some() {
                    return Err(eyre!("--server-url may only be specified once"));
                }
                server_url = Some(url);
            }
            "--state-dir" => {
                let dir = args
                    .next()
                    .ok_or_else(|| eyre!("--state-dir requires a path argument"))?;
                if state_dir.is_some() {
                    return Err(eyre!("--state-dir may only be specified once"));
                }
                state_dir = Some(dir);
            }
            "--log-file" => {
                let path = args
                    .next()
                    .ok_or_else(|| eyre!("--log-file requires a path argument"))?;
                if log_file.is_some() {
                    return Err(eyre!("--log-file may only be specified once"));
                }
                log_file = Some(path);
            }
            "--no-state" => no_state = true,
            "--help" | "-h" => print_usage_and_exit(),
            other => return Err(eyre!("Unknown argument: {other}")),
        }
    }

    let state_dir = if no_state {
        None
    } else {
        let dir = state_dir.as_deref().unwrap_or("~/.flipside");
        let expanded = shellexpand::tilde(dir);
        Some(PathBuf::from(expanded.as_ref()))
    };

    Ok(CliArgs {
        config: client::AppConfig {
            server_url: server_url
                .unwrap_or_else(|| client::DEFAULT_SERVER_URL.to_string()),
            state_dir,
        },
        log_file: log_file.map(|p| PathBuf::from(shellexpand::tilde(&p).as_ref())),
    })
}

/// Logging goes to a file when asked for; stderr is owned by the terminal
/// UI, so there is no console layer.
fn init_tracing(log_file: Option<&PathBuf>) -> Result<Option<tracing_appender::non_blocking::WorkerGuard>> {
    use tracing_subscriber::EnvFilter;

    let Some(path) = log_file else {
        return Ok(None);
    };
    let dir = path.parent().filter(|p| !p.as_os_str().is_empty());
    if let Some(dir) = dir {
        std::fs::create_dir_all(dir)
            .wrap_err_with(|| format!("creating log directory {}", dir.display()))?;
    }
    let file = std::fs::OpenOptions::new()
        .create(true)
        .append(true)
        .open(path)
        .wrap_err_with(|| format!("opening log file {}", path.display()))?;
    let (writer, guard) = tracing_appender::non_blocking(file);
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| "info".into()))
        .with_writer(writer)
        .with_ansi(false)
        .init();
    Ok(Some(guard))
}

#[tokio::main]
async fn main() -> Result<()> {
    color_eyre::install()?;
    let cli = parse_cli_args()?;
    let _log_guard = init_tracing(cli.log_file.as_ref())?;
    tracing::info!(server = %cli.config.server_url, "starting flipside client");
    client::run_app(cli.config).await
}
