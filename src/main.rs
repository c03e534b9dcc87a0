use clap::Parser;
use signvault::cli::{commands, Cli, Commands};

#[tokio::main]
async fn main() {
    // Logs go to stderr so command output on stdout stays pipeable.
    tracing_subscriber::fmt()
        .with_env_filter(signvault::cli::log_filter(
            std::env::var("RUST_LOG").ok().as_deref(),
        ))
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Server { port } => commands::server::execute(&cli, port).await,
        Commands::Init => commands::init::execute(&cli),
        Commands::Config => commands::config::execute(&cli),
        Commands::Create {
            ref file,
            modulus_length,
        } => commands::create::execute(&cli, file.as_ref(), modulus_length).await,
        Commands::List => commands::list::execute(&cli).await,
        Commands::Info { ref vault_id, json } => {
            commands::info::execute(&cli, vault_id, json).await
        }
        Commands::Export {
            ref vault_id,
            ref out,
        } => commands::export::execute(&cli, vault_id, out.as_deref()).await,
        Commands::Show { ref vault_id } => commands::show::execute(&cli, vault_id).await,
        Commands::Write {
            ref vault_id,
            ref file,
        } => commands::write::execute(&cli, vault_id, file).await,
        Commands::Delete { ref vault_id, force } => {
            commands::delete::execute(&cli, vault_id, force).await
        }
        Commands::Version => commands::version::execute(),
        Commands::Completions { shell } => commands::completions::execute(shell),
    };

    if let Err(e) = result {
        signvault::cli::output::error(&e.to_string());
        std::process::exit(1);
    }
}
