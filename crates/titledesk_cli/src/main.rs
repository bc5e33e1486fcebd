//! CLI smoke entry point.
//!
//! # Responsibility
//! - Verify `titledesk_core` linkage (`ping`, version).
//! - Sign in, search, and optionally create or delete one title.
//!
//! # Invariants
//! - The HTTP catalog is used when an endpoint is configured; otherwise a
//!   seeded in-memory catalog stands in.
//! - Nothing is written unless `--create` or `--delete` is given.

use clap::Parser;
use log::{error, info};
use std::path::PathBuf;
use std::process::ExitCode;
use std::sync::Arc;
use titledesk_core::{
    default_log_level, http_repository, init_logging, CatalogClient, ClientConfig,
    InMemoryCatalogApi, InMemoryIdentityProvider, RemoteTitleRepository, SearchView,
    TitleRepository,
};

const DEMO_ADMIN: &str = "admin@example.com";
const DEMO_PASSWORD: &str = "Passw0rd!";
const DEMO_TITLES: [&str; 12] = [
    "Option aaa",
    "Option aab",
    "Option aac",
    "Option aba",
    "Option abc",
    "Option bbc",
    "Option bab",
    "Option bcc",
    "Option ccc",
    "Option ada",
    "Option eee",
    "Option abdb",
];

#[derive(Parser, Debug)]
#[command(name = "titledesk")]
#[command(about = "Smoke run of the titledesk catalog client")]
#[command(version)]
struct Args {
    /// Search term typed into the catalog
    #[arg(short, long, default_value = "ab")]
    term: String,

    /// GraphQL catalog endpoint; overrides `catalog_endpoint` from the config
    #[arg(long)]
    endpoint: Option<String>,

    /// Title to create after the first search
    #[arg(long)]
    create: Option<String>,

    /// Id of a title to delete after searching
    #[arg(long)]
    delete: Option<String>,

    /// Directory for rolling log files; logging stays off when omitted
    #[arg(long)]
    log_dir: Option<PathBuf>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, default_value_t = default_log_level().to_string())]
    log_level: String,

    /// JSON client configuration
    #[arg(short, long)]
    config: Option<PathBuf>,
}

#[tokio::main(flavor = "current_thread")]
async fn main() -> ExitCode {
    let args = Args::parse();
    println!("titledesk_core ping={}", titledesk_core::ping());
    println!("titledesk_core version={}", titledesk_core::core_version());

    if let Some(log_dir) = &args.log_dir {
        if let Err(err) = init_logging(&args.log_level, &log_dir.to_string_lossy()) {
            eprintln!("logging disabled: {err}");
        }
    }

    match run(&args).await {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("event=cli_run module=cli status=error error={}", err);
            eprintln!("error: {err}");
            ExitCode::FAILURE
        }
    }
}

async fn run(args: &Args) -> Result<(), Box<dyn std::error::Error>> {
    let mut config = match &args.config {
        Some(path) => ClientConfig::from_json_file(path)?,
        None => ClientConfig::default(),
    };
    if let Some(endpoint) = &args.endpoint {
        config.catalog_endpoint = Some(endpoint.clone());
    }

    let repo: Arc<dyn TitleRepository> = match http_repository(&config)? {
        Some(repo) => repo,
        None => {
            info!("event=catalog_adapter module=cli status=ok adapter=memory");
            Arc::new(RemoteTitleRepository::new(InMemoryCatalogApi::with_titles(
                DEMO_TITLES,
            )))
        }
    };
    let identity = Arc::new(
        InMemoryIdentityProvider::new().with_user(DEMO_ADMIN, DEMO_PASSWORD, ["Administrators"]),
    );
    let mut client = CatalogClient::start(config, repo, identity).await?;

    client.session_mut().sign_in(DEMO_ADMIN, DEMO_PASSWORD).await?;
    println!(
        "session status={:?} can_delete={}",
        client.session().status(),
        client.can_delete()
    );

    let view = search(&client, &args.term).await?;
    print_view(&view);

    if let Some(title) = &args.create {
        let created = client.mutations().submit_create(title).await?;
        println!("create outcome={created:?}");
        print_view(&search(&client, &args.term).await?);
    }

    if let Some(id) = &args.delete {
        let outcome = client.mutations().submit_delete(id).await?;
        println!("delete outcome={outcome:?}");
        print_view(&client.search().view());
    }

    client.session_mut().sign_out().await;
    println!("session status={:?}", client.session().status());
    Ok(())
}

async fn search(
    client: &CatalogClient<dyn TitleRepository, InMemoryIdentityProvider>,
    term: &str,
) -> Result<SearchView, Box<dyn std::error::Error>> {
    let mut updates = client.search().subscribe();
    let since = updates.borrow().seq;
    client.search().input(term);
    let view = updates
        .wait_for(|view| view.seq > since && !view.loading)
        .await?
        .clone();
    Ok(view)
}

fn print_view(view: &SearchView) {
    println!(
        "search term={:?} shown={} visible={}",
        view.term,
        view.results.len(),
        view.is_visible()
    );
    for hit in &view.results {
        println!(
            "  {}[{}]{}  (id={})",
            hit.before(),
            hit.matched(),
            hit.after(),
            hit.record.id
        );
    }
    if let Some(error) = &view.error {
        println!("  error: {error}");
    }
}
