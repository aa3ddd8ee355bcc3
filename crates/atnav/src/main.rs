//! atnav: browse ATProto repositories from the terminal
//!
//! Subcommands:
//! - `open`: Navigate to a URL, AT URI, handle or DID
//! - `route`: Mount the view for a navigation path
//! - `resolve`: Print the DID and PDS behind an identifier
//! - `pdses`: List known PDS hosts

use std::sync::Arc;

use atnav_atproto::resolver::{DEFAULT_HANDLE_RESOLVER, DEFAULT_PLC_DIRECTORY};
use atnav_atproto::{
    ClientConfig, DEFAULT_PDS_LIST_URL, IdentityResolver, ResolverConfig, XrpcSessionFactory,
    fetch_known_pdses,
};
use atnav_views::{Navigator, Route, View, ViewError};
use clap::{Args, Parser, Subcommand};
use miette::Result;
use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

mod terminal;

use terminal::Terminal;

#[derive(Parser)]
#[command(name = "atnav")]
#[command(about = "Browse ATProto repositories", long_about = None)]
struct Cli {
    /// PLC directory for did:plc documents
    #[arg(long, global = true, env = "ATNAV_PLC_DIRECTORY", default_value = DEFAULT_PLC_DIRECTORY)]
    plc_directory: String,

    /// Service answering com.atproto.identity.resolveHandle
    #[arg(long, global = true, env = "ATNAV_HANDLE_RESOLVER", default_value = DEFAULT_HANDLE_RESOLVER)]
    handle_resolver: String,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Open a PDS URL, AT URI, bsky.app link, handle or DID
    Open {
        /// What to open (at:// optional)
        input: String,

        #[command(flatten)]
        paging: Paging,
    },

    /// Open a navigation path such as /at/<did>/<collection>
    Route {
        path: String,

        #[command(flatten)]
        paging: Paging,
    },

    /// Resolve a handle or DID to its PDS
    Resolve { identifier: String },

    /// List PDS hosts known to be reachable
    Pdses {
        /// Location of the atproto-scraping state file
        #[arg(long, env = "ATNAV_PDS_LIST_URL", default_value = DEFAULT_PDS_LIST_URL)]
        pds_list_url: String,
    },
}

/// How far to page through listing views.
#[derive(Args, Clone, Copy)]
struct Paging {
    /// Load up to this many additional pages
    #[arg(long, default_value = "0")]
    more: usize,

    /// Load every page
    #[arg(long, conflicts_with = "more")]
    all: bool,
}

impl Paging {
    fn wants_more(&self, loaded: usize) -> bool {
        self.all || loaded < self.more
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Logs go to stderr so stdout only carries rendered views
    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "atnav=info".to_string()),
        ))
        .with(tracing_subscriber::fmt::layer().with_writer(std::io::stderr))
        .init();

    let cli = Cli::parse();

    let client = ClientConfig::default();
    let resolver_config = ResolverConfig {
        client: client.clone(),
        ..ResolverConfig::default()
    }
    .with_plc_directory(cli.plc_directory)
    .with_handle_resolver(cli.handle_resolver);

    let resolver = IdentityResolver::new(&resolver_config).map_err(|e| miette::miette!("{}", e))?;

    match cli.command {
        Commands::Open { input, paging } => {
            let nav = navigator(resolver, &client)?;
            let route = nav
                .submit(&input)
                .await
                .map_err(|e| miette::miette!("{}", e))?;
            let notice = nav.notices().current();
            if !notice.is_empty() {
                eprintln!("{}", notice);
            }
            info!(route = %route, "navigating");
            browse(&nav, route, paging).await
        }
        Commands::Route { path, paging } => {
            let nav = navigator(resolver, &client)?;
            let route = Route::parse(&path).map_err(|e| miette::miette!("{}", e))?;
            browse(&nav, route, paging).await
        }
        Commands::Resolve { identifier } => {
            let identity = resolver
                .resolve(&identifier)
                .await
                .map_err(|e| miette::miette!("{}", e))?;
            println!("{}", identity.did);
            println!("{}", identity.endpoint);
            Ok(())
        }
        Commands::Pdses { pds_list_url } => {
            let http = client.build_http().map_err(|e| miette::miette!("{}", e))?;
            let hosts = fetch_known_pdses(&http, &pds_list_url)
                .await
                .map_err(|e| miette::miette!("failed to load PDS list: {}", e))?;
            for host in hosts {
                println!("{}", host);
            }
            Ok(())
        }
    }
}

fn navigator(resolver: IdentityResolver, client: &ClientConfig) -> Result<Navigator> {
    let sessions = XrpcSessionFactory::new(client).map_err(|e| miette::miette!("{}", e))?;
    Ok(Navigator::new(resolver, Arc::new(sessions)))
}

/// Mount the view for `route`, load it and print it.
async fn browse(nav: &Navigator, route: Route, paging: Paging) -> Result<()> {
    let mut view = nav.mount(route);
    let loaded = load(&mut view, paging).await;

    let mut term = Terminal::new(std::io::stdout().lock(), view.endpoint_host());
    term.breadcrumb(&view.breadcrumb());
    term.notice(&nav.notices().current());
    view.render(&mut term);
    term.finish()
        .map_err(|e| miette::miette!("failed to write output: {}", e))?;

    if loaded.is_ok() && view.has_more() {
        eprintln!("more available (--more <n> or --all)");
    }
    loaded.map_err(|e| miette::miette!("{}", e))
}

async fn load(view: &mut View, paging: Paging) -> Result<(), ViewError> {
    view.load().await?;

    let mut pages = 0;
    while view.has_more() && paging.wants_more(pages) {
        view.load_more().await?;
        pages += 1;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paging() {
        let none = Paging {
            more: 0,
            all: false,
        };
        assert!(!none.wants_more(0));

        let two = Paging {
            more: 2,
            all: false,
        };
        assert!(two.wants_more(1));
        assert!(!two.wants_more(2));

        let all = Paging {
            more: 0,
            all: true,
        };
        assert!(all.wants_more(1000));
    }

    #[test]
    fn test_cli_parses() {
        let cli = Cli::try_parse_from(["atnav", "open", "alice.test", "--more", "3"]).unwrap();
        assert_eq!(cli.plc_directory, DEFAULT_PLC_DIRECTORY);
        match cli.command {
            Commands::Open { input, paging } => {
                assert_eq!(input, "alice.test");
                assert_eq!(paging.more, 3);
            }
            _ => panic!("expected open"),
        }

        assert!(Cli::try_parse_from(["atnav", "route", "/at/x", "--more", "1", "--all"]).is_err());
    }
}
