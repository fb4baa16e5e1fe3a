//! examshelf CLI
//!
//! One-shot catalog queries plus an interactive `browse` session.

use std::io::Write;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use examshelf::{
    backend::{CatalogBackend, MemoryBackend, RestBackend},
    browser::Browser,
    error::{AppError, Result},
    models::{Comment, CommentForm, Config, Resource, TypeFilter},
    navigation::View,
    services::{
        CatalogClient, CommentService, Downloader, LocalDownloads, Listing,
        PENDING_MODERATION_NOTICE, SearchState,
    },
    utils::http,
};
use tokio::io::{AsyncBufReadExt, BufReader};

/// examshelf - university exam resource browser
#[derive(Parser, Debug)]
#[command(
    name = "examshelf",
    version,
    about = "Browse question papers, solved papers and notes by university, degree and subject"
)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = "examshelf.toml")]
    config: PathBuf,

    /// Serve the catalog from a JSON fixture instead of the hosted backend
    #[arg(long)]
    offline: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// List active universities
    Universities,

    /// List degrees, optionally for one university
    Degrees {
        #[arg(long)]
        university: Option<String>,
    },

    /// List semesters of a degree
    Semesters {
        #[arg(long)]
        degree: String,
    },

    /// List subjects of a semester
    Subjects {
        #[arg(long)]
        semester: String,
    },

    /// List published resources of a subject
    Resources {
        #[arg(long)]
        subject: String,
    },

    /// Recent resources, or search results when --search is given
    Recent {
        #[arg(long)]
        search: Option<String>,

        /// all, question_paper, solved_paper or notes
        #[arg(long = "type", default_value = "all")]
        kind: TypeFilter,
    },

    /// Approved comments on a degree
    Comments {
        #[arg(long)]
        degree: String,
    },

    /// Submit a comment on a degree for moderation
    Comment {
        #[arg(long)]
        degree: String,
        #[arg(long)]
        name: String,
        #[arg(long)]
        text: String,
        #[arg(long)]
        email: Option<String>,
    },

    /// Download a resource file and count the download
    Download {
        #[arg(long)]
        id: i64,

        /// Stored file path or absolute URL
        #[arg(long)]
        path: String,

        #[arg(long)]
        title: String,
    },

    /// Validate configuration
    Validate,

    /// Interactive drill-down session
    Browse,
}

/// Initialize logging based on verbosity flag.
fn init_logging(verbose: bool) {
    let level = if verbose { "debug" } else { "info" };
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or(level))
        .format_timestamp_secs()
        .init();
}

fn open_backend(offline: Option<&PathBuf>, config: &Config) -> Result<Arc<dyn CatalogBackend>> {
    match offline {
        Some(path) => {
            log::info!("Serving catalog from fixture {}", path.display());
            Ok(Arc::new(MemoryBackend::from_fixture(path)?))
        }
        None => {
            config.validate()?;
            Ok(Arc::new(RestBackend::new(&config.backend)?))
        }
    }
}

fn downloader(catalog: &CatalogClient, config: &Config) -> Result<Downloader> {
    let client = http::create_download_client(&config.backend)?;
    let sink = LocalDownloads::new(client, &config.downloads.output_dir);
    Ok(Downloader::new(catalog.clone(), Arc::new(sink)))
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging(cli.verbose);

    let mut config = Config::load_or_default(&cli.config);
    config.apply_env();

    if let Command::Validate = cli.command {
        log::info!("Validating configuration...");
        if let Err(e) = config.validate() {
            log::error!("Config validation failed: {}", e);
            return Err(e);
        }
        log::info!("✓ Config OK");
        return Ok(());
    }

    let backend = open_backend(cli.offline.as_ref(), &config)?;
    let catalog = CatalogClient::new(backend.clone(), &config.backend, &config.search);
    let comments = CommentService::new(backend);

    match cli.command {
        Command::Universities => print_listing(&Listing::Universities(catalog.list_universities().await)),
        Command::Degrees { university } => {
            print_listing(&Listing::Degrees(catalog.list_degrees(university.as_deref()).await))
        }
        Command::Semesters { degree } => {
            print_listing(&Listing::Semesters(catalog.list_semesters(&degree).await))
        }
        Command::Subjects { semester } => {
            print_listing(&Listing::Subjects(catalog.list_subjects(&semester).await))
        }
        Command::Resources { subject } => {
            let rows = catalog.list_subject_resources(&subject).await;
            print_resources(&rows.iter().collect::<Vec<_>>());
        }
        Command::Recent { search, kind } => {
            let rows = catalog.list_recent_resources(search.as_deref()).await;
            let mut state = SearchState::default();
            state.set_type_filter(kind);
            print_resources(&state.apply(&rows));
        }
        Command::Comments { degree } => print_comments(&comments.list(&degree).await),
        Command::Comment {
            degree,
            name,
            text,
            email,
        } => {
            let mut form = CommentForm::new(name, email.unwrap_or_default(), text);
            comments.submit(&degree, &mut form).await?;
            println!("{PENDING_MODERATION_NOTICE}");
        }
        Command::Download { id, path, title } => {
            let outcome = downloader(&catalog, &config)?.download(id, &path, &title).await?;
            println!("Saved {}", outcome.saved_to.display());
        }
        Command::Browse => {
            let downloader = downloader(&catalog, &config)?;
            let delay = Duration::from_millis(config.search.debounce_ms);
            let mut browser = Browser::new(catalog, comments, downloader, delay);
            browse(&mut browser).await?;
        }
        Command::Validate => {}
    }

    Ok(())
}

const BROWSE_HELP: &str = "\
commands:
  home                     recent resources
  universities             list universities
  degrees                  list every degree
  open <n>                 drill into entry n
  back [view]              up one level, or to an ancestor view
  search <text>            search from home (empty text clears)
  type <kind>              all, question_paper, solved_paper, notes
  download <n>             download resource n
  comments                 comments on the selected degree
  comment <name> | <text>  submit a comment on the selected degree
  list                     show the current view again
  quit";

async fn browse(browser: &mut Browser) -> Result<()> {
    browser.reload().await;
    show(browser);

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    loop {
        prompt(browser)?;
        let Some(line) = lines.next_line().await? else {
            break;
        };
        let line = line.trim();
        let (command, arg) = line.split_once(' ').unwrap_or((line, ""));
        let arg = arg.trim();

        let result = match command {
            "" => continue,
            "quit" | "exit" => break,
            "help" => {
                println!("{BROWSE_HELP}");
                continue;
            }
            "list" => {
                show(browser);
                continue;
            }
            "home" => {
                browser.home().await;
                Ok(())
            }
            "universities" => browser.open_universities().await,
            "degrees" => browser.browse_degrees().await,
            "open" => match parse_index(arg) {
                Ok(index) => browser.open(index).await,
                Err(e) => Err(e),
            },
            "back" if arg.is_empty() => browser.back().await,
            "back" => match parse_view(arg) {
                Ok(view) => browser.back_to(view).await,
                Err(e) => Err(e),
            },
            "search" => match browser.search_input(arg) {
                Ok(()) => {
                    browser.settle_search().await;
                    Ok(())
                }
                Err(e) => Err(e),
            },
            "type" => arg.parse::<TypeFilter>().and_then(|filter| browser.set_type_filter(filter)),
            "download" => {
                match parse_index(arg) {
                    Ok(index) => match browser.download(index).await {
                        Ok(outcome) => println!("Saved {}", outcome.saved_to.display()),
                        Err(e) => eprintln!("{e}"),
                    },
                    Err(e) => eprintln!("{e}"),
                }
                continue;
            }
            "comments" => {
                match browser.comments().await {
                    Ok(comments) => print_comments(&comments),
                    Err(e) => eprintln!("{e}"),
                }
                continue;
            }
            "comment" => {
                let (name, text) = arg.split_once('|').unwrap_or(("", arg));
                let mut form = CommentForm::new(name.trim(), "", text.trim());
                match browser.submit_comment(&mut form).await {
                    Ok(()) => println!("{PENDING_MODERATION_NOTICE}"),
                    Err(e) => eprintln!("{e}"),
                }
                continue;
            }
            other => Err(AppError::validation(format!(
                "unknown command '{other}', try 'help'"
            ))),
        };

        match result {
            Ok(()) => show(browser),
            Err(e) => eprintln!("{e}"),
        }
    }
    Ok(())
}

fn prompt(browser: &Browser) -> Result<()> {
    let trail = browser.navigator().breadcrumbs();
    let mut stdout = std::io::stdout();
    if trail.is_empty() {
        write!(stdout, "{}> ", browser.view())?;
    } else {
        write!(stdout, "{} / {}> ", trail.join(" / "), browser.view())?;
    }
    stdout.flush()?;
    Ok(())
}

/// One-based index as typed by the user.
fn parse_index(arg: &str) -> Result<usize> {
    match arg.parse::<usize>() {
        Ok(n) if n > 0 => Ok(n - 1),
        _ => Err(AppError::validation(format!("expected an entry number, got '{arg}'"))),
    }
}

fn parse_view(arg: &str) -> Result<View> {
    View::ALL
        .into_iter()
        .find(|view| view.name().eq_ignore_ascii_case(arg))
        .ok_or_else(|| AppError::validation(format!("unknown view '{arg}'")))
}

fn show(browser: &Browser) {
    match browser.listing() {
        Listing::Resources(_) => {
            if browser.view() == View::Home {
                let search = browser.search();
                match search.active_term() {
                    Some(term) => println!("Results for '{term}' ({})", search.type_filter().label()),
                    None => println!("Recent resources ({})", search.type_filter().label()),
                }
            }
            print_resources(&browser.visible_resources());
        }
        listing => print_listing(listing),
    }
}

fn print_listing(listing: &Listing) {
    if listing.is_empty() {
        println!("  (nothing here)");
        return;
    }
    match listing {
        Listing::Empty => {}
        Listing::Universities(rows) => {
            for (i, u) in rows.iter().enumerate() {
                match &u.location {
                    Some(location) => println!("{:>3}. {} ({}) - {}", i + 1, u.name, u.code, location),
                    None => println!("{:>3}. {} ({})", i + 1, u.name, u.code),
                }
            }
        }
        Listing::Degrees(rows) => {
            for (i, d) in rows.iter().enumerate() {
                println!("{:>3}. {} ({})", i + 1, d.name, d.code);
            }
        }
        Listing::Semesters(rows) => {
            for (i, s) in rows.iter().enumerate() {
                println!("{:>3}. {} [semester {}]", i + 1, s.name, s.semester_number);
            }
        }
        Listing::Subjects(rows) => {
            for (i, s) in rows.iter().enumerate() {
                println!("{:>3}. {} ({})", i + 1, s.name, s.code);
            }
        }
        Listing::Resources(rows) => print_resources(&rows.iter().collect::<Vec<_>>()),
    }
}

fn print_resources(rows: &[&Resource]) {
    if rows.is_empty() {
        println!("  (no resources)");
        return;
    }
    for (i, r) in rows.iter().enumerate() {
        let kind = r.resource_type.as_ref().map(|k| k.label()).unwrap_or("Resource");
        let year = r.year.map(|y| format!(" {y}")).unwrap_or_default();
        println!(
            "{:>3}. {} [{}{}] {} downloads",
            i + 1,
            r.display_title(),
            kind,
            year,
            r.downloads()
        );
    }
}

fn print_comments(comments: &[Comment]) {
    if comments.is_empty() {
        println!("  (no comments yet)");
        return;
    }
    for c in comments {
        println!("{} ({}):", c.user_name, c.created_at.format("%Y-%m-%d"));
        println!("  {}", c.comment_text);
    }
}
