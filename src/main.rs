use std::{process, sync::Arc};

use monk::{
    cache::CacheConfig,
    client::HttpBlogClient,
    config::{self, CreateArgs},
    domain::BlogId,
    error::AppError,
    infra::{error::InfraError, telemetry},
    presentation,
    session::{Screen, Session},
};
use tracing::{Dispatch, Level, dispatcher, error, info};
use tracing_subscriber::fmt as tracing_fmt;

#[tokio::main]
async fn main() {
    if let Err(error) = run().await {
        report_application_error(&error);
        process::exit(error.exit_code());
    }
}

fn report_application_error(error: &AppError) {
    if dispatcher::has_been_set() {
        error!(error = %error, "application error");
        return;
    }

    let subscriber = tracing_fmt()
        .with_writer(std::io::stderr)
        .with_max_level(Level::ERROR)
        .finish();
    let dispatch = Dispatch::new(subscriber);
    dispatcher::with_default(&dispatch, || {
        error!(error = %error, "application error");
    });
}

async fn run() -> Result<(), AppError> {
    let (cli_args, settings) = config::load_with_cli()?;

    telemetry::init(&settings.logging)?;

    let client = HttpBlogClient::from_settings(&settings.api)?;
    info!(base_url = %client.base_url(), "Using blog API");
    let session = Session::new(Arc::new(client), CacheConfig::from(&settings.cache));

    let result = match cli_args.command {
        config::Command::List => run_list(&session).await,
        config::Command::Show(args) => run_show(&session, BlogId::new(args.id)).await,
        config::Command::Create(args) => run_create(&session, args).await,
    };

    session.teardown();
    result
}

async fn run_list(session: &Session) -> Result<(), AppError> {
    let screen = session.show_list().await;
    print!("{}", presentation::render(&screen)?);
    screen_failure(screen)
}

async fn run_show(session: &Session, id: BlogId) -> Result<(), AppError> {
    let screen = session.open_blog(id).await;
    print!("{}", presentation::render(&screen)?);
    screen_failure(screen)
}

async fn run_create(session: &Session, args: CreateArgs) -> Result<(), AppError> {
    let content = match args.content_file.as_ref() {
        Some(path) => tokio::fs::read_to_string(path)
            .await
            .map_err(InfraError::from)?,
        None => args.content.unwrap_or_default(),
    };

    session.start_create();
    session.edit_form(|form| {
        form.title = args.title;
        form.category = args.category;
        form.description = args.description;
        form.content = content;
        form.cover_image = args.cover_image.unwrap_or_default();
    });

    match session.submit_create().await {
        Ok(blog) => {
            println!("Published `{}` as {}", blog.title, blog.id);
            print!("{}", presentation::render(&session.screen())?);
            Ok(())
        }
        Err(err) => {
            print!("{}", presentation::render(&session.screen())?);
            Err(err.into())
        }
    }
}

/// Turn an error screen into the process result; any visible data counts as success.
fn screen_failure(screen: Screen) -> Result<(), AppError> {
    let error = match screen {
        Screen::List { entry } if entry.value.is_none() => entry.error,
        Screen::Detail { entry, .. } if entry.value.is_none() => entry.error,
        _ => None,
    };
    match error {
        Some(err) => Err(err.into()),
        None => Ok(()),
    }
}
